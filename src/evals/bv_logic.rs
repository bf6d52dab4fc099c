//! Bit-vector logic: bitwise connectives, shifts, extraction and
//! concatenation (spec §4.8 "BV logic").
//!
//! The bitwise connectives fold their constant arguments into one running
//! `BigUint` the same way `bv_arith::eval_bv_add` does, with the absorbing
//! element (all-zero for AND/NAND, all-one for OR/NOR) short-circuiting the
//! fold even when symbolic arguments remain. A fully-constant fold is handed
//! back as a pool-backed `BvLogicBuffer` cell (`common::bv_logic_buffer_cell`)
//! rather than a plain constant, same rationale as the arithmetic family.
//! `MK_BV_CONCAT` cannot use the absorbing-element trick -- its arguments are
//! position-sensitive -- so it only takes the constant-folded fast path when
//! every argument is constant. `MK_BV_EXTRACT` special-cases the identity
//! extraction (`high == width-1 && low == 0`) before even checking whether
//! the operand is constant, handing the operand cell back whole and unchanged
//! (spec §4.8) whether it is a literal, a term, or a buffer.

use crate::bank::{TermBank, TermCtor, TypeBank};
use crate::checks::{check_exact_args, check_min_args};
use crate::coerce;
use crate::error::{ErrorKind, Result, StackError};
use crate::evals::common::{
    bv_constant_cell, bv_constant_of, bv_constant_term, bv_logic_buffer_cell, collect_terms, common_bitsize, full_mask,
};
use crate::opcode::Opcode;
use crate::optable::OperatorTable;
use crate::stack::Stack;
use crate::value::{Cell, Payload, TermHandle};
use num::{BigUint, Zero};

pub(super) fn install<B: TermBank + TypeBank>(table: &mut OperatorTable<B>) {
    table.register(Opcode::MK_BV_NOT, false, |s, _f, n| check_exact_args(s, n, 1), eval_bv_not);
    table.register(Opcode::MK_BV_AND, true, |s, _f, n| check_min_args(s, n, 1), |s, f, n| eval_bitwise(s, f, n, Bitwise::And));
    table.register(Opcode::MK_BV_OR, true, |s, _f, n| check_min_args(s, n, 1), |s, f, n| eval_bitwise(s, f, n, Bitwise::Or));
    table.register(Opcode::MK_BV_XOR, true, |s, _f, n| check_min_args(s, n, 1), |s, f, n| eval_bitwise(s, f, n, Bitwise::Xor));
    table.register(Opcode::MK_BV_NAND, true, |s, _f, n| check_min_args(s, n, 1), |s, f, n| eval_bitwise(s, f, n, Bitwise::Nand));
    table.register(Opcode::MK_BV_NOR, true, |s, _f, n| check_min_args(s, n, 1), |s, f, n| eval_bitwise(s, f, n, Bitwise::Nor));
    table.register(Opcode::MK_BV_XNOR, true, |s, _f, n| check_min_args(s, n, 1), |s, f, n| eval_bitwise(s, f, n, Bitwise::Xnor));

    table.register(Opcode::MK_BV_SHIFT_LEFT0, false, |s, _f, n| check_exact_args(s, n, 2), |s, f, _n| eval_const_shift(s, f, ConstShift::Left0));
    table.register(Opcode::MK_BV_SHIFT_LEFT1, false, |s, _f, n| check_exact_args(s, n, 2), |s, f, _n| eval_const_shift(s, f, ConstShift::Left1));
    table.register(Opcode::MK_BV_SHIFT_RIGHT0, false, |s, _f, n| check_exact_args(s, n, 2), |s, f, _n| eval_const_shift(s, f, ConstShift::Right0));
    table.register(Opcode::MK_BV_SHIFT_RIGHT1, false, |s, _f, n| check_exact_args(s, n, 2), |s, f, _n| eval_const_shift(s, f, ConstShift::Right1));
    table.register(Opcode::MK_BV_ASHIFT_RIGHT, false, |s, _f, n| check_exact_args(s, n, 2), |s, f, _n| eval_const_shift(s, f, ConstShift::Arith));
    table.register(Opcode::MK_BV_ROTATE_LEFT, false, check_bv_rotate, |s, f, _n| eval_rotate(s, f, true));
    table.register(Opcode::MK_BV_ROTATE_RIGHT, false, check_bv_rotate, |s, f, _n| eval_rotate(s, f, false));

    table.register(Opcode::MK_BV_SHL, false, |s, _f, n| check_exact_args(s, n, 2), |s, f, _n| eval_variable_shift(s, f, VariableShift::Shl));
    table.register(Opcode::MK_BV_LSHR, false, |s, _f, n| check_exact_args(s, n, 2), |s, f, _n| eval_variable_shift(s, f, VariableShift::Lshr));
    table.register(Opcode::MK_BV_ASHR, false, |s, _f, n| check_exact_args(s, n, 2), |s, f, _n| eval_variable_shift(s, f, VariableShift::Ashr));

    table.register(Opcode::MK_BV_EXTRACT, false, check_bv_extract, eval_bv_extract);
    table.register(Opcode::MK_BV_CONCAT, true, |s, _f, n| check_min_args(s, n, 2), eval_bv_concat);
    table.register(Opcode::MK_BV_REPEAT, false, |s, _f, n| check_exact_args(s, n, 2), eval_bv_repeat);
    table.register(Opcode::MK_BV_SIGN_EXTEND, false, |s, _f, n| check_exact_args(s, n, 2), eval_bv_sign_extend);
    table.register(Opcode::MK_BV_ZERO_EXTEND, false, |s, _f, n| check_exact_args(s, n, 2), eval_bv_zero_extend);
    table.register(Opcode::MK_BV_REDAND, false, |s, _f, n| check_exact_args(s, n, 1), eval_bv_redand);
    table.register(Opcode::MK_BV_REDOR, false, |s, _f, n| check_exact_args(s, n, 1), eval_bv_redor);
    table.register(Opcode::MK_BV_COMP, false, |s, _f, n| check_exact_args(s, n, 2), eval_bv_comp);
}

fn build<B: TermBank + TypeBank>(stack: &mut Stack<B>, ctor: TermCtor) -> Result<TermHandle> {
    let loc = stack.frame_location();
    let op = stack.current_opcode();
    stack
        .bank_mut()
        .build_term(ctor)
        .map_err(|e| StackError::new(ErrorKind::ExternalError, loc).with_opcode(op).with_source(e))
}

fn eval_bv_not<B: TermBank + TypeBank>(stack: &mut Stack<B>, first: usize, _n: usize) -> Result<Cell> {
    let width = coerce::to_bitsize(stack, first)?;
    if let Some((_, v)) = bv_constant_of(stack, first) {
        return Ok(bv_constant_cell(width, v ^ full_mask(width), stack.frame_location()));
    }
    let a = coerce::to_term(stack, first)?;
    let term = build(stack, TermCtor::BvNot(a))?;
    Ok(Cell::new(Payload::Term(term), stack.frame_location()))
}

#[derive(Copy, Clone)]
enum Bitwise {
    And,
    Or,
    Xor,
    Nand,
    Nor,
    Xnor,
}

fn eval_bitwise<B: TermBank + TypeBank>(stack: &mut Stack<B>, first: usize, n: usize, kind: Bitwise) -> Result<Cell> {
    let width = common_bitsize(stack, first, n)?;
    let mask = full_mask(width);
    let identity = match kind {
        Bitwise::And | Bitwise::Nand => mask.clone(),
        Bitwise::Or | Bitwise::Nor | Bitwise::Xor | Bitwise::Xnor => BigUint::zero(),
    };
    let absorbing = match kind {
        Bitwise::And | Bitwise::Nand => Some(BigUint::zero()),
        Bitwise::Or | Bitwise::Nor => Some(mask.clone()),
        Bitwise::Xor | Bitwise::Xnor => None,
    };
    let negated = matches!(kind, Bitwise::Nand | Bitwise::Nor | Bitwise::Xnor);

    let mut acc = identity.clone();
    let mut any_constant = false;
    let mut symbolic = Vec::new();
    for i in 0..n {
        match bv_constant_of(stack, first + i) {
            Some((_, v)) => {
                any_constant = true;
                acc = match kind {
                    Bitwise::And | Bitwise::Nand => &acc & &v,
                    Bitwise::Or | Bitwise::Nor => &acc | &v,
                    Bitwise::Xor | Bitwise::Xnor => &acc ^ &v,
                };
            }
            None => symbolic.push(coerce::to_term(stack, first + i)?),
        }
    }

    if let Some(abs) = &absorbing {
        if any_constant && &acc == abs {
            let result = if negated { &mask ^ &acc } else { acc };
            let loc = stack.frame_location();
            return Ok(bv_logic_buffer_cell(stack, width, result, loc));
        }
    }
    if symbolic.is_empty() {
        let result = if negated { &mask ^ &acc } else { acc };
        let loc = stack.frame_location();
        return Ok(bv_logic_buffer_cell(stack, width, result, loc));
    }
    if acc != identity {
        symbolic.push(bv_constant_term(stack, width, acc)?);
    }
    let ctor = match kind {
        Bitwise::And => TermCtor::BvAnd(symbolic),
        Bitwise::Or => TermCtor::BvOr(symbolic),
        Bitwise::Xor => TermCtor::BvXor(symbolic),
        Bitwise::Nand => TermCtor::BvNand(symbolic),
        Bitwise::Nor => TermCtor::BvNor(symbolic),
        Bitwise::Xnor => TermCtor::BvXnor(symbolic),
    };
    let term = build(stack, ctor)?;
    Ok(Cell::new(Payload::Term(term), stack.frame_location()))
}

#[derive(Copy, Clone)]
enum ConstShift {
    Left0,
    Left1,
    Right0,
    Right1,
    Arith,
}

fn eval_const_shift<B: TermBank + TypeBank>(stack: &mut Stack<B>, first: usize, kind: ConstShift) -> Result<Cell> {
    let width = coerce::to_bitsize(stack, first)?;
    let k = coerce::to_u32(stack, first + 1)?;
    if let Some((_, v)) = bv_constant_of(stack, first) {
        let mask = full_mask(width);
        let fill_one = match kind {
            ConstShift::Left0 | ConstShift::Right0 => false,
            ConstShift::Left1 | ConstShift::Right1 => true,
            ConstShift::Arith => !(&v & (BigUint::from(1u32) << (width as usize - 1))).is_zero(),
        };
        let result = if k as usize >= width as usize {
            if fill_one { mask } else { BigUint::zero() }
        } else {
            match kind {
                ConstShift::Left0 | ConstShift::Left1 => {
                    let shifted = (&v << k as usize) & &mask;
                    let fill_bits = if fill_one { (BigUint::from(1u32) << k as usize) - BigUint::from(1u32) } else { BigUint::zero() };
                    shifted | fill_bits
                }
                ConstShift::Right0 | ConstShift::Right1 | ConstShift::Arith => {
                    let shifted = &v >> k as usize;
                    let low_mask = if width as usize - k as usize >= width as usize {
                        mask.clone()
                    } else {
                        (BigUint::from(1u32) << (width as usize - k as usize)) - BigUint::from(1u32)
                    };
                    let top_mask = &mask ^ &low_mask;
                    let fill_bits = if fill_one { top_mask } else { BigUint::zero() };
                    shifted | fill_bits
                }
            }
        };
        return Ok(bv_constant_cell(width, result, stack.frame_location()));
    }
    let a = coerce::to_term(stack, first)?;
    let ctor = match kind {
        ConstShift::Left0 => TermCtor::BvShiftLeft0(a, k),
        ConstShift::Left1 => TermCtor::BvShiftLeft1(a, k),
        ConstShift::Right0 => TermCtor::BvShiftRight0(a, k),
        ConstShift::Right1 => TermCtor::BvShiftRight1(a, k),
        ConstShift::Arith => TermCtor::BvAshiftRight(a, k),
    };
    let term = build(stack, ctor)?;
    Ok(Cell::new(Payload::Term(term), stack.frame_location()))
}

/// `MK_BV_ROTATE_{LEFT,RIGHT}`'s shift count must be in `[0, bitsize]`;
/// equality is permitted and is the identity rotation (spec §4.8).
fn check_bv_rotate<B: TermBank + TypeBank>(stack: &Stack<B>, first: usize, n: usize) -> Result<()> {
    check_exact_args(stack, n, 2)?;
    let width = coerce::to_bitsize(stack, first)?;
    let k = coerce::to_u32(stack, first + 1)?;
    if k > width {
        return Err(StackError::new(ErrorKind::BvlogicError, stack.cell(first + 1).location).with_opcode(stack.current_opcode()));
    }
    Ok(())
}

fn eval_rotate<B: TermBank + TypeBank>(stack: &mut Stack<B>, first: usize, left: bool) -> Result<Cell> {
    let width = coerce::to_bitsize(stack, first)?;
    let k = coerce::to_u32(stack, first + 1)?;
    if let Some((_, v)) = bv_constant_of(stack, first) {
        let mask = full_mask(width);
        let k_mod = (k as usize) % width as usize;
        let result = if k_mod == 0 {
            v
        } else if left {
            ((&v << k_mod) | (&v >> (width as usize - k_mod))) & &mask
        } else {
            ((&v >> k_mod) | (&v << (width as usize - k_mod))) & &mask
        };
        return Ok(bv_constant_cell(width, result, stack.frame_location()));
    }
    let a = coerce::to_term(stack, first)?;
    let ctor = if left { TermCtor::BvRotateLeft(a, k) } else { TermCtor::BvRotateRight(a, k) };
    let term = build(stack, ctor)?;
    Ok(Cell::new(Payload::Term(term), stack.frame_location()))
}

#[derive(Copy, Clone)]
enum VariableShift {
    Shl,
    Lshr,
    Ashr,
}

fn eval_variable_shift<B: TermBank + TypeBank>(stack: &mut Stack<B>, first: usize, kind: VariableShift) -> Result<Cell> {
    let width = common_bitsize(stack, first, 2)?;
    if let (Some((_, a)), Some((_, b))) = (bv_constant_of(stack, first), bv_constant_of(stack, first + 1)) {
        let mask = full_mask(width);
        let shift_amount: Option<usize> = if b < BigUint::from(width) { Some(num::ToPrimitive::to_usize(&b).unwrap()) } else { None };
        let result = match (kind, shift_amount) {
            (VariableShift::Shl, Some(k)) => (&a << k) & &mask,
            (VariableShift::Shl, None) => BigUint::zero(),
            (VariableShift::Lshr, Some(k)) => &a >> k,
            (VariableShift::Lshr, None) => BigUint::zero(),
            (VariableShift::Ashr, Some(k)) => {
                let sign_set = !(&a & (BigUint::from(1u32) << (width as usize - 1))).is_zero();
                let shifted = &a >> k;
                if sign_set {
                    let low_mask = if k == 0 { BigUint::zero() } else { (BigUint::from(1u32) << (width as usize - k)) - BigUint::from(1u32) };
                    let top_mask = &mask ^ &low_mask;
                    shifted | top_mask
                } else {
                    shifted
                }
            }
            (VariableShift::Ashr, None) => {
                let sign_set = !(&a & (BigUint::from(1u32) << (width as usize - 1))).is_zero();
                if sign_set { mask } else { BigUint::zero() }
            }
        };
        return Ok(bv_constant_cell(width, result, stack.frame_location()));
    }
    let a = coerce::to_term(stack, first)?;
    let b = coerce::to_term(stack, first + 1)?;
    let ctor = match kind {
        VariableShift::Shl => TermCtor::BvShl(a, b),
        VariableShift::Lshr => TermCtor::BvLshr(a, b),
        VariableShift::Ashr => TermCtor::BvAshr(a, b),
    };
    let term = build(stack, ctor)?;
    Ok(Cell::new(Payload::Term(term), stack.frame_location()))
}

fn check_bv_extract<B: TermBank + TypeBank>(stack: &Stack<B>, first: usize, n: usize) -> Result<()> {
    check_exact_args(stack, n, 3)?;
    let op = stack.current_opcode();
    let high = coerce::to_u32(stack, first)?;
    let low = coerce::to_u32(stack, first + 1)?;
    if low > high {
        return Err(StackError::new(ErrorKind::BvlogicError, stack.cell(first + 1).location).with_opcode(op));
    }
    let width = coerce::to_bitsize(stack, first + 2)?;
    if high >= width {
        return Err(StackError::new(ErrorKind::BvlogicError, stack.cell(first).location).with_opcode(op));
    }
    Ok(())
}

fn eval_bv_extract<B: TermBank + TypeBank>(stack: &mut Stack<B>, first: usize, _n: usize) -> Result<Cell> {
    let high = coerce::to_u32(stack, first)?;
    let low = coerce::to_u32(stack, first + 1)?;
    let result_width = high - low + 1;
    if low == 0 && high + 1 == coerce::to_bitsize(stack, first + 2)? {
        // Identity extraction (spec §4.8): the source cell's payload, whole
        // and unchanged, whether it's a literal, a term, or a buffer.
        return Ok(stack.take_cell(first + 2));
    }
    if let Some((_, v)) = bv_constant_of(stack, first + 2) {
        let extracted = (&v >> low as usize) & full_mask(result_width);
        return Ok(bv_constant_cell(result_width, extracted, stack.frame_location()));
    }
    let a = coerce::to_term(stack, first + 2)?;
    let term = build(stack, TermCtor::BvExtract(a, high, low))?;
    Ok(Cell::new(Payload::Term(term), stack.frame_location()))
}

fn eval_bv_concat<B: TermBank + TypeBank>(stack: &mut Stack<B>, first: usize, n: usize) -> Result<Cell> {
    let mut constants = Vec::with_capacity(n);
    let mut all_constant = true;
    for i in 0..n {
        match bv_constant_of(stack, first + i) {
            Some(wv) => constants.push(wv),
            None => {
                all_constant = false;
                break;
            }
        }
    }
    if all_constant {
        let mut acc = BigUint::zero();
        let mut total_width = 0u32;
        for (w, v) in &constants {
            acc = (acc << *w as usize) | v;
            total_width += w;
        }
        return Ok(bv_constant_cell(total_width, acc, stack.frame_location()));
    }
    let terms = collect_terms(stack, first, n)?;
    let term = build(stack, TermCtor::BvConcat(terms))?;
    Ok(Cell::new(Payload::Term(term), stack.frame_location()))
}

fn eval_bv_repeat<B: TermBank + TypeBank>(stack: &mut Stack<B>, first: usize, _n: usize) -> Result<Cell> {
    let count = coerce::to_u32(stack, first + 1)?;
    if count == 0 {
        return Err(StackError::new(ErrorKind::NonpositiveBvsize, stack.cell(first + 1).location).with_opcode(stack.current_opcode()));
    }
    let width = coerce::to_bitsize(stack, first)?;
    if let Some((_, v)) = bv_constant_of(stack, first) {
        let mut acc = BigUint::zero();
        for i in 0..count {
            acc |= &v << (i * width) as usize;
        }
        return Ok(bv_constant_cell(width * count, acc, stack.frame_location()));
    }
    let a = coerce::to_term(stack, first)?;
    let term = build(stack, TermCtor::BvRepeat(a, count))?;
    Ok(Cell::new(Payload::Term(term), stack.frame_location()))
}

fn eval_bv_sign_extend<B: TermBank + TypeBank>(stack: &mut Stack<B>, first: usize, _n: usize) -> Result<Cell> {
    let width = coerce::to_bitsize(stack, first)?;
    let extra = coerce::to_u32(stack, first + 1)?;
    if let Some((_, v)) = bv_constant_of(stack, first) {
        let sign_set = !(&v & (BigUint::from(1u32) << (width as usize - 1))).is_zero();
        let result = if extra == 0 || !sign_set {
            v
        } else {
            let extension = (full_mask(extra)) << width as usize;
            v | extension
        };
        return Ok(bv_constant_cell(width + extra, result, stack.frame_location()));
    }
    let a = coerce::to_term(stack, first)?;
    let term = build(stack, TermCtor::BvSignExtend(a, extra))?;
    Ok(Cell::new(Payload::Term(term), stack.frame_location()))
}

fn eval_bv_zero_extend<B: TermBank + TypeBank>(stack: &mut Stack<B>, first: usize, _n: usize) -> Result<Cell> {
    let width = coerce::to_bitsize(stack, first)?;
    let extra = coerce::to_u32(stack, first + 1)?;
    if let Some((_, v)) = bv_constant_of(stack, first) {
        return Ok(bv_constant_cell(width + extra, v, stack.frame_location()));
    }
    let a = coerce::to_term(stack, first)?;
    let term = build(stack, TermCtor::BvZeroExtend(a, extra))?;
    Ok(Cell::new(Payload::Term(term), stack.frame_location()))
}

fn eval_bv_redand<B: TermBank + TypeBank>(stack: &mut Stack<B>, first: usize, _n: usize) -> Result<Cell> {
    let width = coerce::to_bitsize(stack, first)?;
    if let Some((_, v)) = bv_constant_of(stack, first) {
        let result = if v == full_mask(width) { BigUint::from(1u32) } else { BigUint::zero() };
        return Ok(bv_constant_cell(1, result, stack.frame_location()));
    }
    let a = coerce::to_term(stack, first)?;
    let term = build(stack, TermCtor::BvRedand(a))?;
    Ok(Cell::new(Payload::Term(term), stack.frame_location()))
}

fn eval_bv_redor<B: TermBank + TypeBank>(stack: &mut Stack<B>, first: usize, _n: usize) -> Result<Cell> {
    coerce::to_bitsize(stack, first)?;
    if let Some((_, v)) = bv_constant_of(stack, first) {
        let result = if v.is_zero() { BigUint::zero() } else { BigUint::from(1u32) };
        return Ok(bv_constant_cell(1, result, stack.frame_location()));
    }
    let a = coerce::to_term(stack, first)?;
    let term = build(stack, TermCtor::BvRedor(a))?;
    Ok(Cell::new(Payload::Term(term), stack.frame_location()))
}

fn eval_bv_comp<B: TermBank + TypeBank>(stack: &mut Stack<B>, first: usize, _n: usize) -> Result<Cell> {
    common_bitsize(stack, first, 2)?;
    if let (Some((_, a)), Some((_, b))) = (bv_constant_of(stack, first), bv_constant_of(stack, first + 1)) {
        let result = if a == b { BigUint::from(1u32) } else { BigUint::zero() };
        return Ok(bv_constant_cell(1, result, stack.frame_location()));
    }
    let a = coerce::to_term(stack, first)?;
    let b = coerce::to_term(stack, first + 1)?;
    let term = build(stack, TermCtor::BvComp(a, b))?;
    Ok(Cell::new(Payload::Term(term), stack.frame_location()))
}

//! Bit-vector comparison atoms, unsigned and signed (spec §4.8 "BV atoms").
//!
//! Each opcode yields a boolean term. When both operands are bit-vector
//! constants the comparison is decided immediately against the bank's
//! `true_term`/`false_term`, without ever calling into `build_term`.

use crate::bank::{CmpKind, TermBank, TermCtor, TypeBank};
use crate::checks::check_exact_args;
use crate::coerce;
use crate::error::{ErrorKind, Result, StackError};
use crate::evals::common::{bv_constant_of, common_bitsize};
use crate::opcode::Opcode;
use crate::optable::OperatorTable;
use crate::stack::Stack;
use crate::value::Cell;
use num::BigInt;

pub(super) fn install<B: TermBank + TypeBank>(table: &mut OperatorTable<B>) {
    table.register(Opcode::MK_BV_GE, false, |s, _f, n| check_exact_args(s, n, 2), |s, f, _n| eval_cmp(s, f, CmpKind::Ge, false));
    table.register(Opcode::MK_BV_GT, false, |s, _f, n| check_exact_args(s, n, 2), |s, f, _n| eval_cmp(s, f, CmpKind::Gt, false));
    table.register(Opcode::MK_BV_LE, false, |s, _f, n| check_exact_args(s, n, 2), |s, f, _n| eval_cmp(s, f, CmpKind::Le, false));
    table.register(Opcode::MK_BV_LT, false, |s, _f, n| check_exact_args(s, n, 2), |s, f, _n| eval_cmp(s, f, CmpKind::Lt, false));
    table.register(Opcode::MK_BV_SGE, false, |s, _f, n| check_exact_args(s, n, 2), |s, f, _n| eval_cmp(s, f, CmpKind::Ge, true));
    table.register(Opcode::MK_BV_SGT, false, |s, _f, n| check_exact_args(s, n, 2), |s, f, _n| eval_cmp(s, f, CmpKind::Gt, true));
    table.register(Opcode::MK_BV_SLE, false, |s, _f, n| check_exact_args(s, n, 2), |s, f, _n| eval_cmp(s, f, CmpKind::Le, true));
    table.register(Opcode::MK_BV_SLT, false, |s, _f, n| check_exact_args(s, n, 2), |s, f, _n| eval_cmp(s, f, CmpKind::Lt, true));
}

fn to_signed(width: u32, value: &num::BigUint) -> BigInt {
    let half = num::BigUint::from(1u32) << (width as usize - 1);
    if *value >= half {
        let full = num::BigUint::from(1u32) << width as usize;
        BigInt::from(value.clone()) - BigInt::from(full)
    } else {
        BigInt::from(value.clone())
    }
}

fn holds(kind: CmpKind, ordering: std::cmp::Ordering) -> bool {
    use std::cmp::Ordering::*;
    match (kind, ordering) {
        (CmpKind::Ge, Less) => false,
        (CmpKind::Ge, _) => true,
        (CmpKind::Gt, Greater) => true,
        (CmpKind::Gt, _) => false,
        (CmpKind::Le, Greater) => false,
        (CmpKind::Le, _) => true,
        (CmpKind::Lt, Less) => true,
        (CmpKind::Lt, _) => false,
    }
}

fn eval_cmp<B: TermBank + TypeBank>(stack: &mut Stack<B>, first: usize, kind: CmpKind, signed: bool) -> Result<Cell> {
    let width = common_bitsize(stack, first, 2)?;
    if let (Some((_, a)), Some((_, b))) = (bv_constant_of(stack, first), bv_constant_of(stack, first + 1)) {
        let ordering = if signed { to_signed(width, &a).cmp(&to_signed(width, &b)) } else { a.cmp(&b) };
        let result = if holds(kind, ordering) { stack.bank_mut().true_term() } else { stack.bank_mut().false_term() };
        return Ok(Cell::new(crate::value::Payload::Term(result), stack.frame_location()));
    }
    let a = coerce::to_term(stack, first)?;
    let b = coerce::to_term(stack, first + 1)?;
    let loc = stack.frame_location();
    let op = stack.current_opcode();
    let term = stack
        .bank_mut()
        .build_term(TermCtor::BvCmp(kind, signed, a, b))
        .map_err(|e| StackError::new(ErrorKind::ExternalError, loc).with_opcode(op).with_source(e))?;
    Ok(Cell::new(crate::value::Payload::Term(term), stack.frame_location()))
}

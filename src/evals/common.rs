//! Shared helpers used across the per-family evaluator modules: argument
//! collection, bit-vector constant recognition, and the small numeric
//! coercions the predefined opcode checks/evals lean on repeatedly.

use num::BigUint;

use crate::bank::{TermBank, TypeBank};
use crate::coerce;
use crate::error::{ErrorKind, Result, StackError};
use crate::location::Location;
use crate::stack::Stack;
use crate::value::{BvSmall, BvWide, Cell, Payload, Tag, TermHandle};

pub(super) fn collect_terms<B: TermBank + TypeBank>(
    stack: &mut Stack<B>,
    first: usize,
    n: usize,
) -> Result<Vec<TermHandle>> {
    (0..n).map(|i| coerce::to_term(stack, first + i)).collect()
}

/// Checks that no two of the `n` cells starting at `first` carry the same
/// tag-specific binder name, reporting `kind` at the second occurrence
/// (spec §4.6 duplicate-name checks for scalar constructors and binders).
pub(super) fn check_distinct_names<B: TermBank + TypeBank>(
    stack: &Stack<B>,
    names: &[(&str, Location)],
    kind: ErrorKind,
) -> Result<()> {
    for i in 0..names.len() {
        for j in 0..i {
            if names[i].0 == names[j].0 {
                return Err(StackError::new(kind, names[i].1).with_opcode(stack.current_opcode()));
            }
        }
    }
    Ok(())
}

/// The constant `(bitsize, value)` a cell denotes, if it is a bit-vector
/// literal or a term the bank records as a bit-vector constant (spec §9
/// "BV negation and multiplicative-constant folding" picks its fast path
/// off this).
pub(super) fn bv_constant_of<B: TermBank + TypeBank>(stack: &Stack<B>, index: usize) -> Option<(u32, BigUint)> {
    match &stack.cell(index).payload {
        Payload::BvSmall(bv) => Some((bv.bitsize, BigUint::from(bv.value))),
        Payload::BvWide(bv) => Some((bv.bitsize, bv.value.clone())),
        Payload::BvSmallBuffer(buf) | Payload::BvWideBuffer(buf) => Some((buf.bitsize, buf.constant.clone())),
        Payload::BvLogicBuffer(buf) => buf.to_biguint_constant().map(|v| (buf.bitsize(), v)),
        Payload::Term(t) => stack.bank().bv_constant_value(*t),
        _ => None,
    }
}

/// `Some((width, values))` iff every one of the `n` arguments starting at
/// `first` is a bit-vector constant, all of the same width. Bails out with
/// `None` the moment a non-constant argument is seen -- the caller falls
/// back to materializing every argument as a term, which re-validates
/// widths on its own path via `common_bitsize`.
pub(super) fn all_bv_constants<B: TermBank + TypeBank>(
    stack: &Stack<B>,
    first: usize,
    n: usize,
) -> Result<Option<(u32, Vec<BigUint>)>> {
    let mut bitsize = None;
    let mut values = Vec::with_capacity(n);
    for i in 0..n {
        match bv_constant_of(stack, first + i) {
            Some((w, v)) => {
                match bitsize {
                    None => bitsize = Some(w),
                    Some(expected) if expected != w => {
                        return Err(StackError::new(ErrorKind::IncompatibleBvsizes, stack.cell(first + i).location)
                            .with_opcode(stack.current_opcode()));
                    }
                    _ => {}
                }
                values.push(v);
            }
            None => return Ok(None),
        }
    }
    Ok(bitsize.map(|w| (w, values)))
}

/// Bit width shared by all `n` arguments starting at `first`, validated via
/// `coerce::to_bitsize`, used by the symbolic (non-constant) fold path.
pub(super) fn common_bitsize<B: TermBank + TypeBank>(stack: &Stack<B>, first: usize, n: usize) -> Result<u32> {
    let width = coerce::to_bitsize(stack, first)?;
    for i in 1..n {
        let w = coerce::to_bitsize(stack, first + i)?;
        if w != width {
            return Err(StackError::new(ErrorKind::IncompatibleBvsizes, stack.cell(first + i).location)
                .with_opcode(stack.current_opcode()));
        }
    }
    Ok(width)
}

/// Coerces to a non-negative arbitrary-precision integer, used where
/// `coerce::to_u32` would needlessly cap a bit-vector's numeric value at
/// 32 bits (e.g. `MK_BV_CONST`'s value argument).
pub(super) fn to_nonneg_biguint<B: TermBank + TypeBank>(stack: &Stack<B>, index: usize) -> Result<BigUint> {
    let r = coerce::to_rational(stack, index)?;
    let loc = stack.cell(index).location;
    let op = stack.current_opcode();
    if !r.is_integer() {
        return Err(StackError::new(ErrorKind::NotAnInteger, loc).with_opcode(op));
    }
    if r.numer().sign() == num::bigint::Sign::Minus {
        return Err(StackError::new(ErrorKind::InvalidBvconstant, loc).with_opcode(op));
    }
    Ok(r.to_integer().to_biguint().expect("checked non-negative above"))
}

/// Coerces to a strictly positive bit width, remapping `to_u32`'s generic
/// `NegativeExponent` into the bit-vector-specific `NonpositiveBvsize`
/// (spec §7).
pub(super) fn to_positive_bvsize<B: TermBank + TypeBank>(stack: &Stack<B>, index: usize) -> Result<u32> {
    let n = coerce::to_u32(stack, index).map_err(|e| {
        if e.kind == ErrorKind::NegativeExponent { StackError { kind: ErrorKind::NonpositiveBvsize, ..e } } else { e }
    })?;
    if n == 0 {
        return Err(StackError::new(ErrorKind::NonpositiveBvsize, stack.cell(index).location)
            .with_opcode(stack.current_opcode()));
    }
    Ok(n)
}

pub(super) fn full_mask(bitsize: u32) -> BigUint {
    (BigUint::from(1u32) << bitsize as usize) - BigUint::from(1u32)
}

/// Builds a normalized bit-vector constant cell, picking the small/wide
/// carrier the same way `Stack::push_bv_literal` does.
pub(super) fn bv_constant_cell(bitsize: u32, value: BigUint, loc: Location) -> Cell {
    if bitsize <= 64 {
        let small = num::ToPrimitive::to_u64(&value).unwrap_or(0);
        Cell::new(Payload::BvSmall(BvSmall::normalized(bitsize, small)), loc)
    } else {
        Cell::new(Payload::BvWide(BvWide::normalized(bitsize, value)), loc)
    }
}

/// Wraps a fully-folded bit-vector constant as a pool-backed accumulator
/// cell rather than a plain `BvSmall`/`BvWide` literal -- the accumulator
/// that drove the fold is what survives on the stack (spec §4.2, §9),
/// recycled back to the pool whenever this cell is eventually freed.
pub(super) fn bv_poly_buffer_cell<B: TermBank + TypeBank>(
    stack: &mut Stack<B>,
    bitsize: u32,
    value: BigUint,
    loc: Location,
) -> Cell {
    if bitsize <= 64 {
        let mut buf = stack.pool_mut().acquire_small_bv_poly(bitsize);
        buf.constant = value;
        Cell::new(Payload::BvSmallBuffer(buf), loc)
    } else {
        let mut buf = stack.pool_mut().acquire_wide_bv_poly(bitsize);
        buf.constant = value;
        Cell::new(Payload::BvWideBuffer(buf), loc)
    }
}

/// Wraps a fully-folded bitwise-logic constant as a pool-backed
/// `BvLogicBuffer` cell, same rationale as `bv_poly_buffer_cell`.
pub(super) fn bv_logic_buffer_cell<B: TermBank + TypeBank>(
    stack: &mut Stack<B>,
    bitsize: u32,
    value: BigUint,
    loc: Location,
) -> Cell {
    let mut buf = stack.pool_mut().acquire_logic(bitsize);
    buf.set_constant(&value);
    Cell::new(Payload::BvLogicBuffer(buf), loc)
}

/// Materializes a bit-vector constant into the bank as a term, used when a
/// mixed constant/symbolic fold must combine the folded constant with
/// residual symbolic terms.
pub(super) fn bv_constant_term<B: TermBank + TypeBank>(
    stack: &mut Stack<B>,
    bitsize: u32,
    value: BigUint,
) -> Result<TermHandle> {
    use crate::bank::TermCtor;
    let loc = stack.frame_location();
    let op = stack.current_opcode();
    stack
        .bank_mut()
        .build_term(TermCtor::BvConst(bitsize, value))
        .map_err(|e| StackError::new(ErrorKind::ExternalError, loc).with_opcode(op).with_source(e))
}

pub(super) fn require_tag<B: TermBank + TypeBank>(
    stack: &Stack<B>,
    index: usize,
    expected: Tag,
    kind: ErrorKind,
) -> Result<()> {
    crate::checks::check_tag(stack, index, expected, kind)
}

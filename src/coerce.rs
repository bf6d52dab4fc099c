//! Coercions (spec §4.7): turning whatever a cell happens to hold into the
//! concrete shape an eval function needs. A coercion may materialize a
//! term via the external builder (e.g. "to term" on a still-constant BV
//! cell); it never mutates the source cell itself.

use crate::bank::{TermBank, TermCtor, TypeBank};
use crate::error::{ErrorKind, Result, StackError};
use crate::stack::Stack;
use crate::value::{Payload, TermHandle};
use num::rational::BigRational;
use num::BigUint;

/// Materializes whatever is at `index` into a `TermHandle`, resolving a
/// dangling symbol against the term-name space and folding constants
/// through the external builder (spec §9, coercion entry point used by
/// every propositional/arithmetic/BV eval function).
pub fn to_term<B: TermBank + TypeBank>(stack: &mut Stack<B>, index: usize) -> Result<TermHandle> {
    let cell = stack.cell(index).clone();
    let loc = cell.location;
    let op = stack.current_opcode();
    match cell.payload {
        Payload::Term(t) => Ok(t),
        Payload::BvSmall(bv) => stack
            .bank_mut()
            .build_term(TermCtor::BvConst(bv.bitsize, BigUint::from(bv.value)))
            .map_err(|e| StackError::new(ErrorKind::ExternalError, loc).with_opcode(op).with_source(e)),
        Payload::BvWide(bv) => stack
            .bank_mut()
            .build_term(TermCtor::BvConst(bv.bitsize, bv.value))
            .map_err(|e| StackError::new(ErrorKind::ExternalError, loc).with_opcode(op).with_source(e)),
        Payload::Rational(r) => stack
            .bank_mut()
            .build_term(TermCtor::RationalConst(r))
            .map_err(|e| StackError::new(ErrorKind::ExternalError, loc).with_opcode(op).with_source(e)),
        Payload::Symbol(name) => stack
            .bank()
            .resolve_term_name(&name)
            .ok_or_else(|| StackError::new(ErrorKind::UndefTerm, loc).with_opcode(op).with_symbol(name)),
        Payload::RatBuffer(buf) => stack
            .bank_mut()
            .build_term(TermCtor::RationalConst(buf.constant))
            .map_err(|e| StackError::new(ErrorKind::ExternalError, loc).with_opcode(op).with_source(e)),
        Payload::BvSmallBuffer(buf) | Payload::BvWideBuffer(buf) => stack
            .bank_mut()
            .build_term(TermCtor::BvConst(buf.bitsize, buf.constant))
            .map_err(|e| StackError::new(ErrorKind::ExternalError, loc).with_opcode(op).with_source(e)),
        Payload::BvLogicBuffer(buf) => {
            let bitsize = buf.bitsize();
            let value = buf
                .to_biguint_constant()
                .ok_or_else(|| StackError::new(ErrorKind::Internal, loc).with_opcode(op))?;
            stack
                .bank_mut()
                .build_term(TermCtor::BvConst(bitsize, value))
                .map_err(|e| StackError::new(ErrorKind::ExternalError, loc).with_opcode(op).with_source(e))
        }
        _ => Err(StackError::new(ErrorKind::Internal, loc).with_opcode(op)),
    }
}

/// Coerces to a plain rational value, without materializing a term.
pub fn to_rational<B: TermBank + TypeBank>(stack: &Stack<B>, index: usize) -> Result<BigRational> {
    let cell = stack.cell(index);
    match &cell.payload {
        Payload::Rational(r) => Ok(r.clone()),
        _ => Err(StackError::new(ErrorKind::NotARational, cell.location).with_opcode(stack.current_opcode())),
    }
}

/// Coerces to a non-negative `u32`, erroring `IntegerOverflow` if the
/// rational isn't integral and in range, used for extract bounds, shift
/// amounts, repeat/extend counts and the like.
pub fn to_u32<B: TermBank + TypeBank>(stack: &Stack<B>, index: usize) -> Result<u32> {
    let cell = stack.cell(index);
    let loc = cell.location;
    let op = stack.current_opcode();
    let r = match &cell.payload {
        Payload::Rational(r) => r.clone(),
        _ => return Err(StackError::new(ErrorKind::NotARational, loc).with_opcode(op)),
    };
    if !r.is_integer() {
        return Err(StackError::new(ErrorKind::NotAnInteger, loc).with_opcode(op));
    }
    if r.numer().sign() == num::bigint::Sign::Minus {
        return Err(StackError::new(ErrorKind::NegativeExponent, loc).with_opcode(op));
    }
    r.to_integer()
        .try_into()
        .map_err(|_| StackError::new(ErrorKind::IntegerOverflow, loc).with_opcode(op))
}

/// Coerces to a bit-vector constant `(bitsize, value)`, used by folding
/// eval functions before they decide whether they can stay constant.
pub fn to_bv_constant<B: TermBank + TypeBank>(stack: &Stack<B>, index: usize) -> Result<(u32, BigUint)> {
    let cell = stack.cell(index);
    match &cell.payload {
        Payload::BvSmall(bv) => Ok((bv.bitsize, BigUint::from(bv.value))),
        Payload::BvWide(bv) => Ok((bv.bitsize, bv.value.clone())),
        Payload::BvSmallBuffer(buf) | Payload::BvWideBuffer(buf) => Ok((buf.bitsize, buf.constant.clone())),
        Payload::BvLogicBuffer(buf) => buf
            .to_biguint_constant()
            .map(|v| (buf.bitsize(), v))
            .ok_or_else(|| StackError::new(ErrorKind::InvalidBvconstant, cell.location).with_opcode(stack.current_opcode())),
        _ => Err(StackError::new(ErrorKind::InvalidBvconstant, cell.location).with_opcode(stack.current_opcode())),
    }
}

/// The bit width implied by a cell, whether it is a BV constant or an
/// already-built term of BV type.
pub fn to_bitsize<B: TermBank + TypeBank>(stack: &Stack<B>, index: usize) -> Result<u32> {
    let cell = stack.cell(index);
    let loc = cell.location;
    let op = stack.current_opcode();
    match &cell.payload {
        Payload::BvSmall(bv) => Ok(bv.bitsize),
        Payload::BvWide(bv) => Ok(bv.bitsize),
        Payload::BvSmallBuffer(buf) | Payload::BvWideBuffer(buf) => Ok(buf.bitsize),
        Payload::BvLogicBuffer(buf) => Ok(buf.bitsize()),
        Payload::Term(t) => stack
            .bank()
            .bv_width(stack.bank().type_of(*t))
            .ok_or_else(|| StackError::new(ErrorKind::NotAType, loc).with_opcode(op)),
        _ => Err(StackError::new(ErrorKind::NotAType, loc).with_opcode(op)),
    }
}

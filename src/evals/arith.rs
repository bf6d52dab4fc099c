//! Generic (real/int) arithmetic (spec §4.8 "Arithmetic").
//!
//! Unlike the bit-vector families, none of these opcodes carry the
//! `(associative)` flag in spec §4.8's table -- only the bit-vector
//! variants fold via the multiplicity mechanism (`opcode::ASSOCIATIVE_OPCODES`).
//! Each push opens its own frame; `MK_ADD`/`MK_MUL` still accept n >= 1
//! arguments collected in a single frame, they simply never re-fold across
//! repeated pushes of the same opcode. Within one frame, `nary` still folds
//! an all-rational-constant argument list through a pool-backed
//! `RatPolyBuffer` (SPEC_FULL §4.7) rather than materializing a term for
//! every operand; any symbolic argument falls back to the external builder
//! unfolded, same as before.

use crate::bank::{CmpKind, TermBank, TermCtor, TypeBank};
use crate::checks::check_exact_args;
use crate::checks::check_min_args;
use crate::coerce;
use crate::error::{ErrorKind, Result, StackError};
use crate::evals::common::collect_terms;
use crate::opcode::Opcode;
use crate::optable::OperatorTable;
use crate::stack::Stack;
use crate::value::{Cell, Payload, Tag, TermHandle};
use num::rational::BigRational;
use num::{One, Zero};

pub(super) fn install<B: TermBank + TypeBank>(table: &mut OperatorTable<B>) {
    table.register(Opcode::MK_ADD, false, |s, _f, n| check_min_args(s, n, 1), |s, f, n| nary(s, f, n, RatFold::Add, TermCtor::Add));
    table.register(Opcode::MK_SUB, false, |s, _f, n| check_exact_args(s, n, 2), |s, f, _n| binary(s, f, TermCtor::Sub));
    table.register(Opcode::MK_NEG, false, |s, _f, n| check_exact_args(s, n, 1), |s, f, _n| unary(s, f, TermCtor::Neg));
    table.register(Opcode::MK_MUL, false, |s, _f, n| check_min_args(s, n, 1), |s, f, n| nary(s, f, n, RatFold::Mul, TermCtor::Mul));
    table.register(Opcode::MK_DIVISION, false, |s, _f, n| check_exact_args(s, n, 2), eval_division);
    table.register(Opcode::MK_POW, false, |s, _f, n| check_exact_args(s, n, 2), eval_pow);
    table.register(Opcode::MK_GE, false, |s, _f, n| check_exact_args(s, n, 2), |s, f, _n| cmp(s, f, CmpKind::Ge));
    table.register(Opcode::MK_GT, false, |s, _f, n| check_exact_args(s, n, 2), |s, f, _n| cmp(s, f, CmpKind::Gt));
    table.register(Opcode::MK_LE, false, |s, _f, n| check_exact_args(s, n, 2), |s, f, _n| cmp(s, f, CmpKind::Le));
    table.register(Opcode::MK_LT, false, |s, _f, n| check_exact_args(s, n, 2), |s, f, _n| cmp(s, f, CmpKind::Lt));
}

fn build<B: TermBank + TypeBank>(stack: &mut Stack<B>, ctor: TermCtor) -> Result<TermHandle> {
    let loc = stack.frame_location();
    let op = stack.current_opcode();
    stack.bank_mut().build_term(ctor).map_err(|e| StackError::new(ErrorKind::ExternalError, loc).with_opcode(op).with_source(e))
}

fn unary<B: TermBank + TypeBank>(
    stack: &mut Stack<B>,
    first: usize,
    ctor: impl FnOnce(TermHandle) -> TermCtor,
) -> Result<Cell> {
    let a = coerce::to_term(stack, first)?;
    let term = build(stack, ctor(a))?;
    Ok(Cell::new(Payload::Term(term), stack.frame_location()))
}

fn binary<B: TermBank + TypeBank>(
    stack: &mut Stack<B>,
    first: usize,
    ctor: impl FnOnce(TermHandle, TermHandle) -> TermCtor,
) -> Result<Cell> {
    let a = coerce::to_term(stack, first)?;
    let b = coerce::to_term(stack, first + 1)?;
    let term = build(stack, ctor(a, b))?;
    Ok(Cell::new(Payload::Term(term), stack.frame_location()))
}

#[derive(Copy, Clone)]
enum RatFold {
    Add,
    Mul,
}

/// `MK_ADD`/`MK_MUL` fold every argument into one running `RatPolyBuffer`
/// when all of them are plain rational constants (spec §9's constant-
/// folding discussion, applied to the one arithmetic family that has an
/// accumulator of its own); otherwise every argument is materialized as a
/// term and handed to the external builder unfolded, same as before.
fn nary<B: TermBank + TypeBank>(
    stack: &mut Stack<B>,
    first: usize,
    n: usize,
    fold: RatFold,
    ctor: impl FnOnce(Vec<TermHandle>) -> TermCtor,
) -> Result<Cell> {
    if (0..n).all(|i| stack.cell(first + i).tag() == Tag::Rational) {
        let mut acc = match fold {
            RatFold::Add => BigRational::zero(),
            RatFold::Mul => BigRational::one(),
        };
        for i in 0..n {
            let r = match &stack.cell(first + i).payload {
                Payload::Rational(r) => r.clone(),
                _ => unreachable!("tag checked above"),
            };
            match fold {
                RatFold::Add => acc += &r,
                RatFold::Mul => acc *= &r,
            }
        }
        let mut buf = stack.pool_mut().acquire_rat_poly();
        buf.constant = acc;
        return Ok(Cell::new(Payload::RatBuffer(buf), stack.frame_location()));
    }
    let args = collect_terms(stack, first, n)?;
    let term = build(stack, ctor(args))?;
    Ok(Cell::new(Payload::Term(term), stack.frame_location()))
}

fn cmp<B: TermBank + TypeBank>(stack: &mut Stack<B>, first: usize, kind: CmpKind) -> Result<Cell> {
    let a = coerce::to_term(stack, first)?;
    let b = coerce::to_term(stack, first + 1)?;
    let term = build(stack, TermCtor::Cmp(kind, a, b))?;
    Ok(Cell::new(Payload::Term(term), stack.frame_location()))
}

/// Real/int division requires a non-zero rational-constant divisor (spec
/// §7 `DIVIDE_BY_ZERO`/`NON_CONSTANT_DIVISOR`) -- this core has no
/// symbolic-reciprocal term constructor to fall back to.
fn eval_division<B: TermBank + TypeBank>(stack: &mut Stack<B>, first: usize, _n: usize) -> Result<Cell> {
    let op = stack.current_opcode();
    let divisor_loc = stack.cell(first + 1).location;
    let divisor: BigRational = coerce::to_rational(stack, first + 1)
        .map_err(|_| StackError::new(ErrorKind::NonConstantDivisor, divisor_loc).with_opcode(op))?;
    if divisor.is_zero() {
        return Err(StackError::new(ErrorKind::DivideByZero, divisor_loc).with_opcode(op));
    }
    let a = coerce::to_term(stack, first)?;
    let b = coerce::to_term(stack, first + 1)?;
    let term = build(stack, TermCtor::Division(a, b))?;
    Ok(Cell::new(Payload::Term(term), stack.frame_location()))
}

fn eval_pow<B: TermBank + TypeBank>(stack: &mut Stack<B>, first: usize, _n: usize) -> Result<Cell> {
    let a = coerce::to_term(stack, first)?;
    let k = coerce::to_u32(stack, first + 1)?;
    let term = build(stack, TermCtor::Pow(a, k))?;
    Ok(Cell::new(Payload::Term(term), stack.frame_location()))
}

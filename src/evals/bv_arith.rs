//! Bit-vector arithmetic (spec §4.8 "BV arithmetic").
//!
//! `MK_BV_ADD`/`MK_BV_SUB`/`MK_BV_MUL` fold every constant argument into one
//! running `BigUint` (mod 2^bitsize) before touching the external term
//! builder, so an expression like `(bvadd x 1 2 3)` materializes `x + 6`, not
//! three chained `bvadd` terms. When the fold consumes every argument the
//! running total is handed back as a pool-backed `BvPolyBuffer` cell
//! (`common::bv_poly_buffer_cell`) rather than a plain constant, so the
//! accumulator that drove the fold is the thing `coerce::to_term` later
//! materializes (spec §4.2). `MK_BV_NEG`/`MK_BV_POW` are unary and stay on
//! the plain-constant fast path per spec §9 -- no accumulator is worth
//! instantiating for a single operand. Division and remainder are left as
//! total external-builder operations: SMT-LIB bit-vector division by the
//! zero constant is defined, not an error, so `DIVIDE_BY_ZERO` here is
//! reserved for the real/int family (`arith.rs`).

use crate::bank::{TermBank, TermCtor, TypeBank};
use crate::checks::{check_exact_args, check_min_args};
use crate::coerce;
use crate::error::{ErrorKind, Result, StackError};
use crate::evals::common::{
    bv_constant_cell, bv_constant_of, bv_constant_term, bv_poly_buffer_cell, common_bitsize, full_mask,
    to_nonneg_biguint, to_positive_bvsize,
};
use crate::opcode::Opcode;
use crate::optable::OperatorTable;
use crate::stack::Stack;
use crate::value::{Cell, Payload, TermHandle};
use num::{BigUint, One, Zero};

pub(super) fn install<B: TermBank + TypeBank>(table: &mut OperatorTable<B>) {
    table.register(Opcode::MK_BV_CONST, false, |s, _f, n| check_exact_args(s, n, 2), eval_bv_const);
    table.register(Opcode::MK_BV_ADD, true, |s, _f, n| check_min_args(s, n, 1), eval_bv_add);
    table.register(Opcode::MK_BV_SUB, false, |s, _f, n| check_min_args(s, n, 2), eval_bv_sub);
    table.register(Opcode::MK_BV_MUL, true, |s, _f, n| check_min_args(s, n, 1), eval_bv_mul);
    table.register(Opcode::MK_BV_NEG, false, |s, _f, n| check_exact_args(s, n, 1), eval_bv_neg);
    table.register(Opcode::MK_BV_POW, false, |s, _f, n| check_exact_args(s, n, 2), eval_bv_pow);
    table.register(Opcode::MK_BV_DIV, false, |s, _f, n| check_exact_args(s, n, 2), |s, f, _n| binary(s, f, TermCtor::BvDiv));
    table.register(Opcode::MK_BV_REM, false, |s, _f, n| check_exact_args(s, n, 2), |s, f, _n| binary(s, f, TermCtor::BvRem));
    table.register(Opcode::MK_BV_SDIV, false, |s, _f, n| check_exact_args(s, n, 2), |s, f, _n| binary(s, f, TermCtor::BvSdiv));
    table.register(Opcode::MK_BV_SREM, false, |s, _f, n| check_exact_args(s, n, 2), |s, f, _n| binary(s, f, TermCtor::BvSrem));
    table.register(Opcode::MK_BV_SMOD, false, |s, _f, n| check_exact_args(s, n, 2), |s, f, _n| binary(s, f, TermCtor::BvSmod));
}

fn build<B: TermBank + TypeBank>(stack: &mut Stack<B>, ctor: TermCtor) -> Result<TermHandle> {
    let loc = stack.frame_location();
    let op = stack.current_opcode();
    stack.bank_mut().build_term(ctor).map_err(|e| StackError::new(ErrorKind::ExternalError, loc).with_opcode(op).with_source(e))
}

fn binary<B: TermBank + TypeBank>(
    stack: &mut Stack<B>,
    first: usize,
    ctor: impl FnOnce(TermHandle, TermHandle) -> TermCtor,
) -> Result<Cell> {
    common_bitsize(stack, first, 2)?;
    let a = coerce::to_term(stack, first)?;
    let b = coerce::to_term(stack, first + 1)?;
    let term = build(stack, ctor(a, b))?;
    Ok(Cell::new(Payload::Term(term), stack.frame_location()))
}

fn eval_bv_const<B: TermBank + TypeBank>(stack: &mut Stack<B>, first: usize, _n: usize) -> Result<Cell> {
    let width = to_positive_bvsize(stack, first)?;
    let value = to_nonneg_biguint(stack, first + 1)? & full_mask(width);
    Ok(bv_constant_cell(width, value, stack.frame_location()))
}

fn eval_bv_add<B: TermBank + TypeBank>(stack: &mut Stack<B>, first: usize, n: usize) -> Result<Cell> {
    let width = common_bitsize(stack, first, n)?;
    let mask = full_mask(width);
    let mut acc = BigUint::zero();
    let mut symbolic = Vec::new();
    for i in 0..n {
        match bv_constant_of(stack, first + i) {
            Some((_, v)) => acc = (&acc + v) & &mask,
            None => symbolic.push(coerce::to_term(stack, first + i)?),
        }
    }
    if symbolic.is_empty() {
        let loc = stack.frame_location();
        return Ok(bv_poly_buffer_cell(stack, width, acc, loc));
    }
    if !acc.is_zero() {
        symbolic.push(bv_constant_term(stack, width, acc)?);
    }
    let term = build(stack, TermCtor::BvAdd(symbolic))?;
    Ok(Cell::new(Payload::Term(term), stack.frame_location()))
}

fn eval_bv_sub<B: TermBank + TypeBank>(stack: &mut Stack<B>, first: usize, n: usize) -> Result<Cell> {
    let width = common_bitsize(stack, first, n)?;
    let modulus = full_mask(width) + BigUint::one();
    // Non-associative left fold: a - b - c == (a - b) - c. Stays a plain
    // constant cell only while every argument seen so far has been one.
    let mut acc = match bv_constant_of(stack, first) {
        Some((_, v)) => Some(v),
        None => None,
    };
    let mut acc_term = if acc.is_none() { Some(coerce::to_term(stack, first)?) } else { None };
    for i in 1..n {
        match bv_constant_of(stack, first + i) {
            Some((_, v)) if acc.is_some() => {
                acc = Some((&modulus + acc.unwrap() - v) % &modulus);
            }
            _ => {
                let lhs = match acc.take() {
                    Some(v) => bv_constant_term(stack, width, v)?,
                    None => acc_term.take().expect("either acc or acc_term carries the running value"),
                };
                let rhs = coerce::to_term(stack, first + i)?;
                acc_term = Some(build(stack, TermCtor::BvSub(lhs, rhs))?);
            }
        }
    }
    match (acc, acc_term) {
        (Some(v), None) => {
            let loc = stack.frame_location();
            Ok(bv_poly_buffer_cell(stack, width, v, loc))
        }
        (None, Some(t)) => Ok(Cell::new(Payload::Term(t), stack.frame_location())),
        _ => unreachable!("exactly one of acc/acc_term is live after the fold"),
    }
}

fn eval_bv_mul<B: TermBank + TypeBank>(stack: &mut Stack<B>, first: usize, n: usize) -> Result<Cell> {
    let width = common_bitsize(stack, first, n)?;
    let mask = full_mask(width);
    let mut acc = BigUint::one();
    let mut any_constant = false;
    let mut symbolic = Vec::new();
    for i in 0..n {
        match bv_constant_of(stack, first + i) {
            Some((_, v)) => {
                any_constant = true;
                acc = (&acc * v) & &mask;
            }
            None => symbolic.push(coerce::to_term(stack, first + i)?),
        }
    }
    if any_constant && acc.is_zero() {
        let loc = stack.frame_location();
        return Ok(bv_poly_buffer_cell(stack, width, BigUint::zero(), loc));
    }
    if symbolic.is_empty() {
        let loc = stack.frame_location();
        return Ok(bv_poly_buffer_cell(stack, width, acc, loc));
    }
    if !acc.is_one() {
        symbolic.push(bv_constant_term(stack, width, acc)?);
    }
    let term = build(stack, TermCtor::BvMul(symbolic))?;
    Ok(Cell::new(Payload::Term(term), stack.frame_location()))
}

fn eval_bv_neg<B: TermBank + TypeBank>(stack: &mut Stack<B>, first: usize, _n: usize) -> Result<Cell> {
    let width = coerce::to_bitsize(stack, first)?;
    if let Some((_, v)) = bv_constant_of(stack, first) {
        let modulus = full_mask(width) + BigUint::one();
        let negated = if v.is_zero() { v } else { &modulus - v };
        return Ok(bv_constant_cell(width, negated, stack.frame_location()));
    }
    let a = coerce::to_term(stack, first)?;
    let term = build(stack, TermCtor::BvNeg(a))?;
    Ok(Cell::new(Payload::Term(term), stack.frame_location()))
}

fn eval_bv_pow<B: TermBank + TypeBank>(stack: &mut Stack<B>, first: usize, _n: usize) -> Result<Cell> {
    let width = coerce::to_bitsize(stack, first)?;
    let k = coerce::to_u32(stack, first + 1)?;
    if let Some((_, v)) = bv_constant_of(stack, first) {
        let modulus = full_mask(width) + BigUint::one();
        let result = v.modpow(&BigUint::from(k), &modulus);
        return Ok(bv_constant_cell(width, result, stack.frame_location()));
    }
    let a = coerce::to_term(stack, first)?;
    let term = build(stack, TermCtor::BvPow(a, k))?;
    Ok(Cell::new(Payload::Term(term), stack.frame_location()))
}

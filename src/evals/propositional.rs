//! Propositional connectives (spec §4.8 "Propositional").
//!
//! Constant folding for these opcodes lives in the term bank itself (e.g.
//! `InMemoryBank::fold_assoc_bool`), not in the stack engine -- unlike the
//! bit-vector families, propositional terms have no polynomial/logic
//! buffer carrier, so there is nothing for the stack to fold ahead of the
//! external builder.

use crate::bank::{TermBank, TermCtor, TypeBank};
use crate::checks::{check_exact_args, check_min_args};
use crate::coerce;
use crate::error::{ErrorKind, Result, StackError};
use crate::evals::common::collect_terms;
use crate::opcode::Opcode;
use crate::optable::OperatorTable;
use crate::stack::Stack;
use crate::value::{Cell, Payload};

pub(super) fn install<B: TermBank + TypeBank>(table: &mut OperatorTable<B>) {
    table.register(Opcode::MK_NOT, false, |s, _f, n| check_exact_args(s, n, 1), |s, f, _n| unary(s, f, TermCtor::Not));
    table.register(Opcode::MK_OR, true, |s, _f, n| check_min_args(s, n, 1), |s, f, n| nary(s, f, n, TermCtor::Or));
    table.register(Opcode::MK_AND, true, |s, _f, n| check_min_args(s, n, 1), |s, f, n| nary(s, f, n, TermCtor::And));
    table.register(Opcode::MK_XOR, true, |s, _f, n| check_min_args(s, n, 1), |s, f, n| nary(s, f, n, TermCtor::Xor));
    table.register(Opcode::MK_IFF, false, |s, _f, n| check_exact_args(s, n, 2), |s, f, _n| binary(s, f, TermCtor::Iff));
    table.register(Opcode::MK_IMPLIES, false, |s, _f, n| check_exact_args(s, n, 2), |s, f, _n| binary(s, f, TermCtor::Implies));
    table.register(Opcode::MK_ITE, false, |s, _f, n| check_exact_args(s, n, 3), |s, f, _n| eval_ite(s, f));
    table.register(Opcode::MK_EQ, false, |s, _f, n| check_exact_args(s, n, 2), |s, f, _n| binary(s, f, TermCtor::Eq));
    table.register(Opcode::MK_DISEQ, false, |s, _f, n| check_exact_args(s, n, 2), |s, f, _n| eval_diseq(s, f));
    table.register(Opcode::MK_DISTINCT, false, |s, _f, n| check_min_args(s, n, 1), |s, f, n| nary(s, f, n, TermCtor::Distinct));
}

fn build<B: TermBank + TypeBank>(stack: &mut Stack<B>, ctor: TermCtor) -> Result<crate::value::TermHandle> {
    let loc = stack.frame_location();
    let op = stack.current_opcode();
    stack.bank_mut().build_term(ctor).map_err(|e| StackError::new(ErrorKind::ExternalError, loc).with_opcode(op).with_source(e))
}

fn unary<B: TermBank + TypeBank>(
    stack: &mut Stack<B>,
    first: usize,
    ctor: impl FnOnce(crate::value::TermHandle) -> TermCtor,
) -> Result<Cell> {
    let a = coerce::to_term(stack, first)?;
    let term = build(stack, ctor(a))?;
    Ok(Cell::new(Payload::Term(term), stack.frame_location()))
}

fn binary<B: TermBank + TypeBank>(
    stack: &mut Stack<B>,
    first: usize,
    ctor: impl FnOnce(crate::value::TermHandle, crate::value::TermHandle) -> TermCtor,
) -> Result<Cell> {
    let a = coerce::to_term(stack, first)?;
    let b = coerce::to_term(stack, first + 1)?;
    let term = build(stack, ctor(a, b))?;
    Ok(Cell::new(Payload::Term(term), stack.frame_location()))
}

fn nary<B: TermBank + TypeBank>(
    stack: &mut Stack<B>,
    first: usize,
    n: usize,
    ctor: impl FnOnce(Vec<crate::value::TermHandle>) -> TermCtor,
) -> Result<Cell> {
    let args = collect_terms(stack, first, n)?;
    let term = build(stack, ctor(args))?;
    Ok(Cell::new(Payload::Term(term), stack.frame_location()))
}

fn eval_ite<B: TermBank + TypeBank>(stack: &mut Stack<B>, first: usize) -> Result<Cell> {
    let c = coerce::to_term(stack, first)?;
    let t = coerce::to_term(stack, first + 1)?;
    let e = coerce::to_term(stack, first + 2)?;
    let term = build(stack, TermCtor::Ite(c, t, e))?;
    Ok(Cell::new(Payload::Term(term), stack.frame_location()))
}

fn eval_diseq<B: TermBank + TypeBank>(stack: &mut Stack<B>, first: usize) -> Result<Cell> {
    let a = coerce::to_term(stack, first)?;
    let b = coerce::to_term(stack, first + 1)?;
    let eq = build(stack, TermCtor::Eq(a, b))?;
    let term = build(stack, TermCtor::Not(eq))?;
    Ok(Cell::new(Payload::Term(term), stack.frame_location()))
}

//! Polymorphic term constructors (spec §4.8 "Polymorphic term").
//!
//! `MK_FORALL`/`MK_EXISTS`/`MK_LAMBDA` bind a list of `DECLARE_VAR`
//! results (`TermBinding` cells) over a body; `DUPLICATE_VAR_NAME` guards
//! against the same binder name appearing twice in that list (spec §7).

use crate::bank::{TermBank, TermCtor, TypeBank};
use crate::checks::{check_exact_args, check_min_args, check_tag};
use crate::coerce;
use crate::error::{ErrorKind, Result, StackError};
use crate::evals::common::check_distinct_names;
use crate::opcode::Opcode;
use crate::optable::OperatorTable;
use crate::stack::Stack;
use crate::value::{Cell, Payload, Tag, TermHandle};

pub(super) fn install<B: TermBank + TypeBank>(table: &mut OperatorTable<B>) {
    table.register(Opcode::MK_APPLY, false, check_apply, eval_apply);
    table.register(Opcode::MK_TUPLE, false, |s, _f, n| check_min_args(s, n, 1), eval_tuple);
    table.register(Opcode::MK_SELECT, false, |s, _f, n| check_exact_args(s, n, 2), eval_select);
    table.register(Opcode::MK_TUPLE_UPDATE, false, |s, _f, n| check_exact_args(s, n, 3), eval_tuple_update);
    table.register(Opcode::MK_UPDATE, false, |s, _f, n| check_exact_args(s, n, 3), eval_update);
    table.register(Opcode::MK_FORALL, false, check_binder_list, |s, f, n| eval_binder(s, f, n, Quantifier::Forall));
    table.register(Opcode::MK_EXISTS, false, check_binder_list, |s, f, n| eval_binder(s, f, n, Quantifier::Exists));
    table.register(Opcode::MK_LAMBDA, false, check_binder_list, |s, f, n| eval_binder(s, f, n, Quantifier::Lambda));
}

fn build<B: TermBank + TypeBank>(stack: &mut Stack<B>, ctor: TermCtor) -> Result<TermHandle> {
    let loc = stack.frame_location();
    let op = stack.current_opcode();
    stack.bank_mut().build_term(ctor).map_err(|e| StackError::new(ErrorKind::ExternalError, loc).with_opcode(op).with_source(e))
}

fn check_apply<B: TermBank + TypeBank>(stack: &Stack<B>, _first: usize, n: usize) -> Result<()> {
    check_min_args(stack, n, 1)
}

fn eval_apply<B: TermBank + TypeBank>(stack: &mut Stack<B>, first: usize, n: usize) -> Result<Cell> {
    let f = coerce::to_term(stack, first)?;
    let args = (1..n).map(|i| coerce::to_term(stack, first + i)).collect::<Result<Vec<_>>>()?;
    let term = build(stack, TermCtor::Apply(f, args))?;
    Ok(Cell::new(Payload::Term(term), stack.frame_location()))
}

fn eval_tuple<B: TermBank + TypeBank>(stack: &mut Stack<B>, first: usize, n: usize) -> Result<Cell> {
    let args = (0..n).map(|i| coerce::to_term(stack, first + i)).collect::<Result<Vec<_>>>()?;
    let term = build(stack, TermCtor::Tuple(args))?;
    Ok(Cell::new(Payload::Term(term), stack.frame_location()))
}

fn eval_select<B: TermBank + TypeBank>(stack: &mut Stack<B>, first: usize, _n: usize) -> Result<Cell> {
    let t = coerce::to_term(stack, first)?;
    let i = coerce::to_u32(stack, first + 1)?;
    let term = build(stack, TermCtor::Select(t, i))?;
    Ok(Cell::new(Payload::Term(term), stack.frame_location()))
}

fn eval_tuple_update<B: TermBank + TypeBank>(stack: &mut Stack<B>, first: usize, _n: usize) -> Result<Cell> {
    let t = coerce::to_term(stack, first)?;
    let i = coerce::to_u32(stack, first + 1)?;
    let v = coerce::to_term(stack, first + 2)?;
    let term = build(stack, TermCtor::TupleUpdate(t, i, v))?;
    Ok(Cell::new(Payload::Term(term), stack.frame_location()))
}

fn eval_update<B: TermBank + TypeBank>(stack: &mut Stack<B>, first: usize, _n: usize) -> Result<Cell> {
    let arr = coerce::to_term(stack, first)?;
    let idx = coerce::to_term(stack, first + 1)?;
    let val = coerce::to_term(stack, first + 2)?;
    let term = build(stack, TermCtor::Update(arr, idx, val))?;
    Ok(Cell::new(Payload::Term(term), stack.frame_location()))
}

#[derive(Copy, Clone)]
enum Quantifier {
    Forall,
    Exists,
    Lambda,
}

fn check_binder_list<B: TermBank + TypeBank>(stack: &Stack<B>, first: usize, n: usize) -> Result<()> {
    check_min_args(stack, n, 2)?;
    for i in 0..n - 1 {
        check_tag(stack, first + i, Tag::TermBinding, ErrorKind::InvalidFrame)?;
    }
    Ok(())
}

fn eval_binder<B: TermBank + TypeBank>(stack: &mut Stack<B>, first: usize, n: usize, kind: Quantifier) -> Result<Cell> {
    let binder_count = n - 1;
    let names: Vec<(&str, crate::location::Location)> = (0..binder_count)
        .map(|i| match &stack.cell(first + i).payload {
            Payload::TermBinding(b) => (b.symbol.as_str(), stack.cell(first + i).location),
            _ => unreachable!(),
        })
        .collect();
    check_distinct_names(stack, &names, ErrorKind::DuplicateVarName)?;
    let vars: Vec<TermHandle> = (0..binder_count)
        .map(|i| match &stack.cell(first + i).payload {
            Payload::TermBinding(b) => b.term,
            _ => unreachable!(),
        })
        .collect();
    let body = coerce::to_term(stack, first + binder_count)?;
    let ctor = match kind {
        Quantifier::Forall => TermCtor::Forall(vars, body),
        Quantifier::Exists => TermCtor::Exists(vars, body),
        Quantifier::Lambda => TermCtor::Lambda(vars, body),
    };
    let term = build(stack, ctor)?;
    Ok(Cell::new(Payload::Term(term), stack.frame_location()))
}

//! BIND / LET / DECLARE_VAR / DECLARE_TYPE_VAR (spec §4.8 "Scoped binding").
//!
//! `BIND` and the two `DECLARE_*` opcodes all produce a binding cell
//! (`TermBinding`/`TypeBinding`); freeing that cell -- on frame pop or on
//! `reset` -- is what restores the external name map (spec §3 invariant 5,
//! handled generically by `Stack::free_cell`). Shadowing is LIFO: each
//! binding records whatever the name previously resolved to (spec §9 open
//! question resolution, `DESIGN.md`).

use crate::bank::{TermBank, TypeBank};
use crate::checks::{check_exact_args, check_min_args, check_tag};
use crate::coerce;
use crate::error::{ErrorKind, Result};
use crate::opcode::Opcode;
use crate::optable::OperatorTable;
use crate::stack::Stack;
use crate::value::{Cell, Payload, Tag, TermBinding, TypeBinding};

pub(super) fn install<B: TermBank + TypeBank>(table: &mut OperatorTable<B>) {
    table.register(Opcode::BIND, false, check_bind, eval_bind);
    table.register(Opcode::LET, false, check_let, eval_let);
    table.register(Opcode::DECLARE_VAR, false, check_declare_var, eval_declare_var);
    table.register(Opcode::DECLARE_TYPE_VAR, false, check_declare_type_var, eval_declare_type_var);
}

fn symbol_at<B: TermBank + TypeBank>(stack: &Stack<B>, index: usize) -> String {
    match &stack.cell(index).payload {
        Payload::Symbol(s) => s.clone(),
        _ => unreachable!("checked by check_tag before eval runs"),
    }
}

fn check_bind<B: TermBank + TypeBank>(stack: &Stack<B>, first: usize, n: usize) -> Result<()> {
    check_exact_args(stack, n, 2)?;
    check_tag(stack, first, Tag::Symbol, ErrorKind::NotASymbol)
}

fn eval_bind<B: TermBank + TypeBank>(stack: &mut Stack<B>, first: usize, _n: usize) -> Result<Cell> {
    let symbol = symbol_at(stack, first);
    let term = coerce::to_term(stack, first + 1)?;
    let previous = stack.bank_mut().define_term_name(&symbol, term);
    Ok(Cell::new(Payload::TermBinding(TermBinding { symbol, term, previous }), stack.frame_location()))
}

fn check_let<B: TermBank + TypeBank>(stack: &Stack<B>, first: usize, n: usize) -> Result<()> {
    check_min_args(stack, n, 2)?;
    for i in 0..n - 1 {
        check_tag(stack, first + i, Tag::TermBinding, ErrorKind::InvalidFrame)?;
    }
    Ok(())
}

fn eval_let<B: TermBank + TypeBank>(stack: &mut Stack<B>, first: usize, n: usize) -> Result<Cell> {
    let body_index = first + n - 1;
    let term = coerce::to_term(stack, body_index)?;
    Ok(Cell::new(Payload::Term(term), stack.frame_location()))
}

fn check_declare_var<B: TermBank + TypeBank>(stack: &Stack<B>, first: usize, n: usize) -> Result<()> {
    check_exact_args(stack, n, 2)?;
    check_tag(stack, first, Tag::Symbol, ErrorKind::NotASymbol)?;
    check_tag(stack, first + 1, Tag::Type, ErrorKind::NotAType)
}

fn eval_declare_var<B: TermBank + TypeBank>(stack: &mut Stack<B>, first: usize, _n: usize) -> Result<Cell> {
    let symbol = symbol_at(stack, first);
    let ty = match stack.cell(first + 1).payload {
        Payload::Type(t) => t,
        _ => unreachable!(),
    };
    let term = stack.bank_mut().fresh_uninterpreted(ty);
    let previous = stack.bank_mut().define_term_name(&symbol, term);
    Ok(Cell::new(Payload::TermBinding(TermBinding { symbol, term, previous }), stack.frame_location()))
}

fn check_declare_type_var<B: TermBank + TypeBank>(stack: &Stack<B>, first: usize, n: usize) -> Result<()> {
    check_exact_args(stack, n, 1)?;
    check_tag(stack, first, Tag::Symbol, ErrorKind::NotASymbol)
}

fn eval_declare_type_var<B: TermBank + TypeBank>(stack: &mut Stack<B>, first: usize, _n: usize) -> Result<Cell> {
    let symbol = symbol_at(stack, first);
    let ty = stack.bank_mut().fresh_type();
    let previous = stack.bank_mut().define_type_name(&symbol, ty);
    Ok(Cell::new(Payload::TypeBinding(TypeBinding { symbol, ty, previous }), stack.frame_location()))
}

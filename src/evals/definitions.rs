//! DEFINE_TYPE / DEFINE_TERM (spec §4.8 "Definitions").
//!
//! Both opcodes produce no result cell; the collapsed frame becomes a
//! `Payload::None` placeholder. Redefinition is rejected at push time by
//! `push_free_type_name`/`push_free_term_name`, so these evals never
//! re-check it -- by the time `evaluate` runs, the name is already known
//! fresh.

use crate::bank::{TermBank, TypeBank};
use crate::checks::{check_range_args, check_tag};
use crate::coerce;
use crate::error::{ErrorKind, Result, StackError};
use crate::opcode::Opcode;
use crate::optable::OperatorTable;
use crate::stack::Stack;
use crate::value::{Cell, Payload, Tag};

pub(super) fn install<B: TermBank + TypeBank>(table: &mut OperatorTable<B>) {
    table.register(Opcode::DEFINE_TYPE, false, check_define_type, eval_define_type);
    table.register(Opcode::DEFINE_TERM, false, check_define_term, eval_define_term);
}

fn symbol_at<B: TermBank + TypeBank>(stack: &Stack<B>, index: usize) -> String {
    match &stack.cell(index).payload {
        Payload::Symbol(s) => s.clone(),
        _ => unreachable!("checked by check_tag before eval runs"),
    }
}

fn check_define_type<B: TermBank + TypeBank>(stack: &Stack<B>, first: usize, n: usize) -> Result<()> {
    check_range_args(stack, n, 1, 2)?;
    check_tag(stack, first, Tag::Symbol, ErrorKind::NotASymbol)?;
    if n == 2 {
        check_tag(stack, first + 1, Tag::Type, ErrorKind::NotAType)?;
    }
    Ok(())
}

fn eval_define_type<B: TermBank + TypeBank>(stack: &mut Stack<B>, first: usize, n: usize) -> Result<Cell> {
    let name = symbol_at(stack, first);
    let ty = if n == 2 {
        match stack.cell(first + 1).payload {
            Payload::Type(t) => t,
            _ => unreachable!(),
        }
    } else {
        stack.bank_mut().fresh_type()
    };
    stack.bank_mut().define_type_name(&name, ty);
    Ok(Cell::new(Payload::None, stack.frame_location()))
}

fn check_define_term<B: TermBank + TypeBank>(stack: &Stack<B>, first: usize, n: usize) -> Result<()> {
    check_range_args(stack, n, 2, 3)?;
    check_tag(stack, first, Tag::Symbol, ErrorKind::NotASymbol)?;
    check_tag(stack, first + 1, Tag::Type, ErrorKind::NotAType)?;
    Ok(())
}

fn eval_define_term<B: TermBank + TypeBank>(stack: &mut Stack<B>, first: usize, n: usize) -> Result<Cell> {
    let name = symbol_at(stack, first);
    let ty = match stack.cell(first + 1).payload {
        Payload::Type(t) => t,
        _ => unreachable!(),
    };
    let term = if n == 3 {
        let body_loc = stack.cell(first + 2).location;
        let term = coerce::to_term(stack, first + 2)?;
        let body_ty = stack.bank().type_of(term);
        if !stack.bank().is_subtype(body_ty, ty) {
            return Err(StackError::new(ErrorKind::TypeErrorInDefinition, body_loc).with_opcode(stack.current_opcode()));
        }
        term
    } else {
        stack.bank_mut().fresh_uninterpreted(ty)
    };
    stack.bank_mut().define_term_name(&name, term);
    Ok(Cell::new(Payload::None, stack.frame_location()))
}

//! Type constructors (spec §4.8 "Type constructors").

use crate::bank::{TermBank, TypeBank, TypeCtor};
use crate::checks::{check_min_args, check_tag};
use crate::error::{ErrorKind, Result, StackError};
use crate::evals::common::{check_distinct_names, to_positive_bvsize};
use crate::opcode::Opcode;
use crate::optable::OperatorTable;
use crate::stack::Stack;
use crate::value::{Cell, Payload, Tag};

pub(super) fn install<B: TermBank + TypeBank>(table: &mut OperatorTable<B>) {
    table.register(Opcode::MK_BV_TYPE, false, check_bv_type, eval_bv_type);
    table.register(Opcode::MK_SCALAR_TYPE, false, check_scalar_type, eval_scalar_type);
    table.register(Opcode::MK_TUPLE_TYPE, false, check_tuple_type, eval_tuple_type);
    table.register(Opcode::MK_FUN_TYPE, false, check_fun_type, eval_fun_type);
    table.register(Opcode::MK_APP_TYPE, false, check_app_type, eval_app_type);
}

fn build_type<B: TermBank + TypeBank>(stack: &mut Stack<B>, ctor: TypeCtor) -> Result<crate::value::TypeHandle> {
    let loc = stack.frame_location();
    let op = stack.current_opcode();
    stack.bank_mut().build_type(ctor).map_err(|e| StackError::new(ErrorKind::ExternalError, loc).with_opcode(op).with_source(e))
}

fn check_bv_type<B: TermBank + TypeBank>(stack: &Stack<B>, _first: usize, n: usize) -> Result<()> {
    crate::checks::check_exact_args(stack, n, 1)
}

fn eval_bv_type<B: TermBank + TypeBank>(stack: &mut Stack<B>, first: usize, _n: usize) -> Result<Cell> {
    let width = to_positive_bvsize(stack, first)?;
    let ty = build_type(stack, TypeCtor::Bv(width))?;
    Ok(Cell::new(Payload::Type(ty), stack.frame_location()))
}

fn check_scalar_type<B: TermBank + TypeBank>(stack: &Stack<B>, first: usize, n: usize) -> Result<()> {
    check_min_args(stack, n, 1)?;
    for i in 0..n {
        check_tag(stack, first + i, Tag::Symbol, ErrorKind::NotASymbol)?;
    }
    Ok(())
}

fn eval_scalar_type<B: TermBank + TypeBank>(stack: &mut Stack<B>, first: usize, n: usize) -> Result<Cell> {
    let names: Vec<(&str, crate::location::Location)> = (0..n)
        .map(|i| match &stack.cell(first + i).payload {
            Payload::Symbol(s) => (s.as_str(), stack.cell(first + i).location),
            _ => unreachable!(),
        })
        .collect();
    check_distinct_names(stack, &names, ErrorKind::DuplicateScalarName)?;
    let owned: Vec<String> = names.iter().map(|(s, _)| s.to_string()).collect();
    let ty = build_type(stack, TypeCtor::Scalar(owned))?;
    Ok(Cell::new(Payload::Type(ty), stack.frame_location()))
}

fn check_tuple_type<B: TermBank + TypeBank>(stack: &Stack<B>, first: usize, n: usize) -> Result<()> {
    check_min_args(stack, n, 1)?;
    for i in 0..n {
        check_tag(stack, first + i, Tag::Type, ErrorKind::NotAType)?;
    }
    Ok(())
}

fn eval_tuple_type<B: TermBank + TypeBank>(stack: &mut Stack<B>, first: usize, n: usize) -> Result<Cell> {
    let components: Vec<_> = (0..n)
        .map(|i| match stack.cell(first + i).payload {
            Payload::Type(t) => t,
            _ => unreachable!(),
        })
        .collect();
    let ty = build_type(stack, TypeCtor::Tuple(components))?;
    Ok(Cell::new(Payload::Type(ty), stack.frame_location()))
}

fn check_fun_type<B: TermBank + TypeBank>(stack: &Stack<B>, first: usize, n: usize) -> Result<()> {
    check_min_args(stack, n, 1)?;
    for i in 0..n {
        check_tag(stack, first + i, Tag::Type, ErrorKind::NotAType)?;
    }
    Ok(())
}

fn eval_fun_type<B: TermBank + TypeBank>(stack: &mut Stack<B>, first: usize, n: usize) -> Result<Cell> {
    let handles: Vec<_> = (0..n)
        .map(|i| match stack.cell(first + i).payload {
            Payload::Type(t) => t,
            _ => unreachable!(),
        })
        .collect();
    let (domain, codomain) = handles.split_at(n - 1);
    let ty = build_type(stack, TypeCtor::Fun(domain.to_vec(), codomain[0]))?;
    Ok(Cell::new(Payload::Type(ty), stack.frame_location()))
}

fn check_app_type<B: TermBank + TypeBank>(stack: &Stack<B>, first: usize, n: usize) -> Result<()> {
    check_min_args(stack, n, 1)?;
    check_tag(stack, first, Tag::Macro, ErrorKind::InvalidFrame)?;
    for i in 1..n {
        check_tag(stack, first + i, Tag::Type, ErrorKind::NotAType)?;
    }
    Ok(())
}

fn eval_app_type<B: TermBank + TypeBank>(stack: &mut Stack<B>, first: usize, n: usize) -> Result<Cell> {
    let mac = match stack.cell(first).payload {
        Payload::Macro(m) => m,
        _ => unreachable!(),
    };
    let args: Vec<_> = (1..n)
        .map(|i| match stack.cell(first + i).payload {
            Payload::Type(t) => t,
            _ => unreachable!(),
        })
        .collect();
    let ty = build_type(stack, TypeCtor::App(mac, args))?;
    Ok(Cell::new(Payload::Type(ty), stack.frame_location()))
}

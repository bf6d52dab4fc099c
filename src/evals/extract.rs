//! Result extraction (spec §4.8 "Extract", §6).
//!
//! `BUILD_TERM`/`BUILD_TYPE` are the only opcodes whose frame `finish_frame`
//! pops outright instead of collapsing into a result cell -- they deposit
//! into `Stack::result_term`/`Stack::result_type` instead of leaving
//! anything on the value array.
//!
//! `BUILD_TERM`'s argument need not already carry `Tag::Term`: an
//! associative BV/rational fold (or an extract) that resolved entirely to a
//! constant leaves a `BvSmall`/`BvWide`/buffer cell behind, and a `LET`/`BIND`
//! body may still be a bare rational or a dangling symbol. `check_build_term`
//! accepts every tag `coerce::to_term` knows how to materialize; the eval
//! does the materializing.

use crate::bank::{TermBank, TypeBank};
use crate::checks::{check_exact_args, check_tag, check_tag_one_of};
use crate::coerce;
use crate::error::{ErrorKind, Result};
use crate::opcode::Opcode;
use crate::optable::OperatorTable;
use crate::stack::Stack;
use crate::value::{Cell, Payload, Tag};

pub(super) fn install<B: TermBank + TypeBank>(table: &mut OperatorTable<B>) {
    table.register(Opcode::BUILD_TERM, false, check_build_term, eval_build_term);
    table.register(Opcode::BUILD_TYPE, false, check_build_type, eval_build_type);
}

const TERM_COERCIBLE: &[Tag] = &[
    Tag::Term,
    Tag::BvSmall,
    Tag::BvWide,
    Tag::Rational,
    Tag::Symbol,
    Tag::RatBuffer,
    Tag::BvSmallBuffer,
    Tag::BvWideBuffer,
    Tag::BvLogicBuffer,
];

fn check_build_term<B: TermBank + TypeBank>(stack: &Stack<B>, first: usize, n: usize) -> Result<()> {
    check_exact_args(stack, n, 1)?;
    check_tag_one_of(stack, first, TERM_COERCIBLE, ErrorKind::Internal)
}

fn eval_build_term<B: TermBank + TypeBank>(stack: &mut Stack<B>, first: usize, _n: usize) -> Result<Cell> {
    let term = coerce::to_term(stack, first)?;
    stack.set_result_term(term);
    Ok(Cell::new(Payload::None, stack.frame_location()))
}

fn check_build_type<B: TermBank + TypeBank>(stack: &Stack<B>, first: usize, n: usize) -> Result<()> {
    check_exact_args(stack, n, 1)?;
    check_tag(stack, first, Tag::Type, ErrorKind::NotAType)
}

fn eval_build_type<B: TermBank + TypeBank>(stack: &mut Stack<B>, first: usize, _n: usize) -> Result<Cell> {
    let ty = match stack.cell(first).payload {
        Payload::Type(t) => t,
        _ => unreachable!("check_build_type already enforced Tag::Type"),
    };
    stack.set_result_type(ty);
    Ok(Cell::new(Payload::None, stack.frame_location()))
}

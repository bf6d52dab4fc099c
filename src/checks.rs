//! Shared check helpers (spec §4.6).
//!
//! Checks never mutate the stack; they only read cells and report a
//! `StackError` located at the offending argument's own cell, not the
//! operator frame (spec §9: "error location always comes from the
//! offending argument's own cell").

use crate::bank::{TermBank, TypeBank};
use crate::error::{ErrorKind, Result, StackError};
use crate::stack::Stack;
use crate::value::Tag;

pub fn check_exact_args<B: TermBank + TypeBank>(stack: &Stack<B>, count: usize, n: usize) -> Result<()> {
    if count != n {
        return Err(frame_arity_error(stack));
    }
    Ok(())
}

pub fn check_min_args<B: TermBank + TypeBank>(stack: &Stack<B>, count: usize, min: usize) -> Result<()> {
    if count < min {
        return Err(frame_arity_error(stack));
    }
    Ok(())
}

pub fn check_range_args<B: TermBank + TypeBank>(
    stack: &Stack<B>,
    count: usize,
    min: usize,
    max: usize,
) -> Result<()> {
    if count < min || count > max {
        return Err(frame_arity_error(stack));
    }
    Ok(())
}

fn frame_arity_error<B: TermBank + TypeBank>(stack: &Stack<B>) -> StackError {
    StackError::new(ErrorKind::InvalidFrame, stack.frame_location()).with_opcode(stack.current_opcode())
}

pub fn check_tag<B: TermBank + TypeBank>(
    stack: &Stack<B>,
    index: usize,
    expected: Tag,
    kind: ErrorKind,
) -> Result<()> {
    let cell = stack.cell(index);
    if cell.tag() != expected {
        return Err(StackError::new(kind, cell.location).with_opcode(stack.current_opcode()));
    }
    Ok(())
}

pub fn check_tag_one_of<B: TermBank + TypeBank>(
    stack: &Stack<B>,
    index: usize,
    expected: &[Tag],
    kind: ErrorKind,
) -> Result<()> {
    let cell = stack.cell(index);
    if !expected.contains(&cell.tag()) {
        return Err(StackError::new(kind, cell.location).with_opcode(stack.current_opcode()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::InMemoryBank;
    use crate::location::Location;
    use crate::opcode::Opcode;
    use crate::stack::Stack;

    #[test]
    fn arity_mismatch_reports_invalid_frame() {
        let mut stack = Stack::new(InMemoryBank::new());
        stack.push_op(Opcode::MK_NOT, Location::new(1, 1)).unwrap();
        stack.push_bool(true, Location::new(1, 2)).unwrap();
        stack.push_bool(false, Location::new(1, 3)).unwrap();
        let err = stack.evaluate().unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidFrame);
    }
}

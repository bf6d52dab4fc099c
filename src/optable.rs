//! Operator table (spec §4.3): a dense map from opcode to
//! (associative flag, check function, eval function), extensible at
//! runtime so dialect variants (spec §9) can replace a predefined
//! opcode's behavior without touching the core -- see `Stack::register`
//! for the entry point callers use to do so.

use crate::error::Result;
use crate::opcode::Opcode;
use crate::value::Cell;

/// `check[op](stack, first_arg_index, arg_count)`. Checks only read the
/// stack (spec §4.6: "Checks never mutate the stack").
pub type CheckFn<B> = fn(&crate::stack::Stack<B>, usize, usize) -> Result<()>;

/// `eval[op](stack, first_arg_index, arg_count)`, returning the single
/// result cell that replaces the collapsed frame.
pub type EvalFn<B> = fn(&mut crate::stack::Stack<B>, usize, usize) -> Result<Cell>;

pub struct OpEntry<B> {
    pub associative: bool,
    pub check: CheckFn<B>,
    pub eval: EvalFn<B>,
}

// Derive(Clone/Copy) would require B: Clone, which is irrelevant here since
// B never appears in the struct by value -- implement by hand instead.
impl<B> Clone for OpEntry<B> {
    fn clone(&self) -> Self {
        OpEntry { associative: self.associative, check: self.check, eval: self.eval }
    }
}
impl<B> Copy for OpEntry<B> {}

pub struct OperatorTable<B> {
    entries: Vec<Option<OpEntry<B>>>,
}

impl<B> OperatorTable<B> {
    pub fn new(capacity: usize) -> Self {
        OperatorTable { entries: vec![None; capacity] }
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Inserts or replaces the entry for `opcode`. Panics if `opcode` is
    /// out of the table's declared bounds -- that is a construction-time
    /// programming error, not a runtime `StackError`.
    pub fn register(&mut self, opcode: Opcode, associative: bool, check: CheckFn<B>, eval: EvalFn<B>) {
        let index = opcode.raw() as usize;
        assert!(index < self.entries.len(), "opcode {} outside table capacity {}", opcode, self.entries.len());
        self.entries[index] = Some(OpEntry { associative, check, eval });
    }

    pub fn is_registered(&self, opcode: Opcode) -> bool {
        self.entry(opcode).is_some()
    }

    pub fn is_associative(&self, opcode: Opcode) -> bool {
        self.entry(opcode).map(|e| e.associative).unwrap_or(false)
    }

    pub fn entry(&self, opcode: Opcode) -> Option<OpEntry<B>> {
        let index = opcode.raw() as usize;
        self.entries.get(index).copied().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::InMemoryBank;
    use crate::value::Cell;

    fn noop_check(_s: &crate::stack::Stack<InMemoryBank>, _f: usize, _n: usize) -> Result<()> {
        Ok(())
    }
    fn noop_eval(_s: &mut crate::stack::Stack<InMemoryBank>, _f: usize, _n: usize) -> Result<Cell> {
        unreachable!()
    }

    #[test]
    fn register_and_query() {
        let mut table: OperatorTable<InMemoryBank> = OperatorTable::new(8);
        assert!(!table.is_registered(Opcode::MK_AND));
        table.register(Opcode::MK_AND, true, noop_check, noop_eval);
        assert!(table.is_registered(Opcode::MK_AND));
        assert!(table.is_associative(Opcode::MK_AND));
    }

    #[test]
    fn replace_under_same_opcode() {
        let mut table: OperatorTable<InMemoryBank> = OperatorTable::new(8);
        table.register(Opcode::MK_BV_CONST, false, noop_check, noop_eval);
        table.register(Opcode::MK_BV_CONST, true, noop_check, noop_eval);
        assert!(table.is_associative(Opcode::MK_BV_CONST));
    }
}

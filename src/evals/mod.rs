//! Per-family evaluators (spec §4 component 6, §4.8).
//!
//! Each submodule owns one row of the predefined opcode table: a
//! `check`/`eval` pair per opcode plus an `install` function that
//! registers them. `install_predefined` (called once from
//! `Stack::with_config`) wires every family into a fresh
//! `OperatorTable`; dialect variants (spec §9) register replacements
//! for a subset of these opcodes afterward, under the same numeric
//! opcodes.

pub(crate) mod common;

mod arith;
mod bindings;
mod bv_arith;
mod bv_atoms;
mod bv_logic;
mod definitions;
mod extract;
mod polymorphic;
mod propositional;
mod types;

use crate::bank::{TermBank, TypeBank};
use crate::optable::OperatorTable;

pub(crate) fn install_predefined<B: TermBank + TypeBank>(mut table: OperatorTable<B>) -> OperatorTable<B> {
    definitions::install(&mut table);
    bindings::install(&mut table);
    types::install(&mut table);
    propositional::install(&mut table);
    polymorphic::install(&mut table);
    arith::install(&mut table);
    bv_arith::install(&mut table);
    bv_logic::install(&mut table);
    bv_atoms::install(&mut table);
    extract::install(&mut table);
    table
}

//! Universal invariants (spec.md §8), property-tested over small hand-built
//! push/eval sequences rather than a randomized harness: each test isolates
//! one invariant against a sequence chosen to exercise it.

use pretty_assertions::assert_eq;

use termstack::buffers::BufferPool;
use termstack::{bank::InMemoryBank, coerce, ErrorKind, Location, Opcode, Stack, Tag, TermBank};

fn loc(line: u32) -> Location {
    Location::new(line, 1)
}

// 1. Frame well-formedness: `top >= 1` and the frame chain always reaches
// the sentinel through strictly decreasing indices.
#[test]
fn frame_well_formedness_holds_through_nested_pushes() {
    let mut stack = Stack::new(InMemoryBank::new());
    assert!(stack.len() >= 1);
    stack.push_op(Opcode::BUILD_TERM, loc(1)).unwrap();
    stack.push_op(Opcode::MK_NOT, loc(1)).unwrap();
    stack.push_op(Opcode::MK_AND, loc(1)).unwrap();
    stack.push_true(loc(1)).unwrap();
    stack.push_false(loc(1)).unwrap();
    assert!(stack.len() >= 1);
    assert!(stack.current_frame_index() > 0);
    stack.evaluate().unwrap(); // MK_AND
    stack.evaluate().unwrap(); // MK_NOT
    stack.evaluate().unwrap(); // BUILD_TERM
    assert_eq!(stack.current_frame_index(), 0);
    assert_eq!(stack.len(), 1);
}

// 2. Arena/frame parity: the number of open arena scopes equals the
// number of enclosing OP frames whose opcode is not BIND -- counting the
// always-present sentinel frame and the always-present root scope, so the
// two counters start (and end) equal, not one apart.
#[test]
fn arena_scope_depth_tracks_open_non_bind_frames() {
    let mut stack = Stack::new(InMemoryBank::new());
    assert_eq!(stack.arena_scope_depth(), stack.open_non_bind_frame_count());
    assert_eq!(stack.arena_scope_depth(), 1);

    stack.push_op(Opcode::LET, loc(1)).unwrap();
    assert_eq!(stack.arena_scope_depth(), stack.open_non_bind_frame_count());
    assert_eq!(stack.arena_scope_depth(), 2);

    stack.push_op(Opcode::BIND, loc(1)).unwrap();
    // BIND opens a frame but not a scope: parity still holds because
    // open_non_bind_frame_count skips it.
    assert_eq!(stack.arena_scope_depth(), stack.open_non_bind_frame_count());
    assert_eq!(stack.arena_scope_depth(), 2);

    stack.push_symbol("x", loc(1)).unwrap();
    stack.push_rational("1", loc(1)).unwrap();
    stack.evaluate().unwrap(); // BIND
    assert_eq!(stack.arena_scope_depth(), stack.open_non_bind_frame_count());
    assert_eq!(stack.arena_scope_depth(), 2);

    stack.push_symbol("x", loc(1)).unwrap();
    stack.evaluate().unwrap(); // LET
    assert_eq!(stack.arena_scope_depth(), stack.open_non_bind_frame_count());
    assert_eq!(stack.arena_scope_depth(), 1);
}

// 3. Buffer exclusivity: a kind's pool slot and any outstanding instance
// are never both live; recycling never hands back more than was acquired.
#[test]
fn buffer_pool_never_holds_two_live_instances_of_one_kind() {
    let mut pool = BufferPool::new();
    let a = pool.acquire_small_bv_poly(8);
    let b = pool.acquire_small_bv_poly(8); // pool slot was empty, manufactures a second instance
    pool.recycle_small_bv_poly(a);
    // Pool now holds exactly one; recycling the second on top of a full
    // slot must not silently duplicate it.
    pool.recycle_small_bv_poly(b);
    let c = pool.acquire_small_bv_poly(8);
    let d = pool.acquire_small_bv_poly(8);
    // Only one of the two recycled buffers could have been in the slot;
    // the other acquire manufactures fresh, so there is never an aliasing
    // path back to a buffer already embedded in a live stack cell.
    pool.recycle_small_bv_poly(c);
    pool.recycle_small_bv_poly(d);
}

// 3b. The same exclusivity, exercised through a live `Stack` fold instead
// of the pool in isolation: a fully-constant MK_BV_ADD leaves a
// `BvSmallBuffer` cell on the stack, `BUILD_TERM` materializes it via
// `coerce::to_term`, and the pool slot is free again once the result is
// gone (spec §4.2, §4.7 "or any BV/RATIONAL/accumulator form").
#[test]
fn bv_add_fold_round_trips_through_the_live_buffer_pool() {
    let mut stack = Stack::new(InMemoryBank::new());
    stack.push_op(Opcode::BUILD_TERM, loc(1)).unwrap();
    stack.push_op(Opcode::MK_BV_ADD, loc(1)).unwrap();
    stack.push_bv_bin("0011", loc(1)).unwrap();
    stack.push_bv_bin("0001", loc(1)).unwrap();
    stack.evaluate().unwrap(); // MK_BV_ADD
    let index = stack.len() - 1;
    assert_eq!(stack.tag_at(index), Tag::BvSmallBuffer);
    assert!(stack.outstanding_buffers().bv_small);
    let (width, value) = coerce::to_bv_constant(&stack, index).unwrap();
    assert_eq!(width, 4);
    assert_eq!(value, num::BigUint::from(0b0100u32));
    stack.evaluate().unwrap(); // BUILD_TERM, pops outright and recycles the buffer cell
    assert!(!stack.outstanding_buffers().bv_small);
}

// 8b. Identity extract on a symbolic (already-built-term) operand: spec
// §4.8's identity rule is stated generally, not just for literal constants,
// and must hand the operand's own term handle back unchanged rather than
// interning a fresh `extract(...)` term.
#[test]
fn identity_extract_reproduces_a_symbolic_term_unchanged() {
    let mut stack = Stack::new(InMemoryBank::new());
    stack.push_op(Opcode::LET, loc(1)).unwrap();
    stack.push_op(Opcode::DECLARE_VAR, loc(1)).unwrap();
    stack.push_symbol("x", loc(1)).unwrap();
    stack.push_op(Opcode::MK_BV_TYPE, loc(1)).unwrap();
    stack.push_rational("4", loc(1)).unwrap();
    stack.evaluate().unwrap(); // MK_BV_TYPE
    stack.evaluate().unwrap(); // DECLARE_VAR
    let declared = stack.bank().resolve_term_name("x").unwrap();

    stack.push_op(Opcode::MK_BV_EXTRACT, loc(1)).unwrap();
    stack.push_rational("3", loc(1)).unwrap();
    stack.push_rational("0", loc(1)).unwrap();
    stack.push_term_by_name("x", loc(1)).unwrap();
    stack.evaluate().unwrap(); // MK_BV_EXTRACT -- LET body
    stack.evaluate().unwrap(); // LET, restores the name map

    let index = stack.len() - 1;
    assert_eq!(stack.tag_at(index), Tag::Term);
    let result = coerce::to_term(&mut stack, index).unwrap();
    assert_eq!(result, declared);
    assert!(!stack.bank().is_term_name_bound("x"));
}

// 4. Name-map parity: a live binding cell's name resolves in the bank;
// freeing the cell removes the mapping (or restores whatever it shadowed).
#[test]
fn name_map_parity_across_bind_lifecycle() {
    let mut stack = Stack::new(InMemoryBank::new());
    assert!(!stack.bank().is_term_name_bound("x"));

    stack.push_op(Opcode::LET, loc(1)).unwrap();
    stack.push_op(Opcode::BIND, loc(1)).unwrap();
    stack.push_symbol("x", loc(1)).unwrap();
    stack.push_rational("1", loc(1)).unwrap();
    stack.evaluate().unwrap(); // BIND
    assert!(stack.bank().is_term_name_bound("x"));

    stack.push_symbol("x", loc(1)).unwrap();
    stack.evaluate().unwrap(); // LET pops the BIND cell, restoring the name map
    assert!(!stack.bank().is_term_name_bound("x"));
}

// 5. Associativity fold equivalence: folding via repeated pushes of the
// same associative opcode (multiplicity) matches one flat frame.
#[test]
fn associative_fold_matches_flat_frame() {
    let mut via_fold = Stack::new(InMemoryBank::new());
    via_fold.push_op(Opcode::BUILD_TERM, loc(1)).unwrap();
    via_fold.push_op(Opcode::MK_BV_ADD, loc(1)).unwrap();
    via_fold.push_op(Opcode::MK_BV_ADD, loc(1)).unwrap(); // multiplicity += 1
    via_fold.push_op(Opcode::MK_BV_ADD, loc(1)).unwrap(); // multiplicity += 1
    assert_eq!(via_fold.current_multiplicity(), 2);
    via_fold.push_bv_bin("0011", loc(1)).unwrap();
    via_fold.push_bv_bin("0001", loc(1)).unwrap();
    via_fold.push_bv_bin("0010", loc(1)).unwrap();
    via_fold.evaluate().unwrap(); // multiplicity 2 -> 1, no dispatch yet
    via_fold.evaluate().unwrap(); // multiplicity 1 -> 0, no dispatch yet
    via_fold.evaluate().unwrap(); // multiplicity 0, dispatches eval_bv_add over all 3 args
    via_fold.evaluate().unwrap(); // BUILD_TERM
    let folded_result = via_fold.result_term().unwrap();

    let mut flat = Stack::new(InMemoryBank::new());
    flat.push_op(Opcode::BUILD_TERM, loc(1)).unwrap();
    flat.push_op(Opcode::MK_BV_ADD, loc(1)).unwrap();
    flat.push_bv_bin("0011", loc(1)).unwrap();
    flat.push_bv_bin("0001", loc(1)).unwrap();
    flat.push_bv_bin("0010", loc(1)).unwrap();
    flat.evaluate().unwrap();
    flat.evaluate().unwrap();
    let flat_result = flat.result_term().unwrap();

    assert_eq!(
        via_fold.bank().bv_constant_value(folded_result),
        flat.bank().bv_constant_value(flat_result)
    );
}

// 6. Coercion idempotence: pushing a pre-built term handle and coercing it
// straight back yields the same handle, untouched.
#[test]
fn coercion_idempotence_on_a_pre_built_term() {
    let mut stack = Stack::new(InMemoryBank::new());
    let t = stack.bank_mut().true_term();
    stack.push_term(t, loc(1)).unwrap();
    let index = stack.len() - 1;
    let coerced = coerce::to_term(&mut stack, index).unwrap();
    assert_eq!(coerced, t);
}

// 7. Reset soundness: after a forced error, reset() restores exactly the
// state of a fresh stack -- same length, same frame index, same scope
// depth, no leaked poisoning.
#[test]
fn reset_restores_fresh_state_after_error() {
    let mut stack = Stack::new(InMemoryBank::new());
    stack.push_op(Opcode::MK_NOT, loc(1)).unwrap();
    stack.push_true(loc(1)).unwrap();
    stack.push_true(loc(1)).unwrap(); // one argument too many
    assert!(stack.evaluate().is_err());
    assert!(stack.is_poisoned());
    stack.reset();

    let fresh = Stack::new(InMemoryBank::new());
    assert_eq!(stack.len(), fresh.len());
    assert_eq!(stack.current_frame_index(), fresh.current_frame_index());
    assert_eq!(stack.arena_scope_depth(), fresh.arena_scope_depth());
    assert!(!stack.is_poisoned());
    assert!(stack.install_unwind_anchor().is_ok());
}

// 8. Identity extract: BV_EXTRACT(size-1, 0, bv) reproduces bv exactly.
#[test]
fn identity_extract_reproduces_the_source_literal() {
    let mut stack = Stack::new(InMemoryBank::new());
    stack.push_op(Opcode::MK_BV_EXTRACT, loc(1)).unwrap();
    stack.push_int(3, loc(1)).unwrap(); // high = size - 1
    stack.push_int(0, loc(1)).unwrap(); // low = 0
    stack.push_bv_bin("1010", loc(1)).unwrap();
    stack.evaluate().unwrap();
    let index = stack.len() - 1;
    assert_eq!(stack.tag_at(index), Tag::BvSmall);
    let (width, value) = coerce::to_bv_constant(&stack, index).unwrap();
    assert_eq!(width, 4);
    assert_eq!(value, num::BigUint::from(0b1010u32));
}

// 9. Binding scoping: a BIND inside a LET resolves inside the LET body and
// is gone once the LET has evaluated.
#[test]
fn bind_inside_let_is_scoped_to_the_let_body() {
    let mut stack = Stack::new(InMemoryBank::new());
    stack.push_op(Opcode::BUILD_TERM, loc(1)).unwrap();
    stack.push_op(Opcode::LET, loc(1)).unwrap();
    stack.push_op(Opcode::BIND, loc(1)).unwrap();
    stack.push_symbol("x", loc(1)).unwrap();
    stack.push_rational("1", loc(1)).unwrap();
    stack.evaluate().unwrap(); // BIND
    assert!(stack.bank().is_term_name_bound("x"));
    stack.push_symbol("x", loc(1)).unwrap();
    stack.evaluate().unwrap(); // LET
    assert!(!stack.bank().is_term_name_bound("x"));
    stack.evaluate().unwrap(); // BUILD_TERM
    assert!(stack.result_term().is_ok());
}

// 10. Opcode validity gate (SPEC_FULL §8 property 10): an opcode below the
// table's capacity but never registered is OP_NOT_IMPLEMENTED; one beyond
// capacity is INVALID_OP.
#[test]
fn opcode_validity_gate_distinguishes_unimplemented_from_out_of_range() {
    let mut stack = Stack::new(InMemoryBank::new());
    let unimplemented = Opcode(termstack::opcode::PREDEFINED_COUNT as u32);
    let err = stack.push_op(unimplemented, loc(1)).unwrap_err();
    assert_eq!(err.kind, ErrorKind::OpNotImplemented);
    stack.reset();

    let out_of_range = Opcode(termstack::opcode::DEFAULT_CAPACITY as u32 + 1);
    let err = stack.push_op(out_of_range, loc(1)).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidOp);
}

// 11. Multiplicity never negative (SPEC_FULL §8 property 11): evaluating
// an associative frame decrements multiplicity one step at a time and
// never underflows past zero; the final evaluate dispatches exactly once.
#[test]
fn multiplicity_decrements_to_zero_without_underflow() {
    let mut stack = Stack::new(InMemoryBank::new());
    stack.push_op(Opcode::MK_AND, loc(1)).unwrap();
    stack.push_op(Opcode::MK_AND, loc(1)).unwrap();
    stack.push_op(Opcode::MK_AND, loc(1)).unwrap();
    assert_eq!(stack.current_multiplicity(), 2);
    stack.push_true(loc(1)).unwrap();
    stack.push_true(loc(1)).unwrap();
    stack.push_true(loc(1)).unwrap();
    stack.evaluate().unwrap();
    assert_eq!(stack.current_multiplicity(), 1);
    stack.evaluate().unwrap();
    assert_eq!(stack.current_multiplicity(), 0);
    stack.evaluate().unwrap(); // dispatches once, current_frame_index returns to sentinel
    assert_eq!(stack.current_frame_index(), 0);
}

//! End-to-end scenarios S1-S6 (spec.md §8).

use pretty_assertions::assert_eq;

use num::rational::BigRational;
use num::{BigInt, BigUint};
use termstack::bank::{InMemoryBank, TermCtor};
use termstack::{coerce, ErrorKind, Location, Opcode, Stack, TermBank};

fn loc(line: u32) -> Location {
    Location::new(line, 1)
}

/// S1. `(build-term (and true false))` denotes `false`.
#[test]
fn s1_and_of_true_false_builds_false() {
    let mut stack = Stack::new(InMemoryBank::new());
    stack.push_op(Opcode::BUILD_TERM, loc(1)).unwrap();
    stack.push_op(Opcode::MK_AND, loc(1)).unwrap();
    stack.push_true(loc(1)).unwrap();
    stack.push_false(loc(1)).unwrap();
    stack.evaluate().unwrap(); // MK_AND
    stack.evaluate().unwrap(); // BUILD_TERM
    let result = stack.result_term().unwrap();
    assert_eq!(stack.bank().bool_constant_value(result), Some(false));
}

/// S2. `(build-term (bvadd #b0011 #b0001))` denotes the 4-bit constant
/// `0b0100`. Exercises the associative fold collapsing straight to a
/// pool-backed `BvSmallBuffer` cell, which `BUILD_TERM` must still coerce
/// into a term.
#[test]
fn s2_bvadd_of_two_constants_folds_to_the_sum() {
    let mut stack = Stack::new(InMemoryBank::new());
    stack.push_op(Opcode::BUILD_TERM, loc(1)).unwrap();
    stack.push_op(Opcode::MK_BV_ADD, loc(1)).unwrap();
    stack.push_bv_bin("0011", loc(1)).unwrap();
    stack.push_bv_bin("0001", loc(1)).unwrap();
    stack.evaluate().unwrap(); // MK_BV_ADD
    stack.evaluate().unwrap(); // BUILD_TERM
    let result = stack.result_term().unwrap();
    assert_eq!(stack.bank().bv_constant_value(result), Some((4, BigUint::from(0b0100u32))));
}

/// S3. `(build-term (extract 3 0 #b1010))` is an identity extract: the
/// result denotes exactly the input literal.
#[test]
fn s3_identity_extract_equals_the_input_literal() {
    let mut stack = Stack::new(InMemoryBank::new());
    stack.push_op(Opcode::BUILD_TERM, loc(1)).unwrap();
    stack.push_op(Opcode::MK_BV_EXTRACT, loc(1)).unwrap();
    stack.push_rational("3", loc(1)).unwrap();
    stack.push_rational("0", loc(1)).unwrap();
    stack.push_bv_bin("1010", loc(1)).unwrap();
    stack.evaluate().unwrap(); // MK_BV_EXTRACT
    stack.evaluate().unwrap(); // BUILD_TERM
    let result = stack.result_term().unwrap();
    let expected = stack.bank_mut().build_term(TermCtor::BvConst(4, BigUint::from(0b1010u32))).unwrap();
    assert_eq!(result, expected);
}

/// S4. Adding two bit-vector literals of different widths fails
/// `INCOMPATIBLE_BVSIZES`, located at the second literal.
#[test]
fn s4_bvadd_of_mismatched_widths_is_incompatible_bvsizes() {
    let mut stack = Stack::new(InMemoryBank::new());
    stack.push_op(Opcode::MK_BV_ADD, loc(1)).unwrap();
    stack.push_bv_bin("0000", loc(10)).unwrap(); // 4 bits
    stack.push_bv_bin("00000000", loc(20)).unwrap(); // 8 bits
    let err = stack.evaluate().unwrap_err();
    assert_eq!(err.kind, ErrorKind::IncompatibleBvsizes);
    assert_eq!(err.location, loc(20));
}

/// S5. `(build-term (let ((x (bind 1))) x))` denotes the integer 1; once
/// the LET has evaluated, `x` is no longer a bound name.
#[test]
fn s5_let_bind_resolves_in_body_and_unwinds_after() {
    let mut stack = Stack::new(InMemoryBank::new());
    stack.push_op(Opcode::BUILD_TERM, loc(1)).unwrap();
    stack.push_op(Opcode::LET, loc(1)).unwrap();
    stack.push_op(Opcode::BIND, loc(1)).unwrap();
    stack.push_symbol("x", loc(1)).unwrap();
    stack.push_rational("1", loc(1)).unwrap();
    stack.evaluate().unwrap(); // BIND
    stack.push_symbol("x", loc(1)).unwrap();
    stack.evaluate().unwrap(); // LET
    assert!(!stack.bank().is_term_name_bound("x"));
    stack.evaluate().unwrap(); // BUILD_TERM
    let result = stack.result_term().unwrap();
    let expected = stack
        .bank_mut()
        .build_term(TermCtor::RationalConst(num::rational::BigRational::from_integer(1.into())))
        .unwrap();
    assert_eq!(result, expected);
}

/// S6. `(bvpow #b00000000 -2)` fails `NEGATIVE_EXPONENT`: the exponent
/// coercion rejects a negative rational before any folding is attempted.
#[test]
fn s6_bvpow_with_negative_exponent_is_negative_exponent() {
    let mut stack = Stack::new(InMemoryBank::new());
    stack.push_op(Opcode::MK_BV_POW, loc(1)).unwrap();
    stack.push_bv_bin("00000000", loc(1)).unwrap();
    stack.push_rational("-2", loc(1)).unwrap();
    let err = stack.evaluate().unwrap_err();
    assert_eq!(err.kind, ErrorKind::NegativeExponent);
}

/// Coercion idempotence sanity check reused across scenarios: pushing a
/// BV constant and immediately coercing it to a term round-trips through
/// the bank without losing the value.
#[test]
fn coercing_a_bv_literal_preserves_its_value() {
    let mut stack = Stack::new(InMemoryBank::new());
    stack.push_bv_hex("ff", loc(1)).unwrap();
    let index = stack.len() - 1;
    let term = coerce::to_term(&mut stack, index).unwrap();
    assert_eq!(stack.bank().bv_constant_value(term), Some((8, BigUint::from(0xffu32))));
}

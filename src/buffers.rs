//! Recyclable accumulator buffers (spec §3 component 3, §4.2, §9 "Recyclable
//! buffers").
//!
//! Each buffer kind models the *shape* of a partial arithmetic or logic
//! accumulation; the actual polynomial/bignum arithmetic that drives it is
//! an external collaborator (spec §1), so these types only carry enough
//! state to fold constant arguments and to be hashed/compared/handed to the
//! external term builder. The pool holds at most one instance of each kind;
//! ownership moves to whichever stack cell is currently using it (spec
//! invariant 4).

use crate::value::TermHandle;
use num::BigUint;
use num::rational::BigRational;
use num::Zero;

/// Accumulates a rational linear combination. Only the constant part is
/// tracked here; a non-constant contribution forces the caller to
/// materialize a term via the external builder instead of folding further.
#[derive(Clone, Debug, PartialEq)]
pub struct RatPolyBuffer {
    pub constant: BigRational,
}

impl RatPolyBuffer {
    fn reset(&mut self) {
        self.constant = BigRational::zero();
    }

    pub fn add_constant(&mut self, value: &BigRational) {
        self.constant += value;
    }

    pub fn negate(&mut self) {
        self.constant = -self.constant.clone();
    }

    pub fn mul_constant(&mut self, value: &BigRational) {
        self.constant *= value;
    }
}

/// Accumulates a bit-vector linear combination (addition/multiplication) of
/// a fixed bit width. Used for both the small (<=64 bit) and wide (>64 bit)
/// carriers; the distinguishing tag lives on the stack cell, not here.
#[derive(Clone, Debug, PartialEq)]
pub struct BvPolyBuffer {
    pub bitsize: u32,
    pub constant: BigUint,
}

impl BvPolyBuffer {
    fn reset(&mut self, bitsize: u32) {
        self.bitsize = bitsize;
        self.constant = BigUint::zero();
    }

    fn mask(&self) -> BigUint {
        (BigUint::from(1u32) << self.bitsize as usize) - BigUint::from(1u32)
    }

    pub fn add_constant(&mut self, value: &BigUint) {
        self.constant = (&self.constant + value) & self.mask();
    }

    pub fn mul_constant(&mut self, value: &BigUint) {
        self.constant = (&self.constant * value) & self.mask();
    }

    pub fn negate(&mut self) {
        let modulus = self.mask() + BigUint::from(1u32);
        self.constant = (&modulus - &self.constant) % &modulus;
    }
}

/// One bit of a bit-vector logic accumulator: either a known boolean or a
/// symbolic boolean term.
#[derive(Clone, Debug, PartialEq)]
pub enum LogicBit {
    Const(bool),
    Symbolic(TermHandle),
}

/// Accumulates a bit-vector value bit by bit, least-significant bit first.
/// Used by the logic family of opcodes (bitwise ops, shifts, extract,
/// concat) when at least one operand is not a plain numeric constant.
#[derive(Clone, Debug, PartialEq)]
pub struct BvLogicBuffer {
    pub bits: Vec<LogicBit>,
}

impl BvLogicBuffer {
    fn reset(&mut self, bitsize: u32) {
        self.bits.clear();
        self.bits.resize(bitsize as usize, LogicBit::Const(false));
    }

    pub fn bitsize(&self) -> u32 {
        self.bits.len() as u32
    }

    pub fn is_constant(&self) -> bool {
        self.bits.iter().all(|b| matches!(b, LogicBit::Const(_)))
    }

    pub fn to_small_constant(&self) -> Option<u64> {
        if self.bits.len() > 64 || !self.is_constant() {
            return None;
        }
        let mut value = 0u64;
        for (i, bit) in self.bits.iter().enumerate() {
            if let LogicBit::Const(true) = bit {
                value |= 1u64 << i;
            }
        }
        Some(value)
    }

    /// The arbitrary-width constant this buffer holds, or `None` if any bit
    /// is still symbolic. Unlike `to_small_constant`, not capped at 64 bits.
    pub fn to_biguint_constant(&self) -> Option<BigUint> {
        if !self.is_constant() {
            return None;
        }
        let mut value = BigUint::zero();
        for (i, bit) in self.bits.iter().enumerate() {
            if let LogicBit::Const(true) = bit {
                value = value | (BigUint::from(1u32) << i);
            }
        }
        Some(value)
    }

    /// Overwrites every bit from an arbitrary-width constant, least
    /// significant bit first, truncating/zero-extending to `bitsize()`.
    pub fn set_constant(&mut self, value: &BigUint) {
        for (i, bit) in self.bits.iter_mut().enumerate() {
            *bit = LogicBit::Const(value.bit(i as u64));
        }
    }
}

/// The four at-most-one-instance-per-kind accumulator slots (spec §4.2).
#[derive(Default)]
pub struct BufferPool {
    rat: Option<RatPolyBuffer>,
    bv_small: Option<BvPolyBuffer>,
    bv_wide: Option<BvPolyBuffer>,
    logic: Option<BvLogicBuffer>,
}

/// Which buffer kinds are currently checked out of the pool. Diagnostic
/// only (SPEC_FULL §4.2); used by the buffer-exclusivity property test.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Outstanding {
    pub rat: bool,
    pub bv_small: bool,
    pub bv_wide: bool,
    pub logic: bool,
}

impl BufferPool {
    pub fn new() -> Self {
        BufferPool::default()
    }

    pub fn acquire_rat_poly(&mut self) -> RatPolyBuffer {
        let mut buf = self.rat.take().unwrap_or_else(|| RatPolyBuffer {
            constant: BigRational::zero(),
        });
        buf.reset();
        buf
    }

    pub fn recycle_rat_poly(&mut self, buf: RatPolyBuffer) {
        if self.rat.is_none() {
            self.rat = Some(buf);
        }
    }

    pub fn acquire_small_bv_poly(&mut self, bitsize: u32) -> BvPolyBuffer {
        let mut buf = self.bv_small.take().unwrap_or_else(|| BvPolyBuffer {
            bitsize,
            constant: BigUint::zero(),
        });
        buf.reset(bitsize);
        buf
    }

    pub fn recycle_small_bv_poly(&mut self, buf: BvPolyBuffer) {
        if self.bv_small.is_none() {
            self.bv_small = Some(buf);
        }
    }

    pub fn acquire_wide_bv_poly(&mut self, bitsize: u32) -> BvPolyBuffer {
        let mut buf = self.bv_wide.take().unwrap_or_else(|| BvPolyBuffer {
            bitsize,
            constant: BigUint::zero(),
        });
        buf.reset(bitsize);
        buf
    }

    pub fn recycle_wide_bv_poly(&mut self, buf: BvPolyBuffer) {
        if self.bv_wide.is_none() {
            self.bv_wide = Some(buf);
        }
    }

    pub fn acquire_logic(&mut self, bitsize: u32) -> BvLogicBuffer {
        let mut buf = self.logic.take().unwrap_or_else(|| BvLogicBuffer { bits: Vec::new() });
        buf.reset(bitsize);
        buf
    }

    pub fn recycle_logic(&mut self, buf: BvLogicBuffer) {
        if self.logic.is_none() {
            self.logic = Some(buf);
        }
    }

    pub fn outstanding(&self) -> Outstanding {
        Outstanding {
            rat: self.rat.is_none(),
            bv_small: self.bv_small.is_none(),
            bv_wide: self.bv_wide.is_none(),
            logic: self.logic.is_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_then_recycle_restores_slot() {
        let mut pool = BufferPool::new();
        let buf = pool.acquire_rat_poly();
        assert!(pool.rat.is_none());
        pool.recycle_rat_poly(buf);
        assert!(pool.rat.is_some());
    }

    #[test]
    fn double_acquire_never_aliases() {
        let mut pool = BufferPool::new();
        let a = pool.acquire_small_bv_poly(8);
        // pool slot is empty; a second acquire must manufacture a fresh one,
        // never hand out the same buffer twice.
        let b = pool.acquire_small_bv_poly(8);
        pool.recycle_small_bv_poly(a);
        pool.recycle_small_bv_poly(b);
    }

    #[test]
    fn bv_poly_wraps_on_overflow() {
        let mut pool = BufferPool::new();
        let mut buf = pool.acquire_small_bv_poly(4);
        buf.add_constant(&BigUint::from(15u32));
        buf.add_constant(&BigUint::from(2u32));
        assert_eq!(buf.constant, BigUint::from(1u32));
    }

    #[test]
    fn logic_buffer_round_trips_constant() {
        let mut pool = BufferPool::new();
        let mut buf = pool.acquire_logic(4);
        for (i, v) in [true, true, false, false].iter().enumerate() {
            buf.bits[i] = LogicBit::Const(*v);
        }
        assert_eq!(buf.to_small_constant(), Some(0b0011));
    }
}

//! Stack engine (spec §3 "Stack", §4.4, §4.5, §4.10).
//!
//! `Stack<B>` is the push-down container described by the whole
//! specification: a value array of `Cell`s, a chain of operator frames
//! rooted at a sentinel, the scoped string arena, the recyclable buffer
//! pool, and the operator table. `B` is the external term/type bank the
//! stack is generic over (spec §6); `InMemoryBank` (`crate::bank`) is the
//! reference adapter used by this crate's own tests.

use num::rational::BigRational;
use num::{BigInt, BigUint, Num, ToPrimitive, Zero};

use crate::arena::Arena;
use crate::bank::{TermBank, TypeBank, TypeCtor};
use crate::buffers::BufferPool;
use crate::config::StackConfig;
use crate::error::{ErrorKind, Result, StackError};
use crate::location::Location;
use crate::opcode::Opcode;
use crate::optable::OperatorTable;
use crate::value::{BvSmall, BvWide, Cell, MacroHandle, OpFrame, Payload, Tag, TermHandle, TypeHandle};

/// What `BUILD_TERM`/`BUILD_TYPE` deposited, if anything (spec §4.8
/// "Extract", §6 "Result extraction").
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ResultSlot {
    Term(TermHandle),
    Type(TypeHandle),
}

pub struct Stack<B> {
    elements: Vec<Cell>,
    current_frame_index: usize,
    current_opcode: Opcode,
    arena: Arena,
    pool: BufferPool,
    optable: OperatorTable<B>,
    config: StackConfig,
    bank: B,
    result: Option<ResultSlot>,
    /// Set the moment any push/evaluate call fails; cleared only by
    /// `reset()`. While set, every further push/evaluate call fails
    /// immediately with `ErrorKind::Internal` instead of touching the
    /// stack -- this is the Result-returning encoding of the "must reset
    /// after an error escape" obligation from spec §4.10/§9.
    needs_reset: bool,
    /// Diagnostic counter incremented on every fresh uninterpreted term or
    /// fresh type created on this stack's behalf (spec §3 "fresh-variable
    /// counter" / "counter for nested type-variable creation"); surfaced
    /// only through `tracing` events, never through the public API.
    fresh_count: u64,
}

impl<B: TermBank + TypeBank> Stack<B> {
    pub fn new(bank: B) -> Self {
        Self::with_config(bank, StackConfig::default())
    }

    pub fn with_config(bank: B, config: StackConfig) -> Self {
        let mut elements = Vec::with_capacity(config.initial_capacity.max(1));
        elements.push(Cell::new(
            Payload::Op(OpFrame { opcode: Opcode::NO_OP, multiplicity: 0, previous_frame_index: None }),
            Location::unknown(),
        ));
        let optable = crate::evals::install_predefined(OperatorTable::new(config.operator_table_capacity));
        tracing::debug!(capacity = config.initial_capacity, "termstack: new stack");
        Stack {
            elements,
            current_frame_index: 0,
            current_opcode: Opcode::NO_OP,
            arena: Arena::new(),
            pool: BufferPool::new(),
            optable,
            config,
            bank,
            result: None,
            needs_reset: false,
            fresh_count: 0,
        }
    }

    // -- extension (spec §4.3, §9 "Dialect variants") --------------------

    pub fn register(
        &mut self,
        opcode: Opcode,
        associative: bool,
        check: crate::optable::CheckFn<B>,
        eval: crate::optable::EvalFn<B>,
    ) {
        self.optable.register(opcode, associative, check, eval);
    }

    // -- bank access, used by checks/coerce/evals -------------------------

    pub fn bank(&self) -> &B {
        &self.bank
    }

    pub fn bank_mut(&mut self) -> &mut B {
        &mut self.bank
    }

    pub(crate) fn pool_mut(&mut self) -> &mut BufferPool {
        &mut self.pool
    }

    pub(crate) fn next_fresh_id(&mut self) -> u64 {
        self.fresh_count += 1;
        self.fresh_count
    }

    // -- introspection used by checks/coerce/evals and diagnostics --------

    pub fn cell(&self, index: usize) -> &Cell {
        &self.elements[index]
    }

    /// Moves the cell at `index` out, leaving a `Payload::None` placeholder
    /// behind. Used by evaluators that want to hand an argument cell's
    /// payload on unchanged as their result (e.g. identity `MK_BV_EXTRACT`)
    /// without cloning a buffer-owning payload and transiently doubling it.
    pub(crate) fn take_cell(&mut self, index: usize) -> Cell {
        let loc = self.elements[index].location;
        std::mem::replace(&mut self.elements[index], Cell::new(Payload::None, loc))
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn current_opcode(&self) -> Opcode {
        self.current_opcode
    }

    pub fn current_frame_index(&self) -> usize {
        self.current_frame_index
    }

    pub fn frame_location(&self) -> Location {
        self.elements[self.current_frame_index].location
    }

    /// The frame's fold multiplicity, used by the "associativity fold
    /// equivalence" property test (spec §8 property 5).
    pub fn current_multiplicity(&self) -> u32 {
        self.elements[self.current_frame_index].payload.as_op().map(|f| f.multiplicity).unwrap_or(0)
    }

    pub fn arena_scope_depth(&self) -> usize {
        self.arena.scope_depth()
    }

    /// Number of enclosing OP frames whose opcode is not BIND, walking the
    /// previous-frame chain from the current frame to the sentinel (spec
    /// §8 property 2, "arena/frame parity").
    pub fn open_non_bind_frame_count(&self) -> usize {
        let mut count = 0;
        let mut index = self.current_frame_index;
        loop {
            let frame = self.elements[index].payload.as_op().expect("frame chain cell must be OP");
            if frame.opcode != Opcode::BIND {
                count += 1;
            }
            match frame.previous_frame_index {
                Some(prev) => index = prev,
                None => break,
            }
        }
        count
    }

    pub fn outstanding_buffers(&self) -> crate::buffers::Outstanding {
        self.pool.outstanding()
    }

    pub fn is_poisoned(&self) -> bool {
        self.needs_reset
    }

    // -- command boundary (spec §4.10, §6 "Unwind anchor") ----------------

    /// Installed once per top-level parser command, before any push or
    /// evaluate. Fails if the previous command's error escape was never
    /// followed by `reset()` -- the caller forgot its obligation.
    pub fn install_unwind_anchor(&mut self) -> Result<()> {
        if self.needs_reset {
            return Err(StackError::new(ErrorKind::Internal, Location::unknown()));
        }
        Ok(())
    }

    fn guarded<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.needs_reset {
            return Err(StackError::new(ErrorKind::Internal, Location::unknown()));
        }
        match f(self) {
            Ok(v) => Ok(v),
            Err(e) => {
                tracing::warn!(kind = %e.kind, location = %e.location, "termstack: error escape");
                self.needs_reset = true;
                Err(e)
            }
        }
    }

    // -- push: operator frames (spec §4.4) --------------------------------

    pub fn push_op(&mut self, op: Opcode, loc: Location) -> Result<()> {
        self.guarded(|s| s.push_op_impl(op, loc))
    }

    fn push_op_impl(&mut self, op: Opcode, loc: Location) -> Result<()> {
        if !self.optable.is_registered(op) {
            let kind =
                if (op.raw() as usize) < self.optable.capacity() { ErrorKind::OpNotImplemented } else { ErrorKind::InvalidOp };
            return Err(StackError::new(kind, loc).with_opcode(op));
        }
        if self.optable.is_associative(op) && op == self.current_opcode {
            let frame = self.elements[self.current_frame_index].payload.as_op_mut().expect("current frame must be OP");
            frame.multiplicity += 1;
            tracing::trace!(opcode = %op, multiplicity = frame.multiplicity, "termstack: associative fold");
            return Ok(());
        }
        let previous_frame_index = Some(self.current_frame_index);
        let index = self.push_raw(Payload::Op(OpFrame { opcode: op, multiplicity: 0, previous_frame_index }), loc);
        self.current_frame_index = index;
        self.current_opcode = op;
        if op != Opcode::BIND {
            self.arena.push_scope();
        }
        tracing::trace!(opcode = %op, %loc, "termstack: open frame");
        Ok(())
    }

    // -- push: leaves (spec §4.4, §6) --------------------------------------

    pub fn push_string(&mut self, value: &str, loc: Location) -> Result<()> {
        self.guarded(|s| {
            let owned = String::from(s.arena.allocate(value));
            s.push_raw(Payload::String(owned), loc);
            Ok(())
        })
    }

    pub fn push_symbol(&mut self, name: &str, loc: Location) -> Result<()> {
        self.guarded(|s| {
            let owned = String::from(s.arena.allocate(name));
            s.push_raw(Payload::Symbol(owned), loc);
            Ok(())
        })
    }

    pub fn push_rational(&mut self, text: &str, loc: Location) -> Result<()> {
        self.guarded(|s| {
            let value = parse_rational(text).map_err(|e| match e {
                RationalParseError::Format => StackError::new(ErrorKind::RationalFormat, loc),
                RationalParseError::DivideByZero => StackError::new(ErrorKind::DivideByZero, loc),
            })?;
            s.push_raw(Payload::Rational(value), loc);
            Ok(())
        })
    }

    pub fn push_float(&mut self, text: &str, loc: Location) -> Result<()> {
        self.guarded(|s| {
            let value = parse_float(text).ok_or_else(|| StackError::new(ErrorKind::FloatFormat, loc))?;
            s.push_raw(Payload::Rational(value), loc);
            Ok(())
        })
    }

    pub fn push_bv_bin(&mut self, digits: &str, loc: Location) -> Result<()> {
        self.guarded(|s| {
            if digits.is_empty() || !digits.bytes().all(|b| b == b'0' || b == b'1') {
                return Err(StackError::new(ErrorKind::BvBinFormat, loc));
            }
            let bitsize = digits.len() as u32;
            let value = BigUint::from_str_radix(digits, 2).map_err(|_| StackError::new(ErrorKind::BvBinFormat, loc))?;
            s.push_bv_literal(bitsize, value, loc);
            Ok(())
        })
    }

    pub fn push_bv_hex(&mut self, digits: &str, loc: Location) -> Result<()> {
        self.guarded(|s| {
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(StackError::new(ErrorKind::BvHexFormat, loc));
            }
            // spec §9 open question: bitsize = 4 * digit count, no implicit
            // padding for non-multiple-of-four desired widths.
            let bitsize = digits.len() as u32 * 4;
            let value = BigUint::from_str_radix(digits, 16).map_err(|_| StackError::new(ErrorKind::BvHexFormat, loc))?;
            s.push_bv_literal(bitsize, value, loc);
            Ok(())
        })
    }

    fn push_bv_literal(&mut self, bitsize: u32, value: BigUint, loc: Location) {
        if bitsize == 0 {
            // Callers never construct an empty literal through push_bv_bin/
            // push_bv_hex (both reject empty digit strings), so this path
            // is unreachable in practice; kept for defensive normalization.
            self.push_raw(Payload::BvSmall(BvSmall::normalized(1, 0)), loc);
            return;
        }
        if bitsize <= 64 {
            let small = value.to_u64().unwrap_or(0);
            self.push_raw(Payload::BvSmall(BvSmall::normalized(bitsize, small)), loc);
        } else {
            self.push_raw(Payload::BvWide(BvWide::normalized(bitsize, value)), loc);
        }
    }

    pub fn push_bool_type(&mut self, loc: Location) -> Result<()> {
        self.push_builtin_type(TypeCtor::Bool, loc)
    }

    pub fn push_int_type(&mut self, loc: Location) -> Result<()> {
        self.push_builtin_type(TypeCtor::Int, loc)
    }

    pub fn push_real_type(&mut self, loc: Location) -> Result<()> {
        self.push_builtin_type(TypeCtor::Real, loc)
    }

    fn push_builtin_type(&mut self, ctor: TypeCtor, loc: Location) -> Result<()> {
        self.guarded(|s| {
            let ty = s
                .bank
                .build_type(ctor)
                .map_err(|e| StackError::new(ErrorKind::ExternalError, loc).with_source(e))?;
            s.push_raw(Payload::Type(ty), loc);
            Ok(())
        })
    }

    pub fn push_true(&mut self, loc: Location) -> Result<()> {
        self.guarded(|s| {
            let t = s.bank.true_term();
            s.push_raw(Payload::Term(t), loc);
            Ok(())
        })
    }

    pub fn push_false(&mut self, loc: Location) -> Result<()> {
        self.guarded(|s| {
            let t = s.bank.false_term();
            s.push_raw(Payload::Term(t), loc);
            Ok(())
        })
    }

    pub fn push_bool(&mut self, value: bool, loc: Location) -> Result<()> {
        if value {
            self.push_true(loc)
        } else {
            self.push_false(loc)
        }
    }

    pub fn push_int(&mut self, value: i32, loc: Location) -> Result<()> {
        self.guarded(|s| {
            s.push_raw(Payload::Rational(BigRational::from_integer(BigInt::from(value))), loc);
            Ok(())
        })
    }

    pub fn push_term(&mut self, term: TermHandle, loc: Location) -> Result<()> {
        self.guarded(|s| {
            s.push_raw(Payload::Term(term), loc);
            Ok(())
        })
    }

    pub fn push_type(&mut self, ty: TypeHandle, loc: Location) -> Result<()> {
        self.guarded(|s| {
            s.push_raw(Payload::Type(ty), loc);
            Ok(())
        })
    }

    pub fn push_macro(&mut self, mac: MacroHandle, loc: Location) -> Result<()> {
        self.guarded(|s| {
            s.push_raw(Payload::Macro(mac), loc);
            Ok(())
        })
    }

    pub fn push_term_by_name(&mut self, name: &str, loc: Location) -> Result<()> {
        self.guarded(|s| {
            let term = s
                .bank
                .resolve_term_name(name)
                .ok_or_else(|| StackError::new(ErrorKind::UndefTerm, loc).with_symbol(name))?;
            s.push_raw(Payload::Term(term), loc);
            Ok(())
        })
    }

    pub fn push_type_by_name(&mut self, name: &str, loc: Location) -> Result<()> {
        self.guarded(|s| {
            let ty = s
                .bank
                .resolve_type_name(name)
                .ok_or_else(|| StackError::new(ErrorKind::UndefType, loc).with_symbol(name))?;
            s.push_raw(Payload::Type(ty), loc);
            Ok(())
        })
    }

    pub fn push_macro_by_name(&mut self, name: &str, loc: Location) -> Result<()> {
        self.guarded(|s| {
            let mac = s
                .bank
                .resolve_macro_name(name)
                .ok_or_else(|| StackError::new(ErrorKind::UndefMacro, loc).with_symbol(name))?;
            s.push_raw(Payload::Macro(mac), loc);
            Ok(())
        })
    }

    pub fn push_free_term_name(&mut self, name: &str, loc: Location) -> Result<()> {
        self.guarded(|s| {
            if s.bank.is_term_name_bound(name) {
                return Err(StackError::new(ErrorKind::TermNameRedef, loc).with_symbol(name));
            }
            let owned = String::from(s.arena.allocate(name));
            s.push_raw(Payload::Symbol(owned), loc);
            Ok(())
        })
    }

    pub fn push_free_type_name(&mut self, name: &str, loc: Location) -> Result<()> {
        self.guarded(|s| {
            if s.bank.is_type_name_bound(name) {
                return Err(StackError::new(ErrorKind::TypeNameRedef, loc).with_symbol(name));
            }
            let owned = String::from(s.arena.allocate(name));
            s.push_raw(Payload::Symbol(owned), loc);
            Ok(())
        })
    }

    pub fn push_free_macro_name(&mut self, name: &str, loc: Location) -> Result<()> {
        self.guarded(|s| {
            if s.bank.is_macro_name_bound(name) {
                return Err(StackError::new(ErrorKind::MacroRedef, loc).with_symbol(name));
            }
            let owned = String::from(s.arena.allocate(name));
            s.push_raw(Payload::Symbol(owned), loc);
            Ok(())
        })
    }

    fn push_raw(&mut self, payload: Payload, loc: Location) -> usize {
        self.ensure_capacity_for_push();
        self.elements.push(Cell::new(payload, loc));
        self.elements.len() - 1
    }

    fn ensure_capacity_for_push(&mut self) {
        let len = self.elements.len();
        let cap = self.elements.capacity();
        if len < cap {
            return;
        }
        let grown = ((cap as f64) * self.config.growth_factor).ceil() as usize;
        let grown = grown.max(cap + 1);
        let new_cap = grown.min(self.config.max_capacity);
        if new_cap <= cap {
            panic!("termstack: value array exceeded configured maximum capacity ({})", self.config.max_capacity);
        }
        self.elements.reserve_exact(new_cap - cap);
    }

    // -- evaluate (spec §4.5) ----------------------------------------------

    pub fn evaluate(&mut self) -> Result<()> {
        self.guarded(Self::evaluate_impl)
    }

    fn evaluate_impl(&mut self) -> Result<()> {
        let frame_index = self.current_frame_index;
        let multiplicity = self.elements[frame_index].payload.as_op().expect("current frame must be OP").multiplicity;
        if multiplicity > 0 {
            self.elements[frame_index].payload.as_op_mut().expect("current frame must be OP").multiplicity -= 1;
            return Ok(());
        }
        let op = self.current_opcode;
        let first = frame_index + 1;
        let n = self.elements.len() - first;
        let entry = match self.optable.entry(op) {
            Some(entry) => entry,
            None => {
                let kind = if (op.raw() as usize) < self.optable.capacity() {
                    ErrorKind::OpNotImplemented
                } else {
                    ErrorKind::InvalidOp
                };
                return Err(StackError::new(kind, self.frame_location()).with_opcode(op));
            }
        };
        (entry.check)(self, first, n)?;
        let result = (entry.eval)(self, first, n)?;
        self.finish_frame(frame_index, op, result);
        tracing::trace!(opcode = %op, "termstack: evaluate");
        Ok(())
    }

    fn finish_frame(&mut self, frame_index: usize, op: Opcode, result: Cell) {
        self.free_range_top_down(frame_index + 1);
        if op != Opcode::BIND {
            self.arena.pop_scope();
        }
        let previous_frame_index =
            self.elements[frame_index].payload.as_op().expect("frame must be OP").previous_frame_index.unwrap_or(0);
        if op == Opcode::BUILD_TERM || op == Opcode::BUILD_TYPE {
            self.elements.pop();
        } else {
            self.elements[frame_index] = result;
        }
        self.current_frame_index = previous_frame_index;
        self.current_opcode =
            self.elements[previous_frame_index].payload.as_op().expect("previous frame must be OP").opcode;
    }

    /// Frees cells from the top of the array down to (but not including)
    /// `floor`, in top-down order so nested binding restores happen LIFO
    /// (spec §5 "restoration order is LIFO by construction").
    fn free_range_top_down(&mut self, floor: usize) {
        while self.elements.len() > floor {
            let cell = self.elements.pop().expect("len > floor implies non-empty");
            self.free_cell(cell);
        }
    }

    fn free_cell(&mut self, cell: Cell) {
        match cell.payload {
            Payload::RatBuffer(buf) => self.pool.recycle_rat_poly(buf),
            Payload::BvSmallBuffer(buf) => self.pool.recycle_small_bv_poly(buf),
            Payload::BvWideBuffer(buf) => self.pool.recycle_wide_bv_poly(buf),
            Payload::BvLogicBuffer(buf) => self.pool.recycle_logic(buf),
            Payload::TermBinding(binding) => self.bank.undefine_term_name(&binding.symbol, binding.previous),
            Payload::TypeBinding(binding) => self.bank.undefine_type_name(&binding.symbol, binding.previous),
            _ => {}
        }
    }

    // -- result extraction (spec §4.8 "Extract", §6) -----------------------

    pub(crate) fn set_result_term(&mut self, term: TermHandle) {
        self.result = Some(ResultSlot::Term(term));
    }

    pub(crate) fn set_result_type(&mut self, ty: TypeHandle) {
        self.result = Some(ResultSlot::Type(ty));
    }

    pub fn result_term(&self) -> Result<TermHandle> {
        match self.result {
            Some(ResultSlot::Term(t)) => Ok(t),
            _ => Err(StackError::new(ErrorKind::Internal, Location::unknown())),
        }
    }

    pub fn result_type(&self) -> Result<TypeHandle> {
        match self.result {
            Some(ResultSlot::Type(t)) => Ok(t),
            _ => Err(StackError::new(ErrorKind::Internal, Location::unknown())),
        }
    }

    // -- reset / teardown (spec §4.10, §6, §8 property 7) ------------------

    pub fn reset(&mut self) {
        self.free_range_top_down(1);
        self.current_frame_index = 0;
        self.current_opcode = Opcode::NO_OP;
        self.arena.reset();
        self.result = None;
        self.needs_reset = false;
        tracing::debug!("termstack: reset");
    }

    pub fn delete(self) {}

    pub fn tag_at(&self, index: usize) -> Tag {
        self.elements[index].tag()
    }
}

#[derive(Debug)]
enum RationalParseError {
    Format,
    DivideByZero,
}

/// Parses a decimal integer or `numerator/denominator` fraction (spec §6
/// "rational (from decimal/fraction text)"). Decimal-point text goes
/// through `parse_float` instead.
fn parse_rational(text: &str) -> std::result::Result<BigRational, RationalParseError> {
    let text = text.trim();
    if let Some((n, d)) = text.split_once('/') {
        let numer: BigInt = n.trim().parse().map_err(|_| RationalParseError::Format)?;
        let denom: BigInt = d.trim().parse().map_err(|_| RationalParseError::Format)?;
        if denom.is_zero() {
            return Err(RationalParseError::DivideByZero);
        }
        Ok(BigRational::new(numer, denom))
    } else {
        let numer: BigInt = text.parse().map_err(|_| RationalParseError::Format)?;
        Ok(BigRational::from_integer(numer))
    }
}

/// Parses decimal-point text such as `"3.14"` or `"-0.5"` (spec §6 "float
/// (from decimal-point text)"). There is no external float arithmetic
/// collaborator in scope (spec §1), so the literal is folded straight into
/// an exact `BigRational`.
fn parse_float(text: &str) -> Option<BigRational> {
    let text = text.trim();
    let (negative, unsigned) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let (int_part, frac_part) = unsigned.split_once('.')?;
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    let int_digits = if int_part.is_empty() { "0" } else { int_part };
    if !int_digits.bytes().all(|b| b.is_ascii_digit()) || !frac_part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let combined = format!("{}{}", int_digits, frac_part);
    let numer: BigInt = combined.parse().ok()?;
    let denom = BigInt::from(10u32).pow(frac_part.len() as u32);
    let mut value = BigRational::new(numer, denom);
    if negative {
        value = -value;
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::InMemoryBank;

    fn loc(line: u32) -> Location {
        Location::new(line, 1)
    }

    #[test]
    fn sentinel_frame_is_not_a_registered_opcode() {
        let mut stack = Stack::new(InMemoryBank::new());
        let err = stack.evaluate().unwrap_err();
        assert_eq!(err.kind, ErrorKind::OpNotImplemented);
    }

    #[test]
    fn push_op_out_of_table_bounds_is_invalid_op() {
        let mut stack = Stack::new(InMemoryBank::new());
        let err = stack.push_op(Opcode(10_000), loc(1)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidOp);
    }

    #[test]
    fn s1_and_of_true_false_builds_false() {
        let mut stack = Stack::new(InMemoryBank::new());
        stack.push_op(Opcode::BUILD_TERM, loc(1)).unwrap();
        stack.push_op(Opcode::MK_AND, loc(1)).unwrap();
        stack.push_true(loc(1)).unwrap();
        stack.push_false(loc(1)).unwrap();
        stack.evaluate().unwrap(); // collapse MK_AND
        stack.evaluate().unwrap(); // collapse BUILD_TERM
        let result = stack.result_term().unwrap();
        assert_eq!(Some(false), stack.bank().bool_constant_value(result));
    }

    #[test]
    fn reset_after_error_restores_fresh_state() {
        let mut stack = Stack::new(InMemoryBank::new());
        stack.push_op(Opcode::MK_NOT, loc(1)).unwrap();
        stack.push_true(loc(1)).unwrap();
        stack.push_true(loc(1)).unwrap();
        assert!(stack.evaluate().is_err());
        assert!(stack.is_poisoned());
        assert!(stack.push_true(loc(1)).is_err());
        stack.reset();
        assert!(!stack.is_poisoned());
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.current_frame_index(), 0);
        assert_eq!(stack.arena_scope_depth(), 1);
    }

    #[test]
    fn rational_parses_fraction_and_rejects_garbage() {
        assert_eq!(parse_rational("3/4").unwrap(), BigRational::new(3.into(), 4.into()));
        assert!(matches!(parse_rational("3/0"), Err(RationalParseError::DivideByZero)));
        assert!(matches!(parse_rational("abc"), Err(RationalParseError::Format)));
    }

    #[test]
    fn float_parses_decimal_point_text() {
        assert_eq!(parse_float("3.25").unwrap(), BigRational::new(13.into(), 4.into()));
        assert_eq!(parse_float("-0.5").unwrap(), BigRational::new((-1).into(), 2.into()));
        assert!(parse_float("3").is_none());
    }
}

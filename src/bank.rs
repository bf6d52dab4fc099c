//! External term/type bridge (spec §4 component 8, §6).
//!
//! The stack never hash-conses terms or types itself; it hands a
//! constructor description to whatever implements `TermBank`/`TypeBank`
//! and gets a handle back. `InMemoryBank` is the reference implementation
//! used by this crate's own tests and by the end-to-end scenarios in
//! spec §8 -- it is not a production hash-consing engine, the same way the
//! stack itself is not a production SMT solver.

use crate::value::{MacroHandle, TermHandle, TypeHandle};
use num::rational::BigRational;
use num::BigUint;
use std::collections::HashMap;

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct BankError(pub String);

pub type BankResult<T> = std::result::Result<T, BankError>;

/// Every term-level construction the predefined opcode set can request.
/// One closed enum in place of one trait method per opcode, matching the
/// pattern the teacher uses for its own `Opcode`/`Insn` enums.
#[derive(Clone, Debug, PartialEq)]
pub enum TermCtor {
    BoolConst(bool),
    RationalConst(BigRational),
    BvConst(u32, BigUint),
    Not(TermHandle),
    Or(Vec<TermHandle>),
    And(Vec<TermHandle>),
    Xor(Vec<TermHandle>),
    Iff(TermHandle, TermHandle),
    Implies(TermHandle, TermHandle),
    Ite(TermHandle, TermHandle, TermHandle),
    Eq(TermHandle, TermHandle),
    Distinct(Vec<TermHandle>),
    Apply(TermHandle, Vec<TermHandle>),
    Tuple(Vec<TermHandle>),
    Select(TermHandle, u32),
    TupleUpdate(TermHandle, u32, TermHandle),
    Update(TermHandle, TermHandle, TermHandle),
    Forall(Vec<TermHandle>, TermHandle),
    Exists(Vec<TermHandle>, TermHandle),
    Lambda(Vec<TermHandle>, TermHandle),
    Add(Vec<TermHandle>),
    Sub(TermHandle, TermHandle),
    Neg(TermHandle),
    Mul(Vec<TermHandle>),
    Division(TermHandle, TermHandle),
    Pow(TermHandle, u32),
    Cmp(CmpKind, TermHandle, TermHandle),
    BvAdd(Vec<TermHandle>),
    BvSub(TermHandle, TermHandle),
    BvMul(Vec<TermHandle>),
    BvNeg(TermHandle),
    BvPow(TermHandle, u32),
    BvDiv(TermHandle, TermHandle),
    BvRem(TermHandle, TermHandle),
    BvSdiv(TermHandle, TermHandle),
    BvSrem(TermHandle, TermHandle),
    BvSmod(TermHandle, TermHandle),
    BvNot(TermHandle),
    BvAnd(Vec<TermHandle>),
    BvOr(Vec<TermHandle>),
    BvXor(Vec<TermHandle>),
    BvNand(Vec<TermHandle>),
    BvNor(Vec<TermHandle>),
    BvXnor(Vec<TermHandle>),
    BvShiftLeft0(TermHandle, u32),
    BvShiftLeft1(TermHandle, u32),
    BvShiftRight0(TermHandle, u32),
    BvShiftRight1(TermHandle, u32),
    BvAshiftRight(TermHandle, u32),
    BvRotateLeft(TermHandle, u32),
    BvRotateRight(TermHandle, u32),
    BvShl(TermHandle, TermHandle),
    BvLshr(TermHandle, TermHandle),
    BvAshr(TermHandle, TermHandle),
    BvExtract(TermHandle, u32, u32),
    BvConcat(Vec<TermHandle>),
    BvRepeat(TermHandle, u32),
    BvSignExtend(TermHandle, u32),
    BvZeroExtend(TermHandle, u32),
    BvRedand(TermHandle),
    BvRedor(TermHandle),
    BvComp(TermHandle, TermHandle),
    BvCmp(CmpKind, bool, TermHandle, TermHandle),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CmpKind {
    Ge,
    Gt,
    Le,
    Lt,
}

/// Every type-level construction the predefined opcode set can request.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeCtor {
    Bool,
    Int,
    Real,
    Bv(u32),
    Scalar(Vec<String>),
    Tuple(Vec<TypeHandle>),
    Fun(Vec<TypeHandle>, TypeHandle),
    App(MacroHandle, Vec<TypeHandle>),
}

pub trait TypeBank {
    fn build_type(&mut self, ctor: TypeCtor) -> BankResult<TypeHandle>;
    fn fresh_type(&mut self) -> TypeHandle;

    /// The bit width of a bit-vector type, if `ty` is one.
    fn bv_width(&self, ty: TypeHandle) -> Option<u32>;
    fn is_subtype(&self, sub: TypeHandle, of: TypeHandle) -> bool;

    fn resolve_type_name(&self, name: &str) -> Option<TypeHandle>;
    fn resolve_macro_name(&self, name: &str) -> Option<MacroHandle>;
    fn is_type_name_bound(&self, name: &str) -> bool;
    /// Binds `name` to `ty`, returning whatever was previously bound so the
    /// caller can restore it (LIFO shadow/restore, spec §9 open question).
    fn define_type_name(&mut self, name: &str, ty: TypeHandle) -> Option<TypeHandle>;
    fn undefine_type_name(&mut self, name: &str, previous: Option<TypeHandle>);

    fn is_macro_name_bound(&self, name: &str) -> bool;
    fn define_macro_name(&mut self, name: &str, mac: MacroHandle) -> Option<MacroHandle>;
    fn undefine_macro_name(&mut self, name: &str, previous: Option<MacroHandle>);
}

pub trait TermBank {
    fn build_term(&mut self, ctor: TermCtor) -> BankResult<TermHandle>;
    fn fresh_uninterpreted(&mut self, ty: TypeHandle) -> TermHandle;
    fn true_term(&mut self) -> TermHandle;
    fn false_term(&mut self) -> TermHandle;

    fn type_of(&self, term: TermHandle) -> TypeHandle;
    /// The constant bit-vector value of `term`, if it denotes one --
    /// used by the "to bit-vector constant" coercion (spec §4.7).
    fn bv_constant_value(&self, term: TermHandle) -> Option<(u32, BigUint)>;
    fn bool_constant_value(&self, term: TermHandle) -> Option<bool>;

    fn resolve_term_name(&self, name: &str) -> Option<TermHandle>;
    fn is_term_name_bound(&self, name: &str) -> bool;
    fn define_term_name(&mut self, name: &str, term: TermHandle) -> Option<TermHandle>;
    fn undefine_term_name(&mut self, name: &str, previous: Option<TermHandle>);
}

// --------------------------------------------------------------------
// Reference in-memory implementation.
// --------------------------------------------------------------------

// Terms are keyed by a structural string rather than a derived `Hash`
// impl, since `BigRational`/`BigUint` payloads are folded into the key
// via `Display`/`Debug` instead of hashed directly.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct TermKey(String);

struct TermData {
    ty: TypeHandle,
    bv_value: Option<(u32, BigUint)>,
    bool_value: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct TypeKey(String);

pub struct InMemoryBank {
    types: Vec<TypeCtorStored>,
    type_index: HashMap<TypeKey, TypeHandle>,
    type_names: HashMap<String, TypeHandle>,
    macro_names: HashMap<String, MacroHandle>,

    terms: Vec<TermData>,
    term_index: HashMap<TermKey, TermHandle>,
    term_names: HashMap<String, TermHandle>,

    bool_type: TypeHandle,
    int_type: TypeHandle,
    real_type: TypeHandle,
    true_term: TermHandle,
    false_term: TermHandle,

    fresh_counter: u64,
}

#[derive(Clone, Debug)]
enum TypeCtorStored {
    Bool,
    Int,
    Real,
    Bv(u32),
    Scalar(Vec<String>),
    Tuple(Vec<TypeHandle>),
    Fun(Vec<TypeHandle>, TypeHandle),
    App(MacroHandle, Vec<TypeHandle>),
    Fresh(u64),
}

impl InMemoryBank {
    pub fn new() -> Self {
        let mut bank = InMemoryBank {
            types: Vec::new(),
            type_index: HashMap::new(),
            type_names: HashMap::new(),
            macro_names: HashMap::new(),
            terms: Vec::new(),
            term_index: HashMap::new(),
            term_names: HashMap::new(),
            bool_type: 0,
            int_type: 0,
            real_type: 0,
            true_term: 0,
            false_term: 0,
            fresh_counter: 0,
        };
        bank.bool_type = bank.intern_type(TypeKey("bool".into()), TypeCtorStored::Bool);
        bank.int_type = bank.intern_type(TypeKey("int".into()), TypeCtorStored::Int);
        bank.real_type = bank.intern_type(TypeKey("real".into()), TypeCtorStored::Real);
        bank.true_term = bank.intern_term(
            TermKey("true".into()),
            bank.bool_type,
            None,
            Some(true),
        );
        bank.false_term = bank.intern_term(
            TermKey("false".into()),
            bank.bool_type,
            None,
            Some(false),
        );
        bank
    }

    fn intern_type(&mut self, key: TypeKey, ctor: TypeCtorStored) -> TypeHandle {
        if let Some(h) = self.type_index.get(&key) {
            return *h;
        }
        let handle = self.types.len() as TypeHandle;
        self.types.push(ctor);
        self.type_index.insert(key, handle);
        handle
    }

    fn intern_term(
        &mut self,
        key: TermKey,
        ty: TypeHandle,
        bv_value: Option<(u32, BigUint)>,
        bool_value: Option<bool>,
    ) -> TermHandle {
        if let Some(h) = self.term_index.get(&key) {
            return *h;
        }
        let handle = self.terms.len() as TermHandle;
        self.terms.push(TermData { ty, bv_value, bool_value });
        self.term_index.insert(key, handle);
        handle
    }

    fn new_fresh_term(&mut self, ty: TypeHandle) -> TermHandle {
        self.fresh_counter += 1;
        let key = TermKey(format!("$fresh{}", self.fresh_counter));
        self.intern_term(key, ty, None, None)
    }
}

impl Default for InMemoryBank {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeBank for InMemoryBank {
    fn build_type(&mut self, ctor: TypeCtor) -> BankResult<TypeHandle> {
        Ok(match ctor {
            TypeCtor::Bool => self.bool_type,
            TypeCtor::Int => self.int_type,
            TypeCtor::Real => self.real_type,
            TypeCtor::Bv(n) => {
                let key = TypeKey(format!("bv{}", n));
                self.intern_type(key, TypeCtorStored::Bv(n))
            }
            TypeCtor::Scalar(names) => {
                let key = TypeKey(format!("scalar({})", names.join(",")));
                self.intern_type(key, TypeCtorStored::Scalar(names))
            }
            TypeCtor::Tuple(components) => {
                let key = TypeKey(format!("tuple{:?}", components));
                self.intern_type(key, TypeCtorStored::Tuple(components))
            }
            TypeCtor::Fun(domain, codomain) => {
                let key = TypeKey(format!("fun{:?}->{}", domain, codomain));
                self.intern_type(key, TypeCtorStored::Fun(domain, codomain))
            }
            TypeCtor::App(mac, args) => {
                let key = TypeKey(format!("app{}{:?}", mac, args));
                self.intern_type(key, TypeCtorStored::App(mac, args))
            }
        })
    }

    fn fresh_type(&mut self) -> TypeHandle {
        self.fresh_counter += 1;
        let key = TypeKey(format!("$freshty{}", self.fresh_counter));
        self.intern_type(key, TypeCtorStored::Fresh(self.fresh_counter))
    }

    fn bv_width(&self, ty: TypeHandle) -> Option<u32> {
        match self.types.get(ty as usize) {
            Some(TypeCtorStored::Bv(n)) => Some(*n),
            _ => None,
        }
    }

    fn is_subtype(&self, sub: TypeHandle, of: TypeHandle) -> bool {
        sub == of
    }

    fn resolve_type_name(&self, name: &str) -> Option<TypeHandle> {
        self.type_names.get(name).copied()
    }

    fn resolve_macro_name(&self, name: &str) -> Option<MacroHandle> {
        self.macro_names.get(name).copied()
    }

    fn is_type_name_bound(&self, name: &str) -> bool {
        self.type_names.contains_key(name)
    }

    fn define_type_name(&mut self, name: &str, ty: TypeHandle) -> Option<TypeHandle> {
        self.type_names.insert(name.to_string(), ty)
    }

    fn undefine_type_name(&mut self, name: &str, previous: Option<TypeHandle>) {
        match previous {
            Some(h) => {
                self.type_names.insert(name.to_string(), h);
            }
            None => {
                self.type_names.remove(name);
            }
        }
    }

    fn is_macro_name_bound(&self, name: &str) -> bool {
        self.macro_names.contains_key(name)
    }

    fn define_macro_name(&mut self, name: &str, mac: MacroHandle) -> Option<MacroHandle> {
        self.macro_names.insert(name.to_string(), mac)
    }

    fn undefine_macro_name(&mut self, name: &str, previous: Option<MacroHandle>) {
        match previous {
            Some(h) => {
                self.macro_names.insert(name.to_string(), h);
            }
            None => {
                self.macro_names.remove(name);
            }
        }
    }
}

impl TermBank for InMemoryBank {
    fn build_term(&mut self, ctor: TermCtor) -> BankResult<TermHandle> {
        use TermCtor::*;
        Ok(match ctor {
            BoolConst(v) => if v { self.true_term } else { self.false_term },
            RationalConst(v) => {
                let key = TermKey(format!("rat({})", v));
                self.intern_term(key, self.int_type, None, None)
            }
            BvConst(bitsize, value) => {
                let key = TermKey(format!("bv{}#{}", bitsize, value));
                self.intern_term(key, 0, Some((bitsize, value)), None)
            }
            Not(a) => {
                if let Some(v) = self.bool_constant_value(a) {
                    return Ok(if v { self.false_term } else { self.true_term });
                }
                self.intern_term(TermKey(format!("not({})", a)), self.bool_type, None, None)
            }
            Or(args) => self.fold_assoc_bool(&args, false, "or"),
            And(args) => self.fold_assoc_bool(&args, true, "and"),
            Xor(args) => {
                let mut parity = false;
                let mut residual = Vec::new();
                for a in &args {
                    match self.bool_constant_value(*a) {
                        Some(v) => parity ^= v,
                        None => residual.push(*a),
                    }
                }
                if residual.is_empty() {
                    if parity { self.true_term } else { self.false_term }
                } else {
                    self.intern_term(
                        TermKey(format!("xor{:?}#{}", residual, parity)),
                        self.bool_type,
                        None,
                        None,
                    )
                }
            }
            Iff(a, b) => {
                self.intern_term(TermKey(format!("iff({},{})", a, b)), self.bool_type, None, None)
            }
            Implies(a, b) => {
                self.intern_term(TermKey(format!("implies({},{})", a, b)), self.bool_type, None, None)
            }
            Ite(c, t, e) => {
                if let Some(v) = self.bool_constant_value(c) {
                    return Ok(if v { t } else { e });
                }
                let ty = self.type_of(t);
                self.intern_term(TermKey(format!("ite({},{},{})", c, t, e)), ty, None, None)
            }
            Eq(a, b) => {
                if a == b {
                    return Ok(self.true_term);
                }
                self.intern_term(TermKey(format!("eq({},{})", a.min(b), a.max(b))), self.bool_type, None, None)
            }
            Distinct(args) => {
                let mut sorted = args.clone();
                sorted.sort_unstable();
                sorted.dedup();
                if sorted.len() != args.len() {
                    return Ok(self.false_term);
                }
                self.intern_term(TermKey(format!("distinct{:?}", sorted)), self.bool_type, None, None)
            }
            Apply(f, args) => {
                let ty = self.type_of(f);
                self.intern_term(TermKey(format!("apply({},{:?})", f, args)), ty, None, None)
            }
            Tuple(args) => {
                let arg_types: Vec<_> = args.iter().map(|a| self.type_of(*a)).collect();
                let ty = self.build_type(TypeCtor::Tuple(arg_types))?;
                self.intern_term(TermKey(format!("tuple{:?}", args)), ty, None, None)
            }
            Select(t, i) => {
                let ty = match self.types.get(self.type_of(t) as usize) {
                    Some(TypeCtorStored::Tuple(components)) => {
                        *components.get(i as usize - 1).ok_or_else(|| BankError("tuple index out of range".into()))?
                    }
                    _ => return Err(BankError("select on a non-tuple type".into())),
                };
                self.intern_term(TermKey(format!("select({},{})", t, i)), ty, None, None)
            }
            TupleUpdate(t, i, v) => {
                let ty = self.type_of(t);
                self.intern_term(TermKey(format!("tupup({},{},{})", t, i, v)), ty, None, None)
            }
            Update(arr, idx, val) => {
                let ty = self.type_of(arr);
                self.intern_term(TermKey(format!("upd({},{},{})", arr, idx, val)), ty, None, None)
            }
            Forall(vars, body) => {
                self.intern_term(TermKey(format!("forall{:?}.{}", vars, body)), self.bool_type, None, None)
            }
            Exists(vars, body) => {
                self.intern_term(TermKey(format!("exists{:?}.{}", vars, body)), self.bool_type, None, None)
            }
            Lambda(vars, body) => {
                let codomain = self.type_of(body);
                let domain: Vec<_> = vars.iter().map(|v| self.type_of(*v)).collect();
                let ty = self.build_type(TypeCtor::Fun(domain, codomain))?;
                self.intern_term(TermKey(format!("lambda{:?}.{}", vars, body)), ty, None, None)
            }
            Add(args) => {
                let ty = self.int_type;
                self.intern_term(TermKey(format!("add{:?}", args)), ty, None, None)
            }
            Sub(a, b) => self.intern_term(TermKey(format!("sub({},{})", a, b)), self.type_of(a), None, None),
            Neg(a) => self.intern_term(TermKey(format!("neg({})", a)), self.type_of(a), None, None),
            Mul(args) => self.intern_term(TermKey(format!("mul{:?}", args)), self.int_type, None, None),
            Division(a, b) => self.intern_term(TermKey(format!("div({},{})", a, b)), self.real_type, None, None),
            Pow(a, k) => self.intern_term(TermKey(format!("pow({},{})", a, k)), self.type_of(a), None, None),
            Cmp(kind, a, b) => self.intern_term(TermKey(format!("cmp{:?}({},{})", kind, a, b)), self.bool_type, None, None),
            BvAdd(args) => self.bv_compound("bvadd", &args, args.first().copied()),
            BvSub(a, b) => self.bv_compound2("bvsub", a, b),
            BvMul(args) => self.bv_compound("bvmul", &args, args.first().copied()),
            BvNeg(a) => self.bv_compound1("bvneg", a),
            BvPow(a, k) => self.bv_compound_u32("bvpow", a, k),
            BvDiv(a, b) => self.bv_compound2("bvdiv", a, b),
            BvRem(a, b) => self.bv_compound2("bvrem", a, b),
            BvSdiv(a, b) => self.bv_compound2("bvsdiv", a, b),
            BvSrem(a, b) => self.bv_compound2("bvsrem", a, b),
            BvSmod(a, b) => self.bv_compound2("bvsmod", a, b),
            BvNot(a) => self.bv_compound1("bvnot", a),
            BvAnd(args) => self.bv_compound("bvand", &args, args.first().copied()),
            BvOr(args) => self.bv_compound("bvor", &args, args.first().copied()),
            BvXor(args) => self.bv_compound("bvxor", &args, args.first().copied()),
            BvNand(args) => self.bv_compound("bvnand", &args, args.first().copied()),
            BvNor(args) => self.bv_compound("bvnor", &args, args.first().copied()),
            BvXnor(args) => self.bv_compound("bvxnor", &args, args.first().copied()),
            BvShiftLeft0(a, k) => self.bv_compound_u32("bvshl0", a, k),
            BvShiftLeft1(a, k) => self.bv_compound_u32("bvshl1", a, k),
            BvShiftRight0(a, k) => self.bv_compound_u32("bvshr0", a, k),
            BvShiftRight1(a, k) => self.bv_compound_u32("bvshr1", a, k),
            BvAshiftRight(a, k) => self.bv_compound_u32("bvashr_const", a, k),
            BvRotateLeft(a, k) => self.bv_compound_u32("bvrol", a, k),
            BvRotateRight(a, k) => self.bv_compound_u32("bvror", a, k),
            BvShl(a, b) => self.bv_compound2("bvshl", a, b),
            BvLshr(a, b) => self.bv_compound2("bvlshr", a, b),
            BvAshr(a, b) => self.bv_compound2("bvashr", a, b),
            BvExtract(a, high, low) => {
                let width = high - low + 1;
                let ty = self.build_type(TypeCtor::Bv(width))?;
                self.intern_term(TermKey(format!("extract({},{},{})", a, high, low)), ty, None, None)
            }
            BvConcat(args) => {
                let total: u32 = args.iter().map(|a| self.bv_width(self.type_of(*a)).unwrap_or(0)).sum();
                let ty = self.build_type(TypeCtor::Bv(total))?;
                self.intern_term(TermKey(format!("concat{:?}", args)), ty, None, None)
            }
            BvRepeat(a, n) => {
                let width = self.bv_width(self.type_of(a)).unwrap_or(0) * n;
                let ty = self.build_type(TypeCtor::Bv(width))?;
                self.intern_term(TermKey(format!("repeat({},{})", a, n)), ty, None, None)
            }
            BvSignExtend(a, extra) => {
                let width = self.bv_width(self.type_of(a)).unwrap_or(0) + extra;
                let ty = self.build_type(TypeCtor::Bv(width))?;
                self.intern_term(TermKey(format!("sext({},{})", a, extra)), ty, None, None)
            }
            BvZeroExtend(a, extra) => {
                let width = self.bv_width(self.type_of(a)).unwrap_or(0) + extra;
                let ty = self.build_type(TypeCtor::Bv(width))?;
                self.intern_term(TermKey(format!("zext({},{})", a, extra)), ty, None, None)
            }
            BvRedand(a) => self.intern_term(TermKey(format!("redand({})", a)), self.build_type(TypeCtor::Bv(1))?, None, None),
            BvRedor(a) => self.intern_term(TermKey(format!("redor({})", a)), self.build_type(TypeCtor::Bv(1))?, None, None),
            BvComp(a, b) => self.intern_term(TermKey(format!("bvcomp({},{})", a, b)), self.build_type(TypeCtor::Bv(1))?, None, None),
            BvCmp(kind, signed, a, b) => {
                self.intern_term(TermKey(format!("bvcmp{:?}{}({},{})", kind, signed, a, b)), self.bool_type, None, None)
            }
        })
    }

    fn fresh_uninterpreted(&mut self, ty: TypeHandle) -> TermHandle {
        self.new_fresh_term(ty)
    }

    fn true_term(&mut self) -> TermHandle {
        self.true_term
    }

    fn false_term(&mut self) -> TermHandle {
        self.false_term
    }

    fn type_of(&self, term: TermHandle) -> TypeHandle {
        self.terms.get(term as usize).map(|t| t.ty).unwrap_or(0)
    }

    fn bv_constant_value(&self, term: TermHandle) -> Option<(u32, BigUint)> {
        self.terms.get(term as usize).and_then(|t| t.bv_value.clone())
    }

    fn bool_constant_value(&self, term: TermHandle) -> Option<bool> {
        self.terms.get(term as usize).and_then(|t| t.bool_value)
    }

    fn resolve_term_name(&self, name: &str) -> Option<TermHandle> {
        self.term_names.get(name).copied()
    }

    fn is_term_name_bound(&self, name: &str) -> bool {
        self.term_names.contains_key(name)
    }

    fn define_term_name(&mut self, name: &str, term: TermHandle) -> Option<TermHandle> {
        self.term_names.insert(name.to_string(), term)
    }

    fn undefine_term_name(&mut self, name: &str, previous: Option<TermHandle>) {
        match previous {
            Some(h) => {
                self.term_names.insert(name.to_string(), h);
            }
            None => {
                self.term_names.remove(name);
            }
        }
    }
}

impl InMemoryBank {
    fn fold_assoc_bool(&mut self, args: &[TermHandle], absorbing: bool, name: &str) -> TermHandle {
        let mut residual = Vec::new();
        for a in args {
            match self.bool_constant_value(*a) {
                Some(v) if v == absorbing => return if absorbing { self.false_term_for(absorbing) } else { self.true_term_for(absorbing) },
                Some(_) => {} // identity element, drop
                None => residual.push(*a),
            }
        }
        if residual.is_empty() {
            return if absorbing { self.true_term } else { self.false_term };
        }
        residual.sort_unstable();
        residual.dedup();
        self.intern_term(TermKey(format!("{}{:?}", name, residual)), self.bool_type, None, None)
    }

    // `absorbing` selects AND (true is identity, false absorbs) vs OR
    // (false is identity, true absorbs); these two tiny helpers just pick
    // the right constant for the absorbing case without duplicating logic.
    fn false_term_for(&self, absorbing: bool) -> TermHandle {
        if absorbing { self.false_term } else { self.true_term }
    }
    fn true_term_for(&self, absorbing: bool) -> TermHandle {
        if absorbing { self.false_term } else { self.true_term }
    }

    fn bv_compound(&mut self, name: &str, args: &[TermHandle], first: Option<TermHandle>) -> TermHandle {
        let ty = first.map(|t| self.type_of(t)).unwrap_or(0);
        self.intern_term(TermKey(format!("{}{:?}", name, args)), ty, None, None)
    }

    fn bv_compound1(&mut self, name: &str, a: TermHandle) -> TermHandle {
        let ty = self.type_of(a);
        self.intern_term(TermKey(format!("{}({})", name, a)), ty, None, None)
    }

    fn bv_compound2(&mut self, name: &str, a: TermHandle, b: TermHandle) -> TermHandle {
        let ty = self.type_of(a);
        self.intern_term(TermKey(format!("{}({},{})", name, a, b)), ty, None, None)
    }

    fn bv_compound_u32(&mut self, name: &str, a: TermHandle, k: u32) -> TermHandle {
        let ty = self.type_of(a);
        self.intern_term(TermKey(format!("{}({},{})", name, a, k)), ty, None, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_constants_are_distinct_and_stable() {
        let mut bank = InMemoryBank::new();
        let t1 = bank.true_term();
        let t2 = bank.true_term();
        assert_eq!(t1, t2);
        assert_ne!(t1, bank.false_term());
    }

    #[test]
    fn and_of_true_false_is_false() {
        let mut bank = InMemoryBank::new();
        let t = bank.true_term();
        let f = bank.false_term();
        let result = bank.build_term(TermCtor::And(vec![t, f])).unwrap();
        assert_eq!(result, bank.false_term());
    }

    #[test]
    fn bv_const_is_hash_consed() {
        let mut bank = InMemoryBank::new();
        let a = bank.build_term(TermCtor::BvConst(4, BigUint::from(3u32))).unwrap();
        let b = bank.build_term(TermCtor::BvConst(4, BigUint::from(3u32))).unwrap();
        assert_eq!(a, b);
        assert_eq!(bank.bv_constant_value(a), Some((4, BigUint::from(3u32))));
    }

    #[test]
    fn name_binding_shadow_and_restore() {
        let mut bank = InMemoryBank::new();
        let t1 = bank.fresh_uninterpreted(bank.int_type);
        let t2 = bank.fresh_uninterpreted(bank.int_type);
        let prev = bank.define_term_name("x", t1);
        assert_eq!(prev, None);
        let prev2 = bank.define_term_name("x", t2);
        assert_eq!(prev2, Some(t1));
        bank.undefine_term_name("x", prev2);
        assert_eq!(bank.resolve_term_name("x"), Some(t1));
    }
}

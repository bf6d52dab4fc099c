//! Structured error escape (spec §4.9, §4.10, §7).
//!
//! Every failure detected by a push, a check, an eval, or a coercion is
//! reported as a `StackError`: one `ErrorKind` plus the offending cell's
//! location, the opcode being evaluated (if any), and an optional symbol
//! string. Nothing is caught inside the core; `StackError` is meant to
//! travel, via `?`, all the way back to the caller's unwind anchor
//! (`Stack::install_unwind_anchor`), which must call `Stack::reset` before
//! issuing any further push or evaluate.

use crate::bank::BankError;
use crate::location::Location;
use crate::opcode::Opcode;
use thiserror::Error;

/// The exhaustive set of error kinds from spec §7.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[error("internal invariant violation")]
    Internal,
    #[error("opcode not implemented")]
    OpNotImplemented,
    #[error("invalid opcode")]
    InvalidOp,
    #[error("wrong argument count for this operator")]
    InvalidFrame,
    #[error("undefined term name")]
    UndefTerm,
    #[error("undefined type name")]
    UndefType,
    #[error("undefined macro name")]
    UndefMacro,
    #[error("malformed rational literal")]
    RationalFormat,
    #[error("malformed floating point literal")]
    FloatFormat,
    #[error("malformed binary bit-vector literal")]
    BvBinFormat,
    #[error("malformed hexadecimal bit-vector literal")]
    BvHexFormat,
    #[error("type name already defined")]
    TypeNameRedef,
    #[error("term name already defined")]
    TermNameRedef,
    #[error("macro name already defined")]
    MacroRedef,
    #[error("duplicate name in scalar type constructor")]
    DuplicateScalarName,
    #[error("duplicate name in binder list")]
    DuplicateVarName,
    #[error("integer literal overflows a 32-bit integer")]
    IntegerOverflow,
    #[error("negative exponent not allowed here")]
    NegativeExponent,
    #[error("rational is not an integer")]
    NotAnInteger,
    #[error("expected a string")]
    NotAString,
    #[error("expected a symbol")]
    NotASymbol,
    #[error("expected a rational")]
    NotARational,
    #[error("expected a type")]
    NotAType,
    #[error("arithmetic precondition violated")]
    ArithError,
    #[error("division by zero")]
    DivideByZero,
    #[error("divisor is not a constant")]
    NonConstantDivisor,
    #[error("bit-vector size must be positive")]
    NonpositiveBvsize,
    #[error("incompatible bit-vector sizes")]
    IncompatibleBvsizes,
    #[error("invalid bit-vector constant")]
    InvalidBvconstant,
    #[error("bit-vector arithmetic precondition violated")]
    BvarithError,
    #[error("bit-vector logic precondition violated")]
    BvlogicError,
    #[error("definition body is not a subtype of the declared type")]
    TypeErrorInDefinition,
    #[error("external term/type builder refused the request")]
    ExternalError,
}

/// Error context carried across the unwind: kind, location, opcode, and an
/// optional offending symbol (spec §3 "error-escape context", §4.10).
///
/// `ExternalError` additionally carries the `BankError` the external
/// `TermBank`/`TypeBank` implementation raised, via `#[source]`, so a
/// caller can inspect (or log) what the external builder actually objected
/// to instead of only seeing the generic `ExternalError` kind.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{kind} at {location}{}{}", self.opcode_suffix(), self.symbol_suffix())]
pub struct StackError {
    pub kind: ErrorKind,
    pub location: Location,
    pub opcode: Option<Opcode>,
    pub symbol: Option<String>,
    #[source]
    pub source: Option<BankError>,
}

impl StackError {
    pub fn new(kind: ErrorKind, location: Location) -> Self {
        StackError { kind, location, opcode: None, symbol: None, source: None }
    }

    pub fn with_opcode(mut self, op: Opcode) -> Self {
        self.opcode = Some(op);
        self
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    /// Attaches the external bank's own error as the cause, and mirrors its
    /// message into `symbol` so callers that only look at `symbol` (rather
    /// than walking `std::error::Error::source`) still see it.
    pub fn with_source(mut self, source: BankError) -> Self {
        self.symbol = Some(source.0.clone());
        self.source = Some(source);
        self
    }

    fn opcode_suffix(&self) -> String {
        match self.opcode {
            Some(op) => format!(" (opcode {})", op),
            None => String::new(),
        }
    }

    fn symbol_suffix(&self) -> String {
        match &self.symbol {
            Some(s) => format!(" (symbol \"{}\")", s),
            None => String::new(),
        }
    }
}

pub type Result<T> = std::result::Result<T, StackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_carries_location_and_opcode() {
        let err = StackError::new(ErrorKind::UndefTerm, Location::new(3, 7))
            .with_opcode(Opcode::MK_AND)
            .with_symbol("foo");
        assert_eq!(err.kind, ErrorKind::UndefTerm);
        assert_eq!(err.location, Location::new(3, 7));
        assert_eq!(err.opcode, Some(Opcode::MK_AND));
        assert_eq!(err.symbol.as_deref(), Some("foo"));
    }
}

//! Source location carried by every stack cell.

/// A (line, column) pair, 1-based, plus an optional byte offset used by
/// callers that want to re-synchronize a lexer after an error escape.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, Hash)]
pub struct Location {
    pub line: u32,
    pub column: u32,
    pub offset: Option<u32>,
}

impl Location {
    pub fn new(line: u32, column: u32) -> Self {
        Location { line, column, offset: None }
    }

    pub fn with_offset(line: u32, column: u32, offset: u32) -> Self {
        Location { line, column, offset: Some(offset) }
    }

    /// A location used internally when no source position applies (e.g. the
    /// sentinel frame, or a synthesized result cell).
    pub fn unknown() -> Self {
        Location { line: 0, column: 0, offset: None }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

use thiserror::Error;

/// Unrecoverable lexical failure. Malformed declarations do not produce this;
/// the parser simply skips them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}, column {column}: {reason}")]
pub struct ParseError {
    pub line: u32,
    pub column: u16,
    pub reason: String,
}

impl ParseError {
    pub fn new(line: u32, column: u16, reason: impl Into<String>) -> Self {
        Self {
            line,
            column,
            reason: reason.into(),
        }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

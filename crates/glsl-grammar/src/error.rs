//! Error and diagnostic types for lexing and parsing.

use std::fmt;

use crate::Span;

/// A diagnostic produced while lexing or parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDiagnostic {
    /// A human-readable message.
    pub message: String,
    /// The span the message applies to.
    pub span: Span,
}

impl fmt::Display for ParseDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}..{}", self.message, self.span.start, self.span.end)
    }
}

/// Errors produced by this crate.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// The lexer encountered a byte sequence it could not tokenize.
    #[error("failed to lex input at byte {0}")]
    Lex(usize),

    /// Parsing failed. Only returned when the parser is configured to throw
    /// on error (a caller-selected strict mode); otherwise diagnostics are
    /// collected into [`crate::tree::ParseTree::diagnostics`] instead.
    #[error("{0}")]
    Parse(ParseDiagnostic),

    /// Input ended before a construct that required more tokens.
    #[error("unexpected end of input while parsing {0}")]
    UnexpectedEof(&'static str),
}

/// A [`Result`](std::result::Result) specialized for this crate's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

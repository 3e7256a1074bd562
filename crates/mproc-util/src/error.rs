//! Parse errors.
//!
//! MProc's grammar only ever reports one diagnostic per parse: the first
//! syntax error encountered stops the parser. [`ParseError`] carries enough
//! information to reproduce the original implementation's message format
//! exactly: `SyntaxError in {file}:{line}:{column}: {message}`.

use std::fmt;

use crate::position::Position;

/// The taxonomy of syntax errors a parse can fail with.
///
/// Each variant's `Display` impl is the exact message the original parser
/// produces for that failure, independent of where it happened - the
/// surrounding [`ParseError`] adds the file and position.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseErrorKind {
    /// A piece appeared where no context on the stack was prepared to
    /// accept it.
    #[error("unexpected symbol \"{piece}\"")]
    UnexpectedSymbol { piece: String },

    /// A flow operator (`#...`) showed up somewhere a new statement was
    /// not expected to start.
    #[error("unexpected flow operator")]
    UnexpectedFlowOperator,

    /// A `#word` was read but `word` is not one of the known flow
    /// operators.
    #[error("invalid flow operator: \"{operator}\"")]
    InvalidFlowOperator { operator: String },

    /// A context required a specific token (e.g. `->`, a block terminator)
    /// and did not get one.
    #[error("token expected")]
    TokenExpected,

    /// The source ended while a context still needed more input.
    #[error("unexpected end of file")]
    UnexpectedEof,

    /// A string literal's contents could not be interpreted.
    #[error("invalid string literal: \"{literal}\"")]
    InvalidStringLiteral { literal: String },
}

/// A single syntax error, positioned within a source file.
///
/// # Examples
///
/// ```
/// use mproc_util::{ParseError, Position};
/// use mproc_util::error::ParseErrorKind;
///
/// let err = ParseError::new(
///     "main.mproc",
///     Position::new(3, 7),
///     ParseErrorKind::TokenExpected,
/// );
/// assert_eq!(err.to_string(), "SyntaxError in main.mproc:3:7: token expected");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub file: String,
    pub position: Position,
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub fn new(file: impl Into<String>, position: Position, kind: ParseErrorKind) -> Self {
        ParseError { file: file.into(), position, kind }
    }

    pub fn unexpected_symbol(file: impl Into<String>, position: Position, piece: impl Into<String>) -> Self {
        Self::new(file, position, ParseErrorKind::UnexpectedSymbol { piece: piece.into() })
    }

    pub fn unexpected_flow_operator(file: impl Into<String>, position: Position) -> Self {
        Self::new(file, position, ParseErrorKind::UnexpectedFlowOperator)
    }

    pub fn invalid_flow_operator(file: impl Into<String>, position: Position, operator: impl Into<String>) -> Self {
        Self::new(file, position, ParseErrorKind::InvalidFlowOperator { operator: operator.into() })
    }

    pub fn token_expected(file: impl Into<String>, position: Position) -> Self {
        Self::new(file, position, ParseErrorKind::TokenExpected)
    }

    pub fn unexpected_eof(file: impl Into<String>, position: Position) -> Self {
        Self::new(file, position, ParseErrorKind::UnexpectedEof)
    }

    pub fn invalid_string_literal(file: impl Into<String>, position: Position, literal: impl Into<String>) -> Self {
        Self::new(file, position, ParseErrorKind::InvalidStringLiteral { literal: literal.into() })
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SyntaxError in {}:{}: {}",
            self.file, self.position, self.kind
        )
    }
}

impl std::error::Error for ParseError {}

//! Source positions.
//!
//! A [`Position`] is a `(line, symbol)` pair, both 1-based, matching the
//! coordinates MProc's own error messages use. There is no byte offset and
//! no file identifier here: this parser only ever looks at one source at a
//! time, so a bare line/column pair is all either layer needs.

use std::fmt;

/// A 1-based `(line, symbol)` coordinate into a source file.
///
/// `line` and `symbol` both start at 1, matching how editors and the
/// original MProc error messages count them - there is no line 0 or
/// symbol 0.
///
/// # Examples
///
/// ```
/// use mproc_util::Position;
///
/// let start = Position::START;
/// assert_eq!(start.line, 1);
/// assert_eq!(start.symbol, 1);
///
/// let next = start.advance(false);
/// assert_eq!(next, Position { line: 1, symbol: 2 });
///
/// let newline = start.advance(true);
/// assert_eq!(newline, Position { line: 2, symbol: 1 });
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Position {
    pub line: u32,
    pub symbol: u32,
}

impl Position {
    /// The position of the first symbol of the first line.
    pub const START: Position = Position { line: 1, symbol: 1 };

    pub fn new(line: u32, symbol: u32) -> Self {
        Position { line, symbol }
    }

    /// Advance past one symbol. `newline` should be `true` when the symbol
    /// just consumed was `'\n'`, in which case the line counter increments
    /// and the symbol counter resets to 1; otherwise only the symbol
    /// counter advances.
    ///
    /// This mirrors the reader's lazy line-increment: the line number does
    /// not change *while reading* the newline character, only once the
    /// character past it is reached.
    pub fn advance(self, newline: bool) -> Self {
        if newline {
            Position { line: self.line + 1, symbol: 1 }
        } else {
            Position { line: self.line, symbol: self.symbol + 1 }
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::START
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.symbol)
    }
}

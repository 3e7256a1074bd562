//! Single-character source reader with position tracking.
//!
//! Adapted from the teacher's byte-oriented cursor: an ASCII/UTF-8 source
//! string walked one character at a time. Unlike that cursor, this reader
//! never rewinds (the grammar above it never backtracks) and its line
//! counter increments lazily - reading a `'\n'` does not itself advance the
//! line; the *next* read does, after first resetting the symbol counter.
//! This mirrors the one-past-read cursor `(line_end, symbol_end)` the
//! grammar is built around.

use mproc_util::Position;

/// Walks a source string one `char` at a time, forward only.
pub struct SourceReader<'a> {
    source: &'a str,
    byte_pos: usize,
    line_end: u32,
    symbol_end: u32,
    pending_newline: bool,
}

impl<'a> SourceReader<'a> {
    pub fn new(source: &'a str) -> Self {
        SourceReader {
            source,
            byte_pos: 0,
            line_end: 1,
            symbol_end: 0,
            pending_newline: false,
        }
    }

    /// The position just past the most recently read character.
    pub fn end(&self) -> Position {
        Position::new(self.line_end, self.symbol_end)
    }

    /// Looks at the next character without consuming it.
    pub fn peek(&self) -> Option<char> {
        self.source[self.byte_pos..].chars().next()
    }

    pub fn is_eof(&self) -> bool {
        self.byte_pos >= self.source.len()
    }

    /// Reads and consumes the next character, or returns `None` at EOF.
    /// Reading past EOF is idempotent: it keeps returning `None` without
    /// moving the cursor or the position counters.
    pub fn read(&mut self) -> Option<char> {
        if self.pending_newline {
            self.line_end += 1;
            self.symbol_end = 0;
            self.pending_newline = false;
        }

        let c = self.peek()?;
        self.byte_pos += c.len_utf8();
        self.symbol_end += 1;
        self.pending_newline = c == '\n';
        Some(c)
    }
}

//! The piece lexer: one parameterised read routine that every parse context
//! drives with its own knobs instead of re-implementing lexing.

use mproc_util::{ParseError, Position};

use crate::reader::SourceReader;

/// What stopped a piece from growing further.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Delim {
    /// A delimiter character was read and consumed.
    Char(char),
    /// The source ended.
    Eof,
    /// Exact-symbols mode was used; there is no delimiter.
    None,
}

/// A lexed piece together with the delimiter that ended it and the
/// positions it spans.
#[derive(Clone, Debug)]
pub struct Piece {
    pub text: String,
    pub delimiter: Delim,
    pub start: Position,
    pub end: Position,
}

/// Parameters the current parse context supplies for the next piece.
#[derive(Clone, Copy, Debug)]
pub struct LexParams {
    pub delimiters: &'static [char],
    pub allow_spaces: bool,
    pub endl_as_whitespace: bool,
    pub exact_symbols: usize,
}

impl LexParams {
    pub const fn new(delimiters: &'static [char]) -> Self {
        LexParams { delimiters, allow_spaces: false, endl_as_whitespace: false, exact_symbols: 0 }
    }

    pub const fn allow_spaces(mut self) -> Self {
        self.allow_spaces = true;
        self
    }

    pub const fn endl_as_whitespace(mut self) -> Self {
        self.endl_as_whitespace = true;
        self
    }

    pub const fn exact_symbols(mut self, n: usize) -> Self {
        self.exact_symbols = n;
        self
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Cur {
    Char(char),
    Eof,
}

impl Cur {
    fn from_option(c: Option<char>) -> Self {
        match c {
            Some(c) => Cur::Char(c),
            None => Cur::Eof,
        }
    }
}

#[derive(Clone, Copy)]
enum ActiveDelims {
    Normal(&'static [char]),
    StringLiteral,
    EofOnly,
}

impl ActiveDelims {
    fn contains(self, c: Cur) -> bool {
        match (self, c) {
            (_, Cur::Eof) => true,
            (ActiveDelims::Normal(set), Cur::Char(ch)) => set.contains(&ch),
            (ActiveDelims::StringLiteral, Cur::Char(ch)) => ch == '\n' || ch == '"',
            (ActiveDelims::EofOnly, Cur::Char(_)) => false,
        }
    }
}

fn is_whitespace(c: char, endl_as_whitespace: bool) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\x0b' | '\x0c') || (endl_as_whitespace && c == '\n')
}

/// Drives a [`SourceReader`] with context-supplied parameters, producing one
/// piece per call.
pub struct Lexer<'a> {
    reader: SourceReader<'a>,
    file: String,
}

impl<'a> Lexer<'a> {
    pub fn new(file: impl Into<String>, source: &'a str) -> Self {
        Lexer { reader: SourceReader::new(source), file: file.into() }
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    fn skip_whitespace(&mut self, endl_as_whitespace: bool) -> Cur {
        loop {
            match self.reader.read() {
                None => return Cur::Eof,
                Some(ch) if is_whitespace(ch, endl_as_whitespace) => continue,
                Some(ch) => return Cur::Char(ch),
            }
        }
    }

    /// Reads the next piece from the source, per the parameters the current
    /// context supplies.
    pub fn read_piece(&mut self, params: &LexParams) -> Result<Piece, ParseError> {
        if params.exact_symbols > 0 {
            let mut text = String::new();
            for _ in 0..params.exact_symbols {
                if let Some(ch) = self.reader.read() {
                    text.push(ch);
                }
            }
            let pos = self.reader.end();
            return Ok(Piece { text, delimiter: Delim::None, start: pos, end: pos });
        }

        let mut cur = if params.allow_spaces {
            self.skip_whitespace(params.endl_as_whitespace)
        } else {
            Cur::from_option(self.reader.read())
        };
        let start = self.reader.end();

        let mut piece = String::new();
        let mut is_string_literal = false;
        let mut first_time = false;
        let mut is_comment = false;
        let original_delims = params.delimiters;
        let mut active = ActiveDelims::Normal(original_delims);

        if cur == Cur::Char('"') {
            active = ActiveDelims::StringLiteral;
            is_string_literal = true;
            first_time = true;
        }

        loop {
            if active.contains(cur) && !first_time {
                break;
            }
            first_time = false;

            if cur == Cur::Char('/') && !is_string_literal {
                is_comment = true;
                active = ActiveDelims::EofOnly;
            } else if cur == Cur::Char('\n') && is_comment {
                let newline_in_original = original_delims.contains(&'\n');
                if newline_in_original && (!params.endl_as_whitespace || !piece.is_empty()) {
                    return Ok(Piece {
                        text: piece,
                        delimiter: Delim::Char('\n'),
                        start,
                        end: self.reader.end(),
                    });
                }
                active = ActiveDelims::Normal(original_delims);
                is_comment = false;
                if params.allow_spaces {
                    cur = self.skip_whitespace(params.endl_as_whitespace);
                }
                continue;
            }

            if !is_comment {
                if let Cur::Char(ch) = cur {
                    piece.push(ch);
                }
            }
            cur = Cur::from_option(self.reader.read());
        }

        if is_string_literal {
            if cur != Cur::Char('"') {
                return Err(ParseError::unexpected_eof(self.file.clone(), start));
            }
            piece.push('"');
            cur = Cur::from_option(self.reader.read());
            let in_original = match cur {
                Cur::Eof => true,
                Cur::Char(ch) => original_delims.contains(&ch),
            };
            if !in_original {
                if let Cur::Char(ch) = cur {
                    piece.push(ch);
                }
                return Err(ParseError::invalid_string_literal(self.file.clone(), start, piece));
            }
            let delimiter = match cur {
                Cur::Eof => Delim::Eof,
                Cur::Char(ch) => Delim::Char(ch),
            };
            return Ok(Piece { text: piece, delimiter, start, end: self.reader.end() });
        }

        let delimiter = match cur {
            Cur::Eof => Delim::Eof,
            Cur::Char(ch) => Delim::Char(ch),
        };
        Ok(Piece { text: piece, delimiter, start, end: self.reader.end() })
    }
}

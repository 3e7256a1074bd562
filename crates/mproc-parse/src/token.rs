//! The token classifier (spec.md §4.4): a pure function mapping a non-empty
//! piece of text to a literal or identifier node.

use mproc_util::{ParseError, Position};

use crate::ast::{Node, NumericLiteral, Number, StringLiteral, Token};

/// Classifies `piece` (already lexed, never containing its delimiter) into
/// a leaf expression node positioned at `pos` (the piece's start).
///
/// An empty piece is always an error: every call site that may see one
/// checks first and only classifies non-empty pieces, exactly like the
/// Python `parse_token` the original implementation uses at identical call
/// sites that require a token.
pub fn classify(file: &str, pos: Position, piece: &str) -> Result<Node, ParseError> {
    if piece.is_empty() {
        return Err(ParseError::token_expected(file, pos));
    }

    if piece.len() >= 2 && piece.starts_with('"') && piece.ends_with('"') {
        let value = piece[1..piece.len() - 1].to_string();
        return Ok(Node::StringLiteral(StringLiteral { pos, value }));
    }

    if let Some(value) = try_integer(piece) {
        return Ok(Node::NumericLiteral(NumericLiteral { pos, value: Number::Int(value) }));
    }

    if let Some(value) = try_float(piece) {
        return Ok(Node::NumericLiteral(NumericLiteral { pos, value: Number::Float(value) }));
    }

    Ok(Node::Token(Token { pos, name: piece.to_string() }))
}

fn try_integer(piece: &str) -> Option<i64> {
    let (digits, base) = if let Some(rest) = piece.strip_prefix("0x") {
        (rest, 16)
    } else if let Some(rest) = piece.strip_prefix("0b") {
        (rest, 2)
    } else {
        (piece, 10)
    };
    if digits.is_empty() {
        return None;
    }
    i64::from_str_radix(digits, base).ok()
}

/// `mlog` tolerates one trailing dot: `2.2.` parses as the float `2.2`
/// (spec.md §9 Open Question 2). Only one trailing `.` is ever stripped.
fn try_float(piece: &str) -> Option<f64> {
    let candidate = piece.strip_suffix('.').unwrap_or(piece);
    candidate.parse::<f64>().ok()
}

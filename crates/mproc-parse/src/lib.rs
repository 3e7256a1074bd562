//! mproc-parse - the MProc syntax tree, token classifier, and context
//! stack (spec.md §3.2, §4.4, §4.3). This is the core of the parser: a
//! last-in-first-out stack of parse contexts, each supplying the piece
//! lexer's parameters and reacting to the resulting `(piece, delimiter)`
//! pair, as described in spec.md §2-§4.
//!
//! The context stack is modelled as a tree of mutually recursive methods
//! on [`context::Parser`] rather than an explicit `Vec<Frame>` - see the
//! module doc on `context` for why. The two entry points a host tool calls
//! are [`parse_str`] (parse an in-memory source string) and [`parse_file`]
//! (read a path and parse it).

pub mod ast;
pub mod context;
pub mod token;

pub use ast::{
    Assignment, Block, BlockKind, Branch, Call, FuncLike, FunctionDefinition, KeywordExpr, List,
    MLog, Node, Number, NumericLiteral, RawFunc, Return, Root, StringLiteral, Token,
};
pub use context::{parse_file, parse_str};

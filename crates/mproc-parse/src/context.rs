//! The context-stack protocol (spec.md §4.3): a lexer/parser feedback loop
//! in which a stack of parse contexts each supply the lexer's next
//! parameters and react to the resulting piece.
//!
//! The original implementation keeps this stack explicit (a list of
//! `Context` objects, pushed and popped by hand). Here the same protocol is
//! driven by the native call stack instead: every context becomes a
//! function, pushing a child context is a call, and a context "popping and
//! delivering its content to its parent" is simply that function returning.
//! This is the idiomatic Rust shape for a recursive grammar and avoids
//! threading an explicit `Vec<Frame>` through the borrow checker for no
//! benefit - the grammar never needs to suspend a context and resume a
//! sibling, so the call stack already *is* the context stack.
//!
//! One simplification: `MLogEndContext`, a one-shot intermediate context
//! whose only job is to assert the next piece starts with `#` and hand off
//! to a `#end...` reader, is inlined into [`Parser::read_raw_text`] rather
//! than modelled as its own step.

use std::path::Path;

use anyhow::Context as _;
use mproc_lex::{Delim, Lexer, LexParams, Piece};
use mproc_util::{ParseError, Position};

use crate::ast::{
    Assignment, Block, BlockKind, Branch, Call, FuncLike, FunctionDefinition, KeywordExpr, List,
    MLog, Node, RawFunc, Return, Root,
};
use crate::token;

const WS: &[char] = &[' ', '\t', '\r', '\u{0B}', '\u{0C}'];
const FULL_DELIMS: &[char] = &[' ', '\t', '\r', '\u{0B}', '\u{0C}', '#', '\n', '=', ',', '(', ')'];
const KEYWORD_DELIMS: &[char] = &[' ', '\t', '\r', '\u{0B}', '\u{0C}', '\n'];
const HEADER_DELIMS: &[char] =
    &[' ', '\t', '\r', '\u{0B}', '\u{0C}', '#', '\n', '=', ',', '(', ')', '-'];

/// Parses a complete source string into a [`Root`] node.
pub fn parse_str(file: &str, source: &str) -> Result<Node, ParseError> {
    let mut parser = Parser::new(file, source);
    parser.parse_root()
}

/// Reads and parses a source file from disk.
pub fn parse_file(path: impl AsRef<Path>) -> anyhow::Result<Node> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let file = path.to_string_lossy().into_owned();
    Ok(parse_str(&file, &source)?)
}

/// A value that has been fully resolved to a node, together with the
/// delimiter that ended it - the piece of lookahead every caller needs to
/// decide whether to keep reading (another list element, another call
/// argument) or stop.
struct Resolved {
    node: Node,
    delim: Delim,
    end: Position,
}

/// `#else` or `#after` - the two body-switch keywords, each tied to the one
/// block kind it is allowed to switch (`#else` only inside `#if`, `#after`
/// only inside `#loop`; spec.md §4.3.7).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum SwitchWord {
    Else,
    After,
}

impl SwitchWord {
    fn expected_kind(self) -> BlockKind {
        match self {
            SwitchWord::Else => BlockKind::If,
            SwitchWord::After => BlockKind::Loop,
        }
    }

    fn text(self) -> &'static str {
        match self {
            SwitchWord::Else => "else",
            SwitchWord::After => "after",
        }
    }
}

/// What a `#flow-operator` turned out to be: an ordinary statement node, a
/// `#endX` closing the enclosing block, or a `#else`/`#after` body switch.
enum FlowOutcome {
    Node(Node),
    BlockEnd(BlockKind, Position),
    BodySwitch(SwitchWord, Position),
}

/// One statement read from inside a block body.
enum BodyItem {
    Stmt(Node),
    End(BlockKind, Position),
    Switch(SwitchWord, Position),
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    file: String,
}

impl<'a> Parser<'a> {
    fn new(file: &str, source: &'a str) -> Self {
        Parser { lexer: Lexer::new(file, source), file: file.to_string() }
    }

    // ---- root (RootContext / SkipEmptyLinesContext) ----------------------

    fn parse_root(&mut self) -> Result<Node, ParseError> {
        let pos = Position::new(1, 1);
        let mut body = Vec::new();
        while let Some(node) = self.read_statement()? {
            body.push(node);
        }
        Ok(Node::Root(Root { pos, body }))
    }

    fn read_statement(&mut self) -> Result<Option<Node>, ParseError> {
        let piece = self.read_head(false)?;
        if piece.text.is_empty() && matches!(piece.delimiter, Delim::Eof) {
            return Ok(None);
        }
        match piece.delimiter {
            Delim::Char('#') => {
                if !piece.text.is_empty() {
                    return Err(ParseError::unexpected_flow_operator(&self.file, piece.end));
                }
                match self.read_flow_operator()? {
                    FlowOutcome::Node(n) => Ok(Some(n)),
                    FlowOutcome::BlockEnd(k, pos) => Err(ParseError::unexpected_symbol(
                        &self.file,
                        pos,
                        format!("#end{}", block_word(k)),
                    )),
                    FlowOutcome::BodySwitch(word, pos) => Err(ParseError::unexpected_symbol(
                        &self.file,
                        pos,
                        format!("#{}", word.text()),
                    )),
                }
            }
            Delim::Char(')') => {
                Err(ParseError::unexpected_symbol(&self.file, piece.end, ")".to_string()))
            }
            _ => {
                let resolved = self.resolve(piece)?;
                let resolved = self.finish_after(resolved)?;
                self.expect_statement_end(resolved.delim, resolved.end)?;
                Ok(Some(resolved.node))
            }
        }
    }

    // ---- block bodies (SimpleBlock / BlockWithExpression) ----------------

    fn read_body_item(&mut self) -> Result<BodyItem, ParseError> {
        let piece = self.read_head(false)?;
        if piece.text.is_empty() && matches!(piece.delimiter, Delim::Eof) {
            return Err(ParseError::unexpected_eof(&self.file, piece.end));
        }
        match piece.delimiter {
            Delim::Char('#') => {
                if !piece.text.is_empty() {
                    return Err(ParseError::unexpected_flow_operator(&self.file, piece.end));
                }
                match self.read_flow_operator()? {
                    FlowOutcome::Node(n) => Ok(BodyItem::Stmt(n)),
                    FlowOutcome::BlockEnd(k, pos) => Ok(BodyItem::End(k, pos)),
                    FlowOutcome::BodySwitch(word, pos) => Ok(BodyItem::Switch(word, pos)),
                }
            }
            Delim::Char(')') => {
                Err(ParseError::unexpected_symbol(&self.file, piece.end, ")".to_string()))
            }
            _ => {
                let resolved = self.resolve(piece)?;
                let resolved = self.finish_after(resolved)?;
                self.expect_statement_end(resolved.delim, resolved.end)?;
                Ok(BodyItem::Stmt(resolved.node))
            }
        }
    }

    fn read_simple_block(&mut self, kind: BlockKind) -> Result<Vec<Node>, ParseError> {
        let mut body = Vec::new();
        loop {
            match self.read_body_item()? {
                BodyItem::Stmt(n) => body.push(n),
                BodyItem::End(k, pos) => {
                    expect_block_kind(&self.file, k, kind, pos)?;
                    return Ok(body);
                }
                BodyItem::Switch(word, pos) => {
                    return Err(ParseError::unexpected_symbol(&self.file, pos, format!("#{}", word.text())))
                }
            }
        }
    }

    /// `#if` / `#loop`: a statement sequence split into `body` and, after a
    /// `#else` / `#after` switch, `body2`. `#else` only switches an `#if`,
    /// `#after` only a `#loop` (spec.md §4.3.7); the other word reaching the
    /// wrong block kind is an `unexpected symbol` error quoting itself.
    fn read_branch_body(&mut self, kind: BlockKind) -> Result<(Vec<Node>, Vec<Node>), ParseError> {
        let mut body = Vec::new();
        let mut body2 = Vec::new();
        let mut in_body2 = false;
        loop {
            match self.read_body_item()? {
                BodyItem::Stmt(n) => {
                    if in_body2 {
                        body2.push(n);
                    } else {
                        body.push(n);
                    }
                }
                BodyItem::End(k, pos) => {
                    expect_block_kind(&self.file, k, kind, pos)?;
                    return Ok((body, body2));
                }
                BodyItem::Switch(word, pos) => {
                    if in_body2 || word.expected_kind() != kind {
                        return Err(ParseError::unexpected_symbol(&self.file, pos, format!("#{}", word.text())));
                    }
                    in_body2 = true;
                }
            }
        }
    }

    // ---- flow operators (ExpectedFlowOperatorContext and friends) --------

    fn read_flow_operator(&mut self) -> Result<FlowOutcome, ParseError> {
        let piece = self.lexer.read_piece(&LexParams::new(KEYWORD_DELIMS))?;
        let pos = keyword_pos(piece.start);

        // An empty word (`"#\n"`) is just another unrecognised piece, not a
        // distinct error kind: it falls through to the `other` arm below,
        // matching the original's `MProcInvalidFlowOperatorError(piece)`
        // raised for any unmatched piece including the empty one.
        let node = match piece.text.as_str() {
            "break" => self.finish_self_sufficient(Node::Break(pos))?,
            "continue" => self.finish_self_sufficient(Node::Continue(pos))?,
            "end" => self.finish_self_sufficient(Node::End(pos))?,
            "stop" => self.finish_self_sufficient(Node::Stop(pos))?,

            "import" => Node::Import(KeywordExpr { pos, expression: Box::new(self.finish_keyword_expr(pos)?) }),
            "wait" => Node::Wait(KeywordExpr { pos, expression: Box::new(self.finish_keyword_expr(pos)?) }),
            "using" => Node::Using(KeywordExpr { pos, expression: Box::new(self.finish_keyword_expr(pos)?) }),
            "var" => Node::Var(KeywordExpr { pos, expression: Box::new(self.finish_keyword_expr(pos)?) }),
            "return" => self.finish_return(pos)?,

            "def" => { self.finish_block_header(pos)?; Node::Def(Block { pos, body: self.read_simple_block(BlockKind::Def)? }) }
            "init" => { self.finish_block_header(pos)?; Node::Init(Block { pos, body: self.read_simple_block(BlockKind::Init)? }) }
            "prog" => { self.finish_block_header(pos)?; Node::Prog(Block { pos, body: self.read_simple_block(BlockKind::Prog)? }) }
            "link" => { self.finish_block_header(pos)?; Node::Link(Block { pos, body: self.read_simple_block(BlockKind::Link)? }) }

            "if" => {
                let expr = self.finish_keyword_expr(pos)?;
                let (body, body2) = self.read_branch_body(BlockKind::If)?;
                Node::If(Branch { pos, expression: Box::new(expr), body, body2 })
            }
            "loop" => {
                let expr = self.finish_keyword_expr(pos)?;
                let (body, body2) = self.read_branch_body(BlockKind::Loop)?;
                Node::Loop(Branch { pos, expression: Box::new(expr), body, body2 })
            }

            "func" => self.finish_function(pos, BlockKind::Func)?,
            "enum" => self.finish_function(pos, BlockKind::Enum)?,
            "rawfunc" => self.finish_raw_function(pos)?,
            "mlog" => Node::MLog(MLog { pos, body: self.read_raw_text(BlockKind::MLog)? }),

            "endprog" => return Ok(FlowOutcome::BlockEnd(BlockKind::Prog, pos)),
            "endfunc" => return Ok(FlowOutcome::BlockEnd(BlockKind::Func, pos)),
            "endif" => return Ok(FlowOutcome::BlockEnd(BlockKind::If, pos)),
            "endloop" => return Ok(FlowOutcome::BlockEnd(BlockKind::Loop, pos)),
            "enddef" => return Ok(FlowOutcome::BlockEnd(BlockKind::Def, pos)),
            "endinit" => return Ok(FlowOutcome::BlockEnd(BlockKind::Init, pos)),
            "endmlog" => return Ok(FlowOutcome::BlockEnd(BlockKind::MLog, pos)),
            "endenum" => return Ok(FlowOutcome::BlockEnd(BlockKind::Enum, pos)),
            "endlink" => return Ok(FlowOutcome::BlockEnd(BlockKind::Link, pos)),
            "endrawfunc" => return Ok(FlowOutcome::BlockEnd(BlockKind::RawFunc, pos)),
            "else" => return Ok(FlowOutcome::BodySwitch(SwitchWord::Else, pos)),
            "after" => return Ok(FlowOutcome::BodySwitch(SwitchWord::After, pos)),

            other => return Err(ParseError::invalid_flow_operator(&self.file, pos, other.to_string())),
        };
        Ok(FlowOutcome::Node(node))
    }

    /// `#break` / `#continue` / `#end` / `#stop`: nothing may follow but the
    /// statement terminator.
    fn finish_self_sufficient(&mut self, node: Node) -> Result<Node, ParseError> {
        let piece = self.lexer.read_piece(&LexParams::new(&['\n']).allow_spaces())?;
        if !piece.text.is_empty() {
            return Err(ParseError::unexpected_symbol(&self.file, piece.start, piece.text));
        }
        Ok(node)
    }

    /// `#import` / `#wait` / `#using` / `#var` / the expression guard of
    /// `#if` and `#loop`: one required expression, which may itself be a
    /// comma-separated list, ending the statement.
    fn finish_keyword_expr(&mut self, _pos: Position) -> Result<Node, ParseError> {
        let value = self.read_full_value()?;
        self.expect_statement_end(value.delim, value.end)?;
        Ok(value.node)
    }

    fn finish_return(&mut self, pos: Position) -> Result<Node, ParseError> {
        let piece = self.read_head(true)?;
        if piece.text.is_empty() && matches!(piece.delimiter, Delim::Char('\n') | Delim::Eof) {
            return Ok(Node::Return(Return { pos, expression: None }));
        }
        let resolved = self.resolve(piece)?;
        let resolved = self.finish_after(resolved)?;
        self.expect_statement_end(resolved.delim, resolved.end)?;
        Ok(Node::Return(Return { pos, expression: Some(Box::new(resolved.node)) }))
    }

    /// `#def` / `#init` / `#prog` / `#link`: nothing may follow the keyword
    /// but the newline that opens the body.
    fn finish_block_header(&mut self, _pos: Position) -> Result<(), ParseError> {
        let piece = self.lexer.read_piece(&LexParams::new(&['\n']).allow_spaces())?;
        if !piece.text.is_empty() {
            return Err(ParseError::unexpected_symbol(&self.file, piece.start, piece.text));
        }
        Ok(())
    }

    /// `#func` / `#enum`: a header (`name` or `name(args)`), optionally
    /// followed by `-> returns`.
    fn finish_function(&mut self, pos: Position, kind: BlockKind) -> Result<Node, ParseError> {
        let definition = self.read_function_header(pos)?;
        let body = self.read_simple_block(kind)?;
        Ok(match kind {
            BlockKind::Func => Node::Func(FuncLike { pos, definition: Box::new(definition), body }),
            BlockKind::Enum => Node::Enum(FuncLike { pos, definition: Box::new(definition), body }),
            _ => unreachable!("finish_function only called for Func/Enum"),
        })
    }

    /// `#rawfunc`: same header grammar as `#func`, but the body is raw text
    /// up to the matching `#endrawfunc`.
    fn finish_raw_function(&mut self, pos: Position) -> Result<Node, ParseError> {
        let definition = self.read_function_header(pos)?;
        let body = self.read_raw_text(BlockKind::RawFunc)?;
        Ok(Node::RawFunc(RawFunc { pos, definition: Box::new(definition), body }))
    }

    /// Reads `name`, `name(args)`, `name -> returns` or `name(args) ->
    /// returns` - the header shared by `#func`, `#enum` and `#rawfunc`.
    /// The header token is always required: an empty piece here is a
    /// `TokenExpected` error, unlike a plain assignment's left-hand side.
    fn read_function_header(&mut self, pos: Position) -> Result<Node, ParseError> {
        let piece = self.read_head_with(HEADER_DELIMS, false)?;
        if matches!(piece.delimiter, Delim::Char('#')) {
            return Err(ParseError::unexpected_flow_operator(&self.file, piece.end));
        }
        if piece.text.is_empty() {
            return Err(ParseError::token_expected(&self.file, piece.end));
        }

        let (header_node, tail) = match piece.delimiter {
            Delim::Char('(') => {
                let callee = token::classify(&self.file, piece.start, &piece.text)?;
                let call = self.finish_call(callee)?;
                let tail = self.read_head_with(HEADER_DELIMS, false)?;
                (call, tail)
            }
            _ => {
                let node = token::classify(&self.file, piece.start, &piece.text)?;
                (node, piece)
            }
        };

        if matches!(tail.delimiter, Delim::Char('#')) {
            return Err(ParseError::unexpected_flow_operator(&self.file, tail.end));
        }

        if tail.text.is_empty() && matches!(tail.delimiter, Delim::Char('-')) {
            let arrow = self.lexer.read_piece(&LexParams::new(&[]).exact_symbols(1))?;
            if arrow.text != ">" {
                return Err(ParseError::unexpected_symbol(
                    &self.file,
                    arrow.start,
                    format!("-{}", arrow.text),
                ));
            }
            let ret = self.read_full_value()?;
            self.expect_statement_end(ret.delim, ret.end)?;
            return Ok(Node::FunctionDefinition(FunctionDefinition {
                pos,
                call: Box::new(header_node),
                returns: Box::new(ret.node),
            }));
        }

        if tail.text.is_empty() && matches!(tail.delimiter, Delim::Char('\n') | Delim::Eof) {
            return Ok(header_node);
        }

        let bad = if tail.text.is_empty() { delim_text(tail.delimiter) } else { tail.text };
        Err(ParseError::unexpected_symbol(&self.file, tail.start, bad))
    }

    /// `#mlog` / the body of `#rawfunc`: raw source text up to the next
    /// `#`, which must then spell `#endX` for the right `X`. Folds in
    /// `MLogEndContext`'s single behaviour (the `#` has to be there).
    fn read_raw_text(&mut self, kind: BlockKind) -> Result<String, ParseError> {
        let piece = self.lexer.read_piece(&LexParams::new(&['#']))?;
        if matches!(piece.delimiter, Delim::Eof) {
            return Err(ParseError::unexpected_eof(&self.file, piece.end));
        }
        let last_line = piece.text.rsplit('\n').next().unwrap_or(&piece.text);
        if !last_line.trim().is_empty() {
            return Err(ParseError::unexpected_flow_operator(&self.file, piece.end));
        }

        let word = self.lexer.read_piece(&LexParams::new(KEYWORD_DELIMS))?;
        let expected = format!("end{}", block_word(kind));
        if word.text != expected {
            return Err(ParseError::unexpected_symbol(&self.file, word.start, format!("#{}", word.text)));
        }
        let terminator = self.lexer.read_piece(&LexParams::new(&['\n']).allow_spaces())?;
        if !terminator.text.is_empty() {
            return Err(ParseError::unexpected_symbol(&self.file, terminator.start, terminator.text));
        }
        Ok(piece.text)
    }

    // ---- expressions (RightHandSide / List / Call / ArgumentList) --------

    /// Collapses runs of whitespace (and, for `endl_ws`, blank lines) into a
    /// single logical piece, rejecting two bare tokens in a row and a `#`
    /// immediately following one (`SkipSpacesContext`'s two checks).
    fn read_head(&mut self, endl_ws: bool) -> Result<Piece, ParseError> {
        self.read_head_with(FULL_DELIMS, endl_ws)
    }

    fn read_head_with(&mut self, delims: &'static [char], endl_ws: bool) -> Result<Piece, ParseError> {
        let mut carried: Option<(String, Position)> = None;
        loop {
            let mut params = LexParams::new(delims).allow_spaces();
            if endl_ws {
                params = params.endl_as_whitespace();
            }
            let piece = self.lexer.read_piece(&params)?;

            let is_ws_delim = matches!(piece.delimiter, Delim::Char(c) if WS.contains(&c));
            let is_blank_newline =
                piece.text.is_empty() && matches!(piece.delimiter, Delim::Char('\n')) && carried.is_none();

            if !piece.text.is_empty() {
                if carried.is_some() {
                    return Err(ParseError::unexpected_symbol(&self.file, piece.start, piece.text));
                }
                carried = Some((piece.text.clone(), piece.start));
            } else if matches!(piece.delimiter, Delim::Char('#')) && carried.is_some() {
                return Err(ParseError::unexpected_flow_operator(&self.file, piece.end));
            }

            if is_ws_delim || is_blank_newline {
                continue;
            }

            let (text, start) = carried.unwrap_or((String::new(), piece.start));
            return Ok(Piece { text, delimiter: piece.delimiter, start, end: piece.end });
        }
    }

    fn resolve_value(&mut self) -> Result<Resolved, ParseError> {
        let piece = self.read_head(true)?;
        self.resolve(piece)
    }

    /// Reads one complete value, expanding a trailing comma into a list.
    fn read_full_value(&mut self) -> Result<Resolved, ParseError> {
        let first = self.resolve_value()?;
        self.finish_after(first)
    }

    /// Classifies a single already-lexed piece: `(` starts a call, `=`
    /// starts a (possibly list-valued) assignment, `#` can never belong to
    /// an expression (spec.md §7's "unexpected flow operator" kind), and
    /// anything else is a bare literal/identifier ending exactly where the
    /// lexer stopped.
    fn resolve(&mut self, piece: Piece) -> Result<Resolved, ParseError> {
        match piece.delimiter {
            Delim::Char('(') => {
                let callee = token::classify(&self.file, piece.start, &piece.text)?;
                let call = self.finish_call(callee)?;
                let next = self.read_head(false)?;
                if matches!(next.delimiter, Delim::Char('#')) {
                    return Err(ParseError::unexpected_flow_operator(&self.file, next.end));
                }
                if !next.text.is_empty() {
                    return Err(ParseError::unexpected_symbol(&self.file, next.start, next.text));
                }
                Ok(Resolved { node: call, delim: next.delimiter, end: next.end })
            }
            Delim::Char('=') => {
                let lhs = token::classify(&self.file, piece.start, &piece.text)?;
                let pos = lhs.pos();
                let value = self.resolve_value()?;
                let value = self.finish_after(value)?;
                Ok(Resolved {
                    node: Node::Assignment(Assignment { pos, lhs: Box::new(lhs), rhs: Box::new(value.node) }),
                    delim: value.delim,
                    end: value.end,
                })
            }
            Delim::Char('#') => Err(ParseError::unexpected_flow_operator(&self.file, piece.end)),
            other => Ok(Resolved {
                node: token::classify(&self.file, piece.start, &piece.text)?,
                delim: other,
                end: piece.end,
            }),
        }
    }

    /// `a, b = 1, 2` / `a, b, c` - `ListContext`. Always reads with
    /// `endl_as_whitespace`, matching the class-level default the original
    /// sets for every list, top-level or nested.
    ///
    /// An `=` reached while accumulating elements (`ListContext.
    /// create_assignment` in the original) does not start a nested
    /// assignment scoped to just the latest element: the whole list
    /// accumulated so far - including the token that precedes the `=` -
    /// is promoted into the `lhs` of one `Assignment` covering the entire
    /// statement (`b, c = d, f(1)` is `Assignment(List([b, c]), List([d,
    /// f(1)]))`, not `List([b, Assignment(c, ...)])`).
    fn read_list(&mut self, first: Node) -> Result<Resolved, ParseError> {
        let pos = first.pos();
        let mut expressions = vec![first];
        loop {
            let piece = self.read_head(true)?;
            if matches!(piece.delimiter, Delim::Char('=')) {
                let lhs_tail = token::classify(&self.file, piece.start, &piece.text)?;
                expressions.push(lhs_tail);
                let lhs = Node::List(List { pos, expressions });
                let value = self.resolve_value()?;
                let value = self.finish_after(value)?;
                return Ok(Resolved {
                    node: Node::Assignment(Assignment { pos, lhs: Box::new(lhs), rhs: Box::new(value.node) }),
                    delim: value.delim,
                    end: value.end,
                });
            }

            let element = self.resolve(piece)?;
            match element.delim {
                Delim::Char(',') => expressions.push(element.node),
                Delim::Char('=') => {
                    expressions.push(element.node);
                    let lhs = Node::List(List { pos, expressions });
                    let value = self.resolve_value()?;
                    let value = self.finish_after(value)?;
                    return Ok(Resolved {
                        node: Node::Assignment(Assignment { pos, lhs: Box::new(lhs), rhs: Box::new(value.node) }),
                        delim: value.delim,
                        end: value.end,
                    });
                }
                other => {
                    expressions.push(element.node);
                    return Ok(Resolved { node: Node::List(List { pos, expressions }), delim: other, end: element.end });
                }
            }
        }
    }

    fn finish_after(&mut self, resolved: Resolved) -> Result<Resolved, ParseError> {
        if matches!(resolved.delim, Delim::Char(',')) {
            self.read_list(resolved.node)
        } else {
            Ok(resolved)
        }
    }

    /// `caller(...)` - `CallContext` / `ArgumentListContext`. A lone
    /// argument is stored as itself; two or more are wrapped in a `List`.
    ///
    /// Each argument is read through [`Self::resolve_call_argument`] rather
    /// than the plain [`Self::resolve`] used for a top-level right-hand
    /// side: a `name = value` argument's value is a single expression, not
    /// a comma-continued list, because inside a call a comma always
    /// separates arguments - even one that immediately follows a named
    /// argument's value (`f(a = 1, 2, b = 3)` is three arguments, not one).
    /// This is the original's named-argument flattening
    /// (`NamedArgumentRightHandSideContext` + `ArgumentListContext.append`
    /// spliced back into the enclosing argument list); here it falls out of
    /// simply not promoting a named argument's value to a list.
    fn finish_call(&mut self, callee: Node) -> Result<Node, ParseError> {
        let pos = callee.pos();
        let head = self.read_head(true)?;
        if head.text.is_empty() && matches!(head.delimiter, Delim::Char(')')) {
            return Ok(Node::Call(Call { pos, called: Box::new(callee), arguments: None }));
        }
        if matches!(head.delimiter, Delim::Eof) {
            return Err(ParseError::unexpected_eof(&self.file, head.end));
        }

        let first = self.resolve_call_argument(head)?;
        let arguments = match first.delim {
            Delim::Char(')') => first.node,
            Delim::Char(',') => {
                let mut expressions = vec![first.node];
                loop {
                    let element = self.resolve_call_arg_value()?;
                    match element.delim {
                        Delim::Char(',') => expressions.push(element.node),
                        Delim::Char(')') => {
                            expressions.push(element.node);
                            break;
                        }
                        Delim::Eof => return Err(ParseError::unexpected_eof(&self.file, element.end)),
                        other => {
                            return Err(ParseError::unexpected_symbol(&self.file, element.end, delim_text(other)))
                        }
                    }
                }
                Node::List(List { pos, expressions })
            }
            Delim::Eof => return Err(ParseError::unexpected_eof(&self.file, first.end)),
            other => return Err(ParseError::unexpected_symbol(&self.file, first.end, delim_text(other))),
        };
        Ok(Node::Call(Call { pos, called: Box::new(callee), arguments: Some(Box::new(arguments)) }))
    }

    /// Reads one call argument after its opening piece has already been
    /// lexed: `name = value` becomes an `Assignment` whose `value` is a
    /// single expression (see [`Self::finish_call`]); anything else is a
    /// plain [`Self::resolve`].
    fn resolve_call_argument(&mut self, piece: Piece) -> Result<Resolved, ParseError> {
        match piece.delimiter {
            Delim::Char('=') => {
                let lhs = token::classify(&self.file, piece.start, &piece.text)?;
                let pos = lhs.pos();
                let rhs_piece = self.read_head(true)?;
                let rhs = self.resolve_named_arg_value(rhs_piece)?;
                Ok(Resolved {
                    node: Node::Assignment(Assignment { pos, lhs: Box::new(lhs), rhs: Box::new(rhs.node) }),
                    delim: rhs.delim,
                    end: rhs.end,
                })
            }
            _ => self.resolve(piece),
        }
    }

    fn resolve_call_arg_value(&mut self) -> Result<Resolved, ParseError> {
        let piece = self.read_head(true)?;
        self.resolve_call_argument(piece)
    }

    /// A named argument's right-hand side: like [`Self::resolve`], but a
    /// second `=` here is a structure error (`a = b = c` inside a call)
    /// rather than a further nested assignment - `RightHandSideContext`'s
    /// own `=` case is `wrong_delimiter`, not `create_assignment`.
    fn resolve_named_arg_value(&mut self, piece: Piece) -> Result<Resolved, ParseError> {
        match piece.delimiter {
            Delim::Char('=') => Err(ParseError::unexpected_symbol(&self.file, piece.end, "=".to_string())),
            _ => self.resolve(piece),
        }
    }

    fn expect_statement_end(&self, delim: Delim, end: Position) -> Result<(), ParseError> {
        match delim {
            Delim::Char('\n') | Delim::Eof => Ok(()),
            other => Err(ParseError::unexpected_symbol(&self.file, end, delim_text(other))),
        }
    }
}

/// Flow-operator keyword nodes are positioned one column before the word
/// itself - the `#` that introduced it (`ExpectedFlowOperatorContext` uses
/// `parser.symbol_start - 1` uniformly).
fn keyword_pos(word_start: Position) -> Position {
    Position::new(word_start.line, word_start.symbol.saturating_sub(1))
}

fn expect_block_kind(file: &str, got: BlockKind, want: BlockKind, pos: Position) -> Result<(), ParseError> {
    if got == want {
        Ok(())
    } else {
        Err(ParseError::unexpected_symbol(file, pos, format!("#end{}", block_word(got))))
    }
}

fn block_word(kind: BlockKind) -> &'static str {
    match kind {
        BlockKind::Def => "def",
        BlockKind::Init => "init",
        BlockKind::Prog => "prog",
        BlockKind::Link => "link",
        BlockKind::If => "if",
        BlockKind::Loop => "loop",
        BlockKind::Func => "func",
        BlockKind::Enum => "enum",
        BlockKind::RawFunc => "rawfunc",
        BlockKind::MLog => "mlog",
    }
}

fn delim_text(delim: Delim) -> String {
    match delim {
        Delim::Char(c) => c.to_string(),
        Delim::Eof | Delim::None => String::new(),
    }
}

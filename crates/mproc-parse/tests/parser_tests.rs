//! End-to-end parser scenarios, ported from the original implementation's
//! `tests/parser.py` (one function per source file there; one test per
//! function here, matching on the produced tree the same way the Python
//! suite pattern-matches on dataclasses).

use mproc_parse::*;

fn parse(src: &str) -> Node {
    parse_str("t.mproc", src).unwrap()
}

fn body(node: &Node) -> &[Node] {
    match node {
        Node::Root(r) => &r.body,
        other => panic!("expected Root, got {other:?}"),
    }
}

fn token(n: &Node, name: &str) {
    match n {
        Node::Token(t) => assert_eq!(t.name, name),
        other => panic!("expected Token({name:?}), got {other:?}"),
    }
}

fn int(n: &Node, value: i64) {
    match n {
        Node::NumericLiteral(lit) => assert_eq!(lit.value, Number::Int(value)),
        other => panic!("expected NumericLiteral({value}), got {other:?}"),
    }
}

// test1: an empty file parses to an empty Root.
#[test]
fn empty_file() {
    let node = parse("");
    assert_eq!(body(&node), &[]);
}

// test2: bare assignments, tuple assignment, and a call at top level.
#[test]
fn simple_assignments_and_call() {
    let node = parse("a = 2, 3\nb, c = d, f(\"123\")\nf(48, 97)\n");
    let b = body(&node);
    assert_eq!(b.len(), 3);

    match &b[0] {
        Node::Assignment(a) => {
            token(&a.lhs, "a");
            match &*a.rhs {
                Node::List(l) => {
                    assert_eq!(l.expressions.len(), 2);
                    int(&l.expressions[0], 2);
                    int(&l.expressions[1], 3);
                }
                other => panic!("expected list rhs, got {other:?}"),
            }
        }
        other => panic!("expected assignment, got {other:?}"),
    }

    match &b[1] {
        Node::Assignment(a) => {
            match &*a.lhs {
                Node::List(l) => {
                    assert_eq!(l.expressions.len(), 2);
                    token(&l.expressions[0], "b");
                    token(&l.expressions[1], "c");
                }
                other => panic!("expected list lhs, got {other:?}"),
            }
            match &*a.rhs {
                Node::List(l) => {
                    assert_eq!(l.expressions.len(), 2);
                    token(&l.expressions[0], "d");
                    match &l.expressions[1] {
                        Node::Call(c) => {
                            token(&c.called, "f");
                            match c.arguments.as_deref() {
                                Some(Node::StringLiteral(s)) => assert_eq!(s.value, "123"),
                                other => panic!("expected string arg, got {other:?}"),
                            }
                        }
                        other => panic!("expected call, got {other:?}"),
                    }
                }
                other => panic!("expected list rhs, got {other:?}"),
            }
        }
        other => panic!("expected assignment, got {other:?}"),
    }

    match &b[2] {
        Node::Call(c) => {
            token(&c.called, "f");
            match c.arguments.as_deref() {
                Some(Node::List(l)) => {
                    int(&l.expressions[0], 48);
                    int(&l.expressions[1], 97);
                }
                other => panic!("expected list args, got {other:?}"),
            }
        }
        other => panic!("expected call, got {other:?}"),
    }
}

// test3: Init/Def/Prog blocks. The Python suite also expects a `Final`
// wrapper node around the last Init statement; per spec.md §9 Open
// Question 3 that variant does not exist in this tree, so the assertion
// below is the unwrapped Assignment the grammar as specified produces.
#[test]
fn blocks_init_def_prog() {
    let node = parse(
        "#init\na = 3\nb = 4\nc = 4\n#endinit\n\
         #def\nmessage1\n#enddef\n\
         #prog\nprint(a)\nprint(b)\nprint(c)\nprintflush(message1)\n#endprog\n",
    );
    let b = body(&node);
    assert_eq!(b.len(), 3);

    match &b[0] {
        Node::Init(blk) => {
            assert_eq!(blk.body.len(), 3);
            match &blk.body[2] {
                Node::Assignment(a) => {
                    token(&a.lhs, "c");
                    int(&a.rhs, 4);
                }
                other => panic!("expected assignment, got {other:?}"),
            }
        }
        other => panic!("expected init, got {other:?}"),
    }

    match &b[1] {
        Node::Def(blk) => {
            assert_eq!(blk.body.len(), 1);
            token(&blk.body[0], "message1");
        }
        other => panic!("expected def, got {other:?}"),
    }

    match &b[2] {
        Node::Prog(blk) => assert_eq!(blk.body.len(), 4),
        other => panic!("expected prog, got {other:?}"),
    }
}

// test4: #func with an arrow return and #func without one.
#[test]
fn functions() {
    let node = parse(
        "#func func(a, b)\n#return add(a, b), pow(b, a)\n#endfunc\n\
         #func proc(a, e)\n\
         global_result = add(sub(a, pow(e, e)), flip(a))\n\
         #return true\n\
         #endfunc\n",
    );
    let b = body(&node);
    assert_eq!(b.len(), 2);

    match &b[0] {
        Node::Func(f) => {
            match &*f.definition {
                Node::Call(c) => {
                    token(&c.called, "func");
                    match c.arguments.as_deref() {
                        Some(Node::List(l)) => assert_eq!(l.expressions.len(), 2),
                        other => panic!("expected args list, got {other:?}"),
                    }
                }
                other => panic!("expected bare call definition, got {other:?}"),
            }
            assert_eq!(f.body.len(), 1);
            match &f.body[0] {
                Node::Return(r) => match r.expression.as_deref() {
                    Some(Node::List(l)) => assert_eq!(l.expressions.len(), 2),
                    other => panic!("expected list return, got {other:?}"),
                },
                other => panic!("expected return, got {other:?}"),
            }
        }
        other => panic!("expected func, got {other:?}"),
    }

    match &b[1] {
        Node::Func(f) => {
            assert_eq!(f.body.len(), 2);
            assert!(matches!(f.body[0], Node::Assignment(_)));
            match &f.body[1] {
                Node::Return(r) => match r.expression.as_deref() {
                    Some(Node::Token(t)) => assert_eq!(t.name, "true"),
                    other => panic!("expected bare token return, got {other:?}"),
                },
                other => panic!("expected return, got {other:?}"),
            }
        }
        other => panic!("expected func, got {other:?}"),
    }
}

// test5: #mlog and #rawfunc raw-body blocks.
#[test]
fn raw_blocks() {
    let node = parse(
        "#mlog\n\
         set result 2\n\
         sensor result block1 @copper  \n\
         jump -1 always 0 0\n\
         #endmlog\n\
         #rawfunc raw_func(inp1, inp2) -> out1, out2, out3\n\
         op add {out1} {inp1} {inp2}\n\
         op sub {out2} {inp2} {inp1}\n\
         op mul {out3} {inp1} {inp1}\n\
         set @counter 48\n\
         #endrawfunc\n",
    );
    let b = body(&node);
    assert_eq!(b.len(), 2);

    match &b[0] {
        Node::MLog(m) => assert_eq!(
            m.body,
            "set result 2\nsensor result block1 @copper  \njump -1 always 0 0\n"
        ),
        other => panic!("expected mlog, got {other:?}"),
    }

    match &b[1] {
        Node::RawFunc(r) => {
            match &*r.definition {
                Node::FunctionDefinition(fd) => {
                    match &*fd.call {
                        Node::Call(c) => token(&c.called, "raw_func"),
                        other => panic!("expected call, got {other:?}"),
                    }
                    match &*fd.returns {
                        Node::List(l) => assert_eq!(l.expressions.len(), 3),
                        other => panic!("expected returns list, got {other:?}"),
                    }
                }
                other => panic!("expected function definition, got {other:?}"),
            }
            assert_eq!(
                r.body,
                "op add {out1} {inp1} {inp2}\nop sub {out2} {inp2} {inp1}\n\
                 op mul {out3} {inp1} {inp1}\nset @counter 48\n"
            );
        }
        other => panic!("expected rawfunc, got {other:?}"),
    }
}

// test6: nested if/else and loop/after inside a Prog block.
#[test]
fn nested_conditions() {
    let node = parse(
        "#prog\n\
         #if lessThan(a, 3)\n\
         #if lessThan(a, 2)\n\
         print(\"small\")\n\
         #else\n\
         print(\"medium\")\n\
         #endif\n\
         #else\n\
         print(\"large\")\n\
         #loop greaterThanEq(a, 3)\n\
         print(\"making smaller\")\n\
         #after\n\
         a = sub(a, 1)\n\
         #endloop\n\
         #endif\n\
         print(a)\n\
         #endprog\n",
    );
    let b = body(&node);
    match &b[0] {
        Node::Prog(prog) => {
            assert_eq!(prog.body.len(), 2);
            match &prog.body[0] {
                Node::If(outer) => {
                    assert_eq!(outer.body.len(), 1);
                    assert_eq!(outer.body2.len(), 2);
                    assert!(matches!(outer.body[0], Node::If(_)));
                    assert!(matches!(outer.body2[1], Node::Loop(_)));
                }
                other => panic!("expected outer if, got {other:?}"),
            }
            match &prog.body[1] {
                Node::Call(c) => token(&c.called, "print"),
                other => panic!("expected trailing print, got {other:?}"),
            }
        }
        other => panic!("expected prog, got {other:?}"),
    }
}

#[test]
fn mismatched_end_word_reports_it() {
    let err = parse_str("t.mproc", "#init\na = 1\n#endfunc\n").unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("unexpected symbol"));
    assert!(msg.contains("#endfunc"));
}

#[test]
fn truncated_block_is_unexpected_eof() {
    let err = parse_str("t.mproc", "#init\na = 1\n").unwrap_err();
    assert!(err.to_string().contains("unexpected end of file"));
}

#[test]
fn truncated_string_literal_is_unexpected_eof() {
    let err = parse_str("t.mproc", "a = \"unterminated\n").unwrap_err();
    assert!(err.to_string().contains("unexpected end of file"));
}

#[test]
fn truncated_call_is_unexpected_eof() {
    let err = parse_str("t.mproc", "f(1, 2").unwrap_err();
    assert!(err.to_string().contains("unexpected end of file"));
}

#[test]
fn after_switch_inside_if_is_rejected_by_word() {
    let err = parse_str("t.mproc", "#if lessThan(a, 1)\na = 1\n#after\na = 2\n#endif\n").unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("unexpected symbol"));
    assert!(msg.contains("#after"));
}

#[test]
fn else_switch_inside_loop_is_rejected_by_word() {
    let err = parse_str("t.mproc", "#loop lessThan(a, 1)\na = 1\n#else\na = 2\n#endloop\n").unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("unexpected symbol"));
    assert!(msg.contains("#else"));
}

#[test]
fn bare_word_before_hash_is_unexpected_flow_operator_not_unexpected_symbol() {
    let err = parse_str("t.mproc", "foo #bar\n").unwrap_err();
    assert_eq!(err.to_string(), "SyntaxError in t.mproc:1:5: unexpected flow operator");
    assert!(!err.to_string().contains("unexpected symbol"));
}

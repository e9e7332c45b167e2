use dys_ir::{AsyncKind, ExprKind, NodeKind, StmtKind};
use pretty_assertions::assert_eq;

use super::{parse_err, parse_ok};

#[test]
fn empty_program() {
    assert!(parse_ok("").program.body.is_empty());
    assert!(parse_ok("\n\n# nothing\n").program.body.is_empty());
}

#[test]
fn semicolons_split_simple_statements() {
    let p = parse_ok("a = 1; b = 2; pass\n");
    let kinds: Vec<_> = p
        .program
        .body
        .iter()
        .map(|&s| p.program.arena.stmt(s).kind.node_kind())
        .collect();
    assert_eq!(kinds, vec![NodeKind::Assign, NodeKind::Assign, NodeKind::Pass]);
}

#[test]
fn chained_assignment_keeps_all_targets() {
    let p = parse_ok("a = b = 3");
    let StmtKind::Assign { targets, value } = &p.stmt(0).kind else {
        panic!("expected assignment");
    };
    assert_eq!(targets.len(), 2);
    assert_eq!(p.text(&p.expr(targets[0]).kind), "a");
    assert_eq!(p.text(&p.expr(targets[1]).kind), "b");
    assert!(matches!(p.expr(*value).kind, ExprKind::Constant(_)));
}

#[test]
fn tuple_unpacking_with_star() {
    let p = parse_ok("a, *b = [1, 2, 3]");
    let StmtKind::Assign { targets, .. } = &p.stmt(0).kind else {
        panic!("expected assignment");
    };
    let ExprKind::Tuple(elts) = &p.expr(targets[0]).kind else {
        panic!("expected tuple target");
    };
    assert!(matches!(p.expr(elts[1]).kind, ExprKind::Starred(_)));
}

#[test]
fn invalid_targets_are_rejected() {
    assert_eq!(parse_err("f() = 1").message, "cannot assign to function call");
    assert_eq!(parse_err("1 = x").message, "cannot assign to literal");
    assert_eq!(
        parse_err("a, *b, *c = x").message,
        "multiple starred expressions in assignment"
    );
    assert_eq!(
        parse_err("(a, b) += 1").message,
        "illegal expression for augmented assignment"
    );
    assert_eq!(parse_err("del f()").message, "cannot delete function call");
}

#[test]
fn augmented_and_annotated_assignment() {
    let p = parse_ok("x += 1\ny: int = 2\nz: str\n");
    assert!(matches!(p.stmt(0).kind, StmtKind::AugAssign { .. }));
    assert!(matches!(
        p.stmt(1).kind,
        StmtKind::AnnAssign { value: Some(_), .. }
    ));
    assert!(matches!(p.stmt(2).kind, StmtKind::AnnAssign { value: None, .. }));
}

#[test]
fn if_elif_else_nests_in_orelse() {
    let p = parse_ok("if a:\n    x\nelif b:\n    y\nelse:\n    z\n");
    let StmtKind::If { orelse, .. } = &p.stmt(0).kind else {
        panic!("expected if");
    };
    assert_eq!(orelse.len(), 1);
    let StmtKind::If { orelse: inner, .. } = &p.program.arena.stmt(orelse[0]).kind else {
        panic!("expected nested if");
    };
    assert_eq!(inner.len(), 1);
}

#[test]
fn loops_with_else() {
    let p = parse_ok("for i, j in pairs:\n    pass\nelse:\n    done()\nwhile x:\n    break\n");
    let StmtKind::For { target, orelse, .. } = &p.stmt(0).kind else {
        panic!("expected for");
    };
    assert!(matches!(p.expr(*target).kind, ExprKind::Tuple(_)));
    assert_eq!(orelse.len(), 1);
    assert!(matches!(p.stmt(1).kind, StmtKind::While { .. }));
}

#[test]
fn try_statement_forms() {
    let src = "try:\n    a\nexcept (KeyError, ValueError) as e:\n    b\nexcept:\n    c\nelse:\n    d\nfinally:\n    e\n";
    let p = parse_ok(src);
    let StmtKind::Try {
        handlers,
        orelse,
        finalbody,
        ..
    } = &p.stmt(0).kind
    else {
        panic!("expected try");
    };
    assert_eq!(handlers.len(), 2);
    assert_eq!(handlers[0].name, Some(p.name("e")));
    assert!(handlers[1].ty.is_none());
    assert_eq!((orelse.len(), finalbody.len()), (1, 1));
}

#[test]
fn try_requires_a_handler_or_finally() {
    assert_eq!(
        parse_err("try:\n    a\nx = 1\n").message,
        "expected 'except' or 'finally' block"
    );
    assert_eq!(
        parse_err("try:\n    a\nexcept:\n    b\nexcept ValueError:\n    c\n").message,
        "default 'except:' must be last"
    );
}

#[test]
fn def_with_full_parameter_list() {
    let p = parse_ok("@deco\ndef f(a, /, b: int = 1, *args, c, d=2, **kw) -> int:\n    return a\n");
    let StmtKind::FunctionDef(def) = &p.stmt(0).kind else {
        panic!("expected def");
    };
    assert_eq!(def.decorators.len(), 1);
    assert_eq!(def.params.posonly.len(), 1);
    assert_eq!(def.params.args.len(), 1);
    assert!(def.params.args[0].annotation.is_some());
    assert!(def.params.vararg.is_some());
    assert_eq!(def.params.kwonly.len(), 2);
    assert!(def.params.kwarg.is_some());
    assert!(def.returns.is_some());
    // Decorated definitions start at the decorator.
    assert_eq!(p.stmt(0).span.start, 0);
}

#[test]
fn parameter_errors() {
    assert_eq!(
        parse_err("def f(a=1, b):\n    pass\n").message,
        "non-default argument follows default argument"
    );
    assert_eq!(
        parse_err("def f(a, a):\n    pass\n").message,
        "duplicate argument 'a' in function definition"
    );
    assert_eq!(
        parse_err("def f(*):\n    pass\n").message,
        "named arguments must follow bare *"
    );
}

#[test]
fn class_with_bases_and_keywords() {
    let p = parse_ok("class A(B, metaclass=M):\n    '''doc'''\n    x = 1\n");
    let StmtKind::ClassDef(def) = &p.stmt(0).kind else {
        panic!("expected class");
    };
    assert_eq!(def.bases.len(), 1);
    assert_eq!(def.keywords.len(), 1);
    assert_eq!(def.body.len(), 2);
}

#[test]
fn imports() {
    let p = parse_ok("import a.b as c, d\nfrom m import (x as y, z,)\nfrom n import *\n");
    let StmtKind::Import(names) = &p.stmt(0).kind else {
        panic!("expected import");
    };
    assert_eq!(names[0].name, p.name("a.b"));
    assert_eq!(names[0].asname, Some(p.name("c")));
    let StmtKind::ImportFrom { module, names } = &p.stmt(1).kind else {
        panic!("expected from-import");
    };
    assert_eq!(*module, p.name("m"));
    assert_eq!(names.len(), 2);
    let StmtKind::ImportFrom { names, .. } = &p.stmt(2).kind else {
        panic!("expected from-import");
    };
    assert_eq!(names[0].name, p.name("*"));
    assert_eq!(
        parse_err("from . import x").message,
        "relative imports are not supported"
    );
}

#[test]
fn unsupported_statements_still_parse() {
    let p = parse_ok(
        "global a\nnonlocal b\nwith open(f) as g:\n    pass\nasync def h():\n    await x\n",
    );
    assert!(matches!(p.stmt(0).kind, StmtKind::Global(_)));
    assert!(matches!(p.stmt(1).kind, StmtKind::Nonlocal(_)));
    assert!(matches!(p.stmt(2).kind, StmtKind::With { .. }));
    assert!(matches!(
        p.stmt(3).kind,
        StmtKind::Async {
            kind: AsyncKind::FunctionDef,
            ..
        }
    ));
}

#[test]
fn one_line_blocks() {
    let p = parse_ok("if x: y = 1; z = 2\n");
    let StmtKind::If { body, .. } = &p.stmt(0).kind else {
        panic!("expected if");
    };
    assert_eq!(body.len(), 2);
}

#[test]
fn layout_errors() {
    assert_eq!(parse_err("x = 1\n    y = 2\n").message, "unexpected indent");
    assert_eq!(parse_err("if x:\ny = 2\n").message, "expected an indented block");
}

#[test]
fn statement_spans_end_at_last_token() {
    let src = "def f():\n    return 1\n\nx = 2\n";
    let p = parse_ok(src);
    let range = p.program.locate(p.stmt(0).span);
    assert_eq!(
        (range.lineno, range.col_offset, range.end_lineno, range.end_col_offset),
        (1, 0, 2, 12)
    );
    let range = p.program.locate(p.stmt(1).span);
    assert_eq!((range.lineno, range.end_col_offset), (4, 5));
}

#[test]
fn deep_nesting_is_a_syntax_error() {
    let src = format!("x = {}1{}", "(".repeat(500), ")".repeat(500));
    assert!(parse_err(&src).message.starts_with("too many nested"));
}

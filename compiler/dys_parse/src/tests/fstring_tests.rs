use dys_ir::{Constant, Conversion, ExprKind};
use pretty_assertions::assert_eq;

use super::{parse_err, parse_ok, Parsed};

fn literal(p: &Parsed, id: dys_ir::ExprId) -> String {
    match &p.expr(id).kind {
        ExprKind::Constant(Constant::Str(s)) => s.to_string(),
        other => panic!("expected string constant, got {other:?}"),
    }
}

#[test]
fn adjacent_literals_concatenate() {
    let p = parse_ok("'a' \"b\" '''c'''");
    let ExprKind::Constant(Constant::Str(s)) = &p.only_expr().kind else {
        panic!("expected string");
    };
    assert_eq!(&**s, "abc");
}

#[test]
fn escapes_are_cooked_and_raw_strings_are_not() {
    let p = parse_ok(r#"'a\tb' r'\t'"#);
    let ExprKind::Constant(Constant::Str(s)) = &p.only_expr().kind else {
        panic!("expected string");
    };
    assert_eq!(&**s, "a\tb\\t");
}

#[test]
fn bytes_literals() {
    let p = parse_ok(r"b'\x00ab' b'c'");
    let ExprKind::Constant(Constant::Bytes(b)) = &p.only_expr().kind else {
        panic!("expected bytes");
    };
    assert_eq!(&**b, &[0, b'a', b'b', b'c']);
    assert_eq!(
        parse_err("b'a' 'b'").message,
        "cannot mix bytes and nonbytes literals"
    );
}

#[test]
fn fstring_parts() {
    let p = parse_ok("f'x={x!r:>{width}} {{ok}}' 'tail'");
    let ExprKind::JoinedStr(parts) = &p.only_expr().kind else {
        panic!("expected joined string");
    };
    assert_eq!(parts.len(), 3);
    assert_eq!(literal(&p, parts[0]), "x=");
    let ExprKind::FormattedValue {
        value,
        conversion,
        format_spec,
    } = &p.expr(parts[1]).kind
    else {
        panic!("expected formatted value");
    };
    assert_eq!(p.text(&p.expr(*value).kind), "x");
    assert_eq!(*conversion, Some(Conversion::Repr));
    let spec = format_spec.expect("format spec");
    let ExprKind::JoinedStr(spec_parts) = &p.expr(spec).kind else {
        panic!("expected spec");
    };
    assert_eq!(literal(&p, spec_parts[0]), ">");
    assert!(matches!(
        p.expr(spec_parts[1]).kind,
        ExprKind::FormattedValue { .. }
    ));
    assert_eq!(literal(&p, parts[2]), " {ok}tail");
}

#[test]
fn field_expression_spans_point_into_source() {
    let src = "f'ab{foo + 1}'";
    let p = parse_ok(src);
    let ExprKind::JoinedStr(parts) = &p.only_expr().kind else {
        panic!("expected joined string");
    };
    let ExprKind::FormattedValue { value, .. } = &p.expr(parts[1]).kind else {
        panic!("expected formatted value");
    };
    let span = p.expr(*value).span;
    assert_eq!(&src[span.to_range()], "foo + 1");
}

#[test]
fn nested_quotes_and_brackets_in_fields() {
    let p = parse_ok("f\"{d['k']}{ {'a': 1}['a'] }\"");
    let ExprKind::JoinedStr(parts) = &p.only_expr().kind else {
        panic!("expected joined string");
    };
    assert_eq!(parts.len(), 2);
}

#[test]
fn self_documenting_field() {
    let p = parse_ok("f'{x=}'");
    let ExprKind::JoinedStr(parts) = &p.only_expr().kind else {
        panic!("expected joined string");
    };
    assert_eq!(literal(&p, parts[0]), "x=");
    assert!(matches!(
        p.expr(parts[1]).kind,
        ExprKind::FormattedValue {
            conversion: Some(Conversion::Repr),
            ..
        }
    ));
    // `==` inside a field is a comparison, not the debug form.
    let p = parse_ok("f'{a==b}'");
    let ExprKind::JoinedStr(parts) = &p.only_expr().kind else {
        panic!("expected joined string");
    };
    assert_eq!(parts.len(), 1);
}

#[test]
fn fstring_errors() {
    assert_eq!(
        parse_err("f'{}'").message,
        "f-string: empty expression not allowed"
    );
    assert_eq!(
        parse_err("f'a}'").message,
        "f-string: single '}' is not allowed"
    );
    assert_eq!(parse_err("f'{a'").message, "f-string: expecting '}'");
    assert_eq!(
        parse_err("f'{a!x}'").message,
        "f-string: invalid conversion character: expected 's', 'r', or 'a'"
    );
    assert_eq!(
        parse_err(r"f'{a\n}'").message,
        "f-string expression part cannot include a backslash"
    );
    assert_eq!(
        parse_err("f'{a:{b:{c}}}'").message,
        "f-string: expressions nested too deeply"
    );
}

#[test]
fn empty_fstring_is_an_empty_join() {
    let p = parse_ok("f''");
    assert!(matches!(p.only_expr().kind, ExprKind::JoinedStr(ref v) if v.is_empty()));
}

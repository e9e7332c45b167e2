#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "test assertions use unwrap/expect for clarity"
)]

use pretty_assertions::assert_eq;

use super::*;

fn range(lineno: u32, col: u32) -> SourceRange {
    SourceRange {
        lineno,
        col_offset: col,
        end_lineno: lineno,
        end_col_offset: col + 1,
    }
}

#[test]
fn exception_message_and_repr() {
    let err = value_error("bad value");
    assert_eq!(err.class_name().as_ref(), "ValueError");
    assert_eq!(err.message(), "bad value");
    assert_eq!(err.repr(), "ValueError('bad value')");
    assert!(err.is_catchable());
}

#[test]
fn key_error_quotes_its_key() {
    let err = key_error(Value::str("missing"));
    assert_eq!(err.message(), "'missing'");
    assert_eq!(err.to_string(), "KeyError: 'missing'");
}

#[test]
fn assertion_without_message_displays_the_class() {
    let err = assertion_error(None);
    assert_eq!(err.message(), "");
    assert_eq!(err.to_string(), "AssertionError");
}

#[test]
fn located_keeps_the_innermost_position() {
    let err = division_by_zero()
        .located(|| range(3, 4))
        .located(|| range(1, 0));
    assert_eq!(err.span, Some(range(3, 4)));
    assert_eq!(
        err.to_string(),
        "ZeroDivisionError: division by zero (line 3, column 4)"
    );
}

#[test]
fn notes_follow_the_message() {
    let err = type_error("nope").with_note("while calling f");
    assert_eq!(err.to_string(), "TypeError: nope\n  note: while calling f");
}

mod uncatchable {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn capability_errors() {
        let err = dangerous("This function is forbidden: builtins.eval");
        assert_eq!(err.class_name().as_ref(), "DangerousValue");
        assert!(!err.is_catchable());
        assert!(err.exception().is_none());
        assert_eq!(
            err.repr(),
            "DangerousValue('This function is forbidden: builtins.eval')"
        );
    }

    #[test]
    fn resource_errors_report_as_memory_errors() {
        let err = resource(ResourceKind::NodeCalls, "This program has too many evaluations");
        assert_eq!(err.class_name().as_ref(), "MemoryError");
        assert_eq!(err.resource_kind(), Some(ResourceKind::NodeCalls));
        assert!(!err.is_catchable());
    }

    #[test]
    fn call_depth_reports_as_recursion_error() {
        let err = resource(ResourceKind::CallDepth, "Sorry, stack is to large");
        assert_eq!(err.class_name().as_ref(), "RecursionError");
    }

    #[test]
    fn out_of_gas() {
        let err = super::out_of_gas();
        assert_eq!(err.resource_kind(), Some(ResourceKind::OutOfGas));
        assert_eq!(err.message(), "Out of Gas");
    }

    #[test]
    fn raised_memory_error_is_not_catchable() {
        let err = exception(ExcType::MemoryError, "too big");
        assert!(!err.is_catchable());
    }
}

mod signals {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn stray_signals_become_syntax_errors() {
        assert_eq!(
            ControlAction::Break.into_error().message(),
            "'break' outside loop"
        );
        assert_eq!(
            ControlAction::Return(Value::None).into_error().class_name().as_ref(),
            "SyntaxError"
        );
    }

    #[test]
    fn raise_unwraps_the_error() {
        let signal = ControlAction::from(index_error("list index out of range"));
        assert_eq!(signal.into_error().class_name().as_ref(), "IndexError");
    }
}

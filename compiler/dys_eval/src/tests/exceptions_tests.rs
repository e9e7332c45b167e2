//! `try`, `raise` and exception objects.


use super::{error, eval_err, output, repr};

mod handlers {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn handler_binds_the_exception() {
        let source = "\
try:
    {}['missing']
except KeyError as e:
    msg = str(e)
msg
";
        assert_eq!(repr(source), "\"'missing'\"");
    }

    #[test]
    fn parent_classes_match() {
        let source = "\
try:
    [][1]
except LookupError:
    caught = 'lookup'
caught
";
        assert_eq!(repr(source), "'lookup'");
    }

    #[test]
    fn tuples_of_classes_match() {
        assert_eq!(
            repr("try:\n    1 / 0\nexcept (TypeError, ZeroDivisionError) as e:\n    r = e.args\nr\n"),
            "('division by zero',)"
        );
    }

    #[test]
    fn first_matching_handler_wins() {
        let source = "\
try:
    int('x')
except TypeError:
    print('type')
except ValueError:
    print('value')
except Exception:
    print('any')
";
        assert_eq!(output(source), "value\n");
    }

    #[test]
    fn unmatched_errors_propagate() {
        assert_eq!(
            error("try:\n    1 / 0\nexcept KeyError:\n    pass\n"),
            "ZeroDivisionError: division by zero"
        );
    }

    #[test]
    fn handler_name_is_unbound_afterwards() {
        assert_eq!(
            error("try:\n    1 / 0\nexcept Exception as e:\n    pass\ne\n"),
            "NameError: name 'e' is not defined"
        );
    }

    #[test]
    fn catching_a_non_exception_class() {
        assert_eq!(
            error("try:\n    1 / 0\nexcept int:\n    pass\n"),
            "TypeError: catching classes that do not inherit from BaseException is not allowed"
        );
    }
}

mod flow {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn else_runs_only_without_an_error() {
        let source = "\
for value in ['1', 'x']:
    try:
        int(value)
    except ValueError:
        print('bad', value)
    else:
        print('ok', value)
    finally:
        print('checked', value)
";
        assert_eq!(output(source), "ok 1\nchecked 1\nbad x\nchecked x\n");
    }

    #[test]
    fn finally_is_skipped_when_a_resource_limit_unwinds() {
        use std::rc::Rc;

        use crate::accounting::{Accountant, ResourceLimits, SharedState};
        use crate::interpreter::InterpreterBuilder;
        use crate::print_handler::buffer_handler;

        let limits = ResourceLimits::default().with_max_node_calls(200);
        let state = SharedState::default();
        let mut interp = InterpreterBuilder::new()
            .limits(limits)
            .tracker(Accountant::new(limits, Rc::clone(&state)))
            .print_handler(buffer_handler(1_000))
            .build();
        let source = "\
try:
    while True:
        pass
except Exception:
    print('caught')
finally:
    print('cleanup')
";
        let err = interp.run_source(source).unwrap_err();
        assert_eq!(err.class_name().as_ref(), "MemoryError");
        assert!(!err.is_catchable());
        assert_eq!(interp.print_handler().get_output(), "");
    }

    #[test]
    fn finally_runs_on_return() {
        let source = "\
def f():
    try:
        return 'body'
    finally:
        print('cleanup')
f()
";
        assert_eq!(output(source), "cleanup\n");
        assert_eq!(repr(source), "'body'");
    }

    #[test]
    fn return_in_finally_replaces_the_error() {
        let source = "\
def f():
    try:
        1 / 0
    finally:
        return 'swallowed'
f()
";
        assert_eq!(repr(source), "'swallowed'");
    }

    #[test]
    fn break_inside_try() {
        let source = "\
for i in range(5):
    try:
        if i == 2:
            break
    finally:
        print(i)
";
        assert_eq!(output(source), "0\n1\n2\n");
    }
}

mod raising {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn raise_a_class_or_an_instance() {
        assert_eq!(error("raise ValueError"), "ValueError");
        assert_eq!(error("raise ValueError('bad', 2)"), "ValueError: ('bad', 2)");
        assert_eq!(
            error("raise 5"),
            "TypeError: exceptions must derive from BaseException"
        );
    }

    #[test]
    fn bare_raise_reraises_the_active_exception() {
        let source = "\
try:
    try:
        {}['k']
    except KeyError:
        print('inner')
        raise
except KeyError as e:
    print('outer', e)
";
        assert_eq!(output(source), "inner\nouter 'k'\n");
        assert_eq!(error("raise"), "Exception: No active exception to reraise");
    }

    #[test]
    fn raise_from_keeps_the_new_exception() {
        let source = "\
try:
    {}['k']
except KeyError as e:
    raise ValueError('converted') from e
";
        assert_eq!(error(source), "ValueError: converted");
        assert_eq!(
            error("raise ValueError('x') from None"),
            "ValueError: x"
        );
    }

    #[test]
    fn errors_carry_the_failing_line() {
        let err = eval_err("x = 1\ny = [x]\ny[3]\n");
        assert_eq!(err.class_name().as_ref(), "IndexError");
        let range = err.span.expect("position");
        assert_eq!(range.lineno, 3);
    }
}

mod objects {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn exception_values() {
        assert_eq!(repr("ValueError('x')"), "ValueError('x')");
        assert_eq!(repr("KeyError('k').args"), "('k',)");
        assert_eq!(repr("str(KeyError('k'))"), "\"'k'\"");
        assert_eq!(repr("str(Exception())"), "''");
        assert_eq!(repr("isinstance(KeyError(), LookupError)"), "True");
        assert_eq!(repr("issubclass(ZeroDivisionError, ArithmeticError)"), "True");
    }

    #[test]
    fn custom_exception_classes() {
        let source = "\
class InsufficientFunds(ValueError):
    def __init__(self, needed):
        self.needed = needed

try:
    raise InsufficientFunds(5)
except ValueError as e:
    result = (e.needed, str(e), isinstance(e, InsufficientFunds))
result
";
        assert_eq!(repr(source), "(5, '5', True)");
    }

    #[test]
    fn custom_exception_escapes_with_its_class_name() {
        let source = "\
class Rejected(Exception):
    pass

raise Rejected('no')
";
        assert_eq!(error(source), "Rejected: no");
    }

    #[test]
    fn custom_class_handlers_only_match_subclasses() {
        let source = "\
class A(Exception):
    pass

class B(A):
    pass

caught = []
for cls in [A, B]:
    try:
        raise cls()
    except B:
        caught.append('B')
    except A:
        caught.append('A')
caught
";
        assert_eq!(repr(source), "['A', 'B']");
    }
}

//! Function definitions, argument binding and closures.


use super::{error, interpreter, repr};
use crate::native::CallArgs;
use crate::value::Value;

mod binding {
    use super::*;
    use pretty_assertions::assert_eq;

    const SIGNATURE: &str = "\
def f(a, b=2, *rest, c, d=4, **extra):
    return (a, b, rest, c, d, extra)
";

    fn call(args: &str) -> String {
        repr(&format!("{SIGNATURE}f({args})\n"))
    }

    #[test]
    fn every_parameter_kind() {
        assert_eq!(call("1, c=3"), "(1, 2, (), 3, 4, {})");
        assert_eq!(call("1, 5, 6, 7, c=3, z=0"), "(1, 5, (6, 7), 3, 4, {'z': 0})");
        assert_eq!(call("*[1, 2, 3], **{'c': 0, 'd': 1}"), "(1, 2, (3,), 0, 1, {})");
        assert_eq!(call("b=0, a=1, c=2"), "(1, 0, (), 2, 4, {})");
    }

    #[test]
    fn missing_arguments() {
        assert_eq!(
            error(&format!("{SIGNATURE}f(c=1)\n")),
            "TypeError: f() missing 1 required positional argument: 'a'"
        );
        assert_eq!(
            error(&format!("{SIGNATURE}f(1)\n")),
            "TypeError: f() missing 1 required keyword-only argument: 'c'"
        );
        assert_eq!(
            error("def g(x, y, z):\n    pass\ng()\n"),
            "TypeError: g() missing 3 required positional arguments: 'x', 'y', and 'z'"
        );
    }

    #[test]
    fn surplus_arguments() {
        assert_eq!(
            error("def g(x):\n    pass\ng(1, 2)\n"),
            "TypeError: g() takes 1 positional argument but 2 were given"
        );
        assert_eq!(
            error("def g(x, y=1):\n    pass\ng(1, 2, 3)\n"),
            "TypeError: g() takes from 1 to 2 positional arguments but 3 were given"
        );
        assert_eq!(
            error("def g(x):\n    pass\ng(1, y=2)\n"),
            "TypeError: g() got an unexpected keyword argument 'y'"
        );
        assert_eq!(
            error("def g(x):\n    pass\ng(1, x=2)\n"),
            "TypeError: g() got multiple values for argument 'x'"
        );
    }

    #[test]
    fn positional_only_parameters() {
        assert_eq!(repr("def g(a, /, b):\n    return a - b\ng(5, b=2)\n"), "3");
        assert_eq!(
            error("def g(a, /):\n    pass\ng(a=1)\n"),
            "TypeError: g() got some positional-only arguments passed as keyword arguments: 'a'"
        );
    }

    #[test]
    fn defaults_are_evaluated_once() {
        let source = "\
def push(x, into=[]):
    into.append(x)
    return into
push(1)
push(2)
";
        assert_eq!(repr(source), "[1, 2]");
    }

    #[test]
    fn double_star_needs_a_mapping() {
        assert_eq!(
            error("def g(**k):\n    pass\ng(**[1])\n"),
            "TypeError: argument after ** must be a mapping, not list"
        );
    }
}

mod closures {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn functions_see_later_globals() {
        assert_eq!(repr("def f():\n    return LATER\nLATER = 7\nf()\n"), "7");
    }

    #[test]
    fn captured_state_is_shared() {
        let source = "\
def counter():
    count = [0]
    def bump():
        count[0] += 1
        return count[0]
    return bump

c = counter()
c()
c()
";
        assert_eq!(repr(source), "2");
    }

    #[test]
    fn locals_do_not_leak() {
        assert_eq!(
            error("def f():\n    inner = 1\nf()\ninner\n"),
            "NameError: name 'inner' is not defined"
        );
    }

    #[test]
    fn augmented_assignment_needs_a_local() {
        assert_eq!(
            error("n = 0\ndef f():\n    n += 1\nf()\n"),
            "UnboundLocalError: local variable 'n' referenced before assignment"
        );
    }

    #[test]
    fn recursion() {
        assert_eq!(
            repr("def fact(n):\n    return 1 if n < 2 else n * fact(n - 1)\nfact(10)\n"),
            "3628800"
        );
    }

    #[test]
    fn unbounded_recursion_is_a_recursion_error() {
        assert_eq!(
            error("def f():\n    return f()\nf()\n"),
            "RecursionError: Sorry, stack is to large"
        );
    }
}

mod lambdas_and_decorators {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn lambdas() {
        assert_eq!(repr("(lambda x, y=10: x + y)(1)"), "11");
        assert_eq!(repr("sorted(['bb', 'a', 'ccc'], key=lambda s: -len(s))"), "['ccc', 'bb', 'a']");
        assert_eq!(repr("fs = [lambda: i for i in range(3)]\n[f() for f in fs]\n"), "[2, 2, 2]");
    }

    #[test]
    fn decorators_apply_innermost_first() {
        let source = "\
def tag(name):
    def wrap(f):
        return lambda: name + '(' + f() + ')'
    return wrap

@tag('a')
@tag('b')
def body():
    return 'x'

body()
";
        assert_eq!(repr(source), "'a(b(x))'");
    }

    #[test]
    fn functions_are_callable_values() {
        assert_eq!(repr("def f():\n    pass\n(callable(f), callable(1), f())\n"), "(True, False, None)");
        assert_eq!(error("x = 3\nx()\n"), "TypeError: Sorry, int type is not callable");
    }
}

mod host_calls {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn hosts_call_script_functions_by_name() {
        let mut interp = interpreter();
        interp
            .run_source("def add(a, b=1):\n    return a + b\n")
            .unwrap();
        let result = interp
            .call("add", CallArgs::new(vec![Value::Int(41)]))
            .unwrap();
        assert_eq!(result.repr(), "42");
        assert_eq!(
            interp.call("nope", CallArgs::default()).unwrap_err().message(),
            "name 'nope' is not defined"
        );
    }

    #[test]
    fn globals_are_listed_in_binding_order() {
        let mut interp = interpreter();
        interp.run_source("b = 1\na = 2\ndef f():\n    pass\n").unwrap();
        let names: Vec<String> = interp.global_names().iter().map(ToString::to_string).collect();
        assert_eq!(names, ["b", "a", "f"]);
        assert_eq!(interp.global("a").map(|v| v.repr()), Some("2".to_string()));
    }
}

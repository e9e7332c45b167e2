//! Assignment, loops and the value a program ends with.


use super::{error, output, repr};

mod assignment {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn last_statement_is_the_result() {
        assert_eq!(repr("x = 2\nx * 3\n"), "6");
        assert_eq!(repr("x = 2\n"), "None");
        assert_eq!(repr(""), "None");
    }

    #[test]
    fn chained_targets_share_the_value() {
        assert_eq!(repr("a = b = []\na.append(1)\nb\n"), "[1]");
    }

    #[test]
    fn unpacking() {
        assert_eq!(repr("a, b = 1, 2\na, b = b, a\n(a, b)\n"), "(2, 1)");
        assert_eq!(repr("[a, (b, c)] = [1, 'xy']\n(a, b, c)\n"), "(1, 'x', 'y')");
        assert_eq!(repr("first, *rest = range(4)\n(first, rest)\n"), "(0, [1, 2, 3])");
        assert_eq!(repr("*init, last = 'abc'\n(init, last)\n"), "(['a', 'b'], 'c')");
    }

    #[test]
    fn unpacking_errors() {
        assert_eq!(
            error("a, b = [1]"),
            "ValueError: not enough values to unpack (expected 2, got 1)"
        );
        assert_eq!(error("a, b = 1, 2, 3"), "ValueError: too many values to unpack (expected 2)");
        assert_eq!(error("a, b = 5"), "TypeError: cannot unpack non-iterable int object");
    }

    #[test]
    fn subscript_targets() {
        assert_eq!(repr("d = {}\nd['k'] = 1\nd['k'] += 1\nd\n"), "{'k': 2}");
        assert_eq!(repr("a = [0, 0, 0]\na[1:] = [5]\na\n"), "[0, 5]");
        assert_eq!(repr("a = [1, 2]\na[-1] = 9\na\n"), "[1, 9]");
    }

    #[test]
    fn augmented_list_assignment_mutates_in_place() {
        assert_eq!(repr("a = [1]\nb = a\na += [2]\nb\n"), "[1, 2]");
        assert_eq!(repr("a = (1,)\nb = a\na += (2,)\nb\n"), "(1,)");
    }

    #[test]
    fn delete() {
        assert_eq!(repr("a = [1, 2, 3]\ndel a[0]\na\n"), "[2, 3]");
        assert_eq!(repr("d = {'a': 1, 'b': 2}\ndel d['a']\nd\n"), "{'b': 2}");
        assert_eq!(error("x = 1\ndel x\nx\n"), "NameError: name 'x' is not defined");
    }

    #[test]
    fn annotated_assignment_binds() {
        assert_eq!(repr("x: int = 4\nx\n"), "4");
    }
}

mod loops {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn for_else_runs_without_break() {
        assert_eq!(
            output("for i in range(3):\n    print(i)\nelse:\n    print('done')\n"),
            "0\n1\n2\ndone\n"
        );
        assert_eq!(
            output("for i in range(3):\n    if i == 1:\n        break\nelse:\n    print('done')\nprint(i)\n"),
            "1\n"
        );
    }

    #[test]
    fn while_with_continue() {
        let source = "\
n = 0
total = 0
while n < 6:
    n += 1
    if n % 2:
        continue
    total += n
total
";
        assert_eq!(repr(source), "12");
    }

    #[test]
    fn loop_targets_can_unpack() {
        assert_eq!(
            repr("out = []\nfor k, v in {'a': 1, 'b': 2}.items():\n    out.append(k * v)\nout\n"),
            "['a', 'bb']"
        );
    }

    #[test]
    fn iterating_a_non_iterable() {
        assert_eq!(error("for x in 3:\n    pass\n"), "TypeError: 'int' object is not iterable");
    }
}

mod expressions {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn boolean_operators_return_operands() {
        assert_eq!(repr("0 or 'x'"), "'x'");
        assert_eq!(repr("[] and 1"), "[]");
        assert_eq!(repr("not ''"), "True");
    }

    #[test]
    fn conditional_and_chained_comparison() {
        assert_eq!(repr("'a' if 1 < 2 < 3 else 'b'"), "'a'");
        assert_eq!(repr("1 < 3 > 2 == 2"), "True");
    }

    #[test]
    fn comprehensions_do_not_leak_targets() {
        assert_eq!(repr("[x * x for x in range(4) if x % 2]"), "[1, 9]");
        assert_eq!(repr("{k: len(k) for k in ['a', 'bb']}"), "{'a': 1, 'bb': 2}");
        assert_eq!(repr("{c for c in 'abca'}"), "{'a', 'b', 'c'}");
        assert_eq!(repr("[(x, y) for x in 'ab' for y in range(2)]"),
            "[('a', 0), ('a', 1), ('b', 0), ('b', 1)]");
        assert_eq!(error("[x for x in range(2)]\nx\n"), "NameError: name 'x' is not defined");
    }

    #[test]
    fn generator_expressions_are_lists() {
        assert_eq!(repr("sum(x for x in range(5))"), "10");
        assert_eq!(repr("(x for x in 'ab')"), "['a', 'b']");
    }

    #[test]
    fn slicing() {
        assert_eq!(repr("'abcdef'[1:5:2]"), "'bd'");
        assert_eq!(repr("[1, 2, 3][::-1]"), "[3, 2, 1]");
        assert_eq!(repr("(1, 2, 3)[-2:]"), "(2, 3)");
    }

    #[test]
    fn f_strings() {
        assert_eq!(repr("x = 3\nf'{x} + {x * 2}'\n"), "'3 + 6'");
        assert_eq!(repr("f'{1.5:.2f}|{7:>3}|{\"a\"!r}'"), "\"1.50|  7|'a'\"");
    }

    #[test]
    fn assert_statement() {
        assert_eq!(error("assert 1 == 2, 'nope'"), "AssertionError: nope");
        assert_eq!(error("assert False"), "AssertionError");
    }
}

mod unsupported {
    use super::super::interpreter;
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn rejected_before_anything_runs() {
        let mut interp = interpreter();
        let err = interp.run_source("print('x')\nglobal y\n").unwrap_err();
        assert_eq!(err.class_name().as_ref(), "NotImplementedError");
        assert_eq!(err.message(), "Sorry, Global is not available in this evaluator");
        assert_eq!(interp.print_handler().get_output(), "");
    }

    #[test]
    fn yield_is_rejected() {
        assert_eq!(
            error("def f():\n    yield 1\n"),
            "NotImplementedError: Sorry, Yield is not available in this evaluator"
        );
    }
}

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "test assertions use unwrap/expect for clarity"
)]


use crate::tests::{error, output, repr};

mod numbers {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn abs_and_divmod() {
        assert_eq!(repr("abs(-3)"), "3");
        assert_eq!(repr("abs(-2.5)"), "2.5");
        assert_eq!(repr("divmod(7, -2)"), "(-4, -1)");
        assert_eq!(error("abs('x')"), "TypeError: bad operand type for abs(): 'str'");
    }

    #[test]
    fn radix_conversions() {
        assert_eq!(repr("bin(5)"), "'0b101'");
        assert_eq!(repr("hex(-255)"), "'-0xff'");
        assert_eq!(repr("oct(8)"), "'0o10'");
    }

    #[test]
    fn chr_and_ord() {
        assert_eq!(repr("chr(9731)"), "'☃'");
        assert_eq!(repr("ord('a')"), "97");
        assert_eq!(
            error("ord('ab')"),
            "TypeError: ord() expected a character, but string of length 2 found"
        );
        assert_eq!(error("chr(-1)"), "ValueError: chr() arg not in range(0x110000)");
    }

    #[test]
    fn pow_with_modulus() {
        assert_eq!(repr("pow(2, 10)"), "1024");
        assert_eq!(repr("pow(3, 4, 5)"), "1");
        assert_eq!(repr("pow(2, -1)"), "0.5");
        assert_eq!(error("pow(2, 3, 0)"), "ValueError: pow() 3rd argument cannot be 0");
    }

    #[test]
    fn round_uses_bankers_rounding() {
        assert_eq!(repr("round(2.5)"), "2");
        assert_eq!(repr("round(3.5)"), "4");
        assert_eq!(repr("round(2.675, 2)"), "2.67");
        assert_eq!(repr("round(1234, -2)"), "1200");
        assert_eq!(repr("round(7, 2)"), "7");
    }

    #[test]
    fn sum_rejects_string_starts() {
        assert_eq!(repr("sum([1, 2, 3])"), "6");
        assert_eq!(repr("sum([[1], [2]], [])"), "[1, 2]");
        assert_eq!(
            error("sum(['a'], '')"),
            "TypeError: sum() can't sum strings [use ''.join(seq) instead]"
        );
    }
}

mod iterables {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn lazy_builtins_return_lists() {
        assert_eq!(repr("map(lambda x: x * 2, [1, 2])"), "[2, 4]");
        assert_eq!(repr("filter(None, [0, 1, '', 'a'])"), "[1, 'a']");
        assert_eq!(repr("zip([1, 2, 3], 'ab')"), "[(1, 'a'), (2, 'b')]");
        assert_eq!(repr("enumerate('ab', start=1)"), "[(1, 'a'), (2, 'b')]");
        assert_eq!(repr("reversed(range(3))"), "[2, 1, 0]");
        assert_eq!(repr("iter((1, 2))"), "[1, 2]");
    }

    #[test]
    fn map_over_several_iterables() {
        assert_eq!(repr("map(lambda a, b: a + b, [1, 2, 3], [10, 20])"), "[11, 22]");
        assert_eq!(
            error("map(len)"),
            "TypeError: map() must have at least two arguments."
        );
    }

    #[test]
    fn strict_zip() {
        assert_eq!(
            error("zip([1], [1, 2], strict=True)"),
            "ValueError: zip() arguments have different lengths"
        );
    }

    #[test]
    fn sets_are_not_reversible() {
        assert_eq!(
            error("reversed({1})"),
            "TypeError: 'set' object is not reversible"
        );
    }

    #[test]
    fn all_and_any() {
        assert_eq!(repr("all([])"), "True");
        assert_eq!(repr("all([1, 0])"), "False");
        assert_eq!(repr("any(range(0))"), "False");
        assert_eq!(repr("any(x > 2 for x in [1, 3])"), "True");
    }

    #[test]
    fn len_of_unsized_values() {
        assert_eq!(repr("len({'a': 1})"), "1");
        assert_eq!(error("len(5)"), "TypeError: object of type 'int' has no len()");
    }
}

mod ordering {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn sorted_is_stable_and_keyed() {
        assert_eq!(repr("sorted([3, 1, 2])"), "[1, 2, 3]");
        assert_eq!(
            repr("sorted(['bb', 'a', 'cc'], key=len)"),
            "['a', 'bb', 'cc']"
        );
        assert_eq!(
            repr("sorted([(1, 'b'), (0, 'z'), (1, 'a')], key=lambda p: p[0], reverse=True)"),
            "[(1, 'b'), (1, 'a'), (0, 'z')]"
        );
    }

    #[test]
    fn sorting_mixed_types_fails() {
        assert_eq!(
            error("sorted([1, 'a'])"),
            "TypeError: '<' not supported between instances of 'str' and 'int'"
        );
    }

    #[test]
    fn min_and_max() {
        assert_eq!(repr("max(3, 7, 5)"), "7");
        assert_eq!(repr("min([4, 2, 8])"), "2");
        assert_eq!(repr("max(['a', 'ccc', 'bb'], key=len)"), "'ccc'");
        assert_eq!(repr("min([], default=None)"), "None");
        assert_eq!(error("max([])"), "ValueError: max() iterable argument is empty");
    }

    #[test]
    fn first_extreme_wins_ties() {
        assert_eq!(repr("max([(1, 'a'), (1, 'b')], key=lambda p: p[0])"), "(1, 'a')");
    }
}

mod types {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn isinstance_and_issubclass() {
        assert_eq!(repr("isinstance(True, int)"), "True");
        assert_eq!(repr("isinstance(1, (str, float))"), "False");
        assert_eq!(repr("issubclass(KeyError, LookupError)"), "True");
        assert_eq!(repr("issubclass(bool, int)"), "True");
        assert_eq!(
            error("isinstance(1, 2)"),
            "TypeError: isinstance() arg 2 must be a type or tuple of types"
        );
    }

    #[test]
    fn script_classes() {
        let source = "class A:\n    pass\nclass B(A):\n    pass\n(isinstance(B(), A), issubclass(A, B))\n";
        assert_eq!(repr(source), "(True, False)");
    }

    #[test]
    fn callable() {
        assert_eq!(repr("callable(len)"), "True");
        assert_eq!(repr("callable(3)"), "False");
    }

    #[test]
    fn conversions() {
        assert_eq!(repr("int('0x1f', 16)"), "31");
        assert_eq!(repr("int(' 1_000 ')"), "1000");
        assert_eq!(repr("int(-3.9)"), "-3");
        assert_eq!(repr("float('1e3')"), "1000.0");
        assert_eq!(repr("str(b'ab')"), "\"b'ab'\"");
        assert_eq!(repr("bytes([104, 105])"), "b'hi'");
        assert_eq!(repr("dict([('a', 1)], b=2)"), "{'a': 1, 'b': 2}");
        assert_eq!(repr("list(range(2, 8, 3))"), "[2, 5]");
        assert_eq!(repr("bool([])"), "False");
        assert_eq!(
            error("int('12a')"),
            "ValueError: invalid literal for int() with base 10: '12a'"
        );
        assert_eq!(error("range(1, 2, 0)"), "ValueError: range() arg 3 must not be zero");
    }
}

mod printing {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn print_joins_with_sep_and_end() {
        assert_eq!(output("print(1, 'a', None)"), "1 a None\n");
        assert_eq!(output("print(1, 2, sep='-', end='!')"), "1-2!");
        assert_eq!(output("print()"), "\n");
    }

    #[test]
    fn long_separators_are_refused() {
        assert_eq!(
            error("print(1, sep='------')"),
            "ValueError: Sorry, sep must be at most 5 characters"
        );
    }
}

mod help {
    use super::*;
    use pretty_assertions::assert_eq;
    use crate::builtins::safe_help;
    use crate::tests::interpreter;

    #[test]
    fn help_is_blocked_by_default() {
        assert_eq!(
            error("help(len)"),
            "DangerousValue: This function is forbidden: builtins.help"
        );
    }

    #[test]
    fn safe_help_returns_the_docstring() {
        let mut interp = interpreter();
        interp.session().set_builtin("help", safe_help());
        let value = interp
            .run_source("def f():\n    '''Adds things.'''\n    return 1\nhelp(f)\n")
            .unwrap();
        assert_eq!(value.repr(), "'Adds things.'");
    }
}

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "test assertions use unwrap/expect for clarity"
)]


use super::{all, lookup};
use crate::tests::{error, repr};
use crate::value::BuiltinType;

#[test]
fn lookup_follows_the_tables() {
    assert!(lookup(BuiltinType::Str, "join").is_some());
    assert!(lookup(BuiltinType::FrozenSet, "add").is_none());
    assert!(lookup(BuiltinType::Int, "bit_length").is_none());
    assert!(all().any(|m| m.owner == BuiltinType::Dict && m.name == "setdefault"));
}

mod strings {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn case() {
        assert_eq!(repr("'hello world'.title()"), "'Hello World'");
        assert_eq!(repr("'hELLO'.capitalize()"), "'Hello'");
        assert_eq!(repr("'AbC'.swapcase()"), "'aBc'");
        assert_eq!(repr("'Hello World'.istitle()"), "True");
        assert_eq!(repr("''.isdigit()"), "False");
    }

    #[test]
    fn split_and_join() {
        assert_eq!(repr("'  a  b c '.split()"), "['a', 'b', 'c']");
        assert_eq!(repr("'a,b,,c'.split(',')"), "['a', 'b', '', 'c']");
        assert_eq!(repr("'a b c'.split(maxsplit=1)"), "['a', 'b c']");
        assert_eq!(repr("'a b c'.rsplit(' ', 1)"), "['a b', 'c']");
        assert_eq!(repr("'x\\ny\\r\\nz'.splitlines()"), "['x', 'y', 'z']");
        assert_eq!(repr("'-'.join(['a', 'b'])"), "'a-b'");
        assert_eq!(
            error("''.join(['a', 1])"),
            "TypeError: sequence item 1: expected str instance, int found"
        );
        assert_eq!(error("'a'.split('')"), "ValueError: empty separator");
    }

    #[test]
    fn searching() {
        assert_eq!(repr("'héllo'.find('l')"), "2");
        assert_eq!(repr("'hello'.rfind('l')"), "3");
        assert_eq!(repr("'hello'.find('l', 4)"), "-1");
        assert_eq!(repr("'banana'.count('an')"), "2");
        assert_eq!(repr("'hello'.startswith(('x', 'he'))"), "True");
        assert_eq!(repr("'hello'.endswith('lo', 0, 4)"), "False");
        assert_eq!(error("'abc'.index('z')"), "ValueError: substring not found");
    }

    #[test]
    fn padding() {
        assert_eq!(repr("'abc'.center(6)"), "' abc  '");
        assert_eq!(repr("'ab'.center(5, '*')"), "'**ab*'");
        assert_eq!(repr("'7'.rjust(3, '0')"), "'007'");
        assert_eq!(repr("'-7'.zfill(4)"), "'-007'");
        assert_eq!(
            error("'a'.ljust(3, 'xy')"),
            "TypeError: The fill character must be exactly one character long"
        );
    }

    #[test]
    fn padding_is_bounded() {
        assert_eq!(
            error("'a'.center(10 ** 4 * 11)"),
            "MemoryError: Sorry, I will not evaluate something this long."
        );
    }

    #[test]
    fn stripping_and_partitioning() {
        assert_eq!(repr("'xxhixx'.strip('x')"), "'hi'");
        assert_eq!(repr("'  hi'.lstrip()"), "'hi'");
        assert_eq!(repr("'a=b=c'.partition('=')"), "('a', '=', 'b=c')");
        assert_eq!(repr("'a=b=c'.rpartition('=')"), "('a=b', '=', 'c')");
        assert_eq!(repr("'abc'.rpartition('x')"), "('', '', 'abc')");
        assert_eq!(repr("'prefix_x'.removeprefix('prefix_')"), "'x'");
    }

    #[test]
    fn replace_and_encode() {
        assert_eq!(repr("'aaa'.replace('a', 'b', 2)"), "'bba'");
        assert_eq!(repr("'ab'.replace('', '-')"), "'-a-b-'");
        assert_eq!(repr("'hé'.encode()"), "b'h\\xc3\\xa9'");
        assert_eq!(
            error("'x'.encode('rot13')"),
            "LookupError: unknown encoding: rot13"
        );
    }

    #[test]
    fn format_is_deny_listed() {
        assert_eq!(
            error("'{}'.format(1)"),
            "ForbiddenAccess: Sorry, this method is not available. (str.format)"
        );
    }

    #[test]
    fn methods_called_through_the_type() {
        assert_eq!(repr("str.upper('abc')"), "'ABC'");
        assert_eq!(repr("list(map(str.strip, [' a ', 'b ']))"), "['a', 'b']");
        assert_eq!(
            error("str.upper(1)"),
            "TypeError: descriptor 'upper' for 'str' objects doesn't apply to a 'int' object"
        );
        assert_eq!(
            error("str.upper()"),
            "TypeError: unbound method str.upper() needs an argument"
        );
    }
}

mod bytes {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn decode_and_hex() {
        assert_eq!(repr("b'hi'.decode()"), "'hi'");
        assert_eq!(repr("b'\\x01\\xff'.hex()"), "'01ff'");
        assert_eq!(
            error("b'\\xff'.decode('ascii')"),
            "UnicodeDecodeError: 'ascii' codec can't decode byte 0xff in position 0: ordinal not in range(128)"
        );
    }
}

mod lists {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn mutation_is_visible_through_aliases() {
        assert_eq!(repr("a = [1]\nb = a\nb.append(2)\na\n"), "[1, 2]");
        assert_eq!(repr("a = [3, 1]\na.extend(range(2))\na\n"), "[3, 1, 0, 1]");
        assert_eq!(repr("a = [1, 3]\na.insert(-1, 2)\na\n"), "[1, 2, 3]");
    }

    #[test]
    fn removal() {
        assert_eq!(repr("a = [1, 2, 3]\n(a.pop(), a.pop(0), a)\n"), "(3, 1, [2])");
        assert_eq!(repr("a = [1, 2, 1]\na.remove(1)\na\n"), "[2, 1]");
        assert_eq!(error("[].pop()"), "IndexError: pop from empty list");
        assert_eq!(error("[1].pop(5)"), "IndexError: pop index out of range");
        assert_eq!(error("[1].remove(2)"), "ValueError: list.remove(x): x not in list");
    }

    #[test]
    fn searching() {
        assert_eq!(repr("[1, 2, 1].count(1)"), "2");
        assert_eq!(repr("[1, 2, 1].index(1, 1)"), "2");
        assert_eq!(error("[1].index(9)"), "ValueError: 9 is not in list");
    }

    #[test]
    fn sort_in_place() {
        assert_eq!(repr("a = ['b', 'A', 'c']\na.sort(key=str.lower)\na\n"), "['A', 'b', 'c']");
        assert_eq!(repr("a = [1, 3, 2]\na.sort(reverse=True)\na\n"), "[3, 2, 1]");
        assert_eq!(repr("a = [2, 1]\na.reverse()\na\n"), "[1, 2]");
    }
}

mod dicts {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn views_are_lists() {
        assert_eq!(repr("{'a': 1, 'b': 2}.items()"), "[('a', 1), ('b', 2)]");
        assert_eq!(repr("{'a': 1}.keys()"), "['a']");
        assert_eq!(repr("{'a': 1}.values()"), "[1]");
    }

    #[test]
    fn lookups() {
        assert_eq!(repr("{'a': 1}.get('b')"), "None");
        assert_eq!(repr("{'a': 1}.get('b', 0)"), "0");
        assert_eq!(repr("d = {}\n(d.setdefault('k', []), d)\n"), "([], {'k': []})");
    }

    #[test]
    fn removal() {
        assert_eq!(repr("d = {'a': 1}\n(d.pop('a'), d)\n"), "(1, {})");
        assert_eq!(repr("{}.pop('x', 5)"), "5");
        assert_eq!(error("{}.pop('x')"), "KeyError: 'x'");
        assert_eq!(repr("{'a': 1, 'b': 2}.popitem()"), "('b', 2)");
        assert_eq!(error("{}.popitem()"), "KeyError: 'popitem(): dictionary is empty'");
    }

    #[test]
    fn update_and_fromkeys() {
        assert_eq!(
            repr("d = {'a': 1}\nd.update({'b': 2}, c=3)\nd.update([('a', 0)])\nd\n"),
            "{'a': 0, 'b': 2, 'c': 3}"
        );
        assert_eq!(repr("dict.fromkeys('ab', 0)"), "{'a': 0, 'b': 0}");
        assert_eq!(repr("{}.fromkeys([1])"), "{1: None}");
        assert_eq!(
            error("{}.update([(1, 2, 3)])"),
            "ValueError: dictionary update sequence element #0 has length 3; 2 is required"
        );
    }

    #[test]
    fn copies_are_shallow() {
        assert_eq!(
            repr("a = {'k': [1]}\nb = a.copy()\nb['k'].append(2)\nb['j'] = 0\na\n"),
            "{'k': [1, 2]}"
        );
    }
}

mod sets {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn mutation() {
        assert_eq!(repr("s = {1}\ns.add(2)\ns.add(1)\ns\n"), "{1, 2}");
        assert_eq!(repr("s = {1, 2}\ns.discard(5)\ns.remove(1)\ns\n"), "{2}");
        assert_eq!(repr("s = {1}\ns.update([2], (3,))\ns\n"), "{1, 2, 3}");
        assert_eq!(error("set().remove(1)"), "KeyError: 1");
        assert_eq!(error("set().pop()"), "KeyError: 'pop from an empty set'");
    }

    #[test]
    fn algebra_accepts_any_iterable() {
        assert_eq!(repr("{1, 2}.union([3], (4,))"), "{1, 2, 3, 4}");
        assert_eq!(repr("{1, 2, 3}.intersection([2, 3, 4])"), "{2, 3}");
        assert_eq!(repr("{1, 2}.difference([2])"), "{1}");
        assert_eq!(repr("{1}.issubset([1, 2])"), "True");
        assert_eq!(repr("{1, 2}.issuperset({3})"), "False");
    }

    #[test]
    fn frozensets_stay_frozen() {
        assert_eq!(repr("frozenset([1]).union([2])"), "frozenset({1, 2})");
        assert_eq!(
            error("frozenset().add(1)"),
            "AttributeError: 'frozenset' object has no attribute 'add'"
        );
    }
}

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "test assertions use unwrap/expect for clarity"
)]

use proptest::prelude::*;

use super::*;
use crate::value::ValueSet;

fn limits() -> ResourceLimits {
    ResourceLimits::default()
}

fn bin(op: BinaryOp, left: Value, right: Value) -> EvalResult {
    binary(op, &left, &right, &limits())
}

fn int_set(items: &[i64]) -> Value {
    Value::set(ValueSet::from_values(items.iter().copied().map(Value::Int)).unwrap())
}

mod arithmetic {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn floor_division_rounds_down() {
        assert_eq!(bin(BinaryOp::FloorDiv, Value::Int(-7), Value::Int(2)).unwrap().repr(), "-4");
        assert_eq!(bin(BinaryOp::Mod, Value::Int(-7), Value::Int(2)).unwrap().repr(), "1");
        assert_eq!(bin(BinaryOp::Mod, Value::Int(7), Value::Int(-2)).unwrap().repr(), "-1");
        assert_eq!(
            bin(BinaryOp::FloorDiv, Value::Float(7.5), Value::Int(2)).unwrap().repr(),
            "3.0"
        );
    }

    #[test]
    fn true_division_always_gives_floats() {
        assert_eq!(bin(BinaryOp::Div, Value::Int(6), Value::Int(3)).unwrap().repr(), "2.0");
    }

    #[test]
    fn division_by_zero_messages() {
        let int = bin(BinaryOp::Div, Value::Int(1), Value::Int(0)).unwrap_err();
        assert_eq!(int.to_string(), "ZeroDivisionError: division by zero");
        let modulo = bin(BinaryOp::Mod, Value::Int(1), Value::Int(0)).unwrap_err();
        assert_eq!(modulo.message(), "integer division or modulo by zero");
        let float = bin(BinaryOp::Div, Value::Float(1.0), Value::Float(0.0)).unwrap_err();
        assert_eq!(float.message(), "float division by zero");
    }

    #[test]
    fn overflow_raises() {
        let err = bin(BinaryOp::Add, Value::Int(i64::MAX), Value::Int(1)).unwrap_err();
        assert_eq!(err.class_name().as_ref(), "OverflowError");
        assert!(unary(UnaryOp::USub, &Value::Int(i64::MIN)).is_err());
    }

    #[test]
    fn bools_are_integers() {
        assert_eq!(bin(BinaryOp::Add, Value::Bool(true), Value::Int(2)).unwrap().repr(), "3");
        assert_eq!(
            bin(BinaryOp::BitAnd, Value::Bool(true), Value::Bool(false)).unwrap().repr(),
            "False"
        );
    }

    #[test]
    fn mixed_operands_are_rejected() {
        let err = bin(BinaryOp::Sub, Value::str("a"), Value::Int(1)).unwrap_err();
        assert_eq!(
            err.message(),
            "unsupported operand type(s) for -: 'str' and 'int'"
        );
        let err = bin(BinaryOp::Add, Value::str("a"), Value::Int(1)).unwrap_err();
        assert_eq!(err.message(), "can only concatenate str (not \"int\") to str");
    }

    #[test]
    fn string_modulo_is_not_supported() {
        let err = bin(BinaryOp::Mod, Value::str("%s"), Value::Int(1)).unwrap_err();
        assert_eq!(err.class_name().as_ref(), "NotImplementedError");
    }

    #[test]
    fn shifts() {
        assert_eq!(bin(BinaryOp::LShift, Value::Int(1), Value::Int(10)).unwrap().repr(), "1024");
        assert_eq!(bin(BinaryOp::RShift, Value::Int(-8), Value::Int(100)).unwrap().repr(), "-1");
        assert!(bin(BinaryOp::LShift, Value::Int(1), Value::Int(64)).is_err());
        let err = bin(BinaryOp::LShift, Value::Int(1), Value::Int(-1)).unwrap_err();
        assert_eq!(err.message(), "negative shift count");
    }

    #[test]
    fn divmod_pairs() {
        assert_eq!(divmod(&Value::Int(-7), &Value::Int(2)).unwrap().repr(), "(-4, 1)");
        assert_eq!(
            divmod(&Value::Float(7.0), &Value::Int(2)).unwrap().repr(),
            "(3.0, 1.0)"
        );
    }
}

mod limits_on_large_values {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn power_refuses_large_operands() {
        let err = power(&Value::Int(2), &Value::Int(10_001), &limits()).unwrap_err();
        assert_eq!(err.resource_kind(), Some(ResourceKind::ValueSize));
        assert_eq!(err.message(), "Sorry! I don't want to evaluate 2 ** 10001");
        assert_eq!(power(&Value::Int(2), &Value::Int(10), &limits()).unwrap().repr(), "1024");
    }

    #[test]
    fn power_with_negative_exponent_is_a_float() {
        assert_eq!(power(&Value::Int(2), &Value::Int(-1), &limits()).unwrap().repr(), "0.5");
        assert!(power(&Value::Int(0), &Value::Int(-1), &limits()).is_err());
    }

    #[test]
    fn repetition_is_capped() {
        let err = bin(BinaryOp::Mult, Value::str("ab"), Value::Int(100_000)).unwrap_err();
        assert_eq!(err.message(), "Sorry, I will not evalute something that long.");
        assert_eq!(bin(BinaryOp::Mult, Value::Int(3), Value::str("ab")).unwrap().repr(), "'ababab'");
        assert_eq!(bin(BinaryOp::Mult, Value::str("ab"), Value::Int(-1)).unwrap().repr(), "''");
    }

    #[test]
    fn concatenation_is_capped() {
        let tight = limits().with_max_string_length(4);
        let err = binary(BinaryOp::Add, &Value::str("abc"), &Value::str("de"), &tight).unwrap_err();
        assert_eq!(
            err.message(),
            "Sorry, adding those two together would make something too long."
        );
    }
}

mod comparisons {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn mixed_numbers_compare_by_value() {
        assert!(compare(CmpOp::Eq, &Value::Int(1), &Value::Float(1.0)).unwrap());
        assert!(compare(CmpOp::Lt, &Value::Bool(false), &Value::Float(0.5)).unwrap());
    }

    #[test]
    fn sequences_compare_lexicographically() {
        let a = Value::tuple(vec![Value::Int(1), Value::Int(2)]);
        let b = Value::tuple(vec![Value::Int(1), Value::Int(3)]);
        assert!(compare(CmpOp::Lt, &a, &b).unwrap());
        let short = Value::list(vec![Value::Int(1)]);
        let long = Value::list(vec![Value::Int(1), Value::Int(0)]);
        assert!(compare(CmpOp::Lt, &short, &long).unwrap());
    }

    #[test]
    fn unorderable_types_fail() {
        let err = compare(CmpOp::Lt, &Value::Int(1), &Value::str("a")).unwrap_err();
        assert_eq!(
            err.message(),
            "'<' not supported between instances of 'int' and 'str'"
        );
    }

    #[test]
    fn nan_is_unordered() {
        let nan = Value::Float(f64::NAN);
        assert!(!compare(CmpOp::Lt, &nan, &Value::Float(1.0)).unwrap());
        assert!(!compare(CmpOp::GtE, &nan, &Value::Float(1.0)).unwrap());
        assert_eq!(order(&nan, &Value::Float(1.0)).unwrap(), Ordering::Equal);
    }

    #[test]
    fn sets_compare_by_inclusion() {
        let small = int_set(&[1]);
        let big = int_set(&[1, 2]);
        assert!(compare(CmpOp::Lt, &small, &big).unwrap());
        assert!(!compare(CmpOp::Lt, &big, &big).unwrap());
        assert!(compare(CmpOp::GtE, &big, &small).unwrap());
    }

    #[test]
    fn membership() {
        assert!(contains(&Value::str("hello"), &Value::str("ell")).unwrap());
        assert!(contains(&int_set(&[1, 2]), &Value::Float(2.0)).unwrap());
        let range = Value::Range(crate::value::RangeValue {
            start: 0,
            stop: 10,
            step: 2,
        });
        assert!(contains(&range, &Value::Int(4)).unwrap());
        assert!(!contains(&range, &Value::Int(5)).unwrap());
        let err = contains(&Value::Int(1), &Value::Int(1)).unwrap_err();
        assert_eq!(err.message(), "argument of type 'int' is not iterable");
    }

    #[test]
    fn set_operators_keep_the_left_kind() {
        let left = int_set(&[1, 2, 3]);
        let right = int_set(&[2, 3, 4]);
        assert_eq!(bin(BinaryOp::BitAnd, left.clone(), right.clone()).unwrap().repr(), "{2, 3}");
        assert_eq!(bin(BinaryOp::Sub, left.clone(), right.clone()).unwrap().repr(), "{1}");
        assert_eq!(bin(BinaryOp::BitXor, left, right).unwrap().repr(), "{1, 4}");
    }
}

proptest! {
    #[test]
    fn floor_division_and_modulo_agree(a in -10_000i64..10_000, b in -100i64..100) {
        prop_assume!(b != 0);
        let q = bin(BinaryOp::FloorDiv, Value::Int(a), Value::Int(b)).unwrap().as_int().unwrap();
        let r = bin(BinaryOp::Mod, Value::Int(a), Value::Int(b)).unwrap().as_int().unwrap();
        prop_assert_eq!(q * b + r, a);
        prop_assert!(r == 0 || (r < 0) == (b < 0));
        prop_assert!(r.abs() < b.abs());
    }

    #[test]
    fn int_comparison_matches_rust(a in any::<i64>(), b in any::<i64>()) {
        prop_assert_eq!(compare(CmpOp::Lt, &Value::Int(a), &Value::Int(b)).unwrap(), a < b);
        prop_assert_eq!(order(&Value::Int(a), &Value::Int(b)).unwrap(), a.cmp(&b));
    }
}

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "test assertions use unwrap/expect for clarity"
)]


use super::format_value;
use crate::accounting::ResourceLimits;
use crate::errors::ResourceKind;
use crate::value::Value;

fn fmt(value: Value, spec: &str) -> String {
    format_value(&value, spec, &ResourceLimits::default()).unwrap()
}

mod integers {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn width_and_alignment() {
        assert_eq!(fmt(Value::Int(42), "5"), "   42");
        assert_eq!(fmt(Value::Int(42), "<5"), "42   ");
        assert_eq!(fmt(Value::Int(42), "^6"), "  42  ");
        assert_eq!(fmt(Value::Int(42), "*>5"), "***42");
    }

    #[test]
    fn zero_padding_goes_after_the_sign() {
        assert_eq!(fmt(Value::Int(-42), "06"), "-00042");
        assert_eq!(fmt(Value::Int(7), "+04"), "+007");
    }

    #[test]
    fn bases_and_alternate_form() {
        assert_eq!(fmt(Value::Int(255), "x"), "ff");
        assert_eq!(fmt(Value::Int(255), "#X"), "0XFF");
        assert_eq!(fmt(Value::Int(5), "#b"), "0b101");
        assert_eq!(fmt(Value::Int(8), "o"), "10");
        assert_eq!(fmt(Value::Int(65), "c"), "A");
    }

    #[test]
    fn grouping() {
        assert_eq!(fmt(Value::Int(1_234_567), ","), "1,234,567");
        assert_eq!(fmt(Value::Int(1_234_567), "_"), "1_234_567");
        assert_eq!(fmt(Value::Int(0xFFFF_FF), "_x"), "ff_ffff");
    }

    #[test]
    fn precision_is_rejected() {
        let err = format_value(&Value::Int(1), ".2d", &ResourceLimits::default()).unwrap_err();
        assert_eq!(
            err.message(),
            "Precision not allowed in integer format specifier"
        );
    }

    #[test]
    fn bools_format_as_integers_with_a_type() {
        assert_eq!(fmt(Value::Bool(true), "d"), "1");
    }
}

mod floats {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn fixed_point() {
        assert_eq!(fmt(Value::Float(3.14159), ".2f"), "3.14");
        assert_eq!(fmt(Value::Float(2.5), "f"), "2.500000");
        assert_eq!(fmt(Value::Float(-1.5), "8.2f"), "   -1.50");
    }

    #[test]
    fn exponent_has_two_digits() {
        assert_eq!(fmt(Value::Float(1234.5), ".2e"), "1.23e+03");
        assert_eq!(fmt(Value::Float(0.000_15), ".1E"), "1.5E-04");
    }

    #[test]
    fn general_strips_trailing_zeros() {
        assert_eq!(fmt(Value::Float(1.5), "g"), "1.5");
        assert_eq!(fmt(Value::Float(1e20), "g"), "1e+20");
        assert_eq!(fmt(Value::Float(0.0), "g"), "0");
    }

    #[test]
    fn percent() {
        assert_eq!(fmt(Value::Float(0.25), ".1%"), "25.0%");
    }

    #[test]
    fn integers_accept_float_codes() {
        assert_eq!(fmt(Value::Int(3), ".1f"), "3.0");
    }

    #[test]
    fn non_finite_values() {
        assert_eq!(fmt(Value::Float(f64::INFINITY), "f"), "inf");
        assert_eq!(fmt(Value::Float(f64::NEG_INFINITY), "F"), "-INF");
    }
}

mod strings {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn strings_align_left_by_default() {
        assert_eq!(fmt(Value::str("ab"), "5"), "ab   ");
        assert_eq!(fmt(Value::str("ab"), ">5s"), "   ab");
    }

    #[test]
    fn precision_truncates() {
        assert_eq!(fmt(Value::str("abcdef"), ".3"), "abc");
    }

    #[test]
    fn numeric_codes_fail_for_strings() {
        let err = format_value(&Value::str("x"), "d", &ResourceLimits::default()).unwrap_err();
        assert_eq!(
            err.message(),
            "Unknown format code 'd' for object of type 'str'"
        );
    }

    #[test]
    fn other_values_use_str() {
        assert_eq!(fmt(Value::None, ">6"), "  None");
    }
}

mod limits {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn width_over_the_cap_is_a_resource_error() {
        let err = format_value(&Value::Int(1), "101", &ResourceLimits::default()).unwrap_err();
        assert_eq!(err.resource_kind(), Some(ResourceKind::FormatWidth));
        assert_eq!(err.message(), "Sorry, this format width is too long.");
    }

    #[test]
    fn precision_over_the_cap_is_a_resource_error() {
        let err =
            format_value(&Value::Float(1.0), ".500f", &ResourceLimits::default()).unwrap_err();
        assert_eq!(err.message(), "Sorry, this format precision is too long.");
    }

    #[test]
    fn width_at_the_cap_is_allowed() {
        assert_eq!(fmt(Value::Int(1), "100").len(), 100);
    }

    #[test]
    fn malformed_specs() {
        let limits = ResourceLimits::default();
        assert_eq!(
            format_value(&Value::Int(1), "q", &limits).unwrap_err().message(),
            "Unknown format code 'q'"
        );
        assert_eq!(
            format_value(&Value::Int(1), "d5", &limits).unwrap_err().message(),
            "Invalid format specifier"
        );
    }
}

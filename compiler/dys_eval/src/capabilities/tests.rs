#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "test assertions use unwrap/expect for clarity"
)]

use pretty_assertions::assert_eq;

use super::*;
use crate::errors::EvalErrorKind;

#[test]
fn seeded_set_holds_the_builtin_catalog() {
    let set = CapabilitySet::seeded();
    assert!(set.contains(&CapabilityId::Native(NativeId::builtin("len"))));
    assert!(set.contains(&CapabilityId::Type(BuiltinType::Dict)));
    assert!(set.contains(&CapabilityId::Exception(ExcType::ValueError)));
    assert!(set.contains(&CapabilityId::Method {
        owner: BuiltinType::Str,
        name: "join",
    }));
    assert!(!set.contains(&CapabilityId::Native(NativeId::builtin("eval"))));
}

#[test]
fn denied_calls_name_the_function() {
    let set = CapabilitySet::new();
    let err = set
        .check(&CapabilityId::Native(NativeId::new("json", "dumps")))
        .unwrap_err();
    assert_eq!(err.class_name().as_ref(), "CapabilityDenied");
    assert_eq!(
        err.message(),
        "Creativity needs constraint. This function is not allowed: 'json.dumps'"
    );
    assert!(!err.is_catchable());
}

#[test]
fn clones_share_the_whitelist() {
    let set = CapabilitySet::new();
    let shared = set.clone();
    shared.insert(CapabilityId::Native(NativeId::new("math", "sqrt")));
    assert!(set.contains(&CapabilityId::Native(NativeId::new("math", "sqrt"))));
    assert_eq!(set.len(), 1);
}

#[test]
fn list_functions_is_sorted_and_deduplicated() {
    let set = CapabilitySet::new();
    set.extend([
        CapabilityId::Native(NativeId::new("json", "loads")),
        CapabilityId::Type(BuiltinType::Int),
        CapabilityId::Method {
            owner: BuiltinType::List,
            name: "append",
        },
    ]);
    assert_eq!(
        set.list_functions(),
        vec!["builtins.int", "json.loads", "list.append"]
    );
}

#[test]
fn qualified_names() {
    assert_eq!(
        CapabilityId::Exception(ExcType::KeyError).qualified_name(),
        "builtins.KeyError"
    );
    assert_eq!(NativeId::builtin("len").to_string(), "builtins.len");
}

mod attributes {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn private_names_are_forbidden() {
        let err = check_attribute("Foo", "__class__").unwrap_err();
        assert!(matches!(err.kind, EvalErrorKind::Capability(_)));
        assert_eq!(err.class_name().as_ref(), "ForbiddenAccess");
        assert_eq!(
            err.message(),
            "Sorry, access to this attribute is not available. (__class__)"
        );
    }

    #[test]
    fn deny_listed_members_are_forbidden() {
        let err = check_attribute("str", "format").unwrap_err();
        assert_eq!(
            err.message(),
            "Sorry, this method is not available. (str.format)"
        );
        assert!(check_attribute("type", "mro").is_err());
    }

    #[test]
    fn ordinary_members_pass() {
        assert!(check_attribute("str", "upper").is_ok());
        assert!(check_attribute("Foo", "format").is_ok());
    }
}

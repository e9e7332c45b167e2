use super::*;

#[test]
fn empty_string_is_pre_interned() {
    let interner = StringInterner::new();
    assert_eq!(interner.intern(""), Name::EMPTY);
    assert_eq!(&*interner.lookup(Name::EMPTY), "");
}

#[test]
fn interning_is_idempotent() {
    let interner = StringInterner::new();
    let a = interner.intern("total");
    let b = interner.intern("total");
    assert_eq!(a, b);
    assert_eq!(&*interner.lookup(a), "total");
}

#[test]
fn distinct_strings_get_distinct_names() {
    let interner = StringInterner::new();
    assert_ne!(interner.intern("a"), interner.intern("b"));
    assert_eq!(interner.len(), 3);
}

#[test]
fn get_does_not_intern() {
    let interner = StringInterner::new();
    assert_eq!(interner.get("missing"), None);
    assert_eq!(interner.len(), 1);
}

#[test]
fn starts_with_checks_text() {
    let interner = StringInterner::new();
    let private = interner.intern("_secret");
    let public = interner.intern("value");
    assert!(interner.starts_with(private, "_"));
    assert!(!interner.starts_with(public, "_"));
}

#[test]
fn shared_interner_is_shared() {
    let shared = SharedInterner::new();
    let clone = shared.clone();
    let name = shared.intern("x");
    assert_eq!(clone.get("x"), Some(name));
}

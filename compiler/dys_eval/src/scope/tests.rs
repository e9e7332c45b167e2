use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::*;

fn name(n: u32) -> Name {
    let interner = dys_ir::StringInterner::new();
    let mut last = Name::EMPTY;
    for i in 0..=n {
        last = interner.intern(&format!("v{i}"));
    }
    last
}

fn scope() -> Scope {
    Scope::new(new_layer(), new_layer())
}

#[test]
fn inner_layer_shadows_outer() {
    let mut scope = scope();
    let x = name(0);
    scope.set(x, Value::Int(1));
    scope.push();
    scope.set(x, Value::Int(2));
    assert!(scope.get(x).is_some_and(|v| v.py_eq(&Value::Int(2))));
    scope.pop();
    assert!(scope.get(x).is_some_and(|v| v.py_eq(&Value::Int(1))));
}

#[test]
fn pop_never_removes_fixed_layers() {
    let mut scope = scope();
    assert!(scope.pop().is_none());
    assert_eq!(scope.depth(), 2);
    scope.push();
    assert!(scope.pop().is_some());
    assert!(scope.pop().is_none());
}

#[test]
fn delete_only_touches_innermost() {
    let mut scope = scope();
    let x = name(0);
    scope.set(x, Value::Int(1));
    scope.push();
    assert!(!scope.delete(x));
    assert!(scope.get(x).is_some());
}

#[test]
fn snapshot_sees_later_global_writes() {
    let scope = scope();
    let captured = scope.snapshot();
    let late = name(3);
    scope.set(late, Value::str("defined later"));
    assert!(captured.get(late).is_some());
}

#[test]
fn snapshot_push_does_not_leak_into_definer() {
    let scope = scope();
    let mut call = scope.snapshot();
    call.push();
    let local = name(1);
    call.set(local, Value::Int(5));
    assert!(scope.get(local).is_none());
    assert!(call.contains_local(local));
}

#[test]
fn flatten_prefers_inner_bindings() {
    let mut scope = scope();
    let x = name(0);
    scope.builtins().borrow_mut().insert(x, Value::Int(0));
    scope.push();
    scope.set(x, Value::Int(9));
    let flat = scope.flatten();
    assert_eq!(flat.len(), 1);
    assert!(flat[&x].py_eq(&Value::Int(9)));
}

#[test]
fn estimated_size_ignores_builtins() {
    let scope = scope();
    let x = name(0);
    scope
        .builtins()
        .borrow_mut()
        .insert(x, Value::str(&"b".repeat(1000)));
    assert!(scope.estimated_size(usize::MAX, |_| 1) < 10);
    scope.set(x, Value::str("abc"));
    // "[{'x': 'abc'}]" modulo name length
    assert_eq!(scope.estimated_size(usize::MAX, |_| 1), 2 + 2 + 1 + 4 + 5);
}

#[test]
fn clear_drops_globals() {
    let scope = scope();
    scope.set(name(0), Value::Int(1));
    scope.clear_locals_and_globals();
    assert!(scope.globals().borrow().is_empty());
}

proptest! {
    #[test]
    fn push_pop_balances(pushes in 0usize..20, pops in 0usize..30) {
        let mut scope = scope();
        for _ in 0..pushes {
            scope.push();
        }
        for _ in 0..pops {
            scope.pop();
        }
        prop_assert_eq!(scope.depth(), 2 + pushes.saturating_sub(pops));
    }

    #[test]
    fn last_write_wins(values in proptest::collection::vec(any::<i64>(), 1..20)) {
        let scope = scope();
        let x = name(0);
        for v in &values {
            scope.set(x, Value::Int(*v));
        }
        let last = *values.last().unwrap_or(&0);
        prop_assert!(scope.get(x).is_some_and(|v| v.py_eq(&Value::Int(last))));
    }
}

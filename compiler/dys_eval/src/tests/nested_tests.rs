//! Nested evaluation: fresh globals, clamped limits, shared counters and
//! the per-node hook.

use std::rc::Rc;

use pretty_assertions::assert_eq;

use crate::accounting::{Accountant, ResourceLimits, SharedState};
use crate::interpreter::{Interpreter, InterpreterBuilder};
use crate::print_handler::buffer_handler;
use crate::value::Value;

fn metered(limits: ResourceLimits, state: &SharedState) -> Interpreter<'static> {
    InterpreterBuilder::new()
        .limits(limits)
        .tracker(Accountant::new(limits, Rc::clone(state)))
        .print_handler(buffer_handler(1_000))
        .build()
}

fn seeded(interp: &Interpreter<'_>, pairs: &[(&str, Value)]) -> Vec<(dys_ir::Name, Value)> {
    pairs
        .iter()
        .map(|(name, value)| (interp.session().interner().intern(name), value.clone()))
        .collect()
}

#[test]
fn runs_against_seeded_globals_only() {
    let state = SharedState::default();
    let mut interp = metered(ResourceLimits::default(), &state);
    interp.run_source("outer = 1\n").unwrap();
    let globals = seeded(&interp, &[("x", Value::Int(20))]);
    let result = interp
        .eval_nested("x + 22", globals, ResourceLimits::default(), None)
        .unwrap();
    assert_eq!(result.repr(), "42");

    let err = interp
        .eval_nested("outer", Vec::new(), ResourceLimits::default(), None)
        .unwrap_err();
    assert_eq!(err.message(), "name 'outer' is not defined");
}

#[test]
fn outer_globals_survive_the_nested_run() {
    let state = SharedState::default();
    let mut interp = metered(ResourceLimits::default(), &state);
    interp.run_source("keep = 'yes'\n").unwrap();
    interp
        .eval_nested("keep = 'no'\n", Vec::new(), ResourceLimits::default(), None)
        .unwrap();
    assert_eq!(interp.global("keep").map(|v| v.repr()), Some("'yes'".to_string()));
}

#[test]
fn counters_keep_running_across_the_boundary() {
    let state = SharedState::default();
    let mut interp = metered(ResourceLimits::default(), &state);
    interp.run_source("a = 1\n").unwrap();
    let before = state.borrow().nodes_called;
    interp
        .eval_nested("b = 2\nb + 1\n", Vec::new(), ResourceLimits::default(), None)
        .unwrap();
    assert!(state.borrow().nodes_called > before);
}

#[test]
fn nested_limits_are_clamped_and_restored() {
    let state = SharedState::default();
    let outer = ResourceLimits::default().with_max_node_calls(500);
    let mut interp = metered(outer, &state);
    let generous = ResourceLimits::default().with_max_node_calls(1_000_000);
    let err = interp
        .eval_nested("for i in range(1000):\n    pass\n", Vec::new(), generous, None)
        .unwrap_err();
    assert_eq!(err.class_name().as_ref(), "MemoryError");
    assert_eq!(interp.limits().max_node_calls, 500);
}

#[test]
fn tighter_nested_limits_apply_inside_only() {
    let state = SharedState::default();
    let mut interp = metered(ResourceLimits::default(), &state);
    let tight = ResourceLimits::default().with_max_string_length(10);
    let err = interp
        .eval_nested("'x' * 6 + 'y' * 6", Vec::new(), tight, None)
        .unwrap_err();
    assert_eq!(err.class_name().as_ref(), "MemoryError");
    assert_eq!(interp.run_source("len('x' * 6 + 'y' * 6)").unwrap().repr(), "12");
}

#[test]
fn hook_sees_every_positioned_node() {
    let state = SharedState::default();
    let mut interp = metered(ResourceLimits::default(), &state);
    interp
        .run_source("seen = []\ndef hook(line, col, end_line, end_col, kind):\n    seen.append((line, kind))\n")
        .unwrap();
    let hook = interp.global("hook");
    interp
        .eval_nested("y = 1\n", Vec::new(), ResourceLimits::default(), hook)
        .unwrap();
    assert_eq!(
        interp.global("seen").unwrap().repr(),
        "[(1, 'Constant'), (1, 'Name'), (1, 'Assign')]"
    );
}

#[test]
fn hook_errors_abort_the_nested_run() {
    let state = SharedState::default();
    let mut interp = metered(ResourceLimits::default(), &state);
    interp
        .run_source("def hook(*args):\n    raise ValueError('stop')\n")
        .unwrap();
    let hook = interp.global("hook");
    let err = interp
        .eval_nested("print('never')\n", Vec::new(), ResourceLimits::default(), hook)
        .unwrap_err();
    assert_eq!(err.message(), "stop");
    assert_eq!(interp.print_handler().get_output(), "");
}

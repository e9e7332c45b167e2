#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "test assertions use unwrap/expect for clarity"
)]

use pretty_assertions::assert_eq;

use super::*;
use crate::interpreter::InterpreterBuilder;
use crate::print_handler::silent_handler;

fn run_with(limits: ResourceLimits, source: &str) -> (Result<Value, EvalError>, ResourceState) {
    let state = SharedState::default();
    let mut interp = InterpreterBuilder::new()
        .limits(limits)
        .tracker(Accountant::new(limits, Rc::clone(&state)))
        .print_handler(silent_handler())
        .build();
    let result = interp.run_source(source);
    drop(interp);
    let snapshot = state.borrow().clone();
    (result, snapshot)
}

#[test]
fn default_limits() {
    let limits = ResourceLimits::default();
    assert_eq!(limits.max_node_calls, 10_000);
    assert_eq!(limits.max_scope_size, 200_000);
    assert_eq!(limits.max_cumulative_size, 2_000_000_000);
    assert_eq!(limits.max_call_depth, 32);
}

#[test]
fn nested_limits_never_exceed_the_outer_ones() {
    let outer = ResourceLimits::default().with_max_node_calls(100);
    let nested = ResourceLimits::default()
        .with_max_node_calls(1_000)
        .with_max_scope_size(50)
        .clamped_to(&outer);
    assert_eq!(nested.max_node_calls, 100);
    assert_eq!(nested.max_scope_size, 50);
    assert_eq!(nested.max_cumulative_size, 5_000);
}

#[test]
fn counters_are_shared_with_the_caller() {
    let (result, state) = run_with(ResourceLimits::default(), "x = 1\ny = x + 2\n");
    assert!(result.is_ok());
    assert!(state.nodes_called >= 6);
    assert!(state.cumulative_size > 0);
    assert_eq!(state.cumulative_size, state.unconsumed_size);
}

#[test]
fn more_work_costs_more_nodes() {
    let (_, short) = run_with(ResourceLimits::default(), "for i in range(2):\n    pass\n");
    let (_, long) = run_with(ResourceLimits::default(), "for i in range(20):\n    pass\n");
    assert!(long.nodes_called > short.nodes_called);
}

#[test]
fn node_cap_stops_infinite_loops() {
    let limits = ResourceLimits::default().with_max_node_calls(50);
    let (result, state) = run_with(limits, "while True:\n    pass\n");
    let err = result.unwrap_err();
    assert_eq!(err.resource_kind(), Some(ResourceKind::NodeCalls));
    assert_eq!(err.message(), "This program has too many evaluations");
    assert!(state.nodes_called > 50);
}

#[test]
fn scope_cap_stops_large_state() {
    let limits = ResourceLimits::default().with_max_scope_size(1_000);
    let (result, _) = run_with(limits, "x = 'a' * 900\ny = x + x\n");
    let err = result.unwrap_err();
    assert_eq!(err.resource_kind(), Some(ResourceKind::ScopeSize));
    assert_eq!(err.message(), "Scope has used too much memory");
    assert!(!err.is_catchable());
}

#[test]
fn resource_errors_escape_try() {
    let limits = ResourceLimits::default().with_max_node_calls(30);
    let source = "try:\n    while True:\n        pass\nexcept Exception:\n    pass\n";
    let (result, _) = run_with(limits, source);
    assert_eq!(
        result.unwrap_err().resource_kind(),
        Some(ResourceKind::NodeCalls)
    );
}

#[test]
fn cumulative_cap() {
    let limits = ResourceLimits::default().with_max_cumulative_size(100);
    let (result, _) = run_with(limits, "x = 'a' * 50\ny = 1\nz = 2\n");
    assert_eq!(
        result.unwrap_err().message(),
        "Cumsize too large"
    );
}

#[test]
fn noop_tracker_ignores_limits() {
    let mut interp = InterpreterBuilder::new()
        .limits(ResourceLimits::default().with_max_node_calls(5))
        .tracker(NoopTracker)
        .print_handler(silent_handler())
        .build();
    let value = interp
        .run_source("total = 0\nfor i in range(100):\n    total += i\ntotal\n")
        .unwrap();
    assert_eq!(value.repr(), "4950");
}

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "test assertions use unwrap/expect for clarity"
)]

use pretty_assertions::assert_eq;

use super::*;
use crate::accounting::{Accountant, ResourceState};
use crate::interpreter::InterpreterBuilder;
use crate::print_handler::silent_handler;

fn covered(source: &str) -> Vec<CoverageEntry> {
    let limits = ResourceLimits::default();
    let state = SharedState::default();
    let coverage = SharedCoverage::default();
    let tracker = Covered::new(
        Accountant::new(limits, Rc::clone(&state)),
        Rc::clone(&coverage),
        Rc::clone(&state),
    );
    let mut interp = InterpreterBuilder::new()
        .limits(limits)
        .tracker(tracker)
        .print_handler(silent_handler())
        .build();
    interp.run_source(source).unwrap();
    drop(interp);
    let entries = coverage.borrow().entries();
    entries
}

#[test]
fn every_positioned_node_is_reported() {
    let entries = covered("x = 1\n");
    let kinds: Vec<&str> = entries.iter().map(|e| e.kind).collect();
    assert_eq!(kinds, ["Assign", "Name", "Constant"]);
    assert!(entries.iter().all(|e| e.counts.calls == 1));
}

#[test]
fn enclosing_nodes_come_first() {
    let entries = covered("y = 2 + 3\n");
    assert_eq!(entries[0].kind, "Assign");
    assert_eq!(entries[0].range.col_offset, 0);
    let binop = entries.iter().position(|e| e.kind == "BinOp").unwrap();
    let left = entries
        .iter()
        .position(|e| e.kind == "Constant" && e.range.col_offset == 4)
        .unwrap();
    assert!(binop < left);
}

#[test]
fn unexecuted_code_has_zero_calls() {
    let entries = covered("def f():\n    return 1\n");
    let body: Vec<&CoverageEntry> = entries.iter().filter(|e| e.range.lineno == 2).collect();
    assert!(!body.is_empty());
    assert!(body.iter().all(|e| e.counts.calls == 0));
}

#[test]
fn loop_bodies_count_each_iteration() {
    let entries = covered("for i in range(3):\n    x = i\n");
    let assign = entries.iter().find(|e| e.kind == "Assign").unwrap();
    assert_eq!(assign.counts.calls, 3);
    assert!(assign.counts.cumulative_size > 0);
}

#[test]
fn registering_a_program_zero_fills_its_nodes() {
    let limits = ResourceLimits::default().with_max_node_calls(3);
    let state = SharedState::default();
    let coverage = SharedCoverage::default();
    let mut tracker = Covered::new(
        Accountant::new(limits, Rc::clone(&state)),
        Rc::clone(&coverage),
        Rc::clone(&state),
    );
    let program = dys_parse::parse("x = 1\ny = 2\n", &dys_ir::StringInterner::new()).unwrap();
    tracker.on_program(&program);
    assert_eq!(tracker.inner().state().borrow().clone(), ResourceState::default());
    assert_eq!(coverage.borrow().len(), 6);
    assert!(coverage
        .borrow()
        .entries()
        .iter()
        .all(|e| e.counts == NodeCoverage::default()));
}

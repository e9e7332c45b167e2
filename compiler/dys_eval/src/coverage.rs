//! Per-node coverage.
//!
//! Every positioned node of a loaded program is registered with zero
//! counts; each visit adds one call and the live size at that visit.

use std::cell::RefCell;
use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::ops::ControlFlow;
use std::rc::Rc;

use dys_ir::visitor::{walk_program, NodeVisitor};
use dys_ir::{NodeKind, Program, SourceRange, Span};

use crate::accounting::{NodeVisit, ResourceLimits, SharedState, Tracker};
use crate::errors::EvalError;

/// Coverage counts of one node.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeCoverage {
    pub calls: u64,
    pub cumulative_size: u64,
}

/// One row of a coverage report.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoverageEntry {
    pub range: SourceRange,
    pub kind: &'static str,
    pub counts: NodeCoverage,
}

#[derive(Clone, Debug, Default)]
pub struct Coverage {
    nodes: BTreeMap<(SourceRange, &'static str), NodeCoverage>,
}

struct Register<'c> {
    program: &'c Program,
    nodes: &'c mut BTreeMap<(SourceRange, &'static str), NodeCoverage>,
}

impl NodeVisitor for Register<'_> {
    type Break = ();

    fn visit_node(&mut self, kind: NodeKind, span: Span) -> ControlFlow<()> {
        if kind.has_position() {
            self.nodes
                .entry((self.program.locate(span), kind.name()))
                .or_default();
        }
        ControlFlow::Continue(())
    }
}

impl Coverage {
    pub fn new() -> Self {
        Coverage::default()
    }

    /// Register every positioned node of `program`.
    pub fn register(&mut self, program: &Program) {
        let mut register = Register {
            program,
            nodes: &mut self.nodes,
        };
        let _ = walk_program(&mut register, program);
    }

    pub fn record(&mut self, range: SourceRange, kind: NodeKind, size: usize) {
        let counts = self.nodes.entry((range, kind.name())).or_default();
        counts.calls += 1;
        counts.cumulative_size += size as u64;
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Rows sorted by start position, enclosing nodes before the nodes
    /// they contain.
    pub fn entries(&self) -> Vec<CoverageEntry> {
        let mut entries: Vec<CoverageEntry> = self
            .nodes
            .iter()
            .map(|(&(range, kind), &counts)| CoverageEntry {
                range,
                kind,
                counts,
            })
            .collect();
        entries.sort_by_key(|e| {
            (
                e.range.lineno,
                e.range.col_offset,
                Reverse(e.range.end_lineno),
                Reverse(e.range.end_col_offset),
            )
        });
        entries
    }
}

pub type SharedCoverage = Rc<RefCell<Coverage>>;

/// Wraps a tracker and records coverage for every visit it sees.
pub struct Covered<T> {
    inner: T,
    coverage: SharedCoverage,
    state: SharedState,
}

impl<T: Tracker> Covered<T> {
    /// `state` must be the counters `inner` writes `last_size` into.
    pub fn new(inner: T, coverage: SharedCoverage, state: SharedState) -> Self {
        Covered {
            inner,
            coverage,
            state,
        }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

impl<T: Tracker> Tracker for Covered<T> {
    fn on_program(&mut self, program: &Program) {
        self.coverage.borrow_mut().register(program);
        self.inner.on_program(program);
    }

    fn on_node(&mut self, visit: &NodeVisit<'_>) -> Result<(), EvalError> {
        let result = self.inner.on_node(visit);
        if visit.kind.has_position() {
            let size = self.state.borrow().last_size;
            self.coverage
                .borrow_mut()
                .record(visit.range, visit.kind, size);
        }
        result
    }

    fn enter_nested(&mut self, limits: &ResourceLimits) {
        self.inner.enter_nested(limits);
    }

    fn exit_nested(&mut self) {
        self.inner.exit_nested();
    }
}

#[cfg(test)]
mod tests;

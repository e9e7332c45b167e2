//! Resource accounting.
//!
//! The interpreter reports every node it evaluates to one [`Tracker`]. The
//! stock tracker, [`Accountant`], counts node visits and estimates the live
//! size of the program state, failing the evaluation once a cap in
//! [`ResourceLimits`] is crossed. Gas settlement and coverage wrap it.

use std::cell::RefCell;
use std::rc::Rc;

use dys_ir::{NodeKind, Program, ProgramId, SourceRange, Span, StringInterner};

use crate::errors::{resource, EvalError, ResourceKind};
use crate::scope::Scope;
use crate::value::Value;

/// Tunable caps. The semantics of each check are fixed; only the numbers
/// move.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ResourceLimits {
    pub max_node_calls: u64,
    pub max_scope_size: usize,
    pub max_cumulative_size: u64,
    pub max_string_length: usize,
    pub max_power: i64,
    pub max_call_depth: usize,
    pub max_format_width: usize,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        let max_node_calls = 10_000;
        let max_scope_size = 200_000;
        ResourceLimits {
            max_node_calls,
            max_scope_size,
            max_cumulative_size: max_node_calls * max_scope_size as u64,
            max_string_length: 100_000,
            max_power: 10_000,
            max_call_depth: 32,
            max_format_width: 100,
        }
    }
}

impl ResourceLimits {
    #[must_use]
    pub fn with_max_node_calls(mut self, n: u64) -> Self {
        self.max_node_calls = n;
        self
    }

    #[must_use]
    pub fn with_max_scope_size(mut self, n: usize) -> Self {
        self.max_scope_size = n;
        self
    }

    #[must_use]
    pub fn with_max_cumulative_size(mut self, n: u64) -> Self {
        self.max_cumulative_size = n;
        self
    }

    #[must_use]
    pub fn with_max_string_length(mut self, n: usize) -> Self {
        self.max_string_length = n;
        self
    }

    #[must_use]
    pub fn with_max_power(mut self, n: i64) -> Self {
        self.max_power = n;
        self
    }

    #[must_use]
    pub fn with_max_call_depth(mut self, n: usize) -> Self {
        self.max_call_depth = n;
        self
    }

    /// Limits for a nested evaluation: each requested cap, but never above
    /// the enclosing one. The cumulative cap follows the clamped caps.
    #[must_use]
    pub fn clamped_to(self, outer: &ResourceLimits) -> Self {
        let max_node_calls = self.max_node_calls.min(outer.max_node_calls);
        let max_scope_size = self.max_scope_size.min(outer.max_scope_size);
        ResourceLimits {
            max_node_calls,
            max_scope_size,
            max_cumulative_size: (max_node_calls.saturating_mul(max_scope_size as u64))
                .min(outer.max_cumulative_size),
            max_string_length: self.max_string_length.min(outer.max_string_length),
            max_power: self.max_power.min(outer.max_power),
            max_call_depth: self.max_call_depth.min(outer.max_call_depth),
            max_format_width: self.max_format_width.min(outer.max_format_width),
        }
    }
}

/// Counters of one invocation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResourceState {
    pub nodes_called: u64,
    /// Live size at the most recent visit.
    pub last_size: usize,
    pub cumulative_size: u64,
    /// Size not yet converted into gas.
    pub unconsumed_size: u64,
    pub gas_consumed: u64,
    pub gas_limit: u64,
}

pub type SharedState = Rc<RefCell<ResourceState>>;

/// Identity of a node: two visits with equal refs are the same node.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeRef {
    pub program: ProgramId,
    pub kind: NodeKind,
    pub span: Span,
}

/// One node visit, as reported to a tracker after the node finished.
pub struct NodeVisit<'v> {
    pub kind: NodeKind,
    pub range: SourceRange,
    pub node: NodeRef,
    pub scope: &'v Scope,
    /// Value the node produced (or the previous value for statements).
    pub last: &'v Value,
    pub interner: &'v StringInterner,
}

impl NodeVisit<'_> {
    /// Approximate `repr` length of the visible state plus the last value,
    /// computed no further than `cap`.
    pub fn live_size(&self, cap: usize) -> usize {
        let interner = self.interner;
        let scope = self
            .scope
            .estimated_size(cap, |name| interner.lookup(name).len());
        scope + self.last.estimate_len(cap.saturating_sub(scope))
    }
}

/// Observer of node visits. Returning an error aborts the evaluation.
pub trait Tracker {
    /// Called once per loaded program, before it runs.
    fn on_program(&mut self, _program: &Program) {}

    fn on_node(&mut self, visit: &NodeVisit<'_>) -> Result<(), EvalError>;

    /// A nested evaluation starts under `limits`.
    fn enter_nested(&mut self, _limits: &ResourceLimits) {}

    /// The innermost nested evaluation ended.
    fn exit_nested(&mut self) {}
}

/// What one visit added.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Tally {
    pub size: usize,
    /// Whether the visit counted as a new node evaluation.
    pub counted: bool,
}

/// Enforces node, size and cumulative-size caps.
pub struct Accountant {
    state: SharedState,
    limits: ResourceLimits,
    outer: Vec<ResourceLimits>,
    last_node: Option<NodeRef>,
}

impl Accountant {
    pub fn new(limits: ResourceLimits, state: SharedState) -> Self {
        Accountant {
            state,
            limits,
            outer: Vec::new(),
            last_node: None,
        }
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    pub fn limits(&self) -> &ResourceLimits {
        &self.limits
    }

    /// Charge one visit.
    ///
    /// Consecutive reports of the same node (a statement that is also the
    /// last expression) count once.
    pub fn account(&mut self, visit: &NodeVisit<'_>) -> Result<Tally, EvalError> {
        if !visit.kind.has_position() {
            return Ok(Tally::default());
        }
        let size = visit.live_size(self.limits.max_scope_size);
        let mut state = self.state.borrow_mut();
        state.last_size = size;
        if size > self.limits.max_scope_size {
            return Err(resource(
                ResourceKind::ScopeSize,
                "Scope has used too much memory",
            ));
        }
        if self.last_node == Some(visit.node) {
            return Ok(Tally {
                size,
                counted: false,
            });
        }
        self.last_node = Some(visit.node);
        state.nodes_called += 1;
        if state.nodes_called > self.limits.max_node_calls {
            return Err(resource(
                ResourceKind::NodeCalls,
                "This program has too many evaluations",
            ));
        }
        let size64 = size as u64;
        state.cumulative_size = state.cumulative_size.saturating_add(size64);
        state.unconsumed_size = state.unconsumed_size.saturating_add(size64);
        if state.cumulative_size > self.limits.max_cumulative_size {
            return Err(resource(ResourceKind::CumulativeSize, "Cumsize too large"));
        }
        tracing::trace!(
            kind = visit.kind.name(),
            line = visit.range.lineno,
            size,
            nodes = state.nodes_called,
            "node visit"
        );
        Ok(Tally {
            size,
            counted: true,
        })
    }
}

impl Tracker for Accountant {
    fn on_node(&mut self, visit: &NodeVisit<'_>) -> Result<(), EvalError> {
        self.account(visit).map(drop)
    }

    fn enter_nested(&mut self, limits: &ResourceLimits) {
        let nested = limits.clamped_to(&self.limits);
        self.outer.push(std::mem::replace(&mut self.limits, nested));
    }

    fn exit_nested(&mut self) {
        if let Some(limits) = self.outer.pop() {
            self.limits = limits;
        }
    }
}

/// A tracker that ignores every visit.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopTracker;

impl Tracker for NoopTracker {
    fn on_node(&mut self, _visit: &NodeVisit<'_>) -> Result<(), EvalError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests;

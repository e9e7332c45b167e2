//! Gas settlement.
//!
//! The accountant adds every visit's live size to `unconsumed_size`. The
//! [`GasMeter`] turns that into gas and charges it to the host: when the
//! unconsumed amount crosses the threshold, after every module, and at the
//! start and end of an invocation. Once a settlement fails the meter stays
//! aborted and never talks to the host again.

use std::cell::Cell;
use std::rc::Rc;

use dys_eval::errors::resource;
use dys_eval::{EvalError, NodeVisit, ResourceKind, ResourceLimits, SharedState, Tracker};
use dys_ir::{NodeKind, Program};

use crate::host::{GasReport, HostRpc};

/// Converts accounted size into gas charged to the host.
pub struct GasMeter {
    state: SharedState,
    host: Rc<dyn HostRpc>,
    multiplier: u64,
    threshold: u64,
    aborted: Cell<bool>,
}

pub type SharedMeter = Rc<GasMeter>;

impl GasMeter {
    pub fn new(state: SharedState, host: Rc<dyn HostRpc>, multiplier: u64, threshold: u64) -> Self {
        GasMeter {
            state,
            host,
            multiplier,
            threshold,
            aborted: Cell::new(false),
        }
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    pub fn host(&self) -> &Rc<dyn HostRpc> {
        &self.host
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.get()
    }

    /// Stop all further settlements.
    pub fn abort(&self) {
        self.aborted.set(true);
    }

    /// Whether enough size accumulated to settle before the next module
    /// boundary.
    pub fn due(&self) -> bool {
        self.state.borrow().unconsumed_size > self.threshold
    }

    /// Gas consumed so far, including size not yet settled.
    pub fn gas_consumed(&self) -> u64 {
        let state = self.state.borrow();
        state.gas_consumed.saturating_add(state.unconsumed_size)
    }

    fn describe(&self) -> String {
        let s = self.state.borrow();
        format!(
            "{{'unconsumed_size': {}, 'gas_consumed': {}, 'gas_limit': {}, 'cumsize': {}, 'nodes_called': {}}}",
            s.unconsumed_size, s.gas_consumed, s.gas_limit, s.cumulative_size, s.nodes_called
        )
    }

    fn fail(&self, message: String) -> EvalError {
        self.abort();
        resource(ResourceKind::OutOfGas, message)
    }

    /// Charge the unconsumed size and refresh the host's counters.
    ///
    /// Fails with an uncatchable out-of-gas error when the host reports more
    /// gas consumed than its positive limit.
    pub fn settle(&self) -> Result<(), EvalError> {
        if self.is_aborted() {
            return Err(resource(
                ResourceKind::OutOfGas,
                format!("Out of Gas: {}", self.describe()),
            ));
        }
        let amount = {
            let mut state = self.state.borrow_mut();
            let amount = state.unconsumed_size.saturating_mul(self.multiplier);
            if amount > 0 {
                state.unconsumed_size = 0;
            }
            amount
        };
        let reply = if amount > 0 {
            self.host.consume_gas(amount).or_else(|err| {
                tracing::warn!(amount, %err, "ConsumeGas failed, reading the limit instead");
                self.host.gas_limit()
            })
        } else {
            self.host.gas_limit()
        };
        let report = match reply.and_then(|result| GasReport::from_result(&result)) {
            Ok(report) => report,
            Err(err) => {
                tracing::warn!(%err, "gas settlement failed");
                return Err(self.fail(format!("Gas settlement failed: {err}")));
            }
        };
        {
            let mut state = self.state.borrow_mut();
            state.gas_consumed = report.gas_consumed;
            state.gas_limit = report.gas_limit;
        }
        tracing::debug!(
            amount,
            consumed = report.gas_consumed,
            limit = report.gas_limit,
            "gas settled"
        );
        if report.gas_limit > 0 && report.gas_consumed > report.gas_limit {
            return Err(self.fail(format!("Out of Gas: {}", self.describe())));
        }
        Ok(())
    }
}

/// Settles gas around an inner tracker.
///
/// Any error from the inner tracker aborts the meter, so a run stopped by a
/// resource cap makes no further host calls.
pub struct MeteredTracker<T> {
    inner: T,
    meter: SharedMeter,
}

impl<T: Tracker> MeteredTracker<T> {
    pub fn new(inner: T, meter: SharedMeter) -> Self {
        MeteredTracker { inner, meter }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

impl<T: Tracker> Tracker for MeteredTracker<T> {
    fn on_program(&mut self, program: &Program) {
        self.inner.on_program(program);
    }

    fn on_node(&mut self, visit: &NodeVisit<'_>) -> Result<(), EvalError> {
        if let Err(err) = self.inner.on_node(visit) {
            self.meter.abort();
            return Err(err);
        }
        if matches!(visit.kind, NodeKind::Module) || self.meter.due() {
            self.meter.settle()?;
        }
        Ok(())
    }

    fn enter_nested(&mut self, limits: &ResourceLimits) {
        self.inner.enter_nested(limits);
    }

    fn exit_nested(&mut self) {
        self.inner.exit_nested();
    }
}

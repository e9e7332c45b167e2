//! `InterpreterBuilder` for creating Interpreter instances.

use super::{empty_program, Interpreter, WellKnown};
use crate::accounting::{Accountant, ResourceLimits, SharedState, Tracker};
use crate::print_handler::{stdout_handler, SharedPrintHandler};
use crate::scope::{new_layer, Scope};
use crate::session::Session;
use crate::value::Value;

/// Builder for [`Interpreter`].
///
/// Defaults: a fresh session, default limits, stdout output, and an
/// [`Accountant`] enforcing those limits on private counters.
pub struct InterpreterBuilder<'a> {
    session: Option<Session>,
    limits: ResourceLimits,
    tracker: Option<Box<dyn Tracker + 'a>>,
    print_handler: Option<SharedPrintHandler>,
}

impl Default for InterpreterBuilder<'_> {
    fn default() -> Self {
        InterpreterBuilder::new()
    }
}

impl<'a> InterpreterBuilder<'a> {
    pub fn new() -> Self {
        InterpreterBuilder {
            session: None,
            limits: ResourceLimits::default(),
            tracker: None,
            print_handler: None,
        }
    }

    /// Use an existing session (with its modules and whitelist).
    #[must_use]
    pub fn session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    /// Caps for operators, literals and call depth. Also used for the
    /// default tracker.
    #[must_use]
    pub fn limits(mut self, limits: ResourceLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Observer for node visits; replaces the default accountant.
    #[must_use]
    pub fn tracker(mut self, tracker: impl Tracker + 'a) -> Self {
        self.tracker = Some(Box::new(tracker));
        self
    }

    #[must_use]
    pub fn print_handler(mut self, handler: SharedPrintHandler) -> Self {
        self.print_handler = Some(handler);
        self
    }

    pub fn build(self) -> Interpreter<'a> {
        let session = self.session.unwrap_or_default();
        let limits = self.limits;
        let tracker = self.tracker.unwrap_or_else(|| {
            let state = SharedState::default();
            Box::new(Accountant::new(limits, state))
        });
        let scope = Scope::new(session.builtins().clone(), new_layer());
        Interpreter {
            names: WellKnown::new(&session),
            session,
            program: empty_program(),
            scope,
            tracker,
            limits,
            call_depth: 0,
            last_value: Value::None,
            print_handler: self.print_handler.unwrap_or_else(stdout_handler),
            handling: Vec::new(),
            node_hook: None,
            in_hook: false,
        }
    }
}

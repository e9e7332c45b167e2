//! Invocation-level tests.
//!
//! Scripts run through [`Sandbox::invoke`] against a [`RecordingHost`]
//! that keeps every request and plays a ledger with a gas counter.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "test assertions use unwrap/expect for clarity"
)]

mod bridge_tests;
mod gas_tests;
mod wsgi_tests;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde_json::{json, Value as Json};

use crate::context::{Invocation, Message, ScriptRecord};
use crate::host::{HostError, HostResult, HostRpc};
use crate::sandbox::{InvocationResult, Sandbox, SandboxConfig};

/// A host that records requests and charges gas against a limit.
#[derive(Default)]
pub(crate) struct RecordingHost {
    pub calls: RefCell<Vec<(String, Json)>>,
    pub consumed: Cell<u64>,
    /// Zero means unlimited.
    pub limit: Cell<u64>,
    /// Methods answered with an RPC error.
    pub failing: RefCell<Vec<&'static str>>,
}

impl RecordingHost {
    pub fn new() -> Rc<Self> {
        Rc::new(RecordingHost::default())
    }

    pub fn with_limit(limit: u64) -> Rc<Self> {
        let host = RecordingHost::new();
        host.limit.set(limit);
        host
    }

    pub fn fail(&self, method: &'static str) {
        self.failing.borrow_mut().push(method);
    }

    pub fn methods(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|(m, _)| m.clone()).collect()
    }

    /// Params of every request to `method`.
    pub fn params(&self, method: &str) -> Vec<Json> {
        self.calls
            .borrow()
            .iter()
            .filter(|(m, _)| m == method)
            .map(|(_, p)| p.clone())
            .collect()
    }

    fn report(&self) -> Json {
        json!({ "GasConsumed": self.consumed.get(), "GasLimit": self.limit.get() })
    }
}

impl HostRpc for RecordingHost {
    fn request(&self, method: &str, params: Json) -> HostResult {
        self.calls.borrow_mut().push((method.to_string(), params.clone()));
        if self.failing.borrow().iter().any(|m| *m == method) {
            return Err(HostError::Rpc(format!("{method} rejected")));
        }
        match method {
            "ConsumeGas" => {
                let amount = params["amount"].as_u64().unwrap_or_default();
                self.consumed.set(self.consumed.get() + amount);
                Ok(self.report())
            }
            "GasLimit" => Ok(self.report()),
            _ => Ok(json!({ "method": method, "params": params })),
        }
    }
}

pub(crate) fn script(code: &str) -> Invocation {
    Invocation::new(
        ScriptRecord {
            address: Some("dys1script".to_string()),
            code: code.to_string(),
        },
        Message {
            executor_address: Some("dys1caller".to_string()),
            ..Message::default()
        },
    )
}

pub(crate) fn call(code: &str, function: &str, args: &str, kwargs: &str) -> Invocation {
    let mut invocation = script(code);
    invocation.message.function_name = function.to_string();
    invocation.message.args = args.to_string();
    invocation.message.kwargs = kwargs.to_string();
    invocation
}

pub(crate) fn invoke_on(host: &Rc<RecordingHost>, invocation: &Invocation) -> InvocationResult {
    Sandbox::new(SandboxConfig::default()).invoke(invocation, Rc::clone(host) as Rc<dyn HostRpc>)
}

pub(crate) fn invoke(invocation: &Invocation) -> InvocationResult {
    invoke_on(&RecordingHost::new(), invocation)
}

/// Result of running `code` with no function call; panics on an
/// exception.
pub(crate) fn value(code: &str) -> Json {
    let result = invoke(&script(code));
    assert_eq!(result.exception, None, "{code:?} failed; stdout: {}", result.stdout);
    result.result
}

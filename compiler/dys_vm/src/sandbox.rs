//! One invocation of a script, from inputs to the result document.
//!
//! [`Sandbox::invoke`] builds a fresh session per call: the library
//! modules, a `dys` module bound to the host, a random source seeded from
//! the invocation and a capturing print handler. Every node visit goes
//! through the accountant, the coverage recorder and the gas meter, in
//! that order.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value as Json;

use dys_eval::builtins::safe_help;
use dys_eval::errors::value_error;
use dys_eval::{
    buffer_handler, Accountant, CallArgs, Covered, EvalError, Interpreter, InterpreterBuilder,
    ResourceLimits, ResourceState, Session, SharedCoverage, SharedPrintHandler, Value,
};

use crate::context::Invocation;
use crate::convert::{encode, json_to_value, sort_keys, value_to_json, EncodeOptions, Strictness};
use crate::gas::{GasMeter, MeteredTracker, SharedMeter};
use crate::host::HostRpc;
use crate::modules::{self, seeded, HostContext};

/// Tunables of a sandbox.
#[derive(Copy, Clone, Debug)]
pub struct SandboxConfig {
    pub limits: ResourceLimits,
    /// Characters of output kept, counted from the end.
    pub stdout_tail: usize,
    /// Gas charged per unit of accounted size.
    pub gas_multiplier: u64,
    /// Unconsumed size that forces a settlement before the next module
    /// boundary.
    pub settle_threshold: u64,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        SandboxConfig {
            limits: ResourceLimits::default(),
            stdout_tail: 10_000,
            gas_multiplier: 1,
            settle_threshold: 100_000,
        }
    }
}

/// Failures of the bridge itself, outside script evaluation.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("function not defined: {0}")]
    NotDefined(String),
    #[error("function not public: {0}")]
    NotPublic(String),
    #[error("args must be a list")]
    ArgsNotList,
    #[error("kwargs must be a dict")]
    KwargsNotDict,
    #[error("{what}: {source}")]
    Json {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Overflow(String),
}

impl BridgeError {
    /// Class name shown in the exception record.
    pub fn class(&self) -> &'static str {
        match self {
            BridgeError::Json { .. } => "JSONDecodeError",
            BridgeError::Overflow(_) => "OverflowError",
            _ => "Exception",
        }
    }
}

/// Why an invocation stopped.
#[derive(Debug)]
pub enum Failure {
    Eval(EvalError),
    Bridge(BridgeError),
}

impl From<EvalError> for Failure {
    fn from(err: EvalError) -> Self {
        Failure::Eval(err)
    }
}

impl From<BridgeError> for Failure {
    fn from(err: BridgeError) -> Self {
        Failure::Bridge(err)
    }
}

/// The `exception` field of a result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExceptionRecord {
    pub class: String,
    pub msg: String,
    pub lineno: u32,
    pub col_offset: u32,
    pub end_lineno: u32,
    pub end_col_offset: u32,
    /// Class of the underlying exception, `NoneType` when there is none.
    pub context: String,
}

impl ExceptionRecord {
    /// A record without a position.
    pub fn unlocated(class: impl Into<String>, msg: impl Into<String>) -> Self {
        ExceptionRecord {
            class: class.into(),
            msg: msg.into(),
            lineno: 0,
            col_offset: 0,
            end_lineno: 0,
            end_col_offset: 0,
            context: "NoneType".to_string(),
        }
    }

    /// Positioned errors are reported as `DysRuntimeError` wrapping the
    /// original exception.
    pub fn from_eval(err: &EvalError) -> Self {
        match err.span {
            Some(range) => ExceptionRecord {
                class: "DysRuntimeError".to_string(),
                msg: err.repr(),
                lineno: range.lineno,
                col_offset: range.col_offset,
                end_lineno: range.end_lineno,
                end_col_offset: range.end_col_offset,
                context: err.class_name().to_string(),
            },
            None => ExceptionRecord::unlocated(err.class_name().to_string(), err.message()),
        }
    }

    pub fn from_failure(failure: &Failure) -> Self {
        match failure {
            Failure::Eval(err) => ExceptionRecord::from_eval(err),
            Failure::Bridge(err) => ExceptionRecord::unlocated(err.class(), err.to_string()),
        }
    }
}

/// The result document of one invocation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InvocationResult {
    pub result: Json,
    pub stdout: String,
    pub exception: Option<ExceptionRecord>,
    pub nodes_called: u64,
    pub gas_limit: u64,
    pub gas_consumed: u64,
    pub cumsize: u64,
}

impl InvocationResult {
    pub fn is_success(&self) -> bool {
        self.exception.is_none()
    }

    /// The document with keys sorted at every level.
    pub fn to_json(&self) -> Result<Json, serde_json::Error> {
        Ok(sort_keys(&serde_json::to_value(self)?))
    }

    /// Compact, key-sorted JSON text with non-ASCII characters kept.
    pub fn render(&self) -> Result<String, EvalError> {
        let json = self.to_json().map_err(|err| value_error(err.to_string()))?;
        let options = EncodeOptions {
            indent: None,
            compact: true,
            ensure_ascii: false,
        };
        encode(&json, &options)
    }
}

/// What the `result` field will hold.
enum Outcome {
    Value(Value),
    Coverage(Json),
}

/// A prepared interpreter with its meter, coverage and output.
pub(crate) struct Run {
    pub(crate) interp: Interpreter<'static>,
    pub(crate) meter: SharedMeter,
    pub(crate) coverage: SharedCoverage,
    pub(crate) output: SharedPrintHandler,
}

impl Run {
    pub(crate) fn stdout(&self) -> String {
        self.output.get_output()
    }

    /// Final counters; `result`, `stdout` and `exception` are left empty.
    pub(crate) fn counters(&self) -> InvocationResult {
        let state = self.meter.state().borrow();
        InvocationResult {
            result: Json::Null,
            stdout: String::new(),
            exception: None,
            nodes_called: state.nodes_called,
            gas_limit: state.gas_limit,
            gas_consumed: state.gas_consumed.saturating_add(state.unconsumed_size),
            cumsize: state.cumulative_size,
        }
    }
}

/// Runs invocations under one configuration.
#[derive(Clone, Debug, Default)]
pub struct Sandbox {
    config: SandboxConfig,
}

impl Sandbox {
    pub fn new(config: SandboxConfig) -> Self {
        Sandbox { config }
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    /// Build the session and interpreter for `invocation`.
    pub(crate) fn prepare(
        &self,
        invocation: &Invocation,
        host: Rc<dyn HostRpc>,
    ) -> Result<Run, BridgeError> {
        let seed = invocation.seed().map_err(|source| BridgeError::Json {
            what: "invocation",
            source,
        })?;
        let state = Rc::new(RefCell::new(ResourceState {
            unconsumed_size: 1,
            ..ResourceState::default()
        }));
        let meter = Rc::new(GasMeter::new(
            Rc::clone(&state),
            host,
            self.config.gas_multiplier,
            self.config.settle_threshold,
        ));
        let coverage = SharedCoverage::default();

        let session = Session::new();
        session.set_builtin("help", safe_help());
        let context = Rc::new(HostContext {
            meter: Rc::clone(&meter),
            invocation: Rc::new(invocation.clone()),
        });
        modules::install(&session, &seeded(seed), &context);

        let limits = self.config.limits;
        let tracker = MeteredTracker::new(
            Covered::new(
                Accountant::new(limits, Rc::clone(&state)),
                Rc::clone(&coverage),
                state,
            ),
            Rc::clone(&meter),
        );
        let output = buffer_handler(self.config.stdout_tail);
        let interp = InterpreterBuilder::new()
            .session(session)
            .limits(limits)
            .tracker(tracker)
            .print_handler(Arc::clone(&output))
            .build();
        Ok(Run {
            interp,
            meter,
            coverage,
            output,
        })
    }

    /// Evaluate the invocation's source, call the requested function and
    /// report the outcome.
    ///
    /// Never fails: every error ends up in the `exception` field.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(function = %invocation.message.function_name)
    )]
    pub fn invoke(&self, invocation: &Invocation, host: Rc<dyn HostRpc>) -> InvocationResult {
        let mut run = match self.prepare(invocation, host) {
            Ok(run) => run,
            Err(err) => {
                return InvocationResult {
                    result: Json::Null,
                    stdout: String::new(),
                    exception: Some(ExceptionRecord::from_failure(&Failure::Bridge(err))),
                    nodes_called: 0,
                    gas_limit: 0,
                    gas_consumed: 0,
                    cumsize: 0,
                }
            }
        };
        let mut outcome = Outcome::Value(Value::None);
        let failure = execute(&mut run, invocation, &mut outcome).err();
        if let Some(failure) = &failure {
            tracing::debug!(?failure, "invocation failed");
        }

        let mut report = run.counters();
        report.stdout = run.stdout();
        report.exception = failure.as_ref().map(ExceptionRecord::from_failure);
        match outcome {
            Outcome::Coverage(json) => report.result = json,
            Outcome::Value(value) => match value_to_json(&value, Strictness::Lenient) {
                Ok(json) => report.result = json,
                Err(err) => {
                    report.exception = Some(ExceptionRecord::unlocated(
                        err.class_name().to_string(),
                        format!("Error in return value: {}", err.repr()),
                    ));
                }
            },
        }
        report
    }
}

fn execute(run: &mut Run, invocation: &Invocation, outcome: &mut Outcome) -> Result<(), Failure> {
    run.meter.settle()?;
    let value = run.interp.run_source(&invocation.source())?;
    *outcome = Outcome::Value(value);

    let name = invocation.message.function_name.as_str();
    if !name.is_empty() {
        resolve_public(&run.interp, name)?;
        let args = call_args(&invocation.message.args, &invocation.message.kwargs)?;
        let value = run.interp.call(name, args)?;
        *outcome = if name.starts_with("test_") {
            Outcome::Coverage(coverage_report(&run.coverage))
        } else {
            Outcome::Value(value)
        };
    }
    run.meter.settle()?;
    Ok(())
}

/// Check that `name` is defined and exported.
///
/// A module-level `__all__` lists the exports; without one every script
/// function or class not starting with `_` is exported, except `wsgi`.
fn resolve_public(interp: &Interpreter<'_>, name: &str) -> Result<(), BridgeError> {
    let value = interp
        .global(name)
        .ok_or_else(|| BridgeError::NotDefined(name.to_string()))?;
    let public = match interp.global("__all__") {
        Some(Value::List(items)) => items.borrow().iter().any(|v| v.as_str() == Some(name)),
        Some(Value::Tuple(items)) => items.iter().any(|v| v.as_str() == Some(name)),
        _ => {
            matches!(value, Value::Function(_) | Value::Class(_))
                && !name.starts_with('_')
                && name != "wsgi"
        }
    };
    if public {
        Ok(())
    } else {
        Err(BridgeError::NotPublic(name.to_string()))
    }
}

fn decode_or(text: &str, empty: &'static str, what: &'static str) -> Result<Json, BridgeError> {
    let text = if text.is_empty() { empty } else { text };
    serde_json::from_str(text).map_err(|source| BridgeError::Json { what, source })
}

/// Decode the JSON `args` and `kwargs` of a message; empty text means no
/// arguments.
pub fn call_args(args: &str, kwargs: &str) -> Result<CallArgs, BridgeError> {
    let Json::Array(positional) = decode_or(args, "[]", "args")? else {
        return Err(BridgeError::ArgsNotList);
    };
    let Json::Object(keywords) = decode_or(kwargs, "{}", "kwargs")? else {
        return Err(BridgeError::KwargsNotDict);
    };
    let overflow = |err: EvalError| BridgeError::Overflow(err.message());
    let positional = positional.iter().map(json_to_value).collect::<Result<Vec<_>, _>>();
    let mut call = CallArgs::new(positional.map_err(overflow)?);
    call.keywords = keywords
        .iter()
        .map(|(k, v)| Ok((Arc::from(k.as_str()), json_to_value(v).map_err(overflow)?)))
        .collect::<Result<_, BridgeError>>()?;
    Ok(call)
}

/// `[[lineno, col_offset, end_lineno, end_col_offset, kind], [calls, cumsize]]`
/// for every registered node, outermost first.
pub fn coverage_report(coverage: &SharedCoverage) -> Json {
    let rows = coverage
        .borrow()
        .entries()
        .into_iter()
        .map(|entry| {
            let r = entry.range;
            serde_json::json!([
                [r.lineno, r.col_offset, r.end_lineno, r.end_col_offset, entry.kind],
                [entry.counts.calls, entry.counts.cumulative_size],
            ])
        })
        .collect();
    Json::Array(rows)
}

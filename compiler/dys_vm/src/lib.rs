//! Dys VM - the gas-metered sandbox that runs Dys scripts for a ledger.
//!
//! An invocation arrives as four JSON documents (the message, the script
//! record, the attached message results and the block header) plus a
//! handle to the host. [`Sandbox::invoke`] evaluates the script with
//! [`dys_eval`], optionally calls one of its public functions, and returns
//! the result document the node stores.
//!
//! # Modules
//!
//! - [`context`]: invocation documents and the random seed derived from them
//! - [`host`]: the [`HostRpc`] surface and its offline and JSON-RPC hosts
//! - [`gas`]: settlement of accounted size into gas
//! - [`modules`]: the importable library and the `dys` host module
//! - [`convert`]: JSON to script values and back
//! - [`sandbox`]: invocation driver and result document
//! - [`http`]: serving a request through the script's `wsgi` callable

use std::sync::Once;

pub mod commands;
pub mod context;
pub mod convert;
pub mod gas;
pub mod host;
pub mod http;
pub mod modules;
pub mod sandbox;

pub use context::{BlockInfo, Invocation, Message, ScriptRecord};
pub use gas::{GasMeter, MeteredTracker, SharedMeter};
pub use host::{GasReport, HostError, HostResult, HostRpc, JsonRpcHost, OfflineHost};
pub use http::{HttpRequest, HttpResponse};
pub use sandbox::{
    BridgeError, ExceptionRecord, Failure, InvocationResult, Sandbox, SandboxConfig,
};

static TRACING_INIT: Once = Once::new();

/// Install the stderr log subscriber.
///
/// Filtered by `DYS_LOG` (same syntax as `RUST_LOG`), `warn` when unset.
/// Safe to call more than once.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        let filter = EnvFilter::try_from_env("DYS_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_level(true),
            )
            .with(filter)
            .init();
    });
}

#[cfg(test)]
mod tests;

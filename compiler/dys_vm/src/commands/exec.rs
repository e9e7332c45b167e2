//! `dysvm exec`: run one invocation and print its result document.

use std::io::Write;
use std::rc::Rc;

use serde_json::Value as Json;

use super::CommandError;
use crate::context::Invocation;
use crate::host::HostRpc;
use crate::sandbox::{ExceptionRecord, Sandbox};

/// Write the compact result document to `out`; returns whether the
/// invocation finished without an exception.
pub fn exec(
    sandbox: &Sandbox,
    invocation: &Invocation,
    host: Rc<dyn HostRpc>,
    out: &mut impl Write,
) -> Result<bool, CommandError> {
    let mut result = sandbox.invoke(invocation, host);
    let text = match result.render() {
        Ok(text) => text,
        Err(err) => {
            tracing::warn!(%err, "result document did not render");
            result.result = Json::Null;
            result.exception = Some(ExceptionRecord::unlocated(
                "Exception",
                format!("Error in return value: {}", err.repr()),
            ));
            result
                .render()
                .map_err(|err| CommandError::Render(err.message()))?
        }
    };
    // No trailing newline: the node reads stdout to the end.
    out.write_all(text.as_bytes())?;
    out.flush()?;
    Ok(result.is_success())
}

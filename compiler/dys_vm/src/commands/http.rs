//! `dysvm http`: answer one raw HTTP request with the script's `wsgi`
//! application.

use std::io::Write;
use std::rc::Rc;

use super::CommandError;
use crate::context::Invocation;
use crate::host::HostRpc;
use crate::sandbox::Sandbox;

pub fn serve(
    sandbox: &Sandbox,
    invocation: &Invocation,
    host: Rc<dyn HostRpc>,
    request: &str,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    let response = sandbox.serve(invocation, host, request);
    tracing::debug!(status = %response.status, "http response");
    out.write_all(&response.encode())?;
    out.flush()?;
    Ok(())
}

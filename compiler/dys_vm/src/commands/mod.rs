//! Command handlers for the `dysvm` binary.
//!
//! Both commands take the invocation as JSON documents on the command
//! line and write their answer to stdout; logs go to stderr.

use std::rc::Rc;

use serde::de::DeserializeOwned;

use crate::context::{BlockInfo, Invocation, Message, ScriptRecord};
use crate::host::{HostError, HostRpc, JsonRpcHost, OfflineHost};

mod exec;
mod http;

pub use exec::exec;
pub use http::serve;

/// Failure of a command before or after the sandbox ran.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("invalid {what} document: {source}")]
    Document {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to render the result: {0}")]
    Render(String),
    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to set up the host client: {0}")]
    Host(#[from] HostError),
}

/// Port 0 means no chain is listening.
pub fn host_for(port: u16) -> Result<Rc<dyn HostRpc>, CommandError> {
    if port == 0 {
        Ok(Rc::new(OfflineHost))
    } else {
        Ok(Rc::new(JsonRpcHost::new(port)?))
    }
}

/// Decode one document; `null` and empty text give the default.
fn document<T: DeserializeOwned + Default>(text: &str, what: &'static str) -> Result<T, CommandError> {
    if text.trim().is_empty() {
        return Ok(T::default());
    }
    let value: Option<T> =
        serde_json::from_str(text).map_err(|source| CommandError::Document { what, source })?;
    Ok(value.unwrap_or_default())
}

/// Assemble an invocation from its command-line documents.
pub fn invocation(msg: &str, script: &str, attached: &str, block: &str) -> Result<Invocation, CommandError> {
    let message: Message = document(msg, "message")?;
    let script: ScriptRecord = document(script, "script")?;
    let results: Vec<serde_json::Value> = document(attached, "attached results")?;
    let block: BlockInfo = document(block, "block info")?;
    Ok(Invocation::new(script, message)
        .with_attached_results(results)
        .with_block_info(block))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "test assertions use unwrap for clarity")]

    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn null_and_empty_documents_default() {
        let inv = invocation("null", r#"{"code": "1"}"#, "", "{}").unwrap();
        assert_eq!(inv.message, Message::default());
        assert_eq!(inv.script.code, "1");
        assert!(inv.attached_msg_results.is_empty());
    }

    #[test]
    fn malformed_document_names_itself() {
        let err = invocation("{}", "{", "[]", "{}").unwrap_err();
        assert!(err.to_string().starts_with("invalid script document"), "{err}");
    }
}

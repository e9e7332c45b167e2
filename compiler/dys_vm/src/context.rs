//! Invocation inputs: the message, the script record, the results of the
//! attached messages and the block header.
//!
//! Every document deserializes from the JSON the node sends; missing fields
//! take their defaults.

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use sha3::{Digest, Sha3_256};

/// The call being made against a script.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Message {
    pub executor_address: Option<String>,
    /// Script function to invoke after the module ran; empty for none.
    pub function_name: String,
    /// JSON text of the positional arguments; empty means `[]`.
    pub args: String,
    /// JSON text of the keyword arguments; empty means `{}`.
    pub kwargs: String,
    /// Source appended to the script before evaluation.
    pub extra_code: String,
    pub attached_messages: Vec<Json>,
}

/// A stored script.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptRecord {
    pub address: Option<String>,
    pub code: String,
}

/// Header fields of the block being processed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockInfo {
    #[serde(rename = "Height")]
    pub height: Json,
    #[serde(rename = "Hash")]
    pub hash: Json,
    #[serde(rename = "Time")]
    pub time: Json,
    #[serde(rename = "AppHash")]
    pub app_hash: Json,
    #[serde(rename = "ChainID")]
    pub chain_id: Json,
}

/// Everything one invocation is computed from.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Invocation {
    pub message: Message,
    pub script: ScriptRecord,
    pub attached_msg_results: Vec<Json>,
    pub block_info: BlockInfo,
}

impl Invocation {
    pub fn new(script: ScriptRecord, message: Message) -> Self {
        Invocation {
            message,
            script,
            ..Invocation::default()
        }
    }

    #[must_use]
    pub fn with_block_info(mut self, block_info: BlockInfo) -> Self {
        self.block_info = block_info;
        self
    }

    #[must_use]
    pub fn with_attached_results(mut self, results: Vec<Json>) -> Self {
        self.attached_msg_results = results;
        self
    }

    /// Source evaluated for this invocation.
    pub fn source(&self) -> String {
        format!("{}\n{}", self.script.code, self.message.extra_code)
    }

    /// Seed of the random source: SHA3-256 over the block header, the
    /// message, the script and the attached results, in that order.
    pub fn seed(&self) -> Result<[u8; 32], serde_json::Error> {
        let mut hasher = Sha3_256::new();
        hasher.update(serde_json::to_vec(&self.block_info)?);
        hasher.update(serde_json::to_vec(&self.message)?);
        hasher.update(serde_json::to_vec(&self.script)?);
        hasher.update(serde_json::to_vec(&self.attached_msg_results)?);
        Ok(hasher.finalize().into())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "test assertions use unwrap for clarity")]

    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn block_info_uses_header_field_names() {
        let info: BlockInfo = serde_json::from_value(json!({
            "Height": 7,
            "ChainID": "dys-1",
        }))
        .unwrap();
        assert_eq!(info.height, json!(7));
        assert_eq!(info.chain_id, json!("dys-1"));
        assert_eq!(info.hash, Json::Null);
    }

    #[test]
    fn missing_message_fields_default() {
        let msg: Message = serde_json::from_value(json!({ "function_name": "f" })).unwrap();
        assert_eq!(msg.function_name, "f");
        assert_eq!(msg.args, "");
        assert!(msg.attached_messages.is_empty());
    }

    #[test]
    fn seed_depends_on_every_input() {
        let base = Invocation::new(
            ScriptRecord { address: Some("dys1abc".into()), code: "x = 1".into() },
            Message::default(),
        );
        let mut other = base.clone();
        other.attached_msg_results.push(json!({ "ok": true }));
        assert_eq!(base.seed().unwrap(), base.clone().seed().unwrap());
        assert_ne!(base.seed().unwrap(), other.seed().unwrap());
    }

    #[test]
    fn extra_code_follows_the_script() {
        let mut invocation = Invocation::default();
        invocation.script.code = "a = 1".into();
        invocation.message.extra_code = "a".into();
        assert_eq!(invocation.source(), "a = 1\na");
    }
}

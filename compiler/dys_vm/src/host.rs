//! The ledger side of an invocation.
//!
//! Scripts reach the chain through [`HostRpc`]: queries, messages, events
//! and gas bookkeeping all go through one `request(method, params)` call.
//! [`OfflineHost`] answers everything with an empty result; [`JsonRpcHost`]
//! speaks JSON-RPC 2.0 to the node's `RpcService` over HTTP.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value as Json};

/// Failure of one host request.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// The node answered with an error; the text is shown to the script.
    #[error("{0}")]
    Rpc(String),
    #[error("host transport failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("malformed host response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("host protocol error: {0}")]
    Protocol(String),
}

pub type HostResult = Result<Json, HostError>;

/// Gas counters as reported by `ConsumeGas` and `GasLimit`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct GasReport {
    #[serde(rename = "GasConsumed", default)]
    pub gas_consumed: u64,
    #[serde(rename = "GasLimit", default)]
    pub gas_limit: u64,
}

impl GasReport {
    /// Read the counters out of a host result; missing fields are zero.
    pub fn from_result(result: &Json) -> Result<Self, HostError> {
        if result.is_null() {
            return Ok(GasReport::default());
        }
        Ok(GasReport::deserialize(result)?)
    }
}

/// Ledger operations available to a running script.
pub trait HostRpc {
    /// Send `RpcService.<method>` with one parameter object.
    fn request(&self, method: &str, params: Json) -> HostResult;

    fn query(&self, json_query: &str, query_height: Option<i64>) -> HostResult {
        self.request(
            "Query",
            json!({ "json_query": json_query, "query_height": query_height }),
        )
    }

    fn msg(&self, json_msg: &str) -> HostResult {
        self.request("Msg", json!({ "json_msg": json_msg }))
    }

    fn emit_event(&self, key: &str, value: &str) -> HostResult {
        self.request("EmitEvent", json!({ "key": key, "value": value }))
    }

    fn consume_gas(&self, amount: u64) -> HostResult {
        self.request("ConsumeGas", json!({ "amount": amount }))
    }

    fn gas_limit(&self) -> HostResult {
        self.request("GasLimit", json!({}))
    }
}

/// A host with no chain behind it (port 0).
#[derive(Clone, Copy, Debug, Default)]
pub struct OfflineHost;

impl HostRpc for OfflineHost {
    fn request(&self, method: &str, params: Json) -> HostResult {
        tracing::debug!(method, %params, "offline host request");
        Ok(Json::Object(Map::new()))
    }
}

/// JSON-RPC over HTTP to `http://localhost:<port>/rpc`.
#[derive(Clone, Debug)]
pub struct JsonRpcHost {
    client: Client,
    url: String,
}

impl JsonRpcHost {
    /// A host on the local node, without a request timeout.
    pub fn new(port: u16) -> Result<Self, HostError> {
        JsonRpcHost::with_url(format!("http://localhost:{port}/rpc"), None)
    }

    pub fn with_url(url: impl Into<String>, timeout: Option<Duration>) -> Result<Self, HostError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(JsonRpcHost {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl HostRpc for JsonRpcHost {
    #[tracing::instrument(level = "debug", skip(self, params), fields(url = %self.url))]
    fn request(&self, method: &str, params: Json) -> HostResult {
        let payload = json!({
            "method": format!("RpcService.{method}"),
            "params": [params],
            "jsonrpc": "2.0",
            "id": 0,
        });
        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()?
            .error_for_status()
            .inspect_err(|err| tracing::warn!(method, %err, "host answered with an HTTP error"))?;
        let body = response.bytes()?;
        let reply: Json = match serde_json::from_slice(&body) {
            Ok(reply) => reply,
            Err(_) => {
                let text = String::from_utf8_lossy(&body).into_owned();
                tracing::warn!(method, "host answered with non-JSON body");
                return Err(HostError::Rpc(text));
            }
        };
        unpack_reply(reply)
    }
}

/// Split a JSON-RPC reply into its result or its error.
///
/// Results that are themselves JSON text are decoded once more.
pub fn unpack_reply(reply: Json) -> HostResult {
    let Json::Object(mut reply) = reply else {
        return Err(HostError::Protocol("reply is not an object".to_string()));
    };
    match reply.remove("error") {
        None | Some(Json::Null | Json::Bool(false)) => {}
        Some(Json::String(s)) if s.is_empty() => {}
        Some(Json::String(s)) => return Err(HostError::Rpc(s)),
        Some(other) => return Err(HostError::Rpc(other.to_string())),
    }
    Ok(match reply.remove("result") {
        Some(Json::String(text)) => serde_json::from_str(&text).unwrap_or(Json::String(text)),
        Some(result) => result,
        None => Json::Null,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "test assertions use unwrap for clarity")]

    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn string_results_are_decoded_again() {
        let reply = json!({ "result": "{\"GasLimit\": 5}", "error": null, "id": 0 });
        assert_eq!(unpack_reply(reply).unwrap(), json!({ "GasLimit": 5 }));
    }

    #[test]
    fn plain_string_results_stay_strings() {
        let reply = json!({ "result": "not json", "error": "" });
        assert_eq!(unpack_reply(reply).unwrap(), json!("not json"));
    }

    #[test]
    fn errors_win_over_results() {
        let reply = json!({ "result": {}, "error": "insufficient funds" });
        let err = unpack_reply(reply).unwrap_err();
        assert_eq!(err.to_string(), "insufficient funds");
    }

    #[test]
    fn gas_report_defaults_missing_fields() {
        let report = GasReport::from_result(&json!({ "GasConsumed": 12 })).unwrap();
        assert_eq!(report, GasReport { gas_consumed: 12, gas_limit: 0 });
        assert_eq!(GasReport::from_result(&json!({})).unwrap(), GasReport::default());
    }

    /// Serve one canned HTTP response on a local port and hand back the
    /// request body the client sent.
    fn serve_once(status: &'static str, body: &'static str) -> (String, std::thread::JoinHandle<String>) {
        use std::io::{BufRead, BufReader, Read, Write};

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/rpc", listener.local_addr().unwrap());
        let handle = std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut length = 0;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if line == "\r\n" {
                    break;
                }
                if let Some((name, value)) = line.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        length = value.trim().parse().unwrap();
                    }
                }
            }
            let mut request = vec![0; length];
            reader.read_exact(&mut request).unwrap();
            let mut stream = stream;
            write!(
                stream,
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            )
            .unwrap();
            String::from_utf8(request).unwrap()
        });
        (url, handle)
    }

    #[test]
    fn rpc_requests_name_the_service_method() {
        let (url, server) = serve_once("200 OK", r#"{"result": "{\"GasLimit\": 7}", "error": null, "id": 0}"#);
        let host = JsonRpcHost::with_url(url, Some(Duration::from_secs(5))).unwrap();
        assert_eq!(host.gas_limit().unwrap(), json!({ "GasLimit": 7 }));

        let sent: Json = serde_json::from_str(&server.join().unwrap()).unwrap();
        assert_eq!(sent["method"], json!("RpcService.GasLimit"));
        assert_eq!(sent["params"], json!([{}]));
    }

    #[test]
    fn http_error_status_is_a_transport_failure() {
        let (url, server) = serve_once("500 Internal Server Error", r#"{"result": {"GasLimit": 7}, "error": null}"#);
        let host = JsonRpcHost::with_url(url, Some(Duration::from_secs(5))).unwrap();
        let err = host.gas_limit().unwrap_err();
        assert!(matches!(err, HostError::Transport(_)), "{err}");
        server.join().unwrap();
    }

    #[test]
    fn offline_host_answers_with_an_empty_object() {
        assert_eq!(OfflineHost.gas_limit().unwrap(), json!({}));
    }
}

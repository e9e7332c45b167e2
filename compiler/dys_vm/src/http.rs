//! Serving one HTTP request from a script's `wsgi` callable.
//!
//! The raw request text is parsed into a WSGI `environ` dict. The script
//! runs as in [`Sandbox::invoke`] without a function call; its `wsgi`
//! global is then called with `(environ, start_response)` and the returned
//! chunks become the response body.

use std::cell::RefCell;
use std::fmt::Write as _;
use std::rc::Rc;

use dys_eval::errors::{type_error, value_error};
use dys_eval::value::NativeFunction;
use dys_eval::{iter, native, CallArgs, Dict, EvalResult, Interpreter, ModuleBuilder, NativeId, Value};

use crate::context::Invocation;
use crate::host::HostRpc;
use crate::sandbox::{BridgeError, ExceptionRecord, Failure, Run, Sandbox};

/// Longest accepted request line, as `wsgiref` enforces.
const MAX_REQUEST_LINE: usize = 65_536;

/// A parsed HTTP/1.x request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: String,
    pub path: String,
    pub query: String,
    pub version: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpRequest {
    pub fn parse(raw: &str) -> Result<Self, BridgeError> {
        let (head, body) = match raw.find("\r\n\r\n") {
            Some(end) => (&raw[..end], &raw[end + 4..]),
            None => match raw.find("\n\n") {
                Some(end) => (&raw[..end], &raw[end + 2..]),
                None => (raw, ""),
            },
        };
        let mut lines = head.lines();
        let request_line = lines.next().unwrap_or_default().trim_end();
        if request_line.len() > MAX_REQUEST_LINE {
            return Err(BridgeError::BadRequest("Request-URI Too Long".to_string()));
        }
        let mut parts = request_line.split_whitespace();
        let (Some(method), Some(target)) = (parts.next(), parts.next()) else {
            return Err(BridgeError::BadRequest(format!(
                "Bad request syntax ({request_line:?})"
            )));
        };
        let version = parts.next().unwrap_or("HTTP/0.9").to_string();
        if !version.starts_with("HTTP/") {
            return Err(BridgeError::BadRequest(format!(
                "Bad request version ({version:?})"
            )));
        }
        let (path, query) = target.split_once('?').unwrap_or((target, ""));

        let mut headers = Vec::new();
        for line in lines {
            let Some((name, value)) = line.split_once(':') else {
                return Err(BridgeError::BadRequest(format!("Bad header line ({line:?})")));
            };
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }
        Ok(HttpRequest {
            method: method.to_string(),
            path: percent_decode(path),
            query: query.to_string(),
            version,
            headers,
            body: body.as_bytes().to_vec(),
        })
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The WSGI environ for this request.
    pub fn environ(&self) -> Dict {
        let mut env = Dict::new();
        env.insert_str("REQUEST_METHOD", Value::str(&self.method));
        env.insert_str("SCRIPT_NAME", Value::str(""));
        env.insert_str("PATH_INFO", Value::str(&self.path));
        env.insert_str("QUERY_STRING", Value::str(&self.query));
        env.insert_str("SERVER_PROTOCOL", Value::str(&self.version));
        env.insert_str("SERVER_NAME", Value::str("dysonprotocol"));
        env.insert_str("SERVER_PORT", Value::str(""));
        env.insert_str("REMOTE_ADDR", Value::str("0.0.0.0"));
        env.insert_str(
            "CONTENT_TYPE",
            Value::str(self.header("Content-Type").unwrap_or("text/plain")),
        );
        if let Some(length) = self.header("Content-Length") {
            env.insert_str("CONTENT_LENGTH", Value::str(length));
        }
        for (name, value) in &self.headers {
            let key = name.to_ascii_uppercase().replace('-', "_");
            if key == "CONTENT_TYPE" || key == "CONTENT_LENGTH" {
                continue;
            }
            env.insert_str(&format!("HTTP_{key}"), Value::str(value));
        }
        env.insert_str("wsgi.version", Value::tuple(vec![Value::Int(1), Value::Int(0)]));
        env.insert_str("wsgi.url_scheme", Value::str("http"));
        env.insert_str("wsgi.multithread", Value::Bool(false));
        env.insert_str("wsgi.multiprocess", Value::Bool(false));
        env.insert_str("wsgi.run_once", Value::Bool(true));
        env
    }
}

fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let escaped = match bytes.get(i + 1..i + 3) {
            Some(&[hi, lo]) if bytes[i] == b'%' => hex_value(hi).zip(hex_value(lo)),
            _ => None,
        };
        match escaped {
            Some((hi, lo)) => {
                out.push(hi << 4 | lo);
                i += 3;
            }
            None => {
                out.push(bytes[i]);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(b: u8) -> Option<u8> {
    char::from(b).to_digit(16).and_then(|d| u8::try_from(d).ok())
}

/// The response sent back for one request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    /// Code and reason, e.g. `200 OK`.
    pub status: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn text(status: &str, body: String) -> Self {
        HttpResponse {
            status: status.to_string(),
            headers: vec![("Content-Type".to_string(), "text/plain".to_string())],
            body: body.into_bytes(),
        }
    }

    /// `HTTP/1.1 <status>\r\n<headers>\r\n\r\n<body>`.
    pub fn encode(&self) -> Vec<u8> {
        let mut head = format!("HTTP/1.1 {}", self.status);
        for (name, value) in &self.headers {
            let _ = write!(head, "\r\n{name}: {value}");
        }
        head.push_str("\r\n\r\n");
        let mut out = head.into_bytes();
        out.extend_from_slice(&self.body);
        out
    }
}

type Started = Rc<RefCell<Option<(String, Vec<(String, String)>)>>>;

fn str_arg(value: &Value, what: &str) -> EvalResult<String> {
    match value {
        Value::Str(s) => Ok(s.to_string()),
        other => Err(type_error(format!(
            "{what} must be a str, not {}",
            other.type_name()
        ))),
    }
}

/// `start_response(status, headers, exc_info=None)`.
fn start_response(started: &Started) -> Value {
    let started = Rc::clone(started);
    let func = native(move |_, args| {
        args.arity("start_response", 2, 3)?;
        let status = str_arg(&args.arg(0), "status")?;
        let items = match args.arg(1) {
            Value::List(items) => items.borrow().clone(),
            Value::Tuple(items) => items.to_vec(),
            other => {
                return Err(type_error(format!(
                    "headers must be a list, not {}",
                    other.type_name()
                )))
            }
        };
        let mut headers = Vec::with_capacity(items.len());
        for item in items {
            let Value::Tuple(pair) = item else {
                return Err(type_error("headers must be (name, value) tuples"));
            };
            let [name, value] = &pair[..] else {
                return Err(value_error("headers must be (name, value) tuples"));
            };
            headers.push((str_arg(name, "header name")?, str_arg(value, "header value")?));
        }
        *started.borrow_mut() = Some((status, headers));
        Ok(Value::None)
    });
    Value::Native(Rc::new(NativeFunction::new(
        NativeId::new("wsgi", "start_response"),
        Some("Begin the HTTP response."),
        func,
    )))
}

/// A file-like `wsgi.input` over the request body.
fn request_input(run: &Run, body: Vec<u8>) -> Value {
    let body = Rc::new(body);
    let position = Rc::new(RefCell::new(0_usize));
    let read = native(move |_, args: CallArgs| {
        args.arity("read", 0, 1)?;
        let mut pos = position.borrow_mut();
        let remaining = body.len() - *pos;
        let n = match args.get(0) {
            None | Some(Value::None) => remaining,
            Some(Value::Int(n)) if *n < 0 => remaining,
            Some(Value::Int(n)) => usize::try_from(*n).map_or(remaining, |n| n.min(remaining)),
            Some(other) => {
                return Err(type_error(format!(
                    "argument should be integer or None, not '{}'",
                    other.type_name()
                )))
            }
        };
        let chunk = Value::bytes(&body[*pos..*pos + n]);
        *pos += n;
        Ok(chunk)
    });
    let session = run.interp.session();
    let module = ModuleBuilder::new("wsgi.input", Some("The request body."))
        .function("read", Some("Read at most size bytes of the body."), read)
        .build(session.interner());
    session.adopt(module)
}

/// Join the chunks returned by the application into the body.
fn collect_body(interp: &Interpreter<'_>, chunks: &Value) -> EvalResult<Vec<u8>> {
    let mut body = Vec::new();
    for chunk in iter::collect(chunks, interp.limits())? {
        match chunk {
            Value::Bytes(b) => body.extend_from_slice(&b),
            Value::Str(s) => body.extend_from_slice(s.as_bytes()),
            other => {
                return Err(type_error(format!(
                    "response chunks must be bytes, not {}",
                    other.type_name()
                )))
            }
        }
    }
    Ok(body)
}

fn respond(run: &mut Run, invocation: &Invocation, raw_request: &str) -> Result<HttpResponse, Failure> {
    run.meter.settle()?;
    run.interp.run_source(&invocation.script.code)?;
    if run.interp.global("wsgi").is_none() {
        run.meter.settle()?;
        return Ok(HttpResponse::text(
            "404 Not Found",
            format!(
                "Oops! No WSGI Application defined on this DysonProtocol script.\nLogs:\n{}",
                run.stdout()
            ),
        ));
    }
    let request = HttpRequest::parse(raw_request)?;
    let mut environ = request.environ();
    environ.insert_str("wsgi.input", request_input(run, request.body.clone()));

    let started: Started = Rc::default();
    let start = start_response(&started);
    if let Value::Native(f) = &start {
        run.interp.session().capabilities().insert(f.capability());
    }
    let chunks = run
        .interp
        .call("wsgi", CallArgs::new(vec![Value::dict(environ), start]))?;
    let body = collect_body(&run.interp, &chunks)?;
    run.meter.settle()?;

    let Some((status, headers)) = started.borrow_mut().take() else {
        return Err(Failure::Eval(value_error("wsgi application did not call start_response")));
    };
    tracing::debug!(%status, len = body.len(), "wsgi response");
    Ok(HttpResponse {
        status,
        headers,
        body,
    })
}

impl Sandbox {
    /// Answer `raw_request` with the script's `wsgi` application.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn serve(&self, invocation: &Invocation, host: Rc<dyn HostRpc>, raw_request: &str) -> HttpResponse {
        let mut run = match self.prepare(invocation, host) {
            Ok(run) => run,
            Err(err) => return HttpResponse::text("500 Internal Server Error", format!("Exc: {err}\nLogs:\n")),
        };
        match respond(&mut run, invocation, raw_request) {
            Ok(response) => response,
            Err(Failure::Bridge(err @ BridgeError::BadRequest(_))) => {
                HttpResponse::text("400 Bad Request", format!("Exc: {err}\nLogs:\n{}", run.stdout()))
            }
            Err(failure) => {
                let record = ExceptionRecord::from_failure(&failure);
                HttpResponse::text(
                    "500 Internal Server Error",
                    format!(
                        "Exc: {}: {} on line: {} col: {}\nLogs:\n{}",
                        record.class,
                        record.msg,
                        record.lineno,
                        record.col_offset,
                        run.stdout()
                    ),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "test assertions use unwrap for clarity")]

    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_request_line_headers_and_body() {
        let raw = "POST /greet%20me?name=bob HTTP/1.1\r\nHost: x.localhost\r\nContent-Length: 4\r\n\r\nabcd";
        let request = HttpRequest::parse(raw).unwrap();
        assert_eq!(request.method, "POST");
        assert_eq!(request.path, "/greet me");
        assert_eq!(request.query, "name=bob");
        assert_eq!(request.header("host"), Some("x.localhost"));
        assert_eq!(request.body, b"abcd");
    }

    #[test]
    fn rejects_a_bad_request_line() {
        assert!(matches!(HttpRequest::parse("garbage\r\n\r\n"), Err(BridgeError::BadRequest(_))));
    }

    #[test]
    fn environ_maps_headers_to_cgi_names() {
        let request = HttpRequest::parse("GET / HTTP/1.1\r\nX-Api-Key: k\r\nContent-Type: text/html\r\n\r\n").unwrap();
        let env = request.environ();
        assert_eq!(env.get_str("HTTP_X_API_KEY").and_then(|v| v.as_str().map(str::to_string)), Some("k".to_string()));
        assert_eq!(env.get_str("CONTENT_TYPE").and_then(|v| v.as_str().map(str::to_string)), Some("text/html".to_string()));
        assert!(env.get_str("HTTP_CONTENT_TYPE").is_none());
    }

    #[test]
    fn encodes_status_headers_and_body() {
        let response = HttpResponse::text("200 OK", "hi".to_string());
        assert_eq!(
            String::from_utf8(response.encode()).unwrap(),
            "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\n\r\nhi"
        );
    }
}

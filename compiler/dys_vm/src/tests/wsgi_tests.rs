//! Serving HTTP requests through a script's `wsgi` application.

use std::rc::Rc;

use pretty_assertions::assert_eq;

use super::{script, RecordingHost};
use crate::host::HostRpc;
use crate::sandbox::{Sandbox, SandboxConfig};

const APP: &str = r#"
def wsgi(environ, start_response):
    name = 'world'
    query = environ.get('QUERY_STRING', '')
    if query.startswith('name='):
        name = query[5:]
    if environ['REQUEST_METHOD'] == 'POST':
        length = int(environ.get('CONTENT_LENGTH', 0))
        name = environ['wsgi.input'].read(length).decode('utf-8')
    print('serving', name)
    body = 'hi ' + name
    start_response('200 OK', [('Content-Type', 'text/plain'), ('Content-Length', str(len(body)))])
    return [body.encode('utf-8')]
"#;

fn serve(code: &str, request: &str) -> (String, Rc<RecordingHost>) {
    let host = RecordingHost::new();
    let response = Sandbox::new(SandboxConfig::default()).serve(
        &script(code),
        Rc::clone(&host) as Rc<dyn HostRpc>,
        request,
    );
    (String::from_utf8(response.encode()).unwrap(), host)
}

#[test]
fn get_with_query_string() {
    let (response, host) = serve(APP, "GET /?name=ada HTTP/1.1\r\nHost: dys1script.localhost\r\n\r\n");
    assert_eq!(
        response,
        "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 6\r\n\r\nhi ada"
    );
    assert_eq!(host.methods().first().map(String::as_str), Some("ConsumeGas"));
}

#[test]
fn post_body_is_readable() {
    let request = "POST / HTTP/1.1\r\nContent-Type: text/plain\r\nContent-Length: 3\r\n\r\nbob";
    let (response, _) = serve(APP, request);
    assert!(response.ends_with("\r\n\r\nhi bob"), "{response}");
}

#[test]
fn script_without_wsgi_is_not_found() {
    let (response, _) = serve("print('loaded')\n", "GET / HTTP/1.1\r\n\r\n");
    assert_eq!(
        response,
        "HTTP/1.1 404 Not Found\r\nContent-Type: text/plain\r\n\r\n\
         Oops! No WSGI Application defined on this DysonProtocol script.\nLogs:\nloaded\n"
    );
}

#[test]
fn application_errors_are_server_errors() {
    let code = "def wsgi(environ, start_response):\n    print('about to fail')\n    return 1 / 0\n";
    let (response, _) = serve(code, "GET / HTTP/1.1\r\n\r\n");
    assert!(response.starts_with("HTTP/1.1 500 Internal Server Error\r\n"), "{response}");
    assert!(response.contains("ZeroDivisionError('division by zero') on line: 3"), "{response}");
    assert!(response.ends_with("Logs:\nabout to fail\n"), "{response}");
}

#[test]
fn missing_start_response_is_a_server_error() {
    let code = "def wsgi(environ, start_response):\n    return [b'x']\n";
    let (response, _) = serve(code, "GET / HTTP/1.1\r\n\r\n");
    assert!(response.contains("did not call start_response"), "{response}");
}

#[test]
fn malformed_requests_are_rejected() {
    let (response, _) = serve(APP, "nonsense\r\n\r\n");
    assert!(response.starts_with("HTTP/1.1 400 Bad Request\r\n"), "{response}");
}

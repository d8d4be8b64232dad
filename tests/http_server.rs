use daap_mcp::mcp::registry::Registry;
use daap_mcp::mcp::tools::{ParamKind, ParameterSpec, ToolDescriptor};
use daap_mcp::transit::http::Server;
use serde_json::{Value, json};
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpStream;
use std::sync::Arc;

fn server() -> Server {
    let mut registry = Registry::new("http-test", "0");
    registry.register(ToolDescriptor::spawned(
        "shout",
        "Upper-cases text",
        vec![ParameterSpec::new("text", ParamKind::String, true, "Text to shout")],
        |args| Ok(json!(args.str("text")?.to_uppercase())),
    ));
    Server::new("127.0.0.1:0", Arc::new(registry)).unwrap()
}

/// Sends one request on `stream` and reads back `(status, body)`.
fn exchange(stream: &mut TcpStream, method: &str, path: &str, body: &str, close: bool) -> (u16, String) {
    let connection = if close { "Connection: close\r\n" } else { "" };
    write!(
        stream,
        "{method} {path} HTTP/1.1\r\nHost: localhost\r\nContent-Length: {}\r\n{connection}\r\n{body}",
        body.len()
    )
    .unwrap();
    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let mut status_line = String::new();
    reader.read_line(&mut status_line).unwrap();
    let status = status_line.split(' ').nth(1).unwrap().parse().unwrap();
    let mut content_length = 0;
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((key, value)) = line.split_once(':') {
            if key.eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap();
            }
        }
    }
    let mut body = vec![0; content_length];
    reader.read_exact(&mut body).unwrap();
    (status, String::from_utf8(body).unwrap())
}

#[test]
fn serves_health_and_mcp_on_one_connection() {
    let server = server();
    let mut stream = TcpStream::connect(server.local_addr()).unwrap();

    let (status, body) = exchange(&mut stream, "GET", "/health", "", false);
    assert_eq!(status, 200);
    assert_eq!(
        serde_json::from_str::<Value>(&body).unwrap(),
        json!({"status": "healthy", "service": "http-test"})
    );

    let (status, body) = exchange(
        &mut stream,
        "POST",
        "/mcp",
        r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"shout","arguments":{"text":"hi"}}}"#,
        true,
    );
    assert_eq!(status, 200);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["result"]["content"][0]["text"], json!("HI"));
}

#[test]
fn rejects_empty_bodies_and_unknown_paths() {
    let server = server();
    let mut stream = TcpStream::connect(server.local_addr()).unwrap();
    let (status, body) = exchange(&mut stream, "POST", "/mcp", "", false);
    assert_eq!(status, 400);
    assert!(body.contains("Bad Request"));
    let (status, _) = exchange(&mut stream, "GET", "/missing", "", true);
    assert_eq!(status, 404);
}

#[test]
fn oversized_body_is_refused_and_server_keeps_serving() {
    let server = server();
    let mut stream = TcpStream::connect(server.local_addr()).unwrap();
    write!(
        stream,
        "POST /mcp HTTP/1.1\r\nHost: localhost\r\nContent-Length: 100000000000000\r\n\r\n"
    )
    .unwrap();
    let mut reply = String::new();
    stream.read_to_string(&mut reply).unwrap();
    assert!(reply.starts_with("HTTP/1.1 413 Payload Too Large\r\n"));
    assert!(reply.contains("Payload Too Large"));

    let mut other = TcpStream::connect(server.local_addr()).unwrap();
    let (status, _) = exchange(&mut other, "GET", "/health", "", true);
    assert_eq!(status, 200);
}

//! A local HTTP/1.1 server for the serverless surface.
//!
//! Each accepted connection gets its own thread.  Requests are parsed just
//! far enough to build an [`HttpEvent`] (request line, headers and a
//! `Content-Length` body) and then go through the same
//! [`HttpAdapter`] a deployed function would use.  Connections are kept alive
//! until the client sends `Connection: close` or hangs up.
//!
//! Bodies larger than [`MAX_BODY_BYTES`] are refused with a 413 and the
//! connection is closed without reading them.

use crate::mcp::Handler;
use crate::transit::lambda::{HttpAdapter, HttpEvent, HttpResponse};
use std::collections::HashMap;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::Arc;

/// Largest accepted request body, matching the API Gateway payload limit.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

#[derive(PartialEq)]
enum ParseState {
    RequestLine,
    Headers,
    Body(usize),
}

/// One parsed request.
struct Parsed {
    method: String,
    path: String,
    headers: HashMap<String, String>,
    body: Vec<u8>,
}

impl Parsed {
    fn wants_close(&self) -> bool {
        self.headers
            .get("connection")
            .is_some_and(|v| v.eq_ignore_ascii_case("close"))
    }

    fn into_event(self) -> HttpEvent {
        let body = (!self.body.is_empty()).then(|| String::from_utf8_lossy(&self.body).into_owned());
        let mut event = HttpEvent::new(&self.method, &self.path, body);
        event.headers = Some(self.headers);
        event
    }
}

/// What came off the wire.
enum Incoming {
    Request(Parsed),
    /// The announced body exceeds [`MAX_BODY_BYTES`].
    TooLarge(usize),
}

fn invalid(message: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message.to_string())
}

/// Reads one request.  `Ok(None)` means the client closed the connection
/// between requests.
fn read_request<R: BufRead>(reader: &mut R) -> io::Result<Option<Incoming>> {
    let mut state = ParseState::RequestLine;
    let mut method = String::new();
    let mut path = String::new();
    let mut headers: HashMap<String, String> = HashMap::new();
    let mut line = String::new();
    loop {
        match state {
            ParseState::RequestLine | ParseState::Headers => {
                line.clear();
                if reader.read_line(&mut line)? == 0 {
                    return if state == ParseState::RequestLine {
                        Ok(None)
                    } else {
                        Err(invalid("connection closed inside headers"))
                    };
                }
                let trimmed = line.trim_end_matches(['\r', '\n']);
                if state == ParseState::RequestLine {
                    if trimmed.is_empty() {
                        continue;
                    }
                    let mut parts = trimmed.split(' ');
                    let (Some(m), Some(target)) = (parts.next(), parts.next()) else {
                        return Err(invalid("malformed request line"));
                    };
                    method = m.to_string();
                    // Query strings are not routed on.
                    path = target.split('?').next().unwrap_or("/").to_string();
                    state = ParseState::Headers;
                } else if trimmed.is_empty() {
                    let length = match headers.get("content-length") {
                        Some(value) => value
                            .parse::<usize>()
                            .map_err(|_| invalid("bad Content-Length"))?,
                        None => 0,
                    };
                    if length > MAX_BODY_BYTES {
                        return Ok(Some(Incoming::TooLarge(length)));
                    }
                    state = ParseState::Body(length);
                } else if let Some((key, value)) = trimmed.split_once(':') {
                    headers.insert(key.trim().to_ascii_lowercase(), value.trim().to_string());
                }
            }
            ParseState::Body(length) => {
                let mut body = Vec::with_capacity(length.min(64 * 1024));
                reader.by_ref().take(length as u64).read_to_end(&mut body)?;
                if body.len() < length {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "connection closed inside body",
                    ));
                }
                return Ok(Some(Incoming::Request(Parsed {
                    method,
                    path,
                    headers,
                    body,
                })));
            }
        }
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        202 => "Accepted",
        400 => "Bad Request",
        404 => "Not Found",
        413 => "Payload Too Large",
        500 => "Internal Server Error",
        _ => "",
    }
}

fn write_response<W: Write>(stream: &mut W, response: &HttpResponse, close: bool) -> io::Result<()> {
    write!(stream, "HTTP/1.1 {} {}\r\n", response.status_code, reason(response.status_code))?;
    for (key, value) in &response.headers {
        write!(stream, "{key}: {value}\r\n")?;
    }
    write!(stream, "Content-Length: {}\r\n", response.body.len())?;
    if close {
        stream.write_all(b"Connection: close\r\n")?;
    }
    stream.write_all(b"\r\n")?;
    stream.write_all(response.body.as_bytes())?;
    stream.flush()
}

struct Session<H: ?Sized> {
    stream: TcpStream,
    adapter: Arc<HttpAdapter<H>>,
}

impl<H: Handler + ?Sized> Session<H> {
    fn run(&mut self) -> io::Result<()> {
        let mut reader = BufReader::new(self.stream.try_clone()?);
        while let Some(incoming) = read_request(&mut reader)? {
            let request = match incoming {
                Incoming::Request(request) => request,
                Incoming::TooLarge(length) => {
                    logwise::warn_sync!(
                        "refusing {length} byte body",
                        length = logwise::privacy::LogIt(&length)
                    );
                    let response = HttpResponse::json(
                        413,
                        &serde_json::json!({
                            "error": "Payload Too Large",
                            "message": format!("Request body exceeds {MAX_BODY_BYTES} bytes"),
                        }),
                    );
                    return write_response(&mut self.stream, &response, true);
                }
            };
            let close = request.wants_close();
            let response = self.adapter.handle(&request.into_event());
            write_response(&mut self.stream, &response, close)?;
            if close {
                break;
            }
        }
        Ok(())
    }
}

/// A running HTTP server.
pub struct Server {
    local_addr: SocketAddr,
}

impl Server {
    /// Binds `addr` and starts accepting on a background thread.
    pub fn new<A: ToSocketAddrs, H: Handler + ?Sized + 'static>(
        addr: A,
        handler: Arc<H>,
    ) -> io::Result<Self> {
        let listener = TcpListener::bind(addr)?;
        let local_addr = listener.local_addr()?;
        let adapter = Arc::new(HttpAdapter::new(handler));
        std::thread::Builder::new()
            .name("daap-mcp::http".to_string())
            .spawn(move || {
                for stream in listener.incoming() {
                    match stream {
                        Ok(stream) => Self::on_accept(stream, adapter.clone()),
                        Err(e) => logwise::warn_sync!(
                            "accept failed: {error}",
                            error = logwise::privacy::LogIt(&e)
                        ),
                    }
                }
            })?;
        logwise::info_sync!(
            "MCP/HTTP listening on {addr}",
            addr = logwise::privacy::LogIt(&local_addr)
        );
        Ok(Server { local_addr })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    fn on_accept<H: Handler + ?Sized + 'static>(stream: TcpStream, adapter: Arc<HttpAdapter<H>>) {
        let peer = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        let spawned = std::thread::Builder::new()
            .name(format!("daap-mcp::http::{peer}"))
            .spawn(move || {
                let mut session = Session { stream, adapter };
                if let Err(e) = session.run() {
                    logwise::warn_sync!(
                        "session ended: {error}",
                        error = logwise::privacy::LogIt(&e)
                    );
                }
            });
        if let Err(e) = spawned {
            logwise::error_sync!(
                "could not start session thread: {error}",
                error = logwise::privacy::LogIt(&e)
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_request_with_body() {
        let raw = b"POST /mcp?x=1 HTTP/1.1\r\nHost: localhost\r\nContent-Length: 2\r\nConnection: close\r\n\r\n{}";
        let mut reader = &raw[..];
        let Some(Incoming::Request(parsed)) = read_request(&mut reader).unwrap() else {
            panic!("expected a request");
        };
        assert_eq!(parsed.method, "POST");
        assert_eq!(parsed.path, "/mcp");
        assert_eq!(parsed.body, b"{}");
        assert!(parsed.wants_close());
    }

    #[test]
    fn eof_between_requests_is_clean() {
        let mut reader = &b""[..];
        assert!(read_request(&mut reader).unwrap().is_none());
    }

    #[test]
    fn oversized_body_is_not_read() {
        let raw = b"POST /mcp HTTP/1.1\r\nContent-Length: 100000000000000\r\n\r\n{}";
        let mut reader = &raw[..];
        let incoming = read_request(&mut reader).unwrap();
        assert!(matches!(incoming, Some(Incoming::TooLarge(100000000000000))));
    }

    #[test]
    fn truncated_body_is_an_error() {
        let raw = b"POST /mcp HTTP/1.1\r\nContent-Length: 10\r\n\r\n{}";
        let mut reader = &raw[..];
        let error = read_request(&mut reader).err().unwrap();
        assert_eq!(error.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn status_line_and_length() {
        let response = HttpResponse {
            status_code: 404,
            headers: Default::default(),
            body: "{}".to_string(),
            is_base64_encoded: false,
        };
        let mut out = Vec::new();
        write_response(&mut out, &response, true).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(text.contains("Content-Length: 2\r\n"));
        assert!(text.ends_with("\r\n\r\n{}"));
    }
}

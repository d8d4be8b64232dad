//! The serverless HTTP adapter.
//!
//! [`HttpAdapter::handle`] maps one platform HTTP event to one HTTP response
//! and keeps no state between calls.  Both API Gateway event flavours are
//! accepted: HTTP APIs (`rawPath`, `requestContext.http.method`) and REST
//! APIs (`path`, `httpMethod`).
//!
//! | Route | Result |
//! |---|---|
//! | `GET /health` | 200 `{"status":"healthy","service":<name>}` |
//! | `POST /mcp` | 200 with the JSON-RPC envelope, or 202 for a notification |
//! | `OPTIONS *` | 200, empty body |
//! | anything else | 404 |
//!
//! A body that is empty or not JSON is rejected with 400 before any
//! dispatching happens.  A panic anywhere in handling becomes a 500.  Every
//! response carries CORS headers.
//!
//! ```
//! use daap_mcp::mcp::registry::Registry;
//! use daap_mcp::transit::lambda::{HttpAdapter, HttpEvent};
//! use std::sync::Arc;
//!
//! let adapter = HttpAdapter::new(Arc::new(Registry::new("daap-mcp-server", "1.0.0")));
//! let response = adapter.handle(&HttpEvent::new("GET", "/health", None));
//! assert_eq!(response.status_code, 200);
//! assert_eq!(response.body, r#"{"status":"healthy","service":"daap-mcp-server"}"#);
//! assert_eq!(response.headers["Access-Control-Allow-Origin"], "*");
//! ```

pub mod runtime;

use crate::mcp::{self, Handler};
use crate::mcp::registry::Registry;
use base64::Engine;
use serde_json::{Value, json};
use std::collections::{BTreeMap, HashMap};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, LazyLock};
use std::time::Instant;

/// An inbound API Gateway / function URL event.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpEvent {
    /// HTTP API path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_path: Option<String>,
    /// REST API path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// REST API method.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_method: Option<String>,
    #[serde(default)]
    pub request_context: RequestContext,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<HttpContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct HttpContext {
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub path: String,
}

impl HttpEvent {
    /// An HTTP API style event.
    pub fn new(method: &str, path: &str, body: Option<String>) -> Self {
        HttpEvent {
            raw_path: Some(path.to_string()),
            request_context: RequestContext {
                http: Some(HttpContext {
                    method: method.to_string(),
                    path: path.to_string(),
                }),
                ..RequestContext::default()
            },
            body,
            ..HttpEvent::default()
        }
    }

    /// The request method, upper-cased.  Defaults to `GET`.
    pub fn method(&self) -> String {
        self.request_context
            .http
            .as_ref()
            .map(|http| http.method.as_str())
            .filter(|m| !m.is_empty())
            .or(self.http_method.as_deref())
            .unwrap_or("GET")
            .to_ascii_uppercase()
    }

    /// The request path with any `/<stage>` prefix removed.
    pub fn route_path(&self) -> String {
        let path = self
            .raw_path
            .as_deref()
            .or(self.path.as_deref())
            .or(self.request_context.http.as_ref().map(|h| h.path.as_str()))
            .unwrap_or("/");
        if let Some(stage) = self.request_context.stage.as_deref().filter(|s| *s != "$default") {
            let prefix = format!("/{stage}");
            if let Some(rest) = path.strip_prefix(&prefix) {
                if rest.is_empty() {
                    return "/".to_string();
                }
                if rest.starts_with('/') {
                    return rest.to_string();
                }
            }
        }
        path.to_string()
    }

    /// The body text, base64-decoded when flagged.
    pub fn decoded_body(&self) -> Result<String, Error> {
        let body = self.body.as_deref().unwrap_or("");
        let text = if self.is_base64_encoded {
            let bytes = base64::engine::general_purpose::STANDARD.decode(body.trim())?;
            String::from_utf8(bytes)?
        } else {
            body.to_string()
        };
        if text.trim().is_empty() {
            return Err(Error::EmptyBody);
        }
        Ok(text)
    }
}

/// The response handed back to the platform.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
    pub is_base64_encoded: bool,
}

impl HttpResponse {
    fn with_cors(status_code: u16, body: String) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers.insert("Access-Control-Allow-Origin".to_string(), "*".to_string());
        headers.insert(
            "Access-Control-Allow-Methods".to_string(),
            "GET, POST, OPTIONS".to_string(),
        );
        headers.insert(
            "Access-Control-Allow-Headers".to_string(),
            "Content-Type, Authorization".to_string(),
        );
        HttpResponse {
            status_code,
            headers,
            body,
            is_base64_encoded: false,
        }
    }

    pub(crate) fn json(status_code: u16, body: &Value) -> Self {
        Self::with_cors(status_code, body.to_string())
    }

    /// The body parsed as JSON, or `Null` if it is empty or not JSON.
    pub fn json_body(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or(Value::Null)
    }
}

/// Why a request was rejected before dispatching.  Always a 400.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Request body is required")]
    EmptyBody,
    #[error("Body is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("Body is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("Body is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Routes serverless HTTP events to a handler.
pub struct HttpAdapter<H: ?Sized = Registry> {
    service: String,
    handler: Arc<H>,
}

impl<H: Handler + ?Sized> HttpAdapter<H> {
    pub fn new(handler: Arc<H>) -> Self {
        let service = handler.server_info().name;
        HttpAdapter { service, handler }
    }

    /// Handles one event.  Never panics.
    pub fn handle(&self, event: &HttpEvent) -> HttpResponse {
        let started = Instant::now();
        let response = catch_unwind(AssertUnwindSafe(|| self.route(event))).unwrap_or_else(|payload| {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown error".to_string());
            logwise::error_sync!(
                "HTTP adapter panicked: {message}",
                message = logwise::privacy::LogIt(&message)
            );
            HttpResponse::json(
                500,
                &json!({"error": "Internal Server Error", "message": message}),
            )
        });
        let elapsed = started.elapsed().as_secs_f64();
        logwise::info_sync!(
            "Processed request in {elapsed}s",
            elapsed = logwise::privacy::LogIt(&format!("{elapsed:.3}"))
        );
        response
    }

    fn route(&self, event: &HttpEvent) -> HttpResponse {
        let method = event.method();
        let path = event.route_path();
        logwise::info_sync!(
            "{method} {path}",
            method = logwise::privacy::LogIt(&method),
            path = logwise::privacy::LogIt(&path)
        );
        match (method.as_str(), path.as_str()) {
            ("OPTIONS", _) => HttpResponse::with_cors(200, String::new()),
            ("GET", "/health") => HttpResponse::json(
                200,
                &json!({"status": "healthy", "service": self.service}),
            ),
            ("POST", "/mcp") => self.mcp(event),
            _ => HttpResponse::json(
                404,
                &json!({"error": "Not Found", "message": format!("No handler for {method} {path}")}),
            ),
        }
    }

    fn mcp(&self, event: &HttpEvent) -> HttpResponse {
        let parsed = event
            .decoded_body()
            .and_then(|body| serde_json::from_str::<Value>(&body).map_err(Error::from));
        let value = match parsed {
            Ok(value) => value,
            Err(e) => {
                logwise::warn_sync!(
                    "rejecting /mcp body: {error}",
                    error = logwise::privacy::LogIt(&e)
                );
                return HttpResponse::json(
                    400,
                    &json!({"error": "Bad Request", "message": e.to_string()}),
                );
            }
        };
        match mcp::handle_value(self.handler.as_ref(), value) {
            Some(response) => match serde_json::to_string(&response) {
                Ok(body) => HttpResponse::with_cors(200, body),
                Err(e) => HttpResponse::json(
                    500,
                    &json!({"error": "Internal Server Error", "message": e.to_string()}),
                ),
            },
            None => HttpResponse::with_cors(202, String::new()),
        }
    }
}

static ADAPTER: LazyLock<HttpAdapter> = LazyLock::new(|| {
    let registry = crate::tools::default_registry();
    logwise::info_sync!(
        "HTTP adapter initialized with {count} tools",
        count = logwise::privacy::LogIt(&registry.len())
    );
    HttpAdapter::new(Arc::new(registry))
});

/// Handles one event with the process-wide adapter over
/// [`default_registry`](crate::tools::default_registry).
///
/// The adapter is built on first use and reused for the life of the process.
pub fn handle(event: &HttpEvent) -> HttpResponse {
    ADAPTER.handle(event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::tools::ToolDescriptor;

    fn adapter() -> HttpAdapter {
        let mut registry = Registry::new("unit", "0");
        registry.register(ToolDescriptor::blocking("ping", "", vec![], |_| Ok(json!("pong"))));
        HttpAdapter::new(Arc::new(registry))
    }

    #[test]
    fn rest_events_with_stage_prefix() {
        let event: HttpEvent = serde_json::from_value(json!({
            "path": "/prod/health",
            "httpMethod": "GET",
            "requestContext": {"stage": "prod"}
        }))
        .unwrap();
        assert_eq!(event.method(), "GET");
        assert_eq!(event.route_path(), "/health");
        assert_eq!(adapter().handle(&event).status_code, 200);
    }

    #[test]
    fn base64_bodies_are_decoded() {
        let body = r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"ping"}}"#;
        let mut event = HttpEvent::new("POST", "/mcp", Some(base64::engine::general_purpose::STANDARD.encode(body)));
        event.is_base64_encoded = true;
        let response = adapter().handle(&event);
        assert_eq!(response.status_code, 200);
        assert_eq!(response.json_body()["result"]["content"][0]["text"], json!("pong"));
    }

    #[test]
    fn bad_base64_is_bad_request() {
        let mut event = HttpEvent::new("POST", "/mcp", Some("%%%".to_string()));
        event.is_base64_encoded = true;
        assert_eq!(adapter().handle(&event).status_code, 400);
    }

    #[test]
    fn non_json_body_is_bad_request() {
        let response = adapter().handle(&HttpEvent::new("POST", "/mcp", Some("{oops".into())));
        assert_eq!(response.status_code, 400);
        assert_eq!(response.json_body()["error"], json!("Bad Request"));
    }

    #[test]
    fn notifications_are_accepted() {
        let response = adapter().handle(&HttpEvent::new(
            "POST",
            "/mcp",
            Some(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#.into()),
        ));
        assert_eq!(response.status_code, 202);
        assert!(response.body.is_empty());
    }

    #[test]
    fn wrong_method_on_known_path_is_not_found() {
        let response = adapter().handle(&HttpEvent::new("GET", "/mcp", None));
        assert_eq!(response.status_code, 404);
        assert_eq!(response.json_body()["message"], json!("No handler for GET /mcp"));
    }

    #[test]
    fn response_event_shape() {
        let response = adapter().handle(&HttpEvent::new("OPTIONS", "/anything", None));
        let wire = serde_json::to_value(&response).unwrap();
        assert_eq!(wire["statusCode"], json!(200));
        assert_eq!(wire["isBase64Encoded"], json!(false));
        assert_eq!(wire["body"], json!(""));
    }
}

//! JSON-RPC 2.0 envelope types.
//!
//! Every transport in this crate speaks the same envelope: a request carries
//! `jsonrpc`, `id`, `method` and `params`; a response carries the same `id`
//! and exactly one of `result` or `error`.
//!
//! Decoding is deliberately forgiving about *where* it fails, but strict about
//! *what* it reports.  [`decode`] returns either a [`Message`] ready for
//! dispatch, or a fully-formed error [`Response`] the transport can write back
//! as-is.  Failures that happen before an `id` can be read always report
//! `id: null`.
//!
//! # Examples
//!
//! ```
//! use daap_mcp::jrpc::{decode, Message, Response, Error};
//! use serde_json::json;
//!
//! let message = decode(br#"{"jsonrpc":"2.0","id":7,"method":"tools/list"}"#).unwrap();
//! let Message::Request(request) = message else { panic!("expected a request") };
//! assert_eq!(request.id, json!(7));
//! assert!(request.params.is_empty());
//!
//! let response: Response<serde_json::Value> =
//!     Response::err(Error::method_not_found("Unknown method: ping"), request.id);
//! let wire = serde_json::to_value(&response).unwrap();
//! assert_eq!(wire["error"]["code"], json!(-32601));
//! assert_eq!(wire["id"], json!(7));
//! ```

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt::{Display, Formatter};

/// The only protocol version this crate accepts or emits.
pub const VERSION: &str = "2.0";

/// Invalid JSON was received.
pub const PARSE_ERROR: i32 = -32700;
/// The JSON sent is not a valid request object.
pub const INVALID_REQUEST: i32 = -32600;
/// Unknown protocol method, or unknown tool name.
pub const METHOD_NOT_FOUND: i32 = -32601;
/// The request is structurally wrong, e.g. a required field is missing.
pub const INVALID_PARAMS: i32 = -32602;
/// A tool body failed, or an unexpected decode/encode fault.
pub const INTERNAL_ERROR: i32 = -32603;

/// A JSON-RPC 2.0 request.
///
/// `params` is always a mapping; an absent or `null` params member decodes as
/// an empty map.  `id` is `null` when the caller omitted it.
#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, PartialEq)]
pub struct Request {
    /// The JSON-RPC protocol version (must be "2.0")
    pub jsonrpc: String,
    /// Correlation identifier echoed in the response
    #[serde(default)]
    pub id: Value,
    /// The name of the method to invoke
    pub method: String,
    /// Named parameters for the method call
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl Request {
    /// Creates a new JSON-RPC 2.0 request.
    ///
    /// ```
    /// use daap_mcp::jrpc::Request;
    /// use serde_json::json;
    ///
    /// let request = Request::new("tools/list", serde_json::Map::new(), json!(1));
    /// assert_eq!(request.jsonrpc, "2.0");
    /// ```
    pub fn new(method: impl Into<String>, params: Map<String, Value>, id: Value) -> Self {
        Self {
            jsonrpc: VERSION.to_string(),
            id,
            method: method.into(),
            params,
        }
    }
}

/// A JSON-RPC 2.0 notification: a method call without an `id`, which never
/// receives a response.
#[derive(serde::Deserialize, serde::Serialize, Debug, Clone, PartialEq)]
pub struct Notification {
    /// The JSON-RPC protocol version (must be "2.0")
    pub jsonrpc: String,
    /// The name of the notification, e.g. `notifications/initialized`
    pub method: String,
    /// Optional parameters
    #[serde(default)]
    pub params: Map<String, Value>,
}

/// A decoded inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Expects exactly one response.
    Request(Request),
    /// Expects no response.
    Notification(Notification),
}

/// A JSON-RPC 2.0 response.
///
/// Contains either a `result` or an `error`, never both.  The generic `R`
/// lets handlers build typed results and [`erase`](Response::erase) them
/// into `serde_json::Value` at the dispatch boundary.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Response<R> {
    /// The JSON-RPC protocol version (must be "2.0")
    pub jsonrpc: String,
    /// The same identifier that was in the request
    pub id: Value,
    /// The result of the method call (mutually exclusive with error)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<R>,
    /// Error information if the method call failed (mutually exclusive with result)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Error>,
}

impl<R> Response<R> {
    /// Creates a successful response with the given result.
    pub fn new(result: R, id: Value) -> Self {
        Self {
            jsonrpc: VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Creates an error response with the given error.
    pub fn err(e: Error, id: Value) -> Self {
        Self {
            jsonrpc: VERSION.to_string(),
            id,
            result: None,
            error: Some(e),
        }
    }

    /// True when this response carries a `result`.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Converts a typed response into a response with a `serde_json::Value` result.
    ///
    /// A result that cannot be represented as JSON becomes an internal error
    /// carrying the same `id`, so erasing never loses the response.
    ///
    /// ```
    /// use daap_mcp::jrpc::Response;
    /// use serde_json::json;
    ///
    /// #[derive(serde::Serialize)]
    /// struct Pong { ok: bool }
    ///
    /// let erased = Response::new(Pong { ok: true }, json!("a")).erase();
    /// assert_eq!(erased.result, Some(json!({"ok": true})));
    /// ```
    pub fn erase(self) -> Response<Value>
    where
        R: Serialize,
    {
        let result = match self.result.map(serde_json::to_value).transpose() {
            Ok(result) => result,
            Err(e) => return Response::err(Error::internal(format!("Encode error: {e}")), self.id),
        };
        Response {
            jsonrpc: self.jsonrpc,
            id: self.id,
            result,
            error: self.error,
        }
    }
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Error {
    /// Error code as defined in JSON-RPC 2.0 specification
    pub code: i32,
    /// Human-readable error message
    pub message: String,
    /// Optional additional information about the error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Error {}: {}", self.code, self.message)?;
        match &self.data {
            Some(Value::String(data)) => write!(f, " ({data})"),
            Some(data) => write!(f, " ({data})"),
            None => Ok(()),
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Creates a new error with a custom code and message.
    pub fn new(code: i32, message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            code,
            message: message.into(),
            data,
        }
    }

    /// "Parse error" (-32700).
    pub fn parse_error(detail: impl Into<String>) -> Self {
        Self::new(PARSE_ERROR, "Parse error", Some(Value::String(detail.into())))
    }

    /// "Invalid Request" (-32600) with a description of what was wrong.
    pub fn invalid_request(detail: impl Into<String>) -> Self {
        Self::new(INVALID_REQUEST, "Invalid Request", Some(Value::String(detail.into())))
    }

    /// "Method not found" (-32601) with a description of what was missing.
    ///
    /// ```
    /// use daap_mcp::jrpc::Error;
    ///
    /// let error = Error::method_not_found("Unknown method: resources/list");
    /// assert_eq!(error.code, -32601);
    /// assert_eq!(error.message, "Method not found");
    /// ```
    pub fn method_not_found(detail: impl Into<String>) -> Self {
        Self::new(METHOD_NOT_FOUND, "Method not found", Some(Value::String(detail.into())))
    }

    /// "Invalid params" (-32602); the message itself names the problem.
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(INVALID_PARAMS, message, None)
    }

    /// "Internal error" (-32603) with the cause in `data`.
    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(INTERNAL_ERROR, "Internal error", Some(Value::String(detail.into())))
    }
}

/// Decodes one inbound message from raw bytes.
///
/// Unparseable bytes yield an internal error with `id: null`.  See
/// [`decode_value`] for the structural checks.
pub fn decode(bytes: &[u8]) -> Result<Message, Response<Value>> {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(value) => decode_value(value),
        Err(e) => Err(Response::err(
            Error::internal(format!("Parse error: {e}")),
            Value::Null,
        )),
    }
}

/// Decodes one inbound message from an already-parsed JSON value.
///
/// * not an object, or an `id` that is neither string, number nor null: invalid request, `id: null`
/// * missing or wrong `jsonrpc`, missing `method`: invalid request with the best-effort `id`
/// * `params` present but not an object: invalid params
/// * no `id` member and a `notifications/` method: a [`Notification`]
/// * no `id` member otherwise: a [`Request`] with `id: null`
pub fn decode_value(value: Value) -> Result<Message, Response<Value>> {
    let Value::Object(mut object) = value else {
        return Err(Response::err(
            Error::invalid_request("Request must be a JSON object"),
            Value::Null,
        ));
    };
    let id = object.remove("id");
    if let Some(id) = &id {
        if !(id.is_string() || id.is_number() || id.is_null()) {
            return Err(Response::err(
                Error::invalid_request("id must be a string, number or null"),
                Value::Null,
            ));
        }
    }
    let reply_id = id.clone().unwrap_or(Value::Null);

    match object.get("jsonrpc").and_then(Value::as_str) {
        Some(VERSION) => {}
        Some(other) => {
            return Err(Response::err(
                Error::invalid_request(format!("Unsupported jsonrpc version: {other}")),
                reply_id,
            ));
        }
        None => {
            return Err(Response::err(
                Error::invalid_request("Missing jsonrpc version"),
                reply_id,
            ));
        }
    }
    let method = match object.remove("method") {
        Some(Value::String(method)) => method,
        _ => {
            return Err(Response::err(
                Error::invalid_request("Missing method"),
                reply_id,
            ));
        }
    };
    let params = match object.remove("params") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(params)) => params,
        Some(_) => {
            return Err(Response::err(
                Error::invalid_params("params must be an object"),
                reply_id,
            ));
        }
    };

    match id {
        None if method.starts_with("notifications/") => Ok(Message::Notification(Notification {
            jsonrpc: VERSION.to_string(),
            method,
            params,
        })),
        _ => Ok(Message::Request(Request {
            jsonrpc: VERSION.to_string(),
            id: reply_id,
            method,
            params,
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rejected(bytes: &[u8]) -> Response<Value> {
        match decode(bytes) {
            Err(response) => response,
            Ok(message) => panic!("expected rejection, got {message:?}"),
        }
    }

    #[test]
    fn unparseable_body_reports_null_id() {
        let response = rejected(b"{not json");
        assert_eq!(response.id, Value::Null);
        assert_eq!(response.error.unwrap().code, INTERNAL_ERROR);
    }

    #[test]
    fn non_object_is_invalid_request() {
        let response = rejected(b"[1,2,3]");
        assert_eq!(response.id, Value::Null);
        assert_eq!(response.error.unwrap().code, INVALID_REQUEST);
    }

    #[test]
    fn missing_version_keeps_best_effort_id() {
        let response = rejected(br#"{"id":"abc","method":"tools/list"}"#);
        assert_eq!(response.id, json!("abc"));
        assert_eq!(response.error.unwrap().code, INVALID_REQUEST);
    }

    #[test]
    fn wrong_version_is_rejected() {
        let response = rejected(br#"{"jsonrpc":"1.0","id":3,"method":"tools/list"}"#);
        assert_eq!(response.id, json!(3));
        assert_eq!(response.error.unwrap().code, INVALID_REQUEST);
    }

    #[test]
    fn array_params_are_invalid_params() {
        let response = rejected(br#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":[1]}"#);
        assert_eq!(response.id, json!(4));
        assert_eq!(response.error.unwrap().code, INVALID_PARAMS);
    }

    #[test]
    fn absent_id_on_request_becomes_null() {
        let message = decode(br#"{"jsonrpc":"2.0","method":"tools/list"}"#).unwrap();
        match message {
            Message::Request(request) => assert_eq!(request.id, Value::Null),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn notifications_have_no_id() {
        let message = decode(br#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#).unwrap();
        assert!(matches!(message, Message::Notification(n) if n.method == "notifications/initialized"));
    }

    #[test]
    fn explicit_null_id_is_still_a_request() {
        let message =
            decode(br#"{"jsonrpc":"2.0","id":null,"method":"notifications/initialized"}"#).unwrap();
        assert!(matches!(message, Message::Request(_)));
    }

    #[test]
    fn error_response_wire_shape() {
        let response: Response<Value> = Response::err(Error::invalid_params("Tool name is required"), json!(9));
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "jsonrpc": "2.0",
                "id": 9,
                "error": {"code": -32602, "message": "Tool name is required"}
            })
        );
    }

    #[test]
    fn response_survives_the_wire() {
        let response = Response::new(json!({"tools": []}), json!("x-1"));
        let bytes = serde_json::to_vec(&response).unwrap();
        let back: Response<Value> = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, response);
    }
}

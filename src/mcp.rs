//! The MCP dispatcher.
//!
//! [`dispatch`] interprets the three protocol methods this crate serves
//! (`initialize`, `tools/list` and `tools/call`) against a [`Handler`].  The
//! handler is the seam between the protocol and whatever actually owns the
//! tools: a local [`Registry`](registry::Registry), or a
//! [`RemoteProxy`](crate::transit::remote::RemoteProxy) that forwards calls
//! over HTTP.
//!
//! Every request produces exactly one response carrying the request's `id`.
//!
//! ```
//! use daap_mcp::mcp::{self, registry::Registry};
//! use serde_json::json;
//!
//! let registry = Registry::new("demo", "1.0.0");
//! let response = mcp::handle_bytes(
//!     &registry,
//!     br#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
//! ).unwrap();
//! let result = response.result.unwrap();
//! assert_eq!(result["serverInfo"]["name"], json!("demo"));
//! assert_eq!(result["capabilities"], json!({"tools": {}}));
//! ```

use crate::jrpc::{self, Message, Request, Response};
use serde_json::{Map, Value};

pub mod registry;
pub mod schema;
pub mod tools;

use tools::{ToolCallResponse, ToolList};

/// The MCP protocol revision reported by `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Name and version reported by `initialize`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

impl ServerInfo {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// Whatever owns the tools behind a dispatcher.
///
/// Implementations must be shareable across connection threads; the
/// dispatcher itself keeps no state between calls.
pub trait Handler: Send + Sync {
    /// Identity reported in the `initialize` result.
    fn server_info(&self) -> ServerInfo;

    /// Every tool this handler exposes.  Must not fail.
    fn list_tools(&self) -> ToolList;

    /// Invokes `name` with `arguments`.
    ///
    /// Returns a protocol error for an unknown tool or a failed body; the
    /// dispatcher attaches the request `id`.
    fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<ToolCallResponse, jrpc::Error>;
}

#[derive(Debug, serde::Serialize)]
struct InitializeResult {
    #[serde(rename = "protocolVersion")]
    protocol_version: &'static str,
    capabilities: Capabilities,
    #[serde(rename = "serverInfo")]
    server_info: ServerInfo,
}

#[derive(Debug, serde::Serialize)]
struct Capabilities {
    tools: Map<String, Value>,
}

fn initialize<H: Handler + ?Sized>(handler: &H, request: Request) -> Response<InitializeResult> {
    let result = InitializeResult {
        protocol_version: PROTOCOL_VERSION,
        capabilities: Capabilities { tools: Map::new() },
        server_info: handler.server_info(),
    };
    Response::new(result, request.id)
}

fn list<H: Handler + ?Sized>(handler: &H, request: Request) -> Response<ToolList> {
    Response::new(handler.list_tools(), request.id)
}

fn call<H: Handler + ?Sized>(handler: &H, mut request: Request) -> Response<ToolCallResponse> {
    let name = match request.params.remove("name") {
        Some(Value::String(name)) if !name.is_empty() => name,
        _ => {
            return Response::err(jrpc::Error::invalid_params("Tool name is required"), request.id);
        }
    };
    let arguments = match request.params.remove("arguments") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(arguments)) => arguments,
        Some(_) => {
            return Response::err(
                jrpc::Error::invalid_params("Tool arguments must be an object"),
                request.id,
            );
        }
    };
    match handler.call_tool(&name, arguments) {
        Ok(result) => Response::new(result, request.id),
        Err(e) => Response::err(e, request.id),
    }
}

/// Routes one request to the matching protocol method.
pub fn dispatch<H: Handler + ?Sized>(handler: &H, request: Request) -> Response<Value> {
    logwise::info_sync!(
        "dispatch {method}",
        method = logwise::privacy::LogIt(&request.method)
    );
    match request.method.as_str() {
        "initialize" => initialize(handler, request).erase(),
        "tools/list" => list(handler, request).erase(),
        "tools/call" => call(handler, request).erase(),
        other => {
            let error = jrpc::Error::method_not_found(format!("Unknown method: {other}"));
            Response::err(error, request.id)
        }
    }
}

/// Decodes and dispatches one message.
///
/// Returns `None` for notifications, which never get a response.
pub fn handle_value<H: Handler + ?Sized>(handler: &H, value: Value) -> Option<Response<Value>> {
    route(handler, jrpc::decode_value(value))
}

/// Like [`handle_value`], starting from raw bytes.
pub fn handle_bytes<H: Handler + ?Sized>(handler: &H, bytes: &[u8]) -> Option<Response<Value>> {
    route(handler, jrpc::decode(bytes))
}

fn route<H: Handler + ?Sized>(
    handler: &H,
    decoded: Result<Message, Response<Value>>,
) -> Option<Response<Value>> {
    match decoded {
        Ok(Message::Request(request)) => Some(dispatch(handler, request)),
        Ok(Message::Notification(notification)) => {
            logwise::info_sync!(
                "notification {method}",
                method = logwise::privacy::LogIt(&notification.method)
            );
            None
        }
        Err(rejection) => {
            logwise::warn_sync!(
                "rejected message: {error}",
                error = logwise::privacy::LogIt(&rejection.error)
            );
            Some(rejection)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::registry::Registry;
    use crate::mcp::tools::{ParamKind, ParameterSpec, ToolDescriptor, ToolError};
    use serde_json::json;

    fn registry() -> Registry {
        let mut registry = Registry::new("test-server", "0.0.1");
        registry.register(ToolDescriptor::blocking(
            "summarize_csv_file",
            "Summarize a CSV file",
            vec![ParameterSpec::new("filename", ParamKind::String, true, "Name of the file")],
            |args| Ok(json!(format!("summary of {}", args.str("filename")?))),
        ));
        registry.register(ToolDescriptor::blocking(
            "explode",
            "Always fails",
            vec![],
            |_| Err(ToolError::Failed("boom".to_string())),
        ));
        registry
    }

    fn call(registry: &Registry, envelope: Value) -> Value {
        let response = handle_value(registry, envelope).expect("a response");
        serde_json::to_value(response).unwrap()
    }

    #[test]
    fn initialize_reports_server_info() {
        let wire = call(&registry(), json!({"jsonrpc":"2.0","id":0,"method":"initialize"}));
        assert_eq!(wire["result"]["protocolVersion"], json!(PROTOCOL_VERSION));
        assert_eq!(
            wire["result"]["serverInfo"],
            json!({"name":"test-server","version":"0.0.1"})
        );
    }

    #[test]
    fn list_contains_registered_tool() {
        let wire = call(
            &registry(),
            json!({"jsonrpc":"2.0","id":1,"method":"tools/list","params":{}}),
        );
        let names: Vec<_> = wire["result"]["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["summarize_csv_file", "explode"]);
    }

    #[test]
    fn list_is_idempotent() {
        let registry = registry();
        let envelope = json!({"jsonrpc":"2.0","id":1,"method":"tools/list"});
        assert_eq!(call(&registry, envelope.clone()), call(&registry, envelope));
    }

    #[test]
    fn call_wraps_result_as_text() {
        let wire = call(
            &registry(),
            json!({"jsonrpc":"2.0","id":"c","method":"tools/call",
                   "params":{"name":"summarize_csv_file","arguments":{"filename":"a.csv"}}}),
        );
        assert_eq!(
            wire,
            json!({"jsonrpc":"2.0","id":"c","result":{"content":[{"type":"text","text":"summary of a.csv"}]}})
        );
    }

    #[test]
    fn missing_or_empty_name_is_invalid_params() {
        let registry = registry();
        for params in [json!({}), json!({"name": ""}), json!({"name": 5})] {
            let wire = call(
                &registry,
                json!({"jsonrpc":"2.0","id":3,"method":"tools/call","params":params}),
            );
            assert_eq!(wire["error"]["code"], json!(-32602));
            assert_eq!(wire["error"]["message"], json!("Tool name is required"));
            assert_eq!(wire["id"], json!(3));
        }
    }

    #[test]
    fn unknown_tool_is_method_not_found() {
        let wire = call(
            &registry(),
            json!({"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"nonexistent_tool","arguments":{}}}),
        );
        assert_eq!(wire["id"], json!(2));
        assert_eq!(wire["error"]["code"], json!(-32601));
        assert_eq!(wire["error"]["message"], json!("Tool 'nonexistent_tool' not found"));
    }

    #[test]
    fn failing_body_is_internal_error() {
        let wire = call(
            &registry(),
            json!({"jsonrpc":"2.0","id":4,"method":"tools/call","params":{"name":"explode"}}),
        );
        assert_eq!(wire["error"]["code"], json!(-32603));
        assert_eq!(wire["error"]["message"], json!("Internal error"));
        assert_eq!(wire["error"]["data"], json!("Tool execution failed: boom"));
    }

    #[test]
    fn unknown_method_names_itself() {
        let wire = call(&registry(), json!({"jsonrpc":"2.0","id":5,"method":"resources/list"}));
        assert_eq!(wire["error"]["code"], json!(-32601));
        assert_eq!(wire["error"]["data"], json!("Unknown method: resources/list"));
    }

    #[test]
    fn notifications_get_no_response() {
        let registry = registry();
        let response = handle_value(
            &registry,
            json!({"jsonrpc":"2.0","method":"notifications/initialized"}),
        );
        assert!(response.is_none());
    }

    #[test]
    fn empty_registry_lists_nothing_and_finds_nothing() {
        let registry = Registry::new("empty", "0");
        let wire = call(&registry, json!({"jsonrpc":"2.0","id":1,"method":"tools/list"}));
        assert_eq!(wire["result"], json!({"tools": []}));
        let wire = call(
            &registry,
            json!({"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"x"}}),
        );
        assert_eq!(wire["error"]["code"], json!(-32601));
    }
}

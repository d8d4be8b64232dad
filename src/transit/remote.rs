//! A handler backed by a remote MCP endpoint.
//!
//! [`RemoteProxy`] forwards `tools/list` and `tools/call` as JSON-RPC over
//! HTTP POST, optionally SigV4-signed, and relays the answers.  The link is
//! treated as best effort:
//!
//! - a failed `tools/list` is logged and reported as an empty list;
//! - a failed `tools/call` is logged and reported as a successful call whose
//!   single text item starts with `Error:`.
//!
//! Remote tools arrive as a name and free text only, so their input schemas
//! come from [`infer_from_text`].

use crate::config::ProxyConfig;
use crate::jrpc::{self, Request};
use crate::mcp::schema::infer_from_text;
use crate::mcp::tools::{ToolCallResponse, ToolInfo, ToolList, stringify};
use crate::mcp::{Handler, ServerInfo};
use serde_json::{Map, Value, json};
use std::sync::atomic::{AtomicU64, Ordering};

/// The server name the proxy reports in `initialize`.
pub const SERVER_NAME: &str = "mini-mcp-server";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("API_GATEWAY_URL not configured")]
    NotConfigured,
    #[error("HTTP error: {0}")]
    Status(u16),
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid response body: {0}")]
    Body(#[from] serde_json::Error),
    #[error("{0}")]
    Remote(String),
    #[error("response has no result")]
    MissingResult,
    #[error("unexpected tools/list result: {0}")]
    UnexpectedShape(String),
    #[cfg(feature = "sigv4")]
    #[error("signing failed: {0}")]
    Signing(#[from] crate::aws::Error),
}

/// A tool as the remote endpoint describes it.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct RemoteToolDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl RemoteToolDescriptor {
    fn into_info(self) -> ToolInfo {
        let input_schema = infer_from_text(&self.name, &self.description);
        ToolInfo {
            name: self.name,
            description: self.description,
            input_schema,
        }
    }
}

/// Accepts either a bare array of tools or `{"tools": [...]}`.
fn remote_tools(result: Value) -> Result<Vec<RemoteToolDescriptor>, Error> {
    let tools = match result {
        Value::Array(_) => result,
        Value::Object(mut object) => match object.remove("tools") {
            Some(tools @ Value::Array(_)) => tools,
            _ => return Err(Error::UnexpectedShape(Value::Object(object).to_string())),
        },
        other => return Err(Error::UnexpectedShape(other.to_string())),
    };
    Ok(serde_json::from_value(tools)?)
}

/// Forwards tool traffic to a remote endpoint.
pub struct RemoteProxy {
    config: ProxyConfig,
    client: reqwest::blocking::Client,
    next_id: AtomicU64,
}

impl RemoteProxy {
    pub fn new(config: ProxyConfig) -> Result<Self, Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout())
            .build()?;
        if config.endpoint.is_none() {
            logwise::error_sync!("API_GATEWAY_URL not configured");
        }
        Ok(RemoteProxy {
            config,
            client,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    #[cfg(feature = "sigv4")]
    fn signed_headers(&self, url: &str, body: &[u8]) -> Result<Vec<(String, String)>, Error> {
        use crate::aws::{Credentials, Signer};
        let url = reqwest::Url::parse(url).map_err(|e| Error::Remote(format!("invalid endpoint: {e}")))?;
        let credentials = Credentials::load(self.config.profile.as_deref())?;
        let signer = Signer::new(credentials, &self.config.region, &self.config.service);
        let content_type = [("content-type".to_string(), "application/json".to_string())];
        Ok(signer.sign("POST", &url, &content_type, body, chrono::Utc::now()))
    }

    #[cfg(not(feature = "sigv4"))]
    fn signed_headers(&self, _url: &str, _body: &[u8]) -> Result<Vec<(String, String)>, Error> {
        logwise::warn_sync!("request signing requested but the sigv4 feature is disabled");
        Ok(Vec::new())
    }

    /// Sends one request and returns its `result`.
    fn forward(&self, method: &str, params: Map<String, Value>) -> Result<Value, Error> {
        let endpoint = self
            .config
            .endpoint
            .as_deref()
            .filter(|e| !e.is_empty())
            .ok_or(Error::NotConfigured)?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = serde_json::to_vec(&Request::new(method, params, json!(id)))?;

        let mut request = self
            .client
            .post(endpoint)
            .header("Content-Type", "application/json");
        if self.config.sign {
            for (name, value) in self.signed_headers(endpoint, &body)? {
                request = request.header(name, value);
            }
        }
        let response = request.body(body).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status(status.as_u16()));
        }
        // A present `"result": null` is a result; only a missing key is not.
        let mut envelope: Map<String, Value> = serde_json::from_slice(&response.bytes()?)?;
        if let Some(error) = envelope.remove("error").filter(|e| !e.is_null()) {
            return Err(Error::Remote(remote_error_text(error)));
        }
        envelope.remove("result").ok_or(Error::MissingResult)
    }

    /// The remote tool list, with inferred schemas.
    pub fn fetch_tools(&self) -> Result<ToolList, Error> {
        let result = self.forward("tools/list", Map::new())?;
        let tools = remote_tools(result)?
            .into_iter()
            .map(RemoteToolDescriptor::into_info)
            .collect();
        Ok(ToolList { tools })
    }

    /// Calls a remote tool and renders its result as text.
    pub fn call_remote(&self, name: &str, arguments: Map<String, Value>) -> Result<String, Error> {
        let mut params = Map::new();
        params.insert("name".to_string(), Value::String(name.to_string()));
        params.insert("arguments".to_string(), Value::Object(arguments));
        let result = self.forward("tools/call", params)?;
        Ok(stringify(&result))
    }
}

fn remote_error_text(error: Value) -> String {
    match serde_json::from_value::<jrpc::Error>(error.clone()) {
        Ok(jrpc::Error {
            message,
            data: Some(data),
            ..
        }) => format!("{message}: {}", stringify(&data)),
        Ok(jrpc::Error { message, .. }) => message,
        Err(_) => stringify(&error),
    }
}

impl Handler for RemoteProxy {
    fn server_info(&self) -> ServerInfo {
        ServerInfo::new(SERVER_NAME, env!("CARGO_PKG_VERSION"))
    }

    fn list_tools(&self) -> ToolList {
        match self.fetch_tools() {
            Ok(list) => {
                logwise::info_sync!(
                    "Retrieved {count} tools from remote endpoint",
                    count = logwise::privacy::LogIt(&list.tools.len())
                );
                list
            }
            Err(e) => {
                logwise::error_sync!(
                    "Error listing tools: {error}",
                    error = logwise::privacy::LogIt(&e)
                );
                ToolList::empty()
            }
        }
    }

    fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<ToolCallResponse, jrpc::Error> {
        match self.call_remote(name, arguments) {
            Ok(text) => {
                logwise::info_sync!(
                    "Tool {tool} executed successfully",
                    tool = logwise::privacy::LogIt(&name)
                );
                Ok(ToolCallResponse::text(text))
            }
            Err(e) => {
                logwise::error_sync!(
                    "Error calling tool {tool}: {error}",
                    tool = logwise::privacy::LogIt(&name),
                    error = logwise::privacy::LogIt(&e)
                );
                Ok(ToolCallResponse::text(format!("Error: {e}")))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_list_shapes_are_accepted() {
        let bare = remote_tools(json!([{"name": "a", "description": "x"}])).unwrap();
        let wrapped = remote_tools(json!({"tools": [{"name": "a", "description": "x", "inputSchema": {}}]})).unwrap();
        assert_eq!(bare, wrapped);
        assert!(matches!(remote_tools(json!("nope")), Err(Error::UnexpectedShape(_))));
    }

    #[test]
    fn remote_errors_render_message_and_data() {
        assert_eq!(
            remote_error_text(json!({"code": -32603, "message": "Internal error", "data": "Tool execution failed: boom"})),
            "Internal error: Tool execution failed: boom"
        );
        assert_eq!(remote_error_text(json!("Unknown error")), "Unknown error");
    }

    #[test]
    fn unconfigured_proxy_fails_open() {
        let proxy = RemoteProxy::new(ProxyConfig::default()).unwrap();
        assert_eq!(proxy.list_tools(), ToolList::empty());
        let response = proxy.call_tool("anything", Map::new()).unwrap();
        assert_eq!(
            response,
            ToolCallResponse::text("Error: API_GATEWAY_URL not configured")
        );
    }

    #[test]
    fn remote_descriptions_get_inferred_schemas() {
        let info = RemoteToolDescriptor {
            name: "read_csv_data".to_string(),
            description: "Read.\n\nArgs:\n    filename: Name of file\n    max_rows: Max number of rows\n".to_string(),
        }
        .into_info();
        assert_eq!(info.input_schema.required, ["filename", "max_rows"]);
        assert_eq!(info.input_schema.properties["max_rows"]["type"], json!("integer"));
    }
}

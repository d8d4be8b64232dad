//! The local tool registry.

use crate::jrpc;
use crate::mcp::tools::{ToolCallResponse, ToolDescriptor, ToolList, stringify};
use crate::mcp::{Handler, ServerInfo};
use serde_json::{Map, Value};

/// An ordered, in-memory set of tools keyed by name.
///
/// Built once at startup and then only read.  Registering a name that is
/// already present replaces the earlier tool in its original position.
///
/// ```
/// use daap_mcp::mcp::registry::Registry;
/// use daap_mcp::mcp::tools::ToolDescriptor;
/// use serde_json::json;
///
/// let mut registry = Registry::new("demo", "1.0.0");
/// registry.register(ToolDescriptor::blocking("a", "first", vec![], |_| Ok(json!(1))));
/// registry.register(ToolDescriptor::blocking("b", "second", vec![], |_| Ok(json!(2))));
/// registry.register(ToolDescriptor::blocking("a", "replaced", vec![], |_| Ok(json!(3))));
///
/// let names: Vec<_> = registry.list().iter().map(|t| t.name.as_str()).collect();
/// assert_eq!(names, ["a", "b"]);
/// assert_eq!(registry.lookup("a").unwrap().description, "replaced");
/// ```
#[derive(Debug, Clone)]
pub struct Registry {
    server_info: ServerInfo,
    tools: Vec<ToolDescriptor>,
}

impl Registry {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            server_info: ServerInfo::new(name, version),
            tools: Vec::new(),
        }
    }

    pub fn register(&mut self, descriptor: ToolDescriptor) {
        match self.tools.iter_mut().find(|t| t.name == descriptor.name) {
            Some(slot) => *slot = descriptor,
            None => self.tools.push(descriptor),
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.iter().find(|t| t.name == name)
    }

    /// Tools in registration order.
    pub fn list(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn name(&self) -> &str {
        &self.server_info.name
    }
}

impl Handler for Registry {
    fn server_info(&self) -> ServerInfo {
        self.server_info.clone()
    }

    fn list_tools(&self) -> ToolList {
        ToolList {
            tools: self.tools.iter().map(ToolDescriptor::info).collect(),
        }
    }

    fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<ToolCallResponse, jrpc::Error> {
        let Some(tool) = self.lookup(name) else {
            return Err(jrpc::Error::new(
                jrpc::METHOD_NOT_FOUND,
                format!("Tool '{name}' not found"),
                None,
            ));
        };
        match tool.invoke(arguments) {
            Ok(value) => Ok(ToolCallResponse::text(stringify(&value))),
            Err(e) => {
                logwise::error_sync!(
                    "tool {tool} failed: {error}",
                    tool = logwise::privacy::LogIt(&tool.name),
                    error = logwise::privacy::LogIt(&e)
                );
                Err(jrpc::Error::internal(format!("Tool execution failed: {e}")))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::tools::{ParamKind, ParameterSpec};
    use serde_json::json;

    #[test]
    fn one_entry_per_name() {
        let mut registry = Registry::new("t", "0");
        for _ in 0..3 {
            registry.register(ToolDescriptor::blocking("dup", "", vec![], |_| Ok(json!(null))));
        }
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.list_tools().tools.len(), 1);
    }

    #[test]
    fn non_string_results_are_rendered_as_json() {
        let mut registry = Registry::new("t", "0");
        registry.register(ToolDescriptor::blocking(
            "info",
            "",
            vec![],
            |_| Ok(json!({"version": "1.0.0"})),
        ));
        let response = registry.call_tool("info", Map::new()).unwrap();
        assert_eq!(response, ToolCallResponse::text(r#"{"version":"1.0.0"}"#));
    }

    #[test]
    fn missing_argument_reports_cause() {
        let mut registry = Registry::new("t", "0");
        registry.register(ToolDescriptor::blocking(
            "needs",
            "",
            vec![ParameterSpec::new("filename", ParamKind::String, true, "")],
            |_| Ok(json!("")),
        ));
        let error = registry.call_tool("needs", Map::new()).unwrap_err();
        assert_eq!(error.code, jrpc::INTERNAL_ERROR);
        assert_eq!(
            error.data,
            Some(json!("Tool execution failed: missing required argument 'filename'"))
        );
    }
}

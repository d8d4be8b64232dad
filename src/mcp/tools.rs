//! The tool model.
//!
//! A tool is a [`ToolDescriptor`]: a unique name, a human description, an
//! ordered list of [`ParameterSpec`]s, and a [`ToolBody`] that does the work.
//! Bodies receive their keyword arguments as [`Arguments`], already bound
//! against the parameter list (defaults filled in, required names checked),
//! and return any JSON value; the dispatcher turns that value into a single
//! text content item.
//!
//! # Examples
//!
//! ```
//! use daap_mcp::mcp::tools::{ParamKind, ParameterSpec, ToolDescriptor};
//! use serde_json::json;
//!
//! let tool = ToolDescriptor::blocking(
//!     "repeat",
//!     "Repeats a word",
//!     vec![
//!         ParameterSpec::new("word", ParamKind::String, true, "Word to repeat"),
//!         ParameterSpec::new("times", ParamKind::Integer, false, "Repetition count")
//!             .with_default(json!(2)),
//!     ],
//!     |args| Ok(json!(args.str("word")?.repeat(args.integer("times")? as usize))),
//! );
//!
//! let mut arguments = serde_json::Map::new();
//! arguments.insert("word".into(), json!("ab"));
//! assert_eq!(tool.invoke(arguments).unwrap(), json!("abab"));
//!
//! let schema = serde_json::to_value(tool.info()).unwrap();
//! assert_eq!(schema["inputSchema"]["required"], json!(["word"]));
//! assert_eq!(schema["inputSchema"]["properties"]["times"]["default"], json!(2));
//! ```

use serde_json::{Map, Value};
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

/// The value kind of a parameter, as it appears in an input schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    String,
    Integer,
    Boolean,
    Object,
}

/// One named parameter of a tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpec {
    pub name: String,
    pub kind: ParamKind,
    pub required: bool,
    pub description: String,
    /// Bound into [`Arguments`] when the caller omits this parameter.
    pub default: Option<Value>,
}

impl ParameterSpec {
    pub fn new(
        name: impl Into<String>,
        kind: ParamKind,
        required: bool,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            required,
            description: description.into(),
            default: None,
        }
    }

    /// Attaches a default value.  A parameter with a default is never required.
    pub fn with_default(mut self, default: Value) -> Self {
        self.required = false;
        self.default = Some(default);
        self
    }
}

/// Why a tool body failed.
///
/// The dispatcher reports every variant as an internal error whose `data`
/// reads `Tool execution failed: <display>`.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("missing required argument '{0}'")]
    MissingArgument(String),
    #[error("invalid argument '{name}': expected {expected}")]
    InvalidArgument { name: String, expected: &'static str },
    #[error("{0}")]
    Failed(String),
    #[error("tool panicked: {0}")]
    Panicked(String),
}

impl From<std::io::Error> for ToolError {
    fn from(e: std::io::Error) -> Self {
        ToolError::Failed(e.to_string())
    }
}

/// What a tool body returns.
pub type ToolResult = Result<Value, ToolError>;

type BodyFn = Arc<dyn Fn(Arguments) -> ToolResult + Send + Sync>;

/// An invocable tool body.
///
/// `Blocking` bodies run on the calling thread.  `Spawned` bodies run on a
/// dedicated worker thread that the caller joins before responding, so a
/// long-running body never shares a stack with the transport that called it.
/// Panics in either kind are caught and reported as [`ToolError::Panicked`].
#[derive(Clone)]
pub enum ToolBody {
    Blocking(BodyFn),
    Spawned(BodyFn),
}

impl fmt::Debug for ToolBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolBody::Blocking(_) => f.write_str("ToolBody::Blocking"),
            ToolBody::Spawned(_) => f.write_str("ToolBody::Spawned"),
        }
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

impl ToolBody {
    fn run(&self, name: &str, arguments: Arguments) -> ToolResult {
        match self {
            ToolBody::Blocking(body) => catch_unwind(AssertUnwindSafe(|| body(arguments)))
                .unwrap_or_else(|payload| Err(ToolError::Panicked(panic_message(payload)))),
            ToolBody::Spawned(body) => {
                let body = body.clone();
                let handle = std::thread::Builder::new()
                    .name(format!("daap-mcp::tool::{name}"))
                    .spawn(move || body(arguments))
                    .map_err(|e| ToolError::Failed(format!("could not start worker: {e}")))?;
                handle
                    .join()
                    .unwrap_or_else(|payload| Err(ToolError::Panicked(panic_message(payload))))
            }
        }
    }
}

/// Keyword arguments bound for one invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    values: Map<String, Value>,
}

impl Arguments {
    pub fn new(values: Map<String, Value>) -> Self {
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    fn require(&self, name: &str) -> Result<&Value, ToolError> {
        match self.values.get(name) {
            None | Some(Value::Null) => Err(ToolError::MissingArgument(name.to_string())),
            Some(value) => Ok(value),
        }
    }

    pub fn str(&self, name: &str) -> Result<&str, ToolError> {
        self.require(name)?
            .as_str()
            .ok_or_else(|| ToolError::InvalidArgument {
                name: name.to_string(),
                expected: "a string",
            })
    }

    /// Accepts JSON integers and strings holding one, since remote callers
    /// often quote numbers.
    pub fn integer(&self, name: &str) -> Result<i64, ToolError> {
        let value = self.require(name)?;
        value
            .as_i64()
            .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
            .ok_or_else(|| ToolError::InvalidArgument {
                name: name.to_string(),
                expected: "an integer",
            })
    }

    pub fn boolean(&self, name: &str) -> Result<bool, ToolError> {
        self.require(name)?
            .as_bool()
            .ok_or_else(|| ToolError::InvalidArgument {
                name: name.to_string(),
                expected: "a boolean",
            })
    }

    pub fn object(&self, name: &str) -> Result<&Map<String, Value>, ToolError> {
        self.require(name)?
            .as_object()
            .ok_or_else(|| ToolError::InvalidArgument {
                name: name.to_string(),
                expected: "an object",
            })
    }
}

/// A registered tool.
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ParameterSpec>,
    pub body: ToolBody,
}

impl ToolDescriptor {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Vec<ParameterSpec>,
        body: ToolBody,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            body,
        }
    }

    /// A tool whose body runs on the dispatching thread.
    pub fn blocking<F>(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Vec<ParameterSpec>,
        body: F,
    ) -> Self
    where
        F: Fn(Arguments) -> ToolResult + Send + Sync + 'static,
    {
        Self::new(name, description, parameters, ToolBody::Blocking(Arc::new(body)))
    }

    /// A tool whose body runs on its own worker thread, joined before the
    /// response is formed.
    pub fn spawned<F>(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Vec<ParameterSpec>,
        body: F,
    ) -> Self
    where
        F: Fn(Arguments) -> ToolResult + Send + Sync + 'static,
    {
        Self::new(name, description, parameters, ToolBody::Spawned(Arc::new(body)))
    }

    /// Metadata for `tools/list`.
    pub fn info(&self) -> ToolInfo {
        ToolInfo {
            name: self.name.clone(),
            description: self.description.clone(),
            input_schema: InputSchema::new(&self.parameters),
        }
    }

    /// Binds `arguments` against the parameter list and runs the body.
    ///
    /// Defaults fill absent optional parameters.  Arguments with no matching
    /// parameter are passed through untouched.
    pub fn invoke(&self, mut arguments: Map<String, Value>) -> ToolResult {
        for parameter in &self.parameters {
            let present = arguments.get(&parameter.name).is_some_and(|v| !v.is_null());
            if present {
                continue;
            }
            if let Some(default) = &parameter.default {
                arguments.insert(parameter.name.clone(), default.clone());
            } else if parameter.required {
                return Err(ToolError::MissingArgument(parameter.name.clone()));
            }
        }
        self.body.run(&self.name, Arguments::new(arguments))
    }
}

/// A collection of tool information, the `tools/list` result.
///
/// ```
/// use daap_mcp::mcp::tools::ToolList;
///
/// let json = serde_json::to_string(&ToolList::empty()).unwrap();
/// assert_eq!(json, r#"{"tools":[]}"#);
/// ```
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ToolList {
    pub tools: Vec<ToolInfo>,
}

impl ToolList {
    pub fn empty() -> Self {
        ToolList { tools: Vec::new() }
    }
}

/// Metadata about a tool.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: InputSchema,
}

/// A JSON-Schema-like description of a tool's parameters.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct InputSchema {
    /// Always `"object"`.
    #[serde(rename = "type")]
    pub kind: String,
    pub properties: Map<String, Value>,
    pub required: Vec<String>,
}

impl InputSchema {
    /// Builds a schema from parameter specs, keeping their order.
    ///
    /// ```
    /// use daap_mcp::mcp::tools::{InputSchema, ParamKind, ParameterSpec};
    /// use serde_json::json;
    ///
    /// let schema = InputSchema::new(&[
    ///     ParameterSpec::new("bucket_name", ParamKind::String, true, "S3 bucket name"),
    /// ]);
    /// assert_eq!(
    ///     serde_json::to_value(&schema).unwrap(),
    ///     json!({
    ///         "type": "object",
    ///         "properties": {"bucket_name": {"type": "string", "description": "S3 bucket name"}},
    ///         "required": ["bucket_name"]
    ///     })
    /// );
    /// ```
    pub fn new(parameters: &[ParameterSpec]) -> Self {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for parameter in parameters {
            let mut property = Map::new();
            property.insert(
                "type".to_string(),
                serde_json::to_value(parameter.kind).unwrap_or(Value::Null),
            );
            property.insert(
                "description".to_string(),
                Value::String(parameter.description.clone()),
            );
            if let Some(default) = &parameter.default {
                property.insert("default".to_string(), default.clone());
            }
            if parameter.required {
                required.push(parameter.name.clone());
            }
            properties.insert(parameter.name.clone(), Value::Object(property));
        }
        InputSchema {
            kind: "object".to_string(),
            properties,
            required,
        }
    }

    /// A schema with no parameters.
    pub fn empty() -> Self {
        Self::new(&[])
    }
}

/// The `tools/call` result.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ToolCallResponse {
    pub content: Vec<ToolContent>,
}

impl ToolCallResponse {
    pub fn new(content: Vec<ToolContent>) -> Self {
        ToolCallResponse { content }
    }

    /// A response holding a single text item.
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(vec![ToolContent::Text { text: text.into() }])
    }
}

/// Content returned by a tool.  Only text is produced.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
#[non_exhaustive]
pub enum ToolContent {
    Text { text: String },
}

impl ToolContent {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ToolContent::Text { text } => Some(text),
        }
    }
}

impl From<&str> for ToolContent {
    fn from(text: &str) -> Self {
        ToolContent::Text {
            text: text.to_string(),
        }
    }
}

impl From<String> for ToolContent {
    fn from(text: String) -> Self {
        ToolContent::Text { text }
    }
}

/// The textual form of a tool's return value.
///
/// Strings are used as-is; every other value is rendered as compact JSON.
///
/// ```
/// use daap_mcp::mcp::tools::stringify;
/// use serde_json::json;
///
/// assert_eq!(stringify(&json!("plain")), "plain");
/// assert_eq!(stringify(&json!({"a": 1})), r#"{"a":1}"#);
/// assert_eq!(stringify(&json!(42)), "42");
/// ```
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn echo(kind: fn(&str, &str, Vec<ParameterSpec>, fn(Arguments) -> ToolResult) -> ToolDescriptor) -> ToolDescriptor {
        kind(
            "echo",
            "Echo",
            vec![
                ParameterSpec::new("name", ParamKind::String, false, "Who").with_default(json!("World")),
            ],
            |args| Ok(json!(format!("Hello, {}!", args.str("name")?))),
        )
    }

    fn blocking(n: &str, d: &str, p: Vec<ParameterSpec>, b: fn(Arguments) -> ToolResult) -> ToolDescriptor {
        ToolDescriptor::blocking(n, d, p, b)
    }

    fn spawned(n: &str, d: &str, p: Vec<ParameterSpec>, b: fn(Arguments) -> ToolResult) -> ToolDescriptor {
        ToolDescriptor::spawned(n, d, p, b)
    }

    #[test]
    fn defaults_are_bound() {
        for tool in [echo(blocking), echo(spawned)] {
            assert_eq!(tool.invoke(Map::new()).unwrap(), json!("Hello, World!"));
            let mut args = Map::new();
            args.insert("name".into(), json!("Ada"));
            assert_eq!(tool.invoke(args).unwrap(), json!("Hello, Ada!"));
        }
    }

    #[test]
    fn missing_required_argument_fails_before_body() {
        let tool = ToolDescriptor::blocking(
            "needs",
            "",
            vec![ParameterSpec::new("filename", ParamKind::String, true, "")],
            |_| panic!("body must not run"),
        );
        let error = tool.invoke(Map::new()).unwrap_err();
        assert_eq!(error.to_string(), "missing required argument 'filename'");
    }

    #[test]
    fn panics_become_errors() {
        let blocking = ToolDescriptor::blocking("p", "", vec![], |_| panic!("kaput"));
        assert!(matches!(blocking.invoke(Map::new()), Err(ToolError::Panicked(m)) if m == "kaput"));
        let spawned = ToolDescriptor::spawned("p", "", vec![], |_| panic!("kaput"));
        assert!(matches!(spawned.invoke(Map::new()), Err(ToolError::Panicked(m)) if m == "kaput"));
    }

    #[test]
    fn integer_accepts_quoted_numbers() {
        let mut values = Map::new();
        values.insert("n".into(), json!("12"));
        values.insert("m".into(), json!(7));
        values.insert("x".into(), json!("seven"));
        let args = Arguments::new(values);
        assert_eq!(args.integer("n").unwrap(), 12);
        assert_eq!(args.integer("m").unwrap(), 7);
        assert!(matches!(args.integer("x"), Err(ToolError::InvalidArgument { .. })));
    }

    #[test]
    fn content_wire_shape() {
        let response = ToolCallResponse::text("hi");
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"content": [{"type": "text", "text": "hi"}]})
        );
    }
}

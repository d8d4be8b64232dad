//! Schema inference.
//!
//! Local tools declare their parameters through a [`Signature`]: names,
//! value kinds and optional defaults.  [`infer`] turns that into
//! [`ParameterSpec`]s, taking per-parameter descriptions from the `Args:`
//! section of the tool's documentation when there is one.
//!
//! Remote tools arrive with nothing but a name and free text.
//! [`infer_from_text`] recovers what it can from the `Args:` section.  This
//! is lossy: every recovered parameter is required, and the only types it
//! can tell apart are `integer` (the text mentions "number" or "count") and
//! `string`.

use crate::mcp::tools::{InputSchema, ParamKind, ParameterSpec};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static ARGS_SECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)Args:\s*\n(.*?)(?:\n\s*\n|\n\s*Returns?:|\z)").expect("static regex")
});

static ARG_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\w+)(?:\s*\([^)]*\))?\s*:\s*(.+)").expect("static regex")
});

/// One declared parameter, before inference.
#[derive(Debug, Clone, PartialEq)]
pub struct RawParam {
    pub name: String,
    pub kind: ParamKind,
    pub default: Option<Value>,
}

/// The declared parameters of a local tool, in order.
///
/// ```
/// use daap_mcp::mcp::schema::{infer, Signature};
/// use daap_mcp::mcp::tools::ParamKind;
/// use serde_json::json;
///
/// let signature = Signature::new()
///     .param("filename", ParamKind::String)
///     .optional("max_rows", ParamKind::Integer, json!(100));
/// let doc = "Read rows.\n\nArgs:\n    filename: Name of the CSV file\n    max_rows: Row limit\n";
///
/// let specs = infer(&signature, doc);
/// assert!(specs[0].required);
/// assert_eq!(specs[0].description, "Name of the CSV file");
/// assert!(!specs[1].required);
/// assert_eq!(specs[1].default, Some(json!(100)));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signature {
    params: Vec<RawParam>,
}

impl Signature {
    pub fn new() -> Self {
        Self::default()
    }

    /// A parameter without a default.
    pub fn param(mut self, name: impl Into<String>, kind: ParamKind) -> Self {
        self.params.push(RawParam {
            name: name.into(),
            kind,
            default: None,
        });
        self
    }

    /// A parameter with a default.
    pub fn optional(mut self, name: impl Into<String>, kind: ParamKind, default: Value) -> Self {
        self.params.push(RawParam {
            name: name.into(),
            kind,
            default: Some(default),
        });
        self
    }

    pub fn params(&self) -> &[RawParam] {
        &self.params
    }
}

/// `(name, description)` pairs from the `Args:` section of `text`, in order.
fn documented_args(text: &str) -> Vec<(String, String)> {
    let Some(section) = ARGS_SECTION.captures(text).and_then(|c| c.get(1)) else {
        return Vec::new();
    };
    section
        .as_str()
        .trim()
        .lines()
        .map(str::trim)
        .filter(|line| line.contains(':') && !line.starts_with('#'))
        .filter_map(|line| {
            let captures = ARG_LINE.captures(line)?;
            Some((captures[1].to_string(), captures[2].trim().to_string()))
        })
        .collect()
}

/// Derives parameter specs for a locally-defined tool.
///
/// A parameter is required exactly when it has no default.  Its description
/// comes from the matching `Args:` entry in `description`, or is empty.
pub fn infer(signature: &Signature, description: &str) -> Vec<ParameterSpec> {
    let documented = documented_args(description);
    signature
        .params
        .iter()
        .map(|raw| {
            let doc = documented
                .iter()
                .find(|(name, _)| *name == raw.name)
                .map(|(_, doc)| doc.clone())
                .unwrap_or_default();
            let spec = ParameterSpec::new(raw.name.clone(), raw.kind, true, doc);
            match &raw.default {
                Some(default) => spec.with_default(default.clone()),
                None => spec,
            }
        })
        .collect()
}

/// Derives an input schema from a tool's name and free-text description.
///
/// Falls back to a single required `filename` string when the `Args:`
/// section yields nothing and the name mentions "filename" or the
/// description mentions "file".  Otherwise the schema is empty.
///
/// ```
/// use daap_mcp::mcp::schema::infer_from_text;
/// use serde_json::json;
///
/// let schema = infer_from_text(
///     "read_csv_data",
///     "Args:\n    filename: Name of file\n    max_rows (int): count limit\nReturns:\n    str",
/// );
/// assert_eq!(schema.properties["filename"]["type"], json!("string"));
/// assert_eq!(schema.properties["max_rows"]["type"], json!("integer"));
/// assert_eq!(schema.required, ["filename", "max_rows"]);
/// ```
pub fn infer_from_text(name: &str, description: &str) -> InputSchema {
    let documented = documented_args(description);
    if !documented.is_empty() {
        let specs: Vec<ParameterSpec> = documented
            .into_iter()
            .map(|(name, doc)| {
                let lowered = doc.to_lowercase();
                let kind = if lowered.contains("number") || lowered.contains("count") {
                    ParamKind::Integer
                } else {
                    ParamKind::String
                };
                ParameterSpec::new(name, kind, true, doc)
            })
            .collect();
        return InputSchema::new(&specs);
    }
    if name.to_lowercase().contains("filename") || description.to_lowercase().contains("file") {
        return InputSchema::new(&[ParameterSpec::new(
            "filename",
            ParamKind::String,
            true,
            "Name of the file to process",
        )]);
    }
    InputSchema::empty()
}

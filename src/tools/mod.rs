//! The tools this server ships with.
//!
//! Each tool is declared with a [`Signature`] and a documentation string in
//! the usual `Args:` / `Returns:` layout.  The documentation doubles as the
//! tool's description, which lets a remote proxy recover a usable schema from
//! it with [`infer_from_text`](crate::mcp::schema::infer_from_text).

pub mod csv;
pub mod greeting;
#[cfg(feature = "sigv4")]
pub mod s3;

use crate::mcp::registry::Registry;
use crate::mcp::schema::{Signature, infer};
use crate::mcp::tools::{Arguments, ToolDescriptor, ToolResult};

/// The name every local transport reports.
pub const SERVICE_NAME: &str = "daap-mcp-server";

/// A tool that runs on the dispatching thread.
pub(crate) fn blocking<F>(name: &str, doc: &str, signature: Signature, body: F) -> ToolDescriptor
where
    F: Fn(Arguments) -> ToolResult + Send + Sync + 'static,
{
    ToolDescriptor::blocking(name, doc.trim(), infer(&signature, doc), body)
}

/// A tool that runs on its own worker thread.
#[cfg_attr(not(feature = "sigv4"), allow(dead_code))]
pub(crate) fn spawned<F>(name: &str, doc: &str, signature: Signature, body: F) -> ToolDescriptor
where
    F: Fn(Arguments) -> ToolResult + Send + Sync + 'static,
{
    ToolDescriptor::spawned(name, doc.trim(), infer(&signature, doc), body)
}

/// Every built-in tool, in a fixed order.
///
/// ```
/// use daap_mcp::tools::default_registry;
///
/// let registry = default_registry();
/// assert!(registry.lookup("summarize_csv_file").is_some());
/// assert!(registry.lookup("say_hello").is_some());
/// ```
pub fn default_registry() -> Registry {
    let mut registry = Registry::new(SERVICE_NAME, env!("CARGO_PKG_VERSION"));
    csv::register(&mut registry, crate::config::data_dir());
    greeting::register(&mut registry);
    #[cfg(feature = "sigv4")]
    s3::register(&mut registry);
    registry
}

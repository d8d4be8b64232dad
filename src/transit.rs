//! Transports that carry JSON-RPC to a [`Handler`](crate::mcp::Handler).
//!
//! - [`stdio`]: newline-framed JSON-RPC over a byte stream, usually
//!   stdin/stdout.
//! - [`lambda`]: a pure `handle(event) -> response` adapter for serverless
//!   HTTP events, plus a minimal runtime loop that feeds it.
//! - [`http`]: a small thread-per-connection HTTP/1.1 server that feeds the
//!   same adapter, for running the serverless surface locally.
//! - [`remote`]: a handler that forwards `tools/list` and `tools/call` to a
//!   deployed endpoint, optionally SigV4-signed.
//!
//! None of these use an async runtime.  Each connection gets its own thread
//! and all I/O is blocking.
//!
//! ```
//! use daap_mcp::mcp::registry::Registry;
//! use daap_mcp::transit::stdio;
//!
//! let registry = Registry::new("demo", "1.0.0");
//! let input = b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"tools/list\"}\n";
//! let mut output = Vec::new();
//! stdio::serve(&registry, &input[..], &mut output).unwrap();
//! assert_eq!(
//!     String::from_utf8(output).unwrap(),
//!     "{\"jsonrpc\":\"2.0\",\"id\":1,\"result\":{\"tools\":[]}}\n"
//! );
//! ```

#[cfg(target_arch = "wasm32")]
compile_error!("Transports are not supported on wasm32 targets.");

pub mod http;
pub mod lambda;
pub mod remote;
pub mod stdio;

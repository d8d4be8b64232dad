/*!
An MCP tool server for data inspection, reachable over stdio, serverless HTTP,
or a stdio proxy in front of a deployed endpoint.

daap-mcp exposes a small catalogue of tools (CSV summarization, S3 CSV
sampling, greetings) through the Model Context Protocol's JSON-RPC methods
`initialize`, `tools/list` and `tools/call`.

# Overview

The crate is organised around one seam, the [`Handler`](mcp::Handler) trait.
A handler owns tools; the dispatcher in [`mcp`] turns protocol requests into
handler calls and handler results into protocol responses.  Two handlers ship
with the crate:

- [`Registry`](mcp::registry::Registry), an in-memory set of local tools.
- [`RemoteProxy`](transit::remote::RemoteProxy), which forwards everything to
  a remote endpoint over HTTP and fails open when the link is down.

Transports in [`transit`] connect a handler to the outside world.  There is
no async runtime anywhere: transports use threads and blocking I/O.

# Key Features

- **Three transports**: newline-framed stdio, an API Gateway / Lambda event
  adapter (with a local HTTP server for development), and a signing proxy
- **Schema inference**: input schemas come from declared signatures and
  `Args:` documentation, or from free text alone for remote tools
- **Uniform failures**: tool errors and panics become JSON-RPC internal
  errors, never transport faults
- **SigV4 signing** (feature `sigv4`, on by default) for API Gateway IAM
  auth and S3

# Quick Start

```
use daap_mcp::mcp::{self, registry::Registry, schema::{infer, Signature}};
use daap_mcp::mcp::tools::{ParamKind, ToolDescriptor};
use serde_json::json;

const DOC: &str = "Greets a user.\n\nArgs:\n    name: Name to greet\n";

let mut registry = Registry::new("hello-server", "1.0.0");
registry.register(ToolDescriptor::blocking(
    "hello",
    DOC,
    infer(&Signature::new().param("name", ParamKind::String), DOC),
    |args| Ok(json!(format!("Hello, {}!", args.str("name")?))),
));

let response = mcp::handle_bytes(&registry, br#"{
    "jsonrpc": "2.0", "id": 1, "method": "tools/call",
    "params": {"name": "hello", "arguments": {"name": "Ada"}}
}"#).unwrap();
assert_eq!(
    response.result.unwrap(),
    json!({"content": [{"type": "text", "text": "Hello, Ada!"}]})
);
```

# Binaries

| Binary | Purpose |
|---|---|
| `daap-mcp-stdio` | built-in tools over stdin/stdout |
| `daap-mcp-http` | built-in tools over local HTTP (`MCP_HTTP_ADDR`, default `127.0.0.1:8000`) |
| `daap-mcp-lambda` | Lambda custom runtime serving the HTTP adapter |
| `daap-mcp-proxy` | stdio server forwarding to `API_GATEWAY_URL` |

# Logging

Diagnostics go through `logwise` and end up on stderr, so stdout stays reserved for the stdio protocol stream.
*/

#[cfg(feature = "sigv4")]
pub mod aws;
pub mod config;
pub mod jrpc;
pub mod mcp;
pub mod tools;
pub mod transit;

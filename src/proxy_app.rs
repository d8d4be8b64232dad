//! Stdio MCP server that forwards tool traffic to a deployed endpoint.
//!
//! Configure with `API_GATEWAY_URL` (or `--endpoint`).  Pass `--sign` to sign
//! outbound requests with SigV4 using the ambient AWS credentials.

use clap::Parser;
use daap_mcp::config::ProxyConfig;
use daap_mcp::transit::{remote::RemoteProxy, stdio::Server};
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "daap-mcp-proxy", version, about = "Forward MCP tool calls over HTTP")]
struct Cli {
    #[command(flatten)]
    proxy: ProxyConfig,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = cli.proxy.resolve_env_fallbacks();
    let proxy = match RemoteProxy::new(config) {
        Ok(proxy) => proxy,
        Err(e) => {
            logwise::error_sync!("MCP server error: {error}", error = logwise::privacy::LogIt(&e));
            return ExitCode::FAILURE;
        }
    };
    match Server::new(Arc::new(proxy)).and_then(Server::wait) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            logwise::error_sync!("MCP server error: {error}", error = logwise::privacy::LogIt(&e));
            ExitCode::FAILURE
        }
    }
}

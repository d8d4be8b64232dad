//! Serves the built-in tools over stdin/stdout.

use daap_mcp::tools::default_registry;
use daap_mcp::transit::stdio::Server;
use std::process::ExitCode;
use std::sync::Arc;

fn main() -> ExitCode {
    let registry = default_registry();
    logwise::info_sync!(
        "Starting MCP server with {count} tools",
        count = logwise::privacy::LogIt(&registry.len())
    );
    match Server::new(Arc::new(registry)).and_then(Server::wait) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            logwise::error_sync!("stdio server failed: {error}", error = logwise::privacy::LogIt(&e));
            ExitCode::FAILURE
        }
    }
}

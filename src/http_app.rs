//! Serves the built-in tools over local HTTP, with the same routes a deployed
//! function exposes (`POST /mcp`, `GET /health`).

use clap::Parser;
use daap_mcp::config::HttpConfig;
use daap_mcp::tools::default_registry;
use daap_mcp::transit::http::Server;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "daap-mcp-http", version, about = "Serve MCP tools over local HTTP")]
struct Cli {
    #[command(flatten)]
    http: HttpConfig,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match Server::new(cli.http.addr.as_str(), Arc::new(default_registry())) {
        Ok(_server) => loop {
            std::thread::park();
        },
        Err(e) => {
            logwise::error_sync!(
                "could not listen on {addr}: {error}",
                addr = logwise::privacy::LogIt(&cli.http.addr),
                error = logwise::privacy::LogIt(&e)
            );
            ExitCode::FAILURE
        }
    }
}

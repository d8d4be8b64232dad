//! AWS Lambda custom runtime entry point (`bootstrap`).

use daap_mcp::transit::lambda::runtime::Runtime;
use std::process::ExitCode;

fn main() -> ExitCode {
    let result = Runtime::from_env().and_then(|runtime| runtime.run());
    if let Err(e) = result {
        logwise::error_sync!("Lambda runtime error: {error}", error = logwise::privacy::LogIt(&e));
    }
    ExitCode::FAILURE
}

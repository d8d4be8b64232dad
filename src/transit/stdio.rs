//! Newline-framed JSON-RPC over a byte stream.
//!
//! Each inbound line is one message.  Each response is written as one line of
//! compact JSON and flushed immediately.  Requests are handled one at a time,
//! in arrival order.

use crate::mcp::{self, Handler};
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Serves `handler` until `input` reaches end of stream.
///
/// Blank lines are skipped.  Notifications are consumed without writing
/// anything.  A line that is not valid JSON (or not even UTF-8) is answered
/// with an error and the loop carries on.  A read or write failure ends the
/// loop with that error.
pub fn serve<H, R, W>(handler: &H, mut input: R, mut output: W) -> io::Result<()>
where
    H: Handler + ?Sized,
    R: BufRead,
    W: Write,
{
    let mut line = Vec::new();
    loop {
        line.clear();
        if input.read_until(b'\n', &mut line)? == 0 {
            return Ok(());
        }
        let message = line.trim_ascii();
        if message.is_empty() {
            continue;
        }
        let Some(response) = mcp::handle_bytes(handler, message) else {
            continue;
        };
        let bytes = serde_json::to_vec(&response).map_err(io::Error::other)?;
        output.write_all(&bytes)?;
        output.write_all(b"\n")?;
        output.flush()?;
    }
}

/// A stdio server running on its own thread.
pub struct Server {
    thread: JoinHandle<io::Result<()>>,
}

impl Server {
    /// Starts serving `handler` over the process's stdin and stdout.
    pub fn new<H: Handler + 'static>(handler: Arc<H>) -> io::Result<Self> {
        let thread = std::thread::Builder::new()
            .name("daap-mcp::stdio".to_string())
            .spawn(move || {
                let stdin = io::stdin();
                let stdout = io::stdout();
                let result = serve(handler.as_ref(), stdin.lock(), stdout.lock());
                if let Err(e) = &result {
                    logwise::error_sync!(
                        "stdio transport failed: {error}",
                        error = logwise::privacy::LogIt(e)
                    );
                }
                result
            })?;
        logwise::info_sync!("Serving MCP on stdin/stdout");
        Ok(Server { thread })
    }

    /// Blocks until stdin closes.
    pub fn wait(self) -> io::Result<()> {
        self.thread
            .join()
            .unwrap_or_else(|_| Err(io::Error::other("stdio thread panicked")))
    }
}

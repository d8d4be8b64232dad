//! A minimal AWS Lambda custom runtime loop.
//!
//! Polls the Runtime API for the next invocation, decodes it as an
//! [`HttpEvent`], hands it to [`handle`](super::handle), and posts the
//! [`HttpResponse`](super::HttpResponse) back.  Events that are not HTTP
//! events are reported through the invocation error endpoint.

use super::{HttpEvent, handle};
use std::time::Duration;

const API_VERSION: &str = "2018-06-01";
const REQUEST_ID_HEADER: &str = "Lambda-Runtime-Aws-Request-Id";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("AWS_LAMBDA_RUNTIME_API is not set")]
    NoRuntimeApi,
    #[error("runtime API request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invocation is missing the Lambda-Runtime-Aws-Request-Id header")]
    MissingRequestId,
}

/// A client for one Runtime API endpoint.
pub struct Runtime {
    client: reqwest::blocking::Client,
    base: String,
}

impl Runtime {
    /// `api` is the `host:port` from `AWS_LAMBDA_RUNTIME_API`.
    pub fn new(api: &str) -> Result<Self, Error> {
        // The next-invocation call blocks until an event arrives.
        let client = reqwest::blocking::Client::builder()
            .timeout(None::<Duration>)
            .build()?;
        Ok(Runtime {
            client,
            base: format!("http://{api}/{API_VERSION}/runtime"),
        })
    }

    pub fn from_env() -> Result<Self, Error> {
        let api = std::env::var("AWS_LAMBDA_RUNTIME_API").map_err(|_| Error::NoRuntimeApi)?;
        Self::new(&api)
    }

    /// Serves one invocation.
    pub fn next(&self) -> Result<(), Error> {
        let invocation = self
            .client
            .get(format!("{}/invocation/next", self.base))
            .send()?
            .error_for_status()?;
        let request_id = invocation
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or(Error::MissingRequestId)?;
        let payload = invocation.bytes()?;

        match serde_json::from_slice::<HttpEvent>(&payload) {
            Ok(event) => {
                let response = handle(&event);
                self.client
                    .post(format!("{}/invocation/{request_id}/response", self.base))
                    .json(&response)
                    .send()?
                    .error_for_status()?;
            }
            Err(e) => {
                logwise::error_sync!(
                    "invocation {id} is not an HTTP event: {error}",
                    id = logwise::privacy::LogIt(&request_id),
                    error = logwise::privacy::LogIt(&e)
                );
                self.client
                    .post(format!("{}/invocation/{request_id}/error", self.base))
                    .json(&serde_json::json!({
                        "errorMessage": e.to_string(),
                        "errorType": "InvalidEvent",
                    }))
                    .send()?
                    .error_for_status()?;
            }
        }
        Ok(())
    }

    /// Serves invocations until the Runtime API becomes unreachable.
    pub fn run(&self) -> Result<(), Error> {
        loop {
            self.next()?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_layout() {
        let runtime = Runtime::new("127.0.0.1:9001").unwrap();
        assert_eq!(runtime.base, "http://127.0.0.1:9001/2018-06-01/runtime");
    }
}

//! Runtime configuration for the binaries.
//!
//! Each struct is a clap [`Args`](clap::Args) group, so every setting can come
//! from a flag or its environment variable.  They also implement [`Default`]
//! so tests and embedders can build them directly.

use clap::Args;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_REGION: &str = "eu-central-1";
pub const DEFAULT_SIGNING_SERVICE: &str = "execute-api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_HTTP_ADDR: &str = "127.0.0.1:8000";
pub const DEFAULT_DATA_DIR: &str = "data";

/// Settings for the stdio-to-HTTP proxy.
#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct ProxyConfig {
    /// Remote MCP endpoint (falls back to MCP_SERVER_URL)
    #[arg(long, env = "API_GATEWAY_URL")]
    pub endpoint: Option<String>,

    /// Region used when signing requests
    #[arg(long, env = "AWS_REGION", default_value = DEFAULT_REGION)]
    pub region: String,

    /// Named profile in the shared credentials file
    #[arg(long, env = "AWS_PROFILE")]
    pub profile: Option<String>,

    /// Sign outbound requests with SigV4
    #[arg(long, env = "MCP_PROXY_SIGN")]
    pub sign: bool,

    /// Service name used in the SigV4 scope
    #[arg(long, env = "MCP_PROXY_SIGNING_SERVICE", default_value = DEFAULT_SIGNING_SERVICE)]
    pub service: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        ProxyConfig {
            endpoint: None,
            region: DEFAULT_REGION.to_string(),
            profile: None,
            sign: false,
            service: DEFAULT_SIGNING_SERVICE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ProxyConfig {
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        ProxyConfig {
            endpoint: Some(endpoint.into()),
            ..ProxyConfig::default()
        }
    }

    /// Fills `endpoint` from `MCP_SERVER_URL` when neither the flag nor
    /// `API_GATEWAY_URL` supplied one.
    pub fn resolve_env_fallbacks(mut self) -> Self {
        if self.endpoint.as_deref().is_none_or(str::is_empty) {
            self.endpoint = std::env::var("MCP_SERVER_URL").ok().filter(|s| !s.is_empty());
        }
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Settings for the local HTTP server.
#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct HttpConfig {
    /// Address to listen on
    #[arg(long, env = "MCP_HTTP_ADDR", default_value = DEFAULT_HTTP_ADDR)]
    pub addr: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig {
            addr: DEFAULT_HTTP_ADDR.to_string(),
        }
    }
}

/// Directory the local CSV tools read from (`MCP_DATA_DIR`, default `data`).
pub fn data_dir() -> PathBuf {
    std::env::var_os("MCP_DATA_DIR")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Cli {
        #[command(flatten)]
        proxy: ProxyConfig,
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::parse_from([
            "proxy",
            "--endpoint",
            "https://example.com/mcp",
            "--region",
            "us-east-1",
            "--sign",
        ]);
        assert_eq!(cli.proxy.endpoint.as_deref(), Some("https://example.com/mcp"));
        assert_eq!(cli.proxy.region, "us-east-1");
        assert!(cli.proxy.sign);
        assert_eq!(cli.proxy.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn explicit_endpoint_wins_over_fallback() {
        let config = ProxyConfig::with_endpoint("https://a.example/mcp").resolve_env_fallbacks();
        assert_eq!(config.endpoint.as_deref(), Some("https://a.example/mcp"));
    }
}

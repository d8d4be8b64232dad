//! AWS request signing.
//!
//! Just enough of AWS to call API Gateway and S3 without an SDK:
//! [`credentials`] finds an access key, and [`sigv4`] signs a request with it.

pub mod credentials;
pub mod sigv4;

pub use credentials::Credentials;
pub use sigv4::Signer;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no AWS credentials found for profile '{0}'")]
    NoCredentials(String),
    #[error("could not read credentials file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("could not locate the home directory")]
    NoHomeDir,
}

//! AWS Signature Version 4.
//!
//! [`Signer::sign`] computes the headers to add to a request so that API
//! Gateway (IAM auth) or S3 accepts it.  The request itself is not touched;
//! callers add the returned headers and send exactly the URL and body that
//! were signed.

use super::Credentials;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use reqwest::Url;
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Signs requests for one service in one region.
#[derive(Debug, Clone)]
pub struct Signer {
    pub credentials: Credentials,
    pub region: String,
    pub service: String,
}

fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

fn hmac_sha256(key: &[u8], message: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(message);
    mac.finalize().into_bytes().to_vec()
}

/// Everything outside the RFC 3986 unreserved set gets encoded.
pub(crate) const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

fn uri_encode(input: &str) -> String {
    utf8_percent_encode(input, UNRESERVED).to_string()
}

fn host_header(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    }
}

impl Signer {
    pub fn new(credentials: Credentials, region: impl Into<String>, service: impl Into<String>) -> Self {
        Signer {
            credentials,
            region: region.into(),
            service: service.into(),
        }
    }

    fn is_s3(&self) -> bool {
        self.service == "s3"
    }

    fn canonical_uri(&self, url: &Url) -> String {
        let path = url.path();
        if path.is_empty() {
            return "/".to_string();
        }
        path.split('/')
            .map(|segment| {
                let once = uri_encode(&percent_decode_str(segment).decode_utf8_lossy());
                // Every service but S3 expects the path encoded twice.
                if self.is_s3() { once } else { uri_encode(&once) }
            })
            .collect::<Vec<_>>()
            .join("/")
    }

    fn canonical_query(url: &Url) -> String {
        let mut pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (uri_encode(&k), uri_encode(&v)))
            .collect();
        pairs.sort();
        pairs
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// The headers covered by the signature, lowercased and sorted.
    fn signed_header_set(
        &self,
        url: &Url,
        headers: &[(String, String)],
        amz_date: &str,
        payload_hash: &str,
    ) -> Vec<(String, String)> {
        let mut signed: Vec<(String, String)> = headers
            .iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v.split_whitespace().collect::<Vec<_>>().join(" ")))
            .filter(|(k, _)| k != "host" && k != "authorization")
            .collect();
        signed.push(("host".to_string(), host_header(url)));
        signed.push(("x-amz-date".to_string(), amz_date.to_string()));
        if self.is_s3() {
            signed.push(("x-amz-content-sha256".to_string(), payload_hash.to_string()));
        }
        if let Some(token) = &self.credentials.session_token {
            signed.push(("x-amz-security-token".to_string(), token.clone()));
        }
        signed.sort();
        signed.dedup_by(|a, b| a.0 == b.0);
        signed
    }

    /// Returns `(canonical request, signed header names)`.
    pub(crate) fn canonical_request(
        &self,
        method: &str,
        url: &Url,
        headers: &[(String, String)],
        payload_hash: &str,
        amz_date: &str,
    ) -> (String, String) {
        let signed = self.signed_header_set(url, headers, amz_date, payload_hash);
        let canonical_headers: String = signed.iter().map(|(k, v)| format!("{k}:{v}\n")).collect();
        let signed_names = signed
            .iter()
            .map(|(k, _)| k.as_str())
            .collect::<Vec<_>>()
            .join(";");
        let canonical = format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            method.to_ascii_uppercase(),
            self.canonical_uri(url),
            Self::canonical_query(url),
            canonical_headers,
            signed_names,
            payload_hash
        );
        (canonical, signed_names)
    }

    fn signing_key(&self, date: &str) -> Vec<u8> {
        let secret = format!("AWS4{}", self.credentials.secret_access_key);
        let k_date = hmac_sha256(secret.as_bytes(), date.as_bytes());
        let k_region = hmac_sha256(&k_date, self.region.as_bytes());
        let k_service = hmac_sha256(&k_region, self.service.as_bytes());
        hmac_sha256(&k_service, b"aws4_request")
    }

    /// Headers to add to the request: `x-amz-date`, `authorization`, and
    /// `x-amz-security-token` / `x-amz-content-sha256` when they apply.
    ///
    /// `headers` are any extra headers the request will carry that should be
    /// covered by the signature, such as `content-type`.
    pub fn sign(
        &self,
        method: &str,
        url: &Url,
        headers: &[(String, String)],
        body: &[u8],
        now: DateTime<Utc>,
    ) -> Vec<(String, String)> {
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date = now.format("%Y%m%d").to_string();
        let payload_hash = sha256_hex(body);
        let (canonical, signed_names) = self.canonical_request(method, url, headers, &payload_hash, &amz_date);

        let scope = format!("{date}/{}/{}/aws4_request", self.region, self.service);
        let string_to_sign = format!(
            "{ALGORITHM}\n{amz_date}\n{scope}\n{}",
            sha256_hex(canonical.as_bytes())
        );
        let signature = hex::encode(hmac_sha256(&self.signing_key(&date), string_to_sign.as_bytes()));

        let mut out = vec![
            ("x-amz-date".to_string(), amz_date),
            (
                "authorization".to_string(),
                format!(
                    "{ALGORITHM} Credential={}/{scope}, SignedHeaders={signed_names}, Signature={signature}",
                    self.credentials.access_key_id
                ),
            ),
        ];
        if self.is_s3() {
            out.push(("x-amz-content-sha256".to_string(), payload_hash));
        }
        if let Some(token) = &self.credentials.session_token {
            out.push(("x-amz-security-token".to_string(), token.clone()));
        }
        out
    }
}

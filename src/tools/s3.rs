//! Sampling CSV objects stored in S3.
//!
//! Objects are fetched with a SigV4-signed GET against the bucket's virtual
//! host, so no SDK is involved.  Only the first [`CHUNK_ROWS`] data rows are
//! examined.

use super::spawned;
use crate::aws::sigv4::UNRESERVED;
use crate::aws::{Credentials, Signer};
use crate::config::DEFAULT_REGION;
use crate::mcp::registry::Registry;
use crate::mcp::schema::Signature;
use crate::mcp::tools::{ParamKind, ToolError};
use crate::tools::csv::parse;
use percent_encoding::{AsciiSet, utf8_percent_encode};
use serde_json::json;
use std::time::Duration;

pub const CHUNK_ROWS: usize = 1000;
pub const SAMPLE_ROWS: usize = 50;
const MAX_VALUE_CHARS: usize = 50;

/// Object keys keep their `/` separators.
const OBJECT_KEY: &AsciiSet = &UNRESERVED.remove(b'/');

fn encode_key(key: &str) -> String {
    utf8_percent_encode(key, OBJECT_KEY).to_string()
}

fn region() -> String {
    std::env::var("AWS_REGION")
        .ok()
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| DEFAULT_REGION.to_string())
}

/// Downloads `s3://bucket/key` as text.
pub fn fetch_object(bucket: &str, key: &str, region: &str) -> Result<String, ToolError> {
    let failed = |cause: String| ToolError::Failed(format!("Failed to process S3 CSV s3://{bucket}/{key}: {cause}"));
    let url = reqwest::Url::parse(&format!(
        "https://{bucket}.s3.{region}.amazonaws.com/{}",
        encode_key(key.trim_start_matches('/'))
    ))
    .map_err(|e| failed(e.to_string()))?;
    let profile = std::env::var("AWS_PROFILE").ok();
    let credentials = Credentials::load(profile.as_deref()).map_err(|e| failed(e.to_string()))?;
    let signer = Signer::new(credentials, region, "s3");
    let headers = signer.sign("GET", &url, &[], b"", chrono::Utc::now());

    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(crate::config::DEFAULT_TIMEOUT_SECS))
        .build()
        .map_err(|e| failed(e.to_string()))?;
    let mut request = client.get(url);
    for (name, value) in headers {
        request = request.header(name, value);
    }
    let response = request.send().map_err(|e| failed(e.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(failed(format!("HTTP error: {}", status.as_u16())));
    }
    response.text().map_err(|e| failed(e.to_string()))
}

fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn shorten(value: &str) -> String {
    if value.chars().count() > MAX_VALUE_CHARS {
        let head: String = value.chars().take(MAX_VALUE_CHARS - 3).collect();
        format!("{head}...")
    } else {
        value.to_string()
    }
}

/// Builds the basic-info report for the first chunk of a CSV object.
pub fn report(file_path: &str, text: &str) -> Result<String, ToolError> {
    let mut records = parse(text)
        .map_err(|e| ToolError::Failed(format!("Failed to process S3 CSV {file_path}: {e}")))?
        .into_iter();
    let columns = records.next().unwrap_or_default();
    let rows: Vec<Vec<String>> = records.take(CHUNK_ROWS).collect();
    let sample = &rows[..rows.len().min(SAMPLE_ROWS)];

    let mut lines = vec![
        "📊 S3 CSV Basic Info".to_string(),
        "===================".to_string(),
        format!("📁 File: {file_path}"),
        format!("📊 Count: {} rows", group_thousands(rows.len())),
        format!("📋 Columns: {} ({})", columns.len(), columns.join(", ")),
        format!("\n📄 Sample Data (first {} rows):", sample.len()),
    ];
    for (i, row) in sample.iter().enumerate() {
        let mut entry = format!("  Row {}:", i + 1);
        for (column, value) in columns.iter().zip(row.iter()) {
            entry.push_str(&format!("\n    {column}: {}", shorten(value)));
        }
        lines.push(entry);
    }
    Ok(lines.join("\n"))
}

const ANALYZE_S3_CSV: &str = "
Get basic information from a CSV file stored in AWS S3.

Args:
    bucket_name: Name of the S3 bucket containing the CSV file
    file_key: S3 object key (path) to the CSV file

Returns:
    Basic info: count, columns, and sample 50 records.
";

pub fn register(registry: &mut Registry) {
    registry.register(spawned(
        "analyze_s3_csv",
        ANALYZE_S3_CSV,
        Signature::new()
            .param("bucket_name", ParamKind::String)
            .param("file_key", ParamKind::String),
        |args| {
            let bucket = args.str("bucket_name")?;
            let key = args.str("file_key")?;
            let file_path = format!("s3://{bucket}/{key}");
            logwise::info_sync!(
                "Getting basic info from S3 CSV: {path}",
                path = logwise::privacy::LogIt(&file_path)
            );
            let text = fetch_object(bucket, key, &region())?;
            Ok(json!(report(&file_path, &text)?))
        },
    ));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thousands_are_grouped() {
        assert_eq!(group_thousands(7), "7");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1234567), "1,234,567");
    }

    #[test]
    fn long_values_are_shortened() {
        let long = "x".repeat(51);
        let shortened = shorten(&long);
        assert_eq!(shortened.chars().count(), 50);
        assert!(shortened.ends_with("..."));
        assert_eq!(shorten(&"y".repeat(50)), "y".repeat(50));
    }

    #[test]
    fn report_layout() {
        let text = report("s3://b/k.csv", "id,name\n1,Ada\n2,Grace\n").unwrap();
        let expected = "📊 S3 CSV Basic Info\n\
                        ===================\n\
                        📁 File: s3://b/k.csv\n\
                        📊 Count: 2 rows\n\
                        📋 Columns: 2 (id, name)\n\
                        \n📄 Sample Data (first 2 rows):\n  Row 1:\n    id: 1\n    name: Ada\n  Row 2:\n    id: 2\n    name: Grace";
        assert_eq!(text, expected);
    }

    #[test]
    fn only_the_first_chunk_counts() {
        let mut csv = String::from("n\n");
        for i in 0..1500 {
            csv.push_str(&format!("{i}\n"));
        }
        let text = report("s3://b/big.csv", &csv).unwrap();
        assert!(text.contains("📊 Count: 1,000 rows"));
        assert!(text.contains("(first 50 rows)"));
        assert!(!text.contains("Row 51:"));
    }

    #[test]
    fn keys_keep_their_slashes() {
        assert_eq!(encode_key("reports/2024 q1.csv"), "reports/2024%20q1.csv");
        assert_eq!(encode_key("a+b/ü~x.csv"), "a%2Bb/%C3%BC~x.csv");
    }
}

//! CSV tools over a local data directory.
//!
//! `summarize_csv_file` reads a real file.  The rest of the family
//! acknowledges the request and reports what it would do; they exist so
//! clients have a realistic catalogue to discover and call.

use super::blocking;
use crate::mcp::registry::Registry;
use crate::mcp::schema::Signature;
use crate::mcp::tools::{ParamKind, ToolError};
use serde_json::json;
use std::path::{Component, Path, PathBuf};

/// Splits CSV text into records of fields.
///
/// Every line is a record, including the header.  Records may differ in
/// length.  Quoting, `\r\n` line endings and blank lines are handled by the
/// `csv` reader.
///
/// ```
/// use daap_mcp::tools::csv::parse;
///
/// let rows = parse("name,note\r\n\"Smith, J\",\"said \"\"hi\"\"\"\n").unwrap();
/// assert_eq!(rows, vec![vec!["name", "note"], vec!["Smith, J", "said \"hi\""]]);
/// ```
pub fn parse(text: &str) -> Result<Vec<Vec<String>>, ::csv::Error> {
    ::csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes())
        .records()
        .map(|record| record.map(|fields| fields.iter().map(str::to_string).collect::<Vec<_>>()))
        .collect()
}

/// Resolves `filename` inside `dir`, refusing anything that could escape it.
fn resolve(dir: &Path, filename: &str) -> Result<PathBuf, ToolError> {
    let mut components = Path::new(filename).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(name)), None) => Ok(dir.join(name)),
        _ => Err(ToolError::InvalidArgument {
            name: "filename".to_string(),
            expected: "a plain file name inside the data directory",
        }),
    }
}

/// `CSV file '<name>' has <rows> rows and <columns> columns.`
///
/// Rows exclude the header line.
pub fn summarize(dir: &Path, filename: &str) -> Result<String, ToolError> {
    let path = resolve(dir, filename)?;
    let text = std::fs::read_to_string(&path)
        .map_err(|e| ToolError::Failed(format!("Failed to process CSV file {filename}: {e}")))?;
    let records = parse(&text)
        .map_err(|e| ToolError::Failed(format!("Failed to process CSV file {filename}: {e}")))?;
    let columns = records.first().map_or(0, Vec::len);
    let rows = records.len().saturating_sub(1);
    logwise::info_sync!(
        "Processed CSV file: {file}",
        file = logwise::privacy::LogIt(&filename)
    );
    Ok(format!(
        "CSV file '{filename}' has {rows} rows and {columns} columns."
    ))
}

const SUMMARIZE_CSV_FILE: &str = "
Summarize a CSV file by reporting its number of rows and columns.

Args:
    filename: Name of the CSV file in the /data directory (e.g., 'sample.csv')

Returns:
    A string describing the file's dimensions.
";

const READ_CSV_DATA: &str = "
Read and return CSV data content.

Args:
    filename: Name of the CSV file to read
    max_rows: Maximum number of rows to return (default: 100)

Returns:
    CSV data as a formatted string.
";

const ANALYZE_CSV_STATS: &str = "
Analyze CSV file statistics and data types.

Args:
    filename: Name of the CSV file to analyze
    include_headers: Whether to include header analysis (default: True)

Returns:
    Statistical analysis of the CSV file.
";

const CONVERT_CSV_FORMAT: &str = "
Convert CSV file to different format.

Args:
    filename: Name of the CSV file to convert
    output_format: Target format (json, tsv, excel)
    delimiter: CSV delimiter character (default: comma)

Returns:
    Conversion status and output file path.
";

const VALIDATE_CSV_STRUCTURE: &str = "
Validate CSV file structure and format.

Args:
    filename: Name of the CSV file to validate
    expected_columns: Expected number of columns
    strict_mode: Enable strict validation (default: False)

Returns:
    Validation results and any issues found.
";

const FILTER_CSV_DATA: &str = "
Filter CSV data based on column value.

Args:
    filename: Name of the CSV file to filter
    column_name: Column name to filter by
    filter_value: Value to filter for

Returns:
    Filtered CSV data.
";

const MERGE_CSV_FILES: &str = "
Merge two CSV files based on a common column.

Args:
    file1: First CSV file path
    file2: Second CSV file path
    join_column: Column name to join on
    join_type: Type of join (inner, left, right, outer)

Returns:
    Merged CSV data.
";

const EXPORT_CSV_DATA: &str = "
Export CSV data to different file formats.

Args:
    filename: Source CSV file path
    output_path: Destination file path
    format_type: Export format (json, xml, yaml)

Returns:
    Export status and file location.
";

const GENERATE_CSV_REPORT: &str = "
Generate a comprehensive report from CSV data.

Args:
    filename: CSV file to generate report from
    report_type: Type of report (summary, detailed, executive)
    include_charts: Whether to include visual charts (default: True)

Returns:
    Generated report content.
";

const CLEAN_CSV_DATA: &str = "
Clean and preprocess CSV data.

Args:
    filename: CSV file to clean
    remove_duplicates: Whether to remove duplicate rows (default: True)
    fill_missing: How to handle missing values (skip, mean, median, zero)

Returns:
    Cleaning results and processed data.
";

const SEARCH_CSV_CONTENT: &str = "
Search for specific content within CSV data.

Args:
    filename: CSV file to search in
    search_term: Term to search for
    case_sensitive: Whether search should be case sensitive (default: False)

Returns:
    Search results and matching rows.
";

pub fn register(registry: &mut Registry, data_dir: PathBuf) {
    registry.register(blocking(
        "summarize_csv_file",
        SUMMARIZE_CSV_FILE,
        Signature::new().param("filename", ParamKind::String),
        move |args| Ok(json!(summarize(&data_dir, args.str("filename")?)?)),
    ));
    registry.register(blocking(
        "read_csv_data",
        READ_CSV_DATA,
        Signature::new()
            .param("filename", ParamKind::String)
            .optional("max_rows", ParamKind::Integer, json!(100)),
        |args| {
            Ok(json!(format!(
                "Reading {} with max {} rows",
                args.str("filename")?,
                args.integer("max_rows")?
            )))
        },
    ));
    registry.register(blocking(
        "analyze_csv_stats",
        ANALYZE_CSV_STATS,
        Signature::new()
            .param("filename", ParamKind::String)
            .optional("include_headers", ParamKind::Boolean, json!(true)),
        |args| {
            Ok(json!(format!(
                "Analyzing {} with headers: {}",
                args.str("filename")?,
                args.boolean("include_headers")?
            )))
        },
    ));
    registry.register(blocking(
        "convert_csv_format",
        CONVERT_CSV_FORMAT,
        Signature::new()
            .param("filename", ParamKind::String)
            .param("output_format", ParamKind::String)
            .optional("delimiter", ParamKind::String, json!(",")),
        |args| {
            Ok(json!(format!(
                "Converting {} to {}",
                args.str("filename")?,
                args.str("output_format")?
            )))
        },
    ));
    registry.register(blocking(
        "validate_csv_structure",
        VALIDATE_CSV_STRUCTURE,
        Signature::new()
            .param("filename", ParamKind::String)
            .param("expected_columns", ParamKind::Integer)
            .optional("strict_mode", ParamKind::Boolean, json!(false)),
        |args| {
            args.integer("expected_columns")?;
            Ok(json!(format!("Validating {} structure", args.str("filename")?)))
        },
    ));
    registry.register(blocking(
        "filter_csv_data",
        FILTER_CSV_DATA,
        Signature::new()
            .param("filename", ParamKind::String)
            .param("column_name", ParamKind::String)
            .param("filter_value", ParamKind::String),
        |args| {
            Ok(json!(format!(
                "Filtering {} by {}",
                args.str("filename")?,
                args.str("column_name")?
            )))
        },
    ));
    registry.register(blocking(
        "merge_csv_files",
        MERGE_CSV_FILES,
        Signature::new()
            .param("file1", ParamKind::String)
            .param("file2", ParamKind::String)
            .param("join_column", ParamKind::String)
            .optional("join_type", ParamKind::String, json!("inner")),
        |args| {
            Ok(json!(format!(
                "Merging {} and {}",
                args.str("file1")?,
                args.str("file2")?
            )))
        },
    ));
    registry.register(blocking(
        "export_csv_data",
        EXPORT_CSV_DATA,
        Signature::new()
            .param("filename", ParamKind::String)
            .param("output_path", ParamKind::String)
            .param("format_type", ParamKind::String),
        |args| {
            Ok(json!(format!(
                "Exporting {} to {}",
                args.str("filename")?,
                args.str("format_type")?
            )))
        },
    ));
    registry.register(blocking(
        "generate_csv_report",
        GENERATE_CSV_REPORT,
        Signature::new()
            .param("filename", ParamKind::String)
            .param("report_type", ParamKind::String)
            .optional("include_charts", ParamKind::Boolean, json!(true)),
        |args| {
            Ok(json!(format!(
                "Generating {} report for {}",
                args.str("report_type")?,
                args.str("filename")?
            )))
        },
    ));
    registry.register(blocking(
        "clean_csv_data",
        CLEAN_CSV_DATA,
        Signature::new()
            .param("filename", ParamKind::String)
            .optional("remove_duplicates", ParamKind::Boolean, json!(true))
            .optional("fill_missing", ParamKind::String, json!("skip")),
        |args| Ok(json!(format!("Cleaning {} data", args.str("filename")?))),
    ));
    registry.register(blocking(
        "search_csv_content",
        SEARCH_CSV_CONTENT,
        Signature::new()
            .param("filename", ParamKind::String)
            .param("search_term", ParamKind::String)
            .optional("case_sensitive", ParamKind::Boolean, json!(false)),
        |args| {
            Ok(json!(format!(
                "Searching for '{}' in {}",
                args.str("search_term")?,
                args.str("filename")?
            )))
        },
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::Handler;
    use serde_json::{Map, Value};

    fn registry(dir: &Path) -> Registry {
        let mut registry = Registry::new("csv", "0");
        register(&mut registry, dir.to_path_buf());
        registry
    }

    fn call(registry: &Registry, name: &str, args: Value) -> String {
        let Value::Object(args) = args else { unreachable!() };
        let response = registry.call_tool(name, args).unwrap();
        response.content[0].as_str().unwrap().to_string()
    }

    #[test]
    fn summarizes_a_real_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("sample.csv"), "a,b,c\n1,2,3\n4,\"5,5\",6\n\n").unwrap();
        let text = call(&registry(dir.path()), "summarize_csv_file", json!({"filename": "sample.csv"}));
        assert_eq!(text, "CSV file 'sample.csv' has 2 rows and 3 columns.");
    }

    #[test]
    fn ragged_rows_are_read() {
        let rows = parse("a,b,c\n1,2\n\n3,4,5,6\n").unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1], vec!["1", "2"]);
        assert_eq!(rows[2].len(), 4);
    }

    #[test]
    fn refuses_to_leave_the_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["../secret.csv", "/etc/passwd", "nested/file.csv", ""] {
            let mut args = Map::new();
            args.insert("filename".into(), json!(name));
            let error = registry(dir.path()).call_tool("summarize_csv_file", args).unwrap_err();
            assert_eq!(error.code, crate::jrpc::INTERNAL_ERROR);
        }
    }

    #[test]
    fn missing_file_is_a_tool_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = Map::new();
        args.insert("filename".into(), json!("absent.csv"));
        let error = registry(dir.path()).call_tool("summarize_csv_file", args).unwrap_err();
        let data = error.data.unwrap();
        assert!(data.as_str().unwrap().starts_with("Tool execution failed: Failed to process CSV file absent.csv"));
    }

    #[test]
    fn stubs_bind_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry(dir.path());
        assert_eq!(
            call(&registry, "read_csv_data", json!({"filename": "x.csv"})),
            "Reading x.csv with max 100 rows"
        );
        assert_eq!(
            call(&registry, "read_csv_data", json!({"filename": "x.csv", "max_rows": "5"})),
            "Reading x.csv with max 5 rows"
        );
        assert_eq!(
            call(&registry, "search_csv_content", json!({"filename": "x.csv", "search_term": "q"})),
            "Searching for 'q' in x.csv"
        );
    }

    #[test]
    fn registers_the_whole_family() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(registry(dir.path()).len(), 11);
    }
}

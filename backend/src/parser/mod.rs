//! Generic CSV reader with encoding and delimiter auto-detection.
//!
//! Billing exports arrive from several switch vendors with inconsistent
//! encodings (UTF-8, Latin-1, Windows-1252) and delimiters. This module
//! turns raw bytes into JSON row objects keyed by trimmed column headers;
//! no billing-specific logic lives here.

use serde_json::{json, Map, Value};
use std::path::Path;

// =============================================================================
// Errors
// =============================================================================

/// CSV reading error with line context.
#[derive(Debug, Clone)]
pub struct CsvError {
    pub line: usize,
    pub column: Option<String>,
    pub message: String,
}

impl std::fmt::Display for CsvError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.column {
            Some(col) => write!(f, "Line {}, column '{}': {}", self.line, col, self.message),
            None => write!(f, "Line {}: {}", self.line, self.message),
        }
    }
}

impl std::error::Error for CsvError {}

impl CsvError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            column: None,
            message: message.into(),
        }
    }

    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }
}

// =============================================================================
// Parse Result
// =============================================================================

/// Parsed table plus the detection metadata the UI reports back.
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// One JSON object per data row, keyed by trimmed headers.
    pub records: Vec<Value>,
    /// Detected encoding.
    pub encoding: String,
    /// Detected delimiter.
    pub delimiter: char,
    /// Trimmed column headers, in file order.
    pub headers: Vec<String>,
}

// =============================================================================
// Detection
// =============================================================================

/// Detect the encoding of raw bytes using chardet.
pub fn detect_encoding(bytes: &[u8]) -> String {
    let (charset, _, _) = chardet::detect(bytes);

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        other => other.to_string(),
    }
}

/// Decode bytes using the detected encoding, falling back to lossy UTF-8.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    let decoded = match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" => encoding_rs::ISO_8859_15.decode(bytes).0.to_string(),
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.to_string(),
        _ => String::from_utf8_lossy(bytes).to_string(),
    };
    // Some exports carry a UTF-8 BOM that would otherwise stick to the
    // first header name.
    decoded.trim_start_matches('\u{feff}').to_string()
}

/// Detect the delimiter by counting candidates in the header line.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let candidates = [',', ';', '\t', '|'];
    let mut best = ',';
    let mut best_count = 0;

    for &sep in &candidates {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best = sep;
        }
    }

    best
}

// =============================================================================
// Parsing
// =============================================================================

/// Parse a file with auto-detection of encoding and delimiter.
pub fn parse_file_auto<P: AsRef<Path>>(path: P) -> Result<ParseResult, CsvError> {
    let bytes = std::fs::read(path.as_ref())
        .map_err(|e| CsvError::new(0, format!("Cannot read file: {}", e)))?;
    parse_bytes_auto(&bytes)
}

/// Parse raw bytes with auto-detection of encoding and delimiter.
pub fn parse_bytes_auto(bytes: &[u8]) -> Result<ParseResult, CsvError> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let delimiter = detect_delimiter(&content);
    parse_str(&content, delimiter, encoding)
}

/// Parse decoded content with an explicit delimiter.
pub fn parse_str(content: &str, delimiter: char, encoding: String) -> Result<ParseResult, CsvError> {
    let mut lines = content.lines();

    let header_line = lines
        .next()
        .ok_or_else(|| CsvError::new(1, "Empty CSV file"))?;

    let headers: Vec<String> = split_fields(header_line, delimiter)
        .into_iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(CsvError::new(1, "No headers found"));
    }

    let mut records = Vec::new();

    for line in lines {
        if line.trim().is_empty() {
            continue;
        }

        let values = split_fields(line, delimiter);
        let mut obj = Map::new();

        for (i, header) in headers.iter().enumerate() {
            let raw = values.get(i).map(String::as_str).unwrap_or("");
            obj.insert(header.clone(), json!(raw));
        }

        records.push(Value::Object(obj));
    }

    Ok(ParseResult {
        records,
        encoding,
        delimiter,
        headers,
    })
}

/// Split one line into cell values, stripping surrounding quotes.
fn split_fields(line: &str, delimiter: char) -> Vec<String> {
    line.split(delimiter)
        .map(|s| s.trim().trim_matches('"').to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_csv() {
        let result = parse_str("Vendor,Revenue\nACME,100\nOPS-1,50", ',', "utf-8".into()).unwrap();

        assert_eq!(result.headers, vec!["Vendor", "Revenue"]);
        assert_eq!(result.records.len(), 2);
        assert_eq!(result.records[0]["Vendor"], "ACME");
        assert_eq!(result.records[1]["Revenue"], "50");
    }

    #[test]
    fn test_headers_are_trimmed() {
        let result = parse_str("  Vendor , Revenue \nACME,1", ',', "utf-8".into()).unwrap();
        assert_eq!(result.headers, vec!["Vendor", "Revenue"]);
    }

    #[test]
    fn test_missing_values_become_empty() {
        let result = parse_str("a,b,c\n1,,3", ',', "utf-8".into()).unwrap();
        assert_eq!(result.records[0]["b"], "");
    }

    #[test]
    fn test_extra_columns_ignored() {
        let result = parse_str("a,b\n1,2,3,4", ',', "utf-8".into()).unwrap();
        assert_eq!(result.records[0]["a"], "1");
        assert_eq!(result.records[0]["b"], "2");
    }

    #[test]
    fn test_quoted_values() {
        let result = parse_str("name,value\n\"Acme\",\"Hello\"", ',', "utf-8".into()).unwrap();
        assert_eq!(result.records[0]["name"], "Acme");
        assert_eq!(result.records[0]["value"], "Hello");
    }

    #[test]
    fn test_empty_lines_skipped() {
        let result = parse_str("a,b\n1,2\n\n3,4\n", ',', "utf-8".into()).unwrap();
        assert_eq!(result.records.len(), 2);
    }

    #[test]
    fn test_empty_content_errors() {
        let err = parse_str("", ',', "utf-8".into()).unwrap_err();
        assert!(err.message.contains("Empty"));
        assert_eq!(err.line, 1);
    }

    #[test]
    fn test_error_message_format() {
        let err = CsvError::new(5, "Invalid value").with_column("Revenue");
        let msg = err.to_string();
        assert!(msg.contains("Line 5"));
        assert!(msg.contains("column 'Revenue'"));
    }

    #[test]
    fn test_detect_delimiter_variants() {
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
        assert_eq!(detect_delimiter("a\tb\tc"), '\t');
        assert_eq!(detect_delimiter("a|b|c"), '|');
    }

    #[test]
    fn test_auto_parse() {
        let result = parse_bytes_auto(b"Vendor,Cost\nACME,10").unwrap();
        assert_eq!(result.delimiter, ',');
        assert_eq!(result.encoding, "utf-8");
        assert_eq!(result.records.len(), 1);
    }

    #[test]
    fn test_bom_stripped_from_first_header() {
        let bytes = b"\xef\xbb\xbfVendor,Cost\nACME,10";
        let result = parse_bytes_auto(bytes).unwrap();
        assert_eq!(result.headers[0], "Vendor");
    }

    #[test]
    fn test_latin1_decoding() {
        // "Réunion" in ISO-8859-1
        let bytes: &[u8] = &[0x52, 0xE9, 0x75, 0x6E, 0x69, 0x6F, 0x6E];
        let decoded = decode_content(bytes, "iso-8859-1");
        assert_eq!(decoded, "Réunion");
    }
}

//! High-level pipeline API for billing report transformation.
//!
//! Runs the four stages in sequence over one parsed table and returns the
//! output rows plus summary counters. The pipeline is a pure
//! transformation: it never touches the output directory, so a failing
//! run leaves the archive exactly as it was (materialization lives in
//! [`crate::storage`]).
//!
//! # Example
//!
//! ```rust,ignore
//! use trunkreport::{process_file, ReportOptions};
//! use std::path::Path;
//!
//! let result = process_file(Path::new("export.csv"), &ReportOptions::default())?;
//! println!("{} output rows", result.rows.len());
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

use crate::api::logs::{log_info, log_success, log_warning};
use crate::error::ProcessResult;
use crate::models::{output_header, OutputRow, ReportSummary};
use crate::parser::{parse_bytes_auto, parse_file_auto, ParseResult};
use crate::transform::{
    coerce_and_recalculate, filter_rows, group_with_subtotals, sanitize, ZeroCostMatcher,
    DEFAULT_ZERO_COST_VENDORS,
};

/// Environment variable overriding the zero-cost vendor marker set
/// (comma-separated substrings).
pub const ZERO_COST_VENDORS_ENV: &str = "TRUNKREPORT_ZERO_COST_VENDORS";

/// Options for the transformation pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportOptions {
    /// Vendor-name substrings that force cost to zero (case-insensitive).
    pub zero_cost_vendors: Vec<String>,

    /// Emit the derived `Profit %` column on detail and subtotal rows.
    pub include_profit_percent: bool,

    /// Number of output rows returned as preview.
    pub preview_rows: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            zero_cost_vendors: DEFAULT_ZERO_COST_VENDORS
                .iter()
                .map(|m| m.to_string())
                .collect(),
            include_profit_percent: true,
            preview_rows: 20,
        }
    }
}

impl ReportOptions {
    /// Default options with the marker set taken from the environment
    /// when `TRUNKREPORT_ZERO_COST_VENDORS` is set.
    pub fn from_env() -> Self {
        let mut options = Self::default();
        if let Ok(raw) = std::env::var(ZERO_COST_VENDORS_ENV) {
            let markers: Vec<String> = raw
                .split(',')
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty())
                .collect();
            if !markers.is_empty() {
                options.zero_cost_vendors = markers;
            }
        }
        options
    }
}

/// Result of a complete transformation run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    /// Final report rows: details, subtotals and spacers in output order.
    pub rows: Vec<OutputRow>,

    /// Counters for the summary text.
    pub summary: ReportSummary,

    /// Input parsing metadata.
    pub csv_info: CsvInfo,

    /// Output header matching [`Self::rows`].
    pub header: Vec<String>,

    /// First rows of the output, rendered as cells.
    pub preview: Vec<Vec<String>>,
}

/// Input file information.
#[derive(Debug, Clone, Serialize)]
pub struct CsvInfo {
    pub encoding: String,
    pub delimiter: char,
    pub headers: Vec<String>,
    pub row_count: usize,
}

/// Transform a billing export file.
///
/// This is the main entry point for the pipeline. It:
/// 1. Parses the CSV with encoding/delimiter auto-detection
/// 2. Sanitizes and validates columns
/// 3. Filters rows without vendor or destination
/// 4. Coerces financials and applies the zero-cost vendor rule
/// 5. Groups rows and injects subtotals and spacers
pub fn process_file(path: &Path, options: &ReportOptions) -> ProcessResult<PipelineResult> {
    log_info(format!("📖 Reading {}...", path.display()));
    let parsed = parse_file_auto(path)?;
    run_stages(parsed, options)
}

/// Transform raw export bytes (upload path).
pub fn process_bytes(bytes: &[u8], options: &ReportOptions) -> ProcessResult<PipelineResult> {
    let parsed = parse_bytes_auto(bytes)?;
    run_stages(parsed, options)
}

/// Transform an already-parsed table.
pub fn process_records(
    records: Vec<Value>,
    headers: Vec<String>,
    options: &ReportOptions,
) -> ProcessResult<PipelineResult> {
    let parsed = ParseResult {
        records,
        encoding: "utf-8".to_string(),
        delimiter: ',',
        headers,
    };
    run_stages(parsed, options)
}

/// Run the four stages over one parsed table.
fn run_stages(parsed: ParseResult, options: &ReportOptions) -> ProcessResult<PipelineResult> {
    log_success(format!(
        "Detected encoding: {}, delimiter: '{}'",
        parsed.encoding,
        display_delimiter(parsed.delimiter)
    ));
    log_success(format!("Read {} rows", parsed.records.len()));

    let csv_info = CsvInfo {
        encoding: parsed.encoding.clone(),
        delimiter: parsed.delimiter,
        headers: parsed.headers.clone(),
        row_count: parsed.records.len(),
    };

    log_info("🧹 Sanitizing columns...");
    let table = sanitize(&parsed.headers, &parsed.records)?;
    log_success(format!("{} columns kept", table.columns.len()));

    log_info("🔍 Filtering rows without vendor or destination...");
    let before = table.records.len();
    let survivors = filter_rows(table.records)?;
    log_success(format!(
        "{} rows kept, {} removed",
        survivors.len(),
        before - survivors.len()
    ));

    log_info("🧮 Coercing financials and applying vendor rules...");
    let matcher = ZeroCostMatcher::new(&options.zero_cost_vendors);
    let recalc = coerce_and_recalculate(survivors, &matcher);
    if recalc.coercion_failures > 0 {
        log_warning(format!(
            "{} non-numeric financial values treated as 0",
            recalc.coercion_failures
        ));
    }
    log_success(format!(
        "{} rows matched the zero-cost vendor set",
        recalc.zero_cost_rows
    ));

    log_info("📦 Grouping by trunk group and destination...");
    let processed_rows = recalc.records.len();
    let zero_cost_rows = recalc.zero_cost_rows;
    let grouped = group_with_subtotals(recalc.records, options.include_profit_percent);
    log_success(format!(
        "{} groups, {} output rows",
        grouped.group_count,
        grouped.rows.len()
    ));

    let summary = ReportSummary {
        processed_rows,
        zero_cost_rows,
        group_count: grouped.group_count,
        output_rows: grouped.rows.len(),
    };

    let header = output_header(options.include_profit_percent);
    let preview = grouped
        .rows
        .iter()
        .take(options.preview_rows)
        .map(|row| row.to_fields(options.include_profit_percent))
        .collect();

    Ok(PipelineResult {
        rows: grouped.rows,
        summary,
        csv_info,
        header,
        preview,
    })
}

fn display_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

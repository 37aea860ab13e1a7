//! # Trunkreport - billing export cleanup and regrouping
//!
//! Trunkreport ingests raw trunk billing exports (one row per
//! customer/vendor/trunk/destination combination) and produces a cleaned,
//! regrouped report with per-group subtotals for manual review.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌──────────────┐     ┌─────────────┐
//! │  CSV Export │────▶│   Parser    │────▶│  Transform   │────▶│  Report CSV │
//! │ (any enc.)  │     │ (auto-enc)  │     │ (4 stages)   │     │  (archive)  │
//! └─────────────┘     └─────────────┘     └──────────────┘     └─────────────┘
//! ```
//!
//! The transform runs four deterministic stages: sanitize & validate
//! columns, filter rows, recalculate zero-cost vendors, group with
//! subtotals and spacers.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use trunkreport::{process_file, ReportOptions, ReportStore};
//! use std::path::Path;
//!
//! let options = ReportOptions::default();
//! let result = process_file(Path::new("export.csv"), &options)?;
//! let stored = ReportStore::from_env()
//!     .write(&result.rows, options.include_profit_percent, "export.csv")?;
//! println!("{}", result.summary.render(&stored.name));
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error hierarchy
//! - [`models`] - Domain models (BillingRecord, OutputRow, GroupKey)
//! - [`parser`] - CSV parsing with auto-detection
//! - [`transform`] - The four pipeline stages and orchestration
//! - [`storage`] - Report archive (write/list/download/delete)
//! - [`api`] - HTTP API server

// Core modules
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Transformation
pub mod transform;

// Report archive
pub mod storage;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{PipelineError, ProcessResult, ReportError, ReportResult, ServerError};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    output_header, BillingRecord, GroupKey, OutputRow, RawRecord, ReportSummary,
};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{
    decode_content, detect_delimiter, detect_encoding, parse_bytes_auto, parse_file_auto,
    parse_str, CsvError, ParseResult,
};

// =============================================================================
// Re-exports - Transform stages
// =============================================================================

pub use transform::{
    coerce_and_recalculate, filter_rows, group_with_subtotals, sanitize, GroupedRows,
    RecalcResult, SanitizedTable, ZeroCostMatcher, DEFAULT_ZERO_COST_VENDORS, DROPPED_COLUMNS,
    REQUIRED_COLUMNS, SPACER_ROWS_BETWEEN_GROUPS,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    process_bytes, process_file, process_records, CsvInfo, PipelineResult, ReportOptions,
    ZERO_COST_VENDORS_ENV,
};

// =============================================================================
// Re-exports - Storage
// =============================================================================

pub use storage::{
    sanitize_stem, DeleteOutcome, ReportStore, StoredFile, DEFAULT_OUTPUT_DIR, OUTPUT_DIR_ENV,
};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::types::{error_response, FilesResponse, PreviewTable, UploadResponse};

// Server
pub mod server {
    pub use crate::api::server::start_server;
}

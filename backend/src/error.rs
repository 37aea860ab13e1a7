//! Error types for the report transformation pipeline.
//!
//! This module defines the error hierarchy used across the crate:
//!
//! - [`crate::parser::CsvError`] - CSV reading errors with line context
//! - [`ReportError`] - Business-rule failures inside the pipeline stages
//! - [`PipelineError`] - Top-level orchestration errors
//! - [`ServerError`] - HTTP boundary errors
//!
//! Error conversion is automatic via `From` implementations, allowing `?`
//! to work across error boundaries. Numeric coercion failures are NOT
//! errors: unparseable financial values become `0.0` and are only logged.

use thiserror::Error;

use crate::parser::CsvError;

// =============================================================================
// Report Errors (pipeline stages)
// =============================================================================

/// Business-rule failures raised by the pipeline stages.
#[derive(Debug, Error)]
pub enum ReportError {
    /// One or more required columns are absent from the input.
    #[error(
        "Missing required columns: {}. Available columns in file: {}",
        .missing.join(", "),
        .found.join(", ")
    )]
    MissingColumns {
        /// Required columns that were not found.
        missing: Vec<String>,
        /// Columns actually present after sanitization.
        found: Vec<String>,
    },

    /// Every row was removed by the vendor / destination filter.
    #[error("No rows remaining after filtering. Please check your data.")]
    EmptyAfterFilter,
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level errors returned by [`crate::transform::pipeline`] entry points
/// and by report materialization.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// CSV reading error.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// Stage contract violation (schema, empty result).
    #[error("{0}")]
    Report(#[from] ReportError),

    /// File system error while reading input or writing output.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Output serialization error.
    #[error("Failed to write report: {0}")]
    Output(#[from] csv::Error),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP boundary errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error surfaced verbatim to the client.
    #[error("{0}")]
    Pipeline(#[from] PipelineError),

    /// Malformed request (missing file, bad multipart, unsafe name).
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Requested report does not exist in the archive.
    #[error("File not found: {0}")]
    NotFound(String),

    /// Unexpected server failure.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for stage-level operations.
pub type ReportResult<T> = Result<T, ReportError>;

/// Result type for pipeline operations.
pub type ProcessResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

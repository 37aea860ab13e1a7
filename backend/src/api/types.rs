//! REST API types for the review UI.
//!
//! The upload response carries everything the UI shows after processing:
//! the summary text, the bounded preview and the archive entry of the
//! written file.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::models::ReportSummary;
use crate::storage::StoredFile;
use crate::transform::pipeline::{CsvInfo, PipelineResult};

/// Response sent after a successful upload and transformation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Unique job identifier.
    pub job_id: String,

    /// Always `"ready"` on success; errors use [`error_response`].
    pub status: String,

    /// Human-readable processing summary.
    pub summary: String,

    /// Name of the written report in the archive.
    pub output_file: String,

    /// First output rows for display.
    pub preview: PreviewTable,

    /// Counters and input metadata.
    pub metadata: ResponseMetadata,
}

/// Bounded preview of the output table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Metadata about one transformation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    pub processed_rows: usize,
    pub zero_cost_rows: usize,
    pub group_count: usize,
    pub output_rows: usize,
    pub csv_info: CsvMetadata,
}

/// Input file metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvMetadata {
    pub encoding: String,
    pub delimiter: String,
    pub row_count: usize,
    pub columns: Vec<String>,
}

impl From<CsvInfo> for CsvMetadata {
    fn from(info: CsvInfo) -> Self {
        Self {
            encoding: info.encoding,
            delimiter: info.delimiter.to_string(),
            row_count: info.row_count,
            columns: info.headers,
        }
    }
}

/// Archive listing response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilesResponse {
    pub files: Vec<StoredFile>,
}

impl UploadResponse {
    /// Build the response for a completed run and its written file.
    pub fn from_outcome(result: PipelineResult, stored: StoredFile) -> Self {
        let summary = result.summary.render(&stored.name);
        let ReportSummary {
            processed_rows,
            zero_cost_rows,
            group_count,
            output_rows,
        } = result.summary;

        Self {
            job_id: Uuid::new_v4().to_string(),
            status: "ready".to_string(),
            summary,
            output_file: stored.name,
            preview: PreviewTable {
                header: result.header,
                rows: result.preview,
            },
            metadata: ResponseMetadata {
                processed_rows,
                zero_cost_rows,
                group_count,
                output_rows,
                csv_info: result.csv_info.into(),
            },
        }
    }
}

/// Create an error response body.
///
/// The message is whatever the pipeline reported, verbatim.
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
    })
}

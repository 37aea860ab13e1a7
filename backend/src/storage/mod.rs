//! Report archive: materialize, list, resolve and delete output files.
//!
//! Processed reports land as CSV files in a single output directory
//! (`processed/` by default). File names combine a sortable timestamp
//! prefix with a sanitized version of the uploaded file's base name, so
//! the archive lists newest-first even under plain lexicographic sort.
//! Same-second re-submissions of an identically named file can collide;
//! the naming scheme does not guard against that.

use chrono::{DateTime, Local};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ProcessResult;
use crate::models::{output_header, OutputRow};

/// Default output directory, relative to the working directory.
pub const DEFAULT_OUTPUT_DIR: &str = "processed";

/// Environment variable overriding the output directory.
pub const OUTPUT_DIR_ENV: &str = "TRUNKREPORT_OUTPUT_DIR";

/// Sanitized file stems keep at most this many characters.
const MAX_STEM_LEN: usize = 50;

static NON_FILENAME_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_-]").unwrap());
static UNDERSCORE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"_+").unwrap());

// =============================================================================
// Stored Files
// =============================================================================

/// One archived report file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    pub name: String,
    /// Local time, `YYYY-MM-DD HH:MM:SS`.
    pub created_at: String,
    pub size_bytes: u64,
}

/// Outcome of a guarded delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteOutcome {
    Deleted,
    NotConfirmed,
    NotFound,
}

// =============================================================================
// Report Store
// =============================================================================

/// Handle on the output directory.
#[derive(Debug, Clone)]
pub struct ReportStore {
    dir: PathBuf,
}

impl ReportStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store rooted at `TRUNKREPORT_OUTPUT_DIR`, or `processed/`.
    pub fn from_env() -> Self {
        let dir = std::env::var(OUTPUT_DIR_ENV).unwrap_or_else(|_| DEFAULT_OUTPUT_DIR.to_string());
        Self::new(dir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write the report rows as a CSV file and return its archive entry.
    ///
    /// The file name is `<timestamp>_<sanitized stem>.csv`; blank cells
    /// are written as empty strings.
    pub fn write(
        &self,
        rows: &[OutputRow],
        include_profit_percent: bool,
        source_name: &str,
    ) -> ProcessResult<StoredFile> {
        fs::create_dir_all(&self.dir)?;

        let timestamp = Local::now();
        let stem = sanitize_stem(source_name);
        let name = format!("{}_{}.csv", timestamp.format("%Y%m%d_%H%M%S"), stem);
        let path = self.dir.join(&name);

        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(output_header(include_profit_percent))?;
        for row in rows {
            writer.write_record(row.to_fields(include_profit_percent))?;
        }
        writer.flush()?;

        let size_bytes = fs::metadata(&path)?.len();

        Ok(StoredFile {
            name,
            created_at: timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            size_bytes,
        })
    }

    /// List archived reports, newest first.
    pub fn list(&self) -> std::io::Result<Vec<StoredFile>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut entries: Vec<(std::time::SystemTime, StoredFile)> = Vec::new();

        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("csv") {
                continue;
            }

            let metadata = entry.metadata()?;
            let modified = metadata.modified()?;
            let created_at: DateTime<Local> = modified.into();

            entries.push((
                modified,
                StoredFile {
                    name: entry.file_name().to_string_lossy().to_string(),
                    created_at: created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                    size_bytes: metadata.len(),
                },
            ));
        }

        entries.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(entries.into_iter().map(|(_, file)| file).collect())
    }

    /// Resolve an archived report name to its path.
    ///
    /// Returns `None` for unknown names and for names that try to escape
    /// the output directory.
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
            return None;
        }

        let path = self.dir.join(name);
        if path.is_file() {
            Some(path)
        } else {
            None
        }
    }

    /// Delete an archived report. Destructive and irreversible, so it
    /// refuses to act until `confirmed` is set.
    pub fn delete(&self, name: &str, confirmed: bool) -> std::io::Result<DeleteOutcome> {
        if !confirmed {
            return Ok(DeleteOutcome::NotConfirmed);
        }

        match self.resolve(name) {
            Some(path) => {
                fs::remove_file(path)?;
                Ok(DeleteOutcome::Deleted)
            }
            None => Ok(DeleteOutcome::NotFound),
        }
    }
}

// =============================================================================
// File Names
// =============================================================================

/// Sanitize an uploaded file name into a safe stem.
///
/// Keeps alphanumerics, `_` and `-`; everything else becomes `_`. Runs of
/// underscores collapse to one, outer underscores are dropped, and the
/// result is truncated to 50 characters.
pub fn sanitize_stem(source_name: &str) -> String {
    let stem = Path::new(source_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("report");

    let replaced = NON_FILENAME_CHARS.replace_all(stem, "_");
    let collapsed = UNDERSCORE_RUNS.replace_all(&replaced, "_");
    let trimmed = collapsed.trim_matches('_');

    let cleaned: String = trimmed.chars().take(MAX_STEM_LEN).collect();
    if cleaned.is_empty() {
        "report".to_string()
    } else {
        cleaned
    }
}

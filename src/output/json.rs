//! JSON output formatter for scan and resolve results.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "generated_at": "2026-01-01T12:00:00Z",
//!   "root": "/data",
//!   "groups": [
//!     {
//!       "fingerprint": "2cf24dba...",
//!       "size": 5,
//!       "kept": "/data/a.txt",
//!       "files": ["/data/a.txt", "/data/b.txt"]
//!     }
//!   ],
//!   "skipped": [
//!     { "path": "/data/secret", "reason": "permission denied: /data/secret" }
//!   ],
//!   "summary": {
//!     "total_files": 3,
//!     "duplicate_groups": 1,
//!     "reclaimable_space": 5,
//!     "exit_code": 0,
//!     "exit_code_name": "DS000"
//!   },
//!   "resolve": {
//!     "kept": ["/data/a.txt"],
//!     "deleted": [{ "path": "/data/b.txt", "size": 5, "permanent": true }],
//!     "failed": [],
//!     "bytes_freed": 5
//!   }
//! }
//! ```
//!
//! `resolve` is only present when a deletion ran.

use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::actions::ResolveReport;
use crate::duplicates::{DuplicateGroup, ScanReport, ScanSummary};
use crate::error::ExitCode;

/// A single duplicate group in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDuplicateGroup {
    /// SHA-256 as hexadecimal string (64 characters)
    pub fingerprint: String,
    /// File size in bytes
    pub size: u64,
    /// The member a resolve keeps
    pub kept: String,
    /// All members, kept file first
    pub files: Vec<String>,
}

impl From<&DuplicateGroup> for JsonDuplicateGroup {
    fn from(group: &DuplicateGroup) -> Self {
        Self {
            fingerprint: group.fingerprint_hex(),
            size: group.size,
            kept: path_string(&group.kept().path),
            files: group.files.iter().map(|f| path_string(&f.path)).collect(),
        }
    }
}

/// A path paired with why it was skipped or not deleted.
#[derive(Debug, Clone, Serialize)]
pub struct JsonPathError {
    pub path: String,
    pub reason: String,
}

/// Summary statistics in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    pub total_files: usize,
    pub total_size: u64,
    pub fingerprinted_files: usize,
    pub unique_fingerprints: usize,
    pub duplicate_groups: usize,
    /// Files a resolve deletes (every member except the kept one)
    pub duplicate_files: usize,
    pub reclaimable_space: u64,
    pub skipped_files: usize,
    pub scan_duration_ms: u64,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "DS000")
    pub exit_code_name: String,
}

impl JsonSummary {
    /// Create a JSON summary from a ScanSummary and an exit code.
    #[must_use]
    pub fn from_scan_summary(summary: &ScanSummary, exit_code: ExitCode) -> Self {
        Self {
            total_files: summary.total_files,
            total_size: summary.total_size,
            fingerprinted_files: summary.fingerprinted_files,
            unique_fingerprints: summary.unique_fingerprints,
            duplicate_groups: summary.duplicate_groups,
            duplicate_files: summary.duplicate_files,
            reclaimable_space: summary.reclaimable_space,
            skipped_files: summary.skipped_files,
            scan_duration_ms: summary.scan_duration.as_millis() as u64,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }
}

/// One successful deletion.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDeleted {
    pub path: String,
    pub size: u64,
    pub permanent: bool,
}

/// Resolve results in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonResolve {
    pub kept: Vec<String>,
    pub deleted: Vec<JsonDeleted>,
    pub failed: Vec<JsonPathError>,
    pub bytes_freed: u64,
}

impl From<&ResolveReport> for JsonResolve {
    fn from(report: &ResolveReport) -> Self {
        Self {
            kept: report.kept.iter().map(|p| path_string(p)).collect(),
            deleted: report
                .deleted
                .iter()
                .map(|d| JsonDeleted {
                    path: path_string(&d.path),
                    size: d.size,
                    permanent: d.permanent,
                })
                .collect(),
            failed: report
                .failed
                .iter()
                .map(|(path, e)| JsonPathError {
                    path: path_string(path),
                    reason: e.to_string(),
                })
                .collect(),
            bytes_freed: report.bytes_freed,
        }
    }
}

/// Complete JSON output structure.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// When the document was produced
    pub generated_at: DateTime<Utc>,
    /// Scanned directory
    pub root: String,
    /// Duplicate groups, sorted by kept path
    pub groups: Vec<JsonDuplicateGroup>,
    /// Paths left out of grouping
    pub skipped: Vec<JsonPathError>,
    /// Scan summary statistics
    pub summary: JsonSummary,
    /// Resolve results, if a deletion ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolve: Option<JsonResolve>,
}

impl JsonOutput {
    /// Create a new JSON output for a scan of `root`.
    ///
    /// # Example
    ///
    /// ```
    /// use dupesweep::duplicates::ScanReport;
    /// use dupesweep::error::ExitCode;
    /// use dupesweep::output::json::JsonOutput;
    /// use std::path::Path;
    ///
    /// let output = JsonOutput::new(Path::new("/data"), &ScanReport::default(), ExitCode::NoDuplicates);
    /// assert!(output.groups.is_empty());
    /// assert!(output.resolve.is_none());
    /// ```
    #[must_use]
    pub fn new(root: &Path, report: &ScanReport, exit_code: ExitCode) -> Self {
        Self {
            generated_at: Utc::now(),
            root: path_string(root),
            groups: report.groups.iter().map(JsonDuplicateGroup::from).collect(),
            skipped: report
                .skipped_paths()
                .map(|(path, e)| JsonPathError {
                    path: path_string(path),
                    reason: e.to_string(),
                })
                .collect(),
            summary: JsonSummary::from_scan_summary(&report.summary, exit_code),
            resolve: None,
        }
    }

    /// Attach resolve results.
    #[must_use]
    pub fn with_resolve(mut self, report: &ResolveReport) -> Self {
        self.resolve = Some(JsonResolve::from(report));
        self
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}

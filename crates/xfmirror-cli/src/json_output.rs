//! JSON output structures for xfmirror CLI

use serde::Serialize;
use xfmirror_engine::SyncReport;
use xfmirror_types::{format_bytes, ReportRow, SizeReport, SyncStats};

/// Operation metadata
#[derive(Debug, Serialize)]
pub struct OperationMetadata {
    /// xfmirror version
    pub version: String,
    /// Operation type
    pub operation: String,
    /// Remote endpoint
    pub remote: String,
}

impl OperationMetadata {
    /// Metadata for `operation` against `remote`
    pub fn new(operation: &str, remote: impl Into<String>) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            operation: operation.to_string(),
            remote: remote.into(),
        }
    }
}

/// JSON output for estimate runs
#[derive(Debug, Serialize)]
pub struct EstimateJson {
    /// Operation metadata
    pub metadata: OperationMetadata,
    /// Selected files
    pub files: Vec<ReportRow>,
    /// Number of selected files
    pub file_count: usize,
    /// Sum of all file sizes in bytes
    pub total_bytes: u64,
    /// Human-readable total
    pub total_human: String,
}

impl EstimateJson {
    /// Build from a size report
    pub fn new(metadata: OperationMetadata, report: &SizeReport) -> Self {
        Self {
            metadata,
            files: report.rows.clone(),
            file_count: report.rows.len(),
            total_bytes: report.total_bytes(),
            total_human: format_bytes(report.total_bytes()),
        }
    }
}

/// JSON output for sync runs
#[derive(Debug, Serialize)]
pub struct SyncResultJson {
    /// Operation metadata
    pub metadata: OperationMetadata,
    /// Packages listed and planned
    pub packages_scanned: usize,
    /// Packages skipped after a listing error
    pub packages_skipped: usize,
    /// Areas that were not scanned
    pub areas_skipped: Vec<String>,
    /// Files selected by the scan
    pub files_selected: usize,
    /// Download counters
    pub stats: SyncStats,
    /// Whether every selected file is present locally
    pub complete: bool,
}

impl SyncResultJson {
    /// Build from a sync report
    pub fn new(metadata: OperationMetadata, report: &SyncReport) -> Self {
        let stats = report.stats.clone();
        Self {
            metadata,
            packages_scanned: report.scan.packages_scanned,
            packages_skipped: report.scan.packages_skipped,
            areas_skipped: report.scan.areas_skipped.clone(),
            files_selected: report.scan.tasks.len(),
            complete: stats.failed == 0 && stats.cancelled == 0 && stats.not_started == 0,
            stats,
        }
    }
}

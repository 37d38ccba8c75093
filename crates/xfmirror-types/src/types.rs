//! Core data types for xfmirror

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File naming convention used inside one top-level area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum NamingConvention {
    /// `Full`/`Change` substrings with `.flg`/`.zip` suffixes
    #[default]
    Marker,
    /// `f_` prefix for flag and full files, `t_` prefix for changes
    Prefix,
}

impl NamingConvention {
    /// Check whether a file name is a full-snapshot flag file
    pub fn is_flag(self, name: &str) -> bool {
        match self {
            Self::Marker => name.contains("Full") && name.ends_with(".flg"),
            Self::Prefix => name.starts_with("f_") && name.ends_with(".flg"),
        }
    }

    /// Check whether a file name is a full-snapshot archive
    pub fn is_full(self, name: &str) -> bool {
        match self {
            Self::Marker => name.contains("Full") && name.ends_with(".zip"),
            Self::Prefix => name.starts_with("f_") && name.ends_with(".zip"),
        }
    }

    /// Check whether a file name is an incremental change file
    pub fn is_change(self, name: &str) -> bool {
        match self {
            Self::Marker => name.contains("Change") && name.ends_with(".zip"),
            Self::Prefix => name.starts_with("t_"),
        }
    }
}

impl fmt::Display for NamingConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Marker => write!(f, "marker"),
            Self::Prefix => write!(f, "prefix"),
        }
    }
}

/// Category a selected file was chosen under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum FileCategory {
    /// Latest file of a feed-config package
    Config,
    /// Any file of an installer package
    Installer,
    /// Full-snapshot flag file
    Flag,
    /// Full-snapshot archive part
    Full,
    /// Incremental change file
    Change,
}

impl FileCategory {
    /// Short lowercase label
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Config => "config",
            Self::Installer => "installer",
            Self::Flag => "flag",
            Self::Full => "full",
            Self::Change => "change",
        }
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `(area, package, file)` unit of download work
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DownloadTask {
    /// Top-level remote area
    pub area: String,
    /// Package directory inside the area
    pub package: String,
    /// Remote file name, reused verbatim locally
    pub file_name: String,
    /// Selection category the file was picked under
    pub category: FileCategory,
}

impl DownloadTask {
    /// Create a new download task
    pub fn new(
        area: impl Into<String>,
        package: impl Into<String>,
        file_name: impl Into<String>,
        category: FileCategory,
    ) -> Self {
        Self {
            area: area.into(),
            package: package.into(),
            file_name: file_name.into(),
            category,
        }
    }

    /// Remote directory holding the file, relative to the transport root
    pub fn remote_dir(&self) -> String {
        format!("{}/{}", self.area, self.package)
    }

    /// Remote path of the file, relative to the transport root
    pub fn remote_path(&self) -> String {
        format!("{}/{}/{}", self.area, self.package, self.file_name)
    }

    /// Local package directory under a destination root
    pub fn local_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.area).join(&self.package)
    }

    /// Local file path under a destination root
    pub fn local_path(&self, root: &Path) -> PathBuf {
        self.local_dir(root).join(&self.file_name)
    }
}

impl fmt::Display for DownloadTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.area, self.package, self.file_name)
    }
}

/// Terminal outcome of one download task
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DownloadOutcome {
    /// File transferred in full
    Completed {
        /// Bytes written locally
        bytes: u64,
    },
    /// Local file already had the remote size
    SkippedAlreadyPresent,
    /// Transfer aborted by the cancellation token
    Cancelled,
    /// Transfer failed, partial file left in place
    Failed(String),
}

impl DownloadOutcome {
    /// Short label used in status lines
    pub fn label(&self) -> &'static str {
        match self {
            Self::Completed { .. } => "completed",
            Self::SkippedAlreadyPresent => "skipped",
            Self::Cancelled => "cancelled",
            Self::Failed(_) => "failed",
        }
    }
}

impl fmt::Display for DownloadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed { bytes } => write!(f, "completed ({})", format_bytes(*bytes)),
            Self::Failed(reason) => write!(f, "failed: {}", reason),
            other => f.write_str(other.label()),
        }
    }
}

/// Aggregate counters for one synchronization run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SyncStats {
    /// Tasks that transferred their file
    pub completed: usize,
    /// Tasks skipped because the local file was already complete
    pub skipped: usize,
    /// Tasks that failed
    pub failed: usize,
    /// Tasks aborted mid-transfer by cancellation
    pub cancelled: usize,
    /// Tasks never dequeued because the run was cancelled
    pub not_started: usize,
    /// Bytes transferred by completed tasks
    pub bytes_transferred: u64,
    /// Wall-clock duration of the download phase
    pub duration: Duration,
}

impl SyncStats {
    /// Create empty statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one task outcome into the counters
    pub fn record(&mut self, outcome: &DownloadOutcome) {
        match outcome {
            DownloadOutcome::Completed { bytes } => {
                self.completed += 1;
                self.bytes_transferred += bytes;
            }
            DownloadOutcome::SkippedAlreadyPresent => self.skipped += 1,
            DownloadOutcome::Cancelled => self.cancelled += 1,
            DownloadOutcome::Failed(_) => self.failed += 1,
        }
    }

    /// Total number of tasks accounted for
    pub fn total(&self) -> usize {
        self.completed + self.skipped + self.failed + self.cancelled + self.not_started
    }

    /// Transfer rate in bytes per second
    pub fn transfer_rate(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.bytes_transferred as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }
}

/// One row of an estimate report
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReportRow {
    /// Top-level area
    pub area: String,
    /// Package name
    pub package: String,
    /// File name
    pub file_name: String,
    /// Size in bytes
    pub size: u64,
}

impl ReportRow {
    /// Human-readable size
    pub fn human_size(&self) -> String {
        format_bytes(self.size)
    }
}

/// Size report produced by estimate mode
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SizeReport {
    /// One row per selected file, in scan order
    pub rows: Vec<ReportRow>,
}

impl SizeReport {
    /// Label used for the synthesized total row
    pub const TOTAL_LABEL: &'static str = "Total";

    /// Create an empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row for a selected file
    pub fn push(&mut self, task: &DownloadTask, size: u64) {
        self.rows.push(ReportRow {
            area: task.area.clone(),
            package: task.package.clone(),
            file_name: task.file_name.clone(),
            size,
        });
    }

    /// Sum of all row sizes
    pub fn total_bytes(&self) -> u64 {
        self.rows.iter().map(|row| row.size).sum()
    }

    /// Synthesized total row
    pub fn total_row(&self) -> ReportRow {
        ReportRow {
            area: Self::TOTAL_LABEL.to_string(),
            package: String::new(),
            file_name: String::new(),
            size: self.total_bytes(),
        }
    }

    /// All rows followed by the total row
    pub fn rows_with_total(&self) -> Vec<ReportRow> {
        let mut rows = self.rows.clone();
        rows.push(self.total_row());
        rows
    }

    /// Check if the report has no file rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Format a byte count with binary units
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    format!("{:.2} {}", size, UNITS[unit_index])
}

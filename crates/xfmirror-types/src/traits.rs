//! Core traits shared across xfmirror crates

use crate::{DownloadOutcome, DownloadTask};

/// Receives per-task progress events from the download workers
///
/// Implementations are shared between all workers of a run, so every
/// method takes `&self` and must be cheap. All methods default to no-ops.
pub trait ProgressSink: Send + Sync {
    /// The download phase is about to run `total_tasks` tasks
    fn run_started(&self, total_tasks: usize) {
        let _ = total_tasks;
    }

    /// A worker picked up a task and learned its remote size
    fn task_started(&self, task: &DownloadTask, total_bytes: u64) {
        let _ = (task, total_bytes);
    }

    /// Cumulative bytes written for an in-flight task
    fn task_progress(&self, task: &DownloadTask, transferred: u64, total_bytes: u64) {
        let _ = (task, transferred, total_bytes);
    }

    /// A task reached its terminal outcome
    fn task_finished(&self, task: &DownloadTask, outcome: &DownloadOutcome) {
        let _ = (task, outcome);
    }
}

/// Progress sink that discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProgressSink;

impl ProgressSink for NullProgressSink {}

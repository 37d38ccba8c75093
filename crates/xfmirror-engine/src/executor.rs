//! Single-task download execution

use crate::context::RunContext;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, warn};
use xfmirror_transport::{RemoteSession, RemoteTransport, TransportError};
use xfmirror_types::{format_bytes, DownloadOutcome, DownloadTask, Error, Result};

/// Configuration for the download executor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorConfig {
    /// Local destination root
    pub destination: PathBuf,
    /// Write to `<name>.part` and rename once complete
    pub staging: bool,
}

impl ExecutorConfig {
    /// Create an executor config writing directly into `destination`
    pub fn new<P: AsRef<Path>>(destination: P) -> Self {
        Self {
            destination: destination.as_ref().to_path_buf(),
            staging: false,
        }
    }

    /// Enable or disable staging
    pub fn with_staging(mut self, staging: bool) -> Self {
        self.staging = staging;
        self
    }
}

/// Downloads one task over its own connection
///
/// Each call opens a session, moves into the package directory and stats
/// the file. A local file with the remote size is left alone. Anything
/// else is fetched from scratch. Failed tasks are not retried.
pub struct DownloadExecutor {
    transport: Arc<dyn RemoteTransport>,
    config: ExecutorConfig,
}

impl DownloadExecutor {
    /// Create a new executor
    pub fn new(transport: Arc<dyn RemoteTransport>, config: ExecutorConfig) -> Self {
        Self { transport, config }
    }

    /// Run a task to its terminal outcome
    ///
    /// Never returns an error: every failure becomes
    /// [`DownloadOutcome::Failed`] so the caller can keep going.
    pub async fn execute(&self, task: &DownloadTask, ctx: &RunContext) -> DownloadOutcome {
        let outcome = match self.try_execute(task, ctx).await {
            Ok(outcome) => outcome,
            Err(e) => DownloadOutcome::Failed(e.to_string()),
        };

        match &outcome {
            DownloadOutcome::Completed { bytes } => {
                info!("Downloaded {} ({})", task, format_bytes(*bytes));
            }
            DownloadOutcome::SkippedAlreadyPresent => {
                info!("{} already exists, skipping", task);
            }
            DownloadOutcome::Cancelled => warn!("Download of {} cancelled", task),
            DownloadOutcome::Failed(reason) => error!("Download of {} failed: {}", task, reason),
        }
        ctx.progress().task_finished(task, &outcome);
        outcome
    }

    async fn try_execute(&self, task: &DownloadTask, ctx: &RunContext) -> Result<DownloadOutcome> {
        let mut session = self.transport.connect().await?;
        let result = self.download(session.as_mut(), task, ctx).await;
        if let Err(e) = session.close().await {
            debug!("Failed to close session for {}: {}", task, e);
        }
        result
    }

    async fn download(
        &self,
        session: &mut dyn RemoteSession,
        task: &DownloadTask,
        ctx: &RunContext,
    ) -> Result<DownloadOutcome> {
        session.change_dir(&format!("/{}", task.remote_dir())).await?;
        let remote_size = session.stat(&task.file_name).await?;

        let local_path = task.local_path(&self.config.destination);
        if let Ok(metadata) = tokio::fs::metadata(&local_path).await {
            if metadata.is_file() && metadata.len() == remote_size {
                return Ok(DownloadOutcome::SkippedAlreadyPresent);
            }
            debug!(
                "Local {} has {} bytes, remote has {}, downloading again",
                local_path.display(),
                metadata.len(),
                remote_size
            );
        }

        ctx.progress().task_started(task, remote_size);
        tokio::fs::create_dir_all(task.local_dir(&self.config.destination)).await?;

        let write_path = if self.config.staging {
            local_path.with_file_name(format!("{}.part", task.file_name))
        } else {
            local_path.clone()
        };
        let mut file = tokio::fs::File::create(&write_path).await?;

        let token = ctx.token().clone();
        let sink = Arc::clone(ctx.progress());
        let mut on_progress = move |transferred: u64, total: u64| {
            sink.task_progress(task, transferred, total);
            if token.is_cancelled() {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        };

        let result = session
            .stream_download(&task.file_name, &mut file, &mut on_progress)
            .await;
        if let Err(e) = file.flush().await {
            debug!("Failed to flush {}: {}", write_path.display(), e);
        }
        drop(file);

        match result {
            Ok(bytes) => {
                if self.config.staging {
                    tokio::fs::rename(&write_path, &local_path)
                        .await
                        .map_err(|e| {
                            Error::transfer(format!(
                                "Failed to move {} into place: {}",
                                write_path.display(),
                                e
                            ))
                        })?;
                }
                Ok(DownloadOutcome::Completed { bytes })
            }
            Err(TransportError::Aborted) => Ok(DownloadOutcome::Cancelled),
            Err(e) => Err(e.into()),
        }
    }
}

impl std::fmt::Debug for DownloadExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadExecutor")
            .field("transport", &self.transport.describe())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::TempDir;
    use xfmirror_transport::MemoryTransport;
    use xfmirror_types::{FileCategory, ProgressSink};

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<String>>,
    }

    impl RecordingSink {
        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    impl ProgressSink for RecordingSink {
        fn task_started(&self, task: &DownloadTask, total_bytes: u64) {
            self.events
                .lock()
                .unwrap()
                .push(format!("start {} {}", task.file_name, total_bytes));
        }

        fn task_finished(&self, task: &DownloadTask, outcome: &DownloadOutcome) {
            self.events
                .lock()
                .unwrap()
                .push(format!("finish {} {}", task.file_name, outcome.label()));
        }
    }

    fn task() -> DownloadTask {
        DownloadTask::new("Products", "P", "P_Full_20240101.zip", FileCategory::Full)
    }

    fn transport() -> MemoryTransport {
        let transport = MemoryTransport::new();
        transport.add_file("Products/P/P_Full_20240101.zip", "0123456789");
        transport
    }

    #[tokio::test]
    async fn test_download_then_skip() {
        let remote = transport();
        let temp_dir = TempDir::new().unwrap();
        let executor = DownloadExecutor::new(
            Arc::new(remote.clone()),
            ExecutorConfig::new(temp_dir.path()),
        );
        let sink = Arc::new(RecordingSink::default());
        let ctx = RunContext::new(sink.clone());

        let outcome = executor.execute(&task(), &ctx).await;
        assert_eq!(outcome, DownloadOutcome::Completed { bytes: 10 });
        let local = task().local_path(temp_dir.path());
        assert_eq!(std::fs::read(&local).unwrap(), b"0123456789");

        let outcome = executor.execute(&task(), &ctx).await;
        assert_eq!(outcome, DownloadOutcome::SkippedAlreadyPresent);
        assert_eq!(remote.transfer_count(), 1);
        assert_eq!(remote.connect_count(), 2);

        assert_eq!(
            sink.events(),
            vec![
                "start P_Full_20240101.zip 10",
                "finish P_Full_20240101.zip completed",
                "finish P_Full_20240101.zip skipped",
            ]
        );
    }

    #[tokio::test]
    async fn test_size_mismatch_downloads_again() {
        let remote = transport();
        let temp_dir = TempDir::new().unwrap();
        let local = task().local_path(temp_dir.path());
        std::fs::create_dir_all(local.parent().unwrap()).unwrap();
        std::fs::write(&local, b"0123").unwrap();

        let executor =
            DownloadExecutor::new(Arc::new(remote), ExecutorConfig::new(temp_dir.path()));
        let outcome = executor.execute(&task(), &RunContext::silent()).await;
        assert_eq!(outcome, DownloadOutcome::Completed { bytes: 10 });
        assert_eq!(std::fs::read(&local).unwrap(), b"0123456789");
    }

    #[tokio::test]
    async fn test_failure_leaves_partial_file() {
        let remote = transport();
        remote.set_chunk_size(4);
        remote.fail_transfer("Products/P/P_Full_20240101.zip");
        let temp_dir = TempDir::new().unwrap();

        let executor =
            DownloadExecutor::new(Arc::new(remote), ExecutorConfig::new(temp_dir.path()));
        let outcome = executor.execute(&task(), &RunContext::silent()).await;
        assert!(matches!(outcome, DownloadOutcome::Failed(_)));

        let local = task().local_path(temp_dir.path());
        assert_eq!(std::fs::read(&local).unwrap(), b"0123");
    }

    #[tokio::test]
    async fn test_staging_keeps_final_name_clean() {
        let remote = transport();
        remote.set_chunk_size(4);
        remote.fail_transfer("Products/P/P_Full_20240101.zip");
        let temp_dir = TempDir::new().unwrap();

        let executor = DownloadExecutor::new(
            Arc::new(remote.clone()),
            ExecutorConfig::new(temp_dir.path()).with_staging(true),
        );
        let outcome = executor.execute(&task(), &RunContext::silent()).await;
        assert!(matches!(outcome, DownloadOutcome::Failed(_)));

        let local = task().local_path(temp_dir.path());
        assert!(!local.exists());
        assert!(local.with_file_name("P_Full_20240101.zip.part").exists());

        let healthy = transport();
        let executor = DownloadExecutor::new(
            Arc::new(healthy),
            ExecutorConfig::new(temp_dir.path()).with_staging(true),
        );
        let outcome = executor.execute(&task(), &RunContext::silent()).await;
        assert_eq!(outcome, DownloadOutcome::Completed { bytes: 10 });
        assert_eq!(std::fs::read(&local).unwrap(), b"0123456789");
        assert!(!local.with_file_name("P_Full_20240101.zip.part").exists());
    }

    #[tokio::test]
    async fn test_cancelled_token_aborts_transfer() {
        let remote = transport();
        let temp_dir = TempDir::new().unwrap();
        let executor =
            DownloadExecutor::new(Arc::new(remote), ExecutorConfig::new(temp_dir.path()));

        let ctx = RunContext::silent();
        ctx.cancel();
        let outcome = executor.execute(&task(), &ctx).await;
        assert_eq!(outcome, DownloadOutcome::Cancelled);
    }

    #[tokio::test]
    async fn test_missing_remote_file_fails() {
        let remote = transport();
        let temp_dir = TempDir::new().unwrap();
        let executor =
            DownloadExecutor::new(Arc::new(remote), ExecutorConfig::new(temp_dir.path()));

        let missing = DownloadTask::new("Products", "P", "gone.zip", FileCategory::Change);
        let outcome = executor.execute(&missing, &RunContext::silent()).await;
        assert!(matches!(outcome, DownloadOutcome::Failed(_)));
        assert!(!missing.local_path(temp_dir.path()).exists());
    }

    #[tokio::test]
    async fn test_connect_failure_fails_task() {
        let remote = transport();
        remote.set_fail_connect(true);
        let temp_dir = TempDir::new().unwrap();
        let executor =
            DownloadExecutor::new(Arc::new(remote), ExecutorConfig::new(temp_dir.path()));

        let outcome = executor.execute(&task(), &RunContext::silent()).await;
        assert!(matches!(outcome, DownloadOutcome::Failed(_)));
    }
}

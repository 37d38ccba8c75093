//! Scan and download orchestration

use crate::context::RunContext;
use crate::executor::{DownloadExecutor, ExecutorConfig};
use crate::scanner::{PackageScanner, ScanMode, ScanOutcome};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use xfmirror_config::{AreaConfig, CategoryToggles, Config};
use xfmirror_transport::{RemoteSession, RemoteTransport};
use xfmirror_types::{DownloadTask, Error, Result, SizeReport, SyncStats, WorkerCount};

/// What to scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Remote areas in scan order
    pub areas: Vec<AreaConfig>,
    /// Included file categories
    pub categories: CategoryToggles,
}

impl ScanOptions {
    /// Create scan options from main config
    pub fn from_config(config: &Config) -> Self {
        Self {
            areas: config.areas.clone(),
            categories: config.categories,
        }
    }
}

/// Where and how to download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOptions {
    /// Local destination root
    pub destination: PathBuf,
    /// Download worker pool size
    pub workers: WorkerCount,
    /// Write to `<name>.part` and rename once complete
    pub staging: bool,
    /// Directories created under the destination before syncing
    pub scaffold_dirs: Vec<String>,
}

impl DownloadOptions {
    /// Create download options with default workers and no scaffold
    pub fn new<P: AsRef<Path>>(destination: P) -> Self {
        Self {
            destination: destination.as_ref().to_path_buf(),
            workers: WorkerCount::default(),
            staging: false,
            scaffold_dirs: Vec::new(),
        }
    }

    /// Set the worker pool size
    pub fn with_workers(mut self, workers: WorkerCount) -> Self {
        self.workers = workers;
        self
    }

    /// Create download options from main config
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            destination: config.require_destination()?.clone(),
            workers: config.worker_count()?,
            staging: config.transfer.staging,
            scaffold_dirs: config.local.scaffold_dirs.clone(),
        })
    }

    fn executor_config(&self) -> ExecutorConfig {
        ExecutorConfig::new(&self.destination).with_staging(self.staging)
    }
}

/// Result of a full synchronization run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// Scan phase result
    pub scan: ScanOutcome,
    /// Download phase counters
    pub stats: SyncStats,
}

/// Drives scan, sync and estimate runs against one transport
pub struct Orchestrator {
    transport: Arc<dyn RemoteTransport>,
    options: ScanOptions,
}

impl Orchestrator {
    /// Create a new orchestrator
    pub fn new(transport: Arc<dyn RemoteTransport>, options: ScanOptions) -> Self {
        Self { transport, options }
    }

    /// Create an orchestrator from main config
    pub fn from_config(transport: Arc<dyn RemoteTransport>, config: &Config) -> Self {
        Self::new(transport, ScanOptions::from_config(config))
    }

    /// Scan options in use
    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    async fn open_session(&self) -> Result<Box<dyn RemoteSession>> {
        let session = self.transport.connect().await.map_err(|e| {
            Error::connection(format!(
                "Failed to connect to {}: {}",
                self.transport.describe(),
                e
            ))
        })?;
        info!("Connected to {}", self.transport.describe());
        Ok(session)
    }

    /// Scan every configured area over a single session
    pub async fn scan(&self, mode: ScanMode, ctx: &RunContext) -> Result<ScanOutcome> {
        let mut session = self.open_session().await?;
        let scanner = PackageScanner::new(&self.options.areas, self.options.categories, mode);
        let outcome = scanner.scan(session.as_mut(), ctx.token()).await;
        if let Err(e) = session.close().await {
            debug!("Failed to close scan session: {}", e);
        }
        outcome
    }

    /// Mirror every selected file into the destination
    pub async fn sync(&self, options: &DownloadOptions, ctx: &RunContext) -> Result<SyncReport> {
        prepare_destination(options).await?;
        let scan = self
            .scan(ScanMode::Prepare(options.destination.clone()), ctx)
            .await?;
        let stats = self.download(scan.tasks.clone(), options, ctx).await;
        Ok(SyncReport { scan, stats })
    }

    /// Run tasks through the worker pool
    ///
    /// Workers pull from a shared queue until it is empty or the run is
    /// cancelled. Tasks still queued at that point count as not started.
    pub async fn download(
        &self,
        tasks: Vec<DownloadTask>,
        options: &DownloadOptions,
        ctx: &RunContext,
    ) -> SyncStats {
        let start = Instant::now();
        let total = tasks.len();
        let workers = options.workers.get().min(total).max(1);
        info!("Starting {} download workers for {} files", workers, total);
        ctx.progress().run_started(total);

        let executor = Arc::new(DownloadExecutor::new(
            Arc::clone(&self.transport),
            options.executor_config(),
        ));
        let queue = Arc::new(Mutex::new(VecDeque::from(tasks)));
        let stats = Arc::new(Mutex::new(SyncStats::new()));

        let mut pool = JoinSet::new();
        for worker_id in 0..workers {
            let executor = Arc::clone(&executor);
            let queue = Arc::clone(&queue);
            let stats = Arc::clone(&stats);
            let ctx = ctx.clone();

            pool.spawn(async move {
                loop {
                    if ctx.is_cancelled() {
                        debug!("Worker {} stopping on cancellation", worker_id);
                        break;
                    }
                    let Some(task) = queue.lock().await.pop_front() else {
                        break;
                    };
                    let outcome = executor.execute(&task, &ctx).await;
                    stats.lock().await.record(&outcome);
                }
            });
        }

        while let Some(joined) = pool.join_next().await {
            if let Err(e) = joined {
                error!("Download worker failed: {}", e);
            }
        }

        let mut stats = stats.lock().await.clone();
        stats.not_started = queue.lock().await.len();
        stats.duration = start.elapsed();
        if stats.not_started > 0 {
            warn!("{} files were not started", stats.not_started);
        }
        info!(
            "Download finished: {} completed, {} skipped, {} failed, {} cancelled",
            stats.completed, stats.skipped, stats.failed, stats.cancelled
        );
        stats
    }

    /// Size up what a sync would select without downloading
    ///
    /// Files whose size cannot be read are logged and left out.
    pub async fn estimate(&self, ctx: &RunContext) -> Result<SizeReport> {
        let mut session = self.open_session().await?;
        let scanner = PackageScanner::new(
            &self.options.areas,
            self.options.categories,
            ScanMode::Dry,
        );
        let outcome = scanner.scan(session.as_mut(), ctx.token()).await?;

        let mut report = SizeReport::new();
        for task in &outcome.tasks {
            if ctx.is_cancelled() {
                warn!("Estimate interrupted");
                break;
            }
            match session.stat(&format!("/{}", task.remote_path())).await {
                Ok(size) => report.push(task, size),
                Err(e) => warn!("Failed to read size of {}: {}", task, e),
            }
        }

        if let Err(e) = session.close().await {
            debug!("Failed to close estimate session: {}", e);
        }
        Ok(report)
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("transport", &self.transport.describe())
            .field("options", &self.options)
            .finish()
    }
}

async fn prepare_destination(options: &DownloadOptions) -> Result<()> {
    let create = |path: PathBuf| async move {
        tokio::fs::create_dir_all(&path).await.map_err(|e| {
            Error::config(format!("Cannot create directory {}: {}", path.display(), e))
        })
    };

    create(options.destination.clone()).await?;
    for dir in &options.scaffold_dirs {
        create(options.destination.join(dir)).await?;
    }
    Ok(())
}

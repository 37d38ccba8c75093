//! Feed selection and download engine for xfmirror
//!
//! This crate turns remote package listings into download tasks and runs
//! them through a bounded worker pool.
//!
//! # Features
//!
//! - **Selection**: latest config file, whole installer packages, and the
//!   flag, snapshot and change files of standard packages
//! - **Conventions**: marker (`Full`/`Change`) and prefix (`f_`/`t_`) naming
//! - **Idempotent downloads**: files whose local size matches the remote are
//!   skipped without transfer
//! - **Cancellation**: a shared token stops dequeueing and aborts in-flight
//!   transfers at the next chunk
//! - **Estimates**: size reports of a run without downloading
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use xfmirror_config::Config;
//! use xfmirror_engine::{transport_from_config, DownloadOptions, Orchestrator, RunContext};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let transport = transport_from_config(&config.remote, config.transfer.buffer_size)?;
//! let orchestrator = Orchestrator::from_config(transport, &config);
//!
//! let options = DownloadOptions::from_config(&config)?;
//! let report = orchestrator.sync(&options, &RunContext::silent()).await?;
//! println!("Downloaded {} files", report.stats.completed);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod context;
pub mod executor;
pub mod orchestrator;
pub mod rules;
pub mod scanner;
pub mod selector;
pub mod timestamp;
pub mod transport;

pub use context::RunContext;
pub use executor::{DownloadExecutor, ExecutorConfig};
pub use orchestrator::{DownloadOptions, Orchestrator, ScanOptions, SyncReport};
pub use rules::PackageRule;
pub use scanner::{plan_package, PackagePlan, PackageScanner, ScanMode, ScanNote, ScanOutcome};
pub use selector::{select_changes, select_changes_since, select_snapshot};
pub use timestamp::{extract_timestamp, DigitWindow};
pub use transport::transport_from_config;

// Shared with callers that build their own contexts
pub use tokio_util::sync::CancellationToken;

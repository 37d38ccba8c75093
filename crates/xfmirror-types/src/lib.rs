//! Core type system and error handling for xfmirror
//!
//! This crate provides the foundational types, error handling, and shared data structures
//! used throughout the xfmirror workspace. It includes:
//!
//! - **Error handling**: Error kinds and the run-halting policy
//! - **Core types**: Download tasks, outcomes, run statistics and size reports
//! - **Naming conventions**: File classification predicates for feed areas
//! - **Configuration**: Validated worker-pool and buffer sizes
//!
//! # Features
//!
//! - `serde`: Enable serialization support
//!
//! # Examples
//!
//! ```rust
//! use xfmirror_types::{DownloadOutcome, Result, SyncStats};
//!
//! fn example_run() -> Result<SyncStats> {
//!     let mut stats = SyncStats::new();
//!     stats.record(&DownloadOutcome::Completed { bytes: 1024 });
//!     stats.record(&DownloadOutcome::SkippedAlreadyPresent);
//!     Ok(stats)
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use config::{BufferSize, WorkerCount};
pub use error::{Error, ErrorKind};
pub use result::Result;
pub use traits::*;
pub use types::*;

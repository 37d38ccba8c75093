//! Remote transports for xfmirror
//!
//! The sync engine never talks to a concrete protocol. It consumes the
//! [`RemoteTransport`] / [`RemoteSession`] pair defined here:
//!
//! - **list_dir / stat / change_dir**: directory navigation with a per-session
//!   working directory
//! - **stream_download**: chunked streaming into any `AsyncWrite` with a
//!   progress callback that can abort the transfer
//!
//! # Transports
//!
//! - [`FsTransport`]: a local or mounted directory acting as the remote root
//! - `SftpTransport`: SSH/SFTP, enabled by the `sftp` feature
//! - `MemoryTransport`: in-memory tree with fault injection, enabled by the
//!   `test-utils` feature
//!
//! # Examples
//!
//! ```rust,no_run
//! use xfmirror_transport::{FsTransport, RemoteTransport};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = FsTransport::new("/mnt/postbox");
//! let mut session = transport.connect().await?;
//! for area in session.list_dir("/").await? {
//!     println!("{}", area);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod fs;
#[cfg(any(test, feature = "test-utils"))]
pub mod memory;
pub mod path;
pub mod session;
#[cfg(feature = "sftp")]
pub mod sftp;

pub use error::{TransportError, TransportResult};
pub use fs::FsTransport;
#[cfg(any(test, feature = "test-utils"))]
pub use memory::MemoryTransport;
pub use path::RemotePath;
pub use session::{ProgressCallback, RemoteSession, RemoteTransport};
#[cfg(feature = "sftp")]
pub use sftp::{SftpConfig, SftpTransport};

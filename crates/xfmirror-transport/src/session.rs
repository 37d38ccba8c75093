//! Transport and session traits consumed by the sync engine

use crate::TransportResult;
use async_trait::async_trait;
use std::ops::ControlFlow;
use tokio::io::AsyncWrite;

/// Progress callback invoked with `(transferred, total)` after every chunk
///
/// Returning [`ControlFlow::Break`] aborts the transfer with
/// [`TransportError::Aborted`](crate::TransportError::Aborted).
pub type ProgressCallback<'a> = dyn FnMut(u64, u64) -> ControlFlow<()> + Send + 'a;

/// Factory for remote sessions
#[async_trait]
pub trait RemoteTransport: Send + Sync {
    /// Open a new session positioned at the transport root
    async fn connect(&self) -> TransportResult<Box<dyn RemoteSession>>;

    /// Human-readable endpoint, used in logs
    fn describe(&self) -> String;
}

/// A stateful session with a current working directory
///
/// Sessions are never shared between workers; each download task opens its own.
#[async_trait]
pub trait RemoteSession: Send {
    /// List entry names of a directory
    async fn list_dir(&mut self, path: &str) -> TransportResult<Vec<String>>;

    /// Size of a remote file in bytes
    async fn stat(&mut self, path: &str) -> TransportResult<u64>;

    /// Change the current working directory
    async fn change_dir(&mut self, path: &str) -> TransportResult<()>;

    /// Stream a remote file into `writer`, returning the number of bytes written
    async fn stream_download(
        &mut self,
        path: &str,
        writer: &mut (dyn AsyncWrite + Unpin + Send),
        on_progress: &mut ProgressCallback<'_>,
    ) -> TransportResult<u64>;

    /// Close the session
    async fn close(&mut self) -> TransportResult<()> {
        Ok(())
    }
}

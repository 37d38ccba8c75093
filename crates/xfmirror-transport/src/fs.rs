//! Transport over a locally mounted directory tree

use crate::{
    ProgressCallback, RemotePath, RemoteSession, RemoteTransport, TransportError, TransportResult,
};
use async_trait::async_trait;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

/// Treats a local directory (for example a mounted postbox share) as the remote root
#[derive(Debug, Clone)]
pub struct FsTransport {
    root: PathBuf,
    chunk_size: usize,
}

impl FsTransport {
    /// Default read chunk size
    pub const DEFAULT_CHUNK_SIZE: usize = 256 * 1024;

    /// Create a transport rooted at `root`
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            chunk_size: Self::DEFAULT_CHUNK_SIZE,
        }
    }

    /// Set the read chunk size
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Root directory
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl RemoteTransport for FsTransport {
    async fn connect(&self) -> TransportResult<Box<dyn RemoteSession>> {
        let metadata = tokio::fs::metadata(&self.root)
            .await
            .map_err(|e| TransportError::connect(self.describe(), e.to_string()))?;
        if !metadata.is_dir() {
            return Err(TransportError::connect(
                self.describe(),
                "root is not a directory",
            ));
        }

        debug!("Opened filesystem session at {}", self.root.display());
        Ok(Box::new(FsSession {
            root: self.root.clone(),
            cwd: RemotePath::root(),
            chunk_size: self.chunk_size,
        }))
    }

    fn describe(&self) -> String {
        format!("file://{}", self.root.display())
    }
}

struct FsSession {
    root: PathBuf,
    cwd: RemotePath,
    chunk_size: usize,
}

impl FsSession {
    fn locate(&self, path: &str) -> TransportResult<(RemotePath, PathBuf)> {
        let remote = self.cwd.resolve(path)?;
        let local = remote.to_fs_path(&self.root);
        Ok((remote, local))
    }
}

fn map_io(remote: &RemotePath, error: std::io::Error) -> TransportError {
    if error.kind() == std::io::ErrorKind::NotFound {
        TransportError::not_found(remote.to_string())
    } else {
        TransportError::io(remote.to_string(), error)
    }
}

#[async_trait]
impl RemoteSession for FsSession {
    async fn list_dir(&mut self, path: &str) -> TransportResult<Vec<String>> {
        let (remote, local) = self.locate(path)?;
        let mut entries = tokio::fs::read_dir(&local)
            .await
            .map_err(|e| map_io(&remote, e))?;

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| map_io(&remote, e))? {
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        // read_dir order is platform dependent
        names.sort();
        Ok(names)
    }

    async fn stat(&mut self, path: &str) -> TransportResult<u64> {
        let (remote, local) = self.locate(path)?;
        let metadata = tokio::fs::metadata(&local)
            .await
            .map_err(|e| map_io(&remote, e))?;
        if !metadata.is_file() {
            return Err(TransportError::protocol(format!("{} is not a file", remote)));
        }
        Ok(metadata.len())
    }

    async fn change_dir(&mut self, path: &str) -> TransportResult<()> {
        let (remote, local) = self.locate(path)?;
        let metadata = tokio::fs::metadata(&local)
            .await
            .map_err(|e| map_io(&remote, e))?;
        if !metadata.is_dir() {
            return Err(TransportError::protocol(format!(
                "{} is not a directory",
                remote
            )));
        }
        self.cwd = remote;
        Ok(())
    }

    async fn stream_download(
        &mut self,
        path: &str,
        writer: &mut (dyn AsyncWrite + Unpin + Send),
        on_progress: &mut ProgressCallback<'_>,
    ) -> TransportResult<u64> {
        let (remote, local) = self.locate(path)?;
        let mut file = tokio::fs::File::open(&local)
            .await
            .map_err(|e| map_io(&remote, e))?;
        let total = file
            .metadata()
            .await
            .map_err(|e| map_io(&remote, e))?
            .len();

        let mut buffer = vec![0u8; self.chunk_size];
        let mut transferred = 0u64;
        loop {
            let read = file
                .read(&mut buffer)
                .await
                .map_err(|e| map_io(&remote, e))?;
            if read == 0 {
                break;
            }
            writer
                .write_all(&buffer[..read])
                .await
                .map_err(|e| TransportError::io(remote.to_string(), e))?;
            transferred += read as u64;
            if on_progress(transferred, total) == ControlFlow::Break(()) {
                return Err(TransportError::Aborted);
            }
        }

        writer
            .flush()
            .await
            .map_err(|e| TransportError::io(remote.to_string(), e))?;
        Ok(transferred)
    }
}

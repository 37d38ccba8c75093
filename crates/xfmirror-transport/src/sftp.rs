//! SSH/SFTP transport
//!
//! libssh2 is blocking, so every call runs on the blocking thread pool.
//! Downloads read on the blocking side and hand chunks to the async writer
//! over a bounded channel; dropping the receiver stops the reader.

use crate::{
    ProgressCallback, RemotePath, RemoteSession, RemoteTransport, TransportError, TransportResult,
};
use async_trait::async_trait;
use ssh2::{Session, Sftp};
use std::io::Read;
use std::net::TcpStream;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::debug;

/// Connection settings for [`SftpTransport`]
#[derive(Debug, Clone)]
pub struct SftpConfig {
    /// Remote host name or address
    pub host: String,
    /// Remote SSH port
    pub port: u16,
    /// Login user
    pub username: String,
    /// Login password
    pub password: String,
    /// Remote directory treated as the transport root
    pub root: String,
    /// Session read/write timeout
    pub timeout: Duration,
    /// Download chunk size
    pub chunk_size: usize,
}

impl Default for SftpConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 22,
            username: String::new(),
            password: String::new(),
            root: ".".to_string(),
            timeout: Duration::from_secs(60),
            chunk_size: 256 * 1024,
        }
    }
}

/// Password-authenticated SFTP transport
#[derive(Debug, Clone)]
pub struct SftpTransport {
    config: Arc<SftpConfig>,
}

impl SftpTransport {
    /// Create a new SFTP transport
    pub fn new(config: SftpConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

struct Handle {
    // Keeps the SSH session alive for as long as the SFTP channel is used
    _session: Session,
    sftp: Sftp,
}

fn protocol(error: ssh2::Error) -> TransportError {
    TransportError::protocol(error.to_string())
}

fn join_error(error: tokio::task::JoinError) -> TransportError {
    TransportError::protocol(format!("blocking task failed: {}", error))
}

#[async_trait]
impl RemoteTransport for SftpTransport {
    async fn connect(&self) -> TransportResult<Box<dyn RemoteSession>> {
        let config = Arc::clone(&self.config);
        let endpoint = self.describe();

        let handle = tokio::task::spawn_blocking(move || -> TransportResult<Handle> {
            let fail = |message: String| TransportError::connect(endpoint.clone(), message);

            let tcp = TcpStream::connect((config.host.as_str(), config.port))
                .map_err(|e| fail(e.to_string()))?;
            let mut session = Session::new().map_err(|e| fail(e.to_string()))?;
            session.set_timeout(u32::try_from(config.timeout.as_millis()).unwrap_or(u32::MAX));
            session.set_tcp_stream(tcp);
            session.handshake().map_err(|e| fail(e.to_string()))?;
            session
                .userauth_password(&config.username, &config.password)
                .map_err(|e| fail(e.to_string()))?;
            if !session.authenticated() {
                return Err(fail("authentication rejected".to_string()));
            }
            let sftp = session.sftp().map_err(|e| fail(e.to_string()))?;
            Ok(Handle {
                _session: session,
                sftp,
            })
        })
        .await
        .map_err(join_error)??;

        debug!("Opened SFTP session to {}", self.describe());
        Ok(Box::new(SftpSession {
            handle: Arc::new(Mutex::new(handle)),
            root: PathBuf::from(&self.config.root),
            cwd: RemotePath::root(),
            chunk_size: self.config.chunk_size.max(1),
        }))
    }

    fn describe(&self) -> String {
        format!(
            "sftp://{}@{}:{}",
            self.config.username, self.config.host, self.config.port
        )
    }
}

struct SftpSession {
    handle: Arc<Mutex<Handle>>,
    root: PathBuf,
    cwd: RemotePath,
    chunk_size: usize,
}

impl SftpSession {
    fn locate(&self, path: &str) -> TransportResult<(RemotePath, PathBuf)> {
        let remote = self.cwd.resolve(path)?;
        let full = remote.to_fs_path(&self.root);
        Ok((remote, full))
    }

    async fn with_sftp<T, F>(&self, f: F) -> TransportResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Sftp) -> TransportResult<T> + Send + 'static,
    {
        let handle = Arc::clone(&self.handle);
        tokio::task::spawn_blocking(move || {
            let guard = handle.lock().unwrap_or_else(PoisonError::into_inner);
            f(&guard.sftp)
        })
        .await
        .map_err(join_error)?
    }
}

fn stat_error(remote: &RemotePath, error: ssh2::Error) -> TransportError {
    // LIBSSH2_FX_NO_SUCH_FILE
    if matches!(error.code(), ssh2::ErrorCode::SFTP(2)) {
        TransportError::not_found(remote.to_string())
    } else {
        protocol(error)
    }
}

#[async_trait]
impl RemoteSession for SftpSession {
    async fn list_dir(&mut self, path: &str) -> TransportResult<Vec<String>> {
        let (remote, full) = self.locate(path)?;
        self.with_sftp(move |sftp| {
            let entries = sftp
                .readdir(&full)
                .map_err(|e| stat_error(&remote, e))?;
            Ok(entries
                .into_iter()
                .filter_map(|(p, _)| p.file_name().and_then(|n| n.to_str()).map(String::from))
                .filter(|name| name != "." && name != "..")
                .collect())
        })
        .await
    }

    async fn stat(&mut self, path: &str) -> TransportResult<u64> {
        let (remote, full) = self.locate(path)?;
        self.with_sftp(move |sftp| {
            let stat = sftp.stat(&full).map_err(|e| stat_error(&remote, e))?;
            if stat.is_dir() {
                return Err(TransportError::protocol(format!("{} is not a file", remote)));
            }
            stat.size
                .ok_or_else(|| TransportError::protocol(format!("{} has no size", remote)))
        })
        .await
    }

    async fn change_dir(&mut self, path: &str) -> TransportResult<()> {
        let (remote, full) = self.locate(path)?;
        let checked = remote.clone();
        self.with_sftp(move |sftp| {
            let stat = sftp.stat(&full).map_err(|e| stat_error(&checked, e))?;
            if stat.is_dir() {
                Ok(())
            } else {
                Err(TransportError::protocol(format!(
                    "{} is not a directory",
                    checked
                )))
            }
        })
        .await?;
        self.cwd = remote;
        Ok(())
    }

    async fn stream_download(
        &mut self,
        path: &str,
        writer: &mut (dyn AsyncWrite + Unpin + Send),
        on_progress: &mut ProgressCallback<'_>,
    ) -> TransportResult<u64> {
        let (remote, full) = self.locate(path)?;
        let total = self.stat(path).await?;

        let (tx, mut rx) = mpsc::channel::<TransportResult<Vec<u8>>>(4);
        let handle = Arc::clone(&self.handle);
        let chunk_size = self.chunk_size;
        let reader_path = remote.clone();
        let reader = tokio::task::spawn_blocking(move || {
            let guard = handle.lock().unwrap_or_else(PoisonError::into_inner);
            let mut file = match guard.sftp.open(Path::new(&full)) {
                Ok(file) => file,
                Err(e) => {
                    let _ = tx.blocking_send(Err(stat_error(&reader_path, e)));
                    return;
                }
            };
            let mut buffer = vec![0u8; chunk_size];
            loop {
                match file.read(&mut buffer) {
                    Ok(0) => break,
                    Ok(n) => {
                        if tx.blocking_send(Ok(buffer[..n].to_vec())).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        let error = TransportError::io(reader_path.to_string(), e);
                        let _ = tx.blocking_send(Err(error));
                        break;
                    }
                }
            }
        });

        let mut transferred = 0u64;
        while let Some(chunk) = rx.recv().await {
            let chunk = chunk?;
            writer
                .write_all(&chunk)
                .await
                .map_err(|e| TransportError::io(remote.to_string(), e))?;
            transferred += chunk.len() as u64;
            if on_progress(transferred, total) == ControlFlow::Break(()) {
                drop(rx);
                return Err(TransportError::Aborted);
            }
        }
        reader.await.map_err(join_error)?;

        writer
            .flush()
            .await
            .map_err(|e| TransportError::io(remote.to_string(), e))?;
        Ok(transferred)
    }
}

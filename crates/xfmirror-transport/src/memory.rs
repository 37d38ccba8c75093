//! In-process transport with fault injection

use crate::{
    ProgressCallback, RemotePath, RemoteSession, RemoteTransport, TransportError, TransportResult,
};
use async_trait::async_trait;
use std::collections::HashSet;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};

#[derive(Debug)]
struct Node {
    path: String,
    data: Option<Vec<u8>>,
}

#[derive(Debug)]
struct MemoryState {
    nodes: Mutex<Vec<Node>>,
    failing_transfers: Mutex<HashSet<String>>,
    failing_listings: Mutex<HashSet<String>>,
    fail_connect: AtomicBool,
    chunk_size: AtomicUsize,
    chunk_delay: Mutex<Option<Duration>>,
    connects: AtomicUsize,
    stats: AtomicUsize,
    transfers: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Remote tree held in memory
///
/// Directory listings preserve insertion order. Clones share state, so a
/// test can keep a handle for inspecting counters after handing the
/// transport to the engine.
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    state: Arc<MemoryState>,
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTransport {
    /// Create an empty tree
    pub fn new() -> Self {
        Self {
            state: Arc::new(MemoryState {
                nodes: Mutex::new(Vec::new()),
                failing_transfers: Mutex::new(HashSet::new()),
                failing_listings: Mutex::new(HashSet::new()),
                fail_connect: AtomicBool::new(false),
                chunk_size: AtomicUsize::new(64 * 1024),
                chunk_delay: Mutex::new(None),
                connects: AtomicUsize::new(0),
                stats: AtomicUsize::new(0),
                transfers: AtomicUsize::new(0),
            }),
        }
    }

    fn normalize(path: &str) -> String {
        path.split('/')
            .filter(|s| !s.is_empty() && *s != ".")
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Add or replace a file
    pub fn add_file(&self, path: &str, data: impl Into<Vec<u8>>) -> &Self {
        let path = Self::normalize(path);
        let data = data.into();
        let mut nodes = lock(&self.state.nodes);
        if let Some(node) = nodes.iter_mut().find(|n| n.path == path) {
            node.data = Some(data);
        } else {
            nodes.push(Node {
                path,
                data: Some(data),
            });
        }
        self
    }

    /// Add a file filled with `size` zero bytes
    pub fn add_sized_file(&self, path: &str, size: usize) -> &Self {
        self.add_file(path, vec![0u8; size])
    }

    /// Add an empty directory
    pub fn add_dir(&self, path: &str) -> &Self {
        let path = Self::normalize(path);
        let mut nodes = lock(&self.state.nodes);
        if !nodes.iter().any(|n| n.path == path) {
            nodes.push(Node { path, data: None });
        }
        self
    }

    /// Make every `connect` call fail
    pub fn set_fail_connect(&self, fail: bool) {
        self.state.fail_connect.store(fail, Ordering::SeqCst);
    }

    /// Make transfers of `path` fail after the first chunk
    pub fn fail_transfer(&self, path: &str) {
        lock(&self.state.failing_transfers).insert(Self::normalize(path));
    }

    /// Make listings of directory `path` fail
    pub fn fail_listing(&self, path: &str) {
        lock(&self.state.failing_listings).insert(Self::normalize(path));
    }

    /// Set the chunk size used when streaming
    pub fn set_chunk_size(&self, chunk_size: usize) {
        self.state.chunk_size.store(chunk_size.max(1), Ordering::SeqCst);
    }

    /// Sleep this long before sending each chunk
    pub fn set_chunk_delay(&self, delay: Option<Duration>) {
        *lock(&self.state.chunk_delay) = delay;
    }

    /// Number of successful `connect` calls
    pub fn connect_count(&self) -> usize {
        self.state.connects.load(Ordering::SeqCst)
    }

    /// Number of `stat` calls
    pub fn stat_count(&self) -> usize {
        self.state.stats.load(Ordering::SeqCst)
    }

    /// Number of `stream_download` calls
    pub fn transfer_count(&self) -> usize {
        self.state.transfers.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteTransport for MemoryTransport {
    async fn connect(&self) -> TransportResult<Box<dyn RemoteSession>> {
        if self.state.fail_connect.load(Ordering::SeqCst) {
            return Err(TransportError::connect(self.describe(), "connection refused"));
        }
        self.state.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemorySession {
            state: Arc::clone(&self.state),
            cwd: RemotePath::root(),
        }))
    }

    fn describe(&self) -> String {
        "memory://".to_string()
    }
}

struct MemorySession {
    state: Arc<MemoryState>,
    cwd: RemotePath,
}

impl MemorySession {
    fn is_dir(nodes: &[Node], key: &str) -> bool {
        key.is_empty()
            || nodes.iter().any(|n| {
                (n.path == key && n.data.is_none()) || n.path.starts_with(&format!("{}/", key))
            })
    }

    fn file_data(&self, remote: &RemotePath) -> TransportResult<Vec<u8>> {
        let key = remote.key();
        lock(&self.state.nodes)
            .iter()
            .find(|n| n.path == key)
            .and_then(|n| n.data.clone())
            .ok_or_else(|| TransportError::not_found(remote.to_string()))
    }
}

#[async_trait]
impl RemoteSession for MemorySession {
    async fn list_dir(&mut self, path: &str) -> TransportResult<Vec<String>> {
        let remote = self.cwd.resolve(path)?;
        let key = remote.key();
        if lock(&self.state.failing_listings).contains(&key) {
            return Err(TransportError::protocol(format!(
                "permission denied listing {}",
                remote
            )));
        }

        let nodes = lock(&self.state.nodes);
        if !Self::is_dir(&nodes, &key) {
            return Err(TransportError::not_found(remote.to_string()));
        }

        let prefix = if key.is_empty() {
            String::new()
        } else {
            format!("{}/", key)
        };
        let mut names: Vec<String> = Vec::new();
        for node in nodes.iter() {
            if let Some(rest) = node.path.strip_prefix(&prefix) {
                if let Some(child) = rest.split('/').next().filter(|c| !c.is_empty()) {
                    if !names.iter().any(|n| n == child) {
                        names.push(child.to_string());
                    }
                }
            }
        }
        Ok(names)
    }

    async fn stat(&mut self, path: &str) -> TransportResult<u64> {
        let remote = self.cwd.resolve(path)?;
        self.state.stats.fetch_add(1, Ordering::SeqCst);
        self.file_data(&remote).map(|data| data.len() as u64)
    }

    async fn change_dir(&mut self, path: &str) -> TransportResult<()> {
        let remote = self.cwd.resolve(path)?;
        if !Self::is_dir(&lock(&self.state.nodes), &remote.key()) {
            return Err(TransportError::not_found(remote.to_string()));
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
        let remote = self.cwd.resolve(path)?;
        self.state.transfers.fetch_add(1, Ordering::SeqCst);
        let data = self.file_data(&remote)?;
        let fails = lock(&self.state.failing_transfers).contains(&remote.key());
        let chunk_size = self.state.chunk_size.load(Ordering::SeqCst);
        let delay = *lock(&self.state.chunk_delay);

        let total = data.len() as u64;
        let mut transferred = 0u64;
        for chunk in data.chunks(chunk_size) {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            writer
                .write_all(chunk)
                .await
                .map_err(|e| TransportError::io(remote.to_string(), e))?;
            transferred += chunk.len() as u64;
            if fails {
                return Err(TransportError::protocol("connection reset by peer"));
            }
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

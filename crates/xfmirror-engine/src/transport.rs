//! Transport construction from configuration

use std::sync::Arc;
use xfmirror_config::{RemoteConfig, TransportKind};
use xfmirror_transport::{FsTransport, RemoteTransport};
use xfmirror_types::{BufferSize, Error, Result};

/// Build the transport named by the remote configuration
pub fn transport_from_config(
    remote: &RemoteConfig,
    buffer_size: BufferSize,
) -> Result<Arc<dyn RemoteTransport>> {
    match remote.transport {
        TransportKind::Fs => {
            let root = remote
                .root
                .as_deref()
                .filter(|root| !root.is_empty())
                .ok_or_else(|| Error::config("remote.root is required for the fs transport"))?;
            Ok(Arc::new(
                FsTransport::new(root).with_chunk_size(buffer_size.get()),
            ))
        }
        TransportKind::Sftp => sftp_transport(remote, buffer_size),
    }
}

#[cfg(feature = "sftp")]
fn sftp_transport(
    remote: &RemoteConfig,
    buffer_size: BufferSize,
) -> Result<Arc<dyn RemoteTransport>> {
    use xfmirror_transport::{SftpConfig, SftpTransport};

    let required = |value: &Option<String>, key: &str| {
        value
            .clone()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::config(format!("{} is required for the sftp transport", key)))
    };

    let config = SftpConfig {
        host: required(&remote.host, "remote.host")?,
        port: remote.port,
        username: required(&remote.username, "remote.username")?,
        password: required(&remote.password, "remote.password")?,
        root: remote.root.clone().unwrap_or_else(|| ".".to_string()),
        timeout: remote.timeout(),
        chunk_size: buffer_size.get(),
    };
    Ok(Arc::new(SftpTransport::new(config)))
}

#[cfg(not(feature = "sftp"))]
fn sftp_transport(
    _remote: &RemoteConfig,
    _buffer_size: BufferSize,
) -> Result<Arc<dyn RemoteTransport>> {
    Err(Error::config(
        "this build has no SFTP support; rebuild with the `sftp` feature or set remote.transport to fs",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_fs_transport_requires_root() {
        let remote = RemoteConfig {
            transport: TransportKind::Fs,
            ..RemoteConfig::default()
        };
        let err = transport_from_config(&remote, BufferSize::default()).err().unwrap();
        assert!(err.halts_run());
    }

    #[tokio::test]
    async fn test_fs_transport_from_config() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir(temp_dir.path().join("Products")).unwrap();
        let remote = RemoteConfig {
            transport: TransportKind::Fs,
            root: Some(temp_dir.path().to_string_lossy().into_owned()),
            ..RemoteConfig::default()
        };

        let transport = transport_from_config(&remote, BufferSize::default()).unwrap();
        let mut session = transport.connect().await.unwrap();
        assert_eq!(session.list_dir("/").await.unwrap(), vec!["Products"]);
    }

    #[cfg(not(feature = "sftp"))]
    #[test]
    fn test_sftp_unavailable_is_config_error() {
        let remote = RemoteConfig::default();
        let err = transport_from_config(&remote, BufferSize::default()).err().unwrap();
        assert!(err.halts_run());
        assert!(err.to_string().contains("sftp"));
    }
}

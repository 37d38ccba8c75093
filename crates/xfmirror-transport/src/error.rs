//! Error types for remote transports

use thiserror::Error;
use xfmirror_types::Error as XfError;

/// Transport error type
#[derive(Error, Debug)]
pub enum TransportError {
    /// Establishing or authenticating the session failed
    #[error("Failed to connect to {endpoint}: {message}")]
    Connect {
        /// Remote endpoint description
        endpoint: String,
        /// Error message
        message: String,
    },

    /// Remote path does not exist
    #[error("Remote path not found: {path}")]
    NotFound {
        /// Remote path
        path: String,
    },

    /// Remote path escapes the transport root or is otherwise malformed
    #[error("Invalid remote path: {path}")]
    InvalidPath {
        /// Offending path
        path: String,
    },

    /// Local or remote I/O failure
    #[error("I/O error on '{path}': {source}")]
    Io {
        /// Path being read or written
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Protocol-level failure reported by the remote side
    #[error("Protocol error: {message}")]
    Protocol {
        /// Error message
        message: String,
    },

    /// The progress callback asked to stop the transfer
    #[error("Transfer aborted")]
    Aborted,
}

impl TransportError {
    /// Create a new connect error
    pub fn connect<E: Into<String>, S: Into<String>>(endpoint: E, message: S) -> Self {
        Self::Connect {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Create a new not-found error
    pub fn not_found<S: Into<String>>(path: S) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Create a new I/O error for a path
    pub fn io<S: Into<String>>(path: S, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a new protocol error
    pub fn protocol<S: Into<String>>(message: S) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Check if this error reports a missing remote path
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<TransportError> for XfError {
    fn from(error: TransportError) -> Self {
        match error {
            TransportError::Connect { .. } => XfError::connection(error.to_string()),
            TransportError::Aborted => XfError::Cancelled,
            other => XfError::transfer(other.to_string()),
        }
    }
}

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

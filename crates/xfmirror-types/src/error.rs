//! Error types and handling for xfmirror
//!
//! Errors are split along the run's propagation policy: configuration and
//! connection failures halt the whole run, everything else is isolated to
//! the package or file it happened in and folded into the final summary.

/// Main error type for xfmirror operations
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        /// Error message from the I/O operation
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message describing the configuration issue
        message: String,
    },

    /// Establishing the remote session failed
    #[error("Connection error: {message}")]
    Connection {
        /// Error message describing the connection failure
        message: String,
    },

    /// Listing or entering a remote directory failed
    #[error("Listing error at '{path}': {message}")]
    Listing {
        /// Remote path that could not be listed
        path: String,
        /// Error message from the transport
        message: String,
    },

    /// Transferring a single file failed
    #[error("Transfer error: {message}")]
    Transfer {
        /// Error message describing the transfer failure
        message: String,
    },

    /// Operation cancelled
    #[error("Operation cancelled")]
    Cancelled,

    /// Generic error with custom message
    #[error("{message}")]
    Other {
        /// Custom error message
        message: String,
    },
}

/// Error kind for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// I/O related errors
    Io,
    /// Configuration errors
    Config,
    /// Connection errors
    Connection,
    /// Remote listing errors
    Listing,
    /// File transfer errors
    Transfer,
    /// Cancellation
    Cancelled,
    /// Other errors
    Other,
}

impl Error {
    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io { .. } => ErrorKind::Io,
            Self::Config { .. } => ErrorKind::Config,
            Self::Connection { .. } => ErrorKind::Connection,
            Self::Listing { .. } => ErrorKind::Listing,
            Self::Transfer { .. } => ErrorKind::Transfer,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Other { .. } => ErrorKind::Other,
        }
    }

    /// Whether this error aborts the whole run instead of a single package or file
    pub fn halts_run(&self) -> bool {
        matches!(self, Self::Config { .. } | Self::Connection { .. })
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new connection error
    pub fn connection<S: Into<String>>(message: S) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a new listing error
    pub fn listing<P: Into<String>, S: Into<String>>(path: P, message: S) -> Self {
        Self::Listing {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new transfer error
    pub fn transfer<S: Into<String>>(message: S) -> Self {
        Self::Transfer {
            message: message.into(),
        }
    }

    /// Create a new generic error
    pub fn other<S: Into<String>>(message: S) -> Self {
        Self::Other {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_error_kind_consistency(message in ".*") {
            let errors = vec![
                Error::Io { message: message.clone() },
                Error::Config { message: message.clone() },
                Error::Connection { message: message.clone() },
                Error::Listing { path: "Products/P".to_string(), message: message.clone() },
                Error::Transfer { message: message.clone() },
                Error::Other { message: message.clone() },
            ];

            for error in errors {
                let kind = error.kind();
                match error {
                    Error::Io { .. } => prop_assert_eq!(kind, ErrorKind::Io),
                    Error::Config { .. } => prop_assert_eq!(kind, ErrorKind::Config),
                    Error::Connection { .. } => prop_assert_eq!(kind, ErrorKind::Connection),
                    Error::Listing { .. } => prop_assert_eq!(kind, ErrorKind::Listing),
                    Error::Transfer { .. } => prop_assert_eq!(kind, ErrorKind::Transfer),
                    Error::Other { .. } => prop_assert_eq!(kind, ErrorKind::Other),
                    Error::Cancelled => {}
                }
            }
        }

        #[test]
        fn test_only_fatal_errors_halt(message in ".*") {
            prop_assert!(Error::config(message.clone()).halts_run());
            prop_assert!(Error::connection(message.clone()).halts_run());
            prop_assert!(!Error::listing("a/b", message.clone()).halts_run());
            prop_assert!(!Error::transfer(message.clone()).halts_run());
            let io = Error::Io { message };
            prop_assert!(!io.halts_run());
        }
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "test file");
        let error = Error::from(io_error);

        assert_eq!(error.kind(), ErrorKind::Io);
        assert!(error.to_string().contains("test file"));
        assert!(!error.halts_run());
    }

    #[test]
    fn test_cancelled_does_not_halt() {
        assert!(!Error::Cancelled.halts_run());
        assert_eq!(Error::Cancelled.kind(), ErrorKind::Cancelled);
    }

    #[test]
    fn test_listing_error_display() {
        let error = Error::listing("Products/Pkg", "no such directory");
        assert_eq!(
            error.to_string(),
            "Listing error at 'Products/Pkg': no such directory"
        );
    }
}

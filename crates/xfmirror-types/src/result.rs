//! Result type alias for xfmirror operations

use crate::Error;

/// Result type alias for xfmirror operations
pub type Result<T> = std::result::Result<T, Error>;

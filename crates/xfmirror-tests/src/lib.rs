//! xfmirror integration testing suite
//!
//! Shared fixtures for the end-to-end tests under `tests/`.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Remote postbox fixtures
///
/// A single canonical postbox tree, materialized either in memory or on
/// disk, together with the files a sync is expected to select from it.
pub mod test_utils;

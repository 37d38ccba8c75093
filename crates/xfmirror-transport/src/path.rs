//! Remote path resolution relative to a session's working directory

use crate::{TransportError, TransportResult};
use std::fmt;
use std::path::{Path, PathBuf};

/// Normalized path below a transport root
///
/// `/`-prefixed inputs resolve from the root, everything else from the
/// current directory. `..` may not climb above the root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemotePath {
    segments: Vec<String>,
}

impl RemotePath {
    /// The transport root
    pub fn root() -> Self {
        Self::default()
    }

    /// Resolve `path` against this directory
    pub fn resolve(&self, path: &str) -> TransportResult<Self> {
        let mut segments = if path.starts_with('/') {
            Vec::new()
        } else {
            self.segments.clone()
        };

        for part in path.split('/') {
            match part {
                "" | "." => {}
                ".." => {
                    if segments.pop().is_none() {
                        return Err(TransportError::InvalidPath {
                            path: path.to_string(),
                        });
                    }
                }
                other => segments.push(other.to_string()),
            }
        }

        Ok(Self { segments })
    }

    /// Slash-joined form without a leading slash; empty for the root
    pub fn key(&self) -> String {
        self.segments.join("/")
    }

    /// Map onto a local directory tree rooted at `root`
    pub fn to_fs_path(&self, root: &Path) -> PathBuf {
        self.segments
            .iter()
            .fold(root.to_path_buf(), |acc, segment| acc.join(segment))
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.segments.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "Products", "Products")]
    #[case("Products", "Pkg", "Products/Pkg")]
    #[case("Products/Pkg", "..", "Products")]
    #[case("Products/Pkg", "/Xpressfeed", "Xpressfeed")]
    #[case("Products", "./Pkg/", "Products/Pkg")]
    #[case("Products", ".", "Products")]
    fn test_resolve(#[case] cwd: &str, #[case] input: &str, #[case] expected: &str) {
        let cwd = RemotePath::root().resolve(cwd).unwrap();
        assert_eq!(cwd.resolve(input).unwrap().key(), expected);
    }

    #[test]
    fn test_resolve_above_root_fails() {
        let err = RemotePath::root().resolve("..").unwrap_err();
        assert!(matches!(err, TransportError::InvalidPath { .. }));
    }

    #[test]
    fn test_display_and_fs_path() {
        let path = RemotePath::root().resolve("Products/Pkg").unwrap();
        assert_eq!(path.to_string(), "/Products/Pkg");
        assert_eq!(
            path.to_fs_path(Path::new("/mnt/postbox")),
            PathBuf::from("/mnt/postbox/Products/Pkg")
        );
        assert_eq!(RemotePath::root().key(), "");
        assert_eq!(RemotePath::root().to_string(), "/");
    }
}

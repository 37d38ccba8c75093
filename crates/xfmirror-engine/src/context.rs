//! Run-scoped cancellation and progress reporting

use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use xfmirror_types::{NullProgressSink, ProgressSink};

/// Shared state for one scan, sync or estimate run
///
/// Cloning is cheap; every clone shares the same token and sink.
#[derive(Clone)]
pub struct RunContext {
    token: CancellationToken,
    progress: Arc<dyn ProgressSink>,
}

impl RunContext {
    /// Create a context with a fresh cancellation token
    pub fn new(progress: Arc<dyn ProgressSink>) -> Self {
        Self::with_token(CancellationToken::new(), progress)
    }

    /// Create a context around an existing token
    pub fn with_token(token: CancellationToken, progress: Arc<dyn ProgressSink>) -> Self {
        Self { token, progress }
    }

    /// Context that reports no progress
    pub fn silent() -> Self {
        Self::new(Arc::new(NullProgressSink))
    }

    /// Cancellation token for the run
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Progress sink for the run
    pub fn progress(&self) -> &Arc<dyn ProgressSink> {
        &self.progress
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::silent()
    }
}

impl fmt::Debug for RunContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunContext")
            .field("cancelled", &self.is_cancelled())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_token() {
        let ctx = RunContext::silent();
        let clone = ctx.clone();
        assert!(!clone.is_cancelled());

        ctx.cancel();
        assert!(clone.is_cancelled());
        assert!(clone.token().is_cancelled());
    }

    #[test]
    fn test_external_token() {
        let token = CancellationToken::new();
        let ctx = RunContext::with_token(token.clone(), Arc::new(NullProgressSink));
        token.cancel();
        assert!(ctx.is_cancelled());
    }
}

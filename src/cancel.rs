use std::sync::{Arc, OnceLock};

/// One-way cancellation flag shared between a caller and the runs it starts,
/// carrying the reason given by whoever cancelled first.
///
/// Runs only look at the flag at fixed checkpoints: before each sequential
/// dispatch (both before and after the rate-limit wait) and before each batch.
/// Work that is already in flight is never interrupted.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    token: tokio_util::sync::CancellationToken,
    reason: Arc<OnceLock<Option<String>>>,
}

impl From<tokio_util::sync::CancellationToken> for CancellationToken {
    fn from(token: tokio_util::sync::CancellationToken) -> Self {
        Self {
            token,
            reason: Default::default(),
        }
    }
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.set(None);
    }

    pub fn cancel_with(&self, reason: impl Into<String>) {
        self.set(Some(reason.into()));
    }

    fn set(&self, reason: Option<String>) {
        // First cancellation wins, the reason is never replaced.
        if !self.token.is_cancelled() && self.reason.set(reason).is_ok() {
            self.token.cancel();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// `None` until cancelled, and when cancelled without a reason or through
    /// the wrapped token directly.
    pub fn reason(&self) -> Option<&str> {
        if !self.is_cancelled() {
            return None;
        }

        self.reason.get().and_then(|reason| reason.as_deref())
    }

    /// Resolves once the token has been cancelled.
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }
}

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use tokio::sync::Notify;

/// Why a pipeline was cancelled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CancelCause {
    /// The owner of the token asked for shutdown.
    Requested,
    /// The sink observed a transform failure.
    Failure { message: String },
}

impl fmt::Display for CancelCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Requested => f.write_str("cancellation requested"),
            Self::Failure { message } => write!(f, "cancelled after failure: {message}"),
        }
    }
}

#[derive(Default)]
struct Shared {
    cancelled: AtomicBool,
    cause: OnceLock<CancelCause>,
    notify: Notify,
}

/// One-shot, pipeline-wide stop signal.
///
/// Clones observe the same state. Only the first call to [`cancel`] or
/// [`cancel_with`] has an effect; later calls are no-ops.
///
/// [`cancel`]: CancelToken::cancel
/// [`cancel_with`]: CancelToken::cancel_with
#[derive(Clone, Default)]
pub struct CancelToken {
    shared: Arc<Shared>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) -> bool {
        self.cancel_with(CancelCause::Requested)
    }

    /// Trigger cancellation, recording `cause` if this call is the first.
    ///
    /// Returns `true` when this call flipped the token.
    pub fn cancel_with(&self, cause: CancelCause) -> bool {
        // cause is published before the flag so observers of the flag always see it
        let first = self.shared.cause.set(cause).is_ok();
        if first {
            self.shared.cancelled.store(true, Ordering::SeqCst);
            self.shared.notify.notify_waiters();
        }
        first
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.cancelled.load(Ordering::SeqCst)
    }

    pub fn cause(&self) -> Option<CancelCause> {
        if self.is_cancelled() {
            self.shared.cause.get().cloned()
        } else {
            None
        }
    }

    /// Resolves once the token is cancelled.
    pub async fn cancelled(&self) {
        let notified = self.shared.notify.notified();
        tokio::pin!(notified);
        // register before checking the flag, notify_waiters stores no permit
        notified.as_mut().enable();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

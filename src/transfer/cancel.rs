//! Cooperative cancellation for transfer sessions.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Cancellation signal observed by a session at its checkpoints.
///
/// A session is cancelled when the token is cancelled or the optional
/// deadline has passed. Clones share the same token, so the host can keep a
/// clone (e.g. for a ctrl-c handler) while the session holds another.
///
/// The signal is only checked between reads; a chunk read already in flight
/// completes first.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CancelSignal {
    /// Creates a signal that only fires when [`cancel`](Self::cancel) is called.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing token.
    #[must_use]
    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Adds a deadline measured from now. Replaces any earlier deadline.
    ///
    /// A duration too large to represent as an instant means no deadline.
    #[must_use]
    pub fn with_deadline(mut self, after: Duration) -> Self {
        self.deadline = Instant::now().checked_add(after);
        self
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns `true` once cancellation was requested or the deadline passed.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled() || self.deadline_passed()
    }

    /// Returns `true` only when the deadline (if any) has passed.
    #[must_use]
    pub fn deadline_passed(&self) -> bool {
        self.deadline.is_some_and(|at| Instant::now() >= at)
    }

    /// Returns the underlying token.
    #[must_use]
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

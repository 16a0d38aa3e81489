//! Cancellation and deadline propagation for object requests.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Reason a [`RequestContext`] stopped accepting work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    /// The context was cancelled explicitly.
    #[error("request cancelled")]
    Cancelled,
    /// The context deadline elapsed.
    #[error("request deadline exceeded")]
    DeadlineExceeded,
}

/// Cancellation token plus an optional deadline, handed to every
/// [`GetObject`](crate::GetObject) call.
///
/// Derived contexts ([`child`](Self::child), [`with_timeout`](Self::with_timeout),
/// [`with_deadline`](Self::with_deadline)) are cancelled together with their
/// parent, but cancelling a derived context leaves the parent untouched.
#[derive(Debug, Clone)]
pub struct RequestContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl RequestContext {
    /// Creates a root context that is never cancelled and has no deadline.
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: None,
        }
    }

    /// Creates a root context driven by an existing cancellation token.
    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Derives a context that inherits cancellation and deadline.
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Derives a context bounded by `deadline`.
    ///
    /// An earlier deadline inherited from `self` is kept.
    #[must_use]
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let mut child = self.child();
        child.deadline = Some(match self.deadline {
            Some(inherited) if inherited < deadline => inherited,
            _ => deadline,
        });
        child
    }

    /// Derives a context that expires `timeout` from now.
    ///
    /// A timeout too large to represent as an instant adds no deadline.
    #[must_use]
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self.child(),
        }
    }

    /// Cancels this context and every context derived from it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns `true` once [`cancel`](Self::cancel) was called here or on a parent.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Returns the deadline, if any.
    #[inline]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns the time left before the deadline, if any.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Returns the reason this context is done, without waiting.
    pub fn err(&self) -> Option<ContextError> {
        if self.token.is_cancelled() {
            return Some(ContextError::Cancelled);
        }

        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Resolves once the context is cancelled or its deadline elapses.
    pub async fn done(&self) -> ContextError {
        match self.deadline {
            Some(deadline) => tokio::select! {
                biased;
                _ = self.token.cancelled() => ContextError::Cancelled,
                _ = tokio::time::sleep_until(deadline) => ContextError::DeadlineExceeded,
            },
            None => {
                self.token.cancelled().await;
                ContextError::Cancelled
            }
        }
    }

    /// Drives `future` to completion unless the context finishes first.
    ///
    /// The future is dropped without being polled if the context is
    /// already done.
    pub async fn run<F: Future>(&self, future: F) -> Result<F::Output, ContextError> {
        if let Some(err) = self.err() {
            return Err(err);
        }

        tokio::select! {
            biased;
            err = self.done() => Err(err),
            output = future => Ok(output),
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fresh_context_is_not_done() {
        let ctx = RequestContext::new();
        assert!(!ctx.is_cancelled());
        assert_eq!(ctx.err(), None);
        assert_eq!(ctx.remaining(), None);
    }

    #[tokio::test]
    async fn cancel_propagates_to_children_only() {
        let parent = RequestContext::new();
        let child = parent.child();
        let grandchild = child.with_timeout(Duration::from_secs(60));

        child.cancel();
        assert!(child.is_cancelled());
        assert!(grandchild.is_cancelled());
        assert!(!parent.is_cancelled());

        let other = parent.child();
        parent.cancel();
        assert_eq!(other.err(), Some(ContextError::Cancelled));
    }

    #[tokio::test]
    async fn earlier_deadline_wins() {
        let parent = RequestContext::new().with_timeout(Duration::from_secs(1));
        let child = parent.with_timeout(Duration::from_secs(30));
        assert_eq!(child.deadline(), parent.deadline());

        let tighter = parent.with_timeout(Duration::from_millis(10));
        assert!(tighter.deadline() < parent.deadline());
    }

    #[tokio::test(start_paused = true)]
    async fn done_reports_deadline() {
        let ctx = RequestContext::new().with_timeout(Duration::from_millis(50));
        assert_eq!(ctx.done().await, ContextError::DeadlineExceeded);
        assert_eq!(ctx.err(), Some(ContextError::DeadlineExceeded));
        assert_eq!(ctx.remaining(), Some(Duration::ZERO));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_beats_deadline() {
        let ctx = RequestContext::new().with_timeout(Duration::from_secs(5));
        ctx.cancel();
        assert_eq!(ctx.done().await, ContextError::Cancelled);
    }

    #[tokio::test]
    async fn run_skips_future_when_already_done() {
        let ctx = RequestContext::new();
        ctx.cancel();

        let mut polled = false;
        let result = ctx
            .run(async {
                polled = true;
            })
            .await;
        assert_eq!(result, Err(ContextError::Cancelled));
        assert!(!polled);
    }

    #[tokio::test(start_paused = true)]
    async fn run_interrupts_pending_future() {
        let ctx = RequestContext::new().with_timeout(Duration::from_millis(20));
        let result = ctx.run(std::future::pending::<()>()).await;
        assert_eq!(result, Err(ContextError::DeadlineExceeded));
    }

    #[tokio::test]
    async fn run_returns_output() {
        let ctx = RequestContext::new();
        assert_eq!(ctx.run(async { 7 }).await, Ok(7));
    }

    #[tokio::test]
    async fn unrepresentable_timeout_adds_no_deadline() {
        let ctx = RequestContext::new().with_timeout(Duration::MAX);
        assert_eq!(ctx.deadline(), None);
        assert_eq!(ctx.err(), None);

        let bounded = RequestContext::new().with_timeout(Duration::from_secs(1));
        let child = bounded.with_timeout(Duration::from_secs(u64::MAX));
        assert_eq!(child.deadline(), bounded.deadline());

        bounded.cancel();
        assert!(child.is_cancelled());
    }

    #[tokio::test]
    async fn from_token_shares_cancellation() {
        let token = CancellationToken::new();
        let ctx = RequestContext::from_token(token.clone());
        token.cancel();
        assert!(ctx.is_cancelled());
    }
}

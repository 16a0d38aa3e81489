//! Fetch error types.

use crate::context::ContextError;

/// Result type for fetch operations over a client error `E`.
pub type FetchResult<T, E> = Result<T, FetchError<E>>;

/// Errors that can occur while fetching an object.
///
/// The client's own error is carried unchanged in [`Request`](Self::Request),
/// [`Read`](Self::Read) and [`Close`](Self::Close), so its message and
/// identity survive.
#[derive(Debug, thiserror::Error)]
#[must_use = "errors should be handled appropriately"]
pub enum FetchError<E> {
    /// The get-object call was rejected.
    #[error(transparent)]
    Request(E),

    /// Draining the object body failed.
    #[error(transparent)]
    Read(E),

    /// Releasing the object body failed after a successful read.
    #[error(transparent)]
    Close(E),

    /// The request context was cancelled.
    #[error("object fetch cancelled")]
    Cancelled,

    /// The request context deadline elapsed.
    #[error("object fetch deadline exceeded")]
    DeadlineExceeded,
}

impl<E> FetchError<E> {
    /// Returns the client error, if this error carries one.
    pub fn inner(&self) -> Option<&E> {
        match self {
            Self::Request(err) | Self::Read(err) | Self::Close(err) => Some(err),
            Self::Cancelled | Self::DeadlineExceeded => None,
        }
    }

    /// Consumes the error, returning the client error if there is one.
    pub fn into_inner(self) -> Option<E> {
        match self {
            Self::Request(err) | Self::Read(err) | Self::Close(err) => Some(err),
            Self::Cancelled | Self::DeadlineExceeded => None,
        }
    }

    /// Returns `true` if the fetch stopped because its context finished.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }

    /// Returns the stage that failed, for structured logs.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Request(_) => "request",
            Self::Read(_) => "read",
            Self::Close(_) => "close",
            Self::Cancelled => "cancelled",
            Self::DeadlineExceeded => "deadline",
        }
    }
}

impl<E> From<ContextError> for FetchError<E> {
    fn from(err: ContextError) -> Self {
        match err {
            ContextError::Cancelled => Self::Cancelled,
            ContextError::DeadlineExceeded => Self::DeadlineExceeded,
        }
    }
}

//! Scripted test doubles for [`GetObject`] and [`ObjectBody`].
//!
//! # Feature Flag
//!
//! This module is only available when the `test-utils` feature is enabled:
//!
//! ```toml
//! [dev-dependencies]
//! objfetch = { version = "...", features = ["test-utils"] }
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use objfetch::mock::MockClient;
//!
//! let client = MockClient::new().with_body("this is the body");
//! let data = objfetch::fetch_object(&ctx, &client, "bucket", "key").await?;
//! assert_eq!(client.close_count(), 1);
//! ```

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;

use crate::client::{GetObject, ObjectBody};
use crate::context::RequestContext;

/// Errors produced by [`MockClient`] and [`MockBody`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MockError {
    /// The request named an empty bucket.
    #[error("target bucket is missing")]
    MissingBucket,
    /// The request named an empty key.
    #[error("bucket key is missing")]
    MissingKey,
    /// Scripted failure while reading the body.
    #[error("{0}")]
    Read(String),
    /// Scripted failure while closing the body.
    #[error("{0}")]
    Close(String),
}

/// A bucket and key pair observed by [`MockClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockRequest {
    /// Requested bucket.
    pub bucket: String,
    /// Requested key.
    pub key: String,
}

/// A [`GetObject`] double that serves the same scripted body for every
/// request with a non-empty bucket and key.
#[derive(Debug, Clone, Default)]
pub struct MockClient {
    chunks: Vec<Bytes>,
    fail_read_after: Option<(usize, MockError)>,
    fail_close: Option<MockError>,
    stall_read_after: Option<usize>,
    stall_request: bool,
    closes: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<MockRequest>>>,
}

impl MockClient {
    /// Creates a client serving an empty body.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `body` as a single chunk.
    #[must_use]
    pub fn with_body(self, body: impl Into<Bytes>) -> Self {
        self.with_chunks([body.into()])
    }

    /// Serves the given chunks in order.
    #[must_use]
    pub fn with_chunks<I, B>(mut self, chunks: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        self.chunks = chunks.into_iter().map(Into::into).collect();
        self
    }

    /// Fails the read after `chunks` chunks were served.
    #[must_use]
    pub fn fail_read_after(mut self, chunks: usize, message: impl Into<String>) -> Self {
        self.fail_read_after = Some((chunks, MockError::Read(message.into())));
        self
    }

    /// Fails every close.
    #[must_use]
    pub fn fail_close(mut self, message: impl Into<String>) -> Self {
        self.fail_close = Some(MockError::Close(message.into()));
        self
    }

    /// Never yields another chunk after `chunks` chunks were served.
    #[must_use]
    pub fn stall_read_after(mut self, chunks: usize) -> Self {
        self.stall_read_after = Some(chunks);
        self
    }

    /// Never completes the get-object call.
    #[must_use]
    pub fn stall_request(mut self) -> Self {
        self.stall_request = true;
        self
    }

    /// Number of bodies closed so far, across all clones.
    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Requests that produced a body, in arrival order.
    pub fn requests(&self) -> Vec<MockRequest> {
        self.requests
            .lock()
            .expect("mock request log poisoned")
            .clone()
    }
}

#[async_trait::async_trait]
impl GetObject for MockClient {
    type Body = MockBody;
    type Error = MockError;

    async fn get_object(
        &self,
        _ctx: &RequestContext,
        bucket: &str,
        key: &str,
    ) -> Result<Self::Body, Self::Error> {
        if self.stall_request {
            std::future::pending::<()>().await;
        }
        if bucket.is_empty() {
            return Err(MockError::MissingBucket);
        }
        if key.is_empty() {
            return Err(MockError::MissingKey);
        }

        self.requests
            .lock()
            .expect("mock request log poisoned")
            .push(MockRequest {
                bucket: bucket.to_owned(),
                key: key.to_owned(),
            });

        Ok(MockBody {
            chunks: self.chunks.iter().cloned().collect(),
            served: 0,
            fail_read_after: self.fail_read_after.clone(),
            fail_close: self.fail_close.clone(),
            stall_read_after: self.stall_read_after,
            closes: Arc::clone(&self.closes),
        })
    }
}

/// Body handed out by [`MockClient`].
#[derive(Debug)]
pub struct MockBody {
    chunks: VecDeque<Bytes>,
    served: usize,
    fail_read_after: Option<(usize, MockError)>,
    fail_close: Option<MockError>,
    stall_read_after: Option<usize>,
    closes: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl ObjectBody for MockBody {
    type Error = MockError;

    async fn next_chunk(&mut self) -> Option<Result<Bytes, Self::Error>> {
        if let Some((after, err)) = &self.fail_read_after
            && self.served == *after
        {
            return Some(Err(err.clone()));
        }
        if self.stall_read_after == Some(self.served) {
            std::future::pending::<()>().await;
        }

        let chunk = self.chunks.pop_front()?;
        self.served += 1;
        Some(Ok(chunk))
    }

    async fn close(&mut self) -> Result<(), Self::Error> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        match &self.fail_close {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

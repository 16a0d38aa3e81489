//! Whole-object fetch over any [`GetObject`] client.

use std::sync::Arc;
use std::time::Instant;

use bytes::{Bytes, BytesMut};

use crate::TRACING_TARGET;
use crate::client::{GetObject, ObjectBody};
use crate::config::FetchConfig;
use crate::context::RequestContext;
use crate::error::{FetchError, FetchResult};

/// Retrieves `bucket`/`key` through `client` and reads the body into memory.
///
/// The body is closed exactly once after it was acquired, on success, on a
/// read failure and on cancellation alike. A read failure is reported in
/// preference to a close failure; a close failure after a clean read is
/// reported on its own.
///
/// # Errors
///
/// - [`FetchError::Request`] with the client's error if the call is rejected.
/// - [`FetchError::Read`] if draining the body fails.
/// - [`FetchError::Close`] if releasing the body fails after a clean read.
/// - [`FetchError::Cancelled`] / [`FetchError::DeadlineExceeded`] if `ctx`
///   finishes first.
#[tracing::instrument(
    name = "object.fetch",
    target = TRACING_TARGET,
    skip(ctx, client),
    fields(size = tracing::field::Empty)
)]
pub async fn fetch_object<C>(
    ctx: &RequestContext,
    client: &C,
    bucket: &str,
    key: &str,
) -> FetchResult<Bytes, C::Error>
where
    C: GetObject + ?Sized,
{
    let mut body = match ctx.run(client.get_object(ctx, bucket, key)).await {
        Ok(Ok(body)) => body,
        Ok(Err(err)) => return Err(FetchError::Request(err)),
        Err(err) => return Err(err.into()),
    };

    let drained = drain(ctx, &mut body).await;
    let closed = body.close().await;
    let data = settle(drained, closed)?;

    tracing::Span::current().record("size", data.len());
    Ok(data)
}

/// Reads `body` to the end, stopping early if `ctx` finishes.
async fn drain<B>(ctx: &RequestContext, body: &mut B) -> FetchResult<Bytes, B::Error>
where
    B: ObjectBody + ?Sized,
{
    let mut buffer = BytesMut::new();

    loop {
        let chunk = tokio::select! {
            biased;
            err = ctx.done() => return Err(err.into()),
            chunk = body.next_chunk() => chunk,
        };

        match chunk {
            Some(Ok(bytes)) => buffer.extend_from_slice(&bytes),
            Some(Err(err)) => return Err(FetchError::Read(err)),
            None => return Ok(buffer.freeze()),
        }
    }
}

/// Combines the drain and close outcomes; the drain error wins.
fn settle<E>(drained: FetchResult<Bytes, E>, closed: Result<(), E>) -> FetchResult<Bytes, E>
where
    E: std::error::Error,
{
    match (drained, closed) {
        (Ok(data), Ok(())) => Ok(data),
        (Ok(_), Err(err)) => Err(FetchError::Close(err)),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(suppressed)) => {
            tracing::debug!(
                target: TRACING_TARGET,
                error = %suppressed,
                "Close error suppressed by earlier failure"
            );
            Err(err)
        }
    }
}

/// Cloneable handle pairing a [`GetObject`] client with [`FetchConfig`] defaults.
#[derive(Debug)]
pub struct ObjectFetcher<C> {
    client: Arc<C>,
    config: FetchConfig,
}

impl<C> Clone for ObjectFetcher<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            config: self.config.clone(),
        }
    }
}

impl<C> ObjectFetcher<C>
where
    C: GetObject,
{
    /// Creates a fetcher with default configuration.
    pub fn new(client: C) -> Self {
        Self::from_arc(Arc::new(client))
    }

    /// Creates a fetcher around a shared client.
    pub fn from_arc(client: Arc<C>) -> Self {
        Self {
            client,
            config: FetchConfig::default(),
        }
    }

    /// Replaces the fetch configuration.
    #[must_use]
    pub fn with_config(mut self, config: FetchConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the underlying client.
    #[inline]
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Returns the fetch configuration.
    #[inline]
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetches `bucket`/`key`, bounded by the configured timeout.
    ///
    /// See [`fetch_object`] for the error contract.
    pub async fn fetch(
        &self,
        ctx: &RequestContext,
        bucket: &str,
        key: &str,
    ) -> FetchResult<Bytes, C::Error> {
        let ctx = match self.config.timeout() {
            Some(timeout) => ctx.with_timeout(timeout),
            None => ctx.child(),
        };

        tracing::debug!(
            target: TRACING_TARGET,
            bucket = %bucket,
            key = %key,
            timeout = ?self.config.timeout(),
            "Fetching object"
        );

        let start = Instant::now();
        let result = fetch_object(&ctx, self.client.as_ref(), bucket, key).await;
        let elapsed = start.elapsed();

        match &result {
            Ok(data) => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    bucket = %bucket,
                    key = %key,
                    size = data.len(),
                    elapsed = ?elapsed,
                    "Object fetched"
                );
            }
            Err(err) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    bucket = %bucket,
                    key = %key,
                    stage = err.stage(),
                    error = %err,
                    elapsed = ?elapsed,
                    "Object fetch failed"
                );
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::mock::{MockClient, MockError, MockRequest};

    #[tokio::test]
    async fn fetch_cases() {
        struct Case {
            name: &'static str,
            bucket: &'static str,
            key: &'static str,
            expected: Result<&'static [u8], &'static str>,
        }

        let cases = [
            Case {
                name: "happy path",
                bucket: "foo",
                key: "bar",
                expected: Ok(b"this is the body foo bar baz"),
            },
            Case {
                name: "bucket is missing",
                bucket: "",
                key: "bar",
                expected: Err("target bucket is missing"),
            },
            Case {
                name: "key is missing",
                bucket: "foo",
                key: "",
                expected: Err("bucket key is missing"),
            },
        ];

        let ctx = RequestContext::new();
        let client = MockClient::new().with_body("this is the body foo bar baz");

        for case in cases {
            let result = fetch_object(&ctx, &client, case.bucket, case.key).await;
            match (result, case.expected) {
                (Ok(data), Ok(expected)) => assert_eq!(data.as_ref(), expected, "{}", case.name),
                (Err(err), Err(expected)) => {
                    assert!(matches!(err, FetchError::Request(_)), "{}", case.name);
                    assert_eq!(err.to_string(), expected, "{}", case.name);
                }
                (result, _) => panic!("{}: unexpected result {result:?}", case.name),
            }
        }

        // Rejected calls never hand out a body.
        assert_eq!(client.close_count(), 1);
    }

    #[tokio::test]
    async fn passes_bucket_and_key_through() {
        let ctx = RequestContext::new();
        let client = MockClient::new().with_body("this is the body");

        let data = fetch_object(&ctx, &client, "bucket", "key").await.unwrap();
        assert_eq!(data, Bytes::from_static(b"this is the body"));
        assert_eq!(
            client.requests(),
            vec![MockRequest {
                bucket: "bucket".into(),
                key: "key".into(),
            }]
        );
        assert_eq!(client.close_count(), 1);
    }

    #[tokio::test]
    async fn request_error_is_verbatim() {
        let ctx = RequestContext::new();
        let client = MockClient::new();

        let err = fetch_object(&ctx, &client, "", "key").await.unwrap_err();
        assert_eq!(err.into_inner(), Some(MockError::MissingBucket));
    }

    #[tokio::test]
    async fn concatenates_chunks_in_order() {
        let ctx = RequestContext::new();
        let client = MockClient::new().with_chunks(["this ", "is ", "", "the body"]);

        let data = fetch_object(&ctx, &client, "b", "k").await.unwrap();
        assert_eq!(data.as_ref(), b"this is the body");
    }

    #[tokio::test]
    async fn empty_body() {
        let ctx = RequestContext::new();
        let client = MockClient::new();

        let data = fetch_object(&ctx, &client, "b", "k").await.unwrap();
        assert!(data.is_empty());
        assert_eq!(client.close_count(), 1);
    }

    #[tokio::test]
    async fn read_error_wins_over_close_error() {
        let ctx = RequestContext::new();
        let client = MockClient::new()
            .with_chunks(["partial", "rest"])
            .fail_read_after(1, "connection reset")
            .fail_close("close failed");

        let err = fetch_object(&ctx, &client, "b", "k").await.unwrap_err();
        assert!(matches!(err, FetchError::Read(_)));
        assert_eq!(err.to_string(), "connection reset");
        assert_eq!(client.close_count(), 1);
    }

    #[tokio::test]
    async fn read_error_without_close_error() {
        let ctx = RequestContext::new();
        let client = MockClient::new()
            .with_body("body")
            .fail_read_after(0, "truncated");

        let err = fetch_object(&ctx, &client, "b", "k").await.unwrap_err();
        assert_eq!(err.into_inner(), Some(MockError::Read("truncated".into())));
        assert_eq!(client.close_count(), 1);
    }

    #[tokio::test]
    async fn close_error_after_clean_read() {
        let ctx = RequestContext::new();
        let client = MockClient::new()
            .with_body("complete")
            .fail_close("close failed");

        let err = fetch_object(&ctx, &client, "b", "k").await.unwrap_err();
        assert!(matches!(err, FetchError::Close(_)));
        assert_eq!(err.to_string(), "close failed");
        assert_eq!(client.close_count(), 1);
    }

    #[tokio::test]
    async fn cancelled_before_call() {
        let ctx = RequestContext::new();
        ctx.cancel();
        let client = MockClient::new().with_body("unused");

        let err = fetch_object(&ctx, &client, "b", "k").await.unwrap_err();
        assert!(matches!(err, FetchError::Cancelled));
        assert!(client.requests().is_empty());
        assert_eq!(client.close_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_interrupts_stalled_call() {
        let ctx = RequestContext::new().with_timeout(Duration::from_millis(100));
        let client = MockClient::new().stall_request();

        let err = fetch_object(&ctx, &client, "b", "k").await.unwrap_err();
        assert!(matches!(err, FetchError::DeadlineExceeded));
        assert_eq!(client.close_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_during_read_still_closes() {
        let ctx = RequestContext::new();
        let client = MockClient::new()
            .with_chunks(["first", "second"])
            .stall_read_after(1)
            .fail_close("close failed");

        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            canceller.cancel();
        });

        let err = fetch_object(&ctx, &client, "b", "k").await.unwrap_err();
        assert!(matches!(err, FetchError::Cancelled));
        assert_eq!(client.close_count(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_fetches_are_independent() {
        let fetcher = ObjectFetcher::new(MockClient::new().with_chunks(["a", "b", "c"]));
        let ctx = RequestContext::new();

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let fetcher = fetcher.clone();
                let ctx = ctx.clone();
                tokio::spawn(async move { fetcher.fetch(&ctx, "bucket", &format!("k{i}")).await })
            })
            .collect();

        for handle in handles {
            let data = handle.await.unwrap().unwrap();
            assert_eq!(data.as_ref(), b"abc");
        }
        assert_eq!(fetcher.client().close_count(), 16);
        assert_eq!(fetcher.client().requests().len(), 16);
    }

    #[tokio::test(start_paused = true)]
    async fn fetcher_applies_configured_timeout() {
        let config = FetchConfig::default().with_timeout_secs(5);
        let fetcher = ObjectFetcher::new(MockClient::new().stall_request()).with_config(config);

        let ctx = RequestContext::new();
        let err = fetcher.fetch(&ctx, "b", "k").await.unwrap_err();
        assert!(matches!(err, FetchError::DeadlineExceeded));
        assert!(!ctx.is_cancelled());
    }

    #[tokio::test]
    async fn fetcher_over_shared_client() {
        let client = Arc::new(MockClient::new().with_body("shared"));
        let fetcher = ObjectFetcher::from_arc(Arc::clone(&client));

        let data = fetcher
            .fetch(&RequestContext::new(), "b", "k")
            .await
            .unwrap();
        assert_eq!(data.as_ref(), b"shared");
        assert_eq!(client.close_count(), 1);
        assert_eq!(fetcher.config(), &FetchConfig::default());
    }

    #[tokio::test]
    async fn fetcher_over_borrowed_client() {
        let client = MockClient::new().with_body("borrowed");
        let fetcher = ObjectFetcher::new(&client);

        let data = fetcher
            .fetch(&RequestContext::new(), "bucket", "key")
            .await
            .unwrap();
        assert_eq!(data.as_ref(), b"borrowed");
        assert_eq!(client.close_count(), 1);
        assert_eq!(client.requests().len(), 1);
    }

    #[tokio::test]
    async fn oversized_timeout_fetches_without_deadline() {
        let config = FetchConfig::default().with_timeout_secs(u64::MAX);
        let fetcher = ObjectFetcher::new(MockClient::new().with_body("x")).with_config(config);

        let data = fetcher
            .fetch(&RequestContext::new(), "b", "k")
            .await
            .unwrap();
        assert_eq!(data.as_ref(), b"x");
        assert_eq!(fetcher.client().close_count(), 1);
    }

    #[test]
    fn oversized_timeout_deserializes() {
        let config: FetchConfig =
            serde_json::from_str(r#"{"fetch_timeout_secs":18446744073709551615}"#).unwrap();
        assert_eq!(config.fetch_timeout_secs, Some(u64::MAX));
    }
}

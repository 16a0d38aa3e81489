//! The get-object capability and the body stream it returns.
//!
//! [`GetObject`] is deliberately one method wide: anything that can turn a
//! bucket and a key into an [`ObjectBody`] can back a fetch, whether it talks
//! to S3, an in-memory store, or a test double.

use std::sync::Arc;

use bytes::Bytes;

use crate::context::RequestContext;

/// A sequential, closable source of bytes holding an object's body.
#[async_trait::async_trait]
pub trait ObjectBody: Send {
    /// Error produced while reading or releasing the body.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns the next chunk, or `None` once the body is exhausted.
    async fn next_chunk(&mut self) -> Option<Result<Bytes, Self::Error>>;

    /// Releases the underlying resource.
    ///
    /// Called exactly once by the fetcher, whether or not the body was read
    /// to completion.
    async fn close(&mut self) -> Result<(), Self::Error>;
}

/// Capability to retrieve an object by bucket and key.
#[async_trait::async_trait]
pub trait GetObject: Send + Sync {
    /// Error returned by the remote call and by the body it produces.
    type Error: std::error::Error + Send + Sync + 'static;
    /// Body stream returned on success.
    type Body: ObjectBody<Error = Self::Error>;

    /// Issues the get-object call.
    ///
    /// Implementations own validation of `bucket` and `key`; the caller does
    /// not check them.
    async fn get_object(
        &self,
        ctx: &RequestContext,
        bucket: &str,
        key: &str,
    ) -> Result<Self::Body, Self::Error>;
}

#[async_trait::async_trait]
impl<T> GetObject for &T
where
    T: GetObject + ?Sized,
{
    type Body = T::Body;
    type Error = T::Error;

    async fn get_object(
        &self,
        ctx: &RequestContext,
        bucket: &str,
        key: &str,
    ) -> Result<Self::Body, Self::Error> {
        (**self).get_object(ctx, bucket, key).await
    }
}

#[async_trait::async_trait]
impl<T> GetObject for Arc<T>
where
    T: GetObject + ?Sized,
{
    type Body = T::Body;
    type Error = T::Error;

    async fn get_object(
        &self,
        ctx: &RequestContext,
        bucket: &str,
        key: &str,
    ) -> Result<Self::Body, Self::Error> {
        (**self).get_object(ctx, bucket, key).await
    }
}

#[async_trait::async_trait]
impl<B> ObjectBody for Box<B>
where
    B: ObjectBody + ?Sized,
{
    type Error = B::Error;

    async fn next_chunk(&mut self) -> Option<Result<Bytes, Self::Error>> {
        (**self).next_chunk().await
    }

    async fn close(&mut self) -> Result<(), Self::Error> {
        (**self).close().await
    }
}

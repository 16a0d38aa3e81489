//! Body stream over an [`object_store::GetResult`].

use bytes::Bytes;
use futures::StreamExt;
use futures::stream::BoxStream;
use object_store::{Attribute, GetResult, ObjectMeta};

use crate::client::ObjectBody;

/// [`ObjectBody`] that yields the chunks of an [`object_store`] get response.
///
/// Closing drops the underlying response stream; later reads return `None`.
pub struct ObjectStoreBody {
    stream: Option<BoxStream<'static, object_store::Result<Bytes>>>,
    meta: ObjectMeta,
    content_type: Option<String>,
}

impl ObjectStoreBody {
    /// Wraps a get response.
    pub fn new(result: GetResult) -> Self {
        let meta = result.meta.clone();
        let content_type = result
            .attributes
            .get(&Attribute::ContentType)
            .map(|v| v.to_string());

        Self {
            stream: Some(result.into_stream()),
            meta,
            content_type,
        }
    }

    /// Object metadata (size, etag, last_modified, location).
    #[inline]
    pub fn meta(&self) -> &ObjectMeta {
        &self.meta
    }

    /// MIME content-type, if the backend provides one.
    #[inline]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Whether [`close`](ObjectBody::close) already released the stream.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.stream.is_none()
    }
}

#[async_trait::async_trait]
impl ObjectBody for ObjectStoreBody {
    type Error = object_store::Error;

    async fn next_chunk(&mut self) -> Option<Result<Bytes, Self::Error>> {
        self.stream.as_mut()?.next().await
    }

    async fn close(&mut self) -> Result<(), Self::Error> {
        self.stream.take();
        Ok(())
    }
}

impl std::fmt::Debug for ObjectStoreBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStoreBody")
            .field("location", &self.meta.location)
            .field("size", &self.meta.size)
            .field("content_type", &self.content_type)
            .field("closed", &self.is_closed())
            .finish()
    }
}

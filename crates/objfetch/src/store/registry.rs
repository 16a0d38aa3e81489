//! Named buckets backed by arbitrary [`ObjectStore`] instances.

use std::collections::HashMap;
use std::sync::Arc;

use object_store::ObjectStore;
use object_store::path::Path;

use super::ObjectStoreBody;
use crate::TRACING_TARGET_STORE;
use crate::client::GetObject;
use crate::context::RequestContext;

/// Cloneable map from bucket name to [`ObjectStore`].
///
/// Requests for a bucket that was never registered fail with
/// [`object_store::Error::NotFound`].
#[derive(Clone, Debug, Default)]
pub struct StoreRegistry {
    buckets: HashMap<String, Arc<dyn ObjectStore>>,
}

impl StoreRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `store` under `bucket`, replacing any previous entry.
    #[must_use]
    pub fn with_bucket(mut self, bucket: impl Into<String>, store: impl ObjectStore) -> Self {
        self.insert(bucket, Arc::new(store));
        self
    }

    /// Registers a shared `store` under `bucket`, returning the one it replaced.
    pub fn insert(
        &mut self,
        bucket: impl Into<String>,
        store: Arc<dyn ObjectStore>,
    ) -> Option<Arc<dyn ObjectStore>> {
        self.buckets.insert(bucket.into(), store)
    }

    /// Returns the store registered under `bucket`.
    pub fn bucket(&self, bucket: &str) -> Option<&Arc<dyn ObjectStore>> {
        self.buckets.get(bucket)
    }

    /// Iterates over the registered bucket names.
    pub fn bucket_names(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys().map(String::as_str)
    }
}

#[async_trait::async_trait]
impl GetObject for StoreRegistry {
    type Body = ObjectStoreBody;
    type Error = object_store::Error;

    #[tracing::instrument(name = "object.get", target = TRACING_TARGET_STORE, skip(self, _ctx))]
    async fn get_object(
        &self,
        _ctx: &RequestContext,
        bucket: &str,
        key: &str,
    ) -> Result<Self::Body, Self::Error> {
        let store = self
            .buckets
            .get(bucket)
            .ok_or_else(|| object_store::Error::NotFound {
                path: bucket.to_owned(),
                source: format!("bucket '{bucket}' is not registered").into(),
            })?;

        let result = store.get(&Path::from(key)).await?;
        Ok(ObjectStoreBody::new(result))
    }
}

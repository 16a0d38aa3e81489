//! S3-compatible client using [`object_store::aws::AmazonS3Builder`].
//!
//! Works with AWS S3, MinIO, and any S3-compatible service.

#[cfg(feature = "config")]
use clap::Args;
use object_store::ObjectStore;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use serde::{Deserialize, Serialize};

use super::ObjectStoreBody;
use crate::TRACING_TARGET_STORE;
use crate::client::GetObject;
use crate::context::RequestContext;

const DEFAULT_REGION: &str = "us-east-1";
const STORE_NAME: &str = "S3";

/// Connection settings for an S3-compatible service.
///
/// The bucket is not part of the configuration; each request names its own.
#[derive(Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[serde(rename_all = "camelCase")]
pub struct S3Config {
    /// AWS region
    #[cfg_attr(
        feature = "config",
        arg(long = "s3-region", env = "S3_REGION", default_value = DEFAULT_REGION)
    )]
    #[serde(default = "default_region")]
    pub region: String,

    /// Endpoint URL, required for non-AWS services (e.g. `http://localhost:9000`)
    #[cfg_attr(feature = "config", arg(long = "s3-endpoint", env = "S3_ENDPOINT"))]
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Access key ID for static credentials
    #[cfg_attr(
        feature = "config",
        arg(long = "s3-access-key-id", env = "S3_ACCESS_KEY_ID")
    )]
    #[serde(default)]
    pub access_key_id: Option<String>,

    /// Secret access key for static credentials
    #[cfg_attr(
        feature = "config",
        arg(long = "s3-secret-access-key", env = "S3_SECRET_ACCESS_KEY")
    )]
    #[serde(default)]
    pub secret_access_key: Option<String>,

    /// Session token for temporary credentials
    #[cfg_attr(
        feature = "config",
        arg(long = "s3-session-token", env = "S3_SESSION_TOKEN")
    )]
    #[serde(default)]
    pub session_token: Option<String>,

    /// Allow plain HTTP endpoints
    #[cfg_attr(feature = "config", arg(long = "s3-allow-http", env = "S3_ALLOW_HTTP"))]
    #[serde(default)]
    pub allow_http: bool,
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

impl S3Config {
    /// Creates a configuration for `region` with no endpoint or static credentials.
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            endpoint: None,
            access_key_id: None,
            secret_access_key: None,
            session_token: None,
            allow_http: false,
        }
    }

    /// Set the endpoint URL.
    ///
    /// `http://` endpoints enable plain HTTP.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        self.allow_http |= endpoint.starts_with("http://");
        self.endpoint = Some(endpoint);
        self
    }

    /// Set static credentials.
    #[must_use]
    pub fn with_credentials(
        mut self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        self.access_key_id = Some(access_key_id.into());
        self.secret_access_key = Some(secret_access_key.into());
        self
    }

    /// Set the session token for temporary credentials.
    #[must_use]
    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    /// Builds a store bound to `bucket`.
    ///
    /// No network I/O happens here. An empty bucket name is rejected.
    pub fn build_store(&self, bucket: &str) -> object_store::Result<AmazonS3> {
        if bucket.is_empty() {
            return Err(missing_parameter("target bucket is missing"));
        }

        let mut builder = AmazonS3Builder::new()
            .with_bucket_name(bucket)
            .with_region(&self.region);

        if let Some(endpoint) = &self.endpoint {
            builder = builder.with_endpoint(endpoint);
        }

        if self.allow_http {
            builder = builder.with_allow_http(true);
        }

        if let Some(access_key) = &self.access_key_id {
            builder = builder.with_access_key_id(access_key);
        }

        if let Some(secret_key) = &self.secret_access_key {
            builder = builder.with_secret_access_key(secret_key);
        }

        if let Some(token) = &self.session_token {
            builder = builder.with_token(token);
        }

        builder.build()
    }
}

fn missing_parameter(message: &'static str) -> object_store::Error {
    object_store::Error::Generic {
        store: STORE_NAME,
        source: message.into(),
    }
}

impl Default for S3Config {
    fn default() -> Self {
        Self::new(DEFAULT_REGION)
    }
}

impl std::fmt::Debug for S3Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Config")
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "****"),
            )
            .field("session_token", &self.session_token.as_ref().map(|_| "****"))
            .field("allow_http", &self.allow_http)
            .finish()
    }
}

/// S3-backed [`GetObject`] client.
///
/// A store is built for the requested bucket on every call and dropped
/// with the response. Empty bucket names and keys are rejected before any
/// request is sent.
#[derive(Clone, Debug, Default)]
pub struct S3Client {
    config: S3Config,
}

impl S3Client {
    /// Creates a client from `config`.
    pub fn new(config: S3Config) -> Self {
        Self { config }
    }

    /// Returns the client configuration.
    #[inline]
    pub fn config(&self) -> &S3Config {
        &self.config
    }
}

#[async_trait::async_trait]
impl GetObject for S3Client {
    type Body = ObjectStoreBody;
    type Error = object_store::Error;

    #[tracing::instrument(name = "object.get", target = TRACING_TARGET_STORE, skip(self, _ctx))]
    async fn get_object(
        &self,
        _ctx: &RequestContext,
        bucket: &str,
        key: &str,
    ) -> Result<Self::Body, Self::Error> {
        let store = self.config.build_store(bucket)?;
        if key.is_empty() {
            return Err(missing_parameter("bucket key is missing"));
        }

        let result = store.get(&Path::from(key)).await?;
        Ok(ObjectStoreBody::new(result))
    }
}

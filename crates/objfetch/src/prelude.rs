//! Convenience re-exports.

pub use crate::client::{GetObject, ObjectBody};
pub use crate::config::FetchConfig;
pub use crate::context::{ContextError, RequestContext};
pub use crate::error::{FetchError, FetchResult};
pub use crate::fetcher::{ObjectFetcher, fetch_object};
pub use crate::store::{ObjectStoreBody, S3Client, S3Config, StoreRegistry};

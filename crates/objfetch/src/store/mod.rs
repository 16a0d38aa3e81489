//! [`GetObject`](crate::GetObject) implementations backed by [`object_store`].
//!
//! [`S3Client`] resolves a fresh S3 store for whichever bucket a request
//! names, while [`StoreRegistry`] serves a fixed set of named buckets from
//! any [`ObjectStore`](object_store::ObjectStore) (in-memory, local disk, ...).
//! Both hand back an [`ObjectStoreBody`] and surface
//! [`object_store::Error`] unchanged.

mod body;
mod registry;
mod s3;

pub use body::ObjectStoreBody;
pub use registry::StoreRegistry;
pub use s3::{S3Client, S3Config};

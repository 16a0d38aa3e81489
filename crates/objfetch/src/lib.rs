#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Capability traits implemented by object-store clients.
pub mod client;
mod config;
mod context;
mod error;
mod fetcher;
/// Adapters over [`object_store`] backends.
pub mod store;

#[cfg(any(test, feature = "test-utils"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
pub mod mock;

#[doc(hidden)]
pub mod prelude;

pub use client::{GetObject, ObjectBody};
pub use config::FetchConfig;
pub use context::{ContextError, RequestContext};
pub use error::{FetchError, FetchResult};
pub use fetcher::{ObjectFetcher, fetch_object};

/// Tracing target for fetch operations.
pub const TRACING_TARGET: &str = "objfetch";

/// Tracing target for object-store adapter calls.
pub const TRACING_TARGET_STORE: &str = "objfetch::store";

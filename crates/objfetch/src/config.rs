//! Fetcher configuration.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

/// Defaults applied by [`ObjectFetcher`](crate::ObjectFetcher) to every fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct FetchConfig {
    /// Per-fetch timeout in seconds (optional, unbounded when unset)
    #[cfg_attr(
        feature = "config",
        arg(long = "fetch-timeout-secs", env = "FETCH_TIMEOUT_SECS")
    )]
    #[serde(default)]
    pub fetch_timeout_secs: Option<u64>,
}

impl FetchConfig {
    /// Returns the per-fetch timeout as a Duration, if set.
    #[inline]
    pub fn timeout(&self) -> Option<Duration> {
        self.fetch_timeout_secs.map(Duration::from_secs)
    }

    /// Set the per-fetch timeout in seconds.
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.fetch_timeout_secs = Some(secs);
        self
    }
}

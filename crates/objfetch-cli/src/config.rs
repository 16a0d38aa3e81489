//! CLI configuration management.
//!
//! ```text
//! Cli
//! ├── request: RequestArgs  # Bucket, key, output path
//! ├── fetch: FetchConfig    # Per-fetch timeout
//! └── s3: S3Config          # Region, endpoint, credentials
//! ```
//!
//! All configuration can be provided via CLI arguments or environment variables.
//! Use `--help` to see all available options.

use std::path::PathBuf;
use std::process;

use clap::{Args, Parser};
use objfetch::{FetchConfig, store::S3Config};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::{TRACING_TARGET_CONFIG, TRACING_TARGET_STARTUP};

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[command(name = "objfetch")]
#[command(about = "Fetch an object from an S3-compatible bucket")]
#[command(version)]
pub struct Cli {
    /// Object to fetch and where to put it.
    #[clap(flatten)]
    pub request: RequestArgs,

    /// Fetch behavior (timeouts).
    #[clap(flatten)]
    pub fetch: FetchConfig,

    /// S3 connection settings.
    #[clap(flatten)]
    pub s3: S3Config,
}

/// Identifies the object and the output destination.
#[derive(Debug, Clone, Args, Serialize, Deserialize)]
pub struct RequestArgs {
    /// Bucket holding the object
    #[arg(short = 'b', long, env = "OBJFETCH_BUCKET")]
    pub bucket: String,

    /// Object key within the bucket
    #[arg(short = 'k', long, env = "OBJFETCH_KEY")]
    pub key: String,

    /// Write the object to this file instead of stdout
    #[arg(short = 'o', long, env = "OBJFETCH_OUTPUT")]
    #[serde(default)]
    pub output: Option<PathBuf>,
}

impl Cli {
    /// Loads environment variables from .env file (if enabled) and parses CLI arguments.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    /// Loads environment variables from .env file if the dotenv feature is enabled.
    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    /// No-op when dotenv feature is disabled.
    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Initializes tracing with environment-based filtering.
    ///
    /// Logs go to stderr so that stdout carries only object bytes.
    pub fn init_tracing() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    /// Logs configuration at debug level (no sensitive information).
    pub fn log(&self) {
        tracing::debug!(
            target: TRACING_TARGET_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            features = ?Self::enabled_features(),
            "Build information"
        );

        tracing::debug!(
            target: TRACING_TARGET_CONFIG,
            bucket = %self.request.bucket,
            key = %self.request.key,
            output = ?self.request.output,
            timeout = ?self.fetch.timeout(),
            region = %self.s3.region,
            endpoint = ?self.s3.endpoint,
            static_credentials = self.s3.access_key_id.is_some(),
            "Fetch configuration"
        );
    }

    /// Returns a list of enabled compile-time features.
    fn enabled_features() -> Vec<&'static str> {
        [cfg!(feature = "dotenv").then_some("dotenv")]
            .into_iter()
            .flatten()
            .collect()
    }
}

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod output;
mod signal;

use std::process;

use anyhow::Context;
use objfetch::store::S3Client;
use objfetch::{ObjectFetcher, RequestContext};

use crate::config::Cli;

// Tracing target constants
pub const TRACING_TARGET_STARTUP: &str = "objfetch_cli::startup";
pub const TRACING_TARGET_SHUTDOWN: &str = "objfetch_cli::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "objfetch_cli::config";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_SHUTDOWN,
            error = %format_args!("{error:#}"),
            "objfetch terminated with error"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Main application entry point.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();

    Cli::init_tracing();
    cli.log();

    let ctx = RequestContext::new();
    signal::cancel_on_signal(ctx.clone());

    let fetcher = ObjectFetcher::new(S3Client::new(cli.s3.clone())).with_config(cli.fetch.clone());
    let bucket = &cli.request.bucket;
    let key = &cli.request.key;

    let data = fetcher
        .fetch(&ctx, bucket, key)
        .await
        .with_context(|| format!("failed to fetch s3://{bucket}/{key}"))?;

    output::write_object(&data, cli.request.output.as_deref())
        .await
        .context("failed to write object")?;

    tracing::info!(
        target: TRACING_TARGET_SHUTDOWN,
        bucket = %bucket,
        key = %key,
        size = data.len(),
        "Object written"
    );

    Ok(())
}

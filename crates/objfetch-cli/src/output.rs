//! Writes fetched bytes to their destination.

use std::path::Path;

use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Writes `data` to `path`, or to stdout when no path is given.
pub async fn write_object(data: &[u8], path: Option<&Path>) -> std::io::Result<()> {
    match path {
        Some(path) => tokio::fs::write(path, data).await,
        None => write_all(&mut tokio::io::stdout(), data).await,
    }
}

async fn write_all<W>(writer: &mut W, data: &[u8]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(data).await?;
    writer.flush().await
}

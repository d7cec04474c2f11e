//! Byte stream of a completed restore job.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::{Stream, StreamExt, TryStreamExt};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio_util::io::StreamReader;

use crate::error::{ArchiveError, Result};
use crate::http::ByteStream;
use crate::progress::{ProgressCallback, TransferProgress};

/// Result of a restore, delivered as chunks.
///
/// A single file restores as its raw bytes; directories and multi-path
/// restores arrive as one zip archive.
pub struct RestoreStream {
    inner: ByteStream,
    expected_size: u64,
}

impl RestoreStream {
    pub fn new(inner: ByteStream, expected_size: u64) -> Self {
        Self {
            inner,
            expected_size,
        }
    }

    /// Sum of the selection sizes the job was submitted with.
    pub fn expected_size(&self) -> u64 {
        self.expected_size
    }

    /// Read the whole result into memory.
    pub async fn collect_bytes(self) -> Result<Vec<u8>> {
        let chunks: Vec<Bytes> = self.inner.try_collect().await?;
        Ok(chunks.concat())
    }

    /// Copy the result into `writer`, returning the number of bytes written.
    pub async fn write_to<W: AsyncWrite + Unpin + ?Sized>(self, writer: &mut W) -> Result<u64> {
        self.write_to_with_progress(writer, "", Box::new(|_| true))
            .await
    }

    /// Copy the result into `writer`, reporting progress after each chunk.
    pub async fn write_to_with_progress<W: AsyncWrite + Unpin + ?Sized>(
        mut self,
        writer: &mut W,
        name: &str,
        mut callback: ProgressCallback,
    ) -> Result<u64> {
        let mut written = 0u64;
        while let Some(chunk) = self.inner.next().await {
            let chunk = chunk?;
            writer.write_all(&chunk).await?;
            written += chunk.len() as u64;

            let progress = TransferProgress::new(written, self.expected_size, name);
            if !callback(&progress) {
                return Err(ArchiveError::Custom(
                    "Restore download cancelled by user".to_string(),
                ));
            }
        }
        writer.flush().await?;
        Ok(written)
    }

    /// Adapt the stream into an `AsyncRead`.
    pub fn into_async_read(self) -> impl AsyncRead + Send + Unpin {
        StreamReader::new(self.inner.map_err(std::io::Error::other))
    }
}

impl Stream for RestoreStream {
    type Item = Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}

impl std::fmt::Debug for RestoreStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestoreStream")
            .field("expected_size", &self.expected_size)
            .finish_non_exhaustive()
    }
}

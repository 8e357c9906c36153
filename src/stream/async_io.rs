//! Async adapter for runtimes built on tokio
//!
//! Path resolution, directory creation, and commits touch the filesystem
//! synchronously and run on the blocking pool; the byte copy itself uses
//! tokio's file I/O.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::task;

use super::inbound::StagedWrite;
use super::{FileStreams, FsFileStreams};
use crate::container::ContainerHandle;
use crate::error::{HatchError, Result};

fn join_error(e: task::JoinError) -> HatchError {
    HatchError::IoFailure(format!("blocking task failed: {}", e))
}

impl FsFileStreams {
    /// Open `source` for reading without blocking the executor
    pub async fn open_async(&self, handle: &ContainerHandle, source: &str) -> Result<tokio::fs::File> {
        let this = self.clone();
        let handle = handle.clone();
        let source = source.to_string();

        let stream = task::spawn_blocking(move || this.open(&handle, &source))
            .await
            .map_err(join_error)??;
        Ok(tokio::fs::File::from_std(stream.into_file()))
    }

    /// Replace `destination` with everything read from `incoming`.
    ///
    /// If the returned future is dropped before completion the temporary
    /// file is removed and the destination is unchanged.
    pub async fn write_async<R>(&self, handle: &ContainerHandle, destination: &str, incoming: &mut R) -> Result<u64>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let resolver = self.resolver.clone();
        let owned_handle = handle.clone();
        let owned_destination = destination.to_string();

        let mut staged = task::spawn_blocking(move || {
            StagedWrite::prepare(&resolver, &owned_handle, &owned_destination)
        })
        .await
        .map_err(join_error)??;

        let mut file = tokio::fs::File::from_std(staged.reopen()?);
        let mut buf = vec![0u8; self.chunk_size];
        loop {
            let n = match incoming.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    log::warn!("discarding partial write to {}:{}: {}", handle, staged.label(), e);
                    return Err(HatchError::IoFailure(format!(
                        "{}: reading incoming data: {}",
                        staged.label(),
                        e
                    )));
                }
            };
            file.write_all(&buf[..n])
                .await
                .map_err(|e| HatchError::from_write_io(e, staged.label()))?;
            staged.record(n as u64);
        }
        file.flush()
            .await
            .map_err(|e| HatchError::from_write_io(e, staged.label()))?;
        drop(file);

        task::spawn_blocking(move || staged.commit())
            .await
            .map_err(join_error)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::ContainerRegistry;
    use crate::stream::inbound::temp_files_in;
    use std::fs;
    use std::io;
    use std::pin::Pin;
    use std::sync::Arc;
    use std::task::{Context, Poll};
    use tempfile::TempDir;
    use tokio::io::ReadBuf;

    /// Hands out `remaining` bytes, then fails like a dropped connection.
    struct FailingBody {
        remaining: usize,
    }

    impl AsyncRead for FailingBody {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            if self.remaining == 0 {
                return Poll::Ready(Err(io::Error::new(
                    io::ErrorKind::ConnectionReset,
                    "client went away",
                )));
            }
            let n = buf.remaining().min(self.remaining);
            buf.put_slice(&vec![b'z'; n]);
            self.remaining -= n;
            Poll::Ready(Ok(()))
        }
    }

    fn setup() -> (TempDir, FsFileStreams, std::path::PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let registry = ContainerRegistry::new();
        let root = registry.register("c1", temp_dir.path()).unwrap();
        (temp_dir, FsFileStreams::new(Arc::new(registry)).with_chunk_size(3), root)
    }

    #[tokio::test]
    async fn test_async_round_trip() {
        let (_tmp, streams, root) = setup();
        let mut body: &[u8] = b"async bytes";

        let written = streams.write_async(&"c1".into(), "x/y.bin", &mut body).await.unwrap();
        assert_eq!(written, 11);
        assert_eq!(fs::read(root.join("x/y.bin")).unwrap(), b"async bytes");

        let mut file = streams.open_async(&"c1".into(), "x/y.bin").await.unwrap();
        let mut out = Vec::new();
        file.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, b"async bytes");
    }

    #[tokio::test]
    async fn test_async_escape() {
        let (_tmp, streams, _root) = setup();
        let result = streams.open_async(&"c1".into(), "../../etc/passwd").await;
        assert!(matches!(result, Err(HatchError::PathEscape(_))));
    }

    #[tokio::test]
    async fn test_async_aborted_body_keeps_old_content() {
        let (_tmp, streams, root) = setup();
        fs::write(root.join("f"), b"original").unwrap();

        let mut body = FailingBody { remaining: 10 };
        let result = streams.write_async(&"c1".into(), "f", &mut body).await;

        assert!(matches!(result, Err(HatchError::IoFailure(_))));
        assert_eq!(fs::read(root.join("f")).unwrap(), b"original");
        assert_eq!(temp_files_in(&root), 0);
    }

    #[tokio::test]
    async fn test_async_aborted_body_creates_no_file() {
        let (_tmp, streams, root) = setup();

        let mut body = FailingBody { remaining: 5 };
        assert!(streams.write_async(&"c1".into(), "new/f", &mut body).await.is_err());

        assert!(!root.join("new/f").exists());
        assert_eq!(temp_files_in(&root.join("new")), 0);
    }
}

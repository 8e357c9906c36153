//! Streaming a file out of a container

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use crate::error::{HatchError, Result};
use crate::security::ResolvedPath;

/// Sequential reader over a file inside a container.
///
/// Yields the file from offset zero in chunks of at most `chunk_size` bytes.
/// The descriptor is owned by the stream and closed when it is dropped, so a
/// consumer that goes away mid-transfer releases it as well.
#[derive(Debug)]
pub struct OutboundStream {
    file: File,
    path: PathBuf,
    len: u64,
    delivered: u64,
    chunk_size: usize,
}

impl OutboundStream {
    pub(crate) fn open(resolved: &ResolvedPath, chunk_size: usize) -> Result<Self> {
        let label = resolved.relative().display().to_string();

        // Check before opening so FIFOs and devices are never opened.
        let meta = fs::metadata(resolved.path()).map_err(|e| HatchError::from_read_io(e, &label))?;
        if !meta.is_file() {
            return Err(HatchError::NotFound(format!("{}: not a regular file", label)));
        }

        let file = File::open(resolved.path()).map_err(|e| HatchError::from_read_io(e, &label))?;

        // The entry may have been swapped between the check and the open.
        let meta = file.metadata().map_err(|e| HatchError::from_read_io(e, &label))?;
        if !meta.is_file() {
            return Err(HatchError::NotFound(format!("{}: not a regular file", label)));
        }

        log::debug!("opened {} ({} bytes)", resolved.path().display(), meta.len());

        Ok(Self {
            file,
            path: resolved.path().to_path_buf(),
            len: meta.len(),
            delivered: 0,
            chunk_size,
        })
    }

    /// Host path of the file being streamed
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File length observed when the stream was opened
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bytes handed to the consumer so far
    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    /// Read the next chunk, or `None` at end of file
    pub fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        let mut buf = vec![0u8; self.chunk_size];
        loop {
            match self.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(n) => {
                    buf.truncate(n);
                    return Ok(Some(buf));
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(HatchError::IoFailure(format!(
                        "reading {}: {}",
                        self.path.display(),
                        e
                    )))
                }
            }
        }
    }

    /// Copy the remainder of the file into `sink`, one chunk at a time
    pub fn copy_to<W: Write + ?Sized>(&mut self, sink: &mut W) -> Result<u64> {
        let mut copied = 0u64;
        while let Some(chunk) = self.next_chunk()? {
            sink.write_all(&chunk)
                .map_err(|e| HatchError::IoFailure(format!("writing to sink: {}", e)))?;
            copied += chunk.len() as u64;
        }
        sink.flush()
            .map_err(|e| HatchError::IoFailure(format!("flushing sink: {}", e)))?;
        Ok(copied)
    }

    /// Give up the stream and take the open file, positioned where the
    /// stream left off
    pub fn into_file(self) -> File {
        self.file
    }
}

impl Read for OutboundStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.file.read(buf)?;
        self.delivered += n as u64;
        Ok(n)
    }
}

impl Iterator for OutboundStream {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_chunk().transpose()
    }
}

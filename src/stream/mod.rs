//! File streaming in and out of containers
//!
//! [`FileStreams`] is the capability the transport layer is handed: open a
//! container file as a byte stream, or write a byte stream into one. The only
//! implementation, [`FsFileStreams`], works directly on the host filesystem
//! through a [`PathResolver`].

mod inbound;
mod outbound;

#[cfg(feature = "async")]
mod async_io;

pub use outbound::OutboundStream;

use std::io::Read;
use std::sync::Arc;

use crate::config::{Config, DEFAULT_CHUNK_SIZE, MAX_CHUNK_SIZE};
use crate::container::{ContainerHandle, ContainerRegistry};
use crate::error::Result;
use crate::security::PathResolver;

/// Streaming access to files inside containers
pub trait FileStreams: Send + Sync {
    /// Open `source` in the container for sequential reading
    fn open(&self, handle: &ContainerHandle, source: &str) -> Result<OutboundStream>;

    /// Replace `destination` in the container with everything read from
    /// `incoming`, returning the number of bytes committed
    fn write(&self, handle: &ContainerHandle, destination: &str, incoming: &mut dyn Read) -> Result<u64>;
}

/// Filesystem-backed [`FileStreams`]
#[derive(Debug, Clone)]
pub struct FsFileStreams {
    resolver: PathResolver,
    chunk_size: usize,
}

impl FsFileStreams {
    pub fn new(registry: Arc<ContainerRegistry>) -> Self {
        Self {
            resolver: PathResolver::new(registry),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Build from a validated configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let registry = match &config.containers_dir {
            Some(dir) => ContainerRegistry::with_base_dir(dir),
            None => ContainerRegistry::new(),
        };
        Ok(Self::new(Arc::new(registry)).with_chunk_size(config.chunk_size))
    }

    /// Set the transfer chunk size, clamped to `1..=MAX_CHUNK_SIZE`
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.clamp(1, MAX_CHUNK_SIZE);
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }
}

impl FileStreams for FsFileStreams {
    fn open(&self, handle: &ContainerHandle, source: &str) -> Result<OutboundStream> {
        let resolved = self.resolver.resolve(handle, source)?;
        OutboundStream::open(&resolved, self.chunk_size)
    }

    fn write(&self, handle: &ContainerHandle, destination: &str, incoming: &mut dyn Read) -> Result<u64> {
        inbound::write_file(&self.resolver, handle, destination, incoming, self.chunk_size)
    }
}

//! Hatch - stream files in and out of container filesystems
//!
//! Every path a caller hands in is resolved inside the container's root and
//! rejected if it would leave it, lexically or through a symlink. File
//! content moves in bounded chunks in both directions, and writes are
//! committed by renaming a fully written temporary file into place.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use hatch::{ContainerRegistry, FileStreams, FsFileStreams};
//!
//! let registry = ContainerRegistry::with_base_dir("/var/lib/hatch/containers");
//! let streams = FsFileStreams::new(Arc::new(registry));
//!
//! let mut body: &[u8] = b"hello";
//! streams.write(&"web-1".into(), "etc/motd", &mut body).unwrap();
//!
//! let mut out = streams.open(&"web-1".into(), "etc/motd").unwrap();
//! out.copy_to(&mut std::io::stdout()).unwrap();
//! ```

pub mod cli;
pub mod config;
pub mod container;
pub mod error;
pub mod logging;
pub mod security;
pub mod stream;

pub use config::Config;
pub use container::{ContainerHandle, ContainerRegistry};
pub use error::{ErrorKind, HatchError, Result};
pub use security::{PathResolver, ResolvedPath};
pub use stream::{FileStreams, FsFileStreams, OutboundStream};

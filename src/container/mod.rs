//! Container addressing
//!
//! Containers are addressed by an opaque handle. The registry turns a handle
//! into the canonical host directory that is the container's private
//! filesystem root; everything else in the crate only ever sees that root.

mod handle;
mod registry;

pub use handle::ContainerHandle;
pub use registry::ContainerRegistry;

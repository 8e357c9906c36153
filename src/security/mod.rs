//! Path safety for container filesystems
//!
//! Two checks guard every path handed to the filesystem: lexical
//! normalization of the caller's input, then a containment walk that follows
//! real symlinks and verifies the result stays under the container root.

pub mod normalize;
pub mod resolver;

pub use normalize::normalize;
pub use resolver::{PathResolver, ResolvedPath};

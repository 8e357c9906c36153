//! Resolution of untrusted paths inside a container root

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::normalize::normalize;
use crate::container::{ContainerHandle, ContainerRegistry};
use crate::error::{is_not_a_directory, HatchError, Result};

/// A host path proven to lie inside a container root at resolution time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    root: PathBuf,
    relative: PathBuf,
    path: PathBuf,
}

impl ResolvedPath {
    /// Absolute host path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Canonical container root the path was resolved against
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Normalized path relative to the root
    pub fn relative(&self) -> &Path {
        &self.relative
    }

    /// True when the path names the container root itself
    pub fn is_root(&self) -> bool {
        self.relative.as_os_str().is_empty()
    }

    pub fn into_path_buf(self) -> PathBuf {
        self.path
    }
}

impl AsRef<Path> for ResolvedPath {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

/// Maps (handle, relative path) pairs to validated host paths
#[derive(Debug, Clone)]
pub struct PathResolver {
    registry: Arc<ContainerRegistry>,
}

impl PathResolver {
    pub fn new(registry: Arc<ContainerRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ContainerRegistry {
        &self.registry
    }

    /// Resolve `relative` inside the root of `handle`.
    ///
    /// The path is normalized lexically, joined onto the canonical root, and
    /// every symlink met along the existing part of it is followed and checked
    /// to stay under the root. Nothing is cached between calls.
    pub fn resolve(&self, handle: &ContainerHandle, relative: &str) -> Result<ResolvedPath> {
        let root = self.registry.lookup(handle)?;

        let normalized = normalize(relative).map_err(|e| {
            if let HatchError::PathEscape(_) = e {
                log::warn!("rejected traversal in container {}: {:?}", handle, relative);
            }
            e
        })?;

        if let Err(e) = check_containment(&root, &normalized) {
            if let HatchError::PathEscape(_) = e {
                log::warn!("rejected symlink escape in container {}: {:?}", handle, relative);
            }
            return Err(e);
        }

        // Joining an empty path would append a trailing separator.
        let path = if normalized.as_os_str().is_empty() {
            root.clone()
        } else {
            root.join(&normalized)
        };
        log::debug!("resolved {}:{:?} -> {}", handle, relative, path.display());

        Ok(ResolvedPath {
            root,
            relative: normalized,
            path,
        })
    }
}

/// True when the OS gave up following a chain of symlinks.
fn is_symlink_loop(err: &io::Error) -> bool {
    #[cfg(unix)]
    {
        err.raw_os_error() == Some(libc::ELOOP)
    }
    #[cfg(not(unix))]
    {
        // ERROR_CANT_RESOLVE_FILENAME
        err.raw_os_error() == Some(1921)
    }
}

/// Walk `relative` component by component from the canonical `root`,
/// following symlinks that exist on disk.
///
/// Stops at the first component that does not exist, or that is a regular
/// file; whatever follows cannot be a symlink. A dangling symlink or a
/// symlink loop cannot be proven to stay inside the root and is rejected.
fn check_containment(root: &Path, relative: &Path) -> Result<()> {
    let mut current = root.to_path_buf();

    for part in relative.components() {
        let next = current.join(part);
        match fs::symlink_metadata(&next) {
            Ok(meta) if meta.file_type().is_symlink() => {
                let target = next.canonicalize().map_err(|e| match e.kind() {
                    io::ErrorKind::NotFound => HatchError::PathEscape(format!(
                        "{}: dangling symlink",
                        relative.display()
                    )),
                    _ if is_not_a_directory(&e) => HatchError::PathEscape(format!(
                        "{}: dangling symlink",
                        relative.display()
                    )),
                    _ if is_symlink_loop(&e) => HatchError::PathEscape(format!(
                        "{}: symlink loop",
                        relative.display()
                    )),
                    _ => HatchError::from_read_io(e, &relative.display().to_string()),
                })?;
                if !target.starts_with(root) {
                    return Err(HatchError::PathEscape(relative.display().to_string()));
                }
                current = target;
            }
            Ok(meta) => {
                current = next;
                if !meta.is_dir() {
                    break;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound || is_not_a_directory(&e) => break,
            Err(e) => return Err(HatchError::from_read_io(e, &relative.display().to_string())),
        }
    }

    Ok(())
}

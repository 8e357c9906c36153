//! Container registry mapping handles to filesystem roots
//!
//! Roots come from two places: handles registered explicitly, and an optional
//! containers directory in which each subdirectory is a container root named
//! by its handle. Explicit registrations take precedence.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use super::handle::ContainerHandle;
use crate::error::{HatchError, Result};

/// Looks up the live root directory of a container
#[derive(Debug, Default)]
pub struct ContainerRegistry {
    /// Explicitly registered roots, canonicalized at registration
    roots: RwLock<HashMap<ContainerHandle, PathBuf>>,
    /// Directory whose children are container roots
    base_dir: Option<PathBuf>,
}

impl ContainerRegistry {
    /// Create an empty registry with no containers directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry that discovers containers under `base_dir`
    pub fn with_base_dir(base_dir: impl AsRef<Path>) -> Self {
        Self {
            roots: RwLock::new(HashMap::new()),
            base_dir: Some(base_dir.as_ref().to_path_buf()),
        }
    }

    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    /// Register a container root, replacing any previous root for the handle
    pub fn register(&self, handle: impl Into<ContainerHandle>, root: impl AsRef<Path>) -> Result<PathBuf> {
        let handle = handle.into();
        let root = root.as_ref();

        let canonical = root.canonicalize().map_err(|e| {
            HatchError::Config(format!("Container root '{}' is not usable: {}", root.display(), e))
        })?;
        if !canonical.is_dir() {
            return Err(HatchError::Config(format!(
                "Container root '{}' is not a directory",
                root.display()
            )));
        }

        log::debug!("registered container {} at {}", handle, canonical.display());
        self.roots
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(handle, canonical.clone());
        Ok(canonical)
    }

    /// Forget an explicitly registered container
    pub fn unregister(&self, handle: &str) -> Result<()> {
        let removed = self
            .roots
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&ContainerHandle::from(handle));

        match removed {
            Some(_) => Ok(()),
            None => Err(HatchError::UnknownContainer(handle.to_string())),
        }
    }

    /// Resolve a handle to the canonical path of its live root.
    ///
    /// The root is re-canonicalized on every call so a root that was removed
    /// or swapped since registration is noticed.
    pub fn lookup(&self, handle: &ContainerHandle) -> Result<PathBuf> {
        let registered = self
            .roots
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(handle)
            .cloned();

        let candidate = match registered {
            Some(root) => root,
            None => match &self.base_dir {
                Some(base) if handle.is_single_component() => base.join(handle.as_str()),
                _ => return Err(HatchError::UnknownContainer(handle.to_string())),
            },
        };

        match candidate.canonicalize() {
            Ok(root) if root.is_dir() => Ok(root),
            _ => Err(HatchError::UnknownContainer(handle.to_string())),
        }
    }

    /// Check if a handle maps to a live root
    pub fn exists(&self, handle: &str) -> bool {
        self.lookup(&ContainerHandle::from(handle)).is_ok()
    }

    /// List all known handles, registered and discovered, in sorted order
    pub fn handles(&self) -> Result<Vec<ContainerHandle>> {
        let mut handles: BTreeSet<ContainerHandle> = self
            .roots
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect();

        if let Some(base) = &self.base_dir {
            let entries = fs::read_dir(base).map_err(|e| {
                HatchError::Config(format!("Cannot read containers directory '{}': {}", base.display(), e))
            })?;
            for entry in entries {
                let entry = entry.map_err(|e| HatchError::IoFailure(e.to_string()))?;
                if entry.path().is_dir() {
                    if let Some(name) = entry.file_name().to_str() {
                        handles.insert(ContainerHandle::from(name));
                    }
                }
            }
        }

        Ok(handles.into_iter().collect())
    }
}

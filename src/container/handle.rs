//! Container handle definition
//!
//! A handle is the opaque name a caller uses to address a container. It is
//! untrusted input: nothing about its shape is assumed until the registry
//! maps it to a root.

use std::fmt;

/// Opaque identifier naming a container instance
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerHandle(String);

impl ContainerHandle {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check whether the handle can name a single directory entry.
    ///
    /// Only such handles are looked up under a containers base directory;
    /// anything else could address a directory outside of it.
    pub fn is_single_component(&self) -> bool {
        let h = self.0.as_str();
        !h.is_empty()
            && h != "."
            && h != ".."
            && !h.contains('/')
            && !h.contains('\\')
            && !h.contains('\0')
    }
}

impl fmt::Display for ContainerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContainerHandle {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ContainerHandle {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for ContainerHandle {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_display() {
        let handle = ContainerHandle::new("abc-123");
        assert_eq!(handle.to_string(), "abc-123");
        assert_eq!(handle.as_str(), "abc-123");
    }

    #[test]
    fn test_single_component() {
        assert!(ContainerHandle::from("c1").is_single_component());
        assert!(ContainerHandle::from("...").is_single_component());
        assert!(!ContainerHandle::from("").is_single_component());
        assert!(!ContainerHandle::from(".").is_single_component());
        assert!(!ContainerHandle::from("..").is_single_component());
        assert!(!ContainerHandle::from("a/b").is_single_component());
        assert!(!ContainerHandle::from("..\\x").is_single_component());
        assert!(!ContainerHandle::from("a\0b").is_single_component());
    }
}

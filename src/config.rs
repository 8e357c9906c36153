//! Configuration for Hatch
//!
//! Settings can come from a JSON file and are then overridden by command
//! line flags or environment variables.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{HatchError, Result};

/// Default transfer chunk size (64 KiB)
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Upper bound on the transfer chunk size (16 MiB)
pub const MAX_CHUNK_SIZE: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory whose subdirectories are container roots
    pub containers_dir: Option<PathBuf>,
    /// Size of each chunk read from or written to a file
    pub chunk_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            containers_dir: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl Config {
    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            HatchError::Config(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(content)
            .map_err(|e| HatchError::Config(format!("Invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 || self.chunk_size > MAX_CHUNK_SIZE {
            return Err(HatchError::Config(format!(
                "chunk_size must be between 1 and {} bytes, got {}",
                MAX_CHUNK_SIZE, self.chunk_size
            )));
        }
        Ok(())
    }
}

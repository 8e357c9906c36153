//! CLI argument parsing

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;
use crate::error::Result;

#[derive(Parser, Debug)]
#[command(name = "hatch")]
#[command(author, version, about = "Stream files in and out of container filesystems", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: SubCommand,

    /// JSON configuration file
    #[arg(long, global = true, env = "HATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory whose subdirectories are container roots
    #[arg(long, global = true, env = "HATCH_CONTAINERS_DIR")]
    pub containers_dir: Option<PathBuf>,

    /// Transfer chunk size in bytes
    #[arg(long, global = true)]
    pub chunk_size: Option<usize>,

    /// Output summaries and errors as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose logging (repeat for more)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum SubCommand {
    /// Stream a file out of a container
    Get {
        /// Container handle
        handle: String,

        /// Path of the file inside the container
        source: String,

        /// Write to this host file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Stream a file into a container
    Put {
        /// Container handle
        handle: String,

        /// Path of the file inside the container
        destination: String,

        /// Read from this host file instead of stdin
        #[arg(long, short)]
        input: Option<PathBuf>,
    },

    /// Print the host path a container path resolves to
    Resolve {
        /// Container handle
        handle: String,

        /// Path inside the container
        path: String,
    },

    /// List containers under the containers directory
    Containers,
}

impl Args {
    /// Build the effective configuration: the config file if given, then
    /// flag and environment overrides
    pub fn effective_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        if let Some(dir) = &self.containers_dir {
            config.containers_dir = Some(dir.clone());
        }
        if let Some(chunk_size) = self.chunk_size {
            config.chunk_size = chunk_size;
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_get() {
        let args = Args::try_parse_from(["hatch", "get", "c1", "etc/hosts", "-o", "out"]).unwrap();
        match args.command {
            SubCommand::Get { handle, source, output } => {
                assert_eq!(handle, "c1");
                assert_eq!(source, "etc/hosts");
                assert_eq!(output, Some(PathBuf::from("out")));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_verbose_counts() {
        let args = Args::try_parse_from(["hatch", "-vv", "containers"]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_flags_override_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("hatch.json");
        fs::write(&path, r#"{"containers_dir": "/from/file", "chunk_size": 1024}"#).unwrap();

        let args = Args::try_parse_from([
            "hatch",
            "--config",
            path.to_str().unwrap(),
            "--chunk-size",
            "2048",
            "containers",
        ])
        .unwrap();
        let config = args.effective_config().unwrap();
        assert_eq!(config.chunk_size, 2048);
        assert_eq!(config.containers_dir, Some(PathBuf::from("/from/file")));
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let args = Args::try_parse_from(["hatch", "--chunk-size", "0", "containers"]).unwrap();
        assert!(args.effective_config().is_err());
    }
}

//! Streaming a file into a container
//!
//! Incoming bytes land in a temporary file next to the destination and are
//! committed with a rename, so the destination always holds either its old
//! content or the complete new content. A staged write that is dropped
//! without being committed removes its temporary file.

use std::fs::{self, File, Permissions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use bytesize::ByteSize;
use tempfile::NamedTempFile;

use crate::container::ContainerHandle;
use crate::error::{is_not_a_directory, HatchError, Result};
use crate::security::{PathResolver, ResolvedPath};

const TEMP_PREFIX: &str = ".hatch-";
const TEMP_SUFFIX: &str = ".part";

/// An in-progress write to a container file
#[derive(Debug)]
pub(crate) struct StagedWrite {
    temp: NamedTempFile,
    target: PathBuf,
    label: String,
    permissions: Option<Permissions>,
    written: u64,
}

impl StagedWrite {
    /// Resolve the destination, create missing parent directories, and open
    /// a temporary file beside it.
    pub(crate) fn prepare(
        resolver: &PathResolver,
        handle: &ContainerHandle,
        destination: &str,
    ) -> Result<Self> {
        let resolved = resolver.resolve(handle, destination)?;
        if resolved.is_root() {
            return Err(HatchError::InvalidDestination(
                "destination is the container root".to_string(),
            ));
        }

        create_parent_dirs(&resolved)?;

        // Directory creation may have raced with a symlink swap; check again
        // right before the file is created.
        let resolved = resolver.resolve(handle, destination)?;
        let label = resolved.relative().display().to_string();

        let permissions = match fs::metadata(resolved.path()) {
            Ok(meta) if meta.is_dir() => {
                return Err(HatchError::InvalidDestination(format!("{}: is a directory", label)))
            }
            Ok(meta) => Some(meta.permissions()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(HatchError::from_write_io(e, &label)),
        };

        let parent = resolved.path().parent().unwrap_or_else(|| resolved.root());
        let temp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(TEMP_SUFFIX)
            .tempfile_in(parent)
            .map_err(|e| HatchError::from_write_io(e, &label))?;

        log::debug!("staging {} via {}", resolved.path().display(), temp.path().display());

        Ok(Self {
            temp,
            target: resolved.into_path_buf(),
            label,
            permissions,
            written: 0,
        })
    }

    /// Copy `incoming` into the temporary file until it reports end of input
    pub(crate) fn copy_from(&mut self, incoming: &mut dyn Read, chunk_size: usize) -> Result<u64> {
        let mut buf = vec![0u8; chunk_size];
        loop {
            let n = match incoming.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(HatchError::IoFailure(format!(
                        "{}: reading incoming data: {}",
                        self.label, e
                    )))
                }
            };
            self.temp
                .as_file_mut()
                .write_all(&buf[..n])
                .map_err(|e| HatchError::from_write_io(e, &self.label))?;
            self.written += n as u64;
        }
        Ok(self.written)
    }

    /// A second handle to the temporary file, for writers that cannot borrow
    /// the staged write
    #[cfg(feature = "async")]
    pub(crate) fn reopen(&self) -> Result<File> {
        self.temp
            .reopen()
            .map_err(|e| HatchError::from_write_io(e, &self.label))
    }

    #[cfg(feature = "async")]
    pub(crate) fn record(&mut self, n: u64) {
        self.written += n;
    }

    pub(crate) fn label(&self) -> &str {
        &self.label
    }

    /// Flush the temporary file to disk and rename it over the destination
    pub(crate) fn commit(self) -> Result<u64> {
        let file = self.temp.as_file();
        file.sync_all()
            .map_err(|e| HatchError::from_write_io(e, &self.label))?;
        apply_permissions(file, self.permissions)
            .map_err(|e| HatchError::from_write_io(e, &self.label))?;

        let label = self.label;
        let written = self.written;
        self.temp
            .persist(&self.target)
            .map_err(|e| HatchError::from_write_io(e.error, &label))?;

        log::info!("committed {} ({})", self.target.display(), ByteSize(written));
        Ok(written)
    }
}

/// Stream `incoming` into `destination` inside the container
pub(crate) fn write_file(
    resolver: &PathResolver,
    handle: &ContainerHandle,
    destination: &str,
    incoming: &mut dyn Read,
    chunk_size: usize,
) -> Result<u64> {
    let mut staged = StagedWrite::prepare(resolver, handle, destination)?;
    if let Err(e) = staged.copy_from(incoming, chunk_size) {
        log::warn!("discarding partial write to {}:{}: {}", handle, staged.label(), e);
        return Err(e);
    }
    staged.commit()
}

/// Create each missing directory between the root and the destination's
/// parent, refusing to go through anything that is not a directory.
fn create_parent_dirs(resolved: &ResolvedPath) -> Result<()> {
    let parent = match resolved.relative().parent() {
        Some(parent) => parent,
        None => return Ok(()),
    };

    let mut current = resolved.root().to_path_buf();
    let mut walked = PathBuf::new();
    for part in parent.components() {
        current.push(part);
        walked.push(part);

        match fs::metadata(&current) {
            Ok(meta) if meta.is_dir() => continue,
            Ok(_) => return Err(not_a_directory(&walked)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) if is_not_a_directory(&e) => return Err(not_a_directory(&walked)),
            Err(e) => return Err(HatchError::from_write_io(e, &walked.display().to_string())),
        }

        match fs::create_dir(&current) {
            Ok(()) => log::debug!("created directory {}", current.display()),
            // Another writer created it first.
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists && current.is_dir() => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(not_a_directory(&walked))
            }
            Err(e) => return Err(HatchError::from_write_io(e, &walked.display().to_string())),
        }
    }

    Ok(())
}

fn not_a_directory(path: &Path) -> HatchError {
    HatchError::InvalidDestination(format!("{}: exists and is not a directory", path.display()))
}

fn apply_permissions(file: &File, existing: Option<Permissions>) -> io::Result<()> {
    match existing {
        Some(permissions) => file.set_permissions(permissions),
        None => apply_default_permissions(file),
    }
}

#[cfg(unix)]
fn apply_default_permissions(file: &File) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn apply_default_permissions(_file: &File) -> io::Result<()> {
    Ok(())
}

/// Count the staging files left in a directory
#[cfg(test)]
pub(crate) fn temp_files_in(dir: &Path) -> usize {
    fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter(|e| {
                    let name = e.file_name();
                    let name = name.to_string_lossy();
                    name.starts_with(TEMP_PREFIX) && name.ends_with(TEMP_SUFFIX)
                })
                .count()
        })
        .unwrap_or(0)
}

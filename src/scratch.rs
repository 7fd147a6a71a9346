//! Scratch space for a test run
//!
//! A [`ScratchRoot`] is a directory unique to this process, named after the
//! pid (`<base>/<pid>`, then `<pid>_0`, `<pid>_1`, ... if taken). Mount points,
//! files and directories are created inside it, or inside any other
//! directory such as a mounted share, as `<prefix>_<n>` with the first free
//! `n`.
//!
//! Every name is claimed with an exclusive create and the next suffix is
//! tried on `AlreadyExists`, so a returned path never existed before the
//! call even if another process is creating entries concurrently.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{HarnessError, Result};

/// Upper bound on suffixes tried for a single name
const MAX_SUFFIX: u32 = 1_000_000;

/// Kind of filesystem object to create under a scratch directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    MountPoint,
    File,
    Dir,
}

impl EntryKind {
    /// Name prefix for entries of this kind
    pub fn prefix(self) -> &'static str {
        match self {
            EntryKind::MountPoint => "mnt",
            EntryKind::File => "tmp_file",
            EntryKind::Dir => "tmp_dir",
        }
    }

    fn create(self, path: &Path) -> io::Result<()> {
        match self {
            EntryKind::MountPoint | EntryKind::Dir => fs::create_dir(path),
            EntryKind::File => OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(path)
                .map(drop),
        }
    }
}

/// Allocates scratch roots under a base directory
#[derive(Debug, Clone)]
pub struct ScratchSpace {
    base: PathBuf,
}

impl Default for ScratchSpace {
    fn default() -> Self {
        Self::new(std::env::temp_dir())
    }
}

impl ScratchSpace {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Create a fresh root directory named after the current process
    pub fn create_root(&self) -> Result<ScratchRoot> {
        let pid = std::process::id();

        let path = claim(
            std::iter::once(self.base.join(pid.to_string())).chain(
                (0..MAX_SUFFIX).map(|n| self.base.join(format!("{}_{}", pid, n))),
            ),
            |p| fs::create_dir(p),
        )
        .map_err(|e| HarnessError::filesystem(&self.base, e))?;

        debug!("Created scratch root {:?}", path);
        Ok(ScratchRoot { path })
    }

    /// Remove a root directory; fails if anything is still inside it
    pub fn remove_root(&self, root: &ScratchRoot) -> Result<()> {
        fs::remove_dir(&root.path).map_err(|e| HarnessError::filesystem(&root.path, e))?;
        debug!("Removed scratch root {:?}", root.path);
        Ok(())
    }
}

/// Directory owning every temporary artifact of one run
#[derive(Debug, PartialEq, Eq)]
pub struct ScratchRoot {
    path: PathBuf,
}

impl ScratchRoot {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn create_mount_point(&self) -> Result<PathBuf> {
        create_entry(&self.path, EntryKind::MountPoint)
    }

    pub fn create_file(&self) -> Result<PathBuf> {
        create_entry(&self.path, EntryKind::File)
    }

    pub fn create_dir(&self) -> Result<PathBuf> {
        create_entry(&self.path, EntryKind::Dir)
    }
}

/// Create an empty mount-point directory `mnt_<n>` under `dir`
pub fn create_mount_point(dir: &Path) -> Result<PathBuf> {
    create_entry(dir, EntryKind::MountPoint)
}

/// Create an empty file `tmp_file_<n>` under `dir`
pub fn create_file(dir: &Path) -> Result<PathBuf> {
    create_entry(dir, EntryKind::File)
}

/// Create an empty directory `tmp_dir_<n>` under `dir`
pub fn create_dir(dir: &Path) -> Result<PathBuf> {
    create_entry(dir, EntryKind::Dir)
}

/// Create the first free `<prefix>_<n>` entry of `kind` under `dir`
pub fn create_entry(dir: &Path, kind: EntryKind) -> Result<PathBuf> {
    let prefix = kind.prefix();
    let path = claim(
        (0..MAX_SUFFIX).map(|n| dir.join(format!("{}_{}", prefix, n))),
        |p| kind.create(p),
    )
    .map_err(|e| HarnessError::filesystem(dir, e))?;

    debug!("Created {:?} {:?}", kind, path);
    Ok(path)
}

/// Remove a single file or empty directory created in scratch space
pub fn remove_entry(path: &Path) -> Result<()> {
    let meta = fs::symlink_metadata(path).map_err(|e| HarnessError::filesystem(path, e))?;
    let result = if meta.is_dir() {
        fs::remove_dir(path)
    } else {
        fs::remove_file(path)
    };
    result.map_err(|e| HarnessError::filesystem(path, e))?;
    debug!("Removed {:?}", path);
    Ok(())
}

/// Try candidates in order until `create` succeeds on one that did not exist
fn claim<I, F>(candidates: I, create: F) -> io::Result<PathBuf>
where
    I: IntoIterator<Item = PathBuf>,
    F: Fn(&Path) -> io::Result<()>,
{
    for candidate in candidates {
        match create(&candidate) {
            Ok(()) => return Ok(candidate),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        }
    }
    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        "no free scratch name left",
    ))
}

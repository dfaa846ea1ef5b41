//! Filesystem capabilities consumed by the build driver.

use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Filesystem and environment capabilities the solution builder runs on.
///
/// The driver never touches `std::fs` directly; every read, write, deletion,
/// and timestamp query goes through this trait so tests and embedders can
/// interpose.
pub trait BuildHost {
    /// Reads a file's bytes.
    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Writes a file's bytes, creating parent directories as needed.
    fn write_file(&self, path: &Path, data: &[u8]) -> io::Result<()>;

    /// Deletes a file.
    fn delete_file(&self, path: &Path) -> io::Result<()>;

    /// Returns `true` if `path` exists and is a file.
    fn file_exists(&self, path: &Path) -> bool;

    /// Returns the modification time of `path`, or `None` if it cannot be
    /// determined (typically: the file does not exist).
    fn modified_time(&self, path: &Path) -> Option<SystemTime>;

    /// Sets the modification time of `path`.
    fn set_modified_time(&self, path: &Path, time: SystemTime) -> io::Result<()>;

    /// Returns the current working directory.
    fn current_dir(&self) -> PathBuf;

    /// Returns `true` if the host filesystem distinguishes file-name case.
    fn use_case_sensitive_file_names(&self) -> bool;

    /// Returns the current wall-clock time.
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// The production [`BuildHost`] backed by `std::fs`.
pub struct SystemHost {
    cwd: PathBuf,
}

impl SystemHost {
    /// Creates a host rooted at the process working directory.
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            cwd: std::env::current_dir()?,
        })
    }

    /// Creates a host rooted at an explicit working directory.
    pub fn with_current_dir(cwd: impl Into<PathBuf>) -> Self {
        Self { cwd: cwd.into() }
    }
}

impl BuildHost for SystemHost {
    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn write_file(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, data)
    }

    fn delete_file(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_file(path)
    }

    fn file_exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn modified_time(&self, path: &Path) -> Option<SystemTime> {
        std::fs::metadata(path).and_then(|m| m.modified()).ok()
    }

    fn set_modified_time(&self, path: &Path, time: SystemTime) -> io::Result<()> {
        let file = std::fs::OpenOptions::new().append(true).open(path)?;
        file.set_modified(time)
    }

    fn current_dir(&self) -> PathBuf {
        self.cwd.clone()
    }

    fn use_case_sensitive_file_names(&self) -> bool {
        cfg!(not(any(target_os = "windows", target_os = "macos")))
    }
}

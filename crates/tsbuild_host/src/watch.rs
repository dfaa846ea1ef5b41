//! File watching capabilities.
//!
//! The watch backend delivers events on its own threads; [`NotifyWatcher`]
//! marshals them onto the driver thread through a channel, so the driver
//! consumes events single-threaded via [`FileWatcher::poll_timeout`].

use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};

/// What happened to a watched path.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FileEventKind {
    /// The file or directory entry was created.
    Created,
    /// The file's content or metadata changed.
    Modified,
    /// The file or directory entry was removed.
    Removed,
}

/// A single filesystem change delivered to the driver.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct FileEvent {
    /// The affected path.
    pub path: PathBuf,
    /// What happened.
    pub kind: FileEventKind,
}

/// Errors from the watch backend.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// The underlying notification backend failed.
    #[error("watch backend error: {0}")]
    Backend(String),
}

impl From<notify::Error> for WatchError {
    fn from(e: notify::Error) -> Self {
        WatchError::Backend(e.to_string())
    }
}

/// File and directory watching consumed by the watch session.
///
/// Implementations must deliver events on the caller's thread via
/// [`poll_timeout`](Self::poll_timeout); any internal threading stays behind
/// the channel.
pub trait FileWatcher {
    /// Starts watching `path`. For directories, `recursive` selects whether
    /// subdirectories are observed; for files it is ignored.
    fn watch(&mut self, path: &Path, recursive: bool) -> Result<(), WatchError>;

    /// Stops watching `path`. Unknown paths are ignored.
    fn unwatch(&mut self, path: &Path);

    /// Blocks up to `timeout` for the next event.
    fn poll_timeout(&mut self, timeout: Duration) -> Option<FileEvent>;
}

/// The production watcher backed by the `notify` crate.
pub struct NotifyWatcher {
    watcher: RecommendedWatcher,
    rx: Receiver<FileEvent>,
}

impl NotifyWatcher {
    /// Creates a new watcher with an internal event channel.
    pub fn new() -> Result<Self, WatchError> {
        let (tx, rx) = std::sync::mpsc::channel();
        let watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            let Ok(event) = res else { return };
            let Some(kind) = map_kind(&event.kind) else {
                return;
            };
            for path in event.paths {
                let _ = tx.send(FileEvent { path, kind });
            }
        })?;
        Ok(Self { watcher, rx })
    }
}

impl FileWatcher for NotifyWatcher {
    fn watch(&mut self, path: &Path, recursive: bool) -> Result<(), WatchError> {
        let mode = if recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        self.watcher.watch(path, mode)?;
        Ok(())
    }

    fn unwatch(&mut self, path: &Path) {
        let _ = self.watcher.unwatch(path);
    }

    fn poll_timeout(&mut self, timeout: Duration) -> Option<FileEvent> {
        match self.rx.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

fn map_kind(kind: &notify::EventKind) -> Option<FileEventKind> {
    use notify::EventKind;
    match kind {
        EventKind::Create(_) => Some(FileEventKind::Created),
        EventKind::Modify(_) => Some(FileEventKind::Modified),
        EventKind::Remove(_) => Some(FileEventKind::Removed),
        EventKind::Access(_) | EventKind::Any | EventKind::Other => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, ModifyKind, RemoveKind};
    use notify::EventKind;
    use tempfile::TempDir;

    #[test]
    fn map_kinds() {
        assert_eq!(
            map_kind(&EventKind::Create(CreateKind::File)),
            Some(FileEventKind::Created)
        );
        assert_eq!(
            map_kind(&EventKind::Modify(ModifyKind::Any)),
            Some(FileEventKind::Modified)
        );
        assert_eq!(
            map_kind(&EventKind::Remove(RemoveKind::File)),
            Some(FileEventKind::Removed)
        );
        assert_eq!(map_kind(&EventKind::Any), None);
    }

    #[test]
    fn watch_and_unwatch_directory() {
        let tmp = TempDir::new().unwrap();
        let mut watcher = NotifyWatcher::new().unwrap();
        watcher.watch(tmp.path(), true).unwrap();
        watcher.unwatch(tmp.path());
    }

    #[test]
    fn poll_times_out_when_idle() {
        let mut watcher = NotifyWatcher::new().unwrap();
        assert!(watcher.poll_timeout(Duration::from_millis(10)).is_none());
    }

    #[test]
    fn delivers_modification_event() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("a.ts");
        std::fs::write(&file, "export {};").unwrap();

        let mut watcher = NotifyWatcher::new().unwrap();
        watcher.watch(tmp.path(), true).unwrap();
        std::fs::write(&file, "export const a = 1;").unwrap();

        // Backends batch and reorder; accept any event mentioning the file.
        let mut saw_file = false;
        while let Some(event) = watcher.poll_timeout(Duration::from_secs(2)) {
            if event.path == file {
                saw_file = true;
                break;
            }
        }
        assert!(saw_file);
    }
}

//! Host capabilities consumed by the solution builder.
//!
//! All filesystem access from the core goes through the [`BuildHost`] trait;
//! file watching goes through [`FileWatcher`]. [`SystemHost`] and
//! [`NotifyWatcher`] are the production implementations.

#![warn(missing_docs)]

pub mod fs;
pub mod watch;

pub use fs::{BuildHost, SystemHost};
pub use watch::{FileEvent, FileEventKind, FileWatcher, NotifyWatcher, WatchError};

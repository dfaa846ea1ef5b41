//! The incremental solution builder.
//!
//! Given a set of root project configurations linked by explicit project
//! references, this crate determines which projects need (re)building and in
//! what order, and drives the underlying compiler to produce outputs only
//! where necessary:
//!
//! - [`ConfigCache`] lazily parses and memoizes each project's configuration.
//! - [`build_graph`] produces the leaves-first build queue and the
//!   bidirectional reference map, detecting illegal cycles.
//! - The classifier ([`SolutionBuilder::project_status`]) computes each
//!   project's [`UpToDateStatus`] from input, output, and upstream
//!   timestamps.
//! - [`SolutionBuilder`] walks the queue, compiling or skipping per project,
//!   and under watch mode drains a debounced invalidation queue
//!   ([`WatchSession`]).
//!
//! The compiler itself is a collaborator consumed through the
//! [`Compiler`]/[`Program`] traits.

#![warn(missing_docs)]

pub mod builder;
pub mod compiler;
pub mod config_cache;
pub mod graph;
pub mod status;
#[cfg(test)]
pub(crate) mod testutil;
pub mod watch;

pub use builder::{BuildOptions, BuildResultFlags, SolutionBuilder};
pub use compiler::{Compiler, Program, ProgramInput};
pub use config_cache::{resolve_project_name, ConfigCache, ConfigEntry};
pub use graph::{build_graph, BuildGraph};
pub use status::{FileStamp, UpToDateInfo, UpToDateStatus};
pub use watch::{ReloadLevel, WatchSession, REBUILD_DEBOUNCE};

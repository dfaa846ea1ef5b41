//! Project identity: which configuration file a name refers to.
//!
//! Every map in a build session (config cache, status map, reference graph)
//! is keyed by [`ProjectId`]. The [`ProjectRegistry`] owns the identity
//! rules: a name is canonicalized against the session's working directory,
//! and case-folded when the host filesystem is case-insensitive, before an
//! id is minted — so two spellings of the same file cannot produce two ids.

use std::path::{Path, PathBuf};

use lasso::ThreadedRodeo;

use crate::paths::normalize_path;

/// Identifies one project within a build session.
///
/// Ids are dense (the dependency graph indexes by them) and ordered by
/// first-interning order. They carry no meaning outside the
/// [`ProjectRegistry`] that minted them and are never persisted.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ProjectId(u32);

// lasso hands out keys as usize; a u32 fits every realistic project count
// and keeps the graph's maps small. Rejecting an overflowing index here is
// the contract `lasso::Key` requires.
unsafe impl lasso::Key for ProjectId {
    fn into_usize(self) -> usize {
        self.0 as usize
    }

    fn try_from_usize(int: usize) -> Option<Self> {
        u32::try_from(int).ok().map(ProjectId)
    }
}

/// Mints and resolves [`ProjectId`]s for one build session.
///
/// The registry enforces the canonicalization invariant itself: callers
/// hand it names exactly as they appear in configuration files or on the
/// command line, and the registry normalizes them (against the working
/// directory captured at session start, with the host's case sensitivity)
/// before interning. Looking an id back up yields the canonical path, which
/// is also the path the configuration is read from.
pub struct ProjectRegistry {
    paths: ThreadedRodeo<ProjectId>,
    cwd: PathBuf,
    case_sensitive: bool,
}

impl ProjectRegistry {
    /// Creates a registry for a session rooted at `cwd`.
    ///
    /// `case_sensitive` is the host filesystem's property; on
    /// case-insensitive hosts, canonical paths are case-folded so `App/` and
    /// `app/` identify the same project.
    pub fn new(cwd: impl Into<PathBuf>, case_sensitive: bool) -> Self {
        Self {
            paths: ThreadedRodeo::new(),
            cwd: cwd.into(),
            case_sensitive,
        }
    }

    /// Returns the id for a configuration-file name, minting one on first
    /// sight.
    ///
    /// The name may be relative (resolved against the session's working
    /// directory) or absolute, and may contain `.`/`..` segments; all
    /// spellings of one file intern to the same id.
    pub fn intern(&self, name: &str) -> ProjectId {
        self.paths
            .get_or_intern(normalize_path(&self.cwd, name, self.case_sensitive))
    }

    /// [`intern`](Self::intern) for a name already held as a path.
    pub fn intern_path(&self, path: &Path) -> ProjectId {
        self.intern(&path.to_string_lossy())
    }

    /// Returns the canonical configuration path behind an id.
    ///
    /// # Panics
    ///
    /// Panics if the id was minted by a different registry.
    pub fn config_path(&self, id: ProjectId) -> &Path {
        Path::new(self.paths.resolve(&id))
    }
}

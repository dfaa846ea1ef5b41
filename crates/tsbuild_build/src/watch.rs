//! Watch mode: the invalidation queue, debounce scheduling, and filesystem
//! watch wiring.
//!
//! Invalidation never builds directly. A change evicts the affected
//! project's memoized state, queues it (widening its reload level
//! monotonically), and queues its transitive dependents; a debounce timer
//! then drains one project per tick so bursts of edits coalesce into a
//! single rebuild pass.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tsbuild_common::ProjectId;
use tsbuild_config::{expand_input_files, is_output_file, WildcardDirectory};
use tsbuild_diagnostics::{Category, Diagnostic, DiagnosticCode};
use tsbuild_host::{FileEvent, FileWatcher};

use crate::builder::{BuildResultFlags, SolutionBuilder};

/// Delay between the last filesystem event and the rebuild pass.
pub const REBUILD_DEBOUNCE: Duration = Duration::from_millis(250);

/// Code for a path that could not be watched.
pub const WATCH_FAILED: DiagnosticCode = DiagnosticCode::new(Category::Watch, 401);

/// How much of a project must be re-derived from disk on its next build.
///
/// Levels widen monotonically while a project sits in the pending queue: a
/// `Partial` invalidation never downgrades an already-pending `Full`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum ReloadLevel {
    /// Reuse the parsed configuration as-is.
    None,
    /// Re-expand wildcard file lists from disk.
    Partial,
    /// Re-parse the configuration file.
    Full,
}

/// FIFO queue of invalidated projects with per-project reload levels.
pub(crate) struct PendingQueue {
    order: VecDeque<ProjectId>,
    levels: HashMap<ProjectId, ReloadLevel>,
}

impl PendingQueue {
    pub(crate) fn new() -> Self {
        Self {
            order: VecDeque::new(),
            levels: HashMap::new(),
        }
    }

    /// Queues `id` at `level`, widening the stored level if already pending.
    /// Returns `true` if the project was newly queued.
    pub(crate) fn insert(&mut self, id: ProjectId, level: ReloadLevel) -> bool {
        match self.levels.entry(id) {
            Entry::Occupied(mut entry) => {
                if level > *entry.get() {
                    entry.insert(level);
                }
                false
            }
            Entry::Vacant(entry) => {
                entry.insert(level);
                self.order.push_back(id);
                true
            }
        }
    }

    /// Pops the oldest pending project.
    pub(crate) fn pop(&mut self) -> Option<(ProjectId, ReloadLevel)> {
        let id = self.order.pop_front()?;
        let level = self.levels.remove(&id).unwrap_or(ReloadLevel::None);
        Some((id, level))
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }
}

impl SolutionBuilder<'_> {
    /// Invalidates a project after a filesystem change.
    ///
    /// Evicts the project's memoized status and error count, queues it at
    /// the given reload level (widening monotonically), and on first entry
    /// queues every transitive dependent at [`ReloadLevel::None`] — the
    /// status eviction alone forces their reclassification. Returns whether
    /// the project was newly queued.
    pub fn invalidate_project(&mut self, id: ProjectId, level: ReloadLevel) -> bool {
        self.statuses.remove(&id);
        self.watch_error_counts.remove(&id);
        let newly_queued = self.pending.insert(id, level);
        if newly_queued {
            let dependents = self
                .graph
                .as_ref()
                .map(|g| g.transitive_dependents(id))
                .unwrap_or_default();
            for dependent in dependents {
                self.statuses.remove(&dependent);
                self.watch_error_counts.remove(&dependent);
                self.pending.insert(dependent, ReloadLevel::None);
            }
        }
        if level == ReloadLevel::Full {
            self.config_cache.invalidate(id);
            self.graph = None;
        }
        newly_queued
    }

    /// Pops one invalidated project and builds it.
    ///
    /// A `Partial` reload first refreshes the project's expanded file list;
    /// a prior `Full` invalidation has dropped the graph, which is rebuilt
    /// here. Returns the built project and its result flags, or `None` when
    /// the queue is empty.
    pub fn build_invalidated_project(&mut self) -> Option<(ProjectId, BuildResultFlags)> {
        let (id, level) = self.pending.pop()?;
        if level == ReloadLevel::Partial {
            self.refresh_file_list(id);
        }
        self.ensure_graph();
        let flags = self.build_one(id);
        Some((id, flags))
    }

    /// Returns `true` while invalidated projects remain queued.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Number of projects currently queued.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Total error count across all projects, for the watch summary.
    pub fn total_watch_errors(&self) -> usize {
        self.watch_error_counts.values().sum()
    }

    /// The summary line printed after each drain of the invalidated queue.
    pub fn watch_summary(&self) -> String {
        let errors = self.total_watch_errors();
        format!(
            "Found {} error{}. Watching for file changes.",
            errors,
            if errors == 1 { "" } else { "s" }
        )
    }

    /// Re-expands a cached project's wildcard file list in place.
    fn refresh_file_list(&mut self, id: ProjectId) {
        let Some(project) = self.config_cache.parsed_mut(id) else {
            return;
        };
        let config_dir = project.config_dir().to_path_buf();
        let (file_names, wildcard_directories) =
            expand_input_files(&config_dir, &project.input_specs);
        project.file_names = file_names;
        project.wildcard_directories = wildcard_directories;
    }
}

/// A watch-mode session: filesystem watches wired to the invalidation queue,
/// drained through a debounce timer.
pub struct WatchSession<'a, 'b> {
    builder: &'b mut SolutionBuilder<'a>,
    watcher: &'b mut dyn FileWatcher,
    debounce: Duration,
    deadline: Option<Instant>,
    change_reported: bool,
    config_watches: HashMap<PathBuf, ProjectId>,
    input_watches: HashMap<PathBuf, Vec<ProjectId>>,
    wildcard_watches: Vec<(WildcardDirectory, ProjectId)>,
}

impl<'a, 'b> WatchSession<'a, 'b> {
    /// Creates a session over an existing builder and watcher.
    pub fn new(builder: &'b mut SolutionBuilder<'a>, watcher: &'b mut dyn FileWatcher) -> Self {
        Self {
            builder,
            watcher,
            debounce: REBUILD_DEBOUNCE,
            deadline: None,
            change_reported: false,
            config_watches: HashMap::new(),
            input_watches: HashMap::new(),
            wildcard_watches: Vec::new(),
        }
    }

    /// Overrides the debounce delay (tests use short delays).
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Installs watches for every project in the current build queue: the
    /// configuration file itself, each wildcard directory, and each explicit
    /// input file.
    pub fn install_watches(&mut self) {
        let queue = self
            .builder
            .ensure_graph()
            .unwrap_or_else(|| self.builder.roots.clone());
        for id in queue {
            let config_path = self.builder.registry.config_path(id).to_path_buf();
            self.watch_path(&config_path, false);
            self.config_watches.insert(config_path, id);

            let Some(project) = self
                .builder
                .config_cache
                .parsed(&self.builder.registry, id)
                .cloned()
            else {
                continue;
            };
            for wildcard in &project.wildcard_directories {
                self.watch_path(&wildcard.path, wildcard.recursive);
                self.wildcard_watches.push((wildcard.clone(), id));
            }
            for input in &project.file_names {
                self.watch_path(input, false);
                self.input_watches
                    .entry(input.clone())
                    .or_default()
                    .push(id);
            }
        }
    }

    /// Drops and re-installs every watch, picking up files and directories
    /// added since the last build.
    pub fn refresh_watches(&mut self) {
        for path in self.config_watches.keys() {
            self.watcher.unwatch(path);
        }
        for path in self.input_watches.keys() {
            self.watcher.unwatch(path);
        }
        for (wildcard, _) in &self.wildcard_watches {
            self.watcher.unwatch(&wildcard.path);
        }
        self.config_watches.clear();
        self.input_watches.clear();
        self.wildcard_watches.clear();
        self.install_watches();
    }

    /// Clears the debounce timer and closes all wildcard-directory watches.
    pub fn reset(&mut self) {
        self.deadline = None;
        for (wildcard, _) in &self.wildcard_watches {
            self.watcher.unwatch(&wildcard.path);
        }
        self.wildcard_watches.clear();
    }

    /// Routes one filesystem event into the invalidation queue.
    pub fn handle_event(&mut self, event: &FileEvent) {
        if let Some(&id) = self.config_watches.get(&event.path) {
            self.note_change();
            self.builder.invalidate_project(id, ReloadLevel::Full);
            self.arm();
            return;
        }

        if let Some(ids) = self.input_watches.get(&event.path).cloned() {
            self.note_change();
            for id in ids {
                self.builder.invalidate_project(id, ReloadLevel::None);
            }
            self.arm();
            return;
        }

        // Wildcard-directory events are relevant when they concern the
        // directory itself or a source file that is not one of the project's
        // outputs.
        let watches = self.wildcard_watches.clone();
        let mut any_relevant = false;
        for (wildcard, id) in watches {
            let within = if wildcard.recursive {
                event.path.starts_with(&wildcard.path)
            } else {
                event.path == wildcard.path
                    || event.path.parent() == Some(wildcard.path.as_path())
            };
            if !within {
                continue;
            }
            let relevant = event.path == wildcard.path
                || (has_watchable_extension(&event.path) && {
                    let project = self
                        .builder
                        .config_cache
                        .parsed(&self.builder.registry, id);
                    !project.map_or(false, |p| is_output_file(p, &event.path))
                });
            if relevant {
                any_relevant = true;
                self.builder.invalidate_project(id, ReloadLevel::Partial);
            }
        }
        if any_relevant {
            self.note_change();
            self.arm();
        }
    }

    /// Pumps events and drains the queue until no event arrives within
    /// `idle_timeout` and nothing is pending.
    pub fn run_until_idle(&mut self, idle_timeout: Duration) {
        loop {
            let now = Instant::now();
            let wait = match self.deadline {
                Some(deadline) => {
                    if now >= deadline {
                        self.drain_one();
                        continue;
                    }
                    deadline - now
                }
                None => idle_timeout,
            };
            match self.watcher.poll_timeout(wait) {
                Some(event) => self.handle_event(&event),
                None => {
                    if self.deadline.is_some() {
                        continue;
                    }
                    return;
                }
            }
        }
    }

    /// Runs the watch loop indefinitely.
    pub fn run(&mut self) -> ! {
        loop {
            self.run_until_idle(Duration::from_secs(3600));
        }
    }

    /// Builds one invalidated project, then either re-arms the timer or
    /// emits the watch summary.
    fn drain_one(&mut self) {
        self.builder.build_invalidated_project();
        if self.builder.has_pending() {
            self.deadline = Some(Instant::now() + self.debounce);
        } else {
            self.deadline = None;
            self.change_reported = false;
            let summary = self.builder.watch_summary();
            self.builder.status_reporter.report_status(&summary);
            self.refresh_watches();
        }
    }

    fn arm(&mut self) {
        self.deadline = Some(Instant::now() + self.debounce);
    }

    fn note_change(&mut self) {
        if self.change_reported {
            return;
        }
        self.change_reported = true;
        let clear = if self.builder.options.preserve_watch_output {
            ""
        } else {
            "\x1b[2J\x1b[H"
        };
        self.builder.status_reporter.report_status(&format!(
            "{clear}File change detected. Starting incremental compilation..."
        ));
    }

    fn watch_path(&mut self, path: &Path, recursive: bool) {
        if let Err(e) = self.watcher.watch(path, recursive) {
            self.builder.diag_reporter.report_diagnostic(
                &Diagnostic::warning(WATCH_FAILED, format!("could not watch path: {e}"))
                    .with_file(path),
            );
        }
    }
}

fn has_watchable_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| matches!(ext, "ts" | "tsx" | "json"))
}

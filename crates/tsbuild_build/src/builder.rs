//! The build driver: walks the build queue, compiles or skips per project,
//! and owns every cache of the build session.

use std::collections::HashMap;
use std::ops::{BitOr, BitOrAssign};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tsbuild_common::{
    is_declaration_file, maximum_time, newer, ExitStatus, ProjectId, ProjectRegistry,
};
use tsbuild_config::output_files_for_project;
use tsbuild_diagnostics::{Category, Diagnostic, DiagnosticCode, Reporter, Severity};
use tsbuild_host::BuildHost;

use crate::compiler::{Compiler, ProgramInput};
use crate::config_cache::{resolve_project_name, ConfigCache, ConfigEntry};
use crate::graph::{build_graph, BuildGraph};
use crate::status::{UpToDateInfo, UpToDateStatus};
use crate::watch::PendingQueue;

/// Code for a failure while writing project outputs.
pub const EMIT_FAILED: DiagnosticCode = DiagnosticCode::new(Category::Build, 301);
/// Code for a failed output-timestamp refresh.
pub const TIMESTAMP_UPDATE_FAILED: DiagnosticCode = DiagnosticCode::new(Category::Build, 302);
/// Code for a failure while deleting outputs during clean.
pub const CLEAN_FAILED: DiagnosticCode = DiagnosticCode::new(Category::Build, 303);

/// Options recognized by the build entry points.
#[derive(Clone, Copy, Debug, Default)]
pub struct BuildOptions {
    /// Report what would be built or deleted; perform no writes.
    pub dry: bool,
    /// Treat every project as out of date regardless of the classifier.
    pub force: bool,
    /// Emit per-project status messages and the computed build queue.
    pub verbose: bool,
    /// Suppress screen clearing in the watch status reporter.
    pub preserve_watch_output: bool,
}

/// Bitmask of per-project build outcomes.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct BuildResultFlags(u32);

impl BuildResultFlags {
    /// No flags; a project with nothing to do.
    pub const NONE: Self = Self(0);
    /// The build completed.
    pub const SUCCESS: Self = Self(1 << 0);
    /// Every emitted declaration file byte-matched what was on disk.
    pub const DECLARATION_OUTPUT_UNCHANGED: Self = Self(1 << 1);
    /// The configuration file failed to parse.
    pub const CONFIG_FILE_ERRORS: Self = Self(1 << 2);
    /// Options, config-parsing, or parse diagnostics reported errors.
    pub const SYNTAX_ERRORS: Self = Self(1 << 3);
    /// Type-check diagnostics reported errors.
    pub const TYPE_ERRORS: Self = Self(1 << 4);
    /// Declaration emit (or output writing) reported errors.
    pub const DECLARATION_EMIT_ERRORS: Self = Self(1 << 5);

    /// Returns `true` if all of `other`'s bits are set in `self`.
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Sets the bits of `other`.
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// Clears the bits of `other`.
    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    /// Returns `true` if any error bit is set.
    pub fn any_errors(self) -> bool {
        self.0
            & (Self::CONFIG_FILE_ERRORS.0
                | Self::SYNTAX_ERRORS.0
                | Self::TYPE_ERRORS.0
                | Self::DECLARATION_EMIT_ERRORS.0)
            != 0
    }
}

impl BitOr for BuildResultFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for BuildResultFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// The solution builder: one build session over a set of root projects.
///
/// Owns the config cache, status map, unchanged-outputs map, and pending
/// queue; all mutation happens on the caller's thread. The compiler and the
/// two reporters (compiler diagnostics, solution status) are collaborators
/// supplied by the embedder.
pub struct SolutionBuilder<'a> {
    pub(crate) host: &'a dyn BuildHost,
    pub(crate) compiler: &'a dyn Compiler,
    pub(crate) diag_reporter: &'a dyn Reporter,
    pub(crate) status_reporter: &'a dyn Reporter,
    pub(crate) options: BuildOptions,
    pub(crate) registry: ProjectRegistry,
    pub(crate) config_cache: ConfigCache,
    pub(crate) statuses: HashMap<ProjectId, UpToDateStatus>,
    pub(crate) unchanged_outputs: HashMap<PathBuf, SystemTime>,
    pub(crate) pending: PendingQueue,
    pub(crate) graph: Option<BuildGraph>,
    pub(crate) watch_error_counts: HashMap<ProjectId, usize>,
    pub(crate) roots: Vec<ProjectId>,
    root_resolution_failed: bool,
}

impl<'a> SolutionBuilder<'a> {
    /// Creates a build session over the given root project names.
    ///
    /// Names that resolve to no configuration file are reported and dropped;
    /// the eventual exit status then reflects the failure.
    pub fn new(
        host: &'a dyn BuildHost,
        compiler: &'a dyn Compiler,
        diag_reporter: &'a dyn Reporter,
        status_reporter: &'a dyn Reporter,
        options: BuildOptions,
        root_names: &[&str],
    ) -> Self {
        let registry = ProjectRegistry::new(
            host.current_dir(),
            host.use_case_sensitive_file_names(),
        );
        let mut roots = Vec::new();
        let mut root_resolution_failed = false;
        for name in root_names {
            match resolve_project_name(host, &registry, name) {
                Ok(id) => {
                    if !roots.contains(&id) {
                        roots.push(id);
                    }
                }
                Err(diag) => {
                    diag_reporter.report_diagnostic(&diag);
                    root_resolution_failed = true;
                }
            }
        }
        Self {
            host,
            compiler,
            diag_reporter,
            status_reporter,
            options,
            registry,
            config_cache: ConfigCache::new(),
            statuses: HashMap::new(),
            unchanged_outputs: HashMap::new(),
            pending: PendingQueue::new(),
            graph: None,
            watch_error_counts: HashMap::new(),
            roots,
            root_resolution_failed,
        }
    }

    /// Returns the identifier for a configuration-file path.
    pub fn project_id(&self, config_path: &Path) -> ProjectId {
        self.registry.intern_path(config_path)
    }

    /// Returns the memoized status of a project, if one is cached.
    pub fn cached_status(&self, id: ProjectId) -> Option<&UpToDateStatus> {
        self.statuses.get(&id)
    }

    /// The project registry of this session.
    pub fn registry(&self) -> &ProjectRegistry {
        &self.registry
    }

    /// Builds (or re-uses) the project graph, returning the build queue.
    ///
    /// A failed construction is cached too (its diagnostics were reported);
    /// the reference maps stay available for watch invalidation either way.
    pub(crate) fn ensure_graph(&mut self) -> Option<Vec<ProjectId>> {
        if self.graph.is_none() {
            self.graph = Some(build_graph(
                &self.roots,
                &mut self.config_cache,
                &self.registry,
                self.diag_reporter,
            ));
        }
        self.graph.as_ref().and_then(|g| g.build_queue.clone())
    }

    /// Builds every project in dependency order.
    ///
    /// Projects already up to date are skipped; projects that are up to date
    /// except for upstream declaration timestamps get a timestamp-only
    /// update; everything else is compiled. Failures don't stop the walk, so
    /// one run surfaces every project's errors.
    pub fn build_all(&mut self) -> ExitStatus {
        let Some(queue) = self.ensure_graph() else {
            return ExitStatus::DiagnosticsPresentOutputsSkipped;
        };
        if self.options.verbose {
            let mut message = String::from("Projects in this build:");
            for &id in &queue {
                message.push_str("\n    * ");
                message.push_str(&self.registry.config_path(id).display().to_string());
            }
            self.status_reporter.report_status(&message);
        }

        let mut any_errors = self.root_resolution_failed;
        for id in queue {
            let flags = self.build_one(id);
            any_errors |= flags.any_errors();
        }
        if any_errors {
            ExitStatus::DiagnosticsPresentOutputsSkipped
        } else {
            ExitStatus::Success
        }
    }

    /// Deletes (or, under `dry`, lists) every existing output of every
    /// project in the graph.
    pub fn clean_all(&mut self) -> ExitStatus {
        let Some(queue) = self.ensure_graph() else {
            return ExitStatus::DiagnosticsPresentOutputsSkipped;
        };

        let mut to_delete: Vec<PathBuf> = Vec::new();
        for &id in &queue {
            let Some(project) = self.config_cache.parsed(&self.registry, id).cloned() else {
                continue;
            };
            for output in output_files_for_project(&project) {
                if self.host.file_exists(&output) && !to_delete.contains(&output) {
                    to_delete.push(output);
                }
            }
        }

        if self.options.dry {
            let mut message = String::from("A non-dry clean would delete the following files:");
            for file in &to_delete {
                message.push_str("\n  ");
                message.push_str(&file.display().to_string());
            }
            self.status_reporter.report_status(&message);
            return ExitStatus::Success;
        }

        let mut failed = false;
        for file in &to_delete {
            if let Err(e) = self.host.delete_file(file) {
                self.diag_reporter.report_diagnostic(
                    &Diagnostic::error(CLEAN_FAILED, format!("could not delete output: {e}"))
                        .with_file(file.clone()),
                );
                failed = true;
            }
        }
        self.statuses.clear();
        if failed {
            ExitStatus::DiagnosticsPresentOutputsSkipped
        } else {
            ExitStatus::Success
        }
    }

    /// Classifies one project and takes the action its status calls for.
    pub(crate) fn build_one(&mut self, id: ProjectId) -> BuildResultFlags {
        let status = self.project_status(id);
        let name = self.registry.config_path(id).display().to_string();
        if self.options.verbose {
            self.status_reporter.report_status(&status.explain(&name));
        }
        match status {
            UpToDateStatus::ContainerOnly => {
                self.watch_error_counts.insert(id, 0);
                BuildResultFlags::NONE
            }
            UpToDateStatus::UpstreamBlocked { .. } => BuildResultFlags::NONE,
            UpToDateStatus::UpToDate(_) if !self.options.force => {
                if !self.options.verbose {
                    self.status_reporter
                        .report_status(&format!("Project '{name}' is up to date"));
                }
                self.watch_error_counts.insert(id, 0);
                BuildResultFlags::SUCCESS
            }
            UpToDateStatus::UpToDateWithUpstreamTypes(info) if !self.options.force => {
                if self.options.dry {
                    self.status_reporter.report_status(&format!(
                        "A non-dry build would update timestamps for project '{name}'"
                    ));
                } else {
                    self.update_output_timestamps(id, info);
                }
                self.watch_error_counts.insert(id, 0);
                BuildResultFlags::SUCCESS
            }
            _ => self.build_single_project(id),
        }
    }

    /// Compiles one project through the staged protocol.
    ///
    /// Every early return on failure records an `Unbuildable` status so
    /// downstream projects classify as blocked.
    pub fn build_single_project(&mut self, id: ProjectId) -> BuildResultFlags {
        let name = self.registry.config_path(id).display().to_string();
        if self.options.dry {
            self.status_reporter
                .report_status(&format!("A non-dry build would build project '{name}'"));
            return BuildResultFlags::SUCCESS;
        }
        if self.options.verbose {
            self.status_reporter
                .report_status(&format!("Building project '{name}'..."));
        }

        // A parse failure was already reported when the graph was built;
        // only the status and flags are recorded here.
        let project = match self.config_cache.acquire(&self.registry, id) {
            ConfigEntry::Failed(_) => {
                self.statuses.insert(
                    id,
                    UpToDateStatus::Unbuildable {
                        reason: "config file errors".to_string(),
                    },
                );
                self.watch_error_counts.insert(id, 1);
                return BuildResultFlags::CONFIG_FILE_ERRORS;
            }
            ConfigEntry::Parsed(project) => project.clone(),
        };

        // A project with no inputs aggregates references; nothing to compile.
        if project.file_names.is_empty() {
            self.watch_error_counts.insert(id, 0);
            return BuildResultFlags::NONE;
        }

        let compiler = self.compiler;
        let program = compiler.create_program(ProgramInput {
            config_path: &project.config_path,
            root_names: &project.file_names,
            options: &project.options,
            project_references: &project.references,
            config_diagnostics: &project.diagnostics,
        });

        let mut error_count = 0usize;

        let mut early = Vec::new();
        early.extend(program.options_diagnostics());
        early.extend(program.config_diagnostics());
        early.extend(program.syntactic_diagnostics());
        error_count += self.report_diags(&early);
        if early.iter().any(|d| d.severity == Severity::Error) {
            self.statuses.insert(
                id,
                UpToDateStatus::Unbuildable {
                    reason: "syntax errors".to_string(),
                },
            );
            self.watch_error_counts.insert(id, error_count);
            return BuildResultFlags::SYNTAX_ERRORS;
        }

        if project.options.emit_declarations() {
            let declaration = program.declaration_diagnostics();
            error_count += self.report_diags(&declaration);
            if declaration.iter().any(|d| d.severity == Severity::Error) {
                self.statuses.insert(
                    id,
                    UpToDateStatus::Unbuildable {
                        reason: "declaration file errors".to_string(),
                    },
                );
                self.watch_error_counts.insert(id, error_count);
                return BuildResultFlags::DECLARATION_EMIT_ERRORS;
            }
        }

        let semantic = program.semantic_diagnostics();
        error_count += self.report_diags(&semantic);
        if semantic.iter().any(|d| d.severity == Severity::Error) {
            self.statuses.insert(
                id,
                UpToDateStatus::Unbuildable {
                    reason: "type errors".to_string(),
                },
            );
            self.watch_error_counts.insert(id, error_count);
            return BuildResultFlags::TYPE_ERRORS;
        }

        // Emit. A declaration output whose bytes match what is already on
        // disk keeps its prior modification time in the unchanged-outputs
        // map, enabling the downstream pseudo-up-to-date fast path.
        let mut flags = BuildResultFlags::SUCCESS | BuildResultFlags::DECLARATION_OUTPUT_UNCHANGED;
        let host = self.host;
        let unchanged = &mut self.unchanged_outputs;
        let mut any_declaration_changed = false;
        let mut newest_unchanged: Option<SystemTime> = None;
        let emit_result = program.emit(&mut |path, data| {
            if is_declaration_file(path) {
                let prior_same = host.file_exists(path)
                    && host.read_file(path).map(|prior| prior == data).unwrap_or(false);
                if prior_same {
                    if let Some(time) = host.modified_time(path) {
                        unchanged.insert(path.to_path_buf(), time);
                        newest_unchanged = Some(newest_unchanged.map_or(time, |t| newer(t, time)));
                    }
                } else {
                    any_declaration_changed = true;
                }
            }
            host.write_file(path, data)
        });
        drop(program);

        if let Err(e) = emit_result {
            self.diag_reporter.report_diagnostic(
                &Diagnostic::error(EMIT_FAILED, format!("error writing project outputs: {e}"))
                    .with_file(project.config_path.clone()),
            );
            error_count += 1;
            self.statuses.insert(
                id,
                UpToDateStatus::Unbuildable {
                    reason: "emit errors".to_string(),
                },
            );
            self.watch_error_counts.insert(id, error_count);
            return BuildResultFlags::DECLARATION_EMIT_ERRORS;
        }

        if any_declaration_changed {
            flags.remove(BuildResultFlags::DECLARATION_OUTPUT_UNCHANGED);
        }
        // A changed declaration surface forces downstream projects to
        // rebuild rather than pseudo-build.
        let newest_declaration_change = if any_declaration_changed {
            Some(maximum_time())
        } else {
            newest_unchanged
        };
        self.statuses.insert(
            id,
            UpToDateStatus::UpToDate(UpToDateInfo {
                newest_input: None,
                oldest_output: None,
                newest_output: None,
                newest_declaration_change,
            }),
        );
        self.watch_error_counts.insert(id, error_count);
        flags
    }

    /// Touches every output of a pseudo-up-to-date project instead of
    /// rebuilding it, recording the prior declaration times in the stored
    /// status.
    fn update_output_timestamps(&mut self, id: ProjectId, mut info: UpToDateInfo) {
        let Some(project) = self.config_cache.parsed(&self.registry, id).cloned() else {
            return;
        };
        let name = self.registry.config_path(id).display().to_string();
        if self.options.verbose {
            self.status_reporter
                .report_status(&format!("Updating output timestamps of project '{name}'..."));
        }

        let now = self.host.now();
        let mut prior_newest: Option<SystemTime> = None;
        for output in output_files_for_project(&project) {
            if is_declaration_file(&output) {
                if let Some(time) = self.host.modified_time(&output) {
                    prior_newest = Some(prior_newest.map_or(time, |p| newer(p, time)));
                }
            }
            if let Err(e) = self.host.set_modified_time(&output, now) {
                self.diag_reporter.report_diagnostic(
                    &Diagnostic::warning(
                        TIMESTAMP_UPDATE_FAILED,
                        format!("could not update output timestamp: {e}"),
                    )
                    .with_file(output.clone()),
                );
            }
        }

        if let Some(stamp) = &mut info.oldest_output {
            stamp.time = now;
        }
        if let Some(stamp) = &mut info.newest_output {
            stamp.time = now;
        }
        info.newest_declaration_change = prior_newest;
        self.statuses.insert(id, UpToDateStatus::UpToDate(info));
    }

    fn report_diags(&self, diags: &[Diagnostic]) -> usize {
        for diag in diags {
            self.diag_reporter.report_diagnostic(diag);
        }
        diags
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;
    use tsbuild_host::SystemHost;

    use crate::testutil::{
        set_mtime, write_file, write_project, CollectingReporter, EchoCompiler,
    };

    fn at(seconds: u64) -> std::time::SystemTime {
        std::time::SystemTime::UNIX_EPOCH + Duration::from_secs(seconds)
    }

    struct Fixture {
        host: SystemHost,
        compiler: EchoCompiler,
        reporter: CollectingReporter,
    }

    impl Fixture {
        fn new(tmp: &TempDir) -> Self {
            Self {
                host: SystemHost::with_current_dir(tmp.path()),
                compiler: EchoCompiler::default(),
                reporter: CollectingReporter::default(),
            }
        }

        fn builder(&self, options: BuildOptions, roots: &[&str]) -> SolutionBuilder<'_> {
            SolutionBuilder::new(
                &self.host,
                &self.compiler,
                &self.reporter,
                &self.reporter,
                options,
                roots,
            )
        }

        fn emit_count(&self) -> usize {
            self.compiler.emitted.borrow().len()
        }
    }

    const COMPOSITE: &str = r#"{
        "compilerOptions": { "outDir": "out", "rootDir": "src", "composite": true },
        "files": ["src/a.ts"]
    }"#;

    #[test]
    fn build_writes_outputs_and_stores_status() {
        let tmp = TempDir::new().unwrap();
        write_project(tmp.path(), "app", COMPOSITE);
        write_file(&tmp.path().join("app/src/a.ts"), "export const a = 1;");

        let fx = Fixture::new(&tmp);
        let mut builder = fx.builder(BuildOptions::default(), &["app"]);
        assert_eq!(builder.build_all(), ExitStatus::Success);

        assert!(tmp.path().join("app/out/a.js").is_file());
        assert!(tmp.path().join("app/out/a.d.ts").is_file());
        let id = builder.project_id(&tmp.path().join("app/tsconfig.json"));
        assert!(matches!(
            builder.cached_status(id),
            Some(UpToDateStatus::UpToDate(_))
        ));
    }

    #[test]
    fn second_build_emits_nothing() {
        let tmp = TempDir::new().unwrap();
        write_project(tmp.path(), "app", COMPOSITE);
        write_file(&tmp.path().join("app/src/a.ts"), "export const a = 1;");

        let fx = Fixture::new(&tmp);
        let mut builder = fx.builder(BuildOptions::default(), &["app"]);
        builder.build_all();
        let first = fx.emit_count();

        assert_eq!(builder.build_all(), ExitStatus::Success);
        assert_eq!(fx.emit_count(), first);
        assert!(fx.reporter.has_status_containing("is up to date"));
    }

    #[test]
    fn force_rebuilds_up_to_date_project() {
        let tmp = TempDir::new().unwrap();
        write_project(tmp.path(), "app", COMPOSITE);
        write_file(&tmp.path().join("app/src/a.ts"), "export const a = 1;");

        let fx = Fixture::new(&tmp);
        let mut builder = fx.builder(
            BuildOptions {
                force: true,
                ..Default::default()
            },
            &["app"],
        );
        builder.build_all();
        let first = fx.emit_count();
        builder.build_all();
        assert!(fx.emit_count() > first);
    }

    #[test]
    fn dry_build_performs_no_writes() {
        let tmp = TempDir::new().unwrap();
        write_project(tmp.path(), "app", COMPOSITE);
        write_file(&tmp.path().join("app/src/a.ts"), "export const a = 1;");

        let fx = Fixture::new(&tmp);
        let mut builder = fx.builder(
            BuildOptions {
                dry: true,
                ..Default::default()
            },
            &["app"],
        );
        assert_eq!(builder.build_all(), ExitStatus::Success);
        assert!(!tmp.path().join("app/out").exists());
        assert!(fx
            .reporter
            .has_status_containing("A non-dry build would build project"));
    }

    #[test]
    fn semantic_error_fails_and_blocks_status() {
        let tmp = TempDir::new().unwrap();
        write_project(tmp.path(), "app", COMPOSITE);
        write_file(
            &tmp.path().join("app/src/a.ts"),
            "export const a = 1; // @type-error",
        );

        let fx = Fixture::new(&tmp);
        let mut builder = fx.builder(BuildOptions::default(), &["app"]);
        assert_eq!(
            builder.build_all(),
            ExitStatus::DiagnosticsPresentOutputsSkipped
        );

        let id = builder.project_id(&tmp.path().join("app/tsconfig.json"));
        match builder.cached_status(id) {
            Some(UpToDateStatus::Unbuildable { reason }) => assert_eq!(reason, "type errors"),
            other => panic!("expected Unbuildable, got {other:?}"),
        }
        assert!(!fx.reporter.diags.lock().unwrap().is_empty());
        assert_eq!(fx.emit_count(), 0);
    }

    #[test]
    fn missing_root_name_fails_the_build() {
        let tmp = TempDir::new().unwrap();
        let fx = Fixture::new(&tmp);
        let mut builder = fx.builder(BuildOptions::default(), &["nope"]);
        assert_eq!(
            builder.build_all(),
            ExitStatus::DiagnosticsPresentOutputsSkipped
        );
        let diags = fx.reporter.diags.lock().unwrap();
        assert!(diags.iter().any(|d| d.message == "File 'nope' not found"));
    }

    #[test]
    fn rebuild_with_unchanged_declarations_sets_flag() {
        let tmp = TempDir::new().unwrap();
        write_project(tmp.path(), "app", COMPOSITE);
        let input = tmp.path().join("app/src/a.ts");
        write_file(&input, "export const a = 1;");

        let fx = Fixture::new(&tmp);
        let mut builder = fx.builder(BuildOptions::default(), &["app"]);
        let id = builder.project_id(&tmp.path().join("app/tsconfig.json"));

        // First build: the declaration file did not exist, so it changed.
        let flags = builder.build_one(id);
        assert!(flags.contains(BuildResultFlags::SUCCESS));
        assert!(!flags.contains(BuildResultFlags::DECLARATION_OUTPUT_UNCHANGED));

        // Touch the input (same content) and rebuild: identical declaration
        // bytes keep their prior modification time.
        set_mtime(&input, at(2_000_000_000));
        builder.invalidate_project(id, crate::watch::ReloadLevel::None);
        let decl = tmp.path().join("app/out/a.d.ts");
        let prior = fx.host.modified_time(&decl).unwrap();

        let flags = builder.build_one(id);
        assert!(flags.contains(BuildResultFlags::DECLARATION_OUTPUT_UNCHANGED));
        assert_eq!(builder.unchanged_outputs.get(&decl).copied(), Some(prior));
        match builder.cached_status(id) {
            Some(UpToDateStatus::UpToDate(info)) => {
                let changed = info.newest_declaration_change.unwrap();
                assert!(changed < tsbuild_common::maximum_time());
                assert_eq!(changed, prior);
            }
            other => panic!("expected UpToDate, got {other:?}"),
        }
    }

    #[test]
    fn clean_deletes_existing_outputs() {
        let tmp = TempDir::new().unwrap();
        write_project(tmp.path(), "app", COMPOSITE);
        write_file(&tmp.path().join("app/src/a.ts"), "export const a = 1;");

        let fx = Fixture::new(&tmp);
        let mut builder = fx.builder(BuildOptions::default(), &["app"]);
        builder.build_all();
        assert!(tmp.path().join("app/out/a.js").is_file());

        assert_eq!(builder.clean_all(), ExitStatus::Success);
        assert!(!tmp.path().join("app/out/a.js").exists());
        assert!(!tmp.path().join("app/out/a.d.ts").exists());
    }

    #[test]
    fn dry_clean_lists_but_keeps_outputs() {
        let tmp = TempDir::new().unwrap();
        write_project(tmp.path(), "app", COMPOSITE);
        write_file(&tmp.path().join("app/src/a.ts"), "export const a = 1;");

        let fx = Fixture::new(&tmp);
        let mut builder = fx.builder(BuildOptions::default(), &["app"]);
        builder.build_all();

        let mut dry = fx.builder(
            BuildOptions {
                dry: true,
                ..Default::default()
            },
            &["app"],
        );
        assert_eq!(dry.clean_all(), ExitStatus::Success);
        assert!(tmp.path().join("app/out/a.js").is_file());
        assert!(fx.reporter.has_status_containing("would delete"));
        assert!(fx.reporter.has_status_containing("a.js"));
    }

    #[test]
    fn verbose_reports_build_queue() {
        let tmp = TempDir::new().unwrap();
        write_project(tmp.path(), "app", COMPOSITE);
        write_file(&tmp.path().join("app/src/a.ts"), "export const a = 1;");

        let fx = Fixture::new(&tmp);
        let mut builder = fx.builder(
            BuildOptions {
                verbose: true,
                ..Default::default()
            },
            &["app"],
        );
        builder.build_all();
        assert!(fx.reporter.has_status_containing("Projects in this build:"));
        assert!(fx.reporter.has_status_containing("Building project"));
    }

    #[test]
    fn flags_insert_remove_contains() {
        let mut flags = BuildResultFlags::SUCCESS | BuildResultFlags::DECLARATION_OUTPUT_UNCHANGED;
        assert!(flags.contains(BuildResultFlags::SUCCESS));
        assert!(flags.contains(BuildResultFlags::DECLARATION_OUTPUT_UNCHANGED));
        flags.remove(BuildResultFlags::DECLARATION_OUTPUT_UNCHANGED);
        assert!(!flags.contains(BuildResultFlags::DECLARATION_OUTPUT_UNCHANGED));
        flags.insert(BuildResultFlags::TYPE_ERRORS);
        assert!(flags.any_errors());
    }

    #[test]
    fn flags_none_has_no_errors() {
        assert!(!BuildResultFlags::NONE.any_errors());
        assert!(!BuildResultFlags::SUCCESS.any_errors());
    }

    #[test]
    fn each_error_flag_counts() {
        for flag in [
            BuildResultFlags::CONFIG_FILE_ERRORS,
            BuildResultFlags::SYNTAX_ERRORS,
            BuildResultFlags::TYPE_ERRORS,
            BuildResultFlags::DECLARATION_EMIT_ERRORS,
        ] {
            assert!(flag.any_errors());
            assert!(!(BuildResultFlags::SUCCESS | flag).contains(
                BuildResultFlags::DECLARATION_OUTPUT_UNCHANGED
            ));
        }
    }
}

//! Shared helpers for the end-to-end build scenarios.
//!
//! Provides an on-disk [`Workspace`] fixture, a deterministic
//! [`FakeCompiler`] implementing the compiler capability traits, a
//! [`CollectingReporter`], and a [`ManualWatcher`] that delivers scripted
//! events on a schedule. The scenario suites live under `tests/`.

use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant, SystemTime};

use tempfile::TempDir;
use tsbuild_build::{BuildOptions, Compiler, Program, ProgramInput, SolutionBuilder};
use tsbuild_common::{absolute_path, is_declaration_file};
use tsbuild_config::{
    declaration_output_path, js_output_path, CompilerOptions, ParsedProject, ProjectReference,
};
use tsbuild_diagnostics::{Category, Diagnostic, DiagnosticCode, Reporter};
use tsbuild_host::{BuildHost, FileEvent, FileWatcher, SystemHost, WatchError};

/// Code used by the fake compiler for a missing input file.
pub const FAKE_INPUT_NOT_FOUND: DiagnosticCode = DiagnosticCode::new(Category::Build, 101);
/// Code used by the fake compiler for a `@type-error` marker.
pub const FAKE_TYPE_ERROR: DiagnosticCode = DiagnosticCode::new(Category::Build, 102);
/// Code used by the fake compiler for a `@syntax-error` marker.
pub const FAKE_SYNTAX_ERROR: DiagnosticCode = DiagnosticCode::new(Category::Build, 103);

/// A temporary directory holding one or more project trees.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Creates an empty workspace.
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create workspace tempdir"),
        }
    }

    /// The workspace root.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Returns the absolute path of a workspace-relative file.
    pub fn abs(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    /// Writes a file, creating parent directories.
    pub fn write(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.abs(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
        path
    }

    /// Writes `<name>/tsconfig.json` and returns its path.
    pub fn project(&self, name: &str, config: &str) -> PathBuf {
        self.write(&format!("{name}/tsconfig.json"), config)
    }

    /// Sets a file's modification time.
    pub fn set_mtime(&self, rel: &str, time: SystemTime) {
        let file = std::fs::OpenOptions::new()
            .append(true)
            .open(self.abs(rel))
            .unwrap();
        file.set_modified(time).unwrap();
    }

    /// Reads a file's modification time.
    pub fn mtime(&self, rel: &str) -> SystemTime {
        std::fs::metadata(self.abs(rel)).unwrap().modified().unwrap()
    }

    /// Returns `true` if the workspace-relative path exists.
    pub fn exists(&self, rel: &str) -> bool {
        self.abs(rel).exists()
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

/// The host, compiler, and reporters of one test session.
pub struct TestEnv {
    /// Host rooted at the workspace.
    pub host: SystemHost,
    /// The deterministic compiler.
    pub compiler: FakeCompiler,
    /// Captures every diagnostic and status line.
    pub reporter: CollectingReporter,
}

impl TestEnv {
    /// Creates an environment rooted at `workspace`.
    pub fn new(workspace: &Workspace) -> Self {
        Self {
            host: SystemHost::with_current_dir(workspace.path()),
            compiler: FakeCompiler::default(),
            reporter: CollectingReporter::default(),
        }
    }

    /// Creates a solution builder over this environment.
    pub fn builder(&self, options: BuildOptions, roots: &[&str]) -> SolutionBuilder<'_> {
        SolutionBuilder::new(
            &self.host,
            &self.compiler,
            &self.reporter,
            &self.reporter,
            options,
            roots,
        )
    }

    /// Number of files the compiler has emitted so far.
    pub fn emit_count(&self) -> usize {
        self.compiler.emitted.lock().unwrap().len()
    }

    /// The files the compiler has emitted so far.
    pub fn emitted(&self) -> Vec<PathBuf> {
        self.compiler.emitted.lock().unwrap().clone()
    }
}

/// Captures reported diagnostics and status lines for assertions.
#[derive(Default)]
pub struct CollectingReporter {
    diags: Mutex<Vec<Diagnostic>>,
    statuses: Mutex<Vec<String>>,
}

impl Reporter for CollectingReporter {
    fn report_diagnostic(&self, diag: &Diagnostic) {
        self.diags.lock().unwrap().push(diag.clone());
    }

    fn report_status(&self, message: &str) {
        self.statuses.lock().unwrap().push(message.to_string());
    }
}

impl CollectingReporter {
    /// Snapshot of reported diagnostics.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diags.lock().unwrap().clone()
    }

    /// Snapshot of reported status lines.
    pub fn statuses(&self) -> Vec<String> {
        self.statuses.lock().unwrap().clone()
    }

    /// Returns `true` if any status line contains `needle`.
    pub fn has_status_containing(&self, needle: &str) -> bool {
        self.statuses
            .lock()
            .unwrap()
            .iter()
            .any(|s| s.contains(needle))
    }

    /// Returns `true` if any diagnostic message contains `needle`.
    pub fn has_diagnostic_containing(&self, needle: &str) -> bool {
        self.diags
            .lock()
            .unwrap()
            .iter()
            .any(|d| d.message.contains(needle))
    }
}

/// A deterministic stand-in for the compiler.
///
/// Javascript output is a banner plus the source bytes; declaration output
/// is the source's `export` lines, so the declaration surface is stable
/// under edits that don't change exports. With `outFile` set, all sources
/// concatenate into one bundle. Sources containing `@syntax-error` or
/// `@type-error` produce errors at the corresponding stage, and missing
/// root files produce syntax errors, like a real front end would.
#[derive(Default)]
pub struct FakeCompiler {
    /// Every path handed to the emit callback, in order.
    pub emitted: Mutex<Vec<PathBuf>>,
}

impl Compiler for FakeCompiler {
    fn create_program(&self, input: ProgramInput<'_>) -> Box<dyn Program + '_> {
        Box::new(FakeProgram {
            compiler: self,
            config_dir: input
                .config_path
                .parent()
                .unwrap_or(Path::new("/"))
                .to_path_buf(),
            root_names: input.root_names.to_vec(),
            options: input.options.clone(),
            references: input.project_references.to_vec(),
            config_diagnostics: input.config_diagnostics.to_vec(),
        })
    }
}

struct FakeProgram<'c> {
    compiler: &'c FakeCompiler,
    config_dir: PathBuf,
    root_names: Vec<PathBuf>,
    options: CompilerOptions,
    references: Vec<ProjectReference>,
    config_diagnostics: Vec<Diagnostic>,
}

impl FakeProgram<'_> {
    fn sources_with_marker(&self, marker: &str) -> Vec<PathBuf> {
        self.root_names
            .iter()
            .filter(|f| {
                std::fs::read_to_string(f)
                    .map(|s| s.contains(marker))
                    .unwrap_or(false)
            })
            .cloned()
            .collect()
    }

    fn write(
        &self,
        path: PathBuf,
        content: Vec<u8>,
        write_file: &mut dyn FnMut(&Path, &[u8]) -> io::Result<()>,
    ) -> io::Result<()> {
        self.compiler.emitted.lock().unwrap().push(path.clone());
        write_file(&path, &content)
    }
}

impl Program for FakeProgram<'_> {
    fn options_diagnostics(&self) -> Vec<Diagnostic> {
        Vec::new()
    }

    fn config_diagnostics(&self) -> Vec<Diagnostic> {
        self.config_diagnostics.clone()
    }

    fn syntactic_diagnostics(&self) -> Vec<Diagnostic> {
        let mut diags: Vec<Diagnostic> = self
            .root_names
            .iter()
            .filter(|f| !f.is_file())
            .map(|f| {
                Diagnostic::error(
                    FAKE_INPUT_NOT_FOUND,
                    format!("File '{}' not found", f.display()),
                )
            })
            .collect();
        for file in self.sources_with_marker("@syntax-error") {
            diags.push(Diagnostic::error(FAKE_SYNTAX_ERROR, "unexpected token").with_file(file));
        }
        diags
    }

    fn semantic_diagnostics(&self) -> Vec<Diagnostic> {
        self.sources_with_marker("@type-error")
            .into_iter()
            .map(|file| {
                Diagnostic::error(FAKE_TYPE_ERROR, "expression is not assignable").with_file(file)
            })
            .collect()
    }

    fn declaration_diagnostics(&self) -> Vec<Diagnostic> {
        Vec::new()
    }

    fn emit(
        &self,
        write_file: &mut dyn FnMut(&Path, &[u8]) -> io::Result<()>,
    ) -> io::Result<()> {
        if self.options.no_emit {
            return Ok(());
        }

        if let Some(bundle) = self.options.bundle_out() {
            let bundle = absolute_path(&self.config_dir, bundle);
            let mut js = b"// bundle\n".to_vec();
            let mut decl = Vec::new();
            // Prepended upstream bundles contribute their bytes first.
            for reference in &self.references {
                if !reference.prepend {
                    continue;
                }
                let upstream_dir = reference.path.parent().unwrap_or(Path::new("/"));
                js.extend_from_slice(format!("// prepend {}\n", upstream_dir.display()).as_bytes());
            }
            for input in &self.root_names {
                if is_declaration_file(input) {
                    continue;
                }
                let source = std::fs::read(input)?;
                js.extend_from_slice(&source);
                decl.extend_from_slice(&declaration_surface(&source));
            }
            self.write(bundle.clone(), js, write_file)?;
            if self.options.emit_declarations() {
                let decl_path = bundle.with_extension("d.ts");
                self.write(decl_path, decl, write_file)?;
            }
            return Ok(());
        }

        for input in &self.root_names {
            if is_declaration_file(input) {
                continue;
            }
            let source = std::fs::read(input)?;
            let js = js_output_path(input, &self.config_dir, &self.options);
            let mut content = b"// compiled\n".to_vec();
            content.extend_from_slice(&source);
            self.write(js, content, write_file)?;

            if self.options.emit_declarations() {
                let decl = declaration_output_path(input, &self.config_dir, &self.options);
                self.write(decl, declaration_surface(&source), write_file)?;
            }
        }
        Ok(())
    }
}

/// Extracts a source's export surface, the fake declaration output.
pub fn declaration_surface(source: &[u8]) -> Vec<u8> {
    let text = String::from_utf8_lossy(source);
    let mut out = String::new();
    for line in text.lines() {
        if line.trim_start().starts_with("export") {
            out.push_str("declare ");
            out.push_str(line.trim());
            out.push('\n');
        }
    }
    out.into_bytes()
}

/// A watcher fed by the test itself, delivering events at scheduled times.
pub struct ManualWatcher {
    scheduled: VecDeque<(Instant, FileEvent)>,
    /// Every currently watched path with its recursive flag.
    pub watched: Vec<(PathBuf, bool)>,
}

impl ManualWatcher {
    /// Creates a watcher with no scheduled events.
    pub fn new() -> Self {
        Self {
            scheduled: VecDeque::new(),
            watched: Vec::new(),
        }
    }

    /// Schedules an event for immediate delivery.
    pub fn push(&mut self, event: FileEvent) {
        self.push_after(Duration::ZERO, event);
    }

    /// Schedules an event `delay` from now.
    pub fn push_after(&mut self, delay: Duration, event: FileEvent) {
        self.scheduled.push_back((Instant::now() + delay, event));
    }

    /// Returns `true` if `path` is currently watched.
    pub fn is_watching(&self, path: &Path) -> bool {
        self.watched.iter().any(|(p, _)| p == path)
    }
}

impl Default for ManualWatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl FileWatcher for ManualWatcher {
    fn watch(&mut self, path: &Path, recursive: bool) -> Result<(), WatchError> {
        self.watched.push((path.to_path_buf(), recursive));
        Ok(())
    }

    fn unwatch(&mut self, path: &Path) {
        self.watched.retain(|(p, _)| p != path);
    }

    fn poll_timeout(&mut self, timeout: Duration) -> Option<FileEvent> {
        let deadline = Instant::now() + timeout;
        loop {
            let now = Instant::now();
            if let Some(pos) = self
                .scheduled
                .iter()
                .position(|(due, _)| *due <= now)
            {
                return self.scheduled.remove(pos).map(|(_, event)| event);
            }
            if now >= deadline {
                return None;
            }
            let next_due = self.scheduled.iter().map(|(due, _)| *due).min();
            let wake = next_due.map_or(deadline, |d| d.min(deadline));
            std::thread::sleep((wake - now).min(Duration::from_millis(5)));
        }
    }
}

/// Drains the whole pending queue without debounce, for non-watch tests.
pub fn drain_pending(builder: &mut SolutionBuilder<'_>) {
    while builder.build_invalidated_project().is_some() {}
}

/// Asserts that a parsed project enumerates at least one output.
pub fn assert_has_outputs(project: &ParsedProject) {
    assert!(
        !tsbuild_config::output_files_for_project(project).is_empty(),
        "expected outputs for {}",
        project.config_path.display()
    );
}

/// Reads a host file as a UTF-8 string.
pub fn read_to_string(host: &SystemHost, path: &Path) -> String {
    String::from_utf8(host.read_file(path).unwrap()).unwrap()
}

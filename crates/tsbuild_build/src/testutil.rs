//! Shared helpers for this crate's tests: reporters, a small echo compiler,
//! and on-disk project fixtures.

use std::cell::RefCell;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::SystemTime;

use tsbuild_common::is_declaration_file;
use tsbuild_config::{declaration_output_path, js_output_path, CompilerOptions};
use tsbuild_diagnostics::{Category, Diagnostic, DiagnosticCode, Reporter};

use crate::compiler::{Compiler, Program, ProgramInput};

pub(crate) const INPUT_NOT_FOUND: DiagnosticCode = DiagnosticCode::new(Category::Build, 101);
pub(crate) const TYPE_ERROR: DiagnosticCode = DiagnosticCode::new(Category::Build, 102);

/// Discards everything.
pub(crate) struct NullReporter;

impl Reporter for NullReporter {
    fn report_diagnostic(&self, _diag: &Diagnostic) {}
    fn report_status(&self, _message: &str) {}
}

/// Captures reported diagnostics and status lines for assertions.
#[derive(Default)]
pub(crate) struct CollectingReporter {
    pub diags: Mutex<Vec<Diagnostic>>,
    pub statuses: Mutex<Vec<String>>,
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
    pub(crate) fn has_status_containing(&self, needle: &str) -> bool {
        self.statuses
            .lock()
            .unwrap()
            .iter()
            .any(|s| s.contains(needle))
    }
}

/// A toy compiler: javascript output is a banner plus the source, the
/// declaration output is the source's `export` lines. Declaration bytes are
/// therefore stable under edits that don't touch the export surface.
///
/// Missing root files become syntax errors; a source containing the marker
/// `@type-error` becomes a semantic error. Every emitted path is logged.
#[derive(Default)]
pub(crate) struct EchoCompiler {
    pub emitted: RefCell<Vec<PathBuf>>,
}

impl Compiler for EchoCompiler {
    fn create_program(&self, input: ProgramInput<'_>) -> Box<dyn Program + '_> {
        Box::new(EchoProgram {
            compiler: self,
            config_dir: input
                .config_path
                .parent()
                .unwrap_or(Path::new("/"))
                .to_path_buf(),
            root_names: input.root_names.to_vec(),
            options: input.options.clone(),
            config_diagnostics: input.config_diagnostics.to_vec(),
        })
    }
}

pub(crate) struct EchoProgram<'c> {
    compiler: &'c EchoCompiler,
    config_dir: PathBuf,
    root_names: Vec<PathBuf>,
    options: CompilerOptions,
    config_diagnostics: Vec<Diagnostic>,
}

impl Program for EchoProgram<'_> {
    fn options_diagnostics(&self) -> Vec<Diagnostic> {
        Vec::new()
    }

    fn config_diagnostics(&self) -> Vec<Diagnostic> {
        self.config_diagnostics.clone()
    }

    fn syntactic_diagnostics(&self) -> Vec<Diagnostic> {
        self.root_names
            .iter()
            .filter(|f| !f.is_file())
            .map(|f| {
                Diagnostic::error(INPUT_NOT_FOUND, format!("File '{}' not found", f.display()))
            })
            .collect()
    }

    fn semantic_diagnostics(&self) -> Vec<Diagnostic> {
        let mut diags = Vec::new();
        for file in &self.root_names {
            let Ok(source) = std::fs::read_to_string(file) else {
                continue;
            };
            if source.contains("@type-error") {
                diags.push(
                    Diagnostic::error(TYPE_ERROR, "expression is not assignable")
                        .with_file(file.clone()),
                );
            }
        }
        diags
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
        for input in &self.root_names {
            if is_declaration_file(input) {
                continue;
            }
            let source = std::fs::read(input)?;
            let js = js_output_path(input, &self.config_dir, &self.options);
            let mut content = b"// compiled\n".to_vec();
            content.extend_from_slice(&source);
            self.compiler.emitted.borrow_mut().push(js.clone());
            write_file(&js, &content)?;

            if self.options.emit_declarations() {
                let decl = declaration_output_path(input, &self.config_dir, &self.options);
                let decl_content = declaration_bytes(&source);
                self.compiler.emitted.borrow_mut().push(decl.clone());
                write_file(&decl, &decl_content)?;
            }
        }
        Ok(())
    }
}

/// Extracts the export surface of a source file.
pub(crate) fn declaration_bytes(source: &[u8]) -> Vec<u8> {
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

/// Writes a file, creating parent directories.
pub(crate) fn write_file(path: &Path, content: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

/// Writes `<dir>/<name>/tsconfig.json` with the given content and returns
/// the configuration path.
pub(crate) fn write_project(dir: &Path, name: &str, config: &str) -> PathBuf {
    let config_path = dir.join(name).join("tsconfig.json");
    write_file(&config_path, config);
    config_path
}

/// Sets a file's modification time.
pub(crate) fn set_mtime(path: &Path, time: SystemTime) {
    let file = std::fs::OpenOptions::new()
        .append(true)
        .open(path)
        .unwrap();
    file.set_modified(time).unwrap();
}

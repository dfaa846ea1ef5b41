//! The compiler capability surface consumed by the build driver.
//!
//! The solution builder never inspects source text; it hands a project's
//! inputs to a [`Compiler`], queries the resulting [`Program`] for staged
//! diagnostics, and drives emit through a write callback so it can observe
//! declaration-output stability before bytes reach disk.

use std::io;
use std::path::{Path, PathBuf};

use tsbuild_config::{CompilerOptions, ProjectReference};
use tsbuild_diagnostics::Diagnostic;

/// Everything the compiler needs to create a program for one project.
pub struct ProgramInput<'a> {
    /// Absolute path of the project's configuration file, the base for
    /// output-path resolution.
    pub config_path: &'a Path,
    /// Absolute input file names, in configuration order.
    pub root_names: &'a [PathBuf],
    /// The project's compiler options.
    pub options: &'a CompilerOptions,
    /// The project's resolved references.
    pub project_references: &'a [ProjectReference],
    /// Non-fatal diagnostics carried over from configuration parsing.
    pub config_diagnostics: &'a [Diagnostic],
}

/// A compiler that can create [`Program`]s.
pub trait Compiler {
    /// Creates a program over the given inputs.
    fn create_program(&self, input: ProgramInput<'_>) -> Box<dyn Program + '_>;
}

/// One compilation of one project, queried stage by stage.
///
/// The driver asks for diagnostics in the order options → config → syntax →
/// declaration → semantic, aborting the project at the first stage that
/// reports an error, and only then emits.
pub trait Program {
    /// Diagnostics about the compiler options themselves.
    fn options_diagnostics(&self) -> Vec<Diagnostic>;

    /// Diagnostics carried over from configuration parsing.
    fn config_diagnostics(&self) -> Vec<Diagnostic>;

    /// Parse-stage diagnostics.
    fn syntactic_diagnostics(&self) -> Vec<Diagnostic>;

    /// Type-check diagnostics.
    fn semantic_diagnostics(&self) -> Vec<Diagnostic>;

    /// Diagnostics specific to declaration-file emit.
    fn declaration_diagnostics(&self) -> Vec<Diagnostic>;

    /// Emits every output file through `write_file`.
    ///
    /// The callback receives the absolute output path and the full file
    /// bytes; the driver owns the actual write so it can compare declaration
    /// bytes against what is already on disk.
    fn emit(
        &self,
        write_file: &mut dyn FnMut(&Path, &[u8]) -> io::Result<()>,
    ) -> io::Result<()>;
}

//! The loader's output: a fully resolved view of one project.

use std::path::{Path, PathBuf};

use tsbuild_diagnostics::Diagnostic;

use crate::types::CompilerOptions;

/// A parsed, path-resolved project configuration.
///
/// All paths are absolute: input files, reference targets, and wildcard
/// directories have been resolved against the configuration directory.
#[derive(Debug, Clone)]
pub struct ParsedProject {
    /// Absolute path of the configuration file this project was read from.
    pub config_path: PathBuf,
    /// Absolute input file names, explicit files first, then expanded
    /// wildcard matches in sorted order.
    pub file_names: Vec<PathBuf>,
    /// The raw `files`/`include` specs, kept so a partial reload can
    /// re-expand the file list without re-parsing the configuration.
    pub input_specs: InputSpecs,
    /// The interpreted compiler options.
    pub options: CompilerOptions,
    /// Resolved project references, in declaration order.
    pub references: Vec<ProjectReference>,
    /// Directories watched for wildcard-matched inputs.
    pub wildcard_directories: Vec<WildcardDirectory>,
    /// Non-fatal diagnostics produced while parsing this configuration.
    pub diagnostics: Vec<Diagnostic>,
}

impl ParsedProject {
    /// Returns the directory containing the configuration file.
    pub fn config_dir(&self) -> &Path {
        self.config_path.parent().unwrap_or(Path::new("/"))
    }

    /// Returns `true` if any reference carries the `prepend` flag.
    pub fn uses_prepend(&self) -> bool {
        self.references.iter().any(|r| r.prepend)
    }
}

/// The raw input-file specification of a configuration, as written.
#[derive(Debug, Clone, Default)]
pub struct InputSpecs {
    /// Explicit input files, relative to the configuration directory.
    pub files: Option<Vec<String>>,
    /// Wildcard include patterns, relative to the configuration directory.
    pub include: Option<Vec<String>>,
}

/// A resolved reference to an upstream project.
#[derive(Debug, Clone)]
pub struct ProjectReference {
    /// Absolute path of the upstream configuration file.
    pub path: PathBuf,
    /// Concatenate the upstream bundle's bytes into this project's bundle.
    pub prepend: bool,
    /// This edge is intentionally circular and must not trip cycle detection.
    pub circular: bool,
}

/// A directory watched for wildcard-matched input files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WildcardDirectory {
    /// Absolute directory path.
    pub path: PathBuf,
    /// Whether subdirectories are included.
    pub recursive: bool,
}

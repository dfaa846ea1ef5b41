//! Configuration file loading, validation, and input-file expansion.

use std::path::{Path, PathBuf};

use tsbuild_common::{absolute_path, is_source_file};
use tsbuild_diagnostics::{Category, Diagnostic, DiagnosticCode};

use crate::error::ConfigError;
use crate::parsed::{InputSpecs, ParsedProject, ProjectReference, WildcardDirectory};
use crate::types::ConfigFile;

/// Code for a configuration file that could not be read.
pub const CONFIG_READ_FAILED: DiagnosticCode = DiagnosticCode::new(Category::Config, 101);
/// Code for a configuration file that could not be parsed as JSON.
pub const CONFIG_PARSE_FAILED: DiagnosticCode = DiagnosticCode::new(Category::Config, 102);

/// Parses a `tsconfig.json` document from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn parse_config_from_str(content: &str) -> Result<ConfigFile, ConfigError> {
    serde_json::from_str(content).map_err(|e| ConfigError::Parse {
        reason: e.to_string(),
    })
}

/// Loads a project from its configuration file.
///
/// `config_path` must be absolute. On success returns a fully path-resolved
/// [`ParsedProject`]; on failure returns the single unrecoverable diagnostic
/// that callers cache for the project.
pub fn load_project(config_path: &Path) -> Result<ParsedProject, Diagnostic> {
    let content = std::fs::read_to_string(config_path).map_err(|e| {
        Diagnostic::error(
            CONFIG_READ_FAILED,
            format!("failed to read configuration: {e}"),
        )
        .with_file(config_path)
    })?;

    let config = parse_config_from_str(&content).map_err(|e| {
        Diagnostic::error(CONFIG_PARSE_FAILED, e.to_string()).with_file(config_path)
    })?;

    let config_dir = config_path.parent().unwrap_or(Path::new("/"));
    let input_specs = InputSpecs {
        files: config.files.clone(),
        include: config.include.clone(),
    };
    let (file_names, wildcard_directories) = expand_input_files(config_dir, &input_specs);

    let references = config
        .references
        .iter()
        .map(|r| ProjectReference {
            path: resolve_reference_path(config_dir, &r.path),
            prepend: r.prepend,
            circular: r.circular,
        })
        .collect();

    Ok(ParsedProject {
        config_path: config_path.to_path_buf(),
        file_names,
        input_specs,
        options: config.compiler_options,
        references,
        wildcard_directories,
        diagnostics: Vec::new(),
    })
}

/// Resolves a reference's `path` to the upstream configuration file.
///
/// A path without a `.json` extension names a project directory and resolves
/// to `<path>/tsconfig.json`.
pub fn resolve_reference_path(config_dir: &Path, raw: &str) -> PathBuf {
    let resolved = absolute_path(config_dir, raw);
    if resolved.extension().and_then(|e| e.to_str()) == Some("json") {
        resolved
    } else {
        resolved.join("tsconfig.json")
    }
}

/// Expands the `files` list and `include` patterns into absolute input file
/// names, plus the wildcard directories the watcher must observe.
///
/// Explicit files keep their declared order; wildcard matches follow in
/// sorted order with duplicates removed. Re-invoked on a `Partial` reload to
/// refresh a cached project's file list without re-parsing.
pub fn expand_input_files(
    config_dir: &Path,
    specs: &InputSpecs,
) -> (Vec<PathBuf>, Vec<WildcardDirectory>) {
    let mut file_names: Vec<PathBuf> = Vec::new();

    if let Some(files) = &specs.files {
        for f in files {
            file_names.push(absolute_path(config_dir, f));
        }
    }

    let mut wildcard_directories: Vec<WildcardDirectory> = Vec::new();
    if let Some(include) = &specs.include {
        let mut matched: Vec<PathBuf> = Vec::new();
        for pattern in include {
            let (base, recursive, is_literal) = split_pattern(config_dir, pattern);
            if is_literal && base.is_file() {
                matched.push(base);
                continue;
            }
            let spec = WildcardDirectory {
                path: base.clone(),
                recursive,
            };
            if !wildcard_directories.contains(&spec) {
                wildcard_directories.push(spec);
            }
            collect_sources(&base, recursive, &mut matched);
        }
        matched.sort();
        matched.dedup();
        for m in matched {
            if !file_names.contains(&m) {
                file_names.push(m);
            }
        }
    }

    (file_names, wildcard_directories)
}

/// Splits an include pattern into its literal base directory, whether the
/// match is recursive, and whether the pattern had no wildcard at all.
fn split_pattern(config_dir: &Path, pattern: &str) -> (PathBuf, bool, bool) {
    let mut literal = Vec::new();
    let mut saw_wildcard = false;
    for seg in pattern.split('/') {
        if seg.contains('*') || seg.contains('?') {
            saw_wildcard = true;
            break;
        }
        literal.push(seg);
    }
    let base = absolute_path(config_dir, &literal.join("/"));
    // A bare directory name includes its whole subtree.
    let recursive = pattern.contains("**") || !saw_wildcard;
    (base, recursive, !saw_wildcard)
}

/// Collects source files (`.ts`/`.tsx`, including declarations) under `dir`.
fn collect_sources(dir: &Path, recursive: bool, out: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            if recursive {
                collect_sources(&path, true, out);
            }
        } else if is_source_file(&path) {
            out.push(path);
        }
    }
}

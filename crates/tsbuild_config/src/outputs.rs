//! Expected-output derivation for a parsed project.
//!
//! [`output_files_for_project`] is a pure function of the parsed
//! configuration: it never touches the filesystem. Both the up-to-date
//! classifier and the cleaner rely on that purity.

use std::path::{Path, PathBuf};

use tsbuild_common::{absolute_path, change_extension, is_declaration_file, is_source_file};

use crate::parsed::ParsedProject;
use crate::types::{CompilerOptions, Jsx};

/// Enumerates every output file the project is expected to produce.
///
/// With a bundle output (`outFile`/`out`) the set is the bundle, its source
/// map, and its declaration twin (plus declaration map). Otherwise each
/// non-declaration input contributes its javascript output (plus map) and,
/// when declarations are emitted, its declaration output (plus map).
/// `noEmit` suppresses everything. An empty result marks a container
/// project.
pub fn output_files_for_project(project: &ParsedProject) -> Vec<PathBuf> {
    let options = &project.options;
    if options.no_emit {
        return Vec::new();
    }
    let config_dir = project.config_dir();

    if let Some(bundle) = options.bundle_out() {
        let bundle = absolute_path(config_dir, bundle);
        let mut outputs = vec![bundle.clone()];
        if options.source_map {
            outputs.push(append_extension(&bundle, "map"));
        }
        if options.emit_declarations() {
            let decl = change_extension(&bundle, "d.ts");
            if options.declaration_map {
                outputs.push(append_extension(&decl, "map"));
            }
            outputs.push(decl);
        }
        return outputs;
    }

    let mut outputs = Vec::new();
    for input in &project.file_names {
        if is_declaration_file(input) {
            continue;
        }
        let js = js_output_path(input, config_dir, options);
        if js != *input {
            if options.source_map && !is_json(input) {
                outputs.push(append_extension(&js, "map"));
            }
            outputs.push(js);
        }
        if options.emit_declarations() && !is_json(input) {
            let decl = declaration_output_path(input, config_dir, options);
            if options.declaration_map {
                outputs.push(append_extension(&decl, "map"));
            }
            outputs.push(decl);
        }
    }
    outputs
}

/// Derives the javascript output path for one input file.
///
/// The input's path relative to `rootDir` (default: the configuration
/// directory) is re-rooted under `outDir` (default: the configuration
/// directory). `.json` keeps its extension, `.tsx` under `jsx: "preserve"`
/// becomes `.jsx`, everything else becomes `.js`.
pub fn js_output_path(input: &Path, config_dir: &Path, options: &CompilerOptions) -> PathBuf {
    let base = options
        .out_dir
        .as_deref()
        .map(|d| absolute_path(config_dir, d))
        .unwrap_or_else(|| config_dir.to_path_buf());
    let rerooted = reroot(input, config_dir, options, &base);

    let ext = match input.extension().and_then(|e| e.to_str()) {
        Some("json") => "json",
        Some("tsx") if options.jsx == Some(Jsx::Preserve) => "jsx",
        _ => "js",
    };
    change_extension(&rerooted, ext)
}

/// Derives the declaration output path for one input file.
///
/// Same re-rooting as [`js_output_path`], but the base directory is
/// `declarationDir`, falling back to `outDir`, falling back to the
/// configuration directory, and the extension becomes `.d.ts`.
pub fn declaration_output_path(
    input: &Path,
    config_dir: &Path,
    options: &CompilerOptions,
) -> PathBuf {
    let base = options
        .declaration_dir
        .as_deref()
        .or(options.out_dir.as_deref())
        .map(|d| absolute_path(config_dir, d))
        .unwrap_or_else(|| config_dir.to_path_buf());
    let rerooted = reroot(input, config_dir, options, &base);
    change_extension(&rerooted, "d.ts")
}

/// Decides whether `path` is an output of the project, for watch-event
/// filtering.
///
/// A path counts as an output when it is the bundle output or its
/// declaration twin, lies inside `declarationDir` or `outDir`, or is neither
/// an input of the project nor a non-declaration TypeScript source.
pub fn is_output_file(project: &ParsedProject, path: &Path) -> bool {
    let options = &project.options;
    let config_dir = project.config_dir();

    if let Some(bundle) = options.bundle_out() {
        let bundle = absolute_path(config_dir, bundle);
        if path == bundle || path == change_extension(&bundle, "d.ts") {
            return true;
        }
    }
    if let Some(dir) = options.declaration_dir.as_deref() {
        if path.starts_with(absolute_path(config_dir, dir)) {
            return true;
        }
    }
    if let Some(dir) = options.out_dir.as_deref() {
        if path.starts_with(absolute_path(config_dir, dir)) {
            return true;
        }
    }
    !project.file_names.iter().any(|f| f == path)
        && !(is_source_file(path) && !is_declaration_file(path))
}

/// Re-roots `input` from `rootDir` (default: the configuration directory)
/// under `base`. An input outside the root keeps only its file name.
fn reroot(input: &Path, config_dir: &Path, options: &CompilerOptions, base: &Path) -> PathBuf {
    let root = options
        .root_dir
        .as_deref()
        .map(|d| absolute_path(config_dir, d))
        .unwrap_or_else(|| config_dir.to_path_buf());
    match input.strip_prefix(&root) {
        Ok(rel) => base.join(rel),
        Err(_) => base.join(input.file_name().unwrap_or_default()),
    }
}

/// Appends `ext` after the existing extension: `a.js` + `map` = `a.js.map`.
fn append_extension(path: &Path, ext: &str) -> PathBuf {
    let mut s = path.as_os_str().to_os_string();
    s.push(".");
    s.push(ext);
    PathBuf::from(s)
}

fn is_json(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("json")
}

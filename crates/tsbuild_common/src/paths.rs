//! Lexical path normalization and source-file extension helpers.
//!
//! Canonical project identifiers are produced here: a path is resolved
//! against the host's current directory, `.`/`..` segments are folded away,
//! separators are normalized to `/`, and the result is case-folded when the
//! host filesystem is case-insensitive. Normalization is purely lexical; a
//! path to an absent file is not an error at this layer.

use std::path::{Component, Path, PathBuf};

/// Canonicalizes a file name against `cwd`, yielding a project identifier key.
///
/// The result uses `/` separators and is lowercased when `case_sensitive` is
/// false. Two names normalize to the same string iff they refer to the same
/// file on the host (modulo symlinks, which are intentionally not resolved).
pub fn normalize_path(cwd: &Path, name: &str, case_sensitive: bool) -> String {
    let absolute = absolute_path(cwd, name);
    let mut prefix = String::new();
    let mut parts: Vec<String> = Vec::new();
    for comp in absolute.components() {
        match comp {
            Component::Prefix(p) => {
                prefix = p.as_os_str().to_string_lossy().replace('\\', "/");
            }
            Component::RootDir | Component::CurDir => {}
            Component::ParentDir => {
                parts.pop();
            }
            Component::Normal(s) => parts.push(s.to_string_lossy().into_owned()),
        }
    }
    let mut out = format!("{}/{}", prefix, parts.join("/"));
    if !case_sensitive {
        out = out.to_lowercase();
    }
    out
}

/// Resolves `name` against `cwd` and folds `.`/`..` segments, preserving the
/// original casing and native separators.
///
/// Used for paths handed back to the filesystem, where the real spelling
/// matters; [`normalize_path`] builds the map key.
pub fn absolute_path(cwd: &Path, name: &str) -> PathBuf {
    let raw = Path::new(name);
    let joined = if raw.is_absolute() {
        raw.to_path_buf()
    } else {
        cwd.join(raw)
    };
    let mut out = PathBuf::new();
    for comp in joined.components() {
        match comp {
            Component::Prefix(p) => out.push(p.as_os_str()),
            Component::RootDir => out.push(Component::RootDir.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(s) => out.push(s),
        }
    }
    out
}

/// Returns `true` if `path` is a declaration file (`.d.ts`).
pub fn is_declaration_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(".d.ts"))
}

/// Returns `true` if `path` has a TypeScript source extension (`.ts` or
/// `.tsx`, including declaration files).
pub fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| matches!(ext, "ts" | "tsx"))
}

/// Replaces the final extension of `path` with `ext` (no leading dot).
///
/// `a.ts` with `"js"` yields `a.js`; `bundle.js` with `"d.ts"` yields
/// `bundle.d.ts`.
pub fn change_extension(path: &Path, ext: &str) -> PathBuf {
    path.with_extension(ext)
}

//! Configuration types deserialized from `tsconfig.json`.

use serde::Deserialize;

/// The raw shape of a `tsconfig.json` document.
///
/// Fields not recognized by the solution builder are ignored; the underlying
/// compiler consumes the full option set separately.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigFile {
    /// Compiler options relevant to output derivation and emit.
    pub compiler_options: CompilerOptions,
    /// Explicit input files, relative to the configuration directory.
    pub files: Option<Vec<String>>,
    /// Wildcard include patterns, relative to the configuration directory.
    pub include: Option<Vec<String>>,
    /// References to upstream projects, in declaration order.
    pub references: Vec<ReferenceSpec>,
}

/// The subset of compiler options the solution builder interprets.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompilerOptions {
    /// Bundle all outputs into a single file.
    pub out_file: Option<String>,
    /// Legacy alias for [`out_file`](Self::out_file).
    pub out: Option<String>,
    /// Directory for javascript outputs.
    pub out_dir: Option<String>,
    /// Directory for declaration outputs; falls back to `outDir`.
    pub declaration_dir: Option<String>,
    /// Root from which input-relative output paths are computed; falls back
    /// to the configuration directory.
    pub root_dir: Option<String>,
    /// Emit `.map` files next to javascript outputs.
    pub source_map: bool,
    /// Emit `.map` files next to declaration outputs.
    pub declaration_map: bool,
    /// Emit declaration files.
    pub declaration: bool,
    /// The project is a composite project (implies declaration emit).
    pub composite: bool,
    /// JSX handling mode.
    pub jsx: Option<Jsx>,
    /// Suppress all outputs.
    pub no_emit: bool,
}

impl CompilerOptions {
    /// Returns `true` if this project emits declaration files.
    pub fn emit_declarations(&self) -> bool {
        self.declaration || self.composite
    }

    /// Returns the bundle output path (`outFile`, or the legacy `out`), if set.
    pub fn bundle_out(&self) -> Option<&str> {
        self.out_file.as_deref().or(self.out.as_deref())
    }
}

/// JSX handling mode; only preservation affects output file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Jsx {
    /// Keep JSX as-is; `.tsx` inputs produce `.jsx` outputs.
    Preserve,
    /// Lower JSX to factory calls; `.tsx` inputs produce `.js` outputs.
    React,
    /// Lower JSX for a native host; `.tsx` inputs produce `.js` outputs.
    ReactNative,
}

/// A single project-reference entry as written in configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceSpec {
    /// Path to the referenced project's configuration file or directory.
    pub path: String,
    /// Concatenate the upstream bundle's bytes into this project's bundle.
    #[serde(default)]
    pub prepend: bool,
    /// This edge is intentionally circular and must not trip cycle detection.
    #[serde(default)]
    pub circular: bool,
}

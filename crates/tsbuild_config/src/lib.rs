//! Configuration parsing and output-file derivation for the solution builder.
//!
//! A project is described by a `tsconfig.json` document. This crate owns the
//! serde data model for that document, the loader that turns it into a
//! [`ParsedProject`] (absolute input files, resolved project references,
//! wildcard-directory specs), and the pure derivation of a project's
//! expected output files.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod outputs;
pub mod parsed;
pub mod types;

pub use error::ConfigError;
pub use loader::{expand_input_files, load_project, parse_config_from_str, resolve_reference_path};
pub use outputs::{
    declaration_output_path, is_output_file, js_output_path, output_files_for_project,
};
pub use parsed::{InputSpecs, ParsedProject, ProjectReference, WildcardDirectory};
pub use types::{CompilerOptions, ConfigFile, Jsx, ReferenceSpec};

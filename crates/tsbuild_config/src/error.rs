//! Error types for configuration loading and validation.

use std::path::PathBuf;

/// Errors that can occur when loading or validating a project configuration.
///
/// These are internal to the loader; at the cache boundary a failure is
/// flattened into one unrecoverable
/// [`Diagnostic`](tsbuild_diagnostics::Diagnostic) stored for the project.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An I/O error occurred while reading the configuration file.
    #[error("failed to read configuration {path}: {source}")]
    Io {
        /// The configuration file path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The JSON content could not be parsed.
    #[error("failed to parse configuration: {reason}")]
    Parse {
        /// Description of the parse failure.
        reason: String,
    },

    /// A configuration value failed validation.
    #[error("invalid configuration: {reason}")]
    Validation {
        /// Description of the validation failure.
        reason: String,
    },
}

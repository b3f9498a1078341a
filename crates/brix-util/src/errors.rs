use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for all brix operations.
#[derive(Debug, Error, Diagnostic)]
pub enum BrixError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or malformed manifest (e.g. brix.toml).
    #[error("Manifest error: {message}")]
    #[diagnostic(help("Check your brix.toml for syntax errors or missing fields"))]
    Manifest { message: String },

    /// Dependency resolution failed (version conflicts, missing packages).
    #[error("Dependency resolution failed: {message}")]
    Resolution { message: String },

    /// A package source could not answer a lookup.
    #[error("Source unavailable: {message}")]
    Source { message: String },

    /// The merged build graph violates a global invariant.
    #[error("Invalid build:\n{message}")]
    #[diagnostic(help(
        "Each source component name and reference version must be unique across the whole dependency tree"
    ))]
    Build { message: String },

    /// A declared source component could not be read or parsed.
    #[error("Failed to load component: {message}")]
    Component { message: String },

    /// Network request or download failed.
    #[error("Network error: {message}")]
    Network { message: String },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}

/// Convenience alias for `miette::Result<T>`.
pub type BrixResult<T> = miette::Result<T>;

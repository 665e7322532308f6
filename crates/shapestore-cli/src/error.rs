//! CLI error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors reported by the command-line tool.
#[derive(Debug, Error)]
pub enum CliError {
    /// A file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Input was not valid JSON.
    #[error("invalid JSON input: {0}")]
    Json(#[from] serde_json::Error),

    /// Shape, schema, or normalization error.
    #[error(transparent)]
    Model(#[from] shapestore_core::Error),
}

use std::io;
use std::path::PathBuf;

use rostf_buffer::ConfigError;
use thiserror::Error;

/// Everything that can make a `rostf` invocation fail.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path}:{line}: invalid TF message: {source}")]
    Json {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Usage(String),

    #[error("no transform from {parent} to {child}")]
    NotFound { parent: String, child: String },
}

//! Fatal errors raised while constructing the rule graph.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("{} does not lie under document root {}", .path.display(), .root.display())]
    Structure { path: PathBuf, root: PathBuf },

    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<crate::config::ConfigError> for GraphError {
    fn from(err: crate::config::ConfigError) -> Self {
        GraphError::Configuration(err.to_string())
    }
}

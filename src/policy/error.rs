// Error types for Policy module
#![allow(dead_code)]

use thiserror::Error;

/// Policy loading errors
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("IO error reading policy {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, PolicyError>;

// Error types for Catalog module
#![allow(dead_code)]

use thiserror::Error;

/// Catalog loading errors
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Tool entry #{0} has an empty name")]
    EmptyName(usize),

    #[error("Duplicate tool name: {0}")]
    DuplicateName(String),

    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, CatalogError>;

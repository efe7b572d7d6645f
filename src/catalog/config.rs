// Catalog configuration
#![allow(dead_code)]

use std::path::PathBuf;

/// Environment variable pointing at a dataset file or directory
pub const ENV_TOOL_DATA: &str = "KALI_TOOL_DATA";

/// File name looked up when the dataset path is a directory
pub const DATASET_FILE_NAME: &str = "kali_tools.toml";

/// Catalog configuration
#[derive(Debug, Clone, Default)]
pub struct CatalogConfig {
    /// Dataset location; `None` selects the packaged dataset
    pub data_path: Option<PathBuf>,
}

impl CatalogConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let data_path = std::env::var(ENV_TOOL_DATA)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        Self { data_path }
    }

    /// Resolve the dataset file, if an existing one is configured
    pub fn resolved_file(&self) -> Option<PathBuf> {
        let path = self.data_path.as_ref()?;
        let file = if path.is_dir() {
            path.join(DATASET_FILE_NAME)
        } else {
            path.clone()
        };
        file.exists().then_some(file)
    }
}

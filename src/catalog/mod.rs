// Catalog module - curated tool metadata and name lookup
#![allow(unused_imports)]

pub mod config;
pub mod dataset;
pub mod error;
pub mod fuzzy;
pub mod types;

pub use config::CatalogConfig;
pub use dataset::ToolDataset;
pub use error::{CatalogError, Result};
pub use types::{ToolCatalog, ToolDescriptor};

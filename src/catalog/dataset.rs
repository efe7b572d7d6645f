// Tool dataset - concrete catalog loaded from TOML
#![allow(dead_code)]

use crate::catalog::config::CatalogConfig;
use crate::catalog::error::{CatalogError, Result};
use crate::catalog::fuzzy::{ratio, token_set_ratio};
use crate::catalog::types::{ToolCatalog, ToolDescriptor};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{debug, info};

/// Dataset shipped with the binary
const PACKAGED_DATASET: &str = include_str!("../../assets/kali_tools.toml");

/// Matches must score above this to count as relevant
const RELEVANCE_FLOOR: f64 = 40.0;

/// On-disk layout: `[[tools]]` array
#[derive(Debug, Deserialize)]
struct DatasetFile {
    #[serde(default)]
    tools: Vec<ToolDescriptor>,
}

/// In-memory tool dataset
#[derive(Debug, Clone, Default)]
pub struct ToolDataset {
    /// Tools in file order
    tools: Vec<ToolDescriptor>,
    /// Lowercased name -> index into `tools`
    by_name: HashMap<String, usize>,
    /// Category (as written) -> indices, sorted by category
    categories: BTreeMap<String, Vec<usize>>,
}

impl ToolDataset {
    /// Build a dataset from descriptors
    pub fn new(tools: Vec<ToolDescriptor>) -> Result<Self> {
        let mut by_name = HashMap::new();
        let mut categories: BTreeMap<String, Vec<usize>> = BTreeMap::new();

        for (idx, tool) in tools.iter().enumerate() {
            let key = normalize(&tool.name);
            if key.is_empty() {
                return Err(CatalogError::EmptyName(idx));
            }
            if by_name.insert(key, idx).is_some() {
                return Err(CatalogError::DuplicateName(tool.name.clone()));
            }
            categories
                .entry(tool.category.trim().to_string())
                .or_default()
                .push(idx);
        }

        Ok(Self {
            tools,
            by_name,
            categories,
        })
    }

    /// Parse a dataset from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: DatasetFile = toml::from_str(content)?;
        Self::new(file.tools)
    }

    /// Load a dataset file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let dataset = Self::from_toml_str(&content)?;
        debug!(path = %path.display(), tool_count = dataset.len(), "loaded tool dataset from file");
        Ok(dataset)
    }

    /// The dataset compiled into the binary
    pub fn packaged() -> Result<Self> {
        Self::from_toml_str(PACKAGED_DATASET)
    }

    /// Load according to configuration, falling back to the packaged dataset
    pub fn load(config: &CatalogConfig) -> Result<Self> {
        let dataset = match config.resolved_file() {
            Some(path) => Self::from_file(&path)?,
            None => {
                if let Some(path) = &config.data_path {
                    debug!(
                        path = %path.display(),
                        "tool dataset not found, using packaged dataset"
                    );
                }
                Self::packaged()?
            }
        };
        info!(
            tool_count = dataset.len(),
            categories = dataset.categories.len(),
            "tool dataset loaded"
        );
        Ok(dataset)
    }

    /// Category names, sorted
    pub fn categories(&self) -> Vec<String> {
        self.categories.keys().cloned().collect()
    }

    /// Tools in a category (case-insensitive match on the category name)
    pub fn by_category(&self, category: &str) -> Vec<&ToolDescriptor> {
        let wanted = category.trim().to_lowercase();
        self.categories
            .iter()
            .find(|(name, _)| name.to_lowercase() == wanted)
            .map(|(_, indices)| indices.iter().map(|&i| &self.tools[i]).collect())
            .unwrap_or_default()
    }

    /// Look up a tool by name; spaces are retried as hyphens
    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        let key = normalize(name);
        self.by_name
            .get(&key)
            .or_else(|| self.by_name.get(&key.replace(' ', "-")))
            .map(|&i| &self.tools[i])
    }

    /// Iterate over all tools in file order
    pub fn iter(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.iter()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Score every tool against a query, best first
    fn scored(&self, query: &str) -> Vec<(f64, &ToolDescriptor)> {
        let query_lc = query.trim().to_lowercase();
        let mut scored: Vec<(f64, &ToolDescriptor)> = self
            .tools
            .iter()
            .map(|tool| {
                let blob_score = token_set_ratio(&query_lc, &tool.searchable_blob());
                let name_score = ratio(&query_lc, &tool.name.to_lowercase());
                (blob_score.max(name_score), tool)
            })
            .collect();
        // Stable sort keeps file order among equal scores
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored
    }

    /// Free-text search
    ///
    /// Prefers matches above the relevance floor, then any positive score, then
    /// everything; an empty query matches nothing.
    pub fn fuzzy_search(&self, query: &str, limit: usize) -> Vec<&ToolDescriptor> {
        if query.trim().is_empty() {
            return Vec::new();
        }

        let limit = limit.max(1);
        let scored = self.scored(query);

        let mut filtered: Vec<&ToolDescriptor> = scored
            .iter()
            .filter(|(score, _)| *score > RELEVANCE_FLOOR)
            .map(|(_, tool)| *tool)
            .collect();
        if filtered.is_empty() {
            filtered = scored
                .iter()
                .filter(|(score, _)| *score > 0.0)
                .map(|(_, tool)| *tool)
                .collect();
        }
        if filtered.is_empty() {
            filtered = scored.iter().map(|(_, tool)| *tool).collect();
        }

        filtered.truncate(limit);
        filtered
    }
}

impl ToolCatalog for ToolDataset {
    fn resolve(&self, name: &str) -> Option<ToolDescriptor> {
        self.get(name).cloned()
    }

    fn fuzzy_suggestions(&self, name: &str, limit: usize) -> Vec<ToolDescriptor> {
        if name.trim().is_empty() {
            return Vec::new();
        }
        self.scored(name)
            .into_iter()
            .filter(|(score, _)| *score > RELEVANCE_FLOOR)
            .take(limit.max(1))
            .map(|(_, tool)| tool.clone())
            .collect()
    }
}

/// Normalize free-form text for lookup
fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

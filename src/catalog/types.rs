// Data types for Catalog module
#![allow(dead_code)]

use serde::{Deserialize, Serialize};

/// Metadata for one curated tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Canonical tool name (lookup key)
    pub name: String,
    /// Distribution package shipping the tool
    #[serde(default)]
    pub package: String,
    /// Category, e.g. "Information Gathering"
    #[serde(default)]
    pub category: String,
    /// One-line description
    #[serde(default)]
    pub summary: String,
    /// Executable to launch; empty when the tool is catalogued but not runnable
    #[serde(default)]
    pub binary_path: String,
    /// Arguments used when the caller supplies none
    #[serde(default)]
    pub default_args: String,
}

impl ToolDescriptor {
    /// Whether the tool has an executable configured
    pub fn is_runnable(&self) -> bool {
        !self.binary_path.trim().is_empty()
    }

    /// Lowercased text used for fuzzy matching
    pub fn searchable_blob(&self) -> String {
        [
            self.name.as_str(),
            self.package.as_str(),
            self.category.as_str(),
            self.summary.as_str(),
        ]
        .join(" ")
        .to_lowercase()
    }

    /// Multi-line description for callers
    pub fn describe(&self) -> String {
        let mut lines = vec![
            format!("Tool: {}", self.name),
            format!("Category: {}", self.category),
            format!("Package: {}", self.package),
            format!("Binary: {}", self.binary_path),
            format!("Summary: {}", self.summary),
        ];
        if !self.default_args.is_empty() {
            lines.push(format!("Default args: {}", self.default_args));
        }
        lines.join("\n")
    }

    /// Single list line: `- name (category) - summary`
    pub fn list_line(&self) -> String {
        format!("- {} ({}) - {}", self.name, self.category, self.summary)
    }
}

/// Lookup capability the execution engine depends on
pub trait ToolCatalog: Send + Sync {
    /// Resolve a free-text tool name to its descriptor
    fn resolve(&self, name: &str) -> Option<ToolDescriptor>;

    /// Closest matches for an unknown name, best first; empty when nothing is relevant
    fn fuzzy_suggestions(&self, name: &str, limit: usize) -> Vec<ToolDescriptor>;
}

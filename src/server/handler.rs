// Request handler - maps operations onto the catalog and the engine
#![allow(dead_code)]

use crate::catalog::{ToolDataset, ToolDescriptor};
use crate::executor::{Engine, ToolOutput, ToolStream};
use crate::server::protocol::Operation;
use std::sync::Arc;
use tracing::{info, warn};

/// Suggestions shown by `describe_tool` for an unknown name
const DESCRIBE_SUGGESTIONS: usize = 5;

/// Outcome of an operation
pub enum Reply {
    Output(ToolOutput),
    Stream(ToolStream),
}

/// Shared by every connection and the interactive shell
pub struct Handler {
    dataset: Arc<ToolDataset>,
    engine: Arc<Engine>,
}

impl Handler {
    pub fn new(dataset: Arc<ToolDataset>, engine: Arc<Engine>) -> Self {
        Self { dataset, engine }
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    pub fn dataset(&self) -> &Arc<ToolDataset> {
        &self.dataset
    }

    pub async fn call(&self, operation: Operation) -> Reply {
        match operation {
            Operation::StreamTool {
                tool_name,
                arguments,
                timeout,
            } => Reply::Stream(self.engine.stream(&tool_name, &arguments, timeout).await),
            Operation::RunTool {
                tool_name,
                arguments,
                timeout,
            } => Reply::Output(self.engine.run(&tool_name, &arguments, timeout).await),
            other => Reply::Output(self.browse(other)),
        }
    }

    /// Operations that never start a process
    fn browse(&self, operation: Operation) -> ToolOutput {
        match operation {
            Operation::ListCategories => self.list_categories(),
            Operation::ListTools { category } => self.list_tools(&category),
            Operation::DescribeTool { tool_name } => self.describe_tool(&tool_name),
            Operation::ToolDetails { tool_name } => self.tool_details(&tool_name),
            Operation::SuggestTools { task } => self.suggest_tools(&task),
            Operation::SearchTools { query, limit } => self.search_tools(&query, limit),
            Operation::ExportRunHistory => ToolOutput::success(self.engine.export_history()),
            Operation::RunHistory => self.run_history(),
            Operation::ReloadPolicy => self.reload_policy(),
            op @ (Operation::RunTool { .. } | Operation::StreamTool { .. }) => {
                ToolOutput::error(format!("Error: Unsupported operation '{}'.", op.name()))
            }
        }
    }

    fn list_categories(&self) -> ToolOutput {
        let mut lines = vec!["Available Kali tool categories:".to_string()];
        lines.extend(self.dataset.categories().into_iter().map(|c| format!("- {}", c)));
        ToolOutput::success(lines.join("\n"))
    }

    fn list_tools(&self, category: &str) -> ToolOutput {
        if category.trim().is_empty() {
            return ToolOutput::error("Error: Provide the category parameter.");
        }
        let tools = self.dataset.by_category(category);
        if tools.is_empty() {
            return ToolOutput::success(format!("No tools found for category '{}'.", category));
        }
        ToolOutput::success(tool_list(&format!("Tools in category '{}':", category), &tools))
    }

    fn describe_tool(&self, tool_name: &str) -> ToolOutput {
        if tool_name.trim().is_empty() {
            return ToolOutput::error("Error: Provide the tool_name parameter.");
        }
        if let Some(tool) = self.dataset.get(tool_name) {
            return ToolOutput::success(tool.describe());
        }

        let matches = self.dataset.fuzzy_search(tool_name, DESCRIBE_SUGGESTIONS);
        if matches.is_empty() {
            return ToolOutput::error(format!("Error: Unknown tool '{}'.", tool_name));
        }
        let mut lines = vec!["Unknown tool. Did you mean:".to_string()];
        lines.extend(matches.iter().map(|t| format!("- {}", t.name)));
        ToolOutput::error(lines.join("\n"))
    }

    fn tool_details(&self, tool_name: &str) -> ToolOutput {
        if tool_name.trim().is_empty() {
            return ToolOutput::error("Error: Provide the tool_name parameter.");
        }
        match self.dataset.get(tool_name) {
            Some(tool) => ToolOutput::success(tool.describe()),
            None => ToolOutput::error(format!("Error: Unknown tool '{}'.", tool_name)),
        }
    }

    fn suggest_tools(&self, task: &str) -> ToolOutput {
        if task.trim().is_empty() {
            return ToolOutput::error("Error: Provide the task parameter.");
        }
        let matches = self.dataset.fuzzy_search(task, DESCRIBE_SUGGESTIONS);
        if matches.is_empty() {
            return ToolOutput::success(format!(
                "No direct matches found for '{}'. Try using more specific keywords.",
                task
            ));
        }
        ToolOutput::success(tool_list(&format!("Suggested tools for '{}':", task), &matches))
    }

    fn search_tools(&self, query: &str, limit: usize) -> ToolOutput {
        let matches = self.dataset.fuzzy_search(query, limit);
        if matches.is_empty() {
            return ToolOutput::success(format!("No matches found for '{}'.", query));
        }
        ToolOutput::success(tool_list(&format!("Search results for '{}':", query), &matches))
    }

    fn run_history(&self) -> ToolOutput {
        match serde_json::to_string_pretty(&self.engine.history()) {
            Ok(json) => ToolOutput::success(json),
            Err(e) => ToolOutput::error(format!("Error: Unable to encode run history ({}).", e)),
        }
    }

    fn reload_policy(&self) -> ToolOutput {
        match self.engine.reload_policy() {
            Ok(()) => {
                let policy = self.engine.policy();
                info!(tools = policy.tools.len(), "policy reload requested");
                ToolOutput::success(format!(
                    "Policy reloaded ({} tool entries).",
                    policy.tools.len()
                ))
            }
            Err(e) => {
                warn!(error = %e, "policy reload failed, keeping previous policy");
                ToolOutput::error(format!(
                    "Error: Policy reload failed ({}). Previous policy kept.",
                    e
                ))
            }
        }
    }
}

fn tool_list(title: &str, tools: &[&ToolDescriptor]) -> String {
    let mut lines = vec![title.to_string()];
    lines.extend(tools.iter().map(|t| t.list_line()));
    lines.join("\n")
}

// Wire protocol - one JSON object per line in each direction
#![allow(dead_code)]

use crate::server::error::{Result, ServerError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `search_tools` result count when `limit` is omitted
pub const DEFAULT_SEARCH_LIMIT: usize = 5;

fn default_search_limit() -> usize {
    DEFAULT_SEARCH_LIMIT
}

/// Requested operation, tagged by `op`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    ListCategories,
    ListTools {
        #[serde(default)]
        category: String,
    },
    DescribeTool {
        #[serde(default)]
        tool_name: String,
    },
    /// Exact lookup, no suggestions
    ToolDetails {
        #[serde(default)]
        tool_name: String,
    },
    SuggestTools {
        #[serde(default)]
        task: String,
    },
    SearchTools {
        #[serde(default)]
        query: String,
        #[serde(default = "default_search_limit")]
        limit: usize,
    },
    RunTool {
        #[serde(default)]
        tool_name: String,
        #[serde(default)]
        arguments: String,
        #[serde(default)]
        timeout: Option<f64>,
    },
    StreamTool {
        #[serde(default)]
        tool_name: String,
        #[serde(default)]
        arguments: String,
        #[serde(default)]
        timeout: Option<f64>,
    },
    ExportRunHistory,
    RunHistory,
    ReloadPolicy,
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::ListCategories => "list_categories",
            Operation::ListTools { .. } => "list_tools",
            Operation::DescribeTool { .. } => "describe_tool",
            Operation::ToolDetails { .. } => "tool_details",
            Operation::SuggestTools { .. } => "suggest_tools",
            Operation::SearchTools { .. } => "search_tools",
            Operation::RunTool { .. } => "run_tool",
            Operation::StreamTool { .. } => "stream_tool",
            Operation::ExportRunHistory => "export_run_history",
            Operation::RunHistory => "run_history",
            Operation::ReloadPolicy => "reload_policy",
        }
    }
}

/// Response line kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKind {
    /// Complete answer to a request
    Result,
    /// One line of streamed output
    Chunk,
    /// Terminates a stream
    End,
}

/// Response line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Echo of the request id; `null` when it could not be read
    pub id: Value,
    pub kind: ResponseKind,
    pub content: String,
    #[serde(default)]
    pub is_error: bool,
}

impl Response {
    pub fn result(id: Value, content: impl Into<String>, is_error: bool) -> Self {
        Self {
            id,
            kind: ResponseKind::Result,
            content: content.into(),
            is_error,
        }
    }

    pub fn chunk(id: Value, content: impl Into<String>) -> Self {
        Self {
            id,
            kind: ResponseKind::Chunk,
            content: content.into(),
            is_error: false,
        }
    }

    pub fn end(id: Value, is_error: bool) -> Self {
        Self {
            id,
            kind: ResponseKind::End,
            content: String::new(),
            is_error,
        }
    }
}

/// Decode one request line
///
/// The id is recovered whenever the line is a JSON object, so that a bad
/// `op` can still be answered against the right request.
pub fn decode_request(line: &str) -> (Value, Result<Operation>) {
    let value: Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(e) => return (Value::Null, Err(ServerError::DecodeError(e.to_string()))),
    };

    let id = value.get("id").cloned().unwrap_or(Value::Null);
    let operation =
        serde_json::from_value(value).map_err(|e| ServerError::DecodeError(e.to_string()));
    (id, operation)
}

/// Encode a response as a single line, newline included
pub fn encode_response(response: &Response) -> Result<String> {
    let mut line =
        serde_json::to_string(response).map_err(|e| ServerError::EncodeError(e.to_string()))?;
    line.push('\n');
    Ok(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_run_tool() {
        let (id, op) = decode_request(
            r#"{"id": 7, "op": "run_tool", "tool_name": "nmap", "arguments": "-sV 127.0.0.1", "timeout": 30}"#,
        );
        assert_eq!(id, json!(7));
        assert_eq!(
            op.unwrap(),
            Operation::RunTool {
                tool_name: "nmap".to_string(),
                arguments: "-sV 127.0.0.1".to_string(),
                timeout: Some(30.0),
            }
        );
    }

    #[test]
    fn test_decode_defaults() {
        let (_, op) = decode_request(r#"{"id": "a", "op": "search_tools", "query": "wifi"}"#);
        assert_eq!(
            op.unwrap(),
            Operation::SearchTools {
                query: "wifi".to_string(),
                limit: DEFAULT_SEARCH_LIMIT,
            }
        );

        let (id, op) = decode_request(r#"{"op": "list_categories"}"#);
        assert_eq!(id, Value::Null);
        assert_eq!(op.unwrap(), Operation::ListCategories);
    }

    #[test]
    fn test_unknown_op_keeps_id() {
        let (id, op) = decode_request(r#"{"id": 3, "op": "format_disk"}"#);
        assert_eq!(id, json!(3));
        assert!(matches!(op, Err(ServerError::DecodeError(_))));
    }

    #[test]
    fn test_garbage_line() {
        let (id, op) = decode_request("not json");
        assert_eq!(id, Value::Null);
        assert!(op.is_err());
    }

    #[test]
    fn test_encode_single_line() {
        let line = encode_response(&Response::result(json!(1), "a\nb", false)).unwrap();
        assert!(line.ends_with('\n'));
        assert_eq!(line.matches('\n').count(), 1);

        let value: Value = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(value["kind"], "result");
        assert_eq!(value["content"], "a\nb");
        assert_eq!(value["is_error"], false);
    }
}

// Shell command parsing
#![allow(dead_code)]

use crate::server::protocol::{DEFAULT_SEARCH_LIMIT, Operation, decode_request};

pub const HELP: &str = "\
Commands:
  categories                         list tool categories
  tools <category>                   list tools in a category
  describe <tool>                    describe a tool (with suggestions)
  details <tool>                     exact tool metadata
  suggest <task>                     suggest tools for a task
  search <query>                     fuzzy search the catalog
  run [--timeout S] <tool> [args]    run a tool and print its report
  stream [--timeout S] <tool> [args] run a tool, printing output as it arrives
  history [--json]                   recent executions
  reload                             re-read the policy file
  {\"op\": ...}                        raw protocol request
  help | quit";

/// One line of shell input
#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    Call(Operation),
    Help,
    Quit,
}

/// Parse a non-empty input line
pub fn parse(line: &str) -> Result<ShellCommand, String> {
    let line = line.trim();
    if line.starts_with('{') {
        let (_, operation) = decode_request(line);
        return operation.map(ShellCommand::Call).map_err(|e| format!("Error: {}", e));
    }

    let (word, rest) = split_word(line);
    let operation = match word.to_lowercase().as_str() {
        "help" | "?" => return Ok(ShellCommand::Help),
        "quit" | "exit" => return Ok(ShellCommand::Quit),
        "categories" => Operation::ListCategories,
        "tools" => Operation::ListTools {
            category: rest.to_string(),
        },
        "describe" => Operation::DescribeTool {
            tool_name: rest.to_string(),
        },
        "details" => Operation::ToolDetails {
            tool_name: rest.to_string(),
        },
        "suggest" => Operation::SuggestTools {
            task: rest.to_string(),
        },
        "search" => Operation::SearchTools {
            query: rest.to_string(),
            limit: DEFAULT_SEARCH_LIMIT,
        },
        "run" => {
            let (tool_name, arguments, timeout) = invocation(rest)?;
            Operation::RunTool {
                tool_name,
                arguments,
                timeout,
            }
        }
        "stream" => {
            let (tool_name, arguments, timeout) = invocation(rest)?;
            Operation::StreamTool {
                tool_name,
                arguments,
                timeout,
            }
        }
        "history" if rest == "--json" => Operation::RunHistory,
        "history" => Operation::ExportRunHistory,
        "reload" => Operation::ReloadPolicy,
        other => {
            return Err(format!(
                "Error: Unknown command '{}'. Type 'help' for the list.",
                other
            ));
        }
    };
    Ok(ShellCommand::Call(operation))
}

fn split_word(text: &str) -> (&str, &str) {
    match text.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (text, ""),
    }
}

/// `[--timeout S] <tool> [args]`; the arguments stay unsplit
fn invocation(text: &str) -> Result<(String, String, Option<f64>), String> {
    let mut rest = text;
    let mut timeout = None;

    if let Some(after) = rest.strip_prefix("--timeout") {
        let (value, remainder) = split_word(after.trim_start());
        let secs: f64 = value
            .parse()
            .map_err(|_| format!("Error: Invalid timeout '{}'.", value))?;
        timeout = Some(secs);
        rest = remainder;
    }

    let (tool, arguments) = split_word(rest);
    Ok((tool.to_string(), arguments.to_string(), timeout))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(line: &str) -> Operation {
        match parse(line).unwrap() {
            ShellCommand::Call(op) => op,
            other => panic!("expected call, got {:?}", other),
        }
    }

    #[test]
    fn test_run_with_timeout() {
        assert_eq!(
            call("run --timeout 30 nmap -sV 'host name'"),
            Operation::RunTool {
                tool_name: "nmap".to_string(),
                arguments: "-sV 'host name'".to_string(),
                timeout: Some(30.0),
            }
        );
    }

    #[test]
    fn test_stream_without_arguments() {
        assert_eq!(
            call("stream nmap"),
            Operation::StreamTool {
                tool_name: "nmap".to_string(),
                arguments: String::new(),
                timeout: None,
            }
        );
    }

    #[test]
    fn test_bad_timeout() {
        assert!(parse("run --timeout soon nmap").unwrap_err().contains("Invalid timeout"));
    }

    #[test]
    fn test_catalog_commands() {
        assert_eq!(call("categories"), Operation::ListCategories);
        assert_eq!(
            call("tools Information Gathering"),
            Operation::ListTools {
                category: "Information Gathering".to_string()
            }
        );
        assert_eq!(call("history"), Operation::ExportRunHistory);
        assert_eq!(call("history --json"), Operation::RunHistory);
    }

    #[test]
    fn test_raw_json_request() {
        assert_eq!(call(r#"{"op": "reload_policy"}"#), Operation::ReloadPolicy);
    }

    #[test]
    fn test_control_words() {
        assert_eq!(parse("quit").unwrap(), ShellCommand::Quit);
        assert_eq!(parse("HELP").unwrap(), ShellCommand::Help);
        assert!(parse("launch nmap").is_err());
    }
}

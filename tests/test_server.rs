// Integration tests for Server module
// This file should be run with cargo test --test test_server

#[path = "../src/catalog/mod.rs"]
mod catalog;

#[path = "../src/history/mod.rs"]
mod history;

#[path = "../src/policy/mod.rs"]
mod policy;

#[path = "../src/executor/mod.rs"]
mod executor;

#[path = "../src/server/mod.rs"]
mod server;

use async_trait::async_trait;
use catalog::ToolDataset;
use executor::{Engine, ExecutionPlan, ExecutorConfig, Launcher, ProcessHandle, SpawnedProcess};
use policy::{Overrides, Policy, PolicyStore};
use serde_json::{Value, json};
use server::{Handler, Response, ResponseKind, Server, ServerConfig};
use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    });
}

/// Every launch prints two lines and exits 0
struct EchoLauncher;

impl Launcher for EchoLauncher {
    fn launch(&self, plan: &ExecutionPlan) -> io::Result<SpawnedProcess> {
        let (stdout, mut writer) = tokio::io::duplex(4096);
        let text = format!("running {}\nscan complete\n", plan.command_line());
        tokio::spawn(async move {
            let _ = writer.write_all(text.as_bytes()).await;
        });
        Ok(SpawnedProcess {
            stdout: Some(Box::new(stdout)),
            stderr: None,
            handle: Box::new(Exited),
        })
    }
}

struct Exited;

#[async_trait]
impl ProcessHandle for Exited {
    fn id(&self) -> Option<u32> {
        None
    }

    async fn wait(&mut self) -> io::Result<i32> {
        Ok(0)
    }

    fn start_kill(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn create_handler() -> Arc<Handler> {
    let dataset = Arc::new(ToolDataset::packaged().unwrap());
    let policy =
        Policy::from_yaml_str("tools:\n  nmap:\n    allowed_flags: [\"-sV\", \"-p\"]\n").unwrap();
    let engine = Engine::new(
        ExecutorConfig::default(),
        dataset.clone(),
        PolicyStore::from_policy(policy),
        Overrides::default(),
    )
    .with_launcher(Arc::new(EchoLauncher));
    Arc::new(Handler::new(dataset, Arc::new(engine)))
}

/// Feed request lines through a server session and collect every response
async fn session(handler: Arc<Handler>, requests: &[&str]) -> Vec<Response> {
    let mut input = requests.join("\n");
    input.push('\n');
    raw_session(handler, ServerConfig::default(), input.as_bytes()).await
}

/// Session over arbitrary input bytes
async fn raw_session(handler: Arc<Handler>, config: ServerConfig, input: &[u8]) -> Vec<Response> {
    let (server_out, mut client_in) = tokio::io::duplex(64 * 1024);
    let reader = tokio::spawn(async move {
        let mut text = String::new();
        client_in.read_to_string(&mut text).await.unwrap();
        text
    });

    Server::new(handler, config)
        .run(input, server_out, false)
        .await
        .unwrap();

    let text = reader.await.unwrap();
    text.lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

fn by_id(responses: &[Response]) -> HashMap<String, Vec<Response>> {
    let mut grouped: HashMap<String, Vec<Response>> = HashMap::new();
    for response in responses {
        grouped
            .entry(response.id.to_string())
            .or_default()
            .push(response.clone());
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Browse operations answer with one result each
    #[tokio::test]
    async fn test_browse_requests() {
        init_tracing();

        let responses = session(
            create_handler(),
            &[
                r#"{"id": 1, "op": "list_categories"}"#,
                r#"{"id": 2, "op": "describe_tool", "tool_name": "nmap"}"#,
                r#"{"id": 3, "op": "search_tools", "query": "password cracking", "limit": 2}"#,
                r#"{"id": 4, "op": "list_tools", "category": ""}"#,
            ],
        )
        .await;

        assert_eq!(responses.len(), 4);
        assert!(responses.iter().all(|r| r.kind == ResponseKind::Result));
        let grouped = by_id(&responses);

        let categories = &grouped["1"][0];
        assert!(!categories.is_error);
        assert!(categories.content.starts_with("Available Kali tool categories:"));

        let described = &grouped["2"][0];
        assert!(described.content.contains("nmap"));

        let search = &grouped["3"][0];
        assert!(search.content.starts_with("Search results for 'password cracking':"));
        assert!(search.content.lines().count() <= 3);

        let missing = &grouped["4"][0];
        assert!(missing.is_error);
        assert_eq!(missing.content, "Error: Provide the category parameter.");
    }

    /// Undecodable lines are answered, not fatal
    #[tokio::test]
    async fn test_malformed_requests() {
        init_tracing();

        let responses = session(
            create_handler(),
            &[
                "this is not json",
                "",
                r#"{"id": "x", "op": "format_disk"}"#,
                r#"{"id": 9, "op": "list_categories"}"#,
            ],
        )
        .await;

        assert_eq!(responses.len(), 3);
        let grouped = by_id(&responses);

        let garbage = &grouped["null"][0];
        assert!(garbage.is_error);
        assert!(garbage.content.starts_with("Error: "));

        assert!(grouped["\"x\""][0].is_error);
        assert!(!grouped["9"][0].is_error);
    }

    /// Invalid UTF-8 gets an error and later requests are still served
    #[tokio::test]
    async fn test_invalid_utf8_line() {
        init_tracing();

        let mut input = b"{\"id\": 1, \"op\": \"search_tools\", \"query\": \"\xff\"}\n".to_vec();
        input.extend_from_slice(b"{\"id\": 2, \"op\": \"list_categories\"}\n");
        let responses = raw_session(create_handler(), ServerConfig::default(), &input).await;

        assert_eq!(responses.len(), 2);
        let grouped = by_id(&responses);

        let bad = &grouped["null"][0];
        assert!(bad.is_error);
        assert_eq!(bad.content, "Error: Request line is not valid UTF-8");

        let good = &grouped["2"][0];
        assert!(!good.is_error);
        assert!(good.content.starts_with("Available Kali tool categories:"));
    }

    /// Oversized lines are refused while reading, then serving resumes
    #[tokio::test]
    async fn test_oversized_line() {
        init_tracing();

        let config = ServerConfig {
            max_line_bytes: 256,
            ..Default::default()
        };
        let mut input = format!(
            r#"{{"id": 1, "op": "search_tools", "query": "{}"}}"#,
            "a".repeat(4096)
        )
        .into_bytes();
        let oversized = input.len();
        input.extend_from_slice(
            b"\n{\"id\": 2, \"op\": \"describe_tool\", \"tool_name\": \"nmap\"}\n",
        );

        let responses = raw_session(create_handler(), config, &input).await;
        assert_eq!(responses.len(), 2);
        let grouped = by_id(&responses);

        let refused = &grouped["null"][0];
        assert!(refused.is_error);
        assert_eq!(
            refused.content,
            format!("Error: Request line too long: {} bytes", oversized)
        );
        assert!(grouped["2"][0].content.contains("nmap"));
    }

    /// Batch runs and rejections come back as single results
    #[tokio::test]
    async fn test_run_tool() {
        init_tracing();

        let responses = session(
            create_handler(),
            &[
                r#"{"id": 1, "op": "run_tool", "tool_name": "nmap", "arguments": "-sV 127.0.0.1"}"#,
                r#"{"id": 2, "op": "run_tool", "tool_name": "nmap", "arguments": "-A 127.0.0.1"}"#,
                r#"{"id": 3, "op": "run_tool", "arguments": "-sV"}"#,
            ],
        )
        .await;

        let grouped = by_id(&responses);
        let ok = &grouped["1"][0];
        assert!(!ok.is_error, "{}", ok.content);
        assert!(ok.content.contains("Command: nmap -sV 127.0.0.1"));
        assert!(ok.content.contains("scan complete"));

        let rejected = &grouped["2"][0];
        assert!(rejected.is_error);
        assert!(rejected.content.starts_with("Error: Flag '-A' is not permitted for 'nmap'."));

        assert_eq!(grouped["3"][0].content, "Error: Provide the tool_name parameter.");
    }

    /// Streams send chunks in order, then one end marker
    #[tokio::test]
    async fn test_stream_tool() {
        init_tracing();

        let responses = session(
            create_handler(),
            &[
                r#"{"id": "s1", "op": "stream_tool", "tool_name": "nmap", "arguments": "-p 80 127.0.0.1"}"#,
                r#"{"id": "s2", "op": "stream_tool", "tool_name": "nope-not-a-tool"}"#,
            ],
        )
        .await;

        let grouped = by_id(&responses);

        let s1 = &grouped["\"s1\""];
        let kinds: Vec<ResponseKind> = s1.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![ResponseKind::Chunk, ResponseKind::Chunk, ResponseKind::Chunk, ResponseKind::End]
        );
        assert_eq!(s1[0].content, "[stdout] running nmap -p 80 127.0.0.1");
        assert_eq!(s1[1].content, "[stdout] scan complete");
        assert_eq!(s1[2].content, "[meta] exit_code=0");
        assert!(!s1[3].is_error);

        let s2 = &grouped["\"s2\""];
        assert_eq!(s2.len(), 2);
        assert!(s2[0].content.starts_with("Error: Unknown tool 'nope-not-a-tool'."));
        assert_eq!(s2[1].kind, ResponseKind::End);
        assert!(s2[1].is_error);
    }

    /// History reflects runs from earlier sessions
    #[tokio::test]
    async fn test_history_across_sessions() {
        init_tracing();

        let handler = create_handler();
        session(
            handler.clone(),
            &[r#"{"id": 1, "op": "run_tool", "tool_name": "nmap", "arguments": "-sV 127.0.0.1"}"#],
        )
        .await;

        let responses = session(
            handler,
            &[
                r#"{"id": 2, "op": "run_history"}"#,
                r#"{"id": 3, "op": "export_run_history"}"#,
            ],
        )
        .await;
        let grouped = by_id(&responses);

        let history: Value = serde_json::from_str(&grouped["2"][0].content).unwrap();
        let entries = history.as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["tool"], json!("nmap"));
        assert_eq!(entries[0]["arguments"], json!("-sV 127.0.0.1"));
        assert_eq!(entries[0]["exit_code"], json!(0));
        assert_eq!(entries[0]["mode"], json!("batch"));

        assert!(grouped["3"][0].content.contains("nmap"));
    }
}

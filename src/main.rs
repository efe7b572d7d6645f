mod catalog;
mod executor;
mod history;
mod policy;
mod server;
mod shell;

use catalog::{CatalogConfig, ToolCatalog, ToolDataset};
use clap::{ArgAction, Parser, Subcommand};
use executor::args::join;
use executor::{Engine, ExecutorConfig};
use policy::{Overrides, PolicyConfig, PolicyStore};
use server::{Handler, Operation, Server, ServerConfig};
use shell::ShellConfig;
use std::path::PathBuf;
use std::process;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{Level, info};
use tracing_subscriber::fmt;

/// Log level override, e.g. `debug`
const ENV_LOG_LEVEL: &str = "KALI_LOG_LEVEL";

/// CLI arguments
#[derive(Debug, Parser)]
#[command(name = "kali-exec", version)]
#[command(about = "Policy-guarded catalog and runner for Kali security tools")]
struct Cli {
    /// Policy file (overrides KALI_POLICY_FILE)
    #[arg(long, global = true)]
    policy: Option<PathBuf>,

    /// Tool dataset file or directory (overrides KALI_TOOL_DATA)
    #[arg(long, global = true)]
    tools: Option<PathBuf>,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve JSON-line requests on stdin/stdout
    Serve,
    /// Run a tool and print its report
    Run {
        /// Timeout in seconds
        #[arg(long)]
        timeout: Option<f64>,
        tool: String,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Run a tool, printing output lines as they arrive
    Stream {
        /// Timeout in seconds
        #[arg(long)]
        timeout: Option<f64>,
        tool: String,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Describe a tool
    Describe { tool: String },
    /// Fuzzy search the catalog
    Search {
        #[arg(long, default_value_t = server::protocol::DEFAULT_SEARCH_LIMIT)]
        limit: usize,
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// List tool categories
    Categories,
    /// Interactive shell
    Shell,
}

/// Tokio runtime with signal handling
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let handler = Arc::new(build_handler(cli.policy, cli.tools)?);

    let failed = match cli.command {
        Command::Serve => {
            info!("Starting kali-exec server on stdio...");
            Server::new(handler, ServerConfig::default())
                .serve_stdio()
                .await?;
            info!("Goodbye!");
            false
        }
        Command::Run {
            timeout,
            tool,
            args,
        } => {
            let operation = Operation::RunTool {
                tool_name: tool,
                arguments: join(&args),
                timeout,
            };
            shell::dispatch(&handler, operation).await
        }
        Command::Stream {
            timeout,
            tool,
            args,
        } => {
            let operation = Operation::StreamTool {
                tool_name: tool,
                arguments: join(&args),
                timeout,
            };
            shell::dispatch(&handler, operation).await
        }
        Command::Describe { tool } => {
            shell::dispatch(&handler, Operation::DescribeTool { tool_name: tool }).await
        }
        Command::Search { limit, query } => {
            let operation = Operation::SearchTools {
                query: query.join(" "),
                limit,
            };
            shell::dispatch(&handler, operation).await
        }
        Command::Categories => shell::dispatch(&handler, Operation::ListCategories).await,
        Command::Shell => {
            shell::run(handler, ShellConfig::from_env()).await?;
            false
        }
    };

    if failed {
        process::exit(1);
    }
    Ok(())
}

/// Logs go to stderr so stdout stays clean for the protocol
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => std::env::var(ENV_LOG_LEVEL)
            .ok()
            .and_then(|v| Level::from_str(v.trim()).ok())
            .unwrap_or(Level::INFO),
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .init();
}

/// Load dataset and policy, then wire up the engine
fn build_handler(
    policy_path: Option<PathBuf>,
    tools_path: Option<PathBuf>,
) -> Result<Handler, Box<dyn std::error::Error>> {
    let mut catalog_config = CatalogConfig::from_env();
    if tools_path.is_some() {
        catalog_config.data_path = tools_path;
    }
    let dataset = Arc::new(ToolDataset::load(&catalog_config)?);

    let mut policy_config = PolicyConfig::from_env();
    if policy_path.is_some() {
        policy_config.path = policy_path;
    }
    let store = PolicyStore::open(policy_config)?;
    let overrides = Overrides::from_env();

    info!(
        tools = dataset.len(),
        whitelist_overrides = overrides.target_whitelist.len(),
        max_concurrent_runs = ?overrides.max_concurrent_runs,
        "Configuration loaded"
    );

    let catalog: Arc<dyn ToolCatalog> = dataset.clone();
    let engine = Engine::new(ExecutorConfig::default(), catalog, store, overrides);
    Ok(Handler::new(dataset, Arc::new(engine)))
}

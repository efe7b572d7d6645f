// Shell module - interactive REPL over the same operations as the server
//
// Uses rustyline for line editing and a persistent history file.

pub mod command;
pub mod config;

pub use command::{HELP, ShellCommand};
pub use config::ShellConfig;

use crate::executor::{ToolOutput, ToolStream};
use crate::server::{Handler, Operation, Reply};
use rustyline::Editor;
use rustyline::error::ReadlineError;
use rustyline::history::FileHistory;
use std::io;
use std::sync::Arc;
use tokio::signal;
use tracing::debug;

/// Run the REPL until EOF or `quit`
pub async fn run(handler: Arc<Handler>, config: ShellConfig) -> io::Result<()> {
    let mut rl: Editor<(), FileHistory> = Editor::new().map_err(io::Error::other)?;

    if config.history_file.exists()
        && let Err(e) = rl.load_history(&config.history_file)
    {
        eprintln!("[warning] Failed to load history: {}", e);
    }

    println!("kali-exec v{}", env!("CARGO_PKG_VERSION"));
    println!(
        "{} tools catalogued. Type 'help' for commands, Ctrl+D to quit.",
        handler.dataset().len()
    );
    println!();

    loop {
        match rl.readline(&config.prompt) {
            Ok(line) => {
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(input);

                match command::parse(input) {
                    Ok(ShellCommand::Quit) => break,
                    Ok(ShellCommand::Help) => println!("{}", HELP),
                    Ok(ShellCommand::Call(operation)) => {
                        debug!(op = operation.name(), "shell command");
                        dispatch(&handler, operation).await;
                    }
                    Err(message) => println!("[error] {}", message),
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C cancels the current input only
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("[error] Readline error: {}", e);
                break;
            }
        }
    }

    if let Err(e) = rl.save_history(&config.history_file) {
        eprintln!("[warning] Failed to save history: {}", e);
    }

    println!("\nGoodbye!");
    Ok(())
}

/// Run one operation and print its result; returns whether it failed
pub async fn dispatch(handler: &Handler, operation: Operation) -> bool {
    match handler.call(operation).await {
        Reply::Output(output) => {
            print_output(&output);
            output.is_error
        }
        Reply::Stream(stream) => print_stream(stream).await,
    }
}

pub fn print_output(output: &ToolOutput) {
    if output.is_error {
        println!("[error] {}", output.content);
    } else {
        println!("{}", output.content);
    }
}

/// Print lines as they arrive; Ctrl+C drops the stream, killing the tool
pub async fn print_stream(mut stream: ToolStream) -> bool {
    loop {
        tokio::select! {
            line = stream.next() => match line {
                Some(line) => println!("{}", line),
                None => return stream.failed(),
            },
            _ = signal::ctrl_c() => {
                println!("^C (tool stopped)");
                return true;
            }
        }
    }
}

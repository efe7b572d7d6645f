// Executor module - policy-checked, concurrency-bounded tool execution
#![allow(unused_imports)]

pub mod args;
pub mod config;
pub mod engine;
pub mod error;
pub mod gate;
pub mod limits;
pub mod plan;
pub mod process;
pub mod runner;
pub mod stream;
pub mod types;

pub use config::ExecutorConfig;
pub use engine::Engine;
pub use error::{ExecutorError, Rejection, Result};
pub use gate::{ConcurrencyGate, GatePermit};
pub use plan::Planner;
pub use process::{Launcher, OutputPipe, ProcessHandle, SpawnedProcess, SystemLauncher};
pub use stream::ToolStream;
pub use types::{BatchOutput, ExecutionPlan, ResourceLimits, ToolOutput};

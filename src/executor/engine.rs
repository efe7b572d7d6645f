// Execution engine - the caller-facing facade
#![allow(dead_code)]

use crate::catalog::ToolCatalog;
use crate::executor::config::ExecutorConfig;
use crate::executor::error::{ExecutorError, Rejection, Result};
use crate::executor::gate::{ConcurrencyGate, GateSlot};
use crate::executor::plan::Planner;
use crate::executor::process::{Launcher, SpawnedProcess, SystemLauncher};
use crate::executor::runner::{BatchOutcome, collect};
use crate::executor::stream::{LiveRun, StreamSettings, ToolStream};
use crate::executor::types::{BatchOutput, ExecutionPlan, ToolOutput};
use crate::history::{RunEntry, RunHistory, RunMode, RunRecord, RunStatus};
use crate::policy::{self, Overrides, Policy, PolicyStore};
use std::io;
use std::sync::{Arc, RwLock};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Owns the policy, gate and history shared by every invocation
pub struct Engine {
    config: ExecutorConfig,
    catalog: Arc<dyn ToolCatalog>,
    policy: PolicyStore,
    overrides: RwLock<Overrides>,
    gate: GateSlot,
    history: Arc<RunHistory>,
    launcher: Arc<dyn Launcher>,
}

impl Engine {
    /// Engine launching real processes
    pub fn new(
        config: ExecutorConfig,
        catalog: Arc<dyn ToolCatalog>,
        policy: PolicyStore,
        overrides: Overrides,
    ) -> Self {
        debug!(
            fallback_timeout_secs = config.fallback_timeout_secs,
            history_capacity = config.history_capacity,
            limits_supported = crate::executor::limits::SUPPORTED,
            "initializing execution engine"
        );

        Self {
            history: Arc::new(RunHistory::new(config.history_capacity)),
            config,
            catalog,
            policy,
            overrides: RwLock::new(overrides),
            gate: GateSlot::default(),
            launcher: Arc::new(SystemLauncher),
        }
    }

    /// Replace the process launcher
    pub fn with_launcher(mut self, launcher: Arc<dyn Launcher>) -> Self {
        self.launcher = launcher;
        self
    }

    pub fn policy(&self) -> Arc<Policy> {
        self.policy.current()
    }

    pub fn overrides(&self) -> Overrides {
        self.overrides
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Validate a request without running it
    pub fn plan(
        &self,
        tool_name: &str,
        arguments: &str,
        timeout: Option<f64>,
    ) -> std::result::Result<ExecutionPlan, Rejection> {
        let policy = self.policy.current();
        let overrides = self.overrides();
        Planner::new(
            self.catalog.as_ref(),
            &policy,
            &overrides,
            self.config.fallback_timeout_secs,
        )
        .plan(tool_name, arguments, timeout)
    }

    /// The active gate, created on first use
    pub fn gate(&self) -> Arc<ConcurrencyGate> {
        self.gate.get_or_init(|| {
            let overrides = self.overrides();
            self.policy.current().max_concurrent_runs(&overrides)
        })
    }

    /// Run a tool to completion and render the result
    pub async fn run(&self, tool_name: &str, arguments: &str, timeout: Option<f64>) -> ToolOutput {
        let plan = match self.plan(tool_name, arguments, timeout) {
            Ok(plan) => plan,
            Err(rejection) => {
                warn!(tool = %tool_name, reason = %rejection, "request rejected");
                return ToolOutput::error(rejection.render());
            }
        };

        match self.execute(&plan, arguments).await {
            Ok(output) => output.into_output(),
            Err(e) => ToolOutput::error(e.render()),
        }
    }

    /// Run a planned invocation in batch mode
    pub async fn execute(&self, plan: &ExecutionPlan, arguments: &str) -> Result<BatchOutput> {
        let gate = self.gate();
        let _permit = gate.acquire().await?;

        let started = Instant::now();
        let process = self.spawn(plan)?;
        info!(
            tool = %plan.tool.name,
            command = %plan.command_line(),
            timeout_secs = plan.timeout_secs,
            "tool execution started"
        );

        let outcome = collect(process, plan.timeout(), self.config.reap_grace)
            .await
            .map_err(|e| {
                ExecutorError::OutputCaptureFailed(plan.tool.name.clone(), e.to_string())
            })?;

        match outcome {
            BatchOutcome::Completed {
                exit_code,
                stdout,
                stderr,
            } => {
                let duration = started.elapsed().as_secs_f64();
                self.history.record(RunEntry {
                    tool: plan.tool.name.clone(),
                    arguments: arguments.to_string(),
                    exit_code: RunStatus::Exited(exit_code),
                    duration: Some(duration),
                    mode: RunMode::Batch,
                });
                info!(
                    tool = %plan.tool.name,
                    exit_code,
                    duration_ms = (duration * 1000.0) as u64,
                    stdout_bytes = stdout.len(),
                    stderr_bytes = stderr.len(),
                    "tool execution finished"
                );

                Ok(BatchOutput {
                    command_line: plan.command_line(),
                    exit_code,
                    stdout: String::from_utf8_lossy(&stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&stderr).into_owned(),
                    duration,
                })
            }
            BatchOutcome::TimedOut => {
                self.history.record(RunEntry {
                    tool: plan.tool.name.clone(),
                    arguments: arguments.to_string(),
                    exit_code: RunStatus::Timeout,
                    duration: None,
                    mode: RunMode::Batch,
                });
                warn!(
                    tool = %plan.tool.name,
                    timeout_secs = plan.timeout_secs,
                    "tool execution timed out"
                );
                Err(ExecutorError::Timeout(plan.timeout_secs))
            }
        }
    }

    /// Run a tool, yielding output lines as they arrive
    pub async fn stream(
        &self,
        tool_name: &str,
        arguments: &str,
        timeout: Option<f64>,
    ) -> ToolStream {
        let plan = match self.plan(tool_name, arguments, timeout) {
            Ok(plan) => plan,
            Err(rejection) => {
                warn!(tool = %tool_name, reason = %rejection, "stream request rejected");
                return ToolStream::message(rejection.render());
            }
        };

        let gate = self.gate();
        let permit = match gate.acquire().await {
            Ok(permit) => permit,
            Err(e) => return ToolStream::message(e.render()),
        };
        let process = match self.spawn(&plan) {
            Ok(process) => process,
            Err(e) => return ToolStream::message(e.render()),
        };

        ToolStream::live(LiveRun::start(
            process,
            &plan,
            arguments,
            permit,
            self.history.clone(),
            StreamSettings {
                channel_capacity: self.config.stream_channel_capacity,
                line_limit: self.config.stream_line_limit,
                exit_grace: self.config.exit_grace,
                reap_grace: self.config.reap_grace,
            },
        ))
    }

    /// Recorded runs, oldest first
    pub fn history(&self) -> Vec<RunRecord> {
        self.history.snapshot()
    }

    /// Audit text of recorded runs
    pub fn export_history(&self) -> String {
        self.history.export()
    }

    /// Re-read the policy and environment overrides
    pub fn reload_policy(&self) -> policy::Result<()> {
        self.reload_policy_with(Overrides::from_env())
    }

    /// Re-read the policy and install `overrides`
    ///
    /// The gate is rebuilt on next admission; runs already admitted keep
    /// their slot in the old one.
    pub fn reload_policy_with(&self, overrides: Overrides) -> policy::Result<()> {
        self.policy.reload()?;
        *self.overrides.write().unwrap_or_else(|e| e.into_inner()) = overrides;
        self.gate.reset();
        Ok(())
    }

    fn spawn(&self, plan: &ExecutionPlan) -> Result<SpawnedProcess> {
        self.launcher.launch(plan).map_err(|e| {
            let program = plan.program().to_string();
            if e.kind() == io::ErrorKind::NotFound {
                warn!(tool = %plan.tool.name, program = %program, "executable not found");
                ExecutorError::ExecutableNotFound(program)
            } else {
                warn!(
                    tool = %plan.tool.name,
                    program = %program,
                    error = %e,
                    "failed to launch tool"
                );
                ExecutorError::SpawnFailed(program, e.to_string())
            }
        })
    }
}

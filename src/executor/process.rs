// Process launching - the seam between the engine and the OS
#![allow(dead_code)]

use crate::executor::limits;
use crate::executor::types::ExecutionPlan;
use async_trait::async_trait;
use std::io;
use std::process::{ExitStatus, Stdio};
use tokio::io::AsyncRead;
use tokio::process::{Child, Command};
use tracing::debug;

/// One captured output stream
pub type OutputPipe = Box<dyn AsyncRead + Send + Unpin>;

/// Control over a launched process
#[async_trait]
pub trait ProcessHandle: Send {
    /// OS process id, while known
    fn id(&self) -> Option<u32>;

    /// Wait for exit; signal termination maps to the negated signal number
    async fn wait(&mut self) -> io::Result<i32>;

    /// Request a forced kill without waiting
    fn start_kill(&mut self) -> io::Result<()>;
}

/// A launched process with its output pipes detached
pub struct SpawnedProcess {
    pub stdout: Option<OutputPipe>,
    pub stderr: Option<OutputPipe>,
    pub handle: Box<dyn ProcessHandle>,
}

/// Starts processes for execution plans
pub trait Launcher: Send + Sync {
    /// Spawn `plan.command` with stdin closed and both outputs piped
    fn launch(&self, plan: &ExecutionPlan) -> io::Result<SpawnedProcess>;
}

/// Launches real processes via `tokio::process`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLauncher;

impl Launcher for SystemLauncher {
    fn launch(&self, plan: &ExecutionPlan) -> io::Result<SpawnedProcess> {
        let (program, args) = plan
            .command
            .split_first()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty command"))?;

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        limits::install(&mut cmd, &plan.resource_limits);

        let mut child = cmd.spawn()?;
        debug!(program = %program, pid = ?child.id(), "process spawned");

        let stdout = child.stdout.take().map(|s| Box::new(s) as OutputPipe);
        let stderr = child.stderr.take().map(|s| Box::new(s) as OutputPipe);

        Ok(SpawnedProcess {
            stdout,
            stderr,
            handle: Box::new(ChildHandle { child }),
        })
    }
}

struct ChildHandle {
    child: Child,
}

#[async_trait]
impl ProcessHandle for ChildHandle {
    fn id(&self) -> Option<u32> {
        self.child.id()
    }

    async fn wait(&mut self) -> io::Result<i32> {
        let status = self.child.wait().await?;
        Ok(exit_code(status))
    }

    fn start_kill(&mut self) -> io::Result<()> {
        self.child.start_kill()
    }
}

/// Exit code, or the negated signal number when killed by a signal
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }
    -1
}

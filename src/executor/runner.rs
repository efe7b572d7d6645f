// Batch runner - wait for a process and collect its output
#![allow(dead_code)]

use crate::executor::process::{OutputPipe, ProcessHandle, SpawnedProcess};
use std::io;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tracing::{debug, warn};

/// How a batch run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    Completed {
        exit_code: i32,
        stdout: Vec<u8>,
        stderr: Vec<u8>,
    },
    /// Deadline passed; the process has been killed
    TimedOut,
}

/// Drain both pipes and wait for exit, racing `deadline`
pub async fn collect(
    process: SpawnedProcess,
    deadline: Duration,
    reap_grace: Duration,
) -> io::Result<BatchOutcome> {
    let SpawnedProcess {
        stdout,
        stderr,
        mut handle,
    } = process;

    let finished = tokio::time::timeout(deadline, async {
        tokio::try_join!(drain(stdout), drain(stderr), handle.wait())
    })
    .await;

    match finished {
        Ok(Ok((stdout, stderr, exit_code))) => Ok(BatchOutcome::Completed {
            exit_code,
            stdout,
            stderr,
        }),
        Ok(Err(e)) => {
            kill_and_reap(handle.as_mut(), reap_grace).await;
            Err(e)
        }
        Err(_) => {
            kill_and_reap(handle.as_mut(), reap_grace).await;
            Ok(BatchOutcome::TimedOut)
        }
    }
}

async fn drain(pipe: Option<OutputPipe>) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}

/// Force-kill and wait (bounded) for the exit to be collected
pub async fn kill_and_reap(handle: &mut dyn ProcessHandle, grace: Duration) {
    let pid = handle.id();
    if let Err(e) = handle.start_kill() {
        debug!(pid = ?pid, error = %e, "kill request failed, process likely exited");
    }
    match tokio::time::timeout(grace, handle.wait()).await {
        Ok(Ok(code)) => debug!(pid = ?pid, exit_code = code, "killed process reaped"),
        Ok(Err(e)) => warn!(pid = ?pid, error = %e, "failed to reap killed process"),
        Err(_) => warn!(
            pid = ?pid,
            grace_ms = grace.as_millis() as u64,
            "killed process not reaped in time"
        ),
    }
}

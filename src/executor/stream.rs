// Streaming runner - line-by-line output from a live process
#![allow(dead_code)]

use crate::executor::error::ExecutorError;
use crate::executor::gate::GatePermit;
use crate::executor::process::{OutputPipe, ProcessHandle, SpawnedProcess};
use crate::executor::runner::kill_and_reap;
use crate::executor::types::ExecutionPlan;
use crate::history::{RunEntry, RunHistory, RunMode, RunStatus};
use futures::Stream;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Message from an output pump
#[derive(Debug)]
enum PumpEvent {
    Line(String),
    /// The pump's pipe reached end-of-file
    Closed,
}

/// Settings a live run needs from the engine
#[derive(Debug, Clone)]
pub(crate) struct StreamSettings {
    pub channel_capacity: usize,
    pub line_limit: usize,
    pub exit_grace: Duration,
    pub reap_grace: Duration,
}

/// Lazy, finite sequence of output lines for one invocation
///
/// Yields `[stdout] ...` / `[stderr] ...` lines in arrival order, then a
/// single terminal item: `[meta] exit_code=<n>` or an error message.
/// Dropping it early kills the process and frees its gate slot.
pub struct ToolStream {
    state: State,
    failed: bool,
}

enum State {
    Message(Option<String>),
    Live(Box<LiveRun>),
    Finished,
}

enum Step {
    Line(String),
    /// Terminal item and whether the run failed
    Last(String, bool),
}

impl ToolStream {
    /// A stream consisting of one message, e.g. a rejection
    pub(crate) fn message(text: String) -> Self {
        Self {
            state: State::Message(Some(text)),
            failed: true,
        }
    }

    pub(crate) fn live(run: LiveRun) -> Self {
        Self {
            state: State::Live(Box::new(run)),
            failed: false,
        }
    }

    /// Next output item; `None` once the terminal item has been yielded
    pub async fn next(&mut self) -> Option<String> {
        match &mut self.state {
            State::Message(message) => {
                let message = message.take();
                self.state = State::Finished;
                message
            }
            State::Live(run) => {
                let step = run.next_step().await;
                match step {
                    Step::Line(line) => Some(line),
                    Step::Last(line, failed) => {
                        self.failed = failed;
                        // Drops the run, releasing the gate slot
                        self.state = State::Finished;
                        Some(line)
                    }
                }
            }
            State::Finished => None,
        }
    }

    /// OS process id while the process is live
    pub fn process_id(&self) -> Option<u32> {
        match &self.state {
            State::Live(run) => run.pid,
            _ => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, State::Finished)
    }

    /// Rejected, failed to launch, timed out or exited non-zero
    pub fn failed(&self) -> bool {
        self.failed
    }

    /// Adapt into a `futures::Stream`
    pub fn into_stream(self) -> impl Stream<Item = String> + Send {
        futures::stream::unfold(self, |mut stream| async move {
            let item = stream.next().await?;
            Some((item, stream))
        })
    }

    /// Drain every remaining item
    pub async fn collect_lines(mut self) -> Vec<String> {
        let mut lines = Vec::new();
        while let Some(line) = self.next().await {
            lines.push(line);
        }
        lines
    }
}

/// Process plus the pumps reading its output
pub(crate) struct LiveRun {
    tool: String,
    arguments: String,
    timeout: Duration,
    timeout_secs: f64,
    pid: Option<u32>,
    handle: Box<dyn ProcessHandle>,
    events: mpsc::Receiver<PumpEvent>,
    pumps: JoinSet<()>,
    cancel: CancellationToken,
    open_pipes: usize,
    started: Instant,
    settings: StreamSettings,
    history: Arc<RunHistory>,
    finished: bool,
    _permit: GatePermit,
}

impl LiveRun {
    pub(crate) fn start(
        process: SpawnedProcess,
        plan: &ExecutionPlan,
        arguments: &str,
        permit: GatePermit,
        history: Arc<RunHistory>,
        settings: StreamSettings,
    ) -> Self {
        let SpawnedProcess {
            stdout,
            stderr,
            handle,
        } = process;

        let (tx, events) = mpsc::channel(settings.channel_capacity.max(1));
        let cancel = CancellationToken::new();
        let mut pumps = JoinSet::new();
        let mut open_pipes = 0;

        for (pipe, label) in [(stdout, "stdout"), (stderr, "stderr")] {
            if let Some(pipe) = pipe {
                pumps.spawn(pump(
                    pipe,
                    label,
                    settings.line_limit,
                    tx.clone(),
                    cancel.child_token(),
                ));
                open_pipes += 1;
            }
        }

        let pid = handle.id();
        info!(
            tool = %plan.tool.name,
            pid = ?pid,
            timeout_secs = plan.timeout_secs,
            "streaming run started"
        );

        Self {
            tool: plan.tool.name.clone(),
            arguments: arguments.to_string(),
            timeout: plan.timeout(),
            timeout_secs: plan.timeout_secs,
            pid,
            handle,
            events,
            pumps,
            cancel,
            open_pipes,
            started: Instant::now(),
            settings,
            history,
            finished: false,
            _permit: permit,
        }
    }

    async fn next_step(&mut self) -> Step {
        loop {
            if self.open_pipes == 0 {
                let exit_code = self.finish().await;
                return Step::Last(format!("[meta] exit_code={}", exit_code), exit_code != 0);
            }
            match tokio::time::timeout(self.timeout, self.events.recv()).await {
                Ok(Some(PumpEvent::Line(line))) => return Step::Line(line),
                Ok(Some(PumpEvent::Closed)) => self.open_pipes -= 1,
                // Every pump is gone
                Ok(None) => self.open_pipes = 0,
                Err(_) => return Step::Last(self.expire().await, true),
            }
        }
    }

    /// Output closed: collect the exit code and record the run
    async fn finish(&mut self) -> i32 {
        let waited = tokio::time::timeout(self.settings.exit_grace, self.handle.wait()).await;
        let exit_code = match waited {
            Ok(Ok(code)) => code,
            Ok(Err(e)) => {
                warn!(tool = %self.tool, error = %e, "failed to collect exit status");
                -1
            }
            Err(_) => {
                warn!(
                    tool = %self.tool,
                    pid = ?self.pid,
                    "process kept running after closing its output, killing"
                );
                kill_and_reap(self.handle.as_mut(), self.settings.reap_grace).await;
                -1
            }
        };
        self.finished = true;

        let duration = self.started.elapsed().as_secs_f64();
        self.history.record(RunEntry {
            tool: self.tool.clone(),
            arguments: self.arguments.clone(),
            exit_code: RunStatus::Exited(exit_code),
            duration: Some(duration),
            mode: RunMode::Stream,
        });
        info!(
            tool = %self.tool,
            exit_code,
            duration_ms = (duration * 1000.0) as u64,
            "streaming run finished"
        );

        exit_code
    }

    /// No output within the deadline
    async fn expire(&mut self) -> String {
        self.cancel.cancel();
        kill_and_reap(self.handle.as_mut(), self.settings.reap_grace).await;
        self.pumps.abort_all();
        self.finished = true;

        self.history.record(RunEntry {
            tool: self.tool.clone(),
            arguments: self.arguments.clone(),
            exit_code: RunStatus::Timeout,
            duration: None,
            mode: RunMode::Stream,
        });
        warn!(tool = %self.tool, timeout_secs = self.timeout_secs, "streaming run timed out");

        ExecutorError::Timeout(self.timeout_secs).render()
    }
}

impl Drop for LiveRun {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.pumps.abort_all();
        if !self.finished {
            debug!(
                tool = %self.tool,
                pid = ?self.pid,
                "stream dropped before completion, killing process"
            );
            if let Err(e) = self.handle.start_kill() {
                debug!(tool = %self.tool, error = %e, "kill on drop failed");
            }
        }
    }
}

/// Forward one pipe's lines into the shared channel
///
/// A line longer than `line_limit` bytes is forwarded in pieces.
async fn pump(
    pipe: OutputPipe,
    label: &'static str,
    line_limit: usize,
    tx: mpsc::Sender<PumpEvent>,
    cancel: CancellationToken,
) {
    let mut reader = BufReader::new(pipe);
    let mut buf = Vec::new();
    let limit = line_limit.max(1) as u64;
    let mut split = false;

    loop {
        buf.clear();
        let mut limited = (&mut reader).take(limit);
        let read = tokio::select! {
            _ = cancel.cancelled() => return,
            read = limited.read_until(b'\n', &mut buf) => read,
        };
        match read {
            Ok(0) => break,
            Ok(_) => {
                let complete = buf.ends_with(b"\n");
                // Terminator of a line already forwarded in pieces
                if split && buf == b"\n" {
                    split = false;
                    continue;
                }
                split = !complete;

                let text = String::from_utf8_lossy(&buf);
                let line = format!("[{}] {}", label, text.trim_end());
                if tx.send(PumpEvent::Line(line)).await.is_err() {
                    return;
                }
            }
            Err(e) => {
                debug!(pipe = label, error = %e, "output pipe read failed");
                break;
            }
        }
    }

    let _ = tx.send(PumpEvent::Closed).await;
}

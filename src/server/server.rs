// Server loop - JSON lines over stdio
#![allow(dead_code)]

use crate::server::config::ServerConfig;
use crate::server::error::{Result, ServerError};
use crate::server::handler::{Handler, Reply};
use crate::server::lines::{Frame, RequestLines};
use crate::server::protocol::{Response, decode_request, encode_response};
use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::signal;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Serves requests read line by line; each request runs on its own task
pub struct Server {
    handler: Arc<Handler>,
    config: ServerConfig,
}

impl Server {
    pub fn new(handler: Arc<Handler>, config: ServerConfig) -> Self {
        Self { handler, config }
    }

    /// Serve on the process's stdin/stdout
    pub async fn serve_stdio(self) -> Result<()> {
        self.run(tokio::io::stdin(), tokio::io::stdout(), true).await
    }

    /// Serve until input closes (or Ctrl-C when `handle_signals`)
    ///
    /// On end of input, in-flight requests finish and their responses are
    /// written; on Ctrl-C they are aborted, which kills any running tool.
    pub async fn run<R, W>(self, input: R, output: W, handle_signals: bool) -> Result<()>
    where
        R: AsyncRead + Unpin + Send,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<Response>(self.config.outbound_capacity.max(1));
        let writer = tokio::spawn(write_responses(output, rx));

        let mut lines = RequestLines::new(input, self.config.max_line_bytes);
        let mut tasks = JoinSet::new();
        let mut interrupted = false;

        info!("server ready, reading requests");

        loop {
            tokio::select! {
                frame = lines.next_frame() => match frame {
                    Ok(Frame::Line(bytes)) => match String::from_utf8(bytes) {
                        Ok(line) => self.accept(line, &tx, &mut tasks),
                        Err(_) => reject(ServerError::InvalidUtf8, &tx, &mut tasks),
                    },
                    Ok(Frame::TooLong(len)) => {
                        reject(ServerError::LineTooLong(len), &tx, &mut tasks)
                    }
                    Ok(Frame::Eof) => {
                        info!("input closed");
                        break;
                    }
                    Err(e) => {
                        error!(error = %e, "failed to read request input");
                        break;
                    }
                },
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = joined
                        && e.is_panic()
                    {
                        error!(error = %e, "request task panicked");
                    }
                }
                _ = async {
                    signal::ctrl_c().await.ok();
                }, if handle_signals => {
                    info!("Received shutdown signal");
                    interrupted = true;
                    break;
                }
            }
        }

        if interrupted {
            tasks.shutdown().await;
        } else {
            while tasks.join_next().await.is_some() {}
        }

        drop(tx);
        match writer.await {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "response writer task failed");
                Err(ServerError::WriterClosed)
            }
        }
    }

    fn accept(&self, line: String, tx: &mpsc::Sender<Response>, tasks: &mut JoinSet<()>) {
        if line.trim().is_empty() {
            return;
        }

        let (id, operation) = decode_request(&line);
        let tx = tx.clone();
        let operation = match operation {
            Ok(op) => op,
            Err(e) => {
                warn!(id = %id, error = %e, "invalid request");
                tasks.spawn(async move {
                    let _ = tx.send(Response::result(id, format!("Error: {}", e), true)).await;
                });
                return;
            }
        };

        debug!(id = %id, op = operation.name(), "request received");
        let handler = self.handler.clone();
        tasks.spawn(async move {
            if let Err(e) = respond(&handler, id, operation, &tx).await {
                debug!(error = %e, "response dropped");
            }
        });
    }
}

/// Answer input that never became a request; the id is unknown
fn reject(err: ServerError, tx: &mpsc::Sender<Response>, tasks: &mut JoinSet<()>) {
    warn!(error = %err, "rejecting request line");
    let tx = tx.clone();
    tasks.spawn(async move {
        let _ = tx.send(Response::result(Value::Null, format!("Error: {}", err), true)).await;
    });
}

/// Run one operation and queue its response lines
async fn respond(
    handler: &Handler,
    id: Value,
    operation: crate::server::protocol::Operation,
    tx: &mpsc::Sender<Response>,
) -> Result<()> {
    match handler.call(operation).await {
        Reply::Output(output) => {
            send(tx, Response::result(id, output.content, output.is_error)).await
        }
        Reply::Stream(mut stream) => {
            while let Some(line) = stream.next().await {
                // A closed writer drops the stream, which kills the tool
                send(tx, Response::chunk(id.clone(), line)).await?;
            }
            send(tx, Response::end(id, stream.failed())).await
        }
    }
}

async fn send(tx: &mpsc::Sender<Response>, response: Response) -> Result<()> {
    tx.send(response).await.map_err(|_| ServerError::WriterClosed)
}

/// Single writer: responses never interleave mid-line
async fn write_responses<W>(mut output: W, mut rx: mpsc::Receiver<Response>) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = rx.recv().await {
        let line = match encode_response(&response) {
            Ok(line) => line,
            Err(e) => {
                error!(error = %e, "failed to encode response");
                continue;
            }
        };
        output.write_all(line.as_bytes()).await?;
        output.flush().await?;
    }
    Ok(())
}

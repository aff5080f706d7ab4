//! One-shot worker process exchange.
//!
//! Each render spawns a fresh process, walks through the protocol in
//! [`super::protocol`], and tears the process down. A worker that is still
//! alive once the exchange ends is killed.

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout};
use tokio::task::JoinHandle;

use super::command::WorkerCommand;
use super::exports::classify_exports;
use super::protocol::{ExportsReply, RenderCommand, RenderReply, RenderRequest, encode_line};
use super::{RenderCause, RenderError};
use crate::debug;

/// Bytes of worker stderr kept for error reports.
const STDERR_TAIL: usize = 2048;

/// Run one render exchange, bounded by `timeout` when set.
pub async fn render_in_worker(
    command: &WorkerCommand,
    request: &RenderRequest<'_>,
    timeout: Option<Duration>,
) -> Result<String, RenderError> {
    let Some(limit) = timeout else {
        return exchange(command, request).await;
    };

    // Dropping the exchange drops the child, which kills it.
    match tokio::time::timeout(limit, exchange(command, request)).await {
        Ok(result) => result,
        Err(_) => Err(RenderError::render(
            request.asset_name,
            RenderCause::Timeout(limit),
        )),
    }
}

async fn exchange(
    command: &WorkerCommand,
    request: &RenderRequest<'_>,
) -> Result<String, RenderError> {
    let mut worker = WorkerProcess::spawn(command)
        .map_err(|cause| RenderError::render(request.asset_name, cause))?;
    let result = talk(&mut worker, request).await;
    worker.close().await;
    result
}

async fn talk(worker: &mut WorkerProcess, request: &RenderRequest<'_>) -> Result<String, RenderError> {
    let asset = request.asset_name;
    let wrap = |cause: RenderCause| RenderError::render(asset, cause);

    worker.send(request).await.map_err(wrap)?;
    let exports = match worker.recv::<ExportsReply>().await.map_err(wrap)? {
        ExportsReply::Exports { exports } => exports,
        ExportsReply::Error { error } => return Err(wrap(error.into())),
    };

    let choice = classify_exports(&exports);
    let Some(name) = choice.export_name() else {
        return Err(RenderError::AmbiguousComponent {
            asset: asset.to_owned(),
            exports: exports.into_iter().map(|e| e.name).collect(),
        });
    };
    debug!("worker"; "{} renders export `{}`", asset, name);

    worker.send(&RenderCommand { render: name }).await.map_err(wrap)?;
    match worker.recv::<RenderReply>().await.map_err(wrap)? {
        RenderReply::Rendered { rendered_file } => Ok(rendered_file),
        RenderReply::Error { error } => Err(wrap(error.into())),
    }
}

// ============================================================================
// Process handle
// ============================================================================

struct WorkerProcess {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: BufReader<ChildStdout>,
    stderr: Option<JoinHandle<String>>,
}

impl WorkerProcess {
    fn spawn(command: &WorkerCommand) -> Result<Self, RenderCause> {
        let mut child = command.to_command().spawn().map_err(RenderCause::Spawn)?;

        let stdin = child.stdin.take();
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| RenderCause::Io(std::io::Error::other("worker stdout not captured")))?;

        // Drain stderr continuously so a chatty worker never blocks on a full pipe.
        let stderr = child.stderr.take().map(|mut pipe| {
            tokio::spawn(async move {
                let mut buf = Vec::new();
                pipe.read_to_end(&mut buf).await.ok();
                tail(&buf)
            })
        });

        Ok(Self {
            child,
            stdin,
            stdout: BufReader::new(stdout),
            stderr,
        })
    }

    async fn send<T: Serialize>(&mut self, message: &T) -> Result<(), RenderCause> {
        let line = encode_line(message).map_err(RenderCause::Protocol)?;
        let Some(stdin) = self.stdin.as_mut() else {
            return Err(self.exited().await);
        };

        let written = match stdin.write_all(&line).await {
            Ok(()) => stdin.flush().await,
            Err(err) => Err(err),
        };
        match written {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::BrokenPipe => Err(self.exited().await),
            Err(err) => Err(RenderCause::Io(err)),
        }
    }

    async fn recv<T: DeserializeOwned>(&mut self) -> Result<T, RenderCause> {
        let mut line = String::new();
        loop {
            line.clear();
            let read = self
                .stdout
                .read_line(&mut line)
                .await
                .map_err(RenderCause::Io)?;
            if read == 0 {
                return Err(self.exited().await);
            }
            if !line.trim().is_empty() {
                break;
            }
        }
        serde_json::from_str(line.trim()).map_err(RenderCause::Protocol)
    }

    /// The worker went away: report how it exited.
    async fn exited(&mut self) -> RenderCause {
        self.stdin = None;
        match self.child.wait().await {
            Ok(status) => RenderCause::Exited {
                status,
                stderr: self.stderr_tail().await,
            },
            Err(err) => RenderCause::Io(err),
        }
    }

    async fn stderr_tail(&mut self) -> String {
        match self.stderr.take() {
            Some(handle) => handle.await.unwrap_or_default(),
            None => String::new(),
        }
    }

    /// Close stdin and make sure the process is gone.
    async fn close(mut self) {
        self.stdin = None;
        if matches!(self.child.try_wait(), Ok(None)) {
            self.child.start_kill().ok();
        }
        self.child.wait().await.ok();
        if let Some(handle) = self.stderr.take() {
            handle.abort();
        }
    }
}

/// Last [`STDERR_TAIL`] bytes of `buf` as lossy text.
fn tail(buf: &[u8]) -> String {
    let start = buf.len().saturating_sub(STDERR_TAIL);
    String::from_utf8_lossy(&buf[start..]).trim().to_owned()
}

// ============================================================================
// Tests
// ============================================================================

//! Session engine: one request/response exchange with a worker process.
//!
//! [`run`] owns the whole lifecycle: spawn, send the request, half-close
//! stdin, multiplex the two output streams, dispatch informational messages,
//! and — on every exit path, including cancellation — reap the process.
//! There is exactly one suspension point per loop turn (the multiplexer
//! wait); the request is written once before the loop and nothing is
//! written afterwards.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWriteExt};
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::protocol::{Message, Request};
use crate::session::mux::{MuxEvent, OutputMux};
use crate::session::{Dispatcher, SessionError, SessionErrorKind};
use crate::AppError;

/// How long to keep collecting trailing stderr once stdout has closed
/// without a terminal message. Bounded so a worker that holds stderr open
/// cannot stall the failure path.
const DIAGNOSTIC_DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Configuration for spawning a worker process.
#[derive(Debug, Clone)]
pub struct SpawnConfig {
    /// Executable to invoke (e.g. `adb`).
    pub program: String,
    /// Arguments placed before nothing else — the request itself travels on
    /// stdin, never on the command line.
    pub args: Vec<String>,
    /// Abort the session when an informational dispatch returns an error.
    /// Off by default; a rendering hiccup should not kill an exchange.
    pub abort_on_dispatch_error: bool,
}

/// Run one request/response exchange to completion or failure.
///
/// Writes `request` to the worker's stdin, closes stdin to signal
/// end-of-request, then multiplexes stdout (structured messages) and stderr
/// (verbatim diagnostics) until a terminal message arrives. Informational
/// messages are handed to `dispatcher` in the order they completed decoding.
/// The worker is killed and reaped before this function returns, whatever
/// the outcome; cancelling `cancel` interrupts the wait and takes the same
/// cleanup path.
///
/// # Errors
///
/// Returns a [`SessionError`] carrying the failure kind and every stderr
/// line collected up to that point. See [`SessionErrorKind`] for the cases.
pub async fn run(
    config: &SpawnConfig,
    request: &Request,
    dispatcher: &mut dyn Dispatcher,
    cancel: &CancellationToken,
) -> std::result::Result<Message, SessionError> {
    let wire = request
        .to_wire()
        .map_err(|err| SessionError::new(SessionErrorKind::ProcessSpawnFailure, err.to_string()))?;

    let mut child = spawn_worker(config)?;

    let stdin = child.stdin.take();
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let (Some(mut stdin), Some(stdout), Some(stderr)) = (stdin, stdout, stderr) else {
        reap(&mut child).await;
        return Err(SessionError::new(
            SessionErrorKind::ProcessSpawnFailure,
            "failed to capture worker stdio",
        ));
    };

    debug!(kind = request.kind(), "sending request");
    let send = async {
        stdin.write_all(&wire).await?;
        stdin.shutdown().await
    };
    if let Err(err) = send.await {
        reap(&mut child).await;
        // The exchange never began; this is a startup failure, not a
        // mid-session closure.
        return Err(SessionError::new(
            SessionErrorKind::ProcessSpawnFailure,
            format!("failed to deliver request: {err}"),
        ));
    }
    // Half-close: dropping stdin releases the write end so the worker sees
    // end-of-request and begins responding.
    drop(stdin);

    let mut mux = OutputMux::new(stdout, stderr);
    let result = exchange(&mut mux, dispatcher, cancel, config.abort_on_dispatch_error).await;

    reap(&mut child).await;
    result
}

/// The multiplex/dispatch loop, independent of any real process.
///
/// Public so the loop can be exercised against in-memory streams. Returns
/// the terminal message, or a [`SessionError`] carrying all diagnostics
/// buffered so far.
///
/// # Errors
///
/// Same failure kinds as [`run`], minus `ProcessSpawnFailure`.
pub async fn exchange<O, E>(
    mux: &mut OutputMux<O, E>,
    dispatcher: &mut dyn Dispatcher,
    cancel: &CancellationToken,
    abort_on_dispatch_error: bool,
) -> std::result::Result<Message, SessionError>
where
    O: AsyncRead + Unpin,
    E: AsyncRead + Unpin,
{
    let mut diagnostics: Vec<String> = Vec::new();

    loop {
        let event = tokio::select! {
            biased;

            () = cancel.cancelled() => {
                debug!("session cancelled by caller");
                return Err(SessionError::new(
                    SessionErrorKind::Cancelled,
                    "run abandoned before a terminal message arrived",
                )
                .with_diagnostics(diagnostics));
            }

            event = mux.next_event() => event,
        };

        match event {
            Ok(MuxEvent::Diagnostic(line)) => {
                dispatcher.diagnostic(&line);
                diagnostics.push(line);
            }
            Ok(MuxEvent::Message(message)) if message.is_terminal() => {
                debug!(kind = message.kind(), "terminal message received");
                return Ok(message);
            }
            Ok(MuxEvent::Message(message)) => {
                if let Err(err) = dispatcher.dispatch(&message) {
                    if abort_on_dispatch_error {
                        return Err(SessionError::new(
                            SessionErrorKind::DispatchFailed,
                            err.to_string(),
                        )
                        .with_diagnostics(diagnostics));
                    }
                    warn!(error = %err, "dispatch failed, continuing session");
                }
            }
            Ok(MuxEvent::OutputClosed) => {
                // Give the worker's final stderr a moment to arrive so the
                // failure report names the actual cause.
                if let Ok(trailing) =
                    tokio::time::timeout(DIAGNOSTIC_DRAIN_GRACE, mux.drain_diagnostics()).await
                {
                    for line in trailing {
                        dispatcher.diagnostic(&line);
                        diagnostics.push(line);
                    }
                }
                return Err(SessionError::new(
                    SessionErrorKind::UnexpectedClosure,
                    "process ended without a result",
                )
                .with_diagnostics(diagnostics));
            }
            Err(AppError::Protocol(detail)) => {
                return Err(
                    SessionError::new(SessionErrorKind::MalformedMessage, detail)
                        .with_diagnostics(diagnostics),
                );
            }
            Err(err) => {
                // Stdout read failure: the stream is gone without a terminal
                // message, which is a closure as far as the protocol goes.
                return Err(SessionError::new(
                    SessionErrorKind::UnexpectedClosure,
                    format!("output stream failed: {err}"),
                )
                .with_diagnostics(diagnostics));
            }
        }
    }
}

/// Spawn the worker with piped stdio. `kill_on_drop` guarantees the process
/// cannot be orphaned even if the calling future is dropped mid-exchange.
fn spawn_worker(config: &SpawnConfig) -> std::result::Result<Child, SessionError> {
    Command::new(&config.program)
        .args(&config.args)
        .stdin(std::process::Stdio::piped())
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|err| {
            SessionError::new(
                SessionErrorKind::ProcessSpawnFailure,
                format!("failed to spawn {}: {err}", config.program),
            )
        })
}

/// Kill and reap the worker, releasing both pipes. Errors are ignored: the
/// process may already have exited, which is the normal case after a
/// terminal message.
async fn reap(child: &mut Child) {
    if let Err(err) = child.kill().await {
        debug!(error = %err, "worker already exited before kill");
    }
    let _ = child.wait().await;
}

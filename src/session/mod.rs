//! Agent session protocol engine.
//!
//! One session is one request/response exchange with a spawned worker
//! process: the request goes to the worker's stdin (which is then closed),
//! structured messages come back on stdout, and free-form diagnostics on
//! stderr. The submodules split the engine along the seams of that exchange:
//!
//! - [`codec`]: incremental decoder turning raw stdout bytes into messages.
//! - [`mux`]: readiness multiplexer over the stdout and stderr streams.
//! - [`engine`]: process lifecycle and the dispatch loop.

pub mod codec;
pub mod engine;
pub mod mux;

use std::fmt::{Display, Formatter};

pub use engine::{run, SpawnConfig};

use crate::protocol::Message;
use crate::Result;

/// Classification of a failed session.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SessionErrorKind {
    /// The worker process could not be started, or the request could not be
    /// delivered to it.
    ProcessSpawnFailure,
    /// Stdout bytes can never parse to a valid message.
    MalformedMessage,
    /// Stdout closed before a terminal message was produced.
    UnexpectedClosure,
    /// An informational dispatch failed and the session is configured to
    /// abort on dispatch errors.
    DispatchFailed,
    /// The caller abandoned the run before a terminal message arrived.
    Cancelled,
}

impl Display for SessionErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ProcessSpawnFailure => write!(f, "process spawn failure"),
            Self::MalformedMessage => write!(f, "malformed message"),
            Self::UnexpectedClosure => write!(f, "unexpected closure"),
            Self::DispatchFailed => write!(f, "dispatch failed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A fatal session outcome: the kind of failure, detail text, and every
/// stderr line buffered before the failure.
#[derive(Debug, Clone)]
pub struct SessionError {
    /// What went wrong.
    pub kind: SessionErrorKind,
    /// Human-readable detail.
    pub detail: String,
    /// Diagnostic lines the worker wrote to stderr before the failure.
    pub diagnostics: Vec<String>,
}

impl SessionError {
    /// Build a session error with no buffered diagnostics.
    #[must_use]
    pub fn new(kind: SessionErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
            diagnostics: Vec::new(),
        }
    }

    /// Attach the diagnostics buffered up to the point of failure.
    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: Vec<String>) -> Self {
        self.diagnostics = diagnostics;
        self
    }
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.detail)
    }
}

impl std::error::Error for SessionError {}

/// Receiver side of the dispatch table.
///
/// The engine calls [`Dispatcher::dispatch`] once per informational message,
/// in the order the messages completed decoding, and
/// [`Dispatcher::diagnostic`] once per stderr line. The terminal message is
/// not dispatched; it is returned from [`run`].
pub trait Dispatcher {
    /// Handle one informational message.
    ///
    /// # Errors
    ///
    /// An error here aborts the session only when
    /// [`SpawnConfig::abort_on_dispatch_error`] is set; otherwise it is
    /// logged and the session continues.
    fn dispatch(&mut self, message: &Message) -> Result<()>;

    /// Handle one verbatim stderr line. Never parsed as structured data.
    fn diagnostic(&mut self, line: &str) {
        tracing::error!(target: "agent", "{line}");
    }
}

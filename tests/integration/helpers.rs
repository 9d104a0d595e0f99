//! Shared test dispatcher recording everything the engine hands it.

use modbridge::protocol::Message;
use modbridge::session::Dispatcher;
use modbridge::{AppError, Result};

/// Dispatcher that records dispatched messages and diagnostic lines, and can
/// be told to fail every dispatch.
#[derive(Debug, Default)]
pub struct RecordingDispatcher {
    /// Informational messages, in dispatch order.
    pub dispatched: Vec<Message>,
    /// Stderr lines, in arrival order.
    pub diagnostics: Vec<String>,
    /// When set, every `dispatch` call returns an error (after recording).
    pub fail_dispatch: bool,
}

impl Dispatcher for RecordingDispatcher {
    fn dispatch(&mut self, message: &Message) -> Result<()> {
        self.dispatched.push(message.clone());
        if self.fail_dispatch {
            return Err(AppError::Io("dispatch sink failed".into()));
        }
        Ok(())
    }

    fn diagnostic(&mut self, line: &str) {
        self.diagnostics.push(line.to_owned());
    }
}

//! Readiness multiplexer over the worker's stdout and stderr streams.
//!
//! Waits on both streams simultaneously and reports whichever produced data
//! first, so a chatty stderr cannot block message decoding and vice versa.
//! Fairness is best-effort: `tokio::select!` polls its branches in random
//! order, which is enough to keep one continuously-ready stream from
//! starving the other.

use futures_util::StreamExt;
use tokio::io::AsyncRead;
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};
use tracing::warn;

use crate::protocol::Message;
use crate::session::codec::{MessageCodec, MAX_MESSAGE_BYTES};
use crate::{AppError, Result};

/// One readiness outcome from [`OutputMux::next_event`].
#[derive(Debug)]
pub enum MuxEvent {
    /// A complete message decoded from stdout.
    Message(Message),
    /// One verbatim line read from stderr.
    Diagnostic(String),
    /// Stdout reached end of stream (reported once; stderr closing is not an
    /// event, that stream simply leaves the wait set).
    OutputClosed,
}

/// Multiplexer over a message-bearing output stream and a line-oriented
/// diagnostic stream.
///
/// Generic over the reader types so tests can drive it with in-memory
/// streams; production use wraps the child process's stdout and stderr.
#[derive(Debug)]
pub struct OutputMux<O, E> {
    output: FramedRead<O, MessageCodec>,
    diagnostic: FramedRead<E, LinesCodec>,
    diagnostic_open: bool,
}

impl<O, E> OutputMux<O, E>
where
    O: AsyncRead + Unpin,
    E: AsyncRead + Unpin,
{
    /// Wrap the two streams. Each stream gets its own accumulator; bytes are
    /// never shared or merged across them.
    #[must_use]
    pub fn new(output: O, diagnostic: E) -> Self {
        Self {
            output: FramedRead::new(output, MessageCodec::new()),
            diagnostic: FramedRead::new(
                diagnostic,
                LinesCodec::new_with_max_length(MAX_MESSAGE_BYTES),
            ),
            diagnostic_open: true,
        }
    }

    /// Wait until either stream yields something.
    ///
    /// Returns [`MuxEvent::OutputClosed`] when stdout ends. When stderr
    /// ends, the mux keeps waiting on stdout alone. A stderr framing error
    /// (over-long line, I/O failure) is logged and drops the diagnostic
    /// stream from the wait set; diagnostics are best-effort and must not
    /// kill the session.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Protocol`] when stdout bytes can never decode to
    /// a valid message, or [`AppError::Io`] on a stdout read failure.
    pub async fn next_event(&mut self) -> Result<MuxEvent> {
        loop {
            if !self.diagnostic_open {
                return Self::output_event(self.output.next().await);
            }

            tokio::select! {
                item = self.output.next() => {
                    return Self::output_event(item);
                }
                item = self.diagnostic.next() => {
                    match item {
                        Some(Ok(line)) => return Ok(MuxEvent::Diagnostic(line)),
                        Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
                            warn!("diagnostic line exceeded {MAX_MESSAGE_BYTES} bytes, dropping stderr");
                            self.diagnostic_open = false;
                        }
                        Some(Err(LinesCodecError::Io(err))) => {
                            warn!(error = %err, "diagnostic stream read failed, dropping stderr");
                            self.diagnostic_open = false;
                        }
                        None => self.diagnostic_open = false,
                    }
                }
            }
        }
    }

    /// Read stderr to end of stream, returning whatever lines remain.
    ///
    /// Used after stdout closes so that failure reports carry the worker's
    /// final diagnostics; the caller bounds this with a timeout.
    pub async fn drain_diagnostics(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        if !self.diagnostic_open {
            return lines;
        }
        while let Some(item) = self.diagnostic.next().await {
            match item {
                Ok(line) => lines.push(line),
                Err(_) => break,
            }
        }
        self.diagnostic_open = false;
        lines
    }

    fn output_event(item: Option<Result<Message>>) -> Result<MuxEvent> {
        match item {
            Some(Ok(message)) => Ok(MuxEvent::Message(message)),
            Some(Err(err)) => Err(err),
            None => Ok(MuxEvent::OutputClosed),
        }
    }
}

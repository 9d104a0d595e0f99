//! Incremental message decoder for the agent's stdout stream.
//!
//! Raw reads are not guaranteed to align with message boundaries: a message
//! may arrive split across chunks, and one chunk may carry several complete
//! messages back to back. [`MessageCodec`] therefore frames on the JSON
//! syntax itself rather than on a delimiter — each decode attempt parses
//! exactly one value from the front of the accumulator and leaves the
//! remaining bytes buffered for the next attempt.
//!
//! Use as the codec parameter of [`tokio_util::codec::FramedRead`].

use bytes::{Buf, BytesMut};
use tokio_util::codec::Decoder;

use crate::protocol::Message;
use crate::{AppError, Result};

/// Maximum size of a single message: 1 MiB.
///
/// An accumulator that grows past this limit without completing a value
/// causes [`MessageCodec::decode`] to return [`AppError::Protocol`] rather
/// than buffering without bound.
pub const MAX_MESSAGE_BYTES: usize = 1_048_576;

/// Decoder turning accumulated stdout bytes into [`Message`]s.
///
/// # Decoder
///
/// Returns `Ok(None)` while the buffer holds only an incomplete value
/// (buffering, not an error). Bytes that can never become valid JSON return
/// [`AppError::Protocol`]. The agent writes a newline after each message;
/// any whitespace between values is skipped but never required.
#[derive(Debug, Default)]
pub struct MessageCodec;

impl MessageCodec {
    /// Create a new codec.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for MessageCodec {
    type Item = Message;
    type Error = AppError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Message>> {
        // Inter-message whitespace carries no data.
        while src.first().is_some_and(u8::is_ascii_whitespace) {
            src.advance(1);
        }
        if src.is_empty() {
            return Ok(None);
        }

        // One parse attempt against the accumulator's current content. The
        // stream deserializer reports how many bytes the value consumed, so
        // a buffer holding two back-to-back values yields them one per call.
        let attempt = {
            let mut stream =
                serde_json::Deserializer::from_slice(&src[..]).into_iter::<serde_json::Value>();
            match stream.next() {
                Some(Ok(value)) => Ok(Some((value, stream.byte_offset()))),
                Some(Err(err)) if err.is_eof() => Ok(None),
                Some(Err(err)) => Err(err),
                None => Ok(None),
            }
        };

        match attempt {
            Ok(Some((value, consumed))) => {
                // The ceiling applies to complete values too; a chunk can
                // deliver an oversized message in one read.
                if consumed > MAX_MESSAGE_BYTES {
                    return Err(AppError::Protocol(format!(
                        "message too large: exceeded {MAX_MESSAGE_BYTES} bytes"
                    )));
                }
                let message = Message::from_value(value)?;
                src.advance(consumed);
                Ok(Some(message))
            }
            Ok(None) => {
                if src.len() > MAX_MESSAGE_BYTES {
                    return Err(AppError::Protocol(format!(
                        "message too large: exceeded {MAX_MESSAGE_BYTES} bytes"
                    )));
                }
                Ok(None)
            }
            Err(err) => Err(AppError::Protocol(format!("malformed message: {err}"))),
        }
    }

    /// Decode at end of stream: leftover bytes that never completed a value
    /// are a truncated message, not silence.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Message>> {
        match self.decode(src)? {
            Some(message) => Ok(Some(message)),
            None if src.is_empty() => Ok(None),
            None => Err(AppError::Protocol(
                "truncated message at end of stream".to_owned(),
            )),
        }
    }
}

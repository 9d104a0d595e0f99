//! Unit tests for the incremental message decoder.
//!
//! Covers:
//! - one complete message decodes as soon as it is present, delimiter or not
//! - chunks holding several back-to-back messages yield them all
//! - splitting a message at every byte boundary decodes identically
//! - incomplete buffers are kept, not errored
//! - syntactically unrecoverable bytes fail fast
//! - truncation at end of stream is reported
//! - the per-message size ceiling is enforced

use bytes::BytesMut;
use tokio_util::codec::Decoder;

use modbridge::protocol::{LogLevel, Message};
use modbridge::session::codec::{MessageCodec, MAX_MESSAGE_BYTES};
use modbridge::AppError;

const LOG_LINE: &str = r#"{"kind":"Log","level":"info","text":"hi"}"#;

/// A complete message is decoded as soon as it is fully buffered; no closing
/// delimiter is required.
#[test]
fn complete_message_decodes_without_trailing_delimiter() {
    let mut codec = MessageCodec::new();
    let mut buf = BytesMut::from(LOG_LINE);

    let message = codec
        .decode(&mut buf)
        .expect("decode must succeed")
        .expect("a complete message must be decoded");

    match message {
        Message::Log(record) => {
            assert_eq!(record.level, LogLevel::Info);
            assert_eq!(record.text, "hi");
        }
        other => panic!("expected Message::Log, got: {other:?}"),
    }
    assert!(buf.is_empty(), "the decoded bytes must be consumed");
}

/// The newline the agent writes between messages is skipped, and the buffer
/// ends up empty after the message and its separator are consumed.
#[test]
fn newline_separator_is_consumed() {
    let mut codec = MessageCodec::new();
    let mut buf = BytesMut::from(format!("{LOG_LINE}\n").as_str());

    let first = codec.decode(&mut buf).expect("decode must succeed");
    assert!(first.is_some(), "the message must be decoded");

    let second = codec.decode(&mut buf).expect("decode must succeed");
    assert!(second.is_none(), "no further message must be present");
    assert!(buf.is_empty(), "trailing whitespace must be consumed");
}

/// Two complete messages in one chunk, with no separator at all, decode as
/// two messages across successive calls.
#[test]
fn back_to_back_messages_without_separator_both_decode() {
    let mut codec = MessageCodec::new();
    let raw = format!(r#"{LOG_LINE}{{"kind":"Pong","ok":true}}"#);
    let mut buf = BytesMut::from(raw.as_str());

    let first = codec
        .decode(&mut buf)
        .expect("first decode must succeed")
        .expect("first message must be decoded");
    assert!(matches!(first, Message::Log(_)));

    let second = codec
        .decode(&mut buf)
        .expect("second decode must succeed")
        .expect("second message must be decoded");
    match second {
        Message::Other { kind, body } => {
            assert_eq!(kind, "Pong");
            assert_eq!(body.get("ok"), Some(&serde_json::Value::Bool(true)));
        }
        other => panic!("expected Message::Other, got: {other:?}"),
    }
}

/// Splitting a serialized message into two chunks at every possible byte
/// boundary and feeding them sequentially yields the same decoded message as
/// feeding it whole.
#[test]
fn split_at_every_byte_boundary_decodes_identically() {
    let whole = {
        let mut codec = MessageCodec::new();
        let mut buf = BytesMut::from(LOG_LINE);
        codec
            .decode(&mut buf)
            .expect("whole-chunk decode must succeed")
            .expect("whole-chunk decode must yield the message")
    };

    for boundary in 1..LOG_LINE.len() {
        let mut codec = MessageCodec::new();
        let mut buf = BytesMut::from(&LOG_LINE[..boundary]);

        let early = codec
            .decode(&mut buf)
            .unwrap_or_else(|err| panic!("partial decode at {boundary} must not error: {err}"));
        assert!(
            early.is_none(),
            "no message must be produced before the value completes (boundary {boundary})"
        );

        buf.extend_from_slice(LOG_LINE[boundary..].as_bytes());
        let message = codec
            .decode(&mut buf)
            .unwrap_or_else(|err| panic!("decode after boundary {boundary} must succeed: {err}"))
            .unwrap_or_else(|| panic!("message must be decoded after boundary {boundary}"));

        assert_eq!(message, whole, "split at {boundary} must decode identically");
    }
}

/// An incomplete value returns "no message yet" and leaves the accumulator
/// intact for the next chunk.
#[test]
fn incomplete_value_is_buffered_not_errored() {
    let mut codec = MessageCodec::new();
    let mut buf = BytesMut::from(r#"{"kind":"Log","level":"#);

    let result = codec.decode(&mut buf).expect("incomplete must not error");
    assert!(result.is_none());
    assert!(!buf.is_empty(), "undecoded bytes must stay buffered");
}

/// Bytes that can never become valid JSON fail immediately rather than
/// waiting for more data.
#[test]
fn unrecoverable_bytes_return_protocol_error() {
    let mut codec = MessageCodec::new();
    let mut buf = BytesMut::from("not-json{{{");

    match codec.decode(&mut buf) {
        Err(AppError::Protocol(msg)) => {
            assert!(
                msg.contains("malformed message"),
                "error must mention 'malformed message', got: {msg}"
            );
        }
        other => panic!("expected Err(AppError::Protocol), got: {other:?}"),
    }
}

/// A valid JSON value that is not an object is a protocol error, not a
/// message.
#[test]
fn non_object_value_returns_protocol_error() {
    let mut codec = MessageCodec::new();
    let mut buf = BytesMut::from("42\n");

    assert!(
        matches!(codec.decode(&mut buf), Err(AppError::Protocol(_))),
        "a bare scalar must be rejected"
    );
}

/// An object without the `kind` discriminator is a protocol error.
#[test]
fn missing_kind_returns_protocol_error() {
    let mut codec = MessageCodec::new();
    let mut buf = BytesMut::from(r#"{"level":"info"}"#);

    match codec.decode(&mut buf) {
        Err(AppError::Protocol(msg)) => {
            assert!(msg.contains("kind"), "error must name the `kind` field: {msg}");
        }
        other => panic!("expected Err(AppError::Protocol), got: {other:?}"),
    }
}

/// At end of stream, leftover bytes that never completed a value are
/// reported as truncation instead of being silently discarded.
#[test]
fn truncated_message_at_eof_is_an_error() {
    let mut codec = MessageCodec::new();
    let mut buf = BytesMut::from(r#"{"kind":"Log","level":"info","#);

    match codec.decode_eof(&mut buf) {
        Err(AppError::Protocol(msg)) => {
            assert!(
                msg.contains("truncated"),
                "error must mention truncation, got: {msg}"
            );
        }
        other => panic!("expected Err(AppError::Protocol), got: {other:?}"),
    }
}

/// Whitespace-only leftovers at end of stream are silence, not an error.
#[test]
fn whitespace_only_eof_is_clean() {
    let mut codec = MessageCodec::new();
    let mut buf = BytesMut::from("\n\n  ");

    let result = codec.decode_eof(&mut buf).expect("whitespace must not error");
    assert!(result.is_none());
}

/// A complete value past the 1 MiB ceiling is rejected even when it arrives
/// whole in a single chunk.
#[test]
fn oversized_complete_value_is_rejected() {
    let mut codec = MessageCodec::new();
    let huge = format!(
        "{{\"kind\":\"Log\",\"level\":\"info\",\"text\":\"{}\"}}",
        "a".repeat(MAX_MESSAGE_BYTES + 1)
    );
    let mut buf = BytesMut::from(huge.as_str());

    match codec.decode(&mut buf) {
        Err(AppError::Protocol(msg)) => {
            assert!(
                msg.contains("message too large"),
                "error must mention the size ceiling, got: {msg}"
            );
        }
        other => panic!("expected Err(AppError::Protocol), got: {other:?}"),
    }
}

/// A value that grows past the 1 MiB ceiling without completing is rejected.
#[test]
fn oversized_incomplete_value_is_rejected() {
    let mut codec = MessageCodec::new();
    let huge = format!("{{\"kind\":\"Log\",\"text\":\"{}", "a".repeat(MAX_MESSAGE_BYTES + 1));
    let mut buf = BytesMut::from(huge.as_str());

    match codec.decode(&mut buf) {
        Err(AppError::Protocol(msg)) => {
            assert!(
                msg.contains("message too large"),
                "error must mention the size ceiling, got: {msg}"
            );
        }
        other => panic!("expected Err(AppError::Protocol), got: {other:?}"),
    }
}

//! Unit tests for error display formats and session error composition.

use modbridge::session::{SessionError, SessionErrorKind};
use modbridge::AppError;

#[test]
fn protocol_error_display_starts_with_protocol_prefix() {
    let err = AppError::Protocol("malformed message: oops".into());
    assert!(err.to_string().starts_with("protocol:"));
}

#[test]
fn error_messages_have_no_trailing_period() {
    let err = AppError::Config("missing field".into());
    let s = err.to_string();
    assert!(
        !s.ends_with('.'),
        "error message must not end with a period: {s}"
    );
}

#[test]
fn variants_are_distinct_in_display() {
    let protocol = AppError::Protocol("stream closed".into());
    let io = AppError::Io("stream closed".into());
    assert_ne!(protocol.to_string(), io.to_string());
}

/// Each session error kind has a stable human-readable name.
#[test]
fn session_error_kind_display_names() {
    let cases = [
        (SessionErrorKind::ProcessSpawnFailure, "process spawn failure"),
        (SessionErrorKind::MalformedMessage, "malformed message"),
        (SessionErrorKind::UnexpectedClosure, "unexpected closure"),
        (SessionErrorKind::DispatchFailed, "dispatch failed"),
        (SessionErrorKind::Cancelled, "cancelled"),
    ];
    for (kind, name) in cases {
        assert_eq!(kind.to_string(), name);
    }
}

/// A session error starts without diagnostics and can carry buffered stderr.
#[test]
fn session_error_carries_diagnostics() {
    let err = SessionError::new(SessionErrorKind::UnexpectedClosure, "no result");
    assert!(err.diagnostics.is_empty());

    let err = err.with_diagnostics(vec!["panic: oh no".to_owned()]);
    assert_eq!(err.diagnostics, vec!["panic: oh no"]);
    assert_eq!(err.kind, SessionErrorKind::UnexpectedClosure);
    assert_eq!(err.to_string(), "unexpected closure: no result");
}

/// Session errors convert into the shared application error.
#[test]
fn session_error_converts_into_app_error() {
    let err: AppError =
        SessionError::new(SessionErrorKind::MalformedMessage, "bad bytes").into();
    let s = err.to_string();
    assert!(s.starts_with("session:"), "got: {s}");
    assert!(s.contains("malformed message"), "got: {s}");
}

//! Wire types exchanged with the agent process.
//!
//! Requests and messages share one JSON family discriminated by a `kind`
//! field. A session writes exactly one [`Request`] to the agent's stdin and
//! reads zero or more informational [`Message`]s followed by one terminal
//! message from its stdout.

pub mod message;
pub mod request;

pub use message::{LogLevel, LogRecord, Message};
pub use request::Request;

#![forbid(unsafe_code)]

//! `modbridge` — command-line bridge to an on-device mod management agent.
//!
//! The agent is a long-lived worker executable (reached through `adb shell`)
//! that receives exactly one JSON request on stdin and answers with a stream
//! of JSON messages on stdout plus free-form diagnostics on stderr. The
//! [`session`] module carries the request/response exchange; [`protocol`]
//! defines the wire types; [`cli`] and [`render`] are the human-facing glue.

pub mod cli;
pub mod config;
pub mod errors;
pub mod protocol;
pub mod render;
pub mod session;

pub use config::AgentConfig;
pub use errors::{AppError, Result};

//! Configuration parsing and defaults.

use std::path::Path;

use serde::Deserialize;

use crate::session::SpawnConfig;
use crate::{AppError, Result};

fn default_agent_program() -> String {
    "adb".into()
}

fn default_agent_args() -> Vec<String> {
    vec!["shell".into(), "/data/local/tmp/mod-agent".into()]
}

/// Agent connection settings, read from a TOML file only when `--config`
/// names one.
///
/// Every field has a default, so running without a config file works out of
/// the box against an agent reachable through `adb shell`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct AgentConfig {
    /// Executable used to reach the agent.
    #[serde(default = "default_agent_program")]
    pub agent_program: String,
    /// Arguments passed to the executable.
    #[serde(default = "default_agent_args")]
    pub agent_args: Vec<String>,
    /// Treat an informational dispatch failure as fatal for the session.
    #[serde(default)]
    pub abort_on_dispatch_error: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            agent_program: default_agent_program(),
            agent_args: default_agent_args(),
            abort_on_dispatch_error: false,
        }
    }
}

impl AgentConfig {
    /// Parse configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] when the TOML is invalid.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        if config.agent_program.is_empty() {
            return Err(AppError::Config("agent_program must not be empty".into()));
        }
        Ok(config)
    }

    /// Load configuration from a file, or defaults when `path` is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] when the file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            None => Ok(Self::default()),
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|err| {
                    AppError::Config(format!("cannot read {}: {err}", path.display()))
                })?;
                Self::from_toml_str(&text)
            }
        }
    }

    /// Derive the worker spawn configuration for one session.
    #[must_use]
    pub fn spawn_config(&self) -> SpawnConfig {
        SpawnConfig {
            program: self.agent_program.clone(),
            args: self.agent_args.clone(),
            abort_on_dispatch_error: self.abort_on_dispatch_error,
        }
    }
}

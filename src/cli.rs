//! Command-line interface: one subcommand per agent request kind.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{json, Value};

use crate::protocol::Request;
use crate::{AppError, Result};

/// Log output format selector.
#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable text logs.
    Text,
    /// Structured JSON logs.
    Json,
}

/// Top-level CLI arguments.
#[derive(Debug, Parser)]
#[command(name = "modbridge", about = "Bridge to the on-device mod management agent", version, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log output format (text or json).
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Increase log verbosity (repeatable).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log warnings and errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Operation to run against the agent.
    #[command(subcommand)]
    pub command: Command,
}

/// One agent operation.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Report the modding status of the installed game.
    Status {
        /// Use a custom URL as the core mod index.
        #[arg(long)]
        override_core_mod_url: Option<String>,
    },
    /// Enable and/or disable installed mods by ID.
    SetMods {
        /// Mod IDs to enable.
        #[arg(short, long, num_args = 1..)]
        enable: Vec<String>,
        /// Mod IDs to disable.
        #[arg(short, long, num_args = 1..)]
        disable: Vec<String>,
    },
    /// Remove an installed mod (dependants are uninstalled too).
    Remove {
        /// ID of the mod to remove.
        id: String,
    },
    /// Import a mod or file already present on the device.
    Import {
        /// Path on the device to import from.
        from_path: String,
    },
    /// Have the agent download a file from a URL and import it.
    ImportUrl {
        /// URL to download and import.
        from_url: String,
    },
    /// Patch the game to add modloader support.
    Patch {
        /// File holding the manifest XML to embed in the patched app.
        #[arg(long)]
        manifest: PathBuf,
        /// Downgrade the game to this version before patching.
        #[arg(long)]
        downgrade_to: Option<String>,
        /// The game is already patched; refresh permissions only.
        #[arg(long)]
        remodding: bool,
        /// Allow patching a version without core mods.
        #[arg(long)]
        allow_no_core_mods: bool,
        /// Substitute the legacy platform loader for older headsets.
        #[arg(long)]
        replace_ovr: bool,
        /// Use a custom URL as the core mod index.
        #[arg(long)]
        override_core_mod_url: Option<String>,
    },
    /// Fix player data permissions that can black-screen the game.
    FixPlayerData,
    /// Fetch the manifest XML for a given game version.
    Manifest {
        /// Game version to fetch the manifest for.
        version: String,
    },
    /// Reinstall missing or outdated core mods and the modloader.
    QuickFix {
        /// Use a custom URL as the core mod index.
        #[arg(long)]
        override_core_mod_url: Option<String>,
        /// Delete all mods before reinstalling the core set.
        #[arg(long)]
        wipe_existing_mods: bool,
    },
}

impl Command {
    /// Build the request payload for this operation.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Io`] when a file argument (the patch manifest)
    /// cannot be read.
    pub fn into_request(self) -> Result<Request> {
        match self {
            Self::Status {
                override_core_mod_url,
            } => Ok(Request::new("GetModStatus")
                .field("override_core_mod_url", json!(override_core_mod_url))),

            Self::SetMods { enable, disable } => {
                let mut statuses = serde_json::Map::new();
                for id in enable {
                    statuses.insert(id, Value::Bool(true));
                }
                for id in disable {
                    statuses.insert(id, Value::Bool(false));
                }
                Ok(Request::new("SetModsEnabled").field("statuses", Value::Object(statuses)))
            }

            Self::Remove { id } => Ok(Request::new("RemoveMod").field("id", json!(id))),

            Self::Import { from_path } => {
                Ok(Request::new("Import").field("from_path", json!(from_path)))
            }

            Self::ImportUrl { from_url } => {
                Ok(Request::new("ImportUrl").field("from_url", json!(from_url)))
            }

            Self::Patch {
                manifest,
                downgrade_to,
                remodding,
                allow_no_core_mods,
                replace_ovr,
                override_core_mod_url,
            } => {
                let manifest_mod = std::fs::read_to_string(&manifest).map_err(|err| {
                    AppError::Io(format!("cannot read manifest {}: {err}", manifest.display()))
                })?;

                let mut request = Request::new("Patch")
                    .field("manifest_mod", json!(manifest_mod))
                    .field("remodding", json!(remodding))
                    .field("allow_no_core_mods", json!(allow_no_core_mods))
                    .field("replace_ovr", json!(replace_ovr));
                if let Some(version) = downgrade_to {
                    request = request.field("downgrade_to", json!(version));
                }
                if let Some(url) = override_core_mod_url {
                    request = request.field("override_core_mod_url", json!(url));
                }
                Ok(request)
            }

            Self::FixPlayerData => Ok(Request::new("FixPlayerData")),

            Self::Manifest { version } => {
                Ok(Request::new("GetDowngradedManifest").field("version", json!(version)))
            }

            Self::QuickFix {
                override_core_mod_url,
                wipe_existing_mods,
            } => Ok(Request::new("QuickFix")
                .field("override_core_mod_url", json!(override_core_mod_url))
                .field("wipe_existing_mods", json!(wipe_existing_mods))),
        }
    }
}

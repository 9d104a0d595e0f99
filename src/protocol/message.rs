//! Inbound message payloads decoded from the agent's stdout.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{AppError, Result};

/// Severity of an informational log message, lowest first on the wire.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Unrecoverable problem reported by the agent.
    Error,
    /// Something suspicious that did not stop the operation.
    Warn,
    /// Routine progress information.
    Info,
    /// Detail useful when troubleshooting.
    Debug,
    /// Very fine-grained detail.
    Trace,
}

/// An informational log line relayed by the agent mid-operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    /// Severity assigned by the agent.
    pub level: LogLevel,
    /// Log text, free-form.
    pub text: String,
}

/// Which modloader is installed in the patched app, if any.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModLoader {
    /// The current modloader.
    Scotland2,
    /// The legacy modloader.
    QuestLoader,
    /// Patched by an unrecognized tool.
    Unknown,
}

impl ModLoader {
    /// Display name of the loader.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scotland2 => "Scotland2",
            Self::QuestLoader => "QuestLoader",
            Self::Unknown => "Unknown",
        }
    }
}

/// Install state of a managed component.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstallStatus {
    /// Installed and up to date.
    Ready,
    /// Installed but out of date.
    NeedUpdate,
    /// Not installed.
    Missing,
}

/// Summary of one installed mod.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModSummary {
    /// Unique mod identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Mod version string.
    pub version: String,
    /// Game version the mod targets, if declared.
    pub game_version: Option<String>,
    /// Author-provided description.
    pub description: Option<String>,
    /// Whether the mod is currently enabled.
    pub is_enabled: bool,
    /// True for core mods and their (transitive) required dependencies.
    pub is_core: bool,
}

/// Details about the installed app, absent when the game is not installed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppInfo {
    /// Modloader detected in the APK, `None` when unpatched.
    pub loader_installed: Option<ModLoader>,
    /// Whether the OBB data file is present; the game will not start without it.
    pub obb_present: bool,
    /// Installed game version.
    pub version: String,
    /// The app manifest converted to plain XML.
    pub manifest_xml: String,
}

/// Core-mod availability for the installed game version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreModsInfo {
    /// Game versions with core mod support.
    pub supported_versions: Vec<String>,
    /// Versions reachable by downgrading.
    pub downgrade_versions: Vec<String>,
    /// True when mods are unavailable until a new downgrade diff is published.
    pub is_awaiting_diff: bool,
    /// Install state of the core mods themselves.
    pub core_mod_install_status: InstallStatus,
}

/// Terminal payload of a `GetModStatus` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModStatus {
    /// App details, `None` when the game is not installed.
    pub app_info: Option<AppInfo>,
    /// All mods currently present on the device.
    pub installed_mods: Vec<ModSummary>,
    /// Core-mod availability, `None` when offline.
    pub core_mods: Option<CoreModsInfo>,
    /// Install state of the modloader files.
    pub modloader_install_status: InstallStatus,
}

/// Terminal payload listing the mods now installed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModList {
    /// All mods currently present on the device.
    pub installed_mods: Vec<ModSummary>,
}

/// Terminal payload of a `SetModsEnabled` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModSyncResult {
    /// Mod state after the sync.
    pub installed_mods: Vec<ModSummary>,
    /// Combined error text for mods that failed to install or uninstall.
    pub failures: Option<String>,
}

/// Terminal payload of a `Patch` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patched {
    /// Mod state after patching (core mods freshly installed).
    pub installed_mods: Vec<ModSummary>,
    /// True when DLC had to be removed to downgrade.
    pub did_remove_dlc: bool,
}

/// How an imported file was handled by the agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ImportedItem {
    /// The file was a mod and was installed.
    ImportedMod {
        /// Mod state after the import.
        installed_mods: Vec<ModSummary>,
        /// ID of the mod that was imported.
        imported_id: String,
    },
    /// The file type was claimed by a mod's copy extension.
    ImportedFileCopy {
        /// Where the file was copied to.
        copied_to: String,
        /// The mod whose copy extension matched.
        mod_id: String,
    },
    /// The file was copied to the custom songs folder.
    ImportedSong,
    /// A mod for a different platform was detected; nothing was imported.
    NonQuestModDetected,
}

/// Terminal payload of an `Import` or `ImportUrl` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportResult {
    /// What the file turned out to be.
    pub result: ImportedItem,
    /// The filename used to decide how to import.
    pub used_filename: String,
}

/// Terminal payload of a `FixPlayerData` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedPlayerData {
    /// True when a player data file existed and was fixed.
    pub existed: bool,
}

/// Terminal payload of a `GetDowngradedManifest` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DowngradedManifest {
    /// The requested version's manifest as plain XML.
    pub manifest_xml: String,
}

/// One decoded message from the agent, discriminated by its `kind` field.
///
/// [`Message::Log`] is the only informational kind; every other kind —
/// including kinds this build does not recognize — terminates the session
/// and is returned to the caller as the session result.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Informational log line; does not end the session.
    Log(LogRecord),
    /// Mod/app status report.
    ModStatus(ModStatus),
    /// Plain list of installed mods.
    Mods(ModList),
    /// Outcome of a mod enable/disable sync.
    ModSyncResult(ModSyncResult),
    /// Outcome of patching the game.
    Patched(Patched),
    /// Outcome of importing a file or URL.
    ImportResult(ImportResult),
    /// Outcome of the player data fix.
    FixedPlayerData(FixedPlayerData),
    /// A downgraded manifest dump.
    DowngradedManifest(DowngradedManifest),
    /// Any kind this build does not recognize, body preserved verbatim.
    Other {
        /// The unrecognized `kind` discriminator.
        kind: String,
        /// All remaining fields of the message.
        body: serde_json::Map<String, Value>,
    },
}

impl Message {
    /// Classify a decoded JSON value into a typed message.
    ///
    /// The value must be an object with a string `kind` field. Known kinds
    /// are parsed into their typed payloads; anything else lands in
    /// [`Message::Other`] with the discriminator removed from the body.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Protocol`] when the value is not an object, the
    /// `kind` field is missing or not a string, or a known kind is missing a
    /// required field.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut body) = value else {
            return Err(AppError::Protocol(
                "message is not a JSON object".to_owned(),
            ));
        };

        let kind = match body.remove("kind") {
            Some(Value::String(kind)) => kind,
            Some(_) => {
                return Err(AppError::Protocol(
                    "message `kind` is not a string".to_owned(),
                ))
            }
            None => {
                return Err(AppError::Protocol(
                    "message is missing the `kind` discriminator".to_owned(),
                ))
            }
        };

        match kind.as_str() {
            "Log" => Ok(Self::Log(typed(&kind, body)?)),
            "ModStatus" => Ok(Self::ModStatus(typed(&kind, body)?)),
            "Mods" => Ok(Self::Mods(typed(&kind, body)?)),
            "ModSyncResult" => Ok(Self::ModSyncResult(typed(&kind, body)?)),
            "Patched" => Ok(Self::Patched(typed(&kind, body)?)),
            "ImportResult" => Ok(Self::ImportResult(typed(&kind, body)?)),
            "FixedPlayerData" => Ok(Self::FixedPlayerData(typed(&kind, body)?)),
            "DowngradedManifest" => Ok(Self::DowngradedManifest(typed(&kind, body)?)),
            _ => Ok(Self::Other { kind, body }),
        }
    }

    /// The message's `kind` discriminator.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::Log(_) => "Log",
            Self::ModStatus(_) => "ModStatus",
            Self::Mods(_) => "Mods",
            Self::ModSyncResult(_) => "ModSyncResult",
            Self::Patched(_) => "Patched",
            Self::ImportResult(_) => "ImportResult",
            Self::FixedPlayerData(_) => "FixedPlayerData",
            Self::DowngradedManifest(_) => "DowngradedManifest",
            Self::Other { kind, .. } => kind,
        }
    }

    /// True for every kind except `Log`; a terminal message ends the session.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Log(_))
    }
}

/// Parse a known-kind message body, labelling errors with the kind.
fn typed<T: DeserializeOwned>(kind: &str, body: serde_json::Map<String, Value>) -> Result<T> {
    serde_json::from_value(Value::Object(body))
        .map_err(|err| AppError::Protocol(format!("invalid {kind} message: {err}")))
}

//! Human-readable rendering of terminal payloads and live log relay.

use console::Term;
use owo_colors::{OwoColorize as _, Style};
use tracing::{debug, error, info, trace, warn};

use crate::protocol::message::{ImportedItem, InstallStatus, LogLevel, ModLoader, ModSummary};
use crate::protocol::Message;
use crate::session::Dispatcher;
use crate::Result;

/// Centralized stylesheet for CLI output colors.
#[derive(Default, Clone)]
pub struct Styles {
    /// Success / enabled markers (green).
    pub success: Style,
    /// Warnings (yellow).
    pub warning: Style,
    /// Errors / disabled markers (red).
    pub error: Style,
    /// Dimmed secondary text.
    pub dim: Style,
    /// Bold text.
    pub bold: Style,
    /// Section headers.
    pub header: Style,
}

impl Styles {
    /// Apply colors to the stylesheet.
    pub fn colorize(&mut self) {
        self.success = Style::new().green();
        self.warning = Style::new().yellow();
        self.error = Style::new().red();
        self.dim = Style::new().dimmed();
        self.bold = Style::new().bold();
        self.header = Style::new().bold().cyan();
    }
}

/// Output context carrying styling and terminal state.
pub struct OutputContext {
    /// Stylesheet for colored output.
    pub styles: Styles,
}

impl OutputContext {
    /// Create output context based on CLI flags and environment.
    #[must_use]
    pub fn new(no_color: bool) -> Self {
        let is_tty = Term::stdout().is_term();
        let use_colors = !no_color && is_tty && std::env::var("NO_COLOR").is_err();

        let mut styles = Styles::default();
        if use_colors {
            styles.colorize();
        }

        Self { styles }
    }

    fn header(&self, text: &str) {
        println!("{}", text.style(self.styles.header));
    }

    fn kv(&self, indent: usize, label: &str, value: &str) {
        println!("{:indent$}{} {value}", "", label.style(self.styles.dim));
    }

    fn flag(&self, value: bool, good_when: bool) -> String {
        let style = if value == good_when {
            self.styles.success
        } else {
            self.styles.error
        };
        format!("{}", value.style(style))
    }
}

/// Renders terminal payloads as human-readable terminal output.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    /// Create a renderer over the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Render one terminal payload.
    pub fn render(&self, message: &Message) {
        match message {
            // Informational messages are relayed live by the dispatcher.
            Message::Log(_) => {}
            Message::ModStatus(status) => self.render_mod_status(status),
            Message::Mods(list) => {
                self.ctx.header("Installed Mods");
                self.render_mods(&list.installed_mods);
            }
            Message::ModSyncResult(sync) => {
                self.ctx.header("Installed Mods");
                self.render_mods(&sync.installed_mods);
                if let Some(failures) = &sync.failures {
                    println!(
                        "{} {failures}",
                        "Failures:".style(self.ctx.styles.error)
                    );
                }
            }
            Message::Patched(patched) => {
                self.ctx.header("Patched");
                self.render_mods(&patched.installed_mods);
                if patched.did_remove_dlc {
                    println!(
                        "{}",
                        "Installed DLC were removed while downgrading. Restart the \
                         headset, then re-download them in-game."
                            .style(self.ctx.styles.warning)
                    );
                }
            }
            Message::ImportResult(import) => self.render_import(import),
            Message::FixedPlayerData(fixed) => {
                self.ctx.header("Fixed Player Data");
                self.ctx
                    .kv(2, "Existed:", &self.ctx.flag(fixed.existed, true));
            }
            Message::DowngradedManifest(manifest) => {
                println!("{}", manifest.manifest_xml);
            }
            Message::Other { kind, body } => {
                self.ctx.header(kind);
                match serde_json::to_string_pretty(body) {
                    Ok(pretty) => println!("{pretty}"),
                    Err(_) => println!("{body:?}"),
                }
            }
        }
    }

    fn render_mod_status(&self, status: &crate::protocol::message::ModStatus) {
        self.ctx.header("Mod Status");

        if let Some(app) = &status.app_info {
            self.ctx.header("  App Info");
            let loader = app.loader_installed.map_or("none", ModLoader::as_str);
            self.ctx.kv(4, "Loader Installed:", loader);
            self.ctx
                .kv(4, "OBB Present:", &self.ctx.flag(app.obb_present, true));
            self.ctx.kv(4, "Version:", &app.version);
            if !app.obb_present {
                println!(
                    "{}",
                    "    OBB file not detected! The game may not start."
                        .style(self.ctx.styles.warning)
                );
            }
        } else {
            println!("{}", "  Game is not installed".style(self.ctx.styles.error));
        }

        self.ctx.header("  Installed Mods");
        self.render_mods(&status.installed_mods);

        if let Some(core) = &status.core_mods {
            self.ctx.header("  Core Mods");
            self.ctx.kv(
                4,
                "Install Status:",
                &self.install_status(core.core_mod_install_status),
            );
            self.ctx.kv(
                4,
                "Supported Versions:",
                &core.supported_versions.join(", "),
            );
            self.ctx.kv(
                4,
                "Downgrade Versions:",
                &core.downgrade_versions.join(", "),
            );
            self.ctx.kv(
                4,
                "Awaiting Diff:",
                &self.ctx.flag(core.is_awaiting_diff, false),
            );
        }

        self.ctx.kv(
            2,
            "Modloader:",
            &self.install_status(status.modloader_install_status),
        );
    }

    fn render_import(&self, import: &crate::protocol::message::ImportResult) {
        self.ctx.header("Import Result");
        self.ctx.kv(2, "Filename:", &import.used_filename);
        match &import.result {
            ImportedItem::ImportedMod {
                installed_mods,
                imported_id,
            } => {
                self.ctx.kv(2, "Type:", "Mod");
                self.ctx.kv(2, "ID:", imported_id);
                self.ctx.header("  Installed Mods");
                self.render_mods(installed_mods);
            }
            ImportedItem::ImportedFileCopy { copied_to, mod_id } => {
                self.ctx.kv(2, "Type:", "File Copy");
                self.ctx.kv(2, "Copied To:", copied_to);
                self.ctx.kv(2, "ID:", mod_id);
            }
            ImportedItem::ImportedSong => self.ctx.kv(2, "Type:", "Song"),
            ImportedItem::NonQuestModDetected => {
                println!(
                    "{}",
                    "  A mod for a different platform was detected; nothing was imported."
                        .style(self.ctx.styles.error)
                );
            }
        }
    }

    fn render_mods(&self, mods: &[ModSummary]) {
        for summary in mods {
            println!("    {}", summary.name.style(self.ctx.styles.bold));
            self.ctx
                .kv(6, "Enabled:", &self.ctx.flag(summary.is_enabled, true));
            self.ctx.kv(6, "Version:", &summary.version);
            self.ctx.kv(6, "ID:", &summary.id);
            if summary.is_core {
                self.ctx.kv(6, "Core Mod:", "true");
            }
            if let Some(version) = &summary.game_version {
                self.ctx.kv(6, "Game Version:", version);
            }
            if let Some(description) = &summary.description {
                self.ctx.kv(6, "Description:", description);
            }
        }
    }

    fn install_status(&self, status: InstallStatus) -> String {
        let (text, style) = match status {
            InstallStatus::Ready => ("Ready", self.ctx.styles.success),
            InstallStatus::NeedUpdate => ("NeedUpdate", self.ctx.styles.warning),
            InstallStatus::Missing => ("Missing", self.ctx.styles.error),
        };
        format!("{}", text.style(style))
    }
}

/// Dispatcher that relays informational messages through structured logging.
///
/// `Log` messages are re-emitted at their own severity; stderr diagnostics
/// use the default error-severity relay from the [`Dispatcher`] trait.
#[derive(Debug, Default)]
pub struct ConsoleDispatcher;

impl Dispatcher for ConsoleDispatcher {
    fn dispatch(&mut self, message: &Message) -> Result<()> {
        match message {
            Message::Log(record) => {
                let text = record.text.as_str();
                match record.level {
                    LogLevel::Error => error!(target: "agent", "{text}"),
                    LogLevel::Warn => warn!(target: "agent", "{text}"),
                    LogLevel::Info => info!(target: "agent", "{text}"),
                    LogLevel::Debug => debug!(target: "agent", "{text}"),
                    LogLevel::Trace => trace!(target: "agent", "{text}"),
                }
            }
            other => debug!(kind = other.kind(), "ignoring non-log informational message"),
        }
        Ok(())
    }
}

#![forbid(unsafe_code)]

//! `modbridge` — CLI bridge to the on-device mod management agent.
//!
//! Parses one subcommand into an agent request, runs a single session
//! against the worker process, and renders the terminal payload.

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::error;
use tracing_subscriber::{fmt, EnvFilter};

use modbridge::cli::{Cli, LogFormat};
use modbridge::config::AgentConfig;
use modbridge::render::{ConsoleDispatcher, HumanRenderer, OutputContext};
use modbridge::session;
use modbridge::{AppError, Result};

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format, args.verbose, args.quiet)?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    let config = AgentConfig::load(args.config.as_deref())?;
    let spawn_config = config.spawn_config();

    let request = args.command.into_request()?;
    let ctx = OutputContext::new(args.no_color);

    let cancel = CancellationToken::new();
    let cancel_on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel_on_signal.cancel();
        }
    });

    let mut dispatcher = ConsoleDispatcher;
    match session::run(&spawn_config, &request, &mut dispatcher, &cancel).await {
        Ok(message) => {
            HumanRenderer::new(&ctx).render(&message);
            Ok(())
        }
        Err(err) => {
            // Diagnostics were already relayed live by the dispatcher.
            error!(%err, "session failed");
            Err(err.into())
        }
    }
}

fn init_tracing(log_format: LogFormat, verbose: u8, quiet: bool) -> Result<()> {
    let default_level = if quiet {
        "warn"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = fmt().with_env_filter(env_filter).with_writer(std::io::stderr);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}

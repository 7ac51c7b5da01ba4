//! CLI for the lotto agency client.

#![allow(
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::missing_docs_in_private_items
)]

mod bet;
mod run;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use lotto::{ClientConfig, ShutdownHandle};

#[derive(Parser)]
#[command(name = "lotto", version, about = "Lottery agency client")]
struct Cli {
    /// Maximum log level (error, warn, info, debug, trace).
    #[arg(long, global = true, default_value = "info", env = "LOTTO_LOG_LEVEL")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Submit an agency's bets file and wait for the draw result.
    Run(run::RunArgs),

    /// Submit a single bet.
    Bet(bet::BetArgs),

    /// Generate shell completion scripts.
    #[command(hide = true)]
    Completion {
        /// Target shell.
        shell: Shell,
    },
}

/// Output format for draw results.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable summary.
    #[default]
    Table,
    /// Machine-readable JSON.
    Json,
}

/// Where to connect and as which agency.
#[derive(clap::Args)]
pub(crate) struct ConnectArgs {
    /// JSON configuration file; flags override its values.
    #[arg(short, long, env = "LOTTO_CONFIG")]
    config: Option<PathBuf>,

    /// Agency identifier.
    #[arg(short, long, env = "LOTTO_AGENCY")]
    agency: Option<u32>,

    /// Server address (host:port).
    #[arg(short, long, env = "LOTTO_SERVER")]
    server: Option<String>,
}

impl ConnectArgs {
    /// Loads the configuration file, if any, and applies flag overrides.
    pub(crate) fn load(&self) -> Result<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => ClientConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => ClientConfig::default(),
        };
        if let Some(agency) = self.agency {
            config.agency = agency;
        }
        if let Some(server) = &self.server {
            config.server_address.clone_from(server);
        }
        Ok(config)
    }
}

fn main() {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = cli.dispatch() {
        eprintln!("lotto: {e:#}");
        std::process::exit(1);
    }
}

impl Cli {
    fn dispatch(self) -> Result<()> {
        match self.command {
            Command::Run(args) => run::run(&args),
            Command::Bet(args) => bet::bet(&args),
            Command::Completion { shell } => {
                clap_complete::generate(
                    shell,
                    &mut Self::command(),
                    "lotto",
                    &mut std::io::stdout(),
                );
                Ok(())
            }
        }
    }
}

/// Cancels `shutdown` on the first SIGINT or SIGTERM.
#[cfg(unix)]
pub(crate) fn watch_signals(shutdown: &ShutdownHandle) -> Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM]).context("installing signal handlers")?;
    let handle = shutdown.clone();
    std::thread::Builder::new()
        .name("signals".into())
        .spawn(move || {
            if let Some(signal) = signals.forever().next() {
                tracing::info!(action = "shutdown", signal, "closing connection");
                handle.shutdown();
            }
        })
        .context("spawning signal thread")?;
    Ok(())
}

#[cfg(not(unix))]
pub(crate) fn watch_signals(_shutdown: &ShutdownHandle) -> Result<()> {
    Ok(())
}

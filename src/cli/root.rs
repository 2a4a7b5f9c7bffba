use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, info};

use super::replay::ReplayCommand;
use crate::config::ModalSettings;
use crate::tui;

/// modal-stack - a stack of modal dialogs for the terminal
#[derive(Parser)]
#[command(
    name = "modal-stack",
    version,
    about = "A stack of modal dialogs for the terminal",
    long_about = r#"modal-stack keeps a stack of modal dialogs with one active dialog,
group cascades and step-by-step navigation.

Examples:
  modal-stack                             # Open the interactive demo
  modal-stack replay scenario.json        # Replay a scenario
  modal-stack replay s.json --format json # Replay with JSON output"#
)]
pub struct Cli {
    /// Current working directory
    #[arg(short = 'c', long = "cwd", global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short = 'd', long = "debug", global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Replay a JSON scenario against a modal controller
    Replay(ReplayCommand),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        if self.debug {
            debug!("Debug logging enabled");
        }

        if let Some(cwd) = &self.cwd {
            std::env::set_current_dir(cwd).map_err(|e| {
                anyhow::anyhow!("Failed to change directory to {}: {}", cwd.display(), e)
            })?;
            info!("Changed working directory to: {}", cwd.display());
        }

        let settings = ModalSettings::init().await?;
        debug!(?settings, "Modal settings initialized");

        match self.command {
            Some(Commands::Replay(replay)) => replay.execute(settings).await,
            None => {
                info!("Starting interactive demo");
                tui::run(settings).await
            }
        }
    }
}

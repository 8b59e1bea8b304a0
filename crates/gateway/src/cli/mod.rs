pub mod config;
pub mod next;

use clap::{Parser, Subcommand};

use bc_domain::config::Config;

/// bincollections: bin collection schedule service for a voice assistant.
#[derive(Debug, Parser)]
#[command(name = "bincollections", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the HTTP server (default when no subcommand is given).
    Serve,
    /// Print the next collection for the `[device]` address.
    Next {
        /// Only collections of this category (tag, colour or name).
        #[arg(long)]
        category: Option<String>,
        /// Output the full answer as JSON instead of plain text.
        #[arg(long)]
        json: bool,
    },
    /// Fetch the schedule for the `[device]` address, bypassing any cache.
    Refresh,
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Print version information.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

// ── Config loading helper ─────────────────────────────────────────────

/// Load the configuration from the path specified by `BC_CONFIG` (or
/// `config.toml` by default).  Returns the parsed [`Config`] and the
/// path that was used.
pub fn load_config() -> anyhow::Result<(Config, String)> {
    let config_path = std::env::var("BC_CONFIG").unwrap_or_else(|_| "config.toml".into());
    let config = Config::load(std::path::Path::new(&config_path))
        .map_err(|e| anyhow::anyhow!("loading {config_path}: {e}"))?;
    Ok((config, config_path))
}

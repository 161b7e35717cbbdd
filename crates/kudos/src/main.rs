// SPDX-FileCopyrightText: 2026 Kudos Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Kudos - webhook ingestion and review-request SMS delivery.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod integrations;
mod serve;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use kudos_config::{ConfigError, KudosConfig};

/// Kudos - turns completed purchases into review-request texts.
#[derive(Parser, Debug)]
#[command(name = "kudos", version, about, long_about = None)]
struct Cli {
    /// Load this file instead of the standard configuration search path.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the webhook server.
    Serve,
    /// Validate configuration and print a summary.
    CheckConfig,
    /// List configured integrations without secrets.
    Integrations,
}

fn load(path: Option<&std::path::Path>) -> Result<KudosConfig, Vec<ConfigError>> {
    match path {
        Some(path) => kudos_config::load_and_validate_path(path),
        None => kudos_config::load_and_validate(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            kudos_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("kudos serve: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::CheckConfig) => {
            print!("{}", integrations::config_summary(&config));
        }
        Some(Commands::Integrations) => {
            let store = kudos_config::ConfigStore::from_config(&config);
            print!("{}", integrations::render_table(store.integrations()));
        }
        None => {
            println!("kudos: use --help for available commands");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["kudos", "--config", "k.toml", "check-config"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::CheckConfig)));
        assert_eq!(cli.config, Some(PathBuf::from("k.toml")));

        let cli = Cli::try_parse_from(["kudos", "integrations"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Integrations)));
    }

    #[test]
    fn default_config_is_valid() {
        let config = kudos_config::load_and_validate_str("").expect("empty config should be valid");
        assert_eq!(config.server.port, 8090);
    }
}

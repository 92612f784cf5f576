//! reliefgrid CLI - command-line interface
//!
//! Generates terrain heightmaps from Terrarium elevation tiles and manages
//! the configuration file.

mod commands;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;
use reliefgrid::logging::{init_logging, LoggingConfig};
use tracing::info;

use commands::config::ConfigCommands;
use commands::generate::GenerateArgs;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "reliefgrid", version, about = "Terrain heightmaps from elevation tiles")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Generate a heightmap around a center point
    Generate(GenerateArgs),

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn run(cli: Cli) -> Result<(), CliError> {
    let _guard = init_logging(&LoggingConfig {
        verbose: cli.verbose,
        log_file: cli.log_file,
    })?;
    info!(version = reliefgrid::VERSION, "reliefgrid starting");

    match cli.command {
        Commands::Generate(args) => commands::generate::run(args),
        Commands::Config { command } => commands::config::run(command),
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("{} {}", style("Error:").red().bold(), e);
        std::process::exit(e.exit_code());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_config_init_force() {
        let cli = Cli::try_parse_from(["reliefgrid", "config", "init", "--force"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config {
                command: ConfigCommands::Init { force: true }
            }
        ));
    }

    #[test]
    fn test_generate_requires_center() {
        assert!(Cli::try_parse_from(["reliefgrid", "generate", "--lat", "45.0"]).is_err());
    }
}

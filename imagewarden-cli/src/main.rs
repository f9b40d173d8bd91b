//! imagewarden -- audit running Docker images against blacklist/whitelist patterns.

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;

use imagewarden_core::config::WardenConfig;
use imagewarden_policy::Mode;

use crate::cli::{Cli, Commands};
use crate::error::CliError;
use crate::output::OutputWriter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e}", "error:".red().bold());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let writer = OutputWriter::new(cli.output);

    // `config` reports loading problems itself instead of failing up front
    if let Commands::Config(args) = cli.command {
        return commands::config::execute(args, cli.config.as_deref(), &writer).await;
    }

    let mut config = WardenConfig::load_unvalidated(cli.config.as_deref()).await?;
    apply_cli_overrides(&mut config, &cli);
    config.validate()?;

    logging::init_tracing(&config.general).map_err(|e| CliError::Config(e.to_string()))?;
    tracing::debug!(
        log_level = %config.general.log_level,
        socket = %config.docker.socket,
        "imagewarden starting"
    );

    match cli.command {
        Commands::Blacklist(args) => {
            commands::audit::execute(Mode::Blacklist, args, &config, &writer).await
        }
        Commands::Whitelist(args) => {
            commands::audit::execute(Mode::Whitelist, args, &config, &writer).await
        }
        Commands::Check(args) => commands::check::execute(args, &config, &writer),
        // handled before configuration loading
        Commands::Config(_) => Ok(()),
    }
}

/// Apply global CLI flags on top of file + environment configuration.
fn apply_cli_overrides(config: &mut WardenConfig, cli: &Cli) {
    if let Some(ref level) = cli.log_level {
        config.general.log_level.clone_from(level);
    }
    if cli.debug {
        config.general.log_level = "debug".to_owned();
    }
    if let Some(ref socket) = cli.docker_socket {
        config.docker.socket.clone_from(socket);
    }
}

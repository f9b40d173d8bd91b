//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// imagewarden -- audit running Docker images against image patterns.
///
/// Use `imagewarden <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "imagewarden", version, about, long_about = None)]
pub struct Cli {
    /// Path to an imagewarden.toml configuration file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging (same as `--log-level debug`).
    #[arg(long, global = true)]
    pub debug: bool,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Docker socket path (default: platform defaults / DOCKER_HOST).
    #[arg(long, global = true)]
    pub docker_socket: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Flag running images that match any pattern.
    Blacklist(AuditArgs),

    /// Flag running images that match no pattern.
    Whitelist(AuditArgs),

    /// Load and compile the pattern file without contacting Docker.
    Check(CheckArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- blacklist / whitelist ----

/// Options shared by both audit modes.
#[derive(Args, Debug, Clone, Default)]
pub struct AuditArgs {
    /// Pattern file, one regex per line (default: `audit.image_file` from config).
    #[arg(long)]
    pub image_file: Option<PathBuf>,

    /// Print the layers of each flagged image.
    #[arg(long)]
    pub layers: bool,

    /// Exit with code 4 when any image is flagged.
    #[arg(long)]
    pub fail_on_flagged: bool,
}

// ---- check ----

/// Validate a pattern file.
#[derive(Args, Debug, Clone, Default)]
pub struct CheckArgs {
    /// Pattern file (default: `audit.image_file` from config).
    #[arg(long)]
    pub image_file: Option<PathBuf>,
}

// ---- config ----

/// Manage imagewarden configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, docker, audit).
        #[arg(long)]
        section: Option<String>,
    },
}

//! `imagewarden check` command handler

use std::io::Write;
use std::path::PathBuf;

use serde::Serialize;
use tracing::info;

use imagewarden_core::config::WardenConfig;
use imagewarden_policy::{CompiledPatterns, ImagePolicyError, PatternSet, load_patterns_from_file};

use crate::cli::CheckArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `check` command.
///
/// Loads the pattern file and compiles every pattern. Docker is not contacted.
///
/// # Errors
///
/// Returns `CliError::Policy` if the file cannot be read or any pattern fails to compile.
pub fn execute(
    args: CheckArgs,
    config: &WardenConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let image_file = args
        .image_file
        .unwrap_or_else(|| PathBuf::from(&config.audit.image_file));

    info!(path = %image_file.display(), "checking image patterns");

    let patterns = load_patterns_from_file(&image_file)?;
    let (report, errors) = build_report(image_file.display().to_string(), &patterns);
    writer.render(&report)?;

    if let Some(first) = errors.into_iter().next() {
        return Err(first.into());
    }
    Ok(())
}

/// Compile every pattern and summarize the outcome.
fn build_report(source: String, patterns: &PatternSet) -> (CheckReport, Vec<ImagePolicyError>) {
    let errors = CompiledPatterns::compile_errors(patterns);
    let report = CheckReport {
        source,
        patterns: patterns.len(),
        valid: errors.is_empty(),
        errors: errors.iter().map(ToString::to_string).collect(),
    };
    (report, errors)
}

/// Pattern file check report.
#[derive(Debug, Serialize)]
pub struct CheckReport {
    /// Pattern file path
    pub source: String,
    /// Number of distinct patterns
    pub patterns: usize,
    /// Whether every pattern compiled
    pub valid: bool,
    /// One message per pattern that failed to compile (empty if valid)
    pub errors: Vec<String>,
}

impl Render for CheckReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Pattern file: {}", self.source.bold())?;
        writeln!(w, "  Patterns: {}", self.patterns)?;
        if self.valid {
            writeln!(w, "  Result: {}", "VALID".green().bold())?;
        } else {
            writeln!(w, "  Result: {}", "INVALID".red().bold())?;
            for err in &self.errors {
                writeln!(w, "  Error: {}", err.red())?;
            }
        }
        Ok(())
    }
}

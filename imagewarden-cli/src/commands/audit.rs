//! `imagewarden blacklist` / `imagewarden whitelist` command handler

use std::io::Write;
use std::path::PathBuf;

use tracing::info;

use imagewarden_core::config::WardenConfig;
use imagewarden_policy::{
    AuditReport, BollardDockerClient, Classifier, DockerClient, Mode, TracingSink,
    load_patterns_from_file, run_audit,
};

use crate::cli::AuditArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Effective audit settings after merging CLI flags over configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditSettings {
    pub image_file: PathBuf,
    pub include_layers: bool,
    pub fail_on_flagged: bool,
}

impl AuditSettings {
    /// Flags only ever turn options on; the pattern file flag replaces the configured path.
    pub fn resolve(args: AuditArgs, config: &WardenConfig) -> Self {
        Self {
            image_file: args
                .image_file
                .unwrap_or_else(|| PathBuf::from(&config.audit.image_file)),
            include_layers: args.layers || config.audit.layers,
            fail_on_flagged: args.fail_on_flagged || config.audit.fail_on_flagged,
        }
    }
}

/// Execute an audit in the given mode.
///
/// Patterns are loaded and compiled before Docker is contacted, so an invalid
/// pattern file fails without touching the daemon.
pub async fn execute(
    mode: Mode,
    args: AuditArgs,
    config: &WardenConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let settings = AuditSettings::resolve(args, config);

    let patterns = load_patterns_from_file(&settings.image_file)?;
    let classifier = Classifier::new(mode, &patterns)?;
    info!(
        mode = %mode,
        path = %settings.image_file.display(),
        patterns = classifier.pattern_count(),
        "image patterns loaded"
    );

    let client = BollardDockerClient::from_config(&config.docker)?;
    client.ping().await?;

    let report = run_audit(&client, &classifier, settings.include_layers, &TracingSink).await?;

    writer.render(&report)?;

    if settings.fail_on_flagged && !report.is_clean() {
        return Err(CliError::FlaggedImages(report.flagged().len()));
    }

    Ok(())
}

impl Render for AuditReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        for image in self.flagged() {
            writeln!(w, "{image}")?;
            if let Some(layers) = self.layers.as_ref().and_then(|l| l.get(image)) {
                for layer in layers {
                    writeln!(w, "  {layer}")?;
                }
            }
        }
        Ok(())
    }
}

//! Command-line surface of `repodocs`.
//!
//! All pipeline logic lives in `repodocs-core`; this module only turns flags
//! into configuration overrides, wires the real collaborators together and
//! prints the run summary.

use anyhow::Result;
use clap::Parser;
use repodocs_core::build::CommandBuildRunner;
use repodocs_core::config::{locate_project_root, ConfigError, DocsConfig, SyncMode};
use repodocs_core::extract::JsonDescriptorSource;
use repodocs_core::generate::{DocsGenerator, GenerateError, GenerationReport};
use repodocs_core::sync::GitSynchronizer;
use std::path::PathBuf;

/// Generate a unified documentation site from component repositories.
#[derive(Parser, Debug)]
#[clap(name = "repodocs", version, about)]
pub struct Cli {
    /// YAML configuration file; the embedded default is used when absent
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Log and ignore git failures instead of aborting the run
    #[clap(long)]
    pub lenient_sync: bool,

    /// Succeed even when the run writes no files
    #[clap(long)]
    pub allow_no_changes: bool,

    /// Debug logging
    #[clap(short, long)]
    pub verbose: bool,

    /// Errors only
    #[clap(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Applies flag overrides on top of the loaded configuration.
    pub fn apply_overrides(&self, config: &mut DocsConfig) {
        if self.lenient_sync {
            config.sync.mode = SyncMode::Lenient;
        }
        if self.allow_no_changes {
            config.fail_on_no_changes = false;
        }
    }
}

/// Runs the full pipeline from the current directory's project root.
pub async fn run(cli: Cli) -> Result<GenerationReport> {
    let mut config = match &cli.config {
        Some(path) => crate::load_config::load_config(path)?,
        None => crate::load_config::default_config()?,
    };
    cli.apply_overrides(&mut config);

    let cwd = std::env::current_dir()?;
    let root = locate_project_root(&cwd)?;
    tracing::info!(root = %root.display(), "Located project root");

    let generator = DocsGenerator::new(
        config.clone(),
        root,
        GitSynchronizer::new(config.sync.clone()),
        CommandBuildRunner::new(config.build.clone()),
        JsonDescriptorSource,
    );
    let report = generator.generate().await?;

    println!("Generated {} file(s)", report.files_written);
    for skipped in &report.skipped {
        println!("Skipped {}: {}", skipped.repo, skipped.reason);
    }
    if let Some(stat) = report.diff_stat.as_deref().filter(|s| !s.trim().is_empty()) {
        println!();
        println!("Changes:");
        print!("{stat}");
    }
    Ok(report)
}

/// Category shown in the top-level error line.
pub fn error_category(err: &anyhow::Error) -> &'static str {
    if let Some(e) = err.downcast_ref::<GenerateError>() {
        e.category()
    } else if let Some(e) = err.downcast_ref::<ConfigError>() {
        e.category()
    } else if err.downcast_ref::<serde_yaml::Error>().is_some() {
        "configuration"
    } else if err.downcast_ref::<std::io::Error>().is_some() {
        "io"
    } else {
        "unexpected"
    }
}

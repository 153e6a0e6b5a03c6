//! Release build of a working copy before its artifacts are introspected.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::config::BuildSettings;
use crate::contract::{BuildOutcome, BuildRunner};
use crate::process::{display_command, run_captured, RunError};

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("failed to launch `{command}` in {dir}: {source}")]
    Launch {
        command: String,
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` in {dir} timed out after {secs}s")]
    TimedOut {
        command: String,
        dir: PathBuf,
        secs: u64,
    },
}

/// Runs the configured build command (by default `dotnet build -c Release --nologo`).
pub struct CommandBuildRunner {
    settings: BuildSettings,
}

impl CommandBuildRunner {
    pub fn new(settings: BuildSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl BuildRunner for CommandBuildRunner {
    async fn build(&self, working_copy: &Path) -> Result<BuildOutcome, BuildError> {
        let command = display_command(&self.settings.program, &self.settings.args);
        info!(command = %command, dir = %working_copy.display(), "Running build");

        match run_captured(
            &self.settings.program,
            &self.settings.args,
            working_copy,
            self.settings.timeout_secs,
        )
        .await
        {
            Ok(captured) => Ok(BuildOutcome {
                exit_code: captured.code,
                stdout: captured.stdout,
                stderr: captured.stderr,
            }),
            Err(RunError::Launch(source)) => Err(BuildError::Launch {
                command,
                dir: working_copy.to_path_buf(),
                source,
            }),
            Err(RunError::TimedOut(secs)) => Err(BuildError::TimedOut {
                command,
                dir: working_copy.to_path_buf(),
                secs,
            }),
        }
    }
}

//! Repository synchronisation through the `git` command line.
//!
//! Each configured repository gets a working copy at `<repos_dir>/<name>`.
//! A missing copy is shallow-cloned; an existing one is fetched and
//! hard-reset to `origin/<default_branch>`, discarding local edits.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::{RepositorySpec, SyncMode, SyncSettings};
use crate::contract::RepositorySync;
use crate::process::{display_command, run_captured, RunError};

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("failed to launch `{command}` in {dir}: {source}")]
    Launch {
        command: String,
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` in {dir} exited with code {code}: {stderr}")]
    CommandFailed {
        command: String,
        dir: PathBuf,
        code: i32,
        stderr: String,
    },

    #[error("`{command}` in {dir} timed out after {secs}s")]
    TimedOut {
        command: String,
        dir: PathBuf,
        secs: u64,
    },

    #[error("failed to create repository cache directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// [`RepositorySync`] backed by the `git` executable on `PATH`.
pub struct GitSynchronizer {
    settings: SyncSettings,
}

impl GitSynchronizer {
    pub fn new(settings: SyncSettings) -> Self {
        Self { settings }
    }

    async fn git(&self, dir: &Path, args: &[&str]) -> Result<String, SyncError> {
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        let command = display_command("git", &args);
        let captured = match run_captured("git", &args, dir, self.settings.timeout_secs).await {
            Ok(captured) => captured,
            Err(RunError::Launch(source)) => {
                return self.tolerate(SyncError::Launch {
                    command,
                    dir: dir.to_path_buf(),
                    source,
                })
            }
            Err(RunError::TimedOut(secs)) => {
                return self.tolerate(SyncError::TimedOut {
                    command,
                    dir: dir.to_path_buf(),
                    secs,
                })
            }
        };

        if captured.code != 0 {
            return self.tolerate(SyncError::CommandFailed {
                command,
                dir: dir.to_path_buf(),
                code: captured.code,
                stderr: captured.stderr.trim().to_string(),
            });
        }

        debug!(command = %command, dir = %dir.display(), "git succeeded");
        Ok(captured.stdout)
    }

    /// Strict mode surfaces the error; lenient mode logs it and carries on.
    fn tolerate(&self, err: SyncError) -> Result<String, SyncError> {
        match self.settings.mode {
            SyncMode::Strict => {
                error!(error = %err, "git operation failed");
                Err(err)
            }
            SyncMode::Lenient => {
                warn!(error = %err, "git operation failed, continuing in lenient mode");
                Ok(String::new())
            }
        }
    }
}

#[async_trait]
impl RepositorySync for GitSynchronizer {
    async fn sync(&self, repo: &RepositorySpec, checkout: &Path) -> Result<(), SyncError> {
        if checkout.exists() {
            info!(repo = %repo.name, path = %checkout.display(), "Updating repository");
            let remote_branch = format!("origin/{}", self.settings.default_branch);
            self.git(checkout, &["fetch", "origin"]).await?;
            self.git(checkout, &["reset", "--hard", &remote_branch]).await?;
            return Ok(());
        }

        let parent = checkout.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent).map_err(|source| SyncError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;

        info!(
            repo = %repo.name,
            url = %repo.git_url,
            path = %checkout.display(),
            "Cloning repository"
        );
        let target = checkout.to_string_lossy();
        self.git(parent, &["clone", "--depth=1", &repo.git_url, &target])
            .await?;
        Ok(())
    }

    async fn diff_stat(&self, root: &Path) -> Result<String, SyncError> {
        self.git(root, &["--no-pager", "diff", "--stat"]).await
    }
}

/// Working copy location for `repo` inside the repository cache.
pub fn checkout_dir(repos_dir: &Path, repo: &RepositorySpec) -> PathBuf {
    repos_dir.join(&repo.name)
}

//! Idempotent file output.
//!
//! Every generated file goes through [`IdempotentWriter::write`]. Content is
//! normalised to `\n` line endings and compared with what is already on disk,
//! ignoring trailing whitespace; only real changes are written and counted in
//! the [`WriteLedger`]. A second run over unchanged inputs therefore reports
//! zero writes.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Files actually modified during one run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WriteLedger {
    written: Vec<PathBuf>,
}

impl WriteLedger {
    pub fn count(&self) -> usize {
        self.written.len()
    }

    /// Modified paths in write order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

pub struct IdempotentWriter {
    root: PathBuf,
    ledger: WriteLedger,
    touched: BTreeSet<PathBuf>,
}

impl IdempotentWriter {
    /// `root` is only used to shorten paths in log output.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ledger: WriteLedger::default(),
            touched: BTreeSet::new(),
        }
    }

    /// Writes `content` to `path` unless the file already holds the same text.
    /// Returns whether the file was modified.
    pub fn write(&mut self, path: &Path, content: &str) -> Result<bool, WriteError> {
        if !self.touched.insert(path.to_path_buf()) {
            warn!(
                path = %self.display(path),
                "Path written more than once in this run, last write wins"
            );
        }

        let content = normalize_line_endings(content);
        let existed = path.exists();
        if existed {
            if let Ok(bytes) = fs::read(path) {
                let existing = normalize_line_endings(&String::from_utf8_lossy(&bytes));
                if existing.trim_end() == content.trim_end() {
                    return Ok(false);
                }
            }
        }

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|source| WriteError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, content.as_bytes()).map_err(|source| WriteError::Write {
            path: path.to_path_buf(),
            source,
        })?;

        self.ledger.written.push(path.to_path_buf());
        info!(
            path = %self.display(path),
            "{}",
            if existed { "Updated" } else { "Created" }
        );
        Ok(true)
    }

    pub fn ledger(&self) -> &WriteLedger {
        &self.ledger
    }

    pub fn into_ledger(self) -> WriteLedger {
        self.ledger
    }

    fn display(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .display()
            .to_string()
    }
}

/// Converts `\r\n` and lone `\r` to `\n`.
pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

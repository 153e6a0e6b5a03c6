//! Deterministic recursive directory walk.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Lists every file below `root` in sorted, depth-first order.
///
/// Directories whose name appears in `prune` are not entered. Symbolic links
/// to directories are not followed; links to files are listed. Unreadable
/// entries are skipped.
pub(crate) fn walk_files(root: &Path, prune: &[&str]) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            let pruned = e.depth() > 0
                && e.file_type().is_dir()
                && prune.iter().any(|p| e.file_name() == *p);
            !pruned
        })
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!(error = %e, root = %root.display(), "Skipping unreadable entry");
                None
            }
        })
        .filter(|e| !e.file_type().is_dir() && e.path().is_file())
        .map(|e| e.into_path())
        .collect()
}

/// Immediate subdirectories of `dir`, sorted by name.
pub(crate) fn subdirectories(dir: &Path) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = match fs::read_dir(dir) {
        Ok(read) => read
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect(),
        Err(_) => Vec::new(),
    };
    dirs.sort();
    dirs
}

/// Immediate files of `dir` accepted by `keep`, sorted by name.
pub(crate) fn files_in(dir: &Path, keep: impl Fn(&str) -> bool) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = match fs::read_dir(dir) {
        Ok(read) => read
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .filter(|p| p.file_name().and_then(|n| n.to_str()).is_some_and(&keep))
            .collect(),
        Err(_) => Vec::new(),
    };
    files.sort();
    files
}

/// Path relative to `base` with `/` separators.
pub(crate) fn relative_slash(base: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(base).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

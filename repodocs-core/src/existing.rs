//! Copy of hand-written documentation folders.

use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{info, warn};

use crate::walk::walk_files;

static RE_RELATIVE_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\]\(\./(.*?)\)").unwrap());

/// Rewrites `](./x)` links so they resolve from the unified site's
/// `<repo>/` folder.
pub fn transform_links(content: &str, repo_name: &str) -> String {
    let replacement = format!("](../{}/$1)", repo_name.replace('$', "$$"));
    RE_RELATIVE_LINK
        .replace_all(content, replacement.as_str())
        .into_owned()
}

/// A file to publish: destination path relative to the repository's output
/// folder, and its final content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopiedFile {
    pub relative: PathBuf,
    pub content: String,
}

/// Collects every `*.md` file below `docs_dir` with links rewritten, plus the
/// folder's `toc.yml` as is. A missing folder yields nothing.
pub fn collect_existing(docs_dir: &Path, repo_name: &str) -> Vec<CopiedFile> {
    if !docs_dir.is_dir() {
        warn!(repo = repo_name, path = %docs_dir.display(), "No docs folder found");
        return Vec::new();
    }

    let mut copied = Vec::new();
    for file in walk_files(docs_dir, &[]) {
        if !file.extension().is_some_and(|e| e == "md") {
            continue;
        }
        let content = match fs::read_to_string(&file) {
            Ok(content) => content,
            Err(e) => {
                warn!(error = %e, path = %file.display(), "Skipping unreadable page");
                continue;
            }
        };
        let relative = file.strip_prefix(docs_dir).unwrap_or(&file).to_path_buf();
        copied.push(CopiedFile {
            relative,
            content: transform_links(&content, repo_name),
        });
    }

    let toc = docs_dir.join("toc.yml");
    if let Ok(content) = fs::read_to_string(&toc) {
        copied.push(CopiedFile {
            relative: PathBuf::from("toc.yml"),
            content,
        });
    }

    info!(repo = repo_name, files = copied.len(), "Collected existing docs");
    copied
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_only_dot_slash_links() {
        let md = "See [intro](./intro.md) and [api](./api/index.md#top), not [ext](https://x.y) or [up](../z.md).";
        assert_eq!(
            transform_links(md, "utilities"),
            "See [intro](../utilities/intro.md) and [api](../utilities/api/index.md#top), not [ext](https://x.y) or [up](../z.md)."
        );
    }
}

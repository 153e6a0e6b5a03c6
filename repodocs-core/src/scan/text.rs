//! Best-effort text extraction from READMEs, flat lists and source files.
//!
//! These are anchored pattern matches, not parsers. A missing match is an
//! expected absence and is reported as `None`, never as an error.

use regex::Regex;
use std::sync::LazyLock;

/// Longest summary kept by [`first_paragraph`], ellipsis included.
pub const SUMMARY_LIMIT: usize = 200;

static RE_SUMMARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<summary>\s*(.*?)\s*</summary>").unwrap());

static RE_DOC_SUMMARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/// <summary>\s*(.*?)\s*/// </summary>").unwrap());

static RE_DOC_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\s*///\s*").unwrap());

static RE_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"public\s+(abstract\s+)?class\s+(\w+)(?:<[^>]+>)?(?:\s*:\s*([^\{]+))?").unwrap()
});

/// First paragraph of a Markdown document, joined onto one line.
///
/// Headings and blank lines before the first content line are skipped; the
/// paragraph ends at the next heading or blank line. Results longer than
/// [`SUMMARY_LIMIT`] characters are cut and end in `...`.
pub fn first_paragraph(markdown: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for line in markdown.split('\n') {
        if line.starts_with('#') || line.trim().is_empty() {
            if !parts.is_empty() {
                break;
            }
            continue;
        }
        parts.push(line.trim());
    }

    let joined = parts.join(" ");
    if joined.chars().count() > SUMMARY_LIMIT {
        let cut: String = joined.chars().take(SUMMARY_LIMIT - 3).collect();
        format!("{cut}...")
    } else {
        joined
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BannedApi {
    pub api: String,
    pub reason: String,
}

/// Parses `api;reason` lines. Blank and `#` lines are skipped; a line without
/// a reason gets `Banned`.
pub fn parse_banned_apis(content: &str) -> Vec<BannedApi> {
    content
        .lines()
        .filter(|line| !line.trim().is_empty() && !line.trim_start().starts_with('#'))
        .map(|line| match line.split_once(';') {
            Some((api, reason)) => BannedApi {
                api: api.trim().to_string(),
                reason: reason.trim().to_string(),
            },
            None => BannedApi {
                api: line.trim().to_string(),
                reason: "Banned".to_string(),
            },
        })
        .collect()
}

/// Inner text of the first `<summary>` element.
pub fn extract_summary(source: &str) -> Option<String> {
    RE_SUMMARY
        .captures(source)
        .map(|caps| caps[1].trim().to_string())
}

/// First `/// <summary>` block with the comment markers stripped.
pub fn extract_doc_summary(source: &str) -> Option<String> {
    let caps = RE_DOC_SUMMARY.captures(source)?;
    let text = RE_DOC_PREFIX.replace_all(&caps[1], "");
    Some(text.trim().to_string())
}

/// The first public class declaration, up to its opening brace.
pub fn extract_class_declaration(source: &str) -> Option<String> {
    RE_CLASS.find(source).map(|m| m.as_str().trim().to_string())
}

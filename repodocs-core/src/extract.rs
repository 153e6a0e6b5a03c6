//! Rule and refactoring extraction from built artifacts.
//!
//! Artifacts are descriptor exports produced by a component's release build:
//! a JSON document listing the component's exported types. Each type names a
//! `kind` (`analyzer`, `code_fix`, `refactoring`; anything else is not a rule
//! provider and is ignored) plus the payload for that kind:
//!
//! ```json
//! { "types": [
//!   { "name": "AsyncVoidAnalyzer", "kind": "analyzer", "diagnostics": [
//!       { "id": "AL0001", "category": "Usage", "title": "Avoid async void",
//!         "description": "...", "severity": "Warning", "enabled_by_default": true } ] },
//!   { "name": "AsyncVoidCodeFix", "kind": "code_fix", "fixable_ids": ["AL0001"] },
//!   { "name": "Ar0001SnakeCaseToPascalCaseRefactoring", "kind": "refactoring" }
//! ] }
//! ```
//!
//! A type whose payload cannot be read is skipped with a warning, the way a
//! provider without a usable constructor would be.

use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::RepositorySpec;
use crate::contract::{
    AnalyzerDescriptor, DescriptorSet, DescriptorSource, ExtractedRefactoring, ExtractedRule,
    FixerDescriptor, RefactoringDescriptor, RuleDescriptor,
};
use crate::walk::{relative_slash, walk_files};

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("artifact '{name}' not found at {configured}; searched release output below {searched}")]
    ArtifactNotFound {
        name: String,
        configured: PathBuf,
        searched: PathBuf,
    },

    #[error("failed to read artifact {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("artifact {path} is not a valid descriptor export: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

static RE_REFACTORING_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[a][r](\d{4})").unwrap());

static RE_REFACTORING_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[a][r]\d{4}(.+?)Refactoring$").unwrap());

static RE_WORD_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z])([A-Z])").unwrap());

/// Directories never searched for artifacts or sources.
const PRUNE: &[&str] = &[".git", "node_modules"];

/// Reads the JSON descriptor export format described in the module docs.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonDescriptorSource;

#[derive(Deserialize)]
struct ExportFile {
    types: Vec<serde_json::Value>,
}

#[derive(Deserialize)]
struct ExportedType {
    name: String,
    #[serde(default)]
    kind: String,
    #[serde(default, rename = "abstract")]
    is_abstract: bool,
}

#[derive(Deserialize)]
struct AnalyzerPayload {
    diagnostics: Vec<RuleDescriptor>,
}

#[derive(Deserialize)]
struct FixerPayload {
    fixable_ids: Vec<String>,
}

impl DescriptorSource for JsonDescriptorSource {
    fn load(&self, artifact: &Path) -> Result<DescriptorSet, ExtractError> {
        let raw = std::fs::read_to_string(artifact).map_err(|source| ExtractError::Read {
            path: artifact.to_path_buf(),
            source,
        })?;
        let export: ExportFile =
            serde_json::from_str(&raw).map_err(|source| ExtractError::Malformed {
                path: artifact.to_path_buf(),
                source,
            })?;

        let mut set = DescriptorSet::default();
        for value in export.types {
            let header: ExportedType = match serde_json::from_value(value.clone()) {
                Ok(header) => header,
                Err(e) => {
                    warn!(
                        error = %e,
                        artifact = %artifact.display(),
                        "Skipping exported type without a name"
                    );
                    continue;
                }
            };
            if header.is_abstract {
                continue;
            }
            match header.kind.as_str() {
                "analyzer" => match serde_json::from_value::<AnalyzerPayload>(value) {
                    Ok(payload) => set.analyzers.push(AnalyzerDescriptor {
                        type_name: header.name,
                        diagnostics: payload.diagnostics,
                    }),
                    Err(e) => instantiation_failed(&header.name, artifact, &e),
                },
                "code_fix" => match serde_json::from_value::<FixerPayload>(value) {
                    Ok(payload) => set.fixers.push(FixerDescriptor {
                        type_name: header.name,
                        fixable_ids: payload.fixable_ids,
                    }),
                    Err(e) => instantiation_failed(&header.name, artifact, &e),
                },
                "refactoring" => set.refactorings.push(RefactoringDescriptor {
                    type_name: header.name,
                }),
                other => {
                    debug!(type_name = %header.name, kind = other, "Ignoring non-provider type")
                }
            }
        }

        info!(
            artifact = %artifact.display(),
            analyzers = set.analyzers.len(),
            fixers = set.fixers.len(),
            refactorings = set.refactorings.len(),
            "Loaded descriptors"
        );
        Ok(set)
    }
}

fn instantiation_failed(type_name: &str, artifact: &Path, err: &serde_json::Error) {
    warn!(
        type_name,
        artifact = %artifact.display(),
        error = %err,
        "Failed to instantiate exported type, skipping"
    );
}

/// Locates an artifact: the configured path when it exists, otherwise the
/// first file with the same name under a release build output folder, in
/// sorted walk order. Reference-assembly stubs (`ref`/`refint` folders) are
/// never picked.
pub fn resolve_artifact(working_copy: &Path, configured: &Path) -> Result<PathBuf, ExtractError> {
    let exact = working_copy.join(configured);
    if exact.is_file() {
        return Ok(exact);
    }

    let name = configured
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let candidates: Vec<PathBuf> = walk_files(working_copy, PRUNE)
        .into_iter()
        .filter(|p| p.file_name().is_some_and(|n| n.to_string_lossy() == name))
        .filter(|p| is_release_output(working_copy, p))
        .collect();

    match candidates.first() {
        Some(found) => {
            if candidates.len() > 1 {
                warn!(
                    name = %name,
                    candidates = candidates.len(),
                    chosen = %relative_slash(working_copy, found),
                    "Several artifacts match, using the first in walk order"
                );
            } else {
                info!(found = %relative_slash(working_copy, found), "Found artifact");
            }
            Ok(found.clone())
        }
        None => Err(ExtractError::ArtifactNotFound {
            name,
            configured: exact,
            searched: working_copy.to_path_buf(),
        }),
    }
}

/// True for paths with a `bin` folder followed by a `Release*`/`release_*`
/// folder and no reference-assembly folder.
fn is_release_output(working_copy: &Path, path: &Path) -> bool {
    let rel = path.strip_prefix(working_copy).unwrap_or(path);
    let dirs: Vec<String> = rel
        .parent()
        .map(|p| {
            p.components()
                .filter_map(|c| match c {
                    Component::Normal(s) => Some(s.to_string_lossy().to_lowercase()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();

    if dirs.iter().any(|d| d == "ref" || d == "refint") {
        return false;
    }
    match dirs.iter().position(|d| d == "bin") {
        Some(bin) => dirs[bin + 1..].iter().any(|d| d.starts_with("release")),
        None => false,
    }
}

/// Loads every configured artifact of `repo` through `source`.
///
/// The primary artifact must resolve and load; a missing or broken code-fix
/// artifact only loses the fix information.
pub fn load_descriptors(
    source: &dyn DescriptorSource,
    working_copy: &Path,
    repo: &RepositorySpec,
) -> Result<DescriptorSet, ExtractError> {
    let mut artifacts = repo.artifacts().into_iter();
    let mut set = match artifacts.next() {
        Some(primary) => source.load(&resolve_artifact(working_copy, primary)?)?,
        None => return Ok(DescriptorSet::default()),
    };

    for extra in artifacts {
        let loaded = resolve_artifact(working_copy, extra).and_then(|path| source.load(&path));
        match loaded {
            Ok(more) => set.merge(more),
            Err(e) => warn!(repo = %repo.name, error = %e, "Skipping code-fix artifact"),
        }
    }
    Ok(set)
}

/// True when some fixer declares `id` among its fixable ids (ordinal match).
pub fn has_code_fix(fixers: &[FixerDescriptor], id: &str) -> bool {
    fixers
        .iter()
        .any(|f| f.fixable_ids.iter().any(|fixable| fixable == id))
}

/// All rules across all analyzers, sorted by id, each id kept once.
///
/// The first occurrence in analyzer order wins; later duplicates are dropped.
/// Duplicates that disagree on title or category are reported.
pub fn collect_rules(set: &DescriptorSet) -> Vec<ExtractedRule> {
    let mut all: Vec<(&AnalyzerDescriptor, &RuleDescriptor)> = set
        .analyzers
        .iter()
        .flat_map(|a| a.diagnostics.iter().map(move |d| (a, d)))
        .collect();
    all.sort_by(|a, b| a.1.id.cmp(&b.1.id));

    let mut rules: Vec<ExtractedRule> = Vec::with_capacity(all.len());
    for (analyzer, diagnostic) in all {
        if let Some(kept) = rules.last() {
            if kept.id == diagnostic.id {
                if kept.title != diagnostic.title || kept.category != diagnostic.category {
                    warn!(
                        id = %diagnostic.id,
                        kept = %kept.type_name,
                        dropped = %analyzer.type_name,
                        "Rule id declared twice with different metadata, keeping the first"
                    );
                }
                continue;
            }
        }
        rules.push(ExtractedRule {
            id: diagnostic.id.clone(),
            category: diagnostic.category.clone(),
            title: diagnostic.title.clone(),
            description: diagnostic.description.clone(),
            severity: diagnostic.severity,
            enabled_by_default: diagnostic.enabled_by_default,
            has_code_fix: has_code_fix(&set.fixers, &diagnostic.id),
            type_name: analyzer.type_name.clone(),
        });
    }
    rules
}

/// `AR####` identifier carried by a refactoring type name, if any.
pub fn refactoring_id(type_name: &str) -> Option<String> {
    RE_REFACTORING_ID
        .captures(type_name)
        .map(|caps| format!("AR{}", &caps[1]))
}

/// Human description from a refactoring type name:
/// `Ar0001SnakeCaseToPascalCaseRefactoring` becomes `Snake Case To Pascal Case`.
pub fn refactoring_description(type_name: &str) -> String {
    match RE_REFACTORING_NAME.captures(type_name) {
        Some(caps) => RE_WORD_BREAK.replace_all(&caps[1], "$1 $2").into_owned(),
        None => "Code refactoring".to_string(),
    }
}

/// Refactorings with an identifier, ordered by type name. When several types
/// carry the same identifier the first in that order wins.
pub fn collect_refactorings(set: &DescriptorSet) -> Vec<ExtractedRefactoring> {
    let mut providers: Vec<&RefactoringDescriptor> = set.refactorings.iter().collect();
    providers.sort_by(|a, b| a.type_name.cmp(&b.type_name));

    let mut seen: BTreeMap<String, &str> = BTreeMap::new();
    let mut refactorings = Vec::new();
    for provider in providers {
        let Some(id) = refactoring_id(&provider.type_name) else {
            continue;
        };
        if let Some(kept) = seen.get(&id) {
            warn!(
                id = %id,
                kept = %kept,
                dropped = %provider.type_name,
                "Refactoring id declared twice, keeping the first"
            );
            continue;
        }
        seen.insert(id.clone(), &provider.type_name);
        refactorings.push(ExtractedRefactoring {
            id,
            description: refactoring_description(&provider.type_name),
            type_name: provider.type_name.clone(),
        });
    }
    refactorings
}

/// Repository-relative path of the single source file defining `type_name`,
/// tried as `<Type>.<ext>` then `<Type>.*.<ext>`. Ambiguous matches yield `None`.
pub fn find_source_file(
    working_copy: &Path,
    type_name: &str,
    extension: &str,
) -> Option<String> {
    let files = walk_files(working_copy, &[".git", "bin", "obj", "node_modules"]);
    let exact = format!("{type_name}.{extension}");
    let prefix = format!("{type_name}.");
    let suffix = format!(".{extension}");

    let exact_matches: Vec<&PathBuf> = files
        .iter()
        .filter(|p| p.file_name().is_some_and(|n| n.to_string_lossy() == exact))
        .collect();
    if exact_matches.len() == 1 {
        return Some(relative_slash(working_copy, exact_matches[0]));
    }

    let partial_matches: Vec<&PathBuf> = files
        .iter()
        .filter(|p| {
            p.file_name().is_some_and(|n| {
                let n = n.to_string_lossy();
                n.len() > prefix.len() + suffix.len()
                    && n.starts_with(&prefix)
                    && n.ends_with(&suffix)
            })
        })
        .collect();
    if partial_matches.len() == 1 {
        return Some(relative_slash(working_copy, partial_matches[0]));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refactoring_id_from_type_name() {
        assert_eq!(
            refactoring_id("Ar0001SnakeCaseToPascalCaseRefactoring").as_deref(),
            Some("AR0001")
        );
        assert_eq!(refactoring_id("aR1234Thing").as_deref(), Some("AR1234"));
        assert_eq!(refactoring_id("ExtractMethodRefactoring"), None);
        assert_eq!(refactoring_id("Ar12Short"), None);
    }

    #[test]
    fn refactoring_description_inserts_word_breaks() {
        assert_eq!(
            refactoring_description("Ar0001SnakeCaseToPascalCaseRefactoring"),
            "Snake Case To Pascal Case"
        );
        assert_eq!(
            refactoring_description("Ar0002Something"),
            "Code refactoring"
        );
    }

    #[test]
    fn refactorings_sharing_an_id_keep_the_first_type() {
        let set = DescriptorSet {
            refactorings: vec![
                RefactoringDescriptor {
                    type_name: "Ar0003ZetaRefactoring".to_string(),
                },
                RefactoringDescriptor {
                    type_name: "Ar0003AlphaRefactoring".to_string(),
                },
                RefactoringDescriptor {
                    type_name: "Ar0004InlineTempRefactoring".to_string(),
                },
            ],
            ..DescriptorSet::default()
        };

        let refactorings = collect_refactorings(&set);
        let ids: Vec<&str> = refactorings.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["AR0003", "AR0004"]);
        assert_eq!(refactorings[0].type_name, "Ar0003AlphaRefactoring");
        assert_eq!(refactorings[0].description, "Alpha");
    }

    #[cfg(unix)]
    #[test]
    fn source_lookup_ignores_linked_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(src.join("FooAnalyzer.cs"), "class FooAnalyzer {}").unwrap();
        std::os::unix::fs::symlink(&src, tmp.path().join("linked")).unwrap();

        assert_eq!(
            find_source_file(tmp.path(), "FooAnalyzer", "cs").as_deref(),
            Some("src/FooAnalyzer.cs")
        );
    }

    #[test]
    fn release_output_detection() {
        let root = Path::new("/repo");
        assert!(is_release_output(
            root,
            Path::new("/repo/src/A/bin/Release/net8.0/A.json")
        ));
        assert!(is_release_output(
            root,
            Path::new("/repo/artifacts/bin/A/release_netstandard2.0/A.json")
        ));
        assert!(!is_release_output(
            root,
            Path::new("/repo/src/A/bin/Debug/net8.0/A.json")
        ));
        assert!(!is_release_output(
            root,
            Path::new("/repo/src/A/bin/Release/net8.0/ref/A.json")
        ));
        assert!(!is_release_output(root, Path::new("/repo/A.json")));
    }
}

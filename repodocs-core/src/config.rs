//! Static configuration: which repositories are documented and how.
//!
//! A [`DocsConfig`] is built once at startup (from YAML in the CLI crate, or
//! directly in tests) and is never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Directory whose presence marks the project root.
pub const ROOT_MARKER: &str = ".git";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("no repositories configured")]
    NoRepositories,

    #[error("repository #{index} has an empty short name")]
    EmptyName { index: usize },

    #[error("repository short name '{repo}' is configured more than once")]
    DuplicateName { repo: String },

    #[error("repository '{repo}' introspects a binary but has no artifact path configured")]
    MissingArtifact { repo: String },

    #[error("cannot find project root: no '{marker}' directory above {start}")]
    ProjectRootNotFound { marker: String, start: PathBuf },
}

impl ConfigError {
    pub fn category(&self) -> &'static str {
        match self {
            ConfigError::ProjectRootNotFound { .. } => "startup",
            _ => "configuration",
        }
    }
}

/// Where a repository's documentation comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocsSource {
    /// Copy an existing Markdown folder from the working copy.
    CopyExisting,
    /// Read rule descriptors from a built artifact.
    IntrospectBinary,
    /// Infer pages from the directory layout of the working copy.
    ScanConventions,
}

/// One documented component repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositorySpec {
    /// Short name, used as the cache and output directory key.
    pub name: String,
    pub git_url: String,
    pub display_name: String,
    pub description: String,
    pub docs_source: DocsSource,
    #[serde(default)]
    pub existing_docs_path: Option<PathBuf>,
    /// Run the release build before extraction.
    #[serde(default)]
    pub build: bool,
    /// Descriptor artifact, relative to the working copy.
    #[serde(default)]
    pub artifact: Option<PathBuf>,
    #[serde(default)]
    pub code_fix_artifact: Option<PathBuf>,
    /// Browse URL for source links; derived from `git_url` when absent.
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default = "default_source_extension")]
    pub source_extension: String,
    /// Hand-maintained rule pages inside the working copy.
    #[serde(default = "default_rule_docs_path")]
    pub rule_docs_path: PathBuf,
    /// Project globs for the site generator's API metadata job.
    #[serde(default)]
    pub api_metadata: Vec<String>,
    #[serde(default)]
    pub layout: ConventionLayout,
}

fn default_source_extension() -> String {
    "cs".to_string()
}

fn default_rule_docs_path() -> PathBuf {
    PathBuf::from("docs/rules")
}

impl RepositorySpec {
    /// Folder copied by [`DocsSource::CopyExisting`], `docs` unless configured.
    pub fn existing_docs_dir(&self) -> PathBuf {
        self.existing_docs_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("docs"))
    }

    pub fn browse_url(&self) -> String {
        match &self.source_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => self
                .git_url
                .trim_end_matches('/')
                .trim_end_matches(".git")
                .to_string(),
        }
    }

    /// Configured artifacts in load order: analyzers first, then code fixes.
    pub fn artifacts(&self) -> Vec<&Path> {
        self.artifact
            .iter()
            .chain(self.code_fix_artifact.iter())
            .map(PathBuf::as_path)
            .collect()
    }

    pub fn trace_loaded(&self) {
        info!(
            repo = %self.name,
            git_url = %self.git_url,
            docs_source = ?self.docs_source,
            build = self.build,
            "Loaded repository"
        );
    }
}

/// Relative locations walked by the convention scanner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConventionLayout {
    pub readme: PathBuf,
    pub variants_dir: PathBuf,
    pub variant_readme: String,
    pub legacy_support_dir: PathBuf,
    pub polyfill_min_version: String,
    pub banned_symbols_file: PathBuf,
    pub service_defaults_dir: PathBuf,
    pub extensions_dir: PathBuf,
    pub shared_dir: PathBuf,
    pub configuration_dir: PathBuf,
    pub testing_dir: PathBuf,
}

impl Default for ConventionLayout {
    fn default() -> Self {
        Self {
            readme: PathBuf::from("README.md"),
            variants_dir: PathBuf::from("src/Sdk"),
            variant_readme: "Readme.md".to_string(),
            legacy_support_dir: PathBuf::from("eng/LegacySupport"),
            polyfill_min_version: "netstandard2.0".to_string(),
            banned_symbols_file: PathBuf::from("src/configuration/BannedSymbols.txt"),
            service_defaults_dir: PathBuf::from("eng/ANcpSdk.AspNetCore.ServiceDefaults"),
            extensions_dir: PathBuf::from("eng/Extensions"),
            shared_dir: PathBuf::from("eng/Shared"),
            configuration_dir: PathBuf::from("src/configuration"),
            testing_dir: PathBuf::from("src/Shared"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Any VCS failure aborts the run.
    #[default]
    Strict,
    /// VCS exit codes are logged and ignored.
    Lenient,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    pub mode: SyncMode,
    pub default_branch: String,
    pub timeout_secs: Option<u64>,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            mode: SyncMode::Strict,
            default_branch: "main".to_string(),
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSettings {
    pub program: String,
    pub args: Vec<String>,
    pub timeout_secs: Option<u64>,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            program: "dotnet".to_string(),
            args: ["build", "-c", "Release", "--nologo"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuickStart {
    pub language: String,
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSettings {
    pub title: String,
    pub description: String,
    pub footer: String,
    pub quick_start: Option<QuickStart>,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            title: "Documentation".to_string(),
            description: "Component documentation".to_string(),
            footer: "Documentation".to_string(),
            quick_start: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocsConfig {
    #[serde(default)]
    pub site: SiteSettings,
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
    #[serde(default = "default_repos_path")]
    pub repos_path: PathBuf,
    #[serde(default = "default_site_config_path")]
    pub site_config_path: PathBuf,
    #[serde(default)]
    pub sync: SyncSettings,
    #[serde(default)]
    pub build: BuildSettings,
    /// Treat a run that writes nothing as a failure.
    #[serde(default = "default_fail_on_no_changes")]
    pub fail_on_no_changes: bool,
    #[serde(default = "default_generator_name")]
    pub generator_name: String,
    pub repos: Vec<RepositorySpec>,
}

fn default_output_path() -> PathBuf {
    PathBuf::from("content")
}

fn default_repos_path() -> PathBuf {
    PathBuf::from(".repos")
}

fn default_site_config_path() -> PathBuf {
    PathBuf::from("docfx.json")
}

fn default_fail_on_no_changes() -> bool {
    true
}

fn default_generator_name() -> String {
    "repodocs".to_string()
}

impl DocsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.repos.is_empty() {
            return Err(ConfigError::NoRepositories);
        }
        let mut seen = BTreeSet::new();
        for (index, repo) in self.repos.iter().enumerate() {
            if repo.name.trim().is_empty() {
                return Err(ConfigError::EmptyName { index });
            }
            if !seen.insert(repo.name.as_str()) {
                return Err(ConfigError::DuplicateName {
                    repo: repo.name.clone(),
                });
            }
            if repo.docs_source == DocsSource::IntrospectBinary && repo.artifact.is_none() {
                return Err(ConfigError::MissingArtifact {
                    repo: repo.name.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn output_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.output_path)
    }

    pub fn repos_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.repos_path)
    }

    pub fn site_config_file(&self, root: &Path) -> PathBuf {
        root.join(&self.site_config_path)
    }

    pub fn trace_loaded(&self) {
        info!(
            output_path = %self.output_path.display(),
            repos_count = self.repos.len(),
            sync_mode = ?self.sync.mode,
            "Loaded DocsConfig"
        );
        for repo in &self.repos {
            repo.trace_loaded();
        }
        debug!(?self, "DocsConfig loaded (full debug)");
    }
}

/// Walks upward from `start` until a directory containing [`ROOT_MARKER`] is found.
pub fn locate_project_root(start: &Path) -> Result<PathBuf, ConfigError> {
    let mut current = Some(start);
    while let Some(dir) = current {
        if dir.join(ROOT_MARKER).is_dir() {
            return Ok(dir.to_path_buf());
        }
        current = dir.parent();
    }
    Err(ConfigError::ProjectRootNotFound {
        marker: ROOT_MARKER.to_string(),
        start: start.to_path_buf(),
    })
}

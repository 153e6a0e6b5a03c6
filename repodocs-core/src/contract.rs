//! # contract: collaborator seams and the extracted data model
//!
//! The pipeline talks to the outside world through three traits:
//!
//! - [`RepositorySync`]: fetch a repository's working copy to the latest default branch
//! - [`BuildRunner`]: build a working copy in release configuration
//! - [`DescriptorSource`]: enumerate the rule, code-fix and refactoring descriptors
//!   exported by a built artifact
//!
//! Real implementations live in [`crate::sync`], [`crate::build`] and
//! [`crate::extract`]. The traits carry `mockall` mocks under `test` or the
//! `test-export-mocks` feature so integration tests can drive the generator
//! without git, a compiler or network access.
//!
//! The descriptor types mirror the capability every rule provider exposes:
//! `{id, category, title, description, severity, enabled}`. How a given
//! ecosystem populates them (reflection, attribute scanning, an export file)
//! is the `DescriptorSource`'s business.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use mockall::automock;

use crate::build::BuildError;
use crate::config::RepositorySpec;
use crate::extract::ExtractError;
use crate::sync::SyncError;

/// Default severity of a diagnostic rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Hidden,
    Info,
    Warning,
    Error,
    /// Any value the source reports that is not one of the above.
    #[serde(other)]
    Unknown,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Hidden => "Hidden",
            Severity::Info => "Info",
            Severity::Warning => "Warning",
            Severity::Error => "Error",
            Severity::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

fn enabled_default() -> bool {
    true
}

/// One rule as declared by an analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDescriptor {
    pub id: String,
    pub category: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub severity: Severity,
    #[serde(default = "enabled_default", alias = "enabled")]
    pub enabled_by_default: bool,
}

/// An exported analyzer type and the rules it supports, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzerDescriptor {
    pub type_name: String,
    pub diagnostics: Vec<RuleDescriptor>,
}

/// An exported code-fix provider and the rule ids it can fix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixerDescriptor {
    pub type_name: String,
    pub fixable_ids: Vec<String>,
}

/// An exported refactoring provider. Only its type name carries information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefactoringDescriptor {
    pub type_name: String,
}

/// Everything a set of artifacts exports, in artifact order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescriptorSet {
    pub analyzers: Vec<AnalyzerDescriptor>,
    pub fixers: Vec<FixerDescriptor>,
    pub refactorings: Vec<RefactoringDescriptor>,
}

impl DescriptorSet {
    pub fn merge(&mut self, other: DescriptorSet) {
        self.analyzers.extend(other.analyzers);
        self.fixers.extend(other.fixers);
        self.refactorings.extend(other.refactorings);
    }

    pub fn is_empty(&self) -> bool {
        self.analyzers.is_empty() && self.fixers.is_empty() && self.refactorings.is_empty()
    }
}

/// A de-duplicated rule ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedRule {
    pub id: String,
    pub category: String,
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub enabled_by_default: bool,
    pub has_code_fix: bool,
    /// Analyzer type that declared the rule, used to resolve a source link.
    pub type_name: String,
}

/// A refactoring provider whose type name carries an `AR####` identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedRefactoring {
    pub id: String,
    pub description: String,
    pub type_name: String,
}

/// Result of a build invocation. A non-zero exit code is not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutcome {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl BuildOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Keeps local working copies in step with their remotes.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait RepositorySync: Send + Sync {
    /// Clone `repo` into `checkout` when absent, otherwise fetch and hard-reset
    /// it to the remote default branch.
    async fn sync(&self, repo: &RepositorySpec, checkout: &Path) -> Result<(), SyncError>;

    /// Short summary of uncommitted changes below `root`.
    async fn diff_stat(&self, root: &Path) -> Result<String, SyncError>;
}

/// Builds a working copy so its artifacts can be introspected.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait BuildRunner: Send + Sync {
    async fn build(&self, working_copy: &Path) -> Result<BuildOutcome, BuildError>;
}

/// Enumerates descriptors exported by one artifact.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait DescriptorSource: Send + Sync {
    fn load(&self, artifact: &Path) -> Result<DescriptorSet, ExtractError>;
}

//! Top-level pipeline: sync → build → extract → render → write.
//!
//! [`DocsGenerator::generate`] runs the whole documentation synthesis for a
//! [`DocsConfig`]:
//!   - synchronises every repository working copy (strict mode aborts on the first failure)
//!   - builds the repositories that ask for it (failures only warn)
//!   - dispatches each repository to its extraction strategy, in configuration order
//!   - writes the site-level index, navigation and site-generator configuration
//!   - reports how many files actually changed, plus a `git diff --stat` summary
//!
//! Everything that touches the outside world goes through the
//! [`RepositorySync`], [`BuildRunner`] and [`DescriptorSource`] seams, so the
//! pipeline can be driven with mocks in tests.
//!
//! # Error Handling
//! Only infrastructure failures abort a run: an invalid configuration, a sync
//! failure, an output write failure. Problems local to one repository (missing
//! artifact, unreadable descriptor export) are logged, recorded in
//! [`GenerationReport::skipped`] and the run continues with the next one.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::{ConfigError, DocsConfig, DocsSource, RepositorySpec};
use crate::contract::{BuildRunner, DescriptorSource, RepositorySync};
use crate::existing::collect_existing;
use crate::extract::{collect_refactorings, collect_rules, find_source_file, load_descriptors};
use crate::render::{self, NavigationEntry, PageDocument, SourceLink};
use crate::scan::{conventions_toc, scan_conventions};
use crate::sync::{checkout_dir, SyncError};
use crate::writer::{IdempotentWriter, WriteError};

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to sync repository '{repo}': {source}")]
    Sync {
        repo: String,
        #[source]
        source: SyncError,
    },

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error("failed to render site configuration: {0}")]
    Render(#[from] serde_json::Error),

    #[error("no files were written")]
    NoChanges,
}

impl GenerateError {
    pub fn category(&self) -> &'static str {
        match self {
            GenerateError::Config(e) => e.category(),
            GenerateError::Sync { .. } => "sync",
            GenerateError::Write(_) => "write",
            GenerateError::Render(_) => "render",
            GenerateError::NoChanges => "no-changes",
        }
    }
}

/// A repository whose contribution was dropped from this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRepository {
    pub repo: String,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct GenerationReport {
    pub files_written: usize,
    /// Modified paths, in write order.
    pub written: Vec<PathBuf>,
    pub skipped: Vec<SkippedRepository>,
    /// `git diff --stat` of the project root, when anything was written.
    pub diff_stat: Option<String>,
}

pub struct DocsGenerator<S, B, D> {
    config: DocsConfig,
    root: PathBuf,
    sync: S,
    builder: B,
    descriptors: D,
}

impl<S, B, D> DocsGenerator<S, B, D>
where
    S: RepositorySync,
    B: BuildRunner,
    D: DescriptorSource,
{
    /// `root` is the project root; every configured path is relative to it.
    pub fn new(
        config: DocsConfig,
        root: impl Into<PathBuf>,
        sync: S,
        builder: B,
        descriptors: D,
    ) -> Self {
        Self {
            config,
            root: root.into(),
            sync,
            builder,
            descriptors,
        }
    }

    pub fn config(&self) -> &DocsConfig {
        &self.config
    }

    pub async fn generate(&self) -> Result<GenerationReport, GenerateError> {
        self.config.validate()?;
        let output = self.config.output_dir(&self.root);
        let repos = self.config.repos_dir(&self.root);
        info!(
            output = %output.display(),
            repos = %repos.display(),
            "[GENERATE] Starting documentation run"
        );

        self.sync_all(&repos).await?;
        self.build_all(&repos).await;

        let mut writer = IdempotentWriter::new(&self.root);
        let mut skipped = Vec::new();
        for repo in &self.config.repos {
            let checkout = checkout_dir(&repos, repo);
            let repo_out = output.join(&repo.name);
            info!(
                repo = %repo.name,
                display_name = %repo.display_name,
                "[GENERATE] Generating docs"
            );

            let outcome = match repo.docs_source {
                DocsSource::CopyExisting => {
                    self.copy_existing(repo, &checkout, &repo_out, &mut writer)
                }
                DocsSource::IntrospectBinary => {
                    self.introspect(repo, &checkout, &repo_out, &mut writer)
                }
                DocsSource::ScanConventions => self.scan(repo, &checkout, &repo_out, &mut writer),
            };
            if let Some(reason) = outcome? {
                skipped.push(SkippedRepository {
                    repo: repo.name.clone(),
                    reason,
                });
            }

            let toc = repo_out.join("toc.yml");
            if toc.exists() {
                debug!(repo = %repo.name, "Navigation already present, keeping it");
            } else {
                writer.write(&toc, &render::render_toc(&render::repo_toc_fallback(repo)))?;
            }
        }

        self.write_site(&output, &mut writer)?;

        let ledger = writer.into_ledger();
        let files_written = ledger.count();
        info!(files_written, skipped = skipped.len(), "[GENERATE] Documentation run finished");

        let diff_stat = if files_written > 0 {
            match self.sync.diff_stat(&self.root).await {
                Ok(stat) => Some(stat),
                Err(e) => {
                    warn!(error = %e, "Could not summarise changes");
                    None
                }
            }
        } else {
            None
        };

        if files_written == 0 && self.config.fail_on_no_changes {
            error!("[GENERATE][ERROR] No files were written");
            return Err(GenerateError::NoChanges);
        }

        Ok(GenerationReport {
            files_written,
            written: ledger.written().to_vec(),
            skipped,
            diff_stat,
        })
    }

    async fn sync_all(&self, repos: &Path) -> Result<(), GenerateError> {
        for repo in &self.config.repos {
            let checkout = checkout_dir(repos, repo);
            if let Err(source) = self.sync.sync(repo, &checkout).await {
                error!(
                    repo = %repo.name,
                    error = %source,
                    "[GENERATE][ERROR] Sync failed, aborting run"
                );
                return Err(GenerateError::Sync {
                    repo: repo.name.clone(),
                    source,
                });
            }
        }
        Ok(())
    }

    async fn build_all(&self, repos: &Path) {
        for repo in self.config.repos.iter().filter(|r| r.build) {
            let checkout = checkout_dir(repos, repo);
            info!(repo = %repo.name, "[GENERATE] Building");
            match self.builder.build(&checkout).await {
                Ok(outcome) if outcome.success() => {
                    info!(repo = %repo.name, "Build succeeded");
                }
                Ok(outcome) => warn!(
                    repo = %repo.name,
                    exit_code = outcome.exit_code,
                    stderr = %outcome.stderr.trim(),
                    "Build failed, continuing with existing artifacts"
                ),
                Err(e) => warn!(
                    repo = %repo.name,
                    error = %e,
                    "Build could not run, continuing with existing artifacts"
                ),
            }
        }
    }

    fn copy_existing(
        &self,
        repo: &RepositorySpec,
        checkout: &Path,
        out: &Path,
        writer: &mut IdempotentWriter,
    ) -> Result<Option<String>, GenerateError> {
        let docs_dir = checkout.join(repo.existing_docs_dir());
        let files = collect_existing(&docs_dir, &repo.name);
        if files.is_empty() {
            return Ok(Some(format!("no docs found in {}", docs_dir.display())));
        }
        for file in files {
            writer.write(&out.join(&file.relative), &file.content)?;
        }
        Ok(None)
    }

    fn introspect(
        &self,
        repo: &RepositorySpec,
        checkout: &Path,
        out: &Path,
        writer: &mut IdempotentWriter,
    ) -> Result<Option<String>, GenerateError> {
        let set = match load_descriptors(&self.descriptors, checkout, repo) {
            Ok(set) => set,
            Err(e) => {
                warn!(repo = %repo.name, error = %e, "Skipping rule extraction");
                return Ok(Some(e.to_string()));
            }
        };
        let rules = collect_rules(&set);
        let refactorings = collect_refactorings(&set);
        info!(
            repo = %repo.name,
            rules = rules.len(),
            refactorings = refactorings.len(),
            "Extracted rules"
        );

        let index = render::rules_index_page(repo, &rules, &refactorings);
        write_page(writer, &out.join("index.md"), &index)?;

        let rules_dir = out.join("rules");
        let hand_written = checkout.join(&repo.rule_docs_path);
        let mut links = SourceLinks::new(repo, checkout);
        for rule in &rules {
            let mut page = render::rule_page(rule, links.get(&rule.type_name)).render();
            if let Ok(existing) = fs::read_to_string(hand_written.join(format!("{}.md", rule.id))) {
                page = render::merge_rule_content(&page, &existing);
            }
            writer.write(&rules_dir.join(format!("{}.md", rule.id)), &page)?;
        }
        for refactoring in &refactorings {
            let page = render::refactoring_page(refactoring, links.get(&refactoring.type_name));
            write_page(writer, &rules_dir.join(format!("{}.md", refactoring.id)), &page)?;
        }

        let toc = render::categorized_rules_toc(&rules, &refactorings);
        write_toc(writer, &rules_dir.join("toc.yml"), &toc)?;
        write_page(writer, &out.join("configuration.md"), &render::configuration_page(&rules))?;

        let settings_dir = out.join("configuration");
        let generator = &self.config.generator_name;
        writer.write(
            &settings_dir.join("default.editorconfig"),
            &render::editorconfig_file(generator, &rules, None),
        )?;
        writer.write(
            &settings_dir.join("none.editorconfig"),
            &render::editorconfig_file(generator, &rules, Some("none")),
        )?;
        Ok(None)
    }

    fn scan(
        &self,
        repo: &RepositorySpec,
        checkout: &Path,
        out: &Path,
        writer: &mut IdempotentWriter,
    ) -> Result<Option<String>, GenerateError> {
        let pages = scan_conventions(checkout, repo);
        for page in &pages {
            write_page(writer, &out.join(page.section.file_name()), &page.document)?;
        }
        write_toc(writer, &out.join("toc.yml"), &conventions_toc(&pages))?;
        Ok(None)
    }

    fn write_site(
        &self,
        output: &Path,
        writer: &mut IdempotentWriter,
    ) -> Result<(), GenerateError> {
        write_page(writer, &output.join("index.md"), &render::unified_index(&self.config))?;
        write_toc(writer, &output.join("toc.yml"), &render::root_toc(&self.config))?;
        let site = render::site_config(&self.config)?;
        writer.write(&self.config.site_config_file(&self.root), &site)?;
        Ok(())
    }
}

fn write_page(
    writer: &mut IdempotentWriter,
    path: &Path,
    page: &PageDocument,
) -> Result<bool, WriteError> {
    writer.write(path, &page.render())
}

fn write_toc(
    writer: &mut IdempotentWriter,
    path: &Path,
    entries: &[NavigationEntry],
) -> Result<bool, WriteError> {
    writer.write(path, &render::render_toc(entries))
}

/// Source file lookups for one repository, cached per type name.
struct SourceLinks<'a> {
    repo: &'a RepositorySpec,
    checkout: &'a Path,
    cache: BTreeMap<String, Option<SourceLink>>,
}

impl<'a> SourceLinks<'a> {
    fn new(repo: &'a RepositorySpec, checkout: &'a Path) -> Self {
        Self {
            repo,
            checkout,
            cache: BTreeMap::new(),
        }
    }

    fn get(&mut self, type_name: &str) -> Option<&SourceLink> {
        let (repo, checkout) = (self.repo, self.checkout);
        self.cache
            .entry(type_name.to_string())
            .or_insert_with(|| {
                find_source_file(checkout, type_name, &repo.source_extension)
                    .map(|relative| SourceLink::new(repo, type_name, &relative))
            })
            .as_ref()
    }
}

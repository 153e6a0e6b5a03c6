//! Page and navigation rendering.
//!
//! Everything here is a pure function of its inputs: no file system access,
//! no clocks, no hash-ordered collections. Identical inputs produce
//! byte-identical text, which is what makes the writer's change detection
//! meaningful.

use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::config::{DocsConfig, DocsSource, RepositorySpec};
use crate::contract::{ExtractedRefactoring, ExtractedRule, Severity};

/// Whole-line headings after which hand-written rule page content is preserved.
static RE_CUSTOM_SECTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^## (?:Examples|See Also|Notes)[ \t]*\r?$").unwrap());

/// A Markdown page with a YAML front matter block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageDocument {
    pub front_matter: Vec<(String, String)>,
    pub body: String,
}

impl PageDocument {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            front_matter: vec![("title".to_string(), title.into())],
            body: body.into(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.front_matter.push((key.to_string(), value.into()));
        self
    }

    pub fn render(&self) -> String {
        let mut out = String::from("---\n");
        for (key, value) in &self.front_matter {
            out.push_str(key);
            out.push_str(": ");
            out.push_str(value);
            out.push('\n');
        }
        out.push_str("---\n\n");
        out.push_str(&self.body);
        out
    }
}

/// One `toc.yml` entry; a group when `items` is non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationEntry {
    pub name: String,
    pub href: Option<String>,
    pub items: Vec<NavigationEntry>,
}

impl NavigationEntry {
    pub fn link(name: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            href: Some(href.into()),
            items: Vec::new(),
        }
    }

    pub fn group(name: impl Into<String>, items: Vec<NavigationEntry>) -> Self {
        Self {
            name: name.into(),
            href: None,
            items,
        }
    }
}

pub fn render_toc(entries: &[NavigationEntry]) -> String {
    let mut out = String::new();
    push_entries(&mut out, entries, 0);
    out
}

fn push_entries(out: &mut String, entries: &[NavigationEntry], indent: usize) {
    let pad = " ".repeat(indent);
    for entry in entries {
        out.push_str(&format!("{pad}- name: {}\n", entry.name));
        if let Some(href) = &entry.href {
            out.push_str(&format!("{pad}  href: {href}\n"));
        }
        if !entry.items.is_empty() {
            out.push_str(&format!("{pad}  items:\n"));
            push_entries(out, &entry.items, indent + 2);
        }
    }
}

// Text helpers

pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '[' | ']' | '<' | '>') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

pub fn escape_yaml(text: &str) -> String {
    text.replace('"', "\\\"")
}

pub fn severity_emoji(severity: Severity) -> &'static str {
    match severity {
        Severity::Hidden => "👻",
        Severity::Info => "ℹ️",
        Severity::Warning => "⚠️",
        Severity::Error => "❌",
        Severity::Unknown => "?",
    }
}

pub fn bool_emoji(value: bool) -> &'static str {
    if value {
        "✔️"
    } else {
        "❌"
    }
}

/// `.editorconfig` severity for a rule; disabled rules are always `none`.
pub fn severity_string(rule: &ExtractedRule) -> &'static str {
    if !rule.enabled_by_default {
        return "none";
    }
    match rule.severity {
        Severity::Hidden => "silent",
        Severity::Info => "suggestion",
        Severity::Warning => "warning",
        Severity::Error => "error",
        Severity::Unknown => "warning",
    }
}

/// Navigation priority of a rule category; unknown categories sort last.
pub fn category_order(category: &str) -> u8 {
    match category {
        "Design" => 0,
        "Reliability" => 1,
        "Usage" => 2,
        "Threading" => 3,
        "OpenTelemetry" => 4,
        "Style" => 5,
        "VersionManagement" => 6,
        "ASP.NET Core" => 7,
        "Performance" => 8,
        _ => 99,
    }
}

// Rule documentation

pub fn rules_table(rules: &[ExtractedRule]) -> String {
    let mut out = String::from("|Id|Category|Description|Severity|Enabled|Code Fix|\n");
    out.push_str("|--|--------|-----------|:------:|:-----:|:------:|\n");
    for rule in rules {
        out.push_str(&format!(
            "|[{id}](./rules/{id}.md)|{}|{}|{}|{}|{}|\n",
            rule.category,
            escape_markdown(&rule.title),
            severity_emoji(rule.severity),
            bool_emoji(rule.enabled_by_default),
            bool_emoji(rule.has_code_fix),
            id = rule.id,
        ));
    }
    out
}

pub fn refactorings_table(refactorings: &[ExtractedRefactoring]) -> String {
    if refactorings.is_empty() {
        return "_No refactorings available._\n".to_string();
    }
    let mut out = String::from("|Id|Description|\n|--|-----------|\n");
    for refactoring in refactorings {
        out.push_str(&format!(
            "|[{id}](./rules/{id}.md)|{}|\n",
            escape_markdown(&refactoring.description),
            id = refactoring.id,
        ));
    }
    out
}

/// Link from a generated page to the file defining the documented type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLink {
    pub label: String,
    pub url: String,
}

impl SourceLink {
    /// Link to `relative` on the default branch of `repo`'s browse URL.
    pub fn new(repo: &RepositorySpec, type_name: &str, relative: &str) -> Self {
        Self {
            label: format!("{type_name}.{}", repo.source_extension),
            url: format!("{}/blob/main/{relative}", repo.browse_url()),
        }
    }
}

fn push_source_link(body: &mut String, source: Option<&SourceLink>) {
    if let Some(link) = source {
        body.push_str(&format!("Source: [{}]({})\n\n", link.label, link.url));
    }
}

pub fn rule_page(rule: &ExtractedRule, source: Option<&SourceLink>) -> PageDocument {
    let mut body = format!("# {} - {}\n\n", rule.id, escape_markdown(&rule.title));
    push_source_link(&mut body, source);

    body.push_str("## Description\n\n");
    body.push_str(&rule.description);
    body.push_str("\n\n## Properties\n\n");
    body.push_str(&format!("- **Category**: {}\n", rule.category));
    body.push_str(&format!("- **Severity**: {}\n", rule.severity));
    body.push_str(&format!("- **Enabled by default**: {}\n", rule.enabled_by_default));
    body.push_str(&format!("- **Code fix available**: {}\n", rule.has_code_fix));
    body.push_str("\n## Configuration\n\n```editorconfig\n");
    body.push_str(&format!(
        "dotnet_diagnostic.{}.severity = {}\n",
        rule.id,
        severity_string(rule)
    ));
    body.push_str("```\n");

    PageDocument::new(
        format!("\"{} - {}\"", rule.id, escape_yaml(&rule.title)),
        body,
    )
}

/// Appends the custom part of a hand-maintained rule page to freshly
/// generated text. The custom part starts at the earliest recognised
/// section heading; a page without one contributes nothing.
pub fn merge_rule_content(generated: &str, existing: &str) -> String {
    match RE_CUSTOM_SECTION.find(existing) {
        Some(heading) => format!("{generated}\n{}", &existing[heading.start()..]),
        None => generated.to_string(),
    }
}

pub fn refactoring_page(
    refactoring: &ExtractedRefactoring,
    source: Option<&SourceLink>,
) -> PageDocument {
    let mut body = format!(
        "# {} - {}\n\n",
        refactoring.id,
        escape_markdown(&refactoring.description)
    );
    push_source_link(&mut body, source);

    body.push_str("## Description\n\n");
    body.push_str(&format!(
        "This is a code refactoring that {}.\n\n",
        refactoring.description.to_lowercase()
    ));
    body.push_str("## Properties\n\n");
    body.push_str("- **Type**: Refactoring (not a diagnostic)\n");
    body.push_str("- **Triggered by**: Right-click context menu or Quick Actions\n\n");
    body.push_str("> [!NOTE]\n");
    body.push_str(
        "> Refactorings do not produce diagnostics and cannot be configured via .editorconfig.\n",
    );

    PageDocument::new(
        format!(
            "\"{} - {}\"",
            refactoring.id,
            escape_yaml(&refactoring.description)
        ),
        body,
    )
}

/// Landing page of an introspected repository.
pub fn rules_index_page(
    repo: &RepositorySpec,
    rules: &[ExtractedRule],
    refactorings: &[ExtractedRefactoring],
) -> PageDocument {
    let mut body = format!("# {}\n\n{}\n\n", repo.display_name, repo.description);
    body.push_str("## Rules\n\n");
    body.push_str(&rules_table(rules));
    body.push_str("\n## Refactorings\n\n");
    body.push_str(&refactorings_table(refactorings));
    body.push_str("\n## Configuration\n\n");
    body.push_str("See [Configuration](./configuration.md) for .editorconfig settings.\n");

    PageDocument::new(repo.display_name.clone(), body).with("description", repo.description.clone())
}

/// Rules navigation grouped by category, with refactorings appended last.
pub fn categorized_rules_toc(
    rules: &[ExtractedRule],
    refactorings: &[ExtractedRefactoring],
) -> Vec<NavigationEntry> {
    let mut by_category: BTreeMap<(u8, &str), Vec<&ExtractedRule>> = BTreeMap::new();
    for rule in rules {
        by_category
            .entry((category_order(&rule.category), rule.category.as_str()))
            .or_default()
            .push(rule);
    }

    let mut entries = vec![NavigationEntry::link("Rules Index", "index.md")];
    for ((_, category), mut members) in by_category {
        members.sort_by(|a, b| a.id.cmp(&b.id));
        let items = members
            .into_iter()
            .map(|r| NavigationEntry::link(r.id.clone(), format!("{}.md", r.id)))
            .collect();
        entries.push(NavigationEntry::group(format!("{category} Rules"), items));
    }

    if !refactorings.is_empty() {
        let items = refactorings
            .iter()
            .map(|r| NavigationEntry::link(r.id.clone(), format!("{}.md", r.id)))
            .collect();
        entries.push(NavigationEntry::group("Refactorings", items));
    }
    entries
}

// Settings overrides

/// Severity override lines, one block per rule. `override_severity` replaces
/// every rule's own severity.
pub fn editorconfig_entries(rules: &[ExtractedRule], override_severity: Option<&str>) -> String {
    rules
        .iter()
        .map(|rule| {
            format!(
                "# {id}: {}\ndotnet_diagnostic.{id}.severity = {}\n",
                rule.title,
                override_severity.unwrap_or_else(|| severity_string(rule)),
                id = rule.id,
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn editorconfig_file(
    generator_name: &str,
    rules: &[ExtractedRule],
    override_severity: Option<&str>,
) -> String {
    format!(
        "# Auto-generated by {generator_name}\nis_global = true\nglobal_level = -100\n\n{}",
        editorconfig_entries(rules, override_severity)
    )
}

pub fn configuration_page(rules: &[ExtractedRule]) -> PageDocument {
    let mut body = String::from("# Configuration\n\n## Default Configuration\n\n```editorconfig\n");
    body.push_str(&editorconfig_entries(rules, None));
    body.push_str("```\n\n## Disable All Rules\n\n```editorconfig\n");
    body.push_str(&editorconfig_entries(rules, Some("none")));
    body.push_str("```\n");
    PageDocument::new("Configuration", body)
}

// Site level

/// Navigation for a repository that did not produce its own.
pub fn repo_toc_fallback(repo: &RepositorySpec) -> Vec<NavigationEntry> {
    let mut entries = vec![NavigationEntry::link("Overview", "index.md")];
    if repo.docs_source == DocsSource::IntrospectBinary {
        entries.push(NavigationEntry::link("Rules", "rules/"));
        entries.push(NavigationEntry::link("Configuration", "configuration.md"));
    }
    entries
}

pub fn unified_index(config: &DocsConfig) -> PageDocument {
    let site = &config.site;
    let mut body = format!(
        "# {title}\n\nWelcome to the {title} documentation.\n\n## Components\n\n",
        title = site.title
    );
    for repo in &config.repos {
        body.push_str(&format!(
            "### [{}](./{}/)\n\n{}\n\n",
            repo.display_name, repo.name, repo.description
        ));
    }
    if let Some(quick_start) = &site.quick_start {
        body.push_str("## Quick Start\n\n");
        body.push_str(&format!("```{}\n", quick_start.language));
        body.push_str(quick_start.code.trim_end());
        body.push_str("\n```\n");
    }
    PageDocument::new(site.title.clone(), body).with("description", site.description.clone())
}

pub fn root_toc(config: &DocsConfig) -> Vec<NavigationEntry> {
    let mut entries = vec![NavigationEntry::link("Home", "index.md")];
    entries.extend(
        config
            .repos
            .iter()
            .map(|repo| {
                NavigationEntry::link(repo.display_name.clone(), format!("{}/", repo.name))
            }),
    );
    entries
}

#[derive(Serialize)]
struct SiteConfig {
    metadata: Vec<MetadataJob>,
    build: SiteBuild,
}

#[derive(Serialize)]
struct MetadataJob {
    src: Vec<FileSet>,
    dest: String,
}

#[derive(Serialize)]
struct FileSet {
    files: Vec<String>,
    src: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SiteBuild {
    content: Vec<FileSet>,
    dest: String,
    global_metadata: GlobalMetadata,
    template: Vec<String>,
}

#[derive(Serialize)]
struct GlobalMetadata {
    #[serde(rename = "_appTitle")]
    app_title: String,
    #[serde(rename = "_appFooter")]
    app_footer: String,
}

/// The site generator's build configuration as pretty-printed JSON.
pub fn site_config(config: &DocsConfig) -> Result<String, serde_json::Error> {
    let repos_path = slash_path(&config.repos_path);
    let metadata = config
        .repos
        .iter()
        .filter(|repo| !repo.api_metadata.is_empty())
        .map(|repo| MetadataJob {
            src: vec![FileSet {
                files: repo.api_metadata.clone(),
                src: format!("{repos_path}/{}", repo.name),
            }],
            dest: format!("api/{}", repo.name),
        })
        .collect();

    let site = SiteConfig {
        metadata,
        build: SiteBuild {
            content: vec![FileSet {
                files: vec!["**/*.md".to_string(), "**/toc.yml".to_string()],
                src: slash_path(&config.output_path),
            }],
            dest: "_site".to_string(),
            global_metadata: GlobalMetadata {
                app_title: config.site.title.clone(),
                app_footer: config.site.footer.clone(),
            },
            template: vec!["default".to_string(), "modern".to_string()],
        },
    };
    serde_json::to_string_pretty(&site)
}

fn slash_path(path: &std::path::Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

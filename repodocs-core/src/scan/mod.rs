//! Convention scanner: pages inferred from a working copy's folder layout.
//!
//! Each section looks at one conventional location (see
//! [`ConventionLayout`]) and yields a page only when that location exists.
//! Sections never fail; unreadable optional files count as absent.

pub mod properties;
pub mod text;

use std::fs;
use std::path::Path;
use tracing::debug;

use crate::config::{ConventionLayout, RepositorySpec};
use crate::render::{escape_markdown, NavigationEntry, PageDocument};
use crate::walk::{files_in, subdirectories};

use self::text::{
    extract_class_declaration, extract_doc_summary, extract_summary, first_paragraph,
    parse_banned_apis,
};

/// Pages the scanner can produce, in navigation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Section {
    Overview,
    Variants,
    BuildProperties,
    ServiceDefaults,
    Polyfills,
    Extensions,
    SharedUtilities,
    BannedApis,
    ConfigurationFiles,
    Testing,
}

impl Section {
    pub fn file_name(self) -> &'static str {
        match self {
            Section::Overview => "index.md",
            Section::Variants => "variants.md",
            Section::BuildProperties => "msbuild-properties.md",
            Section::ServiceDefaults => "service-defaults.md",
            Section::Polyfills => "polyfills.md",
            Section::Extensions => "extensions.md",
            Section::SharedUtilities => "shared-utilities.md",
            Section::BannedApis => "banned-apis.md",
            Section::ConfigurationFiles => "configuration-files.md",
            Section::Testing => "testing.md",
        }
    }

    pub fn nav_name(self) -> &'static str {
        match self {
            Section::Overview => "Overview",
            Section::Variants => "SDK Variants",
            Section::BuildProperties => "MSBuild Properties",
            Section::ServiceDefaults => "Service Defaults",
            Section::Polyfills => "Polyfills",
            Section::Extensions => "Extensions",
            Section::SharedUtilities => "Shared Utilities",
            Section::BannedApis => "Banned APIs",
            Section::ConfigurationFiles => "Configuration Files",
            Section::Testing => "Testing",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedPage {
    pub section: Section,
    pub document: PageDocument,
}

/// Scans every section in a fixed order. The build property reference is
/// always produced; every other page needs its source location.
pub fn scan_conventions(working_copy: &Path, repo: &RepositorySpec) -> Vec<ScannedPage> {
    let layout = &repo.layout;
    let sections: [(Section, Option<PageDocument>); 10] = [
        (Section::Overview, overview(working_copy, repo)),
        (Section::Variants, variants(&working_copy.join(&layout.variants_dir), layout)),
        (
            Section::Polyfills,
            polyfills(&working_copy.join(&layout.legacy_support_dir), layout),
        ),
        (
            Section::BannedApis,
            banned_apis(&working_copy.join(&layout.banned_symbols_file), repo),
        ),
        (
            Section::ServiceDefaults,
            service_defaults(&working_copy.join(&layout.service_defaults_dir), repo),
        ),
        (Section::Extensions, extensions(&working_copy.join(&layout.extensions_dir))),
        (Section::SharedUtilities, shared_utilities(&working_copy.join(&layout.shared_dir))),
        (
            Section::ConfigurationFiles,
            configuration_files(&working_copy.join(&layout.configuration_dir)),
        ),
        (Section::Testing, testing(&working_copy.join(&layout.testing_dir))),
        (Section::BuildProperties, Some(build_properties(working_copy, repo))),
    ];

    sections
        .into_iter()
        .filter_map(|(section, document)| match document {
            Some(document) => Some(ScannedPage { section, document }),
            None => {
                debug!(
                    repo = %repo.name,
                    page = section.file_name(),
                    "Convention not present, skipping page"
                );
                None
            }
        })
        .collect()
}

/// Navigation listing the produced sections in their fixed order.
pub fn conventions_toc(pages: &[ScannedPage]) -> Vec<NavigationEntry> {
    let mut sections: Vec<Section> = pages.iter().map(|p| p.section).collect();
    sections.sort();
    sections.dedup();
    sections
        .into_iter()
        .map(|s| NavigationEntry::link(s.nav_name(), s.file_name()))
        .collect()
}

fn read_optional(path: &Path) -> Option<String> {
    if !path.is_file() {
        return None;
    }
    fs::read_to_string(path).ok()
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn overview(working_copy: &Path, repo: &RepositorySpec) -> Option<PageDocument> {
    let readme = read_optional(&working_copy.join(&repo.layout.readme))?;
    Some(
        PageDocument::new(repo.display_name.clone(), readme)
            .with("description", repo.description.clone()),
    )
}

fn summary_of(readme: &Path) -> String {
    read_optional(readme)
        .map(|text| first_paragraph(&text))
        .unwrap_or_else(|| "No description".to_string())
}

fn variants(dir: &Path, layout: &ConventionLayout) -> Option<PageDocument> {
    if !dir.is_dir() {
        return None;
    }
    let mut body = String::from("# SDK Variants\n\n");
    body.push_str("| Variant | Description |\n|---------|-------------|\n");
    for variant in subdirectories(dir) {
        let description = summary_of(&variant.join(&layout.variant_readme));
        body.push_str(&format!("| `{}` | {} |\n", dir_name(&variant), description));
    }
    Some(PageDocument::new("SDK Variants", body))
}

fn polyfills(dir: &Path, layout: &ConventionLayout) -> Option<PageDocument> {
    if !dir.is_dir() {
        return None;
    }
    let mut body = String::from("# Polyfills\n\n");
    body.push_str("The SDK automatically injects polyfills for older target frameworks.\n\n");
    body.push_str("| Feature | Min TFM | Description |\n|---------|---------|-------------|\n");
    for feature in subdirectories(dir) {
        let description = summary_of(&feature.join("README.md"));
        body.push_str(&format!(
            "| {} | {} | {} |\n",
            dir_name(&feature),
            layout.polyfill_min_version,
            description
        ));
    }
    Some(PageDocument::new("Polyfills", body))
}

fn banned_apis(file: &Path, repo: &RepositorySpec) -> Option<PageDocument> {
    let content = read_optional(file)?;
    let mut body = String::from("# Banned APIs\n\n");
    body.push_str(&format!(
        "The following APIs are banned by default in {} projects.\n\n",
        repo.display_name
    ));
    body.push_str("| API | Reason |\n|-----|--------|\n");
    for entry in parse_banned_apis(&content) {
        body.push_str(&format!(
            "| `{}` | {} |\n",
            escape_markdown(&entry.api),
            escape_markdown(&entry.reason)
        ));
    }
    Some(PageDocument::new("Banned APIs", body))
}

/// Service configuration sources and the feature each one enables.
const SERVICE_FEATURES: &[(&str, &str)] = &[
    (
        "ANcpSdkOpenTelemetryConfiguration",
        "OpenTelemetry (logging, metrics, tracing with OTLP export)",
    ),
    ("ANcpSdkDevLogsConfiguration", "DevLogs (browser console to server logs)"),
    ("ANcpSdkHttpsConfiguration", "HTTPS redirection and HSTS"),
    (
        "ANcpSdkForwardedHeadersConfiguration",
        "Forwarded headers for reverse proxies",
    ),
    ("ANcpSdkAntiForgeryConfiguration", "Anti-forgery token configuration"),
    (
        "ANcpSdkStaticAssetsConfiguration",
        "Static file serving with proper caching",
    ),
    ("ANcpSdkOpenApiConfiguration", "OpenAPI/Swagger documentation"),
];

fn service_defaults(dir: &Path, repo: &RepositorySpec) -> Option<PageDocument> {
    if !dir.is_dir() {
        return None;
    }
    let mut body = String::from("# Service Defaults\n\n");
    body.push_str(&format!(
        "The Web SDK (`{}.Web`) automatically configures common ASP.NET Core services.\n\n",
        repo.display_name
    ));
    body.push_str("## Features\n\n");
    for (file, description) in SERVICE_FEATURES {
        let source = dir.join(format!("{file}.{}", repo.source_extension));
        if source.is_file() {
            let short = file.replace("ANcpSdk", "").replace("Configuration", "");
            body.push_str(&format!("- **{short}**: {description}\n"));
        }
    }

    body.push_str("\n## Usage\n\n");
    body.push_str(&format!(
        "Service defaults are automatically registered when using `{}.Web`.\n",
        repo.display_name
    ));
    body.push_str("The source generator intercepts `WebApplication.CreateBuilder()` calls.\n\n");
    body.push_str("```csharp\n");
    body.push_str("// This call is automatically enhanced by the SDK\n");
    body.push_str("var builder = WebApplication.CreateBuilder(args);\n");
    body.push_str("```\n\n");
    body.push_str("## Opt-out\n\n");
    body.push_str("```xml\n<PropertyGroup>\n");
    body.push_str("  <AutoRegisterServiceDefaults>false</AutoRegisterServiceDefaults>\n");
    body.push_str("</PropertyGroup>\n```\n\n");

    if let Some(readme) = read_optional(&dir.join("README.md")) {
        body.push_str("## Details\n\n");
        body.push_str(&readme);
        body.push('\n');
    }
    Some(PageDocument::new("Service Defaults (Web SDK)", body))
}

fn is_source_file(name: &str) -> bool {
    name.ends_with(".cs")
}

fn extensions(dir: &Path) -> Option<PageDocument> {
    if !dir.is_dir() {
        return None;
    }
    let mut body = String::from("# Extensions\n\nOpt-in extensions for specialized use cases.\n\n");
    for extension in subdirectories(dir) {
        body.push_str(&format!("## {}\n\n", dir_name(&extension)));
        if let Some(readme) = read_optional(&extension.join("README.md")) {
            body.push_str(&readme);
            body.push('\n');
        } else {
            let sources = files_in(&extension, is_source_file);
            if !sources.is_empty() {
                body.push_str("Files:\n");
                for source in sources {
                    body.push_str(&format!("- `{}`\n", dir_name(&source)));
                }
            }
        }
        body.push('\n');
    }

    body.push_str("## Enabling Extensions\n\n");
    body.push_str("```xml\n<PropertyGroup>\n");
    body.push_str("  <!-- Roslyn source generator utilities -->\n");
    body.push_str("  <InjectSourceGenHelpers>true</InjectSourceGenHelpers>\n\n");
    body.push_str("  <!-- FakeLogger for testing -->\n");
    body.push_str("  <InjectFakeLogger>true</InjectFakeLogger>\n");
    body.push_str("</PropertyGroup>\n```\n");
    Some(PageDocument::new("Extensions", body))
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn shared_utilities(dir: &Path) -> Option<PageDocument> {
    if !dir.is_dir() {
        return None;
    }
    let mut body = String::from("# Shared Utilities\n\n");
    body.push_str("Utilities automatically injected into all SDK projects.\n\n");
    for utility in subdirectories(dir) {
        body.push_str(&format!("## {}\n\n", dir_name(&utility)));
        if let Some(readme) = read_optional(&utility.join("README.md")) {
            body.push_str(&readme);
            body.push('\n');
            continue;
        }
        for source in files_in(&utility, is_source_file) {
            body.push_str(&format!("### {}\n\n", file_stem(&source)));
            if let Some(summary) = read_optional(&source).and_then(|s| extract_summary(&s)) {
                body.push_str(&summary);
                body.push_str("\n\n");
            }
        }
    }

    body.push_str("## Opt-out\n\n");
    body.push_str("```xml\n<PropertyGroup>\n");
    body.push_str("  <InjectSharedThrow>false</InjectSharedThrow>\n");
    body.push_str("</PropertyGroup>\n```\n");
    Some(PageDocument::new("Shared Utilities", body))
}

fn editorconfig_purpose(name: &str) -> String {
    match name {
        "CodingStyle.editorconfig" => {
            "Code style settings (indentation, spacing, etc.)".to_string()
        }
        "NamingConvention.editorconfig" => {
            "Naming conventions for types, members, parameters".to_string()
        }
        "Analyzers.editorconfig" => "Master analyzer configuration".to_string(),
        "GeneratedFiles.editorconfig" => "Suppresses warnings in generated code".to_string(),
        _ if name.starts_with("Analyzer.") => format!(
            "Settings for {}",
            name.replace("Analyzer.", "").replace(".editorconfig", "")
        ),
        _ => "Configuration file".to_string(),
    }
}

fn banned_list_purpose(name: &str) -> &'static str {
    if name == "BannedSymbols.txt" {
        "Default banned APIs (use TimeProvider instead of legacy time APIs)"
    } else if name.contains("Json") {
        "Bans legacy JSON library in favor of System.Text.Json"
    } else {
        "Additional banned APIs"
    }
}

fn configuration_files(dir: &Path) -> Option<PageDocument> {
    if !dir.is_dir() {
        return None;
    }
    let mut body = String::from("# Configuration Files\n\n");
    body.push_str("The SDK includes pre-configured settings for analyzers and code style.\n\n");

    let editorconfigs = files_in(dir, |name| name.ends_with(".editorconfig"));
    if !editorconfigs.is_empty() {
        body.push_str("## EditorConfig Files\n\n| File | Purpose |\n|------|---------|\n");
        for file in &editorconfigs {
            let name = dir_name(file);
            body.push_str(&format!("| `{name}` | {} |\n", editorconfig_purpose(&name)));
        }
        body.push('\n');
    }

    let banned = files_in(dir, |name| {
        name.starts_with("BannedSymbols") && name.ends_with(".txt")
    });
    if !banned.is_empty() {
        body.push_str("## Banned Symbols\n\n| File | Description |\n|------|-------------|\n");
        for file in &banned {
            let name = dir_name(file);
            body.push_str(&format!("| `{name}` | {} |\n", banned_list_purpose(&name)));
        }
        body.push('\n');
    }

    if dir.join("default.runsettings").is_file() {
        body.push_str("## Test Run Settings\n\n");
        body.push_str("The `default.runsettings` file configures test execution settings.\n\n");
    }
    Some(PageDocument::new("Configuration Files", body))
}

fn testing(dir: &Path) -> Option<PageDocument> {
    if !dir.is_dir() {
        return None;
    }
    let mut body = String::from("# Testing Infrastructure\n\n");
    body.push_str("The SDK provides base classes and utilities for testing.\n\n");
    for source in files_in(dir, is_source_file) {
        let Some(content) = read_optional(&source) else {
            continue;
        };
        body.push_str(&format!("## {}\n\n", file_stem(&source)));
        if let Some(summary) = extract_doc_summary(&content) {
            body.push_str(&summary);
            body.push_str("\n\n");
        }
        if let Some(declaration) = extract_class_declaration(&content) {
            body.push_str("```csharp\n");
            body.push_str(&declaration);
            body.push_str("\n```\n\n");
        }
    }
    Some(PageDocument::new("Testing Infrastructure", body))
}

fn build_properties(working_copy: &Path, repo: &RepositorySpec) -> PageDocument {
    let mut body = String::from("# MSBuild Properties Reference\n\n");
    body.push_str(&format!(
        "Complete reference of all MSBuild properties available in {}.\n\n",
        repo.display_name
    ));

    let found = properties::scan_properties(working_copy);
    for (category, members) in properties::by_category(&found) {
        body.push_str(&format!("## {category}\n\n"));
        body.push_str("| Property | Default | Description |\n");
        body.push_str("|----------|---------|-------------|\n");
        for property in members {
            let default = if property.default.is_empty() {
                "-".to_string()
            } else {
                format!("`{}`", property.default)
            };
            body.push_str(&format!(
                "| `{}` | {default} | {} |\n",
                property.name, property.description
            ));
        }
        body.push('\n');
    }
    PageDocument::new("MSBuild Properties Reference", body)
}

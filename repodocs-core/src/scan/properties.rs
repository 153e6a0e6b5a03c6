//! Build property reference scanned from `*.props` / `*.targets` files.

use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

use crate::walk::walk_files;

/// `<Name>value</Name>` with an optional `Condition` attribute. The closing
/// tag is captured separately and compared in code.
static RE_PROPERTY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<(\w+)\s*(?:Condition="[^"]*")?\s*>([^<]*)</(\w+)>"#).unwrap()
});

const EXCLUDED_DIRS: &[&str] = &["obj", "bin", ".repos", ".git"];

const USER_PROPERTIES: &[&str] = &[
    "GenerateClaudeMd",
    "InjectSharedThrow",
    "InjectSourceGenHelpers",
    "InjectFakeLogger",
    "InjectLockPolyfill",
    "InjectTimeProviderPolyfill",
    "AutoRegisterServiceDefaults",
    "IncludeDefaultBannedSymbols",
    "EnableNETAnalyzers",
    "EnforceCodeStyleInBuild",
    "TreatWarningsAsErrors",
    "Nullable",
    "ImplicitUsings",
    "IsPackable",
];

const USER_PREFIXES: &[&str] = &["Inject", "Generate"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildProperty {
    pub name: String,
    pub default: String,
    pub description: &'static str,
    pub category: &'static str,
}

/// Whether a property is meant to be set by consumers.
pub fn is_user_configurable(name: &str) -> bool {
    USER_PROPERTIES.iter().any(|p| p.eq_ignore_ascii_case(name))
        || USER_PREFIXES.iter().any(|prefix| name.starts_with(prefix))
}

pub fn property_description(name: &str) -> &'static str {
    match name {
        "GenerateClaudeMd" => "Generate CLAUDE.md file for AI assistants",
        "InjectSharedThrow" => "Inject Throw.IfNull() guard clauses",
        "InjectSourceGenHelpers" => "Inject Roslyn source generator utilities",
        "InjectFakeLogger" => "Inject FakeLogger test extensions",
        "InjectLockPolyfill" => "Inject System.Threading.Lock polyfill",
        "InjectTimeProviderPolyfill" => "Inject TimeProvider polyfill",
        "AutoRegisterServiceDefaults" => "Auto-register service defaults in Web SDK",
        "IncludeDefaultBannedSymbols" => "Include default banned API list",
        "EnableNETAnalyzers" => "Enable .NET analyzers",
        "EnforceCodeStyleInBuild" => "Enforce code style during build",
        "TreatWarningsAsErrors" => "Treat all warnings as errors",
        "Nullable" => "Nullable reference types setting",
        "ImplicitUsings" => "Enable implicit global usings",
        "IsPackable" => "Whether project can be packed as NuGet",
        _ => "MSBuild property",
    }
}

/// Human category of a property, from the name of the file declaring it.
pub fn property_category(file_name: &str) -> &'static str {
    if file_name.contains("Testing") {
        "Testing"
    } else if file_name.contains("Web") {
        "Web SDK"
    } else if file_name.contains("Legacy") {
        "Polyfills"
    } else if file_name.contains("Enforcement") {
        "Enforcement"
    } else {
        "General"
    }
}

/// `(name, value)` pairs declared in one build file, in document order.
pub fn declared_properties(content: &str) -> Vec<(String, String)> {
    RE_PROPERTY
        .captures_iter(content)
        .filter(|caps| caps[1] == caps[3])
        .filter(|caps| {
            let name = &caps[1];
            !name.starts_with('_') && name != "PropertyGroup" && name != "ItemGroup"
        })
        .map(|caps| (caps[1].to_string(), caps[2].trim().to_string()))
        .collect()
}

/// User-facing properties of every build file below `working_copy`, keyed by
/// name. `.props` files are read before `.targets` files, each in sorted path
/// order; the first declaration of a name wins.
pub fn scan_properties(working_copy: &Path) -> BTreeMap<String, BuildProperty> {
    let files = walk_files(working_copy, EXCLUDED_DIRS);
    let props = files.iter().filter(|p| has_extension(p, "props"));
    let targets = files.iter().filter(|p| has_extension(p, "targets"));

    let mut found = BTreeMap::new();
    for file in props.chain(targets) {
        let Ok(content) = fs::read_to_string(file) else {
            debug!(path = %file.display(), "Skipping unreadable build file");
            continue;
        };
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let category = property_category(&file_name);

        for (name, default) in declared_properties(&content) {
            if found.contains_key(&name) || !is_user_configurable(&name) {
                continue;
            }
            found.insert(
                name.clone(),
                BuildProperty {
                    description: property_description(&name),
                    name,
                    default,
                    category,
                },
            );
        }
    }
    found
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension().is_some_and(|e| e == ext)
}

/// Properties grouped by category, both levels in name order.
pub fn by_category(
    properties: &BTreeMap<String, BuildProperty>,
) -> BTreeMap<&'static str, Vec<&BuildProperty>> {
    let mut groups: BTreeMap<&'static str, Vec<&BuildProperty>> = BTreeMap::new();
    for property in properties.values() {
        groups.entry(property.category).or_default().push(property);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_only_balanced_simple_elements() {
        let xml = r#"
<Project>
  <PropertyGroup>
    <InjectSharedThrow Condition="'$(InjectSharedThrow)' == ''">true</InjectSharedThrow>
    <Nullable>enable</Nullable>
    <_Private>x</_Private>
    <Broken>value</Other>
  </PropertyGroup>
</Project>"#;
        assert_eq!(
            declared_properties(xml),
            vec![
                ("InjectSharedThrow".to_string(), "true".to_string()),
                ("Nullable".to_string(), "enable".to_string()),
            ]
        );
    }

    #[test]
    fn allow_list() {
        assert!(is_user_configurable("nullable"));
        assert!(is_user_configurable("InjectAnything"));
        assert!(is_user_configurable("GenerateDocumentationFile"));
        assert!(!is_user_configurable("OutputPath"));
    }

    #[test]
    fn categories_follow_file_names() {
        assert_eq!(property_category("Sdk.Testing.props"), "Testing");
        assert_eq!(property_category("Sdk.Web.targets"), "Web SDK");
        assert_eq!(property_category("LegacySupport.props"), "Polyfills");
        assert_eq!(property_category("Enforcement.props"), "Enforcement");
        assert_eq!(property_category("Sdk.props"), "General");
    }
}

use repodocs_core::config::DocsConfig;
use repodocs_core::contract::{BuildOutcome, MockBuildRunner, MockRepositorySync};
use repodocs_core::extract::JsonDescriptorSource;
use repodocs_core::generate::{DocsGenerator, GenerateError};
use repodocs_core::sync::SyncError;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn put(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn read(root: &Path, relative: &str) -> String {
    fs::read_to_string(root.join(relative))
        .unwrap_or_else(|e| panic!("expected {relative} to exist: {e}"))
}

fn config(repos: serde_json::Value) -> DocsConfig {
    serde_json::from_value(json!({
        "site": { "title": "Test Framework", "description": "Test docs", "footer": "Footer" },
        "generator_name": "repodocs-test",
        "repos": repos,
    }))
    .expect("valid test config")
}

fn passing_sync() -> MockRepositorySync {
    let mut sync = MockRepositorySync::new();
    sync.expect_sync().returning(|_, _| Ok(()));
    sync.expect_diff_stat()
        .returning(|_| Ok(" content/index.md | 2 +-\n".to_string()));
    sync
}

fn build_exiting_with(code: i32) -> MockBuildRunner {
    let mut build = MockBuildRunner::new();
    build.expect_build().returning(move |_| {
        Ok(BuildOutcome {
            exit_code: code,
            stdout: String::new(),
            stderr: "error CS0001".to_string(),
        })
    });
    build
}

fn generator(
    config: DocsConfig,
    root: &Path,
) -> DocsGenerator<MockRepositorySync, MockBuildRunner, JsonDescriptorSource> {
    DocsGenerator::new(config, root, passing_sync(), build_exiting_with(0), JsonDescriptorSource)
}

fn sdk_repo() -> serde_json::Value {
    json!([{
        "name": "sdk",
        "git_url": "https://example.com/org/sdk.git",
        "display_name": "Example.Sdk",
        "description": "Build SDK",
        "docs_source": "scan_conventions",
    }])
}

fn sdk_fixture(root: &Path) {
    put(root, ".repos/sdk/README.md", "# Example.Sdk\n\nThe SDK.\n");
    put(
        root,
        ".repos/sdk/eng/LegacySupport/TimeProvider/README.md",
        "# TimeProvider\n\nBackports TimeProvider.\n\nMore details.\n",
    );
    put(
        root,
        ".repos/sdk/eng/LegacySupport/Lock/README.md",
        "# Lock\n\nAdds System.Threading.Lock.\n",
    );
}

fn property_group(elements: &str) -> String {
    format!("<Project>\n  <PropertyGroup>\n    {elements}\n  </PropertyGroup>\n</Project>\n")
}

fn table_rows(page: &str) -> Vec<&str> {
    page.lines()
        .filter(|l| l.starts_with("| ") && !l.starts_with("| Feature"))
        .collect()
}

#[tokio::test]
async fn polyfills_page_lists_features_in_directory_order() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    sdk_fixture(root);

    let report = generator(config(sdk_repo()), root).generate().await.unwrap();
    assert!(report.files_written > 0);
    assert!(report.diff_stat.is_some());

    let page = read(root, "content/sdk/polyfills.md");
    assert!(page.starts_with("---\ntitle: Polyfills\n---\n\n# Polyfills\n"));
    assert_eq!(
        table_rows(&page),
        vec![
            "| Lock | netstandard2.0 | Adds System.Threading.Lock. |",
            "| TimeProvider | netstandard2.0 | Backports TimeProvider. |",
        ]
    );

    let toc = read(root, "content/sdk/toc.yml");
    assert_eq!(
        toc,
        "- name: Overview\n  href: index.md\n\
         - name: MSBuild Properties\n  href: msbuild-properties.md\n\
         - name: Polyfills\n  href: polyfills.md\n"
    );
    assert!(!root.join("content/sdk/variants.md").exists());
}

#[tokio::test]
async fn second_run_writes_nothing_and_leaves_bytes_unchanged() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    sdk_fixture(root);
    let mut tolerant = config(sdk_repo());
    tolerant.fail_on_no_changes = false;
    let generator = generator(tolerant, root);

    let first = generator.generate().await.unwrap();
    assert!(first.files_written > 0);
    let snapshot: Vec<(PathBuf, Vec<u8>)> = first
        .written
        .iter()
        .map(|p| (p.clone(), fs::read(p).unwrap()))
        .collect();

    let second = generator.generate().await.unwrap();
    assert_eq!(second.files_written, 0);
    assert!(second.diff_stat.is_none());
    for (path, bytes) in snapshot {
        assert_eq!(fs::read(&path).unwrap(), bytes, "{} changed", path.display());
    }
}

#[tokio::test]
async fn zero_writes_fail_by_default() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    sdk_fixture(root);
    let defaults = config(sdk_repo());
    assert!(defaults.fail_on_no_changes);
    let generator = generator(defaults, root);

    let first = generator.generate().await.unwrap();
    let snapshot: Vec<(PathBuf, Vec<u8>)> = first
        .written
        .iter()
        .map(|p| (p.clone(), fs::read(p).unwrap()))
        .collect();

    let err = generator.generate().await.unwrap_err();
    assert!(matches!(err, GenerateError::NoChanges));
    assert_eq!(err.category(), "no-changes");
    for (path, bytes) in snapshot {
        assert_eq!(fs::read(&path).unwrap(), bytes, "{} changed", path.display());
    }
}

#[tokio::test]
async fn identical_inputs_give_identical_trees() {
    let a = tempdir().unwrap();
    let b = tempdir().unwrap();
    for root in [a.path(), b.path()] {
        sdk_fixture(root);
        put(
            root,
            ".repos/sdk/src/configuration/BannedSymbols.txt",
            "T:System.Random;Use Random.Shared\n",
        );
        put(root, ".repos/sdk/src/Sdk.props", &property_group("<Nullable>enable</Nullable>"));
        generator(config(sdk_repo()), root).generate().await.unwrap();
    }
    for page in [
        "content/index.md",
        "content/toc.yml",
        "content/sdk/index.md",
        "content/sdk/polyfills.md",
        "content/sdk/banned-apis.md",
        "content/sdk/msbuild-properties.md",
        "content/sdk/configuration-files.md",
        "docfx.json",
    ] {
        assert_eq!(read(a.path(), page), read(b.path(), page), "{page} differs");
    }
}

#[tokio::test]
async fn strict_sync_failure_aborts_before_writing() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    sdk_fixture(root);

    let mut sync = MockRepositorySync::new();
    sync.expect_sync().returning(|_, checkout| {
        Err(SyncError::CommandFailed {
            command: "git fetch origin".to_string(),
            dir: checkout.to_path_buf(),
            code: 128,
            stderr: "fatal: could not read from remote".to_string(),
        })
    });
    sync.expect_diff_stat().never();
    let mut build = MockBuildRunner::new();
    build.expect_build().never();

    let generator = DocsGenerator::new(config(sdk_repo()), root, sync, build, JsonDescriptorSource);
    let err = generator.generate().await.unwrap_err();
    assert_eq!(err.category(), "sync");
    assert!(err.to_string().contains("'sdk'"));
    assert!(!root.join("content").exists());
}

#[tokio::test]
async fn site_level_outputs_list_every_repository() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    sdk_fixture(root);
    put(root, ".repos/guides/docs/intro.md", "# Intro\n\nSee [guide](./guide.md).\n");
    put(root, ".repos/guides/docs/guide.md", "# Guide\n");

    let repos = json!([
        sdk_repo()[0].clone(),
        {
            "name": "guides",
            "git_url": "https://example.com/org/guides.git",
            "display_name": "Guides",
            "description": "How-to guides",
            "docs_source": "copy_existing",
            "api_metadata": ["src/**/*.csproj"],
        }
    ]);
    generator(config(repos), root).generate().await.unwrap();

    let index = read(root, "content/index.md");
    assert!(index.contains("# Test Framework\n\nWelcome to the Test Framework documentation."));
    assert!(index.contains("### [Example.Sdk](./sdk/)\n\nBuild SDK\n"));
    assert!(index.contains("### [Guides](./guides/)\n\nHow-to guides\n"));
    assert!(!index.contains("## Quick Start"));

    assert_eq!(
        read(root, "content/toc.yml"),
        "- name: Home\n  href: index.md\n- name: Example.Sdk\n  href: sdk/\n- name: Guides\n  href: guides/\n"
    );

    // copied pages get site-relative links and a fallback navigation
    assert_eq!(
        read(root, "content/guides/intro.md"),
        "# Intro\n\nSee [guide](../guides/guide.md).\n"
    );
    assert_eq!(read(root, "content/guides/toc.yml"), "- name: Overview\n  href: index.md\n");

    let site: serde_json::Value = serde_json::from_str(&read(root, "docfx.json")).unwrap();
    assert_eq!(site["build"]["content"][0]["src"], "content");
    assert_eq!(site["build"]["globalMetadata"]["_appTitle"], "Test Framework");
    assert_eq!(site["build"]["template"], json!(["default", "modern"]));
    assert_eq!(site["metadata"][0]["src"][0]["src"], ".repos/guides");
    assert_eq!(site["metadata"][0]["dest"], "api/guides");
}

#[tokio::test]
async fn hand_maintained_navigation_is_kept() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    put(root, ".repos/guides/docs/intro.md", "# Intro\n");
    put(root, ".repos/guides/docs/toc.yml", "- name: Intro\n  href: intro.md\n");
    let repos = json!([{
        "name": "guides",
        "git_url": "https://example.com/org/guides.git",
        "display_name": "Guides",
        "description": "How-to guides",
        "docs_source": "copy_existing",
    }]);

    generator(config(repos), root).generate().await.unwrap();
    assert_eq!(
        read(root, "content/guides/toc.yml"),
        "- name: Intro\n  href: intro.md\n"
    );
}

/// Fills every conventional folder the scanner knows about except polyfills,
/// banned APIs and configuration files, which the tests above cover.
fn conventions_fixture(root: &Path) {
    let repo = root.join(".repos/sdk");
    put(&repo, "README.md", "# Example.Sdk\n\nThe SDK.\n");

    put(&repo, "src/Sdk/Example.Sdk/Readme.md", "# Example.Sdk\n\nBase SDK.\n");
    put(&repo, "src/Sdk/Example.Sdk.Web/Sdk.props", "<Project />\n");

    let service_defaults = "eng/ANcpSdk.AspNetCore.ServiceDefaults";
    put(&repo, &format!("{service_defaults}/ANcpSdkOpenApiConfiguration.cs"), "class A {}");
    put(&repo, &format!("{service_defaults}/ANcpSdkHttpsConfiguration.cs"), "class B {}");
    put(&repo, &format!("{service_defaults}/Unrelated.cs"), "class C {}");
    put(&repo, &format!("{service_defaults}/README.md"), "Extra notes.\n");

    put(&repo, "eng/Extensions/FakeLogger/README.md", "FakeLogger docs.\n");
    put(&repo, "eng/Extensions/SourceGen/Other.cs", "class Other {}");
    put(&repo, "eng/Extensions/SourceGen/Helpers.cs", "class Helpers {}");
    put(&repo, "eng/Extensions/SourceGen/notes.txt", "not a source file");

    put(&repo, "eng/Shared/Polyfill/README.md", "Readme wins.\n");
    put(&repo, "eng/Shared/Polyfill/Hidden.cs", "/// <summary>Never shown.</summary>");
    put(
        &repo,
        "eng/Shared/Throw/Throw.cs",
        "/// <summary>Guard clauses.</summary>\npublic static class Throw {}\n",
    );
    put(&repo, "eng/Shared/Throw/Bare.cs", "static class Bare {}\n");

    put(
        &repo,
        "src/Shared/IntegrationTestBase.cs",
        "/// <summary>\n/// Base class for integration tests.\n/// </summary>\n\
         public abstract class IntegrationTestBase<TProgram> : IAsyncLifetime where TProgram : class\n\
         {\n}\n",
    );
    put(&repo, "src/Shared/Helper.cs", "internal static class Helper {}\n");

    put(
        &repo,
        "a/Early.targets",
        &property_group(
            "<IsPackable>true</IsPackable>\n    <TreatWarningsAsErrors>true</TreatWarningsAsErrors>",
        ),
    );
    put(
        &repo,
        "eng/Common.props",
        &property_group("<Nullable>enable</Nullable>\n    <IsPackable>false</IsPackable>"),
    );
    put(
        &repo,
        "src/Build/Sdk.Web.props",
        &property_group(
            "<Nullable>disable</Nullable>\n    \
             <AutoRegisterServiceDefaults>true</AutoRegisterServiceDefaults>",
        ),
    );
    put(
        &repo,
        "src/Build/bin/Release/Stale.props",
        &property_group("<InjectFakeLogger>true</InjectFakeLogger>"),
    );
    put(
        &repo,
        "src/Build/obj/Leftover.props",
        &property_group("<GenerateClaudeMd>true</GenerateClaudeMd>"),
    );
}

#[tokio::test]
async fn scanned_conventions_render_every_section() {
    let tmp = tempdir().unwrap();
    let root = tmp.path();
    conventions_fixture(root);
    generator(config(sdk_repo()), root).generate().await.unwrap();

    let variants = read(root, "content/sdk/variants.md");
    assert!(variants.contains(
        "| Variant | Description |\n|---------|-------------|\n\
         | `Example.Sdk` | Base SDK. |\n\
         | `Example.Sdk.Web` | No description |\n"
    ));

    let services = read(root, "content/sdk/service-defaults.md");
    assert!(services.contains("The Web SDK (`Example.Sdk.Web`) automatically configures"));
    assert!(services.contains(
        "## Features\n\n\
         - **Https**: HTTPS redirection and HSTS\n\
         - **OpenApi**: OpenAPI/Swagger documentation\n\n## Usage"
    ));
    assert!(!services.contains("DevLogs"));
    assert!(services.contains("## Details\n\nExtra notes.\n"));

    let extensions = read(root, "content/sdk/extensions.md");
    assert!(extensions.contains("## FakeLogger\n\nFakeLogger docs.\n"));
    assert!(extensions.contains(
        "## SourceGen\n\nFiles:\n- `Helpers.cs`\n- `Other.cs`\n\n## Enabling Extensions"
    ));
    assert!(!extensions.contains("notes.txt"));

    let shared = read(root, "content/sdk/shared-utilities.md");
    assert!(shared.contains("## Polyfill\n\nReadme wins.\n"));
    assert!(!shared.contains("Never shown."));
    assert!(shared.contains(
        "## Throw\n\n### Bare\n\n### Throw\n\nGuard clauses.\n\n## Opt-out"
    ));

    let testing = read(root, "content/sdk/testing.md");
    assert!(testing.contains(
        "## IntegrationTestBase\n\nBase class for integration tests.\n\n\
         ```csharp\n\
         public abstract class IntegrationTestBase<TProgram> : IAsyncLifetime where TProgram : class\n\
         ```\n"
    ));
    assert!(testing.contains("## Helper\n\n"));
    assert!(!testing.contains("internal static class Helper"));

    let properties = read(root, "content/sdk/msbuild-properties.md");
    assert!(properties.contains(
        "## General\n\n\
         | Property | Default | Description |\n\
         |----------|---------|-------------|\n\
         | `IsPackable` | `false` | Whether project can be packed as NuGet |\n\
         | `Nullable` | `enable` | Nullable reference types setting |\n\
         | `TreatWarningsAsErrors` | `true` | Treat all warnings as errors |\n\n\
         ## Web SDK\n\n\
         | Property | Default | Description |\n\
         |----------|---------|-------------|\n\
         | `AutoRegisterServiceDefaults` | `true` | Auto-register service defaults in Web SDK |\n"
    ));
    assert!(!properties.contains("`disable`"));
    assert!(!properties.contains("InjectFakeLogger"));
    assert!(!properties.contains("GenerateClaudeMd"));

    assert_eq!(
        read(root, "content/sdk/toc.yml"),
        "- name: Overview\n  href: index.md\n\
         - name: SDK Variants\n  href: variants.md\n\
         - name: MSBuild Properties\n  href: msbuild-properties.md\n\
         - name: Service Defaults\n  href: service-defaults.md\n\
         - name: Extensions\n  href: extensions.md\n\
         - name: Shared Utilities\n  href: shared-utilities.md\n\
         - name: Testing\n  href: testing.md\n"
    );
}

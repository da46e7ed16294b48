use std::fs;
use std::path::{Path, PathBuf};

use kiln::processor::ProjectFiles;
use kiln::renderer::MiniJinjaRenderer;
use kiln::writer::Writer;
use kiln::{DirectoryResolver, Error, Generator, PluginSpec};
use serde_json::json;
use tempfile::TempDir;

fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

fn sample_files() -> ProjectFiles {
    let mut project = ProjectFiles::default();
    project.dirs.insert("docs".to_string());
    project.dirs.insert("src".to_string());
    project.files.insert("README.md".to_string(), "# demo\n".to_string());
    project.files.insert("src/main.ts".to_string(), "console.log(1);\n".to_string());
    project.binaries.insert("public/favicon.ico".to_string(), vec![0, 1, 2, 255]);
    project
}

#[test_log::test]
fn test_generate_and_commit_project() {
    let resolver = DirectoryResolver::new(fixtures().join("plugins"));
    let engine = MiniJinjaRenderer::new();
    let output = TempDir::new().unwrap();

    let mut generator = Generator::new(&resolver, &engine)
        .with_project_name("demo")
        .with_options(json!({ "packageManager": "pnpm" }));
    let generation = generator
        .generate(
            Some(&fixtures().join("template")),
            &[PluginSpec::new("husky"), PluginSpec::new("pinia")],
        )
        .unwrap();
    assert!(generation.diagnostics.is_empty(), "{:?}", generation.diagnostics);

    generator.commit(&generation, output.path(), false).unwrap();

    assert!(!dir_diff::is_different(output.path(), fixtures().join("expected")).unwrap());
}

#[test_log::test]
fn test_commit_writes_every_entry() {
    let output = TempDir::new().unwrap();
    let summary = Writer::new(output.path()).commit(&sample_files()).unwrap();

    assert!(!summary.dry_run);
    assert_eq!(summary.dirs, vec!["docs", "src"]);
    assert_eq!(summary.files, vec!["README.md", "src/main.ts", "public/favicon.ico"]);

    assert!(output.path().join("docs").is_dir());
    assert_eq!(fs::read_to_string(output.path().join("README.md")).unwrap(), "# demo\n");
    assert_eq!(
        fs::read(output.path().join("public/favicon.ico")).unwrap(),
        vec![0, 1, 2, 255]
    );
}

#[test_log::test]
fn test_dry_run_writes_nothing() {
    let output = TempDir::new().unwrap();
    let summary = Writer::new(output.path()).dry_run(true).commit(&sample_files()).unwrap();

    assert!(summary.dry_run);
    assert_eq!(summary.files.len(), 3);
    assert_eq!(fs::read_dir(output.path()).unwrap().count(), 0);
}

#[test_log::test]
fn test_commit_failure_reports_pending_paths() {
    let output = TempDir::new().unwrap();
    fs::write(output.path().join("src"), "not a directory").unwrap();

    match Writer::new(output.path()).commit(&sample_files()) {
        Err(Error::Commit { path, pending, .. }) => {
            assert_eq!(path, "src");
            assert_eq!(pending, vec!["src", "README.md", "src/main.ts", "public/favicon.ico"]);
        }
        other => panic!("Expected Commit error, got {other:?}"),
    }

    assert!(output.path().join("docs").is_dir());
    assert!(!output.path().join("README.md").exists());
}

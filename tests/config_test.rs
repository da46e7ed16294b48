use std::fs;
use std::path::PathBuf;

use kiln::config::{find_config, load_config, parse_config, GenerationConfig};
use kiln::Error;
use serde_json::json;
use tempfile::TempDir;

#[test]
fn test_parse_yaml_config() {
    let config = parse_config(
        r#"
name: demo
template: ./template
pluginsDir: ./plugins
strict: true
options:
  packageManager: pnpm
plugins:
  husky:
    variant: strict
  pinia: ~
"#,
    )
    .unwrap();

    assert_eq!(config.name.as_deref(), Some("demo"));
    assert_eq!(config.template, Some(PathBuf::from("./template")));
    assert!(config.strict);
    assert_eq!(config.manifest_file, "package.json");
    assert_eq!(config.options["packageManager"], json!("pnpm"));

    let specs = config.plugin_specs();
    assert_eq!(specs.len(), 2);
    assert_eq!(specs[0].name, "husky");
    assert_eq!(specs[0].options, json!({ "variant": "strict" }));
    assert_eq!(specs[1].name, "pinia");
    assert!(specs[1].options.is_null());
}

#[test]
fn test_parse_json_config() {
    let config = parse_config(
        r#"{ "plugins": { "eslint": {}, "prettier": {} }, "manifestFile": "app.json" }"#,
    )
    .unwrap();

    assert_eq!(config.manifest_file, "app.json");
    assert_eq!(
        config.plugin_specs().iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
        vec!["eslint", "prettier"]
    );
    assert_eq!(config.options, json!({}));
}

#[test]
fn test_unknown_fields_are_rejected() {
    match parse_config("templat: ./template\n") {
        Err(Error::Config(msg)) => assert!(msg.contains("Invalid configuration format")),
        other => panic!("Expected Config error, got {other:?}"),
    }
}

#[test]
fn test_add_plugin_skips_duplicates() {
    let mut config = GenerationConfig::default();
    config.add_plugin("husky");
    config.add_plugin("pinia");
    config.add_plugin("husky");

    assert_eq!(config.plugins.keys().collect::<Vec<_>>(), vec!["husky", "pinia"]);
    assert_eq!(config.plugins_dir(), PathBuf::from("plugins"));
}

#[test]
fn test_find_config_prefers_json() {
    let dir = TempDir::new().unwrap();
    assert!(find_config(dir.path()).is_none());

    fs::write(dir.path().join("kiln.yaml"), "name: from-yaml\n").unwrap();
    assert_eq!(find_config(dir.path()), Some(dir.path().join("kiln.yaml")));

    fs::write(dir.path().join("kiln.json"), r#"{ "name": "from-json" }"#).unwrap();
    assert_eq!(find_config(dir.path()), Some(dir.path().join("kiln.json")));
}

#[test]
fn test_load_config_resolves_relative_paths() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("kiln.yml");
    fs::write(&path, "template: template\npluginsDir: /opt/kiln/plugins\n").unwrap();

    let config = load_config(&path).unwrap();
    assert_eq!(config.template, Some(dir.path().join("template")));
    assert_eq!(config.plugins_dir(), PathBuf::from("/opt/kiln/plugins"));
}

#[test]
fn test_load_missing_config() {
    let dir = TempDir::new().unwrap();
    match load_config(dir.path().join("kiln.json")) {
        Err(Error::Config(msg)) => assert!(msg.contains("No configuration file found")),
        other => panic!("Expected Config error, got {other:?}"),
    }
}

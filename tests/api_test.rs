use indexmap::IndexMap;
use kiln::contribution::Manifest;
use kiln::protocol::ProtocolKind;
use kiln::{Error, GeneratorApi};
use serde_json::{json, Value};

fn options() -> (Value, Value, Manifest) {
    (Value::Null, json!({ "packageManager": "npm" }), Manifest::new())
}

#[test]
fn test_dependency_helpers() {
    let (opts, root, generated) = options();
    let mut api = GeneratorApi::new("vue", &opts, &root, &generated);

    api.add_dependency("vue", Some("^3.4.0"));
    api.add_dependency("vue-router", None);
    api.add_dev_dependency("typescript", Some("^5.4.0"));
    api.add_script("dev", "vite");
    api.add_script("dev", "vite --host");

    let contribution = api.into_contribution();
    assert_eq!(
        Value::Object(contribution.manifest),
        json!({
            "dependencies": { "vue": "^3.4.0", "vue-router": "latest" },
            "devDependencies": { "typescript": "^5.4.0" },
            "scripts": { "dev": "vite --host" }
        })
    );
}

#[test]
fn test_extend_package_merges_one_level() {
    let (opts, root, generated) = options();
    let mut api = GeneratorApi::new("husky", &opts, &root, &generated);

    api.extend_package(json!({
        "lint-staged": { "*.ts": { "cmds": ["eslint"], "cwd": "." } },
        "private": true
    }))
    .unwrap();
    api.extend_package(json!({
        "lint-staged": { "*.ts": { "cmds": ["prettier"] }, "*.css": ["stylelint"] },
        "private": false
    }))
    .unwrap();

    let manifest = &api.template_data().manifest;
    assert_eq!(
        manifest["lint-staged"],
        json!({ "*.ts": { "cmds": ["prettier"] }, "*.css": ["stylelint"] })
    );
    assert_eq!(manifest["private"], json!(false));
}

#[test]
fn test_extend_package_rejects_non_objects() {
    let (opts, root, generated) = options();
    let mut api = GeneratorApi::new("bad", &opts, &root, &generated);
    assert!(matches!(api.extend_package(json!(["not", "an", "object"])), Err(Error::Validation(_))));
}

#[test]
fn test_extend_config_file_assigns_sections() {
    let (opts, root, generated) = options();
    let mut api = GeneratorApi::new("eslint", &opts, &root, &generated);

    let mut first = IndexMap::new();
    first.insert("import".to_string(), vec!["const js = require('@eslint/js');".to_string()]);
    first.insert("rules".to_string(), vec!["'no-console': 'warn',".to_string()]);
    api.extend_config_file("eslint.config.js", first);

    let mut second = IndexMap::new();
    second.insert("rules".to_string(), vec!["'no-debugger': 'error',".to_string()]);
    api.extend_config_file("eslint.config.js", second);

    let contribution = api.into_contribution();
    let fragment = &contribution.config_files["eslint.config.js"];
    assert_eq!(fragment["import"], vec!["const js = require('@eslint/js');"]);
    assert_eq!(fragment["rules"], vec!["'no-debugger': 'error',"]);
}

#[test]
fn test_protocol_generate_keeps_valid_operations() {
    let (opts, root, generated) = options();
    let mut api = GeneratorApi::new("mixed", &opts, &root, &generated);

    let result = api.protocol_generate(json!([
        { "RENDER_FILE": { "params": { "files": { "a.txt": "a" } } } },
        { "COPY_FILE": { "params": {} } },
        { "INSERT_IMPORT": { "params": { "imports": [] } } }
    ]));

    match result {
        Err(Error::Protocol(msg)) => {
            assert!(msg.contains("COPY_FILE"));
            assert!(!msg.starts_with("Protocol error"));
        }
        other => panic!("Expected Protocol error, got {other:?}"),
    }

    let contribution = api.into_contribution();
    let kinds: Vec<_> = contribution.protocol_ops.iter().map(|op| op.kind()).collect();
    assert_eq!(kinds, vec![ProtocolKind::RenderFile, ProtocolKind::InsertImport]);
    assert_eq!(contribution.errors.len(), 1);
}

#[test]
fn test_api_exposes_options_and_generated_manifest() {
    let opts = json!({ "variant": "strict" });
    let root = json!({ "packageManager": "yarn" });
    let mut generated = Manifest::new();
    generated.insert("dependencies".to_string(), json!({ "vue": "^3.4.0" }));

    let api = GeneratorApi::new("router", &opts, &root, &generated);
    assert_eq!(api.plugin_name(), "router");
    assert_eq!(api.options()["variant"], json!("strict"));
    assert_eq!(api.root_options()["packageManager"], json!("yarn"));
    assert!(api.generated_manifest()["dependencies"].get("vue").is_some());
    assert!(api.template_data().is_empty());
}

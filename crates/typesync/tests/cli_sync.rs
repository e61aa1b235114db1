//! CLI tests: run the real binary against temp files.

use serde_json::Value;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const MANIFEST: &str = r#"
[[document_types]]
type = "Home"
allowed_as_root = true
allowed_child_types = ["Article"]

[[document_types.properties]]
name = "Heading"
type = "string"

[[document_types]]
type = "Article"

[[document_types.properties]]
name = "Price"
type = "decimal"
"#;

fn run_cli(home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_typesync"))
        .args(args)
        .env("TYPESYNC_HOME", home)
        .env("RUST_LOG", "error")
        .env_remove("TYPESYNC_CONFIG")
        .output()
        .expect("run typesync binary")
}

fn assert_success(output: &Output, args: &[&str]) {
    assert!(
        output.status.success(),
        "typesync {:?} failed\nstdout: {}\nstderr: {}",
        args,
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn test_sync_writes_store_and_is_repeatable() {
    let home = TempDir::new().expect("create temp home");
    let model = home.path().join("model.toml");
    let store = home.path().join("store.json");
    std::fs::write(&model, MANIFEST).expect("write manifest");

    let model_str = model.to_string_lossy().to_string();
    let store_str = store.to_string_lossy().to_string();
    let args = ["sync", "--model", model_str.as_str(), "--store", store_str.as_str(), "--json"];

    let first = run_cli(home.path(), &args);
    assert_success(&first, &args);
    let report: Value = serde_json::from_slice(&first.stdout).expect("parse run report");
    let created = report["reports"][0]["created"].as_array().expect("created list");
    assert_eq!(created.len(), 2);

    let snapshot: Value =
        serde_json::from_str(&std::fs::read_to_string(&store).expect("read store")).expect("parse store");
    let home_type = &snapshot["document_types"][0];
    assert_eq!(home_type["alias"], "home");
    assert_eq!(home_type["allowed_content_types"][0]["alias"], "article");

    // each process runs once; a second process updates in place
    let second = run_cli(home.path(), &args);
    assert_success(&second, &args);
    let report: Value = serde_json::from_slice(&second.stdout).expect("parse run report");
    assert_eq!(report["reports"][0]["updated"].as_array().map(Vec::len), Some(2));
    assert_eq!(report["reports"][0]["created"].as_array().map(Vec::len), Some(0));
}

#[test]
fn test_sync_fails_on_unmappable_property() {
    let home = TempDir::new().expect("create temp home");
    let model = home.path().join("model.toml");
    let store = home.path().join("store.json");
    std::fs::write(
        &model,
        "[[document_types]]\ntype = \"Swatch\"\n\n[[document_types.properties]]\nname = \"Tint\"\ntype = \"Color\"\n",
    )
    .expect("write manifest");

    let model_str = model.to_string_lossy().to_string();
    let store_str = store.to_string_lossy().to_string();
    let output = run_cli(
        home.path(),
        &["sync", "--model", model_str.as_str(), "--store", store_str.as_str()],
    );

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("tint"));
}

#[test]
fn test_resolve_with_ui_hint() {
    let home = TempDir::new().expect("create temp home");
    let args = ["resolve", "--type", "string", "--ui-hint", "Richtext editor", "--json"];

    let output = run_cli(home.path(), &args);
    assert_success(&output, &args);
    let definition: Value = serde_json::from_slice(&output.stdout).expect("parse definition");
    assert_eq!(definition["name"], "Richtext editor");
}

#[test]
fn test_convert_tolerates_garbage() {
    let home = TempDir::new().expect("create temp home");

    let args = ["convert", "--type", "f64", "--value", " 3.14 "];
    let output = run_cli(home.path(), &args);
    assert_success(&output, &args);
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "3.14");

    let args = ["convert", "--type", "f64", "--value", "not-a-number"];
    let output = run_cli(home.path(), &args);
    assert_success(&output, &args);
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "null");
}

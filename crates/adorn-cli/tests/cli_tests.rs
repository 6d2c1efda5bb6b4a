//! Integration tests for the adorn binary.

use std::path::Path;
use std::process::{Command, Output};

fn adorn(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_adorn"))
        .args(args)
        .current_dir(dir)
        .env_remove("ADORN_LOG")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run adorn")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

// ────────────────────────────────────────────────────────────────────────────
// showcase
// ────────────────────────────────────────────────────────────────────────────

#[test]
fn test_showcase_output() {
    let dir = tempfile::tempdir().unwrap();
    let output = adorn(dir.path(), &["showcase"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let out = stdout(&output);
    let lines: Vec<&str> = out.lines().collect();

    // @Pipe is nearest to the class, so it runs before @Component
    let pipe = lines.iter().position(|l| *l == "Pipe Decorator Called").unwrap();
    let component = lines.iter().rposition(|l| *l == "Component Decorator Called").unwrap();
    assert!(pipe < component);

    let begin = lines.iter().position(|l| *l == "=== begin log ===").unwrap();
    assert_eq!(lines[begin + 1], "Emu says: Hi there");
    assert_eq!(lines[begin + 2], "=== end log   ===");

    assert!(out.contains("inserting the component in the DOM"));
    assert!(out.contains("Hello!"));
    assert!(out.contains("password \"123\" rejected: Validation failed: password should be at least 4 long"));
    assert!(out.contains(r#"[{"methodName":"drive","parameterIndex":0}]"#));
    assert!(out.contains("sauce = pesto"));
}

#[test]
fn test_showcase_reads_config_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("adorn.toml"),
        "[showcase]\nminimum-length = 6\nsauce = \"marinara\"\n",
    )
    .unwrap();

    let output = adorn(dir.path(), &["showcase"]);
    assert!(output.status.success());

    let out = stdout(&output);
    assert!(out.contains("password should be at least 6 long"));
    assert!(out.contains("sauce = marinara"));
}

#[test]
fn test_invalid_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("custom.toml");
    std::fs::write(&path, "[showcase]\nselector = \"\"\n").unwrap();

    let output = adorn(dir.path(), &["--config", path.to_str().unwrap(), "showcase"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("showcase.selector cannot be empty"));
}

// ────────────────────────────────────────────────────────────────────────────
// watched / metadata
// ────────────────────────────────────────────────────────────────────────────

#[test]
fn test_watched_json() {
    let dir = tempfile::tempdir().unwrap();
    let output = adorn(dir.path(), &["watched"]);
    assert!(output.status.success());

    let watched: serde_json::Value = serde_json::from_str(stdout(&output).trim()).unwrap();
    assert_eq!(
        watched,
        serde_json::json!([{"methodName": "drive", "parameterIndex": 0}])
    );
}

#[test]
fn test_metadata_json() {
    let dir = tempfile::tempdir().unwrap();
    let output = adorn(dir.path(), &["metadata", "ProfileComponenet2"]);
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_str(stdout(&output).trim()).unwrap();
    assert_eq!(report["class"], "ProfileComponenet2");
    assert_eq!(report["metadata"]["pipe"], true);
    assert_eq!(report["metadata"]["options"]["selector"], "#my_profile");
    assert!(report["metadata"]["uniqueID"].is_i64());

    let applied: Vec<&str> = report["applications"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["annotation"].as_str().unwrap())
        .collect();
    assert_eq!(applied, vec!["Pipe", "Component"]);
}

#[test]
fn test_metadata_member_entries() {
    let dir = tempfile::tempdir().unwrap();
    let output = adorn(dir.path(), &["metadata", "User4"]);
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_str(stdout(&output).trim()).unwrap();
    assert_eq!(report["members"]["password"]["minimumLength"], 4);
}

#[test]
fn test_metadata_unknown_class() {
    let dir = tempfile::tempdir().unwrap();
    let output = adorn(dir.path(), &["metadata", "Nope"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown class 'Nope'"));
}

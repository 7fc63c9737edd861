//! CLI integration tests for Settle
//!
//! These tests drive the built binary end-to-end: loading module trees
//! from disk, printing graphs, validating, and running checks.

use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Get a command instance for the settle binary
fn settle_cmd() -> assert_cmd::Command {
    assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("settle"))
}

/// Create a project directory with a root module and a sub-module
fn setup_project() -> TempDir {
    let dir = TempDir::new().unwrap();

    fs::write(
        dir.path().join("main.toml"),
        r#"
[param.message]
default = "hello world"

[task.greet]
check = "true"
apply = "echo {{param \"message\"}}"

[task.report]
check = "echo {{lookup \"task.greet.status\"}}"

[module.users]
source = "users.toml"
"#,
    )
    .unwrap();

    fs::write(
        dir.path().join("users.toml"),
        r#"
[task.noop]
check = "true"
"#,
    )
    .unwrap();

    dir
}

fn root_module(dir: &TempDir) -> String {
    dir.path().join("main.toml").display().to_string()
}

// =============================================================================
// Graph Tests
// =============================================================================

#[test]
fn test_graph_prints_dot() {
    let dir = setup_project();

    settle_cmd()
        .arg("graph")
        .arg(root_module(&dir))
        .assert()
        .success()
        .stdout(predicate::str::contains("digraph {"))
        .stdout(predicate::str::contains(
            "\"root\" -> \"root/task.greet\"",
        ))
        .stdout(predicate::str::contains(
            "\"root/task.greet\" -> \"root/param.message\"",
        ))
        .stdout(predicate::str::contains(
            "\"root/task.report\" -> \"root/task.greet\"",
        ));
}

#[test]
fn test_graph_json_lists_vertices_and_edges() {
    let dir = setup_project();

    let output = settle_cmd()
        .arg("graph")
        .arg(root_module(&dir))
        .arg("--format")
        .arg("json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let listing: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let vertices = listing["vertices"].as_array().unwrap();
    assert!(vertices
        .iter()
        .any(|v| v["id"] == "root/module.users/task.noop"));
    assert!(!listing["edges"].as_array().unwrap().is_empty());
}

// =============================================================================
// Validate Tests
// =============================================================================

#[test]
fn test_validate_reports_counts() {
    let dir = setup_project();

    settle_cmd()
        .arg("validate")
        .arg(root_module(&dir))
        .assert()
        .success()
        .stdout(predicate::str::contains("Graph is valid: 5 resources"));
}

#[test]
fn test_validate_rejects_cycles() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("main.toml"),
        r#"
[task.a]
check = "true"
depends = ["task.b"]

[task.b]
check = "true"
depends = ["task.a"]
"#,
    )
    .unwrap();

    settle_cmd()
        .arg("validate")
        .arg(root_module(&dir))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Dependency cycle"));
}

#[test]
fn test_validate_rejects_unresolvable_references() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("main.toml"),
        "[task.a]\ncheck = \"echo {{lookup \\\"task.ghost\\\"}}\"",
    )
    .unwrap();

    settle_cmd()
        .arg("validate")
        .arg(root_module(&dir))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unresolvable call to task.ghost"));
}

#[test]
fn test_missing_root_module_fails() {
    settle_cmd()
        .arg("validate")
        .arg("/definitely/not/there.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not/there.toml"));
}

// =============================================================================
// Check Tests
// =============================================================================

#[test]
fn test_check_reports_convergence_plan() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("main.toml"),
        r#"
[task.converged]
check = "true"

[task.pending]
check = "false"
"#,
    )
    .unwrap();

    settle_cmd()
        .arg("check")
        .arg(root_module(&dir))
        .assert()
        .success()
        .stdout(predicate::str::contains("root/task.pending\ttask\twould change"))
        .stdout(predicate::str::contains("root/task.converged\ttask\tok"))
        .stdout(predicate::str::contains("2 resources checked, 1 would change"));
}

#[test]
fn test_check_runs_dependencies_first() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("main.toml"),
        r#"
[task.second]
check = "true"
depends = ["task.first"]

[task.first]
check = "true"
"#,
    )
    .unwrap();

    let output = settle_cmd()
        .arg("check")
        .arg(root_module(&dir))
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let first = stdout.find("root/task.first").unwrap();
    let second = stdout.find("root/task.second").unwrap();
    assert!(first < second);
}

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

#[allow(deprecated)]
fn brix_cmd() -> Command {
    Command::cargo_bin("brix").unwrap()
}

fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// root -> util-pack -> deep-pack, all through path sources.
fn write_chain(root: &Path) {
    write(
        &root.join("report-tool/brix.toml"),
        r#"
[project]
name = "report-tool"

[dependencies]
util-pack = { path = "../util-pack" }
"#,
    );
    write(
        &root.join("util-pack/brix.toml"),
        r#"
[package]
name = "util-pack"
version = "1.2.0"
authors = ["Dev <dev@example.com>"]

[dependencies]
deep-pack = { path = "../deep-pack" }
"#,
    );
    write(
        &root.join("deep-pack/brix.toml"),
        r#"
[package]
name = "deep-pack"
version = "0.3.0"
authors = ["Dev <dev@example.com>"]
"#,
    );
}

#[test]
fn test_tree_prints_transitive_dependencies() {
    let tmp = TempDir::new().unwrap();
    write_chain(tmp.path());

    brix_cmd()
        .current_dir(tmp.path().join("report-tool"))
        .arg("tree")
        .assert()
        .success()
        .stdout(predicate::str::contains("report-tool v0.0.0"))
        .stdout(predicate::str::contains("util-pack v1.2.0"))
        .stdout(predicate::str::contains("deep-pack v0.3.0"));
}

#[test]
fn test_tree_depth_limits_output() {
    let tmp = TempDir::new().unwrap();
    write_chain(tmp.path());

    brix_cmd()
        .current_dir(tmp.path().join("report-tool"))
        .args(["tree", "--depth", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("util-pack v1.2.0"))
        .stdout(predicate::str::contains("deep-pack").not());
}

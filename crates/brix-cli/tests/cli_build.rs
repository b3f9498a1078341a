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

/// A project with one component, one path dependency, and one xlsm target.
fn write_project(root: &Path) {
    write(
        &root.join("report-tool/brix.toml"),
        r#"
[project]
name = "report-tool"

[src]
Main = "src/main.bas"

[dependencies]
util-pack = { path = "../util-pack" }

[targets]
xlsm = "targets/xlsm"
"#,
    );
    write(
        &root.join("report-tool/src/main.bas"),
        "Attribute VB_Name = \"Main\"\n",
    );
    write(
        &root.join("report-tool/targets/xlsm/[Content_Types].xml"),
        "<Types/>",
    );

    write(
        &root.join("util-pack/brix.toml"),
        r#"
[package]
name = "util-pack"
version = "1.2.0"
authors = ["Dev <dev@example.com>"]

[src]
Utils = "src/utils.bas"
"#,
    );
    write(
        &root.join("util-pack/src/utils.bas"),
        "Attribute VB_Name = \"Utils\"\n",
    );
}

#[test]
fn test_build_packages_declared_target() {
    let tmp = TempDir::new().unwrap();
    write_project(tmp.path());

    brix_cmd()
        .current_dir(tmp.path().join("report-tool"))
        .arg("build")
        .assert()
        .success();

    assert!(tmp
        .path()
        .join("report-tool/build/report-tool.xlsm")
        .is_file());
}

#[test]
fn test_build_works_from_nested_directory() {
    let tmp = TempDir::new().unwrap();
    write_project(tmp.path());

    brix_cmd()
        .current_dir(tmp.path().join("report-tool/src"))
        .arg("build")
        .assert()
        .success();

    assert!(tmp
        .path()
        .join("report-tool/build/report-tool.xlsm")
        .is_file());
}

#[test]
fn test_build_fails_on_duplicate_component_names() {
    let tmp = TempDir::new().unwrap();
    write_project(tmp.path());
    // The dependency now also declares a component named Main.
    write(
        &tmp.path().join("util-pack/brix.toml"),
        r#"
[package]
name = "util-pack"
version = "1.2.0"
authors = ["Dev <dev@example.com>"]

[src]
Main = "src/utils.bas"
"#,
    );

    brix_cmd()
        .current_dir(tmp.path().join("report-tool"))
        .arg("build")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Main"))
        .stderr(predicate::str::contains("util-pack"))
        .stderr(predicate::str::contains("report-tool"));

    assert!(!tmp
        .path()
        .join("report-tool/build/report-tool.xlsm")
        .exists());
}

#[test]
fn test_build_unknown_target_type_fails() {
    let tmp = TempDir::new().unwrap();
    write_project(tmp.path());

    brix_cmd()
        .current_dir(tmp.path().join("report-tool"))
        .args(["build", "--target", "docm"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("docm"));
}

#[test]
fn test_build_outside_project_fails() {
    let tmp = TempDir::new().unwrap();

    brix_cmd()
        .current_dir(tmp.path())
        .arg("build")
        .assert()
        .failure()
        .stderr(predicate::str::contains("brix.toml"));
}

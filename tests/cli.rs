use assert_cmd::Command;
use predicates::str::contains;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const PCD: &str = "VERSION 0.7\nFIELDS x y z\nSIZE 4 4 4\nTYPE F F F\nCOUNT 1 1 1\n\
                   WIDTH 3\nHEIGHT 1\nVIEWPOINT 0 0 0 1 0 0 0\nPOINTS 3\nDATA ascii\n\
                   0.0 0.0 0.0\n0.1 0.1 0.1\n0.2 0.2 0.2\n";

fn cmd() -> Command {
    Command::cargo_bin("scan-measure").unwrap()
}

/// Lay out `<root>/<qrcode>/measure/<timestamp>/pc/` with `n` artifacts.
fn make_scan(root: &Path, n: usize) -> PathBuf {
    let scan = root.join("RJ_BMZ_TEST_023").join("measure").join("1564044745615");
    let pc = scan.join("pc");
    fs::create_dir_all(&pc).unwrap();
    for i in 0..n {
        fs::write(pc.join(format!("{:03}.pcd", i)), PCD).unwrap();
    }
    scan
}

fn make_registry(root: &Path, entries: &[String]) -> PathBuf {
    let path = root.join("models.json");
    fs::write(&path, format!("{{ \"models\": [{}] }}", entries.join(","))).unwrap();
    path
}

fn entry(name: &str, active: bool, weights_dir: &Path) -> String {
    format!(
        "{{ \"name\": \"{}\", \"active\": {}, \"input_shape\": [512, 3], \
         \"output_size\": 1, \"hidden_sizes\": [512, 256], \
         \"subsampling_method\": \"sequential_skip\", \"weights_dir\": \"{}\" }}",
        name,
        active,
        weights_dir.display()
    )
}

#[test]
fn missing_scan_argument_is_a_usage_error() {
    cmd().assert().failure().stderr(contains("Usage"));
}

#[test]
fn empty_scan_aborts_without_a_report() {
    let tmp = TempDir::new().unwrap();
    let scan = make_scan(tmp.path(), 0);
    let registry = make_registry(tmp.path(), &[]);

    cmd()
        .arg(&scan)
        .arg("--registry")
        .arg(&registry)
        .assert()
        .failure()
        .stderr(contains("no artifacts found"))
        .stdout("");
}

#[test]
fn inactive_model_yields_empty_model_results() {
    let tmp = TempDir::new().unwrap();
    let scan = make_scan(tmp.path(), 3);
    let registry = make_registry(
        tmp.path(),
        &[entry("pointnet-height", false, &tmp.path().join("m"))],
    );

    let output = cmd()
        .arg(&scan)
        .arg("--registry")
        .arg(&registry)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let report: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(report["scan"]["qrcode"], "RJ_BMZ_TEST_023");
    assert_eq!(report["scan"]["timestamp"], "1564044745615");
    assert_eq!(report["model_results"].as_array().unwrap().len(), 0);
}

#[test]
fn unresolvable_weights_skip_the_model_without_failing() {
    let tmp = TempDir::new().unwrap();
    let scan = make_scan(tmp.path(), 3);
    let weights_dir = tmp.path().join("models").join("pointnet-height");
    fs::create_dir_all(&weights_dir).unwrap();
    let registry = make_registry(
        tmp.path(),
        &[entry("pointnet-height", true, &weights_dir)],
    );

    let output = cmd()
        .arg(&scan)
        .arg("--registry")
        .arg(&registry)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let report: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(report["model_results"].as_array().unwrap().len(), 0);
}

#[test]
fn duplicate_registry_names_are_fatal() {
    let tmp = TempDir::new().unwrap();
    let scan = make_scan(tmp.path(), 1);
    let dir = tmp.path().join("m");
    let registry = make_registry(
        tmp.path(),
        &[
            entry("pointnet-height", true, &dir),
            entry("pointnet-height", false, &dir),
        ],
    );

    cmd()
        .arg(&scan)
        .arg("--registry")
        .arg(&registry)
        .assert()
        .failure()
        .stderr(contains("duplicate model name"));
}

#[test]
fn compact_flag_emits_single_line_json() {
    let tmp = TempDir::new().unwrap();
    let scan = make_scan(tmp.path(), 1);
    let registry = make_registry(tmp.path(), &[]);

    let output = cmd()
        .arg(&scan)
        .arg("--registry")
        .arg(&registry)
        .arg("--compact")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let text = String::from_utf8(output).unwrap();
    assert_eq!(text.trim().lines().count(), 1);
    let _: Value = serde_json::from_str(text.trim()).unwrap();
}

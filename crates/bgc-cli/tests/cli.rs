//! CLI command integration tests.
//! Each test writes its run descriptions into a fresh temp directory.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn bgc_cmd() -> Command {
    #[allow(deprecated)]
    let cmd = Command::cargo_bin("bgc").unwrap();
    cmd
}

fn sample_config() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../configs/estuary.toml")
}

const MORTALITY: &str = r#"
[run]
name = "mortality"
tracers = ["PhyD_N", "PhyD_NR", "PhyD_I", "NH4", "NH4_pr", "DIP", "DetPL_N", "TN", "TP", "TC"]
mass_balance = ["water_column"]

[parameters]
PD_mL = 0.1

[processes]
water_column = ["dinoflagellate_diel_mortality_wc"]

[[cells]]
domain = "water_column"
state = { PhyD_N = 5.0, PhyD_NR = 2.0 }
"#;

fn write_config(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("run.toml");
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn processes_lists_catalog() {
    bgc_cmd()
        .arg("processes")
        .assert()
        .success()
        .stdout(predicate::str::contains("tfactor"))
        .stdout(predicate::str::contains("trichodesmium_mortality_sed"))
        .stdout(predicate::str::contains("zooplankton_large_grow_wc"));
}

#[test]
fn check_sample_config() {
    bgc_cmd()
        .arg("check")
        .arg(sample_config())
        .assert()
        .success()
        .stdout(predicate::str::contains("run:          estuary"))
        .stdout(predicate::str::contains("[audited]"))
        .stdout(predicate::str::contains("ok"));
}

#[test]
fn eval_prints_derivative() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, MORTALITY);
    bgc_cmd()
        .arg("eval")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("cell 0 (water_column)"))
        .stdout(predicate::str::contains("PhyD_N"))
        .stdout(predicate::str::contains("-5.000000e-1"));
}

#[test]
fn eval_json_and_output_file() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, MORTALITY);
    let out = dir.path().join("report.json");
    let output = bgc_cmd()
        .args(["eval", "--json", "--output"])
        .arg(&out)
        .arg(&config)
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"run\": \"mortality\""));
    assert!(stdout.contains("\"DetPL_N\": 0.5"));
    let written = std::fs::read_to_string(&out).unwrap();
    assert!(written.contains("\"audit\""));
}

#[test]
fn balance_passes_for_conserving_run() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, MORTALITY);
    bgc_cmd()
        .arg("balance")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("cell 0 (water_column): balanced"))
        .stdout(predicate::str::contains("audited 1 cell(s), 0 imbalanced"));
}

#[test]
fn balance_sample_config() {
    bgc_cmd()
        .args(["balance", "--tolerance", "1e-12"])
        .arg(sample_config())
        .assert()
        .success()
        .stdout(predicate::str::contains("audited 2 cell(s), 0 imbalanced"));
}

#[test]
fn balance_requires_audit() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, &MORTALITY.replace("mass_balance = [\"water_column\"]", ""));
    bgc_cmd()
        .arg("balance")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("mass balance is not enabled"));
}

#[test]
fn missing_parameter_fails_setup() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, &MORTALITY.replace("PD_mL = 0.1", ""));
    bgc_cmd()
        .arg("check")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("setup failed"))
        .stderr(predicate::str::contains("missing parameter 'PD_mL'"));
}

#[test]
fn invalid_toml_fails_load() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, "[run\nname = ");
    bgc_cmd()
        .arg("check")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load run description"));
}

#[test]
fn unknown_process_is_reported() {
    let dir = TempDir::new().unwrap();
    let config = write_config(
        &dir,
        &MORTALITY.replace(
            "[\"dinoflagellate_diel_mortality_wc\"]",
            "[\"dinoflagellate_diel_mortality_sed\"]",
        ),
    );
    bgc_cmd()
        .arg("check")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot run in the water_column domain"));
}

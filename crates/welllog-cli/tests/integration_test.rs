//! Integration tests for the `welllog` binary.
//!
//! Each test writes a small log with PetrologWriter, runs one command and
//! checks its output and the files it leaves behind.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use welllog_petrolog::{PetrologConfig, PetrologLog, PetrologWriter};

// ──────────────────────── helpers ────────────────────────

/// Four records from 2000 ft at 1 ft with GR, RT and a two-column array.
fn write_log(dir: &Path) -> PathBuf {
    let base = dir.join("well");
    let mut writer = PetrologWriter::new(2000.0, 1.0, 4);
    writer
        .add_channel("GR", "API", "Gamma ray", 1, vec![30.0, f64::NAN, 50.0, 60.0])
        .unwrap()
        .add_channel("RT", "ohmm", "Resistivity", 1, vec![1.0, 2.0, 3.0, 4.0])
        .unwrap()
        .add_channel("ARR", "mV", "Array", 2, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0])
        .unwrap();
    writer.well_header_mut().set_constant("WELL", "CLI-1");
    writer.finalize(&base).unwrap();
    base
}

fn setup() -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let base = write_log(dir.path());
    (dir, base)
}

#[allow(deprecated)]
fn welllog_cmd() -> Command {
    Command::cargo_bin("welllog").expect("Failed to find `welllog` binary")
}

fn reopen(base: &Path) -> PetrologLog {
    PetrologLog::open(base, PetrologConfig::default()).unwrap()
}

// ──────────────────────── tests ─────────────────────────

#[test]
fn test_info_human() {
    let (_dir, base) = setup();
    welllog_cmd()
        .arg("info")
        .arg(&base)
        .assert()
        .success()
        .stdout(predicate::str::contains("Records:      4"))
        .stdout(predicate::str::contains("Channels (4)"))
        .stdout(predicate::str::contains("ARR"))
        .stdout(predicate::str::contains("CLI-1"));
}

#[test]
fn test_info_json() {
    let (_dir, base) = setup();
    let output = welllog_cmd()
        .arg("info")
        .arg(base.with_extension("header"))
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let info: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(info["header"]["number_of_records"], 4);
    assert_eq!(info["header"]["record_width"], 8 + 4 * 4);
    assert_eq!(info["channels"][0]["name"], "DEPTH");
    assert_eq!(info["channels"][3]["dimension"], 2);
    assert_eq!(info["constants"][0]["value"], "CLI-1");
}

#[test]
fn test_stats_writes_cache() {
    let (_dir, base) = setup();
    welllog_cmd()
        .arg("stats")
        .arg(&base)
        .assert()
        .success()
        .stdout(predicate::str::contains("GR"))
        .stdout(predicate::str::contains("46.6667"));
    assert!(base.with_extension("statistics").exists());

    let (_dir, base) = setup();
    welllog_cmd()
        .args(["--no-cache", "stats"])
        .arg(&base)
        .assert()
        .success();
    assert!(!base.with_extension("statistics").exists());
}

#[test]
fn test_dump_channel() {
    let (_dir, base) = setup();
    welllog_cmd()
        .arg("dump")
        .arg(&base)
        .args(["--channel", "GR", "--limit", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2000.00\t30.0000"))
        .stdout(predicate::str::contains("2001.00\tNaN"))
        .stdout(predicate::str::contains("2002.00").not());
}

#[test]
fn test_delete_channel() {
    let (_dir, base) = setup();
    welllog_cmd()
        .arg("delete")
        .arg(&base)
        .arg("ARR")
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted 1 channel(s)"));

    let mut log = reopen(&base);
    assert_eq!(log.header().number_of_columns, 2);
    assert_eq!(log.header().record_width, 16);
    log.load_channel(2).unwrap();
    assert_eq!(log.log().channels[2].samples, vec![1.0, 2.0, 3.0, 4.0]);
}

#[test]
fn test_delete_index_fails() {
    let (_dir, base) = setup();
    welllog_cmd()
        .arg("delete")
        .arg(&base)
        .arg("DEPTH")
        .assert()
        .failure()
        .stderr(predicate::str::contains("DEPTH"));
}

#[test]
fn test_convert_remap_crop() {
    let (_dir, base) = setup();
    welllog_cmd()
        .arg("convert")
        .arg(&base)
        .args(["--from", "ohmm", "--to", "ohm.m", "--gain", "10", "--offset", "-1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Converted 1 channel(s)"));

    welllog_cmd()
        .arg("remap")
        .arg(&base)
        .arg("GR=RT")
        .assert()
        .success();

    welllog_cmd()
        .arg("crop")
        .arg(&base)
        .args(["--from", "2001", "--to", "2002"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Kept 2 record(s)"));

    let mut log = reopen(&base);
    assert_eq!(log.log().channels[2].unit, "ohm.m");
    log.load_channel(1).unwrap();
    assert_eq!(log.log().channels[1].samples, vec![19.0, 29.0]);
}

#[test]
fn test_remap_rejects_bad_pair() {
    let (_dir, base) = setup();
    welllog_cmd()
        .arg("remap")
        .arg(&base)
        .arg("GR")
        .assert()
        .failure()
        .stderr(predicate::str::contains("DEST=SRC"));
}

#[test]
fn test_set_constant() {
    let (_dir, base) = setup();
    welllog_cmd()
        .arg("set-constant")
        .arg(&base)
        .args(["Run_2_BHT", "190"])
        .assert()
        .success();

    let log = reopen(&base);
    assert_eq!(log.well_header().runs.len(), 2);
    assert_eq!(log.log().constant("Run_2_BHT").unwrap().value, "190");
    assert_eq!(log.log().constant("WELL").unwrap().value, "CLI-1");
}

#[test]
fn test_missing_log() {
    let dir = TempDir::new().unwrap();
    welllog_cmd()
        .arg("info")
        .arg(dir.path().join("absent"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to open log"));
}

// vtprobe/tests/cli_integration_tests.rs
//! Command-line integration tests for the `vtprobe` binary.
//!
//! Each test runs the binary with its sinks redirected into a temporary
//! directory, so nothing is written to the working tree.
//! `strip_ansi_escapes` keeps assertions independent of console colouring.

use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::io::Write;
use tempfile::{tempdir, NamedTempFile};
use test_log::test;

use strip_ansi_escapes::strip as strip_ansi_escapes_fn;

fn vtprobe() -> Command {
    let mut cmd = Command::cargo_bin("vtprobe").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd.env_remove("VTPROBE_SEED");
    cmd
}

fn strip_ansi(s: &[u8]) -> String {
    String::from_utf8_lossy(&strip_ansi_escapes_fn(s)).to_string()
}

#[test]
fn run_echoes_token_and_writes_sinks() -> Result<()> {
    let dir = tempdir()?;
    let output = vtprobe()
        .args(["run", "hello-token", "--seed", "7", "--phases", "control-chars", "--out-dir"])
        .arg(dir.path())
        .output()?;
    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout)?, "hello-token\n");

    let stderr = strip_ansi(&output.stderr);
    assert!(stderr.contains("Testing control characters (33 sequences)..."), "stderr: {}", stderr);
    assert!(stderr.contains("[!] Vulnerability found: DoS via terminal bell - \\x07"));
    assert!(stderr.contains("[!] Vulnerability found: injection vector - \\x1b"));
    assert!(stderr.contains("Run Summary"));
    assert!(stderr.contains("Skipping csi sequences (not selected)."));

    let tests = fs::read_to_string(dir.path().join("terminal_tests.log"))?;
    assert_eq!(tests.lines().count(), 33);
    let vulns = fs::read_to_string(dir.path().join("terminal_vulnerabilities.log"))?;
    assert_eq!(vulns.lines().count(), 2);
    let report = fs::read_to_string(dir.path().join("terminal_security_report.txt"))?;
    assert!(report.contains("Seed: 7"));
    assert!(report.contains("Total vulnerabilities: 2"));
    Ok(())
}

#[test]
fn quiet_run_prints_only_the_token() -> Result<()> {
    let dir = tempdir()?;
    vtprobe()
        .args(["--quiet", "run", "abc", "--phases", "edge-cases", "--out-dir"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout("abc\n")
        .stderr(predicate::str::is_empty());
    assert!(dir.path().join("terminal_security_report.txt").exists());
    Ok(())
}

#[test]
fn no_summary_hides_the_table() -> Result<()> {
    let dir = tempdir()?;
    vtprobe()
        .args(["run", "--no-summary", "--phases", "osc", "--out-dir"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Run Summary").not());
    Ok(())
}

#[test]
fn json_flag_writes_json_report() -> Result<()> {
    let dir = tempdir()?;
    vtprobe()
        .args(["-q", "run", "--json", "--seed", "3", "--phases", "sgr", "--out-dir"])
        .arg(dir.path())
        .assert()
        .success();
    let report = fs::read_to_string(dir.path().join("terminal_security_report.txt"))?;
    let value: serde_json::Value = serde_json::from_str(&report)?;
    assert_eq!(value["seed"], "3");
    assert_eq!(value["categories"][2]["category"], "sgr");
    Ok(())
}

#[test]
fn config_file_is_honoured() -> Result<()> {
    let dir = tempdir()?;
    let mut config = NamedTempFile::new()?;
    writeln!(
        config,
        "seed: 21\nphases: [malicious-payloads]\noutput:\n  report: probe-report.txt\nextra_payloads:\n  - \"\\e]52;c;dGVzdA==\\a\""
    )?;
    vtprobe()
        .args(["-q", "run", "--config"])
        .arg(config.path())
        .arg("--out-dir")
        .arg(dir.path())
        .assert()
        .success();

    let report = fs::read_to_string(dir.path().join("probe-report.txt"))?;
    assert!(report.contains("Seed: 21"));
    assert!(report.contains("Malicious payloads: 13"));
    let vulns = fs::read_to_string(dir.path().join("terminal_vulnerabilities.log"))?;
    assert!(vulns.contains("known attack vector #12 - Sequence: \\x1b]52;c;dGVzdA==\\x07"));
    Ok(())
}

#[test]
fn missing_config_fails() {
    vtprobe()
        .args(["run", "--config", "/no/such/vtprobe.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: "))
        .stderr(predicate::str::contains("Failed to read config file"));
}

#[test]
fn unknown_phase_is_a_usage_error() {
    vtprobe()
        .args(["run", "--phases", "palette"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("palette"));
}

#[test]
fn catalog_lists_planned_sequences() {
    let output = vtprobe().arg("catalog").output().unwrap();
    assert!(output.status.success());
    let stdout = strip_ansi(&output.stdout);
    for name in ["control-chars", "csi", "sgr", "osc", "malicious-payloads", "edge-cases"] {
        assert!(stdout.contains(name), "missing phase {}", name);
    }
    assert!(stdout.contains("DEC private modes"));
}

#[test]
fn custom_theme_file_is_accepted() -> Result<()> {
    let dir = tempdir()?;
    let mut theme = NamedTempFile::new()?;
    writeln!(theme, "vulnerability:\n  fg: magenta")?;
    vtprobe()
        .arg("--theme")
        .arg(theme.path())
        .args(["run", "--phases", "control-chars", "--out-dir"])
        .arg(dir.path())
        .assert()
        .success();
    Ok(())
}

#[test]
fn invalid_theme_file_fails() -> Result<()> {
    let mut theme = NamedTempFile::new()?;
    writeln!(theme, "vulnerability: [not, a, style")?;
    vtprobe()
        .arg("--theme")
        .arg(theme.path())
        .arg("catalog")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: Theme error"));
    Ok(())
}

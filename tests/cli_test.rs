//! Command line tests against the built binary

use assert_cmd::Command;
use predicates::prelude::*;

mod common;

fn cmd(dir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("pbs-cputime").unwrap();
    cmd.current_dir(dir)
        .env_remove("RUST_LOG")
        .env_remove("LOG_FORMAT")
        .env_remove("LOG_OUTPUT")
        .env("LOG_LEVEL", "error")
        .env("PBS_CPUTIME_LOG_DIR", dir.join("logs"))
        .arg("--dir")
        .arg(dir);
    cmd
}

#[test]
fn test_total_only() -> anyhow::Result<()> {
    let temp_dir = common::setup_accounting_dir()?;
    cmd(temp_dir.path())
        .args(["20240102", "20240103"])
        .assert()
        .success()
        .stdout("Total CPU Time is: 894599\n");
    Ok(())
}

#[test]
fn test_group_tables() -> anyhow::Result<()> {
    let temp_dir = common::setup_accounting_dir()?;
    cmd(temp_dir.path())
        .args(["20240102", "240103", "-u", "-g", "-R", "routeq"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total CPU Time per User:"))
        .stdout(predicate::str::contains("Total CPU Time per Group:"))
        .stdout(predicate::str::is_match(r"(?m)^carol\s+phys\s+88199 workq$").unwrap())
        .stdout(predicate::str::is_match(r"(?m)^chem\s+14400$").unwrap())
        .stdout(predicate::str::contains("routeq").not());
    Ok(())
}

#[test]
fn test_only_user_filter() -> anyhow::Result<()> {
    let temp_dir = common::setup_accounting_dir()?;
    cmd(temp_dir.path())
        .args(["20240102", "20240102", "-U", "alice"])
        .assert()
        .success()
        .stdout("Total CPU Time is: 14400\n");
    Ok(())
}

#[test]
fn test_only_group_filter() -> anyhow::Result<()> {
    let temp_dir = common::setup_accounting_dir()?;
    // bob/chem is dropped, the orphan job without a group still counts
    cmd(temp_dir.path())
        .args(["20240102", "20240103", "-G", "phys"])
        .assert()
        .success()
        .stdout("Total CPU Time is: 880199\n");
    Ok(())
}

#[test]
fn test_invalid_log_config_falls_back_to_defaults() -> anyhow::Result<()> {
    let temp_dir = common::setup_accounting_dir()?;
    cmd(temp_dir.path())
        .env("LOG_FORMAT", "xml")
        .args(["20240102", "20240103"])
        .assert()
        .success()
        .stdout("Total CPU Time is: 894599\n")
        .stderr(predicate::str::contains("using defaults"));
    Ok(())
}

#[test]
fn test_broken_config_file_falls_back_to_defaults() -> anyhow::Result<()> {
    let temp_dir = common::setup_accounting_dir()?;
    std::fs::write(temp_dir.path().join("pbs-cputime.toml"), "[logging\nlevel = ")?;
    cmd(temp_dir.path())
        .args(["20240102", "20240103"])
        .assert()
        .success()
        .stdout("Total CPU Time is: 894599\n");
    Ok(())
}

#[test]
fn test_environment_does_not_change_report() -> anyhow::Result<()> {
    let temp_dir = common::setup_accounting_dir()?;
    cmd(temp_dir.path())
        .env("PBS_CPUTIME_IGNORE_QUEUES", "routeq")
        .env("PBS_ACCOUNTING_DIR", "/nonexistent")
        .args(["20240102", "20240103", "-u"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total CPU Time is: 894599"))
        .stdout(predicate::str::is_match(r"(?m)^carol\s+phys\s+88199 routeq,workq$").unwrap());
    Ok(())
}

#[test]
fn test_verbose_dump_lists_every_job() -> anyhow::Result<()> {
    let temp_dir = common::setup_accounting_dir()?;
    cmd(temp_dir.path())
        .args(["20240102", "20240103", "-v"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"(?m)^       100  E alice").unwrap())
        .stdout(predicate::str::is_match(r"(?m)^       400  0 None").unwrap());
    Ok(())
}

#[test]
fn test_json_output() -> anyhow::Result<()> {
    let temp_dir = common::setup_accounting_dir()?;
    let output = cmd(temp_dir.path())
        .args(["20240102", "20240103", "--json", "-g"])
        .output()?;
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(value["totalCpuTime"], 894_599);
    assert_eq!(value["stats"]["filesRead"], 2);
    assert!(value["byGroup"].is_array());
    Ok(())
}

#[test]
fn test_invalid_date_fails() -> anyhow::Result<()> {
    let temp_dir = common::setup_accounting_dir()?;
    cmd(temp_dir.path())
        .args(["2024-01-02"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("yyyymmdd"));
    Ok(())
}

#[test]
fn test_empty_directory_reports_zero() -> anyhow::Result<()> {
    let temp_dir = tempfile::TempDir::new()?;
    cmd(temp_dir.path())
        .args(["20240101", "20240107"])
        .assert()
        .success()
        .stdout("Total CPU Time is: 0\n");
    Ok(())
}

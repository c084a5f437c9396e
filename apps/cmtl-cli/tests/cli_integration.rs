//! Integration tests for the CMTL CLI.
//!
//! Runs each subcommand against a temporary config and output directory.

use anyhow::Result;
use serde_json::{Value, json};
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

/// Command for the cmtl binary rooted in `dir`
fn cmtl(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_cmtl"));
    cmd.arg("--config")
        .arg(dir.join("config.json"))
        .arg("--output-dir")
        .arg(dir.join("output"));
    cmd
}

/// Config with short timeouts so installed tools cannot stall the tests
fn write_config(dir: &Path) -> Result<()> {
    let config = json!({
        "run_delay_ms": 0,
        "timeout_seconds": 5,
        "probe_timeout_seconds": 5,
        "external_tools": {
            "Echo Tool": ["echo", "hello", "{target}"]
        }
    });
    std::fs::write(dir.join("config.json"), config.to_string())?;
    Ok(())
}

fn read_ledger(dir: &Path) -> Result<Vec<Value>> {
    let content = std::fs::read_to_string(dir.join("output").join("results.json"))?;
    Ok(serde_json::from_str(&content)?)
}

#[test]
fn test_cli_version() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let output = cmtl(temp_dir.path()).arg("--version").output()?;

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("cmtl"));
    Ok(())
}

#[test]
fn test_cli_help() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let output = cmtl(temp_dir.path()).arg("--help").output()?;

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for subcommand in ["run-all", "cli", "gui", "tools"] {
        assert!(stdout.contains(subcommand), "missing {subcommand}");
    }
    Ok(())
}

#[test]
fn test_tools_command_creates_config_and_layout() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let output = cmtl(temp_dir.path()).arg("tools").output()?;

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("port_scanner"));
    assert!(stdout.contains("QualysGuard"));
    assert!(stdout.contains("no launcher"));

    assert!(temp_dir.path().join("config.json").exists());
    assert!(temp_dir.path().join("output").join("logs").is_dir());
    assert!(read_ledger(temp_dir.path())?.is_empty());
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_run_all_prints_summary_and_records_every_tool() -> Result<()> {
    let temp_dir = TempDir::new()?;
    write_config(temp_dir.path())?;

    let output = cmtl(temp_dir.path())
        .args(["run-all", "--target", "127.0.0.1"])
        .output()?;

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let summary: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(summary["target"], "127.0.0.1");

    let outcomes = summary["outcomes"].as_array().cloned().unwrap_or_default();
    let echo = outcomes
        .iter()
        .find(|o| o["tool"] == "Echo Tool")
        .cloned()
        .unwrap_or_default();
    assert_eq!(echo["success"], true);
    assert_eq!(echo["status"], "succeeded");

    let records = read_ledger(temp_dir.path())?;
    assert_eq!(records.len(), outcomes.len() + 1);
    assert_eq!(records.last().map(|r| r["kind"].clone()), Some(json!("run_all")));

    let log = std::fs::read_to_string(
        temp_dir.path().join("output").join("logs").join("echo_tool.log"),
    )?;
    assert!(log.contains("hello 127.0.0.1"));
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_run_all_reaches_bundled_port_scanner() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    let port = listener.local_addr()?.port();
    let config = json!({
        "run_delay_ms": 0,
        "timeout_seconds": 5,
        "probe_timeout_seconds": 5,
        "internal_tools": {
            "port_scanner": ["cmtl-probe", "port-scan", "{target}", port.to_string()]
        }
    });
    std::fs::write(temp_dir.path().join("config.json"), config.to_string())?;

    // cmtl-probe is only reachable beside the cmtl binary
    let output = cmtl(temp_dir.path())
        .env("PATH", "/usr/bin:/bin")
        .args(["run-all", "--target", "127.0.0.1"])
        .output()?;

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let records = read_ledger(temp_dir.path())?;
    let scan = records
        .iter()
        .find(|r| r["tool"] == "port_scanner")
        .cloned()
        .unwrap_or_default();
    assert_eq!(scan["success"], true, "record: {scan}");
    assert_eq!(scan["exit_code"], 0);
    let cmd = scan["cmd"].as_str().unwrap_or_default();
    assert!(
        cmd.ends_with(&format!("/cmtl-probe port-scan 127.0.0.1 {port}")),
        "cmd: {cmd}"
    );

    let log = std::fs::read_to_string(
        temp_dir.path().join("output").join("logs").join("port_scanner.log"),
    )?;
    assert!(log.contains(&format!("[+] 127.0.0.1:{port} OPEN")));
    drop(listener);
    Ok(())
}

#[test]
fn test_run_all_fails_when_output_dir_cannot_be_created() -> Result<()> {
    let temp_dir = TempDir::new()?;
    write_config(temp_dir.path())?;
    std::fs::write(temp_dir.path().join("output"), "not a directory")?;

    let output = cmtl(temp_dir.path()).arg("run-all").output()?;

    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("output directory"));
    Ok(())
}

#[test]
fn test_corrupt_config_falls_back_to_defaults() -> Result<()> {
    let temp_dir = TempDir::new()?;
    std::fs::write(temp_dir.path().join("config.json"), "{ not json")?;

    let output = cmtl(temp_dir.path()).arg("tools").output()?;

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Nmap"));
    assert_eq!(
        std::fs::read_to_string(temp_dir.path().join("config.json"))?,
        "{ not json"
    );
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_interactive_menu_runs_selected_tool() -> Result<()> {
    let temp_dir = TempDir::new()?;
    write_config(temp_dir.path())?;

    // Default tools are merged back into the config, so find Echo Tool by listing
    let listing = cmtl(temp_dir.path()).arg("tools").output()?;
    let index = tool_index(&listing, "Echo Tool").unwrap_or(0);

    let mut child = cmtl(temp_dir.path())
        .args(["cli", "--target", "10.9.8.7"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    if let Some(stdin) = child.stdin.as_mut() {
        write!(stdin, "1\n{index}\n\n0\n")?;
    }
    let output = child.wait_with_output()?;

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("OK\nhello 10.9.8.7"));
    Ok(())
}

/// 1-based position of `name` in the `tools` listing
fn tool_index(listing: &Output, name: &str) -> Option<usize> {
    String::from_utf8_lossy(&listing.stdout)
        .lines()
        .skip(1)
        .position(|line| line.contains(name))
        .map(|index| index + 1)
}

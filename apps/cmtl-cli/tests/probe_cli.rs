//! Integration tests for the cmtl-probe binary.
//!
//! Runs each subcommand against local listeners so no network access is
//! needed.

use anyhow::Result;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::process::Command;

fn probe_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_cmtl-probe"))
}

#[test]
fn test_cli_help_lists_subcommands() -> Result<()> {
    let output = probe_bin().arg("--help").output()?;

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for subcommand in ["port-scan", "ping-sweep", "banner-grab", "subdomain-find"] {
        assert!(stdout.contains(subcommand), "missing {subcommand}");
    }
    Ok(())
}

#[test]
fn test_port_scan_reports_open_port() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let port = listener.local_addr()?.port();

    let output = probe_bin()
        .args(["port-scan", "127.0.0.1", &port.to_string()])
        .output()?;

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(&format!("[+] 127.0.0.1:{port} OPEN")));
    assert!(stdout.contains(&format!("Open ports: [{port}]")));
    Ok(())
}

#[test]
fn test_port_scan_rejects_bad_ports() -> Result<()> {
    let output = probe_bin()
        .args(["port-scan", "127.0.0.1", "not-a-port"])
        .output()?;

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid ports argument"));
    Ok(())
}

#[test]
fn test_banner_grab_prints_greeting() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let port = listener.local_addr()?.port();
    let server = std::thread::spawn(move || -> std::io::Result<()> {
        let (mut socket, _) = listener.accept()?;
        socket.write_all(b"220 test FTP ready\r\n")?;
        let mut request = [0u8; 256];
        let _ = socket.read(&mut request);
        Ok(())
    });

    let output = probe_bin()
        .args(["banner-grab", "127.0.0.1", &port.to_string()])
        .output()?;
    server.join().expect("server thread panicked")?;

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout, "Banner output:\n220 test FTP ready\n");
    Ok(())
}

#[test]
fn test_ping_sweep_rejects_reversed_range() -> Result<()> {
    let output = probe_bin()
        .args(["ping-sweep", "10.0.0.", "20", "1"])
        .output()?;

    assert!(!output.status.success());
    Ok(())
}

//! ICMP ping sweep over the last octet of an IPv4 prefix.
//!
//! Delegates to the system `ping` utility, one echo request per host.

use crate::error::{ProbeError, Result};
use futures::StreamExt;
use std::process::Stdio;
use tokio::process::Command;

/// Expands `base` (`192.168.1` or `192.168.1.`) into `start..=end` hosts.
pub fn hosts(base: &str, start: u16, end: u16) -> Result<Vec<String>> {
    if start > end || end > 255 {
        return Err(ProbeError::InvalidRange { start, end });
    }
    let base = base.trim().trim_end_matches('.');
    Ok((start..=end).map(|octet| format!("{base}.{octet}")).collect())
}

fn ping_command(host: &str) -> Command {
    let mut command = Command::new("ping");
    if cfg!(windows) {
        command.args(["-n", "1", "-w", "1000", host]);
    } else {
        command.args(["-c", "1", "-W", "1", host]);
    }
    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true);
    command
}

/// Sends one echo request to `host`.
pub async fn ping(host: &str) -> Result<bool> {
    match ping_command(host).status().await {
        Ok(status) => Ok(status.success()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ProbeError::PingUnavailable),
        Err(e) => {
            tracing::debug!(host, error = %e, "ping failed to start");
            Ok(false)
        }
    }
}

/// Pings every host, at most `workers` at a time; returns responders in input order.
#[tracing::instrument(skip(hosts), fields(hosts = hosts.len()))]
pub async fn sweep(hosts: &[String], workers: usize) -> Result<Vec<String>> {
    let results: Vec<(usize, Result<bool>)> = futures::stream::iter(hosts.iter().enumerate())
        .map(|(index, host)| async move { (index, ping(host).await) })
        .buffer_unordered(workers.max(1))
        .collect()
        .await;

    let mut alive = Vec::new();
    for (index, result) in results {
        if result? {
            alive.push(index);
        }
    }
    alive.sort_unstable();
    Ok(alive.into_iter().map(|index| hosts[index].clone()).collect())
}

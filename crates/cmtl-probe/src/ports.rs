//! TCP connect scan.

use crate::error::{ProbeError, Result};
use futures::StreamExt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::net::TcpStream;

/// Ports scanned when no list is given.
pub const COMMON_PORTS: [u16; 14] = [
    21, 22, 23, 25, 53, 80, 110, 139, 143, 443, 445, 3306, 3389, 8080,
];

/// Parses `22,80,443` or `1-1024`. Ports must lie in `1..=65535`.
pub fn parse_ports(spec: &str) -> Result<Vec<u16>> {
    let invalid = || ProbeError::InvalidPorts(spec.to_string());
    let port = |part: &str| match part.trim().parse::<u16>() {
        Ok(0) | Err(_) => Err(invalid()),
        Ok(port) => Ok(port),
    };

    if let Some((start, end)) = spec.split_once('-') {
        let start = port(start)?;
        let end = port(end)?;
        if start > end {
            return Err(invalid());
        }
        return Ok((start..=end).collect());
    }

    let ports = spec
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(port)
        .collect::<Result<Vec<_>>>()?;

    if ports.is_empty() {
        return Err(invalid());
    }
    Ok(ports)
}

/// Resolves `host` to its first address.
pub async fn resolve(host: &str) -> Result<IpAddr> {
    let resolve_error = |source| ProbeError::Resolve {
        host: host.to_string(),
        source,
    };

    let mut addrs = tokio::net::lookup_host((host, 0))
        .await
        .map_err(resolve_error)?;
    addrs
        .next()
        .map(|addr| addr.ip())
        .ok_or_else(|| resolve_error(std::io::Error::other("no addresses returned")))
}

/// Returns `true` if a TCP connection to `addr` completes within `timeout`.
pub async fn is_open(addr: SocketAddr, timeout: Duration) -> bool {
    matches!(
        tokio::time::timeout(timeout, TcpStream::connect(addr)).await,
        Ok(Ok(_))
    )
}

/// Scans `ports` on `host` with at most `workers` connections in flight.
///
/// Returns the open ports in ascending order.
#[tracing::instrument(skip(ports), fields(ports = ports.len()))]
pub async fn scan(host: &str, ports: &[u16], timeout: Duration, workers: usize) -> Result<Vec<u16>> {
    let ip = resolve(host).await?;

    let mut open: Vec<u16> = futures::stream::iter(ports.iter().copied())
        .map(move |port| async move { (port, is_open(SocketAddr::new(ip, port), timeout).await) })
        .buffer_unordered(workers.max(1))
        .filter_map(|(port, open)| async move { open.then_some(port) })
        .collect()
        .await;

    open.sort_unstable();
    open.dedup();
    Ok(open)
}

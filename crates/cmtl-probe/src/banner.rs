//! Banner grabbing over a plain TCP connection.

use crate::error::{ProbeError, Result};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

const READ_LIMIT: usize = 4096;

/// Connects to `host:port`, sends an HTTP `HEAD` and returns whatever the
/// service answers first, trimmed.
///
/// Services that speak first (SSH, SMTP, FTP) answer before the request is
/// read, so their greeting is returned as is.
#[tracing::instrument]
pub async fn grab(host: &str, port: u16, timeout: Duration) -> Result<String> {
    let addr = format!("{host}:{port}");
    let connect_error = |reason: String| ProbeError::Connect {
        addr: addr.clone(),
        reason,
    };

    let mut stream = tokio::time::timeout(timeout, TcpStream::connect(&addr))
        .await
        .map_err(|_| connect_error("timed out".to_string()))?
        .map_err(|e| connect_error(e.to_string()))?;

    let request = format!("HEAD / HTTP/1.1\r\nHost: {host}\r\nConnection: close\r\n\r\n");
    if let Err(e) = stream.write_all(request.as_bytes()).await {
        tracing::debug!(error = %e, "request not sent");
    }

    let mut buffer = vec![0u8; READ_LIMIT];
    let read = match tokio::time::timeout(timeout, stream.read(&mut buffer)).await {
        Ok(read) => read?,
        Err(_) => 0,
    };

    Ok(String::from_utf8_lossy(&buffer[..read]).trim().to_string())
}

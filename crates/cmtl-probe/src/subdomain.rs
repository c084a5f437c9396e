//! Low-volume subdomain probe over HTTP.

use crate::error::Result;
use futures::StreamExt;
use std::time::Duration;

/// Prefixes tried for every domain.
pub const COMMON_SUBDOMAINS: [&str; 8] =
    ["www", "mail", "ftp", "dev", "test", "staging", "api", "beta"];

/// Requests in flight at once.
const CONCURRENCY: usize = 4;

/// A subdomain that answered below HTTP 400.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub url: String,
    pub status: u16,
}

/// Candidate URLs for `domain`: the common prefixes, then `extra`.
pub fn candidates(domain: &str, extra: &[String]) -> Vec<String> {
    let domain = domain.trim().trim_matches('.');
    COMMON_SUBDOMAINS
        .iter()
        .map(|sub| sub.to_string())
        .chain(extra.iter().cloned())
        .map(|sub| format!("http://{sub}.{domain}"))
        .collect()
}

/// Builds the HTTP client used by [`probe`].
pub fn client(timeout: Duration) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .user_agent("cmtl-probe")
        .timeout(timeout)
        .build()?)
}

/// Status code of `GET url`, or `None` if the request failed.
pub async fn status_of(client: &reqwest::Client, url: &str) -> Option<u16> {
    match client.get(url).send().await {
        Ok(response) => Some(response.status().as_u16()),
        Err(e) => {
            tracing::debug!(url, error = %e, "no answer");
            None
        }
    }
}

/// Probes every URL and keeps those answering below 400, in input order.
#[tracing::instrument(skip_all, fields(urls = urls.len()))]
pub async fn probe(client: &reqwest::Client, urls: &[String]) -> Vec<Finding> {
    futures::stream::iter(urls)
        .map(|url| async move { (url, status_of(client, url).await) })
        .buffered(CONCURRENCY)
        .filter_map(|(url, status)| async move {
            status
                .filter(|status| *status < 400)
                .map(|status| Finding {
                    url: url.clone(),
                    status,
                })
        })
        .collect()
        .await
}

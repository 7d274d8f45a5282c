use anyhow::{bail, Context, Result};
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36";

/// Shared client for every lookup; reqwest pools connections internally.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(10))
        .timeout(timeout)
        .build()
        .context("failed to build HTTP client")
}

/// GET a page and return its body as text.
///
/// The status code is only logged: the platform serves its "nothing found" page
/// with error statuses, and that body still has to be scanned. A declared
/// non-HTML content type is treated as a failed fetch.
pub async fn fetch_html(client: &reqwest::Client, url: &str) -> Result<String> {
    tracing::debug!(url, "fetching page");

    let resp = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("request to {} failed", url))?;

    let status = resp.status();
    if let Some(content_type) = resp.headers().get(CONTENT_TYPE) {
        let content_type = content_type.to_str().unwrap_or_default().to_ascii_lowercase();
        if !content_type.is_empty() && !content_type.contains("html") {
            bail!("{} returned non-HTML content ({}, status {})", url, content_type, status);
        }
    }

    let html = resp
        .text()
        .await
        .with_context(|| format!("failed to read body of {}", url))?;

    tracing::debug!(url, %status, bytes = html.len(), "fetched page");
    Ok(html)
}

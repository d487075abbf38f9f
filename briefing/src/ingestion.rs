use anyhow::{Context, Result};
use feed_rs::model::Feed;
use feed_rs::parser;
use reqwest::Client;
use std::time::Duration;

use common::HttpConfig;

/// Builds the HTTP client shared by every source adapter and the webhook notifier.
/// The timeout applies to each request as a whole, so no outbound call can hang the run.
pub fn build_http_client(http: &HttpConfig) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(http.timeout_seconds))
        .user_agent(http.user_agent.clone())
        .build()
        .context("failed to build reqwest client")
}

/// Fetches a feed (RSS or Atom) from the given URL and parses it.
/// A single attempt: any network, status or parse failure is returned to the caller.
pub async fn fetch_and_parse_feed(client: &Client, url: &str) -> Result<Feed> {
    let response = client
        .get(url)
        .send()
        .await
        .context("network error during fetch")?;

    let status = response.status();
    if !status.is_success() {
        return Err(anyhow::anyhow!("feed fetch failed with status: {}", status));
    }

    let bytes = response.bytes().await.context("failed to read response body")?;
    parse_feed(bytes.as_ref())
}

/// Parses raw feed bytes.
pub fn parse_feed(bytes: &[u8]) -> Result<Feed> {
    parser::parse(bytes).context("failed to parse feed")
}

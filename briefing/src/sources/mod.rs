//! Source adapters.
//!
//! Every adapter turns one upstream API into a list of [`CandidateItem`]s. Adapters report
//! failure through `anyhow::Result`; [`fetch_source`] converts that into a [`FetchOutcome`]
//! so a broken source contributes zero items instead of aborting the run.

pub mod arxiv;
pub mod hacker_news;
pub mod rss;
pub mod text;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use common::SourcesConfig;

/// Normalized record produced by every source adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateItem {
    /// Provenance label, e.g. "Hacker News" or "RSS (TechCrunch)"
    pub source: String,
    pub title: String,
    pub url: String,
    /// Bounded excerpt, or a placeholder when the origin has none
    pub summary: String,
}

impl CandidateItem {
    /// Returns `None` when the title or the URL is blank, so incomplete records never
    /// reach the aggregator.
    pub fn new(
        source: impl Into<String>,
        title: impl Into<String>,
        url: impl Into<String>,
        summary: impl Into<String>,
    ) -> Option<Self> {
        let title = title.into().trim().to_string();
        let url = url.into().trim().to_string();
        if title.is_empty() || url.is_empty() {
            return None;
        }
        Some(Self {
            source: source.into(),
            title,
            url,
            summary: summary.into(),
        })
    }
}

/// Time window a run looks at. Items older than `cutoff` are excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    pub cutoff: DateTime<Utc>,
}

impl FetchWindow {
    pub fn since_hours(now: DateTime<Utc>, hours: i64) -> Self {
        Self {
            cutoff: now - Duration::hours(hours),
        }
    }
}

/// Core trait for source adapters
#[async_trait::async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Short name used in logs and failure reports
    fn name(&self) -> &'static str;

    /// Fetch candidate items published after `window.cutoff`
    async fn fetch(&self, window: &FetchWindow) -> Result<Vec<CandidateItem>>;
}

/// What one adapter contributed to a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Fetched(Vec<CandidateItem>),
    Failed { source: String, reason: String },
}

impl FetchOutcome {
    pub fn items(&self) -> &[CandidateItem] {
        match self {
            FetchOutcome::Fetched(items) => items,
            FetchOutcome::Failed { .. } => &[],
        }
    }

    pub fn into_items(self) -> Vec<CandidateItem> {
        match self {
            FetchOutcome::Fetched(items) => items,
            FetchOutcome::Failed { .. } => Vec::new(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, FetchOutcome::Failed { .. })
    }
}

/// Runs one adapter and contains its failure.
pub async fn fetch_source(adapter: &dyn SourceAdapter, window: &FetchWindow) -> FetchOutcome {
    info!(source = adapter.name(), cutoff = %window.cutoff, "fetching source");
    match adapter.fetch(window).await {
        Ok(items) => {
            info!(source = adapter.name(), count = items.len(), "source fetched");
            FetchOutcome::Fetched(items)
        }
        Err(e) => {
            let reason = format!("{e:#}");
            warn!(source = adapter.name(), error = %reason, "source fetch failed, contributing zero items");
            FetchOutcome::Failed {
                source: adapter.name().to_string(),
                reason,
            }
        }
    }
}

/// The production adapters, in aggregation order: discussion search, papers, feeds.
pub fn default_sources(config: &SourcesConfig, client: Client) -> Vec<Box<dyn SourceAdapter>> {
    vec![
        Box::new(hacker_news::HackerNewsSource::new(client.clone(), config)),
        Box::new(arxiv::ArxivSource::new(client.clone(), config)),
        Box::new(rss::RssSource::new(client, config)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    struct Broken;

    #[async_trait::async_trait]
    impl SourceAdapter for Broken {
        fn name(&self) -> &'static str {
            "Broken"
        }
        async fn fetch(&self, _window: &FetchWindow) -> Result<Vec<CandidateItem>> {
            Err(anyhow::anyhow!("connection refused").context("broken http get()"))
        }
    }

    #[test]
    fn blank_title_or_url_is_rejected() {
        assert!(CandidateItem::new("HN", "  ", "https://x", "N/A").is_none());
        assert!(CandidateItem::new("HN", "Title", "", "N/A").is_none());
        let item = CandidateItem::new("HN", " Title ", "https://x", "N/A").unwrap();
        assert_eq!(item.title, "Title");
    }

    #[test]
    fn window_is_lookback_before_now() {
        let now = Utc.with_ymd_and_hms(2025, 3, 2, 8, 0, 0).unwrap();
        let window = FetchWindow::since_hours(now, 24);
        assert_eq!(window.cutoff, Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap());
    }

    #[tokio::test]
    async fn failing_adapter_becomes_typed_failure() {
        let window = FetchWindow::since_hours(Utc::now(), 24);
        let outcome = fetch_source(&Broken, &window).await;
        assert!(outcome.is_failure());
        assert!(outcome.items().is_empty());
        match outcome {
            FetchOutcome::Failed { source, reason } => {
                assert_eq!(source, "Broken");
                assert!(reason.contains("connection refused"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn default_sources_keep_aggregation_order() {
        let sources = default_sources(&SourcesConfig::default(), Client::new());
        let names: Vec<_> = sources.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["Hacker News", "arXiv", "RSS"]);
    }
}

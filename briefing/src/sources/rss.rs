//! RSS/Atom aggregation over a fixed list of feeds, gated by the keyword filter.

use anyhow::{Context, Result};
use feed_rs::model::{Entry, Feed, Text};
use reqwest::Client;
use tracing::{debug, warn};

use super::text::{collapse_whitespace, excerpt, html_to_text, looks_like_markup};
use super::{CandidateItem, FetchWindow, SourceAdapter};
use crate::ingestion::fetch_and_parse_feed;
use crate::relevance::KeywordFilter;
use common::SourcesConfig;

const SUMMARY_CHARS: usize = 150;
const NO_SUMMARY: &str = "No summary";
/// Label used when a feed does not declare its own title
const GENERIC_FEED_LABEL: &str = "Media";

pub struct RssSource {
    client: Client,
    feeds: Vec<String>,
    filter: KeywordFilter,
    entries_per_feed: usize,
}

impl RssSource {
    /// Filters against the full keyword set (technical ∪ business).
    pub fn new(client: Client, config: &SourcesConfig) -> Self {
        Self {
            client,
            feeds: config.rss_feeds.clone(),
            filter: KeywordFilter::new(config.all_keywords()),
            entries_per_feed: config.rss_entries_per_feed,
        }
    }
}

/// `RSS (Feed Title)`, or `RSS (Media)` for untitled feeds.
pub fn source_label(feed: &Feed) -> String {
    let title = feed
        .title
        .as_ref()
        .map(|t| t.content.trim())
        .filter(|t| !t.is_empty())
        .unwrap_or(GENERIC_FEED_LABEL);
    format!("RSS ({title})")
}

fn entry_link(entry: &Entry) -> Option<String> {
    entry
        .links
        .first()
        .map(|l| l.href.clone())
        .or_else(|| entry.id.starts_with("http").then(|| entry.id.clone()))
}

/// Plain text of an entry summary. RSS descriptions come back typed `text/plain` even when
/// they carry escaped HTML, so markup is detected from the content as well.
fn summary_text(summary: &Text) -> String {
    if summary.content_type.essence_str() == "text/html" || looks_like_markup(&summary.content) {
        html_to_text(&summary.content)
    } else {
        collapse_whitespace(&summary.content)
    }
}

/// Maps the first `per_feed` entries (feeds list newest first) and keeps the relevant ones.
pub fn items_from_feed(feed: &Feed, filter: &KeywordFilter, per_feed: usize) -> Vec<CandidateItem> {
    let label = source_label(feed);
    feed.entries
        .iter()
        .take(per_feed)
        .filter_map(|entry| {
            let title = entry.title.as_ref()?.content.trim().to_string();
            let raw = entry.summary.as_ref().map(|s| s.content.as_str()).unwrap_or_default();
            let summary = entry.summary.as_ref().map(summary_text);
            let relevant = filter.matches_entry(&title, raw)
                || summary.as_deref().is_some_and(|s| filter.matches_entry(&title, s));
            if !relevant {
                debug!(title = %title, "rss entry rejected by keyword filter");
                return None;
            }
            let summary = summary.filter(|s| !s.is_empty());
            let summary = excerpt(summary.as_deref().unwrap_or(NO_SUMMARY), SUMMARY_CHARS);
            CandidateItem::new(label.clone(), title, entry_link(entry)?, summary)
        })
        .collect()
}

#[async_trait::async_trait]
impl SourceAdapter for RssSource {
    fn name(&self) -> &'static str {
        "RSS"
    }

    /// A failing feed is logged and skipped. Only when every feed fails does the adapter
    /// itself report failure.
    async fn fetch(&self, _window: &FetchWindow) -> Result<Vec<CandidateItem>> {
        let mut items = Vec::new();
        let mut failures = Vec::new();

        for url in &self.feeds {
            match fetch_and_parse_feed(&self.client, url)
                .await
                .with_context(|| format!("rss feed {url}"))
            {
                Ok(feed) => items.extend(items_from_feed(&feed, &self.filter, self.entries_per_feed)),
                Err(e) => {
                    warn!(feed = %url, error = %format!("{e:#}"), "rss feed failed, skipping");
                    failures.push(format!("{e:#}"));
                }
            }
        }

        if !self.feeds.is_empty() && failures.len() == self.feeds.len() {
            anyhow::bail!("all {} feeds failed: {}", failures.len(), failures.join("; "));
        }
        Ok(items)
    }
}

//! arXiv papers through the export API (Atom responses, parsed with feed-rs).

use anyhow::{Context, Result};
use chrono::NaiveDate;
use feed_rs::model::{Entry, Feed};
use reqwest::Client;

use super::text::{collapse_whitespace, excerpt};
use super::{CandidateItem, FetchWindow, SourceAdapter};
use crate::ingestion::parse_feed;
use common::SourcesConfig;

pub const SOURCE_LABEL: &str = "arXiv";
const ABSTRACT_CHARS: usize = 200;
const NO_ABSTRACT: &str = "N/A";

/// Searches one subject category using the technical keywords only; business terms are
/// noise in a paper corpus.
pub struct ArxivSource {
    client: Client,
    api_url: String,
    category: String,
    keywords: Vec<String>,
    max_items: usize,
}

impl ArxivSource {
    pub fn new(client: Client, config: &SourcesConfig) -> Self {
        Self {
            client,
            api_url: config.arxiv_api_url.clone(),
            category: config.arxiv_category.clone(),
            keywords: config.technical_keywords.clone(),
            max_items: config.arxiv_max_items,
        }
    }
}

/// `cat:{category} AND ((ti:"k1" OR abs:"k1") OR (ti:"k2" OR abs:"k2") ...)`
pub fn build_search_query(category: &str, keywords: &[String]) -> String {
    let clauses = keywords
        .iter()
        .map(|k| format!("(ti:\"{k}\" OR abs:\"{k}\")"))
        .collect::<Vec<_>>()
        .join(" OR ");
    format!("cat:{category} AND ({clauses})")
}

/// Abstract excerpt: first 200 chars, newlines turned into spaces, ellipsis appended.
pub fn abstract_excerpt(abstract_text: &str) -> String {
    let flat = abstract_text.trim().replace(['\r', '\n'], " ");
    excerpt(&flat, ABSTRACT_CHARS)
}

fn entry_url(entry: &Entry) -> Option<String> {
    if entry.id.starts_with("http") {
        return Some(entry.id.clone());
    }
    entry.links.first().map(|l| l.href.clone())
}

fn entry_to_item(entry: &Entry, cutoff_date: NaiveDate) -> Option<CandidateItem> {
    // The API occasionally returns stale papers even when sorted by date
    let published = entry.published.or(entry.updated)?;
    if published.date_naive() < cutoff_date {
        return None;
    }
    let title = collapse_whitespace(&entry.title.as_ref()?.content);
    let summary = entry
        .summary
        .as_ref()
        .map(|s| s.content.trim())
        .filter(|s| !s.is_empty())
        .map(abstract_excerpt)
        .unwrap_or_else(|| NO_ABSTRACT.to_string());
    CandidateItem::new(SOURCE_LABEL, title, entry_url(entry)?, summary)
}

/// Maps the first `max_items` entries of a response, keeping those published on or after
/// the cutoff date.
pub fn items_from_feed(feed: &Feed, cutoff_date: NaiveDate, max_items: usize) -> Vec<CandidateItem> {
    feed.entries
        .iter()
        .take(max_items)
        .filter_map(|e| entry_to_item(e, cutoff_date))
        .collect()
}

#[async_trait::async_trait]
impl SourceAdapter for ArxivSource {
    fn name(&self) -> &'static str {
        SOURCE_LABEL
    }

    async fn fetch(&self, window: &FetchWindow) -> Result<Vec<CandidateItem>> {
        if self.keywords.is_empty() {
            return Ok(Vec::new());
        }

        let params = [
            ("search_query", build_search_query(&self.category, &self.keywords)),
            ("start", "0".to_string()),
            ("max_results", self.max_items.to_string()),
            ("sortBy", "submittedDate".to_string()),
            ("sortOrder", "descending".to_string()),
        ];

        let bytes = self
            .client
            .get(&self.api_url)
            .query(&params)
            .send()
            .await
            .context("arxiv http get()")?
            .error_for_status()
            .context("arxiv non-2xx")?
            .bytes()
            .await
            .context("failed to read arxiv response body")?;

        let feed = parse_feed(bytes.as_ref()).context("parsing arxiv atom response")?;
        Ok(items_from_feed(&feed, window.cutoff.date_naive(), self.max_items))
    }
}

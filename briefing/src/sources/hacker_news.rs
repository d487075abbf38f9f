//! Hacker News stories through the Algolia search API.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;

use super::{CandidateItem, FetchWindow, SourceAdapter};
use common::SourcesConfig;

pub const SOURCE_LABEL: &str = "Hacker News";
const ITEM_URL_PREFIX: &str = "https://news.ycombinator.com/item?id=";
/// The search API returns no abstract
const NO_SUMMARY: &str = "N/A";

pub struct HackerNewsSource {
    client: Client,
    search_url: String,
    keywords: Vec<String>,
    max_items: usize,
}

impl HackerNewsSource {
    /// Only the first `max_query_keywords` of technical ∪ business go into the query.
    pub fn new(client: Client, config: &SourcesConfig) -> Self {
        let keywords = config
            .all_keywords()
            .into_iter()
            .take(config.max_query_keywords)
            .collect();
        Self {
            client,
            search_url: config.hn_search_url.clone(),
            keywords,
            max_items: config.hn_max_items,
        }
    }
}

/// `"k1" OR "k2" OR ...`
pub fn build_query(keywords: &[String]) -> String {
    keywords
        .iter()
        .map(|k| format!("\"{k}\""))
        .collect::<Vec<_>>()
        .join(" OR ")
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    title: Option<String>,
    url: Option<String>,
    #[serde(rename = "objectID")]
    object_id: Option<String>,
}

fn hit_to_item(hit: Hit) -> Option<CandidateItem> {
    let url = hit
        .url
        .filter(|u| !u.trim().is_empty())
        .or_else(|| hit.object_id.map(|id| format!("{ITEM_URL_PREFIX}{id}")))?;
    CandidateItem::new(SOURCE_LABEL, hit.title?, url, NO_SUMMARY)
}

#[async_trait::async_trait]
impl SourceAdapter for HackerNewsSource {
    fn name(&self) -> &'static str {
        SOURCE_LABEL
    }

    async fn fetch(&self, window: &FetchWindow) -> Result<Vec<CandidateItem>> {
        if self.keywords.is_empty() {
            return Ok(Vec::new());
        }

        let params = [
            ("query", build_query(&self.keywords)),
            ("tags", "story".to_string()),
            ("numericFilters", format!("created_at_i>{}", window.cutoff.timestamp())),
            ("hitsPerPage", self.max_items.to_string()),
        ];

        let response: SearchResponse = self
            .client
            .get(&self.search_url)
            .query(&params)
            .send()
            .await
            .context("hacker news http get()")?
            .error_for_status()
            .context("hacker news non-2xx")?
            .json()
            .await
            .context("failed to parse hacker news response")?;

        Ok(response
            .hits
            .into_iter()
            .take(self.max_items)
            .filter_map(hit_to_item)
            .collect())
    }
}

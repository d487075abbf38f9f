/*!
common/src/lib.rs

Shared configuration types and loaders for Briefing.

This file provides:
- Config data structures (deserialized from TOML, every field defaulted)
- An async loader merging a default file with an override file
- Environment overrides for secrets and deployment-specific endpoints
*/

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable holding the model identifier.
pub const ENV_MODEL: &str = "LLM_MODEL";
/// Older deployments name the model after the Ark endpoint id.
pub const ENV_MODEL_LEGACY: &str = "DOUBAO_ENDPOINT_ID";
/// Environment variable overriding the chat-completion endpoint.
pub const ENV_API_URL: &str = "LLM_API_URL";
/// Environment variable holding the chat webhook.
pub const ENV_WEBHOOK_URL: &str = "WEBHOOK_URL";

/// Reply the model gives when nothing is worth pushing.
pub const DEFAULT_SENTINEL: &str = "今日无高价值更新";

const DEFAULT_PERSONA: &str = "\
Role: CTO of an internet e-commerce and fintech company.
Core focus:
1. **AI in production**: using LLMs and agents to raise customer-service efficiency and improve search and recommendation.
2. **Financial risk control**: new anti-fraud techniques and compliance technology.
3. **Competitor moves**: technical moves by Amazon, Shopify, Stripe and Alipay.";

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Source adapters section: keywords, feeds and upstream endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Technical keywords, used by every source (arXiv uses only these)
    pub technical_keywords: Vec<String>,
    /// Business keywords, used by Hacker News and RSS
    pub business_keywords: Vec<String>,
    /// RSS/Atom feed URLs, fetched in order
    pub rss_feeds: Vec<String>,
    pub hn_search_url: String,
    pub arxiv_api_url: String,
    /// arXiv subject category the paper search is restricted to (e.g. "cs.AI")
    pub arxiv_category: String,
    /// Only the first N keywords go into the Hacker News query to bound URL length
    pub max_query_keywords: usize,
    pub hn_max_items: usize,
    pub arxiv_max_items: usize,
    pub rss_entries_per_feed: usize,
    /// Size of the "since yesterday" window
    pub lookback_hours: i64,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            technical_keywords: strings(&[
                "Large Language Models",
                "Generative AI",
                "AI Agents",
                "RAG",
                "Transformer",
                "Vector Database",
            ]),
            business_keywords: strings(&[
                "E-commerce",
                "Fintech",
                "Online Retail",
                "Fraud Detection",
                "Supply Chain",
                "Personalized Recommendation",
                "Digital Banking",
                "Payment Gateway",
            ]),
            rss_feeds: strings(&[
                "https://techcrunch.com/category/artificial-intelligence/feed/",
                "https://techcrunch.com/category/fintech/feed/",
                "https://techcrunch.com/category/ecommerce/feed/",
                "https://www.infoq.cn/feed",
            ]),
            hn_search_url: "https://hn.algolia.com/api/v1/search_by_date".to_string(),
            arxiv_api_url: "http://export.arxiv.org/api/query".to_string(),
            arxiv_category: "cs.AI".to_string(),
            max_query_keywords: 5,
            hn_max_items: 5,
            arxiv_max_items: 5,
            rss_entries_per_feed: 3,
            lookback_hours: 24,
        }
    }
}

impl SourcesConfig {
    /// Technical keywords followed by business keywords.
    pub fn all_keywords(&self) -> Vec<String> {
        self.technical_keywords
            .iter()
            .chain(self.business_keywords.iter())
            .cloned()
            .collect()
    }
}

/// Remote LLM config (any OpenAI-compatible chat-completions endpoint)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Full chat-completions URL
    pub api_url: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    /// Resolved from `api_key_env`, never read from or written to TOML
    #[serde(skip)]
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub temperature: f32,
    pub timeout_seconds: u64,
    pub max_tokens: Option<usize>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: "https://ark.cn-beijing.volces.com/api/v3/chat/completions".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            api_key: None,
            model: None,
            temperature: 0.3,
            timeout_seconds: 120,
            max_tokens: None,
        }
    }
}

/// How the sentinel reply is recognized in the model output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentinelMatch {
    /// Report contains the sentinel anywhere
    #[default]
    Contains,
    /// Report (trimmed) equals the sentinel
    Exact,
}

impl SentinelMatch {
    pub fn matches(self, report: &str, sentinel: &str) -> bool {
        match self {
            SentinelMatch::Contains => report.contains(sentinel),
            SentinelMatch::Exact => report.trim() == sentinel,
        }
    }
}

/// Digest composition settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DigestConfig {
    /// Role and priorities injected into every prompt
    pub persona: String,
    /// Language the model writes the digest in
    pub language: String,
    /// Title prefix of the pushed message; the date is appended
    pub title: String,
    pub sentinel: String,
    pub sentinel_match: SentinelMatch,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            persona: DEFAULT_PERSONA.to_string(),
            language: "Simplified Chinese".to_string(),
            title: "📅 CTO Briefing".to_string(),
            sentinel: DEFAULT_SENTINEL.to_string(),
            sentinel_match: SentinelMatch::default(),
        }
    }
}

/// Webhook delivery settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub webhook_url: Option<String>,
    /// Footer note shown under the interactive card
    pub footer: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            footer: "Powered by Briefing".to_string(),
        }
    }
}

/// Outbound HTTP settings shared by the source adapters and the webhook
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_seconds: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 15,
            user_agent: "Briefing/0.1.0".to_string(),
        }
    }
}

/// Top-level application configuration (deserialized from config.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sources: SourcesConfig,
    pub llm: LlmConfig,
    pub digest: DigestConfig,
    pub notify: NotifyConfig,
    pub http: HttpConfig,
}

impl Config {
    /// Load configuration from a TOML file asynchronously.
    ///
    /// Example:
    ///   let cfg = Config::from_file("config.toml").await?;
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = tokio::fs::read_to_string(path.as_ref())
            .await
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let cfg: Config = toml::from_str(&data).context("Failed to parse TOML configuration")?;
        Ok(cfg)
    }

    /// Load configuration with an optional default file and an optional override file.
    /// If both are present, they are merged (override takes precedence). Missing files are
    /// skipped, so with neither present this yields `Config::default()`.
    pub async fn load_with_defaults(default_path: Option<&Path>, override_path: Option<&Path>) -> Result<Self> {
        let mut config_value = toml::Value::Table(toml::map::Map::new());

        for path in [default_path, override_path].into_iter().flatten() {
            if !path.exists() {
                continue;
            }
            let data = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            let val: toml::Value = toml::from_str(&data)
                .with_context(|| format!("Failed to parse configuration: {}", path.display()))?;
            merge_toml(&mut config_value, val);
        }

        let cfg: Config = config_value.try_into().context("Failed to parse merged configuration")?;
        Ok(cfg)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|name| std::env::var(name).ok());
    }

    /// Apply overrides from an arbitrary lookup. Empty values count as unset.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = get(&self.llm.api_key_env) {
            self.llm.api_key = Some(key);
        }
        if let Some(model) = get(ENV_MODEL).or_else(|| get(ENV_MODEL_LEGACY)) {
            self.llm.model = Some(model);
        }
        if let Some(api_url) = get(ENV_API_URL) {
            self.llm.api_url = api_url;
        }
        if let Some(webhook) = get(ENV_WEBHOOK_URL) {
            self.notify.webhook_url = Some(webhook);
        }
    }

    /// Required settings that are absent or unusable, as human-readable names.
    pub fn missing_required(&self) -> Vec<String> {
        let mut missing = Vec::new();
        match self.notify.webhook_url.as_deref() {
            None => missing.push(ENV_WEBHOOK_URL.to_string()),
            Some(raw) if url::Url::parse(raw).is_err() => {
                missing.push(format!("{ENV_WEBHOOK_URL} (not a valid URL)"))
            }
            Some(_) => {}
        }
        if self.llm.model.is_none() {
            missing.push(format!("{ENV_MODEL} (or {ENV_MODEL_LEGACY})"));
        }
        if self.llm.api_key.is_none() {
            missing.push(self.llm.api_key_env.clone());
        }
        missing
    }
}

fn merge_toml(a: &mut toml::Value, b: toml::Value) {
    match (a, b) {
        (toml::Value::Table(a_map), toml::Value::Table(b_map)) => {
            for (k, v) in b_map {
                if let Some(a_val) = a_map.get_mut(&k) {
                    merge_toml(a_val, v);
                } else {
                    a_map.insert(k, v);
                }
            }
        }
        (a_val, b_val) => *a_val = b_val,
    }
}

use tracing::{info, warn};

use crate::llm::{LlmProvider, LlmRequest};
use crate::sources::CandidateItem;
use common::{Config, DigestConfig};

/// Bullet glyphs the chat renderer shows as list markers.
pub const BULLET_GLYPHS: [char; 2] = ['•', '🔹'];

/// Sanitized model narrative. Opaque apart from the sentinel check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestReport(String);

impl DigestReport {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the model answered with the "nothing worth reporting" sentinel.
    pub fn is_nothing_to_report(&self, config: &DigestConfig) -> bool {
        config.sentinel_match.matches(&self.0, &config.sentinel)
    }
}

/// How digest composition ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DigestOutcome {
    /// No candidate items, the model was not called
    NoInput,
    Report(DigestReport),
    /// The model answered with nothing usable after sanitization
    Empty,
    Failed(String),
}

impl DigestOutcome {
    pub fn report(&self) -> Option<&DigestReport> {
        match self {
            DigestOutcome::Report(r) => Some(r),
            _ => None,
        }
    }
}

/// One numbered block per item, in aggregation order.
pub fn render_items(items: &[CandidateItem]) -> String {
    let mut raw = String::new();
    for (idx, item) in items.iter().enumerate() {
        raw.push_str(&format!(
            "{}. [{}] {}\nLink: {}\nSummary: {}\n\n",
            idx + 1,
            item.source,
            item.title,
            item.url,
            item.summary
        ));
    }
    raw
}

/// Full instruction prompt: persona, raw items, task, formatting rules, target layout and
/// the sentinel reply.
pub fn build_prompt(config: &DigestConfig, raw_items: &str) -> String {
    format!(
        r#"You are the Chief Technology Intelligence Officer of my company.

[My background]
{persona}

[Today's raw intelligence]
{raw_items}
[Task]
Review these items from the strategic perspective of a CTO. Apply a strategic filter and discard the noise. Write the digest in {language}.

[Formatting rules: the chat client only renders a small markdown subset]
1. NEVER use markdown heading syntax (#, ##, ###); the client cannot render it.
2. Write every title and key point in **double-asterisk bold** (for example **Title**) instead.
3. Start list items with 🔹 or •.
4. Leave a blank line between sections.

[Target layout]
**🚀 Industry & Business**

**[Title text](link URL)**
• **Signal**: summary goes here...
• **CTO take**: analysis goes here...

**⚡ Tech Frontier**

**[Title text](link URL)**
• **Signal**: summary goes here...
• **CTO take**: analysis goes here...

If everything is noise, reply exactly "{sentinel}"."#,
        persona = config.persona.trim(),
        raw_items = raw_items,
        language = config.language,
        sentinel = config.sentinel,
    )
}

fn is_bullet_line(line: &str) -> bool {
    line.trim_start().starts_with(BULLET_GLYPHS)
}

/// `Title ##` -> `Title`; a `#` glued to a word (`C#`) stays.
fn strip_closing_hashes(text: &str) -> &str {
    let trimmed = text.trim_end();
    let body = trimmed.trim_end_matches('#');
    if body.len() < trimmed.len() && (body.is_empty() || body.ends_with(char::is_whitespace)) {
        body.trim_end()
    } else {
        text
    }
}

/// Drops markdown heading markers the renderer would show literally.
fn strip_heading(line: &str) -> String {
    let indent_len = line.len() - line.trim_start().len();
    let (indent, body) = line.split_at(indent_len);
    let hashes = body.len() - body.trim_start_matches('#').len();
    let rest = &body[hashes..];
    let line = if hashes > 0 && (rest.is_empty() || rest.starts_with(char::is_whitespace)) {
        format!("{indent}{}", strip_closing_hashes(rest.trim_start()))
    } else {
        line.to_string()
    };
    // Any heading token left mid-line
    line.replace("###", "").replace("## ", "")
}

/// Post-processes model output for the chat renderer: heading markup removed, and every
/// bullet line preceded by exactly one blank line unless it opens the text.
pub fn sanitize(text: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    for raw_line in text.replace("\r\n", "\n").split('\n') {
        let line = strip_heading(raw_line);
        if is_bullet_line(&line) {
            if let Some(prev) = out.last() {
                if !prev.trim().is_empty() {
                    out.push(String::new());
                }
            }
        }
        out.push(line);
    }
    out.join("\n").trim().to_string()
}

/// Composes the digest: render, prompt, one completion call, sanitize.
/// Never fails; errors are logged and surface as [`DigestOutcome::Failed`].
pub async fn compose_digest(
    provider: &dyn LlmProvider,
    config: &Config,
    items: &[CandidateItem],
) -> DigestOutcome {
    if items.is_empty() {
        info!("no candidate items, skipping analysis");
        return DigestOutcome::NoInput;
    }

    let prompt = build_prompt(&config.digest, &render_items(items));
    info!(
        items = items.len(),
        prompt_chars = prompt.chars().count(),
        model = config.llm.model.as_deref().unwrap_or("unset"),
        "requesting digest from LLM"
    );

    let request = LlmRequest {
        prompt,
        max_tokens: config.llm.max_tokens,
        temperature: Some(config.llm.temperature),
        timeout_seconds: Some(config.llm.timeout_seconds),
    };

    let response = match provider.generate(request).await {
        Ok(r) => r,
        Err(e) => {
            let reason = format!("{e:#}");
            warn!(error = %reason, "LLM call failed, no digest this run");
            return DigestOutcome::Failed(reason);
        }
    };

    info!(
        model = %response.model,
        prompt_tokens = response.usage.prompt_tokens,
        completion_tokens = response.usage.completion_tokens,
        total_tokens = response.usage.total_tokens,
        "LLM digest received"
    );

    let cleaned = sanitize(&response.content);
    if cleaned.is_empty() {
        warn!("LLM returned an empty digest");
        return DigestOutcome::Empty;
    }
    DigestOutcome::Report(DigestReport::new(cleaned))
}

//! Webhook delivery of the composed digest.
//!
//! Feishu/Lark is the default destination and gets an interactive card; a Slack incoming
//! webhook URL degrades the payload to a single `text` field.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use reqwest::Client;
use serde::Serialize;
use tracing::{info, warn};

use crate::digest::DigestReport;
use common::{Config, DigestConfig};

/// Host marker of Slack incoming webhooks.
pub const SLACK_HOST_MARKER: &str = "hooks.slack.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Feishu,
    Slack,
}

impl Platform {
    pub fn from_webhook_url(url: &str) -> Self {
        if url.contains(SLACK_HOST_MARKER) {
            Platform::Slack
        } else {
            Platform::Feishu
        }
    }
}

/// Per-destination envelope, serialized as the request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NotificationPayload {
    Card(CardMessage),
    Text(TextMessage),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardMessage {
    msg_type: &'static str,
    card: Card,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct Card {
    header: CardHeader,
    elements: Vec<CardElement>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct CardHeader {
    title: CardText,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "tag", rename_all = "snake_case")]
enum CardText {
    PlainText { content: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "tag", rename_all = "snake_case")]
enum CardElement {
    Markdown { content: String },
    Note { elements: Vec<CardText> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextMessage {
    text: String,
}

/// `{prefix} | YYYY-MM-DD`
pub fn digest_title(prefix: &str, date: NaiveDate) -> String {
    format!("{prefix} | {}", date.format("%Y-%m-%d"))
}

pub fn build_payload(platform: Platform, title: &str, report: &DigestReport, footer: &str) -> NotificationPayload {
    match platform {
        Platform::Slack => NotificationPayload::Text(TextMessage {
            text: format!("*{title}*\n\n{}", report.as_str()),
        }),
        Platform::Feishu => NotificationPayload::Card(CardMessage {
            msg_type: "interactive",
            card: Card {
                header: CardHeader {
                    title: CardText::PlainText {
                        content: title.to_string(),
                    },
                },
                elements: vec![
                    CardElement::Markdown {
                        content: report.as_str().to_string(),
                    },
                    CardElement::Note {
                        elements: vec![CardText::PlainText {
                            content: footer.to_string(),
                        }],
                    },
                ],
            },
        }),
    }
}

/// Why nothing was posted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressReason {
    NoReport,
    NothingToReport,
    NoWebhook,
}

/// How delivery ended.
#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryOutcome {
    Suppressed(SuppressReason),
    Delivered,
    /// Dry run: the payload that would have been posted
    DryRun(serde_json::Value),
    Failed(String),
}

pub struct Notifier {
    client: Client,
    webhook_url: Option<String>,
    digest: DigestConfig,
    footer: String,
    dry_run: bool,
}

impl Notifier {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            webhook_url: config.notify.webhook_url.clone(),
            digest: config.digest.clone(),
            footer: config.notify.footer.clone(),
            dry_run: false,
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Posts the report unless it is absent or the sentinel. Never fails: delivery errors are
    /// logged and returned as [`DeliveryOutcome::Failed`].
    pub async fn notify(&self, report: Option<&DigestReport>, today: NaiveDate) -> DeliveryOutcome {
        let Some(report) = report else {
            info!("no digest to push");
            return DeliveryOutcome::Suppressed(SuppressReason::NoReport);
        };
        if report.is_nothing_to_report(&self.digest) {
            info!("no high-value update today, skipping push");
            return DeliveryOutcome::Suppressed(SuppressReason::NothingToReport);
        }
        let Some(url) = self.webhook_url.as_deref() else {
            warn!("webhook URL not configured, digest not pushed");
            return DeliveryOutcome::Suppressed(SuppressReason::NoWebhook);
        };

        let platform = Platform::from_webhook_url(url);
        let title = digest_title(&self.digest.title, today);
        let payload = build_payload(platform, &title, report, &self.footer);

        if self.dry_run {
            let value = serde_json::to_value(&payload).unwrap_or_default();
            info!(platform = ?platform, payload = %value, "dry run, payload not posted");
            return DeliveryOutcome::DryRun(value);
        }

        match self.post(url, platform, &payload).await {
            Ok(()) => {
                info!(platform = ?platform, "digest pushed");
                DeliveryOutcome::Delivered
            }
            Err(e) => {
                let reason = format!("{e:#}");
                warn!(platform = ?platform, error = %reason, "digest push failed");
                DeliveryOutcome::Failed(reason)
            }
        }
    }

    async fn post(&self, url: &str, platform: Platform, payload: &NotificationPayload) -> Result<()> {
        let response = self
            .client
            .post(url)
            .json(payload)
            .send()
            .await
            .context("webhook post")?
            .error_for_status()
            .context("webhook non-2xx")?;

        let body = response.text().await.unwrap_or_default();
        if platform == Platform::Feishu {
            check_feishu_reply(&body)?;
        }
        info!(response = %body, "webhook response");
        Ok(())
    }
}

/// Feishu answers 200 even on logical errors and reports them in a `code` field.
fn check_feishu_reply(body: &str) -> Result<()> {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return Ok(());
    };
    let code = value
        .get("code")
        .or_else(|| value.get("StatusCode"))
        .and_then(|c| c.as_i64())
        .unwrap_or(0);
    if code != 0 {
        let msg = value
            .get("msg")
            .or_else(|| value.get("StatusMessage"))
            .and_then(|m| m.as_str())
            .unwrap_or_default();
        anyhow::bail!("feishu rejected the message (code {}): {}", code, msg);
    }
    Ok(())
}

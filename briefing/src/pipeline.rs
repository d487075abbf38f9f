use chrono::{DateTime, Local, Utc};
use std::sync::Arc;
use tracing::info;

use crate::aggregate::{aggregate, gather};
use crate::digest::{compose_digest, DigestOutcome};
use crate::llm::LlmProvider;
use crate::notify::{DeliveryOutcome, Notifier, SuppressReason};
use crate::sources::{FetchOutcome, FetchWindow, SourceAdapter};
use common::Config;

/// Everything a run did, stage by stage.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub gathered: usize,
    /// `(source, reason)` for each adapter that failed
    pub failed_sources: Vec<(String, String)>,
    pub digest: DigestOutcome,
    pub delivery: DeliveryOutcome,
}

impl RunReport {
    /// Short label of how the run ended, for logs.
    pub fn conclusion(&self) -> &'static str {
        match (&self.digest, &self.delivery) {
            (_, DeliveryOutcome::Delivered) => "delivered",
            (_, DeliveryOutcome::DryRun(_)) => "dry run",
            (_, DeliveryOutcome::Failed(_)) => "delivery failed",
            (DigestOutcome::NoInput, _) => "no items",
            (DigestOutcome::Failed(_), _) => "analysis failed",
            (DigestOutcome::Empty, _) => "empty digest",
            (_, DeliveryOutcome::Suppressed(SuppressReason::NothingToReport)) => "nothing worth reporting",
            (_, DeliveryOutcome::Suppressed(SuppressReason::NoWebhook)) => "no webhook configured",
            (_, DeliveryOutcome::Suppressed(SuppressReason::NoReport)) => "no report",
        }
    }
}

/// One digest run: sources → aggregate → compose → notify, strictly in sequence.
pub struct Pipeline {
    config: Config,
    sources: Vec<Box<dyn SourceAdapter>>,
    llm: Arc<dyn LlmProvider>,
    notifier: Notifier,
}

impl Pipeline {
    pub fn new(
        config: Config,
        sources: Vec<Box<dyn SourceAdapter>>,
        llm: Arc<dyn LlmProvider>,
        notifier: Notifier,
    ) -> Self {
        Self {
            config,
            sources,
            llm,
            notifier,
        }
    }

    pub async fn run(&self, now: DateTime<Utc>) -> RunReport {
        let window = FetchWindow::since_hours(now, self.config.sources.lookback_hours);
        info!(cutoff = %window.cutoff, sources = self.sources.len(), "run started");

        let outcomes = gather(&self.sources, &window).await;
        let failed_sources = outcomes
            .iter()
            .filter_map(|o| match o {
                FetchOutcome::Failed { source, reason } => Some((source.clone(), reason.clone())),
                FetchOutcome::Fetched(_) => None,
            })
            .collect();
        let items = aggregate(outcomes);

        let digest = compose_digest(self.llm.as_ref(), &self.config, &items).await;
        let delivery = match digest.report() {
            Some(report) => {
                let today = now.with_timezone(&Local).date_naive();
                self.notifier.notify(Some(report), today).await
            }
            None => DeliveryOutcome::Suppressed(SuppressReason::NoReport),
        };

        RunReport {
            gathered: items.len(),
            failed_sources,
            digest,
            delivery,
        }
    }
}

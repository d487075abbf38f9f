use tracing::info;

use crate::sources::{fetch_source, CandidateItem, FetchOutcome, FetchWindow, SourceAdapter};

/// Runs every adapter in order, one after the other. Failures stay inside their outcome.
pub async fn gather(sources: &[Box<dyn SourceAdapter>], window: &FetchWindow) -> Vec<FetchOutcome> {
    let mut outcomes = Vec::with_capacity(sources.len());
    for source in sources {
        outcomes.push(fetch_source(source.as_ref(), window).await);
    }
    outcomes
}

/// Concatenates adapter outputs: adapter order first, then each adapter's own order.
/// No cross-source deduplication.
pub fn aggregate(outcomes: Vec<FetchOutcome>) -> Vec<CandidateItem> {
    let all: Vec<CandidateItem> = outcomes.into_iter().flat_map(FetchOutcome::into_items).collect();
    info!(count = all.len(), "aggregated candidate items");
    all
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(source: &str, n: usize) -> Vec<CandidateItem> {
        (0..n)
            .map(|i| CandidateItem {
                source: source.to_string(),
                title: format!("{source} #{i}"),
                url: format!("https://example.com/{source}/{i}"),
                summary: "N/A".to_string(),
            })
            .collect()
    }

    #[test]
    fn concatenation_preserves_order_for_every_shape() {
        for (a, b, c) in [(0, 0, 0), (2, 1, 3), (0, 4, 0), (3, 0, 2), (1, 1, 0)] {
            let (xa, xb, xc) = (items("A", a), items("B", b), items("C", c));
            let expected: Vec<_> = xa.iter().chain(&xb).chain(&xc).cloned().collect();
            let out = aggregate(vec![
                FetchOutcome::Fetched(xa),
                FetchOutcome::Fetched(xb),
                FetchOutcome::Fetched(xc),
            ]);
            assert_eq!(out, expected);
        }
    }

    #[test]
    fn failed_sources_contribute_nothing() {
        let out = aggregate(vec![
            FetchOutcome::Fetched(items("A", 2)),
            FetchOutcome::Failed {
                source: "B".into(),
                reason: "timeout".into(),
            },
            FetchOutcome::Fetched(items("C", 1)),
        ]);
        assert_eq!(out.len(), 3);
        assert_eq!(out[2].source, "C");
    }

    #[test]
    fn duplicates_across_sources_are_kept() {
        let dup = items("A", 1);
        let out = aggregate(vec![FetchOutcome::Fetched(dup.clone()), FetchOutcome::Fetched(dup)]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], out[1]);
    }
}

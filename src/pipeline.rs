// src/pipeline.rs
//! One full monitor pass: fetch -> age/keyword filter -> ledger dedup ->
//! classify -> emit. Data flows strictly forward; the ledger is the only
//! state mutated, and only after a candidate was classified.

use anyhow::{Context, Result};
use std::collections::HashSet;

use crate::classify::RelevanceClassifier;
use crate::config::MonitorConfig;
use crate::filter;
use crate::ingest::{self, types::SourceProvider};
use crate::ledger::SeenLedger;
use crate::reply::ReplyTemplate;
use crate::report::{AcceptedResult, RunReport};

pub async fn run_once(
    cfg: &MonitorConfig,
    provider: &dyn SourceProvider,
    ledger: &mut dyn SeenLedger,
    classifier: &dyn RelevanceClassifier,
    reply: &ReplyTemplate,
    now: u64,
) -> Result<RunReport> {
    // Total fetch failure aborts here, before any ledger mutation.
    let sweep = ingest::fetch_all(provider, &cfg.sources).await?;
    tracing::info!(
        fetched = sweep.items.len(),
        reachable = sweep.reachable,
        failed = sweep.failed,
        "fetch sweep done"
    );

    let mut report = RunReport {
        fetched: sweep.items.len(),
        ..Default::default()
    };

    // Cheap local filters first, then the ledger check. Within-run id dedup
    // guards against the same item surfacing in two listings.
    let mut seen_this_run: HashSet<String> = HashSet::new();
    let mut candidates = Vec::new();
    for item in sweep.items {
        if !filter::keep(&item, now, cfg.max_age_minutes, &cfg.skip_keywords) {
            report.filtered_out += 1;
            continue;
        }
        if ledger.contains(&item.id) || !seen_this_run.insert(item.id.clone()) {
            report.already_seen += 1;
            continue;
        }
        candidates.push(item);
    }

    // Newest first, so the most recent leads top the summary.
    candidates.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    tracing::info!(candidates = candidates.len(), "candidates after filtering");

    // One classification call per candidate; the classifier itself is
    // fail-closed, so this loop never aborts mid-run. Every classified id is
    // marked, whatever the verdict, so it is never reconsidered.
    for item in candidates {
        let verdict = classifier.classify(&item).await;
        report.classified += 1;
        ledger.mark(&item.id);

        tracing::debug!(id = %item.id, relevant = verdict.relevant, reason = %verdict.reason, "classified");
        if verdict.relevant {
            let matched_keywords = filter::matched_highlights(&item, &cfg.highlight_keywords);
            let reply_draft = reply.draft(&item, &verdict);
            report.accepted.push(AcceptedResult {
                item,
                verdict,
                matched_keywords,
                reply_draft,
            });
        }
    }

    ledger.save().context("persisting seen-item ledger")?;
    tracing::info!(
        accepted = report.accepted.len(),
        classified = report.classified,
        filtered = report.filtered_out,
        already_seen = report.already_seen,
        "run complete"
    );

    Ok(report)
}

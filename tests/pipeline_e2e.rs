// tests/pipeline_e2e.rs
// Full pass over a fixed source with a file-backed ledger: accepted results
// land in the JSON output, and a second process-like run (fresh ledger load)
// emits nothing new.

use anyhow::Result;
use async_trait::async_trait;
use reddit_lead_monitor::classify::{MockClassifier, Verdict};
use reddit_lead_monitor::ingest::types::{Item, ItemKind, SourceProvider};
use reddit_lead_monitor::ledger::{FileLedger, SeenLedger};
use reddit_lead_monitor::reply::ReplyTemplate;
use reddit_lead_monitor::report::AcceptedResult;
use reddit_lead_monitor::{pipeline, MonitorConfig, RunOutcome};

const NOW: u64 = 1_756_500_000;

fn cfg(ledger_path: &std::path::Path) -> MonitorConfig {
    let toml = format!(
        r#"
        sources = ["NYCapartments", "astoria"]
        skip_keywords = ["roommate", "sublet"]
        highlight_keywords = ["streeteasy"]
        ledger_path = "{}"
    "#,
        ledger_path.display()
    );
    toml::from_str(&toml).unwrap()
}

fn item(id: &str, age_minutes: u64, title: &str, body: &str) -> Item {
    Item {
        id: id.to_string(),
        kind: ItemKind::Post,
        source: "NYCapartments".to_string(),
        created_at: NOW - age_minutes * 60,
        title: Some(title.to_string()),
        body: body.to_string(),
        author: "hunter1".to_string(),
        permalink: format!("https://reddit.com/r/NYCapartments/{id}"),
        score: 1,
    }
}

struct FixedProvider(Vec<Item>);

#[async_trait]
impl SourceProvider for FixedProvider {
    async fn fetch_recent(&self, source: &str) -> Result<Vec<Item>> {
        // Everything is attributed to the first source; the second one just
        // answers with nothing.
        if source == "NYCapartments" {
            Ok(self.0.clone())
        } else {
            Ok(Vec::new())
        }
    }
    fn name(&self) -> &'static str {
        "fixed"
    }
}

fn mixed_batch() -> Vec<Item> {
    vec![
        // Fresh, relevant: should be accepted.
        item("post_fresh", 5, "ISO 1BR in Astoria", "checking StreetEasy every hour"),
        // Too old: filtered before classification.
        item("post_stale", 30, "ISO apartment", "still hunting"),
        // Denylisted: filtered regardless of age.
        item("post_roommate", 2, "looking for a roommate", ""),
        // Fresh but judged not relevant.
        item("post_prices", 3, "what are rents like in bushwick", ""),
    ]
}

fn classifier() -> MockClassifier {
    MockClassifier::new(Verdict::not_relevant("default"))
        .with_verdict("post_fresh", Verdict::relevant("actively hunting, wants speed"))
        .with_verdict("post_stale", Verdict::relevant("would accept if ever asked"))
}

#[tokio::test]
async fn one_run_accepts_filters_and_persists() {
    let dir = tempfile::tempdir().unwrap();
    let ledger_path = dir.path().join("seen.json");
    let out_path = dir.path().join("relevant_items.json");
    let cfg = cfg(&ledger_path);

    let provider = FixedProvider(mixed_batch());
    let classifier = classifier();
    let mut ledger = FileLedger::load(&ledger_path).unwrap();

    let report = pipeline::run_once(
        &cfg,
        &provider,
        &mut ledger,
        &classifier,
        &ReplyTemplate::fallback(),
        NOW,
    )
    .await
    .unwrap();

    assert_eq!(report.fetched, 4);
    assert_eq!(report.filtered_out, 2); // stale + roommate
    assert_eq!(report.classified, 2); // fresh + prices
    assert_eq!(report.accepted.len(), 1);
    assert_eq!(report.accepted[0].item.id, "post_fresh");
    assert_eq!(report.accepted[0].matched_keywords, vec!["streeteasy"]);
    assert!(report.accepted[0].reply_draft.contains("hunter1"));
    assert_eq!(report.outcome(), RunOutcome::Found(1));

    // The stale item never reached the classifier.
    let calls = classifier.calls.lock().unwrap().clone();
    assert!(!calls.contains(&"post_stale".to_string()));

    // Both classified ids are in the ledger, whatever the verdict.
    assert!(ledger.contains("post_fresh"));
    assert!(ledger.contains("post_prices"));
    assert!(!ledger.contains("post_stale"));

    // Structured output round-trips.
    report.write_json(&out_path).unwrap();
    let json = std::fs::read_to_string(&out_path).unwrap();
    let parsed: Vec<AcceptedResult> = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0].item.id, "post_fresh");
}

#[tokio::test]
async fn rerun_with_unchanged_source_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let ledger_path = dir.path().join("seen.json");
    let cfg = cfg(&ledger_path);

    let first_classifier = classifier();
    {
        let mut ledger = FileLedger::load(&ledger_path).unwrap();
        let report = pipeline::run_once(
            &cfg,
            &FixedProvider(mixed_batch()),
            &mut ledger,
            &first_classifier,
            &ReplyTemplate::fallback(),
            NOW,
        )
        .await
        .unwrap();
        assert_eq!(report.accepted.len(), 1);
    }

    // Second run: fresh ledger load from disk, same source contents.
    let second_classifier = classifier();
    let mut ledger = FileLedger::load(&ledger_path).unwrap();
    let report = pipeline::run_once(
        &cfg,
        &FixedProvider(mixed_batch()),
        &mut ledger,
        &second_classifier,
        &ReplyTemplate::fallback(),
        NOW,
    )
    .await
    .unwrap();

    assert!(report.accepted.is_empty());
    assert_eq!(report.outcome(), RunOutcome::NothingRelevant);
    assert_eq!(second_classifier.call_count(), 0);
}

// src/ingest/mod.rs
pub mod providers;
pub mod types;

use crate::ingest::types::{Item, SourceProvider};
use anyhow::{bail, Result};

/// Normalize text: decode HTML entities, strip tags, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode (Reddit double-escapes selftext/body)
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    static RE_WS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();
    out = out.trim().to_string();

    // 5) Length cap: 1500 chars (classifier input stays bounded)
    if out.chars().count() > 1500 {
        out = out.chars().take(1500).collect();
    }

    out
}

/// Outcome of one fetch sweep across all configured sources.
#[derive(Debug)]
pub struct FetchSweep {
    pub items: Vec<Item>,
    /// Sources that answered, even with zero items.
    pub reachable: usize,
    /// Sources that errored out and were skipped.
    pub failed: usize,
}

/// Fetch all sources once, tolerating per-source failures. A source that
/// cannot be reached contributes zero items; if every source fails the sweep
/// is a run-level error so the caller can abort before touching any state.
pub async fn fetch_all(provider: &dyn SourceProvider, sources: &[String]) -> Result<FetchSweep> {
    if sources.is_empty() {
        bail!("no sources configured");
    }

    let mut items = Vec::new();
    let mut reachable = 0usize;
    let mut failed = 0usize;

    for source in sources {
        match provider.fetch_recent(source).await {
            Ok(mut batch) => {
                tracing::debug!(source = %source, items = batch.len(), "source fetched");
                items.append(&mut batch);
                reachable += 1;
            }
            Err(e) => {
                tracing::warn!(error = ?e, source = %source, provider = provider.name(), "source fetch failed, skipping");
                failed += 1;
            }
        }
    }

    if reachable == 0 {
        bail!("all {} sources failed to respond", sources.len());
    }

    Ok(FetchSweep {
        items,
        reachable,
        failed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::ItemKind;
    use anyhow::anyhow;

    #[test]
    fn normalize_text_strips_tags_and_entities() {
        let s = "  Looking for an <b>apartment</b>&nbsp;&nbsp;in \u{201C}Astoria\u{201D} ";
        let out = normalize_text(s);
        assert_eq!(out, "Looking for an apartment in \"Astoria\"");
    }

    #[test]
    fn normalize_text_caps_length() {
        let s = "x".repeat(4000);
        assert_eq!(normalize_text(&s).chars().count(), 1500);
    }

    struct FlakyProvider;

    #[async_trait::async_trait]
    impl SourceProvider for FlakyProvider {
        async fn fetch_recent(&self, source: &str) -> Result<Vec<Item>> {
            if source == "down" {
                return Err(anyhow!("connection refused"));
            }
            Ok(vec![Item {
                id: format!("post_{source}"),
                kind: ItemKind::Post,
                source: source.to_string(),
                created_at: 0,
                title: Some("t".into()),
                body: "b".into(),
                author: "a".into(),
                permalink: "https://example.test/p".into(),
                score: 1,
            }])
        }
        fn name(&self) -> &'static str {
            "flaky"
        }
    }

    #[tokio::test]
    async fn partial_source_failure_is_tolerated() {
        let sources = vec!["up".to_string(), "down".to_string()];
        let sweep = fetch_all(&FlakyProvider, &sources).await.unwrap();
        assert_eq!(sweep.items.len(), 1);
        assert_eq!(sweep.reachable, 1);
        assert_eq!(sweep.failed, 1);
    }

    #[tokio::test]
    async fn all_sources_down_is_an_error() {
        let sources = vec!["down".to_string()];
        assert!(fetch_all(&FlakyProvider, &sources).await.is_err());
    }
}

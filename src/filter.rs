// src/filter.rs
//! Cheap, deterministic pre-filter: age window + keyword denylist.
//! Runs before the ledger check and the paid classification call.

use crate::ingest::types::Item;

/// Decide whether an item is worth classifying.
///
/// - Items older than `max_age_minutes` are rejected. An item exactly at the
///   boundary is KEPT (rejection is strictly `age > window`); see DESIGN.md.
/// - Items whose title+body contains any skip keyword (case-insensitive
///   substring) are rejected regardless of age.
pub fn keep(item: &Item, now: u64, max_age_minutes: u64, skip_keywords: &[String]) -> bool {
    let age_secs = now.saturating_sub(item.created_at);
    if age_secs > max_age_minutes * 60 {
        return false;
    }

    if !skip_keywords.is_empty() {
        let haystack = item.full_text().to_lowercase();
        for kw in skip_keywords {
            let kw = kw.trim();
            if !kw.is_empty() && haystack.contains(&kw.to_lowercase()) {
                return false;
            }
        }
    }

    true
}

/// Collect highlight keywords present in the item's text. Informational only,
/// surfaced in the report; never a requirement for passing the filter.
pub fn matched_highlights(item: &Item, highlight_keywords: &[String]) -> Vec<String> {
    let haystack = item.full_text().to_lowercase();
    highlight_keywords
        .iter()
        .map(|kw| kw.trim())
        .filter(|kw| !kw.is_empty() && haystack.contains(&kw.to_lowercase()))
        .map(|kw| kw.to_string())
        .collect()
}

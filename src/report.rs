// src/report.rs
//! Result emitter: run-level report, human-readable summary, machine-readable
//! JSON output, and the outcome signal the calling harness keys off.

use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::classify::Verdict;
use crate::ingest::types::Item;

/// A candidate judged relevant, enriched with a drafted reply. The unit
/// handed downstream for human review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceptedResult {
    pub item: Item,
    pub verdict: Verdict,
    /// Highlight keywords found in the text; informational only.
    pub matched_keywords: Vec<String>,
    pub reply_draft: String,
}

/// Everything one run produced, plus counters for diagnostics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunReport {
    pub accepted: Vec<AcceptedResult>,
    pub fetched: usize,
    pub filtered_out: usize,
    pub already_seen: usize,
    pub classified: usize,
}

/// The two clean outcomes the harness distinguishes (hard failure is a third,
/// signaled by an error before a report exists).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    NothingRelevant,
    Found(usize),
}

impl RunOutcome {
    /// Exit-code contract with the cron harness: 0 = nothing relevant,
    /// 1 = relevant items found (harness forwards to the notifier).
    pub fn exit_code(self) -> u8 {
        match self {
            RunOutcome::NothingRelevant => 0,
            RunOutcome::Found(_) => 1,
        }
    }
}

impl RunReport {
    pub fn outcome(&self) -> RunOutcome {
        if self.accepted.is_empty() {
            RunOutcome::NothingRelevant
        } else {
            RunOutcome::Found(self.accepted.len())
        }
    }

    /// Human-readable summary: one block per accepted result, plus counters.
    pub fn render_summary(&self) -> String {
        use std::fmt::Write as _;

        let mut out = String::new();
        if self.accepted.is_empty() {
            let _ = writeln!(out, "No new relevant items found.");
        } else {
            let _ = writeln!(out, "Found {} relevant item(s):", self.accepted.len());
            for r in &self.accepted {
                let it = &r.item;
                let ts = Utc
                    .timestamp_opt(it.created_at as i64, 0)
                    .single()
                    .map(|dt| dt.to_rfc3339())
                    .unwrap_or_else(|| it.created_at.to_string());

                let _ = writeln!(out, "{}", "=".repeat(60));
                let _ = writeln!(out, "[{}] r/{} by u/{} at {}", it.id, it.source, it.author, ts);
                if let Some(title) = it.title.as_deref() {
                    let _ = writeln!(out, "Title: {}", excerpt(title, 100));
                }
                let _ = writeln!(out, "URL: {}", it.permalink);
                let _ = writeln!(out, "Why: {}", r.verdict.reason);
                if !r.matched_keywords.is_empty() {
                    let _ = writeln!(out, "Keywords: {}", r.matched_keywords.join(", "));
                }
                let _ = writeln!(out, "Text: {}", excerpt(&it.body, 200));
                let _ = writeln!(out, "Draft reply: {}", r.reply_draft);
            }
        }
        let _ = write!(
            out,
            "(fetched {}, filtered {}, already seen {}, classified {})",
            self.fetched, self.filtered_out, self.already_seen, self.classified
        );
        out
    }

    /// Write the structured results file, overwritten every run — including
    /// an empty run, so a stale previous result never lingers.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)
                    .with_context(|| format!("creating output dir {}", dir.display()))?;
            }
        }
        let json = serde_json::to_string_pretty(&self.accepted).context("serializing results")?;
        let tmp = path.with_extension("json.tmp");
        let mut f =
            fs::File::create(&tmp).with_context(|| format!("creating {}", tmp.display()))?;
        f.write_all(json.as_bytes())
            .with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, path)
            .with_context(|| format!("renaming results into place at {}", path.display()))?;
        Ok(())
    }
}

fn excerpt(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_chars).collect();
        format!("{cut}...")
    }
}

// src/config.rs
//! Run configuration: loaded once at startup, then passed into the pipeline
//! as an immutable value. No ambient globals.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_CONFIG_PATH: &str = "MONITOR_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/monitor.toml";
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";

fn default_max_age_minutes() -> u64 {
    20
}
fn default_post_limit() -> u32 {
    50
}
fn default_comment_limit() -> u32 {
    100
}
fn default_user_agent() -> String {
    "reddit-lead-monitor/0.1".to_string()
}
fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_ledger_path() -> PathBuf {
    PathBuf::from("state/seen_items.json")
}
fn default_output_path() -> PathBuf {
    PathBuf::from("out/relevant_items.json")
}
fn default_eval_prompt_path() -> PathBuf {
    PathBuf::from("config/eval_prompt.txt")
}
fn default_reply_template_path() -> PathBuf {
    PathBuf::from("config/reply_template.txt")
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    /// Subreddits to poll.
    pub sources: Vec<String>,
    /// Only items younger than this reach the classifier.
    #[serde(default = "default_max_age_minutes")]
    pub max_age_minutes: u64,
    /// Denylist: any hit rejects the item before classification.
    #[serde(default)]
    pub skip_keywords: Vec<String>,
    /// Highlight keywords surfaced in the report; never required to pass.
    #[serde(default)]
    pub highlight_keywords: Vec<String>,
    #[serde(default = "default_post_limit")]
    pub post_limit: u32,
    #[serde(default = "default_comment_limit")]
    pub comment_limit: u32,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_ledger_path")]
    pub ledger_path: PathBuf,
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
    #[serde(default = "default_eval_prompt_path")]
    pub eval_prompt_path: PathBuf,
    #[serde(default = "default_reply_template_path")]
    pub reply_template_path: PathBuf,
}

impl MonitorConfig {
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let cfg: MonitorConfig = toml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load using `$MONITOR_CONFIG_PATH` when set, else the default path.
    pub fn load_default() -> Result<Self> {
        let path = std::env::var(ENV_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self::load_from(&path)
    }

    fn validate(&self) -> Result<()> {
        if self.sources.iter().all(|s| s.trim().is_empty()) {
            bail!("config has no sources to poll");
        }
        if self.max_age_minutes == 0 {
            bail!("max_age_minutes must be at least 1");
        }
        Ok(())
    }

    /// The evaluation prompt handed to the classifier. Collaborator-provided
    /// file; a missing file falls back to a minimal built-in prompt so a
    /// fresh checkout still runs.
    pub fn load_eval_prompt(&self) -> Result<String> {
        match fs::read_to_string(&self.eval_prompt_path) {
            Ok(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
            Ok(_) => Ok(builtin_eval_prompt()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(builtin_eval_prompt()),
            Err(e) => Err(e).with_context(|| {
                format!("reading eval prompt {}", self.eval_prompt_path.display())
            }),
        }
    }
}

fn builtin_eval_prompt() -> String {
    "You screen Reddit posts for FirstMover, an app that sends instant push \
notifications when new apartment listings appear on StreetEasy. Answer for \
one candidate at a time. Reply with exactly one line: 'YES: <short reason>' \
if the author is actively hunting for an apartment and would benefit from \
faster listing alerts, otherwise 'NO: <short reason>'. When in doubt, say NO."
        .to_string()
}

/// Required classifier credential. Missing credential is fatal at startup,
/// before any fetch happens.
pub fn require_openai_key() -> Result<String> {
    match std::env::var(ENV_OPENAI_API_KEY) {
        Ok(k) if !k.trim().is_empty() => Ok(k),
        _ => bail!("missing {} env var (required for classification)", ENV_OPENAI_API_KEY),
    }
}

// src/classify.rs
//! Relevance classification: one external LLM call per candidate, returning a
//! typed verdict. Fail-closed by contract — transport errors and malformed
//! responses become a negative verdict, never a run-aborting error.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::Duration;

use crate::ingest::types::Item;

/// Maximum length of a sanitized verdict reason.
const MAX_REASON_LEN: usize = 200;

/// Classifier output, tied to exactly one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub relevant: bool,
    pub reason: String,
}

impl Verdict {
    pub fn relevant(reason: impl Into<String>) -> Self {
        Self {
            relevant: true,
            reason: sanitize_reason(&reason.into()),
        }
    }

    pub fn not_relevant(reason: impl Into<String>) -> Self {
        Self {
            relevant: false,
            reason: sanitize_reason(&reason.into()),
        }
    }

    /// The verdict used whenever the classifier could not produce a usable
    /// answer. Negative, so failures never surface noise to the operator.
    pub fn fail_closed(why: &str) -> Self {
        Self::not_relevant(format!("fail-closed: {why}"))
    }
}

#[async_trait]
pub trait RelevanceClassifier: Send + Sync {
    /// Judge one candidate. Called at most once per candidate per run.
    async fn classify(&self, item: &Item) -> Verdict;
    fn name(&self) -> &'static str;
}

/// Parse the strict response grammar: `YES: <reason>` or `NO: <reason>`
/// (reason optional, prefix case-insensitive). Anything else is `None`, which
/// callers map to the fail-closed verdict.
pub fn parse_verdict(raw: &str) -> Option<Verdict> {
    let trimmed = raw.trim();
    let (keyword, rest) = match trimmed.split_once(|c| matches!(c, ':' | '.' | '-' | ',')) {
        Some((k, r)) => (k.trim(), r.trim()),
        None => (trimmed, ""),
    };

    match keyword.to_ascii_uppercase().as_str() {
        "YES" => Some(Verdict::relevant(if rest.is_empty() {
            "relevant"
        } else {
            rest
        })),
        "NO" => Some(Verdict::not_relevant(if rest.is_empty() {
            "not relevant"
        } else {
            rest
        })),
        _ => None,
    }
}

/// Ensure ASCII-only, single line, bounded length. Collapses whitespace.
pub fn sanitize_reason(input: &str) -> String {
    let mut out = String::with_capacity(MAX_REASON_LEN);
    let mut prev_space = false;
    for ch in input.chars() {
        let c = match ch {
            '\r' | '\n' | '\t' => ' ',
            c if c.is_ascii() => c,
            _ => ' ',
        };
        if c == ' ' {
            if !prev_space && !out.is_empty() {
                out.push(' ');
            }
            prev_space = true;
        } else {
            out.push(c);
            prev_space = false;
        }
        if out.len() >= MAX_REASON_LEN {
            break;
        }
    }
    out.trim().to_string()
}

/// OpenAI classifier (Chat Completions API). The evaluation prompt describing
/// the product is supplied by the caller; this type owns only the transport.
pub struct OpenAiClassifier {
    http: reqwest::Client,
    api_key: String,
    model: String,
    eval_prompt: String,
    endpoint: String,
}

impl OpenAiClassifier {
    pub fn new(api_key: String, model: &str, eval_prompt: String) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("reddit-lead-monitor/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            api_key,
            model: model.to_string(),
            eval_prompt,
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
        })
    }

    /// Point the classifier at a different endpoint (local stub server).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    async fn fetch_raw(&self, item: &Item) -> anyhow::Result<String> {
        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
            max_tokens: u32,
        }
        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMsg,
        }
        #[derive(Deserialize)]
        struct ChoiceMsg {
            content: String,
        }

        let user = format!(
            "Candidate from r/{} ({:?}):\n{}",
            item.source,
            item.kind,
            item.full_text()
        );
        let req = Req {
            model: &self.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: &self.eval_prompt,
                },
                Msg {
                    role: "user",
                    content: &user,
                },
            ],
            temperature: 0.0,
            max_tokens: 80,
        };

        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await?
            .error_for_status()?;
        let body: Resp = resp.json().await?;
        Ok(body
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl RelevanceClassifier for OpenAiClassifier {
    async fn classify(&self, item: &Item) -> Verdict {
        let raw = match self.fetch_raw(item).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = ?e, id = %item.id, "classifier transport failure");
                return Verdict::fail_closed("transport failure");
            }
        };

        match parse_verdict(&raw) {
            Some(v) => v,
            None => {
                tracing::warn!(id = %item.id, raw = %sanitize_reason(&raw), "unparseable classifier response");
                Verdict::fail_closed("unparseable response")
            }
        }
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

/// Deterministic classifier for tests: verdicts keyed by item id, with a call
/// log so tests can assert at-most-once behavior.
pub struct MockClassifier {
    verdicts: std::collections::HashMap<String, Verdict>,
    default: Verdict,
    pub calls: Mutex<Vec<String>>,
}

impl MockClassifier {
    pub fn new(default: Verdict) -> Self {
        Self {
            verdicts: std::collections::HashMap::new(),
            default,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_verdict(mut self, id: &str, verdict: Verdict) -> Self {
        self.verdicts.insert(id.to_string(), verdict);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("calls mutex poisoned").len()
    }
}

#[async_trait]
impl RelevanceClassifier for MockClassifier {
    async fn classify(&self, item: &Item) -> Verdict {
        self.calls
            .lock()
            .expect("calls mutex poisoned")
            .push(item.id.clone());
        self.verdicts
            .get(&item.id)
            .cloned()
            .unwrap_or_else(|| self.default.clone())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yes_and_no_prefixes_parse() {
        let v = parse_verdict("YES: actively hunting with a budget").unwrap();
        assert!(v.relevant);
        assert_eq!(v.reason, "actively hunting with a budget");

        let v = parse_verdict("no: advice thread, not searching").unwrap();
        assert!(!v.relevant);
        assert_eq!(v.reason, "advice thread, not searching");
    }

    #[test]
    fn bare_keyword_parses_with_default_reason() {
        assert_eq!(parse_verdict("yes").unwrap(), Verdict::relevant("relevant"));
        assert_eq!(
            parse_verdict(" NO ").unwrap(),
            Verdict::not_relevant("not relevant")
        );
    }

    #[test]
    fn anything_else_is_unparseable() {
        assert!(parse_verdict("").is_none());
        assert!(parse_verdict("maybe?").is_none());
        assert!(parse_verdict("The post is about rent prices").is_none());
        assert!(parse_verdict("YESTERDAY: no").is_none());
    }

    #[test]
    fn sanitize_reason_is_single_ascii_line() {
        let out = sanitize_reason("hunting\nfast\t\u{1F600}  listings");
        assert_eq!(out, "hunting fast listings");
        assert!(sanitize_reason(&"x".repeat(500)).len() <= MAX_REASON_LEN);
    }

    #[test]
    fn fail_closed_is_negative() {
        let v = Verdict::fail_closed("transport failure");
        assert!(!v.relevant);
        assert!(v.reason.contains("fail-closed"));
    }
}

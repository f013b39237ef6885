use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::ingest::types::{Item, ItemKind, SourceProvider};

const DEFAULT_BASE_URL: &str = "https://www.reddit.com";

// Reddit listing envelope: {"data": {"children": [{"data": {...}}, ...]}}
#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}
#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
}
#[derive(Debug, Deserialize)]
struct Child {
    data: ChildData,
}
#[derive(Debug, Deserialize)]
struct ChildData {
    #[serde(default)]
    id: String,
    #[serde(default)]
    subreddit: String,
    title: Option<String>,
    // Posts carry selftext, comments carry body.
    selftext: Option<String>,
    body: Option<String>,
    #[serde(default)]
    author: String,
    #[serde(default)]
    permalink: String,
    #[serde(default)]
    created_utc: f64,
    #[serde(default)]
    score: i64,
}

/// Parse one listing payload into Items. Standalone so tests can feed it
/// fixture JSON without any HTTP.
pub fn parse_listing(json: &str, kind: ItemKind, fallback_source: &str) -> Result<Vec<Item>> {
    let listing: Listing = serde_json::from_str(json).context("parsing reddit listing json")?;

    let mut out = Vec::with_capacity(listing.data.children.len());
    for child in listing.data.children {
        let d = child.data;
        if d.id.is_empty() {
            continue;
        }

        let title = match kind {
            ItemKind::Post => d
                .title
                .as_deref()
                .map(crate::ingest::normalize_text)
                .filter(|t| !t.is_empty()),
            ItemKind::Comment => None,
        };
        let body_raw = match kind {
            ItemKind::Post => d.selftext.as_deref().unwrap_or_default(),
            ItemKind::Comment => d.body.as_deref().unwrap_or_default(),
        };
        let body = crate::ingest::normalize_text(body_raw);
        if title.is_none() && body.is_empty() {
            continue;
        }

        let source = if d.subreddit.is_empty() {
            fallback_source.to_string()
        } else {
            d.subreddit
        };

        out.push(Item {
            id: format!("{}_{}", kind.id_prefix(), d.id),
            kind,
            source,
            created_at: d.created_utc.max(0.0) as u64,
            title,
            body,
            author: d.author,
            permalink: format!("https://reddit.com{}", d.permalink),
            score: d.score,
        });
    }
    Ok(out)
}

/// Polls the public Reddit JSON listings for new posts and comments.
pub struct RedditProvider {
    http: reqwest::Client,
    base_url: String,
    post_limit: u32,
    comment_limit: u32,
}

impl RedditProvider {
    pub fn new(user_agent: &str, post_limit: u32, comment_limit: u32) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent.to_string())
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(10))
            .build()
            .context("building reddit http client")?;
        Ok(Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            post_limit,
            comment_limit,
        })
    }

    /// Point the provider at a different host (local stub server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn fetch_listing(&self, source: &str, kind: ItemKind) -> Result<Vec<Item>> {
        let (endpoint, limit) = match kind {
            ItemKind::Post => ("new", self.post_limit),
            ItemKind::Comment => ("comments", self.comment_limit),
        };
        let url = format!(
            "{}/r/{}/{}.json?limit={}",
            self.base_url, source, endpoint, limit
        );

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?
            .error_for_status()
            .with_context(|| format!("GET {url}"))?;
        let body = resp.text().await.with_context(|| format!("GET {url} body"))?;
        parse_listing(&body, kind, source)
    }
}

#[async_trait]
impl SourceProvider for RedditProvider {
    async fn fetch_recent(&self, source: &str) -> Result<Vec<Item>> {
        // Posts and comments are separate listings. One of them failing is
        // tolerable; the source only counts as unreachable when both fail.
        let mut items = Vec::new();
        let mut any_ok = false;
        let mut first_err: Option<anyhow::Error> = None;

        for kind in [ItemKind::Post, ItemKind::Comment] {
            match self.fetch_listing(source, kind).await {
                Ok(mut batch) => {
                    items.append(&mut batch);
                    any_ok = true;
                }
                Err(e) => {
                    tracing::warn!(error = ?e, source = %source, kind = ?kind, "listing fetch failed");
                    first_err = first_err.or(Some(e));
                }
            }
        }

        match (any_ok, first_err) {
            (false, Some(e)) => Err(e),
            _ => Ok(items),
        }
    }

    fn name(&self) -> &'static str {
        "reddit"
    }
}

// src/ingest/types.rs
use anyhow::Result;

/// Whether an item is a top-level submission or a comment under one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Post,
    Comment,
}

impl ItemKind {
    pub fn id_prefix(self) -> &'static str {
        match self {
            ItemKind::Post => "post",
            ItemKind::Comment => "comment",
        }
    }
}

/// A single post or comment fetched from a source. Immutable once built;
/// discarded at the end of the run (only its id survives, in the ledger).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Item {
    /// Prefixed id, e.g. "post_1abc2d" / "comment_k9xyz". Stable per source.
    pub id: String,
    pub kind: ItemKind,
    /// Subreddit name, e.g. "NYCapartments".
    pub source: String,
    /// Unix seconds.
    pub created_at: u64,
    /// Posts carry a title; comments do not.
    pub title: Option<String>,
    /// Normalized body text (selftext for posts, comment body for comments).
    pub body: String,
    pub author: String,
    /// Absolute URL to the item.
    pub permalink: String,
    pub score: i64,
}

impl Item {
    /// Title + body as one haystack for keyword matching and classification.
    pub fn full_text(&self) -> String {
        match self.title.as_deref() {
            Some(t) if !t.is_empty() => format!("{t} {}", self.body),
            _ => self.body.clone(),
        }
    }
}

#[async_trait::async_trait]
pub trait SourceProvider: Send + Sync {
    /// Fetch the most recent posts and comments for one source.
    async fn fetch_recent(&self, source: &str) -> Result<Vec<Item>>;
    fn name(&self) -> &'static str;
}

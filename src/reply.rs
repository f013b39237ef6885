// src/reply.rs
//! Drafted-reply generation for accepted results. The persuasive style text is
//! collaborator-provided (a template file); this module only substitutes
//! placeholders. Drafts are for human review, never posted automatically.

use std::fs;
use std::path::Path;

use crate::classify::Verdict;
use crate::ingest::types::Item;

/// Fallback used when no template file is configured. Deliberately plain; the
/// real persuasive copy lives outside the repo.
const FALLBACK_TEMPLATE: &str = "Hi {author} — saw your post in r/{source}. \
FirstMover sends instant alerts the moment new listings hit StreetEasy, \
which might help here. {permalink}";

/// Supported placeholders: {author}, {source}, {permalink}, {title}, {reason}.
#[derive(Debug, Clone)]
pub struct ReplyTemplate {
    template: String,
}

impl ReplyTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Load the template from a file, falling back to the built-in text when
    /// the file is absent. An unreadable-but-present file is still an error.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        match fs::read_to_string(path) {
            Ok(s) if !s.trim().is_empty() => Ok(Self::new(s.trim().to_string())),
            Ok(_) => Ok(Self::fallback()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::fallback()),
            Err(e) => Err(anyhow::Error::new(e)
                .context(format!("reading reply template {}", path.display()))),
        }
    }

    pub fn fallback() -> Self {
        Self::new(FALLBACK_TEMPLATE)
    }

    pub fn draft(&self, item: &Item, verdict: &Verdict) -> String {
        self.template
            .replace("{author}", &item.author)
            .replace("{source}", &item.source)
            .replace("{permalink}", &item.permalink)
            .replace("{title}", item.title.as_deref().unwrap_or(""))
            .replace("{reason}", &verdict.reason)
    }
}

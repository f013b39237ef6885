// src/ledger.rs
//! Seen-item ledger: the persisted set of ids already processed, used so an
//! item is classified (and surfaced) at most once across runs.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Upper bound on retained ids; oldest marks are dropped first on save.
pub const DEFAULT_LEDGER_CAP: usize = 5000;

pub trait SeenLedger: Send {
    fn contains(&self, id: &str) -> bool;
    /// Record an id as processed. Idempotent.
    fn mark(&mut self, id: &str);
    /// Persist the current set. Must be atomic enough that a crash mid-save
    /// never leaves a half-written store behind.
    fn save(&self) -> Result<()>;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Flat-file ledger: a JSON array of id strings, insertion-ordered so the cap
/// can drop the oldest entries.
#[derive(Debug)]
pub struct FileLedger {
    path: PathBuf,
    order: Vec<String>,
    index: HashSet<String>,
    cap: usize,
}

impl FileLedger {
    /// Load from `path`. A missing file is a first run (empty set). A file
    /// that exists but does not parse is a hard error: proceeding with an
    /// assumed-empty ledger would re-surface every previously seen item.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let order: Vec<String> = match fs::read_to_string(&path) {
            Ok(s) => serde_json::from_str(&s).with_context(|| {
                format!(
                    "ledger file {} is corrupt; refusing to start with an empty ledger (move it aside to reset)",
                    path.display()
                )
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                return Err(e).with_context(|| format!("reading ledger {}", path.display()))
            }
        };

        let index: HashSet<String> = order.iter().cloned().collect();
        Ok(Self {
            path,
            order,
            index,
            cap: DEFAULT_LEDGER_CAP,
        })
    }

    pub fn with_cap(mut self, cap: usize) -> Self {
        self.cap = cap.max(1);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SeenLedger for FileLedger {
    fn contains(&self, id: &str) -> bool {
        self.index.contains(id)
    }

    fn mark(&mut self, id: &str) {
        if self.index.insert(id.to_string()) {
            self.order.push(id.to_string());
        }
    }

    fn save(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)
                    .with_context(|| format!("creating ledger dir {}", dir.display()))?;
            }
        }

        // Keep only the newest `cap` ids to prevent unbounded growth.
        let start = self.order.len().saturating_sub(self.cap);
        let recent = &self.order[start..];
        let json = serde_json::to_string(recent).context("serializing ledger")?;

        let tmp = self.path.with_extension("json.tmp");
        let mut f = fs::File::create(&tmp)
            .with_context(|| format!("creating ledger tmp {}", tmp.display()))?;
        f.write_all(json.as_bytes())
            .with_context(|| format!("writing ledger tmp {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("renaming ledger into place at {}", self.path.display()))?;
        Ok(())
    }

    fn len(&self) -> usize {
        self.order.len()
    }
}

/// In-memory ledger for tests and dry runs.
#[derive(Default)]
pub struct MemoryLedger {
    seen: HashSet<String>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ids<I: IntoIterator<Item = String>>(ids: I) -> Self {
        Self {
            seen: ids.into_iter().collect(),
        }
    }
}

impl SeenLedger for MemoryLedger {
    fn contains(&self, id: &str) -> bool {
        self.seen.contains(id)
    }
    fn mark(&mut self, id: &str) {
        self.seen.insert(id.to_string());
    }
    fn save(&self) -> Result<()> {
        Ok(())
    }
    fn len(&self) -> usize {
        self.seen.len()
    }
}

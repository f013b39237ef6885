// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod classify;
pub mod config;
pub mod filter;
pub mod ingest;
pub mod ledger;
pub mod pipeline;
pub mod reply;
pub mod report;

// ---- Re-exports for stable public API ----
pub use crate::classify::{RelevanceClassifier, Verdict};
pub use crate::config::MonitorConfig;
pub use crate::ingest::types::{Item, ItemKind, SourceProvider};
pub use crate::ledger::{FileLedger, MemoryLedger, SeenLedger};
pub use crate::pipeline::run_once;
pub use crate::report::{AcceptedResult, RunOutcome, RunReport};

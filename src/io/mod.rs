//! IO modules - external system interfaces
//!
//! This module contains all external IO operations:
//! - `store` - SQLite durable store mirroring engine state
//! - `signals` - JSON Lines reader for upstream detection signals

pub mod signals;
pub mod store;

// Re-export commonly used types
pub use signals::{ingest_file, IngestSummary, ShelfSignal};
pub use store::{PersistedState, SqliteStore, StateStore};

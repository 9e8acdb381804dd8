//! Domain models - shelf zones, items, and engine state containers
//!
//! This module contains the canonical data types used throughout the system:
//! - `ZoneDefinition` - a configured vertical band of shelf space
//! - `Item` - per-item sales, interaction and stock counters
//! - `StatureHistory` - bounded FIFO of calibrated stature samples
//! - `InteractionLedger` - item map plus per-zone gaze tallies

pub mod history;
pub mod ledger;
pub mod types;

// Re-export commonly used types at module level
pub use history::StatureHistory;
pub use ledger::InteractionLedger;
pub use types::{ComfortRange, InteractionKind, Item, StockLevel, ZoneDefinition};

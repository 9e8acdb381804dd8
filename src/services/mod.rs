//! Services - scoring, placement, and engine state management
//!
//! This module contains the core business logic services:
//! - `calibration` - Pixel height to stature conversion and outlier band
//! - `scoring` - Comfort range, zone attractiveness, item priority
//! - `placement` - Capacity-constrained item-to-zone allocation
//! - `engine` - Owns engine state and writes every mutation through to storage
//! - `report` - Read-only snapshot for presentation

pub mod calibration;
pub mod engine;
pub mod placement;
pub mod report;
pub mod scoring;

// Re-export commonly used types
pub use calibration::Calibration;
pub use engine::ShelfEngine;
pub use placement::{Placement, ZoneLayout};
pub use report::Report;
pub use scoring::ZoneScore;

//! Zone attractiveness and item priority scoring
//!
//! Zone score = `gaze_weight * gaze_share + (1 - gaze_weight) * ergonomic_fit`
//! - gaze share: zone tally over total tally, uniform when nothing was observed
//! - ergonomic fit: fraction of the zone's height inside the comfort range
//!
//! Scores are per-zone values in [0, 1]; they are not normalized across zones.

use crate::domain::ledger::InteractionLedger;
use crate::domain::types::{ComfortRange, Item, ZoneDefinition};
use serde::Serialize;

/// Eye level as a fraction of stature
const EYE_LEVEL_RATIO: f64 = 0.95;
/// Half-width of the comfort band around eye level (m)
const COMFORT_MARGIN_M: f64 = 0.10;
/// Physical clamps for the comfort band (m)
const COMFORT_FLOOR_M: f64 = 0.5;
const COMFORT_CEILING_M: f64 = 1.8;

/// Boost applied to operator-flagged priority items
pub const PRIORITY_MULTIPLIER: f64 = 1.5;

/// Comfort band for a given stature
pub fn comfort_range_for(height_m: f64) -> ComfortRange {
    let eye_level = height_m * EYE_LEVEL_RATIO;
    ComfortRange {
        lower: COMFORT_FLOOR_M.max(eye_level - COMFORT_MARGIN_M),
        upper: COMFORT_CEILING_M.min(eye_level + COMFORT_MARGIN_M),
    }
}

/// Score breakdown for one zone
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneScore {
    pub zone: String,
    pub gaze: f64,
    pub ergonomic: f64,
    pub score: f64,
}

/// Score every zone, in definition order
pub fn zone_scores(
    zones: &[ZoneDefinition],
    ledger: &InteractionLedger,
    comfort: ComfortRange,
    gaze_weight: f64,
) -> Vec<ZoneScore> {
    if zones.is_empty() {
        return Vec::new();
    }

    let total_gaze: u64 = zones.iter().map(|z| ledger.gaze(&z.name)).sum();
    let uniform = 1.0 / zones.len() as f64;

    zones
        .iter()
        .map(|zone| {
            let gaze = if total_gaze > 0 {
                ledger.gaze(&zone.name) as f64 / total_gaze as f64
            } else {
                uniform
            };
            let ergonomic = zone.overlap_ratio(comfort.lower, comfort.upper);
            ZoneScore {
                zone: zone.name.clone(),
                gaze,
                ergonomic,
                score: gaze_weight * gaze + (1.0 - gaze_weight) * ergonomic,
            }
        })
        .collect()
}

/// Weights for item priority
#[derive(Debug, Clone, Copy)]
pub struct PriorityWeights {
    pub sales: f64,
    pub interaction: f64,
}

/// Ranking value for placement; negative when dropoffs outnumber pickups
pub fn item_priority(item: &Item, weights: PriorityWeights, is_priority_item: bool) -> f64 {
    let priority =
        weights.sales * item.sales as f64 + weights.interaction * item.net_interactions() as f64;
    if is_priority_item {
        priority * PRIORITY_MULTIPLIER
    } else {
        priority
    }
}

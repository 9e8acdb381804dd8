//! Shelf optimization report - read-only snapshot for presentation

use crate::domain::types::{ComfortRange, StockLevel};
use crate::io::store::StateStore;
use crate::services::engine::ShelfEngine;
use crate::services::placement::ZoneLayout;
use crate::services::scoring::ZoneScore;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    /// `None` when no stature has been observed yet
    pub average_height: Option<f64>,
    pub history_samples: usize,
    pub comfort_range: ComfortRange,
    /// Definition order
    pub zone_scores: Vec<ZoneScore>,
    /// Best zone first, no priority overrides
    pub layout: Vec<ZoneLayout>,
    pub low_stock_threshold: i64,
    pub low_stock: Vec<StockLevel>,
}

impl Report {
    pub fn build<S: StateStore>(engine: &ShelfEngine<S>) -> Self {
        let threshold = engine.config().low_stock_threshold();
        Self {
            generated_at: Utc::now(),
            average_height: engine.average_height(),
            history_samples: engine.history().len(),
            comfort_range: engine.comfort_range(None),
            zone_scores: engine.zone_scores(),
            layout: engine.optimized_layout(&HashSet::new()),
            low_stock_threshold: threshold,
            low_stock: engine.low_stock(threshold),
        }
    }

    /// Zone scores, highest first
    pub fn ranked_scores(&self) -> Vec<&ZoneScore> {
        let mut ranked: Vec<&ZoneScore> = self.zone_scores.iter().collect();
        ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        ranked
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(50);
        writeln!(f, "{rule}")?;
        writeln!(f, "Smart shelf optimization report")?;
        writeln!(f, "{rule}")?;

        match self.average_height {
            Some(h) => writeln!(
                f,
                "Average customer height: {h:.2} m ({} samples)",
                self.history_samples
            )?,
            None => writeln!(f, "Average customer height: no valid history")?,
        }
        writeln!(
            f,
            "Comfortable gaze range: {:.2}-{:.2} m",
            self.comfort_range.lower, self.comfort_range.upper
        )?;

        writeln!(f)?;
        writeln!(f, "Zone scores:")?;
        for s in self.ranked_scores() {
            writeln!(
                f,
                "  - {}: {:.4} (gaze {:.3}, ergonomic {:.3})",
                s.zone, s.score, s.gaze, s.ergonomic
            )?;
        }

        writeln!(f)?;
        writeln!(f, "Recommended layout:")?;
        if self.layout.is_empty() {
            writeln!(f, "  (no items)")?;
        }
        for zone in &self.layout {
            writeln!(f, "  {}: {}", zone.zone, zone.items.join(", "))?;
        }

        writeln!(f)?;
        writeln!(f, "Low stock (<= {}):", self.low_stock_threshold)?;
        if self.low_stock.is_empty() {
            writeln!(f, "  (none)")?;
        }
        for level in &self.low_stock {
            writeln!(f, "  - {}: {}", level.item_id, level.stock)?;
        }
        Ok(())
    }
}

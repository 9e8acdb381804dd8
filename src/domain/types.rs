//! Shared types for the shelf optimizer

use serde::{Deserialize, Serialize};

/// A named vertical band of shelf space, in meters above the floor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneDefinition {
    pub name: String,
    pub lower: f64,
    pub upper: f64,
}

impl ZoneDefinition {
    pub fn new(name: &str, lower: f64, upper: f64) -> Self {
        Self { name: name.to_string(), lower, upper }
    }

    /// Inclusive on both ends
    #[inline]
    pub fn contains(&self, y: f64) -> bool {
        self.lower <= y && y <= self.upper
    }

    #[inline]
    pub fn span(&self) -> f64 {
        self.upper - self.lower
    }

    /// Fraction of this zone's height covered by `[lower, upper]`
    ///
    /// Zero-height zones score 0.
    pub fn overlap_ratio(&self, lower: f64, upper: f64) -> f64 {
        let span = self.span();
        if span <= 0.0 {
            return 0.0;
        }
        let overlap = (self.upper.min(upper) - self.lower.max(lower)).max(0.0);
        overlap / span
    }
}

/// Customer eye-level comfort band in meters
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ComfortRange {
    pub lower: f64,
    pub upper: f64,
}

/// Per-item sales and interaction counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    pub id: String,
    pub sales: u64,
    pub pickups: u64,
    pub dropoffs: u64,
    /// Negative only when a sale was recorded without stock
    pub current_stock: i64,
    pub position: Option<String>,
}

impl Item {
    #[inline]
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            sales: 0,
            pickups: 0,
            dropoffs: 0,
            current_stock: 0,
            position: None,
        }
    }

    /// Pickups minus dropoffs; negative when customers keep putting it back
    #[inline]
    pub fn net_interactions(&self) -> i64 {
        self.pickups as i64 - self.dropoffs as i64
    }
}

/// Customer handling of an item on the shelf
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionKind {
    Pickup,
    Dropoff,
}

impl InteractionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionKind::Pickup => "pickup",
            InteractionKind::Dropoff => "dropoff",
        }
    }
}

impl std::str::FromStr for InteractionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pickup" => Ok(InteractionKind::Pickup),
            "dropoff" => Ok(InteractionKind::Dropoff),
            other => Err(format!("unknown interaction kind '{other}'")),
        }
    }
}

/// Stock snapshot for one item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockLevel {
    pub item_id: String,
    pub stock: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_contains_inclusive() {
        let zone = ZoneDefinition::new("top", 1.6, 1.8);
        assert!(zone.contains(1.6));
        assert!(zone.contains(1.8));
        assert!(zone.contains(1.7));
        assert!(!zone.contains(1.59));
        assert!(!zone.contains(1.81));
    }

    #[test]
    fn test_overlap_ratio() {
        let zone = ZoneDefinition::new("mid", 1.0, 2.0);
        assert!((zone.overlap_ratio(1.5, 2.5) - 0.5).abs() < 1e-9);
        assert_eq!(zone.overlap_ratio(2.5, 3.0), 0.0);
        assert!((zone.overlap_ratio(0.0, 3.0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_overlap_ratio_zero_span() {
        let zone = ZoneDefinition::new("flat", 1.5, 1.5);
        assert_eq!(zone.overlap_ratio(1.0, 2.0), 0.0);
    }

    #[test]
    fn test_net_interactions_negative() {
        let mut item = Item::new("milk");
        item.pickups = 2;
        item.dropoffs = 5;
        assert_eq!(item.net_interactions(), -3);
    }

    #[test]
    fn test_interaction_kind_from_str() {
        assert_eq!("pickup".parse::<InteractionKind>().unwrap(), InteractionKind::Pickup);
        assert_eq!("dropoff".parse::<InteractionKind>().unwrap(), InteractionKind::Dropoff);
        assert!("throw".parse::<InteractionKind>().is_err());
    }
}

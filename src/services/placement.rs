//! Capacity-constrained item-to-zone placement
//!
//! Greedy single pass: items in descending priority take the highest-scoring
//! zone that still has room. Ties keep zone definition order and item
//! first-reference order (both sorts are stable).

use crate::services::scoring::ZoneScore;
use serde::Serialize;
use std::cmp::Ordering;

/// One recommended assignment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub item_id: String,
    pub zone: String,
}

/// Items recommended for one zone, highest priority first
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZoneLayout {
    pub zone: String,
    pub items: Vec<String>,
}

/// Per-zone slot count; always at least one
#[inline]
pub fn capacity_per_zone(item_count: usize, zone_count: usize) -> usize {
    if zone_count == 0 {
        return 0;
    }
    (item_count / zone_count + 1).max(1)
}

/// Stable descending order; incomparable values keep their input order
fn descending(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// Assign items to zones
///
/// `zone_scores` must be in definition order and `priorities` in item
/// first-reference order. Items that find no free zone are omitted.
pub fn allocate(zone_scores: &[ZoneScore], priorities: &[(&str, f64)]) -> Vec<Placement> {
    if zone_scores.is_empty() {
        return Vec::new();
    }

    let mut zones: Vec<&ZoneScore> = zone_scores.iter().collect();
    zones.sort_by(|a, b| descending(a.score, b.score));

    let mut items: Vec<&(&str, f64)> = priorities.iter().collect();
    items.sort_by(|a, b| descending(a.1, b.1));

    let capacity = capacity_per_zone(items.len(), zones.len());
    let mut assigned = vec![0usize; zones.len()];
    let mut placements = Vec::with_capacity(items.len());

    for (item_id, _) in items {
        if let Some(slot) = assigned.iter().position(|&count| count < capacity) {
            assigned[slot] += 1;
            placements.push(Placement {
                item_id: (*item_id).to_string(),
                zone: zones[slot].zone.clone(),
            });
        }
    }

    placements
}

/// Group placements by zone, zones in descending score order
///
/// Zones with no items are left out.
pub fn group_by_zone(zone_scores: &[ZoneScore], placements: &[Placement]) -> Vec<ZoneLayout> {
    let mut zones: Vec<&ZoneScore> = zone_scores.iter().collect();
    zones.sort_by(|a, b| descending(a.score, b.score));

    zones
        .into_iter()
        .filter_map(|zone| {
            let items: Vec<String> = placements
                .iter()
                .filter(|p| p.zone == zone.zone)
                .map(|p| p.item_id.clone())
                .collect();
            if items.is_empty() {
                None
            } else {
                Some(ZoneLayout { zone: zone.zone.clone(), items })
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(zone: &str, score: f64) -> ZoneScore {
        ZoneScore { zone: zone.to_string(), gaze: score, ergonomic: 0.0, score }
    }

    fn zone_of<'a>(placements: &'a [Placement], item: &str) -> Option<&'a str> {
        placements.iter().find(|p| p.item_id == item).map(|p| p.zone.as_str())
    }

    #[test]
    fn test_capacity_formula() {
        assert_eq!(capacity_per_zone(0, 4), 1);
        assert_eq!(capacity_per_zone(2, 3), 1);
        assert_eq!(capacity_per_zone(4, 4), 2);
        assert_eq!(capacity_per_zone(9, 4), 3);
        assert_eq!(capacity_per_zone(5, 0), 0);
    }

    #[test]
    fn test_highest_priority_gets_best_zone() {
        let zones = vec![score("A", 0.9), score("B", 0.5), score("C", 0.1)];
        let items = vec![("y", 5.0), ("x", 10.0)];

        let placements = allocate(&zones, &items);

        assert_eq!(placements[0], Placement { item_id: "x".into(), zone: "A".into() });
        assert_eq!(placements[1], Placement { item_id: "y".into(), zone: "B".into() });
    }

    #[test]
    fn test_zones_sorted_by_score_not_definition() {
        let zones = vec![score("low", 0.2), score("high", 0.8)];
        let placements = allocate(&zones, &[("only", 1.0)]);
        assert_eq!(zone_of(&placements, "only"), Some("high"));
    }

    #[test]
    fn test_capacity_spills_to_next_zone() {
        let zones = vec![score("A", 0.9), score("B", 0.1)];
        // 3 items / 2 zones -> capacity 2
        let items = vec![("a", 3.0), ("b", 2.0), ("c", 1.0)];

        let placements = allocate(&zones, &items);

        assert_eq!(zone_of(&placements, "a"), Some("A"));
        assert_eq!(zone_of(&placements, "b"), Some("A"));
        assert_eq!(zone_of(&placements, "c"), Some("B"));
    }

    #[test]
    fn test_ties_keep_input_order() {
        let zones = vec![score("A", 0.5), score("B", 0.5), score("C", 0.5)];
        let items = vec![("first", 1.0), ("second", 1.0)];

        let placements = allocate(&zones, &items);

        assert_eq!(zone_of(&placements, "first"), Some("A"));
        assert_eq!(zone_of(&placements, "second"), Some("B"));
    }

    #[test]
    fn test_negative_priority_placed_last() {
        let zones = vec![score("A", 0.9), score("B", 0.5), score("C", 0.1)];
        let items = vec![("rejected", -0.5), ("neutral", 0.0)];

        let placements = allocate(&zones, &items);

        assert_eq!(zone_of(&placements, "neutral"), Some("A"));
        assert_eq!(zone_of(&placements, "rejected"), Some("B"));
    }

    #[test]
    fn test_every_item_assigned() {
        let zones = vec![score("A", 0.4), score("B", 0.3), score("C", 0.2), score("D", 0.1)];
        let ids: Vec<String> = (0..11).map(|i| format!("item{i}")).collect();
        let items: Vec<(&str, f64)> = ids.iter().map(|id| (id.as_str(), 1.0)).collect();

        let placements = allocate(&zones, &items);

        assert_eq!(placements.len(), 11);
    }

    #[test]
    fn test_no_zones_no_placements() {
        assert!(allocate(&[], &[("x", 1.0)]).is_empty());
    }

    #[test]
    fn test_group_by_zone() {
        let zones = vec![score("B", 0.1), score("A", 0.9)];
        let placements = vec![
            Placement { item_id: "x".into(), zone: "A".into() },
            Placement { item_id: "y".into(), zone: "A".into() },
        ];

        let layout = group_by_zone(&zones, &placements);

        assert_eq!(
            layout,
            vec![ZoneLayout { zone: "A".into(), items: vec!["x".into(), "y".into()] }]
        );
    }
}

//! Shelf engine - owns engine state and mirrors every mutation to storage
//!
//! State is the stature history, the interaction ledger (items + gaze tallies)
//! and the immutable configuration. Each mutation updates memory first and then
//! writes through to the store in the same call. A failed write is returned as
//! `EngineError::StorageWrite`; memory is not rolled back.

use crate::domain::history::StatureHistory;
use crate::domain::ledger::InteractionLedger;
use crate::domain::types::{ComfortRange, InteractionKind, Item, StockLevel};
use crate::infra::config::Config;
use crate::infra::error::{EngineError, EngineResult, StoreError};
use crate::io::store::{SqliteStore, StateStore};
use crate::services::calibration::Calibration;
use crate::services::placement::{self, Placement, ZoneLayout};
use crate::services::report::Report;
use crate::services::scoring::{self, PriorityWeights, ZoneScore};
use std::collections::HashSet;
use tracing::{debug, error, info, warn};

/// Log a failed write and convert it into the caller-facing error
fn persist(op: &'static str, result: Result<(), StoreError>) -> EngineResult<()> {
    result.map_err(|e| {
        error!(op = %op, error = %e, "durable_write_failed");
        EngineError::storage_write(op, e)
    })
}

/// Reject a counter update that would overflow, before anything is mutated
fn checked<T>(item_id: &str, field: &'static str, value: Option<T>) -> EngineResult<T> {
    value.ok_or_else(|| {
        warn!(item_id = %item_id, field = %field, "counter_overflow");
        EngineError::CounterOverflow { item_id: item_id.to_string(), field }
    })
}

pub struct ShelfEngine<S: StateStore = SqliteStore> {
    config: Config,
    calibration: Calibration,
    history: StatureHistory,
    ledger: InteractionLedger,
    store: S,
}

impl ShelfEngine<SqliteStore> {
    /// Open the configured SQLite file and load state from it
    pub fn open(config: Config) -> EngineResult<Self> {
        let store = SqliteStore::open(config.db_file()).map_err(EngineError::StorageLoad)?;
        Self::with_store(config, store)
    }
}

impl<S: StateStore> ShelfEngine<S> {
    /// Build an engine over an arbitrary store, loading its persisted state
    ///
    /// Stored references to zones missing from configuration are dropped from
    /// memory with a warning.
    pub fn with_store(config: Config, store: S) -> EngineResult<Self> {
        let capacity = config.history_capacity();

        if config.prune_history_on_start() {
            let removed = store.prune_stature(capacity).map_err(EngineError::StorageLoad)?;
            if removed > 0 {
                info!(removed = %removed, keep = %capacity, "stature_history_pruned");
            }
        }

        let state = store.load(capacity).map_err(EngineError::StorageLoad)?;

        let history = StatureHistory::from_recent(capacity, state.stature);

        let mut ledger = InteractionLedger::new();
        for mut item in state.items {
            if let Some(zone) = item.position.as_deref() {
                if !config.has_zone(zone) {
                    warn!(item_id = %item.id, zone = %zone, "stored_position_unknown_zone");
                    item.position = None;
                }
            }
            ledger.insert(item);
        }
        for (zone, count) in state.gaze {
            if config.has_zone(&zone) {
                ledger.set_gaze(&zone, count);
            } else {
                warn!(zone = %zone, count = %count, "stored_gaze_unknown_zone");
            }
        }

        info!(
            items = %ledger.item_count(),
            stature_samples = %history.len(),
            zones = %config.zones().len(),
            "engine_loaded"
        );

        Ok(Self { calibration: Calibration::from_config(&config), config, history, ledger, store })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn history(&self) -> &StatureHistory {
        &self.history
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Pixel height to meters; 0.0 means no valid measurement
    pub fn calibrate(&self, pixel_height: f64) -> f64 {
        self.calibration.calibrate(pixel_height)
    }

    /// Calibrate and record a stature sample
    ///
    /// Returns the accepted stature, or `None` when the measurement was
    /// invalid or outside the plausible band (nothing is recorded).
    pub fn record_stature(&mut self, pixel_height: f64) -> EngineResult<Option<f64>> {
        let meters = self.calibration.calibrate(pixel_height);
        if !Calibration::is_plausible(meters) {
            debug!(pixel_height = %pixel_height, meters = %meters, "stature_rejected");
            return Ok(None);
        }

        self.history.push(meters);
        persist("record_stature", self.store.append_stature(meters))?;

        debug!(
            pixel_height = %pixel_height,
            meters = %meters,
            samples = %self.history.len(),
            "stature_recorded"
        );
        Ok(Some(meters))
    }

    /// Mean of the stature history, if any samples exist
    pub fn average_height(&self) -> Option<f64> {
        self.history.mean()
    }

    /// Comfortable eye-level band for `height_override`, or the history mean
    pub fn comfort_range(&self, height_override: Option<f64>) -> ComfortRange {
        match height_override.or_else(|| self.history.mean()) {
            Some(height) => scoring::comfort_range_for(height),
            None => {
                let (lower, upper) = self.config.default_comfort_range();
                ComfortRange { lower, upper }
            }
        }
    }

    /// Attribute a gaze sample to the first zone containing it
    ///
    /// Returns the zone name, or `None` when no zone matched (sample dropped).
    pub fn record_gaze(&mut self, y_position: f64) -> EngineResult<Option<String>> {
        let Some(zone) = self.config.zones().iter().find(|z| z.contains(y_position)) else {
            debug!(y = %y_position, "gaze_dropped");
            return Ok(None);
        };

        let count = self.ledger.increment_gaze(&zone.name);
        persist("record_gaze", self.store.save_gaze(&zone.name, count))?;

        debug!(y = %y_position, zone = %zone.name, count = %count, "gaze_recorded");
        Ok(Some(zone.name.clone()))
    }

    pub fn gaze_tally(&self, zone: &str) -> u64 {
        self.ledger.gaze(zone)
    }

    /// Score every configured zone, in definition order
    pub fn zone_scores(&self) -> Vec<ZoneScore> {
        scoring::zone_scores(
            self.config.zones(),
            &self.ledger,
            self.comfort_range(None),
            self.config.gaze_weight(),
        )
    }

    fn priority_weights(&self) -> PriorityWeights {
        PriorityWeights {
            sales: self.config.sales_weight(),
            interaction: self.config.interaction_weight(),
        }
    }

    /// Placement priority; unknown items score as zero-valued items
    pub fn item_priority(&self, item_id: &str, is_priority_item: bool) -> f64 {
        let weights = self.priority_weights();
        match self.ledger.get(item_id) {
            Some(item) => scoring::item_priority(item, weights, is_priority_item),
            None => scoring::item_priority(&Item::new(item_id), weights, is_priority_item),
        }
    }

    /// Recommend a zone for every known item, highest priority first
    ///
    /// Recomputed from current state on every call.
    pub fn recommend_placements(&self, priority_items: &HashSet<String>) -> Vec<Placement> {
        let weights = self.priority_weights();
        let priorities: Vec<(&str, f64)> = self
            .ledger
            .items()
            .iter()
            .map(|item| {
                let boosted = priority_items.contains(&item.id);
                (item.id.as_str(), scoring::item_priority(item, weights, boosted))
            })
            .collect();

        placement::allocate(&self.zone_scores(), &priorities)
    }

    /// Placement recommendation grouped by zone, best zone first
    pub fn optimized_layout(&self, priority_items: &HashSet<String>) -> Vec<ZoneLayout> {
        let scores = self.zone_scores();
        let placements = self.recommend_placements(priority_items);
        placement::group_by_zone(&scores, &placements)
    }

    /// Record a sale: `sales += qty`, `current_stock -= qty`
    ///
    /// Stock may go negative unless `allow_negative_stock` is off, in which
    /// case the sale is refused before anything changes.
    pub fn record_sale(&mut self, item_id: &str, qty: u32) -> EngineResult<()> {
        if !self.config.allow_negative_stock() {
            let available = self.ledger.get(item_id).map_or(0, |item| item.current_stock);
            if available < i64::from(qty) {
                warn!(item_id = %item_id, available = %available, requested = %qty, "sale_refused");
                return Err(EngineError::InsufficientStock {
                    item_id: item_id.to_string(),
                    available,
                    requested: qty,
                });
            }
        }

        let (sales, stock) = match self.ledger.get(item_id) {
            Some(item) => (
                checked(item_id, "sales", item.sales.checked_add(u64::from(qty)))?,
                checked(item_id, "current_stock", item.current_stock.checked_sub(i64::from(qty)))?,
            ),
            None => (u64::from(qty), -i64::from(qty)),
        };

        let item = self.ledger.get_or_create(item_id);
        item.sales = sales;
        item.current_stock = stock;
        persist("record_sale", self.store.save_item(item))?;

        info!(
            item_id = %item_id,
            qty = %qty,
            sales = %item.sales,
            stock = %item.current_stock,
            "sale_recorded"
        );
        if item.current_stock < 0 {
            warn!(item_id = %item_id, stock = %item.current_stock, "stock_negative");
        }
        Ok(())
    }

    /// Add `qty` units to an item's stock
    pub fn restock(&mut self, item_id: &str, qty: u32) -> EngineResult<()> {
        let current = self.ledger.get(item_id).map_or(0, |item| item.current_stock);
        let stock = checked(item_id, "current_stock", current.checked_add(i64::from(qty)))?;

        let item = self.ledger.get_or_create(item_id);
        item.current_stock = stock;
        persist("restock", self.store.save_item(item))?;

        info!(item_id = %item_id, qty = %qty, stock = %item.current_stock, "item_restocked");
        Ok(())
    }

    /// Count a customer pickup or dropoff
    pub fn record_interaction(&mut self, item_id: &str, kind: InteractionKind) -> EngineResult<()> {
        let (field, current) = match (kind, self.ledger.get(item_id)) {
            (InteractionKind::Pickup, Some(item)) => ("pickups", item.pickups),
            (InteractionKind::Dropoff, Some(item)) => ("dropoffs", item.dropoffs),
            (InteractionKind::Pickup, None) => ("pickups", 0),
            (InteractionKind::Dropoff, None) => ("dropoffs", 0),
        };
        let next = checked(item_id, field, current.checked_add(1))?;

        let item = self.ledger.get_or_create(item_id);
        match kind {
            InteractionKind::Pickup => item.pickups = next,
            InteractionKind::Dropoff => item.dropoffs = next,
        }
        persist("record_interaction", self.store.save_item(item))?;

        debug!(
            item_id = %item_id,
            kind = %kind.as_str(),
            pickups = %item.pickups,
            dropoffs = %item.dropoffs,
            "interaction_recorded"
        );
        Ok(())
    }

    /// Overwrite stock and position (initial placement or correction)
    ///
    /// A position naming an unconfigured zone is rejected without mutation.
    pub fn set_item_status(
        &mut self,
        item_id: &str,
        stock: i64,
        position: Option<&str>,
    ) -> EngineResult<()> {
        if let Some(zone) = position {
            if !self.config.has_zone(zone) {
                warn!(item_id = %item_id, zone = %zone, "item_status_unknown_zone");
                return Err(EngineError::UnknownZone(zone.to_string()));
            }
        }

        let item = self.ledger.get_or_create(item_id);
        item.current_stock = stock;
        item.position = position.map(str::to_string);
        persist("set_item_status", self.store.save_item(item))?;

        info!(item_id = %item_id, stock = %stock, position = ?position, "item_status_set");
        Ok(())
    }

    /// Read an item without creating it
    pub fn item(&self, item_id: &str) -> Option<&Item> {
        self.ledger.get(item_id)
    }

    /// All items in first-reference order
    pub fn items(&self) -> &[Item] {
        self.ledger.items()
    }

    pub fn stock_levels(&self) -> Vec<StockLevel> {
        self.ledger.stock_levels()
    }

    pub fn low_stock(&self, threshold: i64) -> Vec<StockLevel> {
        self.ledger.low_stock(threshold)
    }

    /// Read-only snapshot for presentation
    pub fn generate_report(&self) -> Report {
        Report::build(self)
    }
}

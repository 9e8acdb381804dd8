//! Configuration loading from TOML files
//!
//! Config file is selected via:
//! 1. --config <path> command line argument
//! 2. SHELF_CONFIG environment variable
//! 3. Default: config/shelf.toml

use crate::domain::types::ZoneDefinition;
use anyhow::{bail, Context};
use serde::Deserialize;
use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::Path;
use tracing::warn;

const DEFAULT_CONFIG_PATH: &str = "config/shelf.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// SQLite database file mirroring engine state
    #[serde(default = "default_db_file")]
    pub db_file: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { db_file: default_db_file() }
    }
}

fn default_db_file() -> String {
    "smart_shelf.db3".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    /// Stature (m) that produces `reference_pixel_span` pixels
    #[serde(default = "default_reference_height")]
    pub reference_height_m: f64,
    #[serde(default = "default_reference_pixel_span")]
    pub reference_pixel_span: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            reference_height_m: default_reference_height(),
            reference_pixel_span: default_reference_pixel_span(),
        }
    }
}

fn default_reference_height() -> f64 {
    1.75
}

fn default_reference_pixel_span() -> f64 {
    240.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    /// Number of recent stature samples kept in memory
    #[serde(default = "default_history_capacity")]
    pub capacity: usize,
    /// Delete stature rows beyond `capacity` when the store is opened
    #[serde(default)]
    pub prune_on_start: bool,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { capacity: default_history_capacity(), prune_on_start: false }
    }
}

fn default_history_capacity() -> usize {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_gaze_weight")]
    pub gaze_weight: f64,
    #[serde(default = "default_sales_weight")]
    pub sales_weight: f64,
    #[serde(default = "default_interaction_weight")]
    pub interaction_weight: f64,
    /// Comfort range used before any stature has been observed
    #[serde(default = "default_comfort_lower")]
    pub default_comfort_lower: f64,
    #[serde(default = "default_comfort_upper")]
    pub default_comfort_upper: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            gaze_weight: default_gaze_weight(),
            sales_weight: default_sales_weight(),
            interaction_weight: default_interaction_weight(),
            default_comfort_lower: default_comfort_lower(),
            default_comfort_upper: default_comfort_upper(),
        }
    }
}

fn default_gaze_weight() -> f64 {
    0.6
}

fn default_sales_weight() -> f64 {
    0.3
}

fn default_interaction_weight() -> f64 {
    0.1
}

fn default_comfort_lower() -> f64 {
    1.4
}

fn default_comfort_upper() -> f64 {
    1.7
}

#[derive(Debug, Clone, Deserialize)]
pub struct InventoryConfig {
    /// Report lists items at or below this stock
    #[serde(default = "default_low_stock_threshold")]
    pub low_stock_threshold: i64,
    /// Operator restock alerts fire at or below this stock
    #[serde(default = "default_alert_threshold")]
    pub alert_threshold: i64,
    /// Permit sales that drive stock below zero
    #[serde(default = "default_allow_negative_stock")]
    pub allow_negative_stock: bool,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            low_stock_threshold: default_low_stock_threshold(),
            alert_threshold: default_alert_threshold(),
            allow_negative_stock: default_allow_negative_stock(),
        }
    }
}

fn default_low_stock_threshold() -> i64 {
    2
}

fn default_alert_threshold() -> i64 {
    1
}

fn default_allow_negative_stock() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub inventory: InventoryConfig,
    #[serde(default = "default_zones")]
    pub zones: Vec<ZoneDefinition>,
}

/// Four-shelf layout, top to bottom
fn default_zones() -> Vec<ZoneDefinition> {
    vec![
        ZoneDefinition::new("top", 1.6, 1.8),
        ZoneDefinition::new("upper_middle", 1.4, 1.6),
        ZoneDefinition::new("lower_middle", 1.2, 1.4),
        ZoneDefinition::new("bottom", 0.8, 1.2),
    ]
}

/// Immutable configuration shared by every engine component
#[derive(Debug, Clone)]
pub struct Config {
    db_file: String,
    reference_height_m: f64,
    reference_pixel_span: f64,
    history_capacity: usize,
    prune_history_on_start: bool,
    gaze_weight: f64,
    sales_weight: f64,
    interaction_weight: f64,
    default_comfort_lower: f64,
    default_comfort_upper: f64,
    low_stock_threshold: i64,
    alert_threshold: i64,
    allow_negative_stock: bool,
    zones: Vec<ZoneDefinition>,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_file: default_db_file(),
            reference_height_m: default_reference_height(),
            reference_pixel_span: default_reference_pixel_span(),
            history_capacity: default_history_capacity(),
            prune_history_on_start: false,
            gaze_weight: default_gaze_weight(),
            sales_weight: default_sales_weight(),
            interaction_weight: default_interaction_weight(),
            default_comfort_lower: default_comfort_lower(),
            default_comfort_upper: default_comfort_upper(),
            low_stock_threshold: default_low_stock_threshold(),
            alert_threshold: default_alert_threshold(),
            allow_negative_stock: default_allow_negative_stock(),
            zones: default_zones(),
            config_file: "default".to_string(),
        }
    }
}

impl Config {
    /// Determine config file path from an explicit argument or environment
    pub fn resolve_config_path(arg: Option<&str>) -> String {
        if let Some(path) = arg {
            return path.to_string();
        }

        if let Ok(path) = env::var("SHELF_CONFIG") {
            return path;
        }

        DEFAULT_CONFIG_PATH.to_string()
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let toml_config: TomlConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        let config = Self {
            db_file: toml_config.store.db_file,
            reference_height_m: toml_config.camera.reference_height_m,
            reference_pixel_span: toml_config.camera.reference_pixel_span,
            history_capacity: toml_config.history.capacity,
            prune_history_on_start: toml_config.history.prune_on_start,
            gaze_weight: toml_config.scoring.gaze_weight,
            sales_weight: toml_config.scoring.sales_weight,
            interaction_weight: toml_config.scoring.interaction_weight,
            default_comfort_lower: toml_config.scoring.default_comfort_lower,
            default_comfort_upper: toml_config.scoring.default_comfort_upper,
            low_stock_threshold: toml_config.inventory.low_stock_threshold,
            alert_threshold: toml_config.inventory.alert_threshold,
            allow_negative_stock: toml_config.inventory.allow_negative_stock,
            zones: toml_config.zones,
            config_file: path.display().to_string(),
        };

        config
            .validate()
            .with_context(|| format!("Invalid config file {}", path.display()))?;

        Ok(config)
    }

    /// Load configuration - tries TOML file first, falls back to defaults
    pub fn load_from_path(path: &str) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(config_file = %path, error = %format!("{e:#}"), "config_fallback_to_defaults");
                Self::default()
            }
        }
    }

    /// Check the invariants the engine relies on
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.zones.is_empty() {
            bail!("at least one zone must be configured");
        }

        let mut seen = HashSet::new();
        for zone in &self.zones {
            if !seen.insert(zone.name.as_str()) {
                bail!("duplicate zone name '{}'", zone.name);
            }
            if !(zone.lower.is_finite() && zone.upper.is_finite() && zone.lower < zone.upper) {
                bail!(
                    "zone '{}' must have lower < upper (got {} >= {})",
                    zone.name,
                    zone.lower,
                    zone.upper
                );
            }
        }

        if !(0.0..=1.0).contains(&self.gaze_weight) {
            bail!("gaze_weight must be within [0, 1] (got {})", self.gaze_weight);
        }
        if self.history_capacity == 0 {
            bail!("history capacity must be at least 1");
        }
        if !(self.reference_pixel_span.is_finite() && self.reference_pixel_span > 0.0) {
            bail!("reference_pixel_span must be positive (got {})", self.reference_pixel_span);
        }
        if !(self.reference_height_m.is_finite() && self.reference_height_m > 0.0) {
            bail!("reference_height_m must be positive (got {})", self.reference_height_m);
        }
        for (name, weight) in
            [("sales_weight", self.sales_weight), ("interaction_weight", self.interaction_weight)]
        {
            if !weight.is_finite() {
                bail!("{name} must be a finite number (got {weight})");
            }
        }
        if !(self.default_comfort_lower.is_finite()
            && self.default_comfort_upper.is_finite()
            && self.default_comfort_lower <= self.default_comfort_upper)
        {
            bail!("default comfort range lower bound exceeds upper bound");
        }

        Ok(())
    }

    /// Look up a configured zone by name
    pub fn zone(&self, name: &str) -> Option<&ZoneDefinition> {
        self.zones.iter().find(|z| z.name == name)
    }

    pub fn has_zone(&self, name: &str) -> bool {
        self.zone(name).is_some()
    }

    // Getters for all config fields
    pub fn db_file(&self) -> &str {
        &self.db_file
    }

    pub fn reference_height_m(&self) -> f64 {
        self.reference_height_m
    }

    pub fn reference_pixel_span(&self) -> f64 {
        self.reference_pixel_span
    }

    pub fn history_capacity(&self) -> usize {
        self.history_capacity
    }

    pub fn prune_history_on_start(&self) -> bool {
        self.prune_history_on_start
    }

    pub fn gaze_weight(&self) -> f64 {
        self.gaze_weight
    }

    pub fn sales_weight(&self) -> f64 {
        self.sales_weight
    }

    pub fn interaction_weight(&self) -> f64 {
        self.interaction_weight
    }

    pub fn default_comfort_range(&self) -> (f64, f64) {
        (self.default_comfort_lower, self.default_comfort_upper)
    }

    pub fn low_stock_threshold(&self) -> i64 {
        self.low_stock_threshold
    }

    pub fn alert_threshold(&self) -> i64 {
        self.alert_threshold
    }

    pub fn allow_negative_stock(&self) -> bool {
        self.allow_negative_stock
    }

    /// Zones in definition order
    pub fn zones(&self) -> &[ZoneDefinition] {
        &self.zones
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    // Builder methods for tests and embedding
    pub fn with_db_file(mut self, db_file: &str) -> Self {
        self.db_file = db_file.to_string();
        self
    }

    pub fn with_zones(mut self, zones: Vec<ZoneDefinition>) -> Self {
        self.zones = zones;
        self
    }

    pub fn with_gaze_weight(mut self, gaze_weight: f64) -> Self {
        self.gaze_weight = gaze_weight;
        self
    }

    pub fn with_priority_weights(mut self, sales_weight: f64, interaction_weight: f64) -> Self {
        self.sales_weight = sales_weight;
        self.interaction_weight = interaction_weight;
        self
    }

    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    pub fn with_prune_history_on_start(mut self, prune: bool) -> Self {
        self.prune_history_on_start = prune;
        self
    }

    pub fn with_allow_negative_stock(mut self, allow: bool) -> Self {
        self.allow_negative_stock = allow;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.db_file(), "smart_shelf.db3");
        assert_eq!(config.history_capacity(), 30);
        assert_eq!(config.gaze_weight(), 0.6);
        assert_eq!(config.sales_weight(), 0.3);
        assert_eq!(config.interaction_weight(), 0.1);
        assert_eq!(config.default_comfort_range(), (1.4, 1.7));
        assert_eq!(config.low_stock_threshold(), 2);
        assert_eq!(config.alert_threshold(), 1);
        assert!(config.allow_negative_stock());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_zone_order() {
        let config = Config::default();
        let names: Vec<&str> = config.zones().iter().map(|z| z.name.as_str()).collect();
        assert_eq!(names, vec!["top", "upper_middle", "lower_middle", "bottom"]);
    }

    #[test]
    fn test_zone_lookup() {
        let config = Config::default();
        assert!(config.has_zone("top"));
        assert_eq!(config.zone("bottom").map(|z| z.lower), Some(0.8));
        assert!(!config.has_zone("basement"));
    }

    #[test]
    fn test_resolve_config_path_from_arg() {
        assert_eq!(Config::resolve_config_path(Some("config/store_7.toml")), "config/store_7.toml");
    }

    #[test]
    fn test_validate_rejects_inverted_zone() {
        let config = Config::default().with_zones(vec![ZoneDefinition::new("bad", 1.5, 1.2)]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_duplicate_zone() {
        let config = Config::default().with_zones(vec![
            ZoneDefinition::new("a", 1.0, 1.2),
            ZoneDefinition::new("a", 1.2, 1.4),
        ]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_zones() {
        let config = Config::default().with_zones(Vec::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_gaze_weight_out_of_range() {
        assert!(Config::default().with_gaze_weight(1.2).validate().is_err());
        assert!(Config::default().with_gaze_weight(-0.1).validate().is_err());
        assert!(Config::default().with_gaze_weight(1.0).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        assert!(Config::default().with_history_capacity(0).validate().is_err());
    }

    #[test]
    fn test_validate_rejects_non_finite_numbers() {
        let nan_span = Config { reference_pixel_span: f64::NAN, ..Config::default() };
        assert!(nan_span.validate().is_err());

        let inf_height = Config { reference_height_m: f64::INFINITY, ..Config::default() };
        assert!(inf_height.validate().is_err());

        assert!(Config::default().with_priority_weights(f64::NAN, 0.1).validate().is_err());
        assert!(Config::default().with_priority_weights(0.3, f64::INFINITY).validate().is_err());

        let nan_zone = Config::default().with_zones(vec![ZoneDefinition::new("z", f64::NAN, 1.2)]);
        assert!(nan_zone.validate().is_err());
    }
}

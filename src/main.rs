//! Smart shelf optimizer - operator CLI
//!
//! Feeds detection signals into the engine, applies inventory operations and
//! prints reports. Every mutation is persisted before the command returns.
//!
//! Module structure:
//! - `domain/` - Core types (zones, items, stature history, ledger)
//! - `services/` - Scoring, placement, engine, report
//! - `io/` - SQLite store and signal ingestion
//! - `infra/` - Config and errors

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use shelf_optimizer::domain::InteractionKind;
use shelf_optimizer::infra::Config;
use shelf_optimizer::io::ingest_file;
use shelf_optimizer::services::ShelfEngine;
use std::collections::HashSet;
use tracing::info;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

/// Smart shelf optimizer - eye-level zone scoring and item placement
#[derive(Parser, Debug)]
#[command(
    name = "shelf-optimizer",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")"),
    about
)]
struct Args {
    /// Path to TOML configuration file (falls back to SHELF_CONFIG, then config/shelf.toml)
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the optimization report
    Report {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print zone scores in definition order
    Scores,
    /// Recommend item placements
    Place {
        /// Comma-separated items to boost
        #[arg(long, value_delimiter = ',')]
        priority: Vec<String>,
    },
    /// List stock for every item and flag items needing restock
    Stock,
    /// Record a sale (refused when stock is insufficient)
    Sale {
        item: String,
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        qty: u32,
    },
    /// Add stock to an item
    Restock {
        item: String,
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        qty: u32,
    },
    /// Record a customer pickup or dropoff
    Interact { item: String, kind: InteractionKind },
    /// Overwrite an item's stock and shelf position
    SetItem {
        item: String,
        stock: i64,
        #[arg(long)]
        zone: Option<String>,
    },
    /// Record a raw pixel-height measurement
    Height { pixel_height: f64 },
    /// Record a gaze sample at a height in meters
    Gaze { y: f64 },
    /// Ingest a JSON Lines file of detection signals
    Ingest { file: String },
}

fn main() -> anyhow::Result<()> {
    // Initialize structured logging with configurable level via RUST_LOG env var
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_path = Config::resolve_config_path(args.config.as_deref());
    let config = Config::load_from_path(&config_path);

    info!(
        config_file = %config.config_file(),
        db_file = %config.db_file(),
        zones = %config.zones().len(),
        history_capacity = %config.history_capacity(),
        gaze_weight = %config.gaze_weight(),
        "config_loaded"
    );

    let mut engine = ShelfEngine::open(config).context("Failed to start shelf engine")?;

    match args.command {
        Command::Report { json } => {
            let report = engine.generate_report();
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{report}");
            }
        }
        Command::Scores => {
            for s in engine.zone_scores() {
                println!(
                    "{:<16} {:.4}  (gaze {:.3}, ergonomic {:.3})",
                    s.zone, s.score, s.gaze, s.ergonomic
                );
            }
        }
        Command::Place { priority } => {
            let priority: HashSet<String> = priority.into_iter().collect();
            for p in engine.recommend_placements(&priority) {
                let boosted = if priority.contains(&p.item_id) { " *" } else { "" };
                println!("{:<20} -> {}{}", p.item_id, p.zone, boosted);
            }
        }
        Command::Stock => {
            let alert = engine.config().alert_threshold();
            let levels = engine.stock_levels();
            if levels.is_empty() {
                println!("No items recorded");
            }
            for level in &levels {
                let flag = if level.stock <= alert { "  RESTOCK" } else { "" };
                println!("{:<20} {:>5}{}", level.item_id, level.stock, flag);
            }
            let needing = engine.low_stock(alert);
            if needing.is_empty() {
                println!("All items sufficiently stocked");
            } else {
                println!("{} item(s) need restocking", needing.len());
            }
        }
        Command::Sale { item, qty } => {
            let available = engine.item(&item).map_or(0, |i| i.current_stock);
            if available < i64::from(qty) {
                bail!("Insufficient stock for {item} (current stock: {available})");
            }
            engine.record_sale(&item, qty)?;
            println!("Recorded sale of {qty} x {item}");
        }
        Command::Restock { item, qty } => {
            engine.restock(&item, qty)?;
            println!("Restocked {qty} x {item}");
        }
        Command::Interact { item, kind } => {
            engine.record_interaction(&item, kind)?;
            println!("Recorded {} of {item}", kind.as_str());
        }
        Command::SetItem { item, stock, zone } => {
            engine.set_item_status(&item, stock, zone.as_deref())?;
            println!("Set {item}: stock {stock}, zone {}", zone.as_deref().unwrap_or("-"));
        }
        Command::Height { pixel_height } => match engine.record_stature(pixel_height)? {
            Some(meters) => println!("Recorded stature {meters:.2} m"),
            None => println!("Measurement discarded (outside plausible stature band)"),
        },
        Command::Gaze { y } => match engine.record_gaze(y)? {
            Some(zone) => println!("Gaze attributed to {zone} (tally {})", engine.gaze_tally(&zone)),
            None => println!("Gaze at {y:.2} m matched no zone"),
        },
        Command::Ingest { file } => {
            let summary = ingest_file(&mut engine, &file)?;
            println!(
                "{} lines: stature {}/{} accepted, gaze {}/{} attributed, {} interactions, {} skipped",
                summary.lines,
                summary.stature_accepted,
                summary.stature_accepted + summary.stature_rejected,
                summary.gaze_attributed,
                summary.gaze_attributed + summary.gaze_dropped,
                summary.interactions,
                summary.skipped,
            );
        }
    }

    Ok(())
}

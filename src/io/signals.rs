//! Upstream signal ingestion from JSON Lines
//!
//! The detection front end emits one JSON object per line:
//! - `{"kind":"stature","pixel_height":312.0}`
//! - `{"kind":"gaze","y":1.52}`
//! - `{"kind":"pickup","item":"milk"}` / `{"kind":"dropoff","item":"milk"}`
//!
//! Malformed lines are logged and skipped. Storage failures stop ingestion.

use crate::domain::types::InteractionKind;
use crate::infra::error::EngineResult;
use crate::io::store::StateStore;
use crate::services::engine::ShelfEngine;
use anyhow::Context;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShelfSignal {
    Stature { pixel_height: f64 },
    Gaze { y: f64 },
    Pickup { item: String },
    Dropoff { item: String },
}

/// Counts from one ingestion run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub lines: usize,
    pub stature_accepted: usize,
    pub stature_rejected: usize,
    pub gaze_attributed: usize,
    pub gaze_dropped: usize,
    pub interactions: usize,
    pub skipped: usize,
}

/// Apply one signal to the engine, updating the summary
pub fn apply_signal<S: StateStore>(
    engine: &mut ShelfEngine<S>,
    signal: &ShelfSignal,
    summary: &mut IngestSummary,
) -> EngineResult<()> {
    match signal {
        ShelfSignal::Stature { pixel_height } => match engine.record_stature(*pixel_height)? {
            Some(_) => summary.stature_accepted += 1,
            None => summary.stature_rejected += 1,
        },
        ShelfSignal::Gaze { y } => match engine.record_gaze(*y)? {
            Some(_) => summary.gaze_attributed += 1,
            None => summary.gaze_dropped += 1,
        },
        ShelfSignal::Pickup { item } => {
            engine.record_interaction(item, InteractionKind::Pickup)?;
            summary.interactions += 1;
        }
        ShelfSignal::Dropoff { item } => {
            engine.record_interaction(item, InteractionKind::Dropoff)?;
            summary.interactions += 1;
        }
    }
    Ok(())
}

/// Ingest every line from a reader
pub fn ingest_reader<S: StateStore, R: BufRead>(
    engine: &mut ShelfEngine<S>,
    reader: R,
) -> anyhow::Result<IngestSummary> {
    let mut summary = IngestSummary::default();

    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read signal line {}", idx + 1))?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        summary.lines += 1;

        let signal: ShelfSignal = match serde_json::from_str(trimmed) {
            Ok(signal) => signal,
            Err(e) => {
                warn!(line = %(idx + 1), error = %e, "signal_parse_failed");
                summary.skipped += 1;
                continue;
            }
        };

        apply_signal(engine, &signal, &mut summary)
            .with_context(|| format!("Failed to apply signal on line {}", idx + 1))?;
    }

    info!(
        lines = %summary.lines,
        stature_accepted = %summary.stature_accepted,
        stature_rejected = %summary.stature_rejected,
        gaze_attributed = %summary.gaze_attributed,
        gaze_dropped = %summary.gaze_dropped,
        interactions = %summary.interactions,
        skipped = %summary.skipped,
        "signals_ingested"
    );

    Ok(summary)
}

/// Ingest a JSON Lines file
pub fn ingest_file<S: StateStore, P: AsRef<Path>>(
    engine: &mut ShelfEngine<S>,
    path: P,
) -> anyhow::Result<IngestSummary> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open signal file {}", path.display()))?;
    ingest_reader(engine, BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::config::Config;
    use crate::io::store::SqliteStore;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn open_engine(dir: &Path) -> ShelfEngine<SqliteStore> {
        let db = dir.join("signals.db3");
        ShelfEngine::open(Config::default().with_db_file(db.to_str().unwrap())).unwrap()
    }

    #[test]
    fn test_parse_signals() {
        let stature: ShelfSignal =
            serde_json::from_str(r#"{"kind":"stature","pixel_height":240.0}"#).unwrap();
        assert_eq!(stature, ShelfSignal::Stature { pixel_height: 240.0 });

        let pickup: ShelfSignal =
            serde_json::from_str(r#"{"kind":"pickup","item":"milk"}"#).unwrap();
        assert_eq!(pickup, ShelfSignal::Pickup { item: "milk".into() });
    }

    #[test]
    fn test_ingest_reader_counts() {
        let dir = tempdir().unwrap();
        let mut engine = open_engine(dir.path());

        let input = r#"
{"kind":"stature","pixel_height":240.0}
{"kind":"stature","pixel_height":0}
{"kind":"gaze","y":1.7}
{"kind":"gaze","y":3.0}
{"kind":"pickup","item":"milk"}
{"kind":"dropoff","item":"milk"}
not json
{"kind":"teleport"}
"#;

        let summary = ingest_reader(&mut engine, Cursor::new(input)).unwrap();

        assert_eq!(
            summary,
            IngestSummary {
                lines: 8,
                stature_accepted: 1,
                stature_rejected: 1,
                gaze_attributed: 1,
                gaze_dropped: 1,
                interactions: 2,
                skipped: 2,
            }
        );
        assert_eq!(engine.gaze_tally("top"), 1);
        let milk = engine.item("milk").unwrap();
        assert_eq!((milk.pickups, milk.dropoffs), (1, 1));
    }

    #[test]
    fn test_ingest_file_missing() {
        let dir = tempdir().unwrap();
        let mut engine = open_engine(dir.path());
        assert!(ingest_file(&mut engine, dir.path().join("absent.jsonl")).is_err());
    }
}

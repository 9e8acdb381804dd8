//! Durable store - SQLite mirror of engine state
//!
//! The engine is synchronous, so the store owns a current-thread runtime and
//! drives each sqlx statement to completion with `block_on`. One connection is
//! enough: there is exactly one writer.
//!
//! Tables:
//! - `item` - one row per item, full-row upserts (rowid stays stable)
//! - `gaze_tally` - one row per zone
//! - `stature_history` - append-only; the engine keeps only the newest rows

use crate::domain::types::Item;
use crate::infra::error::StoreError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::collections::HashSet;
use std::future::Future;
use std::path::{Path, PathBuf};
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, info, warn};

const REQUIRED_TABLES: [&str; 3] = ["item", "gaze_tally", "stature_history"];

const CREATE_ITEM: &str = r#"
    CREATE TABLE IF NOT EXISTS item (
        item_id       TEXT PRIMARY KEY,
        sales         INTEGER NOT NULL,
        pickups       INTEGER NOT NULL,
        dropoffs      INTEGER NOT NULL,
        current_stock INTEGER NOT NULL,
        position      TEXT NULL
    )
"#;

const CREATE_GAZE_TALLY: &str = r#"
    CREATE TABLE IF NOT EXISTS gaze_tally (
        zone  TEXT PRIMARY KEY,
        count INTEGER NOT NULL
    )
"#;

const CREATE_STATURE_HISTORY: &str = r#"
    CREATE TABLE IF NOT EXISTS stature_history (
        id     INTEGER PRIMARY KEY AUTOINCREMENT,
        height REAL NOT NULL
    )
"#;

/// Engine state as read back from storage
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersistedState {
    /// Items in first-insert order
    pub items: Vec<Item>,
    pub gaze: Vec<(String, u64)>,
    /// Newest stature rows, oldest first
    pub stature: Vec<f64>,
}

/// Persistence seam used by the engine
///
/// Every method is a single atomic statement; the engine calls one right after
/// each in-memory mutation.
pub trait StateStore {
    /// Read persisted state, keeping at most `history_capacity` stature rows
    fn load(&self, history_capacity: usize) -> Result<PersistedState, StoreError>;

    fn save_item(&self, item: &Item) -> Result<(), StoreError>;

    fn save_gaze(&self, zone: &str, count: u64) -> Result<(), StoreError>;

    fn append_stature(&self, meters: f64) -> Result<(), StoreError>;

    /// Delete all but the newest `keep` stature rows, returning rows removed
    fn prune_stature(&self, keep: usize) -> Result<u64, StoreError>;
}

/// File-backed SQLite store
pub struct SqliteStore {
    pool: SqlitePool,
    rt: Runtime,
    path: PathBuf,
    /// True when the schema was (re)created at open time
    fresh: bool,
}

impl SqliteStore {
    /// Open (or create) the database file
    ///
    /// If any required table is missing, the surviving required tables are
    /// dropped and the whole schema is recreated empty.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                    path: parent.display().to_string(),
                    source,
                })?;
            }
        }

        let rt = Builder::new_current_thread().enable_all().build().map_err(StoreError::Runtime)?;
        let options = SqliteConnectOptions::new().filename(&path).create_if_missing(true);
        let pool =
            rt.block_on(SqlitePoolOptions::new().max_connections(1).connect_with(options))?;

        let mut store = Self { pool, rt, path, fresh: false };

        let existing = store.existing_tables()?;
        store.fresh = !REQUIRED_TABLES.iter().all(|table| existing.contains(*table));

        if store.fresh {
            let stale: Vec<&str> =
                REQUIRED_TABLES.iter().copied().filter(|t| existing.contains(*t)).collect();
            if !stale.is_empty() {
                warn!(db_file = %store.path.display(), tables = ?stale, "store_partial_schema_reset");
                store.drop_tables(&stale)?;
            }
            store.create_tables()?;
            info!(db_file = %store.path.display(), "store_created");
        } else {
            info!(db_file = %store.path.display(), "store_opened");
        }

        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_fresh(&self) -> bool {
        self.fresh
    }

    fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.rt.block_on(future)
    }

    fn existing_tables(&self) -> Result<HashSet<String>, StoreError> {
        let names: Vec<String> = self.block_on(
            sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table'")
                .fetch_all(&self.pool),
        )?;
        Ok(names.into_iter().collect())
    }

    fn drop_tables(&self, tables: &[&str]) -> Result<(), StoreError> {
        for table in tables {
            let ddl = format!("DROP TABLE {table}");
            self.block_on(sqlx::query(&ddl).execute(&self.pool))?;
        }
        Ok(())
    }

    fn create_tables(&self) -> Result<(), StoreError> {
        for ddl in [CREATE_ITEM, CREATE_GAZE_TALLY, CREATE_STATURE_HISTORY] {
            self.block_on(sqlx::query(ddl).execute(&self.pool))?;
        }
        Ok(())
    }
}

impl StateStore for SqliteStore {
    fn load(&self, history_capacity: usize) -> Result<PersistedState, StoreError> {
        let item_rows = self.block_on(
            sqlx::query(
                "SELECT item_id, sales, pickups, dropoffs, current_stock, position \
                 FROM item ORDER BY rowid",
            )
            .fetch_all(&self.pool),
        )?;

        let mut items = Vec::with_capacity(item_rows.len());
        for row in item_rows {
            items.push(Item {
                id: row.try_get("item_id")?,
                sales: non_negative("item", "sales", row.try_get("sales")?)?,
                pickups: non_negative("item", "pickups", row.try_get("pickups")?)?,
                dropoffs: non_negative("item", "dropoffs", row.try_get("dropoffs")?)?,
                current_stock: row.try_get("current_stock")?,
                position: row.try_get("position")?,
            });
        }

        let gaze_rows = self.block_on(
            sqlx::query("SELECT zone, count FROM gaze_tally ORDER BY rowid").fetch_all(&self.pool),
        )?;

        let mut gaze = Vec::with_capacity(gaze_rows.len());
        for row in gaze_rows {
            let zone: String = row.try_get("zone")?;
            let count = non_negative("gaze_tally", "count", row.try_get("count")?)?;
            gaze.push((zone, count));
        }

        let limit = i64::try_from(history_capacity).unwrap_or(i64::MAX);
        let mut stature: Vec<f64> = self.block_on(
            sqlx::query_scalar("SELECT height FROM stature_history ORDER BY id DESC LIMIT ?1")
                .bind(limit)
                .fetch_all(&self.pool),
        )?;
        stature.reverse();

        debug!(
            items = %items.len(),
            zones = %gaze.len(),
            stature_samples = %stature.len(),
            "store_loaded"
        );

        Ok(PersistedState { items, gaze, stature })
    }

    fn save_item(&self, item: &Item) -> Result<(), StoreError> {
        self.block_on(
            sqlx::query(
                r#"
                INSERT INTO item (item_id, sales, pickups, dropoffs, current_stock, position)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT(item_id) DO UPDATE SET
                    sales = excluded.sales,
                    pickups = excluded.pickups,
                    dropoffs = excluded.dropoffs,
                    current_stock = excluded.current_stock,
                    position = excluded.position
                "#,
            )
            .bind(&item.id)
            .bind(to_sql_int("sales", item.sales)?)
            .bind(to_sql_int("pickups", item.pickups)?)
            .bind(to_sql_int("dropoffs", item.dropoffs)?)
            .bind(item.current_stock)
            .bind(item.position.as_deref())
            .execute(&self.pool),
        )?;
        Ok(())
    }

    fn save_gaze(&self, zone: &str, count: u64) -> Result<(), StoreError> {
        self.block_on(
            sqlx::query(
                "INSERT INTO gaze_tally (zone, count) VALUES (?1, ?2) \
                 ON CONFLICT(zone) DO UPDATE SET count = excluded.count",
            )
            .bind(zone)
            .bind(to_sql_int("count", count)?)
            .execute(&self.pool),
        )?;
        Ok(())
    }

    fn append_stature(&self, meters: f64) -> Result<(), StoreError> {
        self.block_on(
            sqlx::query("INSERT INTO stature_history (height) VALUES (?1)")
                .bind(meters)
                .execute(&self.pool),
        )?;
        Ok(())
    }

    fn prune_stature(&self, keep: usize) -> Result<u64, StoreError> {
        let keep = i64::try_from(keep).unwrap_or(i64::MAX);
        let result = self.block_on(
            sqlx::query(
                "DELETE FROM stature_history WHERE id NOT IN \
                 (SELECT id FROM stature_history ORDER BY id DESC LIMIT ?1)",
            )
            .bind(keep)
            .execute(&self.pool),
        )?;
        Ok(result.rows_affected())
    }
}

impl Drop for SqliteStore {
    fn drop(&mut self) {
        self.rt.block_on(self.pool.close());
    }
}

fn to_sql_int(column: &'static str, value: u64) -> Result<i64, StoreError> {
    i64::try_from(value).map_err(|_| StoreError::OutOfRange { column, value })
}

fn non_negative(table: &'static str, column: &str, value: i64) -> Result<u64, StoreError> {
    u64::try_from(value).map_err(|_| StoreError::Corrupt {
        table,
        reason: format!("negative {column} ({value})"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn item(id: &str, sales: u64, stock: i64, position: Option<&str>) -> Item {
        Item {
            id: id.to_string(),
            sales,
            pickups: 1,
            dropoffs: 0,
            current_stock: stock,
            position: position.map(str::to_string),
        }
    }

    #[test]
    fn test_open_creates_fresh_store() {
        let dir = tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("shelf.db3")).unwrap();

        assert!(store.is_fresh());
        assert_eq!(store.load(30).unwrap(), PersistedState::default());
    }

    #[test]
    fn test_open_creates_parent_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("shelf.db3");
        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.path(), path.as_path());
        assert!(path.exists());
    }

    #[test]
    fn test_reopen_loads_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shelf.db3");

        {
            let store = SqliteStore::open(&path).unwrap();
            store.save_item(&item("milk", 3, 2, Some("top"))).unwrap();
            store.save_item(&item("bread", 0, 5, None)).unwrap();
            store.save_gaze("top", 7).unwrap();
            store.append_stature(1.71).unwrap();
            store.append_stature(1.65).unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert!(!store.is_fresh());
        let state = store.load(30).unwrap();

        assert_eq!(state.items, vec![item("milk", 3, 2, Some("top")), item("bread", 0, 5, None)]);
        assert_eq!(state.gaze, vec![("top".to_string(), 7)]);
        assert_eq!(state.stature, vec![1.71, 1.65]);
    }

    #[test]
    fn test_upsert_keeps_insert_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shelf.db3");

        {
            let store = SqliteStore::open(&path).unwrap();
            store.save_item(&item("a", 0, 1, None)).unwrap();
            store.save_item(&item("b", 0, 1, None)).unwrap();
            store.save_item(&item("a", 4, 0, Some("bottom"))).unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        let state = store.load(30).unwrap();
        let ids: Vec<&str> = state.items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(state.items[0].sales, 4);
        assert_eq!(state.items[0].position.as_deref(), Some("bottom"));
    }

    #[test]
    fn test_load_keeps_newest_stature_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shelf.db3");

        {
            let store = SqliteStore::open(&path).unwrap();
            for h in [1.5, 1.6, 1.7, 1.8] {
                store.append_stature(h).unwrap();
            }
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.load(2).unwrap().stature, vec![1.7, 1.8]);
    }

    #[test]
    fn test_prune_stature() {
        let dir = tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("shelf.db3")).unwrap();
        for h in [1.5, 1.6, 1.7] {
            store.append_stature(h).unwrap();
        }

        assert_eq!(store.prune_stature(1).unwrap(), 2);
        assert_eq!(store.prune_stature(1).unwrap(), 0);
    }

    #[test]
    fn test_partial_schema_starts_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shelf.db3");

        {
            let store = SqliteStore::open(&path).unwrap();
            store.save_item(&item("milk", 1, 1, None)).unwrap();
            store.block_on(sqlx::query("DROP TABLE gaze_tally").execute(&store.pool)).unwrap();
        }

        {
            let store = SqliteStore::open(&path).unwrap();
            assert!(store.is_fresh());
            assert!(store.load(30).unwrap().items.is_empty());
            store.save_item(&item("bread", 0, 1, None)).unwrap();
        }

        // Rows from before the reset must not come back
        let store = SqliteStore::open(&path).unwrap();
        assert!(!store.is_fresh());
        let ids: Vec<String> = store.load(30).unwrap().items.into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["bread".to_string()]);
    }

    #[test]
    fn test_fresh_store_loads_rows_written_after_open() {
        let dir = tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("shelf.db3")).unwrap();
        assert!(store.is_fresh());

        store.save_item(&item("milk", 1, 4, None)).unwrap();
        store.save_gaze("top", 2).unwrap();

        let state = store.load(30).unwrap();
        assert_eq!(state.items, vec![item("milk", 1, 4, None)]);
        assert_eq!(state.gaze, vec![("top".to_string(), 2)]);
    }

    #[test]
    fn test_open_reports_directory_failure() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        std::fs::write(&blocker, b"x").unwrap();

        let err = SqliteStore::open(blocker.join("sub").join("shelf.db3")).err().unwrap();
        assert!(matches!(err, StoreError::CreateDir { .. }));
    }

    #[test]
    fn test_counter_beyond_sqlite_range_rejected() {
        let dir = tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("shelf.db3")).unwrap();

        let err = store.save_item(&item("milk", u64::MAX, 0, None)).unwrap_err();
        assert!(matches!(err, StoreError::OutOfRange { column: "sales", value: u64::MAX }));
        assert!(store.load(30).unwrap().items.is_empty());

        let err = store.save_gaze("top", u64::MAX).unwrap_err();
        assert!(matches!(err, StoreError::OutOfRange { column: "count", .. }));
    }
}

//! Error types for persistence and engine operations

use thiserror::Error;

/// Failure inside the durable store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] sqlx::Error),

    #[error("failed to start store runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("failed to create store directory {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{column} value {value} does not fit in an sqlite integer")]
    OutOfRange { column: &'static str, value: u64 },

    #[error("corrupt row in {table}: {reason}")]
    Corrupt { table: &'static str, reason: String },
}

/// Result type used by engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Engine-level error surfaced to callers
///
/// Invalid measurements and gaze samples outside every zone are not errors;
/// they are dropped and logged.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A position referenced a zone absent from configuration
    #[error("unknown zone '{0}'")]
    UnknownZone(String),

    /// Sale refused because negative stock is disabled
    #[error("insufficient stock for '{item_id}': available {available}, requested {requested}")]
    InsufficientStock { item_id: String, available: i64, requested: u32 },

    /// Counter update would overflow; nothing was changed
    #[error("{field} of '{item_id}' would overflow")]
    CounterOverflow { item_id: String, field: &'static str },

    /// In-memory state changed but the durable write failed
    #[error("durable write failed during {op}; in-memory state is ahead of storage")]
    StorageWrite {
        op: &'static str,
        #[source]
        source: StoreError,
    },

    /// Startup load failed; the engine must not run on partial state
    #[error("failed to load engine state")]
    StorageLoad(#[source] StoreError),
}

impl EngineError {
    pub fn storage_write(op: &'static str, source: StoreError) -> Self {
        Self::StorageWrite { op, source }
    }
}

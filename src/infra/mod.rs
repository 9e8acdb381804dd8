//! Infrastructure - configuration and error types
//!
//! This module contains infrastructure concerns:
//! - `config` - Application configuration (TOML loading, defaults, validation)
//! - `error` - Store and engine error taxonomy

pub mod config;
pub mod error;

// Re-export commonly used types
pub use config::Config;
pub use error::{EngineError, EngineResult, StoreError};

//! Persistence layer for stylehold
//!
//! Provides:
//! - Hold records (pending, confirmed, released, expired)
//! - Atomic slot claiming and expiry sweeps
//! - Audit log (append-only)

mod audit;
mod sqlite;
mod traits;

pub use audit::*;
pub use sqlite::*;
pub use traits::*;

use stylehold_util::HoldError;
use thiserror::Error;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A stored row no longer parses into its typed form
    #[error("Corrupt hold {id}: {field}: {message}")]
    CorruptHold {
        id: String,
        field: &'static str,
        message: String,
    },

    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

/// Store failures surface to hold callers as `HoldError::StoreError`
impl From<StoreError> for HoldError {
    fn from(e: StoreError) -> Self {
        HoldError::store(e.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

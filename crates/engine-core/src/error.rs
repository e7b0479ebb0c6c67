use crate::cache::CacheKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache storage error: {0}")]
    Storage(#[from] sled::Error),

    #[error("Failed to encode cache entry: {0}")]
    Encode(#[from] bincode::Error),

    #[error("Failed to encode connector entry: {0}")]
    Json(#[from] serde_json::Error),

    /// The key holds an entry of another kind.
    #[error("Cache entry '{key}' is not a {expected:?} entry")]
    WrongKind { key: String, expected: CacheKind },
}

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Audit I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode audit entry: {0}")]
    Json(#[from] serde_json::Error),
}

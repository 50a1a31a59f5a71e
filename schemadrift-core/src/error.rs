// schemadrift-core/src/error.rs
//! Error types shared by the drift engine and its drivers

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DriftError {
    /// A raw index listing record could not be turned into an `IndexDefinition`
    #[error("Invalid index record: {0}")]
    InvalidIndexRecord(String),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Invalid create index statement: {0}")]
    InvalidStatement(String),

    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    #[error("Index not found: {0}")]
    IndexNotFound(String),

    #[error("Index already exists: {0}")]
    IndexExists(String),

    /// Backend failure reported by a `CollectionDriver` implementation
    #[error("Driver error: {0}")]
    Driver(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for DriftError {
    fn from(err: serde_json::Error) -> Self {
        DriftError::Serialization(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, DriftError>;

// schemadrift-core/src/driver/mod.rs
//! Collection driver abstraction
//!
//! The drift engine never talks to a database directly. Everything it needs
//! from one side of the comparison goes through [`CollectionDriver`], which
//! is bound to a single database.
//!
//! ```text
//! CollectionDriver (one database)
//!   ├── MongoDriver (production, schemadrift-cli, official mongodb crate)
//!   └── MemoryDriver (testing and fixtures, in-memory collections)
//! ```

mod filter;
mod memory;

pub use filter::matches_filter;
pub use memory::MemoryDriver;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::index::IndexDefinition;

/// Per-database primitives used by the audit
///
/// Implementations report failures through `DriftError`; the engine decides
/// which of them are fatal. All methods take `&self`: a driver is shared by
/// reference for the whole run and is never used concurrently.
#[async_trait]
pub trait CollectionDriver: Send + Sync {
    /// Database name, used in log lines and report headers
    fn database_name(&self) -> &str;

    /// Collection names in listing order
    async fn list_collections(&self) -> Result<Vec<String>>;

    /// Number of documents in `collection` matching `filter`
    ///
    /// Fails when the filter is rejected or the collection cannot be read.
    async fn count_documents(&self, collection: &str, filter: &Value) -> Result<u64>;

    /// Raw index records as reported by the database, in listing order
    async fn list_indexes(&self, collection: &str) -> Result<Vec<Value>>;

    /// Create `collection` with its default `_id_` index
    ///
    /// Succeeds without change when the collection already exists.
    async fn create_collection(&self, collection: &str) -> Result<()>;

    /// Create `index` on `collection`, passing only the options it carries
    async fn create_index(&self, collection: &str, index: &IndexDefinition) -> Result<()>;

    /// Drop the index called `name` from `collection`
    async fn drop_index(&self, collection: &str, name: &str) -> Result<()>;
}

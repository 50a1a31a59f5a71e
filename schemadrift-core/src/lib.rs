// schemadrift-core/src/lib.rs
// Index drift engine - no database driver dependencies

pub mod audit;
pub mod compare;
pub mod driver;
pub mod error;
pub mod index;
pub mod loader;
pub mod reconcile;
pub mod report;
pub mod statement;

// Public exports
pub use audit::{AuditOptions, AuditSummary, Auditor, CollectionReport};
pub use compare::{
    compare_counts, diff_index, diff_set, CommonIndex, CountComparison, MismatchReason,
    MismatchReport, Property,
};
pub use driver::{CollectionDriver, MemoryDriver};
pub use error::{DriftError, Result};
pub use index::{IndexDefinition, IndexKeyField, KeyPattern};
pub use loader::{load, IndexSet, Side};
pub use reconcile::{
    classify, reconcile, ActionKind, IndexOutcome, IndexStatus, ReconcileOptions, RepairAction,
};

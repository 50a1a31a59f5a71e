// schemadrift-core/src/reconcile.rs
//! Reconciliation engine
//!
//! Turns a [`MismatchReport`] into one [`IndexOutcome`] per index name and,
//! when repair is enabled, brings the target in line with the source:
//!
//! | classification     | repair                          | report only                 |
//! |--------------------|---------------------------------|-----------------------------|
//! | common, match      | nothing                         | "Match"                     |
//! | common, mismatch   | drop target, create from source | reasons                     |
//! | target only        | drop target                     | "Not in Source"             |
//! | source only        | create from source              | "Not in Target" + statement |
//! | source only `_id_` | create the collection           | "Not in Target" + statement |
//!
//! All drops of a collection run before any create, so a create never
//! collides with an index that is about to be dropped. Every action is
//! independent: a failure is logged and recorded, and the remaining actions
//! still run.

use crate::compare::{MismatchReason, MismatchReport};
use crate::driver::CollectionDriver;
use crate::index::IndexDefinition;
use crate::loader::IndexSet;
use crate::statement;

/// Name of the index every collection has on `_id`; it cannot be dropped
pub const ID_INDEX_NAME: &str = "_id_";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Apply drops and creates to the target instead of only reporting
    pub repair: bool,
}

/// Classification of one index name
#[derive(Debug, Clone, PartialEq)]
pub enum IndexStatus {
    Match,
    Mismatch(Vec<MismatchReason>),
    NotInSource,
    /// Missing on the target; carries the statement that would create it
    NotInTarget { statement: String },
}

impl IndexStatus {
    pub fn is_match(&self) -> bool {
        matches!(self, IndexStatus::Match)
    }

    fn needs_drop(&self) -> bool {
        matches!(self, IndexStatus::Mismatch(_) | IndexStatus::NotInSource)
    }

    fn needs_create(&self) -> bool {
        matches!(self, IndexStatus::Mismatch(_) | IndexStatus::NotInTarget { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Drop,
    Create,
    /// Create the missing collection, which brings its `_id_` index with it
    CreateCollection,
}

/// A drop or create issued against the target, with its result
#[derive(Debug, Clone, PartialEq)]
pub struct RepairAction {
    pub kind: ActionKind,
    pub index: String,
    /// `None` on success, the driver's error message otherwise
    pub error: Option<String>,
}

impl RepairAction {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Everything the run found and did for one index name
#[derive(Debug, Clone, PartialEq)]
pub struct IndexOutcome {
    pub name: String,
    pub status: IndexStatus,
    pub actions: Vec<RepairAction>,
}

/// Classify every name of `report` without touching any database
///
/// Outcomes follow report order: common and target-only names in target
/// listing order, then source-only names in source listing order.
pub fn classify(collection: &str, report: &MismatchReport, source: &IndexSet) -> Vec<IndexOutcome> {
    let mut outcomes = Vec::with_capacity(
        report.common.len() + report.target_only.len() + report.source_only.len(),
    );

    for common in &report.common {
        let status = if common.is_match() {
            IndexStatus::Match
        } else {
            IndexStatus::Mismatch(common.reasons.clone())
        };
        outcomes.push(IndexOutcome {
            name: common.name.clone(),
            status,
            actions: Vec::new(),
        });
    }

    for name in &report.target_only {
        outcomes.push(IndexOutcome {
            name: name.clone(),
            status: IndexStatus::NotInSource,
            actions: Vec::new(),
        });
    }

    for name in &report.source_only {
        // source_only names always come from `source`
        let Some(index) = source.get(name) else {
            continue;
        };
        outcomes.push(IndexOutcome {
            name: name.clone(),
            status: IndexStatus::NotInTarget {
                statement: statement::render(collection, index),
            },
            actions: Vec::new(),
        });
    }

    outcomes
}

/// Classify `report` and, if `options.repair` is set, repair the target
pub async fn reconcile(
    target: &dyn CollectionDriver,
    collection: &str,
    report: &MismatchReport,
    source: &IndexSet,
    options: &ReconcileOptions,
) -> Vec<IndexOutcome> {
    let mut outcomes = classify(collection, report, source);
    if !options.repair {
        return outcomes;
    }

    for outcome in outcomes.iter_mut().filter(|o| o.status.needs_drop()) {
        if outcome.name == ID_INDEX_NAME {
            tracing::warn!(collection, "The _id index cannot be dropped, leaving it in place");
            continue;
        }
        let action = drop_index(target, collection, &outcome.name).await;
        outcome.actions.push(action);
    }

    for outcome in outcomes.iter_mut().filter(|o| o.status.needs_create()) {
        if outcome.name == ID_INDEX_NAME {
            // `_id_` only goes missing together with its collection
            if matches!(outcome.status, IndexStatus::NotInTarget { .. }) {
                let action = create_collection(target, collection).await;
                outcome.actions.push(action);
            } else {
                tracing::warn!(collection, "The _id index cannot be rebuilt, leaving it in place");
            }
            continue;
        }
        let Some(index) = source.get(&outcome.name) else {
            continue;
        };
        let action = create_index(target, collection, index).await;
        outcome.actions.push(action);
    }

    outcomes
}

async fn drop_index(target: &dyn CollectionDriver, collection: &str, name: &str) -> RepairAction {
    let error = match target.drop_index(collection, name).await {
        Ok(()) => {
            tracing::info!(collection, index = name, "Dropped index from target");
            None
        }
        Err(e) => {
            tracing::warn!(collection, index = name, error = %e, "Failed to drop index");
            Some(e.to_string())
        }
    };

    RepairAction {
        kind: ActionKind::Drop,
        index: name.to_string(),
        error,
    }
}

async fn create_collection(target: &dyn CollectionDriver, collection: &str) -> RepairAction {
    let error = match target.create_collection(collection).await {
        Ok(()) => {
            tracing::info!(collection, "Created collection on target");
            None
        }
        Err(e) => {
            tracing::warn!(collection, error = %e, "Failed to create collection");
            Some(e.to_string())
        }
    };

    RepairAction {
        kind: ActionKind::CreateCollection,
        index: ID_INDEX_NAME.to_string(),
        error,
    }
}

async fn create_index(
    target: &dyn CollectionDriver,
    collection: &str,
    index: &IndexDefinition,
) -> RepairAction {
    let error = match target.create_index(collection, index).await {
        Ok(()) => {
            tracing::info!(collection, index = %index.name, "Created index on target");
            None
        }
        Err(e) => {
            tracing::warn!(collection, index = %index.name, error = %e, "Failed to create index");
            Some(e.to_string())
        }
    };

    RepairAction {
        kind: ActionKind::Create,
        index: index.name.clone(),
        error,
    }
}

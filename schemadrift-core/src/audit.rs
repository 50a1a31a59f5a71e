// schemadrift-core/src/audit.rs
//! Audit runner - drives one full comparison between two databases
//!
//! ```text
//! list collections (source ∪ target)
//!   └── per collection
//!         ├── count_documents on both sides   -> CountComparison
//!         ├── load index sets on both sides   -> diff_set -> MismatchReport
//!         └── reconcile against the target    -> IndexOutcome per name
//! ```
//!
//! Collections are processed one at a time. Only the initial collection
//! listing can fail the run; everything after it degrades to warnings.

use serde_json::Value;

use crate::compare::{compare_counts, diff_set, CountComparison};
use crate::driver::CollectionDriver;
use crate::error::Result;
use crate::loader::{load, Side};
use crate::reconcile::{reconcile, IndexOutcome, IndexStatus, ReconcileOptions};

/// Run-wide settings
#[derive(Debug, Clone, PartialEq)]
pub struct AuditOptions {
    /// Count filter applied on the source side
    pub source_filter: Value,
    /// Count filter applied on the target side
    pub target_filter: Value,
    /// Compare document counts (independent of `repair`)
    pub compare_counts: bool,
    /// Apply drops and creates to the target
    pub repair: bool,
}

impl Default for AuditOptions {
    fn default() -> Self {
        AuditOptions {
            source_filter: Value::Object(Default::default()),
            target_filter: Value::Object(Default::default()),
            compare_counts: true,
            repair: false,
        }
    }
}

/// Result of auditing one collection
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionReport {
    pub collection: String,
    /// `None` when count comparison is disabled
    pub counts: Option<CountComparison>,
    pub indexes: Vec<IndexOutcome>,
}

impl CollectionReport {
    pub fn index(&self, name: &str) -> Option<&IndexOutcome> {
        self.indexes.iter().find(|o| o.name == name)
    }
}

/// Totals over a whole run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuditSummary {
    pub collections: usize,
    pub count_mismatches: usize,
    pub index_mismatches: usize,
    pub actions_applied: usize,
    pub actions_failed: usize,
}

impl AuditSummary {
    pub fn record(&mut self, report: &CollectionReport) {
        self.collections += 1;
        if report.counts.is_some_and(|c| !c.matched) {
            self.count_mismatches += 1;
        }
        for outcome in &report.indexes {
            if !outcome.status.is_match() {
                self.index_mismatches += 1;
            }
            for action in &outcome.actions {
                if action.succeeded() {
                    self.actions_applied += 1;
                } else {
                    self.actions_failed += 1;
                }
            }
        }
    }

    /// True when the run found no drift at all
    pub fn is_clean(&self) -> bool {
        self.count_mismatches == 0 && self.index_mismatches == 0
    }
}

/// Compares a source database with a target database
pub struct Auditor<'a> {
    source: &'a dyn CollectionDriver,
    target: &'a dyn CollectionDriver,
    options: AuditOptions,
}

impl<'a> Auditor<'a> {
    pub fn new(
        source: &'a dyn CollectionDriver,
        target: &'a dyn CollectionDriver,
        options: AuditOptions,
    ) -> Self {
        Auditor {
            source,
            target,
            options,
        }
    }

    pub fn options(&self) -> &AuditOptions {
        &self.options
    }

    /// Collections to audit: the source listing, then target-only names
    ///
    /// A collection that exists only on the target still has to be visited,
    /// otherwise its indexes would never be reported. Listing failures on
    /// either side are fatal.
    pub async fn collections(&self) -> Result<Vec<String>> {
        let mut names = self.source.list_collections().await?;
        let target_names = self.target.list_collections().await?;

        for name in target_names {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        Ok(names)
    }

    /// Audit a single collection (and repair it if enabled)
    pub async fn audit_collection(&self, collection: &str) -> CollectionReport {
        let counts = if self.options.compare_counts {
            let source = count(self.source, Side::Source, collection, &self.options.source_filter).await;
            let target = count(self.target, Side::Target, collection, &self.options.target_filter).await;
            Some(compare_counts(source, target))
        } else {
            None
        };

        let source_set = load(self.source, Side::Source, collection).await;
        let target_set = load(self.target, Side::Target, collection).await;
        let report = diff_set(&source_set, &target_set);

        let reconcile_options = ReconcileOptions {
            repair: self.options.repair,
        };
        let indexes = reconcile(self.target, collection, &report, &source_set, &reconcile_options).await;

        for outcome in &indexes {
            if let IndexStatus::Mismatch(reasons) = &outcome.status {
                tracing::debug!(collection, index = %outcome.name, reasons = reasons.len(), "Index mismatch");
            }
        }

        CollectionReport {
            collection: collection.to_string(),
            counts,
            indexes,
        }
    }

    /// Audit every collection, handing each report to `on_report` as soon
    /// as it is ready
    pub async fn run<F>(&self, on_report: F) -> Result<AuditSummary>
    where
        F: FnMut(&CollectionReport),
    {
        let collections = self.collections().await?;
        Ok(self.audit_all(&collections, on_report).await)
    }

    /// Audit an already listed set of collections in order
    pub async fn audit_all<F>(&self, collections: &[String], mut on_report: F) -> AuditSummary
    where
        F: FnMut(&CollectionReport),
    {
        tracing::info!(
            count = collections.len(),
            source = self.source.database_name(),
            target = self.target.database_name(),
            "Auditing collections"
        );

        let mut summary = AuditSummary::default();
        for collection in collections {
            let report = self.audit_collection(collection).await;
            summary.record(&report);
            on_report(&report);
        }

        tracing::info!(
            collections = summary.collections,
            count_mismatches = summary.count_mismatches,
            index_mismatches = summary.index_mismatches,
            actions_applied = summary.actions_applied,
            actions_failed = summary.actions_failed,
            "Audit finished"
        );
        summary
    }
}

/// Count documents on one side; a failure counts as zero
async fn count(driver: &dyn CollectionDriver, side: Side, collection: &str, filter: &Value) -> u64 {
    match driver.count_documents(collection, filter).await {
        Ok(n) => n,
        Err(e) => {
            tracing::warn!(%side, collection, error = %e, "Failed to count documents, using 0");
            0
        }
    }
}

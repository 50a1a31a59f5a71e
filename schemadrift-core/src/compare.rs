// schemadrift-core/src/compare.rs
//! Comparison engine
//!
//! Two indexes with the same name are compared field by field, in a fixed
//! order, producing typed [`MismatchReason`]s. Two index sets are
//! partitioned by name into common, source-only and target-only entries.
//!
//! Equivalence here is not structural equality of the whole definition:
//! only the key pattern and the five tracked options take part, and an
//! option that is absent on one side never matches one that is present on
//! the other, whatever its value.

use serde_json::Value;
use std::fmt;

use crate::index::{IndexDefinition, KeyPattern};
use crate::loader::IndexSet;

/// Optional index property tracked for drift, in comparison order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Property {
    Unique,
    Sparse,
    ExpireAfterSeconds,
    PartialFilterExpression,
    Collation,
}

impl Property {
    pub const ALL: [Property; 5] = [
        Property::Unique,
        Property::Sparse,
        Property::ExpireAfterSeconds,
        Property::PartialFilterExpression,
        Property::Collation,
    ];

    /// Field name as reported by the database
    pub fn as_str(&self) -> &'static str {
        match self {
            Property::Unique => "unique",
            Property::Sparse => "sparse",
            Property::ExpireAfterSeconds => "expireAfterSeconds",
            Property::PartialFilterExpression => "partialFilterExpression",
            Property::Collation => "collation",
        }
    }

    /// Value of this property on `index`, `None` when absent
    pub fn value_of(&self, index: &IndexDefinition) -> Option<Value> {
        match self {
            Property::Unique => index.unique.map(Value::Bool),
            Property::Sparse => index.sparse.map(Value::Bool),
            Property::ExpireAfterSeconds => index.expire_after_seconds.map(Value::from),
            Property::PartialFilterExpression => index.partial_filter_expression.clone(),
            Property::Collation => index.collation.clone(),
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One difference between two same-named indexes
#[derive(Debug, Clone, PartialEq)]
pub enum MismatchReason {
    /// Key patterns differ in fields, order or direction
    Keys { source: KeyPattern, target: KeyPattern },
    /// Property set on one side only
    Presence {
        property: Property,
        source: bool,
        target: bool,
    },
    /// Property set on both sides with different values
    Value {
        property: Property,
        source: Value,
        target: Value,
    },
}

impl MismatchReason {
    /// The property involved, `None` for a key mismatch
    pub fn property(&self) -> Option<Property> {
        match self {
            MismatchReason::Keys { .. } => None,
            MismatchReason::Presence { property, .. } | MismatchReason::Value { property, .. } => {
                Some(*property)
            }
        }
    }
}

impl fmt::Display for MismatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MismatchReason::Keys { source, target } => {
                write!(f, "Key mismatch (Source: {}, Target: {})", source, target)
            }
            MismatchReason::Presence {
                property,
                source,
                target,
            } => write!(
                f,
                "'{}' property existence mismatch (Source: {}, Target: {})",
                property, source, target
            ),
            MismatchReason::Value {
                property,
                source,
                target,
            } => write!(
                f,
                "'{}' property value mismatch (Source: {}, Target: {})",
                property, source, target
            ),
        }
    }
}

/// Compare two indexes that share a name
///
/// Returns an empty vector iff they are equivalent. Keys are checked first,
/// then each [`Property`] in `Property::ALL` order, so the output order is
/// stable for identical inputs.
pub fn diff_index(source: &IndexDefinition, target: &IndexDefinition) -> Vec<MismatchReason> {
    let mut reasons = Vec::new();

    if source.keys != target.keys {
        reasons.push(MismatchReason::Keys {
            source: source.keys.clone(),
            target: target.keys.clone(),
        });
    }

    for property in Property::ALL {
        match (property.value_of(source), property.value_of(target)) {
            (Some(s), Some(t)) => {
                if s != t {
                    reasons.push(MismatchReason::Value {
                        property,
                        source: s,
                        target: t,
                    });
                }
            }
            (None, None) => {}
            (s, t) => reasons.push(MismatchReason::Presence {
                property,
                source: s.is_some(),
                target: t.is_some(),
            }),
        }
    }

    reasons
}

/// A name present on both sides, with its differences (empty = match)
#[derive(Debug, Clone, PartialEq)]
pub struct CommonIndex {
    pub name: String,
    pub reasons: Vec<MismatchReason>,
}

impl CommonIndex {
    pub fn is_match(&self) -> bool {
        self.reasons.is_empty()
    }
}

/// Name partition of two index sets
///
/// Every name of either input appears in exactly one partition. `common`
/// and `target_only` follow target listing order; `source_only` follows
/// source listing order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MismatchReport {
    pub common: Vec<CommonIndex>,
    pub source_only: Vec<String>,
    pub target_only: Vec<String>,
}

impl MismatchReport {
    /// True when nothing differs between the two sets
    pub fn is_clean(&self) -> bool {
        self.source_only.is_empty()
            && self.target_only.is_empty()
            && self.common.iter().all(CommonIndex::is_match)
    }

    /// Common entries that carry at least one reason
    pub fn mismatched(&self) -> impl Iterator<Item = &CommonIndex> {
        self.common.iter().filter(|c| !c.is_match())
    }
}

/// Partition two index sets by name and diff the common entries
///
/// Walks the target set once; every name also found in a working copy of
/// the source set is diffed and taken out of the copy. Whatever is left in
/// the copy afterwards exists on the source side only.
pub fn diff_set(source: &IndexSet, target: &IndexSet) -> MismatchReport {
    let mut remaining = source.clone();
    let mut report = MismatchReport::default();

    for target_index in target.iter() {
        match remaining.remove(&target_index.name) {
            Some(source_index) => report.common.push(CommonIndex {
                name: target_index.name.clone(),
                reasons: diff_index(&source_index, target_index),
            }),
            None => report.target_only.push(target_index.name.clone()),
        }
    }

    report.source_only = remaining.names().map(str::to_string).collect();
    report
}

/// Document counts of one collection on both sides
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountComparison {
    pub source: u64,
    pub target: u64,
    pub matched: bool,
}

pub fn compare_counts(source: u64, target: u64) -> CountComparison {
    CountComparison {
        source,
        target,
        matched: source == target,
    }
}

// schemadrift-core/src/loader.rs
// Index set loading

use std::fmt;

use crate::driver::CollectionDriver;
use crate::index::IndexDefinition;

/// Which database of the pair a value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Source,
    Target,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Source => "source",
            Side::Target => "target",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Index definitions of one collection on one side, keyed by name
///
/// Keeps listing order so every pass over the set is reproducible.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexSet {
    entries: Vec<IndexDefinition>,
}

impl IndexSet {
    pub fn new() -> Self {
        IndexSet::default()
    }

    /// Insert or replace by name; a replaced entry keeps its position
    pub fn insert(&mut self, index: IndexDefinition) {
        match self.entries.iter_mut().find(|e| e.name == index.name) {
            Some(existing) => *existing = index,
            None => self.entries.push(index),
        }
    }

    pub fn get(&self, name: &str) -> Option<&IndexDefinition> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn remove(&mut self, name: &str) -> Option<IndexDefinition> {
        let pos = self.entries.iter().position(|e| e.name == name)?;
        Some(self.entries.remove(pos))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &IndexDefinition> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<IndexDefinition> for IndexSet {
    fn from_iter<I: IntoIterator<Item = IndexDefinition>>(iter: I) -> Self {
        let mut set = IndexSet::new();
        for index in iter {
            set.insert(index);
        }
        set
    }
}

impl IntoIterator for IndexSet {
    type Item = IndexDefinition;
    type IntoIter = std::vec::IntoIter<IndexDefinition>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Load the index set of `collection` from one side
///
/// A listing failure (typically a collection that only exists on the other
/// side) yields an empty set and a warning. Records without a usable name
/// are skipped with a warning; everything else about a record is best-effort.
pub async fn load(driver: &dyn CollectionDriver, side: Side, collection: &str) -> IndexSet {
    let records = match driver.list_indexes(collection).await {
        Ok(records) => records,
        Err(e) => {
            tracing::warn!(
                %side,
                collection,
                database = driver.database_name(),
                error = %e,
                "Cannot get indexes, treating index set as empty"
            );
            return IndexSet::new();
        }
    };

    let mut set = IndexSet::new();
    for record in &records {
        match IndexDefinition::from_raw(record) {
            Ok(index) => set.insert(index),
            Err(e) => {
                tracing::warn!(%side, collection, error = %e, "Skipping undecodable index record");
            }
        }
    }

    tracing::debug!(%side, collection, count = set.len(), "Loaded index set");
    set
}

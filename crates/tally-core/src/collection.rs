//! In-memory, key-addressable set of reconstructed items.

use indexmap::IndexMap;
use tracing::{info, instrument};

use crate::model::item::{ItemRecord, RawItem};
use crate::source::{IssueSource, SourceError};

/// Immutable set of [`ItemRecord`]s keyed by item key.
///
/// Built once; iteration follows the order in which keys were first seen.
/// A later raw record with an already-seen key replaces the earlier record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemCollection {
    items: IndexMap<String, ItemRecord>,
}

impl ItemCollection {
    /// Reconstruct every raw item and index the results by key.
    #[must_use]
    pub fn from_raw(raw_items: &[RawItem]) -> Self {
        let items = raw_items
            .iter()
            .map(|raw| (raw.key.clone(), ItemRecord::from_raw(raw)))
            .collect::<IndexMap<_, _>>();

        info!(
            raw = raw_items.len(),
            items = items.len(),
            "item collection built"
        );
        Self { items }
    }

    /// Fetch raw items from `source` and build the collection.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] when the source cannot deliver its items.
    /// There is no partial collection.
    #[instrument(skip_all)]
    pub fn from_source(source: &dyn IssueSource) -> Result<Self, SourceError> {
        let raw_items = source.fetch()?;
        Ok(Self::from_raw(&raw_items))
    }

    /// Collection over already reconstructed records, last write wins.
    pub fn from_records(records: impl IntoIterator<Item = ItemRecord>) -> Self {
        let items = records
            .into_iter()
            .map(|record| (record.key.clone(), record))
            .collect();
        Self { items }
    }

    /// Point lookup by item key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ItemRecord> {
        self.items.get(key)
    }

    /// All records in first-seen key order.
    pub fn iter(&self) -> impl Iterator<Item = &ItemRecord> {
        self.items.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<'a> IntoIterator for &'a ItemCollection {
    type Item = &'a ItemRecord;
    type IntoIter = indexmap::map::Values<'a, String, ItemRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.values()
    }
}

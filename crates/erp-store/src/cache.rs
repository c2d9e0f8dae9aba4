//! Normalized per-entity cache
//!
//! An insertion-ordered map keeps the id → record mapping and the ordered id
//! list in a single structure, so the two can never disagree.

use crate::id::EntityId;
use indexmap::IndexMap;

/// id → record mapping plus the ordered id sequence
#[derive(Debug, Clone)]
pub struct NormalizedCache<E> {
    entries: IndexMap<EntityId, E>,
}

impl<E> NormalizedCache<E> {
    /// Create an empty cache
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Replace every entry, keeping the given order.
    ///
    /// A repeated id keeps its first position and its last value.
    pub fn replace(&mut self, records: impl IntoIterator<Item = (EntityId, E)>) {
        self.entries = records.into_iter().collect();
    }

    /// Insert or update one entry.
    ///
    /// Returns `true` when the id was new (and therefore appended).
    pub fn upsert(&mut self, id: EntityId, record: E) -> bool {
        self.entries.insert(id, record).is_none()
    }

    /// Remove one entry from both the mapping and the id sequence.
    ///
    /// Removing an absent id is a no-op.
    pub fn remove(&mut self, id: &EntityId) -> Option<E> {
        self.entries.shift_remove(id)
    }

    /// Look up a record by id
    #[inline]
    #[must_use]
    pub fn get(&self, id: &EntityId) -> Option<&E> {
        self.entries.get(id)
    }

    /// Whether the id is cached
    #[inline]
    #[must_use]
    pub fn contains(&self, id: &EntityId) -> bool {
        self.entries.contains_key(id)
    }

    /// Ordered ids
    pub fn ids(&self) -> impl Iterator<Item = &EntityId> {
        self.entries.keys()
    }

    /// Ordered `(id, record)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&EntityId, &E)> {
        self.entries.iter()
    }

    /// First record matching the predicate, in list order
    pub fn find(&self, mut predicate: impl FnMut(&E) -> bool) -> Option<&E> {
        self.entries.values().find(|record| predicate(record))
    }

    /// Number of cached records
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds nothing
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<E: Clone> NormalizedCache<E> {
    /// Denormalized records in list order
    #[must_use]
    pub fn records(&self) -> Vec<E> {
        self.entries.values().cloned().collect()
    }
}

impl<E> Default for NormalizedCache<E> {
    fn default() -> Self {
        Self::new()
    }
}

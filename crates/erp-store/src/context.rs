//! Explicit store context
//!
//! Owns the backend and one [`EntityStore`] per entity name. Pass the context
//! (or the stores it hands out) to whatever needs data instead of reaching for
//! a global.

use crate::error::StoreError;
use crate::rest::RestBackend;
use crate::store::{Entity, EntityStore, ResponseOrdering};
use dashmap::DashMap;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Registry of entity stores sharing one backend
pub struct StoreContext<B: ?Sized> {
    backend: Arc<B>,
    ordering: ResponseOrdering,
    stores: DashMap<String, Arc<dyn Any + Send + Sync>>,
}

impl<B> StoreContext<B>
where
    B: RestBackend + 'static,
{
    /// Context over an owned backend
    #[must_use]
    pub fn new(backend: B) -> Self {
        Self::from_arc(Arc::new(backend))
    }
}

impl<B> StoreContext<B>
where
    B: RestBackend + ?Sized + 'static,
{
    /// Context over a shared backend
    #[must_use]
    pub fn from_arc(backend: Arc<B>) -> Self {
        Self {
            backend,
            ordering: ResponseOrdering::default(),
            stores: DashMap::new(),
        }
    }

    /// Ordering policy for stores created from now on
    #[must_use]
    pub fn with_ordering(mut self, ordering: ResponseOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    /// Shared backend
    #[inline]
    #[must_use]
    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// Store for `entity`, created on first use.
    ///
    /// # Errors
    /// - `StoreError::TypeMismatch` if the store already exists with another record type
    pub fn store<E: Entity>(&self, entity: &str) -> Result<Arc<EntityStore<E, B>>, StoreError> {
        let slot = self
            .stores
            .entry(entity.to_string())
            .or_insert_with(|| {
                debug!(entity, "creating entity store");
                let store: EntityStore<E, B> =
                    EntityStore::new(entity, Arc::clone(&self.backend)).with_ordering(self.ordering);
                Arc::new(store) as Arc<dyn Any + Send + Sync>
            })
            .clone();

        slot.downcast::<EntityStore<E, B>>()
            .map_err(|_| StoreError::TypeMismatch {
                entity: entity.to_string(),
            })
    }

    /// Whether a store exists for `entity`
    #[must_use]
    pub fn contains(&self, entity: &str) -> bool {
        self.stores.contains_key(entity)
    }

    /// Entity names with a store, sorted
    #[must_use]
    pub fn entities(&self) -> Vec<String> {
        let mut names: Vec<String> = self.stores.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}

impl<B: ?Sized> fmt::Debug for StoreContext<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreContext")
            .field("ordering", &self.ordering)
            .field("stores", &self.stores.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rest::MockRestBackend;
    use serde_json::Value;

    #[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
    struct Product {
        id: u64,
        sku: String,
    }

    #[test]
    fn same_name_returns_same_store() {
        let ctx = StoreContext::new(MockRestBackend::new());
        let a = ctx.store::<Value>("products").unwrap();
        let b = ctx.store::<Value>("products").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(ctx.entities(), vec!["products".to_string()]);
    }

    #[test]
    fn different_record_type_is_rejected() {
        let ctx = StoreContext::new(MockRestBackend::new());
        ctx.store::<Product>("products").unwrap();
        let err = ctx.store::<Value>("products").unwrap_err();
        assert!(matches!(err, StoreError::TypeMismatch { .. }));
    }

    #[test]
    fn stores_inherit_context_ordering() {
        let ctx = StoreContext::new(MockRestBackend::new())
            .with_ordering(ResponseOrdering::LatestIssued);
        let store = ctx.store::<Value>("sales").unwrap();
        assert_eq!(store.ordering(), ResponseOrdering::LatestIssued);
        assert_eq!(store.entity(), "sales");
        assert!(ctx.contains("sales"));
        assert!(!ctx.contains("purchases"));
    }
}

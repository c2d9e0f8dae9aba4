//! Generic entity store
//!
//! One [`EntityStore`] owns the normalized cache of a single entity name and
//! drives the five REST operations against it:
//! - `list` replaces the whole cache
//! - `get` / `create` / `update` upsert one record
//! - `remove` deletes one record (idempotent on the cache)
//!
//! Every operation flips the matching [`OperationStatus`] entry on start and on
//! settle, records the failure message, and publishes [`StoreEvent`]s to
//! subscribers of the shared cache.

use crate::cache::NormalizedCache;
use crate::error::StoreError;
use crate::id::{record_key, EntityId};
use crate::rest::{QueryParams, RestBackend};
use crate::status::{OperationKind, OperationStatus};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Capacity of the change-notification channel
const EVENT_CAPACITY: usize = 256;

/// Record type a store can hold
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

impl<T> Entity for T where T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

/// How concurrent responses for the same data are reconciled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponseOrdering {
    /// The response that arrives last wins, whatever the issue order
    #[default]
    ArrivalOrder,
    /// A response never overwrites a key already written by a later-issued request
    LatestIssued,
}

/// Change published to store subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// The whole cache was replaced by a list response
    Replaced {
        /// Records now cached
        count: usize,
    },
    /// One record was inserted or updated
    Upserted(EntityId),
    /// One record was removed
    Removed(EntityId),
    /// An operation settled
    Settled {
        /// Operation kind
        kind: OperationKind,
        /// Whether it succeeded
        ok: bool,
    },
}

/// Store operation as a value, for deferred or spawned execution
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Fetch the collection and replace the cache
    List(QueryParams),
    /// Fetch one record
    Get(EntityId),
    /// Create a record from a JSON body
    Create(Value),
    /// Update a record with a JSON body
    Update(EntityId, Value),
    /// Delete a record
    Remove(EntityId),
}

impl Action {
    /// Operation kind this action runs as
    #[inline]
    #[must_use]
    pub fn kind(&self) -> OperationKind {
        match self {
            Action::List(_) => OperationKind::List,
            Action::Get(_) => OperationKind::Get,
            Action::Create(_) => OperationKind::Create,
            Action::Update(..) => OperationKind::Update,
            Action::Remove(_) => OperationKind::Remove,
        }
    }
}

/// Result of a settled [`Action`]
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutput<E> {
    /// Records returned by `list`
    Listed(Vec<E>),
    /// Record returned by `get`, `create` or `update`
    Record(E),
    /// Id removed by `remove`
    Removed(EntityId),
}

enum Mutation<E> {
    Replace(Vec<(EntityId, E)>),
    Upsert(EntityId, E),
    Remove(EntityId),
}

struct StoreState<E> {
    cache: NormalizedCache<E>,
    status: OperationStatus,
    /// Issue sequence of single-record writes newer than `list_stamp`
    /// (`LatestIssued` only)
    stamps: HashMap<EntityId, u64>,
    /// Issue sequence of the last applied list, the floor for every key
    /// (`LatestIssued` only)
    list_stamp: u64,
}

impl<E> Default for StoreState<E> {
    fn default() -> Self {
        Self {
            cache: NormalizedCache::new(),
            status: OperationStatus::new(),
            stamps: HashMap::new(),
            list_stamp: 0,
        }
    }
}

/// Normalized cache plus the five REST operations for one entity
pub struct EntityStore<E, B: ?Sized> {
    entity: String,
    backend: Arc<B>,
    ordering: ResponseOrdering,
    state: RwLock<StoreState<E>>,
    seq: AtomicU64,
    events: broadcast::Sender<StoreEvent>,
}

impl<E, B> EntityStore<E, B>
where
    E: Entity,
    B: RestBackend + ?Sized,
{
    /// Create an empty store for `entity`
    #[must_use]
    pub fn new(entity: impl Into<String>, backend: Arc<B>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            entity: entity.into(),
            backend,
            ordering: ResponseOrdering::default(),
            state: RwLock::new(StoreState::default()),
            seq: AtomicU64::new(0),
            events,
        }
    }

    /// With a response ordering policy
    #[must_use]
    pub fn with_ordering(mut self, ordering: ResponseOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    /// Entity name
    #[inline]
    #[must_use]
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Response ordering policy
    #[inline]
    #[must_use]
    pub fn ordering(&self) -> ResponseOrdering {
        self.ordering
    }

    /// Fetch the collection and replace the whole cache with it.
    ///
    /// On failure the cache is left untouched.
    ///
    /// # Errors
    /// - `StoreError::Network` if the backend call fails
    /// - `StoreError::Decode` if a record does not fit `E`
    pub async fn list(&self, params: QueryParams) -> Result<Vec<E>, StoreError> {
        let seq = self.begin(OperationKind::List);
        let outcome = match self.backend.list(&self.entity, &params).await {
            Ok(raw) => self.decode_list(raw),
            Err(e) => Err(e.into()),
        };
        let outcome = outcome.map(|entries| {
            let records: Vec<E> = entries.iter().map(|(_, r)| r.clone()).collect();
            (Mutation::Replace(entries), records)
        });
        self.settle(OperationKind::List, seq, outcome)
    }

    /// Fetch one record and upsert it
    ///
    /// # Errors
    /// - `StoreError::Network` if the backend call fails
    /// - `StoreError::Decode` if the record does not fit `E`
    pub async fn get(&self, id: impl Into<EntityId>) -> Result<E, StoreError> {
        let id = id.into();
        let seq = self.begin(OperationKind::Get);
        let outcome = match self.backend.get(&self.entity, &id).await {
            Ok(raw) => self.decode_record(raw, Some(id)),
            Err(e) => Err(e.into()),
        };
        self.settle(OperationKind::Get, seq, outcome.map(upsert))
    }

    /// Submit a new record and upsert the server's copy.
    ///
    /// The cache key is the server-assigned id; any id inside `body` is ignored.
    ///
    /// # Errors
    /// - `StoreError::Encode` if `body` cannot be serialized
    /// - `StoreError::Network` if the backend call fails
    /// - `StoreError::MissingId` if the response carries no id
    pub async fn create<P>(&self, body: &P) -> Result<E, StoreError>
    where
        P: Serialize + ?Sized,
    {
        let seq = self.begin(OperationKind::Create);
        let outcome = match self.encode(body) {
            Ok(body) => match self.backend.create(&self.entity, &body).await {
                Ok(raw) => self.decode_record(raw, None),
                Err(e) => Err(e.into()),
            },
            Err(e) => Err(e),
        };
        self.settle(OperationKind::Create, seq, outcome.map(upsert))
    }

    /// Submit `body` to the record's endpoint and upsert the response
    ///
    /// # Errors
    /// - `StoreError::Encode` if `body` cannot be serialized
    /// - `StoreError::Network` if the backend call fails
    /// - `StoreError::Decode` if the response does not fit `E`
    pub async fn update<P>(&self, id: impl Into<EntityId>, body: &P) -> Result<E, StoreError>
    where
        P: Serialize + ?Sized,
    {
        let id = id.into();
        let seq = self.begin(OperationKind::Update);
        let outcome = match self.encode(body) {
            Ok(body) => match self.backend.update(&self.entity, &id, &body).await {
                Ok(raw) => self.decode_record(raw, Some(id)),
                Err(e) => Err(e.into()),
            },
            Err(e) => Err(e),
        };
        self.settle(OperationKind::Update, seq, outcome.map(upsert))
    }

    /// Delete a record on the server, then drop it from the cache.
    ///
    /// Removing an id that is not cached leaves the cache unchanged.
    ///
    /// # Errors
    /// - `StoreError::Network` if the backend call fails
    pub async fn remove(&self, id: impl Into<EntityId>) -> Result<EntityId, StoreError> {
        let id = id.into();
        let seq = self.begin(OperationKind::Remove);
        let outcome = self
            .backend
            .remove(&self.entity, &id)
            .await
            .map(|removed| (Mutation::Remove(removed.clone()), removed))
            .map_err(StoreError::from);
        self.settle(OperationKind::Remove, seq, outcome)
    }

    /// Run an [`Action`] to completion
    ///
    /// # Errors
    /// Whatever the underlying operation returns.
    pub async fn run(&self, action: Action) -> Result<ActionOutput<E>, StoreError> {
        match action {
            Action::List(params) => self.list(params).await.map(ActionOutput::Listed),
            Action::Get(id) => self.get(id).await.map(ActionOutput::Record),
            Action::Create(body) => self.create(&body).await.map(ActionOutput::Record),
            Action::Update(id, body) => self.update(id, &body).await.map(ActionOutput::Record),
            Action::Remove(id) => self.remove(id).await.map(ActionOutput::Removed),
        }
    }

    /// Spawn an [`Action`] on the runtime and return its handle immediately.
    ///
    /// The cache and status change when the response lands; nothing cancels
    /// a spawned action.
    pub fn dispatch(
        self: &Arc<Self>,
        action: Action,
    ) -> JoinHandle<Result<ActionOutput<E>, StoreError>>
    where
        B: 'static,
    {
        let store = Arc::clone(self);
        tokio::spawn(async move { store.run(action).await })
    }

    /// Current loading/error record
    #[must_use]
    pub fn status(&self) -> OperationStatus {
        self.state.read().status.clone()
    }

    /// Copy of the whole cache
    #[must_use]
    pub fn snapshot(&self) -> NormalizedCache<E> {
        self.state.read().cache.clone()
    }

    /// Cached records in list order
    #[must_use]
    pub fn records(&self) -> Vec<E> {
        self.state.read().cache.records()
    }

    /// Cached ids in list order
    #[must_use]
    pub fn ids(&self) -> Vec<EntityId> {
        self.state.read().cache.ids().cloned().collect()
    }

    /// Cached record by id, without a network round trip
    #[must_use]
    pub fn get_cached(&self, id: impl Into<EntityId>) -> Option<E> {
        self.state.read().cache.get(&id.into()).cloned()
    }

    /// First cached record matching `predicate`, e.g. resolving a foreign id
    pub fn find(&self, predicate: impl FnMut(&E) -> bool) -> Option<E> {
        self.state.read().cache.find(predicate).cloned()
    }

    /// Read the cache under the lock without cloning it
    pub fn with_cache<R>(&self, f: impl FnOnce(&NormalizedCache<E>) -> R) -> R {
        f(&self.state.read().cache)
    }

    /// Number of cached records
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().cache.len()
    }

    /// Whether the cache is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.read().cache.is_empty()
    }

    /// Subscribe to cache and status changes
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    fn begin(&self, kind: OperationKind) -> u64 {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.write().status.start(kind);
        debug!(entity = %self.entity, %kind, seq, "operation started");
        seq
    }

    fn settle<T>(
        &self,
        kind: OperationKind,
        seq: u64,
        outcome: Result<(Mutation<E>, T), StoreError>,
    ) -> Result<T, StoreError> {
        let mut events = Vec::new();
        let result = {
            let mut state = self.state.write();
            match outcome {
                Ok((mutation, value)) => {
                    self.apply(&mut state, seq, mutation, &mut events);
                    state.status.settle(kind, None);
                    Ok(value)
                }
                Err(err) => {
                    state.status.settle(kind, Some(err.to_string()));
                    Err(err)
                }
            }
        };

        match &result {
            Ok(_) => debug!(entity = %self.entity, %kind, seq, "operation settled"),
            Err(err) => warn!(entity = %self.entity, %kind, seq, error = %err, "operation failed"),
        }
        events.push(StoreEvent::Settled {
            kind,
            ok: result.is_ok(),
        });
        for event in events {
            // No subscribers is fine
            let _ = self.events.send(event);
        }
        result
    }

    fn apply(
        &self,
        state: &mut StoreState<E>,
        seq: u64,
        mutation: Mutation<E>,
        events: &mut Vec<StoreEvent>,
    ) {
        match self.ordering {
            ResponseOrdering::ArrivalOrder => match mutation {
                Mutation::Replace(entries) => {
                    state.cache.replace(entries);
                    events.push(StoreEvent::Replaced {
                        count: state.cache.len(),
                    });
                }
                Mutation::Upsert(id, record) => {
                    state.cache.upsert(id.clone(), record);
                    events.push(StoreEvent::Upserted(id));
                }
                Mutation::Remove(id) => {
                    if state.cache.remove(&id).is_some() {
                        events.push(StoreEvent::Removed(id));
                    }
                }
            },
            ResponseOrdering::LatestIssued => self.apply_latest(state, seq, mutation, events),
        }
    }

    fn apply_latest(
        &self,
        state: &mut StoreState<E>,
        seq: u64,
        mutation: Mutation<E>,
        events: &mut Vec<StoreEvent>,
    ) {
        // The last applied list covers every key it did not leave a newer stamp on
        let superseded = |state: &StoreState<E>, id: &EntityId| {
            state.stamps.get(id).copied().unwrap_or(0).max(state.list_stamp) > seq
        };

        match mutation {
            Mutation::Replace(entries) => {
                if seq < state.list_stamp {
                    debug!(entity = %self.entity, seq, "dropping stale list response");
                    return;
                }
                let mut next = NormalizedCache::new();
                for (id, record) in entries {
                    if superseded(state, &id) {
                        // Keep the newer write; a newer removal keeps it out
                        if let Some(current) = state.cache.get(&id) {
                            next.upsert(id, current.clone());
                        }
                    } else {
                        next.upsert(id, record);
                    }
                }
                for (id, current) in state.cache.iter() {
                    if !next.contains(id) && superseded(state, id) {
                        next.upsert(id.clone(), current.clone());
                    }
                }
                state.cache = next;
                state.list_stamp = seq;
                // Stamps at or below the list stamp add nothing over it
                state.stamps.retain(|_, stamp| *stamp > seq);
                events.push(StoreEvent::Replaced {
                    count: state.cache.len(),
                });
            }
            Mutation::Upsert(id, record) => {
                if superseded(state, &id) {
                    debug!(entity = %self.entity, %id, seq, "dropping stale record response");
                    return;
                }
                state.stamps.insert(id.clone(), seq);
                state.cache.upsert(id.clone(), record);
                events.push(StoreEvent::Upserted(id));
            }
            Mutation::Remove(id) => {
                if superseded(state, &id) {
                    debug!(entity = %self.entity, %id, seq, "dropping stale removal");
                    return;
                }
                state.stamps.insert(id.clone(), seq);
                if state.cache.remove(&id).is_some() {
                    events.push(StoreEvent::Removed(id));
                }
            }
        }
    }

    fn encode<P: Serialize + ?Sized>(&self, body: &P) -> Result<Value, StoreError> {
        serde_json::to_value(body).map_err(|e| StoreError::Encode {
            entity: self.entity.clone(),
            reason: e.to_string(),
        })
    }

    fn decode(&self, raw: Value) -> Result<E, StoreError> {
        serde_json::from_value(raw).map_err(|e| StoreError::Decode {
            entity: self.entity.clone(),
            reason: e.to_string(),
        })
    }

    /// Key a single response record, falling back to the requested id
    fn decode_record(
        &self,
        raw: Value,
        requested: Option<EntityId>,
    ) -> Result<(EntityId, E), StoreError> {
        let id = record_key(&raw)
            .or(requested)
            .ok_or_else(|| StoreError::MissingId {
                entity: self.entity.clone(),
            })?;
        Ok((id, self.decode(raw)?))
    }

    fn decode_list(&self, raw: Vec<Value>) -> Result<Vec<(EntityId, E)>, StoreError> {
        let mut entries = Vec::with_capacity(raw.len());
        for record in raw {
            let Some(id) = record_key(&record) else {
                warn!(entity = %self.entity, "skipping listed record without id");
                continue;
            };
            entries.push((id, self.decode(record)?));
        }
        Ok(entries)
    }
}

fn upsert<E: Clone>((id, record): (EntityId, E)) -> (Mutation<E>, E) {
    let value = record.clone();
    (Mutation::Upsert(id, record), value)
}

impl<E, B: ?Sized> fmt::Debug for EntityStore<E, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("EntityStore")
            .field("entity", &self.entity)
            .field("ordering", &self.ordering)
            .field("cached", &state.cache.len())
            .field("status", &state.status)
            .finish_non_exhaustive()
    }
}

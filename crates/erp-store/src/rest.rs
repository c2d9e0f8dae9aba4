//! REST backend contract
//!
//! Conventional resource routes under `/api/{entity}`:
//!
//! | op     | method | path                   |
//! |--------|--------|------------------------|
//! | list   | GET    | `/api/{entity}?k=v&…`  |
//! | get    | GET    | `/api/{entity}/{id}`   |
//! | create | POST   | `/api/{entity}`        |
//! | update | PUT    | `/api/{entity}/{id}`   |
//! | remove | DELETE | `/api/{entity}/{id}`   |

use crate::error::NetworkError;
use crate::id::EntityId;
use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;

/// Flat, ordered query parameters for `list`.
///
/// Keys holding `None` are left out of the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    params: IndexMap<String, Option<String>>,
}

impl QueryParams {
    /// Empty parameter set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With a present value
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(key.into(), Some(value.to_string()));
        self
    }

    /// With an optional value; `None` is skipped when the query is built
    #[must_use]
    pub fn with_opt(mut self, key: impl Into<String>, value: Option<impl ToString>) -> Self {
        self.params.insert(key.into(), value.map(|v| v.to_string()));
        self
    }

    /// Set a value in place
    pub fn insert(&mut self, key: impl Into<String>, value: Option<String>) {
        self.params.insert(key.into(), value);
    }

    /// Present `(key, value)` pairs in insertion order
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params
            .iter()
            .filter_map(|(k, v)| v.as_deref().map(|v| (k.as_str(), v)))
    }

    /// Whether no value would reach the query string
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs().next().is_none()
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |params, (k, v)| params.with(k, v))
    }
}

/// Backend consumed by the entity store.
///
/// Records travel as untyped JSON; typing happens at the store boundary.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RestBackend: Send + Sync {
    /// `GET /api/{entity}?{params}`
    async fn list(&self, entity: &str, params: &QueryParams) -> Result<Vec<Value>, NetworkError>;

    /// `GET /api/{entity}/{id}`
    async fn get(&self, entity: &str, id: &EntityId) -> Result<Value, NetworkError>;

    /// `POST /api/{entity}` with a JSON body
    async fn create(&self, entity: &str, body: &Value) -> Result<Value, NetworkError>;

    /// `PUT /api/{entity}/{id}` with a JSON body
    async fn update(&self, entity: &str, id: &EntityId, body: &Value)
        -> Result<Value, NetworkError>;

    /// `DELETE /api/{entity}/{id}`; the response body is ignored and the id echoed back
    async fn remove(&self, entity: &str, id: &EntityId) -> Result<EntityId, NetworkError>;
}

//! HTTP implementation of [`RestBackend`]

use crate::config::ClientConfig;
use crate::error::NetworkError;
use crate::id::EntityId;
use crate::rest::{QueryParams, RestBackend};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

/// REST client for the `/api/{entity}` routes
#[derive(Debug, Clone)]
pub struct RestClient {
    http: Client,
    base: Url,
}

impl RestClient {
    /// Build a client for the configured base URL
    ///
    /// # Errors
    /// - `NetworkError::InvalidBaseUrl` if the base URL is unusable
    /// - `NetworkError::Transport` if the HTTP client cannot be initialised
    pub fn new(config: ClientConfig) -> Result<Self, NetworkError> {
        let http = Client::builder().build()?;
        Self::with_http_client(config, http)
    }

    /// Build around an existing `reqwest` client (shared connection pool)
    ///
    /// # Errors
    /// - `NetworkError::InvalidBaseUrl` if the base URL is unusable
    pub fn with_http_client(config: ClientConfig, http: Client) -> Result<Self, NetworkError> {
        let base = config.parsed_base_url()?;
        Ok(Self { http, base })
    }

    /// Resolved base URL
    #[inline]
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// URL of the collection (`id = None`) or of one record
    ///
    /// # Errors
    /// - `NetworkError::InvalidBaseUrl` if the base cannot carry path segments
    pub fn endpoint(&self, entity: &str, id: Option<&EntityId>) -> Result<Url, NetworkError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| NetworkError::InvalidBaseUrl {
                url: self.base.to_string(),
                reason: "cannot carry path segments".to_string(),
            })?
            .pop_if_empty()
            .push("api")
            .extend(entity.split('/').filter(|s| !s.is_empty()))
            .extend(id.map(EntityId::as_str));
        Ok(url)
    }

    async fn send(&self, method: Method, request: RequestBuilder) -> Result<Response, NetworkError> {
        let response = request.send().await.map_err(|e| {
            warn!(%method, error = %e, "request failed before a response");
            NetworkError::from(e)
        })?;

        let status = response.status();
        if status.is_success() {
            debug!(%method, url = %response.url(), status = status.as_u16(), "request succeeded");
            return Ok(response);
        }

        let url = response.url().to_string();
        // An unreadable body degrades to the status text
        let body = response.text().await.unwrap_or_default();
        let err = NetworkError::from_status(
            status.as_u16(),
            &body,
            status.canonical_reason().unwrap_or(status.as_str()),
        );
        warn!(%method, %url, status = status.as_u16(), error = %err, "request rejected");
        Err(err)
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, NetworkError> {
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| NetworkError::Decode(e.to_string()))
    }
}

#[async_trait]
impl RestBackend for RestClient {
    async fn list(&self, entity: &str, params: &QueryParams) -> Result<Vec<Value>, NetworkError> {
        let mut url = self.endpoint(entity, None)?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params.pairs());
        }
        debug!(entity, %url, "GET collection");
        let response = self.send(Method::GET, self.http.get(url)).await?;
        Self::read_json(response).await
    }

    async fn get(&self, entity: &str, id: &EntityId) -> Result<Value, NetworkError> {
        let url = self.endpoint(entity, Some(id))?;
        debug!(entity, %id, "GET record");
        let response = self.send(Method::GET, self.http.get(url)).await?;
        Self::read_json(response).await
    }

    async fn create(&self, entity: &str, body: &Value) -> Result<Value, NetworkError> {
        let url = self.endpoint(entity, None)?;
        debug!(entity, "POST record");
        let response = self
            .send(Method::POST, self.http.post(url).json(body))
            .await?;
        Self::read_json(response).await
    }

    async fn update(
        &self,
        entity: &str,
        id: &EntityId,
        body: &Value,
    ) -> Result<Value, NetworkError> {
        let url = self.endpoint(entity, Some(id))?;
        debug!(entity, %id, "PUT record");
        let response = self.send(Method::PUT, self.http.put(url).json(body)).await?;
        Self::read_json(response).await
    }

    async fn remove(&self, entity: &str, id: &EntityId) -> Result<EntityId, NetworkError> {
        let url = self.endpoint(entity, Some(id))?;
        debug!(entity, %id, "DELETE record");
        // The server may answer with no body at all
        self.send(Method::DELETE, self.http.delete(url)).await?;
        Ok(id.clone())
    }
}

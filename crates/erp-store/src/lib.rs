//! ERP Store - normalized client-side entity cache
//!
//! One [`EntityStore`] per entity name ("products", "sales", ...) gives:
//! - A normalized cache (id → record map plus the ordered id list)
//! - Five async operations (list, get, create, update, remove) over a REST backend
//! - Per-operation loading/error status
//! - Change notifications for every subscriber of the shared cache
//!
//! # Example
//!
//! ```rust,ignore
//! use erp_store::{ClientConfig, QueryParams, RestClient, StoreContext};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = RestClient::new(ClientConfig::from_env())?;
//! let ctx = StoreContext::new(client);
//!
//! let products = ctx.store::<serde_json::Value>("products")?;
//! products.list(QueryParams::new().with("branch", "north")).await?;
//!
//! println!("{} products cached", products.len());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod cache;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod id;
pub mod rest;
pub mod status;
pub mod store;

pub use cache::NormalizedCache;
pub use client::RestClient;
pub use config::{ClientConfig, BASE_URL_VARS, DEFAULT_BASE_URL};
pub use context::StoreContext;
pub use error::{NetworkError, StoreError};
pub use id::{record_key, EntityId};
pub use rest::{QueryParams, RestBackend};
pub use status::{KindStatus, OperationKind, OperationStatus};
pub use store::{Action, ActionOutput, Entity, EntityStore, ResponseOrdering, StoreEvent};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the entity store
    pub use crate::{
        Action, ClientConfig, Entity, EntityId, EntityStore, OperationKind, QueryParams,
        ResponseOrdering, RestBackend, RestClient, StoreContext, StoreError,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

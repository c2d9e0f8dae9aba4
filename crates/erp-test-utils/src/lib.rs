//! Testing utilities for the ERP workspace
//!
//! Scripted REST backend, response gates and shared fixtures.

#![allow(missing_docs)]

use async_trait::async_trait;
use erp_access::{NavNode, NavTree, Permission};
use erp_store::{EntityId, NetworkError, QueryParams, RestBackend};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::oneshot;

/// HTTP verb of a recorded call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    List,
    Get,
    Create,
    Update,
    Remove,
}

/// One call received by [`ScriptedBackend`]
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: Method,
    pub entity: String,
    pub id: Option<EntityId>,
    pub params: Vec<(String, String)>,
    pub body: Option<Value>,
}

/// Scripted reply for the next call
#[derive(Debug, Clone)]
pub enum Reply {
    Record(Value),
    Records(Vec<Value>),
    Fail(NetworkError),
}

struct Scripted {
    reply: Reply,
    gate: Option<oneshot::Receiver<()>>,
}

/// Releases a gated reply
#[derive(Debug)]
pub struct Gate(oneshot::Sender<()>);

impl Gate {
    /// Let the gated reply through
    pub fn open(self) {
        let _ = self.0.send(());
    }
}

/// In-memory [`RestBackend`] answering from a FIFO script.
///
/// Each call pops the next reply at the moment it is made; gated replies
/// then wait until their [`Gate`] is opened, which lets tests choose the
/// order in which concurrent responses land.
#[derive(Default)]
pub struct ScriptedBackend {
    script: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedBackend {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn push(&self, reply: Reply, gate: Option<oneshot::Receiver<()>>) {
        self.script.lock().push_back(Scripted { reply, gate });
    }

    /// Answer the next call with a single record
    pub fn reply(&self, record: Value) {
        self.push(Reply::Record(record), None);
    }

    /// Answer the next call with a record array
    pub fn reply_list(&self, records: Vec<Value>) {
        self.push(Reply::Records(records), None);
    }

    /// Fail the next call
    pub fn fail(&self, err: NetworkError) {
        self.push(Reply::Fail(err), None);
    }

    /// Fail the next call with a status error
    pub fn fail_status(&self, status: u16, message: &str) {
        self.fail(NetworkError::Status {
            status,
            message: message.to_string(),
        });
    }

    /// Answer the next call with `reply` once the returned gate opens
    #[must_use]
    pub fn gated(&self, reply: Reply) -> Gate {
        let (tx, rx) = oneshot::channel();
        self.push(reply, Some(rx));
        Gate(tx)
    }

    /// Calls received so far
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    /// Replies not yet consumed
    #[must_use]
    pub fn pending(&self) -> usize {
        self.script.lock().len()
    }

    async fn answer(&self, call: Call) -> Result<Reply, NetworkError> {
        self.calls.lock().push(call);
        let next = self.script.lock().pop_front();
        let Some(Scripted { reply, gate }) = next else {
            return Err(NetworkError::Transport("no scripted reply".to_string()));
        };
        if let Some(gate) = gate {
            gate.await
                .map_err(|_| NetworkError::Transport("gate dropped".to_string()))?;
        }
        match reply {
            Reply::Fail(err) => Err(err),
            other => Ok(other),
        }
    }
}

fn call(method: Method, entity: &str) -> Call {
    Call {
        method,
        entity: entity.to_string(),
        id: None,
        params: Vec::new(),
        body: None,
    }
}

fn single(reply: Reply) -> Result<Value, NetworkError> {
    match reply {
        Reply::Record(value) => Ok(value),
        Reply::Records(values) => Ok(Value::Array(values)),
        Reply::Fail(err) => Err(err),
    }
}

#[async_trait]
impl RestBackend for ScriptedBackend {
    async fn list(&self, entity: &str, params: &QueryParams) -> Result<Vec<Value>, NetworkError> {
        let mut c = call(Method::List, entity);
        c.params = params
            .pairs()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        match self.answer(c).await? {
            Reply::Records(values) => Ok(values),
            Reply::Record(Value::Array(values)) => Ok(values),
            Reply::Record(other) => Err(NetworkError::Decode(format!("expected array, got {other}"))),
            Reply::Fail(err) => Err(err),
        }
    }

    async fn get(&self, entity: &str, id: &EntityId) -> Result<Value, NetworkError> {
        let mut c = call(Method::Get, entity);
        c.id = Some(id.clone());
        single(self.answer(c).await?)
    }

    async fn create(&self, entity: &str, body: &Value) -> Result<Value, NetworkError> {
        let mut c = call(Method::Create, entity);
        c.body = Some(body.clone());
        single(self.answer(c).await?)
    }

    async fn update(
        &self,
        entity: &str,
        id: &EntityId,
        body: &Value,
    ) -> Result<Value, NetworkError> {
        let mut c = call(Method::Update, entity);
        c.id = Some(id.clone());
        c.body = Some(body.clone());
        single(self.answer(c).await?)
    }

    async fn remove(&self, entity: &str, id: &EntityId) -> Result<EntityId, NetworkError> {
        let mut c = call(Method::Remove, entity);
        c.id = Some(id.clone());
        self.answer(c).await?;
        Ok(id.clone())
    }
}

/// `{ "id": id, "name": name }`
#[must_use]
pub fn record(id: impl Into<Value>, name: &str) -> Value {
    json!({ "id": id.into(), "name": name })
}

/// Yield until `cond` holds; the caller's futures keep being polled meanwhile
pub async fn wait_until(mut cond: impl FnMut() -> bool) {
    while !cond() {
        tokio::task::yield_now().await;
    }
}

/// Leaf navigation node
#[must_use]
pub fn leaf(label: &str, view: &str, permission: Option<&str>) -> NavNode {
    let node = NavNode::new(label, view);
    match permission {
        Some(p) => node.with_permission(Permission::new(p)),
        None => node,
    }
}

/// Small tree: Dashboard (open), Sales (sales:read) with two children,
/// Purchases (purchases:read) with one child, Settings (open) with a gated child
#[must_use]
pub fn sample_tree() -> NavTree {
    NavTree::new(vec![
        leaf("Dashboard", "Dashboard", None),
        leaf("Sales", "Sales", Some("sales:read")).with_children(vec![
            leaf("Invoices", "Sales/Invoices", Some("sales:read")),
            leaf("Returns", "Sales/Returns", Some("sales:update")),
        ]),
        leaf("Purchases", "Purchases", Some("purchases:read")).with_children(vec![leaf(
            "Orders",
            "Purchases/Orders",
            Some("purchases:read"),
        )]),
        leaf("Settings", "Settings", None).with_children(vec![leaf(
            "Users",
            "Settings/Users",
            Some("users:read"),
        )]),
    ])
}

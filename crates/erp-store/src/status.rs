//! Per-operation loading/error status

use serde::{Deserialize, Serialize};
use std::fmt;

/// The five store operation kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// Full list fetch
    List,
    /// Single record fetch
    Get,
    /// Record creation
    Create,
    /// Record update
    Update,
    /// Record deletion
    Remove,
}

impl OperationKind {
    /// All kinds, in a fixed order
    pub const ALL: [OperationKind; 5] = [
        OperationKind::List,
        OperationKind::Get,
        OperationKind::Create,
        OperationKind::Update,
        OperationKind::Remove,
    ];

    #[inline]
    fn index(self) -> usize {
        match self {
            OperationKind::List => 0,
            OperationKind::Get => 1,
            OperationKind::Create => 2,
            OperationKind::Update => 3,
            OperationKind::Remove => 4,
        }
    }

    /// Lower-case name
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::List => "list",
            OperationKind::Get => "get",
            OperationKind::Create => "create",
            OperationKind::Update => "update",
            OperationKind::Remove => "remove",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of one operation kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KindStatus {
    in_flight: u32,
    /// Message of the last failed attempt, cleared when a new attempt starts
    pub error: Option<String>,
}

impl KindStatus {
    /// Whether at least one attempt of this kind has not settled
    #[inline]
    #[must_use]
    pub fn loading(&self) -> bool {
        self.in_flight > 0
    }
}

/// Loading/error record for all five operation kinds of one entity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OperationStatus {
    kinds: [KindStatus; 5],
}

impl OperationStatus {
    /// Create an idle status record
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Status of one kind
    #[inline]
    #[must_use]
    pub fn kind(&self, kind: OperationKind) -> &KindStatus {
        &self.kinds[kind.index()]
    }

    /// Whether an attempt of `kind` is in flight
    #[inline]
    #[must_use]
    pub fn is_loading(&self, kind: OperationKind) -> bool {
        self.kind(kind).loading()
    }

    /// Last error of `kind`
    #[inline]
    #[must_use]
    pub fn error(&self, kind: OperationKind) -> Option<&str> {
        self.kind(kind).error.as_deref()
    }

    /// Whether anything is in flight
    #[must_use]
    pub fn any_loading(&self) -> bool {
        self.kinds.iter().any(KindStatus::loading)
    }

    /// Mark the start of an attempt: loading on, previous error cleared
    pub fn start(&mut self, kind: OperationKind) {
        let status = &mut self.kinds[kind.index()];
        status.in_flight += 1;
        status.error = None;
    }

    /// Mark the end of an attempt with its outcome
    pub fn settle(&mut self, kind: OperationKind, error: Option<String>) {
        let status = &mut self.kinds[kind.index()];
        status.in_flight = status.in_flight.saturating_sub(1);
        status.error = error;
    }
}

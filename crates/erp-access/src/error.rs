//! Error types for access configuration parsing

/// Failure to interpret a role or permission given as text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    /// Role name outside the fixed enumeration
    #[error("unknown role: {0}")]
    UnknownRole(String),

    /// Text is not shaped like `domain:action`
    #[error("malformed permission {0:?}: expected domain:action")]
    MalformedPermission(String),
}

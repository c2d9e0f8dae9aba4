//! Error types for the entity store
//!
//! Two layers:
//! - [`NetworkError`] for anything the REST backend reports
//! - [`StoreError`] for the store operation boundary

/// Failure reported by a REST backend call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetworkError {
    /// Server answered with a non-success status.
    ///
    /// `message` is the response body, or the status text when the body was empty.
    #[error("{message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Body text or status text
        message: String,
    },

    /// The HTTP client itself failed (DNS, refused connection, ...)
    #[error("request failed: {0}")]
    Transport(String),

    /// The response body was not the JSON shape expected
    #[error("invalid response body: {0}")]
    Decode(String),

    /// Configured base URL cannot be used to build request URLs
    #[error("invalid base url {url}: {reason}")]
    InvalidBaseUrl {
        /// The offending URL
        url: String,
        /// Parser message
        reason: String,
    },
}

impl NetworkError {
    /// Build a status error, falling back to the status text when the body is empty
    #[must_use]
    pub fn from_status(status: u16, body: &str, status_text: &str) -> Self {
        let message = if body.is_empty() {
            status_text.to_string()
        } else {
            body.to_string()
        };
        Self::Status { status, message }
    }

    /// HTTP status code, if the server answered at all
    #[inline]
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for NetworkError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Error surfaced by an entity store operation
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// Backend call failed
    #[error(transparent)]
    Network(#[from] NetworkError),

    /// Server response carried neither `id` nor `_id`
    #[error("{entity}: response record has no id")]
    MissingId {
        /// Entity name
        entity: String,
    },

    /// Server record does not match the store's record type
    #[error("{entity}: cannot decode record: {reason}")]
    Decode {
        /// Entity name
        entity: String,
        /// serde message
        reason: String,
    },

    /// Request body could not be serialized
    #[error("{entity}: cannot encode request body: {reason}")]
    Encode {
        /// Entity name
        entity: String,
        /// serde message
        reason: String,
    },

    /// A store for this entity already exists with another record type
    #[error("store for {entity} was created with a different record type")]
    TypeMismatch {
        /// Entity name
        entity: String,
    },
}

impl StoreError {
    /// Whether the failure came from the network layer
    #[inline]
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_prefers_body() {
        let err = NetworkError::from_status(422, "name is required", "Unprocessable Entity");
        assert_eq!(err.to_string(), "name is required");
        assert_eq!(err.status(), Some(422));
    }

    #[test]
    fn status_error_falls_back_to_status_text() {
        let err = NetworkError::from_status(404, "", "Not Found");
        assert_eq!(err.to_string(), "Not Found");
    }

    #[test]
    fn store_error_is_transparent_over_network() {
        let err: StoreError = NetworkError::Transport("connection refused".into()).into();
        assert!(err.is_network());
        assert_eq!(err.to_string(), "request failed: connection refused");
    }

    #[test]
    fn missing_id_names_entity() {
        let err = StoreError::MissingId {
            entity: "branches".into(),
        };
        assert!(err.to_string().contains("branches"));
        assert!(!err.is_network());
    }
}

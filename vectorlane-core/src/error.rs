//! Error types for VectorLane operations.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using VectorLane's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while driving a collection workflow.
///
/// Errors are serializable so that a server can hand them back over the wire
/// and the client can surface the exact same variant to its caller.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum Error {
    /// The server could not be reached or the handshake failed.
    #[error("connection to {address} failed: {reason}")]
    Connection { address: String, reason: String },

    /// No session is registered under the given alias.
    #[error("no connection registered under alias '{0}'")]
    NotConnected(String),

    /// Field list violates the collection schema invariants.
    #[error("schema error: {0}")]
    Schema(String),

    /// A collection with this name already exists.
    #[error("collection already exists: {0}")]
    AlreadyExists(String),

    /// The named collection does not exist.
    #[error("collection not found: {0}")]
    CollectionNotFound(String),

    /// Turning text into vectors failed.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// A record does not satisfy its field definition.
    #[error("invalid record at row {row}, field '{field}': {reason}")]
    Validation {
        row: usize,
        field: String,
        reason: String,
    },

    /// Index algorithm, metric or parameters are not supported.
    #[error("unsupported index: {0}")]
    UnsupportedIndex(String),

    /// The field is missing from the schema or has the wrong kind.
    #[error("field not found: {0}")]
    FieldNotFound(String),

    /// The server failed to build the index.
    #[error("index build failed: {0}")]
    IndexBuild(String),

    /// The collection must be loaded before it can be searched.
    #[error("collection not loaded: {0}")]
    NotLoaded(String),

    /// The collection cannot be loaded without an index.
    #[error("collection not indexed: {0}")]
    NotIndexed(String),

    /// Vector dimension mismatch between schema and input.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// The filter expression could not be parsed.
    #[error("invalid filter expression: {0}")]
    FilterSyntax(String),

    /// Malformed request (limits, empty query set, mismatched metric).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Any other failure reported by the server.
    #[error("server error: {0}")]
    Server(String),
}

impl Error {
    /// Stable non-zero code used in wire envelopes.
    pub fn code(&self) -> i32 {
        match self {
            Error::Connection { .. } => 1,
            Error::NotConnected(_) => 2,
            Error::Schema(_) => 100,
            Error::AlreadyExists(_) => 101,
            Error::CollectionNotFound(_) => 102,
            Error::Encoding(_) => 200,
            Error::Validation { .. } => 201,
            Error::UnsupportedIndex(_) => 300,
            Error::FieldNotFound(_) => 301,
            Error::IndexBuild(_) => 302,
            Error::NotLoaded(_) => 400,
            Error::NotIndexed(_) => 401,
            Error::DimensionMismatch { .. } => 402,
            Error::FilterSyntax(_) => 403,
            Error::InvalidRequest(_) => 404,
            Error::Server(_) => 500,
        }
    }

    /// Returns true for errors raised by the network layer rather than by
    /// request semantics.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Connection { .. } | Error::Server(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::DimensionMismatch {
            expected: 128,
            got: 127,
        };
        assert_eq!(err.to_string(), "dimension mismatch: expected 128, got 127");

        let err = Error::Validation {
            row: 3,
            field: "text".into(),
            reason: "too long".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid record at row 3, field 'text': too long"
        );
    }

    #[test]
    fn test_error_wire_roundtrip() {
        let err = Error::NotLoaded("demo_collection".into());
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "not_loaded");

        let back: Error = serde_json::from_value(json).unwrap();
        assert_eq!(back, err);
    }

    #[test]
    fn test_error_codes_are_distinct() {
        let errors = [
            Error::Schema(String::new()),
            Error::AlreadyExists(String::new()),
            Error::NotLoaded(String::new()),
            Error::NotIndexed(String::new()),
            Error::FilterSyntax(String::new()),
            Error::Server(String::new()),
        ];
        let mut codes: Vec<i32> = errors.iter().map(Error::code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
        assert!(codes.iter().all(|c| *c != 0));
    }
}

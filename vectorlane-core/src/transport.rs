//! The RPC boundary to a vector database server.
//!
//! Everything the workflow needs from the server goes through [`Transport`].
//! The client never assumes anything about how the server stores data or
//! builds indexes; it only relies on the contract documented per method.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::index::IndexSpec;
use crate::schema::CollectionSchema;
use crate::search::{SearchRequest, SearchResults};
use crate::staging::{InsertAck, InsertBatch};

/// Whether a collection is held in server memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoadState {
    NotExist,
    NotLoad,
    Loaded,
}

/// Synchronous request/response operations offered by a server.
///
/// Every call blocks until the server acknowledges it. Implementations do
/// not retry; failures surface immediately.
pub trait Transport: Send + Sync {
    /// Address of the server, for logging and error messages.
    fn address(&self) -> &str;

    /// Handshake. Fails with `Error::Connection` if the server is unreachable.
    fn ping(&self) -> Result<()>;

    fn has_collection(&self, name: &str) -> Result<bool>;

    fn list_collections(&self) -> Result<Vec<String>>;

    /// Fails with `Error::AlreadyExists` if the name is taken.
    fn create_collection(&self, name: &str, schema: &CollectionSchema) -> Result<()>;

    fn describe_collection(&self, name: &str) -> Result<CollectionSchema>;

    /// Fails with `Error::CollectionNotFound` if absent.
    fn drop_collection(&self, name: &str) -> Result<()>;

    /// Applies the whole batch or nothing.
    fn insert(&self, name: &str, batch: &InsertBatch) -> Result<InsertAck>;

    fn row_count(&self, name: &str) -> Result<usize>;

    /// Returns once the index build is acknowledged.
    fn create_index(&self, name: &str, field: &str, spec: &IndexSpec) -> Result<()>;

    fn describe_index(&self, name: &str, field: &str) -> Result<Option<IndexSpec>>;

    fn drop_index(&self, name: &str, field: &str) -> Result<()>;

    /// Fails with `Error::NotIndexed` if a vector field has no index.
    fn load_collection(&self, name: &str) -> Result<()>;

    fn release_collection(&self, name: &str) -> Result<()>;

    fn load_state(&self, name: &str) -> Result<LoadState>;

    /// Fails with `Error::NotLoaded` unless the collection is loaded.
    fn search(&self, name: &str, request: &SearchRequest) -> Result<SearchResults>;
}

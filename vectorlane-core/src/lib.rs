//! # VectorLane Core
//!
//! Client library for driving a vector database through the full
//! collection lifecycle: connect, define a schema, create a collection,
//! insert records (optionally embedding text on the way), build an index,
//! load, search, release and drop.
//!
//! ## Crate Features
//!
//! - `http` (default) - [`HttpTransport`] and [`OllamaEmbedding`], both on
//!   blocking `reqwest`
//!
//! ## Core Types
//!
//! ### Sessions
//!
//! - [`Connections`] - Alias-keyed registry of sessions
//! - [`Connection`] - One session; creates, attaches to and drops collections
//! - [`Transport`] - The request/response boundary to a server
//! - [`MemoryServer`] - In-process server with exact search
//!
//! ### Collections
//!
//! - [`CollectionSchema`] / [`FieldSchema`] - Validated field definitions
//! - [`Collection`] - Insert, index, load, search, release, drop
//! - [`Record`] - One entity as field name to value, or pending text
//! - [`IndexSpec`] - Typed index algorithm and metric
//! - [`SearchRequest`] / [`SearchResults`] - Similarity search
//! - [`Filter`] - Boolean expressions over scalar fields

pub mod collection;
pub mod connection;
pub mod distance;
pub mod embedding;
pub mod error;
pub mod filter;
#[cfg(feature = "http")]
pub mod http;
pub mod index;
pub mod memory;
pub mod record;
pub mod schema;
pub mod search;
pub mod staging;
pub mod transport;
pub mod wire;

// Re-exports for convenient access
pub use collection::{Collection, CollectionState};
pub use connection::{Connection, Connections, DEFAULT_ALIAS};
pub use embedding::EmbeddingFunction;
#[cfg(feature = "http")]
pub use embedding::{OllamaEmbedding, DEFAULT_OLLAMA_URL};
pub use error::{Error, Result};
pub use filter::{FieldFilter, Filter, FilterCondition};
#[cfg(feature = "http")]
pub use http::HttpTransport;
pub use index::{IndexSpec, IndexType, MetricType};
pub use memory::MemoryServer;
pub use record::Record;
pub use schema::{build_schema, CollectionSchema, DataType, FieldSchema};
pub use search::{
    ConsistencyLevel, Hit, Hits, SearchParams, SearchRequest, SearchResults, SearchTuning,
};
pub use staging::{stage, Column, ColumnData, InsertAck, InsertBatch, PrimaryKey};
pub use transport::{LoadState, Transport};

/// Re-export commonly used types for convenience.
///
/// # Example
///
/// ```rust
/// use vectorlane_core::prelude::*;
///
/// let schema = build_schema(vec![
///     FieldSchema::int64("id").primary(),
///     FieldSchema::float_vector("embedding", 128),
/// ])
/// .unwrap();
/// let spec = IndexSpec::ivf_flat(MetricType::L2, 128).unwrap();
/// assert_eq!(spec.to_string(), "IVF_FLAT/L2");
/// assert_eq!(schema.vector_fields().count(), 1);
/// ```
pub mod prelude {
    pub use crate::{
        build_schema, Collection, CollectionSchema, CollectionState, Connection, Connections,
        ConsistencyLevel, DataType, EmbeddingFunction, Error, FieldSchema, Filter, Hits,
        IndexSpec, IndexType, InsertAck, LoadState, MemoryServer, MetricType, PrimaryKey, Record,
        Result, SearchParams, SearchRequest, SearchResults, Transport,
    };
}

//! Collection handles: insert, index, load, search, release, drop.
//!
//! A [`Collection`] is a client-side handle to a server-side collection. It
//! keeps the schema so that records and queries are checked before they are
//! sent, and tracks the last known lifecycle state:
//!
//! ```text
//! Absent --create--> Created --create_index--> Indexed --load--> Loaded
//! Loaded --release--> Released --load--> Loaded
//! any --drop--> Absent
//! ```
//!
//! Search is only valid while Loaded; the server is the authority on that.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::embedding::EmbeddingFunction;
use crate::error::{Error, Result};
use crate::index::IndexSpec;
use crate::record::Record;
use crate::schema::CollectionSchema;
use crate::search::{SearchRequest, SearchResults};
use crate::staging::{stage, InsertAck};
use crate::transport::{LoadState, Transport};

/// Last known lifecycle state of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionState {
    Absent,
    Created,
    Indexed,
    Loaded,
    Released,
}

/// Handle to a server-side collection.
///
/// Clones share lifecycle state and an operation gate: `search` and
/// `insert` run concurrently with each other, while `drop` and `release`
/// wait for in-flight operations on the same handle family to finish.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use vectorlane_core::prelude::*;
///
/// let conn = Connection::open("default", Arc::new(MemoryServer::new())).unwrap();
/// let schema = build_schema(vec![
///     FieldSchema::int64("id").primary(),
///     FieldSchema::float_vector("embedding", 3),
/// ])
/// .unwrap();
/// let collection = conn.create_collection("demo", schema).unwrap();
///
/// let records = vec![
///     Record::new().with_field("id", 0).with_vector("embedding", vec![1.0, 0.0, 0.0]),
///     Record::new().with_field("id", 1).with_vector("embedding", vec![0.0, 1.0, 0.0]),
/// ];
/// collection.insert(&records, None).unwrap();
/// collection.create_index("embedding", &IndexSpec::flat(MetricType::L2)).unwrap();
/// collection.load().unwrap();
///
/// let request = SearchRequest::new("embedding", vec![vec![0.0, 1.0, 0.0]], SearchParams::new(MetricType::L2)).limit(1);
/// let results = collection.search(&request).unwrap();
/// assert_eq!(results.get(0).unwrap().top().unwrap().id, PrimaryKey::Int(1));
/// ```
#[derive(Clone)]
pub struct Collection {
    name: String,
    schema: Arc<CollectionSchema>,
    transport: Arc<dyn Transport>,
    state: Arc<RwLock<CollectionState>>,
    gate: Arc<RwLock<()>>,
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.name)
            .field("state", &self.state())
            .field("address", &self.transport.address())
            .finish()
    }
}

impl Collection {
    pub(crate) fn new(
        name: &str,
        schema: CollectionSchema,
        transport: Arc<dyn Transport>,
        state: CollectionState,
    ) -> Self {
        Self {
            name: name.to_string(),
            schema: Arc::new(schema),
            transport,
            state: Arc::new(RwLock::new(state)),
            gate: Arc::new(RwLock::new(())),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn schema(&self) -> &CollectionSchema {
        &self.schema
    }

    /// Last known lifecycle state.
    pub fn state(&self) -> CollectionState {
        *self.state.read()
    }

    fn set_state(&self, state: CollectionState) {
        let mut current = self.state.write();
        if *current != state {
            debug!(collection = %self.name, from = ?*current, to = ?state, "state change");
            *current = state;
        }
    }

    /// Server-reported load state.
    pub fn load_state(&self) -> Result<LoadState> {
        self.transport.load_state(&self.name)
    }

    /// Removes the collection and all its data from the server.
    pub fn drop(self) -> Result<()> {
        let _gate = self.gate.write();
        self.transport.drop_collection(&self.name)?;
        self.set_state(CollectionState::Absent);
        info!(collection = %self.name, "dropped collection");
        Ok(())
    }

    /// Stages and inserts records.
    ///
    /// Records carrying text for a vector field are encoded with `embedder`.
    /// Staging runs before anything is sent: a batch with any invalid record
    /// is rejected whole with no network call.
    pub fn insert(
        &self,
        records: &[Record],
        embedder: Option<&dyn EmbeddingFunction>,
    ) -> Result<InsertAck> {
        let batch = stage(records, &self.schema, embedder)?;
        if batch.is_empty() {
            warn!(collection = %self.name, "insert called with no records");
        }

        let _gate = self.gate.read();
        let ack = self.transport.insert(&self.name, &batch)?;
        info!(collection = %self.name, count = ack.insert_count, "inserted records");
        Ok(ack)
    }

    /// Number of stored entities.
    pub fn num_entities(&self) -> Result<usize> {
        self.transport.row_count(&self.name)
    }

    /// Builds an index on a vector field and waits for the acknowledgment.
    ///
    /// # Errors
    ///
    /// - [`Error::FieldNotFound`] if `field` is not a vector field.
    /// - [`Error::UnsupportedIndex`] if the server rejects the combination.
    /// - [`Error::IndexBuild`] if the build fails or the server is unreachable.
    pub fn create_index(&self, field: &str, spec: &IndexSpec) -> Result<()> {
        self.schema.vector_field(field)?;
        spec.validate()?;

        self.transport
            .create_index(&self.name, field, spec)
            .map_err(|e| {
                if e.is_transport() {
                    Error::IndexBuild(e.to_string())
                } else {
                    e
                }
            })?;

        if self.state() == CollectionState::Created {
            self.set_state(CollectionState::Indexed);
        }
        info!(collection = %self.name, field, index = %spec, "created index");
        Ok(())
    }

    /// Describes the index on `field`, if any.
    pub fn index(&self, field: &str) -> Result<Option<IndexSpec>> {
        self.schema.vector_field(field)?;
        self.transport.describe_index(&self.name, field)
    }

    /// Drops the index on `field`. Rejected by the server while loaded.
    pub fn drop_index(&self, field: &str) -> Result<()> {
        self.schema.vector_field(field)?;
        self.transport.drop_index(&self.name, field)?;
        if self.state() == CollectionState::Indexed {
            self.set_state(CollectionState::Created);
        }
        Ok(())
    }

    /// Loads the collection into server memory for searching.
    pub fn load(&self) -> Result<()> {
        self.transport.load_collection(&self.name)?;
        self.set_state(CollectionState::Loaded);
        info!(collection = %self.name, "loaded collection");
        Ok(())
    }

    /// Releases the collection from server memory. No-op when not loaded.
    pub fn release(&self) -> Result<()> {
        let _gate = self.gate.write();
        self.transport.release_collection(&self.name)?;
        if self.state() == CollectionState::Loaded {
            self.set_state(CollectionState::Released);
            info!(collection = %self.name, "released collection");
        }
        Ok(())
    }

    /// Runs a similarity search.
    ///
    /// The request is checked against the schema first; query vectors of the
    /// wrong dimension fail with [`Error::DimensionMismatch`] without
    /// contacting the server.
    pub fn search(&self, request: &SearchRequest) -> Result<SearchResults> {
        request.validate()?;

        let field = self.schema.vector_field(request.anns_field())?;
        let dim = field.dim().unwrap_or_default();
        if let Some(bad) = request.vectors().iter().find(|v| v.len() != dim) {
            return Err(Error::DimensionMismatch {
                expected: dim,
                got: bad.len(),
            });
        }
        for name in request.output_field_names() {
            if name != "*" && self.schema.field(name).is_none() {
                return Err(Error::FieldNotFound(format!(
                    "output field '{}' is not in the schema of '{}'",
                    name, self.name
                )));
            }
        }

        let _gate = self.gate.read();
        let results = self.transport.search(&self.name, request)?;
        let total: usize = results.iter().map(|h| h.len()).sum();
        if total == 0 {
            warn!(collection = %self.name, "search returned no hits");
        }
        debug!(collection = %self.name, queries = results.len(), hits = total, "search complete");
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Connection;
    use crate::index::MetricType;
    use crate::memory::MemoryServer;
    use crate::schema::{build_schema, FieldSchema};
    use crate::search::SearchParams;

    fn collection() -> Collection {
        let conn = Connection::open("t", Arc::new(MemoryServer::new())).unwrap();
        let schema = build_schema(vec![
            FieldSchema::int64("id").primary(),
            FieldSchema::float_vector("embedding", 4),
            FieldSchema::varchar("text", 16),
        ])
        .unwrap();
        conn.create_collection("c", schema).unwrap()
    }

    #[test]
    fn test_state_transitions() {
        let c = collection();
        assert_eq!(c.state(), CollectionState::Created);

        c.create_index("embedding", &IndexSpec::flat(MetricType::L2))
            .unwrap();
        assert_eq!(c.state(), CollectionState::Indexed);

        c.load().unwrap();
        assert_eq!(c.state(), CollectionState::Loaded);
        assert_eq!(c.load_state().unwrap(), LoadState::Loaded);

        c.release().unwrap();
        assert_eq!(c.state(), CollectionState::Released);

        // Releasing again is a no-op
        c.release().unwrap();
        assert_eq!(c.state(), CollectionState::Released);

        let clone = c.clone();
        c.drop().unwrap();
        assert_eq!(clone.state(), CollectionState::Absent);
    }

    #[test]
    fn test_create_index_on_scalar_field() {
        let c = collection();
        assert!(matches!(
            c.create_index("text", &IndexSpec::flat(MetricType::L2)),
            Err(Error::FieldNotFound(_))
        ));
        assert!(matches!(
            c.create_index("nope", &IndexSpec::flat(MetricType::L2)),
            Err(Error::FieldNotFound(_))
        ));
    }

    #[test]
    fn test_search_checks_dimension_locally() {
        let c = collection();
        let request = SearchRequest::new(
            "embedding",
            vec![vec![0.0; 3]],
            SearchParams::new(MetricType::L2),
        );
        // Not loaded either, but the dimension check comes first
        assert_eq!(
            c.search(&request).unwrap_err(),
            Error::DimensionMismatch {
                expected: 4,
                got: 3
            }
        );
    }

    #[test]
    fn test_search_unknown_output_field() {
        let c = collection();
        let request = SearchRequest::new(
            "embedding",
            vec![vec![0.0; 4]],
            SearchParams::new(MetricType::L2),
        )
        .output_fields(["missing"]);
        assert!(matches!(c.search(&request), Err(Error::FieldNotFound(_))));
    }

    #[test]
    fn test_insert_rejects_before_send() {
        let c = collection();
        let records = vec![Record::new()
            .with_field("id", 1)
            .with_vector("embedding", vec![0.0; 5])];
        assert!(matches!(
            c.insert(&records, None),
            Err(Error::Validation { row: 0, .. })
        ));
        assert_eq!(c.num_entities().unwrap(), 0);
    }
}

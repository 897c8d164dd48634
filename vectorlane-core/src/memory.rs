//! In-process server.
//!
//! [`MemoryServer`] implements [`Transport`] entirely in memory with exact
//! (brute-force) search. It enforces the same lifecycle rules as a real
//! server: indexes before load, load before search, whole-batch inserts.
//! Index parameters are recorded and checked but search is always exact, so
//! results match what a FLAT index would return.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::filter::Filter;
use crate::index::{IndexSpec, IndexType};
use crate::record::Record;
use crate::schema::{CollectionSchema, DataType, FieldSchema};
use crate::search::{Hit, Hits, SearchRequest, SearchResults};
use crate::staging::{ColumnData, InsertAck, InsertBatch, PrimaryKey};
use crate::transport::{LoadState, Transport};

/// One stored entity.
#[derive(Debug, Clone)]
struct Row {
    id: PrimaryKey,
    scalars: Record,
    vectors: HashMap<String, Vec<f32>>,
}

#[derive(Debug)]
struct StoredCollection {
    schema: CollectionSchema,
    rows: Vec<Row>,
    indexes: HashMap<String, IndexSpec>,
    loaded: bool,
    next_auto_id: i64,
}

impl StoredCollection {
    fn new(schema: CollectionSchema) -> Self {
        Self {
            schema,
            rows: Vec::new(),
            indexes: HashMap::new(),
            loaded: false,
            next_auto_id: 1,
        }
    }

    /// Checks the whole batch before any row is applied.
    fn check_batch(&self, batch: &InsertBatch) -> Result<()> {
        for column in &batch.columns {
            let field = self.schema.field(&column.field).ok_or_else(|| {
                Error::InvalidRequest(format!("unknown column '{}'", column.field))
            })?;
            if field.is_auto_id() {
                return Err(Error::InvalidRequest(format!(
                    "column '{}' is an auto_id primary key",
                    column.field
                )));
            }
            check_column_type(field, &column.data)?;
            if column.data.len() != batch.num_rows {
                return Err(Error::InvalidRequest(format!(
                    "column '{}' has {} rows, batch declares {}",
                    column.field,
                    column.data.len(),
                    batch.num_rows
                )));
            }
        }

        for field in self.schema.fields().iter().filter(|f| !f.is_auto_id()) {
            if batch.column(field.name()).is_none() {
                return Err(Error::InvalidRequest(format!(
                    "missing column '{}'",
                    field.name()
                )));
            }
        }
        Ok(())
    }

    fn append(&mut self, batch: &InsertBatch) -> Vec<PrimaryKey> {
        let primary = self.schema.primary_field();
        let primary_name = primary.name().to_string();
        let auto_id = primary.is_auto_id();

        let mut ids = Vec::with_capacity(batch.num_rows);
        for row in 0..batch.num_rows {
            let mut scalars = Record::new();
            let mut vectors = HashMap::new();
            for column in &batch.columns {
                if let Some(vector) = column.data.vector(row) {
                    vectors.insert(column.field.clone(), vector.to_vec());
                } else if let Some(value) = column.data.value(row) {
                    scalars.set(column.field.clone(), value);
                }
            }

            let id = if auto_id {
                let id = self.next_auto_id;
                self.next_auto_id += 1;
                scalars.set(primary_name.clone(), id);
                PrimaryKey::Int(id)
            } else {
                match scalars.get(&primary_name) {
                    Some(serde_json::Value::String(s)) => PrimaryKey::Str(s.clone()),
                    Some(v) => PrimaryKey::Int(v.as_i64().unwrap_or_default()),
                    None => PrimaryKey::Int(0),
                }
            };

            ids.push(id.clone());
            self.rows.push(Row {
                id,
                scalars,
                vectors,
            });
        }
        ids
    }

    fn search(&self, name: &str, request: &SearchRequest) -> Result<SearchResults> {
        if !self.loaded {
            return Err(Error::NotLoaded(name.to_string()));
        }
        request.validate()?;

        let field = self.schema.vector_field(request.anns_field())?;
        let dim = field.dim().unwrap_or_default();
        let spec = self
            .indexes
            .get(field.name())
            .ok_or_else(|| Error::NotIndexed(format!("{}.{}", name, field.name())))?;
        let metric = request.params().metric_type();
        if metric != spec.metric_type() {
            return Err(Error::InvalidRequest(format!(
                "search metric {} does not match index metric {}",
                metric,
                spec.metric_type()
            )));
        }
        if let Some(bad) = request.vectors().iter().find(|v| v.len() != dim) {
            return Err(Error::DimensionMismatch {
                expected: dim,
                got: bad.len(),
            });
        }

        let filter = match request.filter_expr() {
            Some(expr) => Some(self.parse_filter(expr)?),
            None => None,
        };
        let outputs = self.resolve_output_fields(request.output_field_names())?;

        let candidates: Vec<&Row> = self
            .rows
            .iter()
            .filter(|row| filter.as_ref().map_or(true, |f| f.matches(&row.scalars)))
            .collect();

        let mut queries = Vec::with_capacity(request.vectors().len());
        for query in request.vectors() {
            let mut scored: Vec<(f32, &Row)> = candidates
                .iter()
                .filter_map(|row| {
                    let stored = row.vectors.get(field.name())?;
                    metric.distance(query, stored).map(|d| (d, *row))
                })
                .collect();
            // Stable: equal distances keep insertion order
            scored.sort_by(|a, b| a.0.total_cmp(&b.0));
            scored.truncate(request.limit_value());

            let hits = scored
                .into_iter()
                .map(|(distance, row)| Hit {
                    id: row.id.clone(),
                    distance,
                    entity: project(row, &outputs),
                })
                .collect();
            queries.push(Hits::new(hits));
        }
        Ok(SearchResults::new(queries))
    }

    fn parse_filter(&self, expr: &str) -> Result<Filter> {
        let filter = Filter::parse(expr)?;
        for name in filter.fields() {
            match self.schema.field(name) {
                None => {
                    return Err(Error::FilterSyntax(format!(
                        "unknown field '{}' in filter",
                        name
                    )))
                }
                Some(f) if f.is_vector() => {
                    return Err(Error::FilterSyntax(format!(
                        "vector field '{}' cannot be filtered",
                        name
                    )))
                }
                Some(_) => {}
            }
        }
        Ok(filter)
    }

    fn resolve_output_fields(&self, requested: &[String]) -> Result<Vec<String>> {
        let mut outputs: Vec<String> = Vec::new();
        for name in requested {
            if name == "*" {
                for f in self.schema.scalar_fields() {
                    if !outputs.iter().any(|o| o == f.name()) {
                        outputs.push(f.name().to_string());
                    }
                }
            } else if self.schema.field(name).is_some() {
                if !outputs.contains(name) {
                    outputs.push(name.clone());
                }
            } else {
                return Err(Error::FieldNotFound(format!(
                    "output field '{}' is not in the schema",
                    name
                )));
            }
        }
        Ok(outputs)
    }
}

fn check_column_type(field: &FieldSchema, data: &ColumnData) -> Result<()> {
    let ok = match (field.data_type(), data) {
        (DataType::Bool, ColumnData::Bool(_)) => true,
        (dt, ColumnData::Int(values)) if dt.is_integer() => match dt.integer_range() {
            Some((lo, hi)) => values.iter().all(|v| (lo..=hi).contains(v)),
            None => true,
        },
        (DataType::Float | DataType::Double, ColumnData::Float(_)) => true,
        (DataType::VarChar, ColumnData::Str(values)) => {
            let max = field.max_length().unwrap_or(usize::MAX);
            values.iter().all(|s| s.len() <= max)
        }
        (DataType::FloatVector, ColumnData::FloatVector { dim, data }) => {
            let expected = field.dim().unwrap_or_default();
            if *dim != expected {
                return Err(Error::DimensionMismatch {
                    expected,
                    got: *dim,
                });
            }
            if expected > 0 && data.len() % expected != 0 {
                return Err(Error::InvalidRequest(format!(
                    "column '{}' holds {} floats, not a whole number of {}-dim vectors",
                    field.name(),
                    data.len(),
                    expected
                )));
            }
            true
        }
        _ => false,
    };
    if ok {
        Ok(())
    } else {
        Err(Error::InvalidRequest(format!(
            "column '{}' does not fit field type {}",
            field.name(),
            field.data_type()
        )))
    }
}

fn project(row: &Row, outputs: &[String]) -> Record {
    let mut entity = Record::new();
    for name in outputs {
        if let Some(value) = row.scalars.get(name) {
            entity.set(name.clone(), value.clone());
        } else if let Some(vector) = row.vectors.get(name) {
            entity.set(name.clone(), vector.clone());
        }
    }
    entity
}

/// A [`Transport`] backed by process memory.
///
/// # Example
///
/// ```
/// use vectorlane_core::{build_schema, FieldSchema, MemoryServer, Transport};
///
/// let server = MemoryServer::new();
/// let schema = build_schema(vec![
///     FieldSchema::int64("id").primary(),
///     FieldSchema::float_vector("embedding", 4),
/// ])
/// .unwrap();
///
/// server.create_collection("demo", &schema).unwrap();
/// assert!(server.has_collection("demo").unwrap());
/// assert!(server.create_collection("demo", &schema).is_err());
/// ```
#[derive(Debug, Default)]
pub struct MemoryServer {
    collections: RwLock<HashMap<String, Arc<RwLock<StoredCollection>>>>,
}

impl MemoryServer {
    pub fn new() -> Self {
        Self::default()
    }

    fn get(&self, name: &str) -> Result<Arc<RwLock<StoredCollection>>> {
        self.collections
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::CollectionNotFound(name.to_string()))
    }
}

impl Transport for MemoryServer {
    fn address(&self) -> &str {
        "memory"
    }

    fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn has_collection(&self, name: &str) -> Result<bool> {
        Ok(self.collections.read().contains_key(name))
    }

    fn list_collections(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.collections.read().keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn create_collection(&self, name: &str, schema: &CollectionSchema) -> Result<()> {
        if name.is_empty() {
            return Err(Error::InvalidRequest("collection name is empty".into()));
        }
        let mut collections = self.collections.write();
        if collections.contains_key(name) {
            return Err(Error::AlreadyExists(name.to_string()));
        }
        collections.insert(
            name.to_string(),
            Arc::new(RwLock::new(StoredCollection::new(schema.clone()))),
        );
        info!(collection = name, fields = schema.fields().len(), "collection created");
        Ok(())
    }

    fn describe_collection(&self, name: &str) -> Result<CollectionSchema> {
        Ok(self.get(name)?.read().schema.clone())
    }

    fn drop_collection(&self, name: &str) -> Result<()> {
        match self.collections.write().remove(name) {
            Some(_) => {
                info!(collection = name, "collection dropped");
                Ok(())
            }
            None => Err(Error::CollectionNotFound(name.to_string())),
        }
    }

    fn insert(&self, name: &str, batch: &InsertBatch) -> Result<InsertAck> {
        let collection = self.get(name)?;
        let mut collection = collection.write();
        collection.check_batch(batch)?;
        let ids = collection.append(batch);
        debug!(collection = name, rows = ids.len(), "rows inserted");
        Ok(InsertAck {
            insert_count: ids.len(),
            ids,
        })
    }

    fn row_count(&self, name: &str) -> Result<usize> {
        Ok(self.get(name)?.read().rows.len())
    }

    fn create_index(&self, name: &str, field: &str, spec: &IndexSpec) -> Result<()> {
        spec.validate()?;
        let collection = self.get(name)?;
        let mut collection = collection.write();

        let dim = collection
            .schema
            .vector_field(field)?
            .dim()
            .unwrap_or_default();
        if spec.metric_type().is_binary() {
            return Err(Error::UnsupportedIndex(format!(
                "metric {} requires binary vectors, '{}' is a float vector",
                spec.metric_type(),
                field
            )));
        }
        if let IndexType::IvfPq { m, .. } = spec.index_type() {
            if dim % m as usize != 0 {
                return Err(Error::UnsupportedIndex(format!(
                    "IVF_PQ m={} does not divide dimension {}",
                    m, dim
                )));
            }
        }

        match collection.indexes.get(field) {
            Some(existing) if existing == spec => Ok(()),
            Some(existing) => Err(Error::IndexBuild(format!(
                "field '{}' already has index {}",
                field, existing
            ))),
            None => {
                collection.indexes.insert(field.to_string(), *spec);
                info!(collection = name, field, index = %spec, "index built");
                Ok(())
            }
        }
    }

    fn describe_index(&self, name: &str, field: &str) -> Result<Option<IndexSpec>> {
        let collection = self.get(name)?;
        let collection = collection.read();
        collection.schema.vector_field(field)?;
        Ok(collection.indexes.get(field).copied())
    }

    fn drop_index(&self, name: &str, field: &str) -> Result<()> {
        let collection = self.get(name)?;
        let mut collection = collection.write();
        collection.schema.vector_field(field)?;
        if collection.loaded {
            return Err(Error::InvalidRequest(format!(
                "release collection '{}' before dropping its index",
                name
            )));
        }
        collection.indexes.remove(field);
        Ok(())
    }

    fn load_collection(&self, name: &str) -> Result<()> {
        let collection = self.get(name)?;
        let mut collection = collection.write();
        let missing: Vec<&str> = collection
            .schema
            .vector_fields()
            .map(FieldSchema::name)
            .filter(|f| !collection.indexes.contains_key(*f))
            .collect();
        if !missing.is_empty() {
            return Err(Error::NotIndexed(format!(
                "{}: no index on {}",
                name,
                missing.join(", ")
            )));
        }
        collection.loaded = true;
        info!(collection = name, rows = collection.rows.len(), "collection loaded");
        Ok(())
    }

    fn release_collection(&self, name: &str) -> Result<()> {
        let collection = self.get(name)?;
        let mut collection = collection.write();
        if collection.loaded {
            collection.loaded = false;
            info!(collection = name, "collection released");
        }
        Ok(())
    }

    fn load_state(&self, name: &str) -> Result<LoadState> {
        let Some(collection) = self.collections.read().get(name).cloned() else {
            return Ok(LoadState::NotExist);
        };
        let loaded = collection.read().loaded;
        Ok(if loaded {
            LoadState::Loaded
        } else {
            LoadState::NotLoad
        })
    }

    fn search(&self, name: &str, request: &SearchRequest) -> Result<SearchResults> {
        let collection = self.get(name)?;
        let collection = collection.read();
        debug!(
            collection = name,
            queries = request.vectors().len(),
            limit = request.limit_value(),
            consistency = ?request.consistency_level(),
            "search"
        );
        collection.search(name, request)
    }
}

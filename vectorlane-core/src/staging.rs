//! Data staging: validate records and convert them into wire-ready batches.
//!
//! Staging happens entirely on the client. A batch that fails staging is
//! never sent, so an invalid record cannot cause a partial insert.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::embedding::EmbeddingFunction;
use crate::error::{Error, Result};
use crate::record::Record;
use crate::schema::{CollectionSchema, DataType, FieldSchema};

/// A primary key value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrimaryKey {
    Int(i64),
    Str(String),
}

impl PrimaryKey {
    #[inline]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PrimaryKey::Int(v) => Some(*v),
            PrimaryKey::Str(_) => None,
        }
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PrimaryKey::Int(_) => None,
            PrimaryKey::Str(s) => Some(s),
        }
    }

    /// The key as a JSON value, for entity maps.
    pub fn to_value(&self) -> Value {
        match self {
            PrimaryKey::Int(v) => Value::from(*v),
            PrimaryKey::Str(s) => Value::from(s.as_str()),
        }
    }
}

impl fmt::Display for PrimaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimaryKey::Int(v) => write!(f, "{}", v),
            PrimaryKey::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for PrimaryKey {
    fn from(v: i64) -> Self {
        PrimaryKey::Int(v)
    }
}

impl From<&str> for PrimaryKey {
    fn from(s: &str) -> Self {
        PrimaryKey::Str(s.to_string())
    }
}

/// Column values of one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "values", rename_all = "camelCase")]
pub enum ColumnData {
    Bool(Vec<bool>),
    /// All integer widths; range is checked against the field type.
    Int(Vec<i64>),
    /// `Float` and `Double` fields.
    Float(Vec<f64>),
    Str(Vec<String>),
    /// Row-major flattened vectors.
    FloatVector { dim: usize, data: Vec<f32> },
}

impl ColumnData {
    fn with_capacity(field: &FieldSchema, rows: usize) -> Self {
        match field.data_type() {
            DataType::Bool => ColumnData::Bool(Vec::with_capacity(rows)),
            DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64 => {
                ColumnData::Int(Vec::with_capacity(rows))
            }
            DataType::Float | DataType::Double => ColumnData::Float(Vec::with_capacity(rows)),
            DataType::VarChar => ColumnData::Str(Vec::with_capacity(rows)),
            DataType::FloatVector => {
                let dim = field.dim().unwrap_or_default();
                ColumnData::FloatVector {
                    dim,
                    data: Vec::with_capacity(rows * dim),
                }
            }
        }
    }

    /// Number of rows held by this column.
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Bool(v) => v.len(),
            ColumnData::Int(v) => v.len(),
            ColumnData::Float(v) => v.len(),
            ColumnData::Str(v) => v.len(),
            ColumnData::FloatVector { dim, data } => {
                if *dim == 0 {
                    0
                } else {
                    data.len() / dim
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value at `row` as JSON, vectors included.
    pub fn value(&self, row: usize) -> Option<Value> {
        match self {
            ColumnData::Bool(v) => v.get(row).map(|b| Value::from(*b)),
            ColumnData::Int(v) => v.get(row).map(|i| Value::from(*i)),
            ColumnData::Float(v) => v.get(row).map(|f| Value::from(*f)),
            ColumnData::Str(v) => v.get(row).map(|s| Value::from(s.as_str())),
            ColumnData::FloatVector { .. } => self.vector(row).map(|v| Value::from(v.to_vec())),
        }
    }

    /// Vector at `row` for vector columns.
    pub fn vector(&self, row: usize) -> Option<&[f32]> {
        match self {
            ColumnData::FloatVector { dim, data } => data.get(row * dim..(row + 1) * dim),
            _ => None,
        }
    }
}

/// One column of an insert batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub field: String,
    pub data: ColumnData,
}

/// A column-oriented, validated insert payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertBatch {
    pub num_rows: usize,
    pub columns: Vec<Column>,
}

impl InsertBatch {
    /// Looks up a column by field name.
    pub fn column(&self, field: &str) -> Option<&ColumnData> {
        self.columns
            .iter()
            .find(|c| c.field == field)
            .map(|c| &c.data)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.num_rows == 0
    }
}

/// Server acknowledgment of an insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertAck {
    /// Number of rows accepted.
    pub insert_count: usize,
    /// Primary keys of the accepted rows, in input order.
    pub ids: Vec<PrimaryKey>,
}

/// Validates records against the schema and builds an [`InsertBatch`].
///
/// Records may carry raw text for a vector field (see
/// [`Record::with_text`](crate::Record::with_text)); such texts are encoded
/// in one `encode_documents` call per field before validation.
///
/// # Errors
///
/// - [`Error::Encoding`] if text needs encoding but `embedder` is `None`, or
///   the embedder fails or returns vectors of the wrong count or dimension.
/// - [`Error::Validation`] for the first record that violates its field
///   definitions.
///
/// # Example
///
/// ```
/// use vectorlane_core::{build_schema, stage, FieldSchema, Record};
///
/// let schema = build_schema(vec![
///     FieldSchema::int64("id").primary(),
///     FieldSchema::float_vector("embedding", 2),
/// ])
/// .unwrap();
///
/// let records = vec![
///     Record::new().with_field("id", 0).with_vector("embedding", vec![0.1, 0.2]),
///     Record::new().with_field("id", 1).with_vector("embedding", vec![0.3, 0.4]),
/// ];
/// let batch = stage(&records, &schema, None).unwrap();
/// assert_eq!(batch.num_rows, 2);
/// ```
pub fn stage(
    records: &[Record],
    schema: &CollectionSchema,
    embedder: Option<&dyn EmbeddingFunction>,
) -> Result<InsertBatch> {
    let encoded = encode_pending_texts(records, schema, embedder)?;

    let fields: Vec<&FieldSchema> = schema
        .fields()
        .iter()
        .filter(|f| !f.is_auto_id())
        .collect();
    let mut columns: Vec<ColumnData> = fields
        .iter()
        .map(|f| ColumnData::with_capacity(f, records.len()))
        .collect();

    for (row, record) in records.iter().enumerate() {
        let mut keys: Vec<&String> = record.keys().collect();
        keys.sort();
        for key in keys {
            match schema.field(key) {
                None => return Err(invalid(row, key, "field is not part of the schema")),
                Some(f) if f.is_auto_id() => {
                    return Err(invalid(row, key, "auto_id primary key must not be provided"))
                }
                Some(_) => {}
            }
        }

        for (field, column) in fields.iter().zip(columns.iter_mut()) {
            let encoded_vector = encoded.get(field.name()).and_then(|m| m.get(&row));
            push_value(column, field, record, encoded_vector, row)?;
        }
    }

    let batch = InsertBatch {
        num_rows: records.len(),
        columns: fields
            .iter()
            .zip(columns)
            .map(|(f, data)| Column {
                field: f.name().to_string(),
                data,
            })
            .collect(),
    };

    tracing::debug!(rows = batch.num_rows, columns = batch.columns.len(), "staged insert batch");
    Ok(batch)
}

/// Encodes pending texts. Returns field -> (row -> vector).
fn encode_pending_texts(
    records: &[Record],
    schema: &CollectionSchema,
    embedder: Option<&dyn EmbeddingFunction>,
) -> Result<HashMap<String, HashMap<usize, Vec<f32>>>> {
    let mut encoded = HashMap::new();

    for field in schema.vector_fields() {
        let pending: Vec<(usize, String)> = records
            .iter()
            .enumerate()
            .filter(|(_, r)| !r.contains_key(field.name()))
            .filter_map(|(row, r)| r.text(field.name()).map(|t| (row, t.to_string())))
            .collect();
        if pending.is_empty() {
            continue;
        }

        let embedder = embedder.ok_or_else(|| {
            Error::Encoding(format!(
                "no embedding function available to encode {} text value(s) for field '{}'",
                pending.len(),
                field.name()
            ))
        })?;

        let (rows, texts): (Vec<usize>, Vec<String>) = pending.into_iter().unzip();
        tracing::debug!(
            field = field.name(),
            model = embedder.model_name(),
            count = texts.len(),
            "encoding text for vector field"
        );
        let vectors = embedder.encode_documents(&texts)?;

        if vectors.len() != texts.len() {
            return Err(Error::Encoding(format!(
                "embedding function returned {} vectors for {} texts",
                vectors.len(),
                texts.len()
            )));
        }

        let dim = field.dim().unwrap_or_default();
        if let Some(bad) = vectors.iter().find(|v| v.len() != dim) {
            return Err(Error::Encoding(format!(
                "embedding function '{}' returned a vector of dimension {} for field '{}', expected {}",
                embedder.model_name(),
                bad.len(),
                field.name(),
                dim
            )));
        }

        encoded.insert(
            field.name().to_string(),
            rows.into_iter().zip(vectors).collect(),
        );
    }

    Ok(encoded)
}

fn invalid(row: usize, field: &str, reason: impl Into<String>) -> Error {
    Error::Validation {
        row,
        field: field.to_string(),
        reason: reason.into(),
    }
}

fn push_value(
    column: &mut ColumnData,
    field: &FieldSchema,
    record: &Record,
    encoded: Option<&Vec<f32>>,
    row: usize,
) -> Result<()> {
    let name = field.name();

    if let (ColumnData::FloatVector { dim, data }, Some(vector)) = (&mut *column, encoded) {
        debug_assert_eq!(vector.len(), *dim);
        data.extend_from_slice(vector);
        return Ok(());
    }

    let value = record
        .get(name)
        .ok_or_else(|| invalid(row, name, "missing value"))?;

    match column {
        ColumnData::Bool(values) => {
            let b = value
                .as_bool()
                .ok_or_else(|| invalid(row, name, format!("expected Bool, got {}", value)))?;
            values.push(b);
        }
        ColumnData::Int(values) => {
            let i = value.as_i64().ok_or_else(|| {
                invalid(row, name, format!("expected {}, got {}", field.data_type(), value))
            })?;
            if let Some((lo, hi)) = field.data_type().integer_range() {
                if i < lo || i > hi {
                    return Err(invalid(
                        row,
                        name,
                        format!("{} is out of range for {}", i, field.data_type()),
                    ));
                }
            }
            values.push(i);
        }
        ColumnData::Float(values) => {
            let f = value.as_f64().ok_or_else(|| {
                invalid(row, name, format!("expected {}, got {}", field.data_type(), value))
            })?;
            values.push(f);
        }
        ColumnData::Str(values) => {
            let s = value
                .as_str()
                .ok_or_else(|| invalid(row, name, format!("expected VarChar, got {}", value)))?;
            let max = field.max_length().unwrap_or(usize::MAX);
            if s.len() > max {
                return Err(invalid(
                    row,
                    name,
                    format!("length {} exceeds max_length {}", s.len(), max),
                ));
            }
            values.push(s.to_string());
        }
        ColumnData::FloatVector { dim, data } => {
            let vector = record
                .get_vector(name)
                .ok_or_else(|| invalid(row, name, "expected an array of numbers"))?;
            if vector.len() != *dim {
                return Err(invalid(
                    row,
                    name,
                    format!("expected vector of dimension {}, got {}", dim, vector.len()),
                ));
            }
            data.extend_from_slice(&vector);
        }
    }

    Ok(())
}

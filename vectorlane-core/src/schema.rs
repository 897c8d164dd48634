//! Field definitions and collection schemas.
//!
//! A [`CollectionSchema`] is an ordered, validated list of [`FieldSchema`]
//! values. Both are immutable once built: fields are assembled with a
//! consuming builder and the schema can only be obtained through
//! [`build_schema`], which enforces the invariants below.
//!
//! - at least one field, every name non-empty and unique
//! - exactly one primary field, of type `Int64` or `VarChar`
//! - `auto_id` only on an `Int64` primary field
//! - every `FloatVector` declares `dim` in `1..=32768`, and only vectors do
//! - every `VarChar` declares `max_length` in `1..=65535`
//! - at least one vector field

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Largest vector dimension accepted by the schema builder.
pub const MAX_DIMENSION: usize = 32_768;

/// Largest `max_length` accepted for `VarChar` fields.
pub const MAX_VARCHAR_LENGTH: usize = 65_535;

/// Semantic type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Float,
    Double,
    VarChar,
    FloatVector,
}

impl DataType {
    /// Returns true for vector types usable in similarity search.
    #[inline]
    pub fn is_vector(&self) -> bool {
        matches!(self, DataType::FloatVector)
    }

    /// Returns true for the integer family.
    #[inline]
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64
        )
    }

    /// Inclusive value range for integer types.
    pub fn integer_range(&self) -> Option<(i64, i64)> {
        match self {
            DataType::Int8 => Some((i8::MIN.into(), i8::MAX.into())),
            DataType::Int16 => Some((i16::MIN.into(), i16::MAX.into())),
            DataType::Int32 => Some((i32::MIN.into(), i32::MAX.into())),
            DataType::Int64 => Some((i64::MIN, i64::MAX)),
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Bool => "Bool",
            DataType::Int8 => "Int8",
            DataType::Int16 => "Int16",
            DataType::Int32 => "Int32",
            DataType::Int64 => "Int64",
            DataType::Float => "Float",
            DataType::Double => "Double",
            DataType::VarChar => "VarChar",
            DataType::FloatVector => "FloatVector",
        };
        f.write_str(name)
    }
}

/// Definition of a single field.
///
/// # Example
///
/// ```
/// use vectorlane_core::{DataType, FieldSchema};
///
/// let id = FieldSchema::int64("id").primary();
/// let embedding = FieldSchema::float_vector("embedding", 128);
/// let text = FieldSchema::new("text", DataType::VarChar).with_max_length(255);
///
/// assert!(id.is_primary());
/// assert_eq!(embedding.dim(), Some(128));
/// assert_eq!(text.max_length(), Some(255));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSchema {
    name: String,
    data_type: DataType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    dim: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_length: Option<usize>,
    #[serde(default)]
    is_primary: bool,
    #[serde(default)]
    auto_id: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    description: String,
}

impl FieldSchema {
    /// Creates a field of the given type with no size attribute.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            dim: None,
            max_length: None,
            is_primary: false,
            auto_id: false,
            description: String::new(),
        }
    }

    /// Shorthand for an `Int64` field.
    pub fn int64(name: impl Into<String>) -> Self {
        Self::new(name, DataType::Int64)
    }

    /// Shorthand for a `FloatVector` field of the given dimension.
    pub fn float_vector(name: impl Into<String>, dim: usize) -> Self {
        Self::new(name, DataType::FloatVector).with_dim(dim)
    }

    /// Shorthand for a `VarChar` field of the given maximum byte length.
    pub fn varchar(name: impl Into<String>, max_length: usize) -> Self {
        Self::new(name, DataType::VarChar).with_max_length(max_length)
    }

    /// Marks the field as the primary key. Chainable.
    pub fn primary(mut self) -> Self {
        self.is_primary = true;
        self
    }

    /// Lets the server assign primary key values. Chainable.
    pub fn auto_id(mut self) -> Self {
        self.auto_id = true;
        self
    }

    /// Sets the vector dimension. Chainable.
    pub fn with_dim(mut self, dim: usize) -> Self {
        self.dim = Some(dim);
        self
    }

    /// Sets the maximum byte length for `VarChar` fields. Chainable.
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Sets a free-form description. Chainable.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    #[inline]
    pub fn dim(&self) -> Option<usize> {
        self.dim
    }

    #[inline]
    pub fn max_length(&self) -> Option<usize> {
        self.max_length
    }

    #[inline]
    pub fn is_primary(&self) -> bool {
        self.is_primary
    }

    #[inline]
    pub fn is_auto_id(&self) -> bool {
        self.auto_id
    }

    #[inline]
    pub fn is_vector(&self) -> bool {
        self.data_type.is_vector()
    }

    #[inline]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Checks the constraints that concern this field alone.
    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Schema("field name must not be empty".into()));
        }

        match self.data_type {
            DataType::FloatVector => match self.dim {
                None => {
                    return Err(Error::Schema(format!(
                        "vector field '{}' is missing its dimension",
                        self.name
                    )))
                }
                Some(dim) if dim == 0 || dim > MAX_DIMENSION => {
                    return Err(Error::Schema(format!(
                        "vector field '{}' has dimension {}, expected 1..={}",
                        self.name, dim, MAX_DIMENSION
                    )))
                }
                Some(_) => {}
            },
            _ if self.dim.is_some() => {
                return Err(Error::Schema(format!(
                    "field '{}' of type {} cannot declare a dimension",
                    self.name, self.data_type
                )))
            }
            _ => {}
        }

        match self.data_type {
            DataType::VarChar => match self.max_length {
                Some(len) if (1..=MAX_VARCHAR_LENGTH).contains(&len) => {}
                Some(len) => {
                    return Err(Error::Schema(format!(
                        "varchar field '{}' has max_length {}, expected 1..={}",
                        self.name, len, MAX_VARCHAR_LENGTH
                    )))
                }
                None => {
                    return Err(Error::Schema(format!(
                        "varchar field '{}' is missing max_length",
                        self.name
                    )))
                }
            },
            _ if self.max_length.is_some() => {
                return Err(Error::Schema(format!(
                    "field '{}' of type {} cannot declare max_length",
                    self.name, self.data_type
                )))
            }
            _ => {}
        }

        if self.is_primary && !matches!(self.data_type, DataType::Int64 | DataType::VarChar) {
            return Err(Error::Schema(format!(
                "primary field '{}' must be Int64 or VarChar, got {}",
                self.name, self.data_type
            )));
        }

        if self.auto_id && !(self.is_primary && self.data_type == DataType::Int64) {
            return Err(Error::Schema(format!(
                "auto_id is only allowed on an Int64 primary field, not '{}'",
                self.name
            )));
        }

        Ok(())
    }
}

/// Wire and constructor input before validation.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSchema {
    fields: Vec<FieldSchema>,
    #[serde(default)]
    description: String,
}

/// An immutable, validated collection schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSchema", rename_all = "camelCase")]
pub struct CollectionSchema {
    fields: Vec<FieldSchema>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    description: String,
}

impl TryFrom<RawSchema> for CollectionSchema {
    type Error = Error;

    fn try_from(raw: RawSchema) -> Result<Self> {
        Ok(build_schema(raw.fields)?.with_description(raw.description))
    }
}

/// Validates a field list and assembles it into a [`CollectionSchema`].
///
/// Pure function: no I/O, no side effects.
///
/// # Example
///
/// ```
/// use vectorlane_core::{build_schema, FieldSchema};
///
/// let schema = build_schema(vec![
///     FieldSchema::int64("id").primary(),
///     FieldSchema::float_vector("embedding", 128),
/// ])
/// .unwrap();
///
/// assert_eq!(schema.primary_field().name(), "id");
///
/// // Two primaries are rejected
/// let err = build_schema(vec![
///     FieldSchema::int64("a").primary(),
///     FieldSchema::int64("b").primary(),
///     FieldSchema::float_vector("v", 4),
/// ]);
/// assert!(err.is_err());
/// ```
pub fn build_schema(fields: Vec<FieldSchema>) -> Result<CollectionSchema> {
    if fields.is_empty() {
        return Err(Error::Schema("schema has no fields".into()));
    }

    let mut seen = HashSet::with_capacity(fields.len());
    for field in &fields {
        field.validate()?;
        if !seen.insert(field.name()) {
            return Err(Error::Schema(format!(
                "duplicate field name '{}'",
                field.name()
            )));
        }
    }

    let primaries: Vec<&str> = fields
        .iter()
        .filter(|f| f.is_primary())
        .map(FieldSchema::name)
        .collect();
    match primaries.len() {
        0 => return Err(Error::Schema("schema has no primary field".into())),
        1 => {}
        _ => {
            return Err(Error::Schema(format!(
                "schema has multiple primary fields: {}",
                primaries.join(", ")
            )))
        }
    }

    if !fields.iter().any(FieldSchema::is_vector) {
        return Err(Error::Schema("schema has no vector field".into()));
    }

    Ok(CollectionSchema {
        fields,
        description: String::new(),
    })
}

impl CollectionSchema {
    /// Same as [`build_schema`].
    pub fn new(fields: Vec<FieldSchema>) -> Result<Self> {
        build_schema(fields)
    }

    /// Attaches a description. Chainable.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Fields in declaration order.
    #[inline]
    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }

    #[inline]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// The single primary key field.
    pub fn primary_field(&self) -> &FieldSchema {
        // build_schema guarantees exactly one primary
        self.fields
            .iter()
            .find(|f| f.is_primary())
            .unwrap_or(&self.fields[0])
    }

    /// Iterates over vector fields.
    pub fn vector_fields(&self) -> impl Iterator<Item = &FieldSchema> {
        self.fields.iter().filter(|f| f.is_vector())
    }

    /// Iterates over non-vector fields, primary key included.
    pub fn scalar_fields(&self) -> impl Iterator<Item = &FieldSchema> {
        self.fields.iter().filter(|f| !f.is_vector())
    }

    /// Returns the named field if it is a vector field.
    pub fn vector_field(&self, name: &str) -> Result<&FieldSchema> {
        match self.field(name) {
            Some(field) if field.is_vector() => Ok(field),
            Some(field) => Err(Error::FieldNotFound(format!(
                "'{}' is a {} field, not a vector field",
                name,
                field.data_type()
            ))),
            None => Err(Error::FieldNotFound(format!(
                "'{}' is not part of the schema",
                name
            ))),
        }
    }
}

//! Similarity search requests and results.

use serde::{Deserialize, Serialize};

use crate::embedding::EmbeddingFunction;
use crate::error::{Error, Result};
use crate::index::MetricType;
use crate::record::Record;
use crate::staging::PrimaryKey;

/// Default number of hits per query vector.
pub const DEFAULT_LIMIT: usize = 10;

/// Largest accepted `limit`.
pub const MAX_LIMIT: usize = 16_384;

/// Staleness guarantee requested for a read. Passed through to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ConsistencyLevel {
    /// Reads observe every write acknowledged before the search.
    Strong,
    /// Reads observe the caller's own writes.
    Session,
    /// Reads may lag writes by a bounded interval.
    #[default]
    Bounded,
    /// No staleness bound.
    Eventually,
}

/// Algorithm-specific search tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SearchTuning {
    #[default]
    Default,
    /// Number of IVF clusters probed.
    Ivf { nprobe: u32 },
    /// HNSW candidate list size.
    Hnsw { ef: u32 },
}

/// Metric plus tuning for a search.
///
/// # Example
///
/// ```
/// use vectorlane_core::{MetricType, SearchParams};
///
/// let params = SearchParams::ivf(MetricType::L2, 10).unwrap();
/// assert_eq!(params.metric_type(), MetricType::L2);
/// assert!(SearchParams::ivf(MetricType::L2, 0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    metric_type: MetricType,
    #[serde(default)]
    tuning: SearchTuning,
}

impl SearchParams {
    /// Metric only, server-default tuning.
    pub fn new(metric_type: MetricType) -> Self {
        Self {
            metric_type,
            tuning: SearchTuning::Default,
        }
    }

    pub fn ivf(metric_type: MetricType, nprobe: u32) -> Result<Self> {
        if !(1..=65_536).contains(&nprobe) {
            return Err(Error::InvalidRequest(format!(
                "nprobe must be in [1, 65536], got {}",
                nprobe
            )));
        }
        Ok(Self {
            metric_type,
            tuning: SearchTuning::Ivf { nprobe },
        })
    }

    pub fn hnsw(metric_type: MetricType, ef: u32) -> Result<Self> {
        if !(1..=32_768).contains(&ef) {
            return Err(Error::InvalidRequest(format!(
                "ef must be in [1, 32768], got {}",
                ef
            )));
        }
        Ok(Self {
            metric_type,
            tuning: SearchTuning::Hnsw { ef },
        })
    }

    #[inline]
    pub fn metric_type(&self) -> MetricType {
        self.metric_type
    }

    #[inline]
    pub fn tuning(&self) -> SearchTuning {
        self.tuning
    }
}

/// A similarity search request.
///
/// # Example
///
/// ```
/// use vectorlane_core::{ConsistencyLevel, MetricType, SearchParams, SearchRequest};
///
/// let request = SearchRequest::new("vector", vec![vec![0.1; 768]], SearchParams::ivf(MetricType::L2, 10).unwrap())
///     .limit(10)
///     .output_fields(["id", "text", "subject"])
///     .filter("subject == \"history\"")
///     .consistency(ConsistencyLevel::Strong);
///
/// assert_eq!(request.limit_value(), 10);
/// assert!(request.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    anns_field: String,
    vectors: Vec<Vec<f32>>,
    params: SearchParams,
    limit: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    filter: Option<String>,
    #[serde(default)]
    output_fields: Vec<String>,
    #[serde(default)]
    consistency_level: ConsistencyLevel,
}

impl SearchRequest {
    pub fn new(anns_field: impl Into<String>, vectors: Vec<Vec<f32>>, params: SearchParams) -> Self {
        Self {
            anns_field: anns_field.into(),
            vectors,
            params,
            limit: DEFAULT_LIMIT,
            filter: None,
            output_fields: Vec::new(),
            consistency_level: ConsistencyLevel::default(),
        }
    }

    /// Builds a request whose query vectors come from `encode_queries`.
    pub fn from_texts(
        anns_field: impl Into<String>,
        texts: &[String],
        embedder: &dyn EmbeddingFunction,
        params: SearchParams,
    ) -> Result<Self> {
        let vectors = embedder.encode_queries(texts)?;
        if vectors.len() != texts.len() {
            return Err(Error::Encoding(format!(
                "embedding function returned {} vectors for {} queries",
                vectors.len(),
                texts.len()
            )));
        }
        Ok(Self::new(anns_field, vectors, params))
    }

    /// Sets the number of hits per query. Chainable.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Sets a boolean filter over scalar fields. Chainable.
    pub fn filter(mut self, expr: impl Into<String>) -> Self {
        self.filter = Some(expr.into());
        self
    }

    /// Sets the fields returned with each hit. `"*"` selects every scalar
    /// field. Chainable.
    pub fn output_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the consistency level. Chainable.
    pub fn consistency(mut self, level: ConsistencyLevel) -> Self {
        self.consistency_level = level;
        self
    }

    #[inline]
    pub fn anns_field(&self) -> &str {
        &self.anns_field
    }

    #[inline]
    pub fn vectors(&self) -> &[Vec<f32>] {
        &self.vectors
    }

    #[inline]
    pub fn params(&self) -> SearchParams {
        self.params
    }

    #[inline]
    pub fn limit_value(&self) -> usize {
        self.limit
    }

    #[inline]
    pub fn filter_expr(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    #[inline]
    pub fn output_field_names(&self) -> &[String] {
        &self.output_fields
    }

    #[inline]
    pub fn consistency_level(&self) -> ConsistencyLevel {
        self.consistency_level
    }

    /// Checks request-level constraints that need no schema.
    pub fn validate(&self) -> Result<()> {
        if self.vectors.is_empty() {
            return Err(Error::InvalidRequest("no query vectors".into()));
        }
        if !(1..=MAX_LIMIT).contains(&self.limit) {
            return Err(Error::InvalidRequest(format!(
                "limit must be in [1, {}], got {}",
                MAX_LIMIT, self.limit
            )));
        }
        if matches!(self.filter.as_deref(), Some(f) if f.trim().is_empty()) {
            return Err(Error::FilterSyntax("empty expression".into()));
        }
        Ok(())
    }
}

/// One ranked hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    pub id: PrimaryKey,
    /// Lower is more similar.
    pub distance: f32,
    /// Requested output fields only.
    #[serde(default)]
    pub entity: Record,
}

/// Hits for one query vector, ascending by distance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hits {
    hits: Vec<Hit>,
}

impl Hits {
    pub fn new(hits: Vec<Hit>) -> Self {
        Self { hits }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Best hit, if any.
    #[inline]
    pub fn top(&self) -> Option<&Hit> {
        self.hits.first()
    }

    pub fn ids(&self) -> Vec<&PrimaryKey> {
        self.hits.iter().map(|h| &h.id).collect()
    }

    pub fn distances(&self) -> Vec<f32> {
        self.hits.iter().map(|h| h.distance).collect()
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Hit> {
        self.hits.iter()
    }
}

impl<'a> IntoIterator for &'a Hits {
    type Item = &'a Hit;
    type IntoIter = std::slice::Iter<'a, Hit>;

    fn into_iter(self) -> Self::IntoIter {
        self.hits.iter()
    }
}

/// Results of a search: one [`Hits`] per query vector, in query order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchResults {
    queries: Vec<Hits>,
}

impl SearchResults {
    pub fn new(queries: Vec<Hits>) -> Self {
        Self { queries }
    }

    /// Number of query vectors answered.
    #[inline]
    pub fn len(&self) -> usize {
        self.queries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    #[inline]
    pub fn get(&self, query: usize) -> Option<&Hits> {
        self.queries.get(query)
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Hits> {
        self.queries.iter()
    }
}

impl<'a> IntoIterator for &'a SearchResults {
    type Item = &'a Hits;
    type IntoIter = std::slice::Iter<'a, Hits>;

    fn into_iter(self) -> Self::IntoIter {
        self.queries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> SearchParams {
        SearchParams::ivf(MetricType::L2, 10).unwrap()
    }

    #[test]
    fn test_request_defaults() {
        let request = SearchRequest::new("embedding", vec![vec![0.0; 4]], params());
        assert_eq!(request.limit_value(), DEFAULT_LIMIT);
        assert_eq!(request.consistency_level(), ConsistencyLevel::Bounded);
        assert!(request.filter_expr().is_none());
        assert!(request.output_field_names().is_empty());
    }

    #[test]
    fn test_request_validation() {
        let empty = SearchRequest::new("embedding", vec![], params());
        assert!(matches!(empty.validate(), Err(Error::InvalidRequest(_))));

        let zero = SearchRequest::new("embedding", vec![vec![0.0; 4]], params()).limit(0);
        assert!(matches!(zero.validate(), Err(Error::InvalidRequest(_))));

        let blank = SearchRequest::new("embedding", vec![vec![0.0; 4]], params()).filter("  ");
        assert!(matches!(blank.validate(), Err(Error::FilterSyntax(_))));
    }

    #[test]
    fn test_search_params_ranges() {
        assert!(SearchParams::hnsw(MetricType::Cosine, 64).is_ok());
        assert!(SearchParams::hnsw(MetricType::Cosine, 0).is_err());
        assert!(SearchParams::ivf(MetricType::L2, 70_000).is_err());
        assert_eq!(SearchParams::new(MetricType::Ip).tuning(), SearchTuning::Default);
    }

    #[test]
    fn test_request_serialization() {
        let request = SearchRequest::new("vector", vec![vec![1.0, 2.0]], params())
            .limit(3)
            .output_fields(["text"])
            .consistency(ConsistencyLevel::Strong);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["annsField"], "vector");
        assert_eq!(json["consistencyLevel"], "Strong");
        assert_eq!(json["params"]["tuning"]["kind"], "ivf");
        assert_eq!(json["params"]["tuning"]["nprobe"], 10);

        let back: SearchRequest = serde_json::from_value(json).unwrap();
        assert_eq!(back, request);
    }

    #[test]
    fn test_hits_accessors() {
        let hits = Hits::new(vec![
            Hit {
                id: PrimaryKey::Int(0),
                distance: 0.0,
                entity: Record::new().with_field("text", "a"),
            },
            Hit {
                id: PrimaryKey::Int(4),
                distance: 1.5,
                entity: Record::new(),
            },
        ]);
        assert_eq!(hits.top().unwrap().id, PrimaryKey::Int(0));
        assert_eq!(hits.distances(), vec![0.0, 1.5]);
        assert_eq!(hits.ids(), vec![&PrimaryKey::Int(0), &PrimaryKey::Int(4)]);

        let results = SearchResults::new(vec![hits]);
        assert_eq!(results.len(), 1);
        assert_eq!(results.iter().map(Hits::len).sum::<usize>(), 2);
    }
}

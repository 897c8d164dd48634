//! Index build requests.
//!
//! Index parameters are typed per algorithm and validated when the
//! [`IndexSpec`] is constructed, so a misspelled or out-of-range option is
//! caught before anything is sent to the server.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Distance metric used to rank search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MetricType {
    /// Euclidean distance.
    #[default]
    L2,
    /// Inner product.
    Ip,
    /// Cosine distance.
    Cosine,
    /// Hamming distance, binary vectors only.
    Hamming,
    /// Jaccard distance, binary vectors only.
    Jaccard,
}

impl MetricType {
    /// Returns true for metrics defined only on binary vectors.
    #[inline]
    pub fn is_binary(&self) -> bool {
        matches!(self, MetricType::Hamming | MetricType::Jaccard)
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MetricType::L2 => "L2",
            MetricType::Ip => "IP",
            MetricType::Cosine => "COSINE",
            MetricType::Hamming => "HAMMING",
            MetricType::Jaccard => "JACCARD",
        };
        f.write_str(name)
    }
}

/// Index algorithm with its build parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "indexType", content = "params")]
pub enum IndexType {
    #[serde(rename = "FLAT")]
    Flat,
    #[serde(rename = "IVF_FLAT")]
    IvfFlat { nlist: u32 },
    #[serde(rename = "IVF_SQ8")]
    IvfSq8 { nlist: u32 },
    #[serde(rename = "IVF_PQ")]
    IvfPq { nlist: u32, m: u32, nbits: u32 },
    #[serde(rename = "HNSW")]
    Hnsw {
        #[serde(rename = "M")]
        m: u32,
        #[serde(rename = "efConstruction")]
        ef_construction: u32,
    },
    #[serde(rename = "AUTOINDEX")]
    AutoIndex,
}

impl IndexType {
    /// Algorithm identifier as understood by the server.
    pub fn name(&self) -> &'static str {
        match self {
            IndexType::Flat => "FLAT",
            IndexType::IvfFlat { .. } => "IVF_FLAT",
            IndexType::IvfSq8 { .. } => "IVF_SQ8",
            IndexType::IvfPq { .. } => "IVF_PQ",
            IndexType::Hnsw { .. } => "HNSW",
            IndexType::AutoIndex => "AUTOINDEX",
        }
    }

    fn validate(&self) -> Result<()> {
        match *self {
            IndexType::Flat | IndexType::AutoIndex => Ok(()),
            IndexType::IvfFlat { nlist } | IndexType::IvfSq8 { nlist } => check_nlist(nlist),
            IndexType::IvfPq { nlist, m, nbits } => {
                check_nlist(nlist)?;
                if m == 0 {
                    return Err(Error::UnsupportedIndex("IVF_PQ m must be positive".into()));
                }
                if !(1..=16).contains(&nbits) {
                    return Err(Error::UnsupportedIndex(format!(
                        "IVF_PQ nbits must be in [1, 16], got {}",
                        nbits
                    )));
                }
                Ok(())
            }
            IndexType::Hnsw { m, ef_construction } => {
                if !(2..=2048).contains(&m) {
                    return Err(Error::UnsupportedIndex(format!(
                        "HNSW M must be in [2, 2048], got {}",
                        m
                    )));
                }
                if ef_construction == 0 {
                    return Err(Error::UnsupportedIndex(
                        "HNSW efConstruction must be positive".into(),
                    ));
                }
                Ok(())
            }
        }
    }
}

fn check_nlist(nlist: u32) -> Result<()> {
    if (1..=65_536).contains(&nlist) {
        Ok(())
    } else {
        Err(Error::UnsupportedIndex(format!(
            "nlist must be in [1, 65536], got {}",
            nlist
        )))
    }
}

/// A validated index build request for one vector field.
///
/// # Example
///
/// ```
/// use vectorlane_core::{IndexSpec, IndexType, MetricType};
///
/// let spec = IndexSpec::ivf_flat(MetricType::L2, 128).unwrap();
/// assert_eq!(spec.index_type(), IndexType::IvfFlat { nlist: 128 });
///
/// assert!(IndexSpec::ivf_flat(MetricType::L2, 0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexSpec {
    index: IndexType,
    metric_type: MetricType,
}

impl IndexSpec {
    pub fn new(index: IndexType, metric_type: MetricType) -> Result<Self> {
        index.validate()?;
        Ok(Self { index, metric_type })
    }

    /// Exact search, no training.
    pub fn flat(metric_type: MetricType) -> Self {
        Self {
            index: IndexType::Flat,
            metric_type,
        }
    }

    pub fn ivf_flat(metric_type: MetricType, nlist: u32) -> Result<Self> {
        Self::new(IndexType::IvfFlat { nlist }, metric_type)
    }

    pub fn hnsw(metric_type: MetricType, m: u32, ef_construction: u32) -> Result<Self> {
        Self::new(IndexType::Hnsw { m, ef_construction }, metric_type)
    }

    #[inline]
    pub fn index_type(&self) -> IndexType {
        self.index
    }

    #[inline]
    pub fn metric_type(&self) -> MetricType {
        self.metric_type
    }

    /// Re-checks parameter ranges, for specs received over the wire.
    pub fn validate(&self) -> Result<()> {
        self.index.validate()
    }
}

impl fmt::Display for IndexSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.index.name(), self.metric_type)
    }
}

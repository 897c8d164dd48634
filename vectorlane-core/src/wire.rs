//! JSON-over-HTTP API shared by [`HttpTransport`](crate::HttpTransport) and
//! the server crate.
//!
//! Every route is a `POST` with a camelCase JSON body. Responses are wrapped
//! in an [`Envelope`]: `code` is 0 on success, otherwise the error's
//! [`code`](crate::Error::code) with the serialized [`Error`] attached.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::index::IndexSpec;
use crate::schema::CollectionSchema;
use crate::search::SearchRequest;
use crate::staging::InsertBatch;
use crate::transport::LoadState;

pub mod routes {
    pub const HEALTH: &str = "/v2/vectordb/health";
    pub const HAS_COLLECTION: &str = "/v2/vectordb/collections/has";
    pub const LIST_COLLECTIONS: &str = "/v2/vectordb/collections/list";
    pub const CREATE_COLLECTION: &str = "/v2/vectordb/collections/create";
    pub const DESCRIBE_COLLECTION: &str = "/v2/vectordb/collections/describe";
    pub const DROP_COLLECTION: &str = "/v2/vectordb/collections/drop";
    pub const LOAD_COLLECTION: &str = "/v2/vectordb/collections/load";
    pub const RELEASE_COLLECTION: &str = "/v2/vectordb/collections/release";
    pub const LOAD_STATE: &str = "/v2/vectordb/collections/get_load_state";
    pub const COLLECTION_STATS: &str = "/v2/vectordb/collections/get_stats";
    pub const INSERT: &str = "/v2/vectordb/entities/insert";
    pub const SEARCH: &str = "/v2/vectordb/entities/search";
    pub const CREATE_INDEX: &str = "/v2/vectordb/indexes/create";
    pub const DESCRIBE_INDEX: &str = "/v2/vectordb/indexes/describe";
    pub const DROP_INDEX: &str = "/v2/vectordb/indexes/drop";
}

/// Response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Error>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            code: 0,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: Error) -> Self {
        Self {
            code: error.code(),
            data: None,
            error: Some(error),
        }
    }

    pub fn from_result(result: Result<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::err(e),
        }
    }

    pub fn into_result(self) -> Result<T> {
        if let Some(error) = self.error {
            return Err(error);
        }
        match (self.code, self.data) {
            (0, Some(data)) => Ok(data),
            (0, None) => Err(Error::Server("response carried no data".into())),
            (code, _) => Err(Error::Server(format!("request failed with code {}", code))),
        }
    }
}

/// Placeholder payload for operations without a result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Empty {}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmptyRequest {}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionRequest {
    pub collection_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCollectionRequest {
    pub collection_name: String,
    pub schema: CollectionSchema,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertRequest {
    pub collection_name: String,
    pub data: InsertBatch,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIndexRequest {
    pub collection_name: String,
    pub field_name: String,
    pub index_params: IndexSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexRequest {
    pub collection_name: String,
    pub field_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchBody {
    pub collection_name: String,
    pub request: SearchRequest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HasResponse {
    pub has: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadStateResponse {
    pub load_state: LoadState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub row_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescribeIndexResponse {
    #[serde(default)]
    pub index_params: Option<IndexSpec>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_ok() {
        let json = serde_json::to_string(&Envelope::ok(HasResponse { has: true })).unwrap();
        assert_eq!(json, r#"{"code":0,"data":{"has":true}}"#);

        let env: Envelope<HasResponse> = serde_json::from_str(&json).unwrap();
        assert!(env.into_result().unwrap().has);
    }

    #[test]
    fn test_envelope_error_roundtrip() {
        let err = Error::DimensionMismatch {
            expected: 128,
            got: 64,
        };
        let json = serde_json::to_string(&Envelope::<Empty>::err(err.clone())).unwrap();
        let env: Envelope<Empty> = serde_json::from_str(&json).unwrap();
        assert_eq!(env.code, 402);
        assert_eq!(env.into_result().unwrap_err(), err);
    }

    #[test]
    fn test_envelope_code_without_error() {
        let env: Envelope<Empty> = serde_json::from_str(r#"{"code":1100}"#).unwrap();
        assert!(matches!(env.into_result(), Err(Error::Server(_))));
    }
}

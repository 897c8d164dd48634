//! Blocking HTTP client for a VectorLane-compatible server.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::index::IndexSpec;
use crate::schema::CollectionSchema;
use crate::search::{SearchRequest, SearchResults};
use crate::staging::{InsertAck, InsertBatch};
use crate::transport::{LoadState, Transport};
use crate::wire::{self, routes, Empty, Envelope};

/// [`Transport`] speaking the JSON API in [`wire`].
///
/// # Example
///
/// ```no_run
/// use vectorlane_core::{HttpTransport, Transport};
///
/// let transport = HttpTransport::connect("localhost", 19530).unwrap();
/// println!("{:?}", transport.list_collections().unwrap());
/// ```
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    base_url: String,
    address: String,
}

impl HttpTransport {
    /// Connects without a request timeout and performs the handshake.
    pub fn connect(host: &str, port: u16) -> Result<Self> {
        Self::with_timeout(host, port, None)
    }

    /// Connects with an optional per-request timeout.
    pub fn with_timeout(host: &str, port: u16, timeout: Option<Duration>) -> Result<Self> {
        let address = format!("{}:{}", host, port);
        // reqwest's blocking client defaults to 30s; no timeout unless asked
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Connection {
                address: address.clone(),
                reason: e.to_string(),
            })?;

        let transport = Self {
            client,
            base_url: format!("http://{}", address),
            address,
        };
        transport.ping().map_err(|e| match e {
            Error::Connection { .. } => e,
            other => Error::Connection {
                address: transport.address.clone(),
                reason: format!("handshake failed: {}", other),
            },
        })?;
        tracing::debug!(address = %transport.address, "handshake complete");
        Ok(transport)
    }

    fn call<Req, Resp>(&self, route: &str, body: &Req) -> Result<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        tracing::trace!(route, "request");
        let response = self
            .client
            .post(format!("{}{}", self.base_url, route))
            .json(body)
            .send()
            .map_err(|e| Error::Connection {
                address: self.address.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(rejected(route, status, response.text().unwrap_or_default()));
        }
        let envelope: Envelope<Resp> = response.json().map_err(|e| {
            Error::Server(format!("invalid response from {} ({}): {}", route, status, e))
        })?;
        envelope.into_result()
    }

    fn collection_call<Resp: DeserializeOwned>(&self, route: &str, name: &str) -> Result<Resp> {
        self.call(
            route,
            &wire::CollectionRequest {
                collection_name: name.to_string(),
            },
        )
    }
}

/// Error for a response that never reached the envelope layer.
///
/// 4xx means the server refused the request itself (body too large,
/// malformed JSON); anything else is a server fault.
fn rejected(route: &str, status: reqwest::StatusCode, body: String) -> Error {
    let mut message = format!("{} rejected with HTTP {}", route, status);
    let body = body.trim();
    if !body.is_empty() {
        let excerpt: String = body.chars().take(200).collect();
        message.push_str(": ");
        message.push_str(&excerpt);
    }
    if status.is_client_error() {
        Error::InvalidRequest(message)
    } else {
        Error::Server(message)
    }
}

impl Transport for HttpTransport {
    fn address(&self) -> &str {
        &self.address
    }

    fn ping(&self) -> Result<()> {
        let _: Empty = self.call(routes::HEALTH, &wire::EmptyRequest {})?;
        Ok(())
    }

    fn has_collection(&self, name: &str) -> Result<bool> {
        let resp: wire::HasResponse = self.collection_call(routes::HAS_COLLECTION, name)?;
        Ok(resp.has)
    }

    fn list_collections(&self) -> Result<Vec<String>> {
        self.call(routes::LIST_COLLECTIONS, &wire::EmptyRequest {})
    }

    fn create_collection(&self, name: &str, schema: &CollectionSchema) -> Result<()> {
        let _: Empty = self.call(
            routes::CREATE_COLLECTION,
            &wire::CreateCollectionRequest {
                collection_name: name.to_string(),
                schema: schema.clone(),
            },
        )?;
        Ok(())
    }

    fn describe_collection(&self, name: &str) -> Result<CollectionSchema> {
        self.collection_call(routes::DESCRIBE_COLLECTION, name)
    }

    fn drop_collection(&self, name: &str) -> Result<()> {
        let _: Empty = self.collection_call(routes::DROP_COLLECTION, name)?;
        Ok(())
    }

    fn insert(&self, name: &str, batch: &InsertBatch) -> Result<InsertAck> {
        self.call(
            routes::INSERT,
            &wire::InsertRequest {
                collection_name: name.to_string(),
                data: batch.clone(),
            },
        )
    }

    fn row_count(&self, name: &str) -> Result<usize> {
        let stats: wire::StatsResponse = self.collection_call(routes::COLLECTION_STATS, name)?;
        Ok(stats.row_count)
    }

    fn create_index(&self, name: &str, field: &str, spec: &IndexSpec) -> Result<()> {
        let _: Empty = self.call(
            routes::CREATE_INDEX,
            &wire::CreateIndexRequest {
                collection_name: name.to_string(),
                field_name: field.to_string(),
                index_params: *spec,
            },
        )?;
        Ok(())
    }

    fn describe_index(&self, name: &str, field: &str) -> Result<Option<IndexSpec>> {
        let resp: wire::DescribeIndexResponse = self.call(
            routes::DESCRIBE_INDEX,
            &wire::IndexRequest {
                collection_name: name.to_string(),
                field_name: field.to_string(),
            },
        )?;
        Ok(resp.index_params)
    }

    fn drop_index(&self, name: &str, field: &str) -> Result<()> {
        let _: Empty = self.call(
            routes::DROP_INDEX,
            &wire::IndexRequest {
                collection_name: name.to_string(),
                field_name: field.to_string(),
            },
        )?;
        Ok(())
    }

    fn load_collection(&self, name: &str) -> Result<()> {
        let _: Empty = self.collection_call(routes::LOAD_COLLECTION, name)?;
        Ok(())
    }

    fn release_collection(&self, name: &str) -> Result<()> {
        let _: Empty = self.collection_call(routes::RELEASE_COLLECTION, name)?;
        Ok(())
    }

    fn load_state(&self, name: &str) -> Result<LoadState> {
        let resp: wire::LoadStateResponse = self.collection_call(routes::LOAD_STATE, name)?;
        Ok(resp.load_state)
    }

    fn search(&self, name: &str, request: &SearchRequest) -> Result<SearchResults> {
        self.call(
            routes::SEARCH,
            &wire::SearchBody {
                collection_name: name.to_string(),
                request: request.clone(),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreachable_server_is_connection_error() {
        // Port 1 on loopback is essentially never listening.
        let err = HttpTransport::with_timeout("127.0.0.1", 1, Some(Duration::from_secs(2)))
            .err()
            .unwrap();
        match err {
            Error::Connection { address, .. } => assert_eq!(address, "127.0.0.1:1"),
            other => panic!("expected connection error, got {:?}", other),
        }
    }

    #[test]
    fn test_rejected_status_mapping() {
        let err = rejected(
            routes::INSERT,
            reqwest::StatusCode::PAYLOAD_TOO_LARGE,
            "length limit exceeded".into(),
        );
        match err {
            Error::InvalidRequest(msg) => {
                assert!(msg.contains("413"), "{}", msg);
                assert!(msg.contains(routes::INSERT));
                assert!(msg.ends_with("length limit exceeded"));
            }
            other => panic!("expected invalid request, got {:?}", other),
        }

        let err = rejected(routes::SEARCH, reqwest::StatusCode::BAD_GATEWAY, String::new());
        assert_eq!(
            err,
            Error::Server(format!("{} rejected with HTTP 502 Bad Gateway", routes::SEARCH))
        );
    }
}

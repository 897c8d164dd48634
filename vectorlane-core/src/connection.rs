//! Sessions with a server, registered under aliases.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
#[cfg(feature = "http")]
use std::time::Duration;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::collection::{Collection, CollectionState};
use crate::error::{Error, Result};
use crate::schema::CollectionSchema;
use crate::transport::{LoadState, Transport};

/// Alias used when none is given.
pub const DEFAULT_ALIAS: &str = "default";

/// An authenticated session with one server.
///
/// Cheap to clone; clones share the underlying transport.
#[derive(Clone)]
pub struct Connection {
    alias: String,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("alias", &self.alias)
            .field("address", &self.transport.address())
            .finish()
    }
}

impl Connection {
    /// Wraps a transport after checking it answers.
    pub fn open(alias: impl Into<String>, transport: Arc<dyn Transport>) -> Result<Self> {
        transport.ping()?;
        Ok(Self {
            alias: alias.into(),
            transport,
        })
    }

    #[inline]
    pub fn alias(&self) -> &str {
        &self.alias
    }

    #[inline]
    pub fn address(&self) -> &str {
        self.transport.address()
    }

    #[inline]
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn has_collection(&self, name: &str) -> Result<bool> {
        self.transport.has_collection(name)
    }

    pub fn list_collections(&self) -> Result<Vec<String>> {
        self.transport.list_collections()
    }

    /// Drops a collection and all of its data.
    ///
    /// Fails with [`Error::CollectionNotFound`] if absent.
    pub fn drop_collection(&self, name: &str) -> Result<()> {
        self.transport.drop_collection(name)?;
        info!(alias = %self.alias, collection = name, "dropped collection");
        Ok(())
    }

    /// Creates a collection and returns a handle to it.
    ///
    /// Fails with [`Error::AlreadyExists`] if the name is taken.
    pub fn create_collection(&self, name: &str, schema: CollectionSchema) -> Result<Collection> {
        self.transport.create_collection(name, &schema)?;
        info!(alias = %self.alias, collection = name, "created collection");
        Ok(Collection::new(
            name,
            schema,
            Arc::clone(&self.transport),
            CollectionState::Created,
        ))
    }

    /// Drops `name` if it exists, then creates it afresh.
    pub fn recreate_collection(&self, name: &str, schema: CollectionSchema) -> Result<Collection> {
        if self.has_collection(name)? {
            self.drop_collection(name)?;
        }
        self.create_collection(name, schema)
    }

    /// Attaches to an existing collection.
    pub fn collection(&self, name: &str) -> Result<Collection> {
        let schema = self.transport.describe_collection(name)?;
        let state = match self.transport.load_state(name)? {
            LoadState::Loaded => CollectionState::Loaded,
            LoadState::NotExist => return Err(Error::CollectionNotFound(name.to_string())),
            LoadState::NotLoad => {
                let mut indexed = true;
                for field in schema.vector_fields() {
                    if self.transport.describe_index(name, field.name())?.is_none() {
                        indexed = false;
                        break;
                    }
                }
                if indexed {
                    CollectionState::Indexed
                } else {
                    CollectionState::Created
                }
            }
        };
        debug!(collection = name, ?state, "attached to collection");
        Ok(Collection::new(
            name,
            schema,
            Arc::clone(&self.transport),
            state,
        ))
    }
}

/// Registry of sessions keyed by alias.
///
/// Holds at most one session per alias. Owned by the caller; there is no
/// process-wide registry.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use vectorlane_core::{Connections, MemoryServer};
///
/// let connections = Connections::new();
/// connections.connect_with("default", Arc::new(MemoryServer::new())).unwrap();
///
/// let conn = connections.get("default").unwrap();
/// assert!(conn.list_collections().unwrap().is_empty());
///
/// assert!(connections.disconnect("default"));
/// assert!(connections.get("default").is_err());
/// ```
#[derive(Debug, Default)]
pub struct Connections {
    sessions: RwLock<HashMap<String, Connection>>,
}

impl Connections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connects to a server over HTTP and registers the session.
    #[cfg(feature = "http")]
    pub fn connect(&self, alias: &str, host: &str, port: u16) -> Result<Connection> {
        self.connect_with_timeout(alias, host, port, None)
    }

    /// Like [`connect`](Self::connect) with a per-request timeout.
    #[cfg(feature = "http")]
    pub fn connect_with_timeout(
        &self,
        alias: &str,
        host: &str,
        port: u16,
        timeout: Option<Duration>,
    ) -> Result<Connection> {
        let transport = crate::http::HttpTransport::with_timeout(host, port, timeout)?;
        self.connect_with(alias, Arc::new(transport))
    }

    /// Registers any transport under `alias` after a handshake.
    ///
    /// An existing session under the same alias is replaced.
    pub fn connect_with(&self, alias: &str, transport: Arc<dyn Transport>) -> Result<Connection> {
        let connection = Connection::open(alias, transport)?;
        let previous = self
            .sessions
            .write()
            .insert(alias.to_string(), connection.clone());
        match previous {
            Some(old) => warn!(
                alias,
                old = old.address(),
                new = connection.address(),
                "replaced existing connection"
            ),
            None => info!(alias, address = connection.address(), "connected"),
        }
        Ok(connection)
    }

    /// Returns the session registered under `alias`.
    pub fn get(&self, alias: &str) -> Result<Connection> {
        self.sessions
            .read()
            .get(alias)
            .cloned()
            .ok_or_else(|| Error::NotConnected(alias.to_string()))
    }

    /// Drops the session. Returns whether one existed.
    pub fn disconnect(&self, alias: &str) -> bool {
        let removed = self.sessions.write().remove(alias).is_some();
        if removed {
            info!(alias, "disconnected");
        }
        removed
    }

    pub fn has_connection(&self, alias: &str) -> bool {
        self.sessions.read().contains_key(alias)
    }

    /// Registered aliases, sorted.
    pub fn aliases(&self) -> Vec<String> {
        let mut aliases: Vec<String> = self.sessions.read().keys().cloned().collect();
        aliases.sort();
        aliases
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryServer;
    use crate::schema::{build_schema, FieldSchema};

    fn schema() -> CollectionSchema {
        build_schema(vec![
            FieldSchema::int64("id").primary(),
            FieldSchema::float_vector("embedding", 8),
        ])
        .unwrap()
    }

    #[test]
    fn test_reconnect_replaces_session() {
        let connections = Connections::new();
        let first = Arc::new(MemoryServer::new());
        connections.connect_with("default", first.clone()).unwrap();
        first.create_collection("only_in_first", &schema()).unwrap();

        connections
            .connect_with("default", Arc::new(MemoryServer::new()))
            .unwrap();
        let conn = connections.get("default").unwrap();
        assert!(!conn.has_collection("only_in_first").unwrap());
        assert_eq!(connections.aliases(), vec!["default".to_string()]);
    }

    #[test]
    fn test_missing_alias() {
        let connections = Connections::new();
        assert_eq!(
            connections.get("nope").unwrap_err(),
            Error::NotConnected("nope".into())
        );
        assert!(!connections.disconnect("nope"));
        assert!(!connections.has_connection("nope"));
    }

    #[test]
    fn test_recreate_collection_is_idempotent() {
        let conn = Connection::open("t", Arc::new(MemoryServer::new())).unwrap();
        for _ in 0..2 {
            let collection = conn.recreate_collection("demo", schema()).unwrap();
            assert_eq!(collection.num_entities().unwrap(), 0);
            assert_eq!(collection.state(), CollectionState::Created);
        }
        assert_eq!(conn.list_collections().unwrap(), vec!["demo".to_string()]);
        assert!(matches!(
            conn.create_collection("demo", schema()),
            Err(Error::AlreadyExists(_))
        ));
    }

    #[test]
    fn test_attach_reports_state() {
        let conn = Connection::open("t", Arc::new(MemoryServer::new())).unwrap();
        conn.create_collection("demo", schema()).unwrap();
        assert_eq!(conn.collection("demo").unwrap().state(), CollectionState::Created);
        assert!(matches!(
            conn.collection("missing"),
            Err(Error::CollectionNotFound(_))
        ));
    }
}

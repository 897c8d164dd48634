//! End-to-end lifecycle scenarios against the in-process server.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rand::Rng;
use vectorlane_core::prelude::*;
use vectorlane_core::{InsertBatch, SearchRequest};

fn random_vectors(n: usize, dim: usize) -> Vec<Vec<f32>> {
    let mut rng = rand::thread_rng();
    (0..n)
        .map(|_| (0..dim).map(|_| rng.gen::<f32>()).collect())
        .collect()
}

fn image_schema() -> CollectionSchema {
    build_schema(vec![
        FieldSchema::int64("id").primary(),
        FieldSchema::float_vector("embedding", 128),
    ])
    .unwrap()
}

fn connect() -> Connection {
    Connection::open("default", Arc::new(MemoryServer::new())).unwrap()
}

fn records(vectors: &[Vec<f32>]) -> Vec<Record> {
    vectors
        .iter()
        .enumerate()
        .map(|(i, v)| {
            Record::new()
                .with_field("id", i as i64)
                .with_vector("embedding", v.clone())
        })
        .collect()
}

#[test]
fn test_random_vectors_round_trip() {
    let conn = connect();
    let collection = conn
        .recreate_collection("image_collection", image_schema())
        .unwrap();

    let vectors = random_vectors(10, 128);
    let ack = collection.insert(&records(&vectors), None).unwrap();
    assert_eq!(ack.insert_count, 10);
    assert_eq!(collection.num_entities().unwrap(), 10);

    collection
        .create_index("embedding", &IndexSpec::ivf_flat(MetricType::L2, 128).unwrap())
        .unwrap();
    collection.load().unwrap();

    let request = SearchRequest::new(
        "embedding",
        vec![vectors[0].clone()],
        SearchParams::ivf(MetricType::L2, 10).unwrap(),
    )
    .limit(3);
    let results = collection.search(&request).unwrap();

    assert_eq!(results.len(), 1);
    let hits = results.get(0).unwrap();
    assert_eq!(hits.len(), 3);
    let top = hits.top().unwrap();
    assert_eq!(top.id, PrimaryKey::Int(0));
    assert!(top.distance.abs() < 1e-5);

    let distances = hits.distances();
    assert!(distances.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn test_search_outside_loaded_state() {
    let conn = connect();
    let collection = conn.create_collection("c", image_schema()).unwrap();
    let vectors = random_vectors(4, 128);
    collection.insert(&records(&vectors), None).unwrap();
    collection
        .create_index("embedding", &IndexSpec::flat(MetricType::L2))
        .unwrap();

    let request = SearchRequest::new(
        "embedding",
        vec![vectors[1].clone()],
        SearchParams::new(MetricType::L2),
    );
    assert!(matches!(
        collection.search(&request),
        Err(Error::NotLoaded(_))
    ));

    collection.load().unwrap();
    assert!(collection.search(&request).is_ok());

    collection.release().unwrap();
    assert_eq!(collection.state(), CollectionState::Released);
    assert!(matches!(
        collection.search(&request),
        Err(Error::NotLoaded(_))
    ));

    collection.load().unwrap();
    assert!(collection.search(&request).is_ok());
}

#[test]
fn test_drop_create_twice_is_equivalent() {
    let conn = connect();
    let first = conn.recreate_collection("c", image_schema()).unwrap();
    first.insert(&records(&random_vectors(3, 128)), None).unwrap();

    let second = conn.recreate_collection("c", image_schema()).unwrap();
    let third = conn.recreate_collection("c", image_schema()).unwrap();

    assert_eq!(second.num_entities().unwrap(), 0);
    assert_eq!(third.num_entities().unwrap(), 0);
    assert_eq!(conn.collection("c").unwrap().schema(), third.schema());
    assert_eq!(third.load_state().unwrap(), LoadState::NotLoad);
}

#[test]
fn test_wrong_dimension_leaves_collection_unchanged() {
    let conn = connect();
    let collection = conn.create_collection("c", image_schema()).unwrap();
    collection
        .insert(&records(&random_vectors(2, 128)), None)
        .unwrap();

    let mut batch = records(&random_vectors(3, 128));
    batch[2] = Record::new()
        .with_field("id", 2i64)
        .with_vector("embedding", vec![0.0; 127]);

    let err = collection.insert(&batch, None).unwrap_err();
    match err {
        Error::Validation { row, field, .. } => {
            assert_eq!(row, 2);
            assert_eq!(field, "embedding");
        }
        other => panic!("expected validation error, got {:?}", other),
    }
    assert_eq!(collection.num_entities().unwrap(), 2);
}

/// Counts calls that reach the server.
struct CountingTransport {
    inner: MemoryServer,
    inserts: AtomicUsize,
}

impl Transport for CountingTransport {
    fn address(&self) -> &str {
        self.inner.address()
    }
    fn ping(&self) -> Result<()> {
        self.inner.ping()
    }
    fn has_collection(&self, name: &str) -> Result<bool> {
        self.inner.has_collection(name)
    }
    fn list_collections(&self) -> Result<Vec<String>> {
        self.inner.list_collections()
    }
    fn create_collection(&self, name: &str, schema: &CollectionSchema) -> Result<()> {
        self.inner.create_collection(name, schema)
    }
    fn describe_collection(&self, name: &str) -> Result<CollectionSchema> {
        self.inner.describe_collection(name)
    }
    fn drop_collection(&self, name: &str) -> Result<()> {
        self.inner.drop_collection(name)
    }
    fn insert(&self, name: &str, batch: &InsertBatch) -> Result<InsertAck> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        self.inner.insert(name, batch)
    }
    fn row_count(&self, name: &str) -> Result<usize> {
        self.inner.row_count(name)
    }
    fn create_index(&self, name: &str, field: &str, spec: &IndexSpec) -> Result<()> {
        self.inner.create_index(name, field, spec)
    }
    fn describe_index(&self, name: &str, field: &str) -> Result<Option<IndexSpec>> {
        self.inner.describe_index(name, field)
    }
    fn drop_index(&self, name: &str, field: &str) -> Result<()> {
        self.inner.drop_index(name, field)
    }
    fn load_collection(&self, name: &str) -> Result<()> {
        self.inner.load_collection(name)
    }
    fn release_collection(&self, name: &str) -> Result<()> {
        self.inner.release_collection(name)
    }
    fn load_state(&self, name: &str) -> Result<LoadState> {
        self.inner.load_state(name)
    }
    fn search(&self, name: &str, request: &SearchRequest) -> Result<SearchResults> {
        self.inner.search(name, request)
    }
}

#[test]
fn test_text_without_embedder_fails_before_send() {
    let transport = Arc::new(CountingTransport {
        inner: MemoryServer::new(),
        inserts: AtomicUsize::new(0),
    });
    let conn = Connection::open("default", transport.clone()).unwrap();
    let schema = build_schema(vec![
        FieldSchema::int64("id").primary(),
        FieldSchema::float_vector("vector", 8),
        FieldSchema::varchar("text", 255),
    ])
    .unwrap();
    let collection = conn.create_collection("docs", schema).unwrap();

    let docs = vec![Record::new()
        .with_field("id", 0)
        .with_field("text", "Artificial intelligence was founded in 1956.")
        .with_text("vector", "Artificial intelligence was founded in 1956.")];

    assert!(matches!(
        collection.insert(&docs, None),
        Err(Error::Encoding(_))
    ));
    assert_eq!(transport.inserts.load(Ordering::SeqCst), 0);
    assert_eq!(collection.num_entities().unwrap(), 0);
}

#[test]
fn test_concurrent_searches_share_handle() {
    let conn = connect();
    let collection = conn.create_collection("c", image_schema()).unwrap();
    let vectors = random_vectors(20, 128);
    collection.insert(&records(&vectors), None).unwrap();
    collection
        .create_index("embedding", &IndexSpec::flat(MetricType::L2))
        .unwrap();
    collection.load().unwrap();

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let collection = collection.clone();
            let query = vectors[i].clone();
            std::thread::spawn(move || {
                let request =
                    SearchRequest::new("embedding", vec![query], SearchParams::new(MetricType::L2))
                        .limit(1);
                collection.search(&request).unwrap()
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let results = handle.join().unwrap();
        assert_eq!(
            results.get(0).unwrap().top().unwrap().id,
            PrimaryKey::Int(i as i64)
        );
    }
}

//! Drives the blocking HTTP client against a live server on a loopback port.

use std::net::TcpListener;
use std::sync::Arc;

use vectorlane_core::prelude::*;
use vectorlane_core::HttpTransport;

fn spawn_server() -> u16 {
    serve(vectorlane_server::router(Arc::new(MemoryServer::new())))
}

/// Serves the router on an ephemeral port from a background runtime.
fn serve(app: axum::Router) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let port = listener.local_addr().unwrap().port();

    std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::from_std(listener).unwrap();
            axum::serve(listener, app).await.unwrap();
        });
    });
    port
}

#[test]
fn test_full_workflow_over_http() {
    let port = spawn_server();
    let connections = Connections::new();
    let conn = connections
        .connect_with("default", Arc::new(HttpTransport::connect("127.0.0.1", port).unwrap()))
        .unwrap();

    let schema = build_schema(vec![
        FieldSchema::int64("id").primary(),
        FieldSchema::float_vector("vector", 3),
        FieldSchema::varchar("subject", 255),
    ])
    .unwrap();
    let collection = conn.recreate_collection("demo_collection", schema).unwrap();

    let records: Vec<Record> = (0..5)
        .map(|i| {
            Record::new()
                .with_field("id", i as i64)
                .with_vector("vector", vec![i as f32, 1.0, 0.5])
                .with_field("subject", if i < 3 { "history" } else { "biology" })
        })
        .collect();
    let ack = collection.insert(&records, None).unwrap();
    assert_eq!(ack.insert_count, 5);
    assert_eq!(ack.ids[4], PrimaryKey::Int(4));
    assert_eq!(collection.num_entities().unwrap(), 5);

    let request = SearchRequest::new(
        "vector",
        vec![vec![4.0, 1.0, 0.5]],
        SearchParams::ivf(MetricType::L2, 10).unwrap(),
    )
    .limit(10)
    .output_fields(["id", "subject"])
    .filter(r#"subject == "history""#)
    .consistency(ConsistencyLevel::Strong);

    // Server-side error comes back as the same variant
    assert_eq!(
        collection.search(&request).unwrap_err(),
        Error::NotLoaded("demo_collection".into())
    );

    collection
        .create_index("vector", &IndexSpec::ivf_flat(MetricType::L2, 100).unwrap())
        .unwrap();
    assert_eq!(
        collection.index("vector").unwrap(),
        Some(IndexSpec::ivf_flat(MetricType::L2, 100).unwrap())
    );
    collection.load().unwrap();
    assert_eq!(collection.load_state().unwrap(), LoadState::Loaded);

    let results = collection.search(&request).unwrap();
    let hits = results.get(0).unwrap();
    assert_eq!(
        hits.ids(),
        vec![&PrimaryKey::Int(2), &PrimaryKey::Int(1), &PrimaryKey::Int(0)]
    );
    assert_eq!(hits.top().unwrap().entity.get_str("subject"), Some("history"));
    assert!((hits.top().unwrap().distance - 4.0).abs() < 1e-6);

    let bad_filter = request.clone().filter("subject ==");
    assert!(matches!(
        collection.search(&bad_filter),
        Err(Error::FilterSyntax(_))
    ));

    collection.release().unwrap();
    assert!(matches!(
        collection.search(&request),
        Err(Error::NotLoaded(_))
    ));

    collection.drop().unwrap();
    assert!(!conn.has_collection("demo_collection").unwrap());
}

#[test]
fn test_connect_to_closed_port_fails() {
    // Bind then drop to get a port nobody is listening on
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let connections = Connections::new();
    let err = connections
        .connect("default", "127.0.0.1", port)
        .unwrap_err();
    assert!(matches!(err, Error::Connection { .. }));
    assert!(!connections.has_connection("default"));
}

fn connect(port: u16) -> Connection {
    Connections::new()
        .connect_with("default", Arc::new(HttpTransport::connect("127.0.0.1", port).unwrap()))
        .unwrap()
}

fn wide_schema(dim: usize) -> CollectionSchema {
    build_schema(vec![
        FieldSchema::int64("id").primary(),
        FieldSchema::float_vector("vector", dim),
    ])
    .unwrap()
}

fn wide_records(count: usize, dim: usize) -> Vec<Record> {
    (0..count)
        .map(|i| {
            let vector = (0..dim)
                .map(|j| ((i * 31 + j) % 997) as f32 / 997.0)
                .collect();
            Record::new()
                .with_field("id", i as i64)
                .with_vector("vector", vector)
        })
        .collect()
}

#[test]
fn test_insert_batch_larger_than_axum_default_limit() {
    let conn = connect(spawn_server());
    let collection = conn.recreate_collection("documents", wide_schema(768)).unwrap();

    // 1000 x 768 floats is several MiB of JSON
    let records = wide_records(1000, 768);
    let ack = collection.insert(&records, None).unwrap();
    assert_eq!(ack.insert_count, 1000);
    assert_eq!(collection.num_entities().unwrap(), 1000);
}

#[test]
fn test_body_over_configured_limit_is_reported() {
    let app = vectorlane_server::router_with_body_limit(Arc::new(MemoryServer::new()), 16 * 1024);
    let conn = connect(serve(app));
    let collection = conn.recreate_collection("small", wide_schema(768)).unwrap();

    let err = collection.insert(&wide_records(10, 768), None).unwrap_err();
    match err {
        Error::InvalidRequest(msg) => assert!(msg.contains("413"), "{}", msg),
        other => panic!("expected invalid request, got {:?}", other),
    }
    assert_eq!(collection.num_entities().unwrap(), 0);
}

#[test]
fn test_deeply_nested_filter_is_rejected() {
    let conn = connect(spawn_server());
    let collection = conn.recreate_collection("nested", wide_schema(2)).unwrap();
    collection.insert(&wide_records(3, 2), None).unwrap();
    collection
        .create_index("vector", &IndexSpec::flat(MetricType::L2))
        .unwrap();
    collection.load().unwrap();

    let depth = 100_000;
    let filter = format!("{}id == 1{}", "(".repeat(depth), ")".repeat(depth));
    let request = SearchRequest::new(
        "vector",
        vec![vec![0.0, 0.0]],
        SearchParams::new(MetricType::L2),
    )
    .filter(filter);
    assert_eq!(
        collection.search(&request).unwrap_err(),
        Error::FilterSyntax("filter nested too deeply".into())
    );

    // The server is still answering
    let plain = request.filter("id == 1");
    let results = collection.search(&plain).unwrap();
    assert_eq!(results.get(0).unwrap().ids(), vec![&PrimaryKey::Int(1)]);
}

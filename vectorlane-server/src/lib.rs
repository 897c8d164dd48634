//! HTTP front end for any [`Transport`].
//!
//! Serves the JSON API described in [`vectorlane_core::wire`]. Every route
//! answers `200 OK` with an [`Envelope`]; failures travel inside the envelope
//! as the same [`Error`] variant the backend raised.
//!
//! Request bodies are capped at [`DEFAULT_BODY_LIMIT`] unless the router is
//! built with [`router_with_body_limit`]. A body over the cap is answered
//! with `413 Payload Too Large` before it reaches a handler.

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    routing::post,
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use vectorlane_core::wire::{
    routes, CollectionRequest, CreateCollectionRequest, CreateIndexRequest, DescribeIndexResponse,
    Empty, EmptyRequest, Envelope, HasResponse, IndexRequest, InsertRequest, LoadStateResponse,
    SearchBody, StatsResponse,
};
use vectorlane_core::{
    CollectionSchema, Error, InsertAck, Result, SearchResults, Transport,
};

#[derive(Clone)]
struct AppState {
    transport: Arc<dyn Transport>,
}

/// Default request body cap: 64 MiB.
///
/// A JSON insert of 1000 x 768 float vectors is about 7 MiB, well past
/// axum's built-in 2 MiB limit.
pub const DEFAULT_BODY_LIMIT: usize = 64 * 1024 * 1024;

/// Builds the API router over `transport` with [`DEFAULT_BODY_LIMIT`].
pub fn router(transport: Arc<dyn Transport>) -> Router {
    router_with_body_limit(transport, DEFAULT_BODY_LIMIT)
}

/// Builds the API router, rejecting request bodies over `max_body_bytes`.
pub fn router_with_body_limit(transport: Arc<dyn Transport>, max_body_bytes: usize) -> Router {
    let state = AppState { transport };

    Router::new()
        .route(routes::HEALTH, post(health))
        .route(routes::HAS_COLLECTION, post(has_collection))
        .route(routes::LIST_COLLECTIONS, post(list_collections))
        .route(routes::CREATE_COLLECTION, post(create_collection))
        .route(routes::DESCRIBE_COLLECTION, post(describe_collection))
        .route(routes::DROP_COLLECTION, post(drop_collection))
        .route(routes::LOAD_COLLECTION, post(load_collection))
        .route(routes::RELEASE_COLLECTION, post(release_collection))
        .route(routes::LOAD_STATE, post(load_state))
        .route(routes::COLLECTION_STATS, post(collection_stats))
        .route(routes::INSERT, post(insert))
        .route(routes::SEARCH, post(search))
        .route(routes::CREATE_INDEX, post(create_index))
        .route(routes::DESCRIBE_INDEX, post(describe_index))
        .route(routes::DROP_INDEX, post(drop_index))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Runs a blocking backend call off the async runtime.
async fn dispatch<Req, Resp, F>(state: AppState, req: Req, f: F) -> Json<Envelope<Resp>>
where
    Req: Send + 'static,
    Resp: Send + 'static,
    F: FnOnce(&dyn Transport, Req) -> Result<Resp> + Send + 'static,
{
    let transport = state.transport;
    let result = tokio::task::spawn_blocking(move || f(transport.as_ref(), req))
        .await
        .unwrap_or_else(|e| Err(Error::Server(format!("request handler failed: {}", e))));

    if let Err(e) = &result {
        tracing::debug!(code = e.code(), error = %e, "request rejected");
    }
    Json(Envelope::from_result(result))
}

async fn health(State(state): State<AppState>, Json(req): Json<EmptyRequest>) -> Json<Envelope<Empty>> {
    dispatch(state, req, |t, _| t.ping().map(|_| Empty {})).await
}

async fn has_collection(
    State(state): State<AppState>,
    Json(req): Json<CollectionRequest>,
) -> Json<Envelope<HasResponse>> {
    dispatch(state, req, |t, req| {
        Ok(HasResponse {
            has: t.has_collection(&req.collection_name)?,
        })
    })
    .await
}

async fn list_collections(
    State(state): State<AppState>,
    Json(req): Json<EmptyRequest>,
) -> Json<Envelope<Vec<String>>> {
    dispatch(state, req, |t, _| t.list_collections()).await
}

async fn create_collection(
    State(state): State<AppState>,
    Json(req): Json<CreateCollectionRequest>,
) -> Json<Envelope<Empty>> {
    dispatch(state, req, |t, req| {
        t.create_collection(&req.collection_name, &req.schema)
            .map(|_| Empty {})
    })
    .await
}

async fn describe_collection(
    State(state): State<AppState>,
    Json(req): Json<CollectionRequest>,
) -> Json<Envelope<CollectionSchema>> {
    dispatch(state, req, |t, req| t.describe_collection(&req.collection_name)).await
}

async fn drop_collection(
    State(state): State<AppState>,
    Json(req): Json<CollectionRequest>,
) -> Json<Envelope<Empty>> {
    dispatch(state, req, |t, req| {
        t.drop_collection(&req.collection_name).map(|_| Empty {})
    })
    .await
}

async fn load_collection(
    State(state): State<AppState>,
    Json(req): Json<CollectionRequest>,
) -> Json<Envelope<Empty>> {
    dispatch(state, req, |t, req| {
        t.load_collection(&req.collection_name).map(|_| Empty {})
    })
    .await
}

async fn release_collection(
    State(state): State<AppState>,
    Json(req): Json<CollectionRequest>,
) -> Json<Envelope<Empty>> {
    dispatch(state, req, |t, req| {
        t.release_collection(&req.collection_name).map(|_| Empty {})
    })
    .await
}

async fn load_state(
    State(state): State<AppState>,
    Json(req): Json<CollectionRequest>,
) -> Json<Envelope<LoadStateResponse>> {
    dispatch(state, req, |t, req| {
        Ok(LoadStateResponse {
            load_state: t.load_state(&req.collection_name)?,
        })
    })
    .await
}

async fn collection_stats(
    State(state): State<AppState>,
    Json(req): Json<CollectionRequest>,
) -> Json<Envelope<StatsResponse>> {
    dispatch(state, req, |t, req| {
        Ok(StatsResponse {
            row_count: t.row_count(&req.collection_name)?,
        })
    })
    .await
}

async fn insert(
    State(state): State<AppState>,
    Json(req): Json<InsertRequest>,
) -> Json<Envelope<InsertAck>> {
    dispatch(state, req, |t, req| t.insert(&req.collection_name, &req.data)).await
}

async fn search(
    State(state): State<AppState>,
    Json(req): Json<SearchBody>,
) -> Json<Envelope<SearchResults>> {
    dispatch(state, req, |t, req| t.search(&req.collection_name, &req.request)).await
}

async fn create_index(
    State(state): State<AppState>,
    Json(req): Json<CreateIndexRequest>,
) -> Json<Envelope<Empty>> {
    dispatch(state, req, |t, req| {
        t.create_index(&req.collection_name, &req.field_name, &req.index_params)
            .map(|_| Empty {})
    })
    .await
}

async fn describe_index(
    State(state): State<AppState>,
    Json(req): Json<IndexRequest>,
) -> Json<Envelope<DescribeIndexResponse>> {
    dispatch(state, req, |t, req| {
        Ok(DescribeIndexResponse {
            index_params: t.describe_index(&req.collection_name, &req.field_name)?,
        })
    })
    .await
}

async fn drop_index(
    State(state): State<AppState>,
    Json(req): Json<IndexRequest>,
) -> Json<Envelope<Empty>> {
    dispatch(state, req, |t, req| {
        t.drop_index(&req.collection_name, &req.field_name)
            .map(|_| Empty {})
    })
    .await
}

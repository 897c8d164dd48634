//! # VectorLane
//!
//! **A typed client workflow for vector databases.**
//!
//! VectorLane drives a collection through its whole lifecycle against a
//! Milvus-style server:
//!
//! - **Connect** under an alias, with a handshake
//! - **Define** a schema that is validated before anything is sent
//! - **Insert** records, embedding raw text on the way if asked to
//! - **Index**, **load**, **search**, **release** and **drop**
//!
//! ## Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | **Typed schemas** | Primary key, vector dimension and VarChar limits checked locally |
//! | **Typed indexes** | IVF_FLAT, IVF_SQ8, IVF_PQ, HNSW, FLAT, AUTOINDEX with validated parameters |
//! | **Embedding hook** | Records may carry text; an `EmbeddingFunction` turns it into vectors |
//! | **Filters** | `subject == "history" and id in [0, 1]` over scalar fields |
//! | **Two transports** | HTTP (`HttpTransport`) or in-process (`MemoryServer`) |
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use vectorlane::prelude::*;
//!
//! let connections = Connections::new();
//! let conn = connections
//!     .connect_with("default", Arc::new(MemoryServer::new()))
//!     .unwrap();
//!
//! let schema = build_schema(vec![
//!     FieldSchema::int64("id").primary(),
//!     FieldSchema::float_vector("embedding", 4),
//!     FieldSchema::varchar("subject", 255),
//! ])
//! .unwrap();
//! let collection = conn.recreate_collection("demo", schema).unwrap();
//!
//! let records: Vec<Record> = (0..4)
//!     .map(|i| {
//!         Record::new()
//!             .with_field("id", i)
//!             .with_vector("embedding", vec![i as f32; 4])
//!             .with_field("subject", "history")
//!     })
//!     .collect();
//! collection.insert(&records, None).unwrap();
//!
//! collection
//!     .create_index("embedding", &IndexSpec::ivf_flat(MetricType::L2, 16).unwrap())
//!     .unwrap();
//! collection.load().unwrap();
//!
//! let request = SearchRequest::new(
//!     "embedding",
//!     vec![vec![2.0; 4]],
//!     SearchParams::ivf(MetricType::L2, 4).unwrap(),
//! )
//! .limit(2)
//! .output_fields(["subject"]);
//!
//! let results = collection.search(&request).unwrap();
//! assert_eq!(results.get(0).unwrap().top().unwrap().id, PrimaryKey::Int(2));
//!
//! collection.release().unwrap();
//! ```
//!
//! ## Remote Server
//!
//! ```no_run
//! use vectorlane::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let connections = Connections::new();
//!     let conn = connections.connect("default", "localhost", 19530)?;
//!     for name in conn.list_collections()? {
//!         println!("{}", name);
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod logging;
pub mod workflow;

// Re-export everything from core
pub use vectorlane_core::*;

//! End-to-end workflows run by the `vectorlane` binary.
//!
//! Both follow the same path: recreate the collection, insert, build an
//! IVF_FLAT/L2 index, load, search with one query vector, report the hits.

use rand::Rng;
use tracing::{info, warn};
use vectorlane_core::{
    build_schema, Connection, ConsistencyLevel, EmbeddingFunction, FieldSchema, Hits, IndexSpec,
    InsertAck, MetricType, Record, Result, SearchParams, SearchRequest, SearchResults,
};

/// Outcome of a workflow run.
#[derive(Debug, Clone)]
pub struct WorkflowReport {
    pub collection: String,
    pub insert: InsertAck,
    pub results: SearchResults,
    /// Whether the collection was released at the end.
    pub released: bool,
}

impl WorkflowReport {
    /// Hits for the single query vector.
    pub fn hits(&self) -> Option<&Hits> {
        self.results.get(0)
    }
}

/// Inserts random vectors and searches with the first one.
#[derive(Debug, Clone)]
pub struct RandomVectors {
    pub collection: String,
    pub count: usize,
    pub dim: usize,
    pub nlist: u32,
    pub nprobe: u32,
    pub limit: usize,
}

impl Default for RandomVectors {
    fn default() -> Self {
        Self {
            collection: "image_collection".to_string(),
            count: 10,
            dim: 128,
            nlist: 128,
            nprobe: 10,
            limit: 3,
        }
    }
}

impl RandomVectors {
    pub fn run(&self, conn: &Connection) -> Result<WorkflowReport> {
        let schema = build_schema(vec![
            FieldSchema::int64("id").primary(),
            FieldSchema::float_vector("embedding", self.dim),
        ])?;
        let collection = conn.recreate_collection(&self.collection, schema)?;
        info!(collection = %self.collection, "collection created");

        let mut rng = rand::thread_rng();
        let vectors: Vec<Vec<f32>> = (0..self.count)
            .map(|_| (0..self.dim).map(|_| rng.gen::<f32>()).collect())
            .collect();
        let records: Vec<Record> = vectors
            .iter()
            .enumerate()
            .map(|(i, v)| {
                Record::new()
                    .with_field("id", i as i64)
                    .with_vector("embedding", v.clone())
            })
            .collect();
        let insert = collection.insert(&records, None)?;

        collection.create_index(
            "embedding",
            &IndexSpec::ivf_flat(MetricType::L2, self.nlist)?,
        )?;
        info!("index created");
        collection.load()?;

        let query = vectors.into_iter().take(1).collect();
        let request = SearchRequest::new(
            "embedding",
            query,
            SearchParams::ivf(MetricType::L2, self.nprobe)?,
        )
        .limit(self.limit);
        let results = collection.search(&request)?;
        report_hits(&results, &[]);

        Ok(WorkflowReport {
            collection: self.collection.clone(),
            insert,
            results,
            released: false,
        })
    }
}

/// Embeds a few documents, searches with the first, then releases.
#[derive(Debug, Clone)]
pub struct Documents {
    pub collection: String,
    pub documents: Vec<String>,
    pub subject: String,
    pub dim: usize,
    pub nlist: u32,
    pub nprobe: u32,
    pub limit: usize,
}

impl Default for Documents {
    fn default() -> Self {
        Self {
            collection: "demo_collection".to_string(),
            documents: vec![
                "Artificial intelligence was founded as an academic discipline in 1956.".into(),
                "Alan Turing was the first person to conduct substantial research in AI.".into(),
                "Born in Maida Vale, London, Turing was raised in southern England.".into(),
            ],
            subject: "history".to_string(),
            dim: 768,
            nlist: 100,
            nprobe: 10,
            limit: 10,
        }
    }
}

const OUTPUT_FIELDS: [&str; 3] = ["id", "text", "subject"];

impl Documents {
    pub fn run(&self, conn: &Connection, embedder: &dyn EmbeddingFunction) -> Result<WorkflowReport> {
        let schema = build_schema(vec![
            FieldSchema::int64("id").primary(),
            FieldSchema::float_vector("vector", self.dim),
            FieldSchema::varchar("text", 255),
            FieldSchema::varchar("subject", 255),
        ])?;
        let collection = conn.recreate_collection(&self.collection, schema)?;
        info!(collection = %self.collection, "collection created");

        let records: Vec<Record> = self
            .documents
            .iter()
            .enumerate()
            .map(|(i, doc)| {
                Record::new()
                    .with_field("id", i as i64)
                    .with_text("vector", doc.as_str())
                    .with_field("text", doc.as_str())
                    .with_field("subject", self.subject.as_str())
            })
            .collect();
        let insert = collection.insert(&records, Some(embedder))?;
        info!(count = insert.insert_count, model = embedder.model_name(), "data inserted");

        collection.create_index("vector", &IndexSpec::ivf_flat(MetricType::L2, self.nlist)?)?;
        info!(collection = %self.collection, "index created");
        collection.load()?;

        let query: Vec<String> = self.documents.iter().take(1).cloned().collect();
        let request = SearchRequest::from_texts(
            "vector",
            &query,
            embedder,
            SearchParams::ivf(MetricType::L2, self.nprobe)?,
        )?
        .limit(self.limit)
        .output_fields(OUTPUT_FIELDS)
        .consistency(ConsistencyLevel::Strong);
        let results = collection.search(&request)?;
        report_hits(&results, &["text", "subject"]);

        collection.release()?;
        info!(collection = %self.collection, "collection released from memory");

        Ok(WorkflowReport {
            collection: self.collection.clone(),
            insert,
            results,
            released: true,
        })
    }
}

fn report_hits(results: &SearchResults, fields: &[&str]) {
    if results.iter().all(Hits::is_empty) {
        warn!("no search results found");
        return;
    }
    for (query, hits) in results.iter().enumerate() {
        for hit in hits {
            let extra: Vec<String> = fields
                .iter()
                .map(|f| format!("{}={}", f, hit.entity.get_str(f).unwrap_or("-")))
                .collect();
            info!(
                query,
                id = %hit.id,
                distance = hit.distance,
                "hit {}",
                extra.join(" ")
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use vectorlane_core::{CollectionState, Error, MemoryServer, PrimaryKey};

    use super::*;

    /// Deterministic stand-in for a text model: character histogram.
    struct HistogramEmbedding {
        dim: usize,
    }

    impl EmbeddingFunction for HistogramEmbedding {
        fn encode_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| {
                    let mut v = vec![0.0; self.dim];
                    for b in t.bytes() {
                        v[b as usize % self.dim] += 1.0;
                    }
                    v
                })
                .collect())
        }

        fn dimension(&self) -> usize {
            self.dim
        }

        fn model_name(&self) -> &str {
            "histogram"
        }
    }

    fn conn() -> Connection {
        Connection::open("default", Arc::new(MemoryServer::new())).unwrap()
    }

    #[test]
    fn test_random_vectors_finds_first_vector() {
        let conn = conn();
        let report = RandomVectors::default().run(&conn).unwrap();

        assert_eq!(report.insert.insert_count, 10);
        let hits = report.hits().unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits.top().unwrap().id, PrimaryKey::Int(0));
        assert!(hits.top().unwrap().distance.abs() < 1e-5);

        // Running again starts from an empty collection
        let again = RandomVectors::default().run(&conn).unwrap();
        assert_eq!(again.insert.insert_count, 10);
        assert_eq!(conn.collection("image_collection").unwrap().num_entities().unwrap(), 10);
    }

    #[test]
    fn test_documents_workflow() {
        let conn = conn();
        let workflow = Documents {
            dim: 64,
            ..Documents::default()
        };
        let report = workflow.run(&conn, &HistogramEmbedding { dim: 64 }).unwrap();

        assert!(report.released);
        let hits = report.hits().unwrap();
        assert_eq!(hits.len(), 3);
        let top = hits.top().unwrap();
        assert_eq!(top.id, PrimaryKey::Int(0));
        assert_eq!(top.entity.get_str("subject"), Some("history"));
        assert_eq!(top.entity.get_i64("id"), Some(0));
        assert!(top.entity.get_str("text").unwrap().starts_with("Artificial"));

        let collection = conn.collection("demo_collection").unwrap();
        assert_eq!(collection.state(), CollectionState::Indexed);
    }

    #[test]
    fn test_documents_wrong_embedding_dimension() {
        let conn = conn();
        let err = Documents::default()
            .run(&conn, &HistogramEmbedding { dim: 32 })
            .unwrap_err();
        assert!(matches!(err, Error::Encoding(_)));
        assert_eq!(
            conn.collection("demo_collection").unwrap().num_entities().unwrap(),
            0
        );
    }
}

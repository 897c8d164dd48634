//! Ollama RAG Example - Semantic search over a remote collection
//!
//! This example demonstrates a complete retrieval pipeline using:
//! - Ollama for embedding generation (nomic-embed-text model)
//! - A Milvus-compatible server for storage and search
//!
//! Prerequisites:
//! 1. Install Ollama: https://ollama.ai
//! 2. Pull the embedding model: ollama pull nomic-embed-text
//! 3. Start a server: cargo run -p vectorlane-server
//! 4. Run with: cargo run --example ollama_rag

use vectorlane::prelude::*;
use vectorlane::{OllamaEmbedding, DEFAULT_OLLAMA_URL};

const EMBED_MODEL: &str = "nomic-embed-text";
const EMBED_DIM: usize = 768;

fn main() -> Result<()> {
    println!("🦙 Ollama RAG Example with VectorLane\n");

    let connections = Connections::new();
    let conn = match connections.connect("default", "localhost", 19530) {
        Ok(conn) => conn,
        Err(e) => {
            println!("❌ {}", e);
            println!("\n⚠️  Make sure a server is running: cargo run -p vectorlane-server");
            return Ok(());
        }
    };
    let embedder = OllamaEmbedding::new(DEFAULT_OLLAMA_URL, EMBED_MODEL, EMBED_DIM)?;

    let documents = [
        ("lang", "Rust is a systems programming language focused on safety and performance."),
        ("ml", "Python is popular for machine learning and data science applications."),
        ("web", "JavaScript runs in web browsers and powers interactive websites."),
        ("db", "Vector databases store embeddings for semantic similarity search."),
    ];

    let schema = build_schema(vec![
        FieldSchema::int64("id").primary(),
        FieldSchema::float_vector("vector", EMBED_DIM),
        FieldSchema::varchar("text", 255),
        FieldSchema::varchar("topic", 32),
    ])?;
    let collection = conn.recreate_collection("rag_demo", schema)?;

    println!("📚 Embedding and inserting {} documents...", documents.len());
    let records: Vec<Record> = documents
        .iter()
        .enumerate()
        .map(|(i, (topic, text))| {
            Record::new()
                .with_field("id", i as i64)
                .with_text("vector", *text)
                .with_field("text", *text)
                .with_field("topic", *topic)
        })
        .collect();

    if let Err(e) = collection.insert(&records, Some(&embedder)) {
        println!("❌ Error: {}", e);
        println!("\n⚠️  Make sure Ollama is running: ollama serve");
        println!("⚠️  And the model is pulled: ollama pull {}", EMBED_MODEL);
        return Ok(());
    }

    collection.create_index("vector", &IndexSpec::hnsw(MetricType::Cosine, 16, 200)?)?;
    collection.load()?;

    println!("\n🔍 Semantic Search Demo\n");
    let queries = [
        "What is a good language for building fast software?",
        "How do I build a website?",
        "Tell me about AI databases",
    ];

    for query in queries {
        println!("Query: \"{}\"", query);
        let request = SearchRequest::from_texts(
            "vector",
            &[query.to_string()],
            &embedder,
            SearchParams::hnsw(MetricType::Cosine, 64)?,
        )?
        .limit(2)
        .output_fields(["text", "topic"]);

        let results = collection.search(&request)?;
        if let Some(hits) = results.get(0) {
            for (i, hit) in hits.iter().enumerate() {
                println!(
                    "  {}. [{}] {} (score: {:.3})",
                    i + 1,
                    hit.entity.get_str("topic").unwrap_or("?"),
                    hit.entity.get_str("text").unwrap_or("?"),
                    1.0 - hit.distance // Convert distance to similarity
                );
            }
        }
        println!();
    }

    collection.release()?;
    println!("✨ RAG demo complete!");
    Ok(())
}

//! Quick start example for VectorLane.
//!
//! Runs the full collection lifecycle against the in-process server.

use std::sync::Arc;

use vectorlane::prelude::*;

fn main() -> Result<()> {
    println!("🌟 VectorLane Quick Start Example\n");

    let connections = Connections::new();
    let conn = connections.connect_with("default", Arc::new(MemoryServer::new()))?;

    let schema = build_schema(vec![
        FieldSchema::int64("id").primary(),
        FieldSchema::float_vector("embedding", 8),
        FieldSchema::varchar("title", 128),
    ])?;
    let collection = conn.recreate_collection("articles", schema)?;

    // Sample documents with their "embeddings"
    // (Using small dimension for demonstration; real embeddings are 384-1536 dim)
    let documents = vec![
        (1, "Introduction to Rust programming", [0.9, 0.8, 0.1, 0.0, 0.1, 0.0, 0.2, 0.1]),
        (2, "Advanced Rust patterns and idioms", [0.85, 0.9, 0.15, 0.05, 0.1, 0.0, 0.25, 0.15]),
        (3, "Python for data science", [0.1, 0.2, 0.9, 0.85, 0.0, 0.1, 0.0, 0.2]),
        (4, "Machine learning fundamentals", [0.2, 0.1, 0.7, 0.8, 0.6, 0.7, 0.1, 0.3]),
        (5, "Systems programming with Rust", [0.8, 0.7, 0.2, 0.1, 0.15, 0.05, 0.3, 0.2]),
    ];

    println!("📥 Inserting {} documents...", documents.len());
    let records: Vec<Record> = documents
        .iter()
        .map(|(id, title, embedding)| {
            Record::new()
                .with_field("id", *id as i64)
                .with_vector("embedding", embedding.to_vec())
                .with_field("title", *title)
        })
        .collect();
    let ack = collection.insert(&records, None)?;
    println!("✅ Inserted {} rows\n", ack.insert_count);

    collection.create_index("embedding", &IndexSpec::flat(MetricType::Cosine))?;
    collection.load()?;

    let query = vec![0.88, 0.85, 0.12, 0.03, 0.12, 0.02, 0.22, 0.12];
    println!("🔍 Searching for documents similar to 'Rust programming'...\n");

    let request = SearchRequest::new("embedding", vec![query.clone()], SearchParams::new(MetricType::Cosine))
        .limit(3)
        .output_fields(["title"]);
    let results = collection.search(&request)?;

    println!("📊 Top 3 Results:");
    println!("{:-<60}", "");
    if let Some(hits) = results.get(0) {
        for (rank, hit) in hits.iter().enumerate() {
            println!(
                "  {}. [ID: {}] {} (distance: {:.4})",
                rank + 1,
                hit.id,
                hit.entity.get_str("title").unwrap_or("Unknown"),
                hit.distance
            );
        }
    }

    println!("\n🔍 Same query, only titles mentioning Python...\n");
    let filtered = request.filter(Filter::field("title").contains("Python").to_string());
    for hit in collection.search(&filtered)?.iter().flatten() {
        println!("  [ID: {}] {}", hit.id, hit.entity.get_str("title").unwrap_or("Unknown"));
    }

    collection.release()?;
    println!("\n✨ Done!");
    Ok(())
}

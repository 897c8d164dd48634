//! Embedding functions: turn text into fixed-dimension vectors.

use crate::error::Result;

/// An external model that maps text to vectors.
///
/// Implementations must be deterministic for a given input and model, and
/// must return exactly one vector of [`dimension`](Self::dimension) per input.
pub trait EmbeddingFunction: Send + Sync {
    /// Encodes documents destined for insertion.
    fn encode_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Encodes search queries. Defaults to [`encode_documents`](Self::encode_documents).
    fn encode_queries(&self, queries: &[String]) -> Result<Vec<Vec<f32>>> {
        self.encode_documents(queries)
    }

    /// Dimension of the produced vectors.
    fn dimension(&self) -> usize;

    /// Model identifier, for logging.
    fn model_name(&self) -> &str;
}

#[cfg(feature = "http")]
mod ollama {
    use serde::{Deserialize, Serialize};

    use super::EmbeddingFunction;
    use crate::error::{Error, Result};

    /// Default endpoint of a local Ollama daemon.
    pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

    #[derive(Serialize)]
    struct EmbedRequest<'a> {
        model: &'a str,
        prompt: &'a str,
    }

    #[derive(Deserialize)]
    struct EmbedResponse {
        embedding: Vec<f64>,
    }

    /// Embeddings from an Ollama server (blocking).
    ///
    /// ```no_run
    /// use vectorlane_core::{EmbeddingFunction, OllamaEmbedding};
    ///
    /// let embedder = OllamaEmbedding::new("http://localhost:11434", "nomic-embed-text", 768).unwrap();
    /// let vectors = embedder.encode_documents(&["hello".to_string()]).unwrap();
    /// assert_eq!(vectors[0].len(), 768);
    /// ```
    pub struct OllamaEmbedding {
        client: reqwest::blocking::Client,
        base_url: String,
        model: String,
        dimension: usize,
    }

    impl OllamaEmbedding {
        pub fn new(
            base_url: impl Into<String>,
            model: impl Into<String>,
            dimension: usize,
        ) -> Result<Self> {
            let client = reqwest::blocking::Client::builder()
                .build()
                .map_err(|e| Error::Encoding(format!("http client setup failed: {}", e)))?;
            Ok(Self {
                client,
                base_url: base_url.into().trim_end_matches('/').to_string(),
                model: model.into(),
                dimension,
            })
        }

        fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
            let response = self
                .client
                .post(format!("{}/api/embeddings", self.base_url))
                .json(&EmbedRequest {
                    model: &self.model,
                    prompt: text,
                })
                .send()
                .map_err(|e| Error::Encoding(format!("ollama unreachable: {}", e)))?;

            if !response.status().is_success() {
                return Err(Error::Encoding(format!(
                    "ollama returned {} for model '{}'",
                    response.status(),
                    self.model
                )));
            }

            let body: EmbedResponse = response
                .json()
                .map_err(|e| Error::Encoding(format!("invalid ollama response: {}", e)))?;
            Ok(body.embedding.into_iter().map(|x| x as f32).collect())
        }
    }

    impl EmbeddingFunction for OllamaEmbedding {
        fn encode_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            tracing::debug!(model = %self.model, count = texts.len(), "encoding documents");
            texts.iter().map(|t| self.embed_one(t)).collect()
        }

        fn dimension(&self) -> usize {
            self.dimension
        }

        fn model_name(&self) -> &str {
            &self.model
        }
    }
}

#[cfg(feature = "http")]
pub use ollama::{OllamaEmbedding, DEFAULT_OLLAMA_URL};

//! Layered configuration for the `vectorlane` binary.
//!
//! Sources, lowest precedence first:
//! - built-in defaults
//! - `vectorlane.toml` in the working directory (or the file given with `--config`)
//! - environment variables with the `VECTORLANE_` prefix
//!
//! Command line flags are applied on top by the binary.
//!
//! ```toml
//! [connection]
//! host = "milvus.internal"
//! port = 19530
//! timeout_secs = 30
//!
//! [logging]
//! level = "debug"
//! file = "vectorlane.log"
//! ```
//!
//! Environment variable overrides use `__` between section and key:
//! ```bash
//! VECTORLANE_CONNECTION__PORT=19531
//! VECTORLANE_EMBEDDING__MODEL=mxbai-embed-large
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use vectorlane_core::{DEFAULT_ALIAS, DEFAULT_OLLAMA_URL};

pub const DEFAULT_CONFIG_FILE: &str = "vectorlane.toml";
pub const ENV_PREFIX: &str = "VECTORLANE_";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

/// Where the server lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub alias: String,
    pub host: String,
    pub port: u16,
    /// Per-request timeout. Unset means wait indefinitely.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl ConnectionConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            alias: DEFAULT_ALIAS.to_string(),
            host: "localhost".to_string(),
            port: 19530,
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `vectorlane_core=debug`.
    pub level: String,
    /// Log to this file instead of stdout.
    #[serde(default)]
    pub file: Option<PathBuf>,
    /// Emit JSON lines instead of human-readable text.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            json: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    #[default]
    Ollama,
}

/// Text embedding model used by the documents workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,
    pub url: String,
    pub model: String,
    pub dimension: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::Ollama,
            url: DEFAULT_OLLAMA_URL.to_string(),
            model: "nomic-embed-text".to_string(),
            dimension: 768,
        }
    }
}

impl Config {
    /// Builds the provider stack without extracting it.
    pub fn figment(path: Option<&Path>) -> Figment {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Loads configuration from defaults, the TOML file and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, figment::Error> {
        Self::figment(path).extract()
    }
}

//! VectorLane CLI binary.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use vectorlane::config::{Config, EmbeddingProvider};
use vectorlane::workflow::{Documents, RandomVectors};
use vectorlane::{logging, Connection, Connections, MemoryServer, OllamaEmbedding};

/// Drive a vector database collection through create, insert, index, load and search
#[derive(Parser, Debug)]
#[command(name = "vectorlane")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
struct Args {
    /// Configuration file (defaults to ./vectorlane.toml if present)
    #[arg(short, long, env = "VECTORLANE_CONFIG")]
    config: Option<PathBuf>,

    /// Server host
    #[arg(long)]
    host: Option<String>,

    /// Server port
    #[arg(long)]
    port: Option<u16>,

    /// Connection alias
    #[arg(long)]
    alias: Option<String>,

    /// Use an in-process server instead of connecting
    #[arg(long)]
    memory: bool,

    /// Log filter, e.g. `debug` or `vectorlane_core=trace`
    #[arg(long)]
    log_level: Option<String>,

    /// Append logs to this file instead of stdout
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Insert random vectors, index them and search with the first one
    Random {
        #[arg(long, default_value = "image_collection")]
        collection: String,

        #[arg(long, default_value_t = 10)]
        count: usize,

        #[arg(long, default_value_t = 128)]
        dim: usize,

        #[arg(long, default_value_t = 3)]
        limit: usize,
    },

    /// Embed sample documents, search with the first one and release
    Documents {
        #[arg(long, default_value = "demo_collection")]
        collection: String,

        /// Embedding server URL (overrides config)
        #[arg(long)]
        embedding_url: Option<String>,

        /// Embedding model (overrides config)
        #[arg(long)]
        model: Option<String>,
    },

    /// List collections on the server
    Collections,
}

impl Args {
    /// Applies command line overrides on top of the loaded config.
    fn apply(&self, config: &mut Config) {
        if let Some(host) = &self.host {
            config.connection.host = host.clone();
        }
        if let Some(port) = self.port {
            config.connection.port = port;
        }
        if let Some(alias) = &self.alias {
            config.connection.alias = alias.clone();
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if let Some(file) = &self.log_file {
            config.logging.file = Some(file.clone());
        }
        if self.log_json {
            config.logging.json = true;
        }
        if let Command::Documents {
            embedding_url,
            model,
            ..
        } = &self.command
        {
            if let Some(url) = embedding_url {
                config.embedding.url = url.clone();
            }
            if let Some(model) = model {
                config.embedding.model = model.clone();
            }
        }
    }
}

fn connect(args: &Args, config: &Config, connections: &Connections) -> anyhow::Result<Connection> {
    let c = &config.connection;
    if args.memory {
        return Ok(connections.connect_with(&c.alias, Arc::new(MemoryServer::new()))?);
    }
    connections
        .connect_with_timeout(&c.alias, &c.host, c.port, c.timeout())
        .with_context(|| format!("failed to connect to {}:{}", c.host, c.port))
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref()).context("failed to load configuration")?;
    args.apply(&mut config);

    let _log = logging::init(&config.logging)?;

    let connections = Connections::new();
    let conn = connect(&args, &config, &connections)?;

    match &args.command {
        Command::Random {
            collection,
            count,
            dim,
            limit,
        } => {
            let workflow = RandomVectors {
                collection: collection.clone(),
                count: *count,
                dim: *dim,
                limit: *limit,
                ..RandomVectors::default()
            };
            let report = workflow.run(&conn)?;
            info!(
                collection = %report.collection,
                inserted = report.insert.insert_count,
                "random vectors workflow finished"
            );
        }
        Command::Documents { collection, .. } => {
            let embedding = &config.embedding;
            let embedder = match embedding.provider {
                EmbeddingProvider::Ollama => {
                    OllamaEmbedding::new(&embedding.url, &embedding.model, embedding.dimension)?
                }
            };
            let workflow = Documents {
                collection: collection.clone(),
                dim: embedding.dimension,
                ..Documents::default()
            };
            let report = workflow.run(&conn, &embedder)?;
            info!(
                collection = %report.collection,
                inserted = report.insert.insert_count,
                "documents workflow finished"
            );
        }
        Command::Collections => {
            for name in conn.list_collections()? {
                println!("{}", name);
            }
        }
    }

    connections.disconnect(conn.alias());
    Ok(())
}

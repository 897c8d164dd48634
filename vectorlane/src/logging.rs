//! Tracing subscriber setup for the binary.

use std::fs::OpenOptions;

use anyhow::Context;
use tracing::subscriber::DefaultGuard;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Keeps the subscriber installed and flushes buffered lines on drop.
pub struct LogGuard {
    _default: DefaultGuard,
    _worker: WorkerGuard,
}

/// Installs a subscriber for the current thread.
///
/// `RUST_LOG` takes precedence over `config.level`. Output goes to
/// `config.file` (appended) when set, otherwise to stdout.
pub fn init(config: &LoggingConfig) -> anyhow::Result<LogGuard> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)
            .with_context(|| format!("invalid log level '{}'", config.level))?,
    };

    let (writer, worker) = match &config.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("unable to open log file {}", path.display()))?;
            tracing_appender::non_blocking(file)
        }
        None => tracing_appender::non_blocking(std::io::stdout()),
    };

    let ansi = config.file.is_none() && !config.json;
    let base = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(ansi)
        .with_target(false)
        .with_writer(writer);

    let subscriber: Box<dyn tracing::Subscriber + Send + Sync> = if config.json {
        Box::new(base.json().finish())
    } else {
        Box::new(base.compact().finish())
    };

    Ok(LogGuard {
        _default: tracing::subscriber::set_default(subscriber),
        _worker: worker,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_writes_to_file() {
        let path = std::env::temp_dir().join(format!("vectorlane-log-{}.log", std::process::id()));
        let config = LoggingConfig {
            level: "info".into(),
            file: Some(path.clone()),
            json: true,
        };

        {
            let _guard = init(&config).unwrap();
            tracing::info!(collection = "demo_collection", "loaded collection");
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert!(contents.contains("loaded collection"));
        assert!(contents.contains("demo_collection"));
    }

    #[test]
    fn test_invalid_level_is_rejected() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let config = LoggingConfig {
            level: "vectorlane=loud".into(),
            file: None,
            json: false,
        };
        assert!(init(&config).is_err());
    }
}

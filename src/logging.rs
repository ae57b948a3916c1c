//! Tracing subscriber setup

use crate::config::{LogFormat, LoggingConfig};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber. `RUST_LOG` wins over `LOG_LEVEL`.
pub fn init_tracing(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(&config.level)));

    let registry = tracing_subscriber::registry().with(filter);
    let result = match config.format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false)
                    .with_target(true),
            )
            .try_init(),
        LogFormat::Plain => registry.with(fmt::layer().with_target(true)).try_init(),
    };

    if let Err(e) = result {
        eprintln!("tracing already initialized: {}", e);
    }
}

fn default_directive(level: &str) -> String {
    let level = level.trim().to_lowercase();
    format!("{level},tower_http=info,sqlx=warn,hyper=warn,reqwest=warn")
}

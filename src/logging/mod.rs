//! Logging initialization with environment-based formatters
//!
//! - Production: Structured JSON logs for log aggregation
//! - Sandbox: Colorful, human-readable logs for local runs

use crate::config::get_environment;
use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

/// Whether the given environment name selects JSON output
pub fn is_production(environment: &str) -> bool {
    matches!(environment, "production" | "prod")
}

/// Build the subscriber for `environment`, writing to `writer`
///
/// `RUST_LOG` overrides the default `info` filter. Both formats carry the
/// target, source file and line number.
pub fn subscriber<W>(environment: &str, writer: W) -> Box<dyn Subscriber + Send + Sync>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if is_production(environment) {
        Box::new(
            tracing_subscriber::registry().with(env_filter).with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_writer(writer),
            ),
        )
    } else {
        Box::new(
            tracing_subscriber::registry().with(env_filter).with(
                fmt::layer()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_ansi(true)
                    .with_writer(writer),
            ),
        )
    }
}

/// Initialize logging based on the `ENVIRONMENT` variable
pub fn init_logging() {
    let subscriber = subscriber(&get_environment(), std::io::stdout);
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Logging already initialized: {}", e);
    }
}

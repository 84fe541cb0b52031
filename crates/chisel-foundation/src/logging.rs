//! Centralized logging initialization with environment variable support

use crate::config::{AppConfig, LogFormat};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing subscriber
///
/// Environment variables (in priority order):
/// - `RUST_LOG`: standard Rust log filter, takes precedence over config
/// - `LOG_FORMAT`: override format (json, pretty)
///
/// Logs always go to stderr so stdout stays clean for protocol traffic.
pub fn initialize(config: &AppConfig) {
    let log_level = config.logging.level.parse().unwrap_or(tracing::Level::INFO);

    let env_filter = EnvFilter::from_default_env().add_directive(log_level.into());

    let format = std::env::var("LOG_FORMAT")
        .ok()
        .and_then(|f| match f.to_lowercase().as_str() {
            "json" => Some(LogFormat::Json),
            "pretty" | "human" => Some(LogFormat::Pretty),
            _ => None,
        })
        .unwrap_or_else(|| config.logging.format.clone());

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }
}

/// Create a request span with standard fields for context propagation
///
/// Used at the transport layer so all nested logs within a request handler
/// automatically carry the request id and transport name.
pub fn request_span(request_id: &str, transport: &str) -> tracing::Span {
    tracing::info_span!(
        "request",
        request_id = %request_id,
        transport = %transport
    )
}

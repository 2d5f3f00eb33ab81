//! Logging setup.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info,web_server=debug,posty_infra=debug";

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// One JSON object per line instead of the human-readable format.
    pub json_logs: bool,
    /// Reported in the startup event so aggregated logs can be told apart.
    pub service_name: String,
}

impl TelemetryConfig {
    /// `LOG_FORMAT=json` selects JSON output; `SERVICE_NAME` defaults to
    /// `posty`.
    pub fn from_env() -> Self {
        Self {
            json_logs: std::env::var("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
            service_name: std::env::var("SERVICE_NAME").unwrap_or_else(|_| "posty".to_string()),
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber. Call once, before anything logs.
pub fn init_telemetry(config: &TelemetryConfig) {
    let registry = tracing_subscriber::registry().with(env_filter());

    if config.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }

    tracing::info!(
        service = %config.service_name,
        json_logs = config.json_logs,
        "Logging initialized"
    );
}

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use crate::config::ObservabilityConfig;

/// Initialize structured logging.
///
/// `RUST_LOG` takes precedence over the configured level. JSON output carries
/// the current span so log lines of one attempt can be correlated.
pub fn init_telemetry(config: &ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;

    let registry = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()?;
    }

    tracing::debug!("Device provisioning telemetry initialized");
    Ok(())
}

/// Generate a correlation ID for one provisioning attempt
pub fn generate_attempt_id() -> String {
    Uuid::new_v4().to_string()
}

/// Create a span with the common provisioning attributes
pub fn create_provisioning_span(
    operation: &str,
    device_id: &str,
    attempt_id: Option<&str>,
) -> tracing::Span {
    tracing::info_span!(
        "device_provisioning",
        operation = operation,
        device.id = device_id,
        attempt.id = attempt_id,
        otel.kind = "client"
    )
}

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

/// Initialize structured JSON logging on stderr.
///
/// `RUST_LOG` wins when set; otherwise `default_level` (from `--log-level`)
/// applies. Stdout stays reserved for operator-facing status lines.
pub fn init_telemetry(default_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_level))?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .try_init()?;

    tracing::debug!("telemetry initialized");
    Ok(())
}

/// Generate a correlation ID for linking the log lines of one invocation
pub fn generate_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn create_invocation_span(
    operation: &str,
    project_type: &str,
    correlation_id: &str,
) -> tracing::Span {
    tracing::info_span!(
        "invocation",
        operation = operation,
        project_type = project_type,
        correlation.id = correlation_id,
    )
}

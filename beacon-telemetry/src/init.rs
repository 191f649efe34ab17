//! Telemetry initialization and configuration

use std::sync::Once;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Initialize console logging for a Beacon service.
///
/// Respects `RUST_LOG`; defaults to `info`. Safe to call more than once,
/// later calls are no-ops.
pub fn init_telemetry(service_name: &str) -> Result<(), Box<dyn std::error::Error>> {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new("info"))
            .expect("Failed to create env filter");

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true).with_line_number(true))
            .init();

        tracing::info!(service.name = service_name, "Telemetry initialized");
    });

    Ok(())
}

//! Process telemetry setup.
//!
//! This configures `tracing` output for the process itself. It is distinct
//! from the domain [`ActivityLog`](crate::models::ActivityLog), which is the
//! durable audit trail written through the entity store.

use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static TELEMETRY_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging once per process.
///
/// Log level comes from `RUST_LOG` (default `info`). Setting
/// `WORKSHOP_LOG_JSON=1` switches the output to JSON lines for collectors.
pub fn init_telemetry() {
    TELEMETRY_INITIALIZED.get_or_init(|| {
        let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let json = std::env::var("WORKSHOP_LOG_JSON").map(|v| v == "1").unwrap_or(false);

        let subscriber = tracing_subscriber::registry();
        let result = if json {
            subscriber
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_ansi(false)
                        .with_filter(filter()),
                )
                .try_init()
        } else {
            subscriber
                .with(fmt::layer().with_target(true).with_filter(filter()))
                .try_init()
        };

        // A subscriber may already be installed by an embedding host; that is
        // not an error.
        if result.is_err() {
            tracing::debug!("global tracing subscriber already initialized");
        }
    });
}

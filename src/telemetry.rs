// src/telemetry.rs
// Logging setup. RUST_LOG overrides the default filter, e.g.
// RUST_LOG=site_watchdog=debug to see skipped pages.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_telemetry() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,site_watchdog=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

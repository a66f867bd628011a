//! Offline-first synchronization core for field inspections: a durable local
//! queue of finished inspections, reference-data prefetch for offline work,
//! and a background job that replays the queue once the device is back online.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod shared;
pub mod state;

pub use shared::{AppConfig, AppError, Result};
pub use state::AppState;

/// Installs the global `tracing` subscriber. `RUST_LOG` overrides the default
/// filter; calling it more than once is harmless.
pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "field_sync=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

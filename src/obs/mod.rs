//! Observability and logging.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "house_price_api=debug,tower_http=debug";

/// Installs the global tracing subscriber: an `EnvFilter` read from
/// `RUST_LOG` (falling back to `default_filter`) and a fmt layer on stdout.
///
/// Safe to call more than once; later calls leave the first subscriber in place.
pub fn init_tracing(default_filter: &str) {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

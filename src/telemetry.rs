//! Tracing subscriber installation.

use std::sync::Once;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter applied when `RUST_LOG` is unset or invalid.
pub const DEFAULT_LOG_FILTER: &str = "curator=info";

static INIT: Once = Once::new();

/// Installs a formatted subscriber filtered by `RUST_LOG`.
///
/// Safe to call more than once; only the first call has an effect, and an
/// already-installed global subscriber is left in place.
pub fn init_tracing() {
    INIT.call_once(|| {
        let installed = tracing_subscriber::registry()
            .with(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
            .with(fmt::layer().with_target(true))
            .try_init();
        if installed.is_err() {
            tracing::debug!("global tracing subscriber already installed");
        }
    });
}

/// Builds the filter for the given directives, falling back to
/// [`DEFAULT_LOG_FILTER`].
#[must_use]
pub fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .filter(|value| !value.trim().is_empty())
        .and_then(|value| EnvFilter::try_new(value).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

//! Logging and tracing infrastructure for smaug.
//!
//! Structured logging via the tracing crate, initialized once at
//! program startup. The env filter honors RUST_LOG; the CLI's
//! --verbose flag lowers the default level instead.

use std::sync::Once;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

static INIT: Once = Once::new();

/// Initialize the global tracing subscriber.
///
/// `default_filter` is used when RUST_LOG is unset ("warn" for normal
/// CLI runs, "debug" under --verbose). Subsequent calls are ignored.
pub fn init_tracing(default_filter: &str) {
    let default_filter = default_filter.to_string();
    INIT.call_once(move || {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_filter));

        let fmt_layer = fmt::layer()
            .with_span_events(FmtSpan::CLOSE)
            .with_target(true)
            .with_writer(std::io::stderr);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .init();
    });
}

/// Initialize tracing with JSON output for structured logging.
pub fn init_tracing_json(default_filter: &str) {
    let default_filter = default_filter.to_string();
    INIT.call_once(move || {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_filter));

        let fmt_layer = fmt::layer()
            .json()
            .with_span_events(FmtSpan::CLOSE)
            .with_target(true)
            .with_current_span(true)
            .with_writer(std::io::stderr);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .init();
    });
}

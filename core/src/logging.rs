//! Logging setup shared by every binary.
//!
//! Mirrors the original Python service's `loguru` setup: a colored console
//! sink plus a daily-rotating file sink per service, both filterable via
//! `RUST_LOG`.
//!
//! ```rust,ignore
//! use fb_core::logging;
//!
//! fn main() {
//!     let _guard = logging::init("tq_order_submitter", &config.logging);
//!     tracing::info!("bridge starting");
//! }
//! ```

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;

/// Initializes the console + rotating-file subscriber for `service_name`.
///
/// Returns a [`WorkerGuard`] that must be kept alive for the process
/// lifetime — dropping it stops flushing the non-blocking file writer.
pub fn init(service_name: &str, config: &LoggingConfig) -> WorkerGuard {
    let file_appender = tracing_appender::rolling::daily(&config.dir, format!("{service_name}.log"));
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::filter::EnvFilter::builder()
        .with_default_directive(level_filter(&config.level).into())
        .from_env_lossy();

    let registry = tracing_subscriber::registry().with(env_filter);

    if config.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_writer(non_blocking)
                    .with_ansi(false),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer())
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(non_blocking)
                    .with_ansi(false),
            )
            .init();
    }

    guard
}

fn level_filter(level: &str) -> tracing_subscriber::filter::LevelFilter {
    level
        .parse()
        .unwrap_or(tracing_subscriber::filter::LevelFilter::INFO)
}

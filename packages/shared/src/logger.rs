//! Logging setup for the Shabe binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber with the specified default log level.
///
/// The default filter enables `default_log_level` for the server library crate
/// (`shabe_server`), this crate and the binary itself. `RUST_LOG` overrides it
/// entirely, e.g. `RUST_LOG=shabe_server=trace,tower_http=debug`.
///
/// # Examples
///
/// ```no_run
/// use shabe_shared::logger::setup_logger;
///
/// setup_logger("shabe-server", "info");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(binary_name, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build the filter directive used when `RUST_LOG` is not set.
fn default_filter(binary_name: &str, default_log_level: &str) -> String {
    format!(
        "shabe_server={level},{shared}={level},{binary}={level},tower_http={level}",
        level = default_log_level,
        shared = env!("CARGO_PKG_NAME").replace('-', "_"),
        binary = binary_name.replace('-', "_"),
    )
}

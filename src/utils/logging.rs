// src/utils/logging.rs
use tracing_subscriber::{fmt, EnvFilter};

/// Sets up the logging framework using tracing_subscriber.
/// Reads log level filters from the `RUST_LOG` environment variable.
/// Defaults to "info" if `RUST_LOG` is not set, or to debug output for this
/// crate and the HTTP layers when `verbose` is requested.
pub fn setup_logging(verbose: bool) {
    let default_filter = if verbose {
        "labscan=debug,tower_http=debug,info"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .init();

    tracing::debug!("Logging setup complete.");
}

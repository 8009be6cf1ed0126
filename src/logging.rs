use time::macros::format_description;
use time::UtcOffset;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{self, fmt, prelude::*, EnvFilter};

/// Initialize a stderr logger for the rewriting engine
///
/// # Arguments
/// * `no_color` - Disable ANSI colors in stderr output
/// * `log_level` - Override log level (otherwise uses RUST_LOG or defaults to "info")
///
/// # Logging Behavior
/// - `trace`: one event per dispatched node (kind only, never the subtree)
/// - `debug`: pipeline steps and substitutions made by the stock transforms
/// - `warn`: rejected trees and members a retargeter could not map
///
/// Fails with `TryInitError` if a global subscriber is already installed; callers that
/// may initialize more than once (tests) ignore the result.
pub fn init_logger(no_color: bool, log_level: Option<&str>) -> Result<(), TryInitError> {
    let timer = fmt::time::OffsetTime::new(
        UtcOffset::UTC,
        format_description!("[[[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z]"),
    );

    let filter = match log_level {
        Some(level) => EnvFilter::new(level),
        // Fall back to RUST_LOG, then "info"
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_timer(timer)
        .with_ansi(!no_color)
        .with_filter(filter);

    tracing_subscriber::registry().with(stderr_layer).try_init()
}

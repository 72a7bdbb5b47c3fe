//! Logging configuration using tracing.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use super::error::{Error, Result};

/// Environment variable holding the log filter directive.
pub const LOG_ENV: &str = "CAT_PAIRS_LOG";

/// Filter used when `CAT_PAIRS_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "cat_pairs=info,warn";

/// Initialize the logging subsystem.
///
/// Logs go to stderr so they never interleave with the board on stdout.
/// The level is controlled by the `CAT_PAIRS_LOG` environment variable.
///
/// # Examples
/// ```bash
/// CAT_PAIRS_LOG=debug cat-pairs
/// CAT_PAIRS_LOG=cat_pairs::session=trace cat-pairs
/// ```
pub fn init() -> Result<()> {
    let env_filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_file(false)
                .with_line_number(false),
        )
        .try_init()
        .map_err(|e| Error::logging(e.to_string()))?;

    tracing::debug!("Logging initialized");
    Ok(())
}

//! Logging infrastructure for the tether CLI.
//!
//! Structured diagnostics go through `tracing`. Operator-facing status lines
//! (server URLs, port prompts) go through [`crate::ui`] instead, so `--quiet`
//! silences the former without hiding the latter.
//!
//! # Example
//!
//! ```rust,no_run
//! use tether_cli::logger::init_logger;
//! use tracing::{debug, info};
//!
//! init_logger(false, false, false);
//!
//! info!("Starting dev server");
//! debug!(platform = "android", "rewriting descriptors");
//! ```

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const VERBOSE_FILTER: &str = "tether=debug,tether_cli=debug,tether_native=debug";
const QUIET_FILTER: &str = "tether=error,tether_cli=error,tether_native=error";
const DEFAULT_FILTER: &str = "tether=info,tether_cli=info,tether_native=info";

/// Initialize the tracing subscriber with the specified options.
///
/// The logging level is determined in this order:
/// 1. `--verbose` flag: DEBUG for tether crates
/// 2. `--quiet` flag: ERROR only
/// 3. `RUST_LOG` environment variable
/// 4. Default: INFO for tether crates
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    let filter = if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else if quiet {
        EnvFilter::new(QUIET_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    };

    init_logger_with_filter(filter, no_color);
}

/// Initialize logger with custom environment filter.
pub fn init_logger_with_filter(filter: EnvFilter, no_color: bool) {
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color && should_use_colors())
        .with_writer(std::io::stderr)
        .compact();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

/// Check if colored log output should be enabled.
///
/// `NO_COLOR` wins over `FORCE_COLOR`; otherwise the stderr terminal decides.
pub fn should_use_colors() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }

    if std::env::var_os("FORCE_COLOR").is_some() {
        return true;
    }

    console::Term::stderr().features().colors_supported()
}

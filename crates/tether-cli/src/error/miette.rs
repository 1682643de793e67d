//! Miette diagnostic conversion for CLI errors.

use crate::error::{CliError, ServerError};
use ::miette::{miette, Report};

/// Convert CliError to miette Report
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Config(e) => miette!("Configuration error: {}", e),
        CliError::Server(e) => server_error_to_miette(e),
        CliError::Native(e) => miette!(
            help = "Re-run `cordova platform add <platform>` if the native project is damaged",
            "{}",
            e
        ),
        _ => miette!("{}", err),
    }
}

/// Convert ServerError to miette Report
pub fn server_error_to_miette(err: ServerError) -> Report {
    match err {
        ServerError::BindFailed { addr, source } => miette!(
            help = "Another process took the port after it was probed; run the command again",
            "Failed to bind {}: {}",
            addr,
            source
        ),
        other => miette!("{}", other),
    }
}

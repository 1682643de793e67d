//! Error handling for the tether CLI.
//!
//! The hierarchy mirrors the phases of a run:
//! - **Top-level errors** (`CliError`) are what commands return
//! - **Domain errors** (`ConfigError`, `BuildError`, `ServerError`) carry the
//!   detail and an actionable hint
//! - Descriptor failures arrive as [`tether_native::NativeError`] and convert
//!   automatically
//!
//! # Example
//!
//! ```rust,no_run
//! use tether_cli::error::{Result, ResultExt};
//! use std::path::Path;
//!
//! fn read_entry(path: &Path) -> Result<String> {
//!     std::fs::read_to_string(path)
//!         .with_path(path)
//! }
//! ```

mod miette;

pub use self::miette::cli_error_to_miette;

use std::path::PathBuf;
use thiserror::Error;

use tether_native::NativeError;

/// Top-level CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration-related errors (file not found, invalid syntax, etc.)
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Compilation errors (missing entry points, unreadable sources, etc.)
    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    /// Development server errors (bind, TLS, lifecycle)
    #[error("Server error: {0}")]
    Server(#[from] ServerError),

    /// Native descriptor errors
    #[error("Native project error: {0}")]
    Native(#[from] NativeError),

    /// File or directory not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// I/O errors from file system operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File watching errors
    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),

    /// A background task panicked or was cancelled
    #[error("Task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// Generic errors with custom messages
    #[error("{0}")]
    Custom(String),
}

/// Configuration-specific errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Explicit config file doesn't exist
    #[error("Config file not found: {}\n\nHint: Create a tether.config.toml file or check the --config path", .0.display())]
    NotFound(PathBuf),

    /// Config file extension is not one we can read
    #[error("Unsupported config format: {}\n\nHint: Use a .toml or .json file", .0.display())]
    UnsupportedFormat(PathBuf),

    /// Missing required configuration field
    #[error("Missing required field: {field}\n\nHint: {hint}")]
    MissingField {
        /// Name of the missing field
        field: String,
        /// Helpful hint for providing the field
        hint: String,
    },

    /// Invalid value for a configuration option
    #[error("Invalid value for '{field}': {value}\n\nHint: {hint}")]
    InvalidValue {
        /// Name of the field with invalid value
        field: String,
        /// The invalid value
        value: String,
        /// Helpful hint for correct values
        hint: String,
    },
}

/// Compilation errors.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Entry point file doesn't exist
    #[error("Entry point not found: {}\n\nHint: Check the 'entry' field in your tether config", .0.display())]
    EntryNotFound(PathBuf),

    /// Entry exists but could not be read
    #[error("Failed to read {}: {source}", .path.display())]
    ReadFailed {
        /// The unreadable entry
        path: PathBuf,
        /// Underlying I/O failure
        source: std::io::Error,
    },

    /// A plugin could not produce its prologue
    #[error("Plugin '{name}' failed: {source}")]
    PluginFailed {
        /// Plugin name
        name: String,
        /// Underlying failure
        source: std::io::Error,
    },

    /// Failed to write an output chunk
    #[error("Failed to write asset: {0}\n\nHint: Check output directory permissions")]
    AssetWriteFailed(String),
}

/// Port negotiation and dev-server lifecycle errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Every candidate port was taken
    #[error("Could not find an open port at {host}\n\nHint: Ports {first}-{last} are all in use. Try --port with a different value")]
    NoOpenPort {
        /// Host that was probed
        host: String,
        /// First port tried
        first: u16,
        /// Last port tried
        last: u16,
    },

    /// Host did not resolve to a bindable address
    #[error("Could not resolve host '{0}'\n\nHint: Use an IP address or 'localhost'")]
    UnresolvableHost(String),

    /// Listener failed to bind after negotiation
    #[error("Failed to bind {addr}: {source}")]
    BindFailed {
        /// Address we tried to bind
        addr: String,
        /// Underlying failure
        source: std::io::Error,
    },

    /// Another lifecycle in this process has not stopped
    #[error("A development server is already active\n\nHint: Stop the running server before creating another")]
    AlreadyActive,

    /// `start()` called outside the Created state
    #[error("Cannot start a development server in state {0}")]
    InvalidState(String),

    /// TLS material could not be loaded or generated
    #[error("TLS setup failed: {0}")]
    Tls(String),

    /// The HTTP server exited with an error
    #[error("{0}")]
    Serve(String),
}

/// Result type alias using `CliError` as the default error type.
pub type Result<T, E = CliError> = std::result::Result<T, E>;

/// Extension trait for adding context to `Result` types.
pub trait ResultExt<T> {
    /// Turn a not-found I/O error into [`CliError::FileNotFound`] for `path`.
    fn with_path(self, path: impl AsRef<std::path::Path>) -> Result<T>;

    /// Append a hint to the error message.
    fn with_hint(self, hint: impl std::fmt::Display) -> Result<T>;

    /// Prefix the error message.
    fn context(self, msg: impl std::fmt::Display) -> Result<T>;
}

impl<T, E: Into<CliError>> ResultExt<T> for std::result::Result<T, E> {
    fn with_path(self, path: impl AsRef<std::path::Path>) -> Result<T> {
        self.map_err(|e| match e.into() {
            CliError::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound => {
                CliError::FileNotFound(path.as_ref().to_path_buf())
            }
            other => other,
        })
    }

    fn with_hint(self, hint: impl std::fmt::Display) -> Result<T> {
        self.map_err(|e| {
            let err: CliError = e.into();
            CliError::Custom(format!("{}\n\nHint: {}", err, hint))
        })
    }

    fn context(self, msg: impl std::fmt::Display) -> Result<T> {
        self.map_err(|e| {
            let err: CliError = e.into();
            CliError::Custom(format!("{}: {}", msg, err))
        })
    }
}

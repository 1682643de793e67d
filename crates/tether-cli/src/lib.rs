//! tether - live reload for hybrid mobile apps.
//!
//! Serves a web bundle from a local development server and rewires the
//! browser, Android and iOS platform builds of a project to load it, so an
//! edit shows up on a device without a native rebuild.
//!
//! # Architecture
//!
//! - [`config`] - Layered configuration behind the [`config::ConfigProvider`] seam
//! - [`dev`] - Port negotiation, URL resolution, script injection, the HTTP
//!   server and its lifecycle, and platform rewiring
//! - [`commands`] - The `serve` and `build` entry points
//! - [`error`] - Structured errors with actionable hints
//! - [`logger`] / [`ui`] - Diagnostics and operator-facing output
//!
//! # Example
//!
//! ```rust,no_run
//! use tether_cli::cli::{PlatformArg, ProjectArgs, ServeArgs};
//! use tether_cli::commands::serve;
//! use tether_cli::config::FileConfigProvider;
//! use tether_cli::dev::SignalAdapter;
//!
//! # async fn example() -> tether_cli::Result<()> {
//! let args = ServeArgs {
//!     project: ProjectArgs {
//!         platforms: vec![PlatformArg::Android],
//!         project_root: ".".into(),
//!         config: None,
//!         livereload: true,
//!     },
//!     host: None,
//!     port: Some(8080),
//!     https: false,
//!     port_fallback: None,
//! };
//! let provider = FileConfigProvider::new(".");
//! serve::run(&args, &provider, SignalAdapter::install()).await
//! # }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod dev;
pub mod error;
pub mod logger;
pub mod ui;

pub use error::{BuildError, CliError, ConfigError, Result, ResultExt, ServerError};

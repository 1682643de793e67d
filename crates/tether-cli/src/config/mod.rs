//! Configuration loading for tether.
//!
//! Sources, lowest to highest precedence:
//! 1. Built-in defaults
//! 2. `tether.config.toml` / `tether.config.json` (found by searching upward
//!    from the project root, or given with `--config`)
//! 3. `TETHER_*` environment variables
//! 4. Command-line dev-server flags
//!
//! Hooks and plugins cannot be expressed in a file; embedders pass them in
//! through [`StaticConfigProvider`].

pub mod defaults;
mod loading;
mod plugin;
mod provider;
mod types;

#[cfg(test)]
mod tests;

pub use loading::FileConfigProvider;
pub use plugin::{BundlePlugin, MiddlewareHook};
pub use provider::{ConfigProvider, StaticConfigProvider};
pub use types::{BundlerConfig, DevServerConfig, DevServerOverrides, TlsConfig};

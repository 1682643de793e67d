//! Command implementations for the tether CLI.
//!
//! - [`serve`] - Live-reload dev server wired into every target platform
//! - [`build`] - One-off compile into the output directory
//!
//! Each command has an `execute` entry point taking parsed arguments and a
//! `run` function taking an injected [`ConfigProvider`](crate::config::ConfigProvider).

pub mod build;
pub mod serve;

pub use build::execute as build_execute;
pub use serve::execute as serve_execute;

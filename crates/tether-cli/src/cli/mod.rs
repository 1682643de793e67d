//! Command-line interface definition for tether.
//!
//! # Command Structure
//!
//! - `tether serve` - Start the live-reload dev server and point every target
//!   platform at it
//! - `tether build` - Compile the bundle once into the output directory

mod commands;
pub mod enums;

use clap::Parser;

pub use commands::{BuildArgs, Command, ProjectArgs, ServeArgs};
pub use enums::*;

/// tether - live reload for hybrid mobile apps
#[derive(Parser, Debug)]
#[command(
    name = "tether",
    version,
    about = "Live-reload dev server for hybrid mobile apps",
    long_about = "tether serves your web bundle from a local development server and rewires\n\
                  the browser, Android and iOS platform builds to load it, so edits show up\n\
                  on devices without a native rebuild."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

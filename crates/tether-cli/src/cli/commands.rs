use clap::{Args, Subcommand};
use std::path::PathBuf;

use tether_native::TargetSet;

use crate::cli::enums::*;

/// Available tether subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the live-reload dev server
    ///
    /// Negotiates a port, starts the server, then points every requested
    /// platform at it. Runs until interrupted. Does nothing unless
    /// --livereload is given.
    Serve(ServeArgs),

    /// Compile the bundle once
    ///
    /// Writes the compiled chunks into the configured output directory.
    /// Skipped when --livereload is given, since serve owns that run.
    Build(BuildArgs),
}

/// Options shared by every command that runs as a platform build hook
#[derive(Args, Debug, Clone)]
pub struct ProjectArgs {
    /// Platforms to target
    ///
    /// Comma-separated list. With no platforms the command is a no-op.
    ///
    /// Examples:
    ///   tether serve -l --platforms android
    ///   tether serve -l --platforms browser,ios
    #[arg(long, value_enum, value_delimiter = ',', value_name = "PLATFORMS")]
    pub platforms: Vec<PlatformArg>,

    /// Project root containing www/ and platforms/
    #[arg(long, default_value = ".", value_name = "DIR")]
    pub project_root: PathBuf,

    /// Path to the tether config file
    ///
    /// Relative paths resolve against the project root. Defaults to the
    /// nearest tether.config.toml or tether.config.json above the root.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Live reload was requested for this run
    #[arg(short = 'l', long)]
    pub livereload: bool,
}

impl ProjectArgs {
    /// The requested platforms, deduplicated and in fixed order.
    pub fn targets(&self) -> TargetSet {
        self.platforms.iter().copied().map(Into::into).collect()
    }
}

/// Arguments for the serve command
#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Host to bind
    ///
    /// `localhost` binds every interface so devices on the LAN can connect.
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Preferred port; the next free one is offered if it is busy
    #[arg(short, long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Serve over HTTPS
    ///
    /// Uses devServer.tls from the config, or a self-signed certificate.
    #[arg(long)]
    pub https: bool,

    /// What to do when the preferred port is busy
    ///
    /// Defaults to prompt on an interactive terminal, accept otherwise.
    #[arg(long, value_enum, value_name = "POLICY")]
    pub port_fallback: Option<FallbackArg>,
}

/// Arguments for the build command
#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Fail on the first unreadable entry instead of warning
    #[arg(long)]
    pub bail: bool,
}

use clap::ValueEnum;
use tether_native::Platform;

use crate::dev::FallbackPolicy;

/// Target platform to wire up to the dev server
#[derive(Copy, Clone, PartialEq, Eq, Debug, ValueEnum)]
pub enum PlatformArg {
    /// In-browser preview served from platforms/browser/www
    #[value(name = "browser")]
    Browser,

    /// Android device or emulator
    ///
    /// Emulators reach the host machine through 10.0.2.2 when no LAN
    /// address is available.
    #[value(name = "android")]
    Android,

    /// iOS device or simulator
    #[value(name = "ios")]
    Ios,
}

impl From<PlatformArg> for Platform {
    fn from(arg: PlatformArg) -> Self {
        match arg {
            PlatformArg::Browser => Platform::Browser,
            PlatformArg::Android => Platform::Android,
            PlatformArg::Ios => Platform::Ios,
        }
    }
}

/// What to do when the preferred port is taken
#[derive(Copy, Clone, PartialEq, Eq, Debug, ValueEnum)]
pub enum FallbackArg {
    /// Ask on the terminal before moving to another port
    #[value(name = "prompt")]
    Prompt,

    /// Move to the next free port and print a warning
    #[value(name = "accept")]
    Accept,

    /// Give up without starting the server
    #[value(name = "decline")]
    Decline,
}

impl From<FallbackArg> for FallbackPolicy {
    fn from(arg: FallbackArg) -> Self {
        match arg {
            FallbackArg::Prompt => FallbackPolicy::Prompt,
            FallbackArg::Accept => FallbackPolicy::Accept,
            FallbackArg::Decline => FallbackPolicy::Decline,
        }
    }
}

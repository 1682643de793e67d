//! Target platforms and their on-disk layout.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::NativeError;

/// File name of the native project descriptor inside a platform build.
pub const DESCRIPTOR_FILE_NAME: &str = "config.xml";

/// A runtime that can load the dev-server bundle.
///
/// Ordering is significant: target sets iterate browser, android, ios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Browser,
    Android,
    Ios,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Browser, Platform::Android, Platform::Ios];

    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Browser => "browser",
            Platform::Android => "android",
            Platform::Ios => "ios",
        }
    }

    /// Host used in the descriptor when no LAN address could be discovered.
    ///
    /// The Android emulator reaches the build machine through `10.0.2.2`;
    /// the iOS simulator shares the host's loopback.
    pub fn fallback_host(self) -> Option<&'static str> {
        match self {
            Platform::Browser => None,
            Platform::Android => Some("10.0.2.2"),
            Platform::Ios => Some("localhost"),
        }
    }

    /// `platforms/<name>` under the project root.
    pub fn build_dir(self, project_root: &Path) -> PathBuf {
        project_root.join("platforms").join(self.as_str())
    }

    /// Native build output served by the dev server under [`Platform::mount_path`].
    pub fn platform_www(self, project_root: &Path) -> PathBuf {
        self.build_dir(project_root).join("platform_www")
    }

    /// Web-asset output directory of the platform build.
    pub fn www_dir(self, project_root: &Path) -> PathBuf {
        self.build_dir(project_root).join("www")
    }

    pub fn mount_path(self) -> String {
        format!("/{}", self.as_str())
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = NativeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "browser" => Ok(Platform::Browser),
            "android" => Ok(Platform::Android),
            "ios" => Ok(Platform::Ios),
            other => Err(NativeError::UnknownPlatform(other.to_string())),
        }
    }
}

/// The platforms requested for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetSet(BTreeSet<Platform>);

impl TargetSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, platform: Platform) -> bool {
        self.0.insert(platform)
    }

    pub fn contains(&self, platform: Platform) -> bool {
        self.0.contains(&platform)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Platform> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Platform> for TargetSet {
    fn from_iter<I: IntoIterator<Item = Platform>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for TargetSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(Platform::as_str).collect();
        f.write_str(&names.join(", "))
    }
}

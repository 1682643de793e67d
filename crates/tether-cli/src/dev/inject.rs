//! Scripts every served bundle needs inside a platform webview.

use std::borrow::Cow;
use std::fmt;
use std::io;
use std::sync::Arc;

use rust_embed::RustEmbed;

use crate::config::{BundlePlugin, BundlerConfig};

#[derive(RustEmbed)]
#[folder = "assets/inject/"]
struct InjectAssets;

/// What an injected script is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptPurpose {
    /// Relaxes the page's Content-Security-Policy for the dev origin
    CspRelaxation,
    /// Loads the platform's `cordova.js` from its `/<platform>` mount
    Bridge,
}

impl ScriptPurpose {
    fn asset(self) -> &'static str {
        match self {
            ScriptPurpose::CspRelaxation => "csp.js",
            ScriptPurpose::Bridge => "bridge.js",
        }
    }
}

/// A compiler plugin whose prologue is one embedded script.
///
/// The script is looked up on every build, so in debug builds edits to the
/// file on disk show up on the next rebuild.
pub struct InjectedScript {
    purpose: ScriptPurpose,
}

impl InjectedScript {
    pub fn new(purpose: ScriptPurpose) -> Self {
        Self { purpose }
    }

    pub fn content(&self) -> io::Result<String> {
        let name = self.purpose.asset();
        let file = InjectAssets::get(name).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("missing script {name}"))
        })?;
        Ok(match file.data {
            Cow::Borrowed(bytes) => String::from_utf8_lossy(bytes).into_owned(),
            Cow::Owned(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        })
    }
}

impl fmt::Debug for InjectedScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectedScript")
            .field("purpose", &self.purpose)
            .finish()
    }
}

impl BundlePlugin for InjectedScript {
    fn name(&self) -> &str {
        match self.purpose {
            ScriptPurpose::CspRelaxation => "tether:inject-csp",
            ScriptPurpose::Bridge => "tether:inject-bridge",
        }
    }

    fn prologue(&self) -> io::Result<Option<String>> {
        self.content().map(Some)
    }
}

/// Appends the CSP and bridge scripts to a compiler config.
#[derive(Debug, Clone)]
pub struct AssetInjector {
    csp: Arc<InjectedScript>,
    bridge: Arc<InjectedScript>,
}

impl Default for AssetInjector {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetInjector {
    pub fn new() -> Self {
        Self {
            csp: Arc::new(InjectedScript::new(ScriptPurpose::CspRelaxation)),
            bridge: Arc::new(InjectedScript::new(ScriptPurpose::Bridge)),
        }
    }

    /// Returns `config` with the two scripts appended after the existing
    /// plugins. Existing entries are kept as-is and in order.
    ///
    /// Calling this twice appends twice.
    pub fn inject(&self, mut config: BundlerConfig) -> BundlerConfig {
        config.plugins.reserve(2);
        config.plugins.push(self.csp.clone());
        config.plugins.push(self.bridge.clone());
        tracing::debug!(plugins = config.plugins.len(), "injected webview scripts");
        config
    }
}

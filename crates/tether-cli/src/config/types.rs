use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::defaults::*;
use crate::config::plugin::{BundlePlugin, MiddlewareHook};
use crate::dev::Protocol;
use crate::error::{ConfigError, Result};

/// Compiler configuration as loaded from `tether.config.{toml,json}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundlerConfig {
    /// Entry sources, relative to the project root
    #[serde(default = "default_entry")]
    pub entry: Vec<PathBuf>,

    /// Where `tether build` writes chunks
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dev_server: Option<DevServerConfig>,

    /// Ordered plugin list; extended by the asset injector
    #[serde(skip)]
    pub plugins: Vec<Arc<dyn BundlePlugin>>,
}

impl Default for BundlerConfig {
    fn default() -> Self {
        Self {
            entry: default_entry(),
            out_dir: default_out_dir(),
            dev_server: None,
            plugins: Vec::new(),
        }
    }
}

impl BundlerConfig {
    /// Dev-server options, or all defaults when the section is absent.
    pub fn dev_server(&self) -> DevServerConfig {
        self.dev_server.clone().unwrap_or_default()
    }

    /// Reject a configuration no run could use.
    pub fn validate(&self) -> Result<()> {
        if self.entry.is_empty() {
            return Err(ConfigError::MissingField {
                field: "entry".to_string(),
                hint: "List at least one source, e.g. entry = [\"src/index.js\"]".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

/// The `dev_server` section. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DevServerConfig {
    pub https: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub static_dir: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_api_fallback: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub hot: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls: Option<TlsConfig>,

    #[serde(skip)]
    pub on_before_setup_middleware: Option<MiddlewareHook>,
}

impl DevServerConfig {
    pub fn protocol(&self) -> Protocol {
        if self.https {
            Protocol::Https
        } else {
            Protocol::Http
        }
    }

    /// Host to bind. `localhost` widens to every interface so devices can
    /// reach the server.
    pub fn host(&self) -> &str {
        match self.host.as_deref().map(str::trim) {
            None | Some("") | Some("localhost") => DEFAULT_HOST,
            Some(host) => host,
        }
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn static_dir(&self, project_root: &Path) -> PathBuf {
        let dir = self.static_dir.clone().unwrap_or_else(default_static_dir);
        project_root.join(dir)
    }

    pub fn history_api_fallback(&self) -> bool {
        self.history_api_fallback.unwrap_or(true)
    }

    pub fn hot(&self) -> bool {
        self.hot.unwrap_or(true)
    }
}

/// PEM certificate and key for `https`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsConfig {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// Dev-server values given on the command line; highest precedence.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DevServerOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub https: Option<bool>,
}

impl DevServerOverrides {
    pub fn is_empty(&self) -> bool {
        self.host.is_none() && self.port.is_none() && self.https.is_none()
    }
}

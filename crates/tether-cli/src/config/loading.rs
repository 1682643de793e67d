use crate::config::defaults::CONFIG_FILE_NAMES;
use crate::config::provider::ConfigProvider;
use crate::config::{BundlerConfig, DevServerOverrides};
use crate::error::{ConfigError, Result};
use figment::{
    providers::{Env, Format as _, Json, Serialized, Toml},
    Figment,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Loads `tether.config.{toml,json}` layered over defaults.
///
/// Priority: CLI overrides > `TETHER_*` environment > config file > defaults.
/// Nested keys in the environment use a double underscore, e.g.
/// `TETHER_DEV_SERVER__PORT=9000`.
#[derive(Debug, Clone)]
pub struct FileConfigProvider {
    project_root: PathBuf,
    explicit: Option<PathBuf>,
    overrides: DevServerOverrides,
}

#[derive(Serialize)]
struct OverrideLayer {
    dev_server: DevServerOverrides,
}

impl FileConfigProvider {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            explicit: None,
            overrides: DevServerOverrides::default(),
        }
    }

    /// Use this file instead of searching. Relative paths resolve against the
    /// project root.
    pub fn with_config_path(mut self, path: Option<PathBuf>) -> Self {
        self.explicit = path;
        self
    }

    pub fn with_overrides(mut self, overrides: DevServerOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// The config file this provider would read, if any.
    pub fn config_path(&self) -> Result<Option<PathBuf>> {
        match &self.explicit {
            Some(path) => {
                let path = if path.is_absolute() {
                    path.clone()
                } else {
                    self.project_root.join(path)
                };
                if !path.is_file() {
                    return Err(ConfigError::NotFound(path).into());
                }
                Ok(Some(path))
            }
            None => Ok(find_up(&self.project_root)),
        }
    }

    fn figment(&self) -> Result<Figment> {
        let mut figment = Figment::new().merge(Serialized::defaults(BundlerConfig::default()));

        if let Some(path) = self.config_path()? {
            tracing::debug!(path = %path.display(), "loading config file");
            figment = match path.extension().and_then(|ext| ext.to_str()) {
                Some("toml") => figment.merge(Toml::file(&path)),
                Some("json") => figment.merge(Json::file(&path)),
                _ => return Err(ConfigError::UnsupportedFormat(path).into()),
            };
        }

        figment = figment.merge(Env::prefixed("TETHER_").split("__"));

        if !self.overrides.is_empty() {
            figment = figment.merge(Serialized::defaults(OverrideLayer {
                dev_server: self.overrides.clone(),
            }));
        }

        Ok(figment)
    }
}

impl ConfigProvider for FileConfigProvider {
    fn load(&self) -> Result<BundlerConfig> {
        let config: BundlerConfig = self.figment()?.extract().map_err(|e| ConfigError::InvalidValue {
            field: "configuration".to_string(),
            value: e.to_string(),
            hint: "Check tether.config syntax and field types".to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }
}

/// Search `start` and its ancestors for the first known config file name.
fn find_up(start: &Path) -> Option<PathBuf> {
    let start = start.canonicalize().unwrap_or_else(|_| start.to_path_buf());
    start.ancestors().find_map(|dir| {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_file())
    })
}

//! Where a run's [`BundlerConfig`] comes from.

use crate::config::BundlerConfig;
use crate::error::Result;

/// Capability to produce the compiler configuration for one run.
pub trait ConfigProvider: Send + Sync {
    fn load(&self) -> Result<BundlerConfig>;
}

/// Hands out a fixed configuration. Used by tests and embedders that build
/// the config in code, hooks and plugins included.
#[derive(Debug, Clone, Default)]
pub struct StaticConfigProvider {
    config: BundlerConfig,
}

impl StaticConfigProvider {
    pub fn new(config: BundlerConfig) -> Self {
        Self { config }
    }
}

impl ConfigProvider for StaticConfigProvider {
    fn load(&self) -> Result<BundlerConfig> {
        Ok(self.config.clone())
    }
}

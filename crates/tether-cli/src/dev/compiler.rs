//! A deliberately small compiler: each entry becomes one chunk made of the
//! plugin prologues, the live-reload client (in hot mode) and the entry
//! source, in that order.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::config::{BundlePlugin, BundlerConfig};
use crate::dev::{BundleCache, RELOAD_CLIENT};
use crate::error::{BuildError, Result};

const JS_CONTENT_TYPE: &str = "application/javascript";

/// Result of one build.
#[derive(Debug)]
pub struct BuildOutput {
    pub duration_ms: u64,
    pub cache: BundleCache,
    /// Entries skipped in lenient mode
    pub skipped: Vec<BuildError>,
}

/// Turns the configured entries into in-memory chunks.
#[derive(Debug, Clone)]
pub struct Compiler {
    entries: Vec<PathBuf>,
    plugins: Vec<Arc<dyn BundlePlugin>>,
    hot: bool,
}

impl Compiler {
    /// Resolve entries against `project_root`.
    ///
    /// # Errors
    ///
    /// [`BuildError::EntryNotFound`] for the first entry that does not exist.
    pub fn new(config: &BundlerConfig, project_root: &Path) -> Result<Self> {
        let entries = config
            .entry
            .iter()
            .map(|entry| {
                let path = project_root.join(entry);
                if path.exists() {
                    Ok(path)
                } else {
                    Err(BuildError::EntryNotFound(path))
                }
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self {
            entries,
            plugins: config.plugins.clone(),
            hot: false,
        })
    }

    /// Like [`Compiler::new`], but entries that do not exist are left out and
    /// returned alongside the compiler.
    pub fn new_lenient(config: &BundlerConfig, project_root: &Path) -> (Self, Vec<BuildError>) {
        let (entries, missing): (Vec<_>, Vec<_>) = config
            .entry
            .iter()
            .map(|entry| project_root.join(entry))
            .partition(|path| path.exists());

        let compiler = Self {
            entries,
            plugins: config.plugins.clone(),
            hot: false,
        };
        (compiler, missing.into_iter().map(BuildError::EntryNotFound).collect())
    }

    /// Include the live-reload client in every chunk.
    pub fn with_hot(mut self, hot: bool) -> Self {
        self.hot = hot;
        self
    }

    /// Build every entry; the first failure aborts the build.
    pub async fn build(&self) -> Result<BuildOutput> {
        self.build_with(true).await
    }

    /// Build every entry. With `bail` unset, unreadable entries are recorded
    /// in [`BuildOutput::skipped`] and the rest are still built.
    pub async fn build_with(&self, bail: bool) -> Result<BuildOutput> {
        let started = Instant::now();
        let prologue = self.prologue()?;

        let mut cache = BundleCache::new();
        let mut skipped = Vec::new();
        for entry in &self.entries {
            let source = match tokio::fs::read_to_string(entry).await {
                Ok(source) => source,
                Err(source) => {
                    let err = BuildError::ReadFailed {
                        path: entry.clone(),
                        source,
                    };
                    if bail {
                        return Err(err.into());
                    }
                    skipped.push(err);
                    continue;
                }
            };

            let name = chunk_name(entry);
            if cache.contains(&name) {
                tracing::warn!(chunk = %name, entry = %entry.display(), "chunk name collision; later entry wins");
            }
            let mut chunk = prologue.clone();
            chunk.push_str(&source);
            cache.insert(name, chunk.into_bytes(), JS_CONTENT_TYPE.to_string());
        }

        let duration_ms = started.elapsed().as_millis() as u64;
        tracing::debug!(chunks = cache.len(), duration_ms, "build finished");
        Ok(BuildOutput {
            duration_ms,
            cache,
            skipped,
        })
    }

    /// Write a build's chunks under `out_dir`.
    pub async fn emit(&self, output: &BuildOutput, out_dir: &Path) -> Result<Vec<PathBuf>> {
        tokio::fs::create_dir_all(out_dir)
            .await
            .map_err(|e| BuildError::AssetWriteFailed(format!("{}: {}", out_dir.display(), e)))?;

        let mut written = Vec::with_capacity(output.cache.len());
        for (name, content) in output.cache.iter() {
            let path = out_dir.join(name.trim_start_matches('/'));
            tokio::fs::write(&path, content)
                .await
                .map_err(|e| BuildError::AssetWriteFailed(format!("{}: {}", path.display(), e)))?;
            written.push(path);
        }
        written.sort();
        Ok(written)
    }

    fn prologue(&self) -> Result<String> {
        let mut prologue = String::new();
        for plugin in &self.plugins {
            let part = plugin.prologue().map_err(|source| BuildError::PluginFailed {
                name: plugin.name().to_string(),
                source,
            })?;
            if let Some(part) = part {
                prologue.push_str(&part);
                prologue.push('\n');
            }
        }
        if self.hot {
            prologue.push_str(RELOAD_CLIENT);
            prologue.push('\n');
        }
        Ok(prologue)
    }
}

/// `/<stem>.js` for an entry path.
fn chunk_name(entry: &Path) -> String {
    let stem = entry
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("bundle");
    format!("/{stem}.js")
}

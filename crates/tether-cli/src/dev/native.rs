//! Points each platform build at the dev server.

use std::path::{Path, PathBuf};

use tether_native::{
    find_descriptors, redirect_page, NativeDescriptor, Platform, TargetSet, DESCRIPTOR_FILE_NAME,
    REDIRECT_FILE_NAME,
};
use tokio::task::JoinSet;

use crate::dev::ResolvedUrls;
use crate::error::{Result, ResultExt};

/// What was done for one platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformReport {
    pub platform: Platform,
    /// Files now pointing at the server
    pub files: Vec<PathBuf>,
}

/// Rewrites platform launch configuration under a project root.
#[derive(Debug, Clone)]
pub struct PlatformConfigWriter {
    project_root: PathBuf,
}

impl PlatformConfigWriter {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
        }
    }

    /// Apply `urls` to every platform in `targets`, concurrently.
    ///
    /// Each platform touches only files under its own build directory. All
    /// platforms run to completion; the first error is returned afterwards.
    pub async fn apply(&self, targets: &TargetSet, urls: &ResolvedUrls) -> Result<Vec<PlatformReport>> {
        let mut tasks = JoinSet::new();
        for platform in targets.iter() {
            let root = self.project_root.clone();
            let urls = urls.clone();
            tasks.spawn(async move { apply_platform(platform, &root, &urls).await });
        }

        let mut reports = Vec::with_capacity(targets.len());
        let mut failure = None;
        while let Some(joined) = tasks.join_next().await {
            match joined? {
                Ok(report) => reports.push(report),
                Err(err) => {
                    failure.get_or_insert(err);
                }
            }
        }

        if let Some(err) = failure {
            return Err(err);
        }
        reports.sort_by_key(|report| report.platform);
        Ok(reports)
    }
}

async fn apply_platform(platform: Platform, root: &Path, urls: &ResolvedUrls) -> Result<PlatformReport> {
    let files = match platform {
        Platform::Browser => vec![write_redirect(root, urls).await?],
        Platform::Android | Platform::Ios => rewrite_descriptors(platform, root, urls).await?,
    };

    tracing::debug!(%platform, files = files.len(), "platform pointed at dev server");
    Ok(PlatformReport { platform, files })
}

async fn write_redirect(root: &Path, urls: &ResolvedUrls) -> Result<PathBuf> {
    let dir = Platform::Browser.www_dir(root);
    tokio::fs::create_dir_all(&dir).await.with_path(&dir)?;

    let path = dir.join(REDIRECT_FILE_NAME);
    tokio::fs::write(&path, redirect_page(&urls.local_url_for_browser))
        .await
        .with_path(&path)?;
    Ok(path)
}

async fn rewrite_descriptors(platform: Platform, root: &Path, urls: &ResolvedUrls) -> Result<Vec<PathBuf>> {
    let Some(src) = urls.config_url(platform) else {
        return Ok(Vec::new());
    };

    let build_dir = platform.build_dir(root);
    let scanned = build_dir.display().to_string();
    let paths = tokio::task::spawn_blocking(move || find_descriptors(&build_dir))
        .await?
        .context(format!("Could not scan {scanned} for {DESCRIPTOR_FILE_NAME}"))?;

    for path in &paths {
        let source = tokio::fs::read_to_string(path).await.with_path(path)?;
        let mut descriptor = NativeDescriptor::parse(path, source.as_str())?;

        descriptor.upsert("content", &[("src", src.as_str())])?;
        if platform == Platform::Ios {
            descriptor.upsert("allow-navigation", &[("href", "*")])?;
        }

        if descriptor.as_str() != source {
            tokio::fs::write(path, descriptor.as_str())
                .await
                .with_path(path)?;
        }
    }

    Ok(paths)
}

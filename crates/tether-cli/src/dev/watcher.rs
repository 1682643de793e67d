//! File system watcher with debouncing for live reload.
//!
//! Watches the project root and filters out dependency, platform-build and
//! output directories so the server's own writes never trigger a rebuild.

use crate::error::{CliError, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Debounce window used by the dev server.
pub const DEFAULT_DEBOUNCE_MS: u64 = 100;

/// File change event type.
#[derive(Debug, Clone)]
pub enum FileChange {
    Modified(PathBuf),
    Created(PathBuf),
    Removed(PathBuf),
}

impl FileChange {
    pub fn path(&self) -> &Path {
        match self {
            FileChange::Modified(p) | FileChange::Created(p) | FileChange::Removed(p) => p,
        }
    }
}

/// Ignore list for a project: the fixed directories plus the output dir.
///
/// The output dir is watched after all when it is also the static directory,
/// so edits to served pages still reload clients.
pub fn default_ignore_patterns(project_root: &Path, out_dir: &Path, static_dir: &Path) -> Vec<String> {
    let mut patterns: Vec<String> = ["node_modules", "platforms", ".git", "*.log"]
        .into_iter()
        .map(String::from)
        .collect();
    if project_root.join(out_dir) == static_dir {
        return patterns;
    }
    let out_dir = out_dir.to_string_lossy().trim_matches('/').to_string();
    if !out_dir.is_empty() && !patterns.contains(&out_dir) {
        patterns.push(out_dir);
    }
    patterns
}

/// Recursive watcher. Dropping it stops the notifications.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    root: PathBuf,
}

impl FileWatcher {
    /// Start watching `root`. Changes arrive on the returned receiver.
    ///
    /// # Errors
    ///
    /// Returns error if the root doesn't exist or the watcher cannot start.
    pub fn new(
        root: PathBuf,
        ignore_patterns: Vec<String>,
        debounce_ms: u64,
    ) -> Result<(Self, mpsc::Receiver<FileChange>)> {
        if !root.exists() {
            return Err(CliError::FileNotFound(root));
        }
        // Events report absolute paths; compare against the same form.
        let root = root.canonicalize()?;

        let (tx, rx) = mpsc::channel(100);
        let mut filter = ChangeFilter::new(root.clone(), ignore_patterns, debounce_ms);

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let Ok(event) = res else { return };

            for path in &event.paths {
                if let Some(change) = filter.accept(&event.kind, path, Instant::now()) {
                    // Receiver gone means the dev server is shutting down.
                    let _ = tx.blocking_send(change);
                }
            }
        })?;

        watcher.watch(&root, RecursiveMode::Recursive)?;
        tracing::debug!(root = %root.display(), "file watcher started");

        Ok((
            Self {
                _watcher: watcher,
                root,
            },
            rx,
        ))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Turns raw notify events into debounced [`FileChange`]s.
///
/// Only create, modify and remove events count. Access events never take the
/// debounce slot, so an open right before a write does not swallow the write.
struct ChangeFilter {
    root: PathBuf,
    ignore_patterns: Vec<String>,
    debounce: Duration,
    last_event: Option<(PathBuf, Instant)>,
}

impl ChangeFilter {
    fn new(root: PathBuf, ignore_patterns: Vec<String>, debounce_ms: u64) -> Self {
        Self {
            root,
            ignore_patterns,
            debounce: Duration::from_millis(debounce_ms),
            last_event: None,
        }
    }

    fn accept(&mut self, kind: &EventKind, path: &Path, now: Instant) -> Option<FileChange> {
        if should_ignore(path, &self.root, &self.ignore_patterns) {
            return None;
        }

        let change = match kind {
            EventKind::Create(_) => FileChange::Created(path.to_path_buf()),
            EventKind::Modify(_) => FileChange::Modified(path.to_path_buf()),
            EventKind::Remove(_) => FileChange::Removed(path.to_path_buf()),
            _ => return None,
        };

        if let Some((last_path, last_time)) = &self.last_event {
            if last_path == path && now.duration_since(*last_time) < self.debounce {
                return None;
            }
        }
        self.last_event = Some((path.to_path_buf(), now));
        Some(change)
    }
}

fn should_ignore(path: &Path, root: &Path, ignore_patterns: &[String]) -> bool {
    let Ok(rel_path) = path.strip_prefix(root) else {
        return true;
    };

    let path_str = rel_path.to_string_lossy();

    for pattern in ignore_patterns {
        if let Some(ext) = pattern.strip_prefix('*') {
            if path_str.ends_with(ext) {
                return true;
            }
        } else if rel_path.starts_with(pattern.as_str()) {
            return true;
        }
    }

    rel_path.components().any(|component| {
        component
            .as_os_str()
            .to_str()
            .is_some_and(|name| name.starts_with('.') && name != "." && name != "..")
    })
}

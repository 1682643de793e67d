//! Recursive descriptor discovery under a platform build directory.

use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::error::{NativeError, Result};
use crate::platform::DESCRIPTOR_FILE_NAME;

/// Find every `config.xml` below `dir`, at any depth.
///
/// A platform that has not been added yet has no build directory; that is
/// reported as an empty list rather than an error. Hidden directories are
/// skipped. Results are sorted so edits happen in a stable order.
pub fn find_descriptors(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        tracing::debug!(dir = %dir.display(), "no platform build directory");
        return Ok(Vec::new());
    }

    let mut found = Vec::new();
    let walker = WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));

    for entry in walker {
        let entry = entry.map_err(|source| NativeError::Walk {
            path: dir.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file() && entry.file_name() == DESCRIPTOR_FILE_NAME {
            found.push(entry.into_path());
        }
    }

    found.sort();
    tracing::debug!(dir = %dir.display(), count = found.len(), "discovered descriptors");
    Ok(found)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}

//! Error types for descriptor parsing and platform discovery.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, NativeError>;

#[derive(Debug, Error)]
pub enum NativeError {
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: roxmltree::Error,
    },

    #[error("failed to walk {}: {source}", .path.display())]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },

    #[error("unknown platform '{0}' (expected browser, android or ios)")]
    UnknownPlatform(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

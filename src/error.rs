//! Error types for manifest generation and verification.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Root directory not found: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("Root is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Permission denied: {}", .path.display())]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Path is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(PathBuf),

    #[error("Manifest JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ManifestError {
    /// Classify an I/O failure on `path`, splitting out permission errors.
    pub fn from_io(path: impl AsRef<Path>, source: io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        match source.kind() {
            io::ErrorKind::PermissionDenied => ManifestError::PermissionDenied { path, source },
            _ => ManifestError::Io { path, source },
        }
    }

    pub fn from_walk(root: &Path, err: walkdir::Error) -> Self {
        let path = err
            .path()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| root.to_path_buf());

        match err.into_io_error() {
            Some(source) => ManifestError::from_io(path, source),
            // Only a symlink loop lands here, and links are never followed.
            None => ManifestError::Io {
                path,
                source: io::Error::new(io::ErrorKind::Other, "filesystem loop detected"),
            },
        }
    }

    /// True for the I/O class of failures (unreadable or vanished files).
    pub fn is_io(&self) -> bool {
        matches!(self, ManifestError::Io { .. } | ManifestError::PermissionDenied { .. })
    }
}

pub type Result<T> = std::result::Result<T, ManifestError>;

use std::path::PathBuf;

use thiserror::Error;

/// The primary error type for all operations in the `embedfs` crate.
#[derive(Debug, Error)]
pub enum VfsError {
    /// The requested path is not registered (embedded mode) or does not
    /// exist on disk (local mode).
    #[error("asset not found: '{path}'")]
    NotFound { path: String },

    /// Transport decoding or decompression of an embedded payload failed.
    /// This indicates corrupted generated registry data and should be
    /// unreachable with a correctly generated manifest.
    #[error("corrupt embedded payload for '{path}': {reason}")]
    Decode { path: String, reason: String },

    /// An I/O error from the real filesystem in local mode. Includes the
    /// on-disk path where the error happened.
    #[error("I/O error on path '{}': {}", .path.display(), .source)]
    Io {
        source: std::io::Error,
        path: PathBuf,
    },
}

impl VfsError {
    pub(crate) fn not_found(path: impl Into<String>) -> Self {
        VfsError::NotFound { path: path.into() }
    }

    pub(crate) fn decode(path: impl Into<String>, reason: impl ToString) -> Self {
        VfsError::Decode {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// True for the missing-asset case in either mode. Callers use this to
    /// map the error to a not-found response rather than an internal error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, VfsError::NotFound { .. })
    }
}

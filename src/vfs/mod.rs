//! # Filesystem Facade
//!
//! This module is the public access point to the asset registry. An
//! [`Assets`] value owns a shared [`Registry`] reference and serves every
//! request on one of two backends, selected once per call by [`Mode`]:
//!
//! - **Embedded**: look the path up in the registry, materialize the decoded
//!   buffer (lazily, exactly once per entry), and hand out an
//!   [`EmbeddedFile`] handle.
//! - **LocalOverride**: resolve the entry's on-disk relative path against a
//!   configured base directory and read it live from the real filesystem —
//!   the development loop, no rebuild needed.
//!
//! [`Filesystem`] is a mounted view of an `Assets`: a fixed backend choice
//! plus an optional path prefix that rebases every open under a subtree.

use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;

use crate::error::VfsError;
use crate::file::{EmbeddedFile, LocalFile, Metadata, VfsFile};
use crate::registry::{normalize, Registry};

/// Which backend serves asset reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Serve from the compressed data embedded in the binary.
    Embedded,
    /// Serve the same named assets live from the local disk.
    LocalOverride,
}

/// Shared access point to the asset registry and its two backends.
///
/// Cheap to clone; clones share the registry.
#[derive(Debug, Clone)]
pub struct Assets {
    registry: Arc<Registry>,
    local_root: PathBuf,
}

impl Assets {
    /// Assets backed by the manifest generated into this binary.
    pub fn builtin() -> Self {
        Self::new(Registry::builtin())
    }

    pub fn new(registry: Registry) -> Self {
        Assets {
            registry: Arc::new(registry),
            local_root: PathBuf::from("."),
        }
    }

    /// Sets the base directory local-mode reads resolve against.
    /// Defaults to the current directory.
    pub fn with_local_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.local_root = root.into();
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Opens `path` on the selected backend.
    pub fn open(&self, mode: Mode, path: &str) -> Result<Box<dyn VfsFile>, VfsError> {
        match mode {
            Mode::Embedded => self
                .open_embedded(path)
                .map(|f| Box::new(f) as Box<dyn VfsFile>),
            Mode::LocalOverride => self
                .open_local(path)
                .map(|f| Box::new(f) as Box<dyn VfsFile>),
        }
    }

    /// Metadata for `path` without opening it. In embedded mode this never
    /// touches the decode path, so it is safe for cheap existence and
    /// type checks.
    pub fn stat(&self, mode: Mode, path: &str) -> Result<Metadata, VfsError> {
        match mode {
            Mode::Embedded => {
                let entry = self.lookup(path)?;
                Ok(Metadata {
                    size: entry.size,
                    mod_time: entry.mod_time,
                    is_dir: entry.is_dir,
                })
            }
            Mode::LocalOverride => {
                let disk_path = self.local_disk_path(path)?;
                let meta =
                    std::fs::metadata(&disk_path).map_err(|e| io_error(e, path, &disk_path))?;
                Ok(Metadata::from_fs(&meta))
            }
        }
    }

    /// Reads a whole asset in one call.
    pub fn bytes(&self, mode: Mode, path: &str) -> Result<Bytes, VfsError> {
        match mode {
            Mode::Embedded => {
                let entry = self.lookup(path)?;
                self.registry.materialize(entry)
            }
            Mode::LocalOverride => {
                let disk_path = self.local_disk_path(path)?;
                std::fs::read(&disk_path)
                    .map(Bytes::from)
                    .map_err(|e| io_error(e, path, &disk_path))
            }
        }
    }

    /// Same as [`bytes`](Self::bytes), but panics on failure. Intended only
    /// for startup-time loading of assets the program cannot run without;
    /// a missing bundled template is a configuration defect, not a runtime
    /// condition to recover from.
    pub fn bytes_or_abort(&self, mode: Mode, path: &str) -> Bytes {
        self.bytes(mode, path)
            .unwrap_or_else(|e| panic!("required asset '{path}' unavailable: {e}"))
    }

    /// Reads a whole asset as UTF-8 text.
    pub fn string(&self, mode: Mode, path: &str) -> Result<String, VfsError> {
        let raw = self.bytes(mode, path)?;
        String::from_utf8(raw.to_vec())
            .map_err(|e| VfsError::decode(path, format!("not valid UTF-8: {e}")))
    }

    /// Text-decoding variant of [`bytes_or_abort`](Self::bytes_or_abort).
    pub fn string_or_abort(&self, mode: Mode, path: &str) -> String {
        self.string(mode, path)
            .unwrap_or_else(|e| panic!("required asset '{path}' unavailable: {e}"))
    }

    /// A filesystem handle rooted at the registry root.
    pub fn filesystem(&self, mode: Mode) -> Filesystem {
        Filesystem {
            assets: self.clone(),
            mode,
            prefix: None,
        }
    }

    /// A filesystem handle presenting the subtree under `prefix` as root.
    pub fn filesystem_at(&self, mode: Mode, prefix: &str) -> Filesystem {
        Filesystem {
            assets: self.clone(),
            mode,
            prefix: Some(normalize(prefix)),
        }
    }

    fn lookup(&self, path: &str) -> Result<&crate::registry::AssetEntry, VfsError> {
        self.registry
            .lookup(path)
            .ok_or_else(|| VfsError::not_found(normalize(path)))
    }

    fn open_embedded(&self, path: &str) -> Result<EmbeddedFile, VfsError> {
        let entry = self.lookup(path)?;
        let data = self.registry.materialize(entry)?;
        Ok(EmbeddedFile::new(
            entry.path.clone(),
            data,
            Metadata {
                size: entry.size,
                mod_time: entry.mod_time,
                is_dir: entry.is_dir,
            },
        ))
    }

    fn open_local(&self, path: &str) -> Result<LocalFile, VfsError> {
        let disk_path = self.local_disk_path(path)?;
        LocalFile::open(disk_path.clone()).map_err(|e| io_error(e, path, &disk_path))
    }

    /// Resolves an asset's on-disk location for local mode. The registry
    /// still decides which paths exist; only the content read is delegated
    /// to the real filesystem.
    fn local_disk_path(&self, path: &str) -> Result<PathBuf, VfsError> {
        let entry = self.lookup(path)?;
        let rel = Path::new(entry.local_path.trim_start_matches('/'));
        if rel.components().any(|c| matches!(c, Component::ParentDir)) {
            return Err(VfsError::Io {
                source: io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    "path traversal rejected",
                ),
                path: rel.to_path_buf(),
            });
        }
        Ok(self.local_root.join(rel))
    }
}

/// A mounted view: a backend choice plus an optional path prefix.
///
/// Carries no cached state and cannot become stale; every open re-resolves
/// through the facade.
#[derive(Debug, Clone)]
pub struct Filesystem {
    assets: Assets,
    mode: Mode,
    prefix: Option<String>,
}

impl Filesystem {
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Opens `path`, rebased under the mount prefix when one is set.
    pub fn open(&self, path: &str) -> Result<Box<dyn VfsFile>, VfsError> {
        self.assets.open(self.mode, &self.full_path(path))
    }

    pub fn stat(&self, path: &str) -> Result<Metadata, VfsError> {
        self.assets.stat(self.mode, &self.full_path(path))
    }

    pub fn bytes(&self, path: &str) -> Result<Bytes, VfsError> {
        self.assets.bytes(self.mode, &self.full_path(path))
    }

    fn full_path(&self, path: &str) -> String {
        match &self.prefix {
            // The facade normalizes, so the doubled separator collapses.
            Some(prefix) => format!("{prefix}/{path}"),
            None => path.to_string(),
        }
    }
}

fn io_error(source: io::Error, virtual_path: &str, disk_path: &Path) -> VfsError {
    if source.kind() == io::ErrorKind::NotFound {
        VfsError::not_found(normalize(virtual_path))
    } else {
        VfsError::Io {
            source,
            path: disk_path.to_path_buf(),
        }
    }
}

//! File handles: the generic file contract and its two implementations.
//!
//! [`EmbeddedFile`] reads from an entry's decoded buffer; any number of open
//! handles share one buffer through [`Bytes`] and each keeps its own cursor.
//! [`LocalFile`] is a thin wrapper presenting a real filesystem handle
//! through the same contract. Which one a caller gets is decided once, at
//! the facade boundary, by the backend mode.

use std::fs;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::PathBuf;
use std::time::UNIX_EPOCH;

use bytes::Bytes;

use crate::error::VfsError;

/// Metadata reported by [`VfsFile::stat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Metadata {
    /// Byte length; 0 for directories.
    pub size: u64,
    /// Modification time, seconds since the Unix epoch.
    pub mod_time: i64,
    pub is_dir: bool,
}

impl Metadata {
    pub(crate) fn from_fs(meta: &fs::Metadata) -> Self {
        let mod_time = match meta.modified() {
            Ok(t) => match t.duration_since(UNIX_EPOCH) {
                Ok(d) => d.as_secs() as i64,
                // Pre-epoch mtimes count backwards.
                Err(e) => -(e.duration().as_secs() as i64),
            },
            Err(_) => 0,
        };
        Metadata {
            size: meta.len(),
            mod_time,
            is_dir: meta.is_dir(),
        }
    }
}

/// The file contract every backend implements: sequential reads, absolute
/// seeks, a stat query, and an explicit close.
pub trait VfsFile: Send + std::fmt::Debug {
    /// Reads up to `buf.len()` bytes at the cursor, advancing it.
    /// Returns 0 once the cursor is at or past the end.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, VfsError>;

    /// Moves the cursor to `pos` bytes from the start and returns it.
    fn seek_to(&mut self, pos: u64) -> Result<u64, VfsError>;

    fn stat(&self) -> Result<Metadata, VfsError>;

    /// Releases the handle. Closing never affects the shared underlying
    /// buffer; embedded handles may keep being cloned and read elsewhere.
    fn close(&mut self) -> Result<(), VfsError>;
}

/// An open handle onto an entry's decoded buffer.
#[derive(Debug, Clone)]
pub struct EmbeddedFile {
    path: String,
    data: Bytes,
    meta: Metadata,
    pos: u64,
}

impl EmbeddedFile {
    pub(crate) fn new(path: impl Into<String>, data: Bytes, meta: Metadata) -> Self {
        EmbeddedFile {
            path: path.into(),
            data,
            meta,
            pos: 0,
        }
    }

    /// The normalized registry path this handle was opened from.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl Read for EmbeddedFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let start = self.pos.min(self.data.len() as u64) as usize;
        let n = (self.data.len() - start).min(buf.len());
        buf[..n].copy_from_slice(&self.data[start..start + n]);
        self.pos = (start + n) as u64;
        Ok(n)
    }
}

impl Seek for EmbeddedFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(p) => p as i128,
            SeekFrom::End(off) => self.data.len() as i128 + off as i128,
            SeekFrom::Current(off) => self.pos as i128 + off as i128,
        };
        if target < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek before start of file",
            ));
        }
        self.pos = target as u64;
        Ok(self.pos)
    }
}

impl VfsFile for EmbeddedFile {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, VfsError> {
        Read::read(self, buf).map_err(|e| VfsError::Io {
            source: e,
            path: PathBuf::from(&self.path),
        })
    }

    fn seek_to(&mut self, pos: u64) -> Result<u64, VfsError> {
        Seek::seek(self, SeekFrom::Start(pos)).map_err(|e| VfsError::Io {
            source: e,
            path: PathBuf::from(&self.path),
        })
    }

    fn stat(&self) -> Result<Metadata, VfsError> {
        Ok(self.meta)
    }

    fn close(&mut self) -> Result<(), VfsError> {
        Ok(())
    }
}

/// A real filesystem handle behind the [`VfsFile`] contract (local mode).
/// All real-filesystem error semantics propagate unchanged.
#[derive(Debug)]
pub struct LocalFile {
    file: fs::File,
    path: PathBuf,
}

impl LocalFile {
    pub(crate) fn open(path: PathBuf) -> io::Result<Self> {
        let file = fs::File::open(&path)?;
        Ok(LocalFile { file, path })
    }

    fn io_err(&self, source: io::Error) -> VfsError {
        VfsError::Io {
            source,
            path: self.path.clone(),
        }
    }
}

impl VfsFile for LocalFile {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, VfsError> {
        self.file.read(buf).map_err(|e| self.io_err(e))
    }

    fn seek_to(&mut self, pos: u64) -> Result<u64, VfsError> {
        self.file
            .seek(SeekFrom::Start(pos))
            .map_err(|e| self.io_err(e))
    }

    fn stat(&self) -> Result<Metadata, VfsError> {
        let meta = self.file.metadata().map_err(|e| self.io_err(e))?;
        Ok(Metadata::from_fs(&meta))
    }

    fn close(&mut self) -> Result<(), VfsError> {
        // The descriptor itself is released when the handle drops.
        Ok(())
    }
}

//! The asset registry: an immutable mapping from normalized path to entry.
//!
//! A [`Registry`] is built once at startup from generated manifest data and
//! never gains or loses entries afterwards. The only thing that changes after
//! construction is each entry's decode-once cell, which moves from empty to
//! populated on first access and stays populated. Lookups are read-only and
//! need no locking; the per-entry cell serializes concurrent first-time
//! decodes without stalling unrelated entries.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::Bytes;
use once_cell::sync::OnceCell;
use serde::Deserialize;

use crate::decode;
use crate::error::VfsError;

/// Path of the root directory entry every registry carries.
pub const ROOT_PATH: &str = "/";

/// Manifest generated into this binary by the asset pipeline.
const BUILTIN_MANIFEST: &str = include_str!("manifest.json");

/// One record of the generated manifest format: a JSON object keyed by
/// normalized asset path.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ManifestRecord {
    #[serde(default)]
    is_directory: bool,
    #[serde(default)]
    local_path: String,
    #[serde(default)]
    size: u64,
    #[serde(default)]
    mod_time: i64,
    /// Base64 text of a gzip stream; absent for directories and empty files.
    #[serde(default)]
    payload: String,
}

/// One registered asset.
#[derive(Debug)]
pub struct AssetEntry {
    /// Normalized path, unique identity within the registry.
    pub path: String,
    pub is_dir: bool,
    /// Declared byte length; 0 for directories and empty files.
    pub size: u64,
    /// Modification time, seconds since the Unix epoch.
    pub mod_time: i64,
    /// Relative path this asset is read from in local mode.
    pub local_path: String,
    /// Transport-encoded payload; empty when `size == 0`.
    pub(crate) payload: String,
    /// Decode-once cell: set by the first materialization, immutable after.
    pub(crate) decoded: OnceCell<Bytes>,
}

impl AssetEntry {
    /// A regular file entry carrying a transport-encoded payload.
    pub fn file(
        path: impl Into<String>,
        local_path: impl Into<String>,
        size: u64,
        mod_time: i64,
        payload: impl Into<String>,
    ) -> Self {
        AssetEntry {
            path: path.into(),
            is_dir: false,
            size,
            mod_time,
            local_path: local_path.into(),
            payload: payload.into(),
            decoded: OnceCell::new(),
        }
    }

    /// A directory entry. Directories carry no payload and no child listing.
    pub fn directory(path: impl Into<String>) -> Self {
        let path = path.into();
        AssetEntry {
            local_path: path.clone(),
            path,
            is_dir: true,
            size: 0,
            mod_time: 0,
            payload: String::new(),
            decoded: OnceCell::new(),
        }
    }

    /// Whether the decoded buffer has been populated yet.
    pub fn is_materialized(&self) -> bool {
        self.decoded.get().is_some()
    }
}

/// The immutable path → entry table plus a decode-run counter.
#[derive(Debug)]
pub struct Registry {
    entries: HashMap<String, AssetEntry>,
    /// Transport decodes executed so far: exactly one per materialized entry.
    decode_runs: AtomicUsize,
}

impl Registry {
    /// The registry generated into this binary.
    ///
    /// Panics if the embedded manifest does not parse; that is a defect in
    /// the generation step, not a runtime condition.
    pub fn builtin() -> Self {
        Self::from_manifest_str(BUILTIN_MANIFEST)
            .expect("embedded asset manifest is generated data and must parse")
    }

    /// Parses the external manifest format produced by the asset pipeline.
    pub fn from_manifest_str(json: &str) -> Result<Self, VfsError> {
        let records: HashMap<String, ManifestRecord> =
            serde_json::from_str(json).map_err(|e| VfsError::decode("<manifest>", e))?;
        Ok(Self::from_entries(records.into_iter().map(|(path, r)| {
            if r.is_directory {
                let mut entry = AssetEntry::directory(path);
                entry.local_path = r.local_path;
                entry
            } else {
                AssetEntry::file(path, r.local_path, r.size, r.mod_time, r.payload)
            }
        })))
    }

    /// Builds a registry from entries directly. Paths are normalized with the
    /// same rule [`lookup`](Self::lookup) applies, and a root directory entry
    /// is inserted when the input omits one.
    pub fn from_entries(entries: impl IntoIterator<Item = AssetEntry>) -> Self {
        let mut map = HashMap::new();
        for mut entry in entries {
            entry.path = normalize(&entry.path);
            map.insert(entry.path.clone(), entry);
        }
        map.entry(ROOT_PATH.to_string())
            .or_insert_with(|| AssetEntry::directory(ROOT_PATH));
        Registry {
            entries: map,
            decode_runs: AtomicUsize::new(0),
        }
    }

    /// Looks up an entry. The argument is cleaned with the same rule applied
    /// at construction time, so lookups are exact-match.
    pub fn lookup(&self, path: &str) -> Option<&AssetEntry> {
        self.entries.get(&normalize(path))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AssetEntry> {
        self.entries.values()
    }

    /// Returns the entry's ready-to-read buffer, running the transport decode
    /// at most once per entry.
    ///
    /// Zero-size entries (directories, empty files) resolve to an empty
    /// buffer without touching the decode path. Concurrent first-time callers
    /// for the same entry serialize on its cell; one of them decodes, all of
    /// them observe the identical fully-populated buffer. A decode failure
    /// leaves the cell unset, so a later call retries instead of serving a
    /// partial buffer.
    pub fn materialize(&self, entry: &AssetEntry) -> Result<Bytes, VfsError> {
        if entry.size == 0 {
            return Ok(Bytes::new());
        }
        let buf = entry.decoded.get_or_try_init(|| {
            let raw = decode::transport_decode(&entry.path, &entry.payload)?;
            if raw.len() as u64 != entry.size {
                return Err(VfsError::decode(
                    &entry.path,
                    format!(
                        "inflated to {} bytes, manifest declares {}",
                        raw.len(),
                        entry.size
                    ),
                ));
            }
            self.decode_runs.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(path = %entry.path, size = entry.size, "materialized embedded asset");
            Ok(Bytes::from(raw))
        })?;
        Ok(buf.clone())
    }

    /// Number of transport decodes executed since construction.
    pub fn decode_runs(&self) -> usize {
        self.decode_runs.load(Ordering::Relaxed)
    }
}

/// Cleans a path the way registry keys are stored: always absolute, `.` and
/// empty segments dropped, `..` resolved, no trailing slash except on the
/// root itself.
pub fn normalize(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    if segments.is_empty() {
        ROOT_PATH.to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}

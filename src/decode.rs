//! Transport decoding for embedded payloads.
//!
//! The generated manifest stores each asset as text-safe data: the raw bytes
//! are gzip-compressed, then base64-encoded with the standard alphabet. The
//! generator may wrap the text across lines, so ASCII whitespace inside the
//! payload is ignored. Decoding runs lazily, at most once per entry; the
//! per-entry guard lives in [`crate::registry::Registry::materialize`], this
//! module only knows how to turn payload text into bytes.

use std::io::Read;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use flate2::read::GzDecoder;

use crate::error::VfsError;

/// Decodes a transport payload into the asset's raw bytes.
///
/// `path` is only used to label the error; a failure at either step means
/// the generated manifest data is corrupt.
pub(crate) fn transport_decode(path: &str, payload: &str) -> Result<Vec<u8>, VfsError> {
    let compact: String = payload
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let compressed = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| VfsError::decode(path, format!("base64: {e}")))?;

    let mut raw = Vec::new();
    GzDecoder::new(compressed.as_slice())
        .read_to_end(&mut raw)
        .map_err(|e| VfsError::decode(path, format!("gzip: {e}")))?;
    Ok(raw)
}

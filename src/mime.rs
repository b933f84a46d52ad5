//! MIME type detection for served assets.
//!
//! Extension lookup first; for unknown extensions we sample the first 512
//! bytes of content and sniff magic numbers, then fall back to a printable
//! text heuristic. Any error while sampling yields the generic fallback type
//! rather than failing the request.

use crate::error::VfsError;
use crate::vfs::Filesystem;

/// Returned when neither extension nor content identifies the type.
pub const FALLBACK: &str = "application/octet-stream";

/// Bytes sampled from the head of a file for content sniffing.
const SNIFF_LEN: usize = 512;

/// Printable-ASCII ratio above which sampled content counts as text.
const TEXT_RATIO: f32 = 0.85;

/// Determines the MIME type for `path` as served by `fs`.
///
/// Directories and anything that cannot be sampled report [`FALLBACK`].
pub fn type_for(fs: &Filesystem, path: &str) -> &'static str {
    match fs.stat(path) {
        Ok(meta) if meta.is_dir => return FALLBACK,
        Ok(_) => {}
        Err(err) => {
            tracing::warn!(%path, %err, "stat failed during MIME detection, using fallback");
            return FALLBACK;
        }
    }

    if let Some(mime) = type_by_extension(path) {
        return mime;
    }

    match sample_head(fs, path) {
        Ok(head) => sniff(&head).unwrap_or(FALLBACK),
        Err(err) => {
            tracing::warn!(%path, %err, "content sampling failed during MIME detection, using fallback");
            FALLBACK
        }
    }
}

/// Extension-based lookup for the formats this server actually encounters.
pub fn type_by_extension(path: &str) -> Option<&'static str> {
    let name = path.rsplit('/').next().unwrap_or(path);
    let ext = match name.rfind('.') {
        // A leading dot marks a hidden file, not an extension.
        Some(idx) if idx > 0 => &name[idx + 1..],
        _ => return None,
    };
    Some(match ext.to_ascii_lowercase().as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" => "text/javascript; charset=utf-8",
        "json" => "application/json",
        "txt" | "text" | "log" | "conf" => "text/plain; charset=utf-8",
        "md" | "markdown" => "text/markdown; charset=utf-8",
        "xml" => "text/xml; charset=utf-8",
        "csv" => "text/csv; charset=utf-8",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "pdf" => "application/pdf",
        "wasm" => "application/wasm",
        "gz" => "application/gzip",
        "zip" => "application/zip",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        _ => return None,
    })
}

/// Identifies sampled content by magic bytes, then by the text heuristic.
pub fn sniff(head: &[u8]) -> Option<&'static str> {
    if head.is_empty() {
        return None;
    }
    match head {
        b if b.starts_with(b"\x89PNG\r\n\x1a\n") => return Some("image/png"),
        b if b.starts_with(b"\xFF\xD8\xFF") => return Some("image/jpeg"),
        b if b.starts_with(b"GIF87a") || b.starts_with(b"GIF89a") => return Some("image/gif"),
        b if b.starts_with(b"%PDF-") => return Some("application/pdf"),
        b if b.starts_with(b"\x1F\x8B") => return Some("application/gzip"),
        b if b.starts_with(b"PK\x03\x04") => return Some("application/zip"),
        _ => {}
    }

    let trimmed = head.trim_ascii_start();
    if starts_with_ignore_case(trimmed, b"<!doctype html") || starts_with_ignore_case(trimmed, b"<html") {
        return Some("text/html; charset=utf-8");
    }

    let printable = head
        .iter()
        .filter(|b| matches!(b, 0x09 | 0x0A | 0x0D | 0x20..=0x7E))
        .count();
    if (printable as f32 / head.len() as f32) >= TEXT_RATIO {
        return Some("text/plain; charset=utf-8");
    }
    None
}

fn sample_head(fs: &Filesystem, path: &str) -> Result<Vec<u8>, VfsError> {
    let mut file = fs.open(path)?;
    let mut buf = vec![0u8; SNIFF_LEN];
    let mut filled = 0;
    while filled < buf.len() {
        let n = file.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    file.close()?;
    buf.truncate(filled);
    Ok(buf)
}

fn starts_with_ignore_case(data: &[u8], prefix: &[u8]) -> bool {
    data.len() >= prefix.len()
        && data
            .iter()
            .zip(prefix)
            .all(|(a, b)| a.eq_ignore_ascii_case(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_lookup_wins_over_content() {
        assert_eq!(type_by_extension("/edit.html"), Some("text/html; charset=utf-8"));
        assert_eq!(type_by_extension("/a/b/style.CSS"), Some("text/css; charset=utf-8"));
        assert_eq!(type_by_extension("/data.json"), Some("application/json"));
        // Hidden files and unknown suffixes defer to sniffing.
        assert_eq!(type_by_extension("/.edit.html.swp"), None);
        assert_eq!(type_by_extension("/.gitignore"), None);
        assert_eq!(type_by_extension("/README"), None);
    }

    #[test]
    fn sniffs_magic_bytes() {
        assert_eq!(sniff(b"\x89PNG\r\n\x1a\n...."), Some("image/png"));
        assert_eq!(sniff(b"\x1F\x8Bwhatever"), Some("application/gzip"));
        assert_eq!(sniff(b"%PDF-1.7 ..."), Some("application/pdf"));
        assert_eq!(sniff(b"  <!DOCTYPE HTML><html>"), Some("text/html; charset=utf-8"));
    }

    #[test]
    fn sniffs_text_by_printable_ratio() {
        assert_eq!(sniff(b"plain old notes\nwith lines\n"), Some("text/plain; charset=utf-8"));
        assert_eq!(sniff(&[0u8; 64]), None);
        assert_eq!(sniff(b""), None);
    }
}

use std::io::Write;
use std::sync::{Arc, Barrier};
use std::thread;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use embedfs::registry::{AssetEntry, Registry};
use embedfs::{Assets, Mode, VfsFile};
use flate2::write::GzEncoder;
use flate2::Compression;
use tempfile::tempdir;

/// Encodes raw bytes the way the manifest generator does: gzip, then base64.
fn payload_for(data: &[u8]) -> String {
    let mut gz = GzEncoder::new(Vec::new(), Compression::default());
    gz.write_all(data).unwrap();
    STANDARD.encode(gz.finish().unwrap())
}

const GREETING: &[u8] = b"hello embedded world\n";
const PAGE: &[u8] = b"<html><body>mounted page</body></html>\n";

/// A small hand-built registry: one text file, one empty file, one nested
/// page, plus the implicit root directory.
fn test_assets() -> Assets {
    Assets::new(Registry::from_entries([
        AssetEntry::file(
            "/greeting.txt",
            "greeting.txt",
            GREETING.len() as u64,
            1442683616,
            payload_for(GREETING),
        ),
        AssetEntry::file("/empty.txt", "empty.txt", 0, 1442683616, ""),
        AssetEntry::file(
            "/sub/page.html",
            "sub/page.html",
            PAGE.len() as u64,
            1442683616,
            payload_for(PAGE),
        ),
    ]))
}

fn read_all(file: &mut Box<dyn VfsFile>) -> Vec<u8> {
    let mut out = Vec::new();
    let mut buf = [0u8; 256];
    loop {
        let n = file.read(&mut buf).unwrap();
        if n == 0 {
            return out;
        }
        out.extend_from_slice(&buf[..n]);
    }
}

#[test]
fn every_registered_file_opens_with_its_declared_size() {
    let assets = Assets::builtin();
    for entry in assets.registry().iter().filter(|e| !e.is_dir) {
        let mut file = assets.open(Mode::Embedded, &entry.path).unwrap();
        let meta = file.stat().unwrap();
        assert_eq!(meta.size, entry.size, "{}", entry.path);
        assert_eq!(read_all(&mut file).len() as u64, entry.size, "{}", entry.path);
        file.close().unwrap();
    }
}

#[test]
fn zero_size_entries_never_touch_the_decode_path() {
    let assets = test_assets();

    let mut dir = assets.open(Mode::Embedded, "/").unwrap();
    let meta = dir.stat().unwrap();
    assert!(meta.is_dir);
    assert_eq!(meta.size, 0);
    assert!(read_all(&mut dir).is_empty());

    let mut empty = assets.open(Mode::Embedded, "/empty.txt").unwrap();
    assert!(read_all(&mut empty).is_empty());

    assert_eq!(assets.registry().decode_runs(), 0);
    let entry = assets.registry().lookup("/empty.txt").unwrap();
    assert!(!entry.is_materialized());
}

#[test]
fn concurrent_first_opens_decode_exactly_once() {
    const READERS: usize = 16;
    let assets = Arc::new(Assets::builtin());
    let barrier = Arc::new(Barrier::new(READERS));

    let handles: Vec<_> = (0..READERS)
        .map(|_| {
            let assets = Arc::clone(&assets);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let mut file = assets.open(Mode::Embedded, "/edit.html").unwrap();
                read_all(&mut file)
            })
        })
        .collect();

    let buffers: Vec<Vec<u8>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(assets.registry().decode_runs(), 1);
    for buf in &buffers {
        assert_eq!(buf, &buffers[0]);
        assert_eq!(buf.len(), 983);
    }
}

#[test]
fn edit_template_round_trips_exactly() {
    let assets = Assets::builtin();
    let data = assets.bytes(Mode::Embedded, "/edit.html").unwrap();
    assert_eq!(data.len(), 983);
    let text = std::str::from_utf8(&data).unwrap();
    assert!(text.starts_with("<!DOCTYPE html"));
    assert!(text.trim_end().ends_with("</html>"));
    assert!(text.contains("<textarea"));
}

#[test]
fn repeated_opens_share_one_decoded_buffer() {
    let assets = test_assets();
    let first = assets.bytes(Mode::Embedded, "/greeting.txt").unwrap();
    let second = assets.bytes(Mode::Embedded, "/greeting.txt").unwrap();
    assert_eq!(first, second);
    assert_eq!(assets.registry().decode_runs(), 1);
}

#[test]
fn seek_and_bounded_reads_within_the_buffer() {
    let assets = Assets::builtin();
    let mut file = assets.open(Mode::Embedded, "/edit.html").unwrap();
    assert_eq!(file.seek_to(900).unwrap(), 900);
    assert_eq!(read_all(&mut file).len(), 83);
    // Seek back to the start re-reads the whole asset.
    file.seek_to(0).unwrap();
    assert_eq!(read_all(&mut file).len(), 983);
}

#[test]
fn prefix_mount_resolves_like_the_full_path() {
    let assets = test_assets();
    let mounted = assets.filesystem_at(Mode::Embedded, "/sub");
    let via_mount = mounted.bytes("/page.html").unwrap();
    let direct = assets.bytes(Mode::Embedded, "/sub/page.html").unwrap();
    assert_eq!(via_mount, direct);
    assert_eq!(via_mount.as_ref(), PAGE);

    // Unknown names below the mount are still NotFound.
    assert!(mounted.bytes("/nope.html").unwrap_err().is_not_found());
}

#[test]
fn local_mode_reads_live_from_disk() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("greeting.txt"), b"edited on disk\n").unwrap();
    let assets = test_assets().with_local_root(dir.path());

    let local = assets.bytes(Mode::LocalOverride, "/greeting.txt").unwrap();
    assert_eq!(local.as_ref(), b"edited on disk\n" as &[u8]);

    // The embedded backend is unaffected by the disk copy.
    let embedded = assets.bytes(Mode::Embedded, "/greeting.txt").unwrap();
    assert_eq!(embedded.as_ref(), GREETING);
}

#[test]
fn local_mode_missing_file_propagates_as_not_found() {
    let dir = tempdir().unwrap();
    let assets = test_assets().with_local_root(dir.path());
    // Registered, but never written to the temp root.
    let err = assets.bytes(Mode::LocalOverride, "/sub/page.html").unwrap_err();
    assert!(err.is_not_found(), "got {err:?}");
}

#[test]
fn local_mode_stat_reports_disk_metadata() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("greeting.txt"), b"12345").unwrap();
    let assets = test_assets().with_local_root(dir.path());
    let meta = assets.stat(Mode::LocalOverride, "/greeting.txt").unwrap();
    assert_eq!(meta.size, 5);
    assert!(!meta.is_dir);
}

#[test]
fn missing_path_returns_not_found_in_both_modes() {
    let assets = test_assets();
    for mode in [Mode::Embedded, Mode::LocalOverride] {
        let err = assets.open(mode, "/no/such/asset").unwrap_err();
        assert!(err.is_not_found(), "{mode:?}: got {err:?}");
    }
    // Lookup normalization applies before the miss is reported.
    let err = assets.bytes(Mode::Embedded, "/sub/../missing.txt").unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn string_accessors_decode_utf8() {
    let assets = test_assets();
    let text = assets.string(Mode::Embedded, "/greeting.txt").unwrap();
    assert_eq!(text, "hello embedded world\n");
    assert_eq!(assets.string_or_abort(Mode::Embedded, "/greeting.txt"), text);
}

#[test]
#[should_panic(expected = "required asset '/missing.html' unavailable")]
fn or_abort_panics_on_missing_startup_asset() {
    let assets = test_assets();
    assets.string_or_abort(Mode::Embedded, "/missing.html");
}

#[test]
fn mime_detection_over_the_embedded_filesystem() {
    let assets = Assets::builtin();
    let fs = assets.filesystem(Mode::Embedded);
    assert_eq!(embedfs::mime::type_for(&fs, "/edit.html"), "text/html; charset=utf-8");
    // Unknown extension and binary content: sniffing falls back.
    assert_eq!(embedfs::mime::type_for(&fs, "/.edit.html.swp"), embedfs::mime::FALLBACK);
    // Directories never get sniffed.
    assert_eq!(embedfs::mime::type_for(&fs, "/"), embedfs::mime::FALLBACK);
    // Missing paths fall back instead of erroring.
    assert_eq!(embedfs::mime::type_for(&fs, "/nope.bin"), embedfs::mime::FALLBACK);
}

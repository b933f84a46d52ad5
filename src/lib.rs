//! # embedfs Core Library
//!
//! This crate provides an embedded, compressed, read-only virtual filesystem:
//! built-in template assets ship inside the program binary as gzip-compressed,
//! base64-encoded payloads, are decoded lazily and exactly once on first
//! access, and can be transparently swapped for live local-disk reads during
//! development.
//!
//! It is designed to be used by the `embedfs` command-line application, but
//! its public API is the intended surface for any program that bundles its
//! own UI templates.
//!
//! ## Key Modules
//!
//! - [`registry`]: The immutable path → entry table built from generated
//!   manifest data, plus the exactly-once payload materialization.
//! - [`vfs`]: The facade selecting between the embedded backend and the
//!   local-disk override, prefix-mounted views, and whole-buffer accessors.
//! - [`file`]: The generic file contract and its two handle types.
//! - [`mime`]: Extension and content-sniffing MIME detection for serving.
//!
//! ## Examples
//!
//! ```
//! use embedfs::{Assets, Mode};
//!
//! let assets = Assets::builtin();
//! let page = assets.string(Mode::Embedded, "/edit.html").unwrap();
//! assert!(page.contains("<html"));
//! ```

pub mod cli;
pub mod error;
pub mod file;
pub mod mime;
pub mod registry;
pub mod vfs;

mod decode;

pub use error::VfsError;
pub use file::{Metadata, VfsFile};
pub use vfs::{Assets, Filesystem, Mode};

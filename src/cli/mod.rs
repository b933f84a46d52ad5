use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::error::VfsError;
use crate::mime;
use crate::vfs::{Assets, Mode};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Serve assets live from the local disk instead of the embedded data.
    /// Useful while editing templates; no rebuild needed.
    #[arg(long, global = true)]
    pub local: bool,

    /// Base directory local-mode reads resolve against.
    #[arg(long, default_value = ".", global = true)]
    pub local_root: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

impl Args {
    pub fn mode(&self) -> Mode {
        if self.local {
            Mode::LocalOverride
        } else {
            Mode::Embedded
        }
    }
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// List every registered asset.
    #[command(alias = "l")]
    List,

    /// Write one asset to standard output.
    Cat {
        /// Asset path, e.g. /edit.html.
        #[arg(required = true)]
        path: String,

        /// Also report the detected MIME type on standard error.
        #[arg(long)]
        mime: bool,
    },

    /// Export every embedded asset into a directory.
    #[command(alias = "x")]
    Export {
        /// Destination directory; created if missing.
        #[arg(short, long)]
        output: PathBuf,
    },
}

/// Parses command-line arguments using `clap`.
pub fn run() -> Result<Args, Box<dyn std::error::Error>> {
    Ok(Args::parse())
}

/// Prints the registry table to standard output.
pub fn list(assets: &Assets) {
    let mut entries: Vec<_> = assets.registry().iter().collect();
    entries.sort_by(|a, b| a.path.cmp(&b.path));

    println!("Asset registry ({} entries):", entries.len());
    for entry in entries {
        if entry.is_dir {
            println!("- {} (dir)", entry.path);
        } else {
            println!(
                "- {} ({} bytes, mtime {})",
                entry.path, entry.size, entry.mod_time
            );
        }
    }
}

/// Streams one asset to standard output.
pub fn cat(assets: &Assets, mode: Mode, path: &str, report_mime: bool) -> Result<(), VfsError> {
    if report_mime {
        let fs = assets.filesystem(mode);
        eprintln!("{}", mime::type_for(&fs, path));
    }
    let data = assets.bytes(mode, path)?;
    io::stdout()
        .write_all(&data)
        .map_err(|e| VfsError::Io {
            source: e,
            path: PathBuf::from(path),
        })
}

/// Writes every non-directory asset below `output`, creating parent
/// directories as needed. Returns the number of files written.
pub fn export(assets: &Assets, mode: Mode, output: &Path) -> Result<usize, VfsError> {
    let mut exported = 0;
    let mut paths: Vec<String> = assets
        .registry()
        .iter()
        .filter(|e| !e.is_dir)
        .map(|e| e.path.clone())
        .collect();
    paths.sort();

    for path in paths {
        let dest = output.join(path.trim_start_matches('/'));
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| VfsError::Io {
                source: e,
                path: parent.to_path_buf(),
            })?;
        }
        let data = assets.bytes(mode, &path)?;
        fs::write(&dest, &data).map_err(|e| VfsError::Io {
            source: e,
            path: dest.clone(),
        })?;
        tracing::debug!(%path, dest = %dest.display(), "exported asset");
        exported += 1;
    }
    Ok(exported)
}

//! Library tree scanning.

use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// File extension identifying shared libraries in the scanned trees.
pub const LIBRARY_EXTENSION: &str = "dylib";

/// A symbolic link found under a prefix's `lib/` subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryLink {
    /// Path of the link, relative to the prefix.
    pub path: PathBuf,
    /// Raw link target as returned by readlink, never resolved.
    pub target: PathBuf,
}

/// Scan result over one prefix: every `lib/**/*.dylib` entry, classified.
///
/// A relative path appears in exactly one of `libraries` or `links`.
#[derive(Debug, Clone)]
pub struct LibraryTree {
    pub prefix: PathBuf,
    pub libraries: BTreeSet<PathBuf>,
    pub links: Vec<LibraryLink>,
}

/// Enumerate and classify the shared libraries under `<prefix>/lib`.
///
/// Regular files go to `libraries`, symlinks to `links` paired with their
/// verbatim target. Paths are recorded relative to `prefix`.
///
/// # Errors
///
/// Any walk or readlink failure is fatal, including a missing `lib/`
/// subtree. There is no partial-tree recovery.
pub fn scan_library_tree(prefix: &Path) -> Result<LibraryTree> {
    let mut libraries = BTreeSet::new();
    let mut links = Vec::new();

    for entry in WalkDir::new(prefix.join("lib")) {
        let entry = entry
            .with_context(|| format!("Failed to walk library tree under {}", prefix.display()))?;
        if entry.file_type().is_dir() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(LIBRARY_EXTENSION) {
            continue;
        }
        let relative = path
            .strip_prefix(prefix)
            .with_context(|| format!("Walked outside the prefix: {}", path.display()))?
            .to_path_buf();

        if entry.path_is_symlink() {
            let target = fs::read_link(path)
                .with_context(|| format!("Failed to read link target: {}", path.display()))?;
            links.push(LibraryLink {
                path: relative,
                target,
            });
        } else {
            libraries.insert(relative);
        }
    }

    Ok(LibraryTree {
        prefix: prefix.to_path_buf(),
        libraries,
        links,
    })
}

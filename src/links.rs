//! Symbolic link replication into the output tree.

use anyhow::{Context, Result};
use std::os::unix::fs::symlink;
use std::path::Path;

use crate::scan::LibraryLink;

/// Recreate one recorded symbolic link under the output prefix, target
/// string verbatim.
///
/// # Errors
///
/// Fails if the link path is already occupied. The directory skeleton
/// guarantees the parent exists, not that the slot is free.
pub fn replicate_link(universal_prefix: &Path, link: &LibraryLink) -> Result<()> {
    let path = universal_prefix.join(&link.path);
    symlink(&link.target, &path).with_context(|| {
        format!(
            "Failed to create symlink {} -> {}",
            path.display(),
            link.target.display()
        )
    })
}

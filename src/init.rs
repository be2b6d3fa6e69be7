//! Output prefix preparation.

use anyhow::{bail, Context, Result};
use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Remove the output prefix entirely and recreate it as an empty directory.
///
/// A missing prefix is not an error; anything else that fails during the
/// removal is.
pub fn reset_prefix(prefix: &Path) -> Result<()> {
    match fs::remove_dir_all(prefix) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to remove {}", prefix.display()))
        }
    }
    fs::create_dir_all(prefix).with_context(|| format!("Failed to create {}", prefix.display()))
}

/// Copy the architecture-independent `include/` subtree from the 64-bit
/// prefix into the output prefix verbatim.
///
/// Returns the total size in bytes of all files copied.
pub fn copy_includes(lib64_prefix: &Path, universal_prefix: &Path) -> Result<u64> {
    let src = lib64_prefix.join("include");
    if !src.is_dir() {
        bail!("No include directory at {}", src.display());
    }
    copy_dir_recursive(&src, &universal_prefix.join("include"))
        .with_context(|| format!("Failed to copy includes from {}", src.display()))
}

/// Copy a directory recursively, preserving symlinks as symlinks.
fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<u64> {
    let mut total_size: u64 = 0;

    fs::create_dir_all(dst)?;

    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let path = entry.path();
        let dest_path = dst.join(entry.file_name());

        // Symlink check comes first: is_dir follows links.
        if path.is_symlink() {
            let target = fs::read_link(&path)?;
            std::os::unix::fs::symlink(&target, &dest_path)?;
        } else if path.is_dir() {
            total_size += copy_dir_recursive(&path, &dest_path)?;
        } else {
            total_size += fs::copy(&path, &dest_path)?;
        }
    }

    Ok(total_size)
}

/// Distinct parent directories of the given library paths.
pub fn library_dirs(libraries: &BTreeSet<PathBuf>) -> BTreeSet<PathBuf> {
    libraries
        .iter()
        .filter_map(|lib| lib.parent())
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .collect()
}

/// Create every library directory under the output prefix in one batch,
/// before any library is written, so concurrent merges never race on
/// directory creation.
pub fn create_library_dirs(
    universal_prefix: &Path,
    libraries: &BTreeSet<PathBuf>,
) -> Result<BTreeSet<PathBuf>> {
    let dirs = library_dirs(libraries);
    for dir in &dirs {
        let abs = universal_prefix.join(dir);
        fs::create_dir_all(&abs).with_context(|| format!("Failed to create {}", abs.display()))?;
    }
    Ok(dirs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_dirs_dedupes() {
        let libs: BTreeSet<PathBuf> = ["lib/liba.dylib", "lib/libb.dylib"]
            .into_iter()
            .map(PathBuf::from)
            .collect();
        let dirs = library_dirs(&libs);
        let expected: BTreeSet<PathBuf> = [PathBuf::from("lib")].into_iter().collect();
        assert_eq!(dirs, expected);
    }

    #[test]
    fn test_library_dirs_nested() {
        let libs: BTreeSet<PathBuf> = ["lib/liba.dylib", "lib/sub/libc.dylib"]
            .into_iter()
            .map(PathBuf::from)
            .collect();
        let dirs = library_dirs(&libs);
        let expected: BTreeSet<PathBuf> = ["lib", "lib/sub"].into_iter().map(PathBuf::from).collect();
        assert_eq!(dirs, expected);
    }

    #[test]
    fn test_library_dirs_empty() {
        let libs = BTreeSet::new();
        assert!(library_dirs(&libs).is_empty());
    }
}

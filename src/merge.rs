//! Per-library architecture combining and dependency rewriting.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::prefix::Prefixes;
use crate::tools::{change_reference, create_fat, list_references, set_identity};

/// A library that has been combined into the output tree and made
/// relocatable.
#[derive(Debug, Clone)]
pub struct MergedLibrary {
    /// Path relative to every prefix, identical for inputs and output.
    pub relative_path: PathBuf,
    /// Install name embedded in the merged binary: the bare filename.
    pub self_identifier: String,
    /// References that pointed into the 64-bit prefix and were rewritten
    /// to bare filenames.
    pub rewritten_dependencies: Vec<String>,
}

/// Combine one library's 32-bit and 64-bit builds into a fat binary at the
/// same relative path under the output prefix, set its install name to the
/// bare filename, and rewrite stale dependency references.
///
/// The three steps are strictly sequential for one library; distinct
/// libraries may be merged concurrently since they touch disjoint paths.
///
/// # Errors
///
/// Fails if the 64-bit counterpart is missing or is not a regular file, or
/// if any tool invocation fails. There is no single-architecture fallback.
pub fn merge_library(prefixes: &Prefixes, relative_path: &Path) -> Result<MergedLibrary> {
    let lib32 = prefixes.lib32.join(relative_path);
    let lib64 = prefixes.lib64.join(relative_path);
    let merged = prefixes.universal.join(relative_path);

    let meta = fs::symlink_metadata(&lib64)
        .with_context(|| format!("Missing 64-bit counterpart: {}", lib64.display()))?;
    if !meta.is_file() {
        bail!("{} is not a regular file", lib64.display());
    }

    create_fat(&[&lib32, &lib64], &merged)?;

    let self_identifier = relative_path
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| {
            format!(
                "Library name is not valid UTF-8: {}",
                relative_path.display()
            )
        })?
        .to_string();
    info!("Setting libname to {}", self_identifier);
    set_identity(&merged, &self_identifier)?;

    let rewritten_dependencies = rewrite_stale_references(&merged, &prefixes.lib64)?;

    Ok(MergedLibrary {
        relative_path: relative_path.to_path_buf(),
        self_identifier,
        rewritten_dependencies,
    })
}

/// References that still point into the 64-bit source prefix.
pub fn stale_references(references: &[String], lib64_prefix: &Path) -> Vec<String> {
    let prefix = lib64_prefix.to_string_lossy();
    references
        .iter()
        .filter(|reference| reference.starts_with(prefix.as_ref()))
        .cloned()
        .collect()
}

/// Rewrite every dependency reference of `binary` that points into the
/// 64-bit prefix to its bare filename, in place.
///
/// References outside the 64-bit prefix (system libraries) are left
/// untouched. Returns the references that were rewritten.
pub fn rewrite_stale_references(binary: &Path, lib64_prefix: &Path) -> Result<Vec<String>> {
    let references = list_references(binary)?;
    let stale = stale_references(&references, lib64_prefix);

    for old in &stale {
        let new = Path::new(old)
            .file_name()
            .and_then(|name| name.to_str())
            .with_context(|| format!("Dependency reference has no filename: {}", old))?;
        info!("{} => {}", old, new);
        change_reference(binary, old, new)?;
    }

    Ok(stale)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_references_by_prefix() {
        let refs = vec![
            "/build/universal/lib/liba.dylib".to_string(),
            "/build/64/lib/libdep.dylib".to_string(),
            "/usr/lib/libSystem.B.dylib".to_string(),
        ];
        let stale = stale_references(&refs, Path::new("/build/64"));
        assert_eq!(stale, vec!["/build/64/lib/libdep.dylib".to_string()]);
    }

    #[test]
    fn test_stale_references_none() {
        let refs = vec![
            "/usr/lib/libSystem.B.dylib".to_string(),
            "/usr/lib/libc++.1.dylib".to_string(),
        ];
        assert!(stale_references(&refs, Path::new("/build/64")).is_empty());
    }
}

//! Resolution of the three fixed prefix directories.

use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

/// The three prefix roots the merge operates on, resolved once at startup
/// and threaded through every component.
#[derive(Debug, Clone)]
pub struct Prefixes {
    /// Prefix holding the 32-bit build (`<root>/32`).
    pub lib32: PathBuf,
    /// Prefix holding the 64-bit build (`<root>/64`).
    pub lib64: PathBuf,
    /// Output prefix, destroyed and rebuilt every run (`<root>/universal`).
    pub universal: PathBuf,
}

impl Prefixes {
    pub fn from_root(root: &Path) -> Self {
        Prefixes {
            lib32: root.join("32"),
            lib64: root.join("64"),
            universal: root.join("universal"),
        }
    }

    /// Resolve the prefixes as siblings of the running executable.
    pub fn from_exe() -> Result<Self> {
        let exe = env::current_exe().context("Failed to locate the running executable")?;
        let root = exe
            .parent()
            .context("Executable path has no parent directory")?;
        Ok(Self::from_root(root))
    }
}

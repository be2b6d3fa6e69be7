//! Wrappers around the native Mach-O editing tools.
//!
//! `lipo`, `install_name_tool` and `otool` are invoked as subprocesses and
//! treated as black boxes with narrow contracts: combine architectures,
//! edit install names, list dependency references.

use anyhow::{bail, Context, Result};
use std::path::Path;
use std::process::{Command, Output};

use crate::scan::LIBRARY_EXTENSION;

const LIPO: &str = "/usr/bin/lipo";
const INSTALL_NAME_TOOL: &str = "/usr/bin/install_name_tool";
const OTOOL: &str = "/usr/bin/otool";

fn check_status(program: &str, subject: &Path, output: &Output) -> Result<()> {
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "{} failed on {}: {}",
            program,
            subject.display(),
            stderr.trim()
        );
    }
    Ok(())
}

/// Combine single-architecture binaries into one fat binary at `output`.
///
/// # Errors
///
/// Returns an error if `lipo` is missing or rejects any input (e.g. an
/// input that is not a valid Mach-O binary).
pub fn create_fat(inputs: &[&Path], output: &Path) -> Result<()> {
    let out = Command::new(LIPO)
        .arg("-create")
        .args(inputs)
        .arg("-output")
        .arg(output)
        .output()
        .context("lipo not found - install the Xcode command line tools")?;
    check_status("lipo", output, &out)
}

/// Set a binary's embedded self-identifier (its install name).
pub fn set_identity(binary: &Path, id: &str) -> Result<()> {
    let out = Command::new(INSTALL_NAME_TOOL)
        .args(["-id", id])
        .arg(binary)
        .output()
        .context("install_name_tool not found - install the Xcode command line tools")?;
    check_status("install_name_tool", binary, &out)
}

/// Replace one dependency reference with another, in place.
pub fn change_reference(binary: &Path, old: &str, new: &str) -> Result<()> {
    let out = Command::new(INSTALL_NAME_TOOL)
        .args(["-change", old, new])
        .arg(binary)
        .output()
        .context("install_name_tool not found - install the Xcode command line tools")?;
    check_status("install_name_tool", binary, &out)
}

/// List the dependency references embedded in a binary via `otool -L`.
pub fn list_references(binary: &Path) -> Result<Vec<String>> {
    let out = Command::new(OTOOL)
        .args(["-L"])
        .arg(binary)
        .output()
        .context("otool not found - install the Xcode command line tools")?;
    check_status("otool", binary, &out)?;

    let stdout = String::from_utf8_lossy(&out.stdout);
    Ok(parse_reference_lines(&stdout))
}

/// Parse `otool -L` output into the referenced library paths.
///
/// Example otool output:
/// ```text
/// universal/lib/liba.dylib:
///         /build/64/lib/libdep.dylib (compatibility version 1.0.0, current version 1.2.0)
///         /usr/lib/libSystem.B.dylib (compatibility version 1.0.0, current version 1281.0.0)
/// ```
///
/// Each line contributes the text after leading whitespace up to the last
/// `.dylib` occurrence. The header line matches too; callers filter by
/// prefix, so the header (which lives under the output prefix) is never
/// rewritten. otool has no structured output mode, so this line pattern is
/// the contract.
pub fn parse_reference_lines(output: &str) -> Vec<String> {
    let suffix = format!(".{}", LIBRARY_EXTENSION);
    let mut references = Vec::new();

    for line in output.lines() {
        let trimmed = line.trim_start();
        if let Some(idx) = trimmed.rfind(&suffix) {
            references.push(trimmed[..idx + suffix.len()].to_string());
        }
    }

    references
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reference_lines() {
        let output = "\
/tmp/universal/lib/liba.dylib:
\t/tmp/64/lib/libdep.dylib (compatibility version 1.0.0, current version 1.2.0)
\t/usr/lib/libSystem.B.dylib (compatibility version 1.0.0, current version 1281.100.1)
";
        let refs = parse_reference_lines(output);
        assert_eq!(
            refs,
            vec![
                "/tmp/universal/lib/liba.dylib",
                "/tmp/64/lib/libdep.dylib",
                "/usr/lib/libSystem.B.dylib",
            ]
        );
    }

    #[test]
    fn test_parse_reference_lines_greedy() {
        // The path itself may contain ".dylib"; take up to the last one.
        let output = "\t/opt/x.dylib/liby.dylib (compatibility version 1.0.0)\n";
        let refs = parse_reference_lines(output);
        assert_eq!(refs, vec!["/opt/x.dylib/liby.dylib"]);
    }

    #[test]
    fn test_parse_reference_lines_ignores_other_lines() {
        let refs = parse_reference_lines("not a library line\nversion 1.2.3\n\n");
        assert!(refs.is_empty());
    }
}

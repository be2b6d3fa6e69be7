//! Universal dylib prefix merging utilities.
//!
//! Combines the 32-bit and 64-bit builds of a library prefix into one
//! fat-binary tree using `lipo`, then rewrites install names with
//! `install_name_tool` so the merged tree is relocatable. Dependency
//! references are discovered with `otool -L`; any reference still pointing
//! into the 64-bit source prefix is rewritten to a bare filename.

mod init;
mod links;
mod merge;
mod prefix;
mod scan;
mod tools;

pub use init::{copy_includes, create_library_dirs, library_dirs, reset_prefix};
pub use links::replicate_link;
pub use merge::{merge_library, rewrite_stale_references, stale_references, MergedLibrary};
pub use prefix::Prefixes;
pub use scan::{scan_library_tree, LibraryLink, LibraryTree, LIBRARY_EXTENSION};
pub use tools::{
    change_reference, create_fat, list_references, parse_reference_lines, set_identity,
};

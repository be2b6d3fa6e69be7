//! fatlib - merges the sibling `32/` and `64/` dylib prefixes into
//! `universal/`.
//!
//! Single-shot batch run, no arguments: scan the 32-bit tree, rebuild the
//! output prefix, combine every library with lipo, fix install names, then
//! replicate symlinks. The first error anywhere aborts the whole run.

use anyhow::Result;
use rayon::prelude::*;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use fatlib::{
    copy_includes, create_library_dirs, merge_library, replicate_link, reset_prefix,
    scan_library_tree, Prefixes,
};

fn main() -> Result<()> {
    setup_logging();
    let prefixes = Prefixes::from_exe()?;
    run(&prefixes)
}

fn setup_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn run(prefixes: &Prefixes) -> Result<()> {
    let tree32 = scan_library_tree(&prefixes.lib32)?;
    info!(
        "32-bit tree: {} libraries, {} links",
        tree32.libraries.len(),
        tree32.links.len()
    );

    info!("Resetting {}", prefixes.universal.display());
    reset_prefix(&prefixes.universal)?;

    info!("Copying includes...");
    let bytes = copy_includes(&prefixes.lib64, &prefixes.universal)?;
    info!("Copied {} bytes of headers", bytes);

    // The whole skeleton exists before any merge starts; merges then write
    // to disjoint paths and need no further coordination.
    let dirs = create_library_dirs(&prefixes.universal, &tree32.libraries)?;
    info!("Created {} library directories", dirs.len());

    info!("Creating fat libraries with lipo...");
    tree32
        .libraries
        .par_iter()
        .try_for_each(|lib| -> Result<()> {
            info!("> {}", lib.display());
            let merged = merge_library(prefixes, lib)?;
            if !merged.rewritten_dependencies.is_empty() {
                info!(
                    "{}: rewrote {} dependency references",
                    merged.self_identifier,
                    merged.rewritten_dependencies.len()
                );
            }
            Ok(())
        })?;

    info!("Replicating links...");
    tree32.links.par_iter().try_for_each(|link| -> Result<()> {
        info!("{} => {}", link.path.display(), link.target.display());
        replicate_link(&prefixes.universal, link)
    })?;

    info!("Done");
    Ok(())
}

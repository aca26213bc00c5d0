//! Artifact stamping: build metadata as compile-time variable overrides.
//!
//! Pure formatting, no I/O. The build and install actions hand these to the
//! toolchain so the compiled artifact can report its own provenance at
//! runtime without carrying a config file.

use crate::metadata::BuildMetadata;

/// Fully-qualified variable overrides for a metadata snapshot, in stable
/// order. The `-dirty` suffix marks artifacts built from an unclean tree.
pub fn substitutions(meta: &BuildMetadata, prefix: &str) -> Vec<(String, String)> {
    let mut version = meta.revision.clone();
    if meta.is_dirty {
        version.push_str("-dirty");
    }

    vec![
        (format!("{}.Version", prefix), version),
        (format!("{}.Date", prefix), meta.build_timestamp.clone()),
        (format!("{}.GoVersion", prefix), meta.toolchain_version.clone()),
    ]
}

/// Linker-flag string for the build and install actions: strip symbol and
/// debug tables, then apply every substitution.
pub fn ldflags(meta: &BuildMetadata, prefix: &str) -> String {
    let overrides = substitutions(meta, prefix)
        .into_iter()
        .map(|(key, value)| format!("-X '{}={}'", key, value))
        .collect::<Vec<_>>()
        .join(" ");

    format!("-s -w {}", overrides)
}

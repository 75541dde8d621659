//! Package-root path derivation
//!
//! A materialized package root looks like
//! `~/.nuget/packages/fsharp.data/3.3.3/`: the leaf directory is the
//! version and its parent is the (lower-cased) package name. The resolver
//! reports roots and resolved files separately; files are attributed to the
//! root whose tree contains them.

use std::path::{Path, PathBuf};

/// Parse `(package_name, package_version)` out of a package root path.
///
/// Returns `None` when the path has no parseable name/version pair; callers
/// drop such roots from the resolution results instead of failing the
/// restore.
pub fn parse_package_root(root: &Path) -> Option<(String, String)> {
    let version = root.file_name()?.to_str()?;
    let name = root.parent()?.file_name()?.to_str()?;
    if name.is_empty() || version.is_empty() {
        return None;
    }
    Some((name.to_string(), version.to_string()))
}

/// Collect the resolved files whose containing directory lives under `root`.
pub fn assembly_paths_under_root(root: &Path, resolved_files: &[PathBuf]) -> Vec<PathBuf> {
    resolved_files
        .iter()
        .filter(|file| file.parent().is_some_and(|dir| dir.starts_with(root)))
        .cloned()
        .collect()
}

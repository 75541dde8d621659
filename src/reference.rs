//! Package reference value entities
//!
//! [`PackageReference`] is a requested package identity; it is created the
//! first time a name is requested and never mutated afterwards.
//! [`ResolvedPackageReference`] is created exactly once per package, at the
//! end of a successful restore pass, and carries the concrete version plus
//! the on-disk paths the host's loader needs.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

/// A requested package: name plus an optional version constraint.
///
/// Package names are case-insensitive; the original casing is preserved for
/// display and recovered when a resolved root is parsed back into a name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageReference {
    name: String,
    version: Option<String>,
}

impl PackageReference {
    pub fn new(name: impl Into<String>, version: Option<&str>) -> Self {
        Self {
            name: name.into(),
            version: version.map(str::to_string),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Lower-cased identity key.
    pub fn key(&self) -> String {
        self.name.to_lowercase()
    }

    /// True when this request places no version requirement.
    pub fn is_unconstrained(&self) -> bool {
        version_is_unconstrained(self.version())
    }
}

/// True when a version constraint places no requirement: absent, blank, or
/// the `"*"` wildcard.
pub fn version_is_unconstrained(version: Option<&str>) -> bool {
    match version {
        None => true,
        Some(v) => {
            let v = v.trim();
            v.is_empty() || v == "*"
        }
    }
}

/// Version compatibility rule shared by every request-registration branch.
///
/// Either side being unconstrained is a match; otherwise the trimmed values
/// must compare equal case-insensitively. Wildcards and absent versions are
/// treated uniformly, so no branch needs its own null handling.
pub fn versions_compatible(requested: Option<&str>, existing: Option<&str>) -> bool {
    if version_is_unconstrained(requested) || version_is_unconstrained(existing) {
        return true;
    }
    match (requested, existing) {
        (Some(a), Some(b)) => a.trim().eq_ignore_ascii_case(b.trim()),
        _ => true,
    }
}

/// A fully resolved package: concrete version, the binaries that belong to
/// it, and the directories the host's loader should probe.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedPackageReference {
    reference: Arc<PackageReference>,
    assembly_paths: Vec<PathBuf>,
    package_root: PathBuf,
    probing_paths: Vec<PathBuf>,
}

impl ResolvedPackageReference {
    /// The package root is the sole probing path today; probing paths stay a
    /// sequence so more can be added without changing callers.
    pub fn new(
        name: impl Into<String>,
        version: &str,
        assembly_paths: Vec<PathBuf>,
        package_root: PathBuf,
    ) -> Self {
        let probing_paths = vec![package_root.clone()];
        Self {
            reference: Arc::new(PackageReference::new(name, Some(version))),
            assembly_paths,
            package_root,
            probing_paths,
        }
    }

    pub fn name(&self) -> &str {
        self.reference.name()
    }

    /// The concrete resolved version (never a wildcard).
    pub fn version(&self) -> &str {
        self.reference.version().unwrap_or_default()
    }

    /// The request-shaped view of this resolution; stable across calls, so
    /// repeated lookups observe the same instance.
    pub fn reference(&self) -> &Arc<PackageReference> {
        &self.reference
    }

    /// Every loadable binary belonging to this package, all under
    /// [`package_root`](Self::package_root).
    pub fn assembly_paths(&self) -> &[PathBuf] {
        &self.assembly_paths
    }

    pub fn package_root(&self) -> &Path {
        &self.package_root
    }

    /// Directories to consult for native/dynamic loading.
    pub fn probing_paths(&self) -> &[PathBuf] {
        &self.probing_paths
    }

    /// Lower-cased identity key.
    pub fn key(&self) -> String {
        self.reference.key()
    }
}

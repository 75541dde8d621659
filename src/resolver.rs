//! External dependency-resolver boundary
//!
//! The resolution engine is a collaborator, not part of this crate: it takes
//! textual directive lines plus a target-framework moniker and reports back
//! resolved file and package-root paths. Providers register in a
//! [`ResolverRegistry`] under a key; the coordinator looks up the fixed
//! [`NUGET_PROVIDER_KEY`], and its absence is a deployment defect rather
//! than a per-restore failure.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::Result;

/// Provider key the coordinator resolves packages through.
pub const NUGET_PROVIDER_KEY: &str = "nuget";

/// Target-framework moniker passed to the resolver for every restore pass.
pub const RESTORE_TARGET_FRAMEWORK: &str = "netcoreapp3.1";

/// One diagnostic emitted by the resolver while it works.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub is_error: bool,
    pub code: i32,
    pub message: String,
}

impl ErrorReport {
    pub fn error(code: i32, message: impl Into<String>) -> Self {
        Self {
            is_error: true,
            code,
            message: message.into(),
        }
    }

    pub fn warning(code: i32, message: impl Into<String>) -> Self {
        Self {
            is_error: false,
            code,
            message: message.into(),
        }
    }

    /// Render in the transcript shape surfaced to callers on failure.
    pub fn render(&self) -> String {
        let severity = if self.is_error { "Error" } else { "Warning" };
        format!("PackageManagement {severity} {} {}", self.code, self.message)
    }
}

/// Input to a single resolver invocation.
#[derive(Debug, Clone)]
pub struct ResolveRequest {
    /// Ordered directive lines: restore sources first, then every requested
    /// package.
    pub directive_lines: Vec<String>,
    /// Target-framework moniker the packages must satisfy.
    pub target_framework: String,
}

/// Everything a resolver invocation reports back.
#[derive(Debug, Clone, Default)]
pub struct ResolveOutcome {
    pub success: bool,
    /// Resolved binary files across all packages.
    pub resolved_files: Vec<PathBuf>,
    /// Source/config files; unused by this core but part of the contract.
    pub source_files: Vec<PathBuf>,
    /// One materialized root directory per resolved package.
    pub package_roots: Vec<PathBuf>,
    /// Diagnostic transcript; appended to the error list on failure.
    pub stdout: Vec<String>,
}

/// The external dependency-resolution engine.
///
/// `resolve` may block on network and disk for a long time; the coordinator
/// always invokes it off the caller's thread. The report callback may be
/// invoked zero or more times with warnings and errors as the engine works.
pub trait DependencyResolver: Send + Sync {
    fn resolve(
        &self,
        request: &ResolveRequest,
        report: &(dyn Fn(ErrorReport) + Sync),
    ) -> ResolveOutcome;

    /// Best-effort teardown hook, invoked once when the owning coordinator
    /// is disposed. Failures are logged by the caller, never propagated.
    fn release(&self) -> Result<()> {
        Ok(())
    }
}

/// Registry of dependency-resolver providers, looked up by key.
#[derive(Default)]
pub struct ResolverRegistry {
    providers: RwLock<HashMap<String, Arc<dyn DependencyResolver>>>,
}

impl ResolverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider under `key`, replacing any previous registration.
    pub fn register(&self, key: impl Into<String>, resolver: Arc<dyn DependencyResolver>) {
        self.providers.write().insert(key.into(), resolver);
    }

    pub fn find(&self, key: &str) -> Option<Arc<dyn DependencyResolver>> {
        self.providers.read().get(key).cloned()
    }
}

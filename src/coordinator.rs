//! Restore coordination
//!
//! [`RestoreCoordinator`] owns the request/resolution state machine. Hosts
//! register restore sources and package requests concurrently; a restore
//! pass serializes the full desired graph into directive lines, drives the
//! external resolver exactly once, and merges freshly resolved packages into
//! a stable cache. Only the delta (requests not yet resolved when the pass
//! started) is reported back as new.
//!
//! A package key moves `Unseen -> Requested -> Resolved`; a later request at
//! an incompatible version is answered with a conflict and changes nothing.
//! Resolved entries are never replaced: a re-resolution of an already-cached
//! package keeps the existing entry.

use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use serde::Serialize;

use crate::directive::directive_lines;
use crate::error::{Result, RestoreError};
use crate::notifier::ModuleLoadObserver;
use crate::reference::{PackageReference, ResolvedPackageReference, versions_compatible};
use crate::resolver::{
    DependencyResolver, ErrorReport, NUGET_PROVIDER_KEY, RESTORE_TARGET_FRAMEWORK, ResolveOutcome,
    ResolveRequest, ResolverRegistry,
};
use crate::rooted::{assembly_paths_under_root, parse_package_root};

/// Outcome of one restore pass.
#[derive(Debug, Clone, Serialize)]
pub struct RestoreResult {
    pub succeeded: bool,

    /// Requests that were still pending when the pass started (the delta).
    pub requested_packages: Vec<Arc<PackageReference>>,

    /// Packages this pass added to the resolved cache; empty on failure.
    pub resolved_references: Vec<Arc<ResolvedPackageReference>>,

    /// Resolver diagnostics; empty on success.
    pub errors: Vec<String>,
}

impl RestoreResult {
    fn success(
        requested_packages: Vec<Arc<PackageReference>>,
        resolved_references: Vec<Arc<ResolvedPackageReference>>,
    ) -> Self {
        Self {
            succeeded: true,
            requested_packages,
            resolved_references,
            errors: Vec::new(),
        }
    }

    fn failure(requested_packages: Vec<Arc<PackageReference>>, errors: Vec<String>) -> Self {
        Self {
            succeeded: false,
            requested_packages,
            resolved_references: Vec::new(),
            errors,
        }
    }
}

/// Package-restore coordination cache.
///
/// Registration calls are safe for concurrent callers; restore passes
/// serialize through an internal gate so at most one cache merge is ever in
/// progress. The resolver invocation runs on the blocking pool, keeping
/// registration responsive while a restore is in flight.
pub struct RestoreCoordinator {
    /// Lower-cased package name -> original request. Entries stay visible
    /// after the package resolves (the requested-history view).
    requested: RwLock<HashMap<String, Arc<PackageReference>>>,

    /// Lower-cased package name -> resolution. Insert-if-absent only;
    /// entries live for the coordinator's lifetime.
    resolved: RwLock<HashMap<String, Arc<ResolvedPackageReference>>>,

    /// Additional package feeds, exact-string set semantics.
    restore_sources: RwLock<BTreeSet<String>>,

    /// Emptied by disposal.
    resolver: Mutex<Option<Arc<dyn DependencyResolver>>>,

    /// Shared with every handed-out [`ModuleLoadObserver`].
    observer_attached: Arc<AtomicBool>,

    /// Serializes restore passes.
    restore_gate: tokio::sync::Mutex<()>,

    target_framework: String,
    resolve_timeout: Option<Duration>,
}

impl RestoreCoordinator {
    /// Build a coordinator around an explicit resolver collaborator.
    pub fn new(resolver: Arc<dyn DependencyResolver>) -> Self {
        Self {
            requested: RwLock::new(HashMap::new()),
            resolved: RwLock::new(HashMap::new()),
            restore_sources: RwLock::new(BTreeSet::new()),
            resolver: Mutex::new(Some(resolver)),
            observer_attached: Arc::new(AtomicBool::new(true)),
            restore_gate: tokio::sync::Mutex::new(()),
            target_framework: RESTORE_TARGET_FRAMEWORK.to_string(),
            resolve_timeout: None,
        }
    }

    /// Locate the `nuget` provider in `registry` and build a coordinator
    /// around it. A missing provider means a broken deployment, so this is
    /// an error rather than something a later restore pass could report.
    pub fn from_registry(registry: &ResolverRegistry) -> Result<Self> {
        let resolver = registry
            .find(NUGET_PROVIDER_KEY)
            .ok_or_else(|| crate::error::resolver_unavailable(NUGET_PROVIDER_KEY))?;
        Ok(Self::new(resolver))
    }

    /// Override the target-framework moniker passed to the resolver.
    #[must_use]
    pub fn with_target_framework(mut self, target_framework: impl Into<String>) -> Self {
        self.target_framework = target_framework.into();
        self
    }

    /// Bound each resolver invocation. On expiry the pass returns a failure
    /// result and the cache is left untouched.
    #[must_use]
    pub fn with_resolve_timeout(mut self, timeout: Duration) -> Self {
        self.resolve_timeout = Some(timeout);
        self
    }

    /// Add a package feed for subsequent restore passes. Adding an identical
    /// string again is a no-op.
    pub fn add_restore_source(&self, source: impl Into<String>) {
        self.restore_sources.write().insert(source.into());
    }

    /// Register interest in a package, or fetch the reference already
    /// registered under the same case-insensitive name.
    ///
    /// Returns `None` on a version conflict: the package is already
    /// requested or resolved at an incompatible version. The existing entry
    /// is left untouched either way, and losers of a same-key race observe
    /// the winner's instance.
    pub fn get_or_add_package_reference(
        &self,
        name: &str,
        version: Option<&str>,
    ) -> Option<Arc<PackageReference>> {
        let key = name.to_lowercase();

        if let Some(resolved) = self.resolved.read().get(&key) {
            if versions_compatible(version, Some(resolved.version())) {
                return Some(resolved.reference().clone());
            }
            return None;
        }

        match self.requested.write().entry(key) {
            Entry::Occupied(entry) => {
                let existing = entry.get();
                if versions_compatible(version, existing.version()) {
                    Some(existing.clone())
                } else {
                    None
                }
            }
            Entry::Vacant(slot) => {
                let reference = Arc::new(PackageReference::new(name, version));
                slot.insert(reference.clone());
                Some(reference)
            }
        }
    }

    /// Feed URIs consulted by restore passes.
    pub fn restore_sources(&self) -> Vec<String> {
        self.restore_sources.read().iter().cloned().collect()
    }

    /// Every package ever requested. Entries remain visible after the
    /// package resolves.
    pub fn requested_package_references(&self) -> Vec<Arc<PackageReference>> {
        self.requested.read().values().cloned().collect()
    }

    /// Every package resolved so far.
    pub fn resolved_package_references(&self) -> Vec<Arc<ResolvedPackageReference>> {
        self.resolved.read().values().cloned().collect()
    }

    /// Look up a resolved package by case-insensitive name.
    pub fn resolved_package_reference(&self, name: &str) -> Option<Arc<ResolvedPackageReference>> {
        self.resolved.read().get(&name.to_lowercase()).cloned()
    }

    /// Every loadable binary across all resolved packages. Re-derived from
    /// the live cache on each call, so packages resolved between calls show
    /// up in the next one.
    pub fn resolved_assembly_paths(&self) -> Vec<PathBuf> {
        self.resolved
            .read()
            .values()
            .flat_map(|package| package.assembly_paths().iter().cloned())
            .collect()
    }

    /// Every native-probing directory across all resolved packages.
    /// Re-derived from the live cache on each call.
    pub fn resolved_probing_paths(&self) -> Vec<PathBuf> {
        self.resolved
            .read()
            .values()
            .flat_map(|package| package.probing_paths().iter().cloned())
            .collect()
    }

    /// Observer handle for the host's module loader. Goes inert once this
    /// coordinator is disposed.
    pub fn module_load_observer(&self) -> ModuleLoadObserver {
        ModuleLoadObserver::new(self.observer_attached.clone())
    }

    /// Run one restore pass.
    ///
    /// Computes the delta of not-yet-resolved requests, hands the complete
    /// desired graph to the resolver off-thread, and on success merges the
    /// derived resolutions into the cache via insert-if-absent. A resolver
    /// failure (or timeout, or panic) returns a failure result with the
    /// cache untouched. Passes serialize: a concurrent caller waits for the
    /// in-flight pass to finish before running its own.
    ///
    /// # Errors
    ///
    /// [`RestoreError::Disposed`] when the coordinator has been disposed;
    /// without a resolver no package can ever be satisfied, so this aborts
    /// the whole operation instead of returning a failure result.
    pub async fn restore(&self) -> Result<RestoreResult> {
        let _pass = self.restore_gate.lock().await;

        let resolver = self.resolver.lock().clone().ok_or(RestoreError::Disposed)?;

        // Point-in-time snapshot: requests registered after this line wait
        // for the next pass.
        let newly_requested = self.pending_delta();

        let request = ResolveRequest {
            directive_lines: self.collect_directive_lines(),
            target_framework: self.target_framework.clone(),
        };

        let transcript: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = transcript.clone();
        let task = tokio::task::spawn_blocking(move || {
            let report = move |report: ErrorReport| sink.lock().push(report.render());
            resolver.resolve(&request, &report)
        });

        let joined = match self.resolve_timeout {
            Some(limit) => match tokio::time::timeout(limit, task).await {
                Ok(joined) => joined,
                Err(_) => {
                    let mut errors = transcript.lock().clone();
                    errors.push(format!(
                        "Package resolution timed out after {limit:?}; the cache was not modified"
                    ));
                    return Ok(RestoreResult::failure(newly_requested, errors));
                }
            },
            None => task.await,
        };

        let outcome = match joined {
            Ok(outcome) => outcome,
            Err(join_error) => {
                let mut errors = transcript.lock().clone();
                errors.push(format!("Package resolution aborted: {join_error}"));
                return Ok(RestoreResult::failure(newly_requested, errors));
            }
        };

        if !outcome.success {
            let mut errors = transcript.lock().clone();
            errors.extend(outcome.stdout);
            return Ok(RestoreResult::failure(newly_requested, errors));
        }

        let newly_resolved = self.merge_resolved(self.derive_resolved_references(&outcome));
        Ok(RestoreResult::success(newly_requested, newly_resolved))
    }

    /// Requests whose key is not yet in the resolved cache.
    fn pending_delta(&self) -> Vec<Arc<PackageReference>> {
        let requested = self.requested.read();
        let resolved = self.resolved.read();
        requested
            .iter()
            .filter(|(key, _)| !resolved.contains_key(*key))
            .map(|(_, reference)| reference.clone())
            .collect()
    }

    /// Directive set over the sources and every request - already-resolved
    /// packages included, since the resolver needs the complete desired
    /// graph to produce a consistent resolution.
    fn collect_directive_lines(&self) -> Vec<String> {
        let sources: Vec<String> = self.restore_sources.read().iter().cloned().collect();
        let requests: Vec<Arc<PackageReference>> =
            self.requested.read().values().cloned().collect();
        directive_lines(&sources, &requests)
    }

    /// Parse resolver output into resolved references, one per recognizable
    /// package root.
    fn derive_resolved_references(&self, outcome: &ResolveOutcome) -> Vec<ResolvedPackageReference> {
        let requested = self.requested.read();
        let mut references = Vec::with_capacity(outcome.package_roots.len());

        for root in &outcome.package_roots {
            let Some((parsed_name, version)) = parse_package_root(root) else {
                tracing::warn!(root = %root.display(), "skipping package root with unrecognized layout");
                continue;
            };
            // Prefer the casing the caller originally requested over the
            // lower-cased on-disk directory name.
            let name = requested
                .get(&parsed_name.to_lowercase())
                .map_or(parsed_name, |request| request.name().to_string());
            let assembly_paths = assembly_paths_under_root(root, &outcome.resolved_files);
            references.push(ResolvedPackageReference::new(
                name,
                &version,
                assembly_paths,
                root.clone(),
            ));
        }

        references
    }

    /// Insert-if-absent merge; returns the values that are new relative to
    /// the pre-merge cache, by reference identity.
    fn merge_resolved(
        &self,
        derived: Vec<ResolvedPackageReference>,
    ) -> Vec<Arc<ResolvedPackageReference>> {
        let mut resolved = self.resolved.write();
        let previously: Vec<Arc<ResolvedPackageReference>> = resolved.values().cloned().collect();

        for reference in derived {
            let key = reference.key();
            resolved.entry(key).or_insert_with(|| Arc::new(reference));
        }

        resolved
            .values()
            .filter(|value| !previously.iter().any(|prior| Arc::ptr_eq(prior, value)))
            .cloned()
            .collect()
    }

    /// Release the resolver collaborator and detach the load observer.
    ///
    /// Idempotent and infallible: teardown problems are logged, never
    /// propagated. Subsequent restore passes fail with
    /// [`RestoreError::Disposed`]; read accessors keep working.
    pub fn dispose(&self) {
        self.observer_attached.store(false, Ordering::Release);
        let released = self.resolver.lock().take();
        if let Some(resolver) = released {
            if let Err(error) = resolver.release() {
                tracing::warn!(%error, "dependency resolver teardown reported a failure");
            }
        }
    }
}

impl Drop for RestoreCoordinator {
    fn drop(&mut self) {
        self.dispose();
    }
}

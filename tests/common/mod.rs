//! Common test utilities for pkg-restore integration tests

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::time::Duration;

use tempfile::TempDir;

use pkg_restore::{DependencyResolver, ErrorReport, ResolveOutcome, ResolveRequest};

/// Rendezvous points letting a test act while a resolver invocation is in
/// flight: the resolver waits on `started`, then on `proceed`.
#[allow(dead_code)]
pub struct Hold {
    pub started: Arc<Barrier>,
    pub proceed: Arc<Barrier>,
}

/// A scripted stand-in for the external dependency resolver.
///
/// Pops one pre-scripted outcome per invocation (falling back to an empty
/// success), records every request it receives, and can be told to emit
/// diagnostics, stall, or fail its teardown.
#[derive(Default)]
pub struct ScriptedResolver {
    outcomes: Mutex<VecDeque<ResolveOutcome>>,
    reports: Mutex<Vec<ErrorReport>>,
    requests: Mutex<Vec<ResolveRequest>>,
    hold: Mutex<Option<Hold>>,
    delay: Mutex<Option<Duration>>,
    release_error: Mutex<Option<String>>,
    invocations: AtomicUsize,
    releases: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

#[allow(dead_code)]
impl ScriptedResolver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue the outcome returned by the next unscripted invocation.
    pub fn push_outcome(&self, outcome: ResolveOutcome) {
        self.outcomes.lock().unwrap().push_back(outcome);
    }

    /// Queue a failure outcome carrying `stdout` as its transcript.
    pub fn push_failure(&self, stdout: &[&str]) {
        self.push_outcome(ResolveOutcome {
            success: false,
            stdout: stdout.iter().map(|s| (*s).to_string()).collect(),
            ..ResolveOutcome::default()
        });
    }

    /// Diagnostics replayed through the report callback on every invocation.
    pub fn emit_reports(&self, reports: Vec<ErrorReport>) {
        *self.reports.lock().unwrap() = reports;
    }

    /// Make the next invocation rendezvous with the test before returning.
    pub fn hold_next(&self, started: Arc<Barrier>, proceed: Arc<Barrier>) {
        *self.hold.lock().unwrap() = Some(Hold { started, proceed });
    }

    /// Sleep inside every invocation, simulating network/disk work.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    /// Make `release` report a teardown failure.
    pub fn fail_release(&self, message: &str) {
        *self.release_error.lock().unwrap() = Some(message.to_string());
    }

    pub fn requests(&self) -> Vec<ResolveRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneously in-flight invocations observed.
    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

impl DependencyResolver for ScriptedResolver {
    fn resolve(
        &self,
        request: &ResolveRequest,
        report: &(dyn Fn(ErrorReport) + Sync),
    ) -> ResolveOutcome {
        self.requests.lock().unwrap().push(request.clone());
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(active, Ordering::SeqCst);

        if let Some(hold) = self.hold.lock().unwrap().take() {
            hold.started.wait();
            hold.proceed.wait();
        }
        if let Some(delay) = *self.delay.lock().unwrap() {
            std::thread::sleep(delay);
        }

        for diagnostic in self.reports.lock().unwrap().iter() {
            report(diagnostic.clone());
        }

        let outcome = self
            .outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| ResolveOutcome {
                success: true,
                ..ResolveOutcome::default()
            });

        self.active.fetch_sub(1, Ordering::SeqCst);
        self.invocations.fetch_add(1, Ordering::SeqCst);
        outcome
    }

    fn release(&self) -> pkg_restore::Result<()> {
        self.releases.fetch_add(1, Ordering::SeqCst);
        match self.release_error.lock().unwrap().clone() {
            Some(message) => Err(pkg_restore::error::resolver_teardown(message)),
            None => Ok(()),
        }
    }
}

/// An on-disk package cache fixture shaped like a real one:
/// `<store>/packages/<name>/<version>/...`.
pub struct PackageStore {
    #[allow(dead_code)]
    temp: TempDir,
    pub packages_dir: PathBuf,
}

#[allow(dead_code)]
impl PackageStore {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let packages_dir = temp.path().join("packages");
        std::fs::create_dir_all(&packages_dir).expect("Failed to create packages directory");
        Self { temp, packages_dir }
    }

    /// Materialize a package root with the given assembly files (paths
    /// relative to the root, e.g. `lib/netstandard2.0/Foo.dll`). Package
    /// directory names are lower-cased like a real package cache.
    pub fn add_package(&self, name: &str, version: &str, assemblies: &[&str]) -> PathBuf {
        let root = self.packages_dir.join(name.to_lowercase()).join(version);
        for assembly in assemblies {
            let path = root.join(assembly);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).expect("Failed to create assembly directory");
            }
            std::fs::write(&path, b"binary").expect("Failed to write assembly file");
        }
        root
    }

    /// A successful outcome covering `roots`, with every file under each
    /// root reported as a resolved file.
    pub fn outcome_for(&self, roots: &[PathBuf]) -> ResolveOutcome {
        let mut resolved_files = Vec::new();
        for root in roots {
            collect_files(root, &mut resolved_files);
        }
        ResolveOutcome {
            success: true,
            resolved_files,
            source_files: Vec::new(),
            package_roots: roots.to_vec(),
            stdout: Vec::new(),
        }
    }
}

#[allow(dead_code)]
fn collect_files(dir: &std::path::Path, into: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files(&path, into);
        } else {
            into.push(path);
        }
    }
}

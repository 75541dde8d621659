//! pkg-restore - package-restore coordination cache
//!
//! Tracks which external packages an embedding host has requested,
//! deduplicates and version-checks those requests, drives an external
//! dependency-resolution engine to materialize them on disk, and caches the
//! resolved results (assembly file locations, native-probing directories) so
//! that repeated requests for an already-resolved package are free and
//! idempotent.
//!
//! The resolution engine itself is an external collaborator behind the
//! [`DependencyResolver`] trait; this crate owns the request/resolution state
//! machine, the delta computation, and the merge discipline.
//!
//! ```
//! use std::sync::Arc;
//! use pkg_restore::{DependencyResolver, ErrorReport, ResolveOutcome, ResolveRequest,
//!                   RestoreCoordinator};
//!
//! struct NoopResolver;
//!
//! impl DependencyResolver for NoopResolver {
//!     fn resolve(&self, _: &ResolveRequest, _: &(dyn Fn(ErrorReport) + Sync)) -> ResolveOutcome {
//!         ResolveOutcome { success: true, ..ResolveOutcome::default() }
//!     }
//! }
//!
//! let coordinator = RestoreCoordinator::new(Arc::new(NoopResolver));
//! coordinator.add_restore_source("https://api.nuget.org/v3/index.json");
//!
//! let reference = coordinator
//!     .get_or_add_package_reference("FSharp.Data", Some("3.3.3"))
//!     .expect("first request for a package never conflicts");
//! assert_eq!(reference.name(), "FSharp.Data");
//! ```

pub mod coordinator;
pub mod directive;
pub mod error;
pub mod notifier;
pub mod reference;
pub mod resolver;
pub mod rooted;

pub use coordinator::{RestoreCoordinator, RestoreResult};
pub use directive::Directive;
pub use error::{Result, RestoreError};
pub use notifier::{ModuleLoadEvent, ModuleLoadObserver};
pub use reference::{PackageReference, ResolvedPackageReference};
pub use resolver::{
    DependencyResolver, ErrorReport, NUGET_PROVIDER_KEY, RESTORE_TARGET_FRAMEWORK, ResolveOutcome,
    ResolveRequest, ResolverRegistry,
};

//! Error types for pkg-restore
//!
//! Uses `thiserror` for error definitions and `miette` for pretty
//! diagnostics.
//!
//! Only deployment-level misconfiguration is an error here: version
//! conflicts and resolution failures are reported as data (an absent
//! reference, a failed [`RestoreResult`](crate::RestoreResult)) so calling
//! code can present them to an end user.

use miette::Diagnostic;
use thiserror::Error;

/// Fatal errors raised by the restore coordinator.
#[derive(Error, Diagnostic, Debug)]
pub enum RestoreError {
    #[error("Unable to locate the '{key}' dependency resolver")]
    #[diagnostic(
        code(pkg_restore::resolver::unavailable),
        help(
            "The resolver provider is expected to ship with the host deployment. Reinstall the host to restore it."
        )
    )]
    ResolverUnavailable { key: String },

    #[error("Restore coordinator has been disposed")]
    #[diagnostic(
        code(pkg_restore::coordinator::disposed),
        help("Create a new coordinator; a disposed one can no longer restore packages")
    )]
    Disposed,

    #[error("Dependency resolver teardown failed: {message}")]
    #[diagnostic(code(pkg_restore::resolver::teardown_failed))]
    ResolverTeardown { message: String },
}

/// Construct a [`RestoreError::ResolverUnavailable`] for a provider key.
pub fn resolver_unavailable(key: impl Into<String>) -> RestoreError {
    RestoreError::ResolverUnavailable { key: key.into() }
}

/// Construct a [`RestoreError::ResolverTeardown`] carrying a reason.
pub fn resolver_teardown(message: impl Into<String>) -> RestoreError {
    RestoreError::ResolverTeardown {
        message: message.into(),
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, RestoreError>;

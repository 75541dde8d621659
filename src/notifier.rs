//! Module-load diagnostics
//!
//! The host's loader tells the coordinator about modules it has loaded,
//! purely for diagnostic logging. The observer is an injected hook rather
//! than a subscription to ambient process-wide state: the coordinator hands
//! out a handle, the host invokes it, and disposal of the coordinator makes
//! the handle inert. Nothing here touches resolution state or raises errors
//! back into the host.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A module the host finished loading.
#[derive(Debug, Clone)]
pub struct ModuleLoadEvent {
    /// On-disk location, when the module has one.
    pub location: Option<PathBuf>,
    /// Dynamically generated modules carry no useful location.
    pub is_dynamic: bool,
}

impl ModuleLoadEvent {
    pub fn from_disk(location: impl Into<PathBuf>) -> Self {
        Self {
            location: Some(location.into()),
            is_dynamic: false,
        }
    }

    pub fn dynamic() -> Self {
        Self {
            location: None,
            is_dynamic: true,
        }
    }
}

/// Passive observer handed to the host's module loader.
///
/// Cheap to clone; all clones share the attachment flag owned by the
/// coordinator that created them.
#[derive(Debug, Clone)]
pub struct ModuleLoadObserver {
    attached: Arc<AtomicBool>,
}

impl ModuleLoadObserver {
    pub(crate) fn new(attached: Arc<AtomicBool>) -> Self {
        Self { attached }
    }

    /// Record a load event. Never fails; dynamic and locationless loads are
    /// ignored, and a detached observer ignores everything.
    pub fn notify(&self, event: &ModuleLoadEvent) {
        if !self.attached.load(Ordering::Acquire) || event.is_dynamic {
            return;
        }
        let Some(location) = &event.location else {
            return;
        };
        if location.as_os_str().is_empty() {
            return;
        }
        tracing::info!(location = %location.display(), "module loaded");
    }

    /// False once the owning coordinator has been disposed.
    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::Acquire)
    }
}

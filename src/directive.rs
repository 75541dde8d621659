//! Resolver directive lines
//!
//! The external resolver consumes a flat, ordered list of textual
//! directives: one `RestoreSources=` line per package feed, then one
//! `Include=` line per requested package. Already-resolved packages are
//! still included - the resolver needs the complete desired graph to
//! produce a consistent resolution.

use std::fmt;
use std::sync::Arc;

use crate::reference::PackageReference;

/// One textual instruction for the dependency resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// An additional package feed to consult.
    RestoreSource(String),
    /// One desired package. An unconstrained request renders with an empty
    /// version field.
    Include { name: String, version: String },
}

impl Directive {
    pub fn include(reference: &PackageReference) -> Self {
        Directive::Include {
            name: reference.name().to_string(),
            version: reference.version().unwrap_or_default().to_string(),
        }
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::RestoreSource(uri) => write!(f, "RestoreSources={uri}"),
            Directive::Include { name, version } => {
                write!(f, "Include={name}, Version={version}")
            }
        }
    }
}

/// Render the full directive set for one resolver invocation.
pub fn directive_lines(sources: &[String], requests: &[Arc<PackageReference>]) -> Vec<String> {
    let mut lines = Vec::with_capacity(sources.len() + requests.len());
    for source in sources {
        lines.push(Directive::RestoreSource(source.clone()).to_string());
    }
    for request in requests {
        lines.push(Directive::include(request).to_string());
    }
    lines
}

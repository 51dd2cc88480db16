//! Resolution of symbolic paths against the root namespace.

use tracing::trace;

use crate::protocol::SymbolicPath;
use crate::value::HostValue;

const RESOLVE_TARGET: &str = concat!(env!("CARGO_CRATE_NAME"), "::resolve");

/// Value found at a path together with the object it was reached through.
#[derive(Debug, Clone)]
pub struct ResolvedTarget {
    /// Value at the full path; `Absent` when any step was missing.
    pub candidate: HostValue,
    /// Value at the path minus its last segment; the receiver for any
    /// invocation of `candidate`.
    pub parent: HostValue,
}

/// Walks symbolic paths from an explicitly supplied root namespace.
///
/// Resolution has no side effects and never fails: a missing step produces
/// `Absent`, never an error.
#[derive(Debug, Clone)]
pub struct Resolver {
    root: HostValue,
}

impl Resolver {
    /// Creates a resolver over `root`.
    #[must_use]
    pub const fn new(root: HostValue) -> Self {
        Self { root }
    }

    /// Returns the root namespace.
    #[must_use]
    pub const fn root(&self) -> &HostValue {
        &self.root
    }

    /// Resolves `path` into its candidate and receiver.
    #[must_use]
    pub fn resolve(&self, path: &SymbolicPath) -> ResolvedTarget {
        let parent = self.resolve_segments(path.parent());
        let candidate = parent.property(path.last());
        trace!(
            target: RESOLVE_TARGET,
            cmd = %path,
            candidate = ?candidate,
            "resolved path"
        );
        ResolvedTarget { candidate, parent }
    }

    /// Resolves a segment sequence; the empty sequence yields the root.
    #[must_use]
    pub fn resolve_segments(&self, segments: &[String]) -> HostValue {
        let mut current = self.root.clone();
        for segment in segments {
            if current.is_absent() {
                return HostValue::Absent;
            }
            current = current.property(segment);
        }
        current
    }
}

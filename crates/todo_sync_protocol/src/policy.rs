//! Merge policy for records present both locally and remotely.
//!
//! Reconciliation is additive: remote-only records are imported and nothing
//! else changes. When an id exists on both sides the policy below decides
//! which copy survives. There is exactly one policy today. Field-level or
//! timestamp-based resolution would be a new variant, chosen explicitly.

use crate::model::Identified;

/// Outcome of resolving one id collision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Keep the local record untouched.
    KeepLocal,
}

/// Policy applied when the same id exists locally and remotely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// The local copy always wins; remote fields are never copied over it.
    LocalWins,
}

/// The policy used by the reconciler.
pub const MERGE_POLICY: MergePolicy = MergePolicy::LocalWins;

impl MergePolicy {
    /// Resolves a collision between a local and a remote record with the same id.
    pub fn resolve<T: Identified>(&self, local: &T, remote: &T) -> Resolution {
        debug_assert_eq!(local.id(), remote.id());
        match self {
            MergePolicy::LocalWins => Resolution::KeepLocal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TodoList;

    #[test]
    fn local_wins_keeps_local() {
        let local = TodoList::new(1, "Local", "");
        let remote = TodoList::new(1, "Remote", "edited elsewhere");
        assert_eq!(MERGE_POLICY.resolve(&local, &remote), Resolution::KeepLocal);
    }
}

//! Process-wide "already reported" set keyed by call-context fingerprint.
//!
//! Backed by a sharded concurrent set: insertion of a given key is
//! serialized on its shard, so exactly one caller observes the
//! absent-to-present transition. Entries never expire; only [`DedupCache::clear`]
//! removes them.

use dashmap::DashSet;

use crate::stack::CallContextFingerprint;

/// Concurrent seen-set of fingerprints
#[derive(Debug, Default)]
pub struct DedupCache {
    seen: DashSet<CallContextFingerprint>,
}

impl DedupCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true only for the caller that inserted `fingerprint`
    pub fn mark_if_absent(&self, fingerprint: CallContextFingerprint) -> bool {
        self.seen.insert(fingerprint)
    }

    pub fn contains(&self, fingerprint: &CallContextFingerprint) -> bool {
        self.seen.contains(fingerprint)
    }

    /// Forget every fingerprint
    pub fn clear(&self) {
        self.seen.clear();
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

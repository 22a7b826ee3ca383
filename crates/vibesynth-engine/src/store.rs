//! In-memory artifact staging.
//!
//! The [`ArtifactStore`] is the toolchain's abstraction of a virtual
//! filesystem: source text goes in, compiled binaries come out, and nothing
//! ever touches persistent storage. Each compiler invocation gets its own
//! store, but the store itself is internally synchronized because a
//! toolchain may emit output artifacts from parallel workers.

use std::collections::HashMap;
use std::sync::RwLock;

use vibesynth_types::ArtifactSet;

/// In-memory map from unit name to source text (input) and compiled
/// binary (output).
///
/// All operations are infallible: requesting a unit that was never written
/// is a caller error and simply yields `None`. Lock poisoning is recovered
/// by adopting the inner state; the store holds plain maps, so a panicking
/// writer cannot leave them logically inconsistent.
#[derive(Debug, Default)]
pub struct ArtifactStore {
    sources: RwLock<HashMap<String, String>>,
    binaries: RwLock<HashMap<String, Vec<u8>>>,
}

impl ArtifactStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage source text for a unit.
    pub fn put_source(&self, unit_name: impl Into<String>, text: impl Into<String>) {
        let mut sources = self.sources.write().unwrap_or_else(|e| e.into_inner());
        sources.insert(unit_name.into(), text.into());
    }

    /// Staged source text for a unit, if any.
    pub fn source(&self, unit_name: &str) -> Option<String> {
        let sources = self.sources.read().unwrap_or_else(|e| e.into_inner());
        sources.get(unit_name).cloned()
    }

    /// Record a compiled binary for a unit. Safe to call from parallel
    /// toolchain output callbacks.
    pub fn put_binary(&self, unit_name: impl Into<String>, bytes: Vec<u8>) {
        let mut binaries = self.binaries.write().unwrap_or_else(|e| e.into_inner());
        binaries.insert(unit_name.into(), bytes);
    }

    /// Number of binaries recorded so far.
    pub fn binary_count(&self) -> usize {
        let binaries = self.binaries.read().unwrap_or_else(|e| e.into_inner());
        binaries.len()
    }

    /// Owned snapshot of every recorded binary. Later writes to the store
    /// do not affect a snapshot already taken.
    pub fn snapshot_binaries(&self) -> ArtifactSet {
        let binaries = self.binaries.read().unwrap_or_else(|e| e.into_inner());
        binaries
            .iter()
            .map(|(name, bytes)| (name.clone(), bytes.clone()))
            .collect()
    }
}

//! Units flowing through the synthesis pipeline.
//!
//! A [`GeneratedFragment`] is the raw, untrusted text returned by the
//! generation collaborator for one method. The assembler folds fragments
//! into one [`CompilationUnit`]; a successful compile yields an
//! [`ArtifactSet`] of opaque binaries keyed by unit name.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Generated fragment ─────────────────────────────────────────────────

/// Raw generated text for one contract method.
///
/// Untrusted and unvalidated; it may or may not already carry the
/// visibility qualifier the assembled unit needs. Discarded after
/// assembly.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeneratedFragment {
    /// Name of the contract method this fragment implements.
    pub method_name: String,
    /// The generated text, verbatim.
    pub text: String,
    /// When the fragment was produced.
    pub generated_at: DateTime<Utc>,
}

impl GeneratedFragment {
    /// Wrap freshly generated text.
    pub fn new(method_name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            method_name: method_name.into(),
            text: text.into(),
            generated_at: Utc::now(),
        }
    }
}

// ── Compilation unit ───────────────────────────────────────────────────

/// One compilable source unit: a qualified unit name plus source text.
///
/// Produced once per synthesis attempt and consumed exactly once by the
/// compiler invocation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilationUnit {
    /// Fully qualified unit name.
    pub unit_name: String,
    /// Complete source text.
    pub source_text: String,
}

impl CompilationUnit {
    /// Create a unit.
    pub fn new(unit_name: impl Into<String>, source_text: impl Into<String>) -> Self {
        Self {
            unit_name: unit_name.into(),
            source_text: source_text.into(),
        }
    }
}

// ── Artifact set ───────────────────────────────────────────────────────

/// Mapping from unit name to its opaque compiled binary.
///
/// Produced atomically by one successful compiler invocation; either the
/// whole set exists or none of it does. Iteration order is deterministic
/// (name order) but the linker must not rely on it being topological.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSet {
    units: BTreeMap<String, Vec<u8>>,
}

impl ArtifactSet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a binary for a unit name, replacing any previous entry.
    pub fn insert(&mut self, unit_name: impl Into<String>, binary: Vec<u8>) {
        self.units.insert(unit_name.into(), binary);
    }

    /// Binary for a unit, if present.
    pub fn get(&self, unit_name: &str) -> Option<&[u8]> {
        self.units.get(unit_name).map(|b| b.as_slice())
    }

    /// Whether a unit is present.
    pub fn contains(&self, unit_name: &str) -> bool {
        self.units.contains_key(unit_name)
    }

    /// Number of units.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Unit names in name order.
    pub fn unit_names(&self) -> impl Iterator<Item = &str> {
        self.units.keys().map(|k| k.as_str())
    }

    /// Iterate (name, binary) pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.units.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

impl FromIterator<(String, Vec<u8>)> for ArtifactSet {
    fn from_iter<I: IntoIterator<Item = (String, Vec<u8>)>>(iter: I) -> Self {
        Self {
            units: iter.into_iter().collect(),
        }
    }
}

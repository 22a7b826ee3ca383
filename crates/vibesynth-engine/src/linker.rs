//! Dynamic linking of compiled artifact sets.
//!
//! Artifacts are not necessarily topologically ordered, so the linker runs
//! an iterative fixpoint: repeated passes over the unresolved entries,
//! defining what it can, retrying entries whose dependencies were not yet
//! defined, and stopping when everything is resolved or a full pass makes
//! no progress. Lookup always precedes define, which is what makes repeat
//! and concurrent synthesis of the same contract safe.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, trace};
use vibesynth_types::ArtifactSet;

use crate::error::{SynthesisError, SynthesisResult};
use crate::runtime::{DefineError, LinkRuntime, LinkedUnit};

// ── Link context ───────────────────────────────────────────────────────

/// How the context relates to the rest of the process.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkMode {
    /// A fresh context: new units are invisible to the rest of the
    /// process except via the returned instance.
    Isolated,
    /// The context the contract type itself lives in. Required when the
    /// contract is not universally visible and the implementation must be
    /// assignment-compatible with it across context boundaries.
    AnchorShared,
}

/// The execution context into which artifacts are defined.
///
/// The mode is caller-supplied policy; the runtime handle embodies the
/// actual namespace. Cloning shares the underlying context.
#[derive(Clone)]
pub struct LinkContext {
    mode: LinkMode,
    runtime: Arc<dyn LinkRuntime>,
}

impl LinkContext {
    /// A fresh, isolated context.
    pub fn isolated(runtime: Arc<dyn LinkRuntime>) -> Self {
        Self {
            mode: LinkMode::Isolated,
            runtime,
        }
    }

    /// The context anchored to the contract type's own runtime.
    pub fn anchor_shared(runtime: Arc<dyn LinkRuntime>) -> Self {
        Self {
            mode: LinkMode::AnchorShared,
            runtime,
        }
    }

    /// Context mode.
    pub fn mode(&self) -> LinkMode {
        self.mode
    }

    /// The underlying runtime namespace.
    pub fn runtime(&self) -> &Arc<dyn LinkRuntime> {
        &self.runtime
    }
}

impl std::fmt::Debug for LinkContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkContext").field("mode", &self.mode).finish()
    }
}

// ── Linker ─────────────────────────────────────────────────────────────

/// Defines an artifact set into a link context and resolves the main unit.
#[derive(Debug, Default)]
pub struct DynamicLinker;

impl DynamicLinker {
    /// Link every artifact into the context and return the main unit.
    ///
    /// Fixpoint passes are bounded by the artifact count: every productive
    /// pass resolves at least one entry, and an unproductive pass
    /// terminates the loop. A stalled set (circular or missing
    /// dependencies) is `LinkFailed` even when the main unit itself
    /// resolved, since a partially linked set must never escape.
    ///
    /// A main unit absent from the artifact set resolves by context lookup
    /// when it is already visible from an earlier call, keeping repeat
    /// synthesis idempotent and cheap; when it is not visible either, the
    /// call fails rather than guessing.
    pub fn link(
        artifacts: &ArtifactSet,
        context: &LinkContext,
        main_unit: &str,
    ) -> SynthesisResult<LinkedUnit> {
        let total = artifacts.len();
        let mut resolved: HashMap<String, LinkedUnit> = HashMap::new();

        for pass in 0..total {
            if resolved.len() == total {
                break;
            }
            let mut progressed = false;
            for (name, binary) in artifacts.iter() {
                if resolved.contains_key(name) {
                    continue;
                }
                // Already visible (from a prior call, or a racing caller):
                // resolve by lookup, never redefine.
                if let Some(existing) = context.runtime().lookup(name) {
                    trace!(unit = name, pass, "resolved by lookup");
                    resolved.insert(name.to_string(), existing);
                    progressed = true;
                    continue;
                }
                match context.runtime().define(name, binary) {
                    Ok(unit) => {
                        trace!(unit = name, pass, "defined");
                        resolved.insert(name.to_string(), unit);
                        progressed = true;
                    }
                    Err(DefineError::MissingDependency(dep)) => {
                        // Normal: another entry of this set defines it on a
                        // later pass.
                        trace!(unit = name, dependency = %dep, pass, "deferred");
                    }
                    Err(DefineError::AlreadyDefined) => {
                        // Lost a define race after our lookup; first define
                        // wins, we resolve the winner.
                        match context.runtime().lookup(name) {
                            Some(existing) => {
                                resolved.insert(name.to_string(), existing);
                                progressed = true;
                            }
                            None => {
                                return Err(SynthesisError::LinkFailed(format!(
                                    "unit '{}' reported as already defined but not resolvable",
                                    name
                                )));
                            }
                        }
                    }
                    Err(DefineError::Rejected(reason)) => {
                        return Err(SynthesisError::LinkFailed(format!(
                            "unit '{}' rejected by runtime: {}",
                            name, reason
                        )));
                    }
                }
            }
            if !progressed {
                break;
            }
        }

        if resolved.len() < total {
            let unresolved: Vec<_> = artifacts
                .unit_names()
                .filter(|n| !resolved.contains_key(*n))
                .collect();
            return Err(SynthesisError::LinkFailed(format!(
                "circular or missing dependency among units: {}",
                unresolved.join(", ")
            )));
        }

        debug!(units = total, main = main_unit, "artifact set linked");

        if let Some(unit) = resolved.remove(main_unit) {
            return Ok(unit);
        }
        // Main unit was not part of this set; accept it only if it is
        // independently visible from an earlier call.
        match context.runtime().lookup(main_unit) {
            Some(unit) => Ok(unit),
            None => Err(SynthesisError::LinkFailed(format!(
                "main unit '{}' was neither produced by this compilation nor visible in the link context",
                main_unit
            ))),
        }
    }
}

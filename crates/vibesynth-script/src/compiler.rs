//! The script toolchain.
//!
//! Implements the engine's [`Toolchain`] boundary for the script
//! language: parses the staged source, runs name resolution, and emits
//! one encoded [`CompiledUnit`] binary per unit block. Every diagnostic
//! is collected; the invoker decides success or failure from the full
//! list, and discards any emitted binaries on failure.

use std::collections::{BTreeSet, HashSet};

use tracing::debug;

use vibesynth_engine::{ArtifactStore, CompileOptions, Toolchain};
use vibesynth_types::{CompilationUnit, Diagnostic};

use crate::ir::{CompiledMethod, CompiledUnit, LANGUAGE_VERSION};
use crate::syntax::{parse, UnitDecl};

/// In-memory compiler for the script language.
#[derive(Debug, Default)]
pub struct ScriptToolchain;

impl ScriptToolchain {
    /// Create a toolchain service.
    pub fn new() -> Self {
        Self
    }

    /// Semantic checks for one parsed unit; returns diagnostics.
    fn check_unit(unit: &UnitDecl) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        let mut seen = HashSet::new();
        for method in &unit.methods {
            if !seen.insert(method.name.as_str()) {
                diagnostics.push(
                    Diagnostic::error(
                        &unit.name,
                        format!("duplicate method '{}'", method.name),
                    )
                    .at(method.line, 1),
                );
            }
            let mut used = BTreeSet::new();
            method.body.collect_params(&mut used);
            for param in used {
                if !method.params.contains(&param) {
                    diagnostics.push(
                        Diagnostic::error(
                            &unit.name,
                            format!(
                                "unknown identifier '{}' in method '{}'",
                                param, method.name
                            ),
                        )
                        .at(method.line, 1),
                    );
                }
            }
        }
        diagnostics
    }

    fn lower(unit: &UnitDecl) -> CompiledUnit {
        CompiledUnit::new(
            unit.name.clone(),
            unit.implements.clone(),
            unit.methods
                .iter()
                .map(|m| CompiledMethod {
                    name: m.name.clone(),
                    params: m.params.clone(),
                    body: m.body.clone(),
                })
                .collect(),
        )
    }
}

impl Toolchain for ScriptToolchain {
    fn compile(
        &self,
        unit: &CompilationUnit,
        options: &CompileOptions,
        out: &ArtifactStore,
    ) -> Vec<Diagnostic> {
        if options.language_version != LANGUAGE_VERSION {
            return vec![Diagnostic::error(
                &unit.unit_name,
                format!(
                    "unsupported language version '{}' (this toolchain accepts '{}')",
                    options.language_version, LANGUAGE_VERSION
                ),
            )];
        }

        let source = out
            .source(&unit.unit_name)
            .unwrap_or_else(|| unit.source_text.clone());

        let outcome = parse(&source);
        let mut diagnostics: Vec<Diagnostic> = outcome
            .errors
            .iter()
            .map(|e| Diagnostic::error(&unit.unit_name, e.message.clone()).at(e.line, e.col))
            .collect();

        for decl in &outcome.units {
            diagnostics.extend(Self::check_unit(decl));
            // Binaries are emitted even when other units in this source
            // failed; the invoker enforces all-or-nothing from the
            // diagnostic list.
            let compiled = Self::lower(decl);
            out.put_binary(decl.name.clone(), compiled.encode());
        }

        debug!(
            unit = %unit.unit_name,
            emitted = outcome.units.len(),
            diagnostics = diagnostics.len(),
            "script compilation finished"
        );
        diagnostics
    }

    fn name(&self) -> &str {
        "script-toolchain"
    }
}

//! Toolchain boundary and compiler invocation.
//!
//! The engine's only outbound contract with the platform compiler: unit
//! name and source text in, binary artifacts or diagnostics out. No
//! filesystem paths are exchanged. The [`Toolchain`] is a stateless service
//! passed in explicitly so tests can substitute a fake.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use vibesynth_types::{ArtifactSet, CompilationUnit, Diagnostic};

use crate::error::{SynthesisError, SynthesisResult};
use crate::store::ArtifactStore;

// ── Options ────────────────────────────────────────────────────────────

/// Options passed through to the toolchain.
///
/// Pins the generated source to the invoking process's own language level
/// and search path, so generated code may reference the same units as the
/// host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileOptions {
    /// Language version the toolchain must accept.
    pub language_version: String,
    /// Additional unit search paths (the classpath analog).
    pub unit_paths: Vec<String>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            language_version: "1".into(),
            unit_paths: vec![],
        }
    }
}

// ── Toolchain trait ────────────────────────────────────────────────────

/// A platform compiler toolchain.
///
/// Implementations parse and compile the staged source, write every
/// produced binary to the store (possibly from parallel workers), and
/// return every diagnostic they produced. They never partially report:
/// the invoker decides success or failure from the full diagnostic list.
pub trait Toolchain: Send + Sync {
    /// Compile one unit's source, writing output binaries to `out`.
    fn compile(
        &self,
        unit: &CompilationUnit,
        options: &CompileOptions,
        out: &ArtifactStore,
    ) -> Vec<Diagnostic>;

    /// Name of this toolchain for logging.
    fn name(&self) -> &str;
}

// ── Invoker ────────────────────────────────────────────────────────────

/// Wraps a [`Toolchain`] with the engine's invocation contract:
/// synchronous, one isolated [`ArtifactStore`] per call, all-or-nothing
/// output.
pub struct CompilerInvoker {
    toolchain: Arc<dyn Toolchain>,
}

impl CompilerInvoker {
    /// Create an invoker around a toolchain service.
    pub fn new(toolchain: Arc<dyn Toolchain>) -> Self {
        Self { toolchain }
    }

    /// Compile a unit.
    ///
    /// Blocks until the toolchain finishes. If any error-level diagnostic
    /// was reported, the call fails with the complete diagnostic list and
    /// no artifact set is returned, even if the toolchain emitted some
    /// binaries before failing. Safe to call repeatedly and concurrently;
    /// every call stages into its own store.
    pub fn invoke(
        &self,
        unit: &CompilationUnit,
        options: &CompileOptions,
    ) -> SynthesisResult<ArtifactSet> {
        let store = ArtifactStore::new();
        store.put_source(unit.unit_name.clone(), unit.source_text.clone());

        debug!(
            toolchain = self.toolchain.name(),
            unit = %unit.unit_name,
            "invoking toolchain"
        );
        let diagnostics = self.toolchain.compile(unit, options, &store);

        if diagnostics.iter().any(Diagnostic::is_error) {
            debug!(
                unit = %unit.unit_name,
                count = diagnostics.len(),
                "compilation failed"
            );
            return Err(SynthesisError::CompilationFailed {
                unit_name: unit.unit_name.clone(),
                diagnostics,
            });
        }

        Ok(store.snapshot_binaries())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vibesynth_types::Severity;

    /// Emits one binary per `emit` entry, then reports the configured
    /// diagnostics.
    struct FakeToolchain {
        emit: Vec<&'static str>,
        diagnostics: Vec<Diagnostic>,
    }

    impl Toolchain for FakeToolchain {
        fn compile(
            &self,
            unit: &CompilationUnit,
            _options: &CompileOptions,
            out: &ArtifactStore,
        ) -> Vec<Diagnostic> {
            assert!(out.source(&unit.unit_name).is_some(), "source staged");
            for name in &self.emit {
                out.put_binary(name.to_string(), vec![0xAB]);
            }
            self.diagnostics.clone()
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    fn unit() -> CompilationUnit {
        CompilationUnit::new("demo.GreetingImpl", "unit demo.GreetingImpl {}")
    }

    #[test]
    fn success_returns_snapshot() {
        let invoker = CompilerInvoker::new(Arc::new(FakeToolchain {
            emit: vec!["demo.GreetingImpl"],
            diagnostics: vec![],
        }));
        let artifacts = invoker.invoke(&unit(), &CompileOptions::default()).unwrap();
        assert_eq!(artifacts.len(), 1);
        assert!(artifacts.contains("demo.GreetingImpl"));
    }

    #[test]
    fn warnings_do_not_fail_the_call() {
        let invoker = CompilerInvoker::new(Arc::new(FakeToolchain {
            emit: vec!["demo.GreetingImpl"],
            diagnostics: vec![Diagnostic::warning("demo.GreetingImpl", "unused parameter")],
        }));
        assert!(invoker.invoke(&unit(), &CompileOptions::default()).is_ok());
    }

    #[test]
    fn error_diagnostic_fails_even_when_binaries_were_emitted() {
        let invoker = CompilerInvoker::new(Arc::new(FakeToolchain {
            emit: vec!["demo.GreetingImpl", "demo.Helper"],
            diagnostics: vec![
                Diagnostic::warning("demo.GreetingImpl", "unused parameter"),
                Diagnostic::error("demo.GreetingImpl", "unexpected token").at(3, 1),
            ],
        }));
        let err = invoker
            .invoke(&unit(), &CompileOptions::default())
            .unwrap_err();
        match err {
            SynthesisError::CompilationFailed {
                unit_name,
                diagnostics,
            } => {
                assert_eq!(unit_name, "demo.GreetingImpl");
                assert_eq!(diagnostics.len(), 2);
                assert_eq!(diagnostics[0].severity, Severity::Warning);
                assert_eq!(diagnostics[1].severity, Severity::Error);
            }
            other => panic!("expected CompilationFailed, got {:?}", other),
        }
    }

    #[test]
    fn each_invocation_gets_a_fresh_store() {
        let invoker = CompilerInvoker::new(Arc::new(FakeToolchain {
            emit: vec!["demo.GreetingImpl"],
            diagnostics: vec![],
        }));
        let first = invoker.invoke(&unit(), &CompileOptions::default()).unwrap();
        let second = invoker.invoke(&unit(), &CompileOptions::default()).unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
    }
}

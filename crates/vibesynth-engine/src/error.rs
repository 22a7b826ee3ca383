//! Synthesis error taxonomy.
//!
//! Every failure aborts the current `synthesize` call entirely; no partial
//! instance or partially linked artifact ever reaches the caller.
//! Diagnostics are carried verbatim so callers can inspect exactly what the
//! toolchain rejected.

use thiserror::Error;
use vibesynth_types::Diagnostic;

/// Errors that can occur during a synthesis call.
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// Malformed or empty contract metadata. Raised before any external
    /// call; not retryable without fixing the contract.
    #[error("invalid contract: {0}")]
    ContractInvalid(String),

    /// The generation collaborator failed or returned unusable text.
    /// Retryable by re-invoking `synthesize`.
    #[error("generation failed: {0}")]
    GenerationFailed(String),

    /// The toolchain reported at least one error-level diagnostic.
    /// Deterministic for a given source text; retrying without new
    /// generated source fails again.
    #[error("compilation of '{unit_name}' failed with {} diagnostic(s): {}", diagnostics.len(), render_diagnostics(diagnostics))]
    CompilationFailed {
        /// The unit handed to the compiler.
        unit_name: String,
        /// Every diagnostic the toolchain produced, verbatim.
        diagnostics: Vec<Diagnostic>,
    },

    /// Circular or missing dependency, binary corruption, or any other
    /// fatal define failure. Not silently retried.
    #[error("link failed: {0}")]
    LinkFailed(String),

    /// The main unit linked but zero-argument construction failed.
    #[error("instantiation of '{unit_name}' failed: {reason}")]
    InstantiationFailed {
        /// The unit being instantiated.
        unit_name: String,
        /// Runtime-reported reason.
        reason: String,
    },
}

/// Result type for synthesis operations.
pub type SynthesisResult<T> = Result<T, SynthesisError>;

fn render_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

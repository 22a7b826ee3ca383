//! Compiler diagnostics.
//!
//! Diagnostics are produced only by toolchain invocations, collected into a
//! list, and surfaced verbatim on failure. The engine never summarizes or
//! rewrites them.

use serde::{Deserialize, Serialize};

// ── Severity ───────────────────────────────────────────────────────────

/// Severity of a single diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    /// Fatal for the whole compilation; no artifact set is usable.
    Error,
    /// Non-fatal; compilation may still succeed.
    Warning,
    /// Informational.
    Note,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Note => write!(f, "note"),
        }
    }
}

// ── Diagnostic ─────────────────────────────────────────────────────────

/// One toolchain diagnostic, attributed to a unit and optionally to a
/// 1-based line:column position within its source text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Diagnostic severity.
    pub severity: Severity,
    /// Toolchain message, verbatim.
    pub message: String,
    /// Unit the diagnostic refers to.
    pub unit_name: String,
    /// Optional (line, column) position, 1-based.
    pub position: Option<(u32, u32)>,
}

impl Diagnostic {
    /// Create an error diagnostic.
    pub fn error(unit_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            unit_name: unit_name.into(),
            position: None,
        }
    }

    /// Create a warning diagnostic.
    pub fn warning(unit_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            unit_name: unit_name.into(),
            position: None,
        }
    }

    /// Attach a 1-based line:column position.
    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.position = Some((line, column));
        self
    }

    /// Whether this diagnostic is error-level.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.position {
            Some((line, col)) => write!(
                f,
                "{}: {} [{}:{}:{}]",
                self.severity, self.message, self.unit_name, line, col
            ),
            None => write!(f, "{}: {} [{}]", self.severity, self.message, self.unit_name),
        }
    }
}

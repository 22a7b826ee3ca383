//! The narrow interface to the host runtime's linkage primitives.
//!
//! Everything runtime-specific sits behind [`LinkRuntime`]: looking up a
//! unit already visible in an execution context, and defining a compiled
//! binary into it. The rest of the engine stays runtime-agnostic.

use std::sync::Arc;

use thiserror::Error;
use vibesynth_types::Value;

// ── Define failures ────────────────────────────────────────────────────

/// Why a define operation failed.
///
/// `MissingDependency` is not fatal: the linker retries it on the next
/// fixpoint pass. `AlreadyDefined` signals a concurrent duplicate define;
/// the linker resolves by lookup instead (first define wins). `Rejected`
/// aborts linking.
#[derive(Debug, Error)]
pub enum DefineError {
    /// The binary references a unit not yet defined in this context.
    #[error("missing dependency '{0}'")]
    MissingDependency(String),

    /// A unit of this name is already defined in this context.
    #[error("unit already defined")]
    AlreadyDefined,

    /// Corrupt binary, verification failure, or a genuinely missing
    /// external dependency. Fatal.
    #[error("binary rejected: {0}")]
    Rejected(String),
}

// ── Invocation surface ─────────────────────────────────────────────────

/// Errors raised when invoking a method on a synthesized instance.
#[derive(Debug, Error)]
pub enum InvokeError {
    /// The instance has no method of this name.
    #[error("unknown method '{0}'")]
    UnknownMethod(String),

    /// Wrong number of arguments.
    #[error("method '{method}' expects {expected} argument(s), got {actual}")]
    ArityMismatch {
        /// Method name.
        method: String,
        /// Declared parameter count.
        expected: usize,
        /// Supplied argument count.
        actual: usize,
    },

    /// Operand or argument types did not match.
    #[error("type error: {0}")]
    TypeError(String),

    /// A cross-unit reference could not be resolved at invocation time.
    #[error("unresolved unit reference '{0}'")]
    UnresolvedReference(String),

    /// Evaluation exceeded the runtime's call-depth bound.
    #[error("call depth limit exceeded")]
    RecursionLimit,
}

/// A live, fully initialized instance of a synthesized unit.
///
/// Invocation is structural: callers name the method and pass dynamic
/// values, which is what makes restricted contracts (no declared
/// conformance) usable across contexts.
pub trait Instance: Send + Sync {
    /// The unit this instance was constructed from.
    fn unit_name(&self) -> &str;

    /// Invoke a contract method.
    fn invoke(&self, method: &str, args: &[Value]) -> Result<Value, InvokeError>;
}

impl std::fmt::Debug for dyn Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("unit_name", &self.unit_name())
            .finish()
    }
}

// ── Linked units ───────────────────────────────────────────────────────

/// A unit resolved into a link context: instantiable, never redefined.
pub trait UnitHandle: Send + Sync {
    /// Qualified unit name.
    fn unit_name(&self) -> &str;

    /// Construct a zero-argument instance.
    fn instantiate(&self) -> Result<Box<dyn Instance>, String>;
}

/// Shared handle to a resolved unit. For a given unit name, at most one
/// LinkedUnit is ever produced per context (define-or-resolve is
/// idempotent).
#[derive(Clone)]
pub struct LinkedUnit {
    handle: Arc<dyn UnitHandle>,
}

impl LinkedUnit {
    /// Wrap a runtime handle.
    pub fn new(handle: Arc<dyn UnitHandle>) -> Self {
        Self { handle }
    }

    /// Qualified unit name.
    pub fn unit_name(&self) -> &str {
        self.handle.unit_name()
    }

    /// Construct a zero-argument instance.
    pub fn instantiate(&self) -> Result<Box<dyn Instance>, String> {
        self.handle.instantiate()
    }
}

impl std::fmt::Debug for LinkedUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkedUnit")
            .field("unit_name", &self.unit_name())
            .finish()
    }
}

// ── Link runtime ───────────────────────────────────────────────────────

/// The host runtime's native module/linkage primitives, behind one narrow
/// interface.
///
/// `define` must be atomic check-then-define: two callers racing to define
/// the same name must never both succeed, and the loser must observe
/// [`DefineError::AlreadyDefined`].
pub trait LinkRuntime: Send + Sync {
    /// Resolve a unit already visible in this context.
    fn lookup(&self, unit_name: &str) -> Option<LinkedUnit>;

    /// Define a compiled binary into this context.
    fn define(&self, unit_name: &str, binary: &[u8]) -> Result<LinkedUnit, DefineError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NamedHandle(&'static str);

    impl UnitHandle for NamedHandle {
        fn unit_name(&self) -> &str {
            self.0
        }

        fn instantiate(&self) -> Result<Box<dyn Instance>, String> {
            Err("not instantiable".into())
        }
    }

    #[test]
    fn linked_unit_exposes_name() {
        let unit = LinkedUnit::new(Arc::new(NamedHandle("demo.GreetingImpl")));
        assert_eq!(unit.unit_name(), "demo.GreetingImpl");
        assert!(format!("{:?}", unit).contains("demo.GreetingImpl"));
    }

    #[test]
    fn linked_unit_clone_shares_handle() {
        let unit = LinkedUnit::new(Arc::new(NamedHandle("demo.A")));
        let clone = unit.clone();
        assert_eq!(unit.unit_name(), clone.unit_name());
    }

    #[test]
    fn define_error_display() {
        assert!(DefineError::MissingDependency("demo.B".into())
            .to_string()
            .contains("demo.B"));
        assert_eq!(DefineError::AlreadyDefined.to_string(), "unit already defined");
        assert!(DefineError::Rejected("truncated".into())
            .to_string()
            .contains("truncated"));
    }

    #[test]
    fn invoke_error_display() {
        let e = InvokeError::ArityMismatch {
            method: "greet".into(),
            expected: 1,
            actual: 2,
        };
        assert!(e.to_string().contains("expects 1 argument(s), got 2"));
        assert!(InvokeError::UnknownMethod("shout".into())
            .to_string()
            .contains("shout"));
    }
}

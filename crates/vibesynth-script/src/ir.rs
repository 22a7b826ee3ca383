//! Compiled representation of script units.
//!
//! A [`CompiledUnit`] is the opaque binary payload the engine's linker
//! moves around: the unit's method table plus the names of every other
//! unit it references. Encoding is serde_json bytes; the linker never
//! looks inside.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Language version this toolchain accepts.
pub const LANGUAGE_VERSION: &str = "1";

/// A method body expression.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// String literal.
    Str(String),
    /// Integer literal.
    Int(i64),
    /// Parameter reference.
    Param(String),
    /// String concatenation or integer addition.
    Add(Box<Expr>, Box<Expr>),
    /// Cross-unit static call.
    Call {
        /// Qualified target unit name.
        unit: String,
        /// Target method name.
        method: String,
        /// Argument expressions.
        args: Vec<Expr>,
    },
}

impl Expr {
    /// Collect every unit name referenced by calls in this expression.
    pub fn collect_references(&self, out: &mut BTreeSet<String>) {
        match self {
            Self::Str(_) | Self::Int(_) | Self::Param(_) => {}
            Self::Add(lhs, rhs) => {
                lhs.collect_references(out);
                rhs.collect_references(out);
            }
            Self::Call { unit, args, .. } => {
                out.insert(unit.clone());
                for arg in args {
                    arg.collect_references(out);
                }
            }
        }
    }

    /// Collect every parameter name referenced in this expression.
    pub fn collect_params(&self, out: &mut BTreeSet<String>) {
        match self {
            Self::Str(_) | Self::Int(_) => {}
            Self::Param(name) => {
                out.insert(name.clone());
            }
            Self::Add(lhs, rhs) => {
                lhs.collect_params(out);
                rhs.collect_params(out);
            }
            Self::Call { args, .. } => {
                for arg in args {
                    arg.collect_params(out);
                }
            }
        }
    }
}

/// One compiled method.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompiledMethod {
    /// Method name.
    pub name: String,
    /// Parameter names in order.
    pub params: Vec<String>,
    /// Body expression.
    pub body: Expr,
}

/// One compiled unit, the binary payload behind an artifact-set entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompiledUnit {
    /// Qualified unit name.
    pub unit_name: String,
    /// Declared conformance, if any.
    pub implements: Option<String>,
    /// Method table.
    pub methods: Vec<CompiledMethod>,
    /// Other units this unit calls into. The runtime refuses to define a
    /// unit until every referenced unit is present, which is what drives
    /// the linker's multi-pass resolution.
    pub references: Vec<String>,
}

impl CompiledUnit {
    /// Build a compiled unit from its parts, deriving `references` from
    /// the method bodies (self-references excluded, so recursion does not
    /// block definition).
    pub fn new(
        unit_name: String,
        implements: Option<String>,
        methods: Vec<CompiledMethod>,
    ) -> Self {
        let mut references = BTreeSet::new();
        for method in &methods {
            method.body.collect_references(&mut references);
        }
        references.remove(&unit_name);
        Self {
            unit_name,
            implements,
            methods,
            references: references.into_iter().collect(),
        }
    }

    /// Find a method by name.
    pub fn method(&self, name: &str) -> Option<&CompiledMethod> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Encode to the opaque binary form.
    pub fn encode(&self) -> Vec<u8> {
        // The payload is plain data; encoding cannot fail.
        serde_json::to_vec(self).unwrap_or_default()
    }

    /// Decode from the opaque binary form.
    pub fn decode(bytes: &[u8]) -> Result<Self, String> {
        serde_json::from_slice(bytes).map_err(|e| format!("malformed unit binary: {}", e))
    }
}

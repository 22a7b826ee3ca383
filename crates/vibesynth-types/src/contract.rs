//! Contract descriptions.
//!
//! A [`Contract`] is the method-signature set a synthesized implementation
//! must satisfy. Contracts are supplied fully formed by the caller (the
//! discovery collaborator performs whatever scanning produced them) and are
//! never mutated by the engine.

use serde::{Deserialize, Serialize};

// ── Visibility ─────────────────────────────────────────────────────────

/// Visibility of the contract type in its defining context.
///
/// Drives whether the assembled unit may declare conformance to the
/// contract: a `Restricted` contract is not nameable from other contexts,
/// so the generated unit omits the conformance clause and callers rely on
/// structural invocation instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractVisibility {
    /// Universally visible; the implementation declares conformance.
    Public,
    /// Visible only inside its defining context.
    Restricted,
}

// ── Method specification ───────────────────────────────────────────────

/// One named parameter of a contract method.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    /// Parameter name.
    pub name: String,
    /// Parameter type, rendered for prompts only.
    pub ty: String,
}

impl ParamSpec {
    /// Convenience constructor.
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
        }
    }
}

/// One method of a contract: a signature plus the natural-language
/// behavior prompt the generator will be asked to implement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodSpec {
    /// Method name.
    pub name: String,
    /// Ordered parameter list.
    pub params: Vec<ParamSpec>,
    /// Return type, rendered for prompts only.
    pub return_type: String,
    /// Natural-language description of the desired behavior. A method
    /// with an empty prompt is not eligible for synthesis.
    pub prompt: String,
}

impl MethodSpec {
    /// Whether this method should be synthesized.
    pub fn is_eligible(&self) -> bool {
        !self.prompt.trim().is_empty()
    }

    /// Render the signature for inclusion in a generation prompt.
    pub fn signature(&self) -> String {
        let params = self
            .params
            .iter()
            .map(|p| format!("{}: {}", p.name, p.ty))
            .collect::<Vec<_>>()
            .join(", ");
        format!("fn {}({}) -> {}", self.name, params, self.return_type)
    }
}

// ── Contract ───────────────────────────────────────────────────────────

/// A named method-signature set an implementation must satisfy.
///
/// Immutable once constructed; the engine only reads it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    /// Declaring package, dot-separated (e.g. `demo.greetings`).
    pub package: String,
    /// Simple name of the contract type.
    pub name: String,
    /// Visibility of the contract type in its defining context.
    pub visibility: ContractVisibility,
    /// Ordered method list.
    pub methods: Vec<MethodSpec>,
}

impl Contract {
    /// Create a public contract.
    pub fn new(
        package: impl Into<String>,
        name: impl Into<String>,
        methods: Vec<MethodSpec>,
    ) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
            visibility: ContractVisibility::Public,
            methods,
        }
    }

    /// Override the visibility.
    pub fn with_visibility(mut self, visibility: ContractVisibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Fully qualified contract name: `package.Name`.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.package, self.name)
    }

    /// Methods eligible for synthesis (non-empty prompt).
    pub fn eligible_methods(&self) -> impl Iterator<Item = &MethodSpec> {
        self.methods.iter().filter(|m| m.is_eligible())
    }
}

// ── Identifier validation ──────────────────────────────────────────────

/// Whether `s` is a valid simple identifier: a letter or underscore
/// followed by letters, digits, or underscores.
pub fn is_valid_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Whether `s` is a valid dot-separated qualified name with at least one
/// segment, every segment a valid identifier.
pub fn is_valid_qualified_name(s: &str) -> bool {
    !s.is_empty() && s.split('.').all(is_valid_identifier)
}

//! Unit assembly.
//!
//! Turns generated method fragments plus the target contract into a single
//! compilable source unit: adds the unit scaffold, repairs missing
//! visibility qualifiers, and nothing else. The engine trusts but does not
//! parse the generated bodies.

use std::collections::HashMap;

use vibesynth_types::{CompilationUnit, Contract, ContractVisibility, GeneratedFragment};

/// Suffix appended to the contract's simple name to form the
/// implementation unit name.
pub const IMPL_SUFFIX: &str = "Impl";

/// Assembles one [`CompilationUnit`] from a contract and its generated
/// fragments. Pure text construction; contract validation happens in the
/// synthesizer before this point.
#[derive(Debug, Default)]
pub struct UnitAssembler;

impl UnitAssembler {
    /// Deterministic implementation unit name for a contract:
    /// `{package}.{name}Impl`. Stable across repeated calls so that
    /// repeated synthesis of the same contract produces a consistently
    /// named unit, which the linker's already-defined check relies on.
    pub fn unit_name_for(contract: &Contract) -> String {
        format!("{}.{}{}", contract.package, contract.name, IMPL_SUFFIX)
    }

    /// Assemble the compilation unit.
    ///
    /// Fragments are emitted in the contract's method order; methods with
    /// no fragment (ineligible or skipped by the caller) are simply
    /// absent. A contract with zero fragments yields an empty-bodied unit,
    /// which is valid.
    pub fn assemble(
        contract: &Contract,
        fragments: &HashMap<String, GeneratedFragment>,
    ) -> CompilationUnit {
        let unit_name = Self::unit_name_for(contract);

        let header = match contract.visibility {
            ContractVisibility::Public => {
                format!("unit {} implements {} {{", unit_name, contract.qualified_name())
            }
            // A restricted contract is not nameable across contexts, so no
            // conformance clause; callers invoke structurally.
            ContractVisibility::Restricted => format!("unit {} {{", unit_name),
        };

        let mut source = String::new();
        source.push_str(&header);
        source.push('\n');
        for method in &contract.methods {
            if let Some(fragment) = fragments.get(&method.name) {
                source.push('\n');
                source.push_str(&Self::repair_visibility(&fragment.text));
                source.push('\n');
            }
        }
        source.push_str("}\n");

        CompilationUnit::new(unit_name, source)
    }

    /// Inject the minimal visibility qualifier when the fragment does not
    /// already declare one. The fragment text is not otherwise altered.
    fn repair_visibility(text: &str) -> String {
        let trimmed = text.trim_start();
        if trimmed.starts_with("pub ") || trimmed.starts_with("pub\t") {
            text.to_string()
        } else {
            format!("pub {}", trimmed)
        }
    }
}

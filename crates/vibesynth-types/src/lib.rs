//! # vibesynth-types
//!
//! Shared data model for the vibesynth runtime method-synthesis engine.
//!
//! Defines the contract description callers hand to the engine, the
//! intermediate artifacts flowing through the synthesis pipeline
//! (fragments, compilation units, diagnostics, binary artifact sets),
//! and the dynamic [`Value`] type used to invoke synthesized instances.
//!
//! Nothing in this crate performs any work; it is pure data, shared by
//! `vibesynth-engine` and every toolchain/runtime backend.

#![deny(unsafe_code)]

pub mod contract;
pub mod diagnostic;
pub mod unit;
pub mod value;

// Re-exports
pub use contract::{Contract, ContractVisibility, MethodSpec, ParamSpec};
pub use diagnostic::{Diagnostic, Severity};
pub use unit::{ArtifactSet, CompilationUnit, GeneratedFragment};
pub use value::Value;

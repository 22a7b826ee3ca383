//! # vibesynth-engine
//!
//! **Compile-and-link engine** for runtime method synthesis.
//!
//! Given a contract (a named method-signature set) and a text-generation
//! collaborator, the engine assembles a compilable unit from the generated
//! method bodies, compiles it entirely in memory through a pluggable
//! [`Toolchain`], and dynamically links the produced artifacts into a
//! caller-supplied [`LinkContext`], returning a live, invocable instance.
//!
//! ## Architecture
//!
//! ```text
//! Contract + Generator
//!     │
//!     ▼
//! Synthesizer
//!     │─── validate contract
//!     │─── generate fragments (Generator trait)
//!     │─── assemble one unit (UnitAssembler)
//!     │─── compile in memory (CompilerInvoker + Toolchain trait,
//!     │                       ArtifactStore staging)
//!     │─── fixpoint link (DynamicLinker + LinkRuntime trait)
//!     ▼
//! Box<dyn Instance> (zero-argument constructed, ready to invoke)
//! ```
//!
//! ## Traits at the seams
//!
//! - [`Generator`]: the text-generation collaborator
//! - [`Toolchain`]: the platform compiler service
//! - [`LinkRuntime`]: the host runtime's native linkage primitives
//!
//! All three are substitutable in tests; `vibesynth-script` ships real
//! in-process implementations of the last two.

#![deny(unsafe_code)]

pub mod assembler;
pub mod error;
pub mod linker;
pub mod runtime;
pub mod store;
pub mod synthesizer;
pub mod toolchain;

// Re-exports
pub use assembler::{UnitAssembler, IMPL_SUFFIX};
pub use error::{SynthesisError, SynthesisResult};
pub use linker::{DynamicLinker, LinkContext, LinkMode};
pub use runtime::{DefineError, Instance, InvokeError, LinkRuntime, LinkedUnit, UnitHandle};
pub use store::ArtifactStore;
pub use synthesizer::{
    Generator, SynthesisId, SynthesisRecord, SynthesisStatus, SynthesisSummary, Synthesizer,
    SynthesizerConfig, PROMPT_PREAMBLE,
};
pub use toolchain::{CompileOptions, CompilerInvoker, Toolchain};

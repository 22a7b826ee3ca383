//! Synthesis façade.
//!
//! Drives the full pipeline for one contract: validate, generate a
//! fragment per eligible method, assemble one compilation unit, compile
//! once, link into the caller's context, and construct a zero-argument
//! instance. Any failure aborts the whole call; nothing partial escapes.
//!
//! The synthesizer also keeps a bounded FIFO of [`SynthesisRecord`]s so
//! operators can inspect recent attempts.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use vibesynth_types::contract::{is_valid_identifier, is_valid_qualified_name};
use vibesynth_types::{Contract, GeneratedFragment};

use crate::assembler::UnitAssembler;
use crate::error::{SynthesisError, SynthesisResult};
use crate::linker::{DynamicLinker, LinkContext};
use crate::runtime::Instance;
use crate::toolchain::{CompileOptions, CompilerInvoker, Toolchain};

// ── Generator collaborator ─────────────────────────────────────────────

/// The text-generation collaborator: prompt in, opaque source text out.
///
/// Possibly slow and possibly unreliable; the engine imposes no timeout
/// (wrap the call externally if you need one) and performs only minimal
/// structural repair on the result.
pub trait Generator: Send + Sync {
    /// Generate source text for one method prompt.
    fn generate(&self, prompt: &str) -> SynthesisResult<String>;
}

impl<F> Generator for F
where
    F: Fn(&str) -> SynthesisResult<String> + Send + Sync,
{
    fn generate(&self, prompt: &str) -> SynthesisResult<String> {
        self(prompt)
    }
}

/// Instruction block prepended to every method prompt.
pub const PROMPT_PREAMBLE: &str = "\
write a single valid method that implements the signature shown. \
do not include an enclosing unit declaration. \
do not include any explanation of the code, markdown delimiters, or anything else: \
the response is piped directly into the compiler.";

// ── Records ────────────────────────────────────────────────────────────

/// Unique identifier for one synthesis attempt.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SynthesisId(pub String);

impl SynthesisId {
    /// Generate a new unique id.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for SynthesisId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SynthesisId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "synthesis:{}", self.0)
    }
}

/// Status of a synthesis attempt.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SynthesisStatus {
    /// Attempt started.
    Pending,
    /// All fragments generated, awaiting compilation.
    Generated,
    /// Compilation passed, awaiting linking.
    Compiled,
    /// Linked and instantiated.
    Linked,
    /// Failed at some step.
    Failed(String),
}

impl SynthesisStatus {
    /// Whether this is a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Linked | Self::Failed(_))
    }
}

/// Record of one synthesis attempt.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SynthesisRecord {
    /// Attempt id.
    pub id: SynthesisId,
    /// Qualified contract name.
    pub contract: String,
    /// Implementation unit name.
    pub unit_name: String,
    /// Current status.
    pub status: SynthesisStatus,
    /// Number of fragments generated.
    pub fragments: usize,
    /// When the attempt started.
    pub started_at: DateTime<Utc>,
    /// When the attempt finished, success or failure.
    pub completed_at: Option<DateTime<Utc>>,
}

impl SynthesisRecord {
    fn new(contract: &Contract) -> Self {
        Self {
            id: SynthesisId::new(),
            contract: contract.qualified_name(),
            unit_name: UnitAssembler::unit_name_for(contract),
            status: SynthesisStatus::Pending,
            fragments: 0,
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    fn mark(&mut self, status: SynthesisStatus) {
        if status.is_terminal() {
            self.completed_at = Some(Utc::now());
        }
        self.status = status;
    }
}

/// Summary statistics over the tracked records.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesisSummary {
    /// Total tracked attempts.
    pub total: usize,
    /// Attempts that linked successfully.
    pub succeeded: usize,
    /// Attempts that failed.
    pub failed: usize,
    /// Total fragments generated across attempts.
    pub total_fragments: usize,
}

// ── Configuration ──────────────────────────────────────────────────────

/// Synthesizer configuration.
#[derive(Clone, Debug)]
pub struct SynthesizerConfig {
    /// Maximum tracked synthesis records (bounded FIFO).
    pub max_tracked_records: usize,
    /// Options handed to every compiler invocation.
    pub compile_options: CompileOptions,
}

impl Default for SynthesizerConfig {
    fn default() -> Self {
        Self {
            max_tracked_records: 256,
            compile_options: CompileOptions::default(),
        }
    }
}

// ── Synthesizer ────────────────────────────────────────────────────────

/// The synthesis façade.
///
/// One synthesizer may serve many concurrent `synthesize` calls; each call
/// owns its own staging state, and the record mutex is never held across
/// the slow generation or compilation steps.
pub struct Synthesizer {
    invoker: CompilerInvoker,
    config: SynthesizerConfig,
    records: Mutex<VecDeque<SynthesisRecord>>,
}

impl Synthesizer {
    /// Create a synthesizer around a toolchain service.
    pub fn new(toolchain: Arc<dyn Toolchain>) -> Self {
        Self {
            invoker: CompilerInvoker::new(toolchain),
            config: SynthesizerConfig::default(),
            records: Mutex::new(VecDeque::new()),
        }
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: SynthesizerConfig) -> Self {
        self.config = config;
        self
    }

    /// Synthesize a live instance of `contract` into `context`.
    ///
    /// Exactly one compilation unit is produced and exactly one compiler
    /// invocation happens per call. On success the returned instance is
    /// fully initialized and every eligible contract method is invocable.
    pub fn synthesize(
        &self,
        contract: &Contract,
        context: &LinkContext,
        generator: &dyn Generator,
    ) -> SynthesisResult<Box<dyn Instance>> {
        let mut record = SynthesisRecord::new(contract);

        match self.synthesize_inner(contract, context, generator, &mut record) {
            Ok(instance) => {
                record.mark(SynthesisStatus::Linked);
                info!(contract = %record.contract, id = %record.id, "synthesis succeeded");
                self.store_record(record);
                Ok(instance)
            }
            Err(err) => {
                record.mark(SynthesisStatus::Failed(err.to_string()));
                warn!(contract = %record.contract, id = %record.id, error = %err, "synthesis failed");
                self.store_record(record);
                Err(err)
            }
        }
    }

    fn synthesize_inner(
        &self,
        contract: &Contract,
        context: &LinkContext,
        generator: &dyn Generator,
        record: &mut SynthesisRecord,
    ) -> SynthesisResult<Box<dyn Instance>> {
        validate_contract(contract)?;

        let mut fragments: HashMap<String, GeneratedFragment> = HashMap::new();
        for method in contract.eligible_methods() {
            let prompt = format!(
                "{}\n\nsignature:\n{}\n\nbehavior:\n{}",
                PROMPT_PREAMBLE,
                method.signature(),
                method.prompt
            );
            debug!(contract = %record.contract, method = %method.name, "requesting generation");
            let text = generator.generate(&prompt)?;
            if text.trim().is_empty() {
                return Err(SynthesisError::GenerationFailed(format!(
                    "generator returned empty text for method '{}'",
                    method.name
                )));
            }
            fragments.insert(method.name.clone(), GeneratedFragment::new(&method.name, text));
        }
        record.fragments = fragments.len();
        record.mark(SynthesisStatus::Generated);

        let unit = UnitAssembler::assemble(contract, &fragments);
        let artifacts = self.invoker.invoke(&unit, &self.config.compile_options)?;
        record.mark(SynthesisStatus::Compiled);

        let linked = DynamicLinker::link(&artifacts, context, &unit.unit_name)?;

        linked
            .instantiate()
            .map_err(|reason| SynthesisError::InstantiationFailed {
                unit_name: unit.unit_name.clone(),
                reason,
            })
    }

    /// Recent synthesis records, oldest first.
    pub fn records(&self) -> Vec<SynthesisRecord> {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        records.iter().cloned().collect()
    }

    /// Summary statistics over the tracked records.
    pub fn summary(&self) -> SynthesisSummary {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        let mut summary = SynthesisSummary {
            total: records.len(),
            ..SynthesisSummary::default()
        };
        for record in records.iter() {
            match &record.status {
                SynthesisStatus::Linked => {
                    summary.succeeded += 1;
                    summary.total_fragments += record.fragments;
                }
                SynthesisStatus::Failed(_) => summary.failed += 1,
                _ => {}
            }
        }
        summary
    }

    /// Store a record with FIFO eviction.
    fn store_record(&self, record: SynthesisRecord) {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        if records.len() >= self.config.max_tracked_records {
            records.pop_front();
        }
        records.push_back(record);
    }
}

// ── Contract validation ────────────────────────────────────────────────

/// Fail fast on malformed contract metadata, before any external call.
fn validate_contract(contract: &Contract) -> SynthesisResult<()> {
    if !is_valid_qualified_name(&contract.package) {
        return Err(SynthesisError::ContractInvalid(format!(
            "package '{}' is not a valid qualified name",
            contract.package
        )));
    }
    if !is_valid_identifier(&contract.name) {
        return Err(SynthesisError::ContractInvalid(format!(
            "contract name '{}' is not a valid identifier",
            contract.name
        )));
    }
    let mut seen = std::collections::HashSet::new();
    for method in &contract.methods {
        if !is_valid_identifier(&method.name) {
            return Err(SynthesisError::ContractInvalid(format!(
                "method name '{}' is not a valid identifier",
                method.name
            )));
        }
        if !seen.insert(method.name.as_str()) {
            return Err(SynthesisError::ContractInvalid(format!(
                "duplicate method name '{}'",
                method.name
            )));
        }
        for param in &method.params {
            if !is_valid_identifier(&param.name) {
                return Err(SynthesisError::ContractInvalid(format!(
                    "parameter name '{}' of method '{}' is not a valid identifier",
                    param.name, method.name
                )));
            }
        }
    }
    Ok(())
}

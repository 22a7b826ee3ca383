//! The script link runtime.
//!
//! Implements the engine's [`LinkRuntime`] boundary: a shared symbol
//! table of defined units. `define` verifies a binary's cross-unit
//! references against the table before admitting it, which is exactly
//! what drives the linker's multi-pass fixpoint; insertion is atomic
//! check-then-define under the table's write lock, so racing duplicate
//! definitions cannot both win.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::trace;

use vibesynth_engine::{DefineError, Instance, InvokeError, LinkRuntime, LinkedUnit, UnitHandle};
use vibesynth_types::Value;

use crate::ir::{CompiledUnit, Expr};

/// Evaluation call-depth bound; generated code can be accidentally
/// self-recursive and must not blow the host stack.
const MAX_CALL_DEPTH: usize = 64;

// ── Runtime ────────────────────────────────────────────────────────────

#[derive(Default)]
struct SymbolTable {
    units: RwLock<HashMap<String, Arc<CompiledUnit>>>,
}

impl SymbolTable {
    fn get(&self, unit_name: &str) -> Option<Arc<CompiledUnit>> {
        let units = self.units.read().unwrap_or_else(|e| e.into_inner());
        units.get(unit_name).cloned()
    }
}

/// One execution context for script units.
///
/// Cloning shares the underlying symbol table: a clone is the same
/// context, which is how an anchor-shared [`LinkContext`] and the
/// invocation path observe one namespace.
///
/// [`LinkContext`]: vibesynth_engine::LinkContext
#[derive(Clone, Default)]
pub struct ScriptRuntime {
    table: Arc<SymbolTable>,
}

impl ScriptRuntime {
    /// A fresh, empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of units defined in this context.
    pub fn defined_count(&self) -> usize {
        let units = self.table.units.read().unwrap_or_else(|e| e.into_inner());
        units.len()
    }

    /// Whether a unit is visible in this context.
    pub fn is_defined(&self, unit_name: &str) -> bool {
        self.table.get(unit_name).is_some()
    }
}

impl LinkRuntime for ScriptRuntime {
    fn lookup(&self, unit_name: &str) -> Option<LinkedUnit> {
        self.table.get(unit_name).map(|unit| {
            LinkedUnit::new(Arc::new(ScriptUnitHandle {
                unit,
                table: Arc::clone(&self.table),
            }))
        })
    }

    fn define(&self, unit_name: &str, binary: &[u8]) -> Result<LinkedUnit, DefineError> {
        let unit = CompiledUnit::decode(binary).map_err(DefineError::Rejected)?;
        if unit.unit_name != unit_name {
            return Err(DefineError::Rejected(format!(
                "binary declares unit '{}' but was defined as '{}'",
                unit.unit_name, unit_name
            )));
        }

        let mut units = self.table.units.write().unwrap_or_else(|e| e.into_inner());
        if units.contains_key(unit_name) {
            return Err(DefineError::AlreadyDefined);
        }
        // Reference verification happens under the same lock as the
        // insert, so a unit can never be admitted against a table that
        // changes underneath it.
        for reference in &unit.references {
            if !units.contains_key(reference) {
                return Err(DefineError::MissingDependency(reference.clone()));
            }
        }
        let unit = Arc::new(unit);
        units.insert(unit_name.to_string(), Arc::clone(&unit));
        trace!(unit = unit_name, "defined script unit");
        Ok(LinkedUnit::new(Arc::new(ScriptUnitHandle {
            unit,
            table: Arc::clone(&self.table),
        })))
    }
}

// ── Unit handles and instances ─────────────────────────────────────────

struct ScriptUnitHandle {
    unit: Arc<CompiledUnit>,
    table: Arc<SymbolTable>,
}

impl UnitHandle for ScriptUnitHandle {
    fn unit_name(&self) -> &str {
        &self.unit.unit_name
    }

    fn instantiate(&self) -> Result<Box<dyn Instance>, String> {
        // Script units are stateless; zero-argument construction cannot
        // fail once the unit is defined.
        Ok(Box::new(ScriptInstance {
            unit: Arc::clone(&self.unit),
            table: Arc::clone(&self.table),
        }))
    }
}

struct ScriptInstance {
    unit: Arc<CompiledUnit>,
    table: Arc<SymbolTable>,
}

impl Instance for ScriptInstance {
    fn unit_name(&self) -> &str {
        &self.unit.unit_name
    }

    fn invoke(&self, method: &str, args: &[Value]) -> Result<Value, InvokeError> {
        invoke_on(&self.unit, method, args, &self.table, 0)
    }
}

// ── Evaluation ─────────────────────────────────────────────────────────

fn invoke_on(
    unit: &CompiledUnit,
    method: &str,
    args: &[Value],
    table: &SymbolTable,
    depth: usize,
) -> Result<Value, InvokeError> {
    if depth >= MAX_CALL_DEPTH {
        return Err(InvokeError::RecursionLimit);
    }
    let method = unit
        .method(method)
        .ok_or_else(|| InvokeError::UnknownMethod(method.to_string()))?;
    if method.params.len() != args.len() {
        return Err(InvokeError::ArityMismatch {
            method: method.name.clone(),
            expected: method.params.len(),
            actual: args.len(),
        });
    }
    let env: HashMap<&str, &Value> = method
        .params
        .iter()
        .map(|p| p.as_str())
        .zip(args.iter())
        .collect();
    eval(&method.body, &env, unit, table, depth)
}

fn eval(
    expr: &Expr,
    env: &HashMap<&str, &Value>,
    unit: &CompiledUnit,
    table: &SymbolTable,
    depth: usize,
) -> Result<Value, InvokeError> {
    match expr {
        Expr::Str(s) => Ok(Value::Str(s.clone())),
        Expr::Int(i) => Ok(Value::Int(*i)),
        Expr::Param(name) => env
            .get(name.as_str())
            .map(|v| (*v).clone())
            .ok_or_else(|| InvokeError::TypeError(format!("unbound parameter '{}'", name))),
        Expr::Add(lhs, rhs) => {
            let lhs = eval(lhs, env, unit, table, depth)?;
            let rhs = eval(rhs, env, unit, table, depth)?;
            add(lhs, rhs)
        }
        Expr::Call {
            unit: target,
            method,
            args,
        } => {
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                values.push(eval(arg, env, unit, table, depth)?);
            }
            // Self-calls dispatch without a table lookup so a unit can
            // recurse before it is visible to others.
            if target == &unit.unit_name {
                return invoke_on(unit, method, &values, table, depth + 1);
            }
            let resolved = table
                .get(target)
                .ok_or_else(|| InvokeError::UnresolvedReference(target.clone()))?;
            invoke_on(&resolved, method, &values, table, depth + 1)
        }
    }
}

fn add(lhs: Value, rhs: Value) -> Result<Value, InvokeError> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_add(b))),
        (Value::Str(a), b) => Ok(Value::Str(format!("{}{}", a, b))),
        (a, Value::Str(b)) => Ok(Value::Str(format!("{}{}", a, b))),
        (a, b) => Err(InvokeError::TypeError(format!(
            "cannot add {} and {}",
            a.type_name(),
            b.type_name()
        ))),
    }
}

//! # vibesynth-script
//!
//! Reference backend for the vibesynth synthesis engine: a small,
//! in-process script language with a compiler implementing the engine's
//! [`Toolchain`] boundary and a link runtime implementing [`LinkRuntime`].
//!
//! The language is deliberately tiny (string/integer expressions and
//! cross-unit static calls) but exercises every engine behavior end to
//! end: in-memory staging, full diagnostic capture, multi-unit artifact
//! sets with unordered inter-unit references, idempotent define-or-resolve
//! linking, and dynamic invocation of the synthesized instance.
//!
//! ```
//! use std::sync::Arc;
//! use vibesynth_engine::{LinkContext, Synthesizer, SynthesisResult};
//! use vibesynth_script::{ScriptRuntime, ScriptToolchain};
//! use vibesynth_types::{Contract, MethodSpec, ParamSpec, Value};
//!
//! let contract = Contract::new(
//!     "demo",
//!     "Greeting",
//!     vec![MethodSpec {
//!         name: "greet".into(),
//!         params: vec![ParamSpec::new("name", "string")],
//!         return_type: "string".into(),
//!         prompt: "return a friendly greeting".into(),
//!     }],
//! );
//!
//! // Stand-in for the real text-generation collaborator.
//! let generate = |_prompt: &str| -> SynthesisResult<String> {
//!     Ok("fn greet(name) { \"Hello, \" + name + \"!\" }".into())
//! };
//!
//! let synthesizer = Synthesizer::new(Arc::new(ScriptToolchain::new()));
//! let context = LinkContext::anchor_shared(Arc::new(ScriptRuntime::new()));
//! let instance = synthesizer.synthesize(&contract, &context, &generate).unwrap();
//! let greeting = instance.invoke("greet", &[Value::from("Alice")]).unwrap();
//! assert_eq!(greeting, Value::Str("Hello, Alice!".into()));
//! ```
//!
//! [`Toolchain`]: vibesynth_engine::Toolchain
//! [`LinkRuntime`]: vibesynth_engine::LinkRuntime

#![deny(unsafe_code)]

pub mod compiler;
pub mod ir;
pub mod runtime;
pub mod syntax;

// Re-exports
pub use compiler::ScriptToolchain;
pub use ir::{CompiledMethod, CompiledUnit, Expr, LANGUAGE_VERSION};
pub use runtime::ScriptRuntime;
pub use syntax::{parse, MethodDecl, ParseOutcome, SyntaxError, UnitDecl};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use vibesynth_engine::{
        CompileOptions, CompilerInvoker, DynamicLinker, LinkContext, SynthesisError,
        SynthesisResult, Synthesizer,
    };
    use vibesynth_types::{
        CompilationUnit, Contract, ContractVisibility, MethodSpec, ParamSpec, Value,
    };

    fn greeting_contract() -> Contract {
        Contract::new(
            "demo",
            "Greeting",
            vec![MethodSpec {
                name: "greet".into(),
                params: vec![ParamSpec::new("name", "string")],
                return_type: "string".into(),
                prompt: "return a friendly greeting for the given name".into(),
            }],
        )
    }

    fn greet_body(_prompt: &str) -> SynthesisResult<String> {
        Ok("fn greet(name) { \"Hello, \" + name + \"!\" }".into())
    }

    fn synthesizer() -> Synthesizer {
        Synthesizer::new(Arc::new(ScriptToolchain::new()))
    }

    #[test]
    fn greet_scenario_end_to_end() {
        let context = LinkContext::anchor_shared(Arc::new(ScriptRuntime::new()));
        let instance = synthesizer()
            .synthesize(&greeting_contract(), &context, &greet_body)
            .unwrap();
        assert_eq!(instance.unit_name(), "demo.GreetingImpl");
        let result = instance.invoke("greet", &[Value::from("Alice")]).unwrap();
        assert_eq!(result, Value::Str("Hello, Alice!".into()));
    }

    #[test]
    fn deliberate_syntax_error_surfaces_compilation_failed() {
        let context = LinkContext::anchor_shared(Arc::new(ScriptRuntime::new()));
        let generator = |_prompt: &str| -> SynthesisResult<String> {
            Ok("fn greet(name) { \"Hello, \" + }".into())
        };
        let err = synthesizer()
            .synthesize(&greeting_contract(), &context, &generator)
            .unwrap_err();
        match err {
            SynthesisError::CompilationFailed {
                unit_name,
                diagnostics,
            } => {
                assert_eq!(unit_name, "demo.GreetingImpl");
                assert!(diagnostics
                    .iter()
                    .any(|d| d.is_error() && d.unit_name == "demo.GreetingImpl"));
            }
            other => panic!("expected CompilationFailed, got {:?}", other),
        }
    }

    #[test]
    fn repeated_synthesis_is_idempotent_in_one_context() {
        let runtime = Arc::new(ScriptRuntime::new());
        let context = LinkContext::anchor_shared(Arc::clone(&runtime) as _);
        let synthesizer = synthesizer();

        let first = synthesizer
            .synthesize(&greeting_contract(), &context, &greet_body)
            .unwrap();
        let second = synthesizer
            .synthesize(&greeting_contract(), &context, &greet_body)
            .unwrap();

        // Only one definition ever happened; both instances work.
        assert_eq!(runtime.defined_count(), 1);
        for instance in [first, second] {
            assert_eq!(
                instance.invoke("greet", &[Value::from("Bob")]).unwrap(),
                Value::Str("Hello, Bob!".into())
            );
        }
    }

    #[test]
    fn concurrent_synthesis_into_one_anchor_shared_context() {
        let runtime = Arc::new(ScriptRuntime::new());
        let synthesizer = Arc::new(synthesizer());
        let mut handles = Vec::new();
        for _ in 0..4 {
            let runtime = Arc::clone(&runtime);
            let synthesizer = Arc::clone(&synthesizer);
            handles.push(std::thread::spawn(move || {
                let context = LinkContext::anchor_shared(runtime as _);
                let instance = synthesizer
                    .synthesize(&greeting_contract(), &context, &greet_body)
                    .unwrap();
                instance.invoke("greet", &[Value::from("Eve")]).unwrap()
            }));
        }
        for handle in handles {
            assert_eq!(
                handle.join().unwrap(),
                Value::Str("Hello, Eve!".into())
            );
        }
        assert_eq!(runtime.defined_count(), 1);
    }

    #[test]
    fn isolated_contexts_do_not_share_units() {
        let runtime_a = Arc::new(ScriptRuntime::new());
        let runtime_b = Arc::new(ScriptRuntime::new());
        let synthesizer = synthesizer();

        synthesizer
            .synthesize(
                &greeting_contract(),
                &LinkContext::isolated(Arc::clone(&runtime_a) as _),
                &greet_body,
            )
            .unwrap();
        assert!(runtime_a.is_defined("demo.GreetingImpl"));
        assert!(!runtime_b.is_defined("demo.GreetingImpl"));
    }

    #[test]
    fn restricted_contract_synthesizes_without_conformance() {
        let contract =
            greeting_contract().with_visibility(ContractVisibility::Restricted);
        let runtime = Arc::new(ScriptRuntime::new());
        let context = LinkContext::anchor_shared(Arc::clone(&runtime) as _);
        let instance = synthesizer()
            .synthesize(&contract, &context, &greet_body)
            .unwrap();
        // Structural invocation still works without the declared clause.
        assert_eq!(
            instance.invoke("greet", &[Value::from("Alice")]).unwrap(),
            Value::Str("Hello, Alice!".into())
        );
    }

    #[test]
    fn generated_helper_units_link_by_fixpoint() {
        // The generated fragment closes the implementation and smuggles a
        // helper unit into the same source, the way an overeager generator
        // might. The compiler emits two artifacts; the main unit sorts
        // first yet depends on the helper, so linking needs two passes.
        let generator = |_prompt: &str| -> SynthesisResult<String> {
            Ok("fn greet(name) { demo.ZHelper::shout(name) }\n}\n\
                unit demo.ZHelper {\n pub fn shout(x) { \"HELLO \" + x }\n"
                .into())
        };
        let runtime = Arc::new(ScriptRuntime::new());
        let context = LinkContext::anchor_shared(Arc::clone(&runtime) as _);
        let instance = synthesizer()
            .synthesize(&greeting_contract(), &context, &generator)
            .unwrap();
        assert_eq!(runtime.defined_count(), 2);
        assert_eq!(
            instance.invoke("greet", &[Value::from("Ada")]).unwrap(),
            Value::Str("HELLO Ada".into())
        );
    }

    #[test]
    fn circular_artifacts_fail_to_link() {
        let source = r#"
unit demo.A {
    pub fn a(x) { demo.B::b(x) }
}
unit demo.B {
    pub fn b(x) { demo.A::a(x) }
}
"#;
        let invoker = CompilerInvoker::new(Arc::new(ScriptToolchain::new()));
        let artifacts = invoker
            .invoke(
                &CompilationUnit::new("demo.A", source),
                &CompileOptions::default(),
            )
            .unwrap();
        assert_eq!(artifacts.len(), 2);

        let context = LinkContext::isolated(Arc::new(ScriptRuntime::new()));
        let err = DynamicLinker::link(&artifacts, &context, "demo.A").unwrap_err();
        match err {
            SynthesisError::LinkFailed(reason) => {
                assert!(reason.contains("circular or missing dependency"));
            }
            other => panic!("expected LinkFailed, got {:?}", other),
        }
    }

    #[test]
    fn acyclic_chain_links_within_unit_count_passes() {
        let source = r#"
unit demo.A {
    pub fn run(x) { demo.B::f(x) }
}
unit demo.B {
    pub fn f(x) { demo.C::g(x) }
}
unit demo.C {
    pub fn g(x) { x + "." }
}
"#;
        let invoker = CompilerInvoker::new(Arc::new(ScriptToolchain::new()));
        let artifacts = invoker
            .invoke(
                &CompilationUnit::new("demo.A", source),
                &CompileOptions::default(),
            )
            .unwrap();
        let context = LinkContext::isolated(Arc::new(ScriptRuntime::new()));
        let linked = DynamicLinker::link(&artifacts, &context, "demo.A").unwrap();
        let result = linked
            .instantiate()
            .unwrap()
            .invoke("run", &[Value::from("done")])
            .unwrap();
        assert_eq!(result, Value::Str("done.".into()));
    }

    #[test]
    fn multi_method_contract_synthesizes_each_behavior() {
        let contract = Contract::new(
            "demo",
            "Ops",
            vec![
                MethodSpec {
                    name: "greet".into(),
                    params: vec![ParamSpec::new("name", "string")],
                    return_type: "string".into(),
                    prompt: "greet".into(),
                },
                MethodSpec {
                    name: "add".into(),
                    params: vec![ParamSpec::new("a", "int"), ParamSpec::new("b", "int")],
                    return_type: "int".into(),
                    prompt: "add the numbers".into(),
                },
            ],
        );
        let generator = |prompt: &str| -> SynthesisResult<String> {
            if prompt.contains("fn greet") {
                Ok("fn greet(name) { \"hi \" + name }".into())
            } else {
                Ok("fn add(a, b) { a + b }".into())
            }
        };
        let context = LinkContext::anchor_shared(Arc::new(ScriptRuntime::new()));
        let instance = synthesizer()
            .synthesize(&contract, &context, &generator)
            .unwrap();
        assert_eq!(
            instance.invoke("greet", &[Value::from("Ada")]).unwrap(),
            Value::Str("hi Ada".into())
        );
        assert_eq!(
            instance
                .invoke("add", &[Value::Int(2), Value::Int(40)])
                .unwrap(),
            Value::Int(42)
        );
    }

    #[test]
    fn generation_failure_yields_no_definition() {
        let runtime = Arc::new(ScriptRuntime::new());
        let context = LinkContext::anchor_shared(Arc::clone(&runtime) as _);
        let generator = |_prompt: &str| -> SynthesisResult<String> {
            Err(SynthesisError::GenerationFailed("provider unavailable".into()))
        };
        let err = synthesizer()
            .synthesize(&greeting_contract(), &context, &generator)
            .unwrap_err();
        assert!(matches!(err, SynthesisError::GenerationFailed(_)));
        assert_eq!(runtime.defined_count(), 0);
    }

    #[test]
    fn failed_compilation_defines_nothing() {
        let runtime = Arc::new(ScriptRuntime::new());
        let context = LinkContext::anchor_shared(Arc::clone(&runtime) as _);
        let generator = |_prompt: &str| -> SynthesisResult<String> {
            Ok("fn greet(name) { oops }".into())
        };
        let err = synthesizer()
            .synthesize(&greeting_contract(), &context, &generator)
            .unwrap_err();
        assert!(matches!(err, SynthesisError::CompilationFailed { .. }));
        assert_eq!(runtime.defined_count(), 0);
    }
}

//! Tests for namespaced function registration.

use super::{DEFAULT_NAMESPACE, FunctionRegistry, RegistryEntry};
use crate::compiler_frontend::ast::parse_module::parse_single_function;
use crate::compiler_frontend::compiler_errors::{ErrorMetaDataKey, ErrorType};
use crate::runtime::kernel::partition::Kernel;

fn host(source: &str) -> RegistryEntry {
    RegistryEntry::Host(parse_single_function(source).expect("source should parse"))
}

#[test]
fn registered_callables_are_found_by_namespace_and_name() {
    let mut registry = FunctionRegistry::new();
    assert!(registry.is_empty());

    let callable = registry
        .register(DEFAULT_NAMESPACE, "f", host("def f():\n    pass\n"), true)
        .expect("registers");

    assert_eq!(callable.key.namespace, DEFAULT_NAMESPACE);
    assert!(callable.timed);
    assert!(registry.contains(DEFAULT_NAMESPACE, "f"));
    assert!(!registry.contains("other", "f"));
    assert_eq!(registry.len(), 1);

    let found = registry.get(DEFAULT_NAMESPACE, "f").expect("f is registered");
    assert_eq!(found.entry.definition().name, "f");
    assert_eq!(found.entry.kind_name(), "host function");
}

#[test]
fn duplicate_names_are_rejected() {
    let mut registry = FunctionRegistry::new();
    registry
        .register(DEFAULT_NAMESPACE, "f", host("def f():\n    pass\n"), false)
        .expect("registers");

    let error = registry
        .register(DEFAULT_NAMESPACE, "f", host("def f(x):\n    pass\n"), false)
        .expect_err("f is taken");

    assert_eq!(error.error_type, ErrorType::Rule);
    assert!(error.msg.contains("host function"));
    assert_eq!(error.function_name(), Some("f"));
    assert!(
        error
            .metadata
            .contains_key(&ErrorMetaDataKey::PrimarySuggestion)
    );

    // The original entry is untouched
    let kept = registry.get(DEFAULT_NAMESPACE, "f").expect("f is registered");
    assert!(kept.entry.definition().parameters.is_empty());
}

#[test]
fn namespaces_are_separate() {
    let mut registry = FunctionRegistry::new();
    registry
        .register("physics", "step", host("def step():\n    pass\n"), false)
        .expect("registers");
    registry
        .register("render", "step", host("def step():\n    pass\n"), false)
        .expect("same name in another namespace");

    assert_eq!(registry.len(), 2);
    assert!(registry.ensure_available("physics", "step").is_err());
    assert!(registry.ensure_available(DEFAULT_NAMESPACE, "step").is_ok());
}

#[test]
fn iteration_follows_definition_order() {
    let mut registry = FunctionRegistry::new();
    for name in ["c", "a", "b"] {
        let source = format!("def {name}():\n    pass\n");
        registry
            .register(DEFAULT_NAMESPACE, name, host(&source), false)
            .expect("registers");
    }

    let kernel_definition =
        parse_single_function("def k(data):\n    for i in range(3):\n        data[i] = i\n")
            .expect("parses");
    let kernel = Kernel::new(kernel_definition, &mut Vec::new()).expect("partitions");
    registry
        .register(DEFAULT_NAMESPACE, "k", RegistryEntry::Kernel(kernel), false)
        .expect("registers");

    let names: Vec<&str> = registry.iter().map(|c| c.key.name.as_str()).collect();
    assert_eq!(names, vec!["c", "a", "b", "k"]);

    let kinds: Vec<&str> = registry.iter().map(|c| c.entry.kind_name()).collect();
    assert_eq!(kinds.last(), Some(&"kernel"));
}

//! Tests for defining and calling functions through a JIT session.

use super::JitSession;
use crate::backends::function_registry::RegistryEntry;
use crate::backends::reference::ReferenceBackend;
use crate::compiler_frontend::ast::parse_module::parse_single_function;
use crate::compiler_frontend::compiler_errors::{ErrorMetaDataKey, ErrorType};
use crate::compiler_frontend::compiler_warnings::{CompilerWarning, WarningKind};
use crate::projects::settings::Config;
use crate::runtime::host_value::{ElementType, HostValue, SharedArray};
use std::fs;
use tempfile::tempdir;

fn session() -> JitSession<ReferenceBackend> {
    let mut config = Config::default();
    config.runtime.thread_count = 2;
    JitSession::new(config, ReferenceBackend::new()).expect("session should start")
}

fn has_warning(warnings: &[CompilerWarning], kind: WarningKind) -> bool {
    warnings.iter().any(|w| w.warning_kind == kind)
}

const SUM_LOOP: &str = "\
@func
def f(i: Int32) -> Int32:
    res = 0
    for j in range(3):
        res = res + j
    return res
";

#[test]
fn compiled_loop_ignores_the_unused_argument() {
    let mut session = session();
    session.load_source(SUM_LOOP).expect("source loads");

    let callable = session
        .registry()
        .get(session.namespace(), "f")
        .expect("f is registered");
    assert_eq!(callable.entry.kind_name(), "compiled function");

    let result = session
        .call("f", vec![HostValue::Int(5)], Vec::new())
        .expect("call succeeds");
    assert_eq!(result, HostValue::Int(3));
}

#[test]
fn missing_return_annotation_falls_back_to_the_host() {
    let mut session = session();
    session
        .load_source("@func\ndef scale(x, factor=2):\n    return x * factor\n")
        .expect("source loads");

    let warnings = session.take_warnings();
    assert!(has_warning(&warnings, WarningKind::LoweringFallback));
    assert!(session.take_warnings().is_empty());

    let callable = session.registry().get("global", "scale").expect("registered");
    assert_eq!(callable.entry.kind_name(), "fallback function");

    let result = session
        .call("scale", vec![HostValue::Int(4)], Vec::new())
        .expect("host call succeeds");
    assert_eq!(result, HostValue::Int(8));

    let result = session
        .call(
            "scale",
            vec![HostValue::Str(String::from("ab"))],
            vec![(String::from("factor"), HostValue::Int(3))],
        )
        .expect("host call succeeds");
    assert_eq!(result, HostValue::Str(String::from("ababab")));
}

#[test]
fn returning_a_dropped_parameter_falls_back_to_the_host() {
    let mut session = session();
    session
        .load_source("@func\ndef ident(x) -> Int32:\n    return x\n")
        .expect("source loads");

    let warnings = session.take_warnings();
    assert!(has_warning(&warnings, WarningKind::DroppedParameter));
    assert!(has_warning(&warnings, WarningKind::LoweringFallback));

    let callable = session.registry().get("global", "ident").expect("registered");
    assert_eq!(callable.entry.kind_name(), "fallback function");

    let result = session
        .call("ident", vec![HostValue::Int(7)], Vec::new())
        .expect("host call succeeds");
    assert_eq!(result, HostValue::Int(7));
}

#[test]
fn tuple_assignment_is_dropped_with_a_warning() {
    let mut session = session();
    session
        .load_source(
            "@func\ndef g(a: Int32) -> Int32:\n    x, y = 1, 2\n    r = a + 1\n    return r\n",
        )
        .expect("source loads");

    let warnings = session.take_warnings();
    assert!(has_warning(&warnings, WarningKind::MultiTargetAssign));
    assert!(!has_warning(&warnings, WarningKind::LoweringFallback));

    let result = session
        .call("g", vec![HostValue::Int(4)], Vec::new())
        .expect("call succeeds");
    assert_eq!(result, HostValue::Int(5));
}

#[test]
fn compile_never_fails() {
    let mut session = session();

    let compiled = session.compile(
        parse_single_function("def add(a: Int64, b: Int64) -> Int64:\n    c = a + b\n    return c\n")
            .expect("parses"),
    );
    assert!(compiled.is_compiled());

    let fallback = session.compile(
        parse_single_function("def greet(name):\n    return 'hi ' + name\n")
            .expect("parses"),
    );
    assert!(!fallback.is_compiled());
    assert!(has_warning(&session.take_warnings(), WarningKind::LoweringFallback));
}

#[test]
fn kernels_fill_shared_arrays() {
    let mut session = session();
    session
        .load_source("@kernel\ndef fill(data):\n    for i in range(0, 10, 2):\n        data[i] = i\n")
        .expect("source loads");

    let data = SharedArray::zeros(ElementType::Int, 10);
    let result = session
        .call("fill", vec![HostValue::Array(data.clone())], Vec::new())
        .expect("kernel runs");

    assert_eq!(result, HostValue::None);
    let expected: Vec<HostValue> = [0, 0, 2, 0, 4, 0, 6, 0, 8, 0]
        .into_iter()
        .map(HostValue::Int)
        .collect();
    assert_eq!(data.values(), expected);
}

#[test]
fn every_role_loads_from_one_source() {
    let mut session = session();
    let defined = session
        .load_source(
            "\
@func
@log_time
def double(x: Float64) -> Float64:
    y = x * 2.0
    return y

@kernel
def apply(out, value):
    for i in range(len(out)):
        out[i] = double(value) + i

@cache
def main():
    out = zeros_float(3)
    apply(out, 1.5)
    return out[0] + out[1] + out[2]
",
        )
        .expect("source loads");

    let kinds: Vec<&str> = defined.iter().map(|c| c.entry.kind_name()).collect();
    assert_eq!(kinds, vec!["compiled function", "kernel", "host function"]);
    assert!(defined[0].timed);
    assert!(!defined[1].timed);
    assert!(has_warning(&session.take_warnings(), WarningKind::UnknownDecorator));

    let result = session.call("main", Vec::new(), Vec::new()).expect("main runs");
    assert_eq!(result, HostValue::Float(12.0));
}

#[test]
fn names_cannot_be_redefined() {
    let mut session = session();
    session.load_source(SUM_LOOP).expect("first load");

    let error = session
        .load_source("def f():\n    return 1\n")
        .expect_err("f is taken");
    assert_eq!(error.error_type, ErrorType::Rule);

    let callable = session.registry().get("global", "f").expect("original kept");
    assert!(matches!(callable.entry, RegistryEntry::Function(_)));
    assert_eq!(session.registry().len(), 1);
}

#[test]
fn the_configured_namespace_is_used() {
    let mut config = Config::default();
    config.runtime.thread_count = 1;
    config.codegen.namespace = String::from("physics");

    let mut session = JitSession::new(config, ReferenceBackend::new()).expect("session starts");
    session
        .load_source("def one():\n    return 1\n")
        .expect("source loads");

    assert!(session.registry().contains("physics", "one"));
    assert!(!session.registry().contains("global", "one"));

    let error = session
        .call_in("global", "one", Vec::new(), Vec::new())
        .expect_err("not in the global namespace");
    assert_eq!(error.error_type, ErrorType::Runtime);
    assert_eq!(
        error.metadata.get(&ErrorMetaDataKey::FunctionName).map(String::as_str),
        Some("one")
    );
}

#[test]
fn builtins_are_callable() {
    let session = session();
    let result = session
        .call("max", vec![HostValue::Int(2), HostValue::Int(9)], Vec::new())
        .expect("builtin call");
    assert_eq!(result, HostValue::Int(9));
}

#[test]
fn invalid_configs_are_rejected() {
    let mut config = Config::default();
    config.runtime.thread_count = 0;

    let error = JitSession::new(config, ReferenceBackend::new())
        .err()
        .expect("zero threads");
    assert_eq!(error.error_type, ErrorType::Config);
}

#[test]
fn load_file_errors_point_at_the_file() {
    let dir = tempdir().expect("temp dir");
    let mut session = session();

    let missing = dir.path().join("missing.spd");
    let error = session.load_file(&missing).expect_err("missing file");
    assert_eq!(error.error_type, ErrorType::File);

    let broken = dir.path().join("broken.spd");
    fs::write(&broken, "def broken(:\n    return 1\n").expect("write source");
    let error = session.load_file(&broken).expect_err("syntax error");
    assert_eq!(error.error_type, ErrorType::Syntax);
    assert_eq!(error.location.scope, broken);
}

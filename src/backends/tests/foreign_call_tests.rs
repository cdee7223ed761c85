//! Tests for calling compiled functions with host values.

use super::{AnalyzedFunction, ForeignFunction};
use crate::backends::codegen_backend::CodegenBackend;
use crate::backends::emitter::emit_function;
use crate::backends::function_registry::{DEFAULT_NAMESPACE, FunctionRegistry};
use crate::backends::reference::ReferenceBackend;
use crate::compiler_frontend::ast::parse_module::parse_single_function;
use crate::compiler_frontend::compiler_errors::{CompilerError, ErrorType};
use crate::compiler_frontend::datatypes::Scalar;
use crate::compiler_frontend::lowering::lower_function::{lower_function, retained_positions};
use crate::compiler_frontend::value_encoding::ConstantWidth;
use crate::runtime::execution_context::ExecutionContext;
use crate::runtime::host_value::{ElementType, HostValue, SharedArray};
use crate::runtime::kernel::dispatch::KernelDispatcher;

fn compile(source: &str) -> AnalyzedFunction {
    let definition = parse_single_function(source).expect("source should parse");
    let lowered = lower_function(&definition, &mut Vec::new()).expect("function should lower");

    let mut backend = ReferenceBackend::new();
    emit_function(&mut backend, &lowered, ConstantWidth::Declared, &mut Vec::new())
        .expect("function should compile");
    let entry = backend
        .entry_point(&lowered.name)
        .expect("entry point should exist");

    AnalyzedFunction::Compiled {
        foreign: ForeignFunction::new(lowered.prototype(), entry),
        argument_positions: retained_positions(&definition, &lowered),
        definition,
    }
}

fn call(
    function: &AnalyzedFunction,
    args: Vec<HostValue>,
    keywords: Vec<(String, HostValue)>,
) -> Result<HostValue, CompilerError> {
    let registry = FunctionRegistry::new();
    let dispatcher = KernelDispatcher::new(1).expect("pool should start");
    let context = ExecutionContext::new(&registry, &dispatcher, DEFAULT_NAMESPACE);
    function.call(args, keywords, context)
}

const MIXED: &str = "\
def mixed(label, x: Int32, scale: Float64 = 0.5) -> Float64:
    y = x * scale
    return y
";

#[test]
fn arguments_are_cast_to_declared_types() {
    let function = compile(MIXED);
    let AnalyzedFunction::Compiled { foreign, .. } = &function else {
        panic!("expected a compiled function");
    };

    // Float64 argument for an Int32 parameter is truncated first
    let result = foreign
        .invoke(&[Scalar::Float64(7.9), Scalar::Int64(3)])
        .expect("call succeeds");
    assert_eq!(result, Scalar::Float64(21.0));
}

#[test]
fn unannotated_parameters_are_bound_then_dropped() {
    let function = compile(MIXED);

    let result = call(
        &function,
        vec![HostValue::Str(String::from("ignored")), HostValue::Int(4)],
        Vec::new(),
    )
    .expect("call succeeds");
    assert_eq!(result, HostValue::Float(2.0));

    let result = call(
        &function,
        vec![HostValue::None],
        vec![
            (String::from("scale"), HostValue::Float(3.0)),
            (String::from("x"), HostValue::Bool(true)),
        ],
    )
    .expect("call succeeds");
    assert_eq!(result, HostValue::Float(3.0));
}

#[test]
fn retained_positions_skip_dropped_parameters() {
    let function = compile(MIXED);
    let AnalyzedFunction::Compiled {
        argument_positions, ..
    } = &function
    else {
        panic!("expected a compiled function");
    };

    assert_eq!(argument_positions, &vec![1, 2]);
    assert!(function.is_compiled());
    assert_eq!(function.definition().name, "mixed");
}

#[test]
fn non_numeric_arguments_are_call_errors() {
    let function = compile(MIXED);
    let array = SharedArray::zeros(ElementType::Int, 2);

    let error = call(
        &function,
        vec![HostValue::None, HostValue::Array(array)],
        Vec::new(),
    )
    .expect_err("arrays can't be passed to compiled code");

    assert_eq!(error.error_type, ErrorType::Call);
    assert!(error.msg.contains("'x'"));
}

#[test]
fn wrong_argument_count_is_a_call_error() {
    let function = compile(MIXED);
    let AnalyzedFunction::Compiled { foreign, .. } = &function else {
        panic!("expected a compiled function");
    };

    let error = foreign
        .invoke(&[Scalar::Int32(1)])
        .expect_err("two arguments are expected");
    assert_eq!(error.error_type, ErrorType::Call);

    let error = call(&function, Vec::new(), Vec::new()).expect_err("label is required");
    assert_eq!(error.error_type, ErrorType::Call);
}

#[test]
fn compiled_division_by_zero_is_a_runtime_error() {
    let function = compile("def divide(a: Int32, b: Int32) -> Int32:\n    c = a // b\n    return c\n");

    let result = call(&function, vec![HostValue::Int(7), HostValue::Int(2)], Vec::new())
        .expect("call succeeds");
    assert_eq!(result, HostValue::Int(3));

    let error = call(&function, vec![HostValue::Int(7), HostValue::Int(0)], Vec::new())
        .expect_err("division by zero");
    assert_eq!(error.error_type, ErrorType::Runtime);
    assert_eq!(error.function_name(), Some("divide"));
}

#[test]
fn fallback_functions_run_on_the_host() {
    let definition =
        parse_single_function("def greet(name):\n    return 'hello ' + name\n").expect("parses");
    let reason = lower_function(&definition, &mut Vec::new()).expect_err("no return type");

    let function = AnalyzedFunction::Fallback { definition, reason };
    assert!(!function.is_compiled());

    let result = call(
        &function,
        vec![HostValue::Str(String::from("world"))],
        Vec::new(),
    )
    .expect("host call succeeds");
    assert_eq!(result, HostValue::Str(String::from("hello world")));
}

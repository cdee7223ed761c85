//! Tests for running raw definitions on the host.

use super::{bind_arguments, run_function};
use crate::backends::function_registry::{DEFAULT_NAMESPACE, FunctionRegistry, RegistryEntry};
use crate::compiler_frontend::ast::parse_module::parse_single_function;
use crate::compiler_frontend::compiler_errors::{CompilerError, ErrorType};
use crate::runtime::execution_context::ExecutionContext;
use crate::runtime::host_value::HostValue;
use crate::runtime::kernel::dispatch::KernelDispatcher;

fn run_with(
    registry: &FunctionRegistry,
    source: &str,
    args: Vec<HostValue>,
    keywords: Vec<(String, HostValue)>,
) -> Result<HostValue, CompilerError> {
    let dispatcher = KernelDispatcher::new(2).expect("pool should start");
    let definition = parse_single_function(source).expect("source should parse");
    let context = ExecutionContext::new(registry, &dispatcher, DEFAULT_NAMESPACE);
    run_function(&definition, args, keywords, context)
}

fn run(source: &str, args: Vec<HostValue>) -> Result<HostValue, CompilerError> {
    run_with(&FunctionRegistry::new(), source, args, Vec::new())
}

#[test]
fn sums_with_loops_and_conditionals() {
    let source = "\
def evens(n):
    total = 0
    for i in range(n):
        if i % 2 == 0:
            total += i
        elif i == 7:
            break
        else:
            continue
    return total
";

    // 0 + 2 + 4 + 6, then break at 7
    assert_eq!(
        run(source, vec![HostValue::Int(100)]).expect("runs"),
        HostValue::Int(12)
    );
}

#[test]
fn while_loops_and_tuple_unpacking() {
    let source = "\
def fib(n):
    a, b = 0, 1
    while n > 0:
        a, b = b, a + b
        n -= 1
    return a
";

    assert_eq!(
        run(source, vec![HostValue::Int(10)]).expect("runs"),
        HostValue::Int(55)
    );
}

#[test]
fn division_follows_host_rules() {
    let source = "\
def arithmetic(a, b):
    return (a / b, a // b, a % b, a ** 2, -a // b)
";

    let result = run(source, vec![HostValue::Int(7), HostValue::Int(-2)]).expect("runs");
    assert_eq!(
        result,
        HostValue::Tuple(vec![
            HostValue::Float(-3.5),
            HostValue::Int(-4),
            HostValue::Int(-1),
            HostValue::Int(49),
            HostValue::Int(3),
        ])
    );
}

#[test]
fn division_by_zero_is_a_runtime_error() {
    let error = run("def f(a):\n    return a // 0\n", vec![HostValue::Int(1)])
        .expect_err("division by zero");

    assert_eq!(error.error_type, ErrorType::Runtime);
    assert_eq!(error.function_name(), Some("f"));
    assert_eq!(error.location.start_pos.line_number, 1);
}

#[test]
fn integer_overflow_is_checked() {
    let error = run(
        "def f(a):\n    return a * a\n",
        vec![HostValue::Int(i64::MAX)],
    )
    .expect_err("overflow");

    assert_eq!(error.error_type, ErrorType::Runtime);
    assert!(error.msg.contains("overflow"));
}

#[test]
fn bool_ops_return_the_deciding_operand() {
    let source = "\
def pick(a, b):
    return (a or b, a and b, not a)
";

    assert_eq!(
        run(source, vec![HostValue::Int(0), HostValue::Int(5)]).expect("runs"),
        HostValue::Tuple(vec![
            HostValue::Int(5),
            HostValue::Int(0),
            HostValue::Bool(true),
        ])
    );
}

#[test]
fn chained_comparisons() {
    let source = "def between(x):\n    return 0 <= x < 10\n";

    assert_eq!(run(source, vec![HostValue::Int(3)]).expect("runs"), HostValue::Bool(true));
    assert_eq!(run(source, vec![HostValue::Int(10)]).expect("runs"), HostValue::Bool(false));
}

#[test]
fn arrays_are_shared_with_the_caller() {
    let source = "\
def fill(data):
    for i in range(len(data)):
        data[i] = i * 2.5
    data[-1] = 100
";

    let data = crate::runtime::host_value::SharedArray::zeros(
        crate::runtime::host_value::ElementType::Float,
        4,
    );
    run(source, vec![HostValue::Array(data.clone())]).expect("runs");

    assert_eq!(
        data.values(),
        vec![
            HostValue::Float(0.0),
            HostValue::Float(2.5),
            HostValue::Float(5.0),
            HostValue::Float(100.0),
        ]
    );
}

#[test]
fn out_of_range_index_is_an_error() {
    let source = "\
def poke():
    data = zeros(3)
    data[3] = 1
";

    let error = run(source, Vec::new()).expect_err("index 3 is out of range");
    assert_eq!(error.error_type, ErrorType::Runtime);
    assert!(error.msg.contains("out of range"));
}

#[test]
fn builtins_behave_like_the_host() {
    let source = "\
def stats():
    values = [3, -7, 2]
    return (min(values), max(1, 4.5), abs(-3), int(2.9), float(2), len('abc'))
";

    assert_eq!(
        run(source, Vec::new()).expect("runs"),
        HostValue::Tuple(vec![
            HostValue::Int(-7),
            HostValue::Float(4.5),
            HostValue::Int(3),
            HostValue::Int(2),
            HostValue::Float(2.0),
            HostValue::Int(3),
        ])
    );
}

#[test]
fn unknown_names_are_runtime_errors() {
    let error = run("def f():\n    return missing + 1\n", Vec::new()).expect_err("unknown name");
    assert_eq!(error.error_type, ErrorType::Runtime);
    assert!(error.msg.contains("'missing'"));

    let error = run("def f():\n    return missing(1)\n", Vec::new()).expect_err("unknown call");
    assert!(error.msg.contains("'missing'"));
}

#[test]
fn calls_resolve_through_the_registry() {
    let mut registry = FunctionRegistry::new();
    let helper = parse_single_function("def double(x, scale=2):\n    return x * scale\n")
        .expect("helper parses");
    registry
        .register(DEFAULT_NAMESPACE, "double", RegistryEntry::Host(helper), false)
        .expect("registers");

    let result = run_with(
        &registry,
        "def f(a):\n    return double(a) + double(a, scale=10)\n",
        vec![HostValue::Int(3)],
        Vec::new(),
    )
    .expect("runs");

    assert_eq!(result, HostValue::Int(36));
}

#[test]
fn keywords_and_defaults_bind_like_the_host() {
    let registry = FunctionRegistry::new();
    let dispatcher = KernelDispatcher::new(1).expect("pool should start");
    let context = ExecutionContext::new(&registry, &dispatcher, DEFAULT_NAMESPACE);
    let definition =
        parse_single_function("def f(a, b=2, c=a):\n    pass\n").expect("parses");

    // Defaults are evaluated without the caller's arguments in scope
    let error = bind_arguments(&definition, vec![HostValue::Int(1)], Vec::new(), context)
        .expect_err("'a' is not visible to defaults");
    assert_eq!(error.error_type, ErrorType::Runtime);

    let definition = parse_single_function("def f(a, b=2, c=3):\n    pass\n").expect("parses");
    let bound = bind_arguments(
        &definition,
        vec![HostValue::Int(1)],
        vec![(String::from("c"), HostValue::Int(9))],
        context,
    )
    .expect("binds");
    assert_eq!(
        bound,
        vec![HostValue::Int(1), HostValue::Int(2), HostValue::Int(9)]
    );

    let error = bind_arguments(
        &definition,
        vec![HostValue::Int(1)],
        vec![(String::from("a"), HostValue::Int(2))],
        context,
    )
    .expect_err("a is given twice");
    assert_eq!(error.error_type, ErrorType::Call);

    let error = bind_arguments(&definition, Vec::new(), Vec::new(), context)
        .expect_err("a is missing");
    assert!(error.msg.contains("'a'"));

    let error = bind_arguments(
        &definition,
        vec![HostValue::Int(1); 4],
        Vec::new(),
        context,
    )
    .expect_err("too many arguments");
    assert_eq!(error.error_type, ErrorType::Call);
}

#[test]
fn missing_return_gives_none() {
    assert_eq!(
        run("def f():\n    x = 1\n", Vec::new()).expect("runs"),
        HostValue::None
    );
}

#[test]
fn strings_concatenate_and_repeat() {
    assert_eq!(
        run("def f():\n    return 'ab' + 'c' * 2\n", Vec::new()).expect("runs"),
        HostValue::Str(String::from("abcc"))
    );
}

//! Tests for the lowering whitelist, range normalization and lowering idempotence.

use crate::compiler_frontend::ast::ast_nodes::Literal;
use crate::compiler_frontend::ast::parse_module::parse_single_function;
use crate::compiler_frontend::compiler_errors::ErrorType;
use crate::compiler_frontend::compiler_warnings::{CompilerWarning, WarningKind};
use crate::compiler_frontend::datatypes::ScalarType;
use crate::compiler_frontend::lowering::lower_function::{lower_function, retained_positions};
use crate::compiler_frontend::lowering::lowered_ir::{
    ArithmeticOp, LoweredFunction, LoweredParameter, LoweredStatement, ValueRef,
};
use crate::compiler_frontend::lowering::range_normalization::{RangeTriple, normalize_range};
use proptest::prelude::*;

fn lower_source(source: &str) -> (LoweredFunction, Vec<CompilerWarning>) {
    let function = parse_single_function(source).expect("source should parse");
    let mut warnings = Vec::new();
    let lowered = lower_function(&function, &mut warnings).expect("function should lower");
    (lowered, warnings)
}

fn lowering_error_type(source: &str) -> ErrorType {
    let function = parse_single_function(source).expect("source should parse");
    let mut warnings = Vec::new();
    lower_function(&function, &mut warnings)
        .expect_err("lowering should fail")
        .error_type
}

fn kinds(warnings: &[CompilerWarning]) -> Vec<WarningKind> {
    warnings.iter().map(|w| w.warning_kind).collect()
}

fn var(name: &str) -> ValueRef {
    ValueRef::Variable(String::from(name))
}

#[test]
fn summing_loop_lowers_to_the_four_shapes() {
    let (lowered, warnings) = lower_source(
        "def f(i: Int32) -> Int32:\n    total = 0\n    for j in range(3):\n        total = total + j\n    return total\n",
    );

    assert!(warnings.is_empty());
    assert_eq!(
        lowered,
        LoweredFunction {
            name: String::from("f"),
            parameters: vec![LoweredParameter {
                name: String::from("i"),
                scalar_type: ScalarType::Int32,
            }],
            return_type: ScalarType::Int32,
            body: vec![
                LoweredStatement::ScalarAssign {
                    target: String::from("total"),
                    value: ValueRef::Constant(Literal::Int(0)),
                },
                LoweredStatement::ConstantRangeLoop {
                    variable: String::from("j"),
                    range: RangeTriple {
                        lower: 0,
                        upper: 3,
                        step: 1,
                    },
                    body: vec![LoweredStatement::BinaryOpAssign {
                        target: String::from("total"),
                        left: var("total"),
                        op: ArithmeticOp::Add,
                        right: var("j"),
                    }],
                },
                LoweredStatement::TerminalReturn {
                    variable: String::from("total"),
                },
            ],
        }
    );
}

#[test]
fn tuple_assignment_is_dropped_and_the_rest_lowers() {
    let (lowered, warnings) =
        lower_source("def f() -> Int32:\n    x, y = 1, 2\n    z = 3\n    return z\n");

    assert_eq!(kinds(&warnings), vec![WarningKind::MultiTargetAssign]);
    assert_eq!(lowered.body.len(), 2);
    assert!(matches!(
        &lowered.body[0],
        LoweredStatement::ScalarAssign { target, .. } if target == "z"
    ));
}

#[test]
fn unsupported_statements_warn_by_kind() {
    let (lowered, warnings) = lower_source(
        "\
def f(a: Float64, data, b: sp.Int64) -> Float64:
    a = b = 1
    data[0] = 1
    c = a * b + 1
    d = a // 2
    x = -2.5
    while a:
        pass
    for i in data:
        pass
    for i in range(a):
        pass
    for i in range(2):
        return a
    a += 1
    return x
    y = 2
",
    );

    assert_eq!(
        kinds(&warnings),
        vec![
            WarningKind::DroppedParameter,
            WarningKind::MultiTargetAssign,
            WarningKind::UnsupportedAssignTarget,
            WarningKind::UnsupportedExpression,
            WarningKind::UnsupportedExpression,
            WarningKind::UnsupportedStatement,
            WarningKind::UnsupportedStatement,
            WarningKind::NonConstantRange,
            WarningKind::UnsupportedReturn,
            WarningKind::UnsupportedStatement,
            WarningKind::UnreachableCode,
        ]
    );

    assert_eq!(
        lowered.prototype().parameters,
        vec![
            (String::from("a"), ScalarType::Float64),
            (String::from("b"), ScalarType::Int64),
        ]
    );
    assert_eq!(
        lowered.body,
        vec![
            LoweredStatement::ScalarAssign {
                target: String::from("x"),
                value: ValueRef::Constant(Literal::Float(-2.5)),
            },
            LoweredStatement::ConstantRangeLoop {
                variable: String::from("i"),
                range: RangeTriple {
                    lower: 0,
                    upper: 2,
                    step: 1,
                },
                body: Vec::new(),
            },
            LoweredStatement::TerminalReturn {
                variable: String::from("x"),
            },
        ]
    );
}

#[test]
fn retained_positions_skip_dropped_parameters() {
    let function = parse_single_function("def f(a: Int32, data, b: Float32) -> Int32:\n    return a\n")
        .expect("source should parse");
    let mut warnings = Vec::new();
    let lowered = lower_function(&function, &mut warnings).expect("function should lower");

    assert_eq!(retained_positions(&function, &lowered), vec![0, 2]);
    assert_eq!(lowered.prototype().argument_buffer_size(), 8);
}

#[test]
fn missing_return_annotation_is_a_lowering_failure() {
    assert_eq!(
        lowering_error_type("def f(i: Int32):\n    return i\n"),
        ErrorType::Lowering
    );
    assert_eq!(
        lowering_error_type("def f(i: Int32) -> list:\n    return i\n"),
        ErrorType::Lowering
    );
}

#[test]
fn invalid_range_headers_are_lowering_failures() {
    let bad_loops = [
        "range()",
        "range(1, 2, 3, 4)",
        "range(0, 10, 0)",
        "range(0.5)",
        "range(5000000000)",
        "range(True)",
    ];

    for header in bad_loops {
        let source = format!("def f() -> Int32:\n    for i in {header}:\n        pass\n    return i\n");
        assert_eq!(lowering_error_type(&source), ErrorType::Lowering, "{header}");
    }
}

#[test]
fn bad_arity_fails_even_with_non_literal_bounds() {
    assert_eq!(
        lowering_error_type("def f(n: Int32) -> Int32:\n    for i in range(n, n, n, n):\n        pass\n    return n\n"),
        ErrorType::Lowering
    );
}

#[test]
fn negative_steps_and_literal_signs_are_kept() {
    let (lowered, _) =
        lower_source("def f() -> Int32:\n    for i in range(10, -2, -3):\n        pass\n    return i\n");

    assert!(matches!(
        &lowered.body[0],
        LoweredStatement::ConstantRangeLoop { range, .. }
            if *range == RangeTriple { lower: 10, upper: -2, step: -3 }
    ));
}

#[test]
fn op_codes_are_fixed() {
    let ops = [
        (ArithmeticOp::Add, 1),
        (ArithmeticOp::Subtract, 2),
        (ArithmeticOp::Multiply, 3),
        (ArithmeticOp::Divide, 4),
    ];
    for (op, code) in ops {
        assert_eq!(op.op_code(), code);
        assert_eq!(ArithmeticOp::from_op_code(code), Some(op));
    }
    assert_eq!(ArithmeticOp::from_op_code(0), None);
}

#[test]
fn lowering_the_raw_form_again_is_identical() {
    let (lowered, _) = lower_source(
        "def f(a: Int32, b: Float64) -> Float64:\n    c = a / -2\n    for i in range(1, 9, 2):\n        for j in range(i):\n            c = c + b\n    return c\n",
    );

    let mut warnings = Vec::new();
    let again = lower_function(&lowered.to_raw(), &mut warnings).expect("raw form should lower");

    assert!(warnings.is_empty());
    assert_eq!(again, lowered);
}

// ====================
// Properties
// ====================

fn value_strategy() -> impl Strategy<Value = ValueRef> {
    prop_oneof![
        "[a-z][a-z0-9_]{0,4}".prop_map(ValueRef::Variable),
        any::<i32>().prop_map(|v| ValueRef::Constant(Literal::Int(v as i64))),
        (-1.0e6f64..1.0e6).prop_map(|v| ValueRef::Constant(Literal::Float(v))),
    ]
}

fn op_strategy() -> impl Strategy<Value = ArithmeticOp> {
    prop_oneof![
        Just(ArithmeticOp::Add),
        Just(ArithmeticOp::Subtract),
        Just(ArithmeticOp::Multiply),
        Just(ArithmeticOp::Divide),
    ]
}

fn statement_strategy() -> impl Strategy<Value = LoweredStatement> {
    let target = "[a-z][a-z0-9_]{0,4}";
    let leaf = prop_oneof![
        (target, value_strategy())
            .prop_map(|(target, value)| LoweredStatement::ScalarAssign { target, value }),
        (target, value_strategy(), op_strategy(), value_strategy()).prop_map(
            |(target, left, op, right)| LoweredStatement::BinaryOpAssign {
                target,
                left,
                op,
                right,
            }
        ),
    ];

    leaf.prop_recursive(3, 24, 4, move |inner| {
        (
            target,
            any::<i32>(),
            any::<i32>(),
            any::<i32>().prop_filter("non-zero step", |s| *s != 0),
            prop::collection::vec(inner, 0..4),
        )
            .prop_map(|(variable, lower, upper, step, body)| {
                LoweredStatement::ConstantRangeLoop {
                    variable,
                    range: RangeTriple { lower, upper, step },
                    body,
                }
            })
    })
}

proptest! {
    #[test]
    fn normalization_matches_the_explicit_triple(a in any::<i64>(), b in any::<i64>(), c in any::<i64>()) {
        prop_assert_eq!(normalize_range(vec![a], 0, 1), Some(RangeTriple { lower: 0, upper: a, step: 1 }));
        prop_assert_eq!(normalize_range(vec![a, b], 0, 1), Some(RangeTriple { lower: a, upper: b, step: 1 }));
        prop_assert_eq!(normalize_range(vec![a, b, c], 0, 1), Some(RangeTriple { lower: a, upper: b, step: c }));
        prop_assert_eq!(normalize_range(vec![a, b, c, a], 0, 1), None);
        prop_assert_eq!(normalize_range(Vec::<i64>::new(), 0, 1), None);
    }

    #[test]
    fn range_iteration_matches_a_stepped_walk(lower in -50i64..50, upper in -50i64..50, step in prop_oneof![-7i64..0, 1i64..8]) {
        let triple = RangeTriple { lower, upper, step };
        let mut expected = Vec::new();
        let mut i = lower;
        while (step > 0 && i < upper) || (step < 0 && i > upper) {
            expected.push(i);
            i += step;
        }
        prop_assert_eq!(triple.iter().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn lowering_is_idempotent(
        body in prop::collection::vec(statement_strategy(), 0..6),
        returned in prop::option::of("[a-z][a-z0-9_]{0,4}"),
    ) {
        let mut body = body;
        if let Some(variable) = returned {
            body.push(LoweredStatement::TerminalReturn { variable });
        }
        let function = LoweredFunction {
            name: String::from("generated"),
            parameters: vec![LoweredParameter { name: String::from("p"), scalar_type: ScalarType::Int64 }],
            return_type: ScalarType::Float32,
            body,
        };

        let mut warnings = Vec::new();
        let lowered = lower_function(&function.to_raw(), &mut warnings).expect("raw form should lower");
        prop_assert!(warnings.is_empty());

        let again = lower_function(&lowered.to_raw(), &mut warnings).expect("raw form should lower");
        prop_assert_eq!(&again, &lowered);
        prop_assert_eq!(&lowered, &function);
    }
}

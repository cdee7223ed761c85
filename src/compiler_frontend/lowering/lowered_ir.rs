//! The lowered function form accepted by codegen backends.
//!
//! Only four statement shapes exist here. Anything else has been filtered out by
//! `lower_function` before a backend ever sees it.

use crate::compiler_frontend::ast::ast_nodes::{
    Annotation, BinaryOperator, Expression, ExpressionKind, Literal, RawFunctionDefinition,
    RawParameter, Statement, StatementKind,
};
use crate::compiler_frontend::datatypes::ScalarType;
use crate::compiler_frontend::lowering::range_normalization::RangeTriple;
use crate::compiler_frontend::tokenizer::tokens::TextLocation;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoweredFunction {
    pub name: String,
    pub parameters: Vec<LoweredParameter>,
    pub return_type: ScalarType,
    pub body: Vec<LoweredStatement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoweredParameter {
    pub name: String,
    pub scalar_type: ScalarType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LoweredStatement {
    ScalarAssign {
        target: String,
        value: ValueRef,
    },
    BinaryOpAssign {
        target: String,
        left: ValueRef,
        op: ArithmeticOp,
        right: ValueRef,
    },
    ConstantRangeLoop {
        variable: String,
        range: RangeTriple<i32>,
        body: Vec<LoweredStatement>,
    },
    // Only ever the last statement at depth 0
    TerminalReturn {
        variable: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ValueRef {
    Variable(String),
    Constant(Literal),
}

impl ValueRef {
    /// A bare name or a literal (negated numeric literals included)
    pub fn from_expression(expression: &Expression) -> Option<ValueRef> {
        if let Some(name) = expression.as_name() {
            return Some(ValueRef::Variable(String::from(name)));
        }

        expression.as_literal().map(ValueRef::Constant)
    }

    pub fn to_expression(&self) -> Expression {
        match self {
            ValueRef::Variable(name) => Expression::name(name, TextLocation::default()),
            ValueRef::Constant(literal) => {
                Expression::constant(literal.clone(), TextLocation::default())
            }
        }
    }
}

/// Arithmetic a backend can emit. The op codes are shared with backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl ArithmeticOp {
    pub fn op_code(self) -> u8 {
        match self {
            ArithmeticOp::Add => 1,
            ArithmeticOp::Subtract => 2,
            ArithmeticOp::Multiply => 3,
            ArithmeticOp::Divide => 4,
        }
    }

    pub fn from_op_code(code: u8) -> Option<ArithmeticOp> {
        match code {
            1 => Some(ArithmeticOp::Add),
            2 => Some(ArithmeticOp::Subtract),
            3 => Some(ArithmeticOp::Multiply),
            4 => Some(ArithmeticOp::Divide),
            _ => None,
        }
    }

    pub fn from_binary_operator(op: BinaryOperator) -> Option<ArithmeticOp> {
        match op {
            BinaryOperator::Add => Some(ArithmeticOp::Add),
            BinaryOperator::Subtract => Some(ArithmeticOp::Subtract),
            BinaryOperator::Multiply => Some(ArithmeticOp::Multiply),
            BinaryOperator::Divide => Some(ArithmeticOp::Divide),
            _ => None,
        }
    }

    pub fn to_binary_operator(self) -> BinaryOperator {
        match self {
            ArithmeticOp::Add => BinaryOperator::Add,
            ArithmeticOp::Subtract => BinaryOperator::Subtract,
            ArithmeticOp::Multiply => BinaryOperator::Multiply,
            ArithmeticOp::Divide => BinaryOperator::Divide,
        }
    }
}

/// The ordered parameter types and return type of a lowered function
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionPrototype {
    pub name: String,
    pub parameters: Vec<(String, ScalarType)>,
    pub return_type: ScalarType,
}

impl FunctionPrototype {
    pub fn parameter_types(&self) -> impl Iterator<Item = ScalarType> + '_ {
        self.parameters.iter().map(|(_, scalar_type)| *scalar_type)
    }

    /// Size of the packed argument buffer
    pub fn argument_buffer_size(&self) -> usize {
        self.parameter_types().map(ScalarType::byte_width).sum()
    }
}

impl LoweredFunction {
    pub fn prototype(&self) -> FunctionPrototype {
        FunctionPrototype {
            name: self.name.to_owned(),
            parameters: self
                .parameters
                .iter()
                .map(|p| (p.name.to_owned(), p.scalar_type))
                .collect(),
            return_type: self.return_type,
        }
    }

    /// Turns the lowered form back into a raw definition.
    /// Lowering the result again gives an identical function.
    pub fn to_raw(&self) -> RawFunctionDefinition {
        RawFunctionDefinition {
            name: self.name.to_owned(),
            parameters: self
                .parameters
                .iter()
                .map(|p| RawParameter {
                    name: p.name.to_owned(),
                    annotation: Some(Annotation::simple(p.scalar_type.name())),
                    default: None,
                })
                .collect(),
            returns: Some(Annotation::simple(self.return_type.name())),
            body: statements_to_raw(&self.body),
            location: TextLocation::default(),
        }
    }
}

fn statements_to_raw(statements: &[LoweredStatement]) -> Vec<Statement> {
    statements.iter().map(statement_to_raw).collect()
}

fn statement_to_raw(statement: &LoweredStatement) -> Statement {
    let location = TextLocation::default();

    let kind = match statement {
        LoweredStatement::ScalarAssign { target, value } => StatementKind::Assign {
            targets: vec![Expression::name(target, location)],
            value: value.to_expression(),
        },

        LoweredStatement::BinaryOpAssign {
            target,
            left,
            op,
            right,
        } => StatementKind::Assign {
            targets: vec![Expression::name(target, location)],
            value: Expression::binary(
                left.to_expression(),
                op.to_binary_operator(),
                right.to_expression(),
            ),
        },

        LoweredStatement::ConstantRangeLoop {
            variable,
            range,
            body,
        } => {
            let bound = |value: i32| Expression::constant(Literal::Int(value as i64), location);
            StatementKind::For {
                target: Expression::name(variable, location),
                iter: Expression::new(
                    ExpressionKind::Call {
                        function: Box::new(Expression::name("range", location)),
                        args: vec![bound(range.lower), bound(range.upper), bound(range.step)],
                        keywords: Vec::new(),
                    },
                    location,
                ),
                body: statements_to_raw(body),
            }
        }

        LoweredStatement::TerminalReturn { variable } => {
            StatementKind::Return(Some(Expression::name(variable, location)))
        }
    };

    Statement::new(kind, location)
}

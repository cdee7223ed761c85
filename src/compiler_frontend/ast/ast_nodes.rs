//! Syntax tree for source modules.
//!
//! These nodes are the "raw" form of a function: exactly what the author wrote, before any
//! whitelist filtering. They are immutable once parsed and are shared by the lowering pass,
//! the kernel partitioner and the host interpreter.

use crate::compiler_frontend::tokenizer::tokens::TextLocation;
use serde::Serialize;

#[derive(Debug, Clone, Default)]
pub struct SourceModule {
    pub definitions: Vec<Definition>,
}

/// How a top level function was decorated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionRole {
    /// `@func`: lowered and compiled, falling back to the host when that fails
    Func,
    /// `@kernel`: partitioned across the worker pool
    Kernel,
    /// No decorator: always runs on the host
    Host,
}

#[derive(Debug, Clone)]
pub struct Definition {
    pub function: RawFunctionDefinition,
    pub role: FunctionRole,
    pub timed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawFunctionDefinition {
    pub name: String,
    pub parameters: Vec<RawParameter>,
    pub returns: Option<Annotation>,
    pub body: Vec<Statement>,
    pub location: TextLocation,
}

impl RawFunctionDefinition {
    pub fn parameter_names(&self) -> impl Iterator<Item = &str> {
        self.parameters.iter().map(|p| p.name.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawParameter {
    pub name: String,
    pub annotation: Option<Annotation>,
    pub default: Option<Expression>,
}

/// A dotted type annotation such as `Int32` or `sp.Int32`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub path: Vec<String>,
}

impl Annotation {
    pub fn simple(name: &str) -> Self {
        Annotation {
            path: vec![String::from(name)],
        }
    }

    pub fn final_segment(&self) -> &str {
        self.path.last().map(String::as_str).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub kind: StatementKind,
    pub location: TextLocation,
}

impl Statement {
    pub fn new(kind: StatementKind, location: TextLocation) -> Self {
        Statement { kind, location }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
    // Chained assignment keeps every target: a = b = 1
    Assign {
        targets: Vec<Expression>,
        value: Expression,
    },
    AugAssign {
        target: Expression,
        op: BinaryOperator,
        value: Expression,
    },
    For {
        target: Expression,
        iter: Expression,
        body: Vec<Statement>,
    },
    While {
        condition: Expression,
        body: Vec<Statement>,
    },
    // elif chains are nested Ifs in orelse
    If {
        condition: Expression,
        body: Vec<Statement>,
        orelse: Vec<Statement>,
    },
    Return(Option<Expression>),
    Expression(Expression),
    Pass,
    Break,
    Continue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub kind: ExpressionKind,
    pub location: TextLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionKind {
    Name(String),
    Constant(Literal),
    Attribute {
        value: Box<Expression>,
        attribute: String,
    },
    BinaryOp {
        left: Box<Expression>,
        op: BinaryOperator,
        right: Box<Expression>,
    },
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expression>,
    },
    // a < b <= c
    Compare {
        left: Box<Expression>,
        comparisons: Vec<(CompareOperator, Expression)>,
    },
    BoolOp {
        op: BoolOperator,
        values: Vec<Expression>,
    },
    Call {
        function: Box<Expression>,
        args: Vec<Expression>,
        keywords: Vec<Keyword>,
    },
    Subscript {
        value: Box<Expression>,
        index: Box<Expression>,
    },
    Tuple(Vec<Expression>),
    List(Vec<Expression>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Keyword {
    pub name: String,
    pub value: Expression,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    None,
}

impl Literal {
    pub fn is_numeric(&self) -> bool {
        matches!(self, Literal::Int(_) | Literal::Float(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    FloorDivide,
    Modulus,
    Exponent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Negate,
    Plus,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOperator {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOperator {
    And,
    Or,
}

impl Expression {
    pub fn new(kind: ExpressionKind, location: TextLocation) -> Self {
        Expression { kind, location }
    }

    pub fn name(name: &str, location: TextLocation) -> Self {
        Expression::new(ExpressionKind::Name(String::from(name)), location)
    }

    pub fn constant(literal: Literal, location: TextLocation) -> Self {
        Expression::new(ExpressionKind::Constant(literal), location)
    }

    pub fn binary(left: Expression, op: BinaryOperator, right: Expression) -> Self {
        let location = left.location.to(right.location);
        Expression::new(
            ExpressionKind::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            },
            location,
        )
    }

    pub fn as_name(&self) -> Option<&str> {
        match &self.kind {
            ExpressionKind::Name(name) => Some(name),
            _ => None,
        }
    }

    /// A literal, or a numeric literal with unary minus or plus folded in.
    pub fn as_literal(&self) -> Option<Literal> {
        match &self.kind {
            ExpressionKind::Constant(literal) => Some(literal.clone()),

            ExpressionKind::UnaryOp {
                op: UnaryOperator::Negate,
                operand,
            } => match &operand.kind {
                ExpressionKind::Constant(Literal::Int(value)) => {
                    value.checked_neg().map(Literal::Int)
                }
                ExpressionKind::Constant(Literal::Float(value)) => Some(Literal::Float(-value)),
                _ => None,
            },

            ExpressionKind::UnaryOp {
                op: UnaryOperator::Plus,
                operand,
            } => match &operand.kind {
                ExpressionKind::Constant(literal) if literal.is_numeric() => Some(literal.clone()),
                _ => None,
            },

            _ => None,
        }
    }

    /// `range(...)` calls with positional arguments only
    pub fn as_range_call(&self) -> Option<&[Expression]> {
        match &self.kind {
            ExpressionKind::Call {
                function,
                args,
                keywords,
            } if keywords.is_empty() && function.as_name() == Some("range") => Some(args),
            _ => None,
        }
    }

    /// The final name of a called function, `f` in both `f(x)` and `module.f(x)`
    pub fn called_name(&self) -> Option<&str> {
        match &self.kind {
            ExpressionKind::Call { function, .. } => match &function.kind {
                ExpressionKind::Name(name) => Some(name),
                ExpressionKind::Attribute { attribute, .. } => Some(attribute),
                _ => None,
            },
            _ => None,
        }
    }
}

// ====================
// Traversal helpers
// ====================

impl Statement {
    /// Visits every expression in this statement and in nested blocks.
    pub fn visit_expressions<'a>(&'a self, visit: &mut impl FnMut(&'a Expression)) {
        match &self.kind {
            StatementKind::Assign { targets, value } => {
                for target in targets {
                    target.visit(visit);
                }
                value.visit(visit);
            }
            StatementKind::AugAssign { target, value, .. } => {
                target.visit(visit);
                value.visit(visit);
            }
            StatementKind::For { target, iter, body } => {
                target.visit(visit);
                iter.visit(visit);
                visit_block(body, visit);
            }
            StatementKind::While { condition, body } => {
                condition.visit(visit);
                visit_block(body, visit);
            }
            StatementKind::If {
                condition,
                body,
                orelse,
            } => {
                condition.visit(visit);
                visit_block(body, visit);
                visit_block(orelse, visit);
            }
            StatementKind::Return(Some(value)) | StatementKind::Expression(value) => {
                value.visit(visit)
            }
            StatementKind::Return(None)
            | StatementKind::Pass
            | StatementKind::Break
            | StatementKind::Continue => {}
        }
    }
}

pub fn visit_block<'a>(statements: &'a [Statement], visit: &mut impl FnMut(&'a Expression)) {
    for statement in statements {
        statement.visit_expressions(visit);
    }
}

impl Expression {
    /// Pre-order walk over this expression and all of its children.
    pub fn visit<'a>(&'a self, visit: &mut impl FnMut(&'a Expression)) {
        visit(self);

        match &self.kind {
            ExpressionKind::Name(_) | ExpressionKind::Constant(_) => {}
            ExpressionKind::Attribute { value, .. } => value.visit(visit),
            ExpressionKind::BinaryOp { left, right, .. } => {
                left.visit(visit);
                right.visit(visit);
            }
            ExpressionKind::UnaryOp { operand, .. } => operand.visit(visit),
            ExpressionKind::Compare { left, comparisons } => {
                left.visit(visit);
                for (_, right) in comparisons {
                    right.visit(visit);
                }
            }
            ExpressionKind::BoolOp { values, .. }
            | ExpressionKind::Tuple(values)
            | ExpressionKind::List(values) => {
                for value in values {
                    value.visit(visit);
                }
            }
            ExpressionKind::Call {
                function,
                args,
                keywords,
            } => {
                function.visit(visit);
                for arg in args {
                    arg.visit(visit);
                }
                for keyword in keywords {
                    keyword.value.visit(visit);
                }
            }
            ExpressionKind::Subscript { value, index } => {
                value.visit(visit);
                index.visit(visit);
            }
        }
    }
}

/// Every function name called anywhere in a block, in first-seen order.
pub fn called_names(statements: &[Statement]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    visit_block(statements, &mut |expression| {
        if let Some(name) = expression.called_name()
            && !names.iter().any(|existing| existing == name)
        {
            names.push(String::from(name));
        }
    });
    names
}

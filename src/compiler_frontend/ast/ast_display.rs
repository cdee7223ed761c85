//! Turns syntax trees back into source text.
//!
//! The output parses back to an equivalent tree. Parentheses are only added where operator
//! precedence requires them.

use crate::compiler_frontend::ast::ast_nodes::{
    Annotation, BinaryOperator, BoolOperator, CompareOperator, Expression, ExpressionKind,
    Literal, RawFunctionDefinition, Statement, StatementKind, UnaryOperator,
};
use std::fmt::{Display, Formatter, Result, Write};

const INDENT: &str = "    ";

impl Display for RawFunctionDefinition {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "def {}(", self.name)?;
        for (index, parameter) in self.parameters.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            f.write_str(&parameter.name)?;
            if let Some(annotation) = &parameter.annotation {
                write!(f, ": {annotation}")?;
            }
            if let Some(default) = &parameter.default {
                if parameter.annotation.is_some() {
                    write!(f, " = {default}")?;
                } else {
                    write!(f, "={default}")?;
                }
            }
        }
        f.write_str(")")?;

        if let Some(returns) = &self.returns {
            write!(f, " -> {returns}")?;
        }
        f.write_str(":\n")?;

        write_block(f, &self.body, 1)
    }
}

impl Display for Annotation {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.write_str(&self.path.join("."))
    }
}

fn write_block(f: &mut Formatter<'_>, statements: &[Statement], depth: usize) -> Result {
    if statements.is_empty() {
        return writeln!(f, "{}pass", INDENT.repeat(depth));
    }

    for statement in statements {
        write_statement(f, statement, depth)?;
    }

    Ok(())
}

fn write_statement(f: &mut Formatter<'_>, statement: &Statement, depth: usize) -> Result {
    let indent = INDENT.repeat(depth);

    match &statement.kind {
        StatementKind::Assign { targets, value } => {
            f.write_str(&indent)?;
            for target in targets {
                write!(f, "{} = ", ListDisplay(target))?;
            }
            writeln!(f, "{}", ListDisplay(value))
        }

        StatementKind::AugAssign { target, op, value } => {
            writeln!(
                f,
                "{indent}{target} {}= {}",
                binary_symbol(*op),
                ListDisplay(value)
            )
        }

        StatementKind::For { target, iter, body } => {
            writeln!(f, "{indent}for {} in {}:", ListDisplay(target), ListDisplay(iter))?;
            write_block(f, body, depth + 1)
        }

        StatementKind::While { condition, body } => {
            writeln!(f, "{indent}while {condition}:")?;
            write_block(f, body, depth + 1)
        }

        StatementKind::If {
            condition,
            body,
            orelse,
        } => {
            writeln!(f, "{indent}if {condition}:")?;
            write_block(f, body, depth + 1)?;
            write_orelse(f, orelse, depth)
        }

        StatementKind::Return(Some(value)) => writeln!(f, "{indent}return {}", ListDisplay(value)),
        StatementKind::Return(None) => writeln!(f, "{indent}return"),
        StatementKind::Expression(value) => writeln!(f, "{indent}{}", ListDisplay(value)),
        StatementKind::Pass => writeln!(f, "{indent}pass"),
        StatementKind::Break => writeln!(f, "{indent}break"),
        StatementKind::Continue => writeln!(f, "{indent}continue"),
    }
}

fn write_orelse(f: &mut Formatter<'_>, orelse: &[Statement], depth: usize) -> Result {
    let indent = INDENT.repeat(depth);

    match orelse {
        [] => Ok(()),

        [
            Statement {
                kind:
                    StatementKind::If {
                        condition,
                        body,
                        orelse,
                    },
                ..
            },
        ] => {
            writeln!(f, "{indent}elif {condition}:")?;
            write_block(f, body, depth + 1)?;
            write_orelse(f, orelse, depth)
        }

        statements => {
            writeln!(f, "{indent}else:")?;
            write_block(f, statements, depth + 1)
        }
    }
}

// Tuples at statement level are written without parentheses: `x, y = 1, 2`
struct ListDisplay<'a>(&'a Expression);

impl Display for ListDisplay<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match &self.0.kind {
            ExpressionKind::Tuple(items) if !items.is_empty() => write_tuple_items(f, items),
            _ => write!(f, "{}", self.0),
        }
    }
}

fn write_tuple_items(f: &mut Formatter<'_>, items: &[Expression]) -> Result {
    for (index, item) in items.iter().enumerate() {
        if index > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    if items.len() == 1 {
        f.write_str(",")?;
    }
    Ok(())
}

// ====================
// Expressions
// ====================

// Higher binds tighter
fn precedence(expression: &Expression) -> u8 {
    match &expression.kind {
        ExpressionKind::BoolOp {
            op: BoolOperator::Or,
            ..
        } => 1,
        ExpressionKind::BoolOp {
            op: BoolOperator::And,
            ..
        } => 2,
        ExpressionKind::UnaryOp {
            op: UnaryOperator::Not,
            ..
        } => 3,
        ExpressionKind::Compare { .. } => 4,
        ExpressionKind::BinaryOp { op, .. } => match op {
            BinaryOperator::Add | BinaryOperator::Subtract => 5,
            BinaryOperator::Multiply
            | BinaryOperator::Divide
            | BinaryOperator::FloorDivide
            | BinaryOperator::Modulus => 6,
            BinaryOperator::Exponent => 8,
        },
        ExpressionKind::UnaryOp { .. } => 7,

        // Negative literals print with their sign and need the same care as unary minus
        ExpressionKind::Constant(Literal::Int(value)) if *value < 0 => 7,
        ExpressionKind::Constant(Literal::Float(value)) if value.is_sign_negative() => 7,

        _ => 9,
    }
}

fn write_operand(f: &mut Formatter<'_>, operand: &Expression, needs_parens: bool) -> Result {
    if needs_parens {
        write!(f, "({operand})")
    } else {
        write!(f, "{operand}")
    }
}

pub fn binary_symbol(op: BinaryOperator) -> &'static str {
    match op {
        BinaryOperator::Add => "+",
        BinaryOperator::Subtract => "-",
        BinaryOperator::Multiply => "*",
        BinaryOperator::Divide => "/",
        BinaryOperator::FloorDivide => "//",
        BinaryOperator::Modulus => "%",
        BinaryOperator::Exponent => "**",
    }
}

fn compare_symbol(op: CompareOperator) -> &'static str {
    match op {
        CompareOperator::Equal => "==",
        CompareOperator::NotEqual => "!=",
        CompareOperator::LessThan => "<",
        CompareOperator::LessThanOrEqual => "<=",
        CompareOperator::GreaterThan => ">",
        CompareOperator::GreaterThanOrEqual => ">=",
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Literal::Int(value) => write!(f, "{value}"),
            // Debug keeps the decimal point on whole numbers
            Literal::Float(value) => write!(f, "{value:?}"),
            Literal::Bool(true) => f.write_str("True"),
            Literal::Bool(false) => f.write_str("False"),
            Literal::Str(value) => write_string_literal(f, value),
            Literal::None => f.write_str("None"),
        }
    }
}

fn write_string_literal(f: &mut Formatter<'_>, value: &str) -> Result {
    f.write_char('\'')?;
    for ch in value.chars() {
        match ch {
            '\'' => f.write_str("\\'")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            '\r' => f.write_str("\\r")?,
            '\0' => f.write_str("\\0")?,
            other => f.write_char(other)?,
        }
    }
    f.write_char('\'')
}

impl Display for Expression {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let own = precedence(self);

        match &self.kind {
            ExpressionKind::Name(name) => f.write_str(name),
            ExpressionKind::Constant(literal) => write!(f, "{literal}"),

            ExpressionKind::Attribute { value, attribute } => {
                write_operand(f, value, precedence(value) < 9)?;
                write!(f, ".{attribute}")
            }

            ExpressionKind::BinaryOp { left, op, right } => {
                if *op == BinaryOperator::Exponent {
                    // Right associative, and a unary operand on the left needs parentheses
                    write_operand(f, left, precedence(left) <= own)?;
                    write!(f, " ** ")?;
                    write_operand(f, right, precedence(right) < 7)
                } else {
                    write_operand(f, left, precedence(left) < own)?;
                    write!(f, " {} ", binary_symbol(*op))?;
                    write_operand(f, right, precedence(right) <= own)
                }
            }

            ExpressionKind::UnaryOp { op, operand } => {
                let symbol = match op {
                    UnaryOperator::Negate => "-",
                    UnaryOperator::Plus => "+",
                    UnaryOperator::Not => "not ",
                };
                f.write_str(symbol)?;
                write_operand(f, operand, precedence(operand) < own)
            }

            ExpressionKind::Compare { left, comparisons } => {
                write_operand(f, left, precedence(left) <= own)?;
                for (op, right) in comparisons {
                    write!(f, " {} ", compare_symbol(*op))?;
                    write_operand(f, right, precedence(right) <= own)?;
                }
                Ok(())
            }

            ExpressionKind::BoolOp { op, values } => {
                let symbol = match op {
                    BoolOperator::And => " and ",
                    BoolOperator::Or => " or ",
                };
                for (index, value) in values.iter().enumerate() {
                    if index > 0 {
                        f.write_str(symbol)?;
                    }
                    write_operand(f, value, precedence(value) <= own)?;
                }
                Ok(())
            }

            ExpressionKind::Call {
                function,
                args,
                keywords,
            } => {
                write_operand(f, function, precedence(function) < 9)?;
                f.write_str("(")?;
                let mut first = true;
                for arg in args {
                    if !first {
                        f.write_str(", ")?;
                    }
                    first = false;
                    write!(f, "{arg}")?;
                }
                for keyword in keywords {
                    if !first {
                        f.write_str(", ")?;
                    }
                    first = false;
                    write!(f, "{}={}", keyword.name, keyword.value)?;
                }
                f.write_str(")")
            }

            ExpressionKind::Subscript { value, index } => {
                write_operand(f, value, precedence(value) < 9)?;
                write!(f, "[{}]", ListDisplay(index))
            }

            ExpressionKind::Tuple(items) => {
                f.write_str("(")?;
                write_tuple_items(f, items)?;
                f.write_str(")")
            }

            ExpressionKind::List(items) => {
                f.write_str("[")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

use crate::compiler_frontend::ast::ast_nodes::{
    BinaryOperator, BoolOperator, CompareOperator, Expression, ExpressionKind, Keyword, Literal,
    UnaryOperator,
};
use crate::compiler_frontend::compiler_errors::CompilerError;
use crate::compiler_frontend::tokenizer::tokens::{FileTokens, TokenKind};
use crate::return_syntax_error;

/// One expression, or several separated by commas which form a tuple.
///
/// Used for assignment sides, return values and for-loop targets. A trailing comma
/// makes a one element tuple.
pub fn parse_expression_list(tokens: &mut FileTokens) -> Result<Expression, CompilerError> {
    let first = parse_expression(tokens)?;
    if tokens.current_token_kind() != &TokenKind::Comma {
        return Ok(first);
    }

    let start = first.location;
    let mut end = first.location;
    let mut items = vec![first];

    while tokens.current_token_kind() == &TokenKind::Comma {
        tokens.advance();
        if !starts_expression(tokens.current_token_kind()) {
            break;
        }
        let item = parse_expression(tokens)?;
        end = item.location;
        items.push(item);
    }

    Ok(Expression::new(ExpressionKind::Tuple(items), start.to(end)))
}

pub fn starts_expression(kind: &TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Name(_)
            | TokenKind::IntLiteral(_)
            | TokenKind::FloatLiteral(_)
            | TokenKind::StringLiteral(_)
            | TokenKind::True
            | TokenKind::False
            | TokenKind::None
            | TokenKind::OpenParenthesis
            | TokenKind::OpenBracket
            | TokenKind::Subtract
            | TokenKind::Add
            | TokenKind::Not
    )
}

pub fn parse_expression(tokens: &mut FileTokens) -> Result<Expression, CompilerError> {
    parse_or(tokens)
}

// `or` binds looser than `and`, both bind looser than `not`
fn parse_or(tokens: &mut FileTokens) -> Result<Expression, CompilerError> {
    let first = parse_and(tokens)?;
    if tokens.current_token_kind() != &TokenKind::Or {
        return Ok(first);
    }

    let mut values = vec![first];
    while tokens.current_token_kind() == &TokenKind::Or {
        tokens.advance();
        values.push(parse_and(tokens)?);
    }

    Ok(bool_op(BoolOperator::Or, values))
}

fn parse_and(tokens: &mut FileTokens) -> Result<Expression, CompilerError> {
    let first = parse_not(tokens)?;
    if tokens.current_token_kind() != &TokenKind::And {
        return Ok(first);
    }

    let mut values = vec![first];
    while tokens.current_token_kind() == &TokenKind::And {
        tokens.advance();
        values.push(parse_not(tokens)?);
    }

    Ok(bool_op(BoolOperator::And, values))
}

fn bool_op(op: BoolOperator, values: Vec<Expression>) -> Expression {
    let start = values.first().map(|v| v.location).unwrap_or_default();
    let end = values.last().map(|v| v.location).unwrap_or_default();
    Expression::new(ExpressionKind::BoolOp { op, values }, start.to(end))
}

fn parse_not(tokens: &mut FileTokens) -> Result<Expression, CompilerError> {
    if tokens.current_token_kind() == &TokenKind::Not {
        let start = tokens.current_location();
        tokens.advance();
        let operand = parse_not(tokens)?;
        let location = start.to(operand.location);
        return Ok(Expression::new(
            ExpressionKind::UnaryOp {
                op: UnaryOperator::Not,
                operand: Box::new(operand),
            },
            location,
        ));
    }

    parse_comparison(tokens)
}

fn compare_operator(kind: &TokenKind) -> Option<CompareOperator> {
    match kind {
        TokenKind::Equal => Some(CompareOperator::Equal),
        TokenKind::NotEqual => Some(CompareOperator::NotEqual),
        TokenKind::LessThan => Some(CompareOperator::LessThan),
        TokenKind::LessThanOrEqual => Some(CompareOperator::LessThanOrEqual),
        TokenKind::GreaterThan => Some(CompareOperator::GreaterThan),
        TokenKind::GreaterThanOrEqual => Some(CompareOperator::GreaterThanOrEqual),
        _ => None,
    }
}

fn parse_comparison(tokens: &mut FileTokens) -> Result<Expression, CompilerError> {
    let left = parse_arithmetic(tokens)?;
    let mut comparisons = Vec::new();

    while let Some(op) = compare_operator(tokens.current_token_kind()) {
        tokens.advance();
        comparisons.push((op, parse_arithmetic(tokens)?));
    }

    let Some((_, last)) = comparisons.last() else {
        return Ok(left);
    };

    let location = left.location.to(last.location);
    Ok(Expression::new(
        ExpressionKind::Compare {
            left: Box::new(left),
            comparisons,
        },
        location,
    ))
}

fn parse_arithmetic(tokens: &mut FileTokens) -> Result<Expression, CompilerError> {
    let mut left = parse_term(tokens)?;

    loop {
        let op = match tokens.current_token_kind() {
            TokenKind::Add => BinaryOperator::Add,
            TokenKind::Subtract => BinaryOperator::Subtract,
            _ => return Ok(left),
        };
        tokens.advance();
        let right = parse_term(tokens)?;
        left = Expression::binary(left, op, right);
    }
}

fn parse_term(tokens: &mut FileTokens) -> Result<Expression, CompilerError> {
    let mut left = parse_factor(tokens)?;

    loop {
        let op = match tokens.current_token_kind() {
            TokenKind::Multiply => BinaryOperator::Multiply,
            TokenKind::Divide => BinaryOperator::Divide,
            TokenKind::FloorDivide => BinaryOperator::FloorDivide,
            TokenKind::Modulus => BinaryOperator::Modulus,
            _ => return Ok(left),
        };
        tokens.advance();
        let right = parse_factor(tokens)?;
        left = Expression::binary(left, op, right);
    }
}

fn parse_factor(tokens: &mut FileTokens) -> Result<Expression, CompilerError> {
    let op = match tokens.current_token_kind() {
        TokenKind::Subtract => UnaryOperator::Negate,
        TokenKind::Add => UnaryOperator::Plus,
        _ => return parse_power(tokens),
    };

    let start = tokens.current_location();
    tokens.advance();
    let operand = parse_factor(tokens)?;
    let location = start.to(operand.location);

    Ok(Expression::new(
        ExpressionKind::UnaryOp {
            op,
            operand: Box::new(operand),
        },
        location,
    ))
}

// ** is right associative and binds tighter than a unary operator on its left: -2 ** 2 == -4
fn parse_power(tokens: &mut FileTokens) -> Result<Expression, CompilerError> {
    let base = parse_primary(tokens)?;

    if tokens.current_token_kind() != &TokenKind::Exponent {
        return Ok(base);
    }

    tokens.advance();
    let exponent = parse_factor(tokens)?;
    Ok(Expression::binary(base, BinaryOperator::Exponent, exponent))
}

fn parse_primary(tokens: &mut FileTokens) -> Result<Expression, CompilerError> {
    let mut expression = parse_atom(tokens)?;

    loop {
        match tokens.current_token_kind() {
            TokenKind::Dot => {
                tokens.advance();
                let TokenKind::Name(attribute) = tokens.current_token_kind().to_owned() else {
                    return_syntax_error!(
                        format!(
                            "Expected an attribute name after '.', found {}",
                            tokens.current_token_kind()
                        ),
                        tokens.current_location().to_error_location()
                    )
                };
                let location = expression.location.to(tokens.current_location());
                tokens.advance();
                expression = Expression::new(
                    ExpressionKind::Attribute {
                        value: Box::new(expression),
                        attribute,
                    },
                    location,
                );
            }

            TokenKind::OpenParenthesis => {
                tokens.advance();
                let (args, keywords) = parse_call_arguments(tokens)?;
                let location = expression.location.to(tokens.current_location());
                expect(tokens, TokenKind::CloseParenthesis, "to close the call")?;
                expression = Expression::new(
                    ExpressionKind::Call {
                        function: Box::new(expression),
                        args,
                        keywords,
                    },
                    location,
                );
            }

            TokenKind::OpenBracket => {
                tokens.advance();
                let index = parse_expression_list(tokens)?;
                let location = expression.location.to(tokens.current_location());
                expect(tokens, TokenKind::CloseBracket, "to close the subscript")?;
                expression = Expression::new(
                    ExpressionKind::Subscript {
                        value: Box::new(expression),
                        index: Box::new(index),
                    },
                    location,
                );
            }

            _ => return Ok(expression),
        }
    }
}

fn parse_call_arguments(
    tokens: &mut FileTokens,
) -> Result<(Vec<Expression>, Vec<Keyword>), CompilerError> {
    let mut args = Vec::new();
    let mut keywords: Vec<Keyword> = Vec::new();

    while tokens.current_token_kind() != &TokenKind::CloseParenthesis {
        let location = tokens.current_location();

        if let TokenKind::Name(name) = tokens.current_token_kind()
            && tokens.peek_next_token() == Some(&TokenKind::Assign)
        {
            let name = name.to_owned();
            if keywords.iter().any(|k| k.name == name) {
                return_syntax_error!(
                    format!("Keyword argument '{name}' repeated"),
                    location.to_error_location()
                )
            }
            tokens.advance();
            tokens.advance();
            let value = parse_expression(tokens)?;
            keywords.push(Keyword { name, value });
        } else {
            if !keywords.is_empty() {
                return_syntax_error!(
                    "Positional argument follows keyword argument",
                    location.to_error_location(),
                    {
                        CompilationStage => "Parsing",
                        PrimarySuggestion => "Move positional arguments before keyword arguments",
                    }
                )
            }
            args.push(parse_expression(tokens)?);
        }

        match tokens.current_token_kind() {
            TokenKind::Comma => tokens.advance(),
            TokenKind::CloseParenthesis => break,
            other => return_syntax_error!(
                format!("Expected ',' or ')' in call arguments, found {other}"),
                tokens.current_location().to_error_location()
            ),
        }
    }

    Ok((args, keywords))
}

fn parse_atom(tokens: &mut FileTokens) -> Result<Expression, CompilerError> {
    let token = tokens.current_token();
    let location = token.location;

    let literal = match token.kind {
        TokenKind::Name(name) => {
            tokens.advance();
            return Ok(Expression::new(ExpressionKind::Name(name), location));
        }
        TokenKind::IntLiteral(value) => Literal::Int(value),
        TokenKind::FloatLiteral(value) => Literal::Float(value),
        TokenKind::True => Literal::Bool(true),
        TokenKind::False => Literal::Bool(false),
        TokenKind::None => Literal::None,

        TokenKind::StringLiteral(mut value) => {
            // Adjacent strings join: "a" "b"
            let mut end = location;
            tokens.advance();
            while let TokenKind::StringLiteral(next) = tokens.current_token_kind() {
                value.push_str(next);
                end = tokens.current_location();
                tokens.advance();
            }
            return Ok(Expression::constant(Literal::Str(value), location.to(end)));
        }

        TokenKind::OpenParenthesis => {
            tokens.advance();
            if tokens.current_token_kind() == &TokenKind::CloseParenthesis {
                let end = tokens.current_location();
                tokens.advance();
                return Ok(Expression::new(
                    ExpressionKind::Tuple(Vec::new()),
                    location.to(end),
                ));
            }

            let mut inner = parse_expression_list(tokens)?;
            let end = tokens.current_location();
            expect(tokens, TokenKind::CloseParenthesis, "to close the parenthesis")?;
            inner.location = location.to(end);
            return Ok(inner);
        }

        TokenKind::OpenBracket => {
            tokens.advance();
            let mut items = Vec::new();
            while tokens.current_token_kind() != &TokenKind::CloseBracket {
                items.push(parse_expression(tokens)?);
                if tokens.current_token_kind() != &TokenKind::Comma {
                    break;
                }
                tokens.advance();
            }
            let end = tokens.current_location();
            expect(tokens, TokenKind::CloseBracket, "to close the list")?;
            return Ok(Expression::new(ExpressionKind::List(items), location.to(end)));
        }

        other => return_syntax_error!(
            format!("Expected an expression, found {other}"),
            location.to_error_location(),
            {
                CompilationStage => "Parsing",
            }
        ),
    };

    tokens.advance();
    Ok(Expression::constant(literal, location))
}

pub fn expect(
    tokens: &mut FileTokens,
    expected: TokenKind,
    context: &str,
) -> Result<(), CompilerError> {
    if tokens.current_token_kind() == &expected {
        tokens.advance();
        return Ok(());
    }

    return_syntax_error!(
        format!(
            "Expected '{expected}' {context}, found {}",
            tokens.current_token_kind()
        ),
        tokens.current_location().to_error_location(),
        {
            CompilationStage => "Parsing",
            PrimarySuggestion => format!("Add '{expected}'"),
        }
    )
}

use crate::compiler_frontend::ast::ast_nodes::{
    BinaryOperator, Expression, ExpressionKind, Statement, StatementKind,
};
use crate::compiler_frontend::ast::expressions::parse_expression::{
    expect, parse_expression, parse_expression_list, starts_expression,
};
use crate::compiler_frontend::compiler_errors::CompilerError;
use crate::compiler_frontend::tokenizer::tokens::{FileTokens, TextLocation, TokenKind};
use crate::{ast_log, return_syntax_error};

/// Parses the block after a colon.
///
/// Either an indented suite on the following lines, or a single simple statement on the
/// same line (`if x: pass`).
pub fn parse_block(tokens: &mut FileTokens) -> Result<Vec<Statement>, CompilerError> {
    expect(tokens, TokenKind::Colon, "to start the block")?;

    if tokens.current_token_kind() != &TokenKind::Newline {
        return Ok(vec![parse_simple_statement(tokens)?]);
    }

    tokens.skip_newlines();
    if tokens.current_token_kind() != &TokenKind::Indent {
        return_syntax_error!(
            "Expected an indented block",
            tokens.current_location().to_error_location(),
            {
                CompilationStage => "Parsing",
                PrimarySuggestion => "Indent the body of the block",
            }
        )
    }
    tokens.advance();

    let mut body = Vec::new();
    loop {
        tokens.skip_newlines();
        match tokens.current_token_kind() {
            TokenKind::Dedent => {
                tokens.advance();
                break;
            }
            TokenKind::Eof => break,
            _ => body.push(parse_statement(tokens)?),
        }
    }

    Ok(body)
}

pub fn parse_statement(tokens: &mut FileTokens) -> Result<Statement, CompilerError> {
    let location = tokens.current_location();

    let statement = match tokens.current_token_kind() {
        TokenKind::For => {
            tokens.advance();
            let target = parse_for_target(tokens)?;
            expect(tokens, TokenKind::In, "after the loop target")?;
            let iter = parse_expression_list(tokens)?;
            let body = parse_block(tokens)?;
            Statement::new(StatementKind::For { target, iter, body }, location)
        }

        TokenKind::While => {
            tokens.advance();
            let condition = parse_expression(tokens)?;
            let body = parse_block(tokens)?;
            Statement::new(StatementKind::While { condition, body }, location)
        }

        TokenKind::If => {
            tokens.advance();
            parse_if(tokens, location)?
        }

        TokenKind::Elif | TokenKind::Else => {
            return_syntax_error!(
                format!("'{}' without a matching 'if'", tokens.current_token_kind()),
                location.to_error_location()
            )
        }

        TokenKind::Indent => {
            return_syntax_error!("Unexpected indent", location.to_error_location())
        }

        _ => parse_simple_statement(tokens)?,
    };

    ast_log!("Parsed statement at line ", #statement.location.start_pos.line_number);

    Ok(statement)
}

fn parse_if(
    tokens: &mut FileTokens,
    location: TextLocation,
) -> Result<Statement, CompilerError> {
    let condition = parse_expression(tokens)?;
    let body = parse_block(tokens)?;
    tokens.skip_newlines();

    let orelse = match tokens.current_token_kind() {
        TokenKind::Elif => {
            let elif_location = tokens.current_location();
            tokens.advance();
            vec![parse_if(tokens, elif_location)?]
        }
        TokenKind::Else => {
            tokens.advance();
            parse_block(tokens)?
        }
        _ => Vec::new(),
    };

    Ok(Statement::new(
        StatementKind::If {
            condition,
            body,
            orelse,
        },
        location,
    ))
}

// Loop targets stop before `in`, which is never parsed as an operator
fn parse_for_target(tokens: &mut FileTokens) -> Result<Expression, CompilerError> {
    let target = parse_expression_list(tokens)?;
    check_assign_target(&target)?;
    Ok(target)
}

/// Statements that fit on one line and end with a newline.
pub fn parse_simple_statement(tokens: &mut FileTokens) -> Result<Statement, CompilerError> {
    let location = tokens.current_location();

    let kind = match tokens.current_token_kind() {
        TokenKind::Pass => {
            tokens.advance();
            StatementKind::Pass
        }
        TokenKind::Break => {
            tokens.advance();
            StatementKind::Break
        }
        TokenKind::Continue => {
            tokens.advance();
            StatementKind::Continue
        }
        TokenKind::Return => {
            tokens.advance();
            if starts_expression(tokens.current_token_kind()) {
                StatementKind::Return(Some(parse_expression_list(tokens)?))
            } else {
                StatementKind::Return(None)
            }
        }
        _ => parse_expression_statement(tokens)?,
    };

    let end = tokens.current_location();
    match tokens.current_token_kind() {
        TokenKind::Newline => tokens.advance(),
        TokenKind::Eof | TokenKind::Dedent => {}
        other => return_syntax_error!(
            format!("Expected the end of the line, found {other}"),
            tokens.current_location().to_error_location(),
            {
                CompilationStage => "Parsing",
            }
        ),
    }

    Ok(Statement::new(kind, location.to(end)))
}

fn parse_expression_statement(tokens: &mut FileTokens) -> Result<StatementKind, CompilerError> {
    let first = parse_expression_list(tokens)?;

    let augmented = match tokens.current_token_kind() {
        TokenKind::AddAssign => Some(BinaryOperator::Add),
        TokenKind::SubtractAssign => Some(BinaryOperator::Subtract),
        TokenKind::MultiplyAssign => Some(BinaryOperator::Multiply),
        TokenKind::DivideAssign => Some(BinaryOperator::Divide),
        _ => None,
    };

    if let Some(op) = augmented {
        if !matches!(
            first.kind,
            ExpressionKind::Name(_)
                | ExpressionKind::Subscript { .. }
                | ExpressionKind::Attribute { .. }
        ) {
            return_syntax_error!(
                "Illegal target for augmented assignment",
                first.location.to_error_location()
            )
        }
        tokens.advance();
        let value = parse_expression_list(tokens)?;
        return Ok(StatementKind::AugAssign {
            target: first,
            op,
            value,
        });
    }

    if tokens.current_token_kind() != &TokenKind::Assign {
        return Ok(StatementKind::Expression(first));
    }

    // a = b = value
    let mut targets = vec![first];
    let value = loop {
        tokens.advance();
        let next = parse_expression_list(tokens)?;
        if tokens.current_token_kind() != &TokenKind::Assign {
            break next;
        }
        targets.push(next);
    };

    for target in &targets {
        check_assign_target(target)?;
    }

    Ok(StatementKind::Assign { targets, value })
}

fn check_assign_target(target: &Expression) -> Result<(), CompilerError> {
    match &target.kind {
        ExpressionKind::Name(_)
        | ExpressionKind::Subscript { .. }
        | ExpressionKind::Attribute { .. } => Ok(()),

        ExpressionKind::Tuple(items) | ExpressionKind::List(items) => {
            for item in items {
                check_assign_target(item)?;
            }
            Ok(())
        }

        _ => return_syntax_error!(
            "Cannot assign to this expression",
            target.location.to_error_location(),
            {
                CompilationStage => "Parsing",
                PrimarySuggestion => "Assign to a name, a subscript or a tuple of names",
            }
        ),
    }
}

use crate::compiler_frontend::ast::ast_nodes::{
    Annotation, Definition, FunctionRole, RawFunctionDefinition, RawParameter, SourceModule,
};
use crate::compiler_frontend::ast::expressions::parse_expression::{expect, parse_expression};
use crate::compiler_frontend::ast::statements::parse_statement::parse_block;
use crate::compiler_frontend::compiler_errors::CompilerError;
use crate::compiler_frontend::compiler_warnings::{CompilerWarning, WarningKind};
use crate::compiler_frontend::tokenizer::tokenizer::tokenize;
use crate::compiler_frontend::tokenizer::tokens::{FileTokens, TextLocation, TokenKind};
use crate::{ast_log, return_syntax_error};

pub const FUNC_DECORATOR: &str = "func";
pub const KERNEL_DECORATOR: &str = "kernel";
pub const LOG_TIME_DECORATOR: &str = "log_time";

/// Parses a whole source file into decorated function definitions.
///
/// Only `def` is allowed at the top level.
pub fn parse_module(
    source_code: &str,
    warnings: &mut Vec<CompilerWarning>,
) -> Result<SourceModule, CompilerError> {
    let mut tokens = tokenize(source_code)?;
    let mut module = SourceModule::default();

    loop {
        tokens.skip_newlines();
        if tokens.current_token_kind() == &TokenKind::Eof {
            break;
        }

        let definition = parse_definition(&mut tokens, warnings)?;
        ast_log!(Green "Parsed definition: ", #definition.function.name);

        if module
            .definitions
            .iter()
            .any(|d| d.function.name == definition.function.name)
        {
            return_syntax_error!(
                format!(
                    "Function '{}' is defined more than once in this file",
                    definition.function.name
                ),
                definition.function.location.to_error_location(),
                {
                    FunctionName => definition.function.name.as_str(),
                }
            )
        }

        module.definitions.push(definition);
    }

    Ok(module)
}

fn parse_definition(
    tokens: &mut FileTokens,
    warnings: &mut Vec<CompilerWarning>,
) -> Result<Definition, CompilerError> {
    let mut role = FunctionRole::Host;
    let mut timed = false;

    while tokens.current_token_kind() == &TokenKind::At {
        let location = tokens.current_location();
        tokens.advance();
        let decorator = parse_dotted_name(tokens)?;

        // @func() is the same as @func
        if tokens.current_token_kind() == &TokenKind::OpenParenthesis {
            tokens.advance();
            expect(tokens, TokenKind::CloseParenthesis, "after the decorator")?;
        }
        expect(tokens, TokenKind::Newline, "after the decorator")?;
        tokens.skip_newlines();

        match decorator.final_segment() {
            FUNC_DECORATOR | KERNEL_DECORATOR if role != FunctionRole::Host => {
                return_syntax_error!(
                    "A function can only have one of @func or @kernel",
                    location.to_error_location()
                )
            }
            FUNC_DECORATOR => role = FunctionRole::Func,
            KERNEL_DECORATOR => role = FunctionRole::Kernel,
            LOG_TIME_DECORATOR => timed = true,
            other => warnings.push(CompilerWarning::new(
                format!("'@{other}' is not a known decorator and will be ignored"),
                &location,
                WarningKind::UnknownDecorator,
            )),
        }
    }

    let function = parse_function(tokens)?;
    Ok(Definition {
        function,
        role,
        timed,
    })
}

pub fn parse_function(tokens: &mut FileTokens) -> Result<RawFunctionDefinition, CompilerError> {
    let location = tokens.current_location();

    if tokens.current_token_kind() != &TokenKind::Def {
        return_syntax_error!(
            format!(
                "Expected a function definition, found {}",
                tokens.current_token_kind()
            ),
            location.to_error_location(),
            {
                CompilationStage => "Parsing",
                PrimarySuggestion => "Only 'def' blocks are allowed at the top level of a file",
            }
        )
    }
    tokens.advance();

    let name = parse_name(tokens, "after 'def'")?;
    expect(tokens, TokenKind::OpenParenthesis, "after the function name")?;
    let parameters = parse_parameters(tokens)?;
    expect(tokens, TokenKind::CloseParenthesis, "to close the parameter list")?;

    let returns = if tokens.current_token_kind() == &TokenKind::Arrow {
        tokens.advance();
        Some(parse_dotted_name(tokens)?)
    } else {
        None
    };

    let header_end = tokens.current_location();
    let body = parse_block(tokens)?;

    Ok(RawFunctionDefinition {
        name,
        parameters,
        returns,
        body,
        location: location.to(header_end),
    })
}

fn parse_parameters(tokens: &mut FileTokens) -> Result<Vec<RawParameter>, CompilerError> {
    let mut parameters: Vec<RawParameter> = Vec::new();

    while tokens.current_token_kind() != &TokenKind::CloseParenthesis {
        let location = tokens.current_location();
        let name = parse_name(tokens, "in the parameter list")?;

        if parameters.iter().any(|p| p.name == name) {
            return_syntax_error!(
                format!("Duplicate parameter '{name}'"),
                location.to_error_location(),
                {
                    VariableName => name.as_str(),
                }
            )
        }

        let annotation = if tokens.current_token_kind() == &TokenKind::Colon {
            tokens.advance();
            Some(parse_dotted_name(tokens)?)
        } else {
            None
        };

        let default = if tokens.current_token_kind() == &TokenKind::Assign {
            tokens.advance();
            Some(parse_expression(tokens)?)
        } else {
            None
        };

        if default.is_none() && parameters.iter().any(|p| p.default.is_some()) {
            return_syntax_error!(
                format!("Parameter '{name}' without a default follows a parameter with a default"),
                location.to_error_location()
            )
        }

        parameters.push(RawParameter {
            name,
            annotation,
            default,
        });

        match tokens.current_token_kind() {
            TokenKind::Comma => tokens.advance(),
            TokenKind::CloseParenthesis => break,
            other => return_syntax_error!(
                format!("Expected ',' or ')' in the parameter list, found {other}"),
                tokens.current_location().to_error_location()
            ),
        }
    }

    Ok(parameters)
}

fn parse_name(tokens: &mut FileTokens, context: &str) -> Result<String, CompilerError> {
    let TokenKind::Name(name) = tokens.current_token_kind().to_owned() else {
        return_syntax_error!(
            format!(
                "Expected a name {context}, found {}",
                tokens.current_token_kind()
            ),
            tokens.current_location().to_error_location()
        )
    };
    tokens.advance();
    Ok(name)
}

fn parse_dotted_name(tokens: &mut FileTokens) -> Result<Annotation, CompilerError> {
    let mut path = vec![parse_name(tokens, "in the annotation")?];

    while tokens.current_token_kind() == &TokenKind::Dot {
        tokens.advance();
        path.push(parse_name(tokens, "after '.'")?);
    }

    Ok(Annotation { path })
}

/// Parses source holding exactly one function, ignoring decorators.
pub fn parse_single_function(source_code: &str) -> Result<RawFunctionDefinition, CompilerError> {
    let mut warnings = Vec::new();
    let module = parse_module(source_code, &mut warnings)?;

    let mut definitions = module.definitions.into_iter();
    match (definitions.next(), definitions.next()) {
        (Some(definition), None) => Ok(definition.function),
        _ => return_syntax_error!(
            "Expected exactly one function definition",
            TextLocation::default().to_error_location()
        ),
    }
}

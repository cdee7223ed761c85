use crate::compiler_frontend::compiler_errors::CompilerError;
use crate::compiler_frontend::tokenizer::tokens::{
    FileTokens, TextLocation, Token, TokenKind, TokenStream,
};
use crate::projects::settings;
use crate::{return_syntax_error, token_log};

const TAB_WIDTH: usize = 8;

macro_rules! return_token {
    ($kind:expr, $stream:expr $(,)?) => {
        return Ok(Token::new($kind, $stream.new_location()))
    };
}

/// Turns source text into a token list ending with `Eof`.
///
/// Layout is handled here: the start of every logical line is measured against an indentation
/// stack and produces `Indent`/`Dedent` tokens. Newlines inside brackets are ignored.
pub fn tokenize(source_code: &str) -> Result<FileTokens, CompilerError> {
    let initial_capacity = source_code.len() / settings::SRC_TO_TOKEN_RATIO;

    let mut tokens: Vec<Token> = Vec::with_capacity(initial_capacity);
    let mut stream = TokenStream::new(source_code);
    let mut indent_stack: Vec<usize> = vec![0];
    let mut bracket_depth: usize = 0;
    let mut at_line_start = true;

    loop {
        if at_line_start && bracket_depth == 0 {
            let Some(indent) = measure_indentation(&mut stream) else {
                // Blank or comment-only line
                continue;
            };

            at_line_start = false;
            push_layout(&mut tokens, &mut stream, &mut indent_stack, indent)?;
        }

        let token = get_token_kind(&mut stream, &mut bracket_depth)?;
        token_log!(#token);

        match token.kind {
            TokenKind::Eof => {
                if !matches!(
                    tokens.last().map(|t| &t.kind),
                    None | Some(TokenKind::Newline | TokenKind::Dedent)
                ) {
                    tokens.push(Token::new(TokenKind::Newline, token.location));
                }

                while indent_stack.len() > 1 {
                    indent_stack.pop();
                    tokens.push(Token::new(TokenKind::Dedent, token.location));
                }

                tokens.push(token);
                break;
            }

            TokenKind::Newline => {
                at_line_start = true;
                tokens.push(token);
            }

            _ => tokens.push(token),
        }
    }

    Ok(FileTokens::new(tokens))
}

// Counts the indentation of the next line.
// Returns None after consuming a line that holds nothing but whitespace or a comment.
fn measure_indentation(stream: &mut TokenStream) -> Option<usize> {
    let mut indent = 0;

    while let Some(&ch) = stream.peek() {
        match ch {
            ' ' => indent += 1,
            '\t' => indent = (indent / TAB_WIDTH + 1) * TAB_WIDTH,
            '\r' | '\x0c' => {}
            _ => break,
        }
        stream.next();
    }

    match stream.peek() {
        Some('#') => {
            skip_comment(stream);
            stream.next();
            None
        }

        Some('\n') => {
            stream.next();
            None
        }

        // Trailing whitespace closes every open block
        None => Some(0),

        _ => Some(indent),
    }
}

fn push_layout(
    tokens: &mut Vec<Token>,
    stream: &mut TokenStream,
    indent_stack: &mut Vec<usize>,
    indent: usize,
) -> Result<(), CompilerError> {
    stream.update_start_position();
    let current = indent_stack.last().copied().unwrap_or_default();

    if indent > current {
        indent_stack.push(indent);
        tokens.push(Token::new(TokenKind::Indent, stream.new_location()));
        return Ok(());
    }

    while indent < indent_stack.last().copied().unwrap_or_default() {
        indent_stack.pop();
        tokens.push(Token::new(TokenKind::Dedent, stream.new_location()));
    }

    if indent != indent_stack.last().copied().unwrap_or_default() {
        return_syntax_error!(
            "Unindent does not match any outer indentation level",
            stream.new_location().to_error_location(),
            {
                CompilationStage => "Tokenization",
                PrimarySuggestion => "Line this statement up with the block it belongs to",
            }
        )
    }

    Ok(())
}

fn skip_comment(stream: &mut TokenStream) {
    while let Some(&ch) = stream.peek() {
        if ch == '\n' {
            break;
        }
        stream.next();
    }
}

pub fn get_token_kind(
    stream: &mut TokenStream,
    bracket_depth: &mut usize,
) -> Result<Token, CompilerError> {
    // Whitespace, comments and line continuations between tokens
    loop {
        match stream.peek() {
            Some(' ' | '\t' | '\r' | '\x0c') => {
                stream.next();
            }

            Some('#') => skip_comment(stream),

            Some('\\') => {
                stream.next();
                if stream.peek() == Some(&'\r') {
                    stream.next();
                }
                if stream.next() != Some('\n') {
                    return_syntax_error!(
                        "Unexpected character after line continuation character",
                        stream.new_location().to_error_location()
                    )
                }
            }

            Some('\n') if *bracket_depth > 0 => {
                stream.next();
            }

            _ => break,
        }
    }

    // To ignore leading whitespace for the next token position
    stream.update_start_position();

    let current_char = match stream.next() {
        Some(ch) => ch,
        None => return_token!(TokenKind::Eof, stream),
    };

    match current_char {
        '\n' => return_token!(TokenKind::Newline, stream),

        '(' => {
            *bracket_depth += 1;
            return_token!(TokenKind::OpenParenthesis, stream)
        }
        '[' => {
            *bracket_depth += 1;
            return_token!(TokenKind::OpenBracket, stream)
        }
        ')' => {
            *bracket_depth = bracket_depth.saturating_sub(1);
            return_token!(TokenKind::CloseParenthesis, stream)
        }
        ']' => {
            *bracket_depth = bracket_depth.saturating_sub(1);
            return_token!(TokenKind::CloseBracket, stream)
        }

        '@' => return_token!(TokenKind::At, stream),
        ',' => return_token!(TokenKind::Comma, stream),
        ':' => return_token!(TokenKind::Colon, stream),

        '.' => {
            if stream.peek().is_some_and(|c| c.is_ascii_digit()) {
                return tokenize_number('.', stream);
            }
            return_token!(TokenKind::Dot, stream)
        }

        '+' => {
            if next_is(stream, '=') {
                return_token!(TokenKind::AddAssign, stream)
            }
            return_token!(TokenKind::Add, stream)
        }

        '-' => {
            if next_is(stream, '=') {
                return_token!(TokenKind::SubtractAssign, stream)
            }
            if next_is(stream, '>') {
                return_token!(TokenKind::Arrow, stream)
            }
            return_token!(TokenKind::Subtract, stream)
        }

        '*' => {
            if next_is(stream, '*') {
                return_token!(TokenKind::Exponent, stream)
            }
            if next_is(stream, '=') {
                return_token!(TokenKind::MultiplyAssign, stream)
            }
            return_token!(TokenKind::Multiply, stream)
        }

        '/' => {
            if next_is(stream, '/') {
                return_token!(TokenKind::FloorDivide, stream)
            }
            if next_is(stream, '=') {
                return_token!(TokenKind::DivideAssign, stream)
            }
            return_token!(TokenKind::Divide, stream)
        }

        '%' => return_token!(TokenKind::Modulus, stream),

        '=' => {
            if next_is(stream, '=') {
                return_token!(TokenKind::Equal, stream)
            }
            return_token!(TokenKind::Assign, stream)
        }

        '!' => {
            if next_is(stream, '=') {
                return_token!(TokenKind::NotEqual, stream)
            }
            return_syntax_error!(
                "Unexpected '!'",
                stream.new_location().to_error_location(),
                {
                    CompilationStage => "Tokenization",
                    PrimarySuggestion => "Use 'not' for negation",
                }
            )
        }

        '<' => {
            if next_is(stream, '=') {
                return_token!(TokenKind::LessThanOrEqual, stream)
            }
            return_token!(TokenKind::LessThan, stream)
        }

        '>' => {
            if next_is(stream, '=') {
                return_token!(TokenKind::GreaterThanOrEqual, stream)
            }
            return_token!(TokenKind::GreaterThan, stream)
        }

        '"' | '\'' => tokenize_string(current_char, stream),

        c if c.is_ascii_digit() => tokenize_number(c, stream),

        c if is_name_start(c) => keyword_or_name(c, stream),

        c => return_syntax_error!(
            format!("Invalid character '{c}'"),
            stream.new_location().to_error_location(),
            {
                CompilationStage => "Tokenization",
            }
        ),
    }
}

fn next_is(stream: &mut TokenStream, expected: char) -> bool {
    if stream.peek() == Some(&expected) {
        stream.next();
        return true;
    }

    false
}

fn is_name_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

fn is_name_char(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

fn keyword_or_name(first: char, stream: &mut TokenStream) -> Result<Token, CompilerError> {
    let mut token_value = String::from(first);

    while let Some(&ch) = stream.peek() {
        if !is_name_char(ch) {
            break;
        }
        token_value.push(ch);
        stream.next();
    }

    match TokenKind::keyword(&token_value) {
        Some(keyword) => return_token!(keyword, stream),
        None => return_token!(TokenKind::Name(token_value), stream),
    }
}

fn tokenize_number(first: char, stream: &mut TokenStream) -> Result<Token, CompilerError> {
    let mut token_value = String::from(first);
    let mut is_float = first == '.';

    push_digits(&mut token_value, stream);

    if !is_float && stream.peek() == Some(&'.') {
        is_float = true;
        token_value.push('.');
        stream.next();
        push_digits(&mut token_value, stream);
    }

    if matches!(stream.peek(), Some('e' | 'E')) {
        is_float = true;
        token_value.push('e');
        stream.next();

        if let Some(&sign) = stream.peek()
            && (sign == '+' || sign == '-')
        {
            token_value.push(sign);
            stream.next();
        }

        if !stream.peek().is_some_and(|c| c.is_ascii_digit()) {
            return_syntax_error!(
                format!("Malformed exponent in number literal '{token_value}'"),
                stream.new_location().to_error_location()
            )
        }

        push_digits(&mut token_value, stream);
    }

    if stream.peek().is_some_and(|c| is_name_start(*c)) {
        return_syntax_error!(
            format!("Invalid number literal '{token_value}'"),
            stream.new_location().to_error_location()
        )
    }

    if is_float {
        match token_value.parse::<f64>() {
            Ok(value) => return_token!(TokenKind::FloatLiteral(value), stream),
            Err(_) => return_syntax_error!(
                format!("Invalid float literal '{token_value}'"),
                stream.new_location().to_error_location()
            ),
        }
    }

    match token_value.parse::<i64>() {
        Ok(value) => return_token!(TokenKind::IntLiteral(value), stream),
        Err(_) => return_syntax_error!(
            format!("Integer literal '{token_value}' does not fit in 64 bits"),
            stream.new_location().to_error_location()
        ),
    }
}

// Digits with optional '_' separators
fn push_digits(token_value: &mut String, stream: &mut TokenStream) {
    while let Some(&ch) = stream.peek() {
        if ch.is_ascii_digit() {
            token_value.push(ch);
        } else if ch != '_' {
            break;
        }
        stream.next();
    }
}

fn tokenize_string(quote: char, stream: &mut TokenStream) -> Result<Token, CompilerError> {
    let mut token_value = String::new();
    let mut triple = false;

    if stream.peek() == Some(&quote) {
        stream.next();
        if stream.peek() != Some(&quote) {
            // Empty string
            return_token!(TokenKind::StringLiteral(token_value), stream)
        }
        stream.next();
        triple = true;
    }

    loop {
        let Some(ch) = stream.next() else {
            return_syntax_error!(
                "Unterminated string literal",
                stream.new_location().to_error_location(),
                {
                    CompilationStage => "Tokenization",
                    PrimarySuggestion => "Add a closing quote at the end of the string",
                }
            )
        };

        match ch {
            '\\' => {
                let Some(escaped) = stream.next() else {
                    continue;
                };
                match escaped {
                    'n' => token_value.push('\n'),
                    't' => token_value.push('\t'),
                    'r' => token_value.push('\r'),
                    '0' => token_value.push('\0'),
                    '\\' => token_value.push('\\'),
                    '\'' => token_value.push('\''),
                    '"' => token_value.push('"'),
                    '\n' => {}
                    other => {
                        token_value.push('\\');
                        token_value.push(other);
                    }
                }
            }

            '\n' if !triple => {
                return_syntax_error!(
                    "Unterminated string literal",
                    TextLocation::new_just_line(stream.position.line_number - 1)
                        .to_error_location(),
                    {
                        CompilationStage => "Tokenization",
                        PrimarySuggestion => "Close the string before the end of the line",
                    }
                )
            }

            c if c == quote => {
                if !triple {
                    return_token!(TokenKind::StringLiteral(token_value), stream)
                }

                if stream.peek() == Some(&quote) {
                    stream.next();
                    if stream.peek() == Some(&quote) {
                        stream.next();
                        return_token!(TokenKind::StringLiteral(token_value), stream)
                    }
                    token_value.push(quote);
                }
                token_value.push(quote);
            }

            c => token_value.push(c),
        }
    }
}

#[cfg(test)]
#[path = "tests/tokenizer_tests.rs"]
mod tests;

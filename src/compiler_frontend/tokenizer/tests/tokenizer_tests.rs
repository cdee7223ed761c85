//! Tests for tokenizing the function syntax, including indentation layout.

use super::tokenize;
use crate::compiler_frontend::compiler_errors::ErrorType;
use crate::compiler_frontend::tokenizer::tokens::TokenKind;

fn kinds(source: &str) -> Vec<TokenKind> {
    tokenize(source)
        .expect("source should tokenize")
        .tokens
        .into_iter()
        .map(|token| token.kind)
        .collect()
}

fn name(value: &str) -> TokenKind {
    TokenKind::Name(String::from(value))
}

#[test]
fn function_header_and_body_produce_layout_tokens() {
    let tokens = kinds("def f(i: Int32) -> Int32:\n    return i\n");

    assert_eq!(
        tokens,
        vec![
            TokenKind::Def,
            name("f"),
            TokenKind::OpenParenthesis,
            name("i"),
            TokenKind::Colon,
            name("Int32"),
            TokenKind::CloseParenthesis,
            TokenKind::Arrow,
            name("Int32"),
            TokenKind::Colon,
            TokenKind::Newline,
            TokenKind::Indent,
            TokenKind::Return,
            name("i"),
            TokenKind::Newline,
            TokenKind::Dedent,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn blank_lines_and_comments_do_not_change_layout() {
    let tokens = kinds("x = 1  # one\n\n   # indented comment\ny = 2");

    assert_eq!(
        tokens,
        vec![
            name("x"),
            TokenKind::Assign,
            TokenKind::IntLiteral(1),
            TokenKind::Newline,
            name("y"),
            TokenKind::Assign,
            TokenKind::IntLiteral(2),
            TokenKind::Newline,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn nested_blocks_close_with_one_dedent_each() {
    let tokens = kinds("for i in range(3):\n    for j in range(2):\n        x = j\ny = 0\n");
    let dedents = tokens
        .iter()
        .filter(|kind| **kind == TokenKind::Dedent)
        .count();
    let indents = tokens
        .iter()
        .filter(|kind| **kind == TokenKind::Indent)
        .count();

    assert_eq!(indents, 2);
    assert_eq!(dedents, 2);
}

#[test]
fn unclosed_blocks_are_closed_at_end_of_file() {
    let tokens = kinds("def f():\n    if x:\n        pass");

    assert_eq!(
        &tokens[tokens.len() - 4..],
        &[
            TokenKind::Newline,
            TokenKind::Dedent,
            TokenKind::Dedent,
            TokenKind::Eof
        ]
    );
}

#[test]
fn newlines_inside_brackets_are_joined() {
    let tokens = kinds("total = f(1,\n          2)\n");

    assert_eq!(
        tokens,
        vec![
            name("total"),
            TokenKind::Assign,
            name("f"),
            TokenKind::OpenParenthesis,
            TokenKind::IntLiteral(1),
            TokenKind::Comma,
            TokenKind::IntLiteral(2),
            TokenKind::CloseParenthesis,
            TokenKind::Newline,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn operators_use_longest_match() {
    let tokens = kinds("a ** b // c -> d += e <= f != g == h");

    assert!(tokens.contains(&TokenKind::Exponent));
    assert!(tokens.contains(&TokenKind::FloorDivide));
    assert!(tokens.contains(&TokenKind::Arrow));
    assert!(tokens.contains(&TokenKind::AddAssign));
    assert!(tokens.contains(&TokenKind::LessThanOrEqual));
    assert!(tokens.contains(&TokenKind::NotEqual));
    assert!(tokens.contains(&TokenKind::Equal));
    assert!(!tokens.contains(&TokenKind::Multiply));
    assert!(!tokens.contains(&TokenKind::Divide));
}

#[test]
fn number_literals_parse_ints_and_floats() {
    let tokens = kinds("1 2.5 .5 1e3 2E-2 1_000");

    assert_eq!(
        &tokens[..6],
        &[
            TokenKind::IntLiteral(1),
            TokenKind::FloatLiteral(2.5),
            TokenKind::FloatLiteral(0.5),
            TokenKind::FloatLiteral(1000.0),
            TokenKind::FloatLiteral(0.02),
            TokenKind::IntLiteral(1000),
        ]
    );
}

#[test]
fn strings_handle_escapes_and_triple_quotes() {
    let tokens = kinds("'a\\tb' \"\" \"\"\"doc \"quoted\" text\"\"\"");

    assert_eq!(
        &tokens[..3],
        &[
            TokenKind::StringLiteral(String::from("a\tb")),
            TokenKind::StringLiteral(String::new()),
            TokenKind::StringLiteral(String::from("doc \"quoted\" text")),
        ]
    );
}

#[test]
fn keywords_are_not_names() {
    let tokens = kinds("while True and not None: pass");

    assert_eq!(
        &tokens[..7],
        &[
            TokenKind::While,
            TokenKind::True,
            TokenKind::And,
            TokenKind::Not,
            TokenKind::None,
            TokenKind::Colon,
            TokenKind::Pass,
        ]
    );
}

#[test]
fn inconsistent_dedent_is_a_syntax_error() {
    let error = tokenize("if x:\n        y = 1\n    z = 2\n").expect_err("dedent should fail");

    assert_eq!(error.error_type, ErrorType::Syntax);
    assert!(error.msg.contains("indentation"));
    assert_eq!(error.location.start_pos.line_number, 2);
}

#[test]
fn unterminated_string_is_a_syntax_error() {
    let error = tokenize("x = 'abc\ny = 1").expect_err("string should fail");

    assert_eq!(error.error_type, ErrorType::Syntax);
    assert!(error.msg.contains("Unterminated"));
}

#[test]
fn locations_track_lines_and_columns() {
    let file_tokens = tokenize("x = 1\n  \ny = 22\n").expect("source should tokenize");
    let y = file_tokens
        .tokens
        .iter()
        .find(|token| token.kind == name("y"))
        .expect("y token should exist");
    let literal = file_tokens
        .tokens
        .iter()
        .find(|token| token.kind == TokenKind::IntLiteral(22))
        .expect("literal should exist");

    assert_eq!(y.location.start_pos.line_number, 2);
    assert_eq!(y.location.start_pos.char_column, 0);
    assert_eq!(literal.location.start_pos.char_column, 4);
    assert_eq!(literal.location.end_pos.char_column, 6);
}

use crate::compiler_frontend::compiler_errors::ErrorLocation;
use crate::token_log;
use std::fmt::{Display, Formatter};
use std::iter::Peekable;
use std::path::Path;
use std::str::Chars;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct CharPosition {
    pub line_number: i32,
    pub char_column: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct TextLocation {
    pub start_pos: CharPosition,
    pub end_pos: CharPosition,
}

impl TextLocation {
    pub fn new(start: CharPosition, end: CharPosition) -> Self {
        Self {
            start_pos: start,
            end_pos: end,
        }
    }

    pub fn new_just_line(start: i32) -> Self {
        Self {
            start_pos: CharPosition {
                line_number: start,
                char_column: 0,
            },
            end_pos: CharPosition {
                line_number: start,
                char_column: 120, // Arbitrary number
            },
        }
    }

    /// Spans from the start of this location to the end of another.
    pub fn to(self, end: TextLocation) -> TextLocation {
        TextLocation::new(self.start_pos, end.end_pos)
    }

    pub fn to_error_location(&self) -> ErrorLocation {
        ErrorLocation::from_text_location(self)
    }

    pub fn to_error_location_in(&self, file_path: &Path) -> ErrorLocation {
        ErrorLocation {
            scope: file_path.to_path_buf(),
            start_pos: self.start_pos,
            end_pos: self.end_pos,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub location: TextLocation,
}

impl Token {
    pub fn new(kind: TokenKind, location: TextLocation) -> Self {
        Token { kind, location }
    }
}

#[derive(Clone, Debug)]
pub struct FileTokens {
    pub tokens: Vec<Token>,
    pub index: usize,
    pub length: usize,
}

impl FileTokens {
    /// The token list must end with `Eof`. The tokenizer guarantees it.
    pub fn new(mut tokens: Vec<Token>) -> FileTokens {
        if !matches!(tokens.last(), Some(Token { kind: TokenKind::Eof, .. })) {
            let location = tokens.last().map(|t| t.location).unwrap_or_default();
            tokens.push(Token::new(TokenKind::Eof, location));
        }

        FileTokens {
            length: tokens.len(),
            tokens,
            index: 0,
        }
    }

    pub fn current_token_kind(&self) -> &TokenKind {
        &self.tokens[self.index].kind
    }

    pub fn current_token(&self) -> Token {
        self.tokens[self.index].clone()
    }

    pub fn peek_next_token(&self) -> Option<&TokenKind> {
        self.tokens.get(self.index + 1).map(|token| &token.kind)
    }

    pub fn current_location(&self) -> TextLocation {
        self.tokens[self.index].location
    }

    pub fn advance(&mut self) {
        match self.current_token_kind() {
            // Can't advance past End of File
            TokenKind::Eof => {
                token_log!(Red "Parser tried to advance past EOF");
            }

            _ => {
                self.index += 1;
            }
        }
    }

    pub fn skip_newlines(&mut self) {
        while matches!(self.current_token_kind(), TokenKind::Newline) {
            self.index += 1;
        }
    }
}

pub struct TokenStream<'a> {
    pub chars: Peekable<Chars<'a>>,
    pub position: CharPosition,
    pub start_position: CharPosition,
}

impl<'a> TokenStream<'a> {
    pub fn new(source_code: &'a str) -> Self {
        Self {
            chars: source_code.chars().peekable(),
            position: CharPosition::default(),
            start_position: CharPosition::default(),
        }
    }

    pub fn next(&mut self) -> Option<char> {
        match self.chars.peek() {
            Some(c) => {
                if *c == '\n' {
                    self.position.line_number += 1;
                    self.position.char_column = 0;
                } else {
                    self.position.char_column += 1;
                }

                self.chars.next()
            }

            None => None,
        }
    }

    pub fn peek(&mut self) -> Option<&char> {
        self.chars.peek()
    }

    pub fn new_location(&mut self) -> TextLocation {
        let start_pos = self.start_position;
        self.update_start_position();
        TextLocation::new(start_pos, self.position)
    }

    pub fn update_start_position(&mut self) {
        self.start_position = self.position;
    }
}

#[derive(PartialEq, Debug, Clone)]
pub enum TokenKind {
    // Literals
    Name(String),
    IntLiteral(i64),
    FloatLiteral(f64),
    StringLiteral(String),

    // Keywords
    Def,
    Return,
    For,
    In,
    While,
    If,
    Elif,
    Else,
    Pass,
    Break,
    Continue,
    And,
    Or,
    Not,
    True,
    False,
    None,

    // Punctuation
    At,
    OpenParenthesis,
    CloseParenthesis,
    OpenBracket,
    CloseBracket,
    Comma,
    Colon,
    Dot,
    Arrow,

    // Assignment
    Assign,
    AddAssign,
    SubtractAssign,
    MultiplyAssign,
    DivideAssign,

    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    FloorDivide,
    Modulus,
    Exponent,

    // Comparison
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,

    // Layout
    Newline,
    Indent,
    Dedent,
    Eof,
}

impl TokenKind {
    pub fn keyword(word: &str) -> Option<TokenKind> {
        let kind = match word {
            "def" => TokenKind::Def,
            "return" => TokenKind::Return,
            "for" => TokenKind::For,
            "in" => TokenKind::In,
            "while" => TokenKind::While,
            "if" => TokenKind::If,
            "elif" => TokenKind::Elif,
            "else" => TokenKind::Else,
            "pass" => TokenKind::Pass,
            "break" => TokenKind::Break,
            "continue" => TokenKind::Continue,
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "not" => TokenKind::Not,
            "True" => TokenKind::True,
            "False" => TokenKind::False,
            "None" => TokenKind::None,
            _ => return None,
        };

        Some(kind)
    }

    pub fn is_augmented_assign(&self) -> bool {
        matches!(
            self,
            TokenKind::AddAssign
                | TokenKind::SubtractAssign
                | TokenKind::MultiplyAssign
                | TokenKind::DivideAssign
        )
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            TokenKind::Name(name) => return write!(f, "name '{name}'"),
            TokenKind::IntLiteral(value) => return write!(f, "{value}"),
            TokenKind::FloatLiteral(value) => return write!(f, "{value:?}"),
            TokenKind::StringLiteral(value) => return write!(f, "{value:?}"),
            TokenKind::Def => "def",
            TokenKind::Return => "return",
            TokenKind::For => "for",
            TokenKind::In => "in",
            TokenKind::While => "while",
            TokenKind::If => "if",
            TokenKind::Elif => "elif",
            TokenKind::Else => "else",
            TokenKind::Pass => "pass",
            TokenKind::Break => "break",
            TokenKind::Continue => "continue",
            TokenKind::And => "and",
            TokenKind::Or => "or",
            TokenKind::Not => "not",
            TokenKind::True => "True",
            TokenKind::False => "False",
            TokenKind::None => "None",
            TokenKind::At => "@",
            TokenKind::OpenParenthesis => "(",
            TokenKind::CloseParenthesis => ")",
            TokenKind::OpenBracket => "[",
            TokenKind::CloseBracket => "]",
            TokenKind::Comma => ",",
            TokenKind::Colon => ":",
            TokenKind::Dot => ".",
            TokenKind::Arrow => "->",
            TokenKind::Assign => "=",
            TokenKind::AddAssign => "+=",
            TokenKind::SubtractAssign => "-=",
            TokenKind::MultiplyAssign => "*=",
            TokenKind::DivideAssign => "/=",
            TokenKind::Add => "+",
            TokenKind::Subtract => "-",
            TokenKind::Multiply => "*",
            TokenKind::Divide => "/",
            TokenKind::FloorDivide => "//",
            TokenKind::Modulus => "%",
            TokenKind::Exponent => "**",
            TokenKind::Equal => "==",
            TokenKind::NotEqual => "!=",
            TokenKind::LessThan => "<",
            TokenKind::LessThanOrEqual => "<=",
            TokenKind::GreaterThan => ">",
            TokenKind::GreaterThanOrEqual => ">=",
            TokenKind::Newline => "newline",
            TokenKind::Indent => "indent",
            TokenKind::Dedent => "dedent",
            TokenKind::Eof => "end of file",
        };

        f.write_str(text)
    }
}

use crate::compiler_frontend::compiler_warnings::CompilerWarning;
use crate::compiler_frontend::tokenizer::tokens::{CharPosition, TextLocation};
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

// The final set of errors and warnings emitted from the pipeline
#[derive(Debug, Default)]
pub struct CompilerMessages {
    pub errors: Vec<CompilerError>,
    pub warnings: Vec<CompilerWarning>,
}

impl CompilerMessages {
    pub fn from_error(error: CompilerError, warnings: Vec<CompilerWarning>) -> Self {
        CompilerMessages {
            errors: vec![error],
            warnings,
        }
    }

    pub fn from_warnings(warnings: Vec<CompilerWarning>) -> Self {
        CompilerMessages {
            errors: Vec::new(),
            warnings,
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

impl From<CompilerError> for CompilerMessages {
    fn from(error: CompilerError) -> Self {
        CompilerMessages::from_error(error, Vec::new())
    }
}

#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq)]
pub enum ErrorMetaDataKey {
    FunctionName,
    VariableName,
    CompilationStage,

    PrimarySuggestion,
    AlternativeSuggestion,

    ExpectedType,
    FoundType,
}

/// Where an error happened. The scope is the source file when one is known.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorLocation {
    pub scope: PathBuf,
    pub start_pos: CharPosition,
    pub end_pos: CharPosition,
}

impl ErrorLocation {
    pub fn from_text_location(location: &TextLocation) -> Self {
        ErrorLocation {
            scope: PathBuf::new(),
            start_pos: location.start_pos,
            end_pos: location.end_pos,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompilerError {
    pub msg: String,
    pub location: ErrorLocation,
    pub error_type: ErrorType,

    // Structured detail for the error printer
    pub metadata: HashMap<ErrorMetaDataKey, String>,
}

impl CompilerError {
    pub fn new(msg: impl Into<String>, location: ErrorLocation, error_type: ErrorType) -> Self {
        CompilerError {
            msg: msg.into(),
            location,
            error_type,
            metadata: HashMap::new(),
        }
    }

    /// Create an error that has no meaningful source location
    pub fn without_location(msg: impl Into<String>, error_type: ErrorType) -> Self {
        CompilerError::new(msg, ErrorLocation::default(), error_type)
    }

    /// Create a compiler error (internal bug, not the user's fault)
    pub fn compiler_error(msg: impl Into<String>) -> Self {
        CompilerError::without_location(msg, ErrorType::Compiler)
    }

    pub fn file_error(path: &std::path::Path, msg: impl Into<String>) -> Self {
        CompilerError::new(
            msg,
            ErrorLocation {
                scope: path.to_path_buf(),
                ..ErrorLocation::default()
            },
            ErrorType::File,
        )
    }

    pub fn with_file_path(mut self, file_path: PathBuf) -> Self {
        self.location.scope = file_path;
        self
    }

    pub fn with_error_type(mut self, error_type: ErrorType) -> Self {
        self.error_type = error_type;
        self
    }

    pub fn with_metadata(mut self, key: ErrorMetaDataKey, value: impl Into<String>) -> Self {
        self.metadata.insert(key, value.into());
        self
    }

    pub fn function_name(&self) -> Option<&str> {
        self.metadata
            .get(&ErrorMetaDataKey::FunctionName)
            .map(String::as_str)
    }
}

impl Display for CompilerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", error_type_to_str(&self.error_type), self.msg)
    }
}

impl std::error::Error for CompilerError {}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum ErrorType {
    Syntax,
    Rule,
    Lowering,
    Encoding,
    Backend,
    Call,
    Link,
    Runtime,
    File,
    Config,
    Compiler,
}

pub fn error_type_to_str(e_type: &ErrorType) -> &'static str {
    match e_type {
        ErrorType::Syntax => "Syntax Error",
        ErrorType::Rule => "Language Rule Violation",
        ErrorType::Lowering => "Lowering Failure",
        ErrorType::Encoding => "Encoding Error",
        ErrorType::Backend => "Backend Contract Violation",
        ErrorType::Call => "Foreign Call Error",
        ErrorType::Link => "Link Error",
        ErrorType::Runtime => "Runtime Error",
        ErrorType::File => "File Error",
        ErrorType::Config => "Malformed Config",
        ErrorType::Compiler => "Compiler Bug",
    }
}

/// Returns a new CompilerError for syntax violations.
///
/// Usage:
/// `return_syntax_error!("message", location, { PrimarySuggestion => "Add ':'" })`;
#[macro_export]
macro_rules! return_syntax_error {
    ($msg:expr, $loc:expr, { $( $key:ident => $value:expr ),* $(,)? }) => {
        return Err($crate::compiler_frontend::compiler_errors::CompilerError {
            msg: $msg.into(),
            location: $loc,
            error_type: $crate::compiler_frontend::compiler_errors::ErrorType::Syntax,
            metadata: {
                let mut map = std::collections::HashMap::new();
                $(
                    map.insert(
                        $crate::compiler_frontend::compiler_errors::ErrorMetaDataKey::$key,
                        String::from($value),
                    );
                )*
                map
            },
        })
    };
    ($msg:expr, $loc:expr) => {
        return Err($crate::compiler_frontend::compiler_errors::CompilerError::new(
            $msg,
            $loc,
            $crate::compiler_frontend::compiler_errors::ErrorType::Syntax,
        ))
    };
}

/// Returns a new CompilerError for a definition that breaks a language rule,
/// such as a kernel whose loop can't be partitioned.
#[macro_export]
macro_rules! return_rule_error {
    ($msg:expr, $loc:expr, { $( $key:ident => $value:expr ),* $(,)? }) => {
        return Err($crate::compiler_frontend::compiler_errors::CompilerError {
            msg: $msg.into(),
            location: $loc,
            error_type: $crate::compiler_frontend::compiler_errors::ErrorType::Rule,
            metadata: {
                let mut map = std::collections::HashMap::new();
                $(
                    map.insert(
                        $crate::compiler_frontend::compiler_errors::ErrorMetaDataKey::$key,
                        String::from($value),
                    );
                )*
                map
            },
        })
    };
    ($msg:expr, $loc:expr) => {
        return Err($crate::compiler_frontend::compiler_errors::CompilerError::new(
            $msg,
            $loc,
            $crate::compiler_frontend::compiler_errors::ErrorType::Rule,
        ))
    };
}

/// Returns a new CompilerError for a function that cannot be lowered.
///
/// Lowering failures are fatal for the function only. The caller falls back to host execution.
///
/// Usage:
/// `return_lowering_error!("message", location, { FunctionName => name })`;
#[macro_export]
macro_rules! return_lowering_error {
    ($msg:expr, $loc:expr, { $( $key:ident => $value:expr ),* $(,)? }) => {
        return Err($crate::compiler_frontend::compiler_errors::CompilerError {
            msg: $msg.into(),
            location: $loc,
            error_type: $crate::compiler_frontend::compiler_errors::ErrorType::Lowering,
            metadata: {
                let mut map = std::collections::HashMap::new();
                $(
                    map.insert(
                        $crate::compiler_frontend::compiler_errors::ErrorMetaDataKey::$key,
                        String::from($value),
                    );
                )*
                map
            },
        })
    };
    ($msg:expr, $loc:expr) => {
        return Err($crate::compiler_frontend::compiler_errors::CompilerError::new(
            $msg,
            $loc,
            $crate::compiler_frontend::compiler_errors::ErrorType::Lowering,
        ))
    };
}

/// Returns a new CompilerError for errors raised while a function runs on the host.
///
/// Usage: `return_runtime_error!("division by zero")` or `return_runtime_error!("x {}", y)`;
#[macro_export]
macro_rules! return_runtime_error {
    ($fmt:expr, $($arg:expr),+ $(,)?) => {{
        return Err($crate::compiler_frontend::compiler_errors::CompilerError::without_location(
            format!($fmt, $($arg),+),
            $crate::compiler_frontend::compiler_errors::ErrorType::Runtime,
        ));
    }};
    ($msg:expr) => {{
        return Err($crate::compiler_frontend::compiler_errors::CompilerError::without_location(
            $msg,
            $crate::compiler_frontend::compiler_errors::ErrorType::Runtime,
        ));
    }};
}

/// Returns a new CompilerError for arity or type mismatches at the compiled call boundary.
#[macro_export]
macro_rules! return_call_error {
    ($fmt:expr, $($arg:expr),+ $(,)?) => {{
        return Err($crate::compiler_frontend::compiler_errors::CompilerError::without_location(
            format!($fmt, $($arg),+),
            $crate::compiler_frontend::compiler_errors::ErrorType::Call,
        ));
    }};
    ($msg:expr) => {{
        return Err($crate::compiler_frontend::compiler_errors::CompilerError::without_location(
            $msg,
            $crate::compiler_frontend::compiler_errors::ErrorType::Call,
        ));
    }};
}

/// Returns a new CompilerError for a malformed config file.
#[macro_export]
macro_rules! return_config_error {
    ($fmt:expr, $($arg:expr),+ $(,)?) => {{
        return Err($crate::compiler_frontend::compiler_errors::CompilerError::without_location(
            format!($fmt, $($arg),+),
            $crate::compiler_frontend::compiler_errors::ErrorType::Config,
        ));
    }};
    ($msg:expr) => {{
        return Err($crate::compiler_frontend::compiler_errors::CompilerError::without_location(
            $msg,
            $crate::compiler_frontend::compiler_errors::ErrorType::Config,
        ));
    }};
}

/// Returns a new CompilerError for internal bugs.
/// These are never the user's fault.
#[macro_export]
macro_rules! return_compiler_error {
    ($fmt:expr, $($arg:expr),+ $(,)?) => {{
        return Err($crate::compiler_frontend::compiler_errors::CompilerError::compiler_error(
            format!($fmt, $($arg),+),
        ));
    }};
    ($msg:expr) => {{
        return Err($crate::compiler_frontend::compiler_errors::CompilerError::compiler_error(
            $msg,
        ));
    }};
}

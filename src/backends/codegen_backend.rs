//! The builder interface every code generation backend implements.
//!
//! A backend receives one function at a time through an ordered sequence of calls:
//! `begin_function`, then any mix of assignments and balanced `begin_loop`/`end_loop` pairs,
//! an optional `return_statement`, and finally `end_function`. After `end_function` the
//! backend hands out a native entry point for the function.
//!
//! Values are passed in the encoding from `value_encoding`. Every contract violation is a
//! checked `BackendError`, never a panic.

use crate::compiler_frontend::compiler_errors::{CompilerError, ErrorType};
use crate::compiler_frontend::compiler_messages::log_level::LogLevel;
use crate::compiler_frontend::datatypes::ScalarType;
use crate::compiler_frontend::value_encoding::EncodingError;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub trait CodegenBackend {
    fn set_log_level(&mut self, level: LogLevel);

    fn begin_function(
        &mut self,
        name: &str,
        param_types: &[ScalarType],
        param_names: &[String],
        return_type: ScalarType,
    ) -> Result<(), BackendError>;

    fn begin_loop(
        &mut self,
        function: &str,
        loop_var: &str,
        lower: i32,
        upper: i32,
        step: i32,
    ) -> Result<(), BackendError>;

    fn end_loop(&mut self, function: &str) -> Result<(), BackendError>;

    fn assign_value(
        &mut self,
        function: &str,
        target: &str,
        encoding: &[u8],
    ) -> Result<(), BackendError>;

    fn assign_binary_op(
        &mut self,
        function: &str,
        target: &str,
        left: &[u8],
        op_code: u8,
        right: &[u8],
    ) -> Result<(), BackendError>;

    fn return_statement(&mut self, function: &str, variable: &str) -> Result<(), BackendError>;

    fn end_function(&mut self, function: &str) -> Result<(), BackendError>;

    /// Discards a function that is still being built. Does nothing for unknown names.
    fn abort_function(&mut self, function: &str);

    fn entry_point(&self, function: &str) -> Option<EntryPoint>;
}

/// A finished function.
///
/// `arguments` holds every parameter packed at its fixed width in native byte order.
/// `result` receives the return value the same way.
pub trait NativeFunction: Send + Sync {
    fn call(&self, arguments: &[u8], result: &mut [u8]) -> Result<(), BackendError>;
}

pub type EntryPoint = Arc<dyn NativeFunction>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    Redefinition(String),
    UnknownFunction(String),
    MismatchedParameters {
        function: String,
        types: usize,
        names: usize,
    },
    LoopUnderflow(String),
    UnclosedLoops {
        function: String,
        open: usize,
    },
    UnknownVariable {
        function: String,
        name: String,
    },
    MalformedValue(EncodingError),
    UnknownOpCode(u8),
    ZeroStep(String),

    // Raised while a compiled function runs
    DivisionByZero(String),
    ArgumentBufferSize {
        expected: usize,
        found: usize,
    },
    ResultBufferSize {
        expected: usize,
        found: usize,
    },
}

impl Display for BackendError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::Redefinition(name) => write!(f, "Function '{name}' is already defined"),
            BackendError::UnknownFunction(name) => {
                write!(f, "Function '{name}' is not being built")
            }
            BackendError::MismatchedParameters {
                function,
                types,
                names,
            } => write!(
                f,
                "Function '{function}' has {types} parameter types but {names} parameter names"
            ),
            BackendError::LoopUnderflow(function) => {
                write!(f, "end_loop in '{function}' without an open loop")
            }
            BackendError::UnclosedLoops { function, open } => {
                write!(f, "Function '{function}' ended with {open} open loops")
            }
            BackendError::UnknownVariable { function, name } => {
                write!(f, "Unknown variable '{name}' in '{function}'")
            }
            BackendError::MalformedValue(error) => write!(f, "Malformed value: {error}"),
            BackendError::UnknownOpCode(code) => write!(f, "Unknown op code {code}"),
            BackendError::ZeroStep(function) => write!(f, "Loop in '{function}' has a zero step"),
            BackendError::DivisionByZero(function) => {
                write!(f, "Integer division by zero in '{function}'")
            }
            BackendError::ArgumentBufferSize { expected, found } => write!(
                f,
                "Argument buffer holds {found} bytes, the function takes {expected}"
            ),
            BackendError::ResultBufferSize { expected, found } => write!(
                f,
                "Result buffer holds {found} bytes, the function returns {expected}"
            ),
        }
    }
}

impl std::error::Error for BackendError {}

impl From<EncodingError> for BackendError {
    fn from(error: EncodingError) -> Self {
        BackendError::MalformedValue(error)
    }
}

impl From<BackendError> for CompilerError {
    fn from(error: BackendError) -> Self {
        let error_type = match error {
            BackendError::DivisionByZero(_) => ErrorType::Runtime,
            BackendError::ArgumentBufferSize { .. } | BackendError::ResultBufferSize { .. } => {
                ErrorType::Call
            }
            _ => ErrorType::Backend,
        };

        CompilerError::without_location(error.to_string(), error_type)
    }
}

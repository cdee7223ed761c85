//! Byte encoding for values passed to a codegen backend.
//!
//! Layout:
//! - byte 0: kind, `0` for a variable and `1` for a constant
//! - byte 1: scalar type id, always `0` for variables
//! - rest: the ASCII variable name (unterminated), or the constant payload in native byte order
//!
//! Backends decode with [`decode_value`].

use crate::compiler_frontend::ast::ast_nodes::Literal;
use crate::compiler_frontend::compiler_errors::{CompilerError, ErrorType};
use crate::compiler_frontend::datatypes::{Scalar, ScalarType};
use crate::compiler_frontend::lowering::lowered_ir::ValueRef;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub const KIND_VARIABLE: u8 = 0;
pub const KIND_CONSTANT: u8 = 1;
pub const HEADER_LENGTH: usize = 2;

/// How constant literals are typed when encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstantWidth {
    /// Integers are Int32 when they fit, otherwise Int64. Floats are Float64.
    #[default]
    Declared,
    /// Integers are always Int32 and floats always Float32, truncating when needed
    Narrow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    pub fn native() -> ByteOrder {
        if cfg!(target_endian = "big") {
            ByteOrder::Big
        } else {
            ByteOrder::Little
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DecodedValue {
    Variable(String),
    Constant(Scalar),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    NonNumericLiteral(String),
    InvalidName(String),
    Truncated { expected: usize, found: usize },
    UnknownKind(u8),
    UnknownTypeId(u8),
    TypedVariable(u8),
}

impl Display for EncodingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            EncodingError::NonNumericLiteral(literal) => {
                write!(f, "Only numeric constants can be encoded, found {literal}")
            }
            EncodingError::InvalidName(name) => {
                write!(f, "Variable name '{name}' must be non-empty ASCII")
            }
            EncodingError::Truncated { expected, found } => {
                write!(f, "Encoded value needs {expected} bytes but has {found}")
            }
            EncodingError::UnknownKind(kind) => write!(f, "Unknown value kind {kind}"),
            EncodingError::UnknownTypeId(id) => write!(f, "Unknown scalar type id {id}"),
            EncodingError::TypedVariable(id) => {
                write!(f, "Variables must have type id 0, found {id}")
            }
        }
    }
}

impl std::error::Error for EncodingError {}

impl From<EncodingError> for CompilerError {
    fn from(error: EncodingError) -> Self {
        CompilerError::without_location(error.to_string(), ErrorType::Encoding)
    }
}

/// The scalar a constant literal is encoded as.
pub fn constant_scalar(literal: &Literal, width: ConstantWidth) -> Result<Scalar, EncodingError> {
    let scalar = match (literal, width) {
        (Literal::Int(value), ConstantWidth::Declared) => match i32::try_from(*value) {
            Ok(narrow) => Scalar::Int32(narrow),
            Err(_) => Scalar::Int64(*value),
        },
        (Literal::Int(value), ConstantWidth::Narrow) => Scalar::Int32(*value as i32),
        (Literal::Float(value), ConstantWidth::Declared) => Scalar::Float64(*value),
        (Literal::Float(value), ConstantWidth::Narrow) => Scalar::Float32(*value as f32),
        (other, _) => return Err(EncodingError::NonNumericLiteral(other.to_string())),
    };

    Ok(scalar)
}

/// True when narrow encoding would change the literal's value
pub fn narrowing_changes_value(literal: &Literal) -> bool {
    match literal {
        Literal::Int(value) => i32::try_from(*value).is_err(),
        Literal::Float(value) => (*value as f32) as f64 != *value && !value.is_nan(),
        _ => false,
    }
}

pub fn encode_value(value: &ValueRef, width: ConstantWidth) -> Result<Vec<u8>, EncodingError> {
    match value {
        ValueRef::Variable(name) => encode_variable(name),
        ValueRef::Constant(literal) => Ok(encode_scalar(constant_scalar(literal, width)?)),
    }
}

pub fn encode_variable(name: &str) -> Result<Vec<u8>, EncodingError> {
    if name.is_empty() || !name.is_ascii() {
        return Err(EncodingError::InvalidName(String::from(name)));
    }

    let mut bytes = Vec::with_capacity(HEADER_LENGTH + name.len());
    bytes.push(KIND_VARIABLE);
    bytes.push(0);
    bytes.extend_from_slice(name.as_bytes());
    Ok(bytes)
}

pub fn encode_scalar(scalar: Scalar) -> Vec<u8> {
    let scalar_type = scalar.scalar_type();
    let mut bytes = Vec::with_capacity(HEADER_LENGTH + scalar_type.byte_width());
    bytes.push(KIND_CONSTANT);
    bytes.push(scalar_type.type_id());
    bytes.extend(scalar.to_ne_bytes());
    bytes
}

pub fn decode_value(bytes: &[u8]) -> Result<DecodedValue, EncodingError> {
    let [kind, type_id, payload @ ..] = bytes else {
        return Err(EncodingError::Truncated {
            expected: HEADER_LENGTH,
            found: bytes.len(),
        });
    };

    match *kind {
        KIND_VARIABLE => {
            if *type_id != 0 {
                return Err(EncodingError::TypedVariable(*type_id));
            }

            match std::str::from_utf8(payload) {
                Ok(name) if !name.is_empty() && name.is_ascii() => {
                    Ok(DecodedValue::Variable(String::from(name)))
                }
                _ => Err(EncodingError::InvalidName(
                    String::from_utf8_lossy(payload).to_string(),
                )),
            }
        }

        KIND_CONSTANT => {
            let scalar_type =
                ScalarType::from_type_id(*type_id).ok_or(EncodingError::UnknownTypeId(*type_id))?;

            if payload.len() != scalar_type.byte_width() {
                return Err(EncodingError::Truncated {
                    expected: HEADER_LENGTH + scalar_type.byte_width(),
                    found: bytes.len(),
                });
            }

            Scalar::from_ne_bytes(scalar_type, payload)
                .map(DecodedValue::Constant)
                .ok_or(EncodingError::Truncated {
                    expected: HEADER_LENGTH + scalar_type.byte_width(),
                    found: bytes.len(),
                })
        }

        other => Err(EncodingError::UnknownKind(other)),
    }
}

#[cfg(test)]
#[path = "tests/value_encoding_tests.rs"]
mod tests;

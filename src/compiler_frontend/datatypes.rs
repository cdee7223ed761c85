use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// The four scalar types that compiled code can take and return.
///
/// Type ids are part of the value encoding shared with backends and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarType {
    Int32,
    Int64,
    Float32,
    Float64,
}

impl ScalarType {
    pub const ALL: [ScalarType; 4] = [
        ScalarType::Int32,
        ScalarType::Int64,
        ScalarType::Float32,
        ScalarType::Float64,
    ];

    pub fn type_id(self) -> u8 {
        match self {
            ScalarType::Int32 => 1,
            ScalarType::Int64 => 2,
            ScalarType::Float32 => 3,
            ScalarType::Float64 => 4,
        }
    }

    pub fn from_type_id(id: u8) -> Option<ScalarType> {
        match id {
            1 => Some(ScalarType::Int32),
            2 => Some(ScalarType::Int64),
            3 => Some(ScalarType::Float32),
            4 => Some(ScalarType::Float64),
            _ => None,
        }
    }

    pub fn byte_width(self) -> usize {
        match self {
            ScalarType::Int32 | ScalarType::Float32 => 4,
            ScalarType::Int64 | ScalarType::Float64 => 8,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ScalarType::Int32 => "Int32",
            ScalarType::Int64 => "Int64",
            ScalarType::Float32 => "Float32",
            ScalarType::Float64 => "Float64",
        }
    }

    /// Annotation names, matched on the final dotted segment by the caller
    pub fn from_name(name: &str) -> Option<ScalarType> {
        ScalarType::ALL.into_iter().find(|t| t.name() == name)
    }

    pub fn is_integral(self) -> bool {
        matches!(self, ScalarType::Int32 | ScalarType::Int64)
    }

    pub fn is_floating(self) -> bool {
        !self.is_integral()
    }

    /// The type of a binary operation on two operands.
    /// Floating wins over integral, then the wider width wins.
    pub fn promote(self, other: ScalarType) -> ScalarType {
        match (self.is_floating(), other.is_floating()) {
            (true, false) => self,
            (false, true) => other,
            _ => {
                if other.byte_width() > self.byte_width() {
                    other
                } else {
                    self
                }
            }
        }
    }

    pub fn zero(self) -> Scalar {
        match self {
            ScalarType::Int32 => Scalar::Int32(0),
            ScalarType::Int64 => Scalar::Int64(0),
            ScalarType::Float32 => Scalar::Float32(0.0),
            ScalarType::Float64 => Scalar::Float64(0.0),
        }
    }
}

impl Display for ScalarType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed scalar value crossing the host/compiled boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Scalar {
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
}

impl Scalar {
    pub fn scalar_type(self) -> ScalarType {
        match self {
            Scalar::Int32(_) => ScalarType::Int32,
            Scalar::Int64(_) => ScalarType::Int64,
            Scalar::Float32(_) => ScalarType::Float32,
            Scalar::Float64(_) => ScalarType::Float64,
        }
    }

    /// Integral targets truncate through an integer conversion, floating targets convert.
    /// Float to int saturates at the target bounds and maps NaN to zero.
    pub fn cast(self, target: ScalarType) -> Scalar {
        match target {
            ScalarType::Int32 => Scalar::Int32(match self {
                Scalar::Int32(v) => v,
                Scalar::Int64(v) => v as i32,
                Scalar::Float32(v) => v as i32,
                Scalar::Float64(v) => v as i32,
            }),
            ScalarType::Int64 => Scalar::Int64(self.as_i64()),
            ScalarType::Float32 => Scalar::Float32(match self {
                Scalar::Int32(v) => v as f32,
                Scalar::Int64(v) => v as f32,
                Scalar::Float32(v) => v,
                Scalar::Float64(v) => v as f32,
            }),
            ScalarType::Float64 => Scalar::Float64(self.as_f64()),
        }
    }

    pub fn as_i64(self) -> i64 {
        match self {
            Scalar::Int32(v) => v as i64,
            Scalar::Int64(v) => v,
            Scalar::Float32(v) => v as i64,
            Scalar::Float64(v) => v as i64,
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            Scalar::Int32(v) => v as f64,
            Scalar::Int64(v) => v as f64,
            Scalar::Float32(v) => v as f64,
            Scalar::Float64(v) => v,
        }
    }

    pub fn is_zero(self) -> bool {
        match self {
            Scalar::Int32(v) => v == 0,
            Scalar::Int64(v) => v == 0,
            Scalar::Float32(v) => v == 0.0,
            Scalar::Float64(v) => v == 0.0,
        }
    }

    /// Native byte order, exactly `byte_width` bytes
    pub fn to_ne_bytes(self) -> Vec<u8> {
        match self {
            Scalar::Int32(v) => v.to_ne_bytes().to_vec(),
            Scalar::Int64(v) => v.to_ne_bytes().to_vec(),
            Scalar::Float32(v) => v.to_ne_bytes().to_vec(),
            Scalar::Float64(v) => v.to_ne_bytes().to_vec(),
        }
    }

    /// Reads a value of `scalar_type` from the start of `bytes`.
    /// Returns None when there are fewer bytes than the type's width.
    pub fn from_ne_bytes(scalar_type: ScalarType, bytes: &[u8]) -> Option<Scalar> {
        let scalar = match scalar_type {
            ScalarType::Int32 => Scalar::Int32(i32::from_ne_bytes(bytes.get(..4)?.try_into().ok()?)),
            ScalarType::Int64 => Scalar::Int64(i64::from_ne_bytes(bytes.get(..8)?.try_into().ok()?)),
            ScalarType::Float32 => {
                Scalar::Float32(f32::from_ne_bytes(bytes.get(..4)?.try_into().ok()?))
            }
            ScalarType::Float64 => {
                Scalar::Float64(f64::from_ne_bytes(bytes.get(..8)?.try_into().ok()?))
            }
        };

        Some(scalar)
    }
}

impl Display for Scalar {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Scalar::Int32(v) => write!(f, "{v}"),
            Scalar::Int64(v) => write!(f, "{v}"),
            Scalar::Float32(v) => write!(f, "{v:?}"),
            Scalar::Float64(v) => write!(f, "{v:?}"),
        }
    }
}

#[cfg(test)]
#[path = "tests/datatypes_tests.rs"]
mod tests;

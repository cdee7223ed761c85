//! Values seen by the host interpreter.

use crate::compiler_frontend::ast::ast_nodes::Literal;
use crate::compiler_frontend::compiler_errors::CompilerError;
use crate::compiler_frontend::datatypes::Scalar;
use crate::compiler_frontend::lowering::range_normalization::RangeTriple;
use crate::return_runtime_error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone)]
pub enum HostValue {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Tuple(Vec<HostValue>),
    Range(RangeTriple<i64>),
    Array(SharedArray),
}

impl HostValue {
    pub fn from_literal(literal: &Literal) -> HostValue {
        match literal {
            Literal::Int(value) => HostValue::Int(*value),
            Literal::Float(value) => HostValue::Float(*value),
            Literal::Bool(value) => HostValue::Bool(*value),
            Literal::Str(value) => HostValue::Str(value.to_owned()),
            Literal::None => HostValue::None,
        }
    }

    pub fn from_scalar(scalar: Scalar) -> HostValue {
        match scalar {
            Scalar::Int32(v) => HostValue::Int(v as i64),
            Scalar::Int64(v) => HostValue::Int(v),
            Scalar::Float32(v) => HostValue::Float(v as f64),
            Scalar::Float64(v) => HostValue::Float(v),
        }
    }

    /// Numeric values as the widest scalar of their kind. Bools count as integers.
    pub fn to_scalar(&self) -> Option<Scalar> {
        match self {
            HostValue::Bool(v) => Some(Scalar::Int64(*v as i64)),
            HostValue::Int(v) => Some(Scalar::Int64(*v)),
            HostValue::Float(v) => Some(Scalar::Float64(*v)),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            HostValue::None => "NoneType",
            HostValue::Bool(_) => "bool",
            HostValue::Int(_) => "int",
            HostValue::Float(_) => "float",
            HostValue::Str(_) => "str",
            HostValue::Tuple(_) => "tuple",
            HostValue::Range(_) => "range",
            HostValue::Array(_) => "array",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            HostValue::None => false,
            HostValue::Bool(v) => *v,
            HostValue::Int(v) => *v != 0,
            HostValue::Float(v) => *v != 0.0,
            HostValue::Str(v) => !v.is_empty(),
            HostValue::Tuple(values) => !values.is_empty(),
            HostValue::Range(range) => !range.is_empty(),
            HostValue::Array(array) => !array.is_empty(),
        }
    }

    /// Integer view used by indexing and `range`. Bools are integers, floats are not.
    pub fn as_index(&self) -> Option<i64> {
        match self {
            HostValue::Bool(v) => Some(*v as i64),
            HostValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            HostValue::Bool(v) => Some(*v as i64 as f64),
            HostValue::Int(v) => Some(*v as f64),
            HostValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Everything `for` can walk over, materialized.
    pub fn iterate(&self) -> Result<Vec<HostValue>, CompilerError> {
        let values = match self {
            HostValue::Range(range) => range.iter().map(HostValue::Int).collect(),
            HostValue::Tuple(values) => values.to_owned(),
            HostValue::Array(array) => array.values(),
            HostValue::Str(text) => text.chars().map(|c| HostValue::Str(c.to_string())).collect(),
            other => return_runtime_error!("'{}' object is not iterable", other.type_name()),
        };

        Ok(values)
    }
}

impl PartialEq for HostValue {
    fn eq(&self, other: &HostValue) -> bool {
        match (self, other) {
            (HostValue::None, HostValue::None) => true,
            (HostValue::Str(a), HostValue::Str(b)) => a == b,
            (HostValue::Tuple(a), HostValue::Tuple(b)) => a == b,
            (HostValue::Range(a), HostValue::Range(b)) => a == b,
            (HostValue::Array(a), HostValue::Array(b)) => a.values() == b.values(),

            // Mixed numeric comparisons compare by value
            (HostValue::Int(_) | HostValue::Bool(_), HostValue::Int(_) | HostValue::Bool(_)) => {
                self.as_index() == other.as_index()
            }
            (a, b) => match (a.as_float(), b.as_float()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }
}

impl Display for HostValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            HostValue::None => f.write_str("None"),
            HostValue::Bool(true) => f.write_str("True"),
            HostValue::Bool(false) => f.write_str("False"),
            HostValue::Int(v) => write!(f, "{v}"),
            HostValue::Float(v) => write!(f, "{v:?}"),
            HostValue::Str(v) => f.write_str(v),
            HostValue::Tuple(values) => {
                let items: Vec<String> = values.iter().map(HostValue::to_string).collect();
                if items.len() == 1 {
                    write!(f, "({},)", items[0])
                } else {
                    write!(f, "({})", items.join(", "))
                }
            }
            HostValue::Range(range) => {
                write!(f, "range({}, {}, {})", range.lower, range.upper, range.step)
            }
            HostValue::Array(array) => {
                let items: Vec<String> = array.values().iter().map(HostValue::to_string).collect();
                write!(f, "[{}]", items.join(", "))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    Int,
    Float,
}

/// A fixed length numeric array shared between kernel workers.
///
/// Every cell is a relaxed atomic holding the raw bits of an i64 or f64. Workers that write
/// disjoint indices need no further synchronization, and the dispatcher's join makes all
/// writes visible to the caller.
#[derive(Debug, Clone)]
pub struct SharedArray {
    element: ElementType,
    cells: Arc<[AtomicU64]>,
}

impl SharedArray {
    pub fn zeros(element: ElementType, length: usize) -> SharedArray {
        SharedArray {
            element,
            cells: (0..length).map(|_| AtomicU64::new(0)).collect(),
        }
    }

    /// Element type is Float when any value is a float
    pub fn from_values(values: &[HostValue]) -> Result<SharedArray, CompilerError> {
        let element = if values.iter().any(|v| matches!(v, HostValue::Float(_))) {
            ElementType::Float
        } else {
            ElementType::Int
        };

        let array = SharedArray::zeros(element, values.len());
        for (index, value) in values.iter().enumerate() {
            array.store(index, value)?;
        }

        Ok(array)
    }

    pub fn element_type(&self) -> ElementType {
        self.element
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Python style index: negative values count from the end
    pub fn resolve_index(&self, index: i64) -> Result<usize, CompilerError> {
        let length = self.cells.len() as i64;
        let resolved = if index < 0 { index + length } else { index };

        if resolved < 0 || resolved >= length {
            return_runtime_error!(
                "array index {} out of range for length {}",
                index,
                length
            );
        }

        Ok(resolved as usize)
    }

    pub fn load(&self, index: usize) -> HostValue {
        let bits = self.cells[index].load(Ordering::Relaxed);
        match self.element {
            ElementType::Int => HostValue::Int(bits as i64),
            ElementType::Float => HostValue::Float(f64::from_bits(bits)),
        }
    }

    /// Floats stored into an int array truncate, ints stored into a float array convert.
    pub fn store(&self, index: usize, value: &HostValue) -> Result<(), CompilerError> {
        let bits = match (self.element, value) {
            (ElementType::Int, HostValue::Float(v)) => *v as i64 as u64,
            (ElementType::Int, other) => match other.as_index() {
                Some(v) => v as u64,
                None => return_runtime_error!(
                    "can't store a '{}' in a numeric array",
                    other.type_name()
                ),
            },
            (ElementType::Float, other) => match other.as_float() {
                Some(v) => v.to_bits(),
                None => return_runtime_error!(
                    "can't store a '{}' in a numeric array",
                    other.type_name()
                ),
            },
        };

        self.cells[index].store(bits, Ordering::Relaxed);
        Ok(())
    }

    pub fn values(&self) -> Vec<HostValue> {
        (0..self.cells.len()).map(|index| self.load(index)).collect()
    }

    /// True when both handles point at the same cells
    pub fn shares_cells(&self, other: &SharedArray) -> bool {
        Arc::ptr_eq(&self.cells, &other.cells)
    }
}

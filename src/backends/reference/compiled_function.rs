use crate::backends::codegen_backend::{BackendError, NativeFunction};
use crate::compiler_frontend::datatypes::{Scalar, ScalarType};
use crate::compiler_frontend::lowering::lowered_ir::ArithmeticOp;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operand {
    Slot(usize),
    Constant(Scalar),
}

/// Typed instruction tree produced by the reference backend
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    // The value is cast to the slot's type
    Store {
        slot: usize,
        value: Operand,
    },
    BinaryOp {
        slot: usize,
        left: Operand,
        op: ArithmeticOp,
        right: Operand,
        op_type: ScalarType,
    },
    Loop {
        slot: usize,
        lower: i32,
        upper: i32,
        step: i32,
        body: Vec<Instruction>,
    },
    Return {
        value: Operand,
    },
}

#[derive(Debug, Clone)]
pub struct CompiledFunction {
    pub name: String,
    pub parameters: Vec<(usize, ScalarType)>,
    pub return_type: ScalarType,
    pub slot_types: Vec<ScalarType>,
    pub body: Vec<Instruction>,
}

impl CompiledFunction {
    pub fn argument_buffer_size(&self) -> usize {
        self.parameters
            .iter()
            .map(|(_, scalar_type)| scalar_type.byte_width())
            .sum()
    }

    /// Runs the function on already decoded arguments.
    pub fn execute(&self, arguments: &[Scalar]) -> Result<Scalar, BackendError> {
        let mut slots: Vec<Scalar> = self.slot_types.iter().map(|t| t.zero()).collect();

        for ((slot, scalar_type), argument) in self.parameters.iter().zip(arguments) {
            slots[*slot] = argument.cast(*scalar_type);
        }

        let returned = self.run_block(&self.body, &mut slots)?;
        Ok(returned
            .unwrap_or(self.return_type.zero())
            .cast(self.return_type))
    }

    fn run_block(
        &self,
        block: &[Instruction],
        slots: &mut [Scalar],
    ) -> Result<Option<Scalar>, BackendError> {
        for instruction in block {
            match instruction {
                Instruction::Store { slot, value } => {
                    let value = read(slots, *value);
                    slots[*slot] = value.cast(self.slot_types[*slot]);
                }

                Instruction::BinaryOp {
                    slot,
                    left,
                    op,
                    right,
                    op_type,
                } => {
                    let left = read(slots, *left).cast(*op_type);
                    let right = read(slots, *right).cast(*op_type);
                    let result = self.arithmetic(left, *op, right)?;
                    slots[*slot] = result.cast(self.slot_types[*slot]);
                }

                Instruction::Loop {
                    slot,
                    lower,
                    upper,
                    step,
                    body,
                } => {
                    // Widened so the final increment can't overflow
                    let (upper, step) = (*upper as i64, *step as i64);
                    let mut counter = *lower as i64;

                    while (step > 0 && counter < upper) || (step < 0 && counter > upper) {
                        slots[*slot] = Scalar::Int32(counter as i32);
                        if let Some(value) = self.run_block(body, slots)? {
                            return Ok(Some(value));
                        }
                        counter += step;
                    }
                }

                Instruction::Return { value } => {
                    return Ok(Some(read(slots, *value)));
                }
            }
        }

        Ok(None)
    }

    /// Integer arithmetic wraps, integer division truncates toward zero
    fn arithmetic(
        &self,
        left: Scalar,
        op: ArithmeticOp,
        right: Scalar,
    ) -> Result<Scalar, BackendError> {
        let result = match (left, right) {
            (Scalar::Int32(l), Scalar::Int32(r)) => Scalar::Int32(match op {
                ArithmeticOp::Add => l.wrapping_add(r),
                ArithmeticOp::Subtract => l.wrapping_sub(r),
                ArithmeticOp::Multiply => l.wrapping_mul(r),
                ArithmeticOp::Divide => {
                    if r == 0 {
                        return Err(BackendError::DivisionByZero(self.name.to_owned()));
                    }
                    l.wrapping_div(r)
                }
            }),

            (Scalar::Int64(l), Scalar::Int64(r)) => Scalar::Int64(match op {
                ArithmeticOp::Add => l.wrapping_add(r),
                ArithmeticOp::Subtract => l.wrapping_sub(r),
                ArithmeticOp::Multiply => l.wrapping_mul(r),
                ArithmeticOp::Divide => {
                    if r == 0 {
                        return Err(BackendError::DivisionByZero(self.name.to_owned()));
                    }
                    l.wrapping_div(r)
                }
            }),

            (Scalar::Float32(l), Scalar::Float32(r)) => Scalar::Float32(match op {
                ArithmeticOp::Add => l + r,
                ArithmeticOp::Subtract => l - r,
                ArithmeticOp::Multiply => l * r,
                ArithmeticOp::Divide => l / r,
            }),

            (l, r) => {
                let (l, r) = (l.as_f64(), r.as_f64());
                Scalar::Float64(match op {
                    ArithmeticOp::Add => l + r,
                    ArithmeticOp::Subtract => l - r,
                    ArithmeticOp::Multiply => l * r,
                    ArithmeticOp::Divide => l / r,
                })
            }
        };

        Ok(result)
    }
}

fn read(slots: &[Scalar], operand: Operand) -> Scalar {
    match operand {
        Operand::Slot(slot) => slots[slot],
        Operand::Constant(scalar) => scalar,
    }
}

impl NativeFunction for CompiledFunction {
    fn call(&self, arguments: &[u8], result: &mut [u8]) -> Result<(), BackendError> {
        let expected = self.argument_buffer_size();
        if arguments.len() != expected {
            return Err(BackendError::ArgumentBufferSize {
                expected,
                found: arguments.len(),
            });
        }

        let width = self.return_type.byte_width();
        if result.len() < width {
            return Err(BackendError::ResultBufferSize {
                expected: width,
                found: result.len(),
            });
        }

        let mut decoded = Vec::with_capacity(self.parameters.len());
        let mut offset = 0;
        for (_, scalar_type) in &self.parameters {
            let bytes = &arguments[offset..offset + scalar_type.byte_width()];
            let scalar =
                Scalar::from_ne_bytes(*scalar_type, bytes).ok_or(BackendError::ArgumentBufferSize {
                    expected,
                    found: arguments.len(),
                })?;
            decoded.push(scalar);
            offset += scalar_type.byte_width();
        }

        let value = self.execute(&decoded)?;
        result[..width].copy_from_slice(&value.to_ne_bytes());
        Ok(())
    }
}

use crate::backends::codegen_backend::BackendError;
use crate::backends::reference::compiled_function::{CompiledFunction, Instruction, Operand};
use crate::compiler_frontend::datatypes::ScalarType;
use crate::compiler_frontend::lowering::lowered_ir::ArithmeticOp;
use crate::compiler_frontend::value_encoding::{DecodedValue, decode_value};
use rustc_hash::FxHashMap;

/// A loop that has been opened but not yet closed
struct OpenLoop {
    slot: usize,
    lower: i32,
    upper: i32,
    step: i32,
}

/// Builds one function from the backend's call sequence.
///
/// Names resolve through a scope stack. Scope 0 belongs to the function and every open
/// loop pushes one scope that only holds its loop variable. New names assigned anywhere
/// in the body are declared in the function scope, so they are still visible after the loop.
pub struct FunctionBuilder {
    name: String,
    parameters: Vec<(usize, ScalarType)>,
    return_type: ScalarType,
    slot_types: Vec<ScalarType>,
    scopes: Vec<FxHashMap<String, usize>>,

    // blocks[0] is the function body, one more per open loop
    blocks: Vec<Vec<Instruction>>,
    open_loops: Vec<OpenLoop>,
}

impl FunctionBuilder {
    pub fn new(
        name: &str,
        param_types: &[ScalarType],
        param_names: &[String],
        return_type: ScalarType,
    ) -> Result<Self, BackendError> {
        if param_types.len() != param_names.len() {
            return Err(BackendError::MismatchedParameters {
                function: String::from(name),
                types: param_types.len(),
                names: param_names.len(),
            });
        }

        let mut builder = FunctionBuilder {
            name: String::from(name),
            parameters: Vec::with_capacity(param_types.len()),
            return_type,
            slot_types: Vec::new(),
            scopes: vec![FxHashMap::default()],
            blocks: vec![Vec::new()],
            open_loops: Vec::new(),
        };

        for (name, scalar_type) in param_names.iter().zip(param_types) {
            let slot = builder.declare(0, name, *scalar_type);
            builder.parameters.push((slot, *scalar_type));
        }

        Ok(builder)
    }

    pub fn open_loops(&self) -> usize {
        self.open_loops.len()
    }

    fn declare(&mut self, scope: usize, name: &str, scalar_type: ScalarType) -> usize {
        let slot = self.slot_types.len();
        self.slot_types.push(scalar_type);
        self.scopes[scope].insert(String::from(name), slot);
        slot
    }

    fn lookup(&self, name: &str) -> Option<usize> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).copied())
    }

    fn push(&mut self, instruction: Instruction) {
        // The function body block always exists
        if let Some(block) = self.blocks.last_mut() {
            block.push(instruction);
        }
    }

    fn operand(&self, encoding: &[u8]) -> Result<(Operand, ScalarType), BackendError> {
        match decode_value(encoding)? {
            DecodedValue::Constant(scalar) => Ok((Operand::Constant(scalar), scalar.scalar_type())),
            DecodedValue::Variable(name) => match self.lookup(&name) {
                Some(slot) => Ok((Operand::Slot(slot), self.slot_types[slot])),
                None => Err(BackendError::UnknownVariable {
                    function: self.name.to_owned(),
                    name,
                }),
            },
        }
    }

    /// Existing slot for the target, or a new one in the function scope
    fn target_slot(&mut self, target: &str, source_type: ScalarType) -> usize {
        match self.lookup(target) {
            Some(slot) => slot,
            None => self.declare(0, target, source_type),
        }
    }

    pub fn begin_loop(
        &mut self,
        loop_var: &str,
        lower: i32,
        upper: i32,
        step: i32,
    ) -> Result<(), BackendError> {
        if step == 0 {
            return Err(BackendError::ZeroStep(self.name.to_owned()));
        }

        self.scopes.push(FxHashMap::default());
        let scope = self.scopes.len() - 1;
        let slot = self.declare(scope, loop_var, ScalarType::Int32);

        self.blocks.push(Vec::new());
        self.open_loops.push(OpenLoop {
            slot,
            lower,
            upper,
            step,
        });

        Ok(())
    }

    pub fn end_loop(&mut self) -> Result<(), BackendError> {
        let Some(header) = self.open_loops.pop() else {
            return Err(BackendError::LoopUnderflow(self.name.to_owned()));
        };

        let body = self.blocks.pop().unwrap_or_default();
        self.scopes.pop();

        self.push(Instruction::Loop {
            slot: header.slot,
            lower: header.lower,
            upper: header.upper,
            step: header.step,
            body,
        });

        Ok(())
    }

    pub fn assign_value(&mut self, target: &str, encoding: &[u8]) -> Result<(), BackendError> {
        let (value, source_type) = self.operand(encoding)?;
        let slot = self.target_slot(target, source_type);
        self.push(Instruction::Store { slot, value });
        Ok(())
    }

    pub fn assign_binary_op(
        &mut self,
        target: &str,
        left: &[u8],
        op_code: u8,
        right: &[u8],
    ) -> Result<(), BackendError> {
        let op = ArithmeticOp::from_op_code(op_code).ok_or(BackendError::UnknownOpCode(op_code))?;
        let (left, left_type) = self.operand(left)?;
        let (right, right_type) = self.operand(right)?;

        // An existing target keeps its type and the operands are cast to it
        let slot = self.target_slot(target, left_type.promote(right_type));
        let op_type = self.slot_types[slot];

        self.push(Instruction::BinaryOp {
            slot,
            left,
            op,
            right,
            op_type,
        });

        Ok(())
    }

    /// Unknown names are an error; a function with no return yields zero
    pub fn return_statement(&mut self, variable: &str) -> Result<(), BackendError> {
        let Some(slot) = self.lookup(variable) else {
            return Err(BackendError::UnknownVariable {
                function: self.name.to_owned(),
                name: String::from(variable),
            });
        };

        self.push(Instruction::Return {
            value: Operand::Slot(slot),
        });
        Ok(())
    }

    pub fn finish(mut self) -> Result<CompiledFunction, BackendError> {
        if !self.open_loops.is_empty() {
            return Err(BackendError::UnclosedLoops {
                function: self.name,
                open: self.open_loops.len(),
            });
        }

        let body = self.blocks.pop().unwrap_or_default();

        Ok(CompiledFunction {
            name: self.name,
            parameters: self.parameters,
            return_type: self.return_type,
            slot_types: self.slot_types,
            body,
        })
    }
}

use crate::backends::codegen_backend::CodegenBackend;
use crate::compiler_frontend::ast::ast_nodes::Literal;
use crate::compiler_frontend::compiler_errors::{CompilerError, ErrorMetaDataKey};
use crate::compiler_frontend::compiler_warnings::{CompilerWarning, WarningKind};
use crate::compiler_frontend::lowering::lowered_ir::{LoweredFunction, LoweredStatement, ValueRef};
use crate::compiler_frontend::value_encoding::{
    ConstantWidth, encode_value, narrowing_changes_value,
};
use crate::{codegen_log, return_compiler_error};

/// Drives a backend through the builder calls for one lowered function.
///
/// Statements are emitted depth first in order, with each loop body between its matching
/// `begin_loop` and `end_loop`. If any call fails the backend's partial function is
/// discarded with `abort_function` and the error is returned.
pub fn emit_function(
    backend: &mut dyn CodegenBackend,
    function: &LoweredFunction,
    width: ConstantWidth,
    warnings: &mut Vec<CompilerWarning>,
) -> Result<(), CompilerError> {
    let mut emitter = Emitter {
        backend,
        function_name: &function.name,
        width,
        warnings,
        open_loops: 0,
    };

    match emitter.emit(function) {
        Ok(()) => Ok(()),
        Err(error) => {
            emitter.backend.abort_function(&function.name);
            Err(error.with_metadata(ErrorMetaDataKey::FunctionName, function.name.as_str()))
        }
    }
}

struct Emitter<'a> {
    backend: &'a mut dyn CodegenBackend,
    function_name: &'a str,
    width: ConstantWidth,
    warnings: &'a mut Vec<CompilerWarning>,
    open_loops: usize,
}

impl Emitter<'_> {
    fn emit(&mut self, function: &LoweredFunction) -> Result<(), CompilerError> {
        let param_types: Vec<_> = function.parameters.iter().map(|p| p.scalar_type).collect();
        let param_names: Vec<_> = function.parameters.iter().map(|p| p.name.to_owned()).collect();

        codegen_log!(Green "begin_function ", #function.name);
        self.backend.begin_function(
            &function.name,
            &param_types,
            &param_names,
            function.return_type,
        )?;

        self.emit_block(&function.body)?;

        if self.open_loops != 0 {
            return_compiler_error!(
                "Emitter finished '{}' with {} open loops",
                self.function_name,
                self.open_loops
            );
        }

        codegen_log!(Green "end_function ", #function.name);
        self.backend.end_function(&function.name)?;
        Ok(())
    }

    fn emit_block(&mut self, statements: &[LoweredStatement]) -> Result<(), CompilerError> {
        for statement in statements {
            self.emit_statement(statement)?;
        }
        Ok(())
    }

    fn emit_statement(&mut self, statement: &LoweredStatement) -> Result<(), CompilerError> {
        let function = self.function_name;

        match statement {
            LoweredStatement::ScalarAssign { target, value } => {
                let encoding = self.encode(value)?;
                codegen_log!("assign_value ", #target, " ", #encoding);
                self.backend.assign_value(function, target, &encoding)?;
            }

            LoweredStatement::BinaryOpAssign {
                target,
                left,
                op,
                right,
            } => {
                let left = self.encode(left)?;
                let right = self.encode(right)?;
                codegen_log!("assign_binary_op ", #target, " ", #op);
                self.backend
                    .assign_binary_op(function, target, &left, op.op_code(), &right)?;
            }

            LoweredStatement::ConstantRangeLoop {
                variable,
                range,
                body,
            } => {
                codegen_log!("begin_loop ", #variable, " ", #range);
                self.backend
                    .begin_loop(function, variable, range.lower, range.upper, range.step)?;
                self.open_loops += 1;

                self.emit_block(body)?;

                codegen_log!("end_loop ", #variable);
                self.backend.end_loop(function)?;
                self.open_loops -= 1;
            }

            LoweredStatement::TerminalReturn { variable } => {
                codegen_log!("return_statement ", #variable);
                self.backend.return_statement(function, variable)?;
            }
        }

        Ok(())
    }

    fn encode(&mut self, value: &ValueRef) -> Result<Vec<u8>, CompilerError> {
        if self.width == ConstantWidth::Narrow
            && let ValueRef::Constant(literal) = value
            && narrowing_changes_value(literal)
        {
            self.warnings.push(CompilerWarning::without_location(
                format!(
                    "The constant {} in '{}' loses precision when narrowed to 4 bytes",
                    literal, self.function_name
                ),
                WarningKind::NarrowedConstant,
            ));
        }

        let encoding = encode_value(value, self.width).map_err(CompilerError::from)?;
        Ok(encoding)
    }
}

/// Constants in a lowered function that narrow encoding would change
pub fn narrowed_constants(function: &LoweredFunction) -> Vec<Literal> {
    fn collect(statements: &[LoweredStatement], found: &mut Vec<Literal>) {
        for statement in statements {
            let values: Vec<&ValueRef> = match statement {
                LoweredStatement::ScalarAssign { value, .. } => vec![value],
                LoweredStatement::BinaryOpAssign { left, right, .. } => vec![left, right],
                LoweredStatement::ConstantRangeLoop { body, .. } => {
                    collect(body, found);
                    Vec::new()
                }
                LoweredStatement::TerminalReturn { .. } => Vec::new(),
            };

            for value in values {
                if let ValueRef::Constant(literal) = value
                    && narrowing_changes_value(literal)
                {
                    found.push(literal.to_owned());
                }
            }
        }
    }

    let mut found = Vec::new();
    collect(&function.body, &mut found);
    found
}

#[cfg(test)]
#[path = "tests/emitter_tests.rs"]
mod tests;

//! Calling compiled functions from the host.
//!
//! A [`ForeignFunction`] pairs a prototype with a backend entry point. Arguments are cast to
//! their declared types and packed back to back in native byte order. The result buffer is
//! decoded the same way.

use crate::backends::codegen_backend::EntryPoint;
use crate::compiler_frontend::ast::ast_nodes::RawFunctionDefinition;
use crate::compiler_frontend::compiler_errors::{CompilerError, ErrorMetaDataKey};
use crate::compiler_frontend::datatypes::Scalar;
use crate::compiler_frontend::lowering::lowered_ir::FunctionPrototype;
use crate::runtime::execution_context::ExecutionContext;
use crate::runtime::host_interpreter::{bind_arguments, call_bound};
use crate::runtime::host_value::HostValue;
use crate::{return_call_error, return_compiler_error};
use std::fmt::{Debug, Formatter};

#[derive(Clone)]
pub struct ForeignFunction {
    pub prototype: FunctionPrototype,
    entry: EntryPoint,
}

impl Debug for ForeignFunction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForeignFunction")
            .field("prototype", &self.prototype)
            .finish_non_exhaustive()
    }
}

impl ForeignFunction {
    pub fn new(prototype: FunctionPrototype, entry: EntryPoint) -> Self {
        ForeignFunction { prototype, entry }
    }

    pub fn invoke(&self, args: &[Scalar]) -> Result<Scalar, CompilerError> {
        let expected = self.prototype.parameters.len();
        if args.len() != expected {
            return_call_error!(
                "'{}' takes {} argument(s) but {} were given",
                self.prototype.name,
                expected,
                args.len()
            );
        }

        let mut arguments = Vec::with_capacity(self.prototype.argument_buffer_size());
        for (arg, scalar_type) in args.iter().zip(self.prototype.parameter_types()) {
            arguments.extend(arg.cast(scalar_type).to_ne_bytes());
        }

        let return_type = self.prototype.return_type;
        let mut result = vec![0u8; return_type.byte_width()];

        self.entry
            .call(&arguments, &mut result)
            .map_err(|error| {
                CompilerError::from(error)
                    .with_metadata(ErrorMetaDataKey::FunctionName, self.prototype.name.as_str())
            })?;

        match Scalar::from_ne_bytes(return_type, &result) {
            Some(value) => Ok(value),
            None => return_compiler_error!(
                "Result buffer for '{}' is shorter than {}",
                self.prototype.name,
                return_type
            ),
        }
    }
}

/// The callable form of an `@func` definition
#[derive(Debug, Clone)]
pub enum AnalyzedFunction {
    Compiled {
        foreign: ForeignFunction,
        /// Where each compiled parameter sits in the original parameter list
        argument_positions: Vec<usize>,
        definition: RawFunctionDefinition,
    },
    /// Lowering or code generation failed, so the definition runs on the host
    Fallback {
        definition: RawFunctionDefinition,
        reason: CompilerError,
    },
}

impl AnalyzedFunction {
    pub fn definition(&self) -> &RawFunctionDefinition {
        match self {
            AnalyzedFunction::Compiled { definition, .. }
            | AnalyzedFunction::Fallback { definition, .. } => definition,
        }
    }

    pub fn is_compiled(&self) -> bool {
        matches!(self, AnalyzedFunction::Compiled { .. })
    }

    /// Binds host arguments against the original parameter list, then calls either the
    /// compiled entry point with the retained parameters or the host interpreter.
    pub fn call(
        &self,
        args: Vec<HostValue>,
        keywords: Vec<(String, HostValue)>,
        context: ExecutionContext,
    ) -> Result<HostValue, CompilerError> {
        match self {
            AnalyzedFunction::Fallback { definition, .. } => {
                let bound = bind_arguments(definition, args, keywords, context)?;
                call_bound(definition, bound, context)
            }

            AnalyzedFunction::Compiled {
                foreign,
                argument_positions,
                definition,
            } => {
                let bound = bind_arguments(definition, args, keywords, context)?;

                let mut scalars = Vec::with_capacity(argument_positions.len());
                for &position in argument_positions {
                    let value = &bound[position];
                    let Some(scalar) = value.to_scalar() else {
                        return_call_error!(
                            "Argument '{}' of '{}' must be a number, found '{}'",
                            definition.parameters[position].name,
                            definition.name,
                            value.type_name()
                        );
                    };
                    scalars.push(scalar);
                }

                let result = foreign.invoke(&scalars)?;
                Ok(HostValue::from_scalar(result))
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/foreign_call_tests.rs"]
mod tests;

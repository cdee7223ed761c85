//! In-process backend that turns builder calls into a typed instruction tree.
//!
//! Functions built here run through [`CompiledFunction`], which implements the same
//! `NativeFunction` contract a machine code backend would.

pub mod compiled_function;
pub mod function_builder;

use crate::backends::codegen_backend::{BackendError, CodegenBackend, EntryPoint};
use crate::backends::reference::compiled_function::CompiledFunction;
use crate::backends::reference::function_builder::FunctionBuilder;
use crate::compiler_frontend::compiler_messages::log_level::LogLevel;
use crate::compiler_frontend::datatypes::ScalarType;
use rustc_hash::FxHashMap;
use saying::say;
use std::sync::Arc;

#[derive(Default)]
pub struct ReferenceBackend {
    log_level: LogLevel,
    sessions: FxHashMap<String, FunctionBuilder>,
    compiled: FxHashMap<String, Arc<CompiledFunction>>,
}

impl ReferenceBackend {
    pub fn new() -> Self {
        ReferenceBackend::default()
    }

    pub fn compiled_function(&self, name: &str) -> Option<&CompiledFunction> {
        self.compiled.get(name).map(Arc::as_ref)
    }

    fn session(&mut self, function: &str) -> Result<&mut FunctionBuilder, BackendError> {
        self.sessions
            .get_mut(function)
            .ok_or_else(|| BackendError::UnknownFunction(String::from(function)))
    }
}

impl CodegenBackend for ReferenceBackend {
    fn set_log_level(&mut self, level: LogLevel) {
        self.log_level = level;
    }

    fn begin_function(
        &mut self,
        name: &str,
        param_types: &[ScalarType],
        param_names: &[String],
        return_type: ScalarType,
    ) -> Result<(), BackendError> {
        if self.sessions.contains_key(name) || self.compiled.contains_key(name) {
            return Err(BackendError::Redefinition(String::from(name)));
        }

        let builder = FunctionBuilder::new(name, param_types, param_names, return_type)?;
        self.sessions.insert(String::from(name), builder);
        Ok(())
    }

    fn begin_loop(
        &mut self,
        function: &str,
        loop_var: &str,
        lower: i32,
        upper: i32,
        step: i32,
    ) -> Result<(), BackendError> {
        self.session(function)?
            .begin_loop(loop_var, lower, upper, step)
    }

    fn end_loop(&mut self, function: &str) -> Result<(), BackendError> {
        self.session(function)?.end_loop()
    }

    fn assign_value(
        &mut self,
        function: &str,
        target: &str,
        encoding: &[u8],
    ) -> Result<(), BackendError> {
        self.session(function)?.assign_value(target, encoding)
    }

    fn assign_binary_op(
        &mut self,
        function: &str,
        target: &str,
        left: &[u8],
        op_code: u8,
        right: &[u8],
    ) -> Result<(), BackendError> {
        self.session(function)?
            .assign_binary_op(target, left, op_code, right)
    }

    fn return_statement(&mut self, function: &str, variable: &str) -> Result<(), BackendError> {
        self.session(function)?.return_statement(variable)
    }

    fn end_function(&mut self, function: &str) -> Result<(), BackendError> {
        let Some(builder) = self.sessions.remove(function) else {
            return Err(BackendError::UnknownFunction(String::from(function)));
        };

        let compiled = builder.finish()?;

        if self.log_level <= LogLevel::Debug {
            let instructions = compiled.body.len();
            say!(Bright Black "[ DEBUG ] >> ", "compiled ", function, " into ", instructions, " instructions");
        }

        self.compiled
            .insert(String::from(function), Arc::new(compiled));
        Ok(())
    }

    fn abort_function(&mut self, function: &str) {
        self.sessions.remove(function);
    }

    fn entry_point(&self, function: &str) -> Option<EntryPoint> {
        self.compiled
            .get(function)
            .map(|compiled| Arc::clone(compiled) as EntryPoint)
    }
}

#[cfg(test)]
#[path = "../tests/reference_backend_tests.rs"]
mod tests;

pub mod ast;
pub mod tokenizer {
    pub mod tokenizer;
    pub mod tokens;
}

pub mod compiler_messages {
    pub mod compiler_dev_logging;
    pub mod compiler_errors;
    pub mod compiler_warnings;
    pub mod display_messages;
    pub mod log_level;
}
pub use compiler_messages::compiler_errors;
pub use compiler_messages::compiler_warnings;
pub use compiler_messages::display_messages;

pub mod datatypes;
pub mod lowering;
pub mod value_encoding;

use crate::backends::codegen_backend::CodegenBackend;
use crate::backends::emitter::emit_function;
use crate::backends::foreign_call::{AnalyzedFunction, ForeignFunction};
use crate::backends::function_registry::{FunctionRegistry, RegisteredCallable, RegistryEntry};
use crate::compiler_frontend::ast::ast_nodes::{Definition, FunctionRole, RawFunctionDefinition};
use crate::compiler_frontend::ast::parse_module::parse_module;
use crate::compiler_frontend::compiler_errors::{CompilerError, ErrorMetaDataKey};
use crate::compiler_frontend::compiler_messages::log_level::set_log_level;
use crate::compiler_frontend::compiler_warnings::{CompilerWarning, WarningKind};
use crate::compiler_frontend::lowering::lower_function::{lower_function, retained_positions};
use crate::compiler_frontend::lowering::lowered_ir::LoweredFunction;
use crate::projects::settings::Config;
use crate::runtime::execution_context::ExecutionContext;
use crate::runtime::host_value::HostValue;
use crate::runtime::kernel::dispatch::KernelDispatcher;
use crate::runtime::kernel::partition::Kernel;
use crate::{log_debug, log_warning, return_compiler_error, timer_log};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Owns everything a program needs while it runs: the codegen backend, the registry of
/// defined callables and the kernel worker pool.
///
/// Definitions go through analyze → register → compile in order. Each step takes
/// `&mut self`, so nothing is defined while a call is running.
pub struct JitSession<B: CodegenBackend> {
    config: Config,
    backend: B,
    registry: FunctionRegistry,
    dispatcher: KernelDispatcher,
    warnings: Vec<CompilerWarning>,
}

impl<B: CodegenBackend> JitSession<B> {
    pub fn new(config: Config, mut backend: B) -> Result<Self, CompilerError> {
        config.validate()?;

        let level = config.runtime.log_level;
        set_log_level(level);
        backend.set_log_level(level);

        let dispatcher = KernelDispatcher::new(config.runtime.thread_count)?;

        Ok(JitSession {
            config,
            backend,
            registry: FunctionRegistry::new(),
            dispatcher,
            warnings: Vec::new(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    pub fn namespace(&self) -> &str {
        &self.config.codegen.namespace
    }

    /// Warnings raised since the last call, oldest first
    pub fn take_warnings(&mut self) -> Vec<CompilerWarning> {
        std::mem::take(&mut self.warnings)
    }

    // -----------------------------
    //  ANALYSIS
    // -----------------------------
    /// Lowers a definition without touching the backend or the registry.
    pub fn analyze(
        &mut self,
        definition: &RawFunctionDefinition,
    ) -> Result<LoweredFunction, CompilerError> {
        lower_function(definition, &mut self.warnings)
    }

    // -----------------------------
    //  COMPILATION
    // -----------------------------
    /// Compiles a definition, or wraps it for host execution when it can't be compiled.
    /// Never fails: the reason for a fallback is kept on the result and raised as a warning.
    pub fn compile(&mut self, definition: RawFunctionDefinition) -> AnalyzedFunction {
        let start = Instant::now();

        match self.try_compile(&definition) {
            Ok((foreign, argument_positions)) => {
                timer_log!(start, "Compiled function in: ");
                AnalyzedFunction::Compiled {
                    foreign,
                    argument_positions,
                    definition,
                }
            }

            Err(reason) => {
                let name = &definition.name;
                let msg = &reason.msg;
                log_warning!("'", name, "' can't be compiled and will run on the host: ", msg);

                self.warnings.push(CompilerWarning::new(
                    format!(
                        "'{}' runs on the host instead: {}",
                        definition.name, reason.msg
                    ),
                    &definition.location,
                    WarningKind::LoweringFallback,
                ));

                AnalyzedFunction::Fallback { definition, reason }
            }
        }
    }

    fn try_compile(
        &mut self,
        definition: &RawFunctionDefinition,
    ) -> Result<(ForeignFunction, Vec<usize>), CompilerError> {
        let lowered = self.analyze(definition)?;

        emit_function(
            &mut self.backend,
            &lowered,
            self.config.codegen.constant_width,
            &mut self.warnings,
        )?;

        let Some(entry) = self.backend.entry_point(&lowered.name) else {
            return_compiler_error!(
                "Backend finished '{}' but has no entry point for it",
                lowered.name
            );
        };

        let positions = retained_positions(definition, &lowered);
        Ok((ForeignFunction::new(lowered.prototype(), entry), positions))
    }

    // -----------------------------
    //  REGISTRATION
    // -----------------------------
    /// `@func`: the name is checked before compiling and registered after
    pub fn define_function(
        &mut self,
        definition: RawFunctionDefinition,
        timed: bool,
    ) -> Result<Arc<RegisteredCallable>, CompilerError> {
        let namespace = self.config.codegen.namespace.to_owned();
        let name = definition.name.to_owned();
        self.registry.ensure_available(&namespace, &name)?;

        let function = self.compile(definition);
        self.registry
            .register(&namespace, &name, RegistryEntry::Function(function), timed)
    }

    pub fn define_kernel(
        &mut self,
        definition: RawFunctionDefinition,
        timed: bool,
    ) -> Result<Arc<RegisteredCallable>, CompilerError> {
        let namespace = self.config.codegen.namespace.to_owned();
        let name = definition.name.to_owned();
        self.registry.ensure_available(&namespace, &name)?;

        let kernel = Kernel::new(definition, &mut self.warnings)?;
        self.registry
            .register(&namespace, &name, RegistryEntry::Kernel(kernel), timed)
    }

    pub fn define_host(
        &mut self,
        definition: RawFunctionDefinition,
        timed: bool,
    ) -> Result<Arc<RegisteredCallable>, CompilerError> {
        let namespace = self.config.codegen.namespace.to_owned();
        let name = definition.name.to_owned();

        self.registry
            .register(&namespace, &name, RegistryEntry::Host(definition), timed)
    }

    pub fn define(&mut self, definition: Definition) -> Result<Arc<RegisteredCallable>, CompilerError> {
        let Definition {
            function,
            role,
            timed,
        } = definition;

        match role {
            FunctionRole::Func => self.define_function(function, timed),
            FunctionRole::Kernel => self.define_kernel(function, timed),
            FunctionRole::Host => self.define_host(function, timed),
        }
    }

    /// Parses and defines every function in a source module, in order.
    /// Stops at the first error; functions defined before it stay registered.
    pub fn load_source(
        &mut self,
        source_code: &str,
    ) -> Result<Vec<Arc<RegisteredCallable>>, CompilerError> {
        let start = Instant::now();
        let module = parse_module(source_code, &mut self.warnings)?;
        timer_log!(start, "Parsed module in: ");

        let mut defined = Vec::with_capacity(module.definitions.len());
        for definition in module.definitions {
            defined.push(self.define(definition)?);
        }

        let count = defined.len();
        log_debug!("Defined ", count, " function(s)");

        Ok(defined)
    }

    pub fn load_file(&mut self, path: &Path) -> Result<Vec<Arc<RegisteredCallable>>, CompilerError> {
        let source_code = match fs::read_to_string(path) {
            Ok(source) => source,
            Err(error) => {
                return Err(CompilerError::file_error(
                    path,
                    format!("Could not read '{}': {error}", path.display()),
                ));
            }
        };

        self.load_source(&source_code)
            .map_err(|error| error.with_file_path(path.to_path_buf()))
    }

    // -----------------------------
    //  CALLS
    // -----------------------------
    /// Calls a name in the session's namespace. Builtins are reachable too.
    pub fn call(
        &self,
        name: &str,
        args: Vec<HostValue>,
        keywords: Vec<(String, HostValue)>,
    ) -> Result<HostValue, CompilerError> {
        self.call_in(&self.config.codegen.namespace, name, args, keywords)
    }

    pub fn call_in(
        &self,
        namespace: &str,
        name: &str,
        args: Vec<HostValue>,
        keywords: Vec<(String, HostValue)>,
    ) -> Result<HostValue, CompilerError> {
        let context = ExecutionContext::new(&self.registry, &self.dispatcher, namespace);
        context.call(name, args, keywords).map_err(|error| {
            if error.function_name().is_some() {
                error
            } else {
                error.with_metadata(ErrorMetaDataKey::FunctionName, name)
            }
        })
    }
}

#[cfg(test)]
#[path = "tests/jit_session_tests.rs"]
mod tests;

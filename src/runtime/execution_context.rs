use crate::backends::function_registry::{FunctionRegistry, RegisteredCallable, RegistryEntry};
use crate::compiler_frontend::compiler_errors::{CompilerError, ErrorType};
use crate::runtime::builtins::lookup_builtin;
use crate::runtime::host_interpreter::run_function;
use crate::runtime::host_value::HostValue;
use crate::runtime::kernel::dispatch::{CancellationToken, KernelDispatcher};
use crate::{log_message, return_runtime_error};
use std::time::Instant;

pub const CANCELLED_MESSAGE: &str = "kernel worker cancelled after a sibling failed";

/// What running code can reach: the registry its namespace resolves against, the
/// kernel dispatcher, and the cancellation token of the kernel it runs inside (if any).
#[derive(Clone, Copy)]
pub struct ExecutionContext<'a> {
    pub registry: &'a FunctionRegistry,
    pub dispatcher: &'a KernelDispatcher,
    pub namespace: &'a str,
    pub cancellation: Option<&'a CancellationToken>,
}

impl<'a> ExecutionContext<'a> {
    pub fn new(
        registry: &'a FunctionRegistry,
        dispatcher: &'a KernelDispatcher,
        namespace: &'a str,
    ) -> Self {
        ExecutionContext {
            registry,
            dispatcher,
            namespace,
            cancellation: None,
        }
    }

    pub fn with_cancellation(self, token: &'a CancellationToken) -> ExecutionContext<'a> {
        ExecutionContext {
            cancellation: Some(token),
            ..self
        }
    }

    pub fn check_cancelled(&self) -> Result<(), CompilerError> {
        match self.cancellation {
            Some(token) if token.is_cancelled() => return_runtime_error!(CANCELLED_MESSAGE),
            _ => Ok(()),
        }
    }

    /// Registered functions first, then builtins.
    pub fn call(
        &self,
        name: &str,
        args: Vec<HostValue>,
        keywords: Vec<(String, HostValue)>,
    ) -> Result<HostValue, CompilerError> {
        if let Some(callable) = self.registry.get(self.namespace, name) {
            return self.call_registered(callable, args, keywords);
        }

        if let Some(builtin) = lookup_builtin(name) {
            if let Some((keyword, _)) = keywords.first() {
                return_runtime_error!(
                    "{}() got an unexpected keyword argument '{}'",
                    name,
                    keyword
                );
            }
            return builtin(&args);
        }

        return_runtime_error!("name '{}' is not defined", name)
    }

    pub fn call_registered(
        &self,
        callable: &RegisteredCallable,
        args: Vec<HostValue>,
        keywords: Vec<(String, HostValue)>,
    ) -> Result<HostValue, CompilerError> {
        let start = Instant::now();

        let result = match &callable.entry {
            RegistryEntry::Function(function) => function.call(args, keywords, *self),
            RegistryEntry::Kernel(kernel) => self.dispatcher.dispatch(kernel, *self, args, keywords),
            RegistryEntry::Host(definition) => run_function(definition, args, keywords, *self),
        };

        if callable.timed {
            let elapsed = start.elapsed();
            let name = &callable.key.name;
            log_message!("'", name, "' ran in ", Green #elapsed);
        }

        result
    }
}

pub fn is_cancellation(error: &CompilerError) -> bool {
    error.error_type == ErrorType::Runtime && error.msg == CANCELLED_MESSAGE
}

use crate::compiler_frontend::ast::ast_nodes::Expression;
use crate::compiler_frontend::compiler_errors::{CompilerError, ErrorMetaDataKey, ErrorType};
use crate::compiler_frontend::lowering::range_normalization::RangeTriple;
use crate::runtime::builtins::is_builtin;
use crate::runtime::execution_context::{ExecutionContext, is_cancellation};
use crate::runtime::host_interpreter::{bind_arguments, evaluate_with_locals, run_loop_over};
use crate::runtime::host_value::HostValue;
use crate::runtime::kernel::partition::{Kernel, KernelPartition, PartitionDescriptor};
use crate::{dispatch_log, log_debug, return_compiler_error, return_config_error, return_runtime_error};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Set by the first worker that fails. Siblings check it at every loop iteration.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        CancellationToken::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Runs kernels on a fixed size worker pool.
pub struct KernelDispatcher {
    pool: ThreadPool,
    thread_count: usize,
}

impl KernelDispatcher {
    pub fn new(thread_count: usize) -> Result<Self, CompilerError> {
        if thread_count == 0 {
            return_config_error!("thread_count must be at least 1");
        }

        let pool = match ThreadPoolBuilder::new()
            .num_threads(thread_count)
            .thread_name(|index| format!("spindle-worker-{index}"))
            .build()
        {
            Ok(pool) => pool,
            Err(error) => return_compiler_error!("Failed to start the worker pool: {}", error),
        };

        Ok(KernelDispatcher { pool, thread_count })
    }

    pub fn thread_count(&self) -> usize {
        self.thread_count
    }

    /// One descriptor per worker for an evaluated range
    pub fn descriptors(&self, range: RangeTriple<i64>) -> Vec<PartitionDescriptor> {
        (0..self.thread_count)
            .map(|thread_id| PartitionDescriptor::new(range, thread_id, self.thread_count))
            .collect()
    }

    /// Calls a kernel and returns once every worker has finished.
    ///
    /// Kernels always return None. The first worker error is returned after the join.
    pub fn dispatch(
        &self,
        kernel: &Kernel,
        context: ExecutionContext,
        args: Vec<HostValue>,
        keywords: Vec<(String, HostValue)>,
    ) -> Result<HostValue, CompilerError> {
        let bound = bind_arguments(&kernel.definition, args, keywords, context)?;

        let Some(partition) = &kernel.partition else {
            log_debug!("Kernel '", #kernel.definition.name, "' is empty, nothing to run");
            return Ok(HostValue::None);
        };

        link_kernel(partition, context)?;

        let Some((loop_target, loop_body)) = partition.governing_loop() else {
            return_compiler_error!(
                "Worker of kernel '{}' has no governing loop",
                kernel.definition.name
            );
        };

        let range = evaluate_range(kernel, partition, &bound, context)?;
        let descriptors = self.descriptors(range);
        dispatch_log!("Dispatching ", #kernel.definition.name, " over ", #descriptors);

        let token = CancellationToken::new();
        let worker_context = context.with_cancellation(&token);

        let results: Vec<Result<HostValue, CompilerError>> = self.pool.install(|| {
            descriptors
                .par_iter()
                .map(|descriptor| {
                    let mut worker_args = bound.to_owned();
                    worker_args.push(HostValue::Int(descriptor.thread_id));
                    worker_args.push(HostValue::Int(descriptor.thread_count));

                    // Shard bounds come from the descriptor, so the walk matches it exactly
                    let result = run_loop_over(
                        &partition.worker,
                        worker_args,
                        loop_target,
                        loop_body,
                        descriptor.indices(),
                        worker_context,
                    );
                    if result.is_err() {
                        token.cancel();
                    }
                    result
                })
                .collect()
        });

        // Prefer the error that caused the cancellation over the cancellations themselves
        let mut first_error: Option<CompilerError> = None;
        for result in results {
            if let Err(error) = result {
                match &first_error {
                    Some(existing) if !is_cancellation(existing) || is_cancellation(&error) => {}
                    _ => first_error = Some(error),
                }
            }
        }

        match first_error {
            Some(error) => Err(error),
            None => Ok(HostValue::None),
        }
    }
}

/// Every name the worker calls must be registered or builtin before any worker starts.
fn link_kernel(partition: &KernelPartition, context: ExecutionContext) -> Result<(), CompilerError> {
    for name in &partition.called_names {
        if !context.registry.contains(context.namespace, name) && !is_builtin(name) {
            return Err(CompilerError::new(
                format!(
                    "Kernel '{}' calls '{}', which is not defined in namespace '{}'",
                    partition.worker.name, name, context.namespace
                ),
                partition.worker.location.to_error_location(),
                ErrorType::Link,
            )
            .with_metadata(ErrorMetaDataKey::FunctionName, partition.worker.name.as_str()));
        }
    }

    Ok(())
}

/// The governing range, evaluated once with the kernel's arguments in scope
fn evaluate_range(
    kernel: &Kernel,
    partition: &KernelPartition,
    bound: &[HostValue],
    context: ExecutionContext,
) -> Result<RangeTriple<i64>, CompilerError> {
    let locals: Vec<(String, HostValue)> = kernel
        .definition
        .parameters
        .iter()
        .map(|p| p.name.to_owned())
        .zip(bound.iter().cloned())
        .collect();

    let evaluate = |expression: &Expression| -> Result<i64, CompilerError> {
        let value = evaluate_with_locals(&kernel.definition, expression, locals.to_owned(), context)?;
        match value.as_index() {
            Some(bound) => Ok(bound),
            None => return_runtime_error!(
                "range bounds of kernel '{}' must be integers, found '{}'",
                kernel.definition.name,
                value.type_name()
            ),
        }
    };

    let range = RangeTriple {
        lower: evaluate(&partition.range.lower)?,
        upper: evaluate(&partition.range.upper)?,
        step: evaluate(&partition.range.step)?,
    };

    if range.step == 0 {
        return_runtime_error!(
            "range step of kernel '{}' must not be zero",
            kernel.definition.name
        );
    }

    Ok(range)
}

#[cfg(test)]
#[path = "../tests/dispatch_tests.rs"]
mod tests;

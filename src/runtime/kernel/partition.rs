use crate::compiler_frontend::ast::ast_nodes::{
    BinaryOperator, Expression, ExpressionKind, Literal, RawFunctionDefinition, RawParameter,
    Statement, StatementKind, called_names,
};
use crate::compiler_frontend::compiler_errors::CompilerError;
use crate::compiler_frontend::compiler_warnings::{CompilerWarning, WarningKind};
use crate::compiler_frontend::lowering::range_normalization::{RangeTriple, normalize_range};
use crate::compiler_frontend::tokenizer::tokens::TextLocation;
use crate::{ast_log, return_rule_error};

pub const THREAD_ID_PARAMETER: &str = "__thread_id";
pub const THREAD_COUNT_PARAMETER: &str = "__thread_count";

/// A kernel as registered: the definition callers bind against and its partitioned worker.
/// A kernel without a governing loop has no partition and does nothing when called.
#[derive(Debug, Clone)]
pub struct Kernel {
    pub definition: RawFunctionDefinition,
    pub partition: Option<KernelPartition>,
}

impl Kernel {
    pub fn new(
        definition: RawFunctionDefinition,
        warnings: &mut Vec<CompilerWarning>,
    ) -> Result<Kernel, CompilerError> {
        let partition = partition_kernel(&definition, warnings)?;
        Ok(Kernel {
            definition,
            partition,
        })
    }
}

#[derive(Debug, Clone)]
pub struct KernelPartition {
    /// The kernel with two trailing parameters and a thread-strided governing loop
    pub worker: RawFunctionDefinition,
    pub loop_variable: String,
    /// Normalized bounds of the governing loop as written
    pub range: RangeTriple<Expression>,
    /// Every function the worker calls, resolved against the registry at dispatch
    pub called_names: Vec<String>,
}

impl KernelPartition {
    /// Target and body of the worker's governing loop
    pub fn governing_loop(&self) -> Option<(&Expression, &[Statement])> {
        match self.worker.body.first().map(|statement| &statement.kind) {
            Some(StatementKind::For { target, body, .. }) => Some((target, body.as_slice())),
            _ => None,
        }
    }
}

/// Rewrites a kernel so each worker walks a disjoint slice of its governing loop.
///
/// The first top level `for <name> in range(...)` governs. Worker `t` of `n` runs
/// `range(lower + t * step, upper, step * n)`, so the slices interleave and cover every
/// index of the original range exactly once.
pub fn partition_kernel(
    definition: &RawFunctionDefinition,
    warnings: &mut Vec<CompilerWarning>,
) -> Result<Option<KernelPartition>, CompilerError> {
    let mut governing: Option<(&Statement, &str, &[Expression], &[Statement])> = None;

    for statement in &definition.body {
        if governing.is_none()
            && let StatementKind::For { target, iter, body } = &statement.kind
            && let Some(variable) = target.as_name()
            && let Some(args) = iter.as_range_call()
        {
            governing = Some((statement, variable, args, body));
            continue;
        }

        warnings.push(CompilerWarning::new(
            format!(
                "Only the first 'for ... in range(...)' loop of kernel '{}' runs, this statement is ignored",
                definition.name
            ),
            &statement.location,
            WarningKind::IllegalKernelStatement,
        ));
    }

    let Some((statement, variable, args, body)) = governing else {
        warnings.push(CompilerWarning::new(
            format!(
                "Kernel '{}' has no 'for ... in range(...)' loop and does nothing",
                definition.name
            ),
            &definition.location,
            WarningKind::EmptyKernel,
        ));
        return Ok(None);
    };

    let location = statement.location;
    let zero = Expression::constant(Literal::Int(0), location);
    let one = Expression::constant(Literal::Int(1), location);

    let Some(range) = normalize_range(args.to_vec(), zero, one) else {
        return_rule_error!(
            format!(
                "range in kernel '{}' expects 1 to 3 arguments, found {}",
                definition.name,
                args.len()
            ),
            location.to_error_location(),
            {
                FunctionName => definition.name.as_str(),
                CompilationStage => "Kernel partitioning",
            }
        )
    };

    let worker = build_worker(definition, variable, &range, body, location);
    let called_names = called_names(&worker.body);

    ast_log!("Kernel worker:\n", worker);

    Ok(Some(KernelPartition {
        worker,
        loop_variable: String::from(variable),
        range,
        called_names,
    }))
}

fn build_worker(
    definition: &RawFunctionDefinition,
    variable: &str,
    range: &RangeTriple<Expression>,
    body: &[Statement],
    location: TextLocation,
) -> RawFunctionDefinition {
    let thread_id = Expression::name(THREAD_ID_PARAMETER, location);
    let thread_count = Expression::name(THREAD_COUNT_PARAMETER, location);

    // lower + __thread_id * step
    let start = Expression::binary(
        range.lower.clone(),
        BinaryOperator::Add,
        Expression::binary(thread_id, BinaryOperator::Multiply, range.step.clone()),
    );
    // step * __thread_count
    let stride = Expression::binary(range.step.clone(), BinaryOperator::Multiply, thread_count);

    let iter = Expression::new(
        ExpressionKind::Call {
            function: Box::new(Expression::name("range", location)),
            args: vec![start, range.upper.clone(), stride],
            keywords: Vec::new(),
        },
        location,
    );

    let governing_loop = Statement::new(
        StatementKind::For {
            target: Expression::name(variable, location),
            iter,
            body: body.to_vec(),
        },
        location,
    );

    let mut parameters = definition.parameters.to_owned();
    parameters.push(RawParameter {
        name: String::from(THREAD_ID_PARAMETER),
        annotation: None,
        default: Some(Expression::constant(Literal::Int(0), location)),
    });
    parameters.push(RawParameter {
        name: String::from(THREAD_COUNT_PARAMETER),
        annotation: None,
        default: Some(Expression::constant(Literal::Int(1), location)),
    });

    RawFunctionDefinition {
        name: definition.name.to_owned(),
        parameters,
        returns: None,
        body: vec![governing_loop],
        location: definition.location,
    }
}

/// The slice of a kernel's range one worker walks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionDescriptor {
    pub thread_id: i64,
    pub thread_count: i64,
    pub lower: i64,
    pub upper: i64,
    pub step: i64,
}

impl PartitionDescriptor {
    pub fn new(range: RangeTriple<i64>, thread_id: usize, thread_count: usize) -> Self {
        PartitionDescriptor {
            thread_id: thread_id as i64,
            thread_count: thread_count as i64,
            lower: range.lower,
            upper: range.upper,
            step: range.step,
        }
    }

    pub fn shard(&self) -> RangeTriple<i64> {
        RangeTriple {
            lower: self
                .lower
                .saturating_add(self.thread_id.saturating_mul(self.step)),
            upper: self.upper,
            step: self.step.saturating_mul(self.thread_count),
        }
    }

    pub fn indices(&self) -> impl Iterator<Item = i64> + use<> {
        self.shard().iter()
    }
}

#[cfg(test)]
#[path = "../tests/partition_tests.rs"]
mod tests;

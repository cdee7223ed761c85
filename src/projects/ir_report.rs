//! What `spindle ir` shows for each definition in a file.

use crate::compiler_frontend::ast::ast_nodes::{FunctionRole, SourceModule};
use crate::compiler_frontend::compiler_errors::CompilerError;
use crate::compiler_frontend::compiler_warnings::CompilerWarning;
use crate::compiler_frontend::lowering::lower_function::lower_function;
use crate::compiler_frontend::lowering::lowered_ir::{FunctionPrototype, LoweredFunction};
use crate::runtime::kernel::partition::partition_kernel;
use saying::say;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IrReport {
    Compiled {
        name: String,
        prototype: FunctionPrototype,
        ir: LoweredFunction,
    },
    Fallback {
        name: String,
        reason: String,
    },
    Kernel {
        name: String,
        /// Unparsed worker definition, None for an empty kernel
        worker: Option<String>,
    },
    Host {
        name: String,
    },
}

impl IrReport {
    pub fn name(&self) -> &str {
        match self {
            IrReport::Compiled { name, .. }
            | IrReport::Fallback { name, .. }
            | IrReport::Kernel { name, .. }
            | IrReport::Host { name } => name,
        }
    }
}

/// Lowers every `@func` and partitions every kernel without compiling or running anything.
/// A lowering failure is part of the report. A kernel that can't be partitioned is an error.
pub fn build_ir_report(
    module: &SourceModule,
    warnings: &mut Vec<CompilerWarning>,
) -> Result<Vec<IrReport>, CompilerError> {
    let mut reports = Vec::with_capacity(module.definitions.len());

    for definition in &module.definitions {
        let function = &definition.function;
        let name = function.name.to_owned();

        let report = match definition.role {
            FunctionRole::Func => match lower_function(function, warnings) {
                Ok(lowered) => IrReport::Compiled {
                    name,
                    prototype: lowered.prototype(),
                    ir: lowered,
                },
                Err(error) => IrReport::Fallback {
                    name,
                    reason: error.msg,
                },
            },

            FunctionRole::Kernel => {
                let partition = partition_kernel(function, warnings)?;
                IrReport::Kernel {
                    name,
                    worker: partition.map(|p| p.worker.to_string()),
                }
            }

            FunctionRole::Host => IrReport::Host { name },
        };

        reports.push(report);
    }

    Ok(reports)
}

pub fn print_ir_report(reports: &[IrReport]) {
    for report in reports {
        let name = report.name();

        match report {
            IrReport::Compiled { ir, prototype, .. } => {
                let unparsed = ir.to_raw().to_string();
                let parameters = prototype.parameters.len();
                let return_type = prototype.return_type;
                say!(Green Bold "\n@func ", name, Reset " (", parameters, " compiled parameter(s), returns ", Blue #return_type, Reset ")");
                say!(unparsed);
            }

            IrReport::Fallback { reason, .. } => {
                say!(Yellow Bold "\n@func ", name, Reset " runs on the host");
                say!(Bright Black reason);
            }

            IrReport::Kernel {
                worker: Some(worker),
                ..
            } => {
                say!(Green Bold "\n@kernel ", name);
                say!(worker);
            }

            IrReport::Kernel { worker: None, .. } => {
                say!(Yellow Bold "\n@kernel ", name, Reset " is empty");
            }

            IrReport::Host { .. } => {
                say!(Bright Black "\n", name, " is a host function");
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/ir_report_tests.rs"]
mod tests;

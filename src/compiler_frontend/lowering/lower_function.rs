use crate::compiler_frontend::ast::ast_nodes::{
    Annotation, Expression, ExpressionKind, Literal, RawFunctionDefinition, Statement,
    StatementKind,
};
use crate::compiler_frontend::compiler_errors::CompilerError;
use crate::compiler_frontend::compiler_warnings::{CompilerWarning, WarningKind};
use crate::compiler_frontend::datatypes::ScalarType;
use crate::compiler_frontend::lowering::lowered_ir::{
    ArithmeticOp, LoweredFunction, LoweredParameter, LoweredStatement, ValueRef,
};
use crate::compiler_frontend::compiler_messages::log_level::{LogLevel, log_enabled};
use crate::compiler_frontend::lowering::range_normalization::normalize_range;
use crate::compiler_frontend::tokenizer::tokens::TextLocation;
use crate::{log_debug, lowering_log, return_lowering_error};

/// Filters a raw function down to the statements a backend can compile.
///
/// Unsupported statements are dropped with a warning. The function only fails when its
/// signature or a loop header can't be expressed: a missing or non-scalar return type,
/// a `range` with the wrong number of arguments, a zero step, or a bound that isn't an
/// Int32 integer.
pub fn lower_function(
    function: &RawFunctionDefinition,
    warnings: &mut Vec<CompilerWarning>,
) -> Result<LoweredFunction, CompilerError> {
    let return_type = lower_return_type(function)?;

    let mut parameters = Vec::with_capacity(function.parameters.len());
    for parameter in &function.parameters {
        match parameter.annotation.as_ref().and_then(annotation_type) {
            Some(scalar_type) => parameters.push(LoweredParameter {
                name: parameter.name.to_owned(),
                scalar_type,
            }),
            None => warnings.push(CompilerWarning::new(
                format!(
                    "Parameter '{}' of '{}' has no scalar type annotation and is not passed to compiled code",
                    parameter.name, function.name
                ),
                &function.location,
                WarningKind::DroppedParameter,
            )),
        }
    }

    let mut lowering = FunctionLowering {
        function_name: &function.name,
        warnings,
    };
    let body = lowering.lower_block(&function.body, 0)?;

    let lowered = LoweredFunction {
        name: function.name.to_owned(),
        parameters,
        return_type,
        body,
    };

    lowering_log!(Green "Lowered ", #lowered);
    if log_enabled(LogLevel::Debug) {
        let unparsed = lowered.to_raw();
        log_debug!("\n========================================\n", unparsed, "========================================");
    }

    Ok(lowered)
}

/// Recognised scalar annotation, matched on the final dotted segment
pub fn annotation_type(annotation: &Annotation) -> Option<ScalarType> {
    ScalarType::from_name(annotation.final_segment())
}

fn lower_return_type(function: &RawFunctionDefinition) -> Result<ScalarType, CompilerError> {
    let Some(annotation) = &function.returns else {
        return_lowering_error!(
            format!("'{}' has no return type annotation", function.name),
            function.location.to_error_location(),
            {
                FunctionName => function.name.as_str(),
                CompilationStage => "Lowering",
                PrimarySuggestion => "Add a return type such as '-> Int32'",
            }
        )
    };

    match annotation_type(annotation) {
        Some(scalar_type) => Ok(scalar_type),
        None => return_lowering_error!(
            format!(
                "'{}' returns '{annotation}', which is not a scalar type",
                function.name
            ),
            function.location.to_error_location(),
            {
                FunctionName => function.name.as_str(),
                CompilationStage => "Lowering",
                FoundType => annotation.to_string(),
                PrimarySuggestion => "Use Int32, Int64, Float32 or Float64",
            }
        ),
    }
}

struct FunctionLowering<'a> {
    function_name: &'a str,
    warnings: &'a mut Vec<CompilerWarning>,
}

impl FunctionLowering<'_> {
    fn warn(&mut self, msg: impl Into<String>, location: &TextLocation, kind: WarningKind) {
        self.warnings
            .push(CompilerWarning::new(msg, location, kind));
    }

    fn lower_block(
        &mut self,
        statements: &[Statement],
        depth: usize,
    ) -> Result<Vec<LoweredStatement>, CompilerError> {
        let mut lowered = Vec::new();

        for (index, statement) in statements.iter().enumerate() {
            match &statement.kind {
                StatementKind::Assign { targets, value } => {
                    if let Some(assign) = self.lower_assign(targets, value, &statement.location) {
                        lowered.push(assign);
                    }
                }

                StatementKind::For { target, iter, body } => {
                    if let Some(range_loop) =
                        self.lower_for(target, iter, body, depth, &statement.location)?
                    {
                        lowered.push(range_loop);
                    }
                }

                StatementKind::Return(Some(value)) if depth == 0 && value.as_name().is_some() => {
                    let variable = String::from(value.as_name().unwrap_or_default());
                    lowered.push(LoweredStatement::TerminalReturn { variable });

                    if let Some(next) = statements.get(index + 1) {
                        self.warn(
                            format!(
                                "Statements after the return in '{}' are never compiled",
                                self.function_name
                            ),
                            &next.location,
                            WarningKind::UnreachableCode,
                        );
                    }
                    break;
                }

                StatementKind::Return(_) => self.warn(
                    "Only 'return <name>' at the top of the function body can be compiled",
                    &statement.location,
                    WarningKind::UnsupportedReturn,
                ),

                _ => self.warn(
                    "This statement can't be compiled and is ignored",
                    &statement.location,
                    WarningKind::UnsupportedStatement,
                ),
            }
        }

        Ok(lowered)
    }

    fn lower_assign(
        &mut self,
        targets: &[Expression],
        value: &Expression,
        location: &TextLocation,
    ) -> Option<LoweredStatement> {
        let [target] = targets else {
            self.warn(
                "Assignments with more than one target can't be compiled",
                location,
                WarningKind::MultiTargetAssign,
            );
            return None;
        };

        let target = match &target.kind {
            ExpressionKind::Name(name) => name.to_owned(),
            ExpressionKind::Tuple(_) | ExpressionKind::List(_) => {
                self.warn(
                    "Tuple assignments can't be compiled",
                    location,
                    WarningKind::MultiTargetAssign,
                );
                return None;
            }
            _ => {
                self.warn(
                    format!("Assignment to '{target}' can't be compiled"),
                    location,
                    WarningKind::UnsupportedAssignTarget,
                );
                return None;
            }
        };

        if let Some(value) = ValueRef::from_expression(value) {
            return Some(LoweredStatement::ScalarAssign { target, value });
        }

        if let ExpressionKind::BinaryOp { left, op, right } = &value.kind
            && let Some(op) = ArithmeticOp::from_binary_operator(*op)
            && let Some(left) = ValueRef::from_expression(left)
            && let Some(right) = ValueRef::from_expression(right)
        {
            return Some(LoweredStatement::BinaryOpAssign {
                target,
                left,
                op,
                right,
            });
        }

        self.warn(
            format!("The value '{value}' can't be compiled"),
            location,
            WarningKind::UnsupportedExpression,
        );
        None
    }

    fn lower_for(
        &mut self,
        target: &Expression,
        iter: &Expression,
        body: &[Statement],
        depth: usize,
        location: &TextLocation,
    ) -> Result<Option<LoweredStatement>, CompilerError> {
        let Some(args) = iter.as_range_call() else {
            self.warn(
                "Only loops over range(...) can be compiled",
                location,
                WarningKind::UnsupportedStatement,
            );
            return Ok(None);
        };

        if args.is_empty() || args.len() > 3 {
            return_lowering_error!(
                format!("range expects 1 to 3 arguments, found {}", args.len()),
                location.to_error_location(),
                {
                    FunctionName => self.function_name,
                    CompilationStage => "Lowering",
                }
            )
        }

        let Some(variable) = target.as_name() else {
            self.warn(
                "Only loops with a single loop variable can be compiled",
                location,
                WarningKind::UnsupportedStatement,
            );
            return Ok(None);
        };

        let literals: Option<Vec<Literal>> = args.iter().map(Expression::as_literal).collect();
        let Some(literals) = literals else {
            self.warn(
                format!("The loop over '{iter}' has bounds that aren't constants"),
                location,
                WarningKind::NonConstantRange,
            );
            return Ok(None);
        };

        let mut bounds = Vec::with_capacity(literals.len());
        for literal in literals {
            bounds.push(self.literal_bound(literal, location)?);
        }

        let Some(range) = normalize_range(bounds, 0, 1) else {
            return_lowering_error!(
                "range expects 1 to 3 arguments",
                location.to_error_location()
            )
        };

        if range.step == 0 {
            return_lowering_error!(
                "range step can't be zero",
                location.to_error_location(),
                {
                    FunctionName => self.function_name,
                    CompilationStage => "Lowering",
                }
            )
        }

        let body = self.lower_block(body, depth + 1)?;

        Ok(Some(LoweredStatement::ConstantRangeLoop {
            variable: variable.to_owned(),
            range,
            body,
        }))
    }

    fn literal_bound(
        &self,
        literal: Literal,
        location: &TextLocation,
    ) -> Result<i32, CompilerError> {
        match literal {
            Literal::Int(value) => match i32::try_from(value) {
                Ok(bound) => Ok(bound),
                Err(_) => return_lowering_error!(
                    format!("range bound {value} does not fit in Int32"),
                    location.to_error_location(),
                    {
                        FunctionName => self.function_name,
                        CompilationStage => "Lowering",
                    }
                ),
            },
            other => return_lowering_error!(
                format!("range bounds must be integers, found {other}"),
                location.to_error_location(),
                {
                    FunctionName => self.function_name,
                    CompilationStage => "Lowering",
                    ExpectedType => "Int32",
                }
            ),
        }
    }
}

/// Positions of the lowered parameters in the raw parameter list.
pub fn retained_positions(
    function: &RawFunctionDefinition,
    lowered: &LoweredFunction,
) -> Vec<usize> {
    lowered
        .parameters
        .iter()
        .filter_map(|kept| {
            function
                .parameters
                .iter()
                .position(|p| p.name == kept.name)
        })
        .collect()
}

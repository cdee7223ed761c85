//! Tree walking interpreter for raw function definitions.
//!
//! This is how every definition runs when it isn't compiled: host functions, `@func`
//! fallbacks and kernel workers. Semantics follow the host language rather than the
//! compiled subset, so integers are checked for overflow, `/` always produces a float and
//! `//` and `%` round toward negative infinity.

use crate::compiler_frontend::ast::ast_nodes::{
    BinaryOperator, BoolOperator, CompareOperator, Expression, ExpressionKind,
    RawFunctionDefinition, Statement, StatementKind, UnaryOperator,
};
use crate::compiler_frontend::ast::ast_display::binary_symbol;
use crate::compiler_frontend::compiler_errors::{
    CompilerError, ErrorLocation, ErrorMetaDataKey, ErrorType,
};
use crate::runtime::execution_context::ExecutionContext;
use crate::runtime::host_value::{HostValue, SharedArray};
use crate::{return_call_error, return_runtime_error};
use rustc_hash::FxHashMap;
use std::cmp::Ordering;

type Locals = FxHashMap<String, HostValue>;

enum Flow {
    Normal,
    Break,
    Continue,
    Return(HostValue),
}

/// Binds and runs a definition with host call semantics.
pub fn run_function(
    definition: &RawFunctionDefinition,
    args: Vec<HostValue>,
    keywords: Vec<(String, HostValue)>,
    context: ExecutionContext,
) -> Result<HostValue, CompilerError> {
    let bound = bind_arguments(definition, args, keywords, context)?;
    call_bound(definition, bound, context)
}

/// Matches positional and keyword arguments to the parameter list and fills in defaults.
/// The result has exactly one value per parameter, in parameter order.
pub fn bind_arguments(
    definition: &RawFunctionDefinition,
    args: Vec<HostValue>,
    keywords: Vec<(String, HostValue)>,
    context: ExecutionContext,
) -> Result<Vec<HostValue>, CompilerError> {
    let parameters = &definition.parameters;

    if args.len() > parameters.len() {
        return_call_error!(
            "{}() takes {} positional argument(s) but {} were given",
            definition.name,
            parameters.len(),
            args.len()
        );
    }

    let mut slots: Vec<Option<HostValue>> = args.into_iter().map(Some).collect();
    slots.resize(parameters.len(), None);

    for (name, value) in keywords {
        let Some(position) = parameters.iter().position(|p| p.name == name) else {
            return_call_error!(
                "{}() got an unexpected keyword argument '{}'",
                definition.name,
                name
            );
        };

        if slots[position].is_some() {
            return_call_error!(
                "{}() got multiple values for argument '{}'",
                definition.name,
                name
            );
        }

        slots[position] = Some(value);
    }

    let mut bound = Vec::with_capacity(parameters.len());
    for (slot, parameter) in slots.into_iter().zip(parameters) {
        let value = match (slot, &parameter.default) {
            (Some(value), _) => value,
            (None, Some(default)) => {
                let mut scope = HostInterpreter::new(definition, context);
                scope.evaluate(default)?
            }
            (None, None) => return_call_error!(
                "{}() missing required argument '{}'",
                definition.name,
                parameter.name
            ),
        };
        bound.push(value);
    }

    Ok(bound)
}

/// Runs a definition whose arguments are already bound in parameter order.
pub fn call_bound(
    definition: &RawFunctionDefinition,
    bound: Vec<HostValue>,
    context: ExecutionContext,
) -> Result<HostValue, CompilerError> {
    let mut interpreter = HostInterpreter::new(definition, context);
    for (parameter, value) in definition.parameters.iter().zip(bound) {
        interpreter.locals.insert(parameter.name.to_owned(), value);
    }

    interpreter.run_body()
}

/// Runs one loop of a definition over precomputed indices, with its arguments already bound.
/// Kernel workers use this so each walks exactly the indices of its partition descriptor.
pub fn run_loop_over(
    definition: &RawFunctionDefinition,
    bound: Vec<HostValue>,
    target: &Expression,
    body: &[Statement],
    indices: impl Iterator<Item = i64>,
    context: ExecutionContext,
) -> Result<HostValue, CompilerError> {
    let mut interpreter = HostInterpreter::new(definition, context);
    for (parameter, value) in definition.parameters.iter().zip(bound) {
        interpreter.locals.insert(parameter.name.to_owned(), value);
    }

    let flow = interpreter
        .walk_loop(target, indices.map(HostValue::Int), body)
        .map_err(|error| interpreter.tag_error(error))?;

    match flow {
        Flow::Return(value) => Ok(value),
        _ => Ok(HostValue::None),
    }
}

/// Evaluates one expression with the given names in scope
pub fn evaluate_with_locals(
    definition: &RawFunctionDefinition,
    expression: &Expression,
    locals: impl IntoIterator<Item = (String, HostValue)>,
    context: ExecutionContext,
) -> Result<HostValue, CompilerError> {
    let mut interpreter = HostInterpreter::new(definition, context);
    interpreter.locals.extend(locals);
    interpreter.evaluate(expression)
}

struct HostInterpreter<'a> {
    definition: &'a RawFunctionDefinition,
    context: ExecutionContext<'a>,
    locals: Locals,
}

impl<'a> HostInterpreter<'a> {
    fn new(definition: &'a RawFunctionDefinition, context: ExecutionContext<'a>) -> Self {
        HostInterpreter {
            definition,
            context,
            locals: Locals::default(),
        }
    }

    fn run_body(&mut self) -> Result<HostValue, CompilerError> {
        let definition = self.definition;
        let flow = self
            .execute_block(&definition.body)
            .map_err(|error| self.tag_error(error))?;

        match flow {
            Flow::Return(value) => Ok(value),
            _ => Ok(HostValue::None),
        }
    }

    fn walk_loop(
        &mut self,
        target: &Expression,
        values: impl Iterator<Item = HostValue>,
        body: &[Statement],
    ) -> Result<Flow, CompilerError> {
        for value in values {
            self.context.check_cancelled()?;
            self.assign(target, value)?;

            match self.execute_block(body)? {
                Flow::Break => break,
                Flow::Return(value) => return Ok(Flow::Return(value)),
                Flow::Normal | Flow::Continue => {}
            }
        }

        Ok(Flow::Normal)
    }

    fn tag_error(&self, error: CompilerError) -> CompilerError {
        if error.function_name().is_some() {
            return error;
        }
        error.with_metadata(ErrorMetaDataKey::FunctionName, self.definition.name.as_str())
    }

    // ======================================================
    //                    STATEMENTS
    // ======================================================

    fn execute_block(&mut self, statements: &[Statement]) -> Result<Flow, CompilerError> {
        for statement in statements {
            let flow = self.execute(statement).map_err(|mut error| {
                if error.location == ErrorLocation::default() {
                    error.location = statement.location.to_error_location();
                }
                error
            })?;

            if !matches!(flow, Flow::Normal) {
                return Ok(flow);
            }
        }

        Ok(Flow::Normal)
    }

    fn execute(&mut self, statement: &Statement) -> Result<Flow, CompilerError> {
        match &statement.kind {
            StatementKind::Assign { targets, value } => {
                let value = self.evaluate(value)?;
                for target in targets {
                    self.assign(target, value.clone())?;
                }
            }

            StatementKind::AugAssign { target, op, value } => {
                let current = self.evaluate(target)?;
                let value = self.evaluate(value)?;
                let result = binary(*op, current, value)?;
                self.assign(target, result)?;
            }

            StatementKind::For { target, iter, body } => {
                let iterable = self.evaluate(iter)?;

                // Ranges are walked lazily, everything else is materialized first
                let values: Box<dyn Iterator<Item = HostValue>> = match iterable {
                    HostValue::Range(range) => Box::new(range.iter().map(HostValue::Int)),
                    other => Box::new(other.iterate()?.into_iter()),
                };

                return self.walk_loop(target, values, body);
            }

            StatementKind::While { condition, body } => loop {
                self.context.check_cancelled()?;
                if !self.evaluate(condition)?.is_truthy() {
                    break;
                }

                match self.execute_block(body)? {
                    Flow::Break => break,
                    Flow::Return(value) => return Ok(Flow::Return(value)),
                    Flow::Normal | Flow::Continue => {}
                }
            },

            StatementKind::If {
                condition,
                body,
                orelse,
            } => {
                let branch = if self.evaluate(condition)?.is_truthy() {
                    body
                } else {
                    orelse
                };
                return self.execute_block(branch);
            }

            StatementKind::Return(value) => {
                let value = match value {
                    Some(value) => self.evaluate(value)?,
                    None => HostValue::None,
                };
                return Ok(Flow::Return(value));
            }

            StatementKind::Expression(expression) => {
                self.evaluate(expression)?;
            }

            StatementKind::Pass => {}
            StatementKind::Break => return Ok(Flow::Break),
            StatementKind::Continue => return Ok(Flow::Continue),
        }

        Ok(Flow::Normal)
    }

    fn assign(&mut self, target: &Expression, value: HostValue) -> Result<(), CompilerError> {
        match &target.kind {
            ExpressionKind::Name(name) => {
                self.locals.insert(name.to_owned(), value);
            }

            ExpressionKind::Subscript {
                value: container,
                index,
            } => {
                let container = self.evaluate(container)?;
                let index = self.evaluate(index)?;

                match container {
                    HostValue::Array(array) => {
                        let position = array_index(&array, &index)?;
                        array.store(position, &value)?;
                    }
                    other => return_runtime_error!(
                        "'{}' object does not support item assignment",
                        other.type_name()
                    ),
                }
            }

            ExpressionKind::Tuple(targets) | ExpressionKind::List(targets) => {
                let values = value.iterate()?;
                if values.len() != targets.len() {
                    return_runtime_error!(
                        "cannot unpack {} values into {} targets",
                        values.len(),
                        targets.len()
                    );
                }

                for (target, value) in targets.iter().zip(values) {
                    self.assign(target, value)?;
                }
            }

            _ => return_runtime_error!("cannot assign to '{}'", target),
        }

        Ok(())
    }

    // ======================================================
    //                    EXPRESSIONS
    // ======================================================

    fn evaluate(&mut self, expression: &Expression) -> Result<HostValue, CompilerError> {
        match &expression.kind {
            ExpressionKind::Name(name) => match self.locals.get(name) {
                Some(value) => Ok(value.clone()),
                None => return_runtime_error!("name '{}' is not defined", name),
            },

            ExpressionKind::Constant(literal) => Ok(HostValue::from_literal(literal)),

            ExpressionKind::Attribute { .. } => {
                return_runtime_error!("attribute access '{}' is only supported in calls", expression)
            }

            ExpressionKind::BinaryOp { left, op, right } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                binary(*op, left, right)
            }

            ExpressionKind::UnaryOp { op, operand } => {
                let operand = self.evaluate(operand)?;
                unary(*op, operand)
            }

            ExpressionKind::Compare { left, comparisons } => {
                let mut left = self.evaluate(left)?;
                for (op, right) in comparisons {
                    let right = self.evaluate(right)?;
                    if !compare(*op, &left, &right)? {
                        return Ok(HostValue::Bool(false));
                    }
                    left = right;
                }
                Ok(HostValue::Bool(true))
            }

            // Returns the deciding operand, not a bool
            ExpressionKind::BoolOp { op, values } => {
                let mut last = HostValue::None;
                for value in values {
                    last = self.evaluate(value)?;
                    let decided = match op {
                        BoolOperator::And => !last.is_truthy(),
                        BoolOperator::Or => last.is_truthy(),
                    };
                    if decided {
                        break;
                    }
                }
                Ok(last)
            }

            ExpressionKind::Call {
                function: _,
                args,
                keywords,
            } => {
                let Some(name) = expression.called_name() else {
                    return_runtime_error!("'{}' is not callable", expression);
                };

                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.evaluate(arg)?);
                }

                let mut keyword_values = Vec::with_capacity(keywords.len());
                for keyword in keywords {
                    keyword_values.push((keyword.name.to_owned(), self.evaluate(&keyword.value)?));
                }

                self.context.call(name, values, keyword_values)
            }

            ExpressionKind::Subscript { value, index } => {
                let container = self.evaluate(value)?;
                let index = self.evaluate(index)?;
                subscript(&container, &index)
            }

            ExpressionKind::Tuple(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.evaluate(item)?);
                }
                Ok(HostValue::Tuple(values))
            }

            ExpressionKind::List(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.evaluate(item)?);
                }
                Ok(HostValue::Array(SharedArray::from_values(&values)?))
            }
        }
    }
}

fn array_index(array: &SharedArray, index: &HostValue) -> Result<usize, CompilerError> {
    match index.as_index() {
        Some(index) => array.resolve_index(index),
        None => return_runtime_error!(
            "array indices must be integers, not '{}'",
            index.type_name()
        ),
    }
}

fn sequence_index(length: usize, index: &HostValue) -> Result<usize, CompilerError> {
    let Some(index) = index.as_index() else {
        return_runtime_error!("indices must be integers, not '{}'", index.type_name());
    };

    let length = length as i64;
    let resolved = if index < 0 { index + length } else { index };
    if resolved < 0 || resolved >= length {
        return_runtime_error!("index {} out of range", index);
    }

    Ok(resolved as usize)
}

fn subscript(container: &HostValue, index: &HostValue) -> Result<HostValue, CompilerError> {
    match container {
        HostValue::Array(array) => Ok(array.load(array_index(array, index)?)),
        HostValue::Tuple(values) => Ok(values[sequence_index(values.len(), index)?].clone()),
        HostValue::Str(text) => {
            let chars: Vec<char> = text.chars().collect();
            let position = sequence_index(chars.len(), index)?;
            Ok(HostValue::Str(chars[position].to_string()))
        }
        other => return_runtime_error!("'{}' object is not subscriptable", other.type_name()),
    }
}

// ======================================================
//                    OPERATORS
// ======================================================

fn unsupported(op: BinaryOperator, left: &HostValue, right: &HostValue) -> CompilerError {
    CompilerError::without_location(
        format!(
            "unsupported operand type(s) for {}: '{}' and '{}'",
            binary_symbol(op),
            left.type_name(),
            right.type_name()
        ),
        ErrorType::Runtime,
    )
}

fn overflow(op: BinaryOperator) -> CompilerError {
    CompilerError::without_location(
        format!("integer overflow in '{}'", binary_symbol(op)),
        ErrorType::Runtime,
    )
}

pub fn binary(
    op: BinaryOperator,
    left: HostValue,
    right: HostValue,
) -> Result<HostValue, CompilerError> {
    match (&left, &right) {
        (HostValue::Str(l), HostValue::Str(r)) if op == BinaryOperator::Add => {
            return Ok(HostValue::Str(format!("{l}{r}")));
        }
        (HostValue::Str(text), count) | (count, HostValue::Str(text))
            if op == BinaryOperator::Multiply && count.as_index().is_some() =>
        {
            let times = count.as_index().unwrap_or_default().max(0) as usize;
            return Ok(HostValue::Str(text.repeat(times)));
        }
        (HostValue::Tuple(l), HostValue::Tuple(r)) if op == BinaryOperator::Add => {
            return Ok(HostValue::Tuple(l.iter().chain(r).cloned().collect()));
        }
        _ => {}
    }

    if let (Some(l), Some(r)) = (left.as_index(), right.as_index()) {
        return integer_binary(op, l, r);
    }

    match (left.as_float(), right.as_float()) {
        (Some(l), Some(r)) => float_binary(op, l, r),
        _ => Err(unsupported(op, &left, &right)),
    }
}

fn integer_binary(op: BinaryOperator, l: i64, r: i64) -> Result<HostValue, CompilerError> {
    let result = match op {
        BinaryOperator::Add => l.checked_add(r),
        BinaryOperator::Subtract => l.checked_sub(r),
        BinaryOperator::Multiply => l.checked_mul(r),

        BinaryOperator::Divide => return float_binary(op, l as f64, r as f64),

        BinaryOperator::FloorDivide => {
            if r == 0 {
                return_runtime_error!("integer division by zero");
            }
            l.checked_div(r).map(|quotient| {
                if l % r != 0 && ((l < 0) != (r < 0)) {
                    quotient - 1
                } else {
                    quotient
                }
            })
        }

        BinaryOperator::Modulus => {
            if r == 0 {
                return_runtime_error!("integer modulo by zero");
            }
            l.checked_rem(r).map(|remainder| {
                if remainder != 0 && ((remainder < 0) != (r < 0)) {
                    remainder + r
                } else {
                    remainder
                }
            })
        }

        BinaryOperator::Exponent => {
            if r < 0 {
                return float_binary(op, l as f64, r as f64);
            }
            match u32::try_from(r) {
                Ok(exponent) => l.checked_pow(exponent),
                Err(_) => None,
            }
        }
    };

    match result {
        Some(value) => Ok(HostValue::Int(value)),
        None => Err(overflow(op)),
    }
}

fn float_binary(op: BinaryOperator, l: f64, r: f64) -> Result<HostValue, CompilerError> {
    let value = match op {
        BinaryOperator::Add => l + r,
        BinaryOperator::Subtract => l - r,
        BinaryOperator::Multiply => l * r,
        BinaryOperator::Divide => {
            if r == 0.0 {
                return_runtime_error!("division by zero");
            }
            l / r
        }
        BinaryOperator::FloorDivide => {
            if r == 0.0 {
                return_runtime_error!("float floor division by zero");
            }
            (l / r).floor()
        }
        BinaryOperator::Modulus => {
            if r == 0.0 {
                return_runtime_error!("float modulo by zero");
            }
            l - r * (l / r).floor()
        }
        BinaryOperator::Exponent => l.powf(r),
    };

    Ok(HostValue::Float(value))
}

fn unary(op: UnaryOperator, operand: HostValue) -> Result<HostValue, CompilerError> {
    match (op, &operand) {
        (UnaryOperator::Not, value) => Ok(HostValue::Bool(!value.is_truthy())),

        (UnaryOperator::Negate, HostValue::Float(v)) => Ok(HostValue::Float(-v)),
        (UnaryOperator::Negate, value) => match value.as_index().map(i64::checked_neg) {
            Some(Some(negated)) => Ok(HostValue::Int(negated)),
            Some(None) => return_runtime_error!("integer overflow in unary '-'"),
            None => return_runtime_error!("bad operand type for unary -: '{}'", value.type_name()),
        },

        (UnaryOperator::Plus, HostValue::Float(v)) => Ok(HostValue::Float(*v)),
        (UnaryOperator::Plus, value) => match value.as_index() {
            Some(v) => Ok(HostValue::Int(v)),
            None => return_runtime_error!("bad operand type for unary +: '{}'", value.type_name()),
        },
    }
}

fn compare(op: CompareOperator, left: &HostValue, right: &HostValue) -> Result<bool, CompilerError> {
    match op {
        CompareOperator::Equal => return Ok(left == right),
        CompareOperator::NotEqual => return Ok(left != right),
        _ => {}
    }

    let ordering = match (left, right) {
        (HostValue::Str(l), HostValue::Str(r)) => Some(l.cmp(r)),
        (l, r) => match (l.as_index(), r.as_index()) {
            (Some(l), Some(r)) => Some(l.cmp(&r)),
            _ => match (l.as_float(), r.as_float()) {
                (Some(l), Some(r)) => l.partial_cmp(&r),
                _ => return_runtime_error!(
                    "'<' not supported between instances of '{}' and '{}'",
                    left.type_name(),
                    right.type_name()
                ),
            },
        },
    };

    // NaN compares false with everything
    let Some(ordering) = ordering else {
        return Ok(false);
    };

    Ok(match op {
        CompareOperator::LessThan => ordering == Ordering::Less,
        CompareOperator::LessThanOrEqual => ordering != Ordering::Greater,
        CompareOperator::GreaterThan => ordering == Ordering::Greater,
        CompareOperator::GreaterThanOrEqual => ordering != Ordering::Less,
        CompareOperator::Equal | CompareOperator::NotEqual => false,
    })
}

#[cfg(test)]
#[path = "tests/host_interpreter_tests.rs"]
mod tests;

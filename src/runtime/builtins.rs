use crate::compiler_frontend::compiler_errors::CompilerError;
use crate::compiler_frontend::lowering::range_normalization::normalize_range;
use crate::runtime::host_value::{ElementType, HostValue, SharedArray};
use crate::return_runtime_error;
use saying::say;

pub type BuiltinFunction = fn(&[HostValue]) -> Result<HostValue, CompilerError>;

// ======================================================
//                   BUILTIN REGISTRY
// ======================================================
// Names the interpreter resolves when the registry has no function of that name.
// Registered functions shadow these.
const BUILTINS: &[(&str, BuiltinFunction)] = &[
    ("len", builtin_len),
    ("int", builtin_int),
    ("float", builtin_float),
    ("abs", builtin_abs),
    ("min", builtin_min),
    ("max", builtin_max),
    ("print", builtin_print),
    ("range", builtin_range),
    ("zeros", builtin_zeros),
    ("zeros_float", builtin_zeros_float),
];

pub fn lookup_builtin(name: &str) -> Option<BuiltinFunction> {
    BUILTINS
        .iter()
        .find(|(builtin, _)| *builtin == name)
        .map(|(_, function)| *function)
}

pub fn is_builtin(name: &str) -> bool {
    lookup_builtin(name).is_some()
}

fn expect_arity(name: &str, args: &[HostValue], arity: usize) -> Result<(), CompilerError> {
    if args.len() != arity {
        return_runtime_error!(
            "{}() takes {} argument(s) but {} were given",
            name,
            arity,
            args.len()
        );
    }
    Ok(())
}

fn builtin_len(args: &[HostValue]) -> Result<HostValue, CompilerError> {
    expect_arity("len", args, 1)?;

    let length = match &args[0] {
        HostValue::Str(text) => text.chars().count(),
        HostValue::Tuple(values) => values.len(),
        HostValue::Array(array) => array.len(),
        HostValue::Range(range) => range.len() as usize,
        other => return_runtime_error!("object of type '{}' has no len()", other.type_name()),
    };

    Ok(HostValue::Int(length as i64))
}

fn builtin_int(args: &[HostValue]) -> Result<HostValue, CompilerError> {
    expect_arity("int", args, 1)?;

    match &args[0] {
        HostValue::Bool(v) => Ok(HostValue::Int(*v as i64)),
        HostValue::Int(v) => Ok(HostValue::Int(*v)),
        HostValue::Float(v) if v.is_finite() => Ok(HostValue::Int(v.trunc() as i64)),
        HostValue::Float(v) => return_runtime_error!("cannot convert float {} to integer", v),
        HostValue::Str(text) => match text.trim().parse::<i64>() {
            Ok(v) => Ok(HostValue::Int(v)),
            Err(_) => return_runtime_error!("invalid literal for int(): '{}'", text),
        },
        other => return_runtime_error!("int() can't convert '{}'", other.type_name()),
    }
}

fn builtin_float(args: &[HostValue]) -> Result<HostValue, CompilerError> {
    expect_arity("float", args, 1)?;

    if let HostValue::Str(text) = &args[0] {
        return match text.trim().parse::<f64>() {
            Ok(v) => Ok(HostValue::Float(v)),
            Err(_) => return_runtime_error!("could not convert string to float: '{}'", text),
        };
    }

    match args[0].as_float() {
        Some(v) => Ok(HostValue::Float(v)),
        None => return_runtime_error!("float() can't convert '{}'", args[0].type_name()),
    }
}

fn builtin_abs(args: &[HostValue]) -> Result<HostValue, CompilerError> {
    expect_arity("abs", args, 1)?;

    match &args[0] {
        HostValue::Bool(v) => Ok(HostValue::Int(*v as i64)),
        HostValue::Int(v) => match v.checked_abs() {
            Some(v) => Ok(HostValue::Int(v)),
            None => return_runtime_error!("integer overflow in abs()"),
        },
        HostValue::Float(v) => Ok(HostValue::Float(v.abs())),
        other => return_runtime_error!("bad operand type for abs(): '{}'", other.type_name()),
    }
}

/// Single iterable argument or two or more values, like the host language
fn extremum(
    name: &str,
    args: &[HostValue],
    pick_right: fn(f64, f64) -> bool,
) -> Result<HostValue, CompilerError> {
    let candidates = match args {
        [] => return_runtime_error!("{}() expected at least 1 argument, got 0", name),
        [single] => single.iterate()?,
        many => many.to_vec(),
    };

    let mut best: Option<(f64, HostValue)> = None;
    for candidate in candidates {
        let Some(value) = candidate.as_float() else {
            return_runtime_error!(
                "{}() only compares numbers, found '{}'",
                name,
                candidate.type_name()
            );
        };

        let replace = match &best {
            Some((current, _)) => pick_right(*current, value),
            None => true,
        };
        if replace {
            best = Some((value, candidate));
        }
    }

    match best {
        Some((_, value)) => Ok(value),
        None => return_runtime_error!("{}() arg is an empty sequence", name),
    }
}

fn builtin_min(args: &[HostValue]) -> Result<HostValue, CompilerError> {
    extremum("min", args, |current, value| value < current)
}

fn builtin_max(args: &[HostValue]) -> Result<HostValue, CompilerError> {
    extremum("max", args, |current, value| value > current)
}

fn builtin_print(args: &[HostValue]) -> Result<HostValue, CompilerError> {
    let line: Vec<String> = args.iter().map(HostValue::to_string).collect();
    let line = line.join(" ");
    say!(line);
    Ok(HostValue::None)
}

fn builtin_range(args: &[HostValue]) -> Result<HostValue, CompilerError> {
    let mut bounds = Vec::with_capacity(args.len());
    for arg in args {
        match arg.as_index() {
            Some(bound) => bounds.push(bound),
            None => return_runtime_error!(
                "'{}' object cannot be interpreted as an integer",
                arg.type_name()
            ),
        }
    }

    let Some(range) = normalize_range(bounds, 0, 1) else {
        return_runtime_error!("range expected 1 to 3 arguments, got {}", args.len());
    };

    if range.step == 0 {
        return_runtime_error!("range() arg 3 must not be zero");
    }

    Ok(HostValue::Range(range))
}

fn array_length(name: &str, args: &[HostValue]) -> Result<usize, CompilerError> {
    expect_arity(name, args, 1)?;

    match args[0].as_index() {
        Some(length) if length >= 0 => Ok(length as usize),
        _ => return_runtime_error!("{}() expects a non-negative integer length", name),
    }
}

fn builtin_zeros(args: &[HostValue]) -> Result<HostValue, CompilerError> {
    let length = array_length("zeros", args)?;
    Ok(HostValue::Array(SharedArray::zeros(ElementType::Int, length)))
}

fn builtin_zeros_float(args: &[HostValue]) -> Result<HostValue, CompilerError> {
    let length = array_length("zeros_float", args)?;
    Ok(HostValue::Array(SharedArray::zeros(ElementType::Float, length)))
}

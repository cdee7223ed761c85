use crate::compiler_frontend::compiler_errors::ErrorLocation;
use crate::compiler_frontend::tokenizer::tokens::{CharPosition, TextLocation};
use saying::say;

#[derive(Clone, Debug)]
pub struct CompilerWarning {
    pub msg: String,
    pub location: ErrorLocation,
    pub warning_kind: WarningKind,
}

impl CompilerWarning {
    pub fn new(msg: impl Into<String>, location: &TextLocation, warning_kind: WarningKind) -> Self {
        CompilerWarning {
            msg: msg.into(),
            location: ErrorLocation::from_text_location(location),
            warning_kind,
        }
    }

    pub fn without_location(msg: impl Into<String>, warning_kind: WarningKind) -> Self {
        CompilerWarning {
            msg: msg.into(),
            location: ErrorLocation::default(),
            warning_kind,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WarningKind {
    // Lowering
    MultiTargetAssign,
    UnsupportedAssignTarget,
    UnsupportedExpression,
    UnsupportedStatement,
    UnsupportedReturn,
    NonConstantRange,
    UnreachableCode,
    DroppedParameter,

    // Codegen
    NarrowedConstant,

    // Kernels
    IllegalKernelStatement,
    EmptyKernel,

    // Module level
    UnknownDecorator,
    LoweringFallback,
}

fn warning_kind_to_str(kind: WarningKind) -> &'static str {
    match kind {
        WarningKind::MultiTargetAssign => "Ignored assignment with multiple targets",
        WarningKind::UnsupportedAssignTarget => "Ignored assignment to a non-name target",
        WarningKind::UnsupportedExpression => "Ignored assignment with an unsupported value",
        WarningKind::UnsupportedStatement => "Ignored unsupported statement",
        WarningKind::UnsupportedReturn => "Ignored unsupported return",
        WarningKind::NonConstantRange => "Ignored loop with non-constant range",
        WarningKind::UnreachableCode => "Ignored unreachable code",
        WarningKind::DroppedParameter => "Dropped parameter",
        WarningKind::NarrowedConstant => "Narrowed constant",
        WarningKind::IllegalKernelStatement => "Ignored illegal kernel statement",
        WarningKind::EmptyKernel => "Empty kernel",
        WarningKind::UnknownDecorator => "Unknown decorator",
        WarningKind::LoweringFallback => "Falling back to host execution",
    }
}

pub fn print_formatted_warning(w: CompilerWarning) {
    let kind = warning_kind_to_str(w.warning_kind);
    let line_number = w.location.start_pos.line_number + 1;

    say!(Yellow "WARNING: ", Dark Yellow kind);
    if w.location.start_pos != CharPosition::default() {
        say!(Dark Magenta "Line ", Bright {line_number});
    }
    say!(w.msg);
}

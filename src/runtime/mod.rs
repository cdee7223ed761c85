pub mod builtins;
pub mod execution_context;
pub mod host_interpreter;
pub mod host_value;

pub mod kernel;

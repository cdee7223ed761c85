pub mod codegen_backend;
pub mod emitter;
pub mod foreign_call;
pub mod function_registry;
pub mod reference;

//! Whitelist lowering from raw function definitions to the backend IR.

pub mod lower_function;
pub mod lowered_ir;
pub mod range_normalization;

#[cfg(test)]
#[path = "tests/lowering_tests.rs"]
mod tests;

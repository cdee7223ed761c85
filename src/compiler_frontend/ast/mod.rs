pub mod ast_display;
pub mod ast_nodes;
pub mod parse_module;
pub mod expressions {
    pub mod parse_expression;
}
pub mod statements {
    pub mod parse_statement;
}

#[cfg(test)]
#[path = "tests/parser_tests.rs"]
mod tests;

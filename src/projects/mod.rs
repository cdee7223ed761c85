/// # Everything outside the compiler pipeline itself
/// The CLI, the `spindle.toml` settings and the `ir` report.

// The command line for running and inspecting source files
pub mod cli;
pub mod ir_report;
pub mod settings;

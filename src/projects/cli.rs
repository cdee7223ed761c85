//! Command-line entrypoints for spindle.
//!
//! `run` loads a source file into a JIT session and calls one of its functions,
//! `ir` shows what each definition lowers to without running anything.

use crate::backends::reference::ReferenceBackend;
use crate::compiler_frontend::JitSession;
use crate::compiler_frontend::ast::parse_module::parse_module;
use crate::compiler_frontend::compiler_errors::{CompilerError, CompilerMessages};
use crate::compiler_frontend::compiler_messages::log_level::LogLevel;
use crate::compiler_frontend::compiler_warnings::CompilerWarning;
use crate::compiler_frontend::display_messages::print_compiler_messages;
use crate::compiler_frontend::value_encoding::ConstantWidth;
use crate::projects::ir_report::{build_ir_report, print_ir_report};
use crate::projects::settings::{Config, DEFAULT_ENTRY_FUNCTION};
use crate::runtime::host_value::HostValue;
use saying::say;
use std::env;
use std::fs;
use std::path::Path;
use std::process::ExitCode;
use std::time::Instant;

#[derive(Debug, PartialEq, Eq)]
enum Command {
    // Loads a file and calls one function with numeric arguments
    Run {
        path: String,
        function: String,
        args: Vec<String>,
    },

    // Prints lowered IR and kernel workers
    Ir {
        path: String,
        json: bool,
    },

    Help,
}

/// Settings given on the command line. Value flags override `spindle.toml`.
#[derive(Debug, Clone, PartialEq)]
pub enum Flag {
    Config(String),
    Threads(usize),
    LogLevel(LogLevel),
    NarrowConstants,
    Json,
    DisableWarnings,
    DisableTimers,
}

pub fn start_cli() -> ExitCode {
    let compiler_args: Vec<String> = env::args().collect();

    if compiler_args.len() < 2 {
        print_help(false);
        return ExitCode::SUCCESS;
    }

    let (positional, flags) = match split_flags(&compiler_args[1..]) {
        Ok(split) => split,
        Err(e) => {
            say!(Red e);
            print_help(true);
            return ExitCode::FAILURE;
        }
    };

    let command = match get_command(&positional, &flags) {
        Ok(command) => command,
        Err(e) => {
            say!(Red e);
            print_help(true);
            return ExitCode::FAILURE;
        }
    };

    match command {
        Command::Help => {
            print_help(false);
            ExitCode::SUCCESS
        }

        Command::Run {
            path,
            function,
            args,
        } => {
            let args = match parse_arguments(&args) {
                Ok(args) => args,
                Err(e) => {
                    say!(Red e);
                    return ExitCode::FAILURE;
                }
            };

            let start = Instant::now();
            match run_file(Path::new(&path), &function, args, &flags) {
                Ok((value, warnings)) => {
                    let duration = start.elapsed();

                    if value != HostValue::None {
                        let text = value.to_string();
                        say!(text);
                    }

                    if !flags.contains(&Flag::DisableTimers) {
                        say!(Bright Black "\nRan ", Reset function, Bright Black " in: ", Green Bold #duration);
                    }

                    print_messages(CompilerMessages::from_warnings(warnings), &flags);
                    ExitCode::SUCCESS
                }

                Err(messages) => {
                    print_messages(messages, &flags);
                    ExitCode::FAILURE
                }
            }
        }

        Command::Ir { path, json } => match ir_for_file(Path::new(&path), json) {
            Ok(warnings) => {
                print_messages(CompilerMessages::from_warnings(warnings), &flags);
                ExitCode::SUCCESS
            }
            Err(messages) => {
                print_messages(messages, &flags);
                ExitCode::FAILURE
            }
        },
    }
}

fn get_command(args: &[String], flags: &[Flag]) -> Result<Command, String> {
    let command = args.first().map(String::as_str);

    match command {
        Some("help") | None => Ok(Command::Help),

        Some("run") => match args.get(1) {
            Some(path) => Ok(Command::Run {
                path: path.to_owned(),
                function: args
                    .get(2)
                    .map(String::to_owned)
                    .unwrap_or_else(|| String::from(DEFAULT_ENTRY_FUNCTION)),
                args: args.iter().skip(3).cloned().collect(),
            }),
            None => Err(String::from("Missing source file path for 'run'")),
        },

        Some("ir") => match (args.get(1), args.get(2)) {
            (Some(path), None) => Ok(Command::Ir {
                path: path.to_owned(),
                json: flags.contains(&Flag::Json),
            }),
            (None, _) => Err(String::from("Missing source file path for 'ir'")),
            (Some(_), Some(extra)) => Err(format!("Unexpected argument for 'ir': '{extra}'")),
        },

        Some(other) => Err(format!("Invalid command: '{other}'")),
    }
}

/// Separates `--flags` (and their values) from positional arguments.
/// Only `--` starts a flag, so negative numbers stay positional.
fn split_flags(args: &[String]) -> Result<(Vec<String>, Vec<Flag>), String> {
    let mut positional = Vec::new();
    let mut flags = Vec::new();
    let mut index = 0usize;

    while let Some(arg) = args.get(index) {
        match arg.as_str() {
            "--config" | "--threads" | "--log-level" => {
                let Some(value) = args.get(index + 1).filter(|v| !v.starts_with("--")) else {
                    return Err(format!("Missing value for {arg}"));
                };

                let flag = match arg.as_str() {
                    "--config" => Flag::Config(value.to_owned()),
                    "--threads" => match value.parse::<usize>() {
                        Ok(threads) if threads > 0 => Flag::Threads(threads),
                        _ => {
                            return Err(format!(
                                "Invalid --threads value: '{value}'. It must be a positive integer."
                            ));
                        }
                    },
                    _ => match LogLevel::from_name(value) {
                        Some(level) => Flag::LogLevel(level),
                        None => {
                            return Err(format!(
                                "Invalid --log-level value: '{value}'. Use debug, message, warning or error."
                            ));
                        }
                    },
                };

                flags.push(flag);
                index += 2;
            }
            "--narrow-constants" => {
                flags.push(Flag::NarrowConstants);
                index += 1;
            }
            "--json" => {
                flags.push(Flag::Json);
                index += 1;
            }
            "--hide-warnings" => {
                flags.push(Flag::DisableWarnings);
                index += 1;
            }
            "--hide-timers" => {
                flags.push(Flag::DisableTimers);
                index += 1;
            }
            _ if arg.starts_with("--") => {
                return Err(format!("Unknown flag: '{arg}'"));
            }
            _ => {
                positional.push(arg.to_owned());
                index += 1;
            }
        }
    }

    Ok((positional, flags))
}

/// Command line arguments for `run` are numbers: integers first, then floats
fn parse_arguments(args: &[String]) -> Result<Vec<HostValue>, String> {
    args.iter()
        .map(|arg| {
            if let Ok(value) = arg.parse::<i64>() {
                return Ok(HostValue::Int(value));
            }
            match arg.parse::<f64>() {
                Ok(value) => Ok(HostValue::Float(value)),
                Err(_) => Err(format!("Argument '{arg}' is not a number")),
            }
        })
        .collect()
}

/// `spindle.toml` beside the source file (or the explicit `--config`), then flag overrides
fn session_config(path: &Path, flags: &[Flag]) -> Result<Config, CompilerError> {
    let explicit = flags.iter().find_map(|flag| match flag {
        Flag::Config(config) => Some(Path::new(config)),
        _ => None,
    });

    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut config = Config::load(explicit, directory)?;

    for flag in flags {
        match flag {
            Flag::Threads(threads) => config.runtime.thread_count = *threads,
            Flag::LogLevel(level) => config.runtime.log_level = *level,
            Flag::NarrowConstants => config.codegen.constant_width = ConstantWidth::Narrow,
            _ => {}
        }
    }

    config.validate()?;
    Ok(config)
}

fn run_file(
    path: &Path,
    function: &str,
    args: Vec<HostValue>,
    flags: &[Flag],
) -> Result<(HostValue, Vec<CompilerWarning>), CompilerMessages> {
    let config = session_config(path, flags).map_err(CompilerMessages::from)?;
    let mut session =
        JitSession::new(config, ReferenceBackend::new()).map_err(CompilerMessages::from)?;

    if let Err(error) = session.load_file(path) {
        return Err(CompilerMessages::from_error(error, session.take_warnings()));
    }

    match session.call(function, args, Vec::new()) {
        Ok(value) => Ok((value, session.take_warnings())),
        Err(error) => Err(CompilerMessages::from_error(
            error.with_file_path(path.to_path_buf()),
            session.take_warnings(),
        )),
    }
}

fn ir_for_file(path: &Path, json: bool) -> Result<Vec<CompilerWarning>, CompilerMessages> {
    let source_code = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(error) => {
            return Err(CompilerMessages::from(CompilerError::file_error(
                path,
                format!("Could not read '{}': {error}", path.display()),
            )));
        }
    };

    let mut warnings = Vec::new();
    let reports = parse_module(&source_code, &mut warnings)
        .and_then(|module| build_ir_report(&module, &mut warnings))
        .map_err(|error| {
            CompilerMessages::from_error(error.with_file_path(path.to_path_buf()), Vec::new())
        })?;

    if json {
        match serde_json::to_string_pretty(&reports) {
            Ok(text) => say!(text),
            Err(error) => {
                return Err(CompilerMessages::from(CompilerError::compiler_error(
                    format!("Could not serialize the IR report: {error}"),
                )));
            }
        }
    } else {
        print_ir_report(&reports);
    }

    Ok(warnings)
}

fn print_messages(mut messages: CompilerMessages, flags: &[Flag]) {
    if flags.contains(&Flag::DisableWarnings) {
        messages.warnings.clear();
    }
    print_compiler_messages(messages);
}

fn print_help(commands_only: bool) {
    if !commands_only {
        say!(Bright Black "------------------------------------");
        say!(Green Bold "spindle: compiled numeric functions and parallel kernels");
        say!("Usage: ", Bold "<command>", Italic " <args>");
    }
    say!(Green Bold "\nCommands:");
    say!("  run <path> [function] [args...]  - Loads a file and calls a function (default 'main')");
    say!("  ir <path> [--json]               - Shows the lowered IR of each @func and kernel");
    say!("  help                             - Shows this message");

    say!(Green Bold "\nFlags:");
    say!("  --config <path>      (default: spindle.toml beside the source file)");
    say!("  --threads <n>        (default: 8)");
    say!("  --log-level <level>  (debug, message, warning, error)");
    say!("  --narrow-constants");
    say!("  --hide-warnings");
    say!("  --hide-timers");
}

#[cfg(test)]
#[path = "tests/cli_tests.rs"]
mod tests;

//! Tests for CLI command parsing and the run command.

use super::{Command, Flag, get_command, parse_arguments, run_file, session_config, split_flags};
use crate::compiler_frontend::compiler_errors::ErrorType;
use crate::compiler_frontend::compiler_messages::log_level::LogLevel;
use crate::compiler_frontend::compiler_warnings::WarningKind;
use crate::compiler_frontend::value_encoding::ConstantWidth;
use crate::projects::settings::CONFIG_FILE_NAME;
use crate::runtime::host_value::HostValue;
use std::fs;
use std::path::PathBuf;
use tempfile::{TempDir, tempdir};

fn args(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn parse(values: &[&str]) -> Result<Command, String> {
    let (positional, flags) = split_flags(&args(values))?;
    get_command(&positional, &flags)
}

fn write_source(source: &str) -> (TempDir, PathBuf) {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("main.spd");
    fs::write(&path, source).expect("write source");
    (dir, path)
}

const PROGRAM: &str = "\
@func
def add(x: Int32, y: Int32) -> Int32:
    res = x + y
    return res

@kernel
def fill(data, value):
    for i in range(len(data)):
        data[i] = value

def main(a, b):
    data = zeros(4)
    fill(data, add(a, b))
    return data[3] * 2
";

#[test]
fn run_defaults_to_main() {
    assert_eq!(
        parse(&["run", "main.spd"]),
        Ok(Command::Run {
            path: String::from("main.spd"),
            function: String::from("main"),
            args: Vec::new(),
        })
    );
}

#[test]
fn run_takes_a_function_and_arguments() {
    assert_eq!(
        parse(&["run", "main.spd", "add", "1", "-2.5", "--threads", "4"]),
        Ok(Command::Run {
            path: String::from("main.spd"),
            function: String::from("add"),
            args: args(&["1", "-2.5"]),
        })
    );
}

#[test]
fn ir_reads_the_json_flag() {
    assert_eq!(
        parse(&["ir", "main.spd", "--json"]),
        Ok(Command::Ir {
            path: String::from("main.spd"),
            json: true,
        })
    );
    assert_eq!(
        parse(&["ir", "main.spd"]),
        Ok(Command::Ir {
            path: String::from("main.spd"),
            json: false,
        })
    );
    assert!(parse(&["ir"]).is_err());
    assert!(parse(&["ir", "a.spd", "b.spd"]).is_err());
}

#[test]
fn help_and_unknown_commands() {
    assert_eq!(parse(&["help"]), Ok(Command::Help));
    assert!(parse(&["build", "main.spd"]).is_err());
    assert!(parse(&["run"]).is_err());
}

#[test]
fn value_flags_are_parsed() {
    let (positional, flags) = split_flags(&args(&[
        "run",
        "--config",
        "other.toml",
        "main.spd",
        "--log-level",
        "debug",
        "--narrow-constants",
        "--hide-warnings",
        "--hide-timers",
    ]))
    .expect("flags should parse");

    assert_eq!(positional, args(&["run", "main.spd"]));
    assert_eq!(
        flags,
        vec![
            Flag::Config(String::from("other.toml")),
            Flag::LogLevel(LogLevel::Debug),
            Flag::NarrowConstants,
            Flag::DisableWarnings,
            Flag::DisableTimers,
        ]
    );
}

#[test]
fn bad_flags_are_rejected() {
    assert!(split_flags(&args(&["run", "--threads", "0"])).is_err());
    assert!(split_flags(&args(&["run", "--threads", "many"])).is_err());
    assert!(split_flags(&args(&["run", "--threads"])).is_err());
    assert!(split_flags(&args(&["run", "--log-level", "--json"])).is_err());
    assert!(split_flags(&args(&["run", "--log-level", "loud"])).is_err());
    assert!(split_flags(&args(&["run", "--release"])).is_err());
}

#[test]
fn arguments_are_numbers() {
    assert_eq!(
        parse_arguments(&args(&["3", "-7", "2.5", "1e3"])),
        Ok(vec![
            HostValue::Int(3),
            HostValue::Int(-7),
            HostValue::Float(2.5),
            HostValue::Float(1000.0),
        ])
    );
    assert!(parse_arguments(&args(&["three"])).is_err());
}

#[test]
fn flags_override_the_config_file() {
    let (dir, path) = write_source(PROGRAM);
    fs::write(
        dir.path().join(CONFIG_FILE_NAME),
        "[runtime]\nthread_count = 3\nlog_level = \"warning\"\n",
    )
    .expect("write config");

    let config = session_config(&path, &[]).expect("config loads");
    assert_eq!(config.runtime.thread_count, 3);
    assert_eq!(config.runtime.log_level, LogLevel::Warning);

    let config = session_config(&path, &[Flag::Threads(5), Flag::NarrowConstants])
        .expect("config loads");
    assert_eq!(config.runtime.thread_count, 5);
    assert_eq!(config.codegen.constant_width, ConstantWidth::Narrow);
}

#[test]
fn run_file_calls_through_the_session() {
    let (_dir, path) = write_source(PROGRAM);

    let (value, warnings) = run_file(
        &path,
        "main",
        vec![HostValue::Int(2), HostValue::Int(3)],
        &[Flag::Threads(2)],
    )
    .expect("program runs");

    assert_eq!(value, HostValue::Int(10));
    assert!(
        warnings
            .iter()
            .all(|w| w.warning_kind != WarningKind::LoweringFallback)
    );
}

#[test]
fn run_file_reports_runtime_errors_with_the_file() {
    let (_dir, path) = write_source("def main():\n    return 1 // 0\n");

    let messages = run_file(&path, "main", Vec::new(), &[]).expect_err("division by zero");

    assert_eq!(messages.errors.len(), 1);
    assert_eq!(messages.errors[0].error_type, ErrorType::Runtime);
    assert_eq!(messages.errors[0].location.scope, path);
}

#[test]
fn run_file_reports_missing_files() {
    let dir = tempdir().expect("temp dir");
    let missing = dir.path().join("missing.spd");

    let messages = run_file(&missing, "main", Vec::new(), &[]).expect_err("file is missing");
    assert_eq!(messages.errors[0].error_type, ErrorType::File);
}

#[test]
fn explicit_config_flag_must_exist() {
    let (dir, path) = write_source(PROGRAM);
    let missing = dir.path().join("nope.toml");

    let messages = run_file(
        &path,
        "main",
        Vec::new(),
        &[Flag::Config(missing.to_string_lossy().to_string())],
    )
    .expect_err("config is missing");
    assert_eq!(messages.errors[0].error_type, ErrorType::File);
}

use std::process::ExitCode;

fn main() -> ExitCode {
    spindle::projects::cli::start_cli()
}

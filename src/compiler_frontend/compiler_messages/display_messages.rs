use crate::compiler_frontend::compiler_errors::{
    CompilerError, CompilerMessages, ErrorMetaDataKey, ErrorType,
};
use crate::compiler_frontend::compiler_warnings::print_formatted_warning;
use saying::say;
use std::path::{Path, PathBuf};
use std::{env, fs};

fn relative_display_path(scope: &Path) -> String {
    match env::current_dir() {
        Ok(dir) => scope
            .strip_prefix(&dir)
            .unwrap_or(scope)
            .to_string_lossy()
            .to_string(),
        Err(err) => {
            say!(Red "Could not read the current directory to shorten the error path. ", err);
            scope.to_string_lossy().to_string()
        }
    }
}

pub fn print_compiler_messages(messages: CompilerMessages) {
    for err in messages.errors {
        print_formatted_error(err);
    }

    for warning in messages.warnings {
        print_formatted_warning(warning);
    }
}

pub fn print_formatted_error(e: CompilerError) {
    let relative_dir = relative_display_path(&e.location.scope);
    let line_number = e.location.start_pos.line_number.max(0) as usize;
    let source_path: PathBuf = e.location.scope.to_owned();

    // Only files have lines to show
    let line = if source_path.as_os_str().is_empty() {
        String::new()
    } else {
        match fs::read_to_string(&source_path) {
            Ok(file) => file
                .lines()
                .nth(line_number)
                .unwrap_or_default()
                .to_string(),
            Err(_) => String::new(),
        }
    };

    match e.error_type {
        ErrorType::Syntax => {
            if !relative_dir.is_empty() {
                say!("\n(╯°□°)╯  🔥🔥 ", Dark Magenta relative_dir, " 🔥🔥  Σ(°△°;) ");
            }

            say!(Red "Syntax");
            say!(Dark Magenta "Line ", Bright {line_number + 1});
        }

        ErrorType::Rule => {
            if !relative_dir.is_empty() {
                say!("\nヽ(˶°o°)ﾉ  🔥🔥🔥 ", Dark Magenta relative_dir, " 🔥🔥🔥  ╰(°□°╰) ");
            }

            say!(Red "Rule");
        }

        ErrorType::Lowering => {
            if !relative_dir.is_empty() {
                say!("\n(ಠ_ಠ) ", Dark Magenta relative_dir);
            }

            say!(Yellow "Can't compile this function, it will run on the host instead");
            say!(Dark Magenta "Line ", Bright {line_number + 1});
        }

        ErrorType::Encoding => {
            say!(Red "Value Encoding");
        }

        ErrorType::Backend => {
            say!(Yellow "CODEGEN BACKEND - ");
            say!(Dark Yellow "the backend rejected a builder call");
        }

        ErrorType::Call => {
            say!(Red "Call");
        }

        ErrorType::Link => {
            say!(Red "Link");
        }

        ErrorType::Runtime => {
            say!(Red "Runtime");
            say!(Red e.msg);
            print_metadata(&e);
            return;
        }

        ErrorType::File => {
            say!(Yellow "🏚 Can't find/read file or directory: ", relative_dir);
            say!(e.msg);
            return;
        }

        ErrorType::Compiler => {
            if !relative_dir.is_empty() {
                say!("\nヽ༼☉ ‿ ⚆༽ﾉ  🔥🔥🔥🔥 ", Dark Magenta relative_dir, " 🔥🔥🔥🔥  ╰(° _ o╰) ");
            }
            say!(Yellow "COMPILER BUG - ");
            say!(Dark Yellow "spindle developer skill issue (not your fault)");
        }

        ErrorType::Config => {
            if !relative_dir.is_empty() {
                say!("\n (-_-)  🔥🔥🔥🔥 ", Dark Magenta relative_dir, " 🔥🔥🔥🔥  <(^~^)/ ");
            }
            say!(Yellow "CONFIG FILE ISSUE- ");
            say!(Dark Yellow "Malformed config file, something doesn't make sense inside spindle.toml");
        }
    }

    say!(Red e.msg);
    print_metadata(&e);

    if line.is_empty() {
        return;
    }

    println!("\n{line}");

    // spaces before the relevant part of the line
    print!(
        "{}",
        " ".repeat((e.location.start_pos.char_column - 1).max(0) as usize)
    );

    let length_of_underline =
        (e.location.end_pos.char_column - e.location.start_pos.char_column + 1).max(1) as usize;
    say!(Red { "^".repeat(length_of_underline) });
}

fn print_metadata(e: &CompilerError) {
    if let Some(function_name) = e.metadata.get(&ErrorMetaDataKey::FunctionName) {
        say!(Dark Magenta "In function ", Bright function_name);
    }

    if let Some(stage) = e.metadata.get(&ErrorMetaDataKey::CompilationStage) {
        say!(Bright Black "Stage: ", stage);
    }

    if let (Some(expected), Some(found)) = (
        e.metadata.get(&ErrorMetaDataKey::ExpectedType),
        e.metadata.get(&ErrorMetaDataKey::FoundType),
    ) {
        say!(Dark Yellow "Expected ", expected, ", found ", found);
    }

    if let Some(suggestion) = e.metadata.get(&ErrorMetaDataKey::PrimarySuggestion) {
        say!(Green "Suggestion: ", suggestion);
    }

    if let Some(alternative) = e.metadata.get(&ErrorMetaDataKey::AlternativeSuggestion) {
        say!(Bright Black "Or: ", alternative);
    }
}

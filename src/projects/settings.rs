use crate::compiler_frontend::compiler_errors::{CompilerError, ErrorMetaDataKey, ErrorType};
use crate::compiler_frontend::compiler_messages::log_level::LogLevel;
use crate::compiler_frontend::value_encoding::ConstantWidth;
use crate::backends::function_registry::DEFAULT_NAMESPACE;
use crate::return_config_error;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const SPINDLE_FILE_EXTENSION: &str = "spd";
pub const CONFIG_FILE_NAME: &str = "spindle.toml";
pub const DEFAULT_THREAD_COUNT: usize = 8;
pub const DEFAULT_ENTRY_FUNCTION: &str = "main";

// Rough guess at how many source bytes make one token, used to size the token vec up front
pub const SRC_TO_TOKEN_RATIO: usize = 4;

/// Contents of `spindle.toml`. Every table and key is optional.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub runtime: RuntimeConfig,
    pub codegen: CodegenConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Workers in the kernel pool
    pub thread_count: usize,
    pub log_level: LogLevel,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            thread_count: DEFAULT_THREAD_COUNT,
            log_level: LogLevel::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CodegenConfig {
    /// Namespace every definition in the session is registered under
    pub namespace: String,
    pub constant_width: ConstantWidth,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        CodegenConfig {
            namespace: String::from(DEFAULT_NAMESPACE),
            constant_width: ConstantWidth::default(),
        }
    }
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Config, CompilerError> {
        let config: Config = match toml::from_str(text) {
            Ok(config) => config,
            Err(error) => return_config_error!("{}", error),
        };

        config.validate()?;
        Ok(config)
    }

    /// Reads the config for a session.
    ///
    /// An explicit path must exist. Otherwise `spindle.toml` in `directory` is used when
    /// present, and the defaults when it isn't.
    pub fn load(explicit: Option<&Path>, directory: &Path) -> Result<Config, CompilerError> {
        let path: PathBuf = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let implicit = directory.join(CONFIG_FILE_NAME);
                if !implicit.is_file() {
                    return Ok(Config::default());
                }
                implicit
            }
        };

        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(error) => {
                return Err(CompilerError::file_error(
                    &path,
                    format!("Could not read the config file: {error}"),
                ));
            }
        };

        Config::from_toml_str(&text).map_err(|error| error.with_file_path(path))
    }

    pub fn validate(&self) -> Result<(), CompilerError> {
        if self.runtime.thread_count == 0 {
            return Err(CompilerError::without_location(
                "runtime.thread_count must be at least 1",
                ErrorType::Config,
            )
            .with_metadata(
                ErrorMetaDataKey::PrimarySuggestion,
                format!("Remove the key to use the default of {DEFAULT_THREAD_COUNT}"),
            ));
        }

        if self.codegen.namespace.trim().is_empty() {
            return_config_error!("codegen.namespace can't be empty");
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/settings_tests.rs"]
mod tests;

//! Process-wide log level.
//!
//! The level is set once when a session starts and read by the `log_*!` macros.
//! The ids are shared with codegen backends, which receive the same level through
//! `CodegenBackend::set_log_level`.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU8, Ordering};

static LOG_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Message as u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug = 1,
    #[default]
    Message = 2,
    Warning = 3,
    Error = 4,
}

impl LogLevel {
    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn from_id(id: u8) -> Option<LogLevel> {
        match id {
            1 => Some(LogLevel::Debug),
            2 => Some(LogLevel::Message),
            3 => Some(LogLevel::Warning),
            4 => Some(LogLevel::Error),
            _ => None,
        }
    }

    pub fn from_name(name: &str) -> Option<LogLevel> {
        match name {
            "debug" => Some(LogLevel::Debug),
            "message" => Some(LogLevel::Message),
            "warning" => Some(LogLevel::Warning),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LogLevel::Debug => "debug",
            LogLevel::Message => "message",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
        };
        f.write_str(name)
    }
}

pub fn set_log_level(level: LogLevel) {
    LOG_LEVEL.store(level.id(), Ordering::Relaxed);
}

pub fn log_level() -> LogLevel {
    LogLevel::from_id(LOG_LEVEL.load(Ordering::Relaxed)).unwrap_or_default()
}

/// Messages at `level` are shown when the configured level is at or below it.
pub fn log_enabled(level: LogLevel) -> bool {
    log_level() <= level
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if $crate::compiler_frontend::compiler_messages::log_level::log_enabled(
            $crate::compiler_frontend::compiler_messages::log_level::LogLevel::Debug,
        ) {
            saying::say!(Bright Black "[ DEBUG ] >> ", $($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_message {
    ($($arg:tt)*) => {
        if $crate::compiler_frontend::compiler_messages::log_level::log_enabled(
            $crate::compiler_frontend::compiler_messages::log_level::LogLevel::Message,
        ) {
            saying::say!(Green "[MESSAGE] >> ", $($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_warning {
    ($($arg:tt)*) => {
        if $crate::compiler_frontend::compiler_messages::log_level::log_enabled(
            $crate::compiler_frontend::compiler_messages::log_level::LogLevel::Warning,
        ) {
            saying::say!(Yellow "[WARNING] >> ", $($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        if $crate::compiler_frontend::compiler_messages::log_level::log_enabled(
            $crate::compiler_frontend::compiler_messages::log_level::LogLevel::Error,
        ) {
            saying::say!(Red "[ ERROR ] >> ", $($arg)*);
        }
    };
}

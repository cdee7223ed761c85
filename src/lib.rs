//! Spindle compiles a numeric subset of decorated Python-like functions through a pluggable
//! codegen backend, and runs `@kernel` loops data parallel across a worker pool.
//!
//! Everything else runs on the host interpreter, so any program that parses also runs.

pub mod backends;
pub mod compiler_frontend;
pub mod projects;
pub mod runtime;

pub use backends::reference::ReferenceBackend;
pub use compiler_frontend::JitSession;
pub use projects::settings::Config;
pub use runtime::host_value::{ElementType, HostValue, SharedArray};

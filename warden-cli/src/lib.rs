//! Interactive front end for warden
//!
//! This crate provides:
//! - Process configuration from flags and environment variables
//! - Tracing subscriber setup
//! - Assembly of policy store, watcher, tools, skills and agent
//! - A line-oriented REPL carrying one conversation

mod app;
mod config;
mod error;
mod logging;
pub mod repl;

pub use app::App;
pub use config::{Config, ConfigError, DEFAULT_SYSTEM_PROMPT};
pub use error::CliError;
pub use logging::init_logging;
pub use repl::{run_cli, PresentationHook, Verbosity};

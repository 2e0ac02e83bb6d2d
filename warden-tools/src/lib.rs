//! Built-in tools for warden agents: shell commands, file reads and writes,
//! and directory listings, all executed behind the capability gate.

pub mod catalog;
pub mod encoding;
pub mod executor;
pub mod filesystem;
pub mod process;
pub mod safety;

pub use catalog::{ToolCatalog, ToolKind};
pub use encoding::{EncodingError, TextEncoding};
pub use executor::ToolExecutor;
pub use safety::{is_command_safe, BLOCKED_COMMANDS};

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use schemars::JsonSchema;
    pub use serde::{Deserialize, Serialize};
    pub use warden_core::{ToolErrorKind, ToolHandler, ToolOutcome, ToolRequest};
}

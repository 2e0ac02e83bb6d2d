//! Shell command execution.
//!
//! Commands run as a subprocess of `bash` (falling back to `sh`) or
//! PowerShell, with stdout and stderr captured separately. A command that
//! outlives its timeout is killed, never left running.

mod shell;

pub use shell::{run_shell, Shell, ShellInput, DEFAULT_COMMAND_TIMEOUT_SECS};

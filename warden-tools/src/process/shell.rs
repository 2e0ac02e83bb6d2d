use std::io::ErrorKind;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use serde_json::json;
use tokio::process::Command;
use warden_core::{ToolErrorKind, ToolOutcome};

use crate::prelude::*;

/// Timeout applied when the request does not name one.
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 30;

fn default_timeout() -> u64 {
    DEFAULT_COMMAND_TIMEOUT_SECS
}

/// Input for running a shell command
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct ShellInput {
    /// The command to execute. Can be a single command or a script block.
    pub command: String,

    /// Optional working directory to run the command in. Defaults to the current directory.
    #[serde(default)]
    pub working_directory: Option<String>,

    /// Timeout in seconds for the command execution. Defaults to 30 seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

/// Which interpreter runs the command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shell {
    Bash,
    PowerShell,
}

impl Shell {
    /// Programs to try, in order.
    fn programs(self) -> &'static [&'static str] {
        match self {
            Shell::Bash => &["bash", "sh"],
            Shell::PowerShell => &["powershell.exe", "pwsh"],
        }
    }

    /// Arguments preceding the command text.
    fn args(self) -> &'static [&'static str] {
        match self {
            Shell::Bash => &["-c"],
            Shell::PowerShell => &["-NoProfile", "-NonInteractive", "-Command"],
        }
    }

    fn label(self) -> &'static str {
        match self {
            Shell::Bash => "Bash/sh",
            Shell::PowerShell => "PowerShell",
        }
    }
}

/// Run `command` to completion or until `timeout` elapses.
///
/// Exit code 0 succeeds with `{exit_code, stdout, stderr}` as payload. Any
/// other exit fails with the same payload and stderr (or a synthesized
/// message) as detail.
pub async fn run_shell(
    shell: Shell,
    command: &str,
    working_directory: Option<&str>,
    timeout: Duration,
) -> ToolOutcome {
    let mut child = None;
    for program in shell.programs() {
        let mut cmd = Command::new(program);
        cmd.args(shell.args())
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = working_directory {
            cmd.current_dir(Path::new(dir));
        }
        // Own process group, so a timeout can take down everything it forked
        #[cfg(unix)]
        cmd.process_group(0);

        match cmd.spawn() {
            Ok(spawned) => {
                tracing::debug!(program = %program, "spawned shell");
                child = Some(spawned);
                break;
            }
            // A missing working directory also surfaces as NotFound
            Err(e) if e.kind() == ErrorKind::NotFound => {
                if let Some(dir) = working_directory {
                    if !Path::new(dir).is_dir() {
                        return ToolOutcome::failure(
                            ToolErrorKind::NotFound,
                            format!("Directory not found: {}", dir),
                        );
                    }
                }
                continue;
            }
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                return ToolOutcome::failure(
                    ToolErrorKind::PermissionDenied,
                    format!("Permission denied: {}", e),
                );
            }
            Err(e) => {
                return ToolOutcome::failure(ToolErrorKind::OsError, format!("OS error: {}", e));
            }
        }
    }

    let Some(child) = child else {
        return ToolOutcome::failure(
            ToolErrorKind::OsError,
            format!("{} not found on this system", shell.label()),
        );
    };

    let pid = child.id();
    // Dropping the child on timeout kills the shell itself
    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            return ToolOutcome::failure(ToolErrorKind::OsError, format!("OS error: {}", e));
        }
        Err(_) => {
            tracing::warn!(timeout_secs = timeout.as_secs(), "command timed out");
            if let Some(pid) = pid {
                kill_process_group(pid);
            }
            return ToolOutcome::failure(
                ToolErrorKind::Timeout,
                format!("Command timed out after {} seconds", timeout.as_secs()),
            );
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    let exit_code = output.status.code();
    let payload = json!({
        "exit_code": exit_code,
        "stdout": stdout,
        "stderr": stderr,
    });

    tracing::info!(exit_code = ?exit_code, "command completed");

    if output.status.success() {
        ToolOutcome::ok(payload)
    } else {
        let detail = if stderr.trim().is_empty() {
            match exit_code {
                Some(code) => format!("Command failed with exit code {}", code),
                None => "Command was terminated by a signal".to_string(),
            }
        } else {
            stderr
        };
        ToolOutcome::failure_with_payload(ToolErrorKind::OsError, detail, payload)
    }
}

/// Kill every process left in the group led by `pid`.
#[cfg(unix)]
fn kill_process_group(pid: u32) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    match killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
        Ok(()) | Err(nix::errno::Errno::ESRCH) => {}
        Err(e) => tracing::warn!(pid, error = %e, "failed to kill process group"),
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: u32) {}

//! Commands that are refused no matter what the policy says.
//!
//! The list is fixed at compile time so a permissive or broken policy file
//! can never re-enable them. Matching is a case-insensitive substring test
//! against the whole command text.

/// Substrings that make a shell command unconditionally unsafe.
pub const BLOCKED_COMMANDS: &[&str] = &[
    "rm -rf /",
    "del /f /s /q c:\\",
    "format",
    ":(){:|:&};:",
    "mkfs",
    "dd if=/dev/zero",
    "shutdown",
    "reboot",
    "halt",
    "init 0",
    "init 6",
];

/// The first blocked substring found in `command`, if any.
pub fn blocked_pattern(command: &str) -> Option<&'static str> {
    let lowered = command.trim().to_lowercase();
    BLOCKED_COMMANDS
        .iter()
        .copied()
        .find(|blocked| lowered.contains(&blocked.to_lowercase()))
}

pub fn is_command_safe(command: &str) -> bool {
    match blocked_pattern(command) {
        Some(pattern) => {
            tracing::warn!(command = %command, pattern = %pattern, "blocked dangerous command");
            false
        }
        None => true,
    }
}

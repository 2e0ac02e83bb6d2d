//! Tool activity shown while the agent works

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use warden_core::{AgentEvent, AgentHook, ToolErrorKind};

use super::commands::Verbosity;

const MAX_INPUT_CHARS: usize = 200;

/// Hook that prints tool requests and failures to stderr as they happen
pub struct PresentationHook {
    verbosity: Arc<Mutex<Verbosity>>,
}

impl PresentationHook {
    pub fn new(verbosity: Arc<Mutex<Verbosity>>) -> Self {
        Self { verbosity }
    }
}

impl AgentHook for PresentationHook {
    fn on_event(&self, event: &AgentEvent) {
        let verbosity = *self.verbosity.lock();
        if let Some(line) = format_event(event, verbosity) {
            eprintln!("{}", line);
        }
    }
}

/// Render one event, or nothing when the verbosity level hides it.
pub fn format_event(event: &AgentEvent, verbosity: Verbosity) -> Option<String> {
    if verbosity == Verbosity::Quiet {
        return None;
    }
    match event {
        AgentEvent::ToolRequested { name, input, .. } => {
            if verbosity == Verbosity::Verbose {
                Some(format!("  > {} {}", name, compact_input(input)))
            } else {
                Some(format!("  > {}", name))
            }
        }
        AgentEvent::ToolCompleted { name, duration, .. } if verbosity == Verbosity::Verbose => {
            Some(format!("  < {} ({:.1?})", name, duration))
        }
        AgentEvent::ToolFailed {
            name, kind, error, ..
        } => {
            let label = match kind {
                ToolErrorKind::PermissionDenied => "denied",
                ToolErrorKind::UnsafeCommand => "blocked",
                _ => "failed",
            };
            Some(format!("  ! {} {}: {}", name, label, error))
        }
        AgentEvent::IterationLimitReached { max_iterations } => Some(format!(
            "  ! stopped after {} model calls",
            max_iterations
        )),
        _ => None,
    }
}

fn compact_input(input: &Value) -> String {
    let text = input.to_string();
    match text.char_indices().nth(MAX_INPUT_CHARS) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn requested() -> AgentEvent {
        AgentEvent::ToolRequested {
            tool_use_id: "tu_1".to_string(),
            name: "read_file".to_string(),
            input: json!({"path": "notes.txt"}),
        }
    }

    #[test]
    fn quiet_hides_everything() {
        assert_eq!(format_event(&requested(), Verbosity::Quiet), None);
    }

    #[test]
    fn normal_shows_tool_name_only() {
        assert_eq!(
            format_event(&requested(), Verbosity::Normal).as_deref(),
            Some("  > read_file")
        );
    }

    #[test]
    fn verbose_shows_input() {
        let line = format_event(&requested(), Verbosity::Verbose).unwrap();
        assert!(line.contains("notes.txt"));
    }

    #[test]
    fn completions_only_in_verbose() {
        let event = AgentEvent::ToolCompleted {
            tool_use_id: "tu_1".to_string(),
            name: "read_file".to_string(),
            duration: Duration::from_millis(12),
        };
        assert_eq!(format_event(&event, Verbosity::Normal), None);
        assert!(format_event(&event, Verbosity::Verbose).is_some());
    }

    #[test]
    fn denial_is_labelled() {
        let event = AgentEvent::ToolFailed {
            tool_use_id: "tu_1".to_string(),
            name: "run_bash".to_string(),
            kind: ToolErrorKind::PermissionDenied,
            error: "Permission denied: Tool 'run_bash' is not enabled in the current configuration.".to_string(),
            duration: Duration::from_millis(1),
        };
        let line = format_event(&event, Verbosity::Normal).unwrap();
        assert!(line.starts_with("  ! run_bash denied:"));
    }

    #[test]
    fn long_input_is_truncated() {
        let input = json!({"content": "x".repeat(500)});
        assert!(compact_input(&input).ends_with("..."));
    }
}

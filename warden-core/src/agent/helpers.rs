//! Helper functions for the Agent module

use crate::types::Message;

use super::types::MAX_ITERATIONS_NOTICE;

/// All text segments of a message joined with newlines
///
/// Returns None when the message carries no non-empty text.
pub fn extract_text_response(message: &Message) -> Option<String> {
    let segments: Vec<&str> = message
        .text_segments()
        .into_iter()
        .filter(|s| !s.trim().is_empty())
        .collect();
    if segments.is_empty() {
        None
    } else {
        Some(segments.join("\n"))
    }
}

/// Reply for a run that hit the iteration ceiling: whatever text the model
/// produced along the way, followed by the notice.
pub fn iteration_limit_text(partial: &[String]) -> String {
    let text = partial.join("\n");
    if text.is_empty() {
        MAX_ITERATIONS_NOTICE.trim_start().to_string()
    } else {
        format!("{}{}", text, MAX_ITERATIONS_NOTICE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ContentBlock, Role, ToolUseBlock};

    #[test]
    fn test_extract_text_response_with_text() {
        let message = Message::assistant("Hello, world!");
        assert_eq!(
            extract_text_response(&message),
            Some("Hello, world!".to_string())
        );
    }

    #[test]
    fn test_extract_text_response_empty() {
        let message = Message {
            role: Role::Assistant,
            content: vec![],
        };
        assert_eq!(extract_text_response(&message), None);

        let message = Message::assistant("  \n");
        assert_eq!(extract_text_response(&message), None);
    }

    #[test]
    fn test_extract_text_response_joins_all_text_blocks() {
        let message = Message {
            role: Role::Assistant,
            content: vec![
                ContentBlock::text("First"),
                ContentBlock::ToolUse(ToolUseBlock {
                    id: "1".to_string(),
                    name: "read_file".to_string(),
                    input: serde_json::json!({"path": "/tmp/test"}),
                }),
                ContentBlock::text("Second"),
            ],
        };
        assert_eq!(
            extract_text_response(&message),
            Some("First\nSecond".to_string())
        );
    }

    #[test]
    fn test_extract_text_response_only_tool_use() {
        let message = Message {
            role: Role::Assistant,
            content: vec![ContentBlock::ToolUse(ToolUseBlock {
                id: "1".to_string(),
                name: "list_directory".to_string(),
                input: serde_json::json!({}),
            })],
        };
        assert_eq!(extract_text_response(&message), None);
    }

    #[test]
    fn test_iteration_limit_text() {
        assert_eq!(
            iteration_limit_text(&[]),
            "(Note: Maximum tool iterations reached)"
        );
        assert_eq!(
            iteration_limit_text(&["Working on it".to_string(), "Still going".to_string()]),
            "Working on it\nStill going\n\n(Note: Maximum tool iterations reached)"
        );
    }
}

//! Conversation state for a single agent run
//!
//! A [`Conversation`] is the ordered list of turns exchanged with the model
//! during one run: the user's input, each assistant response, and the tool
//! results fed back as the following user turn. It is owned by the run that
//! builds it and never shared between concurrent runs.

use crate::types::{Message, Role, ToolResultBlock};

/// Ordered turns of one agent run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue from earlier turns.
    pub fn from_history(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.messages.push(Message::user(text));
    }

    /// Append an assistant response exactly as the model returned it, tool
    /// requests included.
    pub fn push_assistant(&mut self, message: Message) {
        debug_assert_eq!(message.role, Role::Assistant);
        self.messages.push(message);
    }

    /// Append the results for one round of tool calls as a single user turn.
    pub fn push_tool_results(&mut self, results: Vec<ToolResultBlock>) {
        if results.is_empty() {
            return;
        }
        self.messages.push(Message::tool_results(results));
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

//! The agentic loop - core execution logic for Agent

use std::time::Instant;

use crate::conversation::Conversation;
use crate::events::AgentEvent;
use crate::model::ModelRequest;
use crate::types::{Message, StopReason};

use super::helpers::{extract_text_response, iteration_limit_text};
use super::types::{
    AgentError, AgentResponse, RunOutcome, TokenUsageStats, ToolCallInfo, EMPTY_RESPONSE_MESSAGE,
};
use super::Agent;

impl Agent {
    /// Run the agent with a single user message and no prior history
    ///
    /// Never fails: inference errors and timeouts become a short apology in
    /// the response text with [`RunOutcome::Failed`].
    pub async fn run(&self, user_message: &str) -> AgentResponse {
        self.run_with_history(user_message, Vec::new()).await
    }

    /// Run the agent, continuing from earlier messages
    pub async fn run_with_history(
        &self,
        user_message: &str,
        history: Vec<Message>,
    ) -> AgentResponse {
        let run_start = Instant::now();
        match self.try_run_with_history(user_message, history).await {
            Ok(response) => response,
            Err(err) => {
                tracing::error!(error = %err, "agent run failed");
                self.emit_event(AgentEvent::RunFailed {
                    error: err.to_string(),
                    duration: run_start.elapsed(),
                });
                AgentResponse {
                    text: err.user_message().to_string(),
                    outcome: RunOutcome::Failed,
                    tool_calls: Vec::new(),
                    token_usage: None,
                    duration: run_start.elapsed(),
                    model_calls: 0,
                    messages: Vec::new(),
                }
            }
        }
    }

    /// Like [`run`](Self::run) but surfaces inference failures as errors
    pub async fn try_run(&self, user_message: &str) -> Result<AgentResponse, AgentError> {
        self.try_run_with_history(user_message, Vec::new()).await
    }

    /// Execute the loop
    ///
    /// Each iteration makes one inference call. When the model stops to use
    /// tools, every requested tool is run and the results are appended to
    /// the conversation before the next call. Any other stop reason ends the
    /// run with the model's text. After `max_iterations` calls the run ends
    /// with whatever text was produced plus a notice.
    pub async fn try_run_with_history(
        &self,
        user_message: &str,
        history: Vec<Message>,
    ) -> Result<AgentResponse, AgentError> {
        let run_start = Instant::now();

        self.emit_event(AgentEvent::RunStarted {
            input: user_message.to_string(),
            timestamp: run_start,
        });

        if let Some(response) = self.try_skill_shortcut(user_message, run_start).await {
            return Ok(response);
        }

        let mut conversation = Conversation::from_history(history);
        conversation.push_user(user_message);

        let tools = self.tools.definitions();
        let mut tool_call_infos: Vec<ToolCallInfo> = Vec::new();
        let mut partial_text: Vec<String> = Vec::new();
        let mut total_input_tokens: usize = 0;
        let mut total_output_tokens: usize = 0;
        let mut saw_usage = false;
        let mut model_call_count: usize = 0;

        for iteration in 1..=self.max_iterations {
            let model_start = Instant::now();
            self.emit_event(AgentEvent::ModelCallStarted {
                iteration,
                message_count: conversation.len(),
                tool_count: tools.len(),
                timestamp: model_start,
            });
            tracing::debug!(iteration, messages = conversation.len(), "calling model");

            let request = ModelRequest {
                messages: conversation.messages().to_vec(),
                system_prompt: self.system_prompt.clone(),
                max_tokens: self.max_tokens,
                tools: tools.clone(),
            };

            let response =
                match tokio::time::timeout(self.inference_timeout, self.provider.generate(request))
                    .await
                {
                    Ok(result) => result?,
                    Err(_) => {
                        tracing::warn!(
                            iteration,
                            timeout_secs = self.inference_timeout.as_secs(),
                            "inference call timed out"
                        );
                        return Err(AgentError::InferenceTimeout(self.inference_timeout));
                    }
                };
            model_call_count += 1;

            if let Some(usage) = response.usage {
                saw_usage = true;
                total_input_tokens += usage.input_tokens;
                total_output_tokens += usage.output_tokens;
            }

            self.emit_event(AgentEvent::ModelCallCompleted {
                response_content: response.message.text(),
                tokens: response.usage,
                duration: model_start.elapsed(),
                stop_reason: response.stop_reason,
            });

            let tool_uses: Vec<_> = response.message.tool_uses().into_iter().cloned().collect();

            if response.stop_reason == StopReason::ToolUse && !tool_uses.is_empty() {
                if let Some(text) = extract_text_response(&response.message) {
                    partial_text.push(text);
                }
                conversation.push_assistant(response.message);

                let results = self.execute_tool_calls(&tool_uses, &mut tool_call_infos).await;
                conversation.push_tool_results(results);
                continue;
            }

            if !matches!(response.stop_reason, StopReason::EndTurn | StopReason::ToolUse) {
                tracing::info!(stop_reason = ?response.stop_reason, "model stopped early");
            }

            let text = extract_text_response(&response.message)
                .unwrap_or_else(|| EMPTY_RESPONSE_MESSAGE.to_string());
            conversation.push_assistant(response.message);

            let duration = run_start.elapsed();
            self.emit_event(AgentEvent::RunCompleted {
                output: text.clone(),
                duration,
            });

            return Ok(AgentResponse {
                text,
                outcome: RunOutcome::Completed,
                tool_calls: tool_call_infos,
                token_usage: saw_usage.then_some(TokenUsageStats {
                    input_tokens: total_input_tokens,
                    output_tokens: total_output_tokens,
                }),
                duration,
                model_calls: model_call_count,
                messages: conversation.into_messages(),
            });
        }

        tracing::warn!(
            max_iterations = self.max_iterations,
            "maximum tool iterations reached"
        );
        self.emit_event(AgentEvent::IterationLimitReached {
            max_iterations: self.max_iterations,
        });

        let text = iteration_limit_text(&partial_text);
        let duration = run_start.elapsed();
        self.emit_event(AgentEvent::RunCompleted {
            output: text.clone(),
            duration,
        });

        Ok(AgentResponse {
            text,
            outcome: RunOutcome::MaxIterationsReached,
            tool_calls: tool_call_infos,
            token_usage: saw_usage.then_some(TokenUsageStats {
                input_tokens: total_input_tokens,
                output_tokens: total_output_tokens,
            }),
            duration,
            model_calls: model_call_count,
            messages: conversation.into_messages(),
        })
    }

    /// Answer directly from a skill when the utterance invokes one inline
    async fn try_skill_shortcut(
        &self,
        user_message: &str,
        run_start: Instant,
    ) -> Option<AgentResponse> {
        let skill = self.skills.as_ref()?.find_invocation(user_message)?;
        let name = skill.name().to_string();
        tracing::info!(skill = %name, "invoking skill");

        let (text, outcome, success) = match skill.invoke(user_message).await {
            Ok(output) => (output, RunOutcome::SkillShortcut, true),
            Err(err) => {
                tracing::error!(skill = %name, error = %err, "skill failed");
                (
                    format!("Sorry, error executing skill {}.", name),
                    RunOutcome::Failed,
                    false,
                )
            }
        };

        self.emit_event(AgentEvent::SkillInvoked { name, success });
        let duration = run_start.elapsed();
        self.emit_event(AgentEvent::RunCompleted {
            output: text.clone(),
            duration,
        });

        Some(AgentResponse {
            text,
            outcome,
            tool_calls: Vec::new(),
            token_usage: None,
            duration,
            model_calls: 0,
            messages: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{GENERIC_FAILURE_MESSAGE, INFERENCE_TIMEOUT_MESSAGE};
    use crate::provider::ProviderError;
    use crate::test_utils::{EventCollector, MockProvider, MockToolHandler};
    use std::time::Duration;

    #[tokio::test]
    async fn test_plain_answer_takes_one_call() {
        let provider = MockProvider::new().with_text("Hello there");
        let agent = Agent::builder().provider(provider.clone()).build().unwrap();

        let response = agent.run("hi").await;
        assert_eq!(response.text, "Hello there");
        assert_eq!(response.outcome, RunOutcome::Completed);
        assert_eq!(response.model_calls, 1);
        assert_eq!(provider.call_count(), 1);
        assert_eq!(response.messages.len(), 2);
    }

    #[tokio::test]
    async fn test_tool_round_trip() {
        let provider = MockProvider::new()
            .with_tool_use("echo", serde_json::json!({"value": "ping"}))
            .with_text("Done");
        let tools = MockToolHandler::new().with_tool("echo");
        let agent = Agent::builder()
            .provider(provider.clone())
            .tools(tools.clone())
            .build()
            .unwrap();

        let response = agent.run("use echo").await;
        assert_eq!(response.text, "Done");
        assert_eq!(response.tool_calls.len(), 1);
        assert!(response.tool_calls[0].success);
        assert_eq!(tools.calls(), vec!["echo".to_string()]);

        // Second request carries the assistant tool use and the result
        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].messages.len(), 3);
        assert_eq!(requests[1].tools.len(), 1);
    }

    #[tokio::test]
    async fn test_iteration_limit_appends_notice() {
        let provider = MockProvider::new().repeating_tool_use("echo", serde_json::json!({}));
        let agent = Agent::builder()
            .provider(provider.clone())
            .tools(MockToolHandler::new().with_tool("echo"))
            .with_max_iterations(3)
            .build()
            .unwrap();

        let response = agent.run("loop forever").await;
        assert_eq!(response.outcome, RunOutcome::MaxIterationsReached);
        assert_eq!(provider.call_count(), 3);
        assert_eq!(response.tool_calls.len(), 3);
        assert!(response.text.ends_with("(Note: Maximum tool iterations reached)"));
    }

    #[tokio::test]
    async fn test_provider_error_becomes_apology() {
        let provider =
            MockProvider::new().with_error(ProviderError::Network("connection reset".to_string()));
        let agent = Agent::builder().provider(provider).build().unwrap();

        let collector = EventCollector::new();
        agent.add_hook(collector.clone());

        let response = agent.run("hi").await;
        assert_eq!(response.outcome, RunOutcome::Failed);
        assert_eq!(response.text, GENERIC_FAILURE_MESSAGE);
        assert!(collector.has_event("run_failed"));
    }

    #[tokio::test]
    async fn test_try_run_surfaces_error() {
        let provider =
            MockProvider::new().with_error(ProviderError::RateLimited("slow down".to_string()));
        let agent = Agent::builder().provider(provider).build().unwrap();

        let result = agent.try_run("hi").await;
        assert!(matches!(
            result,
            Err(AgentError::Provider(ProviderError::RateLimited(_)))
        ));
    }

    #[tokio::test]
    async fn test_inference_timeout() {
        let provider = MockProvider::new()
            .with_text("too late")
            .with_delay(Duration::from_millis(500));
        let agent = Agent::builder()
            .provider(provider)
            .with_inference_timeout(Duration::from_millis(20))
            .build()
            .unwrap();

        let response = agent.run("hi").await;
        assert_eq!(response.outcome, RunOutcome::Failed);
        assert_eq!(response.text, INFERENCE_TIMEOUT_MESSAGE);
    }

    #[tokio::test]
    async fn test_empty_answer_gets_placeholder() {
        let provider = MockProvider::new().with_text("");
        let agent = Agent::builder().provider(provider).build().unwrap();

        let response = agent.run("hi").await;
        assert_eq!(response.text, EMPTY_RESPONSE_MESSAGE);
        assert_eq!(response.outcome, RunOutcome::Completed);
    }

    #[tokio::test]
    async fn test_history_is_sent_first() {
        let provider = MockProvider::new().with_text("second answer");
        let agent = Agent::builder().provider(provider.clone()).build().unwrap();

        let history = vec![Message::user("first"), Message::assistant("first answer")];
        let response = agent.run_with_history("again", history).await;
        assert_eq!(response.messages.len(), 4);

        let requests = provider.requests();
        assert_eq!(requests[0].messages.len(), 3);
        assert_eq!(requests[0].messages[0].text(), "first");
    }

    #[tokio::test]
    async fn test_event_order_for_tool_run() {
        let provider = MockProvider::new()
            .with_tool_use("echo", serde_json::json!({}))
            .with_text("ok");
        let agent = Agent::builder()
            .provider(provider)
            .tools(MockToolHandler::new().with_tool("echo"))
            .build()
            .unwrap();
        let collector = EventCollector::new();
        agent.add_hook(collector.clone());

        agent.run("go").await;
        assert_eq!(
            collector.event_types(),
            vec![
                "run_started",
                "model_call_started",
                "model_call_completed",
                "tool_requested",
                "tool_completed",
                "model_call_started",
                "model_call_completed",
                "run_completed",
            ]
        );
    }
}

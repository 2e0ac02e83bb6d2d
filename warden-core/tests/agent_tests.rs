mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{write_policy, BrokenSkill, EchoSkill, GatedEcho};
use serde_json::json;
use warden_core::policy::{CapabilityGate, PolicyDocument, PolicyStore};
use warden_core::test_utils::{EventCollector, MockProvider};
use warden_core::{Agent, AgentEvent, RunOutcome, SkillRegistry, ToolErrorKind};

fn gate_for(yaml: &str) -> CapabilityGate {
    let doc = PolicyDocument::from_yaml(yaml).unwrap();
    CapabilityGate::new(Arc::new(PolicyStore::with_document(doc)))
}

#[tokio::test]
async fn test_agent_simple_text_response() {
    let provider = MockProvider::new().with_text("Hello, world!");

    let agent = Agent::builder().provider(provider).build().unwrap();

    let response = agent.run("Say hello").await;
    assert_eq!(response, "Hello, world!");
}

#[tokio::test]
async fn test_agent_with_system_prompt() {
    let provider = MockProvider::new().with_text("I am helpful!");

    let agent = Agent::builder()
        .provider(provider.clone())
        .with_system_prompt("You are a helpful assistant")
        .build()
        .unwrap();

    agent.run("Who are you?").await;
    assert_eq!(
        provider.requests()[0].system_prompt.as_deref(),
        Some("You are a helpful assistant")
    );
}

#[tokio::test]
async fn test_allowed_tool_runs_and_answer_follows() {
    let gate = gate_for("tools:\n  allowed: [\"echo\"]\n");
    let tools = GatedEcho::new(gate, &["echo", "secret"]);
    let executed = tools.executed();

    let provider = MockProvider::new()
        .with_tool_use("echo", json!({"value": 1}))
        .with_text("All done");
    let agent = Agent::builder()
        .provider(provider.clone())
        .tools(tools)
        .build()
        .unwrap();

    let response = agent.run("echo something").await;
    assert_eq!(response.text, "All done");
    assert_eq!(response.outcome, RunOutcome::Completed);
    assert_eq!(*executed.lock().unwrap(), vec!["echo"]);

    // Only the allowed tool is offered to the model
    let offered: Vec<_> = provider.requests()[0]
        .tools
        .iter()
        .map(|t| t.name.clone())
        .collect();
    assert_eq!(offered, vec!["echo"]);
}

#[tokio::test]
async fn test_denied_tool_result_reaches_model() {
    let gate = gate_for("tools:\n  allowed: [\"echo\"]\n");
    let tools = GatedEcho::new(gate, &["echo", "secret"]);
    let executed = tools.executed();

    let provider = MockProvider::new()
        .with_tool_use("secret", json!({}))
        .with_text("I could not do that");
    let agent = Agent::builder()
        .provider(provider.clone())
        .tools(tools)
        .build()
        .unwrap();

    let response = agent.run("use the secret tool").await;
    assert_eq!(response.text, "I could not do that");
    assert!(executed.lock().unwrap().is_empty());

    let call = &response.tool_calls[0];
    assert!(!call.success);
    assert_eq!(call.error_kind, Some(ToolErrorKind::PermissionDenied));
    assert_eq!(
        call.output,
        "Error: Permission denied: Tool 'secret' is not in the allowed list"
    );

    // The failure went back to the model as an error result
    let second = &provider.requests()[1];
    let results = &second.messages.last().unwrap().content;
    match &results[0] {
        warden_core::ContentBlock::ToolResult(result) => assert!(result.is_error()),
        other => panic!("expected tool result, got {:?}", other),
    }
}

#[tokio::test]
async fn test_denied_resource_path_blocks_allowed_tool() {
    let gate = gate_for(
        "tools:\n  allowed: [\"echo\"]\nresources:\n  denied_paths: [\"/etc/*\"]\n",
    );
    let tools = GatedEcho::new(gate, &["echo"]);
    let executed = tools.executed();

    let provider = MockProvider::new()
        .with_tool_use("echo", json!({"path": "/etc/shadow"}))
        .with_text("Blocked");
    let agent = Agent::builder().provider(provider).tools(tools).build().unwrap();

    let response = agent.run("read shadow").await;
    assert!(executed.lock().unwrap().is_empty());
    assert_eq!(
        response.tool_calls[0].output,
        "Error: Permission denied: Resource path '/etc/shadow' is denied"
    );
}

#[tokio::test]
async fn test_loop_stops_at_exactly_max_iterations() {
    let gate = gate_for("tools:\n  allowed: [\"echo\"]\n");
    let provider = MockProvider::new()
        .with_text_and_tool_use("Looking.", "echo", json!({}))
        .repeating_tool_use("echo", json!({}));

    let agent = Agent::builder()
        .provider(provider.clone())
        .tools(GatedEcho::new(gate, &["echo"]))
        .with_max_iterations(4)
        .build()
        .unwrap();

    let collector = EventCollector::new();
    agent.add_hook(collector.clone());

    let response = agent.run("never finish").await;
    assert_eq!(provider.call_count(), 4);
    assert_eq!(response.model_calls, 4);
    assert_eq!(response.outcome, RunOutcome::MaxIterationsReached);
    assert_eq!(
        response.text,
        "Looking.\n\n(Note: Maximum tool iterations reached)"
    );
    assert_eq!(collector.count_event("iteration_limit_reached"), 1);
    assert_eq!(collector.count_event("tool_requested"), 4);
}

#[tokio::test]
async fn test_default_iteration_ceiling_is_ten() {
    let provider = MockProvider::new().repeating_tool_use("echo", json!({}));
    let agent = Agent::builder()
        .provider(provider.clone())
        .tools(GatedEcho::new(gate_for("tools:\n  allowed: [\"*\"]\n"), &["echo"]))
        .build()
        .unwrap();

    let response = agent.run("loop").await;
    assert_eq!(provider.call_count(), 10);
    assert_eq!(response.text, "(Note: Maximum tool iterations reached)");
}

#[tokio::test]
async fn test_inference_timeout_ends_run() {
    let provider = MockProvider::new()
        .with_text("late")
        .with_delay(Duration::from_millis(300));
    let agent = Agent::builder()
        .provider(provider)
        .with_inference_timeout(Duration::from_millis(25))
        .build()
        .unwrap();

    let collector = EventCollector::new();
    agent.add_hook(collector.clone());

    let response = agent.run("hello").await;
    assert_eq!(response.outcome, RunOutcome::Failed);
    assert_eq!(
        response.text,
        "Sorry, the AI service took too long to respond. Please try again."
    );
    assert!(collector.has_event("run_failed"));
    assert!(!collector.has_event("run_completed"));
}

#[tokio::test]
async fn test_skill_shortcut_skips_inference() {
    let gate = gate_for("skills:\n  allowed: [\"weather\"]\n");
    let mut skills = SkillRegistry::new(gate);
    assert!(skills.register(EchoSkill { name: "weather" }));

    let provider = MockProvider::new().with_text("should not be used");
    let agent = Agent::builder()
        .provider(provider.clone())
        .skills(skills)
        .build()
        .unwrap();

    let collector = EventCollector::new();
    agent.add_hook(collector.clone());

    let response = agent.run("@weather in Lisbon").await;
    assert_eq!(response.outcome, RunOutcome::SkillShortcut);
    assert_eq!(response.text, "weather heard: @weather in Lisbon");
    assert_eq!(provider.call_count(), 0);
    assert!(collector.events().iter().any(|e| matches!(
        e,
        AgentEvent::SkillInvoked { name, success: true } if name == "weather"
    )));
}

#[tokio::test]
async fn test_unlisted_skill_is_not_registered() {
    let gate = gate_for("skills:\n  allowed: [\"weather\"]\n");
    let mut skills = SkillRegistry::new(gate);
    assert!(!skills.register(EchoSkill { name: "stocks" }));

    let provider = MockProvider::new().with_text("from the model");
    let agent = Agent::builder()
        .provider(provider.clone())
        .skills(skills)
        .build()
        .unwrap();

    let response = agent.run("@stocks today").await;
    assert_eq!(response.text, "from the model");
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn test_skill_revoked_by_reload_goes_to_model() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_policy(dir.path(), "skills:\n  allowed: [\"weather\"]\n");
    let store = Arc::new(PolicyStore::open(&path));
    let mut skills = SkillRegistry::new(CapabilityGate::new(Arc::clone(&store)));
    assert!(skills.register(EchoSkill { name: "weather" }));

    let provider = MockProvider::new().with_text("model answer");
    let agent = Agent::builder()
        .provider(provider.clone())
        .skills(skills)
        .build()
        .unwrap();

    write_policy(dir.path(), "skills:\n  allowed: []\n");
    assert!(store.reload());

    let response = agent.run("@weather now").await;
    assert_eq!(response.text, "model answer");
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn test_failing_skill_reports_error() {
    let gate = gate_for("skills:\n  allowed: [\"*\"]\n");
    let mut skills = SkillRegistry::new(gate);
    skills.register(BrokenSkill);

    let agent = Agent::builder()
        .provider(MockProvider::new())
        .skills(skills)
        .build()
        .unwrap();

    let response = agent.run("please @broken").await;
    assert_eq!(response.outcome, RunOutcome::Failed);
    assert_eq!(response.text, "Sorry, error executing skill broken.");
}

#[tokio::test]
async fn test_multi_turn_with_returned_history() {
    let provider = MockProvider::new()
        .with_text("Nice to meet you, Ada")
        .with_text("Your name is Ada");
    let agent = Agent::builder().provider(provider.clone()).build().unwrap();

    let first = agent.run("My name is Ada").await;
    assert!(first.is_completed());

    let second = agent
        .run_with_history("What is my name?", first.messages.clone())
        .await;
    assert_eq!(second.text, "Your name is Ada");
    assert_eq!(second.messages.len(), 4);
    assert_eq!(provider.requests()[1].messages.len(), 3);
}

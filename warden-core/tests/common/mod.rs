//! Common test utilities shared across test files.
//!
//! Items here may not be used by all test files, hence the module-level allow.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use warden_core::policy::{format_denial, CapabilityGate, CapabilityKind};
use warden_core::{Skill, SkillError, ToolDefinition, ToolErrorKind, ToolHandler, ToolOutcome, ToolRequest};

/// Write `yaml` to `permissions.yaml` inside `dir` and return its path.
pub fn write_policy(dir: &Path, yaml: &str) -> PathBuf {
    let path = dir.join("permissions.yaml");
    std::fs::write(&path, yaml).unwrap();
    path
}

/// Poll `condition` until it holds or `attempts` run out.
pub async fn eventually(attempts: usize, mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..attempts {
        if condition() {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }
    condition()
}

/// A tool handler that asks the gate before answering.
///
/// Stands in for the real executor so the loop can be tested against live
/// policy without touching the filesystem.
pub struct GatedEcho {
    gate: CapabilityGate,
    names: Vec<String>,
    executed: Arc<Mutex<Vec<String>>>,
}

impl GatedEcho {
    pub fn new(gate: CapabilityGate, names: &[&str]) -> Self {
        Self {
            gate,
            names: names.iter().map(|n| n.to_string()).collect(),
            executed: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn executed(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.executed)
    }
}

#[async_trait]
impl ToolHandler for GatedEcho {
    fn definitions(&self) -> Vec<ToolDefinition> {
        self.names
            .iter()
            .filter(|name| self.gate.is_allowed(CapabilityKind::Tool, name))
            .map(|name| ToolDefinition {
                name: name.clone(),
                description: "Echo the parameters back".to_string(),
                input_schema: json!({"type": "object"}),
            })
            .collect()
    }

    async fn execute(&self, request: ToolRequest) -> ToolOutcome {
        let check = self.gate.check_permission(
            CapabilityKind::Tool,
            &request.name,
            request.resource_path(),
        );
        if !check.allowed {
            return ToolOutcome::failure(
                ToolErrorKind::PermissionDenied,
                format_denial(CapabilityKind::Tool, &request.name, check.reason.as_deref()),
            );
        }
        self.executed.lock().unwrap().push(request.name.clone());
        ToolOutcome::ok(json!({ "echo": request.parameters }))
    }
}

/// A skill that answers with a fixed prefix and the utterance.
pub struct EchoSkill {
    pub name: &'static str,
}

#[async_trait]
impl Skill for EchoSkill {
    fn name(&self) -> &str {
        self.name
    }

    async fn invoke(&self, utterance: &str) -> Result<String, SkillError> {
        Ok(format!("{} heard: {}", self.name, utterance))
    }
}

/// A skill that always fails.
pub struct BrokenSkill;

#[async_trait]
impl Skill for BrokenSkill {
    fn name(&self) -> &str {
        "broken"
    }

    async fn invoke(&self, _utterance: &str) -> Result<String, SkillError> {
        Err(SkillError::Custom("boom".to_string()))
    }
}

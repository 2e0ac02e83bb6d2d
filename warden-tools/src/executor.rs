//! Policy-checked tool execution.
//!
//! Every request passes, in order, through the access check (capability gate
//! or legacy allow list), per-tool restrictions, the static unsafe-command
//! check for shell tools, and finally the operation itself. A bad request
//! never surfaces as an error: every failure becomes a [`ToolOutcome`].

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use warden_core::policy::{format_denial, CapabilityGate, CapabilityKind, ToolRestriction};
use warden_core::{ToolDefinition, ToolErrorKind, ToolHandler, ToolOutcome, ToolRequest};

use crate::catalog::{ToolCatalog, ToolKind};
use crate::filesystem::{list_directory, read_file, write_file};
use crate::process::{run_shell, Shell, ShellInput};
use crate::safety;

/// How the executor decides whether a tool may run at all.
#[derive(Debug, Clone)]
enum Access {
    /// Ask the capability gate, honouring tool restrictions.
    Gate(CapabilityGate),
    /// Exact-name allow list, for callers that run without a policy file.
    AllowList(Vec<String>),
    /// Everything in the catalog may run.
    Unrestricted,
}

/// Validates and performs tool requests.
///
/// ```rust
/// use std::sync::Arc;
/// use warden_core::policy::{CapabilityGate, PolicyDocument, PolicyStore};
/// use warden_tools::ToolExecutor;
///
/// let doc = PolicyDocument::from_yaml("tools:\n  allowed: [\"list_directory\"]\n").unwrap();
/// let gate = CapabilityGate::new(Arc::new(PolicyStore::with_document(doc)));
/// let executor = ToolExecutor::with_gate(gate);
/// ```
#[derive(Debug, Clone)]
pub struct ToolExecutor {
    catalog: ToolCatalog,
    access: Access,
}

impl ToolExecutor {
    /// Check every request against the gate's current policy.
    pub fn with_gate(gate: CapabilityGate) -> Self {
        Self {
            catalog: ToolCatalog::standard(),
            access: Access::Gate(gate),
        }
    }

    /// Allow exactly the named tools, without a policy.
    pub fn with_allowed_tools<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            catalog: ToolCatalog::standard(),
            access: Access::AllowList(names.into_iter().map(Into::into).collect()),
        }
    }

    /// Allow every catalog tool. The unsafe-command check still applies.
    pub fn unrestricted() -> Self {
        Self {
            catalog: ToolCatalog::standard(),
            access: Access::Unrestricted,
        }
    }

    /// Offer only the tools in `catalog`.
    pub fn with_catalog(mut self, catalog: ToolCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    pub fn gate(&self) -> Option<&CapabilityGate> {
        match &self.access {
            Access::Gate(gate) => Some(gate),
            _ => None,
        }
    }

    /// Decide whether `request` may run. Returns the restrictions to apply
    /// when it may, or the denial outcome when it may not.
    fn authorize(&self, request: &ToolRequest) -> Result<Option<ToolRestriction>, ToolOutcome> {
        match &self.access {
            Access::Gate(gate) => {
                if !gate.is_allowed(CapabilityKind::Tool, &request.name) {
                    return Err(ToolOutcome::failure(
                        ToolErrorKind::PermissionDenied,
                        format_denial(CapabilityKind::Tool, &request.name, None),
                    ));
                }
                // Path denials keep their reason so the user sees which path
                let check = gate.check_permission(
                    CapabilityKind::Tool,
                    &request.name,
                    request.resource_path(),
                );
                if !check.allowed {
                    return Err(ToolOutcome::failure(
                        ToolErrorKind::PermissionDenied,
                        format_denial(CapabilityKind::Tool, &request.name, check.reason.as_deref()),
                    ));
                }
                Ok(gate.restrictions_for(&request.name))
            }
            Access::AllowList(names) => {
                if names.iter().any(|n| *n == request.name) {
                    Ok(None)
                } else {
                    Err(ToolOutcome::failure(
                        ToolErrorKind::PermissionDenied,
                        format!("Tool '{}' is not allowed in current configuration", request.name),
                    ))
                }
            }
            Access::Unrestricted => Ok(None),
        }
    }

    async fn dispatch(
        &self,
        kind: ToolKind,
        request: &ToolRequest,
        restriction: Option<&ToolRestriction>,
    ) -> ToolOutcome {
        if let Some(restriction) = restriction {
            if let Some(path) = request.resource_path() {
                if let Err(reason) = restriction.check_path(path) {
                    return restriction_denied(&request.name, &reason);
                }
            }
        }

        match kind {
            ToolKind::RunBash | ToolKind::RunPowershell => {
                let input: ShellInput = match parse_input(kind, request) {
                    Ok(input) => input,
                    Err(outcome) => return outcome,
                };
                if input.command.trim().is_empty() {
                    return ToolOutcome::failure(ToolErrorKind::InvalidInput, "No command provided");
                }
                if !safety::is_command_safe(&input.command) {
                    return ToolOutcome::failure(
                        ToolErrorKind::UnsafeCommand,
                        "Command blocked for safety reasons",
                    );
                }

                let mut timeout_secs = input.timeout.max(1);
                if let Some(restriction) = restriction {
                    if let Err(reason) = restriction.check_command(&input.command) {
                        return restriction_denied(&request.name, &reason);
                    }
                    timeout_secs = restriction.clamp_timeout(timeout_secs);
                }

                let shell = if kind == ToolKind::RunBash {
                    Shell::Bash
                } else {
                    Shell::PowerShell
                };
                tracing::info!(
                    tool = %kind,
                    command = %truncate(&input.command, 100),
                    timeout_secs,
                    "running command"
                );
                run_shell(
                    shell,
                    &input.command,
                    input.working_directory.as_deref(),
                    Duration::from_secs(timeout_secs),
                )
                .await
            }
            ToolKind::ReadFile => match parse_input(kind, request) {
                Ok(input) => read_file(&input).await,
                Err(outcome) => outcome,
            },
            ToolKind::WriteFile => match parse_input(kind, request) {
                Ok(input) => write_file(&input).await,
                Err(outcome) => outcome,
            },
            ToolKind::ListDirectory => match parse_input(kind, request) {
                Ok(input) => list_directory(&input).await,
                Err(outcome) => outcome,
            },
        }
    }
}

#[async_trait]
impl ToolHandler for ToolExecutor {
    fn definitions(&self) -> Vec<ToolDefinition> {
        match &self.access {
            Access::Gate(gate) => self.catalog.definitions_for(gate),
            Access::AllowList(names) => self
                .catalog
                .definitions()
                .into_iter()
                .filter(|def| names.contains(&def.name))
                .collect(),
            Access::Unrestricted => self.catalog.definitions(),
        }
    }

    async fn execute(&self, request: ToolRequest) -> ToolOutcome {
        tracing::info!(tool = %request.name, "executing tool");

        let restriction = match self.authorize(&request) {
            Ok(restriction) => restriction,
            Err(denied) => {
                tracing::info!(tool = %request.name, "tool request denied");
                return denied;
            }
        };

        let Some(kind) = self.catalog.get(&request.name) else {
            return ToolOutcome::failure(
                ToolErrorKind::InvalidInput,
                format!("Unknown tool: {}", request.name),
            );
        };

        self.dispatch(kind, &request, restriction.as_ref()).await
    }
}

fn parse_input<T: DeserializeOwned>(kind: ToolKind, request: &ToolRequest) -> Result<T, ToolOutcome> {
    serde_json::from_value(Value::Object(request.parameters.clone())).map_err(|e| {
        ToolOutcome::failure(
            ToolErrorKind::InvalidInput,
            format!("Invalid parameters for {}: {}", kind, e),
        )
    })
}

fn restriction_denied(tool: &str, reason: &str) -> ToolOutcome {
    tracing::warn!(tool = %tool, reason = %reason, "tool restriction violated");
    ToolOutcome::failure(
        ToolErrorKind::PermissionDenied,
        format_denial(CapabilityKind::Tool, tool, Some(reason)),
    )
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

//! Allow/deny queries against the active policy.

use std::sync::Arc;

use serde::Serialize;

use super::{
    CapabilityKind, McpSettings, PolicyDocument, PolicyError, PolicyStore, ToolRestriction,
};

/// Result of a composed permission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionCheck {
    pub allowed: bool,
    /// Why the check failed. Always `None` when allowed.
    pub reason: Option<String>,
}

impl PermissionCheck {
    fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    fn deny(reason: String) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
        }
    }
}

/// The raw allow patterns of the active policy, per capability kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AllowedCapabilities {
    pub tools: Vec<String>,
    pub skills: Vec<String>,
    pub mcps: Vec<String>,
}

/// Query surface over a [`PolicyStore`].
///
/// The gate holds no policy state of its own. Every query reads the store's
/// current document, so a reload is visible to the very next call.
#[derive(Debug, Clone)]
pub struct CapabilityGate {
    store: Arc<PolicyStore>,
}

impl CapabilityGate {
    pub fn new(store: Arc<PolicyStore>) -> Self {
        Self { store }
    }

    /// The store backing this gate.
    pub fn store(&self) -> &Arc<PolicyStore> {
        &self.store
    }

    /// The document queries currently run against.
    pub fn snapshot(&self) -> Arc<PolicyDocument> {
        self.store.current()
    }

    /// Whether `name` matches an allow pattern for `kind`.
    ///
    /// An empty name is never allowed.
    pub fn is_allowed(&self, kind: CapabilityKind, name: &str) -> bool {
        let doc = self.store.current();
        let allowed = capability_allowed(&doc, kind, name);
        if !allowed {
            log_denial(&doc, kind, name, &not_allowed_reason(kind, name));
        }
        allowed
    }

    /// Whether `path` matches a resource deny pattern.
    ///
    /// The path is tried with separators normalized to `/` and in its
    /// original form, so deny patterns may use either convention.
    pub fn is_resource_denied(&self, path: &str) -> bool {
        path_denied(&self.store.current(), path)
    }

    /// Check a capability and, optionally, a resource path it touches.
    ///
    /// A denied path overrides an allowed capability.
    pub fn check_permission(
        &self,
        kind: CapabilityKind,
        name: &str,
        path: Option<&str>,
    ) -> PermissionCheck {
        let doc = self.store.current();

        if !capability_allowed(&doc, kind, name) {
            let reason = not_allowed_reason(kind, name);
            log_denial(&doc, kind, name, &reason);
            return PermissionCheck::deny(reason);
        }

        if let Some(path) = path {
            if path_denied(&doc, path) {
                let reason = format!("Resource path '{}' is denied", path);
                log_denial(&doc, kind, name, &reason);
                return PermissionCheck::deny(reason);
            }
        }

        PermissionCheck::allow()
    }

    /// Like [`check_permission`](Self::check_permission) with the kind given
    /// as a string. An unrecognized kind is denied.
    pub fn check_permission_str(
        &self,
        kind: &str,
        name: &str,
        path: Option<&str>,
    ) -> PermissionCheck {
        match kind.parse::<CapabilityKind>() {
            Ok(kind) => self.check_permission(kind, name, path),
            Err(PolicyError::UnknownKind(kind)) => {
                let reason = format!("Unknown capability type: {}", kind);
                tracing::warn!(kind = %kind, name = %name, "permission check for unknown capability type");
                PermissionCheck::deny(reason)
            }
            Err(other) => PermissionCheck::deny(other.to_string()),
        }
    }

    /// Restrictions configured for exactly `tool_name`.
    pub fn restrictions_for(&self, tool_name: &str) -> Option<ToolRestriction> {
        self.store
            .current()
            .tool_policy
            .restrictions
            .get(tool_name)
            .cloned()
    }

    /// Settings configured for exactly `mcp_name`.
    pub fn mcp_settings(&self, mcp_name: &str) -> Option<McpSettings> {
        self.store
            .current()
            .mcp_policy
            .settings
            .get(mcp_name)
            .cloned()
    }

    /// User-facing denial message.
    pub fn format_denial(&self, kind: CapabilityKind, name: &str, reason: Option<&str>) -> String {
        format_denial(kind, name, reason)
    }

    /// Allow patterns of the active policy.
    pub fn list_allowed(&self) -> AllowedCapabilities {
        let doc = self.store.current();
        AllowedCapabilities {
            tools: doc.tool_policy.allowed.sources(),
            skills: doc.skill_policy.allowed.sources(),
            mcps: doc.mcp_policy.allowed.sources(),
        }
    }
}

/// User-facing denial message.
///
/// With a reason: `Permission denied: <reason>`. Without one, a message
/// naming the capability is synthesized.
pub fn format_denial(kind: CapabilityKind, name: &str, reason: Option<&str>) -> String {
    match reason {
        Some(reason) => format!("Permission denied: {}", reason),
        None => format!(
            "Permission denied: {} '{}' is not enabled in the current configuration.",
            kind.label(),
            name
        ),
    }
}

fn capability_allowed(doc: &PolicyDocument, kind: CapabilityKind, name: &str) -> bool {
    !name.is_empty() && doc.allowed(kind).matches(name)
}

fn path_denied(doc: &PolicyDocument, path: &str) -> bool {
    if path.is_empty() {
        return false;
    }
    let denied = &doc.resource_deny_rules.denied_paths;
    let normalized = path.replace('\\', "/");
    denied.matches(&normalized) || denied.matches(path)
}

fn not_allowed_reason(kind: CapabilityKind, name: &str) -> String {
    format!("{} '{}' is not in the allowed list", kind.label(), name)
}

fn log_denial(doc: &PolicyDocument, kind: CapabilityKind, name: &str, reason: &str) {
    if doc.global_settings.log_denials {
        tracing::warn!(kind = %kind, name = %name, reason = %reason, "permission denied");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate(yaml: &str) -> CapabilityGate {
        let doc = PolicyDocument::from_yaml(yaml).unwrap();
        CapabilityGate::new(Arc::new(PolicyStore::with_document(doc)))
    }

    #[test]
    fn test_wildcard_allow() {
        let gate = gate("tools:\n  allowed: [\"file_*\"]\n");
        assert!(gate.is_allowed(CapabilityKind::Tool, "file_read"));
        assert!(!gate.is_allowed(CapabilityKind::Tool, "run_bash"));
    }

    #[test]
    fn test_kinds_are_independent() {
        let gate = gate("tools:\n  allowed: [\"shared\"]\nskills:\n  allowed: [\"weather\"]\n");
        assert!(gate.is_allowed(CapabilityKind::Tool, "shared"));
        assert!(!gate.is_allowed(CapabilityKind::Skill, "shared"));
        assert!(gate.is_allowed(CapabilityKind::Skill, "weather"));
        assert!(!gate.is_allowed(CapabilityKind::Mcp, "weather"));
    }

    #[test]
    fn test_empty_name_always_denied() {
        let gate = gate("tools:\n  allowed: [\"*\"]\n");
        assert!(gate.is_allowed(CapabilityKind::Tool, "anything"));
        assert!(!gate.is_allowed(CapabilityKind::Tool, ""));
    }

    #[test]
    fn test_deny_all_document_denies_everything() {
        let gate = CapabilityGate::new(Arc::new(PolicyStore::with_document(
            PolicyDocument::deny_all(),
        )));
        for name in ["read_file", "run_bash", "*", ""] {
            assert!(!gate.is_allowed(CapabilityKind::Tool, name));
            assert!(!gate.is_allowed(CapabilityKind::Skill, name));
            assert!(!gate.is_allowed(CapabilityKind::Mcp, name));
        }
    }

    #[test]
    fn test_resource_deny_overrides_allowed_tool() {
        let gate = gate("tools:\n  allowed: [\"read_file\"]\nresources:\n  denied_paths: [\"*/.ssh/*\", \"*.env\"]\n");

        let check = gate.check_permission(CapabilityKind::Tool, "read_file", Some("/home/me/.ssh/id_rsa"));
        assert!(!check.allowed);
        assert_eq!(
            check.reason.as_deref(),
            Some("Resource path '/home/me/.ssh/id_rsa' is denied")
        );

        let check = gate.check_permission(CapabilityKind::Tool, "read_file", Some("app/.env"));
        assert!(!check.allowed);

        let check = gate.check_permission(CapabilityKind::Tool, "read_file", Some("notes.txt"));
        assert!(check.allowed);
        assert!(check.reason.is_none());
    }

    #[test]
    fn test_capability_denial_reported_before_path() {
        let gate = gate("resources:\n  denied_paths: [\"*\"]\n");
        let check = gate.check_permission(CapabilityKind::Tool, "write_file", Some("x"));
        assert!(!check.allowed);
        assert_eq!(
            check.reason.as_deref(),
            Some("Tool 'write_file' is not in the allowed list")
        );

        let check = gate.check_permission(CapabilityKind::Mcp, "github", None);
        assert_eq!(check.reason.as_deref(), Some("MCP 'github' is not in the allowed list"));
    }

    #[test]
    fn test_path_denial_tries_both_separators() {
        let gate = gate(
            "resources:\n  denied_paths: [\"C:/Users/*/secrets*\", \"*\\\\.aws\\\\*\"]\n",
        );
        assert!(gate.is_resource_denied("C:\\Users\\bob\\secrets.txt"));
        assert!(gate.is_resource_denied("C:/Users/bob/secrets.txt"));
        assert!(gate.is_resource_denied("D:\\home\\.aws\\credentials"));
        assert!(!gate.is_resource_denied("C:\\Users\\bob\\notes.txt"));
        assert!(!gate.is_resource_denied(""));
    }

    #[test]
    fn test_unknown_kind_string_is_denied() {
        let gate = gate("tools:\n  allowed: [\"*\"]\n");
        let check = gate.check_permission_str("plugin", "anything", None);
        assert!(!check.allowed);
        assert_eq!(check.reason.as_deref(), Some("Unknown capability type: plugin"));

        assert!(gate.check_permission_str("tool", "anything", None).allowed);
    }

    #[test]
    fn test_format_denial() {
        let gate = gate("version: \"1\"\n");
        assert_eq!(
            gate.format_denial(CapabilityKind::Skill, "weather", None),
            "Permission denied: Skill 'weather' is not enabled in the current configuration."
        );
        assert_eq!(
            gate.format_denial(CapabilityKind::Tool, "run_bash", Some("Resource path 'x' is denied")),
            "Permission denied: Resource path 'x' is denied"
        );
    }

    #[test]
    fn test_restrictions_are_exact_lookup() {
        let gate = gate(
            "tools:\n  allowed: [\"run_*\"]\n  restrictions:\n    run_bash:\n      timeout_max: 10\n",
        );
        assert_eq!(gate.restrictions_for("run_bash").unwrap().timeout_max, Some(10));
        assert!(gate.restrictions_for("run_*").is_none());
        assert!(gate.restrictions_for("run_powershell").is_none());
    }

    #[test]
    fn test_mcp_settings_lookup() {
        let gate = gate(
            "mcps:\n  allowed: [\"github\"]\n  settings:\n    github:\n      allowed_repos: [\"acme/*\"]\n",
        );
        let settings = gate.mcp_settings("github").unwrap();
        assert!(settings.allowed_repos.matches("acme/widgets"));
        assert!(settings.allowed_paths.is_empty());
        assert!(gate.mcp_settings("gitlab").is_none());
    }

    #[test]
    fn test_list_allowed() {
        let gate = gate("tools:\n  allowed: [\"a\", \"b*\"]\nmcps:\n  allowed: [\"fs\"]\n");
        let listed = gate.list_allowed();
        assert_eq!(listed.tools, vec!["a".to_string(), "b*".to_string()]);
        assert!(listed.skills.is_empty());
        assert_eq!(listed.mcps, vec!["fs".to_string()]);
    }

    #[test]
    fn test_log_denials_does_not_change_outcome() {
        let quiet = gate("settings:\n  log_denials: false\ntools:\n  allowed: [\"x\"]\n");
        let loud = gate("settings:\n  log_denials: true\ntools:\n  allowed: [\"x\"]\n");
        for name in ["x", "y"] {
            assert_eq!(
                quiet.is_allowed(CapabilityKind::Tool, name),
                loud.is_allowed(CapabilityKind::Tool, name)
            );
        }
    }
}

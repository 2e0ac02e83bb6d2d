//! The parsed permission configuration.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::pattern::PatternSet;
use super::PolicyError;

/// The class of capability being checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityKind {
    Tool,
    Skill,
    Mcp,
}

impl CapabilityKind {
    /// Label used in user-facing denial messages ("Tool", "Skill", "MCP").
    pub fn label(&self) -> &'static str {
        match self {
            CapabilityKind::Tool => "Tool",
            CapabilityKind::Skill => "Skill",
            CapabilityKind::Mcp => "MCP",
        }
    }
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapabilityKind::Tool => write!(f, "tool"),
            CapabilityKind::Skill => write!(f, "skill"),
            CapabilityKind::Mcp => write!(f, "mcp"),
        }
    }
}

impl FromStr for CapabilityKind {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tool" => Ok(CapabilityKind::Tool),
            "skill" => Ok(CapabilityKind::Skill),
            "mcp" => Ok(CapabilityKind::Mcp),
            other => Err(PolicyError::UnknownKind(other.to_string())),
        }
    }
}

/// Global switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalSettings {
    /// Always true once a document is constructed. Anything not matched by an
    /// allow pattern is denied.
    pub default_deny: bool,
    /// Emit a warning log line for every denial. Never affects the decision.
    pub log_denials: bool,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            default_deny: true,
            log_denials: true,
        }
    }
}

/// Per-tool restrictions, keyed by exact tool name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolRestriction {
    /// When non-empty, shell commands must match one of these.
    #[serde(rename = "allowed_commands")]
    pub allowed_command_patterns: PatternSet,
    /// Shell commands matching any of these are refused.
    #[serde(rename = "blocked_commands")]
    pub blocked_command_patterns: PatternSet,
    /// When non-empty, any path the tool touches must match one of these.
    pub allowed_paths: PatternSet,
    /// Upper bound on a subprocess timeout, in seconds.
    pub timeout_max: Option<u64>,
}

impl ToolRestriction {
    /// Check a shell command against the allow/block command patterns.
    ///
    /// Returns the denial reason on failure.
    pub fn check_command(&self, command: &str) -> Result<(), String> {
        if let Some(pattern) = self.blocked_command_patterns.first_match(command) {
            return Err(format!(
                "Command matches blocked pattern '{}'",
                pattern.as_str()
            ));
        }
        if !self.allowed_command_patterns.is_empty()
            && !self.allowed_command_patterns.matches(command)
        {
            return Err("Command does not match any allowed command pattern".to_string());
        }
        Ok(())
    }

    /// Check a resource path against `allowed_paths`.
    pub fn check_path(&self, path: &str) -> Result<(), String> {
        if self.allowed_paths.is_empty() {
            return Ok(());
        }
        let normalized = path.replace('\\', "/");
        if self.allowed_paths.matches(&normalized) || self.allowed_paths.matches(path) {
            Ok(())
        } else {
            Err(format!("Path '{}' is outside the tool's allowed paths", path))
        }
    }

    /// Clamp a requested timeout to `timeout_max`.
    pub fn clamp_timeout(&self, requested_secs: u64) -> u64 {
        match self.timeout_max {
            Some(max) => requested_secs.min(max),
            None => requested_secs,
        }
    }
}

/// Tool allow list plus per-tool restrictions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPolicy {
    pub allowed: PatternSet,
    pub restrictions: HashMap<String, ToolRestriction>,
}

/// Skill allow list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillPolicy {
    pub allowed: PatternSet,
}

/// Settings attached to a single MCP integration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct McpSettings {
    pub allowed_paths: PatternSet,
    pub allowed_repos: PatternSet,
}

/// MCP allow list plus per-integration settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct McpPolicy {
    pub allowed: PatternSet,
    pub settings: HashMap<String, McpSettings>,
}

/// Path patterns that are blocked no matter which capability touches them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceDenyRules {
    pub denied_paths: PatternSet,
}

/// An immutable, fully parsed permission configuration.
///
/// Documents are never edited in place. A reload parses a new document and
/// the store swaps it in as a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyDocument {
    pub version: String,
    #[serde(rename = "settings")]
    pub global_settings: GlobalSettings,
    #[serde(rename = "tools")]
    pub tool_policy: ToolPolicy,
    #[serde(rename = "skills")]
    pub skill_policy: SkillPolicy,
    #[serde(rename = "mcps")]
    pub mcp_policy: McpPolicy,
    #[serde(rename = "resources")]
    pub resource_deny_rules: ResourceDenyRules,
}

impl Default for PolicyDocument {
    fn default() -> Self {
        Self::deny_all()
    }
}

impl PolicyDocument {
    /// The maximally restrictive document: empty allow sets, default deny.
    pub fn deny_all() -> Self {
        Self {
            version: "1.0".to_string(),
            global_settings: GlobalSettings::default(),
            tool_policy: ToolPolicy::default(),
            skill_policy: SkillPolicy::default(),
            mcp_policy: McpPolicy::default(),
            resource_deny_rules: ResourceDenyRules::default(),
        }
    }

    /// Parse a YAML document.
    ///
    /// An empty document (or one holding only `null`) is an error, as is any
    /// structure that does not fit the schema.
    pub fn from_yaml(source: &str) -> Result<Self, PolicyError> {
        let value: serde_yaml::Value = serde_yaml::from_str(source)?;
        if value.is_null() {
            return Err(PolicyError::Empty);
        }
        let mut document: PolicyDocument = serde_yaml::from_value(value)?;
        if !document.global_settings.default_deny {
            tracing::warn!("policy sets default_deny: false; ignoring, default deny always applies");
            document.global_settings.default_deny = true;
        }
        Ok(document)
    }

    /// The allow list for a capability kind.
    pub fn allowed(&self, kind: CapabilityKind) -> &PatternSet {
        match kind {
            CapabilityKind::Tool => &self.tool_policy.allowed,
            CapabilityKind::Skill => &self.skill_policy.allowed,
            CapabilityKind::Mcp => &self.mcp_policy.allowed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
version: "2.3"
settings:
  default_deny: true
  log_denials: false
tools:
  allowed: ["list_directory", "file_*"]
  restrictions:
    run_bash:
      allowed_commands: ["ls*", "echo *"]
      blocked_commands: ["*sudo*"]
      allowed_paths: ["/srv/*"]
      timeout_max: 60
skills:
  allowed: ["*"]
mcps:
  allowed: ["filesystem"]
  settings:
    filesystem:
      allowed_paths: ["/data/*"]
      allowed_repos: ["org/*"]
resources:
  denied_paths: ["*/.ssh/*", "*.env"]
"#;

    #[test]
    fn test_parse_full_document() {
        let doc = PolicyDocument::from_yaml(FULL).unwrap();
        assert_eq!(doc.version, "2.3");
        assert!(!doc.global_settings.log_denials);
        assert_eq!(doc.tool_policy.allowed.len(), 2);
        assert_eq!(doc.skill_policy.allowed.sources(), vec!["*"]);
        assert_eq!(doc.resource_deny_rules.denied_paths.len(), 2);

        let restriction = doc.tool_policy.restrictions.get("run_bash").unwrap();
        assert_eq!(restriction.timeout_max, Some(60));
        assert_eq!(restriction.allowed_command_patterns.len(), 2);

        let fs = doc.mcp_policy.settings.get("filesystem").unwrap();
        assert!(fs.allowed_repos.matches("org/repo"));
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        let doc = PolicyDocument::from_yaml("version: \"1.0\"\n").unwrap();
        assert!(doc.tool_policy.allowed.is_empty());
        assert!(doc.skill_policy.allowed.is_empty());
        assert!(doc.mcp_policy.allowed.is_empty());
        assert!(doc.resource_deny_rules.denied_paths.is_empty());
        assert!(doc.global_settings.default_deny);
        assert!(doc.global_settings.log_denials);
    }

    #[test]
    fn test_empty_document_is_error() {
        assert!(matches!(PolicyDocument::from_yaml(""), Err(PolicyError::Empty)));
        assert!(matches!(PolicyDocument::from_yaml("~\n"), Err(PolicyError::Empty)));
    }

    #[test]
    fn test_malformed_document_is_error() {
        let result = PolicyDocument::from_yaml("tools:\n  allowed: [unclosed\n");
        assert!(matches!(result, Err(PolicyError::Parse(_))));

        let result = PolicyDocument::from_yaml("tools: 42\n");
        assert!(matches!(result, Err(PolicyError::Parse(_))));
    }

    #[test]
    fn test_default_deny_cannot_be_disabled() {
        let doc = PolicyDocument::from_yaml("settings:\n  default_deny: false\n").unwrap();
        assert!(doc.global_settings.default_deny);
        assert!(doc.tool_policy.allowed.is_empty());
    }

    #[test]
    fn test_deny_all_is_empty() {
        let doc = PolicyDocument::deny_all();
        for kind in [CapabilityKind::Tool, CapabilityKind::Skill, CapabilityKind::Mcp] {
            assert!(doc.allowed(kind).is_empty());
        }
        assert!(doc.global_settings.default_deny);
    }

    #[test]
    fn test_restriction_command_checks() {
        let doc = PolicyDocument::from_yaml(FULL).unwrap();
        let r = &doc.tool_policy.restrictions["run_bash"];
        assert!(r.check_command("ls -la").is_ok());
        assert!(r.check_command("echo hi").is_ok());
        assert!(r.check_command("cat /etc/hosts").is_err());
        let err = r.check_command("ls; sudo reboot").unwrap_err();
        assert!(err.contains("*sudo*"));
    }

    #[test]
    fn test_restriction_path_and_timeout() {
        let doc = PolicyDocument::from_yaml(FULL).unwrap();
        let r = &doc.tool_policy.restrictions["run_bash"];
        assert!(r.check_path("/srv/app").is_ok());
        assert!(r.check_path("/home/user").is_err());
        assert_eq!(r.clamp_timeout(30), 30);
        assert_eq!(r.clamp_timeout(300), 60);

        let unrestricted = ToolRestriction::default();
        assert!(unrestricted.check_path("/anywhere").is_ok());
        assert!(unrestricted.check_command("anything").is_ok());
        assert_eq!(unrestricted.clamp_timeout(300), 300);
    }

    #[test]
    fn test_capability_kind_parse_and_display() {
        assert_eq!("tool".parse::<CapabilityKind>().unwrap(), CapabilityKind::Tool);
        assert_eq!("mcp".parse::<CapabilityKind>().unwrap(), CapabilityKind::Mcp);
        assert!("plugin".parse::<CapabilityKind>().is_err());
        assert_eq!(CapabilityKind::Skill.to_string(), "skill");
        assert_eq!(CapabilityKind::Mcp.label(), "MCP");
    }
}

//! The fixed set of operations the executor knows how to perform.

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde_json::{json, Value};
use warden_core::policy::{CapabilityGate, CapabilityKind};
use warden_core::ToolDefinition;

use crate::filesystem::{ListDirectoryInput, ReadFileInput, WriteFileInput};
use crate::process::ShellInput;

/// One invocable operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    RunPowershell,
    RunBash,
    ReadFile,
    WriteFile,
    ListDirectory,
}

impl ToolKind {
    pub const ALL: [ToolKind; 5] = [
        ToolKind::RunPowershell,
        ToolKind::RunBash,
        ToolKind::ReadFile,
        ToolKind::WriteFile,
        ToolKind::ListDirectory,
    ];

    /// The name the model uses to request this tool.
    pub fn name(self) -> &'static str {
        match self {
            ToolKind::RunPowershell => "run_powershell",
            ToolKind::RunBash => "run_bash",
            ToolKind::ReadFile => "read_file",
            ToolKind::WriteFile => "write_file",
            ToolKind::ListDirectory => "list_directory",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ToolKind::RunPowershell => {
                "Execute a PowerShell command on the system. Use this for system administration \
                 tasks, file operations, getting system information, or running scripts. Returns \
                 the command output (stdout) and any errors (stderr)."
            }
            ToolKind::RunBash => {
                "Execute a Bash command on the system. Use this for Unix-like operations on \
                 Linux/macOS or Git Bash on Windows. Returns the command output (stdout) and any \
                 errors (stderr)."
            }
            ToolKind::ReadFile => "Read the contents of a file from the filesystem.",
            ToolKind::WriteFile => {
                "Write content to a file on the filesystem. Creates the file if it doesn't exist, \
                 or overwrites it if it does."
            }
            ToolKind::ListDirectory => "List the contents of a directory.",
        }
    }

    /// Whether this tool runs a shell command.
    pub fn is_shell(self) -> bool {
        matches!(self, ToolKind::RunPowershell | ToolKind::RunBash)
    }

    /// JSON schema of the tool's parameters.
    pub fn input_schema(self) -> Value {
        match self {
            ToolKind::RunPowershell | ToolKind::RunBash => schema_of::<ShellInput>(),
            ToolKind::ReadFile => schema_of::<ReadFileInput>(),
            ToolKind::WriteFile => schema_of::<WriteFileInput>(),
            ToolKind::ListDirectory => schema_of::<ListDirectoryInput>(),
        }
    }

    pub fn definition(self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }
}

fn schema_of<T: JsonSchema>() -> Value {
    let schema = schemars::schema_for!(T);
    serde_json::to_value(schema).unwrap_or_else(|_| json!({"type": "object"}))
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ToolKind {
    type Err = String;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        ToolKind::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| format!("Unknown tool: {}", name))
    }
}

/// The tools an executor offers, in a stable order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCatalog {
    kinds: Vec<ToolKind>,
}

impl Default for ToolCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl ToolCatalog {
    /// Every built-in tool.
    pub fn standard() -> Self {
        Self {
            kinds: ToolKind::ALL.to_vec(),
        }
    }

    /// Only the given tools. Duplicates are dropped.
    pub fn with_kinds(kinds: impl IntoIterator<Item = ToolKind>) -> Self {
        let mut unique = Vec::new();
        for kind in kinds {
            if !unique.contains(&kind) {
                unique.push(kind);
            }
        }
        Self { kinds: unique }
    }

    pub fn kinds(&self) -> &[ToolKind] {
        &self.kinds
    }

    /// Look a tool up by the name the model used.
    ///
    /// A built-in tool left out of this catalog is not found.
    pub fn get(&self, name: &str) -> Option<ToolKind> {
        self.kinds.iter().copied().find(|kind| kind.name() == name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.kinds.iter().map(|kind| kind.name()).collect()
    }

    /// Schemas of every tool in the catalog.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.kinds.iter().map(|kind| kind.definition()).collect()
    }

    /// Schemas of the tools the gate's current policy allows.
    pub fn definitions_for(&self, gate: &CapabilityGate) -> Vec<ToolDefinition> {
        let doc = gate.snapshot();
        let allowed = doc.allowed(CapabilityKind::Tool);
        self.kinds
            .iter()
            .filter(|kind| allowed.matches(kind.name()))
            .map(|kind| kind.definition())
            .collect()
    }
}

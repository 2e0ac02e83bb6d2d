//! Locally loaded skills invoked inline with `@name`.
//!
//! A skill is a named callable that receives the raw user utterance and
//! returns text. Skills are admitted to a [`SkillRegistry`] only when the
//! policy allows them, and the permission is checked again at invocation.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::{ChildStdin, Command};

use crate::policy::{CapabilityGate, CapabilityKind};

/// Default time a script skill may run.
pub const DEFAULT_SKILL_TIMEOUT: Duration = Duration::from_secs(60);

/// Errors raised while invoking a skill.
#[derive(Debug, Error)]
pub enum SkillError {
    #[error("failed to run skill: {0}")]
    Io(#[from] std::io::Error),

    #[error("skill '{name}' exited with status {status:?}: {stderr}")]
    Failed {
        name: String,
        status: Option<i32>,
        stderr: String,
    },

    #[error("skill '{0}' timed out after {1:?}")]
    Timeout(String, Duration),

    #[error("{0}")]
    Custom(String),
}

/// A locally provided capability invoked with the raw utterance.
#[async_trait]
pub trait Skill: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    async fn invoke(&self, utterance: &str) -> Result<String, SkillError>;
}

/// The set of skills available to an agent, filtered by policy.
pub struct SkillRegistry {
    gate: CapabilityGate,
    skills: BTreeMap<String, Arc<dyn Skill>>,
}

impl SkillRegistry {
    pub fn new(gate: CapabilityGate) -> Self {
        Self {
            gate,
            skills: BTreeMap::new(),
        }
    }

    /// Add a skill if the policy allows it. Returns whether it was added.
    pub fn register(&mut self, skill: impl Skill + 'static) -> bool {
        self.register_arc(Arc::new(skill))
    }

    pub fn register_arc(&mut self, skill: Arc<dyn Skill>) -> bool {
        let name = skill.name().to_string();
        if !self.gate.is_allowed(CapabilityKind::Skill, &name) {
            tracing::info!(skill = %name, "skill blocked by permission policy");
            return false;
        }
        tracing::info!(skill = %name, "loaded skill");
        self.skills.insert(name, skill);
        true
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Skill>> {
        self.skills.get(name).cloned()
    }

    /// Registered skill names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.skills.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    /// The skill invoked inline by `utterance`, if any.
    ///
    /// The utterance must contain `@<name>` and the current policy must still
    /// allow the skill. When several allowed names match, the longest wins.
    pub fn find_invocation(&self, utterance: &str) -> Option<Arc<dyn Skill>> {
        self.skills
            .iter()
            .filter(|(name, _)| utterance.contains(&format!("@{}", name)))
            .filter(|(name, _)| self.gate.is_allowed(CapabilityKind::Skill, name))
            .max_by_key(|(name, _)| name.len())
            .map(|(_, skill)| Arc::clone(skill))
    }
}

impl std::fmt::Debug for SkillRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SkillRegistry")
            .field("skills", &self.names())
            .finish()
    }
}

/// A skill backed by an executable file.
///
/// The utterance is written to the process's stdin; its trimmed stdout is the
/// result. A non-zero exit status is an error.
#[derive(Debug, Clone)]
pub struct ScriptSkill {
    name: String,
    path: PathBuf,
    timeout: Duration,
}

impl ScriptSkill {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            timeout: DEFAULT_SKILL_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Skill for ScriptSkill {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, utterance: &str) -> Result<String, SkillError> {
        let mut child = Command::new(&self.path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        // Feeding stdin and collecting output share one deadline
        let stdin = child.stdin.take();
        let run = async move {
            let (written, output) =
                tokio::join!(feed_stdin(stdin, utterance), child.wait_with_output());
            written?;
            output
        };
        let output = tokio::time::timeout(self.timeout, run)
            .await
            .map_err(|_| SkillError::Timeout(self.name.clone(), self.timeout))??;

        if !output.status.success() {
            return Err(SkillError::Failed {
                name: self.name.clone(),
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Write `utterance` to the script and close its stdin. A script that exits
/// without reading closes the pipe early, which is not an error.
async fn feed_stdin(stdin: Option<ChildStdin>, utterance: &str) -> std::io::Result<()> {
    let Some(mut stdin) = stdin else {
        return Ok(());
    };
    match stdin.write_all(utterance.as_bytes()).await {
        Err(err) if err.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
}

/// Register every executable in `dir` as a [`ScriptSkill`] named after its
/// file stem. Files starting with `_` are skipped. Returns how many skills
/// were admitted.
pub fn load_script_skills(dir: &Path, registry: &mut SkillRegistry) -> usize {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::warn!(dir = %dir.display(), error = %err, "skills directory unavailable");
            return 0;
        }
    };

    let mut candidates: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| is_executable_file(path))
        .collect();
    candidates.sort();

    let mut loaded = 0;
    for path in candidates {
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if stem.starts_with('_') || stem.is_empty() {
            continue;
        }
        tracing::debug!(skill = %stem, path = %path.display(), "found skill script");
        if registry.register(ScriptSkill::new(stem, &path)) {
            loaded += 1;
        }
    }
    loaded
}

#[cfg(unix)]
fn is_executable_file(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| matches!(e.to_ascii_lowercase().as_str(), "exe" | "bat" | "cmd"))
            .unwrap_or(false)
}

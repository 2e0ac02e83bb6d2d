//! Capability policy enforcement.
//!
//! A [`PolicyDocument`] is parsed from a YAML file and held by a
//! [`PolicyStore`], which swaps whole documents in on reload. A
//! [`CapabilityGate`] answers allow/deny questions against whatever document
//! is current at call time, and a [`PolicyWatcher`] can drive reloads when the
//! file changes on disk.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use warden_core::policy::{CapabilityGate, CapabilityKind, PolicyDocument, PolicyStore};
//!
//! let doc = PolicyDocument::from_yaml("tools:\n  allowed: [\"file_*\"]\n").unwrap();
//! let gate = CapabilityGate::new(Arc::new(PolicyStore::with_document(doc)));
//!
//! assert!(gate.is_allowed(CapabilityKind::Tool, "file_read"));
//! assert!(!gate.is_allowed(CapabilityKind::Tool, "run_bash"));
//! ```
//!
//! # Semantics
//!
//! | Rule | Effect |
//! |------|--------|
//! | No matching allow pattern | Denied |
//! | Empty capability name | Denied |
//! | Path matches `resources.denied_paths` | Denied, even if the capability is allowed |
//! | Missing or malformed file at startup | Deny-all document |
//! | I/O fault during reload | Previous document kept |

mod document;
mod gate;
mod pattern;
mod store;
mod watcher;

pub use document::{
    CapabilityKind, GlobalSettings, McpPolicy, McpSettings, PolicyDocument, ResourceDenyRules,
    SkillPolicy, ToolPolicy, ToolRestriction,
};
pub use gate::{format_denial, AllowedCapabilities, CapabilityGate, PermissionCheck};
pub use pattern::{GlobPattern, PatternSet};
pub use store::PolicyStore;
#[cfg(feature = "watch")]
pub use watcher::FileWatcher;
pub use watcher::{NoopWatcher, PolicyWatcher, DEFAULT_DEBOUNCE};

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading or parsing a policy document.
///
/// These never escape [`PolicyStore`]; the store logs them and reports
/// failure as a boolean.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("policy file not found: {0}")]
    NotFound(PathBuf),

    #[error("policy document is empty")]
    Empty,

    #[error("failed to read policy file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed policy document: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("unknown capability type: {0}")]
    UnknownKind(String),
}

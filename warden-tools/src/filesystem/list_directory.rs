use serde_json::json;
use warden_core::ToolOutcome;

use super::io_failure;
use crate::prelude::*;

fn default_path() -> String {
    ".".to_string()
}

/// Input for listing directory contents
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct ListDirectoryInput {
    /// The path to the directory to list. Defaults to current directory.
    #[serde(default = "default_path")]
    pub path: String,

    /// Whether to include hidden files (starting with '.'). Defaults to false.
    #[serde(default)]
    pub include_hidden: bool,
}

/// Kind of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
    Unknown,
}

#[derive(Debug, Clone, Serialize)]
struct Entry {
    name: String,
    #[serde(rename = "type")]
    kind: EntryKind,
    size: Option<u64>,
}

/// List the entries of a directory, sorted by name.
///
/// Directories carry no size. An entry whose metadata cannot be read is
/// reported with kind `unknown`.
pub async fn list_directory(input: &ListDirectoryInput) -> ToolOutcome {
    let path = if input.path.is_empty() {
        "."
    } else {
        input.path.as_str()
    };
    tracing::info!(path = %path, include_hidden = input.include_hidden, "listing directory");

    let mut reader = match tokio::fs::read_dir(path).await {
        Ok(reader) => reader,
        Err(e) => return io_failure(&e, "Directory", path),
    };

    let mut entries = Vec::new();
    loop {
        let dir_entry = match reader.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => return io_failure(&e, "Directory", path),
        };
        let name = dir_entry.file_name().to_string_lossy().into_owned();
        if !input.include_hidden && name.starts_with('.') {
            continue;
        }

        // Follow symlinks so a link to a directory lists as a directory
        let entry = match tokio::fs::metadata(dir_entry.path()).await {
            Ok(meta) if meta.is_dir() => Entry {
                name,
                kind: EntryKind::Directory,
                size: None,
            },
            Ok(meta) => Entry {
                name,
                kind: EntryKind::File,
                size: Some(meta.len()),
            },
            Err(_) => Entry {
                name,
                kind: EntryKind::Unknown,
                size: None,
            },
        };
        entries.push(entry);
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));

    ToolOutcome::ok(json!({
        "entries": entries,
        "path": path,
        "count": entries.len(),
    }))
}

use serde_json::json;
use warden_core::{ToolErrorKind, ToolOutcome};

use super::{default_encoding, io_failure};
use crate::encoding::TextEncoding;
use crate::prelude::*;

/// Input for reading a file
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct ReadFileInput {
    /// The path to the file to read.
    pub path: String,

    /// The file encoding. Defaults to 'utf-8'.
    #[serde(default = "default_encoding")]
    pub encoding: String,
}

/// Read and decode a whole file.
pub async fn read_file(input: &ReadFileInput) -> ToolOutcome {
    if input.path.is_empty() {
        return ToolOutcome::failure(ToolErrorKind::InvalidInput, "No path provided");
    }
    let encoding: TextEncoding = match input.encoding.parse() {
        Ok(encoding) => encoding,
        Err(e) => return ToolOutcome::failure(ToolErrorKind::EncodingError, e.to_string()),
    };

    tracing::info!(path = %input.path, %encoding, "reading file");

    let bytes = match tokio::fs::read(&input.path).await {
        Ok(bytes) => bytes,
        Err(e) => return io_failure(&e, "File", &input.path),
    };

    match encoding.decode(&bytes) {
        Ok(content) => ToolOutcome::ok(json!({
            "content": content,
            "path": input.path,
            "size": content.chars().count(),
        })),
        Err(e) => ToolOutcome::failure(ToolErrorKind::EncodingError, e.to_string()),
    }
}

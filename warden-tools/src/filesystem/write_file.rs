use serde_json::json;
use warden_core::{ToolErrorKind, ToolOutcome};

use super::{default_encoding, io_failure};
use crate::encoding::TextEncoding;
use crate::prelude::*;

/// Input for writing a file
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct WriteFileInput {
    /// The path to the file to write.
    pub path: String,

    /// The content to write to the file.
    pub content: String,

    /// The file encoding. Defaults to 'utf-8'.
    #[serde(default = "default_encoding")]
    pub encoding: String,
}

/// Create or overwrite a file with the encoded content.
pub async fn write_file(input: &WriteFileInput) -> ToolOutcome {
    if input.path.is_empty() {
        return ToolOutcome::failure(ToolErrorKind::InvalidInput, "No path provided");
    }
    let encoding: TextEncoding = match input.encoding.parse() {
        Ok(encoding) => encoding,
        Err(e) => return ToolOutcome::failure(ToolErrorKind::EncodingError, e.to_string()),
    };
    let bytes = match encoding.encode(&input.content) {
        Ok(bytes) => bytes,
        Err(e) => return ToolOutcome::failure(ToolErrorKind::EncodingError, e.to_string()),
    };

    tracing::info!(path = %input.path, bytes = bytes.len(), "writing file");

    match tokio::fs::write(&input.path, &bytes).await {
        Ok(()) => ToolOutcome::ok(json!({
            "message": format!("Successfully wrote {} bytes to {}", bytes.len(), input.path),
            "path": input.path,
            "size": bytes.len(),
        })),
        Err(e) => io_failure(&e, "Parent directory", &input.path),
    }
}

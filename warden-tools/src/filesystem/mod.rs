//! File read, file write and directory listing.
//!
//! Each operation maps I/O failures onto distinct [`ToolErrorKind`]s so the
//! model can tell a missing file from a permission problem or a decode error.

mod list_directory;
mod read_file;
mod write_file;

pub use list_directory::{list_directory, ListDirectoryInput};
pub use read_file::{read_file, ReadFileInput};
pub use write_file::{write_file, WriteFileInput};

use std::io;

use warden_core::{ToolErrorKind, ToolOutcome};

fn default_encoding() -> String {
    "utf-8".to_string()
}

/// Outcome for an I/O error touching `path`. `missing` names the thing that
/// was not found, e.g. "File" or "Directory".
fn io_failure(err: &io::Error, missing: &str, path: &str) -> ToolOutcome {
    match err.kind() {
        io::ErrorKind::NotFound => {
            ToolOutcome::failure(ToolErrorKind::NotFound, format!("{} not found: {}", missing, path))
        }
        io::ErrorKind::PermissionDenied => ToolOutcome::failure(
            ToolErrorKind::PermissionDenied,
            format!("Permission denied: {}", path),
        ),
        _ => ToolOutcome::failure(ToolErrorKind::OsError, format!("OS error: {}", err)),
    }
}

//! Loading text and file arguments.

use std::io::Read;
use std::path::Path;

use tracing::debug;

use crate::api::Attachment;
use crate::error::{AppError, Result};

/// Path value that means standard input.
pub const STDIN_MARKER: &str = "-";

/// Resolve a text argument given inline or as a file.
///
/// The file wins when both are present. A file path of `-` reads stdin.
pub fn resolve_text(inline: Option<String>, file: Option<&Path>) -> Result<Option<String>> {
    resolve_text_from(inline, file, std::io::stdin())
}

fn resolve_text_from<R: Read>(
    inline: Option<String>,
    file: Option<&Path>,
    mut stdin: R,
) -> Result<Option<String>> {
    match file {
        Some(path) if path.as_os_str() == STDIN_MARKER => {
            let mut text = String::new();
            stdin.read_to_string(&mut text)?;
            debug!(bytes = text.len(), "Read text from stdin");
            Ok(Some(text))
        }
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|e| {
                AppError::input(format!("Could not read {}: {}", path.display(), e))
            })?;
            debug!(path = %path.display(), bytes = text.len(), "Read text from file");
            Ok(Some(text))
        }
        None => Ok(inline),
    }
}

/// Resolve a text argument that must be present and not blank.
pub fn require_text(inline: Option<String>, file: Option<&Path>, what: &str) -> Result<String> {
    match resolve_text(inline, file)? {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(AppError::input(format!("{} is required", what))),
    }
}

/// Read a file for upload.
pub fn load_attachment(path: &Path, content_type: Option<String>) -> Result<Attachment> {
    let data = std::fs::read(path)
        .map_err(|e| AppError::input(format!("Could not read {}: {}", path.display(), e)))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| AppError::input(format!("{} is not a file", path.display())))?;

    let attachment = Attachment::new(file_name, data);
    Ok(match content_type {
        Some(content_type) => attachment.with_content_type(content_type),
        None => attachment,
    })
}

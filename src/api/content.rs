//! Content normalization for request bodies.
//!
//! Confluence takes storage-format markup; Jira takes Atlassian Document
//! Format. Callers hand in free text and this module decides how to send it.

use serde_json::json;

use super::types::AtlassianDoc;

/// Markup ready to send as a Confluence storage body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePayload {
    /// The markup text.
    pub markup: String,
    /// Whether the input was wrapped in a paragraph.
    pub wrapped: bool,
}

/// Normalize free text into storage markup.
///
/// Text whose trimmed form starts with `<` is treated as markup and passed
/// through unchanged. Anything else, including the empty string, is wrapped
/// in a single `<p>` element.
pub fn normalize(text: &str) -> StoragePayload {
    if is_markup(text) {
        StoragePayload {
            markup: text.to_string(),
            wrapped: false,
        }
    } else {
        StoragePayload {
            markup: format!("<p>{}</p>", text),
            wrapped: true,
        }
    }
}

/// Whether `text` already looks like markup.
pub fn is_markup(text: &str) -> bool {
    text.trim_start().starts_with('<')
}

/// Wrap plain text in a one-paragraph ADF document.
///
/// Empty text yields an empty paragraph; ADF forbids empty text nodes.
pub fn adf_document(text: &str) -> AtlassianDoc {
    let paragraph = if text.is_empty() {
        json!({ "type": "paragraph", "content": [] })
    } else {
        json!({
            "type": "paragraph",
            "content": [{ "type": "text", "text": text }]
        })
    };

    AtlassianDoc {
        content: vec![paragraph],
        ..AtlassianDoc::default()
    }
}

//! Jira and Confluence wire types.
//!
//! These model only the parts of the REST responses the gateway reads.
//! Optional fields default so that a sparse but well-formed response still
//! decodes; a response missing a required field is a malformed response.

use serde::{Deserialize, Serialize};

/// The current authenticated user.
///
/// Returned by `GET /rest/api/3/myself`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    /// The user's account ID.
    pub account_id: String,
    /// The user's display name.
    pub display_name: String,
}

/// One page from `GET /rest/api/3/search/jql`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueSearchPage {
    /// The issues on this page.
    pub issues: Vec<Issue>,
    /// Token for the next page; absent on the last page.
    #[serde(default)]
    pub next_page_token: Option<String>,
    /// Explicit last-page marker.
    #[serde(default)]
    pub is_last: Option<bool>,
}

/// A Jira issue.
///
/// Returned by `GET /rest/api/3/issue/{issueKey}` or as part of search results.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    /// The issue ID.
    pub id: String,
    /// The issue key (e.g., "PROJ-123").
    pub key: String,
    /// The issue fields.
    pub fields: IssueFields,
    /// HTML-rendered fields, present with `expand=renderedFields`.
    #[serde(default)]
    pub rendered_fields: Option<RenderedFields>,
}

/// Issue fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssueFields {
    /// The issue summary/title.
    #[serde(default)]
    pub summary: Option<String>,
    /// The issue status.
    #[serde(default)]
    pub status: Option<Named>,
    /// The issue type (Bug, Story, Task, etc.).
    #[serde(default)]
    pub issuetype: Option<Named>,
    /// The issue priority.
    #[serde(default)]
    pub priority: Option<Named>,
    /// The issue assignee.
    #[serde(default)]
    pub assignee: Option<User>,
    /// The issue reporter.
    #[serde(default)]
    pub reporter: Option<User>,
    /// Labels attached to the issue.
    #[serde(default)]
    pub labels: Vec<String>,
    /// When the issue was created.
    #[serde(default)]
    pub created: Option<String>,
    /// When the issue was last updated.
    #[serde(default)]
    pub updated: Option<String>,
    /// The description in Atlassian Document Format.
    #[serde(default)]
    pub description: Option<serde_json::Value>,
    /// Embedded comments.
    #[serde(default)]
    pub comment: Option<CommentPage>,
}

/// HTML renderings of issue fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RenderedFields {
    /// The description as HTML.
    #[serde(default)]
    pub description: Option<String>,
}

/// Any `{ "name": ... }` reference: status, issue type, priority.
#[derive(Debug, Clone, Deserialize)]
pub struct Named {
    pub name: String,
}

/// A Jira user.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// The user's display name.
    pub display_name: String,
}

/// Comments embedded in an issue's fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentPage {
    #[serde(default)]
    pub comments: Vec<Comment>,
}

/// A comment on a Jira issue.
///
/// Also the response of `POST /rest/api/3/issue/{issueKey}/comment`.
#[derive(Debug, Clone, Deserialize)]
pub struct Comment {
    /// The comment ID.
    pub id: String,
    /// The comment body in Atlassian Document Format.
    #[serde(default)]
    pub body: Option<serde_json::Value>,
    /// The user who authored the comment.
    #[serde(default)]
    pub author: Option<User>,
    /// When the comment was created.
    #[serde(default)]
    pub created: Option<String>,
}

/// Response of `POST /rest/api/3/issue`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedIssue {
    pub id: String,
    pub key: String,
}

/// One item of the `POST /rest/api/3/issue/{key}/attachments` response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueAttachment {
    pub id: String,
    pub filename: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub mime_type: Option<String>,
}

/// Atlassian Document Format (ADF) content.
///
/// Jira uses ADF for rich text fields like descriptions and comments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtlassianDoc {
    /// The document type (always "doc" for root documents).
    #[serde(rename = "type")]
    pub doc_type: String,
    /// The document version (typically 1).
    #[serde(default)]
    pub version: Option<u32>,
    /// The content nodes within the document.
    #[serde(default)]
    pub content: Vec<serde_json::Value>,
}

impl AtlassianDoc {
    /// Convert ADF content to plain text.
    ///
    /// Text nodes are concatenated depth-first; block nodes end with a newline.
    pub fn to_plain_text(&self) -> String {
        let mut result = String::new();
        for node in &self.content {
            Self::extract_text(node, &mut result);
        }
        result.trim().to_string()
    }

    fn extract_text(node: &serde_json::Value, result: &mut String) {
        match node {
            serde_json::Value::Object(obj) => {
                match obj.get("type").and_then(|t| t.as_str()) {
                    Some("text") => {
                        if let Some(text) = obj.get("text").and_then(|t| t.as_str()) {
                            result.push_str(text);
                        }
                    }
                    Some("hardBreak") => result.push('\n'),
                    Some("mention") => {
                        if let Some(text) = obj
                            .get("attrs")
                            .and_then(|a| a.get("text"))
                            .and_then(|t| t.as_str())
                        {
                            result.push_str(text);
                        }
                    }
                    node_type => {
                        if let Some(serde_json::Value::Array(items)) = obj.get("content") {
                            for item in items {
                                Self::extract_text(item, result);
                            }
                        }
                        let is_block = matches!(
                            node_type,
                            Some("paragraph") | Some("heading") | Some("codeBlock")
                        );
                        if is_block && !result.is_empty() && !result.ends_with('\n') {
                            result.push('\n');
                        }
                    }
                }
            }
            serde_json::Value::Array(items) => {
                for item in items {
                    Self::extract_text(item, result);
                }
            }
            _ => {}
        }
    }
}

impl Default for AtlassianDoc {
    fn default() -> Self {
        Self {
            doc_type: "doc".to_string(),
            version: Some(1),
            content: vec![],
        }
    }
}

/// Plain text of an ADF value; falls back to a plain string value.
pub fn adf_value_to_text(value: &serde_json::Value) -> String {
    if let Ok(doc) = serde_json::from_value::<AtlassianDoc>(value.clone()) {
        doc.to_plain_text()
    } else if let Some(s) = value.as_str() {
        s.to_string()
    } else {
        String::new()
    }
}

/// A Confluence content item (page, comment, or attachment).
///
/// Returned by `GET /wiki/rest/api/content/{id}` and content creation.
#[derive(Debug, Clone, Deserialize)]
pub struct Content {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub space: Option<SpaceRef>,
    #[serde(default)]
    pub version: Option<Version>,
    #[serde(default)]
    pub body: Option<ContentBody>,
    #[serde(default)]
    pub extensions: Option<AttachmentExtensions>,
    #[serde(default, rename = "_links")]
    pub links: Option<Links>,
}

impl Content {
    /// The page body in storage format, or empty.
    pub fn storage_value(&self) -> &str {
        self.body
            .as_ref()
            .and_then(|b| b.storage.as_ref())
            .map(|s| s.value.as_str())
            .unwrap_or_default()
    }

    /// The `webui` link, or empty.
    pub fn webui(&self) -> &str {
        self.links
            .as_ref()
            .and_then(|l| l.webui.as_deref())
            .unwrap_or_default()
    }

    /// The space key, if the space was expanded.
    pub fn space_key(&self) -> Option<&str> {
        self.space.as_ref().map(|s| s.key.as_str())
    }

    /// The version number, if present.
    pub fn version_number(&self) -> Option<u32> {
        self.version.as_ref().map(|v| v.number)
    }
}

/// A Confluence space reference.
#[derive(Debug, Clone, Deserialize)]
pub struct SpaceRef {
    pub key: String,
}

/// A Confluence content version.
#[derive(Debug, Clone, Deserialize)]
pub struct Version {
    pub number: u32,
    #[serde(default)]
    pub when: Option<String>,
}

/// Expanded content body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentBody {
    #[serde(default)]
    pub storage: Option<Storage>,
}

/// Storage-format markup.
#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
    pub value: String,
}

/// Attachment metadata.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentExtensions {
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
}

/// Hypermedia links.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Links {
    #[serde(default)]
    pub webui: Option<String>,
    #[serde(default)]
    pub next: Option<String>,
}

/// A page of Confluence results.
///
/// Returned by `GET /wiki/rest/api/content/search`, `GET /wiki/rest/api/space`
/// and attachment uploads.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentPage<T> {
    pub results: Vec<T>,
    #[serde(default)]
    pub start: Option<u32>,
    #[serde(default)]
    pub size: Option<u32>,
    #[serde(default)]
    pub total_size: Option<u64>,
    #[serde(default, rename = "_links")]
    pub links: Option<Links>,
}

impl<T> ContentPage<T> {
    /// Whether the service advertised a next page.
    pub fn has_next_link(&self) -> bool {
        self.links.as_ref().and_then(|l| l.next.as_ref()).is_some()
    }
}

/// A Confluence space, as listed by `GET /wiki/rest/api/space`.
#[derive(Debug, Clone, Deserialize)]
pub struct Space {
    pub key: String,
}

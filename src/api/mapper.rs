//! Response mapping.
//!
//! Turns raw exchange outcomes into typed values or [`ApiError`]s, and wire
//! types into the result records printed to the caller.

use std::time::Duration;

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use super::auth::Credentials;
use super::error::{ApiError, Result};
use super::records::{
    AttachmentInfo, CommentReceipt, CommentView, IssueCreated, IssueDetail, IssueSummary,
    PageDetail, PageSummary,
};
use super::types::{adf_value_to_text, Comment, Content, CreatedIssue, Issue, IssueAttachment};

/// A successful raw response.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

/// Decode a successful response into the expected shape.
pub fn decode<T: DeserializeOwned>(raw: &RawResponse) -> Result<T> {
    serde_json::from_str(&raw.body)
        .map_err(|e| ApiError::MalformedResponse(format!("Failed to parse response: {}", e)))
}

/// Create an appropriate error from a failed HTTP response.
pub fn error_from_response(
    status: StatusCode,
    resource: &str,
    body: &str,
    retry_after: Option<Duration>,
) -> ApiError {
    let message = extract_message(body).unwrap_or_else(|| {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            status
                .canonical_reason()
                .unwrap_or("no response body")
                .to_string()
        } else {
            trimmed.to_string()
        }
    });
    ApiError::from_status(status, resource, &message, retry_after)
}

/// Pull the human-readable message out of a Jira or Confluence error body.
fn extract_message(body: &str) -> Option<String> {
    let json = serde_json::from_str::<serde_json::Value>(body).ok()?;

    // Jira: {"errorMessages": [...], "errors": {"field": "msg"}}
    let mut parts: Vec<String> = json
        .get("errorMessages")
        .and_then(|m| m.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    if let Some(errors) = json.get("errors").and_then(|e| e.as_object()) {
        parts.extend(errors.iter().map(|(k, v)| match v.as_str() {
            Some(s) => format!("{}: {}", k, s),
            None => format!("{}: {}", k, v),
        }));
    }

    if !parts.is_empty() {
        return Some(parts.join(", "));
    }

    // Confluence: {"statusCode": 400, "message": "..."}
    json.get("message")
        .and_then(|m| m.as_str())
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

/// Classify a transport failure.
pub fn error_from_transport(err: &reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout(err.to_string())
    } else {
        ApiError::Network {
            message: err.to_string(),
            pre_send: err.is_connect(),
        }
    }
}

/// Parse a `Retry-After` header given in seconds.
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// Search result row for an issue.
pub fn issue_summary(issue: &Issue, credentials: &Credentials) -> IssueSummary {
    let f = &issue.fields;
    IssueSummary {
        key: issue.key.clone(),
        summary: f.summary.clone(),
        status: f.status.as_ref().map(|s| s.name.clone()),
        priority: f.priority.as_ref().map(|p| p.name.clone()),
        issue_type: f.issuetype.as_ref().map(|t| t.name.clone()),
        assignee: f.assignee.as_ref().map(|u| u.display_name.clone()),
        labels: f.labels.clone(),
        updated: f.updated.clone(),
        url: credentials.browse_url(&issue.key),
    }
}

/// Full issue record, optionally with comments.
pub fn issue_detail(issue: &Issue, include_comments: bool, credentials: &Credentials) -> IssueDetail {
    let f = &issue.fields;
    let comments = include_comments.then(|| {
        f.comment
            .as_ref()
            .map(|page| page.comments.iter().map(comment_view).collect())
            .unwrap_or_default()
    });

    IssueDetail {
        key: issue.key.clone(),
        summary: f.summary.clone(),
        status: f.status.as_ref().map(|s| s.name.clone()),
        priority: f.priority.as_ref().map(|p| p.name.clone()),
        issue_type: f.issuetype.as_ref().map(|t| t.name.clone()),
        assignee: f.assignee.as_ref().map(|u| u.display_name.clone()),
        reporter: f.reporter.as_ref().map(|u| u.display_name.clone()),
        labels: f.labels.clone(),
        created: f.created.clone(),
        updated: f.updated.clone(),
        description_html: issue
            .rendered_fields
            .as_ref()
            .and_then(|r| r.description.clone())
            .or_else(|| f.description.as_ref().map(adf_value_to_text))
            .unwrap_or_default(),
        url: credentials.browse_url(&issue.key),
        comments,
    }
}

fn comment_view(comment: &Comment) -> CommentView {
    CommentView {
        author: comment.author.as_ref().map(|u| u.display_name.clone()),
        created: comment.created.clone(),
        body: comment
            .body
            .as_ref()
            .map(adf_value_to_text)
            .unwrap_or_default(),
    }
}

/// Receipt for a created issue.
pub fn issue_created(created: &CreatedIssue, credentials: &Credentials) -> IssueCreated {
    IssueCreated {
        key: created.key.clone(),
        id: created.id.clone(),
        url: credentials.browse_url(&created.key),
    }
}

/// Receipt for an issue comment.
pub fn issue_comment_receipt(comment: &Comment, issue_key: &str) -> CommentReceipt {
    CommentReceipt {
        id: comment.id.clone(),
        target: issue_key.to_string(),
        created: comment.created.clone(),
    }
}

/// Attachment info for a Jira upload.
pub fn issue_attachment(attachment: &IssueAttachment) -> AttachmentInfo {
    AttachmentInfo {
        id: attachment.id.clone(),
        file_name: attachment.filename.clone(),
        size: attachment.size,
        media_type: attachment.mime_type.clone(),
    }
}

/// Page reference, used for search rows and create/update receipts.
pub fn page_summary(page: &Content, credentials: &Credentials) -> PageSummary {
    PageSummary {
        id: page.id.clone(),
        title: page.title.clone(),
        space: page.space_key().map(str::to_string),
        version: page.version_number(),
        url: credentials.wiki_web_url(page.webui()),
    }
}

/// Full page record.
pub fn page_detail(page: &Content, credentials: &Credentials) -> PageDetail {
    PageDetail {
        id: page.id.clone(),
        title: page.title.clone(),
        space: page.space_key().map(str::to_string),
        version: page.version_number(),
        body_html: page.storage_value().to_string(),
        url: credentials.wiki_web_url(page.webui()),
    }
}

/// Receipt for a page comment.
pub fn page_comment_receipt(comment: &Content, page_id: &str) -> CommentReceipt {
    CommentReceipt {
        id: comment.id.clone(),
        target: page_id.to_string(),
        created: comment.version.as_ref().and_then(|v| v.when.clone()),
    }
}

/// Attachment info for a Confluence upload.
pub fn page_attachment(attachment: &Content) -> AttachmentInfo {
    let extensions = attachment.extensions.clone().unwrap_or_default();
    AttachmentInfo {
        id: attachment.id.clone(),
        file_name: attachment.title.clone().unwrap_or_default(),
        size: extensions.file_size,
        media_type: extensions.media_type,
    }
}

//! Result records returned by gateway operations.
//!
//! Every record serializes to a flat JSON object.

use serde::Serialize;

use super::error::ErrorReport;

/// The outcome of any successful operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Record {
    Connection(ConnectionStatus),
    IssueSearch(IssueSearch),
    IssueDetail(IssueDetail),
    IssueCreated(IssueCreated),
    PageSearch(PageSearch),
    PageDetail(PageDetail),
    PageSummary(PageSummary),
    Comment(CommentReceipt),
    Attachment(AttachmentReceipt),
}

impl Record {
    /// Whether the record reports complete success.
    ///
    /// Only a connection check can succeed as an exchange and still report
    /// a failed service.
    pub fn is_success(&self) -> bool {
        match self {
            Record::Connection(status) => status.all_connected(),
            _ => true,
        }
    }
}

macro_rules! impl_into_record {
    ($($ty:ident => $variant:ident),* $(,)?) => {
        $(impl From<$ty> for Record {
            fn from(value: $ty) -> Self {
                Record::$variant(value)
            }
        })*
    };
}

impl_into_record! {
    ConnectionStatus => Connection,
    IssueSearch => IssueSearch,
    IssueDetail => IssueDetail,
    IssueCreated => IssueCreated,
    PageSearch => PageSearch,
    PageDetail => PageDetail,
    PageSummary => PageSummary,
    CommentReceipt => Comment,
    AttachmentReceipt => Attachment,
}

/// Connectivity of both services.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionStatus {
    pub jira: ServiceStatus,
    pub confluence: ServiceStatus,
}

impl ConnectionStatus {
    pub fn all_connected(&self) -> bool {
        self.jira.connected && self.confluence.connected
    }
}

/// Connectivity of one service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceStatus {
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorReport>,
}

/// One issue in search results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueSummary {
    pub key: String,
    pub summary: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    #[serde(rename = "type")]
    pub issue_type: Option<String>,
    pub assignee: Option<String>,
    pub labels: Vec<String>,
    pub updated: Option<String>,
    pub url: String,
}

/// Issue search results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueSearch {
    pub total: usize,
    pub issues: Vec<IssueSummary>,
}

/// A single issue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueDetail {
    pub key: String,
    pub summary: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    #[serde(rename = "type")]
    pub issue_type: Option<String>,
    pub assignee: Option<String>,
    pub reporter: Option<String>,
    pub labels: Vec<String>,
    pub created: Option<String>,
    pub updated: Option<String>,
    pub description_html: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<CommentView>>,
}

/// A comment flattened to plain text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentView {
    pub author: Option<String>,
    pub created: Option<String>,
    pub body: String,
}

/// A newly created issue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueCreated {
    pub key: String,
    pub id: String,
    pub url: String,
}

/// A page reference; also the receipt for page create and update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageSummary {
    pub id: String,
    pub title: Option<String>,
    pub space: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    pub url: String,
}

/// Page search results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageSearch {
    pub total: u64,
    pub pages: Vec<PageSummary>,
}

/// A single page with its body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageDetail {
    pub id: String,
    pub title: Option<String>,
    pub space: Option<String>,
    pub version: Option<u32>,
    pub body_html: String,
    pub url: String,
}

/// A newly added comment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentReceipt {
    pub id: String,
    /// The issue key or page ID commented on.
    pub target: String,
    pub created: Option<String>,
}

/// Uploaded attachments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttachmentReceipt {
    /// The issue key or page ID attached to.
    pub target: String,
    pub attachments: Vec<AttachmentInfo>,
}

/// One uploaded file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttachmentInfo {
    pub id: String,
    pub file_name: String,
    pub size: Option<u64>,
    pub media_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::error::ErrorKind;

    #[test]
    fn test_record_serializes_flat() {
        let record: Record = IssueCreated {
            key: "RFID-7".into(),
            id: "10007".into(),
            url: "https://x/browse/RFID-7".into(),
        }
        .into();
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            serde_json::json!({
                "key": "RFID-7",
                "id": "10007",
                "url": "https://x/browse/RFID-7"
            })
        );
    }

    #[test]
    fn test_issue_type_field_renamed() {
        let summary = IssueSummary {
            key: "P-1".into(),
            summary: None,
            status: None,
            priority: None,
            issue_type: Some("Bug".into()),
            assignee: None,
            labels: vec![],
            updated: None,
            url: "u".into(),
        };
        let value = serde_json::to_value(summary).unwrap();
        assert_eq!(value["type"], "Bug");
    }

    #[test]
    fn test_connection_failure_is_not_success() {
        let ok = ServiceStatus {
            connected: true,
            user: Some("Ann".into()),
            error: None,
        };
        let failed = ServiceStatus {
            connected: false,
            user: None,
            error: Some(ErrorReport {
                kind: ErrorKind::AuthenticationFailed,
                status: Some(401),
                message: "nope".into(),
                retry_after_secs: None,
                hint: None,
            }),
        };

        let all_ok = Record::from(ConnectionStatus {
            jira: ok.clone(),
            confluence: ok.clone(),
        });
        assert!(all_ok.is_success());

        let partial = Record::from(ConnectionStatus {
            jira: ok,
            confluence: failed,
        });
        assert!(!partial.is_success());
    }
}

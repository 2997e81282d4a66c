//! Jira and Confluence operations.
//!
//! Each operation builds request descriptors, hands them to the
//! [`Executor`] and maps the result. Retry and authentication live in the
//! executor; nothing here sleeps or inspects status codes.

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, error, info, instrument};

use super::auth::Credentials;
use super::content::{adf_document, normalize};
use super::error::{ApiError, Result};
use super::executor::Executor;
use super::mapper;
use super::pagination::{Cursor, Page, PageSource, PageToken};
use super::records::{
    AttachmentReceipt, CommentReceipt, ConnectionStatus, IssueCreated, IssueDetail, IssueSearch,
    PageDetail, PageSearch, PageSummary, ServiceStatus,
};
use super::request::{Attachment, RequestDescriptor};
use super::types::{
    Comment, Content, ContentPage, CreatedIssue, CurrentUser, Issue, IssueAttachment,
    IssueSearchPage, Space,
};
use crate::config::Settings;

/// Issue type used when none is given.
pub const DEFAULT_ISSUE_TYPE: &str = "Task";

/// Fields requested for issue search rows.
const SEARCH_FIELDS: &[&str] = &[
    "summary", "status", "assignee", "reporter", "priority", "issuetype", "created", "updated",
    "labels",
];

/// Expansion used when fetching a page.
const PAGE_EXPAND: &str = "body.storage,version,space";

/// A new Jira issue.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewIssue {
    pub project_key: String,
    pub summary: String,
    /// Defaults to [`DEFAULT_ISSUE_TYPE`].
    pub issue_type: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub labels: Vec<String>,
    pub assignee_account_id: Option<String>,
}

impl NewIssue {
    /// Create an issue request with the required fields.
    pub fn new(project_key: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            project_key: project_key.into(),
            summary: summary.into(),
            ..Self::default()
        }
    }

    /// The `fields` object of the create request.
    pub fn fields_payload(&self) -> serde_json::Value {
        let mut fields = json!({
            "project": { "key": self.project_key },
            "summary": self.summary,
            "issuetype": {
                "name": self.issue_type.as_deref().unwrap_or(DEFAULT_ISSUE_TYPE)
            },
        });

        if let Some(description) = &self.description {
            fields["description"] = json!(adf_document(description));
        }
        if let Some(priority) = &self.priority {
            fields["priority"] = json!({ "name": priority });
        }
        if !self.labels.is_empty() {
            fields["labels"] = json!(self.labels);
        }
        if let Some(account_id) = &self.assignee_account_id {
            fields["assignee"] = json!({ "accountId": account_id });
        }

        fields
    }
}

/// A new Confluence page.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPage {
    pub space_key: String,
    pub title: String,
    /// Markup or plain text; plain text is wrapped in a paragraph.
    pub body: String,
    pub parent_id: Option<String>,
}

/// Build the CQL for a page search.
///
/// Queries containing CQL operators are used as-is; anything else becomes
/// a full-text match.
pub fn build_cql(query: &str, space_key: Option<&str>) -> String {
    let mut parts = vec![r#"type = "page""#.to_string()];

    if let Some(space) = space_key {
        parts.push(format!(r#"space = "{}""#, escape_cql(space)));
    }

    let is_raw_cql = ["=", "~", "AND", "OR", "IN"]
        .iter()
        .any(|op| query.contains(op));
    if is_raw_cql {
        parts.push(format!("({})", query));
    } else {
        parts.push(format!(r#"text ~ "{}""#, escape_cql(query)));
    }

    parts.join(" AND ")
}

fn escape_cql(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn encode(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

/// The Jira and Confluence client.
#[derive(Debug)]
pub struct AtlassianClient {
    executor: Executor,
    page_size: u32,
}

impl AtlassianClient {
    /// Create a client from credentials and settings.
    ///
    /// Does not touch the network.
    pub fn new(credentials: Credentials, settings: &Settings) -> Result<Self> {
        let executor = Executor::new(credentials, &settings.http)?;
        Ok(Self::from_executor(executor, settings.search.page_size))
    }

    /// Create a client around an existing executor.
    pub fn from_executor(executor: Executor, page_size: u32) -> Self {
        Self {
            executor,
            page_size,
        }
    }

    /// The credentials in use.
    pub fn credentials(&self) -> &Credentials {
        self.executor.credentials()
    }

    /// Check connectivity to both services.
    ///
    /// Failures are reported per service in the result rather than as an error.
    #[instrument(skip(self))]
    pub async fn test_connection(&self) -> ConnectionStatus {
        let jira = match self.current_user().await {
            Ok(user) => {
                info!("Connected to Jira as {}", user.display_name);
                ServiceStatus {
                    connected: true,
                    user: Some(user.display_name),
                    error: None,
                }
            }
            Err(e) => {
                error!("Jira connection check failed: {}", e);
                ServiceStatus {
                    connected: false,
                    user: None,
                    error: Some(e.report()),
                }
            }
        };

        let url = self.credentials().wiki_url("/space");
        let request = RequestDescriptor::get(url, "spaces").query("limit", "1");
        let confluence = match self.executor.execute_json::<ContentPage<Space>>(&request).await {
            Ok(_) => ServiceStatus {
                connected: true,
                user: None,
                error: None,
            },
            Err(e) => {
                error!("Confluence connection check failed: {}", e);
                ServiceStatus {
                    connected: false,
                    user: None,
                    error: Some(e.report()),
                }
            }
        };

        ConnectionStatus { jira, confluence }
    }

    /// Get the current authenticated user.
    ///
    /// Calls `GET /rest/api/3/myself`.
    #[instrument(skip(self))]
    pub async fn current_user(&self) -> Result<CurrentUser> {
        let request = RequestDescriptor::get(self.credentials().jira_url("/myself"), "myself");
        self.executor.execute_json(&request).await
    }

    /// Search for issues using JQL.
    ///
    /// Follows `nextPageToken` until `max_results` issues are collected or
    /// the results run out.
    #[instrument(skip(self, jql), fields(jql = %jql))]
    pub async fn search_issues(&self, jql: &str, max_results: usize) -> Result<IssueSearch> {
        let source = IssueSearchPages {
            executor: &self.executor,
            jql,
        };
        let issues = Cursor::new(source, self.page_size)
            .with_max_items(max_results)
            .collect_all()
            .await?;

        debug!("Found {} issues", issues.len());
        let issues: Vec<_> = issues
            .iter()
            .map(|issue| mapper::issue_summary(issue, self.credentials()))
            .collect();

        Ok(IssueSearch {
            total: issues.len(),
            issues,
        })
    }

    /// Get a single issue by key.
    #[instrument(skip(self, key), fields(issue_key = %key))]
    pub async fn get_issue(&self, key: &str, include_comments: bool) -> Result<IssueDetail> {
        let url = self.credentials().jira_url(&format!("/issue/{}", encode(key)));
        let request = RequestDescriptor::get(url, key).query("expand", "renderedFields");

        let issue: Issue = self.executor.execute_json(&request).await?;
        debug!("Fetched issue: {}", issue.key);
        Ok(mapper::issue_detail(&issue, include_comments, self.credentials()))
    }

    /// Create an issue.
    #[instrument(skip(self, issue), fields(project = %issue.project_key))]
    pub async fn create_issue(&self, issue: &NewIssue) -> Result<IssueCreated> {
        let url = self.credentials().jira_url("/issue");
        let request = RequestDescriptor::post(url, &issue.project_key)
            .json(json!({ "fields": issue.fields_payload() }));

        let created: CreatedIssue = self.executor.execute_json(&request).await?;
        info!("Created issue {}", created.key);
        Ok(mapper::issue_created(&created, self.credentials()))
    }

    /// Add a plain-text comment to an issue.
    #[instrument(skip(self, key, text), fields(issue_key = %key))]
    pub async fn add_issue_comment(&self, key: &str, text: &str) -> Result<CommentReceipt> {
        let url = self.credentials().jira_url(&format!("/issue/{}/comment", encode(key)));
        let request = RequestDescriptor::post(url, key).json(json!({ "body": adf_document(text) }));

        let comment: Comment = self.executor.execute_json(&request).await?;
        Ok(mapper::issue_comment_receipt(&comment, key))
    }

    /// Upload a file to an issue.
    #[instrument(skip(self, key, attachment), fields(issue_key = %key, file = %attachment.file_name))]
    pub async fn attach_to_issue(
        &self,
        key: &str,
        attachment: Attachment,
    ) -> Result<AttachmentReceipt> {
        let url = self.credentials().jira_url(&format!("/issue/{}/attachments", encode(key)));
        let request = RequestDescriptor::post(url, key).file(attachment);

        let uploaded: Vec<IssueAttachment> = self.executor.execute_json(&request).await?;
        Ok(AttachmentReceipt {
            target: key.to_string(),
            attachments: uploaded.iter().map(mapper::issue_attachment).collect(),
        })
    }

    /// Search Confluence pages.
    #[instrument(skip(self))]
    pub async fn search_pages(
        &self,
        query: &str,
        space_key: Option<&str>,
        max_results: usize,
    ) -> Result<PageSearch> {
        let source = PageSearchPages {
            executor: &self.executor,
            cql: build_cql(query, space_key),
        };
        debug!(cql = %source.cql, "Searching pages");

        let mut cursor = Cursor::new(source, self.page_size).with_max_items(max_results);
        let mut pages = Vec::new();
        while let Some(batch) = cursor.next_batch().await? {
            pages.extend(batch.iter().map(|page| mapper::page_summary(page, self.credentials())));
        }

        Ok(PageSearch {
            total: cursor.total().unwrap_or(pages.len() as u64),
            pages,
        })
    }

    /// Get a page with its storage body.
    #[instrument(skip(self, page_id), fields(page_id = %page_id))]
    pub async fn get_page(&self, page_id: &str) -> Result<PageDetail> {
        let page = self.fetch_page(page_id, PAGE_EXPAND).await?;
        Ok(mapper::page_detail(&page, self.credentials()))
    }

    async fn fetch_page(&self, page_id: &str, expand: &str) -> Result<Content> {
        let url = self.credentials().wiki_url(&format!("/content/{}", encode(page_id)));
        let request = RequestDescriptor::get(url, page_id).query("expand", expand);
        self.executor.execute_json(&request).await
    }

    /// Create a page.
    #[instrument(skip(self, page), fields(space = %page.space_key, title = %page.title))]
    pub async fn create_page(&self, page: &NewPage) -> Result<PageSummary> {
        let mut payload = json!({
            "type": "page",
            "title": page.title,
            "space": { "key": page.space_key },
            "body": storage_body(&page.body),
        });
        if let Some(parent_id) = &page.parent_id {
            payload["ancestors"] = json!([{ "id": parent_id }]);
        }

        let url = self.credentials().wiki_url("/content");
        let request = RequestDescriptor::post(url, &page.title).json(payload);
        let created: Content = self.executor.execute_json(&request).await?;
        info!("Created page {}", created.id);
        Ok(mapper::page_summary(&created, self.credentials()))
    }

    /// Replace a page's title and body.
    ///
    /// The title is required; an empty title fails before any request.
    #[instrument(skip(self, page_id, title, body), fields(page_id = %page_id))]
    pub async fn update_page(&self, page_id: &str, title: &str, body: &str) -> Result<PageSummary> {
        if title.trim().is_empty() {
            return Err(ApiError::invalid("page title is required for an update"));
        }

        let current = self.fetch_page(page_id, "version").await?;
        let next_version = current.version_number().unwrap_or(1) + 1;
        debug!("Updating page to version {}", next_version);

        let url = self.credentials().wiki_url(&format!("/content/{}", encode(page_id)));
        let request = RequestDescriptor::put(url, page_id).json(json!({
            "type": "page",
            "title": title,
            "version": { "number": next_version },
            "body": storage_body(body),
        }));

        let updated: Content = self.executor.execute_json(&request).await?;
        Ok(mapper::page_summary(&updated, self.credentials()))
    }

    /// Comment on a page.
    #[instrument(skip(self, page_id, text), fields(page_id = %page_id))]
    pub async fn add_page_comment(&self, page_id: &str, text: &str) -> Result<CommentReceipt> {
        let url = self.credentials().wiki_url("/content");
        let request = RequestDescriptor::post(url, page_id).json(json!({
            "type": "comment",
            "container": { "id": page_id, "type": "page" },
            "body": storage_body(text),
        }));

        let comment: Content = self.executor.execute_json(&request).await?;
        Ok(mapper::page_comment_receipt(&comment, page_id))
    }

    /// Upload a file to a page.
    #[instrument(skip(self, page_id, attachment), fields(page_id = %page_id, file = %attachment.file_name))]
    pub async fn attach_to_page(
        &self,
        page_id: &str,
        attachment: Attachment,
    ) -> Result<AttachmentReceipt> {
        let resource = format!("/content/{}/child/attachment", encode(page_id));
        let url = self.credentials().wiki_url(&resource);
        let request = RequestDescriptor::post(url, page_id).file(attachment);

        let uploaded: ContentPage<Content> = self.executor.execute_json(&request).await?;
        Ok(AttachmentReceipt {
            target: page_id.to_string(),
            attachments: uploaded.results.iter().map(mapper::page_attachment).collect(),
        })
    }
}

fn storage_body(text: &str) -> serde_json::Value {
    let payload = normalize(text);
    json!({
        "storage": {
            "value": payload.markup,
            "representation": "storage",
        }
    })
}

/// Pages of `GET /rest/api/3/search/jql`.
struct IssueSearchPages<'a> {
    executor: &'a Executor,
    jql: &'a str,
}

#[async_trait]
impl PageSource for IssueSearchPages<'_> {
    type Item = Issue;

    async fn fetch(&self, token: Option<&PageToken>, limit: u32) -> Result<Page<Issue>> {
        let request = self.request(token, limit);
        let page: IssueSearchPage = self.executor.execute_json(&request).await?;
        let next = match (page.is_last, page.next_page_token) {
            (Some(true), _) | (_, None) => None,
            (_, Some(token)) => Some(PageToken::Cursor(token)),
        };

        Ok(Page {
            items: page.issues,
            next,
            total: None,
        })
    }
}

impl IssueSearchPages<'_> {
    fn request(&self, token: Option<&PageToken>, limit: u32) -> RequestDescriptor {
        let mut request = RequestDescriptor::get(
            self.executor.credentials().jira_url("/search/jql"),
            "search",
        )
        .query("jql", self.jql)
        .query("maxResults", limit.to_string())
        .query("fields", SEARCH_FIELDS.join(","))
        .paged();

        if let Some(PageToken::Cursor(next)) = token {
            request = request.query("nextPageToken", next.clone());
        }
        request
    }
}

/// Pages of `GET /wiki/rest/api/content/search`.
struct PageSearchPages<'a> {
    executor: &'a Executor,
    cql: String,
}

#[async_trait]
impl PageSource for PageSearchPages<'_> {
    type Item = Content;

    async fn fetch(&self, token: Option<&PageToken>, limit: u32) -> Result<Page<Content>> {
        let start = match token {
            Some(PageToken::Offset(start)) => *start,
            _ => 0,
        };

        let request = self.request(start, limit);
        let page: ContentPage<Content> = self.executor.execute_json(&request).await?;
        let delivered = page.size.unwrap_or(page.results.len() as u32).min(limit);
        let next = page
            .has_next_link()
            .then(|| PageToken::Offset(page.start.unwrap_or(start) + delivered));

        Ok(Page {
            total: page.total_size,
            next,
            items: page.results,
        })
    }
}

impl PageSearchPages<'_> {
    fn request(&self, start: u32, limit: u32) -> RequestDescriptor {
        RequestDescriptor::get(
            self.executor.credentials().wiki_url("/content/search"),
            "search",
        )
        .query("cql", self.cql.clone())
        .query("limit", limit.to_string())
        .query("start", start.to_string())
        .query("expand", "space")
        .paged()
    }
}

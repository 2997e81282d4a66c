//! Jira and Confluence REST client.
//!
//! [`AtlassianClient`] exposes one method per operation. Requests are
//! described by [`RequestDescriptor`] values and sent by the [`Executor`],
//! which applies authentication and the retry policy.

mod auth;
mod client;
mod content;
pub mod error;
mod executor;
mod mapper;
mod pagination;
pub mod records;
mod request;
mod retry;
mod types;

pub use auth::Credentials;
pub use client::{build_cql, AtlassianClient, NewIssue, NewPage, DEFAULT_ISSUE_TYPE};
pub use content::{adf_document, is_markup, normalize, StoragePayload};
pub use error::{ApiError, ErrorKind, ErrorReport};
pub use executor::Executor;
pub use pagination::{Cursor, Page, PageSource, PageToken};
pub use records::Record;
pub use request::{Attachment, RequestBody, RequestDescriptor};
pub use retry::{RetryDecision, RetryPolicy, Sleeper, TokioSleeper};
pub use types::AtlassianDoc;

#[cfg(test)]
pub(crate) use retry::testing;

//! Command-line interface.
//!
//! Parses arguments, resolves text and file inputs, runs one operation and
//! writes the outcome. Results go to stdout as JSON; failures go to stderr
//! as a JSON error report.

pub mod args;
pub mod input;

pub use args::{Cli, Command};

use std::io::Write;

use serde::Serialize;
use tracing::{error, info};

use crate::api::{AtlassianClient, Credentials, NewIssue, NewPage, Record};
use crate::config::Config;
use crate::error::{AppError, Result};

/// Exit status for success.
pub const EXIT_OK: u8 = 0;

/// Exit status for any failure.
pub const EXIT_FAILURE: u8 = 1;

/// Run one command end to end and return the process exit status.
pub async fn run(command: Command) -> u8 {
    let outcome = execute(command).await;
    emit(outcome, &mut std::io::stdout(), &mut std::io::stderr())
}

/// Load configuration, build the client and dispatch the command.
pub async fn execute(command: Command) -> Result<Record> {
    let config = Config::load()?;
    let credentials = Credentials::from_account(&config.account)?;
    let client = AtlassianClient::new(credentials, &config.settings)?;
    info!(base_url = %client.credentials().base_url(), "Client ready");
    dispatch(&client, command).await
}

/// Run a parsed command against a client.
pub async fn dispatch(client: &AtlassianClient, command: Command) -> Result<Record> {
    let record: Record = match command {
        Command::TestConnection => client.test_connection().await.into(),

        Command::JiraSearch { jql, max_results } => {
            client.search_issues(&jql, max_results).await?.into()
        }

        Command::JiraGet {
            issue_key,
            comments,
        } => client.get_issue(&issue_key, comments).await?.into(),

        Command::JiraCreate {
            project,
            summary,
            issue_type,
            description,
            description_file,
            priority,
            labels,
            assignee,
        } => {
            let issue = NewIssue {
                project_key: project,
                summary,
                issue_type: Some(issue_type),
                description: input::resolve_text(description, description_file.as_deref())?,
                priority,
                labels: labels
                    .into_iter()
                    .map(|l| l.trim().to_string())
                    .filter(|l| !l.is_empty())
                    .collect(),
                assignee_account_id: assignee,
            };
            client.create_issue(&issue).await?.into()
        }

        Command::JiraComment {
            issue_key,
            comment,
            comment_file,
        } => {
            let text = input::require_text(
                comment,
                comment_file.as_deref(),
                "comment text or --comment-file",
            )?;
            client.add_issue_comment(&issue_key, &text).await?.into()
        }

        Command::JiraAttach {
            issue_key,
            file,
            content_type,
        } => {
            let attachment = input::load_attachment(&file, content_type)?;
            client.attach_to_issue(&issue_key, attachment).await?.into()
        }

        Command::ConfluenceSearch {
            query,
            space,
            max_results,
        } => client
            .search_pages(&query, space.as_deref(), max_results)
            .await?
            .into(),

        Command::ConfluenceGet { page_id } => client.get_page(&page_id).await?.into(),

        Command::ConfluenceCreate {
            space,
            title,
            body,
            body_file,
            parent,
        } => {
            let page = NewPage {
                space_key: space,
                title,
                body: input::require_text(body, body_file.as_deref(), "--body or --body-file")?,
                parent_id: parent,
            };
            client.create_page(&page).await?.into()
        }

        Command::ConfluenceUpdate {
            page_id,
            title,
            body,
            body_file,
        } => {
            let body = input::require_text(body, body_file.as_deref(), "--body or --body-file")?;
            client.update_page(&page_id, &title, &body).await?.into()
        }

        Command::ConfluenceComment {
            page_id,
            comment,
            comment_file,
        } => {
            let text = input::require_text(
                comment,
                comment_file.as_deref(),
                "comment text or --comment-file",
            )?;
            client.add_page_comment(&page_id, &text).await?.into()
        }

        Command::ConfluenceAttach {
            page_id,
            file,
            content_type,
        } => {
            let attachment = input::load_attachment(&file, content_type)?;
            client.attach_to_page(&page_id, attachment).await?.into()
        }
    };

    Ok(record)
}

/// Write an outcome to the result and error channels.
///
/// Returns the exit status: failure for an error or a record that reports
/// a failed service.
pub fn emit<O: Write, E: Write>(outcome: Result<Record>, out: &mut O, err: &mut E) -> u8 {
    match outcome {
        Ok(record) => {
            if let Err(e) = write_json(out, &record) {
                error!("Failed to write result: {}", e);
                return EXIT_FAILURE;
            }
            if record.is_success() {
                EXIT_OK
            } else {
                EXIT_FAILURE
            }
        }
        Err(e) => {
            error!(kind = ?e.kind(), "Command failed: {}", e);
            if let Some(action) = e.suggested_action() {
                info!("Suggested action: {}", action);
            }
            if let Err(write_err) = write_json(err, &e.report()) {
                error!("Failed to write error report: {}", write_err);
            }
            EXIT_FAILURE
        }
    }
}

fn write_json<W: Write, T: Serialize>(writer: &mut W, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::input(format!("Could not serialize output: {}", e)))?;
    writeln!(writer, "{}", json)?;
    Ok(())
}

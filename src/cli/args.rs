//! Command-line argument definitions using clap derive.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Default number of search results.
pub const DEFAULT_MAX_RESULTS: usize = 25;

/// atlgate - Jira and Confluence from the command line
#[derive(Parser, Debug)]
#[command(name = "atlgate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Test Jira and Confluence connectivity
    TestConnection,

    /// Search Jira issues via JQL
    JiraSearch {
        /// JQL query string
        jql: String,

        /// Max results
        #[arg(long = "max", default_value_t = DEFAULT_MAX_RESULTS)]
        max_results: usize,
    },

    /// Get a Jira issue by key
    JiraGet {
        /// Issue key (e.g. RFID-42)
        issue_key: String,

        /// Include comments
        #[arg(long)]
        comments: bool,
    },

    /// Create a new Jira issue
    JiraCreate {
        /// Project key (e.g. RFID)
        #[arg(long)]
        project: String,

        /// Issue summary
        #[arg(long)]
        summary: String,

        /// Issue type
        #[arg(long = "type", default_value = "Task")]
        issue_type: String,

        /// Description text
        #[arg(long, conflicts_with = "description_file")]
        description: Option<String>,

        /// Read description from file ('-' for stdin)
        #[arg(long, value_name = "PATH")]
        description_file: Option<PathBuf>,

        /// Priority (e.g. High)
        #[arg(long)]
        priority: Option<String>,

        /// Comma-separated labels
        #[arg(long, value_delimiter = ',')]
        labels: Vec<String>,

        /// Assignee account ID
        #[arg(long)]
        assignee: Option<String>,
    },

    /// Add a comment to a Jira issue
    JiraComment {
        /// Issue key (e.g. RFID-42)
        issue_key: String,

        /// Comment text
        #[arg(conflicts_with = "comment_file")]
        comment: Option<String>,

        /// Read comment from file ('-' for stdin)
        #[arg(long, value_name = "PATH")]
        comment_file: Option<PathBuf>,
    },

    /// Attach a file to a Jira issue
    JiraAttach {
        /// Issue key (e.g. RFID-42)
        issue_key: String,

        /// File to upload
        file: PathBuf,

        /// MIME type of the file
        #[arg(long)]
        content_type: Option<String>,
    },

    /// Search Confluence pages
    ConfluenceSearch {
        /// Search keywords or CQL
        query: String,

        /// Space key to filter by
        #[arg(long)]
        space: Option<String>,

        /// Max results
        #[arg(long = "max", default_value_t = DEFAULT_MAX_RESULTS)]
        max_results: usize,
    },

    /// Get a Confluence page by ID
    ConfluenceGet {
        /// Numeric page ID
        page_id: String,
    },

    /// Create a new Confluence page
    ConfluenceCreate {
        /// Space key (e.g. RFID)
        #[arg(long)]
        space: String,

        /// Page title
        #[arg(long)]
        title: String,

        /// Page body (HTML or plain text)
        #[arg(long, conflicts_with = "body_file")]
        body: Option<String>,

        /// Read body from file ('-' for stdin)
        #[arg(long, value_name = "PATH")]
        body_file: Option<PathBuf>,

        /// Parent page ID
        #[arg(long)]
        parent: Option<String>,
    },

    /// Update an existing Confluence page
    ConfluenceUpdate {
        /// Numeric page ID
        page_id: String,

        /// Page title
        #[arg(long)]
        title: String,

        /// Updated body (HTML or plain text)
        #[arg(long, conflicts_with = "body_file")]
        body: Option<String>,

        /// Read body from file ('-' for stdin)
        #[arg(long, value_name = "PATH")]
        body_file: Option<PathBuf>,
    },

    /// Add a comment to a Confluence page
    ConfluenceComment {
        /// Numeric page ID
        page_id: String,

        /// Comment text
        #[arg(conflicts_with = "comment_file")]
        comment: Option<String>,

        /// Read comment from file ('-' for stdin)
        #[arg(long, value_name = "PATH")]
        comment_file: Option<PathBuf>,
    },

    /// Attach a file to a Confluence page
    ConfluenceAttach {
        /// Numeric page ID
        page_id: String,

        /// File to upload
        file: PathBuf,

        /// MIME type of the file
        #[arg(long)]
        content_type: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Command {
        Cli::try_parse_from(std::iter::once("atlgate").chain(args.iter().copied()))
            .unwrap()
            .command
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_jira_search_defaults() {
        assert_eq!(
            parse(&["jira-search", "project = RFID"]),
            Command::JiraSearch {
                jql: "project = RFID".into(),
                max_results: 25,
            }
        );
    }

    #[test]
    fn test_jira_create_splits_labels() {
        match parse(&[
            "jira-create",
            "--project",
            "RFID",
            "--summary",
            "Fix reader",
            "--labels",
            "hw,urgent",
        ]) {
            Command::JiraCreate {
                issue_type, labels, ..
            } => {
                assert_eq!(issue_type, "Task");
                assert_eq!(labels, vec!["hw", "urgent"]);
            }
            other => panic!("Expected JiraCreate, got {other:?}"),
        }
    }

    #[test]
    fn test_inline_and_file_text_conflict() {
        let result = Cli::try_parse_from([
            "atlgate",
            "confluence-update",
            "123",
            "--title",
            "T",
            "--body",
            "x",
            "--body-file",
            "body.html",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_debug_flag_is_global() {
        let cli = Cli::try_parse_from(["atlgate", "confluence-get", "12345678", "--debug"]).unwrap();
        assert!(cli.debug);
        assert_eq!(
            cli.command,
            Command::ConfluenceGet {
                page_id: "12345678".into()
            }
        );
    }

    #[test]
    fn test_comment_from_stdin_marker() {
        match parse(&["jira-comment", "RFID-42", "--comment-file", "-"]) {
            Command::JiraComment {
                comment,
                comment_file,
                ..
            } => {
                assert_eq!(comment, None);
                assert_eq!(comment_file, Some(PathBuf::from("-")));
            }
            other => panic!("Expected JiraComment, got {other:?}"),
        }
    }
}

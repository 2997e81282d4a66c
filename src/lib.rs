//! atlassian-gateway - Jira and Confluence Cloud from the command line
//!
//! - [`api`] - REST client: credentials, request execution with retry,
//!   pagination and response mapping
//! - [`cli`] - Argument parsing, input loading and output channels
//! - [`config`] - Environment and settings-file configuration
//! - [`error`] - Top-level error type and error reports
//! - [`logging`] - File-based tracing setup

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;

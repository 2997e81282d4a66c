//! atlgate - Jira and Confluence Cloud from the command line

use std::process::ExitCode;

use atlassian_gateway::cli::{self, Cli};
use atlassian_gateway::logging;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Cli::parse_args();

    logging::init_with_fallback(args.debug);

    let code = cli::run(args.command).await;
    logging::shutdown(code);
    ExitCode::from(code)
}

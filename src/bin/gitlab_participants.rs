//! gitlab-participants: list who took part in a merge request discussion
//!
//! Fetches the discussion, collects its distinct note authors, then resolves
//! them to full user records with bounded concurrency. Prints the users as
//! JSON on stdout.
//!
//! ## Usage
//! ```text
//! gitlab-participants <project_id> <merge_request_iid> <discussion_id>
//! ```
//!
//! ## Configuration
//! - GITLAB__TOKEN: access token (required)
//! - GITLAB__BASE_URL: API root (default: https://gitlab.com/api/v4)
//! - GITLAB__CONCURRENCY: concurrent user lookups (default: available CPUs)
//! - GITLAB__TIMEOUT_MS: per-request timeout in milliseconds (default: 30000)
//! - GITLAB_CONFIG: optional YAML file with the same keys
//! - GITLAB_LOG: log filter (default: info)

use tracing::{error, info};

use gitlab_client::utils::bootstrap::init_tracing;
use gitlab_client::{Client, ClientConfig, GitlabApi};

const USAGE: &str = "usage: gitlab-participants <project_id> <merge_request_iid> <discussion_id>";

struct Args {
    project_id: u64,
    merge_request_iid: u64,
    discussion_id: String,
}

fn parse_args() -> Result<Args, String> {
    let mut args = std::env::args().skip(1);
    let mut next = |name: &str| args.next().ok_or_else(|| format!("missing {}\n{}", name, USAGE));

    let project_id = next("project_id")?
        .parse()
        .map_err(|e| format!("invalid project_id: {}", e))?;
    let merge_request_iid = next("merge_request_iid")?
        .parse()
        .map_err(|e| format!("invalid merge_request_iid: {}", e))?;
    let discussion_id = next("discussion_id")?;

    Ok(Args {
        project_id,
        merge_request_iid,
        discussion_id,
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args = parse_args()?;
    let config = ClientConfig::load(None)?;
    let client = Client::new(config)?;

    info!(
        project_id = args.project_id,
        merge_request_iid = args.merge_request_iid,
        discussion_id = %args.discussion_id,
        concurrency = client.concurrency(),
        "fetching discussion participants"
    );

    let users = match client
        .get_participant_users(args.project_id, args.merge_request_iid, &args.discussion_id)
        .await
    {
        Ok(users) => users,
        Err(e) => {
            error!(error = %e, "failed to fetch participants");
            return Err(e.into());
        }
    };

    info!(count = users.len(), "participants fetched");
    println!("{}", serde_json::to_string_pretty(&users)?);

    Ok(())
}

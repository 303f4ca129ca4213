//! GitLab REST client with bounded concurrent batch lookups.
//!
//! Single lookups (users, merge request discussions) go through one HTTP
//! request each. Batch lookups fan out through [`batch::fetch_all`], which
//! keeps at most a configured number of requests in flight, fails the whole
//! batch on the first error, and never leaves a request running after it
//! returns.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use gitlab_client::{Client, ClientConfig, GitlabApi};
//!
//! async fn example() -> gitlab_client::Result<()> {
//!     let client = Client::new(ClientConfig::new("glpat-...").with_concurrency(4))?;
//!
//!     let users = client.get_users_by_ids(&[5, 10, 15]).await?;
//!     let people = client.get_participant_users(42, 7, "6a9c1750b37d").await?;
//!     Ok(())
//! }
//! ```
//!
//! # Mocking for Tests
//!
//! Code that depends on GitLab can take `&dyn GitlabApi` and be tested
//! against a hand-written implementation of the trait.

pub mod batch;
pub mod client;
pub mod config;
pub mod error;
pub mod participants;
pub mod traits;
pub mod transport;
pub mod types;
pub mod utils;

// Re-export main types at crate root
pub use client::Client;
pub use config::ClientConfig;
pub use error::{GitlabError, Result};
pub use traits::GitlabApi;
pub use transport::{BoxError, HttpTransport};
pub use types::{Discussion, Note, NoteAuthor, Position, User};

//! Error types for the GitLab client.

use reqwest::StatusCode;

use crate::batch::BatchError;
use crate::transport::BoxError;

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, GitlabError>;

/// Errors that can occur during client operations.
///
/// Every wrapping variant keeps the wrapped error as its `source()`, so the
/// innermost cause of a failure can always be recovered with
/// [`GitlabError::root_cause`].
#[derive(Debug, thiserror::Error)]
pub enum GitlabError {
    /// The request could not be built (bad URL, bad header value).
    #[error("can't create http request: {0}")]
    InvalidRequest(String),

    /// The underlying transport failed to deliver the request.
    #[error("can't send http request: {0}")]
    Transport(#[source] BoxError),

    /// GitLab answered with something other than 200 OK.
    #[error("gitlab respond with {} status code", .0.as_u16())]
    Status(StatusCode),

    /// Status was 200 but the body could not be read.
    #[error("can't read response body: {0}")]
    Body(#[source] reqwest::Error),

    /// The body did not decode into the expected entity.
    #[error("can't unmarshal {entity} data: {source}")]
    Decode {
        entity: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// At least one lookup of a user batch failed.
    #[error("can't get users from gitlab: {0}")]
    Users(#[source] Box<BatchError<GitlabError>>),

    /// The discussion backing a participants lookup could not be fetched.
    #[error("can't get discussion from gitlab: {0}")]
    Discussion(#[source] Box<GitlabError>),

    /// The request was abandoned because its cancellation token fired.
    #[error("request cancelled")]
    Cancelled,

    /// Configuration could not be loaded or is invalid.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<::config::ConfigError> for GitlabError {
    fn from(err: ::config::ConfigError) -> Self {
        GitlabError::Config(err.to_string())
    }
}

impl GitlabError {
    /// Returns the HTTP status if GitLab rejected the request.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            GitlabError::Status(code) => Some(*code),
            _ => None,
        }
    }

    /// Returns true if the request never got a response.
    pub fn is_transport_error(&self) -> bool {
        matches!(self, GitlabError::Transport(_))
    }

    /// Returns true if a response arrived but did not decode.
    pub fn is_decode_error(&self) -> bool {
        matches!(self, GitlabError::Decode { .. })
    }

    /// Walks the `source()` chain and returns the innermost error.
    pub fn root_cause(&self) -> &(dyn std::error::Error + 'static) {
        let mut cause: &(dyn std::error::Error + 'static) = self;
        while let Some(next) = cause.source() {
            cause = next;
        }
        cause
    }
}

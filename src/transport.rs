//! HTTP transport seam.
//!
//! The client never talks to `reqwest::Client` directly; it goes through
//! [`HttpTransport`] so tests and callers can substitute their own transport
//! (recording stubs, proxies, custom TLS setups).

use async_trait::async_trait;
use reqwest::{Request, Response};

/// Boxed error returned by transports.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Executes a fully-built request and returns the raw response.
///
/// Implementations must return `Err` only when no response was obtained.
/// Non-success statuses are returned as `Ok` and checked by the client.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, request: Request) -> Result<Response, BoxError>;
}

#[async_trait]
impl HttpTransport for reqwest::Client {
    async fn execute(&self, request: Request) -> Result<Response, BoxError> {
        Ok(reqwest::Client::execute(self, request).await?)
    }
}

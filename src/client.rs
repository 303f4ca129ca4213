//! Default GitLab client over an [`HttpTransport`].

use std::sync::Arc;

use bytes::Bytes;
use reqwest::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, Request, StatusCode, Url};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::batch;
use crate::config::ClientConfig;
use crate::error::{GitlabError, Result};
use crate::transport::HttpTransport;
use crate::types::{Discussion, NoteAuthor, User};

/// Header carrying the access token.
pub const PRIVATE_TOKEN: HeaderName = HeaderName::from_static("private-token");

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// GitLab REST client.
///
/// Cheap to clone; clones share the transport and settings.
#[derive(Clone)]
pub struct Client {
    inner: Arc<Inner>,
}

struct Inner {
    token: String,
    base_url: String,
    concurrency: usize,
    transport: Arc<dyn HttpTransport>,
}

impl Client {
    /// Create a client backed by `reqwest` with the configured timeout.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| GitlabError::Config(format!("can't build http client: {}", e)))?;

        Self::with_transport(config, Arc::new(http))
    }

    /// Create a client for gitlab.com with default settings.
    pub fn from_token(token: impl Into<String>) -> Result<Self> {
        Self::new(ClientConfig::new(token))
    }

    /// Create a client that sends requests through `transport`.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn HttpTransport>) -> Result<Self> {
        config.validate()?;

        let concurrency = config.effective_concurrency();
        Ok(Self {
            inner: Arc::new(Inner {
                token: config.token,
                base_url: config.base_url.trim_end_matches('/').to_string(),
                concurrency,
                transport,
            }),
        })
    }

    /// API root every request path is joined onto.
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Concurrency limit used by batch lookups.
    pub fn concurrency(&self) -> usize {
        self.inner.concurrency
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        let url = format!("{}/{}", self.inner.base_url, path.trim_start_matches('/'));
        Url::parse(&url).map_err(|e| GitlabError::InvalidRequest(format!("invalid url {}: {}", url, e)))
    }

    /// Send a request to `path` (relative to the base URL) and return the body.
    ///
    /// Adds the `Private-Token` and JSON `Content-Type` headers. Anything but
    /// `200 OK` is an error; the body of a failed response is discarded.
    pub async fn send_request(
        &self,
        method: Method,
        path: &str,
        body: Option<Bytes>,
    ) -> Result<Bytes> {
        let url = self.endpoint(path)?;
        self.send(method, url, body).await
    }

    async fn send(&self, method: Method, url: Url, body: Option<Bytes>) -> Result<Bytes> {
        let mut token = HeaderValue::from_str(&self.inner.token)
            .map_err(|e| GitlabError::InvalidRequest(format!("invalid access token: {}", e)))?;
        token.set_sensitive(true);

        let mut request = Request::new(method, url);
        let headers = request.headers_mut();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        headers.insert(PRIVATE_TOKEN, token);
        if let Some(body) = body {
            *request.body_mut() = Some(body.into());
        }

        let method = request.method().clone();
        let url = request.url().clone();

        let response = self
            .inner
            .transport
            .execute(request)
            .await
            .map_err(GitlabError::Transport)?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!(%method, %url, %status, "GitLab request rejected");
            return Err(GitlabError::Status(status));
        }

        let body = response.bytes().await.map_err(GitlabError::Body)?;
        debug!(%method, %url, bytes = body.len(), "GitLab request completed");
        Ok(body)
    }

    async fn get<T: DeserializeOwned>(&self, entity: &'static str, url: Url) -> Result<T> {
        let body = self.send(Method::GET, url, None).await?;
        serde_json::from_slice(&body).map_err(|source| GitlabError::Decode { entity, source })
    }

    /// Fetch one user by id.
    pub async fn get_user_by_id(&self, user_id: u64) -> Result<User> {
        let url = self.endpoint(&format!("users/{}", user_id))?;
        self.get("user", url).await
    }

    /// Fetch one user, giving up as soon as `cancel` fires.
    async fn get_user_until(&self, cancel: &CancellationToken, user_id: u64) -> Result<User> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(GitlabError::Cancelled),
            user = self.get_user_by_id(user_id) => user,
        }
    }

    /// Fetch many users concurrently, at most [`Client::concurrency`] at a time.
    ///
    /// Users are returned in the order of `user_ids`. If any lookup fails the
    /// whole batch fails and no users are returned.
    pub async fn get_users_by_ids(&self, user_ids: &[u64]) -> Result<Vec<User>> {
        self.get_users_by_ids_with_cancel(&CancellationToken::new(), user_ids)
            .await
    }

    /// [`Client::get_users_by_ids`] that also stops when `cancel` fires.
    ///
    /// Cancelling before every user has been fetched fails with
    /// [`GitlabError::Users`] wrapping [`BatchError::Cancelled`](batch::BatchError::Cancelled),
    /// after every request in flight has been dropped.
    pub async fn get_users_by_ids_with_cancel(
        &self,
        cancel: &CancellationToken,
        user_ids: &[u64],
    ) -> Result<Vec<User>> {
        let client = self.clone();
        batch::fetch_all(
            cancel,
            user_ids.iter().copied(),
            self.inner.concurrency,
            move |token, user_id| {
                let client = client.clone();
                async move { client.get_user_until(&token, user_id).await }
            },
        )
        .await
        .map_err(|err| GitlabError::Users(Box::new(err)))
    }

    /// Fetch one merge request discussion.
    ///
    /// `discussion_id` is sent as a single percent-encoded path segment.
    pub async fn get_discussion(
        &self,
        project_id: u64,
        merge_request_iid: u64,
        discussion_id: &str,
    ) -> Result<Discussion> {
        let mut url = self.endpoint(&format!(
            "projects/{}/merge_requests/{}/discussions",
            project_id, merge_request_iid
        ))?;
        url.path_segments_mut()
            .map_err(|_| GitlabError::InvalidRequest("base url can't take a path".to_string()))?
            .push(discussion_id);

        self.get("discussion", url).await
    }

    /// Distinct authors of a discussion's notes, in first-seen order.
    pub async fn get_participants(
        &self,
        project_id: u64,
        merge_request_iid: u64,
        discussion_id: &str,
    ) -> Result<Vec<NoteAuthor>> {
        let discussion = self
            .get_discussion(project_id, merge_request_iid, discussion_id)
            .await
            .map_err(|err| GitlabError::Discussion(Box::new(err)))?;

        Ok(discussion.participants())
    }
}

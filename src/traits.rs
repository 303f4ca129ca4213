//! Client trait for GitLab lookups.
//!
//! [`Client`](crate::Client) implements this trait; implement it yourself to
//! mock GitLab in tests of code that depends on these lookups.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Method;

use crate::client::Client;
use crate::error::Result;
use crate::types::{Discussion, NoteAuthor, User};

#[async_trait]
pub trait GitlabApi: Send + Sync {
    /// Fetch one user by id.
    async fn get_user_by_id(&self, user_id: u64) -> Result<User>;

    /// Fetch many users; all-or-nothing.
    async fn get_users_by_ids(&self, user_ids: &[u64]) -> Result<Vec<User>>;

    /// Fetch one merge request discussion.
    async fn get_discussion(
        &self,
        project_id: u64,
        merge_request_iid: u64,
        discussion_id: &str,
    ) -> Result<Discussion>;

    /// Distinct note authors of a discussion, in first-seen order.
    async fn get_participants(
        &self,
        project_id: u64,
        merge_request_iid: u64,
        discussion_id: &str,
    ) -> Result<Vec<NoteAuthor>>;

    /// Send a raw request relative to the API root.
    async fn send_request(&self, method: Method, path: &str, body: Option<Bytes>)
        -> Result<Bytes>;

    /// Full user records for every participant of a discussion.
    async fn get_participant_users(
        &self,
        project_id: u64,
        merge_request_iid: u64,
        discussion_id: &str,
    ) -> Result<Vec<User>> {
        let participants = self
            .get_participants(project_id, merge_request_iid, discussion_id)
            .await?;
        let ids: Vec<u64> = participants.iter().map(|author| author.id).collect();
        self.get_users_by_ids(&ids).await
    }
}

#[async_trait]
impl GitlabApi for Client {
    async fn get_user_by_id(&self, user_id: u64) -> Result<User> {
        self.get_user_by_id(user_id).await
    }

    async fn get_users_by_ids(&self, user_ids: &[u64]) -> Result<Vec<User>> {
        self.get_users_by_ids(user_ids).await
    }

    async fn get_discussion(
        &self,
        project_id: u64,
        merge_request_iid: u64,
        discussion_id: &str,
    ) -> Result<Discussion> {
        self.get_discussion(project_id, merge_request_iid, discussion_id)
            .await
    }

    async fn get_participants(
        &self,
        project_id: u64,
        merge_request_iid: u64,
        discussion_id: &str,
    ) -> Result<Vec<NoteAuthor>> {
        self.get_participants(project_id, merge_request_iid, discussion_id)
            .await
    }

    async fn send_request(
        &self,
        method: Method,
        path: &str,
        body: Option<Bytes>,
    ) -> Result<Bytes> {
        self.send_request(method, path, body).await
    }
}

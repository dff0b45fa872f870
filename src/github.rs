use async_trait::async_trait;

pub(crate) mod client;
pub(crate) mod issue;
mod issue_repository;
mod webhook;

pub use client::GithubClient;
pub use issue::*;
pub use issue_repository::IssueRepository;
pub use webhook::event::*;
pub use webhook::{
    EVENT_HEADER, EventName, SIGNATURE_HEADER, SIGNATURE_SHA256_HEADER, SignedPayloadError,
    check_payload_signed, deserialize_payload, sign_payload, webhook,
};

/// The subset of the GitHub REST API the bot talks to.
///
/// Every call may fail independently; callers decide whether a failure is
/// fatal for the operation at hand.
#[async_trait]
pub trait GithubApi: Send + Sync {
    async fn get_issue(&self, repo: &IssueRepository, number: u64) -> anyhow::Result<Issue>;

    async fn get_pull_request(
        &self,
        repo: &IssueRepository,
        number: u64,
    ) -> anyhow::Result<PullRequest>;

    /// Replaces every label of the issue with `labels`.
    async fn replace_labels(
        &self,
        repo: &IssueRepository,
        number: u64,
        labels: &[String],
    ) -> anyhow::Result<()>;

    async fn add_comment(
        &self,
        repo: &IssueRepository,
        number: u64,
        body: &str,
    ) -> anyhow::Result<()>;

    /// Creates a commit status, overwriting any previous status with the same
    /// context on `sha`.
    async fn create_commit_status(
        &self,
        repo: &IssueRepository,
        sha: &str,
        status: &NewStatus,
    ) -> anyhow::Result<()>;
}

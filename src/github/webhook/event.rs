use crate::github::{Comment, Issue, Label, PullRequest, User};

/// The repository a webhook event was delivered for.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct Repository {
    /// Example: `garukun/golgtm`
    pub full_name: String,
}

#[derive(PartialEq, Eq, Debug, Clone, Copy, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueCommentAction {
    Created,
    Edited,
    Deleted,
}

/// <https://docs.github.com/en/webhooks/webhook-events-and-payloads#issue_comment>
#[derive(Debug, serde::Deserialize)]
pub struct IssueCommentEvent {
    pub action: IssueCommentAction,
    pub issue: Issue,
    pub comment: Comment,
    pub repository: Option<Repository>,
}

/// Pull request actions.
///
/// Only the actions that can change the review state are spelled out.
#[derive(PartialEq, Eq, Debug, Clone, Copy, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PullRequestAction {
    Opened,
    Reopened,
    Labeled,
    Unlabeled,
    Synchronize,
    #[serde(other)]
    Other,
}

/// <https://docs.github.com/en/webhooks/webhook-events-and-payloads#pull_request>
#[derive(Debug, serde::Deserialize)]
pub struct PullRequestEvent {
    pub action: PullRequestAction,
    pub number: u64,
    pub pull_request: PullRequest,
    /// The label added or removed, for `labeled`/`unlabeled`.
    ///
    /// `None` when a label is deleted from the repository.
    #[serde(default)]
    pub label: Option<Label>,
    pub repository: Option<Repository>,
    pub sender: Option<User>,
}

/// Sent once when a webhook is created.
///
/// <https://docs.github.com/en/webhooks/webhook-events-and-payloads#ping>
#[derive(Debug, serde::Deserialize)]
pub struct PingEvent {
    #[serde(default)]
    pub zen: Option<String>,
    #[serde(default)]
    pub hook_id: Option<u64>,
}

//! Best-effort explanatory comments.
//!
//! Comments are posted by their own worker so that a slow or failing comment
//! never delays a label or status update.

use std::sync::Arc;

use async_trait::async_trait;

use crate::github::{GithubApi, IssueRepository};
use crate::queue::Process;

pub const COMMENT_QUEUE_CAPACITY: usize = 32;

/// Posted when new commits are pushed to a PR that was not in review.
pub const REVERT_COMMENT: &str = "Files changed in PR, reverting code review status.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingComment {
    pub number: u64,
    pub body: String,
}

pub struct CommentPoster {
    github: Arc<dyn GithubApi>,
    repo: IssueRepository,
}

impl CommentPoster {
    pub fn new(github: Arc<dyn GithubApi>, repo: IssueRepository) -> Self {
        CommentPoster { github, repo }
    }
}

#[async_trait]
impl Process<PendingComment> for CommentPoster {
    async fn process(&self, comment: PendingComment) {
        if let Err(e) = self
            .github
            .add_comment(&self.repo, comment.number, &comment.body)
            .await
        {
            tracing::error!(
                "failed to comment on {}#{}: {e:?}",
                self.repo,
                comment.number
            );
        }
    }
}

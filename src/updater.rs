//! Applies review-state updates to GitHub.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{Config, WorkflowConfig};
use crate::github::{GithubApi, NewStatus, StatusState};
use crate::queue::Process;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewState {
    InReview,
    Approved,
}

impl ReviewState {
    /// The workflow label representing this state.
    pub fn label(self, workflow: &WorkflowConfig) -> &str {
        match self {
            ReviewState::InReview => &workflow.in_review.label,
            ReviewState::Approved => &workflow.approved.label,
        }
    }

    pub fn status(self) -> StatusState {
        match self {
            ReviewState::InReview => StatusState::Pending,
            ReviewState::Approved => StatusState::Success,
        }
    }
}

/// Labels of the issue at the time the update was decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueSnapshot {
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestSnapshot {
    pub head_sha: String,
}

/// A decided state transition for one pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update {
    pub number: u64,
    pub state: ReviewState,
    /// When present, the workflow labels are reconciled.
    pub issue: Option<IssueSnapshot>,
    /// When present, the commit status of the head commit is written.
    pub pull_request: Option<PullRequestSnapshot>,
}

/// Computes the label set for `state`: every other label is kept, both
/// workflow labels are removed and the one for `state` is appended.
pub fn reconcile_labels(labels: &[String], state: ReviewState, workflow: &WorkflowConfig) -> Vec<String> {
    let mut labels: Vec<String> = labels
        .iter()
        .filter(|l| **l != workflow.in_review.label && **l != workflow.approved.label)
        .cloned()
        .collect();
    labels.push(state.label(workflow).to_string());
    labels
}

/// The single consumer of the update queue.
pub struct Applier {
    github: Arc<dyn GithubApi>,
    config: Arc<Config>,
}

impl Applier {
    pub fn new(github: Arc<dyn GithubApi>, config: Arc<Config>) -> Self {
        Applier { github, config }
    }

    pub async fn apply(&self, update: &Update) {
        let repo = self.config.github.repository();
        let workflow = &self.config.workflow;

        if let Some(issue) = &update.issue {
            let labels = reconcile_labels(&issue.labels, update.state, workflow);
            if let Err(e) = self
                .github
                .replace_labels(&repo, update.number, &labels)
                .await
            {
                tracing::error!("failed to update labels of {repo}#{}: {e:?}", update.number);
            }
        }

        if let Some(pr) = &update.pull_request {
            let status = NewStatus {
                state: update.state.status(),
                target_url: workflow.context.url.clone(),
                description: workflow.context.description.clone(),
                context: workflow.context.name.clone(),
            };
            if let Err(e) = self
                .github
                .create_commit_status(&repo, &pr.head_sha, &status)
                .await
            {
                tracing::error!(
                    "failed to set {} status on {repo}@{} (#{}): {e:?}",
                    status.state,
                    pr.head_sha,
                    update.number
                );
            }
        }
    }
}

#[async_trait]
impl Process<Update> for Applier {
    async fn process(&self, update: Update) {
        tracing::debug!("applying {update:?}");
        self.apply(&update).await;
    }
}

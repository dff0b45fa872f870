//! Keeps the review state in step with pull request activity.
//!
//! Opening a PR or pushing to it puts it (back) in review; adding or removing
//! labels by hand is mirrored into the commit status.

use async_trait::async_trait;
use tracing as log;

use super::{Context, Decision, EventHandler, HandlerError};
use crate::github::{Issue, PullRequestAction, PullRequestEvent, deserialize_payload};
use crate::notifier::REVERT_COMMENT;
use crate::updater::{IssueSnapshot, PullRequestSnapshot, ReviewState, Update};

pub struct PullRequestHandler;

fn snapshot(labels: impl IntoIterator<Item = String>) -> IssueSnapshot {
    IssueSnapshot {
        labels: labels.into_iter().collect(),
    }
}

async fn fetch_issue(ctx: &Context, number: u64) -> Result<Issue, HandlerError> {
    ctx.github
        .get_issue(&ctx.repository(), number)
        .await
        .map_err(HandlerError::Upstream)
}

#[async_trait]
impl EventHandler for PullRequestHandler {
    async fn handle(&self, ctx: &Context, payload: &str) -> Result<Decision, HandlerError> {
        let event: PullRequestEvent =
            deserialize_payload(payload).map_err(HandlerError::Malformed)?;

        if !ctx.is_own_repository(event.repository.as_ref()) {
            return Ok(Decision::ignore("wrong repository"));
        }

        let workflow = &ctx.config.workflow;
        let number = event.number;
        let (state, issue) = match event.action {
            PullRequestAction::Opened | PullRequestAction::Reopened => {
                let labels = event.pull_request.labels.iter().map(|l| l.name.clone());
                (ReviewState::InReview, snapshot(labels))
            }
            PullRequestAction::Synchronize => {
                let issue = fetch_issue(ctx, number).await?;
                if !issue.has_label(&workflow.in_review.label) {
                    // Races with the label update queued below; at worst the
                    // comment explains a transition that already happened.
                    log::info!("#{number} changed while not in review, reverting");
                    ctx.schedule_comment(number, REVERT_COMMENT);
                }
                (ReviewState::InReview, snapshot(issue.labels.into_iter().map(|l| l.name)))
            }
            PullRequestAction::Labeled | PullRequestAction::Unlabeled => {
                let issue = fetch_issue(ctx, number).await?;
                let state = if issue.has_label(&workflow.approved.label) {
                    ReviewState::Approved
                } else {
                    ReviewState::InReview
                };
                log::debug!(
                    "#{number} {:?} {:?}, now {state:?}",
                    event.action,
                    event.label.as_ref().map(|l| &l.name)
                );
                (state, snapshot(issue.labels.into_iter().map(|l| l.name)))
            }
            PullRequestAction::Other => return Ok(Decision::ignore("invalid action")),
        };

        Ok(Decision::Update(Update {
            number,
            state,
            issue: Some(issue),
            pull_request: Some(PullRequestSnapshot {
                head_sha: event.pull_request.head.sha,
            }),
        }))
    }
}

//! Turns trigger phrases in PR comments into review-state updates.
//!
//! A comment triggers a transition when its trimmed, lower-cased body both
//! starts and ends with a configured phrase. Approval phrases are checked
//! before in-review phrases.

use async_trait::async_trait;
use tracing as log;

use super::{Context, Decision, EventHandler, HandlerError};
use crate::config::{WorkflowConfig, normalize};
use crate::github::{IssueCommentEvent, deserialize_payload};
use crate::updater::{IssueSnapshot, PullRequestSnapshot, ReviewState, Update};

pub struct IssueCommentHandler;

/// Resolves the review state a comment body asks for, if any.
pub fn match_triggers(workflow: &WorkflowConfig, body: &str) -> Option<ReviewState> {
    let body = normalize(body);
    if let Some(trigger) = workflow.approved.triggers.find_bracketing(&body) {
        log::debug!("matched approval trigger {:?}", trigger.phrase);
        return Some(ReviewState::Approved);
    }
    if let Some(trigger) = workflow.in_review.triggers.find_bracketing(&body) {
        log::debug!("matched in-review trigger {:?}", trigger.phrase);
        return Some(ReviewState::InReview);
    }
    None
}

#[async_trait]
impl EventHandler for IssueCommentHandler {
    async fn handle(&self, ctx: &Context, payload: &str) -> Result<Decision, HandlerError> {
        let event: IssueCommentEvent =
            deserialize_payload(payload).map_err(HandlerError::Malformed)?;
        let issue = &event.issue;

        if !ctx.is_own_repository(event.repository.as_ref()) {
            return Ok(Decision::ignore("wrong repository"));
        }
        if !issue.is_pr() {
            return Ok(Decision::ignore("not pr"));
        }
        let body = event.comment.body.as_deref().unwrap_or_default();
        if body.trim().is_empty() {
            return Ok(Decision::ignore("no comment"));
        }

        let workflow = &ctx.config.workflow;
        let Some(state) = match_triggers(workflow, body) else {
            return Ok(Decision::ignore("no lgtm triggers"));
        };
        let label = state.label(workflow);
        if issue.has_label(label) {
            return Ok(Decision::ignore(format!("already labeled: {label}")));
        }
        log::info!(
            "{} on #{} by {} resolves to {state:?}",
            event.comment.html_url,
            issue.number,
            event.comment.user.login
        );

        let pull_request = match ctx
            .github
            .get_pull_request(&ctx.repository(), issue.number)
            .await
        {
            Ok(pr) => Some(PullRequestSnapshot {
                head_sha: pr.head.sha,
            }),
            Err(e) => {
                log::warn!(
                    "no head commit for #{}, updating labels only: {e:?}",
                    issue.number
                );
                None
            }
        };

        Ok(Decision::Update(Update {
            number: issue.number,
            state,
            issue: Some(IssueSnapshot {
                labels: issue.labels().iter().map(|l| l.name.clone()).collect(),
            }),
            pull_request,
        }))
    }
}

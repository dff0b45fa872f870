use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{Config, OverflowPolicy};
use crate::github::{EventName, GithubApi, IssueRepository, Repository};
use crate::notifier::{COMMENT_QUEUE_CAPACITY, CommentPoster, PendingComment};
use crate::pipeline::EventRouter;
use crate::queue::{QueueError, WorkQueue};
use crate::updater::{Applier, Update};

mod issue_comment;
mod ping;
mod pull_request;

pub use issue_comment::{IssueCommentHandler, match_triggers};
pub use ping::PingHandler;
pub use pull_request::PullRequestHandler;

/// What a handler decided to do with an event.
#[derive(Debug, PartialEq, Eq)]
pub enum Decision {
    /// Queue the update; the delivery is answered with `200 Done!`.
    Update(Update),
    /// Nothing to do; the delivery is answered with `204` and this reason.
    Ignore(String),
}

impl Decision {
    pub fn ignore(reason: impl Into<String>) -> Decision {
        Decision::Ignore(reason.into())
    }
}

#[derive(Debug)]
pub enum HandlerError {
    /// The payload could not be decoded.
    Malformed(anyhow::Error),
    /// A GitHub API call needed for the decision failed.
    Upstream(anyhow::Error),
}

impl std::error::Error for HandlerError {}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            HandlerError::Malformed(e) => write!(f, "malformed payload: {e}"),
            HandlerError::Upstream(e) => write!(f, "GitHub request failed: {e}"),
        }
    }
}

/// Decides the review-state transition for one kind of webhook event.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, ctx: &Context, payload: &str) -> Result<Decision, HandlerError>;
}

/// Registers every event handler on a router.
pub fn router(ctx: Arc<Context>) -> EventRouter {
    EventRouter::new(ctx)
        .route(EventName::IssueComment, IssueCommentHandler)
        .route(EventName::PullRequest, PullRequestHandler)
        .route(EventName::Ping, PingHandler)
}

/// State shared by the request handlers and the background workers.
pub struct Context {
    pub github: Arc<dyn GithubApi>,
    pub config: Arc<Config>,
    updates: WorkQueue<Update>,
    comments: WorkQueue<PendingComment>,
}

impl Context {
    /// Creates the context and its queues. Workers are not running until
    /// [`Context::start`] is called.
    pub fn new(github: Arc<dyn GithubApi>, config: Arc<Config>) -> Self {
        Context {
            updates: WorkQueue::new("update", config.queue.capacity),
            comments: WorkQueue::new("comment", COMMENT_QUEUE_CAPACITY),
            github,
            config,
        }
    }

    pub async fn start(&self) {
        self.updates
            .start(Applier::new(self.github.clone(), self.config.clone()))
            .await;
        self.comments
            .start(CommentPoster::new(self.github.clone(), self.repository()))
            .await;
    }

    /// Drains both queues and stops their workers.
    pub async fn shutdown(&self) {
        self.updates.shutdown().await;
        self.comments.shutdown().await;
    }

    pub fn repository(&self) -> IssueRepository {
        self.config.github.repository()
    }

    /// Whether the event came from the configured repository. Payloads
    /// without a repository are accepted.
    pub fn is_own_repository(&self, repository: Option<&Repository>) -> bool {
        repository.is_none_or(|r| self.repository().matches(&r.full_name))
    }

    /// Queues an update according to the configured overflow policy.
    pub async fn enqueue(&self, update: Update) -> Result<(), QueueError> {
        match self.config.queue.overflow {
            OverflowPolicy::Block => self.updates.push(update).await,
            OverflowPolicy::Reject => self.updates.try_push(update),
        }
    }

    /// Schedules a comment without waiting; it is dropped if the comment
    /// queue cannot take it.
    pub fn schedule_comment(&self, number: u64, body: &str) {
        let comment = PendingComment {
            number,
            body: body.to_string(),
        };
        if let Err(e) = self.comments.try_push(comment) {
            tracing::warn!("dropping comment for {}#{number}: {e}", self.repository());
        }
    }
}

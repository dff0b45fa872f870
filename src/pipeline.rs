//! The webhook request pipeline.
//!
//! A [`Pipeline`] is an ordered list of [`Stage`]s. Each stage either answers
//! the request or hands it on to the next one; when every stage passes, the
//! pipeline's fallback produces the answer.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, error, info, warn};

use crate::github::{
    EVENT_HEADER, EventName, SIGNATURE_HEADER, SIGNATURE_SHA256_HEADER, check_payload_signed,
};
use crate::handlers::{Context, Decision, EventHandler, HandlerError};
use crate::queue::QueueError;

/// Header explaining why a request was not acted upon.
pub const REASON_HEADER: &str = "X-Lgtm-Reason";

/// A buffered webhook delivery.
///
/// The body is read from the network once; stages share it by cheap clones.
#[derive(Debug, Clone)]
pub struct WebhookRequest {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl WebhookRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// The answer sent back to GitHub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub status: StatusCode,
    pub reason: Option<String>,
    pub body: &'static str,
}

impl Outcome {
    /// An update was queued.
    pub fn done() -> Outcome {
        Outcome {
            status: StatusCode::OK,
            reason: None,
            body: "Done!",
        }
    }

    /// The request was understood but there is nothing to do.
    pub fn no_content(reason: impl Into<String>) -> Outcome {
        Outcome {
            status: StatusCode::NO_CONTENT,
            reason: Some(reason.into()),
            body: "",
        }
    }

    pub fn bad_request(reason: impl Into<String>) -> Outcome {
        Outcome {
            status: StatusCode::BAD_REQUEST,
            reason: Some(reason.into()),
            body: "",
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Outcome {
        Outcome {
            status: StatusCode::SERVICE_UNAVAILABLE,
            reason: Some(reason.into()),
            body: "",
        }
    }
}

impl IntoResponse for Outcome {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.body).into_response();
        if let Some(value) = self
            .reason
            .as_deref()
            .and_then(|r| HeaderValue::from_str(r).ok())
        {
            response.headers_mut().insert(REASON_HEADER, value);
        }
        response
    }
}

pub enum Flow {
    /// Hand the request to the next stage.
    Continue(WebhookRequest),
    /// Stop here and answer.
    Respond(Outcome),
}

#[async_trait]
pub trait Stage: Send + Sync {
    async fn process(&self, request: WebhookRequest) -> Flow;
}

type Fallback = Box<dyn Fn(&WebhookRequest) -> Outcome + Send + Sync>;

pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
    fallback: Fallback,
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder {
            stages: Vec::new(),
            fallback: None,
        }
    }

    pub async fn run(&self, mut request: WebhookRequest) -> Outcome {
        for stage in &self.stages {
            match stage.process(request).await {
                Flow::Continue(next) => request = next,
                Flow::Respond(outcome) => return outcome,
            }
        }
        (self.fallback)(&request)
    }
}

pub struct PipelineBuilder {
    stages: Vec<Box<dyn Stage>>,
    fallback: Option<Fallback>,
}

impl PipelineBuilder {
    /// Appends a stage; stages run in the order they are added.
    pub fn stage(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn fallback(
        mut self,
        fallback: impl Fn(&WebhookRequest) -> Outcome + Send + Sync + 'static,
    ) -> Self {
        self.fallback = Some(Box::new(fallback));
        self
    }

    pub fn build(self) -> Pipeline {
        Pipeline {
            stages: self.stages,
            fallback: self.fallback.unwrap_or_else(|| Box::new(not_handled)),
        }
    }
}

/// Default fallback: nothing claimed the event.
pub fn not_handled(request: &WebhookRequest) -> Outcome {
    let event = request.header(EVENT_HEADER).unwrap_or("none");
    Outcome::no_content(format!("unhandled event {event}"))
}

/// Only `POST` deliveries go any further.
pub struct MethodGuard;

#[async_trait]
impl Stage for MethodGuard {
    async fn process(&self, request: WebhookRequest) -> Flow {
        if request.method != Method::POST {
            info!("ignoring {} request, must be POST", request.method);
            return Flow::Respond(Outcome::no_content("not post"));
        }
        Flow::Continue(request)
    }
}

/// Rejects deliveries whose HMAC signature does not match the shared secret.
pub struct SignatureValidator {
    secret: SecretString,
}

impl SignatureValidator {
    pub fn new(secret: SecretString) -> Self {
        SignatureValidator { secret }
    }
}

#[async_trait]
impl Stage for SignatureValidator {
    async fn process(&self, request: WebhookRequest) -> Flow {
        let event = request.header(EVENT_HEADER).unwrap_or("none");
        let Some(signature) = request
            .header(SIGNATURE_SHA256_HEADER)
            .or_else(|| request.header(SIGNATURE_HEADER))
        else {
            warn!(event, "webhook delivery without signature");
            return Flow::Respond(Outcome::bad_request("bad signature"));
        };
        debug!("signature={signature}");

        if let Err(err) = check_payload_signed(
            signature,
            &request.body,
            self.secret.expose_secret().as_bytes(),
        ) {
            warn!(event, body_len = request.body.len(), "check_payload_signed: {err}");
            return Flow::Respond(Outcome::bad_request("bad signature"));
        }
        Flow::Continue(request)
    }
}

/// Dispatches a delivery to the handler registered for its event name.
pub struct EventRouter {
    ctx: Arc<Context>,
    handlers: HashMap<EventName, Box<dyn EventHandler>>,
}

impl EventRouter {
    pub fn new(ctx: Arc<Context>) -> Self {
        EventRouter {
            ctx,
            handlers: HashMap::new(),
        }
    }

    pub fn route(mut self, event: EventName, handler: impl EventHandler + 'static) -> Self {
        self.handlers.insert(event, Box::new(handler));
        self
    }
}

#[async_trait]
impl Stage for EventRouter {
    async fn process(&self, request: WebhookRequest) -> Flow {
        let Some(name) = request.header(EVENT_HEADER) else {
            debug!("{EVENT_HEADER} header missing");
            return Flow::Continue(request);
        };
        let event = name.parse().unwrap_or(EventName::Other);
        let handler = self.handlers.get(&event);
        info!(event = name, recognized = handler.is_some(), "webhook event");
        let Some(handler) = handler else {
            return Flow::Continue(request);
        };

        let Ok(payload) = std::str::from_utf8(&request.body) else {
            warn!(event = name, "payload not utf-8");
            return Flow::Respond(Outcome::bad_request("payload must be UTF-8"));
        };

        let outcome = match handler.handle(&self.ctx, payload).await {
            Ok(Decision::Update(update)) => {
                let number = update.number;
                match self.ctx.enqueue(update).await {
                    Ok(()) => {
                        info!(
                            "queued review update for {}#{number}",
                            self.ctx.repository()
                        );
                        Outcome::done()
                    }
                    Err(QueueError::Full) => {
                        warn!("update queue full, rejecting {event} for #{number}");
                        Outcome::unavailable("update queue full")
                    }
                    Err(QueueError::Closed) => {
                        warn!("update queue closed, rejecting {event} for #{number}");
                        Outcome::unavailable("shutting down")
                    }
                }
            }
            Ok(Decision::Ignore(reason)) => {
                info!("{event} no update: {reason}");
                Outcome::no_content(reason)
            }
            Err(HandlerError::Malformed(err)) => {
                warn!("{event} payload rejected: {err:?}");
                Outcome::bad_request(format!("{event} fmt"))
            }
            Err(HandlerError::Upstream(err)) => {
                error!("{event} decision failed: {err:?}");
                Outcome::no_content("upstream error")
            }
        };
        Flow::Respond(outcome)
    }
}

#![allow(clippy::new_without_default)]

use std::sync::Arc;

use axum::Router;
use axum::http::Request;
use axum::routing::{any, get};
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

pub mod config;
pub mod github;
pub mod handlers;
pub mod notifier;
pub mod pipeline;
pub mod queue;
pub mod updater;

#[cfg(test)]
mod tests;

pub use handlers::Context;

use pipeline::{MethodGuard, Pipeline, SignatureValidator};

/// Builds the webhook pipeline: method guard, signature check, then dispatch
/// by event name.
pub fn pipeline(ctx: Arc<Context>) -> Pipeline {
    Pipeline::builder()
        .stage(MethodGuard)
        .stage(SignatureValidator::new(ctx.config.github.secret.clone()))
        .stage(handlers::router(ctx))
        .build()
}

/// The HTTP application served by the `lgtmbot` binary.
pub fn app(ctx: Arc<Context>) -> Router {
    Router::new()
        .route("/", get(|| async { "lgtmbot is up!" }))
        .route("/github-hook", any(github::webhook))
        .with_state(Arc::new(pipeline(ctx)))
        .layer(
            ServiceBuilder::new()
                .layer(CatchPanicLayer::new())
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http().make_span_with(
                    |request: &Request<axum::body::Body>| {
                        let request_id = request
                            .headers()
                            .get("x-request-id")
                            .and_then(|v| v.to_str().ok())
                            .unwrap_or_default();
                        tracing::info_span!(
                            "request",
                            method = %request.method(),
                            uri = %request.uri(),
                            request_id,
                        )
                    },
                ))
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
}

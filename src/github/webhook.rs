use std::{fmt, sync::Arc};

use anyhow::Context as _;
use axum::extract::State;
use axum::http::{HeaderMap, Method};
use bytes::Bytes;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::Sha256;

use crate::pipeline::{Outcome, Pipeline, WebhookRequest};

pub mod event;

/// Header carrying the name of the webhook event.
pub const EVENT_HEADER: &str = "X-GitHub-Event";
/// Header carrying `sha256=<hex>`.
pub const SIGNATURE_SHA256_HEADER: &str = "X-Hub-Signature-256";
/// Legacy header carrying `sha1=<hex>`.
pub const SIGNATURE_HEADER: &str = "X-Hub-Signature";

/// The name of a webhook event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventName {
    /// Pull request activity.
    ///
    /// <https://docs.github.com/en/webhooks/webhook-events-and-payloads#pull_request>
    PullRequest,
    /// An issue or PR comment.
    ///
    /// <https://docs.github.com/en/webhooks/webhook-events-and-payloads#issue_comment>
    IssueComment,
    /// Sent when the webhook is first configured.
    Ping,
    /// All other unhandled webhooks.
    Other,
}

impl std::str::FromStr for EventName {
    type Err = std::convert::Infallible;
    fn from_str(s: &str) -> Result<EventName, Self::Err> {
        Ok(match s {
            "issue_comment" => EventName::IssueComment,
            "pull_request" => EventName::PullRequest,
            "ping" => EventName::Ping,
            _ => EventName::Other,
        })
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                EventName::IssueComment => "issue_comment",
                EventName::PullRequest => "pull_request",
                EventName::Ping => "ping",
                EventName::Other => "other",
            }
        )
    }
}

pub fn deserialize_payload<T: serde::de::DeserializeOwned>(v: &str) -> anyhow::Result<T> {
    let mut deserializer = serde_json::Deserializer::from_str(v);
    let res: Result<T, _> = serde_path_to_error::deserialize(&mut deserializer);
    match res {
        Ok(r) => Ok(r),
        Err(e) => {
            let ctx = format!("at {}", e.path());
            Err(e.into_inner()).context(ctx)
        }
    }
}

/// Entry point for webhook deliveries.
pub async fn webhook(
    State(pipeline): State<Arc<Pipeline>>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Outcome {
    pipeline
        .run(WebhookRequest {
            method,
            headers,
            body,
        })
        .await
}

#[derive(Debug)]
pub struct SignedPayloadError;

impl fmt::Display for SignedPayloadError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "failed to validate payload")
    }
}

impl std::error::Error for SignedPayloadError {}

/// Checks `signature` (`sha256=<hex>`, or the legacy `sha1=<hex>`) against
/// the HMAC of `payload` keyed with `secret`.
pub fn check_payload_signed(
    signature: &str,
    payload: &[u8],
    secret: &[u8],
) -> Result<(), SignedPayloadError> {
    if let Some(digest) = signature.strip_prefix("sha256=") {
        let mut mac = Hmac::<Sha256>::new_from_slice(secret).map_err(|_| SignedPayloadError)?;
        mac.update(payload);
        return mac
            .verify_slice(&decode_digest(digest)?)
            .map_err(|_| SignedPayloadError);
    }

    // The legacy algorithm prefix (`sha1=` or `sha1:`) is five characters wide.
    let (Some(algorithm), Some(digest)) = (signature.get(..5), signature.get(5..)) else {
        tracing::trace!("signature {signature:?} too short");
        return Err(SignedPayloadError);
    };
    if algorithm != "sha1=" && algorithm != "sha1:" {
        tracing::trace!("unsupported signature algorithm {algorithm:?}");
        return Err(SignedPayloadError);
    }
    let mut mac = Hmac::<Sha1>::new_from_slice(secret).map_err(|_| SignedPayloadError)?;
    mac.update(payload);
    mac.verify_slice(&decode_digest(digest)?)
        .map_err(|_| SignedPayloadError)
}

fn decode_digest(digest: &str) -> Result<Vec<u8>, SignedPayloadError> {
    hex::decode(digest).map_err(|e| {
        tracing::trace!("hex decode failed for {digest:?}: {e:?}");
        SignedPayloadError
    })
}

/// Produces the `X-Hub-Signature-256` value GitHub would send for `payload`.
pub fn sign_payload(secret: &[u8], payload: &[u8]) -> String {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(payload);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

use std::collections::HashMap;
use std::sync::Arc;

use bon::builder;
use serde_json::json;

use crate::config::{Config, OverflowPolicy};
use crate::handlers::Context;


use github::FakeGithub;

pub const SECRET: &str = "matrix";

pub fn test_config() -> Config {
    let env: HashMap<&str, &str> = HashMap::from([
        ("LGTM_GITHUB_SECRET", SECRET),
        ("LGTM_GITHUB_AUTH_TOKEN", "keymaker"),
        ("LGTM_GITHUB_OWNER", "garukun"),
        ("LGTM_GITHUB_REPO", "golgtm"),
    ]);
    Config::from_lookup(|var| env.get(var).map(|v| v.to_string()))
        .expect("test configuration is valid")
}

pub fn test_context(github: Arc<FakeGithub>) -> Context {
    Context::new(github, Arc::new(test_config()))
}

pub fn test_context_with(
    github: Arc<FakeGithub>,
    capacity: usize,
    overflow: OverflowPolicy,
) -> Context {
    let mut config = test_config();
    config.queue.capacity = capacity;
    config.queue.overflow = overflow;
    Context::new(github, Arc::new(config))
}

fn label_values(labels: Option<&[&str]>) -> serde_json::Value {
    labels
        .unwrap_or_default()
        .iter()
        .map(|name| json!({"name": name}))
        .collect()
}

/// An `issue_comment` delivery.
#[builder]
pub fn comment_payload(
    number: Option<u64>,
    body: Option<&str>,
    labels: Option<&[&str]>,
    pr: Option<bool>,
    repo: Option<&str>,
) -> String {
    let number = number.unwrap_or(1);
    let pull_request = pr
        .unwrap_or(true)
        .then(|| json!({"url": format!("https://api.github.com/repos/garukun/golgtm/pulls/{number}")}));
    json!({
        "action": "created",
        "issue": {
            "number": number,
            "title": "Add trigger parsing",
            "html_url": format!("https://github.com/garukun/golgtm/pull/{number}"),
            "labels": label_values(labels),
            "pull_request": pull_request,
        },
        "comment": {
            "body": body,
            "html_url": format!("https://github.com/garukun/golgtm/pull/{number}#issuecomment-1"),
            "user": {"login": "reviewer", "id": 2},
        },
        "repository": {"full_name": repo.unwrap_or("garukun/golgtm")},
    })
    .to_string()
}

/// A `pull_request` delivery.
#[builder]
pub fn pull_request_payload(
    action: Option<&str>,
    number: Option<u64>,
    sha: Option<&str>,
    labels: Option<&[&str]>,
    repo: Option<&str>,
) -> String {
    let number = number.unwrap_or(1);
    json!({
        "action": action.unwrap_or("opened"),
        "number": number,
        "pull_request": {
            "number": number,
            "title": "Add trigger parsing",
            "html_url": format!("https://github.com/garukun/golgtm/pull/{number}"),
            "head": {"sha": sha.unwrap_or("0000000"), "ref": "topic"},
            "labels": label_values(labels),
        },
        "repository": {"full_name": repo.unwrap_or("garukun/golgtm")},
        "sender": {"login": "author", "id": 3},
    })
    .to_string()
}

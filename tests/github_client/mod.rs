//! `GithubClient` tests.
//!
//! These tests point a `GithubClient` at the test HTTP server, execute some
//! action, and validate both the result and the request that was sent.

use super::common::{Events, HttpServer, HttpServerHandle, Method::*, Response, TestBuilder};
use lgtmbot::github::{GithubApi, GithubClient, IssueRepository, NewStatus, StatusState};
use serde_json::json;
use std::future::Future;

/// A context used for running a test.
struct GhTestCtx {
    gh: GithubClient,
    events: Events,
    #[allow(dead_code)] // held for drop
    server: HttpServerHandle,
}

fn repo() -> IssueRepository {
    IssueRepository {
        organization: "garukun".to_string(),
        repository: "golgtm".to_string(),
    }
}

/// The main entry point for a test.
fn run_test<F, Fut>(builder: TestBuilder, f: F) -> Events
where
    F: FnOnce(GithubClient) -> Fut,
    Fut: Future<Output = ()>,
{
    builder.maybe_enable_logging();
    let events = Events::new();
    let server = HttpServer::new(builder.api_handlers, events.clone());
    let ctx = GhTestCtx {
        gh: GithubClient::new(
            "sekrit-token".to_string().into(),
            format!("http://{}/", server.addr),
        ),
        events,
        server,
    };
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(f(ctx.gh));
    ctx.events
}

#[test]
fn get_issue() {
    let builder = TestBuilder::default().api_handler(
        GET,
        "repos/garukun/golgtm/issues/{number}",
        |req| {
            assert_eq!(req.components["number"], "17");
            Response::new().json(json!({
                "number": 17,
                "title": "Teach the bot to count",
                "html_url": "https://github.com/garukun/golgtm/pull/17",
                "labels": [{"name": "Needs Review"}, {"name": "bug"}],
                "pull_request": {"url": "https://api.github.com/repos/garukun/golgtm/pulls/17"},
                "user": {"login": "octocat", "id": 1},
            }))
        },
    );
    let events = run_test(builder, |gh| async move {
        let issue = gh.get_issue(&repo(), 17).await.unwrap();
        assert_eq!(issue.number, 17);
        assert!(issue.is_pr());
        assert!(issue.has_label("Needs Review"));
        assert_eq!(issue.labels().len(), 2);
    });
    let requests = events.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].headers["authorization"], "token sekrit-token");
    assert_eq!(requests[0].headers["user-agent"], "lgtmbot");
}

#[test]
fn get_pull_request() {
    let builder = TestBuilder::default().api_handler(
        GET,
        "repos/garukun/golgtm/pulls/{number}",
        |_req| {
            Response::new().json(json!({
                "number": 17,
                "title": "Teach the bot to count",
                "head": {"sha": "6dcb09b5b57875f334f61aebed695e2e4193db5e", "ref": "counting"},
                "labels": [],
            }))
        },
    );
    run_test(builder, |gh| async move {
        let pr = gh.get_pull_request(&repo(), 17).await.unwrap();
        assert_eq!(pr.head.sha, "6dcb09b5b57875f334f61aebed695e2e4193db5e");
        assert_eq!(pr.head.git_ref, "counting");
    });
}

#[test]
fn replace_labels() {
    let builder = TestBuilder::default().api_handler(
        PUT,
        "repos/garukun/golgtm/issues/{number}/labels",
        |_req| Response::new().json(json!([{"name": "bug"}, {"name": "Ready"}])),
    );
    let events = run_test(builder, |gh| async move {
        gh.replace_labels(&repo(), 3, &["bug".to_string(), "Ready".to_string()])
            .await
            .unwrap();
    });
    events.assert_eq(&[(PUT, "/repos/garukun/golgtm/issues/3/labels")]);
    assert_eq!(
        events.requests()[0].json(),
        json!({"labels": ["bug", "Ready"]})
    );
}

#[test]
fn add_comment() {
    let builder = TestBuilder::default().api_handler(
        POST,
        "repos/garukun/golgtm/issues/{number}/comments",
        |_req| Response::new().code(201).json(json!({"id": 1})),
    );
    let events = run_test(builder, |gh| async move {
        gh.add_comment(&repo(), 3, "Files changed in PR, reverting code review status.")
            .await
            .unwrap();
    });
    assert_eq!(
        events.requests()[0].json(),
        json!({"body": "Files changed in PR, reverting code review status."})
    );
}

#[test]
fn create_commit_status() {
    let builder = TestBuilder::default().api_handler(
        POST,
        "repos/garukun/golgtm/statuses/{sha}",
        |_req| Response::new().code(201).json(json!({"id": 1})),
    );
    let events = run_test(builder, |gh| async move {
        let status = NewStatus {
            state: StatusState::Pending,
            target_url: "https://github.com/garukun/golgtm".to_string(),
            description: "LGTM Code Review workflow.".to_string(),
            context: "LGTM Code Review".to_string(),
        };
        gh.create_commit_status(&repo(), "abc123", &status)
            .await
            .unwrap();
    });
    events.assert_eq(&[(POST, "/repos/garukun/golgtm/statuses/abc123")]);
    assert_eq!(
        events.requests()[0].json(),
        json!({
            "state": "pending",
            "target_url": "https://github.com/garukun/golgtm",
            "description": "LGTM Code Review workflow.",
            "context": "LGTM Code Review",
        })
    );
}

#[test]
fn api_errors_carry_response() {
    let builder = TestBuilder::default().api_handler(
        GET,
        "repos/garukun/golgtm/issues/{number}",
        |_req| Response::new().code(500).json(json!({"message": "boom"})),
    );
    run_test(builder, |gh| async move {
        let err = gh.get_issue(&repo(), 1).await.unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("failed to get issue 1"), "{msg}");
        assert!(msg.contains("boom"), "{msg}");
    });

    // No handler registered: the test server answers 404.
    run_test(TestBuilder::default(), |gh| async move {
        assert!(gh.get_pull_request(&repo(), 1).await.is_err());
    });
}

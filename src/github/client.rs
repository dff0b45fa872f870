use anyhow::Context as _;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderValue, USER_AGENT};
use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};

use super::{GithubApi, Issue, IssueRepository, NewStatus, PullRequest};

#[derive(Clone)]
pub struct GithubClient {
    token: SecretString,
    client: Client,
    pub(crate) api_url: String,
}

impl GithubClient {
    pub fn new(token: SecretString, api_url: String) -> Self {
        GithubClient {
            client: Client::new(),
            token,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    async fn send_req(&self, req: RequestBuilder) -> anyhow::Result<(Bytes, String)> {
        tracing::debug!("send_req with {:?}", req);
        let req_dbg = format!("{req:?}");
        let req = req
            .build()
            .with_context(|| format!("building reqwest {req_dbg}"))?;

        let resp = self.client.execute(req).await?;
        let maybe_err = resp.error_for_status_ref().err();
        let body = resp
            .bytes()
            .await
            .with_context(|| format!("failed to read response body {req_dbg}"))?;
        if let Some(e) = maybe_err {
            return Err(anyhow::Error::new(e))
                .with_context(|| format!("response: {}", String::from_utf8_lossy(&body)));
        }

        Ok((body, req_dbg))
    }

    pub async fn json<T>(&self, req: RequestBuilder) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let (body, req_dbg) = self.send_req(req).await?;
        serde_json::from_slice(&body).with_context(|| format!("failed to decode response to {req_dbg}"))
    }

    fn get(&self, url: &str) -> RequestBuilder {
        tracing::trace!("get {:?}", url);
        self.client.get(url).configure(self)
    }

    fn post(&self, url: &str) -> RequestBuilder {
        tracing::trace!("post {:?}", url);
        self.client.post(url).configure(self)
    }

    fn put(&self, url: &str) -> RequestBuilder {
        tracing::trace!("put {:?}", url);
        self.client.put(url).configure(self)
    }
}

#[async_trait]
impl GithubApi for GithubClient {
    async fn get_issue(&self, repo: &IssueRepository, number: u64) -> anyhow::Result<Issue> {
        let url = format!("{}/issues/{number}", repo.url(self));
        self.json(self.get(&url))
            .await
            .with_context(|| format!("{repo} failed to get issue {number}"))
    }

    async fn get_pull_request(
        &self,
        repo: &IssueRepository,
        number: u64,
    ) -> anyhow::Result<PullRequest> {
        let url = format!("{}/pulls/{number}", repo.url(self));
        self.json(self.get(&url))
            .await
            .with_context(|| format!("{repo} failed to get pull request {number}"))
    }

    async fn replace_labels(
        &self,
        repo: &IssueRepository,
        number: u64,
        labels: &[String],
    ) -> anyhow::Result<()> {
        tracing::info!("replace_labels: {repo}#{number} = {labels:?}");
        // PUT /repos/:owner/:repo/issues/:number/labels
        let url = format!("{}/issues/{number}/labels", repo.url(self));

        #[derive(serde::Serialize)]
        struct LabelsReq<'a> {
            labels: &'a [String],
        }

        self.send_req(self.put(&url).json(&LabelsReq { labels }))
            .await
            .with_context(|| format!("failed to replace labels of {repo}#{number}"))?;
        Ok(())
    }

    async fn add_comment(
        &self,
        repo: &IssueRepository,
        number: u64,
        body: &str,
    ) -> anyhow::Result<()> {
        #[derive(serde::Serialize)]
        struct PostComment<'a> {
            body: &'a str,
        }
        let url = format!("{}/issues/{number}/comments", repo.url(self));
        self.send_req(self.post(&url).json(&PostComment { body }))
            .await
            .with_context(|| format!("failed to post comment on {repo}#{number}"))?;
        Ok(())
    }

    async fn create_commit_status(
        &self,
        repo: &IssueRepository,
        sha: &str,
        status: &NewStatus,
    ) -> anyhow::Result<()> {
        tracing::info!("create_commit_status: {repo}@{sha} {}", status.state);
        let url = format!("{}/statuses/{sha}", repo.url(self));
        self.send_req(self.post(&url).json(status))
            .await
            .with_context(|| format!("failed to create {} status on {repo}@{sha}", status.state))?;
        Ok(())
    }
}

trait RequestSend: Sized {
    fn configure(self, g: &GithubClient) -> Self;
}

impl RequestSend for RequestBuilder {
    fn configure(self, g: &GithubClient) -> RequestBuilder {
        let auth = HeaderValue::from_str(&format!("token {}", g.token.expose_secret()));
        let builder = self
            .header(USER_AGENT, "lgtmbot")
            .header(ACCEPT, "application/vnd.github+json");
        match auth {
            Ok(mut auth) => {
                auth.set_sensitive(true);
                builder.header(AUTHORIZATION, auth)
            }
            // GitHub answers 401, which surfaces as a regular API error.
            Err(_) => {
                tracing::error!("GitHub token is not a valid header value");
                builder
            }
        }
    }
}

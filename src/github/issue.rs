/// An issue or pull request, as seen through the issues API.
///
/// The `pull_request` field can be used to determine which it is.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct Issue {
    pub number: u64,
    #[serde(default)]
    pub title: String,
    /// The common URL for viewing this issue or PR.
    ///
    /// Example: `https://github.com/octocat/Hello-World/pull/1347`
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub labels: Vec<Label>,
    /// Indicator if this is a pull request.
    ///
    /// This is `Some` if this is a PR (as opposed to an issue).
    #[serde(default)]
    pub pull_request: Option<PullRequestLinks>,
}

impl Issue {
    pub fn is_pr(&self) -> bool {
        self.pull_request.is_some()
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn has_label(&self, name: &str) -> bool {
        self.labels.iter().any(|l| l.name == name)
    }
}

#[derive(PartialEq, Eq, Debug, Clone, Ord, PartialOrd, serde::Deserialize, serde::Serialize)]
pub struct Label {
    pub name: String,
}

/// Links GitHub attaches to issues that are pull requests. None of them are
/// needed beyond their presence.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct PullRequestLinks {
    pub url: Option<String>,
    pub html_url: Option<String>,
}

/// A pull request, as seen through the pulls API and `pull_request` events.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct PullRequest {
    pub number: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub html_url: String,
    /// The head commit for a PR (the branch from the source repo).
    pub head: CommitBase,
    #[serde(default)]
    pub labels: Vec<Label>,
}

#[derive(Clone, Debug, serde::Deserialize)]
pub struct CommitBase {
    pub sha: String,
    #[serde(rename = "ref")]
    pub git_ref: String,
}

#[derive(PartialEq, Eq, Debug, Clone, serde::Deserialize)]
pub struct User {
    pub login: String,
    pub id: u64,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Comment {
    /// GitHub sends `null` for comments without a body.
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub html_url: String,
    pub user: User,
}

/// The state of a commit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusState {
    Pending,
    Success,
}

impl std::fmt::Display for StatusState {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(match self {
            StatusState::Pending => "pending",
            StatusState::Success => "success",
        })
    }
}

/// Request body for `POST /repos/{owner}/{repo}/statuses/{sha}`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct NewStatus {
    pub state: StatusState,
    pub target_url: String,
    pub description: String,
    pub context: String,
}

use crate::github::IssueRepository;
use secrecy::SecretString;
use std::fmt;
use std::str::FromStr;

mod triggers;

pub use triggers::{Trigger, TriggerError, TriggerSet, normalize};

const DEFAULT_API_URL: &str = "https://api.github.com";
const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Service configuration, loaded once at startup and shared by reference.
#[derive(Debug)]
pub struct Config {
    pub github: GithubConfig,
    pub workflow: WorkflowConfig,
    pub queue: QueueConfig,
}

#[derive(Debug)]
pub struct GithubConfig {
    /// Shared secret used to sign webhook deliveries.
    pub secret: SecretString,
    pub token: SecretString,
    pub owner: String,
    pub repo: String,
    pub api_url: String,
}

impl GithubConfig {
    pub fn repository(&self) -> IssueRepository {
        IssueRepository {
            organization: self.owner.clone(),
            repository: self.repo.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowConfig {
    pub context: StatusContext,
    pub in_review: WorkflowLabel,
    pub approved: WorkflowLabel,
}

/// The commit status written for every pull request update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusContext {
    pub name: String,
    pub description: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowLabel {
    pub label: String,
    pub triggers: TriggerSet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueConfig {
    pub capacity: usize,
    pub overflow: OverflowPolicy,
}

/// What a webhook request does when the update queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Wait for the applier to make room.
    #[default]
    Block,
    /// Answer `503 Service Unavailable` right away.
    Reject,
}

impl FromStr for OverflowPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<OverflowPolicy, String> {
        match s.trim().to_ascii_lowercase().as_str() {
            "block" => Ok(OverflowPolicy::Block),
            "reject" => Ok(OverflowPolicy::Reject),
            _ => Err("expected `block` or `reject`".to_string()),
        }
    }
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Config, ConfigError> {
        Config::from_lookup(|var| std::env::var(var).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |var: &'static str| {
            lookup(var)
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(var))
        };
        let or_default = |var: &str, default: &str| lookup(var).unwrap_or_else(|| default.to_string());
        let triggers = |var: &'static str, default: &str| {
            let value = or_default(var, default);
            value
                .parse::<TriggerSet>()
                .map_err(|source| ConfigError::Trigger { var, value, source })
        };

        let github = GithubConfig {
            secret: required("LGTM_GITHUB_SECRET")?.into(),
            token: required("LGTM_GITHUB_AUTH_TOKEN")?.into(),
            owner: required("LGTM_GITHUB_OWNER")?,
            repo: required("LGTM_GITHUB_REPO")?,
            api_url: parse_url("GITHUB_API_URL", or_default("GITHUB_API_URL", DEFAULT_API_URL))?
                .trim_end_matches('/')
                .to_string(),
        };

        let workflow = WorkflowConfig {
            context: StatusContext {
                name: or_default("LGTM_WORKFLOW_CONTEXT_NAME", "LGTM Code Review"),
                description: or_default("LGTM_WORKFLOW_CONTEXT_DESC", "LGTM Code Review workflow."),
                url: parse_url(
                    "LGTM_WORKFLOW_CONTEXT_URL",
                    or_default(
                        "LGTM_WORKFLOW_CONTEXT_URL",
                        "https://github.com/garukun/golgtm",
                    ),
                )?,
            },
            in_review: WorkflowLabel {
                label: or_default("LGTM_WORKFLOW_INREVIEW_LABEL", "Needs Review"),
                triggers: triggers(
                    "LGTM_WORKFLOW_INREVIEW_TRIGGER",
                    "ptal:1,please review:1,:-1::1",
                )?,
            },
            approved: WorkflowLabel {
                label: or_default("LGTM_WORKFLOW_APPROVED_LABEL", "Ready"),
                triggers: triggers("LGTM_WORKFLOW_APPROVED_TRIGGER", "lgtm:1,:+1::1")?,
            },
        };
        if workflow.in_review.label == workflow.approved.label {
            return Err(ConfigError::Invalid {
                var: "LGTM_WORKFLOW_APPROVED_LABEL",
                value: workflow.approved.label,
                reason: "must differ from the in-review label".to_string(),
            });
        }

        let capacity = match lookup("LGTM_QUEUE_CAPACITY") {
            None => DEFAULT_QUEUE_CAPACITY,
            Some(value) => match value.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "LGTM_QUEUE_CAPACITY",
                        value,
                        reason: "expected a positive integer".to_string(),
                    });
                }
            },
        };
        let overflow = match lookup("LGTM_QUEUE_OVERFLOW") {
            None => OverflowPolicy::default(),
            Some(value) => value.parse().map_err(|reason| ConfigError::Invalid {
                var: "LGTM_QUEUE_OVERFLOW",
                value,
                reason,
            })?,
        };

        Ok(Config {
            github,
            workflow,
            queue: QueueConfig { capacity, overflow },
        })
    }
}

fn parse_url(var: &'static str, value: String) -> Result<String, ConfigError> {
    match url::Url::parse(&value) {
        Ok(_) => Ok(value),
        Err(e) => Err(ConfigError::Invalid {
            var,
            value,
            reason: e.to_string(),
        }),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Trigger {
        var: &'static str,
        value: String,
        source: TriggerError,
    },
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Trigger { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Missing(var) => write!(f, "missing required environment variable {var}"),
            ConfigError::Trigger { var, value, source } => {
                write!(f, "{var}={value:?} is not a valid trigger list: {source}")
            }
            ConfigError::Invalid { var, value, reason } => {
                write!(f, "{var}={value:?} is invalid: {reason}")
            }
        }
    }
}

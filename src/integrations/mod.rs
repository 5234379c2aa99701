//! Provider Integrations
//!
//! Adapters translating one capability set onto the GitHub and GitLab REST APIs.
//!
//! # Overview
//!
//! Both adapters accept the same `IssueRequest` and produce the same
//! `IssueResponse`, hiding each provider's endpoint layout, payload field names
//! and status vocabulary:
//!
//! | | GitHub | GitLab |
//! |---|---|---|
//! | issue id | `number` | `iid` |
//! | web link | `html_url` | `web_url` |
//! | description field | `body` | `description` |
//! | close | `PATCH {state: closed}` | `PUT {state_event: close}` |
//!
//! # Failure model
//!
//! Create, update and list propagate every failure as a `TrackerError`.
//! Close reports failure as `false` instead; callers decide what that means.
//! Nothing is retried.

pub mod github;
pub mod gitlab;

pub use github::GitHubAdapter;
pub use gitlab::GitLabAdapter;

use crate::config::HttpSettings;
use crate::issue::{IssueRequest, IssueResponse};
use crate::{Result, TrackerError};
use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Deserializer};
use std::str::FromStr;

/// Supported upstream providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    GitHub,
    GitLab,
}

impl Provider {
    pub const ALL: [Provider; 2] = [Provider::GitHub, Provider::GitLab];

    pub fn default_api_url(self) -> &'static str {
        match self {
            Provider::GitHub => "https://api.github.com",
            Provider::GitLab => "https://gitlab.com/api/v4",
        }
    }

    pub fn default_token_env(self) -> &'static str {
        match self {
            Provider::GitHub => "GITHUB_TOKEN",
            Provider::GitLab => "GITLAB_TOKEN",
        }
    }

    /// Lowercase name used in config sections and routes
    pub fn config_key(self) -> &'static str {
        match self {
            Provider::GitHub => "github",
            Provider::GitLab => "gitlab",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::GitHub => write!(f, "GitHub"),
            Provider::GitLab => write!(f, "GitLab"),
        }
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "github" | "gh" => Ok(Provider::GitHub),
            "gitlab" | "gl" => Ok(Provider::GitLab),
            other => Err(format!(
                "Unknown provider '{}'. Must be one of: github, gitlab",
                other
            )),
        }
    }
}

/// Capability being exercised, carried in errors and logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Update,
    Close,
    List,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Close => "close",
            Operation::List => "list",
        };
        f.write_str(name)
    }
}

/// Issue capabilities every provider adapter offers
#[async_trait]
pub trait IssueTracker: Send + Sync {
    fn provider(&self) -> Provider;

    /// Create an issue; the returned status is always `Open`
    async fn create_issue(&self, repository: &str, request: &IssueRequest)
        -> Result<IssueResponse>;

    /// Replace title and description of an existing issue
    async fn update_issue(
        &self,
        repository: &str,
        issue_number: u64,
        request: &IssueRequest,
    ) -> Result<IssueResponse>;

    /// Close an issue, `true` only if upstream confirmed with a success status
    async fn close_issue(&self, repository: &str, issue_number: u64) -> bool;
}

/// Providers that can also enumerate a project's issues
#[async_trait]
pub trait IssueLister: IssueTracker {
    /// First page of issues, in upstream order
    async fn list_issues(&self, repository: &str) -> Result<Vec<IssueResponse>>;
}

/// Build an HTTP client that authenticates every request with `token`
pub(crate) fn authorized_client(
    token: &str,
    http: &HttpSettings,
    mut headers: header::HeaderMap,
) -> Result<Client> {
    let mut auth = header::HeaderValue::from_str(&format!("Bearer {}", token))
        .map_err(|_| TrackerError::Config("Token contains invalid characters".to_string()))?;
    auth.set_sensitive(true);
    headers.insert(header::AUTHORIZATION, auth);

    let user_agent = header::HeaderValue::from_str(&http.user_agent).map_err(|_| {
        TrackerError::Config(format!("Invalid user agent: {}", http.user_agent))
    })?;
    headers.insert(header::USER_AGENT, user_agent);

    let client = Client::builder()
        .timeout(http.timeout())
        .default_headers(headers)
        .build()?;

    Ok(client)
}

/// `repo` or `repo#12`, used as the error/log target
pub(crate) fn target(repository: &str, issue_number: Option<u64>) -> String {
    match issue_number {
        Some(number) => format!("{}#{}", repository, number),
        None => repository.to_string(),
    }
}

/// Keeps an explicit JSON `null` (`Some(None)`) apart from a missing key (`None`)
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_from_str() {
        assert_eq!("github".parse::<Provider>().unwrap(), Provider::GitHub);
        assert_eq!("GitLab".parse::<Provider>().unwrap(), Provider::GitLab);
        assert_eq!("gl".parse::<Provider>().unwrap(), Provider::GitLab);
        assert!("bitbucket".parse::<Provider>().is_err());
    }

    #[test]
    fn test_display_names() {
        assert_eq!(Provider::GitHub.to_string(), "GitHub");
        assert_eq!(Operation::Close.to_string(), "close");
    }

    #[test]
    fn test_target_format() {
        assert_eq!(target("octo/repo", Some(3)), "octo/repo#3");
        assert_eq!(target("42", None), "42");
    }

    #[test]
    fn test_authorized_client_rejects_bad_token() {
        let err = authorized_client("bad\ntoken", &HttpSettings::default(), Default::default())
            .unwrap_err();
        assert!(matches!(err, TrackerError::Config(_)));
    }

    #[test]
    fn test_nullable_distinguishes_null_from_missing() {
        #[derive(Deserialize)]
        struct Probe {
            #[serde(default, deserialize_with = "nullable")]
            url: Option<Option<String>>,
        }

        let missing: Probe = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.url, None);

        let null: Probe = serde_json::from_str(r#"{"url": null}"#).unwrap();
        assert_eq!(null.url, Some(None));

        let set: Probe = serde_json::from_str(r#"{"url": "x"}"#).unwrap();
        assert_eq!(set.url, Some(Some("x".to_string())));
    }
}

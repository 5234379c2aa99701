//! GitHub Issues Integration Adapter
//!
//! Create, update and close issues through the GitHub REST API
//! (`/repos/{owner}/{repo}/issues`).

use super::{authorized_client, nullable, target, IssueTracker, Operation, Provider};
use crate::config::{HttpSettings, ProviderSettings, TrackerConfig};
use crate::issue::{IssueRequest, IssueResponse, IssueStatus};
use crate::{Result, TrackerError};
use async_trait::async_trait;
use reqwest::{header, Client, Response};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use tracing::{debug, error, info};

const PROVIDER: Provider = Provider::GitHub;

/// GitHub REST API client
pub struct GitHubAdapter {
    client: Client,
    rest_base_url: String,
}

/// Create/update payload (`description` travels as `body`)
#[derive(Debug, Serialize)]
struct IssuePayload<'a> {
    title: &'a str,
    body: &'a str,
}

impl<'a> From<&'a IssueRequest> for IssuePayload<'a> {
    fn from(request: &'a IssueRequest) -> Self {
        Self {
            title: &request.title,
            body: &request.description,
        }
    }
}

#[derive(Debug, Serialize)]
struct StatePayload {
    state: &'static str,
}

/// Fields read back from a GitHub issue
#[derive(Debug, Deserialize)]
struct GitHubIssue {
    #[serde(default)]
    number: Option<u64>,
    #[serde(default, deserialize_with = "nullable")]
    html_url: Option<Option<String>>,
    #[serde(default)]
    state: Option<String>,
}

impl GitHubAdapter {
    /// Create a new GitHub adapter
    ///
    /// Fails with `TrackerError::Config` when no token can be resolved; no
    /// request is sent in that case.
    pub fn new(settings: &ProviderSettings, http: &HttpSettings) -> Result<Self> {
        let token = settings.resolve_token(PROVIDER).ok_or_else(|| {
            TrackerError::Config(format!(
                "Missing GitHub token (set git_services.github.token or ${})",
                settings
                    .token_env
                    .as_deref()
                    .unwrap_or(PROVIDER.default_token_env())
            ))
        })?;

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/vnd.github+json"),
        );
        let client = authorized_client(&token, http, headers)?;

        Ok(Self {
            client,
            rest_base_url: settings.resolve_api_url(PROVIDER),
        })
    }

    pub fn from_config(config: &TrackerConfig) -> Result<Self> {
        Self::new(&config.git_services.github, &config.http)
    }

    pub fn rest_base_url(&self) -> &str {
        &self.rest_base_url
    }

    /// Callers may hand us `owner%2Frepo`; GitHub wants the literal slash.
    /// Sequences that do not decode to UTF-8 are left as they are.
    fn decode_repository(repository: &str) -> Cow<'_, str> {
        urlencoding::decode(repository).unwrap_or(Cow::Borrowed(repository))
    }

    fn issues_url(&self, repository: &str) -> String {
        format!("{}/repos/{}/issues", self.rest_base_url, repository)
    }

    fn issue_url(&self, repository: &str, issue_number: u64) -> String {
        format!("{}/{}", self.issues_url(repository), issue_number)
    }

    /// Turn a transport failure or non-2xx status into an upstream error
    async fn check(
        response: std::result::Result<Response, reqwest::Error>,
        operation: Operation,
        target: &str,
    ) -> Result<Response> {
        let response = response.map_err(|e| {
            TrackerError::upstream(PROVIDER, operation, target, e.status(), e.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();
        Err(TrackerError::upstream(
            PROVIDER,
            operation,
            target,
            Some(status),
            format!("HTTP {}: {}", status, error_body),
        ))
    }

    async fn read_issue(
        response: Response,
        operation: Operation,
        target: &str,
    ) -> Result<GitHubIssue> {
        let body = response.text().await.map_err(|e| {
            TrackerError::upstream(PROVIDER, operation, target, None, e.to_string())
        })?;
        serde_json::from_str(&body)
            .map_err(|e| TrackerError::malformed(PROVIDER, operation, target, e.to_string()))
    }

    /// Pull the required `number` and `html_url` out of an issue body
    fn required_fields(
        issue: &GitHubIssue,
        operation: Operation,
        target: &str,
    ) -> Result<(u64, Option<String>)> {
        let number = issue.number.ok_or_else(|| {
            TrackerError::malformed(PROVIDER, operation, target, "missing field `number`")
        })?;
        let url = issue.html_url.clone().ok_or_else(|| {
            TrackerError::malformed(PROVIDER, operation, target, "missing field `html_url`")
        })?;
        Ok((number, url))
    }

    async fn try_close(&self, repository: &str, issue_number: u64) -> Result<()> {
        let target = target(repository, Some(issue_number));
        let url = self.issue_url(repository, issue_number);

        debug!(repository = %repository, issue_number, "Closing GitHub issue");

        let response = self
            .client
            .patch(&url)
            .json(&StatePayload { state: "closed" })
            .send()
            .await;
        Self::check(response, Operation::Close, &target).await?;
        Ok(())
    }
}

#[async_trait]
impl IssueTracker for GitHubAdapter {
    fn provider(&self) -> Provider {
        PROVIDER
    }

    async fn create_issue(
        &self,
        repository: &str,
        request: &IssueRequest,
    ) -> Result<IssueResponse> {
        let repository = Self::decode_repository(repository);
        let target = target(&repository, None);
        let url = self.issues_url(&repository);

        debug!(repository = %repository, title = %request.title, "Creating GitHub issue");

        let response = self
            .client
            .post(&url)
            .json(&IssuePayload::from(request))
            .send()
            .await;
        let response = Self::check(response, Operation::Create, &target)
            .await
            .inspect_err(|e| error!(repository = %repository, error = %e, "GitHub create failed"))?;

        let issue = Self::read_issue(response, Operation::Create, &target).await?;
        let (number, url) = Self::required_fields(&issue, Operation::Create, &target)?;

        info!(repository = %repository, issue_number = number, "GitHub issue created");

        // A freshly created issue cannot be closed
        Ok(IssueResponse::new(number, url, IssueStatus::Open))
    }

    async fn update_issue(
        &self,
        repository: &str,
        issue_number: u64,
        request: &IssueRequest,
    ) -> Result<IssueResponse> {
        let repository = Self::decode_repository(repository);
        let target = target(&repository, Some(issue_number));
        let url = self.issue_url(&repository, issue_number);

        debug!(repository = %repository, issue_number, "Updating GitHub issue");

        let response = self
            .client
            .patch(&url)
            .json(&IssuePayload::from(request))
            .send()
            .await;
        let response = Self::check(response, Operation::Update, &target)
            .await
            .inspect_err(|e| {
                error!(repository = %repository, issue_number, error = %e, "GitHub update failed")
            })?;

        let issue = Self::read_issue(response, Operation::Update, &target).await?;
        let (number, url) = Self::required_fields(&issue, Operation::Update, &target)?;
        let status = IssueStatus::from_upstream(issue.state.as_deref());

        info!(repository = %repository, issue_number = number, status = %status, "GitHub issue updated");

        Ok(IssueResponse::new(number, url, status))
    }

    async fn close_issue(&self, repository: &str, issue_number: u64) -> bool {
        let repository = Self::decode_repository(repository);

        match self.try_close(&repository, issue_number).await {
            Ok(()) => {
                info!(repository = %repository, issue_number, "GitHub issue closed");
                true
            }
            Err(e) => {
                error!(repository = %repository, issue_number, error = %e, "GitHub close failed");
                false
            }
        }
    }
}

//! GitLab Issues Integration Adapter
//!
//! Create, update, close and list issues through the GitLab REST API
//! (`projects/{id}/issues`).
//!
//! The project identifier is embedded in the path exactly as given. GitLab
//! accepts numeric ids or URL-encoded namespace paths (`group%2Fproject`), so
//! callers must pass a value that is already a valid path segment.

use super::{authorized_client, nullable, target, IssueLister, IssueTracker, Operation, Provider};
use crate::config::{HttpSettings, ProviderSettings, TrackerConfig};
use crate::issue::{IssueRequest, IssueResponse, IssueStatus};
use crate::{Result, TrackerError};
use async_trait::async_trait;
use reqwest::{header, Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

const PROVIDER: Provider = Provider::GitLab;

/// GitLab REST API client
pub struct GitLabAdapter {
    client: Client,
    base_url: String,
}

/// Create/update payload; GitLab names the body `description`
#[derive(Debug, Serialize)]
struct IssuePayload<'a> {
    title: &'a str,
    description: &'a str,
}

impl<'a> From<&'a IssueRequest> for IssuePayload<'a> {
    fn from(request: &'a IssueRequest) -> Self {
        Self {
            title: &request.title,
            description: &request.description,
        }
    }
}

#[derive(Debug, Serialize)]
struct StateEventPayload {
    state_event: &'static str,
}

/// Fields read back from a GitLab issue
#[derive(Debug, Deserialize)]
struct GitLabIssue {
    /// Project-scoped issue number (not the global `id`)
    #[serde(default)]
    iid: Option<u64>,
    #[serde(default, deserialize_with = "nullable")]
    web_url: Option<Option<String>>,
    #[serde(default)]
    state: Option<String>,
}

impl GitLabIssue {
    fn required_fields(&self, operation: Operation, target: &str) -> Result<(u64, Option<String>)> {
        let iid = self.iid.ok_or_else(|| {
            TrackerError::malformed(PROVIDER, operation, target, "missing field `iid`")
        })?;
        let url = self.web_url.clone().ok_or_else(|| {
            TrackerError::malformed(PROVIDER, operation, target, "missing field `web_url`")
        })?;
        Ok((iid, url))
    }
}

impl GitLabAdapter {
    /// Create a new GitLab adapter
    ///
    /// Fails with `TrackerError::Config` when no token can be resolved.
    pub fn new(settings: &ProviderSettings, http: &HttpSettings) -> Result<Self> {
        let token = settings.resolve_token(PROVIDER).ok_or_else(|| {
            TrackerError::Config(format!(
                "Missing GitLab token (set git_services.gitlab.token or ${})",
                settings
                    .token_env
                    .as_deref()
                    .unwrap_or(PROVIDER.default_token_env())
            ))
        })?;

        let client = authorized_client(&token, http, header::HeaderMap::new())?;

        Ok(Self {
            client,
            base_url: settings.resolve_api_url(PROVIDER),
        })
    }

    pub fn from_config(config: &TrackerConfig) -> Result<Self> {
        Self::new(&config.git_services.gitlab, &config.http)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn issues_url(&self, repository: &str) -> String {
        format!("{}/projects/{}/issues", self.base_url, repository)
    }

    fn issue_url(&self, repository: &str, issue_number: u64) -> String {
        format!("{}/{}", self.issues_url(repository), issue_number)
    }

    async fn send_checked(
        request: reqwest::RequestBuilder,
        operation: Operation,
        target: &str,
    ) -> Result<Response> {
        let response = request.send().await.map_err(|e| {
            TrackerError::upstream(PROVIDER, operation, target, e.status(), e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(TrackerError::upstream(
                PROVIDER,
                operation,
                target,
                Some(status),
                format!("HTTP {}: {}", status, error_body),
            ));
        }

        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(
        response: Response,
        operation: Operation,
        target: &str,
    ) -> Result<T> {
        let body = response.text().await.map_err(|e| {
            TrackerError::upstream(PROVIDER, operation, target, None, e.to_string())
        })?;
        serde_json::from_str(&body)
            .map_err(|e| TrackerError::malformed(PROVIDER, operation, target, e.to_string()))
    }

    /// Shared by create and update: same payload, different verb and URL
    async fn write_issue(
        &self,
        request: reqwest::RequestBuilder,
        operation: Operation,
        target: &str,
    ) -> Result<IssueResponse> {
        let response = Self::send_checked(request, operation, target).await?;
        let issue: GitLabIssue = Self::decode(response, operation, target).await?;
        let (iid, url) = issue.required_fields(operation, target)?;

        // Upstream state is not consulted here, even after an update
        Ok(IssueResponse::new(iid, url, IssueStatus::Open))
    }

    async fn try_close(&self, repository: &str, issue_number: u64) -> Result<()> {
        let target = target(repository, Some(issue_number));
        let request = self
            .client
            .put(self.issue_url(repository, issue_number))
            .json(&StateEventPayload {
                state_event: "close",
            });

        Self::send_checked(request, Operation::Close, &target).await?;
        Ok(())
    }
}

#[async_trait]
impl IssueTracker for GitLabAdapter {
    fn provider(&self) -> Provider {
        PROVIDER
    }

    async fn create_issue(
        &self,
        repository: &str,
        request: &IssueRequest,
    ) -> Result<IssueResponse> {
        let target = target(repository, None);

        debug!(repository = %repository, title = %request.title, "Creating GitLab issue");

        let http_request = self
            .client
            .post(self.issues_url(repository))
            .json(&IssuePayload::from(request));

        let issue = self
            .write_issue(http_request, Operation::Create, &target)
            .await
            .inspect_err(|e| error!(repository = %repository, error = %e, "GitLab create failed"))?;

        info!(repository = %repository, issue_number = issue.issue_number, "GitLab issue created");

        Ok(issue)
    }

    async fn update_issue(
        &self,
        repository: &str,
        issue_number: u64,
        request: &IssueRequest,
    ) -> Result<IssueResponse> {
        let target = target(repository, Some(issue_number));

        debug!(repository = %repository, issue_number, "Updating GitLab issue");

        let http_request = self
            .client
            .put(self.issue_url(repository, issue_number))
            .json(&IssuePayload::from(request));

        let issue = self
            .write_issue(http_request, Operation::Update, &target)
            .await
            .inspect_err(|e| {
                error!(repository = %repository, issue_number, error = %e, "GitLab update failed")
            })?;

        info!(repository = %repository, issue_number, "GitLab issue updated");

        Ok(issue)
    }

    async fn close_issue(&self, repository: &str, issue_number: u64) -> bool {
        match self.try_close(repository, issue_number).await {
            Ok(()) => {
                info!(repository = %repository, issue_number, "GitLab issue closed");
                true
            }
            Err(e) => {
                error!(repository = %repository, issue_number, error = %e, "GitLab close failed");
                false
            }
        }
    }
}

#[async_trait]
impl IssueLister for GitLabAdapter {
    async fn list_issues(&self, repository: &str) -> Result<Vec<IssueResponse>> {
        let target = target(repository, None);

        debug!(repository = %repository, "Listing GitLab issues");

        // TODO: follow the `x-next-page` header once callers need more than one page
        let request = self.client.get(self.issues_url(repository));
        let response = Self::send_checked(request, Operation::List, &target)
            .await
            .inspect_err(|e| error!(repository = %repository, error = %e, "GitLab list failed"))?;

        if response
            .headers()
            .get("x-next-page")
            .is_some_and(|v| !v.is_empty())
        {
            warn!(repository = %repository, "GitLab returned more than one page; only the first is used");
        }

        let issues: Vec<GitLabIssue> = Self::decode(response, Operation::List, &target).await?;

        let responses = issues
            .iter()
            .map(|issue| -> Result<IssueResponse> {
                let (iid, url) = issue.required_fields(Operation::List, &target)?;
                let status = IssueStatus::from_upstream(issue.state.as_deref());
                Ok(IssueResponse::new(iid, url, status))
            })
            .collect::<Result<Vec<_>>>()?;

        info!(repository = %repository, count = responses.len(), "GitLab issues listed");

        Ok(responses)
    }
}

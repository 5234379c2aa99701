//! HTTP dispatch layer
//!
//! Exposes both adapters behind one REST surface and maps adapter failures to
//! HTTP status codes. No issue logic lives here.
//!
//! # Routes
//!
//! - `GET /health` - Liveness probe
//! - `POST /api/issues/github/{repository}` - Create a GitHub issue
//! - `PUT /api/issues/github/{repository}/{issue_number}` - Update a GitHub issue
//! - `DELETE /api/issues/github/{repository}/{issue_number}` - Close a GitHub issue
//! - `GET /api/issues/gitlab/{repository}` - List GitLab issues (first page)
//! - `POST /api/issues/gitlab/{repository}` - Create a GitLab issue
//! - `PUT /api/issues/gitlab/{repository}/{issue_number}` - Update a GitLab issue
//! - `DELETE /api/issues/gitlab/{repository}/{issue_number}` - Close a GitLab issue
//!
//! The `repository` segment reaches the adapter still percent-encoded, so
//! `owner%2Frepo` is one segment here; GitHub decodes it, GitLab does not.
//!
//! # Example
//!
//! ```no_run
//! use git_issue_tracker::config::TrackerConfig;
//! use git_issue_tracker::server::IssueServer;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = TrackerConfig::load_or_default().expect("Failed to load config");
//!     let server = IssueServer::from_config(&config).expect("Failed to create server");
//!
//!     server.run("127.0.0.1:8080").await.expect("Server failed");
//! }
//! ```

use crate::config::TrackerConfig;
use crate::integrations::{GitHubAdapter, GitLabAdapter, IssueLister, IssueTracker};
use crate::issue::{IssueRequest, IssueResponse};
use crate::TrackerError;
use axum::{
    extract::{rejection::JsonRejection, OriginalUri, State},
    http::{StatusCode, Uri},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;

/// Server error types
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Tracker error: {0}")]
    Tracker(#[from] TrackerError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Bind error: {0}")]
    Bind(String),
}

/// Shared server state
pub struct AppState {
    github: Arc<dyn IssueTracker>,
    gitlab: Arc<dyn IssueLister>,
}

/// HTTP server fronting both providers
pub struct IssueServer {
    state: Arc<AppState>,
}

impl IssueServer {
    /// Create a server from already constructed trackers
    pub fn new(github: Arc<dyn IssueTracker>, gitlab: Arc<dyn IssueLister>) -> Self {
        Self {
            state: Arc::new(AppState { github, gitlab }),
        }
    }

    /// Build both adapters from configuration; fails if either token is missing
    pub fn from_config(config: &TrackerConfig) -> Result<Self, ServerError> {
        let github = GitHubAdapter::from_config(config)?;
        let gitlab = GitLabAdapter::from_config(config)?;
        Ok(Self::new(Arc::new(github), Arc::new(gitlab)))
    }

    fn router(state: Arc<AppState>) -> Router {
        Router::new()
            .route("/health", get(health))
            .route("/api/issues/github/{repository}", post(create_github))
            .route(
                "/api/issues/github/{repository}/{issue_number}",
                put(update_github).delete(close_github),
            )
            .route(
                "/api/issues/gitlab/{repository}",
                get(list_gitlab).post(create_gitlab),
            )
            .route(
                "/api/issues/gitlab/{repository}/{issue_number}",
                put(update_gitlab).delete(close_gitlab),
            )
            .with_state(state)
    }

    /// The routes, for embedding into a larger application or for tests
    pub fn into_router(self) -> Router {
        Self::router(self.state)
    }

    /// Run the server on the given address
    pub async fn run(self, addr: &str) -> Result<(), ServerError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind(e.to_string()))?;

        tracing::info!(addr = addr, "Issue tracker listening");

        axum::serve(listener, Self::router(self.state))
            .await
            .map_err(ServerError::Io)
    }
}

// ============================================================================
// Request/Response types
// ============================================================================

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

impl From<TrackerError> for ApiError {
    fn from(err: TrackerError) -> Self {
        let status = if err.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        api_error(status, err.to_string())
    }
}

/// Path segment `trailing` places before the end, exactly as it appeared on the
/// request line. Extracted path params arrive percent-decoded, but GitLab needs
/// `owner%2Frepo` untouched.
fn raw_segment(uri: &Uri, trailing: usize) -> Option<&str> {
    let segments: Vec<&str> = uri.path().split('/').collect();
    segments
        .len()
        .checked_sub(trailing + 1)
        .and_then(|i| segments.get(i).copied())
        .filter(|segment| !segment.is_empty())
}

/// Still percent-encoded repository; `trailing` counts route segments after it
fn repository_segment(uri: &Uri, trailing: usize) -> Result<String, ApiError> {
    raw_segment(uri, trailing)
        .map(str::to_string)
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "Missing repository"))
}

/// Issue number, always the last segment of its routes
fn issue_number_segment(uri: &Uri) -> Result<u64, ApiError> {
    let raw = raw_segment(uri, 0)
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "Missing issue number"))?;

    raw.parse().map_err(|_| {
        api_error(
            StatusCode::BAD_REQUEST,
            format!("Invalid issue number: {}", raw),
        )
    })
}

fn request_body(body: Result<Json<IssueRequest>, JsonRejection>) -> Result<IssueRequest, ApiError> {
    body.map(|Json(request)| request)
        .map_err(|rejection| api_error(rejection.status(), rejection.body_text()))
}

// ============================================================================
// Handlers
// ============================================================================

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn create_github(
    State(state): State<Arc<AppState>>,
    OriginalUri(uri): OriginalUri,
    body: Result<Json<IssueRequest>, JsonRejection>,
) -> Result<Json<IssueResponse>, ApiError> {
    let repository = repository_segment(&uri, 0)?;
    create(state.github.as_ref(), &repository, request_body(body)?).await
}

async fn update_github(
    State(state): State<Arc<AppState>>,
    OriginalUri(uri): OriginalUri,
    body: Result<Json<IssueRequest>, JsonRejection>,
) -> Result<Json<IssueResponse>, ApiError> {
    let repository = repository_segment(&uri, 1)?;
    let issue_number = issue_number_segment(&uri)?;
    update(state.github.as_ref(), &repository, issue_number, request_body(body)?).await
}

async fn close_github(
    State(state): State<Arc<AppState>>,
    OriginalUri(uri): OriginalUri,
) -> Result<StatusCode, ApiError> {
    let repository = repository_segment(&uri, 1)?;
    let issue_number = issue_number_segment(&uri)?;
    close(state.github.as_ref(), &repository, issue_number).await
}

async fn create_gitlab(
    State(state): State<Arc<AppState>>,
    OriginalUri(uri): OriginalUri,
    body: Result<Json<IssueRequest>, JsonRejection>,
) -> Result<Json<IssueResponse>, ApiError> {
    let repository = repository_segment(&uri, 0)?;
    create(state.gitlab.as_ref(), &repository, request_body(body)?).await
}

async fn update_gitlab(
    State(state): State<Arc<AppState>>,
    OriginalUri(uri): OriginalUri,
    body: Result<Json<IssueRequest>, JsonRejection>,
) -> Result<Json<IssueResponse>, ApiError> {
    let repository = repository_segment(&uri, 1)?;
    let issue_number = issue_number_segment(&uri)?;
    update(state.gitlab.as_ref(), &repository, issue_number, request_body(body)?).await
}

async fn close_gitlab(
    State(state): State<Arc<AppState>>,
    OriginalUri(uri): OriginalUri,
) -> Result<StatusCode, ApiError> {
    let repository = repository_segment(&uri, 1)?;
    let issue_number = issue_number_segment(&uri)?;
    close(state.gitlab.as_ref(), &repository, issue_number).await
}

async fn list_gitlab(
    State(state): State<Arc<AppState>>,
    OriginalUri(uri): OriginalUri,
) -> Result<Json<Vec<IssueResponse>>, ApiError> {
    let repository = repository_segment(&uri, 0)?;

    tracing::info!(provider = %state.gitlab.provider(), repository = %repository, "Listing issues");

    state
        .gitlab
        .list_issues(&repository)
        .await
        .map(Json)
        .map_err(|e| {
            tracing::error!(repository = %repository, error = %e, "Listing issues failed");
            e.into()
        })
}

async fn create<T: IssueTracker + ?Sized>(
    tracker: &T,
    repository: &str,
    request: IssueRequest,
) -> Result<Json<IssueResponse>, ApiError> {
    let provider = tracker.provider();
    tracing::info!(provider = %provider, repository = %repository, "Creating issue");

    request.validate()?;

    tracker
        .create_issue(repository, &request)
        .await
        .map(Json)
        .map_err(|e| {
            tracing::error!(provider = %provider, repository = %repository, error = %e, "Creating issue failed");
            e.into()
        })
}

async fn update<T: IssueTracker + ?Sized>(
    tracker: &T,
    repository: &str,
    issue_number: u64,
    request: IssueRequest,
) -> Result<Json<IssueResponse>, ApiError> {
    let provider = tracker.provider();
    tracing::info!(provider = %provider, repository = %repository, issue_number, "Updating issue");

    request.validate()?;

    tracker
        .update_issue(repository, issue_number, &request)
        .await
        .map(Json)
        .map_err(|e| {
            tracing::error!(
                provider = %provider,
                repository = %repository,
                issue_number,
                error = %e,
                "Updating issue failed"
            );
            e.into()
        })
}

async fn close<T: IssueTracker + ?Sized>(
    tracker: &T,
    repository: &str,
    issue_number: u64,
) -> Result<StatusCode, ApiError> {
    let provider = tracker.provider();
    tracing::info!(provider = %provider, repository = %repository, issue_number, "Closing issue");

    if tracker.close_issue(repository, issue_number).await {
        return Ok(StatusCode::NO_CONTENT);
    }

    tracing::warn!(provider = %provider, repository = %repository, issue_number, "Closing issue did not succeed");
    Err(api_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("Could not close {} issue {}#{}", provider, repository, issue_number),
    ))
}

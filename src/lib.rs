//! git-issue-tracker - One issue API over GitHub and GitLab
//!
//! A thin facade that lets callers create, update, close and (for GitLab)
//! list issues without knowing either provider's REST dialect. Every operation
//! answers with the same normalized `IssueResponse`.
//!
//! # Architecture
//!
//! - **issue**: Provider-neutral request/response model
//! - **integrations**: GitHub and GitLab adapters behind the `IssueTracker` trait
//! - **config**: Tokens, base URLs and HTTP settings (YAML + environment)
//! - **server**: REST dispatch layer (axum)
//! - **logging**: tracing subscriber setup

pub mod config;
pub mod error;
pub mod integrations;
pub mod issue;
pub mod logging;
pub mod server;

// Re-exports
pub use error::{Result, TrackerError};
pub use integrations::{GitHubAdapter, GitLabAdapter, IssueLister, IssueTracker, Provider};
pub use issue::{IssueRequest, IssueResponse, IssueStatus};

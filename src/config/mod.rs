//! Configuration system
//!
//! Loads ~/.config/git-issue-tracker/config.yaml with support for:
//! - Per-provider tokens (inline, or read from an environment variable)
//! - API root overrides (GitHub Enterprise, self-hosted GitLab)
//! - Shared HTTP transport settings (user agent, timeout)
//! - Dispatch server bind address

mod git_services;
mod tracker_config;
pub mod validation;

pub use git_services::{GitServices, ProviderSettings};
pub use tracker_config::{HttpSettings, ServerSettings, TrackerConfig};
pub use validation::{validate_config, validate_config_result, ValidationError};

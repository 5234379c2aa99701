//! Configuration validation
//!
//! Validates tracker configuration for correctness:
//! - Both provider tokens can be resolved
//! - API roots are HTTP(S) URLs
//! - Transport settings are usable
//! - Server bind address parses

use super::tracker_config::TrackerConfig;
use crate::integrations::Provider;
use crate::TrackerError;
use std::net::SocketAddr;

/// Validation error details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub provider: Option<Provider>,
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            provider: None,
            field: field.into(),
            message: message.into(),
        }
    }

    fn for_provider(mut self, provider: Provider) -> Self {
        self.provider = Some(provider);
        self
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(provider) = self.provider {
            write!(f, "[{}] {}: {}", provider, self.field, self.message)
        } else {
            write!(f, "{}: {}", self.field, self.message)
        }
    }
}

/// Validation result
pub type ValidationResult = std::result::Result<(), Vec<ValidationError>>;

/// Validate a tracker configuration
pub fn validate_config(config: &TrackerConfig) -> ValidationResult {
    let mut errors = Vec::new();

    for provider in Provider::ALL {
        let settings = config.git_services.for_provider(provider);
        let section = format!("git_services.{}", provider.config_key());

        if settings.resolve_token(provider).is_none() {
            let source = settings
                .token_env
                .as_deref()
                .map(|name| name.trim_start_matches('$'))
                .unwrap_or(provider.default_token_env());
            errors.push(
                ValidationError::new(
                    format!("{}.token", section),
                    format!("No token configured and ${} is not set", source),
                )
                .for_provider(provider),
            );
        }

        if let Some(ref url) = settings.api_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                errors.push(
                    ValidationError::new(
                        format!("{}.api_url", section),
                        format!("Invalid API URL: {}", url),
                    )
                    .for_provider(provider),
                );
            }
        }
    }

    if config.http.user_agent.trim().is_empty() {
        errors.push(ValidationError::new(
            "http.user_agent",
            "User agent cannot be empty",
        ));
    }

    if config.http.timeout_secs == 0 {
        errors.push(ValidationError::new(
            "http.timeout_secs",
            "Timeout must be greater than 0",
        ));
    }

    if config.server.bind.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "server.bind",
            format!("Invalid bind address: {}", config.server.bind),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate configuration and return a Result
pub fn validate_config_result(config: &TrackerConfig) -> crate::Result<()> {
    validate_config(config).map_err(|errors| {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        TrackerError::Config(format!(
            "Configuration validation failed:\n  - {}",
            messages.join("\n  - ")
        ))
    })
}

//! Provider credentials and endpoints

use crate::integrations::Provider;
use serde::{Deserialize, Serialize};

/// Settings for a single upstream provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Inline bearer token (prefer `token_env` outside of local testing)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Environment variable holding the token (a leading `$` is ignored)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_env: Option<String>,

    /// API root, defaults to the public provider endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

impl ProviderSettings {
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = Some(api_url.into());
        self
    }

    /// Resolve the bearer token for `provider`
    ///
    /// Order: inline `token`, the variable named by `token_env`, then the
    /// provider's conventional variable. Empty values are treated as absent.
    pub fn resolve_token(&self, provider: Provider) -> Option<String> {
        let non_empty = |value: String| {
            let trimmed = value.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        };

        if let Some(token) = self.token.clone().and_then(non_empty) {
            return Some(token);
        }

        let env_var = self
            .token_env
            .as_deref()
            .map(|name| name.trim_start_matches('$'))
            .unwrap_or(provider.default_token_env());

        std::env::var(env_var).ok().and_then(non_empty)
    }

    /// API root without a trailing slash
    pub fn resolve_api_url(&self, provider: Provider) -> String {
        self.api_url
            .as_deref()
            .unwrap_or(provider.default_api_url())
            .trim_end_matches('/')
            .to_string()
    }
}

/// Both supported providers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitServices {
    #[serde(default)]
    pub github: ProviderSettings,

    #[serde(default)]
    pub gitlab: ProviderSettings,
}

impl GitServices {
    pub fn for_provider(&self, provider: Provider) -> &ProviderSettings {
        match provider {
            Provider::GitHub => &self.github,
            Provider::GitLab => &self.gitlab,
        }
    }
}

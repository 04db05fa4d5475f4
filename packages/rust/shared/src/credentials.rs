//! API credentials: process-wide defaults and request-scoped overrides.
//!
//! Defaults are resolved once from the environment variables named in
//! [`AppConfig`]. A request may carry [`CredentialOverrides`]; resolving them
//! yields [`EffectiveCredentials`] for that request only.

use serde::{Deserialize, Serialize};

use crate::config::AppConfig;

/// An API key. `Debug` and `Display` never print the secret.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a key, treating blank input as absent.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// The raw secret, for building an `Authorization` header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

impl std::fmt::Display for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("***")
    }
}

fn from_env(var_name: &str) -> Option<ApiKey> {
    std::env::var(var_name).ok().and_then(ApiKey::new)
}

/// Process-wide default keys, resolved once at startup.
#[derive(Debug, Clone, Default)]
pub struct DefaultCredentials {
    pub search_api_key: Option<ApiKey>,
    pub llm_api_key: Option<ApiKey>,
}

impl DefaultCredentials {
    /// Read the env vars named by the config.
    pub fn from_env(config: &AppConfig) -> Self {
        let creds = Self {
            search_api_key: from_env(&config.search.api_key_env),
            llm_api_key: from_env(&config.agents.api_key_env),
        };
        tracing::debug!(
            search_key = creds.search_api_key.is_some(),
            llm_key = creds.llm_api_key.is_some(),
            "resolved default credentials"
        );
        creds
    }
}

/// Per-request key overrides supplied by the caller.
#[derive(Debug, Clone, Default)]
pub struct CredentialOverrides {
    pub search_api_key: Option<ApiKey>,
    pub llm_api_key: Option<ApiKey>,
}

impl CredentialOverrides {
    /// Override only the search key.
    pub fn with_search_key(raw: impl Into<String>) -> Self {
        Self {
            search_api_key: ApiKey::new(raw),
            llm_api_key: None,
        }
    }

    /// Overrides win; the defaults are left untouched.
    pub fn resolve(&self, defaults: &DefaultCredentials) -> EffectiveCredentials {
        EffectiveCredentials {
            search_api_key: self
                .search_api_key
                .clone()
                .or_else(|| defaults.search_api_key.clone()),
            llm_api_key: self
                .llm_api_key
                .clone()
                .or_else(|| defaults.llm_api_key.clone()),
        }
    }
}

/// The keys one request actually uses.
#[derive(Debug, Clone, Default)]
pub struct EffectiveCredentials {
    pub search_api_key: Option<ApiKey>,
    pub llm_api_key: Option<ApiKey>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_keys_are_absent() {
        assert!(ApiKey::new("").is_none());
        assert!(ApiKey::new("   ").is_none());
        assert_eq!(ApiKey::new(" pplx-1 ").unwrap().expose(), "pplx-1");
    }

    #[test]
    fn debug_redacts_secret() {
        let key = ApiKey::new("pplx-secret").unwrap();
        assert!(!format!("{key:?}").contains("secret"));
        assert!(!format!("{key}").contains("secret"));
    }

    #[test]
    fn override_takes_precedence_without_mutating_defaults() {
        let defaults = DefaultCredentials {
            search_api_key: ApiKey::new("default-key"),
            llm_api_key: ApiKey::new("llm-key"),
        };
        let overrides = CredentialOverrides::with_search_key("request-key");

        let effective = overrides.resolve(&defaults);
        assert_eq!(effective.search_api_key.unwrap().expose(), "request-key");
        assert_eq!(effective.llm_api_key.unwrap().expose(), "llm-key");
        assert_eq!(
            defaults.search_api_key.as_ref().unwrap().expose(),
            "default-key"
        );
    }

    #[test]
    fn no_override_falls_back_to_defaults() {
        let defaults = DefaultCredentials {
            search_api_key: ApiKey::new("default-key"),
            llm_api_key: None,
        };
        let effective = CredentialOverrides::default().resolve(&defaults);
        assert_eq!(effective.search_api_key.unwrap().expose(), "default-key");
        assert!(effective.llm_api_key.is_none());
    }

    #[test]
    fn missing_env_var_resolves_to_none() {
        let mut config = AppConfig::default();
        // Use unique env var names to avoid interfering with other tests
        config.search.api_key_env = "EDD_TEST_NONEXISTENT_SEARCH_KEY_12345".into();
        config.agents.api_key_env = "EDD_TEST_NONEXISTENT_LLM_KEY_12345".into();
        let creds = DefaultCredentials::from_env(&config);
        assert!(creds.search_api_key.is_none());
        assert!(creds.llm_api_key.is_none());
    }
}

use edd_shared::{AgentsConfig, DefaultCredentials};
use tracing::{info, warn};

/// Whether the agent framework can run in this process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameworkAvailability {
    Available,
    Unavailable { reason: String },
}

impl FrameworkAvailability {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available)
    }
}

/// Decide once, at startup, whether agents can run.
///
/// Agents need to be enabled in config and an LLM key must be resolvable.
pub fn probe_framework(config: &AgentsConfig, defaults: &DefaultCredentials) -> FrameworkAvailability {
    let availability = if !config.enabled {
        FrameworkAvailability::Unavailable {
            reason: "agents disabled in configuration".into(),
        }
    } else if defaults.llm_api_key.is_none() {
        FrameworkAvailability::Unavailable {
            reason: format!("{} is not set", config.api_key_env),
        }
    } else {
        FrameworkAvailability::Available
    };

    match &availability {
        FrameworkAvailability::Available => info!(model = %config.model, "agent framework available"),
        FrameworkAvailability::Unavailable { reason } => {
            warn!(%reason, "agent framework unavailable; pipeline requests will be skipped")
        }
    }

    availability
}

#[cfg(test)]
mod tests {
    use super::*;
    use edd_shared::ApiKey;

    #[test]
    fn available_with_key_and_enabled() {
        let creds = DefaultCredentials {
            search_api_key: None,
            llm_api_key: ApiKey::new("sk-1"),
        };
        assert!(probe_framework(&AgentsConfig::default(), &creds).is_available());
    }

    #[test]
    fn unavailable_without_key() {
        let availability =
            probe_framework(&AgentsConfig::default(), &DefaultCredentials::default());
        match availability {
            FrameworkAvailability::Unavailable { reason } => {
                assert!(reason.contains("OPENAI_API_KEY"))
            }
            FrameworkAvailability::Available => panic!("expected unavailable"),
        }
    }

    #[test]
    fn unavailable_when_disabled() {
        let config = AgentsConfig {
            enabled: false,
            ..AgentsConfig::default()
        };
        let creds = DefaultCredentials {
            search_api_key: None,
            llm_api_key: ApiKey::new("sk-1"),
        };
        assert!(!probe_framework(&config, &creds).is_available());
    }
}
